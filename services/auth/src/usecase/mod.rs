pub mod account;
pub mod login;
pub mod password;
pub mod register;
pub mod session;
pub mod tfa;
pub mod verification;
