pub mod account;
pub mod health;
pub mod login;
pub mod origin;
pub mod password;
pub mod register;
pub mod session;
pub mod verification;
