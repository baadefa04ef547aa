//! Domain types shared across all Scribe services.
//!
//! Pure types with no framework dependencies.

pub mod locale;
pub mod user;
