//! Shared service plumbing for Scribe services.
//!
//! Config loading, the common JSON error envelope, health checks, the
//! request-id layer and tracing initialisation.

pub mod config;
pub mod error;
pub mod health;
pub mod middleware;
pub mod tracing;
