//! Error types module
//!
//! Local validation failures: they are detected before any network call is made
//! and never change the state of a loaded view.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Trigger input must be a JSON object")]
    NotAnObject,

    #[error("Unknown route: {0}")]
    InvalidRoute(String),
}
