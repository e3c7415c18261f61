//! Data models for the workflow backend
//!
//! All entities are owned by the backend; the client only holds read-only snapshots.

mod execution;
mod log;
mod status;
mod workflow;

pub use execution::*;
pub use log::*;
pub use status::*;
pub use workflow::*;
