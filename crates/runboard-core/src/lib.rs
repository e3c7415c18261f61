//! Runboard Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! the API client, the view controllers and the command-line client.

pub mod config;
pub mod error;
pub mod models;
pub mod timestamp;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::ValidationError;
pub use models::{
    format_duration_ms, ErrorType, ExecuteWorkflowRequest, ExecuteWorkflowResponse,
    ExecutionLog, ExecutionStatus, Step, StepExecution, Workflow, WorkflowDetail,
    WorkflowExecution,
};
