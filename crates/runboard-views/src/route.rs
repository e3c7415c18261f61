use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use runboard_core::ValidationError;

/// Navigable views, addressed by URL-style paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    WorkflowList,
    /// `/workflows/:id`
    WorkflowDetail(String),
    /// `/executions/:id`
    ExecutionDetail(String),
    /// `/executions/:id/logs`
    ExecutionLogs(String),
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Route::WorkflowList => write!(f, "/"),
            Route::WorkflowDetail(id) => write!(f, "/workflows/{}", id),
            Route::ExecutionDetail(id) => write!(f, "/executions/{}", id),
            Route::ExecutionLogs(id) => write!(f, "/executions/{}/logs", id),
        }
    }
}

impl FromStr for Route {
    type Err = ValidationError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim();
        let segments: Vec<&str> = trimmed
            .trim_start_matches('/')
            .trim_end_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        if !trimmed.starts_with('/') {
            return Err(ValidationError::InvalidRoute(path.to_string()));
        }

        match segments.as_slice() {
            [] => Ok(Route::WorkflowList),
            ["workflows", id] => Ok(Route::WorkflowDetail(id.to_string())),
            ["executions", id] => Ok(Route::ExecutionDetail(id.to_string())),
            ["executions", id, "logs"] => Ok(Route::ExecutionLogs(id.to_string())),
            _ => Err(ValidationError::InvalidRoute(path.to_string())),
        }
    }
}
