//! Resources a view can display.
//!
//! A source knows how to fetch one resource and whether a fetched snapshot is still
//! changing on the backend (and must therefore be polled).

use std::sync::Arc;

use async_trait::async_trait;
use runboard_api_client::{ApiError, WorkflowApi};
use runboard_core::models::{ExecutionLog, Workflow, WorkflowDetail, WorkflowExecution};

#[async_trait]
pub trait ResourceSource: Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;

    /// Identifier used in logs (e.g. `execution:ex-1`).
    fn key(&self) -> String;

    async fn fetch(&self) -> Result<Self::Output, ApiError>;

    /// Whether another fetch should be scheduled after this snapshot landed.
    fn should_poll(&self, _snapshot: &Self::Output) -> bool {
        false
    }
}

/// Workflow list (`/`)
#[derive(Clone)]
pub struct WorkflowListSource {
    api: Arc<dyn WorkflowApi>,
}

impl WorkflowListSource {
    pub fn new(api: Arc<dyn WorkflowApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ResourceSource for WorkflowListSource {
    type Output = Vec<Workflow>;

    fn key(&self) -> String {
        "workflows".to_string()
    }

    async fn fetch(&self) -> Result<Self::Output, ApiError> {
        self.api.list_workflows().await
    }
}

/// Workflow detail with steps (`/workflows/:id`)
#[derive(Clone)]
pub struct WorkflowDetailSource {
    api: Arc<dyn WorkflowApi>,
    workflow_id: String,
}

impl WorkflowDetailSource {
    pub fn new(api: Arc<dyn WorkflowApi>, workflow_id: impl Into<String>) -> Self {
        Self {
            api,
            workflow_id: workflow_id.into(),
        }
    }
}

#[async_trait]
impl ResourceSource for WorkflowDetailSource {
    type Output = WorkflowDetail;

    fn key(&self) -> String {
        format!("workflow:{}", self.workflow_id)
    }

    async fn fetch(&self) -> Result<Self::Output, ApiError> {
        self.api.get_workflow(&self.workflow_id).await
    }
}

/// Execution detail (`/executions/:id`). Polled while PENDING or RUNNING.
#[derive(Clone)]
pub struct ExecutionSource {
    api: Arc<dyn WorkflowApi>,
    execution_id: String,
}

impl ExecutionSource {
    pub fn new(api: Arc<dyn WorkflowApi>, execution_id: impl Into<String>) -> Self {
        Self {
            api,
            execution_id: execution_id.into(),
        }
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }
}

#[async_trait]
impl ResourceSource for ExecutionSource {
    type Output = WorkflowExecution;

    fn key(&self) -> String {
        format!("execution:{}", self.execution_id)
    }

    async fn fetch(&self) -> Result<Self::Output, ApiError> {
        self.api.get_execution(&self.execution_id).await
    }

    fn should_poll(&self, snapshot: &Self::Output) -> bool {
        snapshot.status.is_active()
    }
}

/// Execution logs (`/executions/:id/logs`)
#[derive(Clone)]
pub struct ExecutionLogsSource {
    api: Arc<dyn WorkflowApi>,
    execution_id: String,
}

impl ExecutionLogsSource {
    pub fn new(api: Arc<dyn WorkflowApi>, execution_id: impl Into<String>) -> Self {
        Self {
            api,
            execution_id: execution_id.into(),
        }
    }
}

#[async_trait]
impl ResourceSource for ExecutionLogsSource {
    type Output = Vec<ExecutionLog>;

    fn key(&self) -> String {
        format!("logs:{}", self.execution_id)
    }

    async fn fetch(&self) -> Result<Self::Output, ApiError> {
        self.api.get_execution_logs(&self.execution_id).await
    }
}
