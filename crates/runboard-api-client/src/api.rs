//! Domain methods for the workflow backend.
//!
//! One method per endpoint. Payloads are forwarded untouched and errors pass through
//! unchanged from the transport.

use async_trait::async_trait;
use runboard_core::models::{
    ExecuteWorkflowRequest, ExecuteWorkflowResponse, ExecutionLog, Workflow, WorkflowDetail,
    WorkflowExecution,
};

use crate::{ApiClient, ApiError, API_PREFIX};

/// Backend capabilities the views depend on.
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// GET /api/workflows
    async fn list_workflows(&self) -> Result<Vec<Workflow>, ApiError>;

    /// GET /api/workflows/{id}
    async fn get_workflow(&self, workflow_id: &str) -> Result<WorkflowDetail, ApiError>;

    /// POST /api/workflows/{id}/execute
    async fn execute_workflow(
        &self,
        workflow_id: &str,
        request: &ExecuteWorkflowRequest,
    ) -> Result<ExecuteWorkflowResponse, ApiError>;

    /// GET /api/executions/{id}
    async fn get_execution(&self, execution_id: &str) -> Result<WorkflowExecution, ApiError>;

    /// GET /api/executions/{id}/logs
    async fn get_execution_logs(&self, execution_id: &str)
        -> Result<Vec<ExecutionLog>, ApiError>;

    /// POST /api/executions/{id}/steps/{step_execution_id}/retry
    async fn retry_step(&self, execution_id: &str, step_execution_id: &str)
        -> Result<(), ApiError>;
}

fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

pub fn workflows_path() -> String {
    format!("{}/workflows", API_PREFIX)
}

pub fn workflow_path(workflow_id: &str) -> String {
    format!("{}/workflows/{}", API_PREFIX, segment(workflow_id))
}

pub fn execute_path(workflow_id: &str) -> String {
    format!("{}/execute", workflow_path(workflow_id))
}

pub fn execution_path(execution_id: &str) -> String {
    format!("{}/executions/{}", API_PREFIX, segment(execution_id))
}

pub fn execution_logs_path(execution_id: &str) -> String {
    format!("{}/logs", execution_path(execution_id))
}

pub fn retry_step_path(execution_id: &str, step_execution_id: &str) -> String {
    format!(
        "{}/steps/{}/retry",
        execution_path(execution_id),
        segment(step_execution_id)
    )
}

#[async_trait]
impl WorkflowApi for ApiClient {
    async fn list_workflows(&self) -> Result<Vec<Workflow>, ApiError> {
        self.get(&workflows_path()).await
    }

    async fn get_workflow(&self, workflow_id: &str) -> Result<WorkflowDetail, ApiError> {
        self.get(&workflow_path(workflow_id)).await
    }

    async fn execute_workflow(
        &self,
        workflow_id: &str,
        request: &ExecuteWorkflowRequest,
    ) -> Result<ExecuteWorkflowResponse, ApiError> {
        self.post_json(&execute_path(workflow_id), request).await
    }

    async fn get_execution(&self, execution_id: &str) -> Result<WorkflowExecution, ApiError> {
        self.get(&execution_path(execution_id)).await
    }

    async fn get_execution_logs(
        &self,
        execution_id: &str,
    ) -> Result<Vec<ExecutionLog>, ApiError> {
        self.get(&execution_logs_path(execution_id)).await
    }

    async fn retry_step(
        &self,
        execution_id: &str,
        step_execution_id: &str,
    ) -> Result<(), ApiError> {
        self.post_empty(&retry_step_path(execution_id, step_execution_id))
            .await
    }
}
