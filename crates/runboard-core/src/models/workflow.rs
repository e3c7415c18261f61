//! Workflow definitions as returned by the list and detail endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Workflow summary (GET /api/workflows)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Single step of a workflow definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub workflow_id: String,
    /// Step kind tag (e.g. "http_request", "transform")
    #[serde(rename = "type")]
    pub step_type: String,
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
}

impl Step {
    /// Configuration worth showing: present and non-empty.
    pub fn visible_config(&self) -> Option<&Map<String, Value>> {
        self.config.as_ref().filter(|c| !c.is_empty())
    }
}

/// Workflow with its ordered steps (GET /api/workflows/{id})
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDetail {
    pub id: String,
    pub name: String,
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Body of POST /api/workflows/{id}/execute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecuteWorkflowRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_input: Option<Map<String, Value>>,
}

/// Response of POST /api/workflows/{id}/execute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteWorkflowResponse {
    pub execution_id: String,
    pub workflow_id: String,
    pub status: super::ExecutionStatus,
    #[serde(with = "crate::timestamp")]
    pub started_at: DateTime<Utc>,
}
