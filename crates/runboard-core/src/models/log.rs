use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Execution log entry (GET /api/executions/{id}/logs).
///
/// Entries are append-only and arrive ordered by timestamp ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub id: String,
    pub workflow_execution_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_execution_id: Option<String>,
    pub event_type: String,
    pub message: String,
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl ExecutionLog {
    pub fn visible_metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata.as_ref().filter(|m| !m.is_empty())
    }
}
