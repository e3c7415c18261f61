//! In-memory backend used by the controller and action tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use runboard_api_client::{ApiError, WorkflowApi};
use runboard_core::models::{
    ExecuteWorkflowRequest, ExecuteWorkflowResponse, ExecutionLog, ExecutionStatus, Step,
    StepExecution, Workflow, WorkflowDetail, WorkflowExecution,
};
use tokio::time::Instant;

pub const POLL: Duration = Duration::from_millis(2000);

pub fn execution(id: &str, status: &str) -> WorkflowExecution {
    let status: ExecutionStatus = status.parse().unwrap();
    let started_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    WorkflowExecution {
        id: id.to_string(),
        workflow_id: "wf-1".to_string(),
        finished_at: status
            .is_terminal()
            .then(|| started_at + chrono::Duration::milliseconds(2500)),
        status,
        started_at,
        step_executions: vec![],
    }
}

pub fn step(id: &str, status: &str) -> StepExecution {
    StepExecution {
        id: id.to_string(),
        step_id: format!("def-{}", id),
        status: status.parse().unwrap(),
        input: None,
        output: None,
        error: None,
        error_type: None,
        started_at: None,
        finished_at: None,
        is_retry: false,
        retry_count: 0,
    }
}

pub fn workflow(id: &str) -> Workflow {
    Workflow {
        id: id.to_string(),
        name: format!("Workflow {}", id),
        version: 1,
        description: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

pub fn workflow_detail(id: &str, step_types: &[&str]) -> WorkflowDetail {
    let base = workflow(id);
    WorkflowDetail {
        id: base.id,
        name: base.name,
        version: base.version,
        description: base.description,
        created_at: base.created_at,
        steps: step_types
            .iter()
            .enumerate()
            .map(|(i, step_type)| Step {
                id: format!("{}-st-{}", id, i + 1),
                workflow_id: id.to_string(),
                step_type: step_type.to_string(),
                order: i as i64 + 1,
                config: None,
            })
            .collect(),
    }
}

pub fn log_entry(execution_id: &str, seq: u32, event_type: &str) -> ExecutionLog {
    ExecutionLog {
        id: format!("log-{}", seq),
        workflow_execution_id: execution_id.to_string(),
        step_execution_id: None,
        event_type: event_type.to_string(),
        message: format!("{} #{}", event_type, seq),
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, seq).unwrap(),
        metadata: None,
    }
}

/// One scripted response, optionally delayed.
#[derive(Clone)]
pub struct Scripted<T> {
    pub result: Result<T, ApiError>,
    pub delay: Duration,
}

impl<T> Scripted<T> {
    pub fn ok(value: T) -> Self {
        Self {
            result: Ok(value),
            delay: Duration::ZERO,
        }
    }

    pub fn err(status: u16, message: &str) -> Self {
        Self {
            result: Err(ApiError::Http {
                status,
                message: message.to_string(),
            }),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Queue of responses; the last one repeats forever.
struct Script<T>(VecDeque<Scripted<T>>);

impl<T: Clone> Script<T> {
    fn next(&mut self) -> Scripted<T> {
        if self.0.len() > 1 {
            self.0.pop_front().unwrap()
        } else {
            self.0.front().cloned().expect("no scripted response")
        }
    }
}

#[derive(Default)]
pub struct FakeApi {
    workflows: Mutex<Option<Script<Vec<Workflow>>>>,
    details: Mutex<HashMap<String, Script<WorkflowDetail>>>,
    executions: Mutex<HashMap<String, Script<WorkflowExecution>>>,
    logs: Mutex<HashMap<String, Script<Vec<ExecutionLog>>>>,
    retries: Mutex<Option<Script<()>>>,
    execute: Mutex<Option<Result<ExecuteWorkflowResponse, ApiError>>>,
    pub execute_requests: Mutex<Vec<ExecuteWorkflowRequest>>,
    pub execution_calls: Mutex<Vec<(String, Instant)>>,
    pub workflow_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub log_calls: AtomicUsize,
    pub retry_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workflows(self, responses: Vec<Scripted<Vec<Workflow>>>) -> Self {
        *self.workflows.lock().unwrap() = Some(Script(responses.into()));
        self
    }

    pub fn with_detail(self, id: &str, responses: Vec<Scripted<WorkflowDetail>>) -> Self {
        self.details
            .lock()
            .unwrap()
            .insert(id.to_string(), Script(responses.into()));
        self
    }

    pub fn with_logs(self, id: &str, responses: Vec<Scripted<Vec<ExecutionLog>>>) -> Self {
        self.logs
            .lock()
            .unwrap()
            .insert(id.to_string(), Script(responses.into()));
        self
    }

    pub fn with_execution(self, id: &str, responses: Vec<Scripted<WorkflowExecution>>) -> Self {
        self.executions
            .lock()
            .unwrap()
            .insert(id.to_string(), Script(responses.into()));
        self
    }

    pub fn with_retries(self, responses: Vec<Scripted<()>>) -> Self {
        *self.retries.lock().unwrap() = Some(Script(responses.into()));
        self
    }

    pub fn with_execute(self, result: Result<ExecuteWorkflowResponse, ApiError>) -> Self {
        *self.execute.lock().unwrap() = Some(result);
        self
    }

    pub fn execution_fetches(&self, id: &str) -> usize {
        self.execution_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(call_id, _)| call_id == id)
            .count()
    }

    pub fn execution_fetch_times(&self, id: &str) -> Vec<Instant> {
        self.execution_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(call_id, _)| call_id == id)
            .map(|(_, at)| *at)
            .collect()
    }

    async fn play<T>(&self, scripted: Scripted<T>) -> Result<T, ApiError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        scripted.result
    }
}

#[async_trait]
impl WorkflowApi for FakeApi {
    async fn list_workflows(&self) -> Result<Vec<Workflow>, ApiError> {
        self.workflow_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .workflows
            .lock()
            .unwrap()
            .as_mut()
            .expect("no workflows scripted")
            .next();
        self.play(scripted).await
    }

    async fn get_workflow(&self, workflow_id: &str) -> Result<WorkflowDetail, ApiError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .details
            .lock()
            .unwrap()
            .get_mut(workflow_id)
            .map(|script| script.next())
            .unwrap_or_else(|| Scripted::err(404, "Workflow not found"));
        self.play(scripted).await
    }

    async fn execute_workflow(
        &self,
        _workflow_id: &str,
        request: &ExecuteWorkflowRequest,
    ) -> Result<ExecuteWorkflowResponse, ApiError> {
        self.execute_requests.lock().unwrap().push(request.clone());
        self.execute
            .lock()
            .unwrap()
            .clone()
            .expect("no execute response scripted")
    }

    async fn get_execution(&self, execution_id: &str) -> Result<WorkflowExecution, ApiError> {
        self.execution_calls
            .lock()
            .unwrap()
            .push((execution_id.to_string(), Instant::now()));
        let scripted = self
            .executions
            .lock()
            .unwrap()
            .get_mut(execution_id)
            .map(|script| script.next())
            .unwrap_or_else(|| Scripted::err(404, "Execution not found"));
        self.play(scripted).await
    }

    async fn get_execution_logs(&self, execution_id: &str) -> Result<Vec<ExecutionLog>, ApiError> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .logs
            .lock()
            .unwrap()
            .get_mut(execution_id)
            .map(|script| script.next())
            .unwrap_or_else(|| Scripted::ok(vec![]));
        self.play(scripted).await
    }

    async fn retry_step(&self, _execution_id: &str, _step_execution_id: &str) -> Result<(), ApiError> {
        self.retry_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .retries
            .lock()
            .unwrap()
            .as_mut()
            .expect("no retry scripted")
            .next();
        // Not counted in `max_in_flight`, which tracks execution fetches.
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        scripted.result
    }
}
