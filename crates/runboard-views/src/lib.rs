//! View state synchronization for the workflow dashboard.
//!
//! Each mounted view owns a [`ViewHandle`]: a small task that fetches one resource,
//! publishes its [`ViewState`], and keeps polling an execution while it is PENDING or
//! RUNNING. User actions (triggering an execution, retrying a failed step) live in
//! [`actions`].

pub mod actions;
pub mod controller;
pub mod route;
pub mod source;
pub mod state;

pub use actions::{
    parse_trigger_input, trigger_execution, ActionError, RetryOutcome, StepRetryDispatcher,
    StepRetryState, DEFAULT_TRIGGER_INPUT,
};
pub use controller::ViewHandle;
pub use route::Route;
pub use source::{
    ExecutionLogsSource, ExecutionSource, ResourceSource, WorkflowDetailSource,
    WorkflowListSource,
};
pub use state::ViewState;
