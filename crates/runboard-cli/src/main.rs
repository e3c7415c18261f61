//! Runboard CLI: terminal dashboard for the workflow automation backend.
//!
//! Set RUNBOARD_API_URL (default http://localhost:8000) and optionally
//! RUNBOARD_POLL_INTERVAL_MS, or pass --api-url / --poll-interval-ms.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use runboard_api_client::{ApiClient, WorkflowApi};
use runboard_cli::{init_tracing, render};
use runboard_core::models::WorkflowExecution;
use runboard_core::ClientConfig;
use runboard_views::{
    trigger_execution, ActionError, ExecutionLogsSource, ExecutionSource, ResourceSource,
    RetryOutcome, Route, StepRetryDispatcher, ViewHandle, ViewState, WorkflowDetailSource,
    WorkflowListSource, DEFAULT_TRIGGER_INPUT,
};
use serde::Serialize;
use tokio::sync::watch;

#[derive(Parser)]
#[command(name = "runboard", about = "Workflow dashboard CLI")]
struct Cli {
    /// Backend origin (overrides RUNBOARD_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Refresh interval while an execution is running (overrides RUNBOARD_POLL_INTERVAL_MS)
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Table)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List workflows
    List,
    /// Show a workflow and its steps
    Workflow {
        /// Workflow ID
        id: String,
    },
    /// Show an execution with its step timeline
    Execution {
        /// Execution ID
        id: String,
        /// Keep refreshing until the execution finishes
        #[arg(long)]
        watch: bool,
    },
    /// Show the event log of an execution
    Logs {
        /// Execution ID
        id: String,
    },
    /// Trigger an execution of a workflow
    Execute {
        /// Workflow ID
        workflow_id: String,
        /// Trigger input as a JSON object (defaults to the dashboard template)
        #[arg(long, conflicts_with = "input_file")]
        input: Option<String>,
        /// Read the trigger input from a file
        #[arg(long)]
        input_file: Option<PathBuf>,
        /// Follow the new execution until it finishes
        #[arg(long)]
        watch: bool,
    },
    /// Retry a failed step execution
    Retry {
        /// Execution ID
        execution_id: String,
        /// Step execution ID
        step_execution_id: String,
        /// Follow the execution until it finishes
        #[arg(long)]
        watch: bool,
    },
    /// Open a dashboard path, e.g. /executions/<id>/logs
    Open {
        path: String,
    },
}

struct App {
    api: Arc<dyn WorkflowApi>,
    config: ClientConfig,
    format: Format,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn report_failure(message: &str) -> ExitCode {
    eprint!("{}", render::failure(message));
    ExitCode::FAILURE
}

/// Print a settled view. Failed views go to stderr with a non-zero exit.
fn emit<T: Serialize>(
    state: ViewState<T>,
    format: Format,
    render: impl FnOnce(&T) -> String,
) -> anyhow::Result<ExitCode> {
    match state {
        ViewState::Ready(data) => {
            match format {
                Format::Json => print_json(&data)?,
                Format::Table => print!("{}", render(&data)),
            }
            Ok(ExitCode::SUCCESS)
        }
        ViewState::Failed(message) => Ok(report_failure(&message)),
        ViewState::Idle | ViewState::Loading => {
            anyhow::bail!("View stopped before it finished loading")
        }
    }
}

/// Mount a view, wait for its first result and unmount it.
async fn load<S: ResourceSource>(app: &App, source: S) -> ViewState<S::Output> {
    let view = ViewHandle::mount(source, app.config.poll_interval());
    let state = view.settled().await;
    view.unmount();
    state
}

async fn show(app: &App, route: Route) -> anyhow::Result<ExitCode> {
    tracing::debug!(route = %route, "Opening view");
    match route {
        Route::WorkflowList => {
            let state = load(app, WorkflowListSource::new(app.api.clone())).await;
            emit(state, app.format, |w| render::workflow_list(w))
        }
        Route::WorkflowDetail(id) => {
            let state = load(app, WorkflowDetailSource::new(app.api.clone(), id)).await;
            emit(state, app.format, render::workflow_detail)
        }
        Route::ExecutionDetail(id) => {
            let state = load(app, ExecutionSource::new(app.api.clone(), id)).await;
            emit(state, app.format, render::execution)
        }
        Route::ExecutionLogs(id) => {
            let state = load(app, ExecutionLogsSource::new(app.api.clone(), id.clone())).await;
            emit(state, app.format, |logs| render::logs(&id, logs))
        }
    }
}

/// Render execution snapshots as they change until the execution is no longer
/// PENDING or RUNNING. Ctrl-C stops immediately.
///
/// `last` is the snapshot already on screen, if any. A failed fetch before any
/// snapshot ends the watch; a failed poll is reported and the watch goes on, since
/// the view keeps polling.
async fn follow(
    states: &mut watch::Receiver<ViewState<WorkflowExecution>>,
    format: Format,
    mut last: Option<WorkflowExecution>,
) -> anyhow::Result<ExitCode> {
    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    anyhow::bail!("Execution view stopped unexpectedly");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping execution view");
                return Ok(ExitCode::SUCCESS);
            }
        }

        let state = states.borrow_and_update().clone();
        match state {
            ViewState::Ready(snapshot) => {
                if last.as_ref() != Some(&snapshot) {
                    emit(ViewState::Ready(snapshot.clone()), format, render::execution)?;
                }
                if !snapshot.status.is_active() {
                    return Ok(ExitCode::SUCCESS);
                }
                last = Some(snapshot);
            }
            ViewState::Failed(message) if last.is_none() => return Ok(report_failure(&message)),
            ViewState::Failed(message) => {
                tracing::warn!(error = %message, "Refresh failed, retrying on the next poll");
            }
            ViewState::Idle | ViewState::Loading => {}
        }
    }
}

async fn watch_execution(app: &App, execution_id: String) -> anyhow::Result<ExitCode> {
    let view = ViewHandle::mount(
        ExecutionSource::new(app.api.clone(), execution_id),
        app.config.poll_interval(),
    );
    let mut states = view.subscribe();
    let code = follow(&mut states, app.format, None).await;
    view.unmount();
    code
}

async fn execute(
    app: &App,
    workflow_id: &str,
    input: Option<String>,
    input_file: Option<PathBuf>,
    watch: bool,
) -> anyhow::Result<ExitCode> {
    let buffer = match (input, input_file) {
        (Some(input), _) => input,
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read trigger input from {}", path.display()))?,
        (None, None) => DEFAULT_TRIGGER_INPUT.to_string(),
    };

    let route = match trigger_execution(app.api.as_ref(), workflow_id, &buffer).await {
        Ok(route) => route,
        Err(ActionError::Validation(e)) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
        Err(ActionError::Api(e)) => return Ok(report_failure(&e.to_string())),
    };

    let Route::ExecutionDetail(execution_id) = route.clone() else {
        anyhow::bail!("Unexpected route after triggering an execution: {}", route);
    };

    match app.format {
        Format::Json => print_json(&serde_json::json!({
            "execution_id": execution_id,
            "workflow_id": workflow_id,
            "route": route.to_string(),
        }))?,
        Format::Table => {
            println!("Started execution {}", execution_id);
            println!("View it with: runboard open {}", route);
        }
    }

    if watch {
        watch_execution(app, execution_id).await
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

async fn retry(
    app: &App,
    execution_id: String,
    step_execution_id: &str,
    watch: bool,
) -> anyhow::Result<ExitCode> {
    let view = ViewHandle::mount(
        ExecutionSource::new(app.api.clone(), execution_id.clone()),
        app.config.poll_interval(),
    );
    let state = view.settled().await;
    let snapshot = match state {
        ViewState::Ready(snapshot) => snapshot,
        ViewState::Failed(message) => return Ok(report_failure(&message)),
        ViewState::Idle | ViewState::Loading => {
            anyhow::bail!("Execution view stopped before it finished loading")
        }
    };

    let Some(step) = snapshot.step(step_execution_id).cloned() else {
        return Ok(report_failure(&format!(
            "Step execution {} not found in execution {}",
            step_execution_id, execution_id
        )));
    };

    let dispatcher = StepRetryDispatcher::new(app.api.clone(), execution_id);
    let code = match dispatcher.retry(&step, &view).await {
        Ok(RetryOutcome::Refreshed) => {
            eprintln!("Retry triggered for step {}", step.id);
            let mut states = view.subscribe();
            match view.caught_up().await {
                ViewState::Ready(snapshot) if watch && snapshot.status.is_active() => {
                    emit(ViewState::Ready(snapshot.clone()), app.format, render::execution)?;
                    states.mark_unchanged();
                    follow(&mut states, app.format, Some(snapshot)).await?
                }
                state => emit(state, app.format, render::execution)?,
            }
        }
        Ok(RetryOutcome::NotRetryable) => {
            eprintln!("Step {} is {}; only FAILED steps can be retried", step.id, step.status);
            ExitCode::FAILURE
        }
        Ok(RetryOutcome::AlreadyRetrying) => {
            eprintln!("A retry of step {} is already in progress", step.id);
            ExitCode::FAILURE
        }
        Ok(RetryOutcome::WrongView) => {
            anyhow::bail!("Execution view is not showing execution {}", dispatcher.execution_id())
        }
        Err(e) => report_failure(&e.to_string()),
    };

    view.unmount();
    Ok(code)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("Failed to load configuration")?;
    if let Some(api_url) = &cli.api_url {
        config = config.with_api_url(api_url);
    }
    if let Some(poll_interval_ms) = cli.poll_interval_ms {
        config = config.with_poll_interval_ms(poll_interval_ms);
    }
    config.validate().context("Invalid configuration")?;

    let client = ApiClient::from_config(&config).context("Failed to create API client")?;
    tracing::debug!(api_url = %client.base_url(), "Using backend");

    let app = App {
        api: Arc::new(client),
        config,
        format: cli.format,
    };

    match cli.command {
        Commands::List => show(&app, Route::WorkflowList).await,
        Commands::Workflow { id } => show(&app, Route::WorkflowDetail(id)).await,
        Commands::Execution { id, watch: true } => watch_execution(&app, id).await,
        Commands::Execution { id, watch: false } => show(&app, Route::ExecutionDetail(id)).await,
        Commands::Logs { id } => show(&app, Route::ExecutionLogs(id)).await,
        Commands::Execute {
            workflow_id,
            input,
            input_file,
            watch,
        } => execute(&app, &workflow_id, input, input_file, watch).await,
        Commands::Retry {
            execution_id,
            step_execution_id,
            watch,
        } => retry(&app, execution_id, &step_execution_id, watch).await,
        Commands::Open { path } => {
            let route: Route = path.parse()?;
            show(&app, route).await
        }
    }
}
