//! Plain-text rendering of the dashboard views.
//!
//! Each function renders one fully loaded snapshot. Loading and error states are
//! handled by the caller, so a rendered view is never partial.

use chrono::{DateTime, Utc};
use runboard_core::models::{
    ExecutionLog, ExecutionStatus, StepExecution, Workflow, WorkflowDetail, WorkflowExecution,
};
use runboard_core::format_duration_ms;
use serde_json::{Map, Value};

use crate::truncate_string;

const DATE: &str = "%Y-%m-%d";
const DATE_TIME: &str = "%Y-%m-%d %H:%M:%S";
const TIME: &str = "%H:%M:%S";

fn pretty_json(map: &Map<String, Value>, indent: usize) -> Vec<String> {
    let text = serde_json::to_string_pretty(map).unwrap_or_else(|_| "{}".to_string());
    let pad = " ".repeat(indent);
    text.lines().map(|line| format!("{}{}", pad, line)).collect()
}

fn format_optional(at: Option<DateTime<Utc>>, format: &str) -> String {
    at.map(|at| at.format(format).to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn workflow_list(workflows: &[Workflow]) -> String {
    let mut lines = vec![
        "=== Workflows ===".to_string(),
        "Manage and execute your automation workflows".to_string(),
        String::new(),
    ];

    if workflows.is_empty() {
        lines.push("No workflows found".to_string());
        lines.push("Create a workflow to get started".to_string());
        return lines.join("\n") + "\n";
    }

    lines.push(format!(
        "{:<36} {:<30} {:>6} {:<10} {}",
        "ID", "Name", "Ver", "Created", "Description"
    ));
    lines.push("-".repeat(120));

    for workflow in workflows {
        lines.push(
            format!(
                "{:<36} {:<30} {:>6} {:<10} {}",
                truncate_string(&workflow.id, 36),
                truncate_string(&workflow.name, 30),
                format!("v{}", workflow.version),
                workflow.created_at.format(DATE),
                workflow
                    .description
                    .as_deref()
                    .map(|d| truncate_string(d, 40))
                    .unwrap_or_default()
            )
            .trim_end()
            .to_string(),
        );
    }

    lines.join("\n") + "\n"
}

pub fn workflow_detail(workflow: &WorkflowDetail) -> String {
    let mut lines = vec![format!("=== {} (v{}) ===", workflow.name, workflow.version)];
    if let Some(description) = &workflow.description {
        lines.push(description.clone());
    }
    lines.push(String::new());
    lines.push(format!("ID:      {}", workflow.id));
    lines.push(format!("Created: {}", workflow.created_at.format(DATE)));
    lines.push(format!("Execute: runboard execute {} --input '<json>'", workflow.id));
    lines.push(String::new());
    lines.push("--- Steps ---".to_string());

    if workflow.steps.is_empty() {
        lines.push("No steps defined".to_string());
    }

    for step in &workflow.steps {
        lines.push(format!("Step {}  [{}]", step.order, step.step_type));
        if let Some(config) = step.visible_config() {
            lines.push("  Configuration:".to_string());
            lines.extend(pretty_json(config, 4));
        }
    }

    lines.join("\n") + "\n"
}

/// Execution header, result banner and step timeline.
pub fn execution(execution: &WorkflowExecution) -> String {
    let mut lines = vec![
        format!("=== Execution Details === [{}]", execution.status),
        String::new(),
        format!("ID:       {}", execution.id),
        format!("Workflow: {}", execution.workflow_id),
        format!("Started:  {}", execution.started_at.format(DATE_TIME)),
    ];

    if let Some(finished_at) = execution.finished_at {
        lines.push(format!("Finished: {}", finished_at.format(DATE_TIME)));
        lines.push(format!(
            "Duration: {}",
            execution
                .duration_ms()
                .map(format_duration_ms)
                .unwrap_or_else(|| "N/A".to_string())
        ));
    }
    lines.push(format!("Logs:     runboard logs {}", execution.id));

    match execution.status {
        ExecutionStatus::Success => {
            lines.push(String::new());
            lines.push("Execution Successful".to_string());
            lines.push(format!(
                "Workflow completed successfully at {}",
                format_optional(execution.finished_at, DATE_TIME)
            ));
        }
        ExecutionStatus::Failed => {
            lines.push(String::new());
            lines.push("Execution Failed".to_string());
            lines.push(format!(
                "Workflow failed at {}. Check step executions below for details.",
                format_optional(execution.finished_at, DATE_TIME)
            ));
        }
        _ => {}
    }

    lines.push(String::new());
    lines.push("--- Step Executions ---".to_string());
    if execution.step_executions.is_empty() {
        lines.push("No step executions yet".to_string());
    }
    for (index, step) in execution.step_executions.iter().enumerate() {
        lines.extend(step_lines(&execution.id, index, step));
    }

    lines.join("\n") + "\n"
}

fn step_lines(execution_id: &str, index: usize, step: &StepExecution) -> Vec<String> {
    let mut header = format!("Step {}  {}", index + 1, step.status);
    if step.is_retry {
        header.push_str(&format!("  Retry #{}", step.retry_count));
    }
    let mut lines = vec![header];

    if let Some(started_at) = step.started_at {
        let mut timing = format!("  Started: {}", started_at.format(TIME));
        if let Some(ms) = step.duration_ms() {
            timing.push_str(&format!("  Duration: {}", format_duration_ms(ms)));
        }
        lines.push(timing);
    }

    if let Some(error) = &step.error {
        match &step.error_type {
            Some(error_type) => lines.push(format!("  Error ({}): {}", error_type.label(), error)),
            None => lines.push(format!("  Error: {}", error)),
        }
    }

    if step.is_retryable() {
        lines.push(format!("  Retry:   runboard retry {} {}", execution_id, step.id));
    }

    if let Some(output) = step.visible_output() {
        lines.push("  Output:".to_string());
        lines.extend(pretty_json(output, 4));
    }

    lines
}

pub fn logs(execution_id: &str, logs: &[ExecutionLog]) -> String {
    let mut lines = vec![
        "=== Execution Logs ===".to_string(),
        format!("Execution: {}", execution_id),
        format!("{} log entries", logs.len()),
        String::new(),
    ];

    if logs.is_empty() {
        lines.push("No logs available".to_string());
    }

    for log in logs {
        lines.push(format!(
            "{}  {:<20} {}",
            log.timestamp.format(TIME),
            log.event_type,
            log.message
        ));
        if let Some(metadata) = log.visible_metadata() {
            lines.extend(pretty_json(metadata, 4));
        }
    }

    lines.join("\n") + "\n"
}

/// Error view: the surfaced message plus how to retry.
pub fn failure(message: &str) -> String {
    format!("Error\n{}\nRun the command again to retry.\n", message)
}
