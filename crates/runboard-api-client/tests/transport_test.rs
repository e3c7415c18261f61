//! Transport and domain-operation tests against a local mock backend.

use mockito::Matcher;
use runboard_api_client::{ApiClient, ApiError, WorkflowApi, UNKNOWN_ERROR};
use runboard_core::models::{ExecuteWorkflowRequest, ExecutionStatus};
use serde_json::json;

async fn setup() -> (mockito::ServerGuard, ApiClient) {
    let server = mockito::Server::new_async().await;
    let client = ApiClient::new(&server.url()).unwrap();
    (server, client)
}

#[tokio::test]
async fn test_list_workflows() {
    let (mut server, client) = setup().await;
    let mock = server
        .mock("GET", "/api/workflows")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {"id": "wf-1", "name": "Import", "version": 1, "created_at": "2024-01-01T00:00:00"},
                {"id": "wf-2", "name": "Export", "version": 4, "description": "Nightly",
                 "created_at": "2024-01-02T00:00:00Z"}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let workflows = client.list_workflows().await.unwrap();

    mock.assert_async().await;
    assert_eq!(workflows.len(), 2);
    assert_eq!(workflows[1].description.as_deref(), Some("Nightly"));
}

#[tokio::test]
async fn test_get_workflow_detail() {
    let (mut server, client) = setup().await;
    let mock = server
        .mock("GET", "/api/workflows/wf-1")
        .with_status(200)
        .with_body(
            json!({
                "id": "wf-1", "name": "Import", "version": 2,
                "created_at": "2024-01-01T00:00:00",
                "steps": [{"id": "s-1", "workflow_id": "wf-1", "type": "http", "order": 1,
                           "config": {"method": "GET"}}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let detail = client.get_workflow("wf-1").await.unwrap();

    mock.assert_async().await;
    assert_eq!(detail.steps.len(), 1);
    assert_eq!(detail.steps[0].step_type, "http");
}

#[tokio::test]
async fn test_execute_workflow_posts_trigger_input() {
    let (mut server, client) = setup().await;
    let mock = server
        .mock("POST", "/api/workflows/wf-1/execute")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({"trigger_input": {"order_id": 7}})))
        .with_status(201)
        .with_body(
            json!({
                "execution_id": "ex-1",
                "workflow_id": "wf-1",
                "status": "PENDING",
                "started_at": "2024-01-01T00:00:00"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let request = ExecuteWorkflowRequest {
        trigger_input: json!({"order_id": 7}).as_object().cloned(),
    };
    let response = client.execute_workflow("wf-1", &request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.execution_id, "ex-1");
    assert_eq!(response.status, ExecutionStatus::Pending);
}

#[tokio::test]
async fn test_get_execution_and_logs() {
    let (mut server, client) = setup().await;
    let execution_mock = server
        .mock("GET", "/api/executions/ex-1")
        .with_status(200)
        .with_body(
            json!({
                "id": "ex-1", "workflow_id": "wf-1", "status": "running",
                "started_at": "2024-01-01T00:00:00",
                "step_executions": [{"id": "se-1", "step_id": "s-1", "status": "RUNNING"}]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let logs_mock = server
        .mock("GET", "/api/executions/ex-1/logs")
        .with_status(200)
        .with_body(
            json!([{
                "id": "l-1", "workflow_execution_id": "ex-1", "event_type": "STEP_STARTED",
                "message": "Step started", "timestamp": "2024-01-01T00:00:01",
                "metadata": {"attempt": 1}
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let execution = client.get_execution("ex-1").await.unwrap();
    let logs = client.get_execution_logs("ex-1").await.unwrap();

    execution_mock.assert_async().await;
    logs_mock.assert_async().await;
    assert_eq!(execution.status, ExecutionStatus::Running);
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].event_type, "STEP_STARTED");
}

#[tokio::test]
async fn test_retry_step_ignores_success_body() {
    let (mut server, client) = setup().await;
    let mock = server
        .mock("POST", "/api/executions/ex-1/steps/se-2/retry")
        .with_status(202)
        .with_body("queued")
        .create_async()
        .await;

    client.retry_step("ex-1", "se-2").await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_detail_surfaces_for_any_status() {
    let (mut server, client) = setup().await;
    for (status, path) in [(400, "wf-a"), (404, "wf-b"), (500, "wf-c")] {
        let _mock = server
            .mock("GET", format!("/api/workflows/{}", path).as_str())
            .with_status(status)
            .with_body(json!({"detail": "Workflow not found"}).to_string())
            .create_async()
            .await;

        let err = client.get_workflow(path).await.unwrap_err();
        assert_eq!(err.to_string(), "Workflow not found");
        assert_eq!(err.status(), Some(status as u16));
    }
}

#[tokio::test]
async fn test_unparseable_error_body_uses_fallback() {
    let (mut server, client) = setup().await;
    let _mock = server
        .mock("POST", "/api/executions/ex-1/steps/se-1/retry")
        .with_status(502)
        .with_body("<html>bad gateway</html>")
        .create_async()
        .await;

    let err = client.retry_step("ex-1", "se-1").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Http {
            status: 502,
            message: UNKNOWN_ERROR.to_string()
        }
    );
}

#[tokio::test]
async fn test_error_without_detail_uses_status() {
    let (mut server, client) = setup().await;
    let _mock = server
        .mock("GET", "/api/workflows")
        .with_status(503)
        .with_body(json!({"message": "maintenance"}).to_string())
        .create_async()
        .await;

    let err = client.list_workflows().await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 503");
}

#[tokio::test]
async fn test_malformed_success_body_is_decode_error() {
    let (mut server, client) = setup().await;
    let _mock = server
        .mock("GET", "/api/executions/ex-1")
        .with_status(200)
        .with_body(json!({"id": "ex-1"}).to_string())
        .create_async()
        .await;

    let err = client.get_execution("ex-1").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let client = ApiClient::new("http://127.0.0.1:1").unwrap();
    let err = client.list_workflows().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
