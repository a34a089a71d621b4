mod common;

use axum::{
    Router,
    routing::{get, post},
};
use axum_test::TestServer;
use news_analytics::api::handlers::{job_status_handler, submit_job_handler};
use serde_json::json;
use std::time::Duration;

fn server(ctx: &common::TestContext) -> TestServer {
    let app = Router::new()
        .route("/api/jobs", post(submit_job_handler))
        .route("/api/jobs/{id}", get(job_status_handler))
        .with_state(ctx.state.clone());

    TestServer::new(app).unwrap()
}

async fn poll_until_terminal(server: &TestServer, job_id: &str) -> serde_json::Value {
    for _ in 0..300 {
        let json = server
            .get(&format!("/api/jobs/{job_id}"))
            .await
            .json::<serde_json::Value>();
        if json["state"] == "SUCCESS" || json["state"] == "FAILURE" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not finish");
}

#[tokio::test]
async fn test_submit_and_poll_fetch_job() {
    let ctx = common::create_test_context();
    ctx.feed.push_story(1, "Claude", Some("https://anthropic.com"));
    let server = server(&ctx);

    let response = server
        .post("/api/jobs")
        .json(&json!({ "kind": "fetch_top_items", "limit": 10 }))
        .await;

    response.assert_status(axum::http::StatusCode::ACCEPTED);

    let submitted = response.json::<serde_json::Value>();
    assert_eq!(submitted["state"], "PENDING");
    let job_id = submitted["job_id"].as_str().unwrap().to_string();

    let done = poll_until_terminal(&server, &job_id).await;

    assert_eq!(done["state"], "SUCCESS");
    assert_eq!(done["kind"], "fetch_top_items");
    assert_eq!(done["progress_percent"], 100);
    assert_eq!(done["result"]["processed_count"], 1);
    assert!(done["error"].is_null());
}

#[tokio::test]
async fn test_submit_refresh_summary_job() {
    let ctx = common::create_test_context();
    let server = server(&ctx);

    let submitted = server
        .post("/api/jobs")
        .json(&json!({ "kind": "refresh_summary" }))
        .await
        .json::<serde_json::Value>();

    let done = poll_until_terminal(&server, submitted["job_id"].as_str().unwrap()).await;

    assert_eq!(done["state"], "SUCCESS");
    assert_eq!(done["result"]["total_items"], 0);
    assert!(done["result"].get("generated_at").is_some());
}

#[tokio::test]
async fn test_submit_rejects_out_of_range_limit() {
    let ctx = common::create_test_context();
    let server = server(&ctx);

    let response = server
        .post("/api/jobs")
        .json(&json!({ "kind": "fetch_top_items", "limit": 0 }))
        .await;

    response.assert_status_bad_request();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["error"]["code"], "validation_error");
    assert!(body["error"]["details"].get("limit").is_some());

    let too_large = server
        .post("/api/jobs")
        .json(&json!({ "kind": "fetch_top_items", "limit": 501 }))
        .await;

    too_large.assert_status_bad_request();
}

#[tokio::test]
async fn test_submit_rejects_unknown_kind() {
    let ctx = common::create_test_context();
    let server = server(&ctx);

    let response = server
        .post("/api/jobs")
        .json(&json!({ "kind": "reindex_everything" }))
        .await;

    response.assert_status_unprocessable_entity();
}

#[tokio::test]
async fn test_submit_after_shutdown_is_unavailable() {
    let ctx = common::create_test_context();
    ctx.state.job_runner.shutdown().await;
    let server = server(&ctx);

    let response = server
        .post("/api/jobs")
        .json(&json!({ "kind": "refresh_summary" }))
        .await;

    response.assert_status_service_unavailable();
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let ctx = common::create_test_context();
    let server = server(&ctx);

    let response = server
        .get("/api/jobs/6f1c1c3e-0c1d-4b43-9a55-3c1f0e2f9a10")
        .await;

    response.assert_status_not_found();
    assert_eq!(response.json::<serde_json::Value>()["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_malformed_job_id_is_rejected() {
    let ctx = common::create_test_context();
    let server = server(&ctx);

    let response = server.get("/api/jobs/not-a-uuid").await;

    response.assert_status_bad_request();
}
