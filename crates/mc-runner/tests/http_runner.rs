//! HttpJobRunner against a local fake Job Runner.

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use mc_runner::{HttpJobRunner, JobRequest, JobRunner, JobRunnerConfig, JobRunnerError};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn fake_runner() -> Router {
    Router::new()
        .route(
            "/submit-job",
            post(|Json(req): Json<JobRequest>| async move {
                if req.image == "bad" {
                    return (StatusCode::BAD_REQUEST, Json(json!({"detail": "bad image"})));
                }
                let env_keys: Vec<String> = req.env.keys().cloned().collect();
                (
                    StatusCode::OK,
                    Json(json!({
                        "job_name": format!("{}-{}", req.provider_label_value, env_keys.join("-")),
                        "namespace": req.namespace,
                    })),
                )
            }),
        )
        .route(
            "/jobs/:namespace/:job_id/logs",
            get(
                |Path((namespace, job_id)): Path<(String, String)>,
                 Query(q): Query<HashMap<String, String>>| async move {
                    if job_id == "missing" {
                        return (StatusCode::NOT_FOUND, Json(json!({"detail": "no such job"})));
                    }
                    if job_id == "broken" {
                        return (StatusCode::BAD_GATEWAY, Json(json!({"detail": "pod gone"})));
                    }
                    if job_id == "pending" {
                        return (
                            StatusCode::OK,
                            Json(json!({"pod": null, "phase": "Pending", "logs": null})),
                        );
                    }
                    let timeout = q.get("timeout").cloned().unwrap_or_default();
                    (
                        StatusCode::OK,
                        Json(json!({
                            "pod": format!("{}-abc", job_id),
                            "phase": "Succeeded",
                            "logs": format!("ns={} timeout={}\n", namespace, timeout),
                        })),
                    )
                },
            ),
        )
        .route(
            "/slow/submit-job",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(Value::Null)
            }),
        )
}

fn job(image: &str) -> JobRequest {
    let mut env = BTreeMap::new();
    env.insert("A".to_string(), "1".to_string());
    env.insert("B".to_string(), "two=2".to_string());
    JobRequest {
        image: image.to_string(),
        script: "print('hi')".to_string(),
        provider_label_value: "node-1".to_string(),
        namespace: "mutualcloud".to_string(),
        env,
        backoff_limit: 0,
        ttl_seconds_after_finished: 300,
    }
}

fn runner(base_url: String) -> HttpJobRunner {
    HttpJobRunner::new(JobRunnerConfig {
        base_url,
        submit_timeout: Duration::from_millis(500),
        log_wait_secs: 7,
        log_margin: Duration::from_secs(1),
    })
}

#[tokio::test]
async fn submit_sends_job_and_parses_submission() {
    let base = spawn(fake_runner()).await;
    let sub = runner(base).submit_job(&job("python:3.11-slim")).await.unwrap();
    assert_eq!(sub.job_name, "node-1-A-B");
    assert_eq!(sub.namespace, "mutualcloud");
}

#[tokio::test]
async fn submit_non_success_is_status_error() {
    let base = spawn(fake_runner()).await;
    let err = runner(base).submit_job(&job("bad")).await.unwrap_err();
    match err {
        JobRunnerError::Status { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("bad image"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn submit_times_out_as_transport_error() {
    let base = spawn(fake_runner()).await;
    let err = runner(format!("{}/slow", base))
        .submit_job(&job("python:3.11-slim"))
        .await
        .unwrap_err();
    assert!(matches!(err, JobRunnerError::Transport(_)));
}

#[tokio::test]
async fn unreachable_runner_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = runner(format!("http://{}", addr))
        .submit_job(&job("python:3.11-slim"))
        .await
        .unwrap_err();
    assert!(matches!(err, JobRunnerError::Transport(_)));
}

#[tokio::test]
async fn fetch_logs_passes_wait_and_returns_verbatim_logs() {
    let base = spawn(fake_runner()).await;
    let res = runner(base).fetch_logs("mutualcloud", "job-1").await.unwrap();
    assert_eq!(res.job_id, "job-1");
    assert_eq!(res.namespace, "mutualcloud");
    assert_eq!(res.pod.as_deref(), Some("job-1-abc"));
    assert_eq!(res.phase, "Succeeded");
    assert_eq!(res.logs, "ns=mutualcloud timeout=7\n");
}

#[tokio::test]
async fn fetch_logs_maps_404_and_other_failures() {
    let base = spawn(fake_runner()).await;
    let r = runner(base);
    assert!(matches!(
        r.fetch_logs("mutualcloud", "missing").await,
        Err(JobRunnerError::NotFound(_))
    ));
    assert!(matches!(
        r.fetch_logs("mutualcloud", "broken").await,
        Err(JobRunnerError::Status { status: 502, .. })
    ));
}

#[tokio::test]
async fn fetch_logs_accepts_null_fields_before_pod_starts() {
    let base = spawn(fake_runner()).await;
    let res = runner(base).fetch_logs("mutualcloud", "pending").await.unwrap();
    assert_eq!(res.job_id, "pending");
    assert!(res.pod.is_none());
    assert_eq!(res.phase, "Pending");
    assert_eq!(res.logs, "");
}
