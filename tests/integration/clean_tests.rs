//! Integration tests for the rewrite client and cleaning pipeline
//!
//! A wiremock server stands in for the chat-completion service.

use docsift::cleaner::{CleaningPipeline, CleaningSettings};
use docsift::config::RewriteConfig;
use docsift::progress::{NoopReporter, RecordingReporter};
use docsift::rewrite::{RewriteClient, RewriteError, RewriteRequest, Rewriter};
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn rewrite_config(server: &MockServer) -> RewriteConfig {
    RewriteConfig {
        api_key: "test-key".to_string(),
        api_endpoint: server.uri(),
        ..RewriteConfig::default()
    }
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "cmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    }))
}

fn error_body(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "error": { "message": message, "type": "invalid_request_error", "code": code }
    }))
}

fn write_doc(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_clean_file_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "deepseek-chat",
            "max_tokens": 4000,
            "messages": [{ "role": "system" }, { "role": "user" }]
        })))
        .respond_with(completion("# Guide\n\nCleaned body"))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let input = write_doc(&tmp, "doc.md", "# Guide\n\n[Home](/) | [Login](/login)\n\nBody");
    let pipeline = CleaningPipeline::from_config(&rewrite_config(&server)).unwrap();

    let result = pipeline.clean_file(&input, &NoopReporter).await;

    assert!(result.success, "{}", result.detail);
    let output = tmp.path().join("Cleandone-doc.md");
    assert_eq!(result.detail, output.display().to_string());
    assert_eq!(
        std::fs::read_to_string(output).unwrap(),
        "# Guide\n\nCleaned body"
    );
}

#[tokio::test]
async fn test_auth_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(error_body(401, "invalid_api_key", "Authentication Fails"))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let input = write_doc(&tmp, "doc.md", "body");
    let pipeline = CleaningPipeline::from_config(&rewrite_config(&server)).unwrap();
    let reporter = RecordingReporter::new();

    let result = pipeline.clean_file(&input, &reporter).await;

    assert!(!result.success);
    assert_eq!(result.attempts, 1);
    assert!(result.detail.contains("API key"));
    assert_eq!(
        reporter.percents_for(&input.display().to_string()).last(),
        Some(&-1)
    );
}

#[tokio::test]
async fn test_missing_model_fails_fast() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(error_body(404, "model_not_found", "The model does not exist"))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let input = write_doc(&tmp, "doc.md", "body");
    let config = RewriteConfig {
        model: "deepseek-imaginary".to_string(),
        ..rewrite_config(&server)
    };
    let pipeline = CleaningPipeline::from_config(&config).unwrap();

    let result = pipeline.clean_file(&input, &NoopReporter).await;

    assert!(!result.success);
    assert!(result.detail.contains("'deepseek-imaginary'"));
}

#[tokio::test]
async fn test_wrong_endpoint_path_is_not_a_missing_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("404 page not found"))
        .mount(&server)
        .await;

    let client = RewriteClient::new(&rewrite_config(&server)).unwrap();
    let request = RewriteRequest::compose("body", 100_000);

    let err = client
        .rewrite(&request, Duration::from_secs(5))
        .await
        .unwrap_err();

    assert!(matches!(err, RewriteError::Service { status: 404, .. }));
}

#[tokio::test]
async fn test_missing_model_by_error_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(error_body(400, "model_not_found", "Model Not Exist"))
        .mount(&server)
        .await;

    let client = RewriteClient::new(&rewrite_config(&server)).unwrap();
    let request = RewriteRequest::compose("body", 100_000);

    let err = client
        .rewrite(&request, Duration::from_secs(5))
        .await
        .unwrap_err();

    assert!(matches!(err, RewriteError::ModelNotFound { ref model } if model == "deepseek-chat"));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("late").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = RewriteClient::new(&rewrite_config(&server)).unwrap();
    let request = RewriteRequest::compose("body", 100_000);

    let err = client
        .rewrite(&request, Duration::from_millis(200))
        .await
        .unwrap_err();

    assert!(matches!(err, RewriteError::Timeout));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_malformed_response_is_bad_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = RewriteClient::new(&rewrite_config(&server)).unwrap();
    let request = RewriteRequest::compose("body", 100_000);

    let err = client
        .rewrite(&request, Duration::from_secs(5))
        .await
        .unwrap_err();

    assert!(matches!(err, RewriteError::BadResponse(_)));
}

#[tokio::test]
async fn test_server_error_then_success_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(error_body(500, "server_error", "overloaded"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(completion("recovered"))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let input = write_doc(&tmp, "doc.md", "body");
    let pipeline = CleaningPipeline::from_config(&rewrite_config(&server)).unwrap();

    let result = pipeline.clean_file(&input, &NoopReporter).await;

    assert!(result.success, "{}", result.detail);
    assert_eq!(result.attempts, 2);
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("Cleandone-doc.md")).unwrap(),
        "recovered"
    );
}

#[tokio::test]
async fn test_pipeline_timeout_exhausts_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("late").set_delay(Duration::from_secs(3)))
        .expect(2)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let input = write_doc(&tmp, "doc.md", "body");
    let client = RewriteClient::new(&rewrite_config(&server)).unwrap();
    let settings = CleaningSettings {
        max_retries: 2,
        timeout: Duration::from_millis(300),
        ..CleaningSettings::default()
    };
    let pipeline = CleaningPipeline::new(client, settings);

    let result = pipeline.clean_file(&input, &NoopReporter).await;

    assert!(!result.success);
    assert_eq!(result.attempts, 2);
    assert!(result.detail.contains("timed out after 2 attempt"));
}

#[tokio::test]
async fn test_clean_directory_against_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("clean"))
        .expect(2)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join("sub")).unwrap();
    write_doc(&tmp, "a.md", "one");
    write_doc(&tmp, "sub/b.markdown", "two");
    write_doc(&tmp, "skip.txt", "three");
    let pipeline = CleaningPipeline::from_config(&rewrite_config(&server)).unwrap();

    let results = pipeline
        .clean_directory(tmp.path(), &NoopReporter)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.success));
    assert!(tmp.path().join("Cleandone-a.md").exists());
    assert!(tmp.path().join("sub/Cleandone-b.markdown").exists());
}

#[test]
fn test_client_requires_api_key() {
    let config = RewriteConfig::default();
    assert!(matches!(
        RewriteClient::new(&config),
        Err(RewriteError::Config(_))
    ));
}
