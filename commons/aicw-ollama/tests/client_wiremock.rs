use std::time::Duration;

use aicw_ollama::{ModelRuntime, OllamaClient, OllamaError, pattern_variant};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

fn client(server: &MockServer) -> OllamaClient {
    OllamaClient::new(server.uri(), Duration::from_secs(5)).expect("client")
}

fn ndjson(lines: &[serde_json::Value]) -> ResponseTemplate {
    let body = lines
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/x-ndjson")
        .set_body_string(body + "\n")
}

#[tokio::test]
async fn list_models_reads_tags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {"name": "gemma2:2b", "model": "gemma2:2b", "size": 1629518495u64},
                {"name": "llama3:latest", "model": "llama3:latest"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let models = client(&server).list_models().await.unwrap();
    let names: Vec<_> = models.iter().map(|m| m.identifier()).collect();
    assert_eq!(names, vec!["gemma2:2b", "llama3:latest"]);
}

#[tokio::test]
async fn does_model_exist_treats_untagged_as_latest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "llama3:latest"}]
        })))
        .mount(&server)
        .await;

    let c = client(&server);
    assert!(c.does_model_exist("llama3").await.unwrap());
    assert!(c.does_model_exist("llama3:latest").await.unwrap());
    assert!(!c.does_model_exist("llama3:8b").await.unwrap());
}

#[tokio::test]
async fn pull_follows_stream_to_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .and(body_partial_json(json!({"model": "gemma2:2b", "stream": true})))
        .respond_with(ndjson(&[
            json!({"status": "pulling manifest"}),
            json!({"status": "pulling 7462734796d6", "digest": "sha256:7462", "total": 100, "completed": 40}),
            json!({"status": "verifying sha256 digest"}),
            json!({"status": "success"}),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).pull_model("gemma2:2b").await.unwrap();
}

#[tokio::test]
async fn pull_error_line_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .respond_with(ndjson(&[
            json!({"status": "pulling manifest"}),
            json!({"error": "pull model manifest: file does not exist"}),
        ]))
        .mount(&server)
        .await;

    let err = client(&server).pull_model("missing").await.unwrap_err();
    assert!(matches!(err, OllamaError::Remote(_)), "{err:?}");
}

#[tokio::test]
async fn pull_without_success_is_incomplete() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .respond_with(ndjson(&[json!({"status": "pulling manifest"})]))
        .mount(&server)
        .await;

    let err = client(&server).pull_model("gemma2:2b").await.unwrap_err();
    assert!(matches!(err, OllamaError::Incomplete { operation: "pull" }));
}

#[tokio::test]
async fn pull_http_error_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client(&server).pull_model("gemma2:2b").await.unwrap_err();
    match err {
        OllamaError::Status {
            endpoint,
            status,
            body,
        } => {
            assert_eq!(endpoint, "/api/pull");
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn create_sends_base_system_and_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/create"))
        .and(body_partial_json(json!({
            "model": "gemma2:2b-translate",
            "from": "gemma2:2b",
            "parameters": {"temperature": 0.1, "top_p": 0.5, "top_k": 40, "seed": 1},
            "stream": false
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "success"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let file = pattern_variant("gemma2:2b", "translate").unwrap();
    client(&server)
        .create_model("gemma2:2b-translate", &file)
        .await
        .unwrap();
}

#[tokio::test]
async fn list_running_models_reads_ps() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "gemma2:2b", "model": "gemma2:2b", "size": 5137025024u64}]
        })))
        .mount(&server)
        .await;

    let running = client(&server).list_running_models().await.unwrap();
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].identifier(), "gemma2:2b");
}
