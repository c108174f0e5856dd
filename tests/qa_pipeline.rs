//! End-to-end pipeline tests: a real `ProcessingService` behind the Axum router, with
//! `httpmock` standing in for the embedding and generation providers.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use httpmock::{Method::POST, MockServer};
use serde_json::json;
use snapqa::api::create_router;
use snapqa::config::{CONFIG, Config, EmbeddingProvider};
use snapqa::embedding::OllamaEmbeddingClient;
use snapqa::generation::OpenAiGenerationClient;
use snapqa::processing::ProcessingService;
use std::sync::{Arc, Once};
use tower::ServiceExt;

const BOUNDARY: &str = "snapqa-itest-boundary";

fn ensure_config() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let upload_dir = std::env::temp_dir()
            .join("snapqa-pipeline-tests")
            .to_string_lossy()
            .into_owned();
        let _ = CONFIG.set(Config {
            openai_api_key: None,
            openai_base_url: "http://127.0.0.1:9".into(),
            generation_model: "gpt-4o-mini".into(),
            embedding_provider: EmbeddingProvider::Ollama,
            embedding_model: "all-minilm".into(),
            embedding_dimension: 2,
            ollama_url: None,
            upload_dir,
            retrieval_top_k: 3,
            server_port: None,
        });
    });
}

/// Build a router around a real service whose clients target the given mock servers.
fn router_for(embedding_server: &MockServer, generation_server: &MockServer) -> Router {
    ensure_config();
    let service = ProcessingService::with_clients(
        Box::new(OllamaEmbeddingClient::new(
            embedding_server.base_url(),
            "all-minilm".into(),
        )),
        Box::new(OpenAiGenerationClient::new(
            generation_server.base_url(),
            None,
            "gpt-4o-mini".into(),
        )),
    );
    create_router(Arc::new(service))
}

fn upload_request(filename: &str, contents: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n{contents}\r\n--{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("upload request")
}

fn question_request(question: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/qa")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "question": question }).to_string()))
        .expect("question request")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn upload_then_question_round_trip() {
    let embedding_server = MockServer::start_async().await;
    let generation_server = MockServer::start_async().await;
    let app = router_for(&embedding_server, &generation_server);

    // Chunk embeddings for "Alpha. Beta. Gamma".
    let chunk_embed = embedding_server
        .mock_async(|when, then| {
            when.method(POST).path("/api/embed").body_contains("Alpha");
            then.status(200).json_body(json!({
                "model": "all-minilm",
                "embeddings": [[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]
            }));
        })
        .await;
    // Query embedding, nearest to the "Alpha" chunk.
    let query_embed = embedding_server
        .mock_async(|when, then| {
            when.method(POST).path("/api/embed").body_contains("closest");
            then.status(200).json_body(json!({
                "model": "all-minilm",
                "embeddings": [[0.9, 0.1]]
            }));
        })
        .await;
    let summary_call = generation_server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("Summarize the key points");
            then.status(200).json_body(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "**Summary** of\n\nthe doc" } }
                ]
            }));
        })
        .await;
    // The QA prompt must carry the retrieved chunks in ascending-distance order.
    let answer_call = generation_server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("Alpha Gamma Beta")
                .body_contains("Question: Which item is closest?");
            then.status(200).json_body(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": " Alpha is closest. " } }
                ]
            }));
        })
        .await;

    let response = app
        .clone()
        .oneshot(upload_request("notes.txt", "Alpha. Beta. Gamma"))
        .await
        .expect("upload response");
    assert_eq!(response.status(), StatusCode::OK);
    let upload = json_body(response).await;
    assert_eq!(upload["filename"], "notes.txt");
    assert_eq!(upload["chunks_indexed"], 3);
    assert_eq!(upload["summary"], "Summary of the doc");
    chunk_embed.assert();
    summary_call.assert();

    let response = app
        .clone()
        .oneshot(question_request("Which item is closest?"))
        .await
        .expect("qa response");
    assert_eq!(response.status(), StatusCode::OK);
    let qa = json_body(response).await;
    assert_eq!(qa["answer"], "Alpha is closest.");
    query_embed.assert();
    answer_call.assert();

    // Transcript and counters reflect the exchange.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/history")
                .body(Body::empty())
                .expect("history request"),
        )
        .await
        .expect("history response");
    let history = json_body(response).await;
    assert_eq!(history["messages"][0]["text"], "Which item is closest?");
    assert_eq!(history["messages"][0]["from_user"], true);
    assert_eq!(history["messages"][1]["text"], "Alpha is closest.");
    assert_eq!(history["messages"][1]["from_user"], false);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .expect("metrics request"),
        )
        .await
        .expect("metrics response");
    let metrics = json_body(response).await;
    assert_eq!(metrics["documents_indexed"], 1);
    assert_eq!(metrics["chunks_indexed"], 3);
    assert_eq!(metrics["questions_answered"], 1);
}

#[tokio::test]
async fn question_in_fresh_process_is_a_client_error() {
    let embedding_server = MockServer::start_async().await;
    let generation_server = MockServer::start_async().await;
    let app = router_for(&embedding_server, &generation_server);

    let response = app
        .oneshot(question_request("Anything indexed yet?"))
        .await
        .expect("qa response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(
        body["error"]
            .as_str()
            .expect("error string")
            .contains("No document uploaded")
    );
}

#[tokio::test]
async fn generation_failure_leaves_an_orphaned_user_message() {
    let embedding_server = MockServer::start_async().await;
    let generation_server = MockServer::start_async().await;
    let app = router_for(&embedding_server, &generation_server);

    embedding_server
        .mock_async(|when, then| {
            when.method(POST).path("/api/embed").body_contains("Solo");
            then.status(200).json_body(json!({
                "model": "all-minilm",
                "embeddings": [[1.0, 0.0]]
            }));
        })
        .await;
    generation_server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("Summarize the key points");
            then.status(200).json_body(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Solo." } }]
            }));
        })
        .await;
    generation_server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("Question:");
            then.status(500).body("model overloaded");
        })
        .await;

    let response = app
        .clone()
        .oneshot(upload_request("solo.txt", "Solo"))
        .await
        .expect("upload response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(question_request("Solo?"))
        .await
        .expect("qa response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/history")
                .body(Body::empty())
                .expect("history request"),
        )
        .await
        .expect("history response");
    let history = json_body(response).await;
    let messages = history["messages"].as_array().expect("messages array");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], "Solo?");
    assert_eq!(messages[0]["from_user"], true);
}
