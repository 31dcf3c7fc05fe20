//! HTTP client integration tests against a mock server

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use curriculum::{OutputShape, PageRef};
use pathway_agent::backend::{CompletionRequest, LlmBackend, LlmError, OpenAiBackend, ToolSpec};
use pathway_agent::retrieval::{
    Embedder, OpenAiEmbedder, PineconeIndex, RetrievalError, VectorIndex, VideoSearch,
    YouTubeSearch,
};

#[tokio::test]
async fn test_completion_forces_tool_and_extracts_arguments() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "max_completion_tokens": 5000,
            "tool_choice": {"type": "function", "function": {"name": "generateStep"}},
            "messages": [{"role": "system", "content": "Build a step"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "generateStep",
                            "arguments": "{\"name\":\"S\",\"description\":\"D\",\"activities\":[]}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 30}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new(
        format!("{}/v1", server.uri()),
        "gpt-4o",
        Some("sk-test".to_string()),
    );
    let response = backend
        .complete(
            CompletionRequest::system("Build a step")
                .with_max_tokens(5000)
                .with_required_tool(ToolSpec::for_shape(OutputShape::Step)),
        )
        .await
        .unwrap();

    let structured = response.structured.unwrap();
    assert_eq!(structured["name"], "S");
    assert_eq!(response.usage.total(), 150);
}

#[tokio::test]
async fn test_completion_rate_limit() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new(server.uri(), "gpt-4o", None);
    let result = backend.complete(CompletionRequest::system("Hi")).await;

    assert!(matches!(result, Err(LlmError::RateLimited { .. })));
}

#[tokio::test]
async fn test_completion_availability_probe() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new(server.uri(), "gpt-4o", None);
    assert!(backend.is_available().await);
}

#[tokio::test]
async fn test_embedding_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "text-embedding-3-small",
            "input": "Intro to Stoicism Core ideas",
            "encoding_format": "float"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"index": 0, "embedding": [0.1, 0.2, 0.3]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = OpenAiEmbedder::new(
        server.uri(),
        "text-embedding-3-small",
        Some("sk-test".to_string()),
    );
    let vector = embedder.embed("Intro to Stoicism Core ideas").await.unwrap();

    assert_eq!(vector.len(), 3);
}

#[tokio::test]
async fn test_embedding_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let embedder = OpenAiEmbedder::new(server.uri(), "text-embedding-3-small", None);
    let error = embedder.embed("anything").await.unwrap_err();

    assert!(matches!(error, RetrievalError::RequestFailed { .. }));
}

#[tokio::test]
async fn test_pinecone_query() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .and(header("api-key", "pc-key"))
        .and(body_partial_json(json!({"topK": 15, "includeMetadata": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matches": [
                {"id": "a", "score": 0.9, "metadata": {
                    "content": "Some things are within our power",
                    "source_document": "enchiridion.pdf",
                    "page_number": 1.0
                }},
                {"id": "b", "score": 0.8, "metadata": {
                    "content": "Memento mori",
                    "pdf_name": "letters.pdf",
                    "page_number": "24-25"
                }},
                {"id": "c", "score": 0.7, "metadata": {
                    "content": "Virtue is sufficient",
                    "source_document": "ethics.pdf",
                    "pdf_name": "ethics.pdf",
                    "page_number": 3
                }}
            ],
            "namespace": ""
        })))
        .expect(1)
        .mount(&server)
        .await;

    let index = PineconeIndex::new(server.uri(), "pc-key");
    let matches = index.query(&[0.1, 0.2], 15).await.unwrap();

    assert_eq!(matches.len(), 3);
    let passages: Vec<_> = matches.into_iter().filter_map(|m| m.into_passage()).collect();
    assert_eq!(passages[0].metadata.page, PageRef::Number(1));
    assert_eq!(passages[1].metadata.document, "letters.pdf");
    assert_eq!(passages[1].metadata.page, PageRef::Text("24-25".to_string()));
    assert_eq!(passages[2].metadata.document, "ethics.pdf");
}

#[tokio::test]
async fn test_youtube_search() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("part", "snippet"))
        .and(query_param("type", "video"))
        .and(query_param("maxResults", "5"))
        .and(query_param("q", "Intro to Stoicism"))
        .and(query_param("key", "yt-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": {"videoId": "abc"}, "snippet": {"title": "Stoicism", "description": "An intro"}},
                {"id": {"channelId": "UC1"}, "snippet": {"title": "A channel", "description": ""}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let search = YouTubeSearch::new("yt-key").with_base_url(server.uri());
    let videos = search.search("Intro to Stoicism", 5).await.unwrap();

    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].url, "https://www.youtube.com/watch?v=abc");
    assert_eq!(videos[0].title, "Stoicism");
}
