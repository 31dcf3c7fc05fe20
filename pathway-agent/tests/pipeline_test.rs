//! End-to-end pipeline tests over mock services

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use curriculum::{Activity, Pathway, PathwayBrief, Step, VideoReference};
use pathway_agent::backend::{CompletionRequest, CompletionResponse, LlmBackend, LlmError, MockBackend};
use pathway_agent::retrieval::{MockEmbedder, MockVectorIndex, MockVideoSearch, VectorMatch};
use pathway_agent::{
    ContextRetriever, PathwayService, PipelineConfig, RegeneratedItem, RegenerationRequest,
};

struct Harness {
    backend: Arc<MockBackend>,
    embedder: Arc<MockEmbedder>,
    index: Arc<MockVectorIndex>,
    videos: Arc<MockVideoSearch>,
    service: PathwayService,
}

fn video(n: u32) -> VideoReference {
    VideoReference::new(
        format!("Stoicism lecture {}", n),
        format!("https://www.youtube.com/watch?v=stoa{}", n),
        format!("Lecture {} on Stoic ethics", n),
    )
}

fn passages() -> Vec<VectorMatch> {
    vec![
        VectorMatch::new("p1", "Some things are within our power", "enchiridion.pdf", json!(1)),
        VectorMatch::new("p2", "Waste no more time arguing", "meditations.pdf", json!(10.0)),
        VectorMatch::new("p3", "Luck is what happens", "letters.pdf", json!("24-25")),
    ]
}

fn harness(structured: Value, candidates: Vec<VideoReference>) -> Harness {
    build(
        MockBackend::default().with_structured(structured),
        MockVideoSearch::new(candidates),
        PipelineConfig::default(),
    )
}

fn build(backend: MockBackend, videos: MockVideoSearch, config: PipelineConfig) -> Harness {
    let backend = Arc::new(backend);
    let embedder = Arc::new(MockEmbedder::default());
    let index = Arc::new(MockVectorIndex::new(passages()));
    let videos = Arc::new(videos);
    let retriever = ContextRetriever::new(embedder.clone(), index.clone(), videos.clone());
    let service = PathwayService::new(backend.clone(), retriever, config);

    Harness {
        backend,
        embedder,
        index,
        videos,
        service,
    }
}

fn stoicism_brief() -> PathwayBrief {
    PathwayBrief {
        name: "Intro to Stoicism".to_string(),
        overview: "The core ideas of Stoic philosophy".to_string(),
        learning_outcomes: "Apply the dichotomy of control".to_string(),
        audience: "Curious beginners".to_string(),
        rationale: "Build resilience".to_string(),
    }
}

fn generated_step(n: usize, video_urls: &[&str]) -> Value {
    json!({
        "name": format!("Stage {}", n),
        "description": "Learn and practise",
        "activities": [
            {"name": "Read", "description": "Read the passage", "readData": "Enchiridion 1"},
            {"name": "Watch", "description": "Watch a lecture", "videoUrls": video_urls},
            {"name": "Reflect", "description": "Journal tonight"}
        ]
    })
}

fn existing_pathway() -> Pathway {
    Pathway::new("Intro to Stoicism", "The core ideas of Stoic philosophy")
        .with_step(
            Step::new("Foundations", "Where it started")
                .with_activity(Activity::new("Read Zeno", "Early Stoa"))
                .with_activity(
                    Activity::new("Watch", "A lecture").with_video_urls([video(1).url]),
                ),
        )
        .with_step(
            Step::new("Practice", "Daily exercises")
                .with_activity(Activity::new("Evening review", "Seneca's practice")),
        )
}

#[tokio::test]
async fn test_stoicism_generation_respects_video_whitelist() {
    let candidates = vec![video(1), video(2)];
    let steps: Vec<Value> = (1..=5)
        .map(|n| match n {
            1 => generated_step(n, &["https://www.youtube.com/watch?v=stoa1"]),
            2 => generated_step(n, &["https://www.youtube.com/watch?v=made-up"]),
            3 => generated_step(
                n,
                &[
                    "https://www.youtube.com/watch?v=stoa2",
                    "https://fake.example/x",
                ],
            ),
            _ => generated_step(n, &[]),
        })
        .collect();
    let h = harness(
        json!({"name": "Stoicism", "description": "Generated", "steps": steps}),
        candidates.clone(),
    );

    let pathway = h.service.generate(&stoicism_brief()).await.unwrap();

    assert!((5..=7).contains(&pathway.steps.len()));
    let allowed: Vec<&str> = candidates.iter().map(|v| v.url.as_str()).collect();
    for activity in pathway.activities() {
        for url in activity.video_urls() {
            assert!(allowed.contains(&url.as_str()), "unexpected url {}", url);
        }
        for reference in activity.youtube_videos.iter().flatten() {
            assert!(candidates.contains(reference));
        }
    }

    // Fallback: the fabricated URL is replaced, not dropped
    assert_eq!(
        pathway.steps[1].activities[1].video_urls(),
        [candidates[0].url.clone()]
    );
    assert_eq!(
        pathway.steps[2].activities[1].video_urls(),
        [candidates[1].url.clone()]
    );

    let metadata = pathway.metadata.unwrap();
    assert_eq!(metadata.sources.len(), 3);
    assert_eq!(metadata.videos, candidates);

    assert_eq!(h.embedder.call_count(), 1);
    assert_eq!(h.index.last_top_k(), 20);
    assert_eq!(h.videos.call_count(), 1);
    assert_eq!(h.backend.call_count(), 1);

    let prompt = h.backend.last_request().unwrap().system_prompt.unwrap();
    assert!(prompt.contains("https://www.youtube.com/watch?v=stoa2"));
    assert!(prompt.contains("meditations.pdf"));
}

#[tokio::test]
async fn test_out_of_range_activity_index_fails_fast() {
    let h = harness(json!({}), vec![video(1)]);

    let request = RegenerationRequest::activity(existing_pathway(), 0, 99, "Make it harder");
    let error = h.service.regenerate(&request).await.unwrap_err();

    assert_eq!(error.kind(), "InvalidActivityIndex");
    assert_eq!(error.status_code(), 400);
    assert_eq!(h.embedder.call_count(), 0);
    assert_eq!(h.index.call_count(), 0);
    assert_eq!(h.videos.call_count(), 0);
    assert_eq!(h.backend.call_count(), 0);
}

#[tokio::test]
async fn test_out_of_range_step_index_fails_fast() {
    let h = harness(json!({}), vec![video(1)]);

    let request = RegenerationRequest::step(existing_pathway(), 2, "");
    let error = h.service.regenerate(&request).await.unwrap_err();

    assert_eq!(error.kind(), "InvalidStepIndex");
    assert_eq!(h.embedder.call_count(), 0);
    assert_eq!(h.backend.call_count(), 0);
}

#[tokio::test]
async fn test_regenerated_activity_fake_url_falls_back() {
    let real = video(7);
    let h = harness(
        json!({
            "name": "Watch a new lecture",
            "description": "Different angle",
            "videoUrls": ["https://fake.example/x"]
        }),
        vec![real.clone()],
    );

    let request = RegenerationRequest::activity(existing_pathway(), 0, 1, "Use a different video");
    let response = h.service.regenerate(&request).await.unwrap();

    let RegeneratedItem::Activity(activity) = &response.regenerated_item else {
        panic!("expected an activity");
    };
    assert_eq!(activity.video_urls, Some(vec![real.url.clone()]));
    assert_eq!(activity.youtube_videos, Some(vec![real]));
    assert_eq!(&response.updated_pathway.steps[0].activities[1], activity);
    assert!(response.success);
    assert_eq!(h.index.last_top_k(), 15);
}

#[tokio::test]
async fn test_regeneration_does_not_mutate_input() {
    let h = harness(
        json!({
            "name": "Practice, revised",
            "description": "New exercises",
            "activities": [
                {"name": "Premeditatio malorum", "description": "Imagine setbacks"},
                {"name": "View from above", "description": "Zoom out"}
            ]
        }),
        vec![video(1)],
    );

    let request = RegenerationRequest::step(existing_pathway(), 1, "More exercises");
    let snapshot = request.clone();

    let response = h.service.regenerate(&request).await.unwrap();

    assert_eq!(request.pathway, snapshot.pathway);
    assert_eq!(response.updated_pathway.steps[1].name, "Practice, revised");
    assert_eq!(
        response.updated_pathway.steps[0],
        existing_pathway().steps[0]
    );
    assert_eq!(response.updated_pathway.name, "Intro to Stoicism");

    let prompt = h.backend.last_request().unwrap().system_prompt.unwrap();
    assert!(prompt.contains("Evening review"));
    assert!(prompt.contains("More exercises"));
    assert_eq!(h.backend.last_request().unwrap().temperature, Some(0.7));
}

#[tokio::test]
async fn test_video_search_failure_is_not_fatal() {
    let h = build(
        MockBackend::default().with_structured(json!({
            "name": "P",
            "description": "D",
            "steps": [generated_step(1, &["https://www.youtube.com/watch?v=invented"])]
        })),
        MockVideoSearch::new(vec![video(1)]).with_available(false),
        PipelineConfig::default(),
    );

    let pathway = h.service.generate(&stoicism_brief()).await.unwrap();

    assert!(pathway.metadata.unwrap().videos.is_empty());
    assert_eq!(pathway.steps[0].activities[1].video_urls, Some(vec![]));
}

#[tokio::test]
async fn test_retrieval_failure_skips_generation() {
    let backend = Arc::new(MockBackend::default().with_structured(json!({})));
    let retriever = ContextRetriever::new(
        Arc::new(MockEmbedder::default().with_available(false)),
        Arc::new(MockVectorIndex::new(passages())),
        Arc::new(MockVideoSearch::new(vec![video(1)])),
    );
    let service = PathwayService::new(backend.clone(), retriever, PipelineConfig::default());

    let error = service.generate(&stoicism_brief()).await.unwrap_err();

    assert_eq!(error.kind(), "RetrievalFailed");
    assert_eq!(error.status_code(), 502);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_shape_is_reported() {
    let h = harness(
        json!({"name": "P", "description": "D", "steps": []}),
        vec![video(1)],
    );

    let error = h.service.generate(&stoicism_brief()).await.unwrap_err();

    assert_eq!(error.kind(), "InvalidGenerationShape");
    assert!(error.to_string().contains("steps"));
}

struct StalledBackend;

#[async_trait]
impl LlmBackend for StalledBackend {
    fn id(&self) -> &str {
        "stalled"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(LlmError::Unavailable("never answers".to_string()))
    }
}

#[tokio::test]
async fn test_deadline_during_generation() {
    let config = PipelineConfig {
        request_timeout_ms: 50,
        ..Default::default()
    };
    let retriever = ContextRetriever::new(
        Arc::new(MockEmbedder::default()),
        Arc::new(MockVectorIndex::new(passages())),
        Arc::new(MockVideoSearch::new(vec![video(1)])),
    );
    let service = PathwayService::new(Arc::new(StalledBackend), retriever, config);

    let error = service.generate(&stoicism_brief()).await.unwrap_err();

    assert_eq!(error.kind(), "GenerationFailed");
    assert!(error.to_string().contains("deadline"));
}
