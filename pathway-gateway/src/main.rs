//! Pathway Gateway - learning pathway generation over HTTP

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pathway_agent::backend::OpenAiBackend;
use pathway_agent::retrieval::{OpenAiEmbedder, PineconeIndex, YouTubeSearch};
use pathway_agent::{ContextRetriever, PathwayService};
use pathway_gateway::{auth::BearerGate, config::Args, server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "pathway_gateway={level},pathway_agent={level},info",
            level = args.log_level
        )
        .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let pipeline = args.load_pipeline_config()?;

    info!("======================================");
    info!("  Pathway Gateway");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Completion model: {}", args.completion_model);
    info!("Embedding model: {}", args.embedding_model);
    info!("Rule set: {}", pipeline.rule_set.as_str());
    info!("Request timeout: {} ms", pipeline.request_timeout_ms);
    info!("Max body: {} bytes", args.max_body_bytes);
    info!("======================================");

    // One pooled client shared by every outbound service
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let backend = OpenAiBackend::new(
        &args.openai_base_url,
        &args.completion_model,
        args.openai_api_key.clone(),
    )
    .with_client(client.clone());

    let embedder = OpenAiEmbedder::new(
        &args.openai_base_url,
        &args.embedding_model,
        args.openai_api_key.clone(),
    )
    .with_client(client.clone());

    let mut index = PineconeIndex::new(
        args.pinecone_index_host.clone().unwrap_or_default(),
        args.pinecone_api_key.clone().unwrap_or_default(),
    )
    .with_client(client.clone());
    if let Some(namespace) = &args.pinecone_namespace {
        index = index.with_namespace(namespace);
    }

    let videos =
        YouTubeSearch::new(args.youtube_api_key.clone().unwrap_or_default()).with_client(client);

    let retriever = ContextRetriever::new(Arc::new(embedder), Arc::new(index), Arc::new(videos));
    let service = PathwayService::new(Arc::new(backend), retriever, pipeline);

    let gate = if args.dev_mode {
        BearerGate::disabled()
    } else {
        BearerGate::new(args.token_set())
    };

    let state = Arc::new(AppState::new(service, gate).with_max_body_bytes(args.max_body_bytes));
    server::run(state, args.listen).await?;

    Ok(())
}
