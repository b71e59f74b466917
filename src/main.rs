use docbot::api::{create_router, AppState};
use docbot::application::{ConversationOrchestrator, IngestionService, Retriever};
use docbot::domain::ports::{
    EmbeddingService, GenerationClient, GenerationParams, MessageStore, VectorStore,
};
use docbot::domain::Chunker;
use docbot::infrastructure::{
    collection_name, create_pool, load_client_config, AnthropicGenerator, AppConfig,
    InMemoryMessageStore, InMemoryVectorStore, MessageBackend, QdrantVectorStore,
    RedisMessageStore, RetryPolicy, RetryingGenerationClient, TextEmbedding, VectorBackend,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docbot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    let client_config = Arc::new(load_client_config(
        &config.client_config_path(),
        &config.client,
    )?);
    info!(client = %config.client, name = %client_config.client_name, "Client configuration loaded");

    let chunker = Chunker::new(config.rag.chunk_size, config.rag.chunk_overlap)?;
    let embedding: Arc<dyn EmbeddingService> = Arc::new(TextEmbedding::from_config(&config.embedding)?);

    let namespace = collection_name(&config.client);
    let index: Arc<dyn VectorStore> = match config.vector_store.backend {
        VectorBackend::Memory => Arc::new(InMemoryVectorStore::new(
            namespace,
            config.embedding.dimension,
            config.embedding.metric,
        )),
        VectorBackend::Qdrant => Arc::new(
            QdrantVectorStore::new(
                &config.vector_store.url,
                &namespace,
                config.embedding.dimension,
                config.embedding.metric,
            )
            .await?,
        ),
    };
    info!(namespace = index.namespace(), backend = ?config.vector_store.backend, "Vector store ready");

    let ingestion = IngestionService::new(chunker, embedding.clone(), index.clone(), &config.client)
        .with_batch_size(config.embedding.batch_size);
    let report = ingestion.ingest_directory(&config.docs_dir()).await?;
    info!(
        files = report.files_indexed,
        chunks = report.chunks_indexed,
        failures = report.failures.len(),
        "Documentation indexed"
    );
    if report.chunks_indexed == 0 {
        warn!(docs_dir = %config.docs_dir().display(), "No documentation indexed; answers will be ungrounded");
    }

    let store: Arc<dyn MessageStore> = match config.message_store.backend {
        MessageBackend::Memory => Arc::new(InMemoryMessageStore::new()),
        MessageBackend::Redis => {
            let pool = create_pool(&config.message_store.url)?;
            info!("Redis pool initialized");
            Arc::new(RedisMessageStore::new(pool))
        }
    };

    if config.llm.provider != "anthropic" {
        anyhow::bail!("unsupported LLM provider '{}'", config.llm.provider);
    }
    let backend: Arc<dyn GenerationClient> = Arc::new(AnthropicGenerator::new(&config.llm.model)?);
    let generator: Arc<dyn GenerationClient> = Arc::new(RetryingGenerationClient::new(
        backend,
        RetryPolicy::from_config(&config.llm),
    ));

    let retriever = Arc::new(Retriever::new(embedding, index, config.rag.max_results));
    let orchestrator = ConversationOrchestrator::new(
        config.client.clone(),
        client_config,
        retriever,
        generator,
        store,
    )
    .with_generation_params(GenerationParams {
        max_tokens: config.llm.max_tokens,
        temperature: config.llm.temperature,
    })
    .with_history(config.rag.history_window, config.rag.history_fetch_limit);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let app = create_router(AppState::new(Arc::new(orchestrator), config));

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
