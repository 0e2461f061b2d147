//! Assembles the runtime (transport, stores, tools, loop) from `AppConfig`.

use std::error::Error;
use std::sync::Arc;

use agentloom_agent::{ConversationLoop, ToolFailurePolicy};
use agentloom_config::AppConfig;
use agentloom_core::embedding::RecordStorage;
use agentloom_core::event::EventBus;
use agentloom_core::journal::MemoryJournal;
use agentloom_memory::{
    FileJournal, InMemoryJournal, InMemoryKnowledgeStore, InMemoryStorage, KnowledgeStore, SqliteKnowledgeStore,
    SqliteStorage, VectorStore,
};
use agentloom_tools::{BuiltinTools, HumanInput, default_registry};
use tracing::debug;

pub type CliResult<T> = Result<T, Box<dyn Error>>;

pub fn load_config() -> CliResult<AppConfig> {
    AppConfig::load().map_err(|e| format!("Failed to load config: {e}").into())
}

/// The configured vector store over the configured record backend.
pub async fn vector_store(config: &AppConfig) -> CliResult<Arc<VectorStore>> {
    let embedder = agentloom_providers::build_embedder(config)?;
    let storage: Arc<dyn RecordStorage> = match config.vector_store.backend.as_str() {
        "sqlite" => {
            let path = config.vector_store.resolved_path();
            Arc::new(SqliteStorage::new(&path.to_string_lossy()).await?)
        }
        _ => Arc::new(InMemoryStorage::new()),
    };
    debug!(backend = storage.name(), "Vector store ready");
    Ok(Arc::new(VectorStore::new(embedder, storage)))
}

pub fn journal(config: &AppConfig) -> CliResult<Arc<dyn MemoryJournal>> {
    let journal: Arc<dyn MemoryJournal> = match config.journal.backend.as_str() {
        "file" => Arc::new(FileJournal::open(config.journal.resolved_path())?),
        _ => Arc::new(InMemoryJournal::new()),
    };
    debug!(backend = journal.name(), "Memory journal ready");
    Ok(journal)
}

pub async fn knowledge(config: &AppConfig) -> CliResult<Arc<dyn KnowledgeStore>> {
    let store: Arc<dyn KnowledgeStore> = match &config.knowledge.path {
        Some(path) => Arc::new(SqliteKnowledgeStore::new(&path.to_string_lossy()).await?),
        None => Arc::new(InMemoryKnowledgeStore::new()),
    };
    Ok(store)
}

/// Build the conversation loop with every built-in tool registered.
pub async fn conversation_loop(config: &AppConfig, human: Arc<dyn HumanInput>) -> CliResult<ConversationLoop> {
    let transport = agentloom_providers::build_transport(config)?;

    let tools = default_registry(BuiltinTools {
        vector_store: Some(vector_store(config).await?),
        search_k: config.vector_store.search_k,
        knowledge: Some(knowledge(config).await?),
        human: Some(human),
    })?;

    let policy: ToolFailurePolicy = config.agent.tool_failure.parse()?;

    let mut runner = ConversationLoop::new(transport, Arc::new(tools), Arc::new(EventBus::default()))
        .with_generation(config.generation)
        .with_max_turns(config.agent.max_turns)
        .with_handover_tool(config.agent.handover_tool.as_str())
        .with_tool_failure_policy(policy);

    if config.agent.memory {
        runner = runner.with_memory(journal(config)?);
    }
    Ok(runner)
}
