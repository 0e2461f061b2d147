//! `agentloom ingest` — Split a file and add the chunks to the vector store.

use std::path::Path;

use agentloom_core::embedding::Document;
use agentloom_memory::TextSplitter;
use tracing::info;

use super::runtime::{self, CliResult};

pub async fn run(file: &Path) -> CliResult<()> {
    let config = runtime::load_config()?;
    let text = std::fs::read_to_string(file).map_err(|e| format!("Failed to read {}: {e}", file.display()))?;

    let splitter = TextSplitter::new(config.vector_store.chunk_size, config.vector_store.chunk_overlap);
    let source = Document::new(text).with_metadata(serde_json::json!({ "source": file.display().to_string() }));
    let chunks = splitter.split_documents(std::slice::from_ref(&source));
    info!(file = %file.display(), chunks = chunks.len(), "Split input file");

    let store = runtime::vector_store(&config).await?;
    if store.storage_name() == "memory" {
        eprintln!("  Note: vector_store.backend is \"memory\"; ingested chunks last only for this run.");
    }

    let added = store.add_documents(chunks.clone()).await?;
    println!(
        "Ingested {}: {} chunks, {} new, {} already stored",
        file.display(),
        chunks.len(),
        added,
        chunks.len().saturating_sub(added)
    );
    Ok(())
}
