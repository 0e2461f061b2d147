//! `agentloom search` — Similarity search over the vector store.

use super::runtime::{self, CliResult};

pub async fn run(query: &str, k: Option<usize>) -> CliResult<()> {
    let config = runtime::load_config()?;
    let store = runtime::vector_store(&config).await?;
    let k = k.unwrap_or(config.vector_store.search_k);

    let results = store.similarity_search(query, k, None).await?;
    if results.is_empty() {
        println!("No matches for \"{query}\".");
        return Ok(());
    }

    for (i, scored) in results.iter().enumerate() {
        let preview: String = scored.record.content.chars().take(80).collect();
        println!("{:>2}. [score: {:.3}] {preview}", i + 1, scored.score);
        if !scored.record.metadata.is_null() {
            println!("    metadata: {}", scored.record.metadata);
        }
    }
    Ok(())
}
