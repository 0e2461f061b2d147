//! `agentloom journal` — Inspect or clear the memory journal.

use super::runtime::{self, CliResult};

pub async fn show() -> CliResult<()> {
    let config = runtime::load_config()?;
    let journal = runtime::journal(&config)?;
    let entries = journal.read_all().await?;

    if entries.is_empty() {
        println!("The {} journal is empty.", journal.name());
        return Ok(());
    }

    for (i, entry) in entries.iter().enumerate() {
        println!("#{} ({})", i + 1, entry.recorded_at.format("%Y-%m-%d %H:%M:%S"));
        println!("  User:      {}", entry.user_message);
        println!("  Assistant: {}", entry.agent_message);
    }
    Ok(())
}

pub async fn clear(confirm: bool) -> CliResult<()> {
    if !confirm {
        println!("This will delete every recorded exchange.");
        println!("Run with --confirm to proceed:");
        println!("  agentloom journal clear --confirm");
        return Ok(());
    }

    let config = runtime::load_config()?;
    let journal = runtime::journal(&config)?;
    let count = journal.len().await?;
    journal.clear().await?;
    println!("Cleared {count} entries from the {} journal.", journal.name());
    Ok(())
}
