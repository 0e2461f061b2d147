//! AgentLoom CLI — the main entry point.
//!
//! Commands:
//! - `chat`     — Interactive chat or single-message mode
//! - `ingest`   — Split a text file and add it to the vector store
//! - `search`   — Similarity search over the vector store
//! - `journal`  — Show or clear the conversation memory journal
//! - `init`     — Write the default configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "agentloom",
    about = "AgentLoom — tool-orchestrated LLM conversations",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Add a text file to the vector store
    Ingest {
        /// File to split and embed
        file: std::path::PathBuf,
    },

    /// Search the vector store
    Search {
        query: String,

        /// Number of results (defaults to `vector_store.search_k`)
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Inspect the conversation memory journal
    Journal {
        #[command(subcommand)]
        action: JournalAction,
    },

    /// Write the default configuration file
    Init,
}

#[derive(Subcommand)]
enum JournalAction {
    /// Print every recorded exchange
    Show,

    /// Delete every recorded exchange
    Clear {
        /// Required to actually clear
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Ingest { file } => commands::ingest::run(&file).await?,
        Commands::Search { query, k } => commands::search::run(&query, k).await?,
        Commands::Journal { action } => match action {
            JournalAction::Show => commands::journal::show().await?,
            JournalAction::Clear { confirm } => commands::journal::clear(confirm).await?,
        },
        Commands::Init => commands::init::run()?,
    }

    Ok(())
}
