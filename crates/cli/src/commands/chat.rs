//! `agentloom chat` — Interactive or single-message chat mode.

use std::sync::Arc;

use agentloom_agent::{Agent, Outcome};
use agentloom_config::AppConfig;
use agentloom_tools::StdinHumanInput;

use super::runtime::{self, CliResult};

pub async fn run(message: Option<String>) -> CliResult<()> {
    let config = runtime::load_config()?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set AGENTLOOM_API_KEY or the provider's own variable");
        eprintln!("  (OPENAI_API_KEY, AZURE_OPENAI_API_KEY, GROQ_API_KEY, GEMINI_API_KEY),");
        eprintln!("  or add `api_key` under [provider] in:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let stdin = Arc::new(StdinHumanInput::new());
    let runner = runtime::conversation_loop(&config, stdin.clone()).await?;
    let tool_names = runner.tools().names().join(", ");
    let mut agent = Agent::new(runner, config.agent.system_prompt.as_str()).await?;

    if let Some(msg) = message {
        let answer = agent.send(&msg).await?;
        println!("{answer}");
        return Ok(());
    }

    println!();
    println!("  AgentLoom — Interactive Mode");
    println!();
    println!("  Provider:  {}", config.provider.kind);
    println!("  Model:     {}", config.provider.model());
    println!("  Tools:     {tool_names}");
    println!("  Memory:    {}", if config.agent.memory { config.journal.backend.as_str() } else { "off" });
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    while let Some(line) = stdin.prompt("  You > ").await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        match agent.send_exchange(line).await {
            Ok(outcome) => {
                let label = match outcome {
                    Outcome::Answered { .. } => "Assistant",
                    Outcome::HandedOver { .. } => "Human",
                };
                println!();
                for text_line in outcome.text().lines() {
                    println!("  {label} > {text_line}");
                }
                println!();
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}
