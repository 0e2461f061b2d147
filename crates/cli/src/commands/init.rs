//! `agentloom init` — Write the default configuration.

use agentloom_config::AppConfig;

use super::runtime::CliResult;

pub fn run() -> CliResult<()> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("Config already exists at: {}", config_path.display());
        println!("Edit it manually or delete it and re-run `agentloom init`.");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("Created {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set `api_key` under [provider] (or export OPENAI_API_KEY)");
    println!("  2. Run: agentloom chat");
    Ok(())
}
