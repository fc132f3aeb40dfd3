mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{CacheCommand, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let (config, config_path) = cli::load_config()?;

    match cli.command {
        Command::Login { login, password } => {
            cli::login::login(&config, &login, password).await
        }
        Command::Logout { handle } => cli::login::logout(&config, handle),
        Command::Whoami => cli::login::whoami(&config),
        Command::Doctor => {
            let passed = cli::doctor::run(&config, &config_path).await?;
            if !passed {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Cache(CacheCommand::Clean) => cli::cache::clean(&config).await,
        Command::Search { account, query, limit } => {
            cli::search::search(&config, &account, query, limit).await
        }
        Command::ProfilePreview { account } => {
            cli::search::profile_preview(&config, &account).await
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
