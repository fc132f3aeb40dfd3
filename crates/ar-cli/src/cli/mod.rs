pub mod cache;
pub mod doctor;
pub mod login;
pub mod search;

use clap::{Parser, Subcommand};

/// autoreply — a local bridge between AI tool hosts and the AT Protocol.
#[derive(Debug, Parser)]
#[command(name = "autoreply-cli", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authenticate with an app password and store the session as default.
    Login {
        /// Handle or DID to log in as.
        login: String,
        /// App password. Prompted interactively if omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Remove a stored session (defaults to the current default handle).
    Logout {
        /// Handle to log out. Defaults to the stored default handle.
        handle: Option<String>,
    },
    /// Print the default stored session's handle, SID, and expiry.
    Whoami,
    /// Run diagnostic checks against the current configuration.
    Doctor,
    /// Archive cache maintenance.
    #[command(subcommand)]
    Cache(CacheCommand),
    /// Run a fuzzy/substring search against an account's posts.
    Search {
        /// Handle or DID to search.
        account: String,
        /// Query text. Omit to list all posts.
        query: Option<String>,
        /// Maximum number of matches to print.
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Render an account's profile record as markdown.
    ProfilePreview {
        /// Handle or DID to preview.
        account: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Remove expired archive cache entries.
    Clean,
}

/// Load the configuration from the path named by `AUTOREPLY_CONFIG` (or
/// `autoreply.toml` by default), falling back to built-in defaults when
/// the file doesn't exist.
pub fn load_config() -> anyhow::Result<(ar_domain::Config, String)> {
    let config_path =
        std::env::var("AUTOREPLY_CONFIG").unwrap_or_else(|_| "autoreply.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        ar_domain::Config::default()
    };

    Ok((config, config_path))
}
