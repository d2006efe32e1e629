use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cache-refresher",
    about = "Cache Refresher - keeps upstream prompt caches warm",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, env = "CACHE_REFRESHER_PORT", default_value = "8046")]
    pub port: u16,

    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "CACHE_REFRESHER_UPSTREAM_URL", help = "OpenAI-compatible base URL")]
    pub upstream_url: Option<String>,

    #[arg(long, env = "CACHE_REFRESHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the refresher daemon (default if no command specified)")]
    Serve,

    #[command(about = "Show status of a running daemon")]
    Status {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(subcommand, about = "View and modify persisted settings")]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Show current settings")]
    Show {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Get a specific setting")]
    Get {
        #[arg(help = "Setting key (e.g., 'interval_ms', 'max_attempts')")]
        key: String,
    },

    #[command(about = "Set a setting")]
    Set {
        #[arg(help = "Setting key")]
        key: String,

        #[arg(help = "New value")]
        value: String,
    },
}
