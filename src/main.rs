use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use scaffold_agent::config::Config;
use scaffold_agent::server;

#[derive(Parser)]
#[command(name = "scaffold-agent")]
#[command(version, about = "LLM agent service for scaffolding and editing Expo apps")]
struct Cli {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8000, env = "PORT")]
    port: u16,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before reading any configuration.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = Config::from_env(cli.host, cli.port);
    server::start_server(config).await
}
