use clap::{Parser, Subcommand};
use snaplink::admin::{self, AdminCommands};
use snaplink::config::{Config, LogFormat};
use snaplink::server;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// snaplink - A URL shortener with expiring links and click analytics
#[derive(Parser, Debug)]
#[command(name = "snaplink")]
#[command(version)]
#[command(about = "A URL shortener with expiring links and click analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server
    Server {
        /// Host to bind to (overrides SERVER_HOST env var)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides SERVER_PORT env var)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Administrative commands
    Admin {
        #[command(subcommand)]
        admin_command: AdminCommands,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env()?;
    init_tracing(config.log_format);

    match cli.command {
        Commands::Server { host, port } => {
            let host_overridden = host.is_some() || port.is_some();
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{}:{}", host, port);

            // Re-compute base_url after CLI overrides unless BASE_URL was set explicitly
            let mut config = config;
            if host_overridden && std::env::var("BASE_URL").is_err() {
                config.server.base_url = format!("http://{}:{}", host, port);
            }

            server::run_server(config, addr).await?;
        }
        Commands::Admin { admin_command } => admin::run(config, admin_command)?,
    }

    Ok(())
}
