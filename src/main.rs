use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nodeflow_core::config::AppConfig;
use nodeflow_gateway::GatewayServer;
use nodeflow_ops::OpLibrary;

#[derive(Parser)]
#[command(name = "nodeflow", version, about = "Node graph execution server")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "nodeflow.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the backend server
    Run {
        /// Host to bind the server to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind the server to
        #[arg(long)]
        port: Option<u16>,

        /// Rebuild the registry from the nodepack tree on each request
        #[arg(long)]
        reload: bool,

        /// Directory containing nodepacks
        #[arg(long, value_name = "DIR")]
        nodepack_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("nodeflow=info,warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        AppConfig::load(&cli.config)?
    } else {
        AppConfig::default()
    };

    match cli.command {
        Commands::Run {
            host,
            port,
            reload,
            nodepack_dir,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if reload {
                config.nodepacks.reload = true;
            }
            if let Some(dir) = nodepack_dir {
                config.nodepacks.dir = dir;
            }

            let shutdown = CancellationToken::new();
            let signal = shutdown.clone();
            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutting down");
                signal.cancel();
            });

            let library = OpLibrary::with_builtins();
            GatewayServer::new(config, library).run(shutdown).await?;
        }
    }

    Ok(())
}
