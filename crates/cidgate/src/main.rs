//! cidgate - content gateway CLI
//!
//! Subcommands:
//! - `cidgate serve` - Run the HTTP gateway
//! - `cidgate classify <file>...` - Print media type and derived name
//! - `cidgate ping` - Print the storage node's version

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gateconf::GateConfig;

use cidgate::{commands, serve, telemetry, BackendKind};

#[derive(Parser)]
#[command(name = "cidgate")]
#[command(about = "HTTP gateway for a content-addressed storage node")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// HTTP port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Config file used in place of ./cidgate.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Storage backend
        #[arg(long, value_enum, default_value_t = BackendKind::Kubo)]
        backend: BackendKind,

        /// Kubo RPC API base URL (e.g., "http://127.0.0.1:5001")
        #[arg(long)]
        api_url: Option<String>,

        /// OTLP gRPC endpoint for OpenTelemetry (e.g., "localhost:4317")
        #[arg(long)]
        otlp_endpoint: Option<String>,
    },

    /// Classify files by content and show the name a copy would get
    Classify {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Test connectivity to a storage node
    Ping {
        /// Kubo RPC API base URL (defaults to config)
        #[arg(long)]
        api_url: Option<String>,

        /// Timeout in milliseconds
        #[arg(short, long, default_value = "5000")]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // serve gets the configured subscriber; everything else plain fmt
    if !matches!(cli.command, Commands::Serve { .. }) {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(tracing::Level::INFO.into()),
            )
            .init();
    }

    match cli.command {
        Commands::Serve {
            port,
            config,
            backend,
            api_url,
            otlp_endpoint,
        } => {
            let mut gate_config = GateConfig::load_from(config.as_deref())?;
            if let Some(port) = port {
                gate_config.infra.bind.http_port = port;
            }
            if let Some(url) = api_url {
                gate_config.infra.backend.api_url = url;
            }
            if let Some(endpoint) = otlp_endpoint {
                gate_config.infra.telemetry.otlp_endpoint = endpoint;
            }

            telemetry::init(&gate_config.infra.telemetry)?;

            let storage = serve::build_backend(backend, &gate_config)?;
            let result = serve::run(gate_config, storage).await;
            let flushed = telemetry::shutdown();
            result?;
            flushed?;
        }
        Commands::Classify { files } => {
            commands::classify_files(&files).await?;
        }
        Commands::Ping { api_url, timeout } => {
            let api_url = match api_url {
                Some(url) => url,
                None => GateConfig::load()?.infra.backend.api_url,
            };
            commands::ping(&api_url, timeout).await?;
        }
    }

    Ok(())
}
