use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::*;
use meshcall_core::IceServerConfig;
use meshcall_core::utils::DEFAULT_MAX_PAYLOAD_BYTES;
use meshcall_server::ServerConfig;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meshcall")]
#[command(version, about = "Signaling relay for mesh video calls")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling server
    Serve(ServeArgs),
}

#[derive(clap::Args)]
struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// ICE server url pushed to clients; repeat for more than one
    #[arg(long = "stun")]
    stun: Vec<String>,

    /// Largest SDP/ICE payload the relay forwards, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_PAYLOAD_BYTES)]
    max_payload: usize,

    /// Queue length of each room
    #[arg(long, default_value_t = 256)]
    room_capacity: usize,

    /// Used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl ServeArgs {
    fn into_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        let ice_servers = if self.stun.is_empty() {
            defaults.ice_servers
        } else {
            vec![IceServerConfig {
                urls: self.stun,
                username: None,
                credential: None,
            }]
        };

        ServerConfig {
            bind_addr: self.bind,
            ice_servers,
            room_channel_capacity: self.room_capacity,
            max_payload_bytes: self.max_payload,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            init_logging(&args.log_level)?;
            let config = args.into_config();

            println!("{}", "🚀 Starting meshcall signaling server...".green().bold());
            println!("   📡 WebSocket: ws://{}/ws", config.bind_addr);
            for server in &config.ice_servers {
                println!("   🧊 ICE:       {}", server.urls.join(", ").cyan());
            }

            meshcall_server::serve(config)
                .await
                .context("Signaling server failed")?;

            println!("{}", "✨ Server stopped.".green().bold());
        }
    }

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level '{}'", level))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to install logger: {}", e))
}
