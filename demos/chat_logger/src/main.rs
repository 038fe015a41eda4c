//! Chat Logger Demo
//!
//! Listens for a game server's UDP log stream and prints chat lines and player
//! connects/disconnects.
//!
//! Point the server at this process with:
//!
//! ```text
//! logaddress_add 192.168.1.2:27500
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package chat-logger -- --port 27500 --json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tflog::prelude::*;
use tflog::runtime::ConfigLoader;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(about = "Print chat and player activity from a game server log stream")]
struct Args {
    /// Configuration file (defaults to tflog.toml in the current directory).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long)]
    host: Option<String>,

    /// UDP port to listen on.
    #[arg(short, long)]
    port: Option<u16>,

    /// Also print every event as a JSON line.
    #[arg(long)]
    json: bool,

    /// Report lines with unparsable fields instead of skipping them.
    #[arg(long)]
    reject_malformed: bool,
}

// ============================================================================
// Handlers
// ============================================================================

async fn on_say(ctx: Context, say: SayEvent) {
    println!(
        "[{}] <{}> {}: {}",
        ctx.peer(),
        say.identity.team(),
        say.identity.name(),
        say.message
    );
}

async fn on_connect(ctx: Context, event: ConnectEvent) {
    info!(
        server = %ctx.peer(),
        player = event.identity.name(),
        player_id = event.identity.player_id(),
        address = %event.address,
        port = event.port,
        "Player connected"
    );
}

async fn on_disconnect(ctx: Context, event: DisconnectEvent) {
    info!(
        server = %ctx.peer(),
        player = event.identity.name(),
        reason = %event.reason,
        "Player disconnected"
    );
}

async fn print_json(_ctx: Context, event: Event) {
    match serde_json::to_string(&event) {
        Ok(json) => println!("{json}"),
        Err(e) => warn!(error = %e, "Failed to serialize event"),
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn load_config(args: &Args) -> Result<TflogConfig> {
    let loader = match &args.config {
        Some(path) => ConfigLoader::new().file(path),
        None => ConfigLoader::new().with_current_dir(),
    };
    let mut config = loader.load()?;

    // Command line flags win over every other source.
    if let Some(host) = &args.host {
        config.listener.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.listener.port = port;
    }
    if args.reject_malformed {
        config.parser.malformed_fields = MalformedFieldPolicy::Reject;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    let runtime = LogRuntime::from_config(&config)?;
    let engine = runtime.log_handler();

    let _say = engine.subscribe(on_say);
    let _connect = engine.subscribe(on_connect);
    let _disconnect = engine.subscribe(on_disconnect);
    let _json = args.json.then(|| engine.subscribe(print_json));

    let mut failures = engine.failures();
    tokio::spawn(async move {
        loop {
            match failures.recv().await {
                Ok(failure) => error!(
                    subscription = %failure.subscription,
                    event = %failure.event,
                    "Handler failed: {}",
                    failure.message
                ),
                Err(RecvError::Lagged(missed)) => warn!(missed, "Dropped handler failure reports"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    runtime.run().await?;

    Ok(())
}
