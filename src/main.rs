//! botrot-rs: brainrot text transformer with sequential speech playback.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use botrot::config::Config;
use botrot::shell::{Shell, ShellHandle};
use botrot::speech::espeak::{watch_voices, EspeakSink};
use botrot::transform::TransformClient;
use botrot::{api, repl};

#[derive(Parser, Debug)]
#[command(name = "botrot-rs", about = "Turn boring text into brainrot and hear it")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Voice to start with (overrides voices.preferred)
    #[arg(long)]
    voice: Option<String>,

    /// Serve the HTTP API on this port (enables it)
    #[arg(long)]
    api_port: Option<u16>,

    /// Do not read commands from stdin
    #[arg(long)]
    no_repl: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug,hyper=info,reqwest=info")
    } else {
        EnvFilter::new("info,hyper=warn,reqwest=warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("botrot-rs starting");

    let mut config = Config::load(args.config.as_deref());
    if let Some(port) = args.api_port {
        config.api.enabled = true;
        config.api.port = port;
    }
    let preferred_voice = args.voice.or_else(|| config.voices.preferred.clone());

    if args.no_repl && !config.api.enabled {
        return Err("--no-repl needs the HTTP API (set api.enabled or --api-port)".into());
    }

    let client = TransformClient::new(&config.transform)?;
    info!("Transform endpoint: {}", client.endpoint());

    let (command_tx, command_rx) = mpsc::channel(16);
    let (speech_tx, speech_rx) = mpsc::channel(16);
    let (voices_tx, voices_rx) = mpsc::channel(4);

    let sink = EspeakSink::new(&config.speech, speech_tx);
    let shell = Shell::new(sink, client, preferred_voice);
    let handle = ShellHandle::new(command_tx);

    tokio::spawn(watch_voices(
        config.speech.program.clone(),
        Duration::from_secs(config.voices.poll_interval_secs.max(1)),
        voices_tx,
    ));

    if config.api.enabled {
        if let Err(e) = api::start_api(handle.clone(), config.api.port).await {
            // Without a REPL the API is the only way in
            if args.no_repl {
                return Err(format!("failed to bind API on port {}: {e}", config.api.port).into());
            }
            warn!("Failed to bind API on port {}: {e}", config.api.port);
        }
    }
    if !args.no_repl {
        tokio::spawn(repl::run(handle.clone()));
    }
    // The shell stops once every front end has dropped its handle
    drop(handle);

    tokio::select! {
        _ = shell.run(command_rx, speech_rx, voices_rx) => {}
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    info!("botrot-rs stopped");
    Ok(())
}
