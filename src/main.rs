//! Geiger-Muller Entropy Source daemon.
//!
//! Wires the detection engine to the protocol server. Runs against the
//! mock detector, which stands in for real ADC hardware.

use clap::Parser;
use geiger_entropy::{
    detector::{FileConfig, MockDetector},
    engine::{self, EntropyEngine},
    server::{ProtocolServer, ServerConfig},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "geiger-entropy", version, about)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the TCP port from the configuration.
    #[arg(long)]
    port: Option<u16>,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Geiger Entropy Source v{}", geiger_entropy::VERSION);

    let config = match args.config {
        Some(path) => match FileConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };

    let engine = match EntropyEngine::new(config.detector.clone()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Invalid detector configuration: {}", e);
            std::process::exit(1);
        }
    };

    let mut source = MockDetector::new();
    if let Err(e) = engine.init(&mut source) {
        tracing::error!(error = %e, "detector setup failed");
        engine::fatal("detector channel setup fault");
    }
    engine.start_detection(source);

    let port = args.port.unwrap_or(config.server.port);
    let server = ProtocolServer::new(ServerConfig::with_port(port), Arc::clone(&engine));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to build runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(server.run()) {
        tracing::error!(error = %e, "server setup failed");
        std::process::exit(1);
    }
}
