//! RoomSense display - main entry point
//!
//! Connects to the broker, subscribes to the room's sensor topics and prints
//! each accepted reading on stdout.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roomsense_connectors::{dispatch, ingest::ingest, BrokerConfig, ConsoleSink, MqttSession};
use roomsense_core::Pipeline;

/// Command-line arguments for roomsense
#[derive(Parser, Debug)]
#[command(name = "roomsense")]
#[command(about = "Display room telemetry published over MQTT")]
#[command(version)]
struct Args {
    /// JSON configuration file
    #[arg(short, long, env = "ROOMSENSE_CONFIG")]
    config: Option<PathBuf>,

    /// Broker host (overrides the configuration file)
    #[arg(long, env = "ROOMSENSE_HOST")]
    host: Option<String>,

    /// Broker port
    #[arg(short, long, env = "ROOMSENSE_PORT")]
    port: Option<u16>,

    /// Broker username
    #[arg(short, long, env = "ROOMSENSE_USERNAME")]
    username: Option<String>,

    /// Broker password
    #[arg(long, env = "ROOMSENSE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

fn load_config(args: &Args) -> Result<BrokerConfig> {
    let mut config = match (&args.config, &args.host) {
        (Some(path), _) => BrokerConfig::from_json_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        (None, Some(host)) => BrokerConfig::new(host.clone()),
        (None, None) => bail!("either --config or --host is required"),
    };

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(username) = &args.username {
        config.username = Some(username.clone());
    }
    if let Some(password) = &args.password {
        config.password = Some(password.clone());
    }

    config.validate().context("invalid broker configuration")?;
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing (also collects `log` records)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roomsense=info,roomsense_connectors=info,roomsense_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!("Broker: {}:{}", config.host, config.port);

    let mut session = MqttSession::connect(&config)
        .await
        .context("failed to connect to broker")?;
    session
        .subscribe(&config.topics)
        .await
        .context("failed to subscribe to sensor topics")?;

    let pipeline = Pipeline::new();
    let (events, dispatcher) = dispatch::channel();
    let display = tokio::task::spawn_blocking(move || dispatcher.run_blocking(ConsoleSink::stdout()));

    let result = ingest(&mut session, &pipeline, &events).await;

    // Let the display finish what is already queued
    drop(events);
    display.await.context("display thread panicked")?;

    let stats = pipeline.stats().snapshot();
    info!(
        "received {} messages: {} delivered, {} throttled, {} unknown topic, {} diagnostics",
        stats.received, stats.delivered, stats.throttled, stats.unknown_topic, stats.diagnostics
    );

    result.context("telemetry stream ended")?;
    Ok(())
}
