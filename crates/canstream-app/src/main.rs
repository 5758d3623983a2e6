//! canstream: keeps one SSE connection to the dashboard backend open and
//! forwards every message into the `can-store` element's log.

mod cli;
mod export;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use canstream_bridge::{
    Bridge, ClientConfig, HttpTransport, MissingTargetPolicy, StreamClient, StreamEvent,
};
use canstream_common::CanstreamError;
use canstream_config::schema::{CanstreamConfig, DeliveryMode};
use canstream_ui::{
    CanLogStore, ElementRegistry, LineEvaluator, RegistrySink, ScriptSink, StoreUpdate,
};
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_DIRECTIVE: &str = "canstream=info";

fn init_tracing(level: &str) {
    let directive = level
        .parse::<Directive>()
        .or_else(|_| DEFAULT_LOG_DIRECTIVE.parse::<Directive>());
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = directive {
        filter = filter.add_directive(directive);
    }
    // Logs go to stderr; stdout carries script delivery output.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    // Config first so its log level applies; load errors are reported once
    // logging is up.
    let loaded = canstream_config::load_config(args.config.as_deref());
    let level = args
        .log_level
        .clone()
        .or_else(|| loaded.as_ref().ok().map(|c| c.logging.level.clone()))
        .unwrap_or_else(|| DEFAULT_LOG_DIRECTIVE.to_string());
    init_tracing(&level);

    tracing::info!("canstream v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) if args.config.is_some() => {
            tracing::error!("Config load failed: {e}");
            return ExitCode::from(2);
        }
        Err(e) => {
            tracing::warn!("Config load failed, using defaults: {e}");
            CanstreamConfig::default()
        }
    };

    if let Some(url) = args.url {
        tracing::info!("Using stream URL override: {url}");
        config.stream.url = url;
        if let Err(e) = canstream_config::validation::validate(&config) {
            tracing::error!("{e}");
            return ExitCode::from(2);
        }
    }

    if args.print_config {
        println!("{}", canstream_config::config_to_json(&config));
        return ExitCode::SUCCESS;
    }

    let result = match config.target.delivery {
        DeliveryMode::Registry => run(config, args.export_csv).await,
        DeliveryMode::Script => {
            if args.export_csv.is_some() {
                tracing::warn!("--export-csv has no effect with script delivery");
            }
            run_script(config).await
        }
    };
    match result {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "canstream stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: CanstreamConfig, export_csv: Option<PathBuf>) -> canstream_common::Result<()> {
    let target = config.target.element_id.clone();

    let registry = ElementRegistry::new();
    let store = Arc::new(CanLogStore::from_config(&config));
    let updates = tokio::spawn(log_store_updates(Arc::clone(&store), store.subscribe()));
    registry.register(target.clone(), store.clone());

    let bridge = Bridge::new(
        target,
        RegistrySink::new(registry.clone()),
        MissingTargetPolicy::from_config(&config.target),
    );
    let result = stream(&config, bridge).await;

    updates.abort();
    registry.clear();
    tracing::info!(frames = store.len(), "CAN log closed");
    if let Some(path) = export_csv {
        let written = export::export_csv(&store, &path)?;
        tracing::info!(path = %written.display(), "CAN log exported");
    }
    result
}

/// Script delivery: the page owns the element, so snippets go to stdout.
async fn run_script(config: CanstreamConfig) -> canstream_common::Result<()> {
    let sink = ScriptSink::from_config(&config.target, LineEvaluator::new(std::io::stdout()));
    let bridge = Bridge::new(
        config.target.element_id.clone(),
        sink,
        MissingTargetPolicy::from_config(&config.target),
    );
    stream(&config, bridge).await
}

async fn stream(config: &CanstreamConfig, bridge: Bridge) -> canstream_common::Result<()> {
    let transport = HttpTransport::from_config(&config.stream)
        .map_err(|e| CanstreamError::Stream(e.to_string()))?;
    tracing::info!(
        url = %transport.url(),
        target = %config.target.element_id,
        delivery = ?config.target.delivery,
        "Starting stream bridge"
    );

    let (client, events) = StreamClient::start(ClientConfig::from_config(config), transport, bridge);
    let result = watch_events(events).await;
    client.stop().await;
    result
}

/// Follow lifecycle events until Ctrl-C or the client stops on its own.
async fn watch_events(mut events: mpsc::Receiver<StreamEvent>) -> canstream_common::Result<()> {
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut last_error = None;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Ctrl-C received, shutting down");
                return Ok(());
            }
            event = events.recv() => match event {
                Some(StreamEvent::Error { message }) => last_error = Some(message),
                Some(StreamEvent::Connected { .. }) => last_error = None,
                Some(StreamEvent::Stopped) | None => {
                    return match last_error {
                        Some(message) => Err(CanstreamError::Stream(message)),
                        None => Ok(()),
                    };
                }
                Some(event) => tracing::debug!(?event, "Stream event"),
            },
        }
    }
}

async fn log_store_updates(store: Arc<CanLogStore>, mut updates: broadcast::Receiver<StoreUpdate>) {
    loop {
        match updates.recv().await {
            Ok(StoreUpdate::Appended { id, len }) => {
                let interpreted = store
                    .recent(1)
                    .pop()
                    .and_then(|frame| frame.interpreted)
                    .unwrap_or_default();
                tracing::info!(id = %id, entries = len, "{interpreted}");
            }
            Ok(StoreUpdate::Cleared) => tracing::info!("CAN log cleared"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Store update log lagging");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
