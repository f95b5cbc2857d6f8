mod api;
mod auth;
mod config;

use api::AppState;
use catalog::client::RestEntityStore;
use catalog::executor::BatchExecutor;
use clap::{Parser, Subcommand};
use config::Config;
use exporter::chain::{BasicOrderRenderer, DocumentChain, MarkupRenderer, PolledConverter};
use exporter::client::RenderApiClient;
use exporter::config::ConversionMode;
use exporter::direct::{DirectConverter, DocumentConverter};
use metrics_exporter_statsd::StatsdBuilder;
use shared::notify::{Notifier, WebhookNotifier};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        config: PathBuf,
    },
}

#[derive(thiserror::Error, Debug)]
enum StartupError {
    #[error("config: {0}")]
    Config(#[from] config::ConfigError),

    #[error("config validation: {0}")]
    Validation(#[from] config::ValidationError),

    #[error("metrics recorder: {0}")]
    Metrics(String),

    #[error(transparent)]
    Serve(#[from] api::ApiServeError),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        CliCommand::Serve { config } => {
            if let Err(e) = run(&config).await {
                eprintln!("pantry failed to start: {e}");
                std::process::exit(1);
            }
        }
    }
}

async fn run(config_path: &Path) -> Result<(), StartupError> {
    let config = Config::from_file(config_path)?;
    config.validate()?;

    // Keeps the sentry transport alive for the lifetime of the server.
    let _sentry_guard = config.logging.as_ref().map(|logging| {
        sentry::init((
            logging.sentry_dsn.as_str(),
            sentry::ClientOptions::default(),
        ))
    });

    if let Some(metrics_config) = &config.metrics {
        install_statsd(metrics_config)?;
    }
    shared::metrics_defs::describe(exporter::metrics_defs::ALL_METRICS);
    shared::metrics_defs::describe(catalog::metrics_defs::ALL_METRICS);

    let state = build_state(&config);
    api::serve(&config.listener, state).await?;
    Ok(())
}

fn install_statsd(config: &config::MetricsConfig) -> Result<(), StartupError> {
    let recorder = StatsdBuilder::from(config.statsd_host.as_str(), config.statsd_port)
        .build(Some("pantry"))
        .map_err(|e| StartupError::Metrics(e.to_string()))?;

    metrics::set_global_recorder(recorder).map_err(|e| StartupError::Metrics(e.to_string()))?;
    Ok(())
}

fn build_state(config: &Config) -> Arc<AppState> {
    let provider = &config.exporter.provider;

    let (converter, traced): (
        Arc<dyn DocumentConverter>,
        Option<Arc<PolledConverter<RenderApiClient>>>,
    ) = match provider.mode {
        ConversionMode::Direct => (
            Arc::new(DirectConverter::new(&provider.base_url, &provider.api_key)),
            None,
        ),
        ConversionMode::Polled => {
            let client = Arc::new(RenderApiClient::new(&provider.base_url, &provider.api_key));
            let polled = Arc::new(PolledConverter::new(config.exporter.poller, client));
            let converter: Arc<dyn DocumentConverter> = polled.clone();
            (converter, Some(polled))
        }
    };

    let renderer: Arc<dyn MarkupRenderer> = Arc::new(BasicOrderRenderer);
    let chain = DocumentChain::new(renderer.clone(), converter);

    let store = Arc::new(RestEntityStore::new(
        &config.catalog.store.base_url,
        &config.catalog.store.token,
    ));
    let executor = BatchExecutor::new(store, &config.catalog.store.collection)
        .with_delete_throttle(config.catalog.delete_throttle);

    let (notifiers, notify_recipient) = match &config.notifications {
        Some(notifications) => {
            let notifiers: Vec<Box<dyn Notifier>> = notifications
                .targets
                .iter()
                .map(|target| {
                    Box::new(WebhookNotifier::new(&target.name, &target.url)) as Box<dyn Notifier>
                })
                .collect();
            (notifiers, Some(notifications.recipient.clone()))
        }
        None => (Vec::new(), None),
    };

    Arc::new(AppState {
        api_key: config.auth.api_key.clone(),
        renderer,
        chain,
        traced,
        executor,
        notifiers,
        notify_recipient,
    })
}
