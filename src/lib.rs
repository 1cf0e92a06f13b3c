pub mod agent;
pub mod capabilities;
pub mod cli;
pub mod config;
pub mod http;
pub mod llm;
pub mod server;

use std::sync::Arc;

use agent::Relay;
use anyhow::{Context, Result, anyhow};
use capabilities::Registry;
use cli::CliArgs;
use config::AppConfig;
use http::{HttpClient, HttpDebugConfig};
use llm::openai::OpenAiProvider;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub async fn run(args: CliArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    info!(config = %config.config_path.display(), "configuration loaded");
    if config.omdb_api_key.is_none() {
        warn!("OMDB_API_KEY is not set; movie lookups will report an error");
    }

    let http = HttpClient::new(
        reqwest::Client::new(),
        HttpDebugConfig::from_verbose(config.http_debug),
    );
    let provider = OpenAiProvider::new(
        http.clone(),
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        config.openai_base_url.clone(),
    )
    .map_err(|err| anyhow!("Failed to initialize completion provider: {err}"))?;
    info!(model = provider.model(), "completion provider ready");

    let registry = Registry::new(http, config.lookup_endpoints());
    let app = server::router(Arc::new(Relay::new(provider, registry)));

    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!(address = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

fn resolve_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = AppConfig::load_with_path(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if args.verbose {
        config.http_debug = true;
    }
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
