pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
use cli::{Cli, Commands, ItemCommands, UserCommands};
pub use config::Config;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        describe_metrics();
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.as_str(), value.as_str())?;
        }
        let (layer, task) = builder.build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    if !matches!(cli.command, Some(Commands::Init)) {
        config.validate()?;
    }

    if prometheus_handle.is_some() {
        info!("Prometheus metrics recorder initialized");
    }

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Serve => run_daemon(config, prometheus_handle).await,

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created with a new secret key. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists; leaving it untouched.");
            }
            Ok(())
        }

        Commands::Users { command } => match command {
            UserCommands::List => cli::cmd_users_list(&config).await,
            UserCommands::Show { id } => cli::cmd_users_show(&config, id).await,
            UserCommands::Delete { id, yes } => cli::cmd_users_delete(&config, id, yes).await,
        },

        Commands::Items { command } => match command {
            ItemCommands::List => cli::cmd_items_list(&config).await,
        },
    }
}

fn describe_metrics() {
    metrics::describe_counter!("http_requests_total", "HTTP requests by method, path and status");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        metrics::Unit::Seconds,
        "HTTP request latency"
    );
    metrics::describe_counter!("users_registered_total", "Accounts created");
    metrics::describe_counter!("users_verified_total", "Email addresses confirmed");
    metrics::describe_counter!(
        "verification_emails_failed_total",
        "Verification emails that could not be delivered"
    );
}

async fn run_daemon(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "Stockkeeper v{} starting in server mode...",
        env!("CARGO_PKG_VERSION")
    );

    if !config.server.enabled {
        error!("server.enabled is false; nothing to run");
        return Ok(());
    }

    let port = config.server.port;
    let shared = Arc::new(SharedState::new(config).await?);
    let api_state = api::create_app_state(shared, prometheus_handle);
    let app = api::router(api_state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 Web Server running at http://0.0.0.0:{}", port);
    info!("Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
