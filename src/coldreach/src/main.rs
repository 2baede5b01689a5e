//! ColdReach — multi-step outreach sequence engine.
//!
//! Main entry point: wires the stores, channel providers, and engine
//! together, starts the periodic sweep loop, and serves the HTTP API.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info, warn};

use coldreach_api::{api_router, ApiState};
use coldreach_channels::linkedin::LinkedInAutomationProvider;
use coldreach_channels::{GmailRelayProvider, ScriptedGenerator};
use coldreach_core::config::AppConfig;
use coldreach_core::event_bus::noop_sink;
use coldreach_delivery::DailyCapTracker;
use coldreach_engine::clock::system_clock;
use coldreach_engine::processors::default_processors;
use coldreach_engine::CampaignEngine;
use coldreach_store::{
    AccountStore, CampaignStore, ContactStore, EnrollmentStore, ExecutionLedger,
};

mod demo;

#[derive(Parser, Debug)]
#[command(name = "coldreach")]
#[command(about = "Multi-step outreach sequence engine")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "COLDREACH__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "COLDREACH__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Sweep interval in seconds (overrides config)
    #[arg(long, env = "COLDREACH__ENGINE__SWEEP_INTERVAL_SECS")]
    sweep_interval: Option<u64>,

    /// Seed a demo campaign with contacts on startup
    #[arg(long, default_value_t = false)]
    seed_demo: bool,

    /// Disable the internal sweep loop (external cron drives processing)
    #[arg(long, default_value_t = false)]
    no_sweep: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coldreach=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("ColdReach starting up");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(secs) = cli.sweep_interval {
        config.engine.sweep_interval_secs = secs;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        sweep_interval_secs = config.engine.sweep_interval_secs,
        "Configuration loaded"
    );

    // Metrics exporter
    if let Err(e) = PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.metrics.port))
        .install()
    {
        error!(error = %e, "Failed to start metrics exporter");
    }

    // Stores
    let campaigns = Arc::new(CampaignStore::new());
    let contacts = Arc::new(ContactStore::new());
    let enrollments = Arc::new(EnrollmentStore::new());
    let ledger = Arc::new(ExecutionLedger::new());
    let accounts = Arc::new(AccountStore::new());

    // Channel providers
    let email_sender = Arc::new(GmailRelayProvider::new(config.email.clone()));
    let linkedin = Arc::new(LinkedInAutomationProvider::new());
    let generator = Arc::new(ScriptedGenerator::new(config.ai.clone()));
    let caps = Arc::new(DailyCapTracker::new());

    let processors = default_processors(
        ledger.clone(),
        accounts.clone(),
        email_sender,
        linkedin,
        generator,
        caps,
    );

    let engine = Arc::new(CampaignEngine::new(
        campaigns.clone(),
        contacts.clone(),
        enrollments.clone(),
        ledger,
        processors,
        system_clock(),
        noop_sink(),
        config.engine.max_chain_steps,
    ));

    if cli.seed_demo {
        demo::seed(&campaigns, &contacts, &accounts, &engine, &config)?;
    }

    // Periodic sweep loop standing in for an external cron.
    if !cli.no_sweep {
        let sweep_engine = engine.clone();
        let interval_secs = config.engine.sweep_interval_secs;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            loop {
                interval.tick().await;
                let summary = sweep_engine.process_all_scheduled();
                if summary.processed > 0 || summary.errors > 0 {
                    info!(
                        processed = summary.processed,
                        errors = summary.errors,
                        "Scheduled sweep finished"
                    );
                }
            }
        });
    } else {
        info!("Internal sweep loop disabled, expecting external cron");
    }

    let state = ApiState {
        engine,
        campaigns,
        enrollments,
    };
    let app = api_router(state);

    let addr = format!("{}:{}", config.api.host, config.api.http_port);
    info!(%addr, "ColdReach is ready to serve traffic");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
