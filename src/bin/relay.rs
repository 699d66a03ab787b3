use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};
use uptime_relay::{
    actors::supervisor::SupervisorHandle,
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{Config, ProviderKind, read_config_file},
    orchestrator::Orchestrator,
    providers::{ProviderSet, regional::RegionalPingClient, uptimerobot::UptimeRobotClient},
    reporter::{CompositeReporter, ErrorReporter, LogReporter, WebhookReporter},
    scheduler::SchedulerHandle,
    statuspage::StatuspageClient,
    util::Settings,
};

#[derive(Debug, Clone, Parser)]
#[command(about = "Relays monitoring response times to status page metrics")]
struct Args {
    /// Metric document (JSON, or TOML with a .toml extension)
    #[arg(short, long, default_value = "metrics.json")]
    file: String,

    /// Address the HTTP surface listens on
    #[arg(long, default_value = "0.0.0.0:8787")]
    bind: SocketAddr,

    /// Seconds between scheduled runs, 0 disables the timer
    #[arg(long, default_value_t = 60)]
    interval: u64,

    /// Trace-level logging for the relay itself
    #[arg(short, long)]
    verbose: bool,
}

fn init(verbose: bool) {
    let own_level = if verbose {
        LevelFilter::TRACE
    } else {
        LevelFilter::DEBUG
    };
    let filter = filter::Targets::new().with_targets(vec![
        ("uptime_relay", own_level),
        ("tower_http", LevelFilter::INFO),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

fn build_orchestrator(config: Arc<Config>, settings: &Settings) -> anyhow::Result<Orchestrator> {
    let mut providers = ProviderSet::new();

    if let Some(key) = &settings.uptimerobot_auth {
        let client = UptimeRobotClient::new(&settings.uptimerobot_url, key.clone())?;
        providers = providers.with(ProviderKind::UptimeRobot, Arc::new(client));
    }

    if let (Some(url), Some(token)) = (&settings.regional_url, &settings.regional_auth) {
        let client = RegionalPingClient::new(url, token.clone())?;
        providers = providers.with(ProviderKind::Regional, Arc::new(client));
    }

    let statuspage_auth = settings
        .statuspage_auth
        .clone()
        .context("STATUSPAGE_AUTH is not set")?;
    let publisher = StatuspageClient::new(&settings.statuspage_url, statuspage_auth)?;

    let mut reporter = CompositeReporter::new().with(Arc::new(LogReporter));
    if let Some(dsn) = &settings.error_report_dsn {
        reporter = reporter.with(Arc::new(WebhookReporter::new(dsn.clone())));
    }
    let reporter: Arc<dyn ErrorReporter> = Arc::new(reporter);

    Ok(Orchestrator::new(
        config,
        providers,
        Arc::new(publisher),
        reporter,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenv::dotenv().ok();

    let args = Args::parse();
    init(args.verbose);
    trace!("started with args: {args:?}");

    let config = Arc::new(read_config_file(&args.file)?);
    let settings = Settings::from_env();
    settings.validate_for(&config)?;

    info!("loaded {} metrics from {}", config.metrics().len(), args.file);

    let orchestrator = build_orchestrator(config, &settings)?;
    let supervisor = SupervisorHandle::spawn();

    let scheduler = (args.interval > 0).then(|| {
        SchedulerHandle::spawn(
            orchestrator.clone(),
            supervisor.clone(),
            Duration::from_secs(args.interval),
        )
    });
    if scheduler.is_none() {
        warn!("scheduled runs are disabled");
    }

    let server = spawn_api_server(
        ApiConfig {
            bind_addr: args.bind,
        },
        ApiState::new(orchestrator, supervisor.clone()),
    )
    .await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }
    server.shutdown().await;

    let stats = supervisor.shutdown().await?;
    debug!("supervisor drained: {stats:?}");

    if stats.faults > 0 {
        warn!("{} runs ended with a fault", stats.faults);
    }

    Ok(())
}
