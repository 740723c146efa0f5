use marker::StrategyRegistry;
use marking::shutdown::install_shutdown_handler;
use marking::{MarkingConfig, MarkingManager, NodeState, NodeStatus};
use migration::{Migrator, MigratorTrait};
use tracing_appender::rolling;
use util::config;

#[tokio::main]
async fn main() {
    let _log_guard = init_logging(&config::log_file(), &config::log_level());

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Marking node exited with an error");
        eprintln!("{}: {e}", config::project_name());
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let status = NodeStatus::new();
    let shutdown = install_shutdown_handler();

    let db = db::connect().await?;
    Migrator::up(&db, None).await?;

    let registry = StrategyRegistry::with_builtin();
    let marking_config = MarkingConfig::from_env();

    tracing::info!(
        project = %config::project_name(),
        node_id = %marking_config.node_id,
        workers = marking_config.workers,
        "Starting marking node"
    );

    let manager = MarkingManager::start(marking_config, db.clone(), registry, status.subscribe());
    status.set(NodeState::Running);

    shutdown.cancelled().await;

    status.set(NodeState::Stopping);
    let report = manager.shutdown().await;
    if report.panicked > 0 {
        tracing::warn!(panicked = report.panicked, "Some marking tasks panicked");
    }

    db.close().await?;
    Ok(())
}

fn init_logging(log_file: &str, log_level: &str) -> tracing_appender::non_blocking::WorkerGuard {
    use std::fs;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true)
        .with_thread_ids(true);

    let env_filter =
        EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if config::log_to_stdout() {
        registry.with(stdout_layer).init();
    } else {
        registry.init();
    }

    guard
}
