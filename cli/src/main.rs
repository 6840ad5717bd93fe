//! CLI entrypoint for courier
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result};
use clap::Parser;
use courier_application::{
    BotRuntime, CommandDispatcher, CommandRegistry, ConnectionSupervisor, InitializeOutcome,
    PlatformClient, SupervisorExit, SupervisorSettings,
};
use courier_domain::SessionStore;
use courier_infrastructure::{
    ConfigLoader, ConsolePlatformClient, EnvSessionStore, LocalSessionStore, RuntimeConfig,
    SessionBackendConfig,
};
use courier_presentation::{Cli, ConsoleAuthPresenter, ConsoleOperatorNotifier, health_router};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Inbound messages buffered between supervisor and dispatcher
const INBOUND_BUFFER: usize = 256;

/// How long the health server gets to stop after shutdown
const SERVER_STOP_TIMEOUT: Duration = Duration::from_secs(2);

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match init_logging(cli.verbose, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    let code = match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    };

    // The console reader may sit in a blocking stdin read; don't wait for it.
    runtime.shutdown_timeout(Duration::from_millis(500));
    code
}

/// Initialize logging based on verbosity level; `RUST_LOG` wins when set
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace", // -vv or more
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        let file = ConfigLoader::load(cli.config.as_deref())?;
        println!("\n{}", toml::to_string_pretty(&file.redacted())?);
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = ConfigLoader::load(cli.config.as_deref())?.into_runtime_config()?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    info!(session_id = %config.raw_session_id, "Using SESSION_ID");
    info!(client_id = %config.bot.session_id, "Using safe CLIENT_ID");
    info!(backend = config.backend.name(), "Session backend selected");

    // === Dependency Injection ===
    let store = build_store(&config)?;
    let client: Arc<dyn PlatformClient> = Arc::new(ConsolePlatformClient::stdio());
    let shutdown = CancellationToken::new();

    let supervisor = Arc::new(
        ConnectionSupervisor::new(
            Arc::clone(&client),
            store,
            Arc::new(ConsoleAuthPresenter),
            SupervisorSettings::from(&config.bot),
        )
        .with_cancellation(shutdown.child_token()),
    );
    let registry = Arc::new(CommandRegistry::with_builtins(&config.bot)?);
    let dispatcher = Arc::new(CommandDispatcher::new(
        registry,
        Arc::clone(&client),
        &config.bot,
    ));

    let runtime = BotRuntime::start(
        Arc::clone(&supervisor),
        dispatcher,
        INBOUND_BUFFER,
        shutdown.child_token(),
    );

    let board = supervisor
        .status_board(&config.bot.bot_name)
        .with_prefix(config.bot.prefix);
    let router = health_router(board);
    let server_token = shutdown.child_token();
    let port = config.port;
    let server_task = tokio::spawn(async move {
        if let Err(e) = courier_presentation::serve(port, router, server_token).await {
            error!(port, error = %e, "Health server failed");
        }
    });

    match supervisor.initialize().await {
        InitializeOutcome::Started => info!("Platform client started"),
        InitializeOutcome::Failed(e) => warn!(error = %e, "First connection attempt failed"),
        other => warn!(outcome = ?other, "Platform client not started"),
    }

    let code = tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutdown requested");
            ExitCode::SUCCESS
        }
        exit = supervisor.wait_terminal() => match exit {
            SupervisorExit::Failed => {
                error!("Connection failed permanently; manual intervention required");
                ExitCode::FAILURE
            }
            SupervisorExit::ShutDown => ExitCode::SUCCESS,
        },
    };

    // Dispatches drain before the client disconnects; the server stops last.
    runtime.stop().await;
    shutdown.cancel();
    if tokio::time::timeout(SERVER_STOP_TIMEOUT, server_task)
        .await
        .is_err()
    {
        warn!("Health server did not stop in time");
    }

    info!("Goodbye");
    Ok(code)
}

fn build_store(config: &RuntimeConfig) -> Result<Arc<dyn SessionStore>> {
    let id = config.bot.session_id.clone();
    let store: Arc<dyn SessionStore> = match &config.backend {
        SessionBackendConfig::Local { dir } => {
            info!(dir = %dir.display(), "Storing sessions on disk");
            Arc::new(LocalSessionStore::new(dir, id))
        }
        SessionBackendConfig::Env { data } => Arc::new(EnvSessionStore::new(
            id,
            data.clone(),
            Arc::new(ConsoleOperatorNotifier),
        )),
        SessionBackendConfig::Remote { url } => remote_store(url, id, config)?,
    };
    Ok(store)
}

#[cfg(feature = "remote-store")]
fn remote_store(
    url: &str,
    id: courier_domain::SessionId,
    config: &RuntimeConfig,
) -> Result<Arc<dyn SessionStore>> {
    use courier_infrastructure::{HttpKeyValueClient, RemoteKvSessionStore};

    info!(url, "Storing sessions in remote key-value service");
    let kv = HttpKeyValueClient::new(url, config.bot.store_timeout)?;
    Ok(Arc::new(RemoteKvSessionStore::new(id, Arc::new(kv))))
}

#[cfg(not(feature = "remote-store"))]
fn remote_store(
    _url: &str,
    _id: courier_domain::SessionId,
    _config: &RuntimeConfig,
) -> Result<Arc<dyn SessionStore>> {
    anyhow::bail!(courier_infrastructure::ConfigError::RemoteUnavailable)
}

/// Resolve on Ctrl-C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
