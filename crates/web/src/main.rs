//! Tokoku web server.
//!
//! Serves the storefront at `/` and the admin panel at `/admin`.
//!
//! # Architecture
//!
//! - Axum web framework
//! - Askama templates for server-side rendering
//! - `PostgreSQL` for catalog data and sessions
//! - Uploaded images on the local filesystem, served under `/storage`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tokoku_web::config::{TlsConfig, WebConfig};
use tokoku_web::middleware::create_session_layer;
use tokoku_web::state::AppState;
use tokoku_web::{app, db};

/// Connections still open this long after a shutdown signal are dropped.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
enum StartupError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("TLS certificates: {0}")]
    Tls(std::io::Error),

    #[error("server: {0}")]
    Serve(std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::warn!("A rustls crypto provider was already installed");
    }

    let config = match WebConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("tokoku-web: {e}");
            }
            return ExitCode::FAILURE;
        }
    };

    // Sentry goes first so the tracing layer below can report to it
    let _sentry_guard = init_sentry(&config);
    init_tracing(config.log_json);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "tokoku-web stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: WebConfig) -> Result<(), StartupError> {
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Migrations run separately: `tokoku-cli migrate`

    let session_layer = create_session_layer(&pool, &config);
    let addr = config.socket_addr();
    let tls = config.tls.clone();

    let state = AppState::new(config, pool);
    let service = app(state, session_layer).into_make_service_with_connect_info::<SocketAddr>();

    match tls {
        Some(tls) => serve_tls(addr, &tls, service).await,
        None => {
            tracing::info!("tokoku listening on http://{addr}");
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .map_err(StartupError::Serve)?;
            axum::serve(listener, service)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .map_err(StartupError::Serve)
        }
    }
}

async fn serve_tls(
    addr: SocketAddr,
    tls: &TlsConfig,
    service: axum::extract::connect_info::IntoMakeServiceWithConnectInfo<axum::Router, SocketAddr>,
) -> Result<(), StartupError> {
    let rustls_config = RustlsConfig::from_pem(
        tls.cert_pem.as_bytes().to_vec(),
        tls.key_pem.expose_secret().as_bytes().to_vec(),
    )
    .await
    .map_err(StartupError::Tls)?;

    tracing::info!("tokoku listening on https://{addr}");

    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    axum_server::bind_rustls(addr, rustls_config)
        .handle(handle)
        .serve(service)
        .await
        .map_err(StartupError::Serve)
}

/// Start Sentry when a DSN is configured. The guard flushes events on drop.
fn init_sentry(config: &WebConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            send_default_pii: false,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// JSON or human-readable logs, filtered by `RUST_LOG`.
fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tokoku_web=info,tower_http=debug".into());

    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(|metadata| match *metadata.level() {
            tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
            tracing::Level::INFO | tracing::Level::DEBUG => {
                sentry_tracing::EventFilter::Breadcrumb
            }
            tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
        }))
        .init();
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl+C handler unavailable");
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
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
