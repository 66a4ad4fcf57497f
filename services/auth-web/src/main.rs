//! Gatehouse Auth Web
//!
//! Serves the sign-in, sign-up and sign-out pages on top of the
//! signed-session core.

use std::net::SocketAddr;
use std::sync::Arc;

use auth_web::{build_router, AppState, AuthServiceImpl, Config};
use gatehouse_auth_core::AuthService;
use gatehouse_db::pg::{ensure_schema, PgUserStore};
use gatehouse_db::{InMemoryUserStore, UserStore};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration before logging so LOG_LEVEL can seed the filter
    let config = Config::from_env()?;

    // Initialize logging
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)?,
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        http_port = config.http_port,
        auth = ?config.auth,
        "Starting Gatehouse Auth Web"
    );

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // User store
    let users: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => {
            let pool = gatehouse_db::create_pool(url).await?;
            ensure_schema(&pool).await?;
            tracing::info!("Database pool created");
            Arc::new(PgUserStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory user store; accounts will not persist");
            Arc::new(InMemoryUserStore::new())
        }
    };

    // Hashing the login dummy takes a moment; keep it off the runtime threads
    let auth_config = config.auth.clone();
    let auth_users = Arc::clone(&users);
    let auth: AuthServiceImpl =
        tokio::task::spawn_blocking(move || AuthService::new(auth_config, auth_users)).await??;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let state = AppState::new(auth, users, config);
    let app = build_router(state, metrics_handle);

    run_http_server(app, addr).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn run_http_server(app: axum::Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!("auth_logins_total", "Login attempts by outcome");
    metrics::describe_counter!(
        "auth_registrations_total",
        "Registration attempts by outcome"
    );
    metrics::describe_counter!("auth_logouts_total", "Sessions cleared by logout");
    metrics::describe_counter!(
        "auth_token_rejections_total",
        "Session tokens rejected by reason"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
