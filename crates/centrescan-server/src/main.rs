mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

use centrescan_core::CategoryAliases;
use centrescan_engine::DuplicateScanner;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(centrescan_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = centrescan_db::PoolConfig::from_app_config(&config);
    let pool = centrescan_db::connect_pool(&config.database_url, pool_config).await?;
    centrescan_db::run_migrations(&pool).await?;

    let aliases = Arc::new(load_aliases(&config)?);

    let initial = centrescan_db::load_snapshot(&pool, &aliases).await?;
    let state = AppState {
        pool,
        config: Arc::clone(&config),
        aliases,
        snapshot: Arc::new(RwLock::new(Arc::new(initial))),
        scanner: Arc::new(DuplicateScanner::new()),
        latest_scan: Arc::new(RwLock::new(None)),
    };

    let _scheduler = scheduler::build_scheduler(state.clone()).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        centrescan_core::Environment::Development
    ))?;
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Load category alias overrides; a missing file is not an error, the
/// built-in alias table stands alone.
fn load_aliases(config: &centrescan_core::AppConfig) -> anyhow::Result<CategoryAliases> {
    if config.category_aliases_path.exists() {
        Ok(centrescan_core::load_category_aliases(
            &config.category_aliases_path,
        )?)
    } else {
        tracing::info!(
            path = %config.category_aliases_path.display(),
            "no category alias file; using built-in aliases only"
        );
        Ok(CategoryAliases::default())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
