use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context as _, bail};
use dotenvy::dotenv;
use sales_api::db::init_db_pool;
use sales_api::logging::init_tracing;
use sales_api::metrics::{Counters, init_metrics};
use sales_api::modules::check::controller::DebugState;
use sales_api::modules::users::service::UserCore;
use sales_api::modules::users::store::{MemoryUserStore, PgUserStore, UserStore};
use sales_api::router::{ApiMuxConfig, api_mux, debug_mux};
use sales_auth::{Auth, MemoryKeyStore};
use sales_config::{AuthConfig, DatabaseConfig, WebConfig};
use sales_web::ShutdownSignal;
use tokio::net::TcpListener;
use tokio::sync::{Notify, mpsc};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    if let Err(e) = run().await {
        error!(error = %format!("{e:#}"), "service stopped with error");
        return Err(e);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let web = WebConfig::from_env();
    let auth_config = AuthConfig::from_env();
    auth_config.validate()?;
    let token_ttl = auth_config.token_ttl()?;
    let db_config = DatabaseConfig::from_env();

    info!(version = env!("CARGO_PKG_VERSION"), "starting service");

    // =========================================================================
    // Auth

    let keystore = MemoryKeyStore::from_folder(&auth_config.keys_folder)
        .context("Failed to load signing keys")?;
    let active_kid = match auth_config.active_kid.clone() {
        Some(kid) => kid,
        None => keystore
            .kids()
            .pop()
            .context("No signing keys found in AUTH_KEYS_FOLDER")?,
    };
    info!(kid = %active_kid, "signing key selected");
    let auth = Arc::new(Auth::new(active_kid, Arc::new(keystore))?);

    // =========================================================================
    // Users

    let store: Arc<dyn UserStore> = match init_db_pool(&db_config).await? {
        Some(pool) => Arc::new(PgUserStore::new(pool)),
        None => {
            warn!("DATABASE_URL not set, users are kept in memory");
            Arc::new(MemoryUserStore::new())
        }
    };
    let users = Arc::new(UserCore::new(store, auth_config.bcrypt_cost));

    // =========================================================================
    // Debug surface

    let counters = Arc::new(Counters::default());
    let prometheus = match init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Prometheus recorder unavailable");
            None
        }
    };

    let debug = debug_mux(DebugState {
        users: Arc::clone(&users),
        counters: Arc::clone(&counters),
        prometheus,
    });
    let debug_listener = TcpListener::bind(&web.debug_host)
        .await
        .with_context(|| format!("Failed to bind debug listener on {}", web.debug_host))?;
    info!(addr = %web.debug_host, "debug listener started");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(debug_listener, debug).await {
            error!(error = %e, "debug listener stopped");
        }
    });

    // =========================================================================
    // API

    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<ShutdownSignal>(1);
    let api = api_mux(ApiMuxConfig {
        shutdown: shutdown_tx,
        auth,
        users,
        counters,
        issuer: auth_config.issuer.clone(),
        token_ttl,
        request_timeout: web.request_timeout,
    });

    let listener = TcpListener::bind(&web.api_host)
        .await
        .with_context(|| format!("Failed to bind API listener on {}", web.api_host))?;
    info!(addr = %web.api_host, "api listener started");

    let stop = Arc::new(Notify::new());
    let stopped = Arc::clone(&stop);
    let mut server = tokio::spawn(async move {
        axum::serve(
            listener,
            api.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { stopped.notified().await })
        .await
    });

    tokio::select! {
        result = &mut server => {
            result?.context("API server stopped unexpectedly")?;
            return Ok(());
        }
        reason = shutdown_signal(&mut shutdown_rx) => {
            info!(reason = %reason, "shutdown started");
        }
    }

    stop.notify_one();
    match tokio::time::timeout(web.shutdown_timeout, server).await {
        Ok(result) => {
            result?.context("API server failed while draining")?;
            info!("shutdown complete");
            Ok(())
        }
        Err(_) => bail!(
            "graceful shutdown did not complete within {:?}",
            web.shutdown_timeout
        ),
    }
}

/// Resolves on Ctrl-C, SIGTERM, or a shutdown error raised by a request.
async fn shutdown_signal(requests: &mut mpsc::Receiver<ShutdownSignal>) -> String {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => "interrupt".to_string(),
        () = sigterm => "terminate".to_string(),
        Some(signal) = requests.recv() => {
            format!("request {} raised: {}", signal.trace_id, signal.reason)
        }
    }
}
