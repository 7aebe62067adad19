use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use tokio::signal;
use tracing::info;

use storefront_checkout as app;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is the normal case outside local development.
    let _ = dotenvy::dotenv();

    let cfg = app::config::load_config()?;
    app::config::init_tracing(cfg.log_level(), cfg.log_json);
    cfg.warn_on_missing_secrets();
    app::handlers::health::init_start_time();

    let store = app::db::build_store(&cfg).await?;
    if cfg.seed_catalog {
        app::catalog::seed_if_empty(store.as_ref()).await?;
    }

    let gateway = Arc::new(app::gateway::StripeGateway::new(
        app::gateway::StripeSettings::from_config(&cfg),
    )?);

    let addr = SocketAddr::new(cfg.host.parse::<IpAddr>()?, cfg.port);
    let router = app::app_router(app::AppState::new(cfg, store, gateway));

    info!("storefront-checkout listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
