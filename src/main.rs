use std::sync::Arc;

use fleet_checkin::api;
use fleet_checkin::config::{Config, LogFormat};
use fleet_checkin::error::AppError;
use fleet_checkin::observability::logging::init_tracing;
use fleet_checkin::state::AppState;
use fleet_checkin::store::DocumentStore;
use fleet_checkin::store::mongo::MongoStore;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            init_tracing("info", LogFormat::Compact);
            tracing::error!(error = %err, "refusing to start");
            return Err(err);
        }
    };

    init_tracing(&config.log_level, config.log_format);

    let store = MongoStore::connect(&config).await.map_err(|err| {
        tracing::error!(error = %err, "document store unreachable at startup");
        AppError::from(err)
    })?;
    let store: Arc<dyn DocumentStore> = Arc::new(store);

    let app_state = AppState::new(store.clone(), config.environment.clone());
    let app = api::rest::router(Arc::new(app_state))
        .layer(api::rest::cors_layer(config.cors_origin.as_deref())?);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        environment = %config.environment,
        "http server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    store.close().await;
    tracing::info!("document store connection closed");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for shutdown signal");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
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

    tracing::info!("shutdown signal received, draining in-flight requests");
}
