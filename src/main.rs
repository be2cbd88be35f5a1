use athlete_training::auth::AuthGate;
use athlete_training::gemini::GeminiClient;
use athlete_training::insights::{InsightService, TextGenerator};
use athlete_training::{router, AppState, Config, JsonFileStore};
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!(?config, "starting athlete training service");

    let store = JsonFileStore::open(config.data_path.clone()).await?;
    let auth = AuthGate::new(
        &config.jwt_secret,
        config.token_ttl_hours,
        config.bcrypt_cost,
    );

    let generator: Option<Arc<dyn TextGenerator>> = match &config.gemini_api_key {
        Some(key) => {
            let client = GeminiClient::new(key.clone(), config.gemini_model.clone())?;
            info!(model = %config.gemini_model, "Gemini insights enabled");
            Some(Arc::new(client))
        }
        None => {
            warn!("GEMINI_API_KEY not set, insights and plans use templates");
            None
        }
    };

    let state = AppState::new(store, auth, InsightService::new(generator));
    let app = router(state, &config.cors_origin);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
