use std::sync::Arc;

use tracing::info;

use paycollect::{
    build_gateway, router, AppState, Config, InMemoryStore, ManagerConfig, SessionManager,
    SessionStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let gateway = build_gateway(config.artifact_kind, config.processor.clone());
    let store = build_store()?;
    let manager = Arc::new(SessionManager::new(
        gateway,
        store,
        ManagerConfig {
            call_timeout: config.call_timeout,
            history_limit: config.history_limit,
        },
    ));

    let state = AppState {
        manager,
        webhook_secret: Arc::new(config.webhook_secret.clone()),
        signature_header: Arc::new(config.signature_header.clone()),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "paycollect listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}

#[cfg(feature = "redis")]
fn build_store() -> Result<Arc<dyn SessionStore>, Box<dyn std::error::Error>> {
    match std::env::var("REDIS_URL") {
        Ok(url) => {
            let client = redis::Client::open(url)?;
            info!("using redis session store");
            Ok(Arc::new(paycollect::RedisStore::new(client, "paycollect")))
        }
        Err(_) => Ok(Arc::new(InMemoryStore::new())),
    }
}

#[cfg(not(feature = "redis"))]
fn build_store() -> Result<Arc<dyn SessionStore>, Box<dyn std::error::Error>> {
    Ok(Arc::new(InMemoryStore::new()))
}
