mod app;
mod auth;
mod config;
mod db;
mod error;
mod handler;
mod middleware;
mod model;
mod navigation;
mod notification;
mod route;
mod schema;
mod screen;
mod store;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Server,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    app::AppState,
    auth::{CognitoIdentityProvider, SessionObserver},
    config::{Config, StoreBackend},
    notification::{
        FcmTransport, LocalTransport, NotificationBridge, PushTransport, SqlitePreferenceStore,
    },
    store::{MemoryTaskStore, SqliteTaskStore, TaskStore},
};

// Entry point of the application
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_app=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("🔥 Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    // Preferences always live in SQLite; tasks may stay in memory
    let pool = match db::connect(&config.database_url, config.max_connections).await {
        Ok(pool) => {
            info!("✅ Connection to the database is successful!");
            pool
        }
        Err(err) => {
            error!("🔥 Failed to connect to the database: {}", err);
            std::process::exit(1);
        }
    };

    let store: Arc<dyn TaskStore> = match config.store {
        StoreBackend::Sqlite => Arc::new(SqliteTaskStore::new(pool.clone())),
        StoreBackend::Memory => Arc::new(MemoryTaskStore::new()),
    };

    let transport: Arc<dyn PushTransport> = match &config.fcm {
        Some(fcm) => Arc::new(FcmTransport::new(fcm.clone())),
        None => {
            info!("No FCM credentials configured, push stays local");
            Arc::new(LocalTransport::new())
        }
    };
    let notifications = NotificationBridge::new(
        transport,
        Arc::new(SqlitePreferenceStore::new(pool)),
        config.motivation_topic.clone(),
    );

    let provider = CognitoIdentityProvider::new(config.cognito.clone()).await;
    let session = SessionObserver::new(Arc::new(provider));

    // Create an Arc-wrapped instance of the application state
    let app_state = Arc::new(AppState::new(store, session, notifications));
    let _watcher = app_state.start().await;

    let origin = match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => origin,
        Err(err) => {
            error!("🔥 Invalid CORS origin {}: {}", config.cors_origin, err);
            std::process::exit(1);
        }
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    let app = route::create_router(app_state).layer(cors);

    info!("🚀 Server started successfully on {}", config.bind_addr);

    if let Err(err) = Server::bind(&config.bind_addr)
        .serve(app.into_make_service())
        .await
    {
        error!("🔥 Server error: {}", err);
        std::process::exit(1);
    }
}
