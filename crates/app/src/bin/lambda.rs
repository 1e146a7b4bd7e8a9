//! Nestly API - AWS Lambda Runtime

use lambda_http::{run, Error};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tracing::info;

use nestly_app::{body_limit_layer, build_cors_layer, create_app};
use nestly_common::{Config, StoreBackend};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::from_env()
        .map_err(|e| Error::from(format!("Configuration error: {}", e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.rust_log))
        .json()
        .without_time()
        .init();

    info!("Initializing Nestly API Lambda");

    let pool = match (config.store_backend, config.database_url.as_deref()) {
        (StoreBackend::Postgres, Some(url)) => {
            let pool = PgPool::connect(url)
                .await
                .map_err(|e| Error::from(format!("Database error: {}", e)))?;
            info!("Database connection established");
            Some(pool)
        }
        _ => None,
    };

    let app = create_app(config, pool)
        .await
        .map_err(|e| Error::from(format!("App initialization error: {}", e)))?;

    let cors_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .map_err(|_| Error::from("CORS_ALLOWED_ORIGINS environment variable is required"))?;

    let app = app
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&cors_origins))
        .layer(body_limit_layer());

    info!("Nestly API Lambda ready to serve requests");

    run(app).await
}
