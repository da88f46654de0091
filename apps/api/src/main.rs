mod ai;
mod auth;
mod config;
mod errors;
mod feedback;
mod onboarding;
mod platform;
mod resumes;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::ai::transport::{AiTransport, HttpTransport};
use crate::ai::AiClient;
use crate::config::Config;
use crate::platform::auth::KvSessionAuth;
use crate::platform::kv::RedisKvStore;
use crate::platform::pdf::PdftoppmRasterizer;
use crate::platform::storage::S3FileStore;
use crate::platform::{FileStore, KvStore, PlatformContext};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting RecruitMind API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    let kv: Arc<dyn KvStore> = Arc::new(RedisKvStore::connect(&redis).await?);

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let fs: Arc<dyn FileStore> = Arc::new(S3FileStore::new(s3, config.s3_bucket.clone()));
    info!("S3 file store initialized (bucket: {})", config.s3_bucket);

    // Initialize AI gateway
    let transport: Option<Arc<dyn AiTransport>> = match &config.ai_gateway_url {
        Some(url) => {
            let http = HttpTransport::new(url, config.ai_gateway_api_key.clone(), fs.clone())?;
            info!("AI transport initialized ({url})");
            Some(Arc::new(http))
        }
        None => {
            warn!("AI_GATEWAY_URL not set; AI features are unavailable");
            None
        }
    };

    let platform = PlatformContext {
        auth: Arc::new(KvSessionAuth::new(kv.clone())),
        fs,
        kv,
        pdf: Arc::new(PdftoppmRasterizer::new(config.pdftoppm_path.clone())),
        ai: AiClient::new(transport, config.ai_attempt_timeout),
    };

    let state = AppState {
        platform,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "recruit-mind-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
