use crate::config::Config;
use crate::platform::PlatformContext;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub platform: PlatformContext,
    pub config: Config,
}
