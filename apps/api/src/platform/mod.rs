//! Platform collaborators: auth, file storage, key-value store and PDF rasterization.
//!
//! Everything the handlers need is carried in an explicitly constructed
//! `PlatformContext` (built once in `main`) and a per-request `UserSession`
//! (built by the auth extractor, torn down by sign-out).

use std::sync::Arc;

use thiserror::Error;

use crate::ai::AiClient;

pub mod auth;
pub mod kv;
pub mod pdf;
pub mod storage;

pub use auth::{AuthService, User};
pub use kv::{KvStore, ScopedKv};
pub use pdf::{PdfRasterizer, RasterizedImage};
pub use storage::{FileStore, FsItem};

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("KV error: {0}")]
    Kv(#[from] redis::RedisError),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handles to every platform service. Cheap to clone.
#[derive(Clone)]
pub struct PlatformContext {
    pub auth: Arc<dyn AuthService>,
    pub fs: Arc<dyn FileStore>,
    pub kv: Arc<dyn KvStore>,
    pub pdf: Arc<dyn PdfRasterizer>,
    pub ai: AiClient,
}

impl PlatformContext {
    /// Binds the platform to one signed-in user.
    pub fn session_for(&self, token: String, user: User) -> UserSession {
        let kv = ScopedKv::new(self.kv.clone(), format!("user:{}:", user.uuid));
        UserSession { token, user, kv }
    }
}

/// A signed-in user plus their namespaced view of the key-value store.
pub struct UserSession {
    pub token: String,
    pub user: User,
    pub kv: ScopedKv,
}
