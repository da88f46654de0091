use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::{KvStore, PlatformError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uuid: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub created_at: DateTime<Utc>,
}

/// Sign-in/sign-out with per-account credentials.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Registers `username` on first use; afterwards the password must match.
    /// A mismatch is `PlatformError::InvalidCredentials`.
    async fn sign_in(&self, username: &str, password: &str) -> Result<Session, PlatformError>;

    async fn user_for_token(&self, token: &str) -> Result<Option<User>, PlatformError>;

    async fn sign_out(&self, token: &str) -> Result<(), PlatformError>;
}

/// Stored under `account:<username>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    #[serde(flatten)]
    user: User,
    /// Argon2 PHC string.
    password_hash: String,
}

/// Accounts and sessions kept as JSON entries in a key-value store:
/// `account:<username>` and `session:<token>`.
pub struct KvSessionAuth {
    kv: Arc<dyn KvStore>,
    hasher: Argon2<'static>,
}

impl KvSessionAuth {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self::with_hasher(kv, Argon2::default())
    }

    pub fn with_hasher(kv: Arc<dyn KvStore>, hasher: Argon2<'static>) -> Self {
        Self { kv, hasher }
    }

    async fn hash_password(&self, password: &str) -> Result<String, PlatformError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || -> Result<String, PlatformError> {
            let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
                .map_err(|e| PlatformError::Hashing(e.to_string()))?;
            hasher
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| PlatformError::Hashing(e.to_string()))
        })
        .await
        .map_err(|e| PlatformError::Hashing(e.to_string()))?
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, PlatformError> {
        let hasher = self.hasher.clone();
        let (password, hash) = (password.to_string(), hash.to_string());
        tokio::task::spawn_blocking(move || -> Result<bool, PlatformError> {
            let parsed =
                PasswordHash::new(&hash).map_err(|e| PlatformError::Hashing(e.to_string()))?;
            Ok(hasher.verify_password(password.as_bytes(), &parsed).is_ok())
        })
        .await
        .map_err(|e| PlatformError::Hashing(e.to_string()))?
    }

    /// Loads the account, creating it when absent. Creation is a
    /// write-if-absent; a concurrent sign-in that lost the race reads the
    /// winner's account and is checked against its password.
    async fn account(&self, username: &str, password: &str) -> Result<Account, PlatformError> {
        let key = format!("account:{username}");
        if let Some(raw) = self.kv.get(&key).await? {
            return Ok(serde_json::from_str(&raw)?);
        }

        let account = Account {
            user: User {
                uuid: Uuid::new_v4(),
                username: username.to_string(),
            },
            password_hash: self.hash_password(password).await?,
        };
        if self
            .kv
            .set_if_absent(&key, &serde_json::to_string(&account)?)
            .await?
        {
            info!("Created account for {username} ({})", account.user.uuid);
            return Ok(account);
        }

        let raw = self
            .kv
            .get(&key)
            .await?
            .ok_or_else(|| PlatformError::NotFound(key.clone()))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[async_trait]
impl AuthService for KvSessionAuth {
    async fn sign_in(&self, username: &str, password: &str) -> Result<Session, PlatformError> {
        let account = self.account(username, password).await?;
        if !self
            .verify_password(password, &account.password_hash)
            .await?
        {
            warn!("Rejected sign-in for {username}: wrong password");
            return Err(PlatformError::InvalidCredentials);
        }

        let session = Session {
            token: Uuid::new_v4().simple().to_string(),
            user: account.user,
            created_at: Utc::now(),
        };
        self.kv
            .set(
                &format!("session:{}", session.token),
                &serde_json::to_string(&session)?,
            )
            .await?;
        info!("User {} signed in", session.user.username);
        Ok(session)
    }

    async fn user_for_token(&self, token: &str) -> Result<Option<User>, PlatformError> {
        match self.kv.get(&format!("session:{token}")).await? {
            Some(raw) => Ok(Some(serde_json::from_str::<Session>(&raw)?.user)),
            None => Ok(None),
        }
    }

    async fn sign_out(&self, token: &str) -> Result<(), PlatformError> {
        self.kv.delete(&format!("session:{token}")).await?;
        Ok(())
    }
}
