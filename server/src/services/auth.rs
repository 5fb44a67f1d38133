//! Authentication service
//!
//! Registration, login and session management. Passwords are hashed with
//! Argon2id; sessions are opaque random tokens whose digest is stored with
//! a sliding expiry.

use crate::config::{MAX_USERNAME_LENGTH, SESSION_TTL_HOURS};
use crate::crypto;
use crate::database::{Repository, User};
use crate::error::{AppError, Result};
use chrono::{Duration, Utc};

/// A freshly issued login session
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub user: User,
    /// Raw token for the session cookie; never persisted
    pub token: String,
}

/// Service for accounts and sessions
#[derive(Clone)]
pub struct AuthService {
    repo: Repository,
}

impl AuthService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Register a new user
    pub async fn register(&self, username: &str, password: &str) -> Result<User> {
        let username = username.trim();

        if username.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Please provide username & password".to_string(),
            ));
        }

        if username.chars().count() > MAX_USERNAME_LENGTH {
            return Err(AppError::Validation(format!(
                "Username is longer than {} characters",
                MAX_USERNAME_LENGTH
            )));
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || crypto::hash_password(&password))
            .await
            .map_err(|e| AppError::Generic(format!("Password hashing task failed: {}", e)))??;
        let user = self.repo.create_user(username, &password_hash).await?;

        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Check credentials and open a session
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginSession> {
        let username = username.trim();

        let user = match self.repo.get_user_by_username(username).await? {
            Some(user) if check_password(password, &user.password_hash).await? => user,
            _ => {
                tracing::warn!("Failed login attempt");
                return Err(AppError::Auth("Invalid credentials".to_string()));
            }
        };

        let now = Utc::now();
        self.repo.delete_expired_sessions(now).await?;

        let token = crypto::generate_session_token();
        self.repo
            .create_session(
                user.id,
                &crypto::token_digest(&token),
                now + Duration::hours(SESSION_TTL_HOURS),
            )
            .await?;

        tracing::info!("User {} logged in", user.id);
        Ok(LoginSession { user, token })
    }

    /// Resolve a session token to its user, extending the session if live
    pub async fn resolve_session(&self, token: &str) -> Result<Option<User>> {
        if token.is_empty() {
            return Ok(None);
        }

        let digest = crypto::token_digest(token);
        let now = Utc::now();

        let user = self.repo.find_session_user(&digest, now).await?;
        if user.is_some() {
            self.repo
                .extend_session(&digest, now + Duration::hours(SESSION_TTL_HOURS))
                .await?;
        }

        Ok(user)
    }

    /// End a session; unknown tokens are ignored
    pub async fn logout(&self, token: &str) -> Result<()> {
        if self.repo.delete_session(&crypto::token_digest(token)).await? {
            tracing::info!("Session closed");
        }
        Ok(())
    }
}

/// Argon2 verification off the async workers
async fn check_password(password: &str, stored_hash: &str) -> Result<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();

    tokio::task::spawn_blocking(move || crypto::verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Generic(format!("Password check task failed: {}", e)))
}
