use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use huddle_config::AuthConfig;
use rand::RngCore;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};

/// Sessions never outlive a century, keeping expiry timestamps in RFC 3339 range.
const MAX_SESSION_TTL_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

#[derive(Clone)]
pub struct Authenticator {
    pool: SqlitePool,
    session_ttl: Duration,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("session not found")]
    SessionNotFound,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid session token")]
    InvalidSession,
    #[error("user not found")]
    UserNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: &AuthConfig) -> Self {
        let ttl_seconds = config.session_ttl_seconds.min(MAX_SESSION_TTL_SECONDS) as i64;
        let session_ttl = Duration::seconds(ttl_seconds);

        Self { pool, session_ttl }
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// Resolve a session token to its user. Expired sessions are removed.
    pub async fn authenticate_token(&self, token: &str) -> Result<(User, AuthSession), AuthError> {
        let row = sqlx::query("SELECT user_id, expires_at FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(AuthError::SessionNotFound);
        };

        let user_id: i64 = row.try_get("user_id")?;
        let expires_at: String = row.try_get("expires_at")?;

        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .map_err(|_| AuthError::InvalidSession)?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            sqlx::query("DELETE FROM sessions WHERE token = ?")
                .bind(token)
                .execute(&self.pool)
                .await?;
            debug!(user_id, "expired session removed");
            return Err(AuthError::SessionExpired);
        }

        let user = self.fetch_user(user_id).await?;
        let session = AuthSession {
            token: token.to_owned(),
            user_id,
            expires_at,
        };

        Ok((user, session))
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<User, AuthError> {
        let row = sqlx::query("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.fetch_user(row.try_get("id")?).await
    }

    async fn fetch_user(&self, id: i64) -> Result<User, AuthError> {
        let row = sqlx::query("SELECT id, username, display_name, color FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(User {
            id,
            username: row.try_get("username")?,
            display_name: row.try_get("display_name")?,
            color: row.try_get("color")?,
        })
    }

    /// Mint a new session for an existing user.
    pub async fn issue_session(&self, user_id: i64) -> Result<AuthSession, AuthError> {
        self.fetch_user(user_id).await?;

        let token = generate_session_token();
        let now = Utc::now();
        let expires_at = now + self.session_ttl;

        sqlx::query(
            "INSERT INTO sessions (user_id, token, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&token)
        .bind(now.to_rfc3339_opts(SecondsFormat::Micros, true))
        .bind(expires_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await?;

        info!(user_id, expires_at = %expires_at, "session issued");
        Ok(AuthSession {
            token,
            user_id,
            expires_at,
        })
    }

    /// Returns whether a session was removed.
    pub async fn revoke_session(&self, token: &str) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
