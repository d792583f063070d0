use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use huddle_auth::{AuthError, Authenticator};
use huddle_config::AppConfig;
use huddle_database::{
    initialize_database, AuditRepository, DocumentRepository, MembershipRepository,
    MessageRepository, NotificationRepository, UserRepository,
};
use huddle_realtime::{
    Handshake, HtmlSanitizer, Hub, HubCollaborators, Identity, IdentityResolver,
    NotificationService, UserChannels,
};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .with_target(true)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Resolves handshake tokens through the session table.
#[derive(Clone)]
pub struct SessionResolver {
    authenticator: Authenticator,
}

impl SessionResolver {
    pub fn new(authenticator: Authenticator) -> Self {
        Self { authenticator }
    }
}

#[async_trait]
impl IdentityResolver for SessionResolver {
    async fn resolve(&self, handshake: &Handshake) -> Option<Identity> {
        let token = handshake.token()?;
        match self.authenticator.authenticate_token(token).await {
            Ok((user, _session)) => Some(Identity {
                user_id: user.id,
                username: user.username,
                color: user.color,
            }),
            Err(AuthError::Database(error)) => {
                warn!(%error, "session lookup failed");
                None
            }
            Err(error) => {
                debug!(%error, "handshake token rejected");
                None
            }
        }
    }
}

#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub authenticator: Authenticator,
    pub hub: Hub,
    pub channels: UserChannels,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialise database")?;

        let authenticator = Authenticator::new(db_pool.clone(), &config.auth);
        let channels = UserChannels::new(config.realtime.notification_buffer);
        let notifier = NotificationService::new(
            channels.clone(),
            Arc::new(NotificationRepository::new(db_pool.clone())),
        );

        let hub = Hub::new(
            HubCollaborators {
                identities: Arc::new(SessionResolver::new(authenticator.clone())),
                authorizer: Arc::new(MembershipRepository::new(db_pool.clone())),
                directory: Arc::new(UserRepository::new(db_pool.clone())),
                notifier: Arc::new(notifier),
                messages: Arc::new(MessageRepository::new(db_pool.clone())),
                documents: Arc::new(DocumentRepository::new(db_pool.clone())),
                audit: Arc::new(AuditRepository::new(db_pool.clone())),
                sanitizer: Arc::new(HtmlSanitizer),
            },
            &config.realtime,
        );

        info!(
            edit_window_seconds = config.realtime.edit_window_seconds,
            send_timeout_ms = config.realtime.send_timeout_ms,
            "room engine ready"
        );

        Ok(Self {
            db_pool,
            authenticator,
            hub,
            channels,
        })
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
