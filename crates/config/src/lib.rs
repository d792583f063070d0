use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "huddle.toml",
    "config/huddle.toml",
    "crates/config/huddle.toml",
    "../huddle.toml",
    "../config/huddle.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7070,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://huddle.db".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_session_ttl")]
    pub session_ttl_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: Self::default_session_ttl(),
        }
    }
}

impl AuthConfig {
    const fn default_session_ttl() -> u64 {
        86_400
    }
}

/// Tuning knobs for the room engine.
///
/// ```
/// use huddle_config::RealtimeConfig;
///
/// let realtime = RealtimeConfig::default();
/// assert_eq!(realtime.edit_window_seconds, 900);
/// assert_eq!(realtime.send_timeout().as_millis(), 2_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// How long after sending a message its author may still edit it.
    #[serde(default = "RealtimeConfig::default_edit_window")]
    pub edit_window_seconds: u64,
    /// Per-recipient budget for a single broadcast write.
    #[serde(default = "RealtimeConfig::default_send_timeout")]
    pub send_timeout_ms: u64,
    #[serde(default = "RealtimeConfig::default_outbound_buffer")]
    pub outbound_buffer: usize,
    #[serde(default = "RealtimeConfig::default_notification_buffer")]
    pub notification_buffer: usize,
    /// Base URL used when linking mention notifications back to a room.
    #[serde(default = "RealtimeConfig::default_public_url")]
    pub public_url: String,
}

impl RealtimeConfig {
    const fn default_edit_window() -> u64 {
        900
    }

    const fn default_send_timeout() -> u64 {
        2_000
    }

    const fn default_outbound_buffer() -> usize {
        256
    }

    const fn default_notification_buffer() -> usize {
        64
    }

    fn default_public_url() -> String {
        "http://localhost:5173".to_string()
    }

    pub fn edit_window(&self) -> Duration {
        Duration::from_secs(self.edit_window_seconds)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            edit_window_seconds: Self::default_edit_window(),
            send_timeout_ms: Self::default_send_timeout(),
            outbound_buffer: Self::default_outbound_buffer(),
            notification_buffer: Self::default_notification_buffer(),
            public_url: Self::default_public_url(),
        }
    }
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use huddle_config::load;
///
/// std::env::remove_var("HUDDLE_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default(
            "auth.session_ttl_seconds",
            clamp_i64(defaults.auth.session_ttl_seconds),
        )?
        .set_default(
            "realtime.edit_window_seconds",
            clamp_i64(defaults.realtime.edit_window_seconds),
        )?
        .set_default(
            "realtime.send_timeout_ms",
            clamp_i64(defaults.realtime.send_timeout_ms),
        )?
        .set_default(
            "realtime.outbound_buffer",
            clamp_i64(defaults.realtime.outbound_buffer as u64),
        )?
        .set_default(
            "realtime.notification_buffer",
            clamp_i64(defaults.realtime.notification_buffer as u64),
        )?
        .set_default("realtime.public_url", defaults.realtime.public_url.clone())?;

    let environment_overrides = config::Environment::with_prefix("HUDDLE").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("HUDDLE_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via HUDDLE_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.realtime.outbound_buffer == 0 {
        config.realtime.outbound_buffer = 1;
    }
    if config.realtime.notification_buffer == 0 {
        config.realtime.notification_buffer = 1;
    }
    if config.auth.session_ttl_seconds > i64::MAX as u64 {
        config.auth.session_ttl_seconds = i64::MAX as u64;
    }

    debug!(?config, "loaded backend configuration");
    Ok(config)
}
