use std::{env, time::Duration};

use log::*;
use sfp_common::{helpers::env_or_default, Secret};

const DEFAULT_SFP_HOST: &str = "127.0.0.1";
const DEFAULT_SFP_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.db";
const DEFAULT_SSE_HEARTBEAT_SECS: u64 = 15;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The shared secret that staff must present in the `X-Admin-Token` header to override payment status by hand.
    /// When empty, every override request is refused.
    pub admin_token: Secret<String>,
    /// The interval between keep-alive comments on open status streams.
    pub sse_heartbeat: Duration,
    /// Queue depth for the background status-changed hook.
    pub event_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SFP_HOST.to_string(),
            port: DEFAULT_SFP_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            admin_token: Secret::default(),
            sse_heartbeat: Duration::from_secs(DEFAULT_SSE_HEARTBEAT_SECS),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("SFP_HOST").ok().unwrap_or_else(|| DEFAULT_SFP_HOST.into());
        let port = env_or_default("SFP_PORT", DEFAULT_SFP_PORT);
        let database_url = env::var("SFP_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SFP_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let admin_token = Secret::new(env::var("SFP_ADMIN_TOKEN").ok().unwrap_or_default());
        if !admin_token.is_set() {
            warn!(
                "🪛️ SFP_ADMIN_TOKEN is not set. Manual payment status overrides are disabled until you configure \
                 one."
            );
        }
        let heartbeat_secs = match env_or_default("SFP_SSE_HEARTBEAT_SECS", DEFAULT_SSE_HEARTBEAT_SECS) {
            0 => {
                warn!("🪛️ SFP_SSE_HEARTBEAT_SECS must be positive. Using {DEFAULT_SSE_HEARTBEAT_SECS}s.");
                DEFAULT_SSE_HEARTBEAT_SECS
            },
            n => n,
        };
        let event_buffer_size = env_or_default("SFP_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE).max(1);
        Self {
            host,
            port,
            database_url,
            admin_token,
            sse_heartbeat: Duration::from_secs(heartbeat_secs),
            event_buffer_size,
        }
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub sse_heartbeat: Duration,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { sse_heartbeat: config.sse_heartbeat }
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}
