use std::time::Duration;

#[derive(Clone)]
pub struct AppConfig {
    pub telegram_token: String,
    pub cloudflare_token: String,
    /// User IDs seeded from the command line; merged with the persisted
    /// allow-list by the access gate. Empty means open access.
    pub allowed_users: Vec<i64>,
    pub http_timeout: Duration,
}

/// Values filled into record inputs when the caller leaves them unset.
#[derive(Debug, Clone, Copy)]
pub struct RecordDefaults {
    pub ttl: u32,
    pub proxied: bool,
}

impl Default for RecordDefaults {
    fn default() -> Self {
        Self {
            ttl: 300,
            proxied: true,
        }
    }
}
