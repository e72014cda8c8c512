//! Crate entrypoint wiring together configuration, storage, Cloudflare, and the APIs.

pub mod api;
pub mod auth;
pub mod bot;
pub mod cloudflare;
pub mod config;
pub mod dns;
pub mod error;
pub mod store;
pub mod telegram;
pub mod validation;

use config::AppConfig;
use dns::DnsService;
use store::ConfigStore;

use std::sync::Arc;

/// Complete application dependencies shared across RPC handlers.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<ConfigStore>,
    pub dns: Arc<DnsService>,
}

/// Arc-wrapped version of `AppState` passed into Axum extensions.
pub type SharedState = Arc<AppState>;
