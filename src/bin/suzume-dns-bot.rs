use std::{future::IntoFuture, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use suzume::{
    AppState, SharedState, api,
    bot::{AccessGate, Bot, spawn_expiry_sweep},
    cloudflare::CloudflareClient,
    config::AppConfig,
    dns::DnsService,
    store::ConfigStore,
    telegram::TelegramClient,
};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, rename_all = "kebab-case")]
struct Cli {
    /// Telegram bot token
    #[arg(long, value_name = "TOKEN")]
    telegram_token: String,
    /// Cloudflare API token with DNS edit permissions
    #[arg(long, value_name = "TOKEN")]
    cloudflare_token: String,
    /// Directory holding the persisted settings file
    #[arg(long, value_name = "PATH", default_value = "./data")]
    data_dir: PathBuf,
    /// Listen address for the RPC endpoint
    #[arg(long, value_name = "ADDR", default_value = "0.0.0.0:8875")]
    listen: SocketAddr,
    /// Authorized Telegram user ID (repeat for multiple values)
    #[arg(long = "allowed-user", value_name = "ID")]
    allowed_user: Vec<i64>,
    /// HTTP request timeout in seconds for upstream APIs
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    http_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = build_app_config(&cli);
    let state = init_shared_state(&cli, config.clone())?;

    let telegram = Arc::new(TelegramClient::new(
        &config.telegram_token,
        config.http_timeout,
    )?);
    let gate = Arc::new(AccessGate::new(
        &config.allowed_users,
        Arc::clone(&state.store),
    ));
    let bot = Arc::new(Bot::new(
        telegram,
        Arc::clone(&state.dns),
        Arc::clone(&state.store),
        gate,
    ));
    let _sweeper = spawn_expiry_sweep(bot.conversations());

    let app = api::create_router(state);
    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind to {}", cli.listen))?;
    info!("rpc listening on http://{}", listener.local_addr()?);

    tokio::select! {
        res = axum::serve(listener, app.into_make_service()).into_future() => {
            res.context("rpc server exited with error")?;
        }
        res = bot.run() => {
            res.context("bot loop exited with error")?;
        }
        _ = shutdown_signal() => {}
    }

    Ok(())
}

fn build_app_config(cli: &Cli) -> AppConfig {
    AppConfig {
        telegram_token: cli.telegram_token.clone(),
        cloudflare_token: cli.cloudflare_token.clone(),
        allowed_users: cli.allowed_user.clone(),
        http_timeout: Duration::from_secs(cli.http_timeout),
    }
}

fn init_shared_state(cli: &Cli, config: AppConfig) -> Result<SharedState> {
    let store = Arc::new(ConfigStore::open(&cli.data_dir)?);
    let cloudflare = CloudflareClient::new(&config.cloudflare_token, config.http_timeout)?;
    let dns = Arc::new(DnsService::new(
        Arc::new(cloudflare),
        store.record_defaults(),
    ));

    Ok(Arc::new(AppState { config, store, dns }))
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("failed to install CTRL+C handler: {err}");
    }
    info!("shutdown signal received");
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,suzume=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
