use std::sync::Arc;

use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dashy_licensing::config::Config;
use dashy_licensing::db::{create_pool, init_db, queries, AppState};
use dashy_licensing::discord::DiscordClient;
use dashy_licensing::handlers;
use dashy_licensing::models::{IssueLicense, LicensePlan};

#[derive(Parser, Debug)]
#[command(name = "dashy-licensing")]
#[command(about = "License entitlement service for the Dashy desktop app")]
struct Cli {
    /// Issue a dev lifetime license key on startup (dev mode only)
    #[arg(long)]
    seed: bool,
}

/// Issues a lifetime key so a fresh dev environment has something to redeem.
fn seed_dev_license(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let input = IssueLicense {
        plan: LicensePlan::Lifetime,
        expires_at: None,
        created_by: "dev-seed".to_string(),
    };
    let license =
        queries::issue_license(&conn, &state.key_prefix, &input).expect("Failed to seed license");

    tracing::info!("============================================");
    tracing::info!("DEV LICENSE KEY: {}", license.key);
    tracing::info!("============================================");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dashy_licensing=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let discord = config
        .discord
        .clone()
        .map(|cfg| DiscordClient::new(cfg).expect("Failed to build Discord client"))
        .map(Arc::new);

    let state = AppState {
        db: db_pool,
        admin_token: config.admin_token.clone(),
        key_prefix: config.key_prefix.clone(),
        discord,
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set DASHY_ENV=dev)");
        } else {
            seed_dev_license(&state);
        }
    }

    let app = Router::new()
        // Public endpoints (caller identity resolved by the external identity provider)
        .merge(handlers::public::router())
        // Administrative API (static bearer credential)
        .merge(handlers::admin::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Dashy licensing server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
