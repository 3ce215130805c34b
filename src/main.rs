use anyhow::{Context, Result};
use axum::Router;
use std::{io::ErrorKind, path::Path};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod state;

use config::{AppConfig, Command};
use models::user::Role;
use services::{
    auth::SqliteAuthService,
    object_store::{LocalObjectStore, ensure_base_dir},
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + command ---
    let (cfg, command) = AppConfig::from_env_and_args()?;

    tracing::info!("Starting evidence-store with config: {:?}", cfg);

    // --- Initialize SQLite connection ---
    let db = db::connect(&cfg.database_url).await?;

    // --- Schema is idempotent; apply it before any command ---
    db::run_migrations(&db).await?;

    match command {
        Command::Migrate => {
            tracing::info!("Database migration complete.");
            return Ok(());
        }
        Command::AddUser { email, name, admin } => {
            let role = if admin { Role::Admin } else { Role::Member };
            let (user, token) = SqliteAuthService::new(db.clone())
                .create_user(&email, name.as_deref(), role)
                .await
                .context("creating user")?;
            println!("{}\t{}\t{}", user.id, user.email, token);
            return Ok(());
        }
        Command::Serve => {}
    }

    // --- Ensure storage directory exists ---
    ensure_base_dir(Path::new(&cfg.storage_dir))
        .await
        .with_context(|| format!("preparing storage directory {}", cfg.storage_dir))?;

    // --- Wire services ---
    let objects = LocalObjectStore::new(&cfg.storage_dir, cfg.public_base_url.clone());
    let state = state::AppState::new(
        db,
        objects,
        cfg.compression_limits(),
        cfg.redirect_delay,
    );

    // --- Build router ---
    let app: Router = routes::routes::routes(cfg.max_upload_bytes).with_state(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
