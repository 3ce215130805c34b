use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr, time::Duration};

use crate::services::compression::CompressionLimits;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub database_url: String,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
    pub max_image_bytes: usize,
    pub max_image_dimension: u32,
    pub redirect_delay: Duration,
}

/// One-shot actions that run instead of the server.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Serve,
    Migrate,
    AddUser {
        email: String,
        name: Option<String>,
        admin: bool,
    },
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Event evidence photo service")]
pub struct Args {
    /// Host to bind to (overrides EVIDENCE_STORE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides EVIDENCE_STORE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where photo payloads are stored (overrides EVIDENCE_STORE_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Database URL (overrides EVIDENCE_STORE_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Base URL stored photos are served from (overrides EVIDENCE_STORE_PUBLIC_BASE_URL)
    #[arg(long)]
    pub public_base_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,

    /// Create a user with this email, print its API token and exit
    #[arg(long, value_name = "EMAIL")]
    pub add_user: Option<String>,

    /// Display name for --add-user
    #[arg(long, requires = "add_user")]
    pub user_name: Option<String>,

    /// Give the user created by --add-user the admin role
    #[arg(long, requires = "add_user")]
    pub admin: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the command to run.
    pub fn from_env_and_args() -> Result<(Self, Command)> {
        Self::from_args(Args::parse())
    }

    fn from_args(args: Args) -> Result<(Self, Command)> {
        // --- Environment fallback ---
        let env_host = env::var("EVIDENCE_STORE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = env_parse("EVIDENCE_STORE_PORT", 3000u16)?;
        let env_storage =
            env::var("EVIDENCE_STORE_STORAGE_DIR").unwrap_or_else(|_| "./data/objects".into());
        let env_db = env::var("EVIDENCE_STORE_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/evidence_store.db".into());
        let env_public = env::var("EVIDENCE_STORE_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000/objects".into());
        let defaults = CompressionLimits::default();

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            database_url: args.database_url.unwrap_or(env_db),
            public_base_url: args.public_base_url.unwrap_or(env_public),
            max_upload_bytes: env_parse("EVIDENCE_STORE_MAX_UPLOAD_BYTES", 64 * 1024 * 1024)?,
            max_image_bytes: env_parse("EVIDENCE_STORE_MAX_IMAGE_BYTES", defaults.max_bytes)?,
            max_image_dimension: env_parse(
                "EVIDENCE_STORE_MAX_IMAGE_DIMENSION",
                defaults.max_dimension,
            )?,
            redirect_delay: Duration::from_millis(env_parse(
                "EVIDENCE_STORE_REDIRECT_DELAY_MS",
                2000u64,
            )?),
        };

        let command = match (args.add_user, args.migrate) {
            (Some(email), _) => Command::AddUser {
                email,
                name: args.user_name,
                admin: args.admin,
            },
            (None, true) => Command::Migrate,
            (None, false) => Command::Serve,
        };

        Ok((cfg, command))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn compression_limits(&self) -> CompressionLimits {
        CompressionLimits {
            max_bytes: self.max_image_bytes,
            max_dimension: self.max_image_dimension,
        }
    }
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}
