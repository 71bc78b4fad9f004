//! `hfd` — the H&F site daemon.
//!
//! Serves the public site API and the admin dashboard from one process.
//!
//! # Usage
//!
//! ```text
//! hfd start                               # serve from ~/.hf-site
//! hfd start -c hfd.toml                   # start with a config file
//! hfd start -d ./site -l 127.0.0.1:9090   # another data dir and address
//! hfd start --memory                      # volatile tables and images
//! hfd hash-password 's3cret'              # print a bcrypt hash for [[auth.admins]]
//! hfd status                              # row counts per table
//! ```
//!
//! `HF_ADMIN_EMAIL` and `HF_ADMIN_PASSWORD` add a bootstrap admin account on
//! top of the ones listed in the config file.

mod config;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hf_auth::{AdminAccount, LocalAuth, hash_password};
use hf_http::{HttpServer, HttpServerConfig};
use hf_meta::{FjallTables, MemoryTables, Query, TableClient};
use hf_site::Site;
use hf_store::{FileObjectStore, MemoryObjectStore, ObjectStore};
use hf_types::TableName;
use tracing::{debug, info, warn};

use config::{CliConfig, StorageBackend};

/// How often expired sessions are dropped.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "hfd", version, about = "H&F Ltd site and admin dashboard server")]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    Start {
        /// Override data directory.
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Override HTTP listen address (e.g. "127.0.0.1:9090").
        #[arg(short = 'l', long)]
        listen_addr: Option<String>,

        /// Run fully in-memory (no disk persistence).
        #[arg(short, long)]
        memory: bool,

        /// Email of a bootstrap admin account.
        #[arg(long, env = "HF_ADMIN_EMAIL", requires = "admin_password")]
        admin_email: Option<String>,

        /// Password of the bootstrap admin account.
        #[arg(long, env = "HF_ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: Option<String>,
    },

    /// Print a bcrypt hash for an `[[auth.admins]]` entry.
    HashPassword {
        password: String,

        /// bcrypt cost; defaults to `[auth] bcrypt_cost`.
        #[arg(long)]
        cost: Option<u32>,
    },

    /// Show row counts from the local tables.
    Status {
        /// Override data directory.
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    telemetry::init(&config.log.level);

    match cli.command {
        Commands::Start {
            data_dir,
            listen_addr,
            memory,
            admin_email,
            admin_password,
        } => {
            // CLI args override config file values.
            if let Some(dir) = data_dir {
                config.storage.data_dir = dir;
            }
            if let Some(addr) = listen_addr {
                config.server.listen_addr = addr;
            }
            if memory {
                config.storage.backend = "memory".to_string();
            }
            let bootstrap = match (admin_email, admin_password) {
                (Some(email), Some(password)) => Some(AdminAccount {
                    email,
                    password_hash: hash_password(&password, config.auth.bcrypt_cost)
                        .context("failed to hash bootstrap admin password")?,
                }),
                _ => None,
            };
            cmd_start(config, bootstrap).await
        }
        Commands::HashPassword { password, cost } => {
            let hash = hash_password(&password, cost.unwrap_or(config.auth.bcrypt_cost))
                .context("failed to hash password")?;
            println!("{hash}");
            Ok(())
        }
        Commands::Status { data_dir } => {
            if let Some(dir) = data_dir {
                config.storage.data_dir = dir;
            }
            cmd_status(&config).await
        }
    }
}

// -----------------------------------------------------------------------
// hfd start
// -----------------------------------------------------------------------

async fn cmd_start(config: CliConfig, bootstrap: Option<AdminAccount>) -> Result<()> {
    info!("starting hfd");
    info!(
        data_dir = %config.storage.data_dir.display(),
        listen_addr = %config.server.listen_addr,
        backend = %config.storage.backend,
        bucket = %config.storage.bucket,
        "server configuration"
    );

    let memory_mode = config.storage_backend()? == StorageBackend::Memory;

    if !memory_mode {
        std::fs::create_dir_all(&config.storage.data_dir)
            .context("failed to create data directory")?;
    }

    // --- Tables ---
    let tables: Arc<dyn TableClient> = if memory_mode {
        info!("using in-memory tables");
        Arc::new(MemoryTables::new())
    } else {
        let path = config.storage.data_dir.join("tables");
        info!(path = %path.display(), "using fjall tables");
        Arc::new(FjallTables::open(&path).context("failed to open tables")?)
    };

    // --- Object store ---
    let public_url = config.server.public_url.clone();
    let store: Arc<dyn ObjectStore> = if memory_mode {
        info!(max_bytes = config.memory_max_bytes(), "using in-memory object store");
        Arc::new(MemoryObjectStore::new(public_url, config.memory_max_bytes()))
    } else {
        let path = config.storage.data_dir.join("objects");
        info!(path = %path.display(), "using file object store");
        Arc::new(FileObjectStore::new(&path, public_url).context("failed to open object store")?)
    };

    let site = Site::new(tables, store, config.storage.bucket.clone());

    let seeded = site
        .dashboard
        .content
        .seed_defaults()
        .await
        .context("failed to seed content blocks")?;
    if seeded > 0 {
        info!(seeded, "created default content blocks");
    }

    // --- Admin accounts ---
    let mut accounts: Vec<AdminAccount> = config
        .auth
        .admins
        .iter()
        .map(|a| AdminAccount {
            email: a.email.clone(),
            password_hash: a.password_hash.clone(),
        })
        .collect();
    if let Some(account) = bootstrap {
        info!(email = %account.email, "bootstrap admin account from environment");
        accounts.push(account);
    }
    if accounts.is_empty() {
        warn!("no admin accounts configured; the dashboard cannot be signed into");
    }

    let auth = Arc::new(LocalAuth::new(accounts, config.session_ttl()));
    info!(accounts = auth.account_count(), "admin accounts loaded");

    // Lookups drop expired sessions they touch; abandoned ones go here.
    let purge_auth = auth.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = purge_auth.purge_expired();
            if purged > 0 {
                debug!(purged, "expired sessions purged");
            }
        }
    });

    // --- HTTP server ---
    let server = HttpServer::new(HttpServerConfig {
        site,
        auth,
        max_upload_bytes: config.max_upload_bytes(),
        cors_origins: config.server.cors_origins.clone(),
        secure_cookies: config.server.secure_cookies,
    });

    server
        .serve_with_shutdown(&config.server.listen_addr, shutdown_signal())
        .await
        .context("http server failed")?;

    info!("hfd stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// -----------------------------------------------------------------------
// hfd status
// -----------------------------------------------------------------------

async fn cmd_status(config: &CliConfig) -> Result<()> {
    let path = config.storage.data_dir.join("tables");
    if !path.exists() {
        println!("No tables at {}", path.display());
        return Ok(());
    }

    let tables = FjallTables::open(&path).context("failed to open tables")?;

    println!("Tables at {}", path.display());
    println!("{:<24} {:>8}", "table", "rows");
    for table in TableName::ALL {
        let rows = tables
            .select(&Query::select_all(*table))
            .await
            .with_context(|| format!("failed to read {table}"))?;
        println!("{:<24} {:>8}", table.as_str(), rows.len());
    }
    Ok(())
}
