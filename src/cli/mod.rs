use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::config::{config, AppConfig};
use crate::database::{seed, MemoryStore, PgStore, Store};
use crate::images::{CloudinaryStore, ImageStore, LocalImageStore};
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "wanderlust")]
#[command(about = "Wanderlust - listings, reviews and stays")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Keep all data in memory instead of Postgres")]
        memory: bool,
    },

    #[command(about = "Create the database tables")]
    Migrate,

    #[command(about = "Replace all listings with the sample data")]
    Seed {
        #[arg(long, help = "Username that will own the sample listings")]
        owner: String,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config().clone();

    match cli.command {
        Commands::Serve { memory } => serve(config, memory).await,
        Commands::Migrate => {
            connect(&config).await?;
            println!("Database schema is up to date");
            Ok(())
        }
        Commands::Seed { owner } => {
            let store = connect(&config).await?;
            let user = store
                .find_user_by_username(&owner)
                .await?
                .with_context(|| format!("no user named '{owner}', sign up first"))?;
            let count = seed::reseed(&store, user.id).await?;
            println!("Seeded {count} listings owned by {}", user.username);
            Ok(())
        }
    }
}

/// Connects to Postgres and makes sure the tables exist.
async fn connect(config: &AppConfig) -> anyhow::Result<PgStore> {
    let url = config
        .database
        .url
        .as_deref()
        .context("DATABASE_URL is not set (use `serve --memory` to run without a database)")?;

    tracing::info!("Connecting to {}", config.redacted_database_url().unwrap_or_default());
    let store = PgStore::connect(url, config.database.max_connections).await?;
    store.migrate().await?;
    Ok(store)
}

fn image_store(config: &AppConfig) -> Arc<dyn ImageStore> {
    match &config.storage.cloudinary {
        Some(cloudinary) => {
            tracing::info!("Storing images on Cloudinary in folder {}", config.storage.folder);
            Arc::new(CloudinaryStore::new(cloudinary.clone(), config.storage.folder.clone()))
        }
        None => {
            tracing::info!("Storing images in {}", config.storage.upload_dir.display());
            Arc::new(LocalImageStore::new(config.storage.upload_dir.clone()))
        }
    }
}

async fn serve(config: AppConfig, memory: bool) -> anyhow::Result<()> {
    let store: Arc<dyn Store> = if memory {
        tracing::warn!("Using the in-memory store, data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(connect(&config).await?)
    };

    let images = image_store(&config);
    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    tracing::info!("Starting Wanderlust in {:?} mode", config.environment);

    let state = AppState::new(config, store, images);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("Listening on http://{}", bind_addr);
    let service = crate::app::service(state);
    axum::serve(listener, axum::ServiceExt::<axum::extract::Request>::into_make_service(service)).await?;
    Ok(())
}
