use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use cli::render;
use mood_core::config;
use mood_core::config::AppConfig;
use mood_core::pipeline::{self, MusicService, RefreshMode};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use storage::memory::MemoryStore;
use storage::ObjectStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;
    let service = start_service(&cfg, cli.offline).await?;

    match cli.command {
        Commands::Recommend { scene, seed, json } => run_recommend(&service, &scene, seed, json).await,
        Commands::Moods { json } => {
            let moods = service.moods();
            if json {
                println!("{}", serde_json::to_string_pretty(&render::moods_json(moods))?);
            } else {
                println!("{}", render::moods_text(moods));
            }
            Ok(())
        }
        Commands::Health { json } => {
            let report = service.health();
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", render::health_text(&report));
            }
            Ok(())
        }
        Commands::Catalog { live, json } => {
            if live {
                service.refresh_catalog(RefreshMode::LiveOnly).await?;
            }
            let catalog = service.catalog();
            if json {
                println!("{}", serde_json::to_string_pretty(&render::catalog_json(&catalog))?);
            } else {
                println!("{}", render::catalog_text(&catalog));
            }
            Ok(())
        }
    }
}

#[derive(Parser)]
#[command(name = "mood-music")]
#[command(about = "Scene-driven background music recommender", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    /// Serve from the catalog snapshot only, with local placeholder URLs
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a scene and pick a track for it
    Recommend {
        /// Scene description
        scene: String,
        /// Seed the track draw for reproducible picks
        #[arg(long)]
        seed: Option<u64>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// List supported moods with their keywords and folders
    Moods {
        #[arg(long)]
        json: bool,
    },
    /// Report service status and catalog size
    Health {
        #[arg(long)]
        json: bool,
    },
    /// Show the folder inventory
    Catalog {
        /// Re-list every folder from storage before printing
        #[arg(long)]
        live: bool,
        #[arg(long)]
        json: bool,
    },
}

async fn start_service(cfg: &AppConfig, offline: bool) -> Result<MusicService> {
    let store: Arc<dyn ObjectStore> = if offline {
        if cfg.storage.snapshot_path.is_none() {
            bail!("--offline needs storage.snapshot_path");
        }
        let bucket = if cfg.storage.bucket.is_empty() {
            "offline"
        } else {
            cfg.storage.bucket.as_str()
        };
        info!(bucket, "offline mode: serving from the catalog snapshot");
        Arc::new(MemoryStore::new(bucket))
    } else {
        pipeline::build_store(cfg)?
    };
    pipeline::build_service(cfg, store).await
}

async fn run_recommend(service: &MusicService, scene: &str, seed: Option<u64>, json: bool) -> Result<()> {
    let rec = match seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            service.recommend_with_rng(scene, &mut rng).await?
        }
        None => service.recommend(scene).await?,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&render::recommendation_json(&rec)?)?);
    } else {
        println!("{}", render::recommendation_text(&rec));
    }
    Ok(())
}
