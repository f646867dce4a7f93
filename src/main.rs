use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use gaffer::db::Database;
use gaffer::logging::configure_logging;
use gaffer::vector::storage::IndexTuning;

#[derive(Parser)]
#[command(name = "gaffer", about = "Player similarity and scouting news engine", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a player stats CSV into the database
    Ingest {
        #[arg(long)]
        players_csv: PathBuf,
        /// Drop existing players (and their news links) before importing
        #[arg(long)]
        replace: bool,
    },
    /// Refit normalization over the full population and rebuild the index
    RebuildVectors {
        /// HNSW graph connectivity
        #[arg(long, default_value_t = 16)]
        m: u64,
        /// HNSW build-time beam width
        #[arg(long, default_value_t = 100)]
        ef_construct: u64,
        /// Below this point count the index falls back to exact scan
        #[arg(long, default_value_t = 10_000)]
        full_scan_threshold: u64,
    },
    /// Project players added since the last rebuild into the existing index
    ProjectNew,
    /// Pull configured RSS feeds and store new articles with embeddings
    FetchNews,
    /// Link stored articles to the players they mention
    LinkNews,
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        addr: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    configure_logging();
    let cli = Cli::parse();
    let db = Database::instance().await;

    match cli.command {
        Command::Ingest {
            players_csv,
            replace,
        } => {
            let count = gaffer::ingest::import_players(db, &players_csv, replace).await?;
            info!("Imported {} players", count);
        }
        Command::RebuildVectors {
            m,
            ef_construct,
            full_scan_threshold,
        } => {
            let tuning = IndexTuning {
                m,
                ef_construct,
                full_scan_threshold,
            };
            let written = gaffer::pipeline::rebuild_vectors(db, &tuning).await?;
            info!("Rebuilt index with {} vectors", written);
        }
        Command::ProjectNew => {
            let written = gaffer::pipeline::project_new_players(db).await?;
            info!("Projected {} new players", written);
        }
        Command::FetchNews => {
            let stored = gaffer::rss::fetch_feeds(db).await?;
            info!("Stored {} new articles", stored);
        }
        Command::LinkNews => {
            let linked = gaffer::linker::link_unlinked(db).await?;
            info!("Created {} player-news links", linked);
        }
        Command::Serve { addr } => {
            let addr = addr
                .or_else(|| std::env::var("API_LISTEN_ADDR").ok())
                .unwrap_or_else(|| "0.0.0.0:8787".to_string());
            gaffer::api::serve(db.clone(), &addr).await?;
        }
    }

    Ok(())
}
