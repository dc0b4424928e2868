//! CLI entry point for the campus rater service.
//!
//! `serve` runs the HTTP API over a store seeded from a JSON catalog.
//! `export-ratings` rates every course in a catalog and writes a CSV.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use campus_rater::{
    config::Config,
    output::{collect_course_ratings, write_records},
    store::{Catalog, MemoryStore, Store},
    web::{self, AppState},
};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "campus_rater")]
#[command(about = "University and course reviews with aggregate ratings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// JSON catalog to seed the store from (overrides CAMPUS_CATALOG)
        #[arg(short, long, value_name = "FILE")]
        catalog: Option<String>,

        /// Port to listen on (overrides RUST_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Rate every course in a catalog and write the results as CSV
    ExportRatings {
        /// JSON catalog to read
        #[arg(short, long, value_name = "FILE")]
        catalog: String,

        /// CSV file to write
        #[arg(short, long, default_value = "ratings.csv")]
        output: String,

        /// Gzip compress the CSV file
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/campus_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("campus_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { catalog, port } => {
            let mut config = Config::load()?;
            if let Some(path) = catalog {
                config.catalog_path = Some(path);
            }
            if let Some(port) = port {
                config.port = port;
            }

            let store = open_store(config.catalog_path.as_deref())?;
            web::serve(AppState::new(config, store)).await?;
        }
        Commands::ExportRatings {
            catalog,
            output,
            gzip,
        } => {
            let store = MemoryStore::from_catalog(Catalog::load(&catalog)?)?;
            let records = collect_course_ratings(&store).await?;
            write_records(&output, &records, gzip)
                .with_context(|| format!("Failed to write ratings to '{output}'"))?;
        }
    }

    Ok(())
}

/// Seeds a [`MemoryStore`] from `catalog_path`, or starts empty without one.
#[tracing::instrument]
fn open_store(catalog_path: Option<&str>) -> Result<Arc<dyn Store>> {
    let store = match catalog_path {
        Some(path) => {
            info!(path, "Loading catalog");
            MemoryStore::from_catalog(Catalog::load(path)?)?
        }
        None => {
            warn!("No catalog configured, starting with an empty store");
            MemoryStore::new()
        }
    };
    Ok(Arc::new(store))
}
