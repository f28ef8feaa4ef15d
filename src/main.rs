mod database;
mod error;
mod ingest;
mod report;
mod utils;

use std::path::PathBuf;
use anyhow::{Result, Context};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::database::adhoc::{self, AdHocOutcome};
use crate::database::catalog::{self, CATALOG};
use crate::database::repo::ArtifactStore;
use crate::ingest::fetcher::{self, ArtifactClient, RawRecord, MAX_PAGE_SIZE};
use crate::ingest::stage_file;
use crate::ingest::transform::{self, TransformedBatch};
use crate::report::preview;
use crate::utils::config::{write_env_template, AppConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Collect museum artifacts into SQLite and report on them", long_about = None)]
struct Args {
    /// Read settings from this file instead of ./.env
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Overrides ARTIFACTS_DB_PATH
    #[arg(short, long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct FetchArgs {
    #[arg(short, long, default_value = "Paintings")]
    classification: String,

    /// Number of pages to fetch, starting at page 1
    #[arg(short, long, default_value_t = 25, value_parser = clap::value_parser!(u32).range(1..=40))]
    pages: u32,

    #[arg(long, default_value_t = MAX_PAGE_SIZE, value_parser = clap::value_parser!(u32).range(1..=100))]
    size: u32,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch raw records from the API and save them
    Collect {
        #[command(flatten)]
        fetch: FetchArgs,
        #[arg(short, long, default_value = "collected.json")]
        out: PathBuf,
    },
    /// Transform collected records and show a sample of each table
    Preview {
        #[arg(short, long, default_value = "collected.json")]
        input: PathBuf,
        #[arg(short, long, default_value = "transformed.json")]
        out: PathBuf,
        #[arg(long, default_value_t = 5)]
        sample: usize,
    },
    /// Load a transformed batch into the database
    Insert {
        #[arg(short, long, default_value = "transformed.json")]
        input: PathBuf,
    },
    /// Collect, transform and insert in one go
    Etl {
        #[command(flatten)]
        fetch: FetchArgs,
    },
    /// List the predefined queries
    Queries,
    /// Run a predefined query by key, title or number
    Query {
        selector: String,
        /// Used by the colors-for-artifact query
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(i64).range(1..))]
        artifact_id: i64,
    },
    /// Run arbitrary SQL against the database
    Sql {
        #[arg(default_value = "")]
        text: String,
    },
    /// Write a settings template
    Init {
        #[arg(long, default_value = ".env")]
        path: PathBuf,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("artifact_etl=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = AppConfig::load(args.env_file.as_deref())?;
    if let Some(db_path) = args.db_path {
        config.db_path = db_path;
    }
    let store = ArtifactStore::from_config(&config);

    match args.command {
        Command::Collect { fetch, out } => {
            let records = collect(&config, &fetch)?;
            stage_file::save(&out, &records)?;
            println!("Collected {} records", records.len());
        }
        Command::Preview { input, out, sample } => {
            let records: Vec<RawRecord> = stage_file::load(&input)?.unwrap_or_default();
            if records.is_empty() {
                warn!("No collected records in {:?}", input);
                println!("Collect data first!");
                return Ok(());
            }
            let batch = transform::transform(&records);
            stage_file::save(&out, &batch)?;
            println!("{}", preview::render_batch(&batch, sample));
        }
        Command::Insert { input } => {
            let batch: Option<TransformedBatch> = stage_file::load(&input)?;
            match batch {
                Some(batch) if !batch.is_empty() => {
                    let report = store.load(&batch).context("Insert failed")?;
                    println!("Inserted into {} -> {}", store.path().display(), report);
                }
                _ => println!("Nothing to insert!"),
            }
        }
        Command::Etl { fetch } => {
            let records = collect(&config, &fetch)?;
            println!("Collected {} records", records.len());
            let batch = transform::transform(&records);
            let (meta, media, colors) = batch.counts();
            println!("Prepared for insert -> metadata: {}, media: {}, colors: {}", meta, media, colors);
            let report = store.load(&batch).context("Insert failed")?;
            println!("Inserted into {} -> {}", store.path().display(), report);
        }
        Command::Queries => {
            for (i, q) in CATALOG.iter().enumerate() {
                println!("{:>2}  {:<28} {}", i + 1, q.key, q.title);
            }
        }
        Command::Query { selector, artifact_id } => {
            let query = catalog::find(&selector)?;
            let table = query
                .run(&store, Some(artifact_id))
                .with_context(|| format!("Query '{}' failed", query.title))?;
            println!("{}", query.title);
            println!("{}", table.render());
        }
        Command::Sql { text } => match adhoc::execute(&store, &text) {
            Ok(AdHocOutcome::Rows(table)) => println!("{}", table.render()),
            Ok(AdHocOutcome::NoRows { columns }) => {
                debug!("Empty result, columns: {:?}", columns);
                println!("Query executed successfully, but no rows found.")
            }
            Err(e) => println!("{}", e),
        },
        Command::Init { path } => {
            write_env_template(&path)?;
            println!("Wrote settings template to {}", path.display());
        }
    }

    Ok(())
}

fn collect(config: &AppConfig, fetch: &FetchArgs) -> Result<Vec<RawRecord>> {
    info!("Collecting {} pages of {} (size {})", fetch.pages, fetch.classification, fetch.size);
    let client = ArtifactClient::new(config)?;
    let records = fetcher::collect_pages(&client, &fetch.classification, fetch.size, fetch.pages)
        .context("Fetch failed, try again")?;
    Ok(records)
}
