use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use taxonomy::config::TransferConfig;
use taxonomy::formats::TransferFormat;
use taxonomy::services::{ExportService, ImportService};
use taxonomy::store::{JsonFileStore, TaxonomyStore};
use taxonomy::taxonomy::TaxonomyKind;
use taxonomy::term::TermId;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    /// YAML config file
    #[clap(short, long, global = true, default_value = "taxonomy.yaml")]
    config: PathBuf,
    /// Term store file, overrides the config
    #[clap(short, long, global = true)]
    store: Option<PathBuf>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config and an empty store
    Init,
    /// Print the terms of a taxonomy
    List {
        #[clap(short, long, default_value = "category")]
        taxonomy: TaxonomyKind,
    },
    /// Export terms to a CSV or JSON file
    Export {
        #[clap(short, long, default_value = "category")]
        taxonomy: TaxonomyKind,
        #[clap(short, long)]
        format: Option<String>,
        /// Comma-separated term ids; all terms when omitted
        #[clap(short, long, value_delimiter = ',')]
        ids: Vec<TermId>,
        #[clap(short, long)]
        out: Option<PathBuf>,
    },
    /// Import terms from a CSV or JSON file
    Import {
        #[clap(short, long, default_value = "category")]
        taxonomy: TaxonomyKind,
        file: PathBuf,
        #[clap(short, long)]
        format: Option<TransferFormat>,
        /// Print the itemized report as JSON
        #[clap(short, long)]
        report: bool,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    let config = TransferConfig::load(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;
    let store_path = args.store.clone().unwrap_or_else(|| config.store_path.clone());

    match args.command {
        Commands::Init => {
            info!("Initializing store: {}", store_path.display());
            if !args.config.exists() {
                config.write_to(&args.config)?;
            }
            JsonFileStore::open(&store_path)?.save()?;
        }
        Commands::List { taxonomy } => {
            let store = JsonFileStore::open(&store_path)?;
            for term in store.terms(taxonomy) {
                println!(
                    "{:>6}  {:<30} {:<30} parent={} count={}",
                    term.id, term.name, term.slug, term.parent, term.count
                );
            }
        }
        Commands::Export {
            taxonomy,
            format,
            ids,
            out,
        } => {
            let store = JsonFileStore::open(&store_path)?;
            let format = format.unwrap_or_else(|| config.default_format.to_string());
            let service = ExportService::new(&store, taxonomy);
            let result = if ids.is_empty() {
                service.export_all(&format)
            } else {
                service.export(&ids, &format)
            };

            match (result.file, result.error) {
                (Some(file), _) => {
                    let dir = out.unwrap_or_else(|| config.output_dir.clone());
                    let path = file.save_to(&dir)?;
                    println!(
                        "{} {} rows to {}",
                        "Exported".green().bold(),
                        result.rows_exported,
                        path.display()
                    );
                    if !result.skipped_ids.is_empty() {
                        println!(
                            "{} unknown ids: {:?}",
                            "Skipped".yellow(),
                            result.skipped_ids
                        );
                    }
                }
                (None, Some(error)) => {
                    return Err(anyhow!("{} ({}, status {})", error.message, error.code, error.status));
                }
                (None, None) => return Err(anyhow!("export produced no file")),
            }
        }
        Commands::Import {
            taxonomy,
            file,
            format,
            report,
        } => {
            let mut store = JsonFileStore::open(&store_path)?;
            let result = ImportService::new(&mut store, taxonomy)
                .import_file(&file, format)
                .with_context(|| format!("importing {}", file.display()))?;
            store.save()?;

            let status = if result.is_clean() {
                "Import complete".green().bold()
            } else {
                "Import complete with issues".yellow().bold()
            };
            println!("{}: {}", status, result.summary());
            for issue in result.skipped.iter().chain(&result.dropped_parents) {
                println!("  row {} ({}): {}", issue.row, issue.name, issue.reason);
            }
            if report {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        }
    }

    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level.to_string()))
        .without_time()
        .init();
}
