//! Host-side inspection tool for S-57 chart cells.
//!
//! The core library consumes byte buffers; this binary does the file
//! I/O, loads the catalogue JSON, and prints what the core produces.

use clap::{Parser, Subcommand};
use enc_catalogue::Catalogue;
use enc_chart::{
    parse_with_options, Bounds, FeatureFilter, ParseOptions, UpdateFile, UpdateProcessor,
};
use enc_diagnostics::Severity;
use log::debug;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "enc")]
#[command(about = "Parse and inspect S-57 Electronic Navigational Chart cells", long_about = None)]
struct Cli {
    /// Chart cell to parse
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Object class catalogue (JSON array)
    #[arg(long, value_name = "JSON")]
    objects: Option<PathBuf>,

    /// Attribute catalogue (JSON array)
    #[arg(long, value_name = "JSON")]
    attributes: Option<PathBuf>,

    /// Abort on the first warning instead of collecting
    #[arg(long)]
    strict: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display cell metadata and a warning summary
    Info,

    /// List parsed features
    Features {
        /// Limit number of features to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Query features by type, bounds, and name
    Query {
        /// Comma-separated object class acronyms (e.g. "LIGHTS,DEPARE")
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,

        /// Bounds as north,south,east,west in decimal degrees
        #[arg(long, value_name = "N,S,E,W", value_delimiter = ',', num_args = 4)]
        bounds: Option<Vec<f64>>,

        /// Case-insensitive substring of OBJNAM
        #[arg(long)]
        text: Option<String>,

        /// Limit number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Apply sequential update files to the cell
    Update {
        /// Update files (<CELL>.001, <CELL>.002, ...)
        #[arg(value_name = "FILES", required = true)]
        updates: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let catalogue = load_catalogue(cli)?;
    let data = std::fs::read(&cli.file)
        .map_err(|e| format!("reading {}: {e}", cli.file.display()))?;
    debug!("read {} bytes from {}", data.len(), cli.file.display());

    let options = ParseOptions {
        strict: cli.strict,
        warning_threshold: None,
    };
    let parsed = parse_with_options(&data, &catalogue, &options)
        .map_err(|e| format!("parsing {}: {e}", cli.file.display()))?;

    match &cli.command {
        Commands::Info => {
            let m = &parsed.metadata;
            println!("Cell:          {}", m.cell_id);
            println!("Producer:      {}", m.producer);
            println!("Version:       {}", m.version);
            println!("Created:       {}", m.creation_date);
            println!("Edition:       {}", m.edition_number);
            println!("Update:        {}", m.update_number);
            println!("Usage band:    {}", m.usage_band);
            println!("COMF / SOMF:   {} / {}", m.comf, m.somf);
            println!("Features:      {}", parsed.feature_count());
            println!(
                "Primitives:    {} nodes, {} edges",
                parsed.primitives.node_count(),
                parsed.primitives.edge_count()
            );
            print_warning_summary(&parsed.warnings);
        }
        Commands::Features { limit } => {
            let filter = match limit {
                Some(limit) => FeatureFilter::new().with_limit(*limit),
                None => FeatureFilter::new(),
            };
            for feature in parsed.find_features(&filter) {
                print_feature(feature);
            }
        }
        Commands::Query {
            types,
            bounds,
            text,
            limit,
        } => {
            let mut filter = FeatureFilter::new().with_types(types.clone());
            if let Some(values) = bounds {
                filter = filter.with_bounds(Bounds::new(
                    values[0], values[1], values[2], values[3],
                ));
            }
            if let Some(text) = text {
                filter = filter.with_text_query(text.clone());
            }
            if let Some(limit) = limit {
                filter = filter.with_limit(*limit);
            }
            let hits = parsed.find_features(&filter);
            for feature in &hits {
                print_feature(feature);
            }
            println!("{} features matched", hits.len());
        }
        Commands::Update { updates } => {
            let cell_name = cli
                .file
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let files = updates
                .iter()
                .map(|path| {
                    let bytes = std::fs::read(path)
                        .map_err(|e| format!("reading {}: {e}", path.display()))?;
                    let name = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or_default()
                        .to_string();
                    Ok(UpdateFile::new(name, bytes))
                })
                .collect::<Result<Vec<_>, String>>()?;

            let processor = UpdateProcessor::new(&catalogue);
            let outcome = processor
                .apply_sequential_updates(&parsed, &cell_name, &files)
                .map_err(|e| e.to_string())?;

            println!(
                "Applied {} updates: {} inserted, {} modified, {} deleted",
                outcome.summary.applied,
                outcome.summary.inserted,
                outcome.summary.modified,
                outcome.summary.deleted
            );
            println!(
                "Cell now at update {} with {} features",
                outcome.data.metadata.update_number,
                outcome.data.feature_count()
            );
            print_warning_summary(&outcome.data.warnings);
        }
    }

    Ok(())
}

fn load_catalogue(cli: &Cli) -> Result<Catalogue, String> {
    let objects = match &cli.objects {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("reading {}: {e}", path.display()))?,
        None => "[]".to_string(),
    };
    let attributes = match &cli.attributes {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("reading {}: {e}", path.display()))?,
        None => "[]".to_string(),
    };
    Catalogue::from_json(&objects, &attributes).map_err(|e| format!("loading catalogue: {e}"))
}

fn print_feature(feature: &enc_chart::Feature) {
    let name = feature.object_name().unwrap_or("-");
    println!(
        "#{:<6} {:<8} {:?} ({} coords)  {}",
        feature.record_id,
        feature.feature_type.acronym,
        feature.geometry.geometry_type,
        feature.coordinates.len(),
        name
    );
}

fn print_warning_summary(warnings: &[enc_diagnostics::ParseWarning]) {
    if warnings.is_empty() {
        println!("Warnings:      none");
        return;
    }
    let errors = warnings
        .iter()
        .filter(|w| w.severity == Severity::Error)
        .count();
    println!("Warnings:      {} ({} errors)", warnings.len(), errors);
    for warning in warnings {
        println!("  [{}] {} - {}", warning.severity, warning.code, warning.message);
    }
}
