//! Binary entry point: resolve settings, start file logging, then either run
//! a non-interactive subcommand or hand the catalog to the TUI.
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use chant_catalog::batch::{generate_images, BatchOptions, ChantOutcome};
use chant_catalog::config::{self, CliOverrides, FileConfig, Settings};
use chant_catalog::i18n::{detect_language, Translations};
use chant_catalog::logging::init_logging;
use chant_catalog::{
    extract_source, gabc_document, load_catalog, run_app, transform, App, Catalog,
    GregorioEngine, TransformOptions,
};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "chant-catalog", version, about = "Browse a Gregorian chant catalog in the terminal")]
struct Cli {
    /// Config file (defaults to ~/.chant-catalog/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Catalog JSON document.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Directory holding <lang>.json translation tables.
    #[arg(long)]
    locales: Option<PathBuf>,
    /// Interface language (en, pt).
    #[arg(long)]
    lang: Option<String>,
    /// Where .gabc and .svg downloads are written.
    #[arg(long)]
    download_dir: Option<PathBuf>,
    /// Open this chant's detail view on start-up.
    #[arg(long)]
    chant: Option<i64>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print or save one chant as a .gabc document.
    Export {
        id: i64,
        #[arg(long)]
        clean: bool,
        #[arg(long)]
        heavy_clean: bool,
        #[arg(long)]
        line_breaks: bool,
        /// Write to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Render every chant to <out>/<id>.svg with the Gregorio toolchain.
    Images {
        #[arg(long, short, default_value = "images")]
        out: PathBuf,
        /// Only process the first N chants.
        #[arg(long)]
        limit: Option<usize>,
        /// Keep the TeX working directories for debugging.
        #[arg(long)]
        keep_temp: bool,
        /// Chants rendered in parallel (defaults to the number of CPUs).
        #[arg(long)]
        jobs: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = config::data_dir()?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| config::default_config_path(&data_dir));
    let file = FileConfig::load_optional(&config_path)?;
    let overrides = CliOverrides {
        catalog_path: cli.catalog,
        locales_dir: cli.locales,
        language: cli.lang,
        download_dir: cli.download_dir,
    };
    let settings = Settings::resolve(data_dir, file, overrides);

    init_logging(&settings.log_path(), settings.log_level.as_deref())?;
    info!(catalog = %settings.catalog_path.display(), "starting chant catalog");

    match cli.command {
        Some(Command::Export {
            id,
            clean,
            heavy_clean,
            line_breaks,
            output,
        }) => {
            let defaults = settings.transform_options();
            let options = TransformOptions {
                clean: clean || defaults.clean,
                heavy_clean: heavy_clean || defaults.heavy_clean,
                line_breaks: line_breaks || defaults.line_breaks,
            };
            run_export(&settings, id, options, output)
        }
        Some(Command::Images {
            out,
            limit,
            keep_temp,
            jobs,
        }) => {
            let workers = jobs.unwrap_or_else(|| {
                thread::available_parallelism().map_or(4, |count| count.get())
            });
            let options = BatchOptions {
                out_dir: out,
                limit,
                width_px: settings.render_width_px,
                workers,
            };
            run_images(&settings, &options, keep_temp)
        }
        None => run_tui(settings, cli.chant),
    }
}

fn run_tui(settings: Settings, chant: Option<i64>) -> Result<()> {
    let env_lang = env::var("LANG").ok();
    let language = detect_language(settings.language.as_deref(), env_lang.as_deref());
    let translations = Translations::load(&settings.locales_dir, &language);

    let (catalog, load_error) = match load_catalog(&settings.catalog_path) {
        Ok(catalog) => (catalog, None),
        Err(err) => {
            let message = format!("{:#}", anyhow::Error::from(err));
            warn!(error = %message, "catalog unavailable");
            (Catalog::default(), Some(message))
        }
    };

    let mut app = App::new(
        catalog,
        settings,
        translations,
        Arc::new(GregorioEngine::default()),
    );
    if let Some(message) = load_error {
        app = app.with_load_error(message);
    }
    if let Some(chant_id) = chant {
        app.open_chant(chant_id);
    }
    run_app(&mut app)
}

fn run_export(
    settings: &Settings,
    chant_id: i64,
    options: TransformOptions,
    output: Option<PathBuf>,
) -> Result<()> {
    let catalog = load_catalog(&settings.catalog_path).context("failed to load catalog")?;
    let record = catalog.require(chant_id)?;
    let processed = transform(&extract_source(record.gabc.as_deref()), options);
    let document = gabc_document(record, &processed);

    match output {
        Some(path) => {
            fs::write(&path, &document)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(chant_id, path = %path.display(), "exported chant");
            println!("{}", path.display());
        }
        None => print!("{document}"),
    }
    Ok(())
}

fn run_images(settings: &Settings, options: &BatchOptions, keep_temp: bool) -> Result<()> {
    let catalog = load_catalog(&settings.catalog_path).context("failed to load catalog")?;
    let total = options
        .limit
        .map_or(catalog.len(), |limit| limit.min(catalog.len()));
    if total == 0 {
        println!("No chants to process.");
        return Ok(());
    }
    println!(
        "Rendering {total} chants into {} with {} workers.",
        options.out_dir.display(),
        options.workers
    );

    let engine = GregorioEngine::default().keep_workdirs(keep_temp);
    let report = generate_images(catalog.records(), &engine, options, |done, record, outcome| {
        if let ChantOutcome::Failed(reason) = outcome {
            let incipit: String = record.incipit.chars().take(40).collect();
            println!("\n[ERROR] Chant ID {} ('{incipit}...'): {reason}", record.id);
        }
        print!("\rProgress: {done}/{total}");
        let _ = io::stdout().flush();
    })?;

    println!();
    println!("Successfully generated: {}", report.generated);
    println!("Skipped: {}", report.skipped);
    println!("Errors: {}", report.errors());
    if keep_temp {
        println!(
            "Working directories kept under {}.",
            env::temp_dir().display()
        );
    }
    Ok(())
}
