use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use rayon::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use bandcamp_extract::config::Config;
use bandcamp_extract::error::ExtractError;
use bandcamp_extract::genre::{GenreMode, GenreResolver};
use bandcamp_extract::models::ReleaseInfo;
use bandcamp_extract::progress::{create_progress_bar, format_duration, log_progress, set_log_only};
use bandcamp_extract::release::Release;
use bandcamp_extract::safety::validate_output_path;

#[derive(Parser)]
#[command(name = "bandcamp-extract")]
#[command(about = "Extract tag metadata from Bandcamp release page JSON")]
struct Args {
    /// Release page metadata files, one release per file
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// classical, progressive or psychedelic (overrides the config file)
    #[arg(long)]
    genre_mode: Option<GenreMode>,

    /// Maximum number of keyword genres, 0 = unlimited
    #[arg(long)]
    max_genres: Option<usize>,

    #[arg(long)]
    capitalize: bool,

    #[arg(long, default_value = "0")]
    workers: usize,

    /// Hide progress bars and print plain progress lines
    #[arg(long)]
    log_only: bool,

    /// Write results here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

const LOG_INTERVAL: u64 = 100;

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(mode) = args.genre_mode {
        config.genre.mode = mode;
    }
    if let Some(maximum) = args.max_genres {
        config.genre.maximum = maximum;
    }
    if args.capitalize {
        config.genre.capitalize = true;
    }
    Ok(config)
}

fn read_inputs(paths: &[PathBuf]) -> Result<Vec<(&Path, String)>> {
    paths
        .iter()
        .map(|path| {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok((path.as_path(), text))
        })
        .collect()
}

fn parse_release(
    text: &str,
    genres: &GenreResolver,
    extras: &[String],
) -> std::result::Result<ReleaseInfo, ExtractError> {
    let value: Value = serde_json::from_str(text)?;
    Ok(Release::with_resolver(value, genres, extras)?.info())
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    set_log_only(args.log_only);

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    if let Some(output) = &args.output {
        validate_output_path(output, args.inputs.as_slice())?;
    }

    let config = load_config(&args)?;
    let genres = GenreResolver::new(&config.genre).context("Invalid genre configuration")?;

    let start = Instant::now();
    let inputs = read_inputs(&args.inputs)?;
    let total = inputs.len() as u64;

    let pb = create_progress_bar(total, "Parsing releases");
    let done = AtomicU64::new(0);
    let releases: Vec<ReleaseInfo> = inputs
        .par_iter()
        .filter_map(|(path, text)| {
            let result = parse_release(text, &genres, &config.album.extras);
            pb.inc(1);
            log_progress("parse", done.fetch_add(1, Ordering::Relaxed) + 1, total, LOG_INTERVAL);
            match result {
                Ok(info) => Some(info),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    None
                }
            }
        })
        .collect();
    pb.finish_with_message(format!("Parsed {} releases", releases.len()));

    let json = serde_json::to_string_pretty(&releases).context("Failed to serialize results")?;
    match &args.output {
        Some(output) => {
            std::fs::write(output, json)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Wrote {}", output.display());
        }
        None => println!("{}", json),
    }

    info!(
        "Extraction complete: {} of {} releases in {}",
        releases.len(),
        total,
        format_duration(start.elapsed())
    );
    Ok(())
}
