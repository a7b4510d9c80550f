//! Glyphrun - text recognition through the OneOCR engine
//!
//! Decodes one image, runs it through the engine and prints every recognized
//! line as `NN: text`.

use anyhow::{Context, Result};
use clap::Parser;
use glyphrun_core::colored_logger::init_logger;
use glyphrun_core::config::Config;
use glyphrun_core::decode::load_image;
use glyphrun_core::output::{render, OutputFormat};
use glyphrun_engine::Recognizer;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "glyphrun")]
#[command(about = "Recognize text in an image with the OneOCR engine")]
#[command(version)]
struct Cli {
    /// Image file to recognize
    image: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Named profile from the configuration file
    #[arg(short, long)]
    profile: Option<String>,

    /// Directory containing the engine library and model
    #[arg(long)]
    engine_dir: Option<PathBuf>,

    /// Maximum number of lines the engine reports
    #[arg(long)]
    max_lines: Option<i64>,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger(cli.verbose)?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(ref profile) = cli.profile {
        config = config.apply_profile(profile)?;
    }
    if let Some(dir) = cli.engine_dir {
        config.engine.library_dir = Some(dir);
    }
    if let Some(max_lines) = cli.max_lines {
        config.engine.max_lines = max_lines;
    }
    config.validate()?;
    debug!("engine config: {:?}", config.engine);

    let image = load_image(&cli.image)?;

    let library_dir = config.engine.resolve_library_dir();
    let recognizer = Recognizer::bind(
        &library_dir,
        &config.engine.library_name,
        config.engine.chain_config(),
    )
    .context("failed to initialize OCR engine")?;

    let recognition = recognizer
        .recognize_image(&image)
        .with_context(|| format!("OCR failed for {}", cli.image.display()))?;

    info!(
        "read back {} of {} lines in {} ms",
        recognition.lines.len(),
        recognition.reported_lines,
        recognition.elapsed_ms
    );

    let format = if cli.json { OutputFormat::Json } else { OutputFormat::Plain };
    print!("{}", render(&recognition, format)?);

    Ok(())
}
