//! Instrument response tool: forward and inverse transfer functions,
//! pass-band estimation and response removal for seismic recordings.

mod config;
mod orchestrator;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "transfer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the forward transfer function of a request
    Forward {
        /// Path to the request file (TOML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Output file (stdout when absent)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute the inverse (deconvolution) transfer function of a request
    Inverse {
        /// Path to the request file (TOML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Output file (stdout when absent)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Estimate taper limits from the forward amplitude spectrum
    Bands {
        /// Path to the request file (TOML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Split the pass band into this many log-spaced bands
        #[arg(short, long, default_value = "0")]
        subdivide: usize,
    },

    /// Remove the instrument response from a recorded waveform
    Remove {
        /// Path to the request file (TOML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Waveform file, one sample per line (last column of CSV)
        waveform: PathBuf,

        /// Output file (stdout when absent)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse and validate an NDC response file
    ParseNdc {
        /// Path to the stage file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Forward { config, output } => {
            run_forward(&config, output.as_deref(), cli.format)?;
        }
        Commands::Inverse { config, output } => {
            run_inverse(&config, output.as_deref(), cli.format)?;
        }
        Commands::Bands { config, subdivide } => {
            run_bands(&config, subdivide, cli.format)?;
        }
        Commands::Remove { config, waveform, output } => {
            run_remove(&config, &waveform, output.as_deref(), cli.format)?;
        }
        Commands::ParseNdc { file } => {
            parse_ndc(&file)?;
        }
    }

    Ok(())
}

fn load(config_path: &Path) -> Result<orchestrator::Orchestrator> {
    tracing::info!("Loading request from {:?}", config_path);
    let config = config::load_config(config_path)?;
    if !config.name.is_empty() {
        tracing::info!("Request: {}", config.name);
    }
    orchestrator::Orchestrator::new(config)
}

fn run_forward(config_path: &Path, output: Option<&Path>, format: OutputFormat) -> Result<()> {
    let orchestrator = load(config_path)?;
    let data = orchestrator.forward()?;
    output::write_spectrum(output::open_output(output)?, data.current(), data.units(), format)?;
    tracing::info!("{}", orchestrator.diagnostics());
    Ok(())
}

fn run_inverse(config_path: &Path, output: Option<&Path>, format: OutputFormat) -> Result<()> {
    let orchestrator = load(config_path)?;
    let inverse = orchestrator.inverse()?;
    output::write_spectrum(output::open_output(output)?, inverse.spectrum(), inverse.units(), format)?;
    tracing::info!("{}", orchestrator.diagnostics());
    Ok(())
}

fn run_bands(config_path: &Path, subdivide: usize, format: OutputFormat) -> Result<()> {
    let orchestrator = load(config_path)?;
    let limits = orchestrator.estimate_band()?;
    let bands = if subdivide > 0 {
        limits.log_subdivide(subdivide)?
    } else {
        Vec::new()
    };
    output::write_limits(output::open_output(None)?, &limits, &bands, format)?;
    Ok(())
}

fn run_remove(config_path: &Path, waveform_path: &Path, output: Option<&Path>, format: OutputFormat) -> Result<()> {
    let orchestrator = load(config_path)?;
    let recording = &orchestrator.config().recording;
    let recorded = output::read_waveform(waveform_path, recording.sample_rate, recording.epoch())?;
    tracing::info!("Read {} samples from {:?}", recorded.len(), waveform_path);

    let ground = orchestrator.remove(&recorded)?;
    output::write_waveform(output::open_output(output)?, &ground, format)?;
    tracing::info!("Response removed, output in {}", ground.units);
    tracing::info!("{}", orchestrator.diagnostics());
    Ok(())
}

fn parse_ndc(file: &Path) -> Result<()> {
    tracing::info!("Parsing NDC file: {:?}", file);

    let stages = lib_ndc::parse_stage_file(file)?;

    println!("NDC File: {}", file.display());
    println!("Stages: {}", stages.len());

    for (i, record) in stages.iter().enumerate() {
        println!("\n  Stage {} (line {}): {}", i + 1, record.line, record.stage.kind());
        match &record.stage {
            lib_ndc::Stage::Paz { norm, poles, zeros } => {
                println!("    Normalization: {:e}", norm);
                println!("    Poles: {}", poles.len());
                println!("    Zeros: {}", zeros.len());
            }
            lib_ndc::Stage::Fap { frequencies, .. } => {
                println!("    Rows: {}", frequencies.len());
                if let (Some(lo), Some(hi)) = (frequencies.first(), frequencies.last()) {
                    println!("    Frequency range: {} - {} Hz", lo, hi);
                }
            }
            lib_ndc::Stage::Fir { input_rate, numerator, denominator } => {
                println!("    Input rate: {} Hz", input_rate);
                println!("    Numerator: {}", numerator.len());
                println!("    Denominator: {}", denominator.len());
            }
        }
    }

    Ok(())
}
