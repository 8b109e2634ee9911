use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use rand::Rng;
use tracing::{error, info, warn};

use turbwind::config::{GenerationMode, GeneratorConfig};
use turbwind::generator::{generate_flight_seeded, GenerationSummary};
use turbwind::io;
use turbwind::spectral::Severity;
use turbwind::transfer::SpectrumForm;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Turbulence,
    Calm,
}

impl From<Mode> for GenerationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Turbulence => GenerationMode::Turbulence,
            Mode::Calm => GenerationMode::Calm,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Form {
    VonKarman,
    RationalFilter,
}

impl From<Form> for SpectrumForm {
    fn from(form: Form) -> Self {
        match form {
            Form::VonKarman => SpectrumForm::VonKarman,
            Form::RationalFilter => SpectrumForm::RationalFilter,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about = "MIL-HDBK-1797A turbulence synthesis for recorded flights")]
struct Cli {
    /// Flight profile CSV files or directories of them
    #[arg(required = true)]
    profiles: Vec<PathBuf>,

    /// Output directory
    #[arg(long, default_value = "output-turbwind")]
    output_dir: PathBuf,

    /// TOML generator configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Aircraft wingspan [m]
    #[arg(long)]
    wingspan: Option<f64>,

    #[arg(long, value_enum)]
    mode: Option<Mode>,

    #[arg(long, value_enum)]
    spectrum_form: Option<Form>,

    /// Turbulence severity level (0-3)
    #[arg(long)]
    severity: Option<u8>,

    /// Severity level of calm intervals (0-3)
    #[arg(long)]
    background_severity: Option<u8>,

    /// Output sampling frequency [Hz]
    #[arg(long)]
    sampling_frequency: Option<f64>,

    /// Target share of flight time in turbulence
    #[arg(long)]
    turbulence_fraction: Option<f64>,

    /// Mean turbulent event length [s]
    #[arg(long)]
    mean_turbulence_length: Option<f64>,

    /// Crossfade duration [s]
    #[arg(long)]
    transition_duration: Option<f64>,

    /// Base random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Regenerate flights whose outputs already exist
    #[arg(long)]
    overwrite: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn build_config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut cfg = match &cli.config {
        Some(path) => GeneratorConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => match cli.wingspan {
            Some(wingspan) => GeneratorConfig::new(wingspan),
            None => bail!("either --config or --wingspan is required"),
        },
    };

    if let Some(v) = cli.wingspan {
        cfg.wingspan_m = v;
    }
    if let Some(v) = cli.mode {
        cfg.mode = v.into();
    }
    if let Some(v) = cli.spectrum_form {
        cfg.spectrum_form = v.into();
    }
    if let Some(v) = cli.severity {
        cfg.severity = Severity::try_from(v)?;
    }
    if let Some(v) = cli.background_severity {
        cfg.background_severity = Severity::try_from(v)?;
    }
    if let Some(v) = cli.sampling_frequency {
        cfg.sampling_frequency = v;
    }
    if let Some(v) = cli.turbulence_fraction {
        cfg.turbulence_fraction = v;
    }
    if let Some(v) = cli.mean_turbulence_length {
        cfg.mean_turbulence_length_s = v;
    }
    if let Some(v) = cli.transition_duration {
        cfg.transition_duration_s = v;
    }
    if let Some(v) = cli.seed {
        cfg.seed = Some(v);
    }

    cfg.validate()?;
    Ok(cfg)
}

/// Independent per-flight seed from the base seed and flight position.
fn flight_seed(base: u64, index: usize) -> u64 {
    let mut z = base ^ (index as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn run_flight(
    path: &Path,
    seed: u64,
    cfg: &GeneratorConfig,
    output_dir: &Path,
) -> Result<GenerationSummary> {
    let id = io::flight_id(path);
    let profile = io::read_profile_csv(path, &cfg.columns)
        .with_context(|| format!("failed to read profile: {}", path.display()))?;
    let flight = generate_flight_seeded(&profile, cfg, seed)
        .with_context(|| format!("failed to generate flight {id}"))?;

    let series_path = io::output_path(output_dir, &id, cfg.mode);
    io::write_series_csv(&series_path, &flight.series)
        .with_context(|| format!("failed to write {}", series_path.display()))?;

    let summary = GenerationSummary::summarize(&id, seed, &profile, cfg, &flight);
    let summary_path = io::summary_path(output_dir, &id);
    io::write_summary_json(&summary_path, &summary)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;

    Ok(summary)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let cfg = build_config(&cli)?;
    let profiles = io::list_profiles(&cli.profiles)?;
    if profiles.is_empty() {
        bail!("no flight profiles found");
    }
    io::ensure_output_dir(&cli.output_dir)
        .with_context(|| format!("failed to create {}", cli.output_dir.display()))?;

    let mut generated = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for (index, path) in profiles.iter().enumerate() {
        let id = io::flight_id(path);
        let series_path = io::output_path(&cli.output_dir, &id, cfg.mode);
        if series_path.exists() && !cli.overwrite {
            warn!(flight = %id, "output exists, skipping");
            skipped += 1;
            continue;
        }

        let seed = match cfg.seed {
            Some(base) => flight_seed(base, index),
            None => rand::thread_rng().gen(),
        };

        match run_flight(path, seed, &cfg, &cli.output_dir) {
            Ok(summary) => {
                info!(flight = %id, seed, events = summary.turbulence_events, "flight written");
                generated += 1;
            }
            Err(err) => {
                error!(flight = %id, "{err:#}");
                failed += 1;
            }
        }
    }

    println!(
        "Flights: {} generated | {} skipped | {} failed",
        generated, skipped, failed
    );
    println!("Output directory: {}", cli.output_dir.display());

    if failed > 0 {
        bail!("{failed} flight(s) failed");
    }
    Ok(())
}
