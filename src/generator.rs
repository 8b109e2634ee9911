//! Per-flight generation entry points

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

use crate::blend::{blend, blend_coefficients};
use crate::calm::{generate_calm, RefreshWindow};
use crate::compose::{expand_windows, SegmentComposer, SegmentWindow};
use crate::config::{GenerationMode, GeneratorConfig};
use crate::profile::FlightProfile;
use crate::schedule::{cover, schedule, TurbulenceInterval};
use crate::signal::{sample_count, OutputSeries};
use crate::TurbulenceError;

/// Generated series together with the layout it was built from.
#[derive(Clone, Debug)]
pub struct FlightTurbulence {
    pub series: OutputSeries,
    /// Turbulent and calm intervals in time order (turbulence mode)
    pub intervals: Vec<TurbulenceInterval>,
    /// Parameter refresh windows (calm mode)
    pub refresh_windows: Vec<RefreshWindow>,
}

impl FlightTurbulence {
    pub fn turbulent_intervals(&self) -> impl Iterator<Item = &TurbulenceInterval> {
        self.intervals.iter().filter(|i| i.is_turbulent)
    }
}

/// Generate one flight's wind disturbance from `profile`.
pub fn generate_flight<R: Rng + ?Sized>(
    rng: &mut R,
    profile: &FlightProfile,
    config: &GeneratorConfig,
) -> Result<FlightTurbulence, TurbulenceError> {
    config.validate()?;

    let flight = match config.mode {
        GenerationMode::Turbulence => generate_turbulence(rng, profile, config)?,
        GenerationMode::Calm => {
            let (series, refresh_windows) = generate_calm(rng, profile, config)?;
            FlightTurbulence {
                series,
                intervals: Vec::new(),
                refresh_windows,
            }
        }
    };

    info!(
        mode = config.mode.label(),
        duration_s = profile.duration_s(),
        samples = flight.series.len(),
        events = flight.turbulent_intervals().count(),
        turbulent_fraction = flight.series.turbulent_fraction(),
        "generated flight"
    );

    Ok(flight)
}

/// [`generate_flight`] with a `ChaCha8Rng` seeded from `seed`.
pub fn generate_flight_seeded(
    profile: &FlightProfile,
    config: &GeneratorConfig,
    seed: u64,
) -> Result<FlightTurbulence, TurbulenceError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    generate_flight(&mut rng, profile, config)
}

fn generate_turbulence<R: Rng + ?Sized>(
    rng: &mut R,
    profile: &FlightProfile,
    config: &GeneratorConfig,
) -> Result<FlightTurbulence, TurbulenceError> {
    let duration_s = profile.duration_s();
    let fs = config.sampling_frequency;

    let turbulent = schedule(
        rng,
        duration_s,
        config.mean_turbulence_length_s,
        config.turbulence_fraction,
        config.severity,
    )?;
    let intervals = cover(&turbulent, duration_s, config.background_severity);

    let (turbulent_windows, calm_windows): (Vec<SegmentWindow>, Vec<SegmentWindow>) =
        expand_windows(&intervals, duration_s, config.transition_duration_s)
            .into_iter()
            .partition(|w| w.interval.is_turbulent);

    let mut composer = SegmentComposer::new(profile, config);
    let turbulent_timeline = composer.compose(rng, &turbulent_windows, "turbulent", duration_s)?;
    let calm_timeline = composer.compose(rng, &calm_windows, "calm", duration_s)?;

    let coefficients = blend_coefficients(
        sample_count(duration_s as f64, fs),
        fs,
        &intervals,
        config.transition_duration_s,
        config.transition_shape,
    );
    let series = blend(turbulent_timeline, calm_timeline, &coefficients)?;

    Ok(FlightTurbulence {
        series,
        intervals,
        refresh_windows: Vec::new(),
    })
}

/// Machine-readable record of one generated flight.
#[derive(Clone, Debug, Serialize)]
pub struct GenerationSummary {
    pub flight_id: String,
    pub mode: GenerationMode,
    pub seed: u64,
    pub duration_s: u64,
    pub sampling_frequency: f64,
    pub samples: usize,
    pub turbulence_events: usize,
    /// Share of rows flagged turbulent
    pub turbulent_fraction: f64,
    pub refresh_windows: usize,
    pub intervals: Vec<TurbulenceInterval>,
}

impl GenerationSummary {
    pub fn summarize(
        flight_id: &str,
        seed: u64,
        profile: &FlightProfile,
        config: &GeneratorConfig,
        flight: &FlightTurbulence,
    ) -> Self {
        Self {
            flight_id: flight_id.to_string(),
            mode: config.mode,
            seed,
            duration_s: profile.duration_s(),
            sampling_frequency: config.sampling_frequency,
            samples: flight.series.len(),
            turbulence_events: flight.turbulent_intervals().count(),
            turbulent_fraction: flight.series.turbulent_fraction(),
            refresh_windows: flight.refresh_windows.len(),
            intervals: flight.intervals.clone(),
        }
    }
}
