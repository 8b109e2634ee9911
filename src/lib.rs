//! turbwind - synthetic atmospheric turbulence for flight-data augmentation
//!
//! Given a recorded airspeed/altitude profile, the crate synthesizes a
//! six-channel wind disturbance (u, v, w translational and p, q, r rotary)
//! whose spectra follow MIL-HDBK-1797A at a chosen severity. Turbulent and
//! calm segments are realized independently with an FFT colored-noise
//! generator and crossfaded into one continuous series per flight.

pub mod blend;
pub mod calm;
pub mod compose;
pub mod config;
pub mod generator;
pub mod io;
pub mod noise;
pub mod profile;
pub mod schedule;
pub mod signal;
pub mod spectral;
pub mod transfer;

use thiserror::Error;

pub use blend::TransitionShape;
pub use config::{GenerationMode, GeneratorConfig, ProfileColumns};
pub use generator::{generate_flight, generate_flight_seeded, FlightTurbulence, GenerationSummary};
pub use noise::ColoredNoiseGenerator;
pub use profile::{FlightConditions, FlightProfile, ProfileSample};
pub use schedule::TurbulenceInterval;
pub use signal::{Channel, OutputRow, OutputSeries, Signal, Timeline};
pub use spectral::{Severity, SpectralParameters};
pub use transfer::SpectrumForm;

#[derive(Debug, Error)]
pub enum TurbulenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("invalid flight profile: {0}")]
    InvalidProfile(String),
    #[error("infeasible turbulence schedule: {0}")]
    InfeasibleSchedule(String),
    #[error("{class} segment overlaps samples {start_index}..{end_index}")]
    SegmentOverlap {
        class: &'static str,
        start_index: usize,
        end_index: usize,
    },
    #[error("{context} length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
}
