use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::blend::TransitionShape;
use crate::spectral::Severity;
use crate::transfer::SpectrumForm;
use crate::TurbulenceError;

/// What a generation run produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Scheduled turbulent events blended into calm background
    #[default]
    Turbulence,
    /// Background conditions only, refreshed in fixed windows
    Calm,
}

impl GenerationMode {
    pub fn label(self) -> &'static str {
        match self {
            GenerationMode::Turbulence => "turbulence",
            GenerationMode::Calm => "calm",
        }
    }
}

/// Input profile column headers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileColumns {
    pub timestamp: String,
    /// True airspeed [m/s]
    pub airspeed: String,
    /// Altitude [m]
    pub altitude: String,
}

impl Default for ProfileColumns {
    fn default() -> Self {
        Self {
            timestamp: "timestamp".into(),
            airspeed: "platform_speed_wrt_air : from pitot (m/s)".into(),
            altitude: "altitude : from GPS (meter)".into(),
        }
    }
}

/// Runtime configuration for one or more generated flights.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Output sampling frequency [Hz]
    #[serde(default = "default_sampling_frequency")]
    pub sampling_frequency: f64,
    /// Mean turbulent event length [s]
    #[serde(default = "default_mean_turbulence_length")]
    pub mean_turbulence_length_s: f64,
    /// Target share of flight time spent in turbulence, in [0, 1)
    #[serde(default = "default_turbulence_fraction")]
    pub turbulence_fraction: f64,
    /// Severity of turbulent intervals
    #[serde(default = "default_severity")]
    pub severity: Severity,
    /// Severity of calm intervals and of calm mode
    #[serde(default)]
    pub background_severity: Severity,
    /// Crossfade length centered on each boundary [s]
    #[serde(default = "default_transition_duration")]
    pub transition_duration_s: f64,
    #[serde(default)]
    pub transition_shape: TransitionShape,
    /// Aircraft wingspan [m]
    pub wingspan_m: f64,
    #[serde(default)]
    pub mode: GenerationMode,
    /// Calm-mode parameter refresh window [s]
    #[serde(default = "default_refresh_period")]
    pub parameter_refresh_period_s: f64,
    #[serde(default)]
    pub spectrum_form: SpectrumForm,
    /// Fixes every random draw when set
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub columns: ProfileColumns,
}

fn default_sampling_frequency() -> f64 {
    100.0
}

fn default_mean_turbulence_length() -> f64 {
    180.0
}

fn default_turbulence_fraction() -> f64 {
    0.05
}

fn default_severity() -> Severity {
    Severity::Moderate
}

fn default_transition_duration() -> f64 {
    3.0
}

fn default_refresh_period() -> f64 {
    180.0
}

impl GeneratorConfig {
    /// Defaults for an aircraft of the given wingspan [m].
    pub fn new(wingspan_m: f64) -> Self {
        Self {
            sampling_frequency: default_sampling_frequency(),
            mean_turbulence_length_s: default_mean_turbulence_length(),
            turbulence_fraction: default_turbulence_fraction(),
            severity: default_severity(),
            background_severity: Severity::None,
            transition_duration_s: default_transition_duration(),
            transition_shape: TransitionShape::default(),
            wingspan_m,
            mode: GenerationMode::default(),
            parameter_refresh_period_s: default_refresh_period(),
            spectrum_form: SpectrumForm::default(),
            seed: None,
            columns: ProfileColumns::default(),
        }
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, TurbulenceError> {
        let raw = fs::read_to_string(path)?;
        let cfg: GeneratorConfig = toml::from_str(&raw).map_err(|e| {
            TurbulenceError::InvalidConfig(format!("{}: {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), TurbulenceError> {
        let invalid = |msg: String| Err(TurbulenceError::InvalidConfig(msg));

        if !(self.sampling_frequency.is_finite() && self.sampling_frequency > 0.0) {
            return invalid(format!(
                "sampling_frequency must be > 0, got {}",
                self.sampling_frequency
            ));
        }
        if !(self.mean_turbulence_length_s.is_finite() && self.mean_turbulence_length_s > 0.0) {
            return invalid(format!(
                "mean_turbulence_length_s must be > 0, got {}",
                self.mean_turbulence_length_s
            ));
        }
        if !(0.0..1.0).contains(&self.turbulence_fraction) {
            return invalid(format!(
                "turbulence_fraction must be in [0, 1), got {}",
                self.turbulence_fraction
            ));
        }
        if !(self.transition_duration_s.is_finite() && self.transition_duration_s >= 0.0) {
            return invalid(format!(
                "transition_duration_s must be >= 0, got {}",
                self.transition_duration_s
            ));
        }
        if !(self.wingspan_m.is_finite() && self.wingspan_m > 0.0) {
            return invalid(format!("wingspan_m must be > 0, got {}", self.wingspan_m));
        }
        if !(self.parameter_refresh_period_s.is_finite()
            && self.parameter_refresh_period_s > self.transition_duration_s)
        {
            return invalid(format!(
                "parameter_refresh_period_s ({}) must exceed transition_duration_s ({})",
                self.parameter_refresh_period_s, self.transition_duration_s
            ));
        }
        if self.columns.timestamp.is_empty()
            || self.columns.airspeed.is_empty()
            || self.columns.altitude.is_empty()
        {
            return invalid("profile column names must be non-empty".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = GeneratorConfig::new(20.0);
        cfg.validate().expect("defaults validate");
        assert_eq!(cfg.severity, Severity::Moderate);
        assert_eq!(cfg.background_severity, Severity::None);
        assert_eq!(cfg.mode, GenerationMode::Turbulence);
    }

    #[test]
    fn toml_fills_missing_fields_with_defaults() {
        let cfg: GeneratorConfig = toml::from_str(
            r#"
            wingspan_m = 11.0
            severity = 3
            mode = "calm"
            spectrum_form = "rational_filter"
            transition_shape = "cosine"

            [columns]
            airspeed = "tas"
            "#,
        )
        .expect("parse");
        assert_eq!(cfg.wingspan_m, 11.0);
        assert_eq!(cfg.severity, Severity::Severe);
        assert_eq!(cfg.mode, GenerationMode::Calm);
        assert_eq!(cfg.spectrum_form, SpectrumForm::RationalFilter);
        assert_eq!(cfg.transition_shape, TransitionShape::Cosine);
        assert_eq!(cfg.sampling_frequency, 100.0);
        assert_eq!(cfg.columns.airspeed, "tas");
        assert_eq!(cfg.columns.timestamp, "timestamp");
    }

    #[test]
    fn wingspan_is_required_and_severity_checked() {
        assert!(toml::from_str::<GeneratorConfig>("severity = 2").is_err());
        assert!(toml::from_str::<GeneratorConfig>("wingspan_m = 5.0\nseverity = 7").is_err());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = GeneratorConfig::new(20.0);
        cfg.turbulence_fraction = 1.0;
        assert!(matches!(cfg.validate(), Err(TurbulenceError::InvalidConfig(_))));

        let mut cfg = GeneratorConfig::new(20.0);
        cfg.parameter_refresh_period_s = 2.0;
        assert!(cfg.validate().is_err());

        let mut cfg = GeneratorConfig::new(0.0);
        cfg.sampling_frequency = 50.0;
        assert!(cfg.validate().is_err());
    }
}
