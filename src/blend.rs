//! Turbulent/calm crossfade
//!
//! The blend coefficient is 1 inside turbulence and 0 outside, ramping over
//! `transition_duration_s` centered on each interior boundary:
//!
//! ```text
//!            s-T/2  s+T/2            e-T/2  e+T/2
//! coef 1 ..........  ____________________  ..........
//!                  /                      \
//! coef 0 ________/                          \________
//! ```
//!
//! A boundary at the very start or end of the flight has no ramp. Ramps
//! touching an interval shorter than `T` narrow to half its length.

use serde::{Deserialize, Serialize};

use crate::schedule::TurbulenceInterval;
use crate::signal::{sample_time, support_index, OutputSeries, Signal, Timeline, CHANNEL_COUNT};
use crate::TurbulenceError;

/// Crossfade weight profile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionShape {
    #[default]
    Linear,
    /// Raised cosine, `0.5 * (1 - cos(pi x))`
    Cosine,
}

impl TransitionShape {
    /// Weight at normalized position `x` in `[0, 1]`. `w(x) + w(1 - x) == 1`.
    pub fn weight(self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        match self {
            TransitionShape::Linear => x,
            TransitionShape::Cosine => 0.5 * (1.0 - (std::f64::consts::PI * x).cos()),
        }
    }
}

/// Rising ramp centered on `boundary_s`: 0 before `boundary_s - T/2`,
/// 1 after `boundary_s + T/2`. With `T == 0` it is a step at the boundary.
pub fn ramp(t_s: f64, boundary_s: f64, transition_s: f64, shape: TransitionShape) -> f64 {
    if transition_s <= 0.0 {
        return if t_s >= boundary_s { 1.0 } else { 0.0 };
    }
    shape.weight((t_s - boundary_s + 0.5 * transition_s) / transition_s)
}

/// Half-width of the ramp on each boundary between `intervals[i]` and
/// `intervals[i + 1]`, for a time-ordered cover of the flight.
///
/// Nominally `T/2`. An interval with neighbours on both sides has its
/// same-class supports meet at its midpoint, so ramps touching it are capped
/// at half its length and the coefficient is exactly 0 or 1 there.
pub fn transition_half_widths(intervals: &[TurbulenceInterval], transition_s: f64) -> Vec<f64> {
    let half = 0.5 * transition_s.max(0.0);
    let last = intervals.len().saturating_sub(1);
    intervals
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let mut h = half;
            if i > 0 {
                h = h.min(0.5 * pair[0].duration_s as f64);
            }
            if i + 1 < last {
                h = h.min(0.5 * pair[1].duration_s as f64);
            }
            h
        })
        .collect()
}

/// Per-sample blend coefficient for a flight of `len` samples.
///
/// `intervals` is the time-ordered cover of the flight (turbulent and calm).
/// The first and last interval have no outer ramp.
pub fn blend_coefficients(
    len: usize,
    sampling_frequency: f64,
    intervals: &[TurbulenceInterval],
    transition_s: f64,
    shape: TransitionShape,
) -> Vec<f64> {
    let fs = sampling_frequency;
    let half_widths = transition_half_widths(intervals, transition_s);
    let mut coefficients = vec![0.0_f64; len];

    for (i, interval) in intervals.iter().enumerate() {
        if !interval.is_turbulent {
            continue;
        }
        let start = interval.start_s as f64;
        let end = interval.end_s() as f64;
        let rise_half = i.checked_sub(1).map(|b| half_widths[b]);
        let fall_half = half_widths.get(i).copied();

        let first = rise_half.map_or(0, |h| support_index((start - h).max(0.0), fs));
        let last = fall_half.map_or(len, |h| support_index(end + h, fs));

        for (j, coef) in coefficients
            .iter_mut()
            .enumerate()
            .take(last.min(len))
            .skip(first)
        {
            let t = sample_time(j, fs);
            let rise = rise_half.map_or(1.0, |h| ramp(t, start, 2.0 * h, shape));
            let fall = fall_half.map_or(1.0, |h| 1.0 - ramp(t, end, 2.0 * h, shape));
            *coef = coef.max(rise.min(fall));
        }
    }

    coefficients
}

/// Merge the two realizations sample by sample. The turbulence flag comes
/// from the turbulent timeline unchanged.
pub fn blend(
    turbulent: Timeline,
    calm: Timeline,
    coefficients: &[f64],
) -> Result<OutputSeries, TurbulenceError> {
    if calm.len() != turbulent.len() {
        return Err(TurbulenceError::LengthMismatch {
            context: "calm timeline",
            expected: turbulent.len(),
            got: calm.len(),
        });
    }
    if coefficients.len() != turbulent.len() {
        return Err(TurbulenceError::LengthMismatch {
            context: "blend coefficients",
            expected: turbulent.len(),
            got: coefficients.len(),
        });
    }

    let (turbulent_signal, flag) = turbulent.into_parts();
    let (calm_signal, _) = calm.into_parts();
    let fs = turbulent_signal.sampling_frequency();

    let mut mixed = Signal::zeros(turbulent_signal.len(), fs);
    for (((out, turb), still), &c) in mixed
        .samples_mut()
        .iter_mut()
        .zip(turbulent_signal.samples())
        .zip(calm_signal.samples())
        .zip(coefficients)
    {
        for ch in 0..CHANNEL_COUNT {
            out[ch] = c * turb[ch] + (1.0 - c) * still[ch];
        }
    }

    OutputSeries::from_signal(&mixed, &flag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::cover;
    use crate::spectral::Severity;

    fn turbulent(start_s: u64, duration_s: u64) -> TurbulenceInterval {
        TurbulenceInterval {
            start_s,
            duration_s,
            severity: Severity::Moderate,
            is_turbulent: true,
        }
    }

    fn filled(
        class: &'static str,
        len: usize,
        fs: f64,
        value: f64,
        flagged: std::ops::Range<usize>,
    ) -> Timeline {
        let mut segment = Signal::zeros(len, fs);
        for s in segment.samples_mut() {
            s.fill(value);
        }
        let mut timeline = Timeline::new(class, len, fs);
        timeline.stamp(0, &segment, flagged).expect("stamp");
        timeline
    }

    #[test]
    fn shapes_are_complementary() {
        for shape in [TransitionShape::Linear, TransitionShape::Cosine] {
            assert_eq!(shape.weight(0.0), 0.0);
            assert!((shape.weight(1.0) - 1.0).abs() < 1e-15);
            for x in [0.1, 0.25, 0.5, 0.8] {
                assert!((shape.weight(x) + shape.weight(1.0 - x) - 1.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn coefficients_ramp_across_interior_boundaries() {
        let fs = 10.0;
        let shape = TransitionShape::Linear;
        let intervals = cover(&[turbulent(40, 20)], 100, Severity::None);
        let coef = blend_coefficients(1000, fs, &intervals, 4.0, shape);
        assert_eq!(coef[370], 0.0);
        assert!((coef[400] - 0.5).abs() < 1e-12);
        assert_eq!(coef[420], 1.0);
        assert_eq!(coef[500], 1.0);
        assert!((coef[600] - 0.5).abs() < 1e-12);
        assert_eq!(coef[620], 0.0);
        assert_eq!(coef[999], 0.0);

        let max_step = coef
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .fold(0.0, f64::max);
        assert!(max_step <= 1.0 / (4.0 * fs) + 1e-12);
    }

    #[test]
    fn flight_edges_have_no_ramp() {
        let intervals = cover(&[turbulent(0, 10), turbulent(90, 10)], 100, Severity::None);
        let coef = blend_coefficients(100, 1.0, &intervals, 6.0, TransitionShape::Cosine);
        assert_eq!(coef[0], 1.0);
        assert_eq!(coef[99], 1.0);
        assert!((coef[10] - 0.5).abs() < 1e-12);
        assert_eq!(coef[50], 0.0);
    }

    #[test]
    fn ramps_narrow_around_short_gaps_and_events() {
        let fs = 50.0;
        let turbulence = [turbulent(10, 10), turbulent(21, 10), turbulent(40, 1)];
        let intervals = cover(&turbulence, 60, Severity::None);
        assert_eq!(
            transition_half_widths(&intervals, 3.0),
            vec![1.5, 0.5, 0.5, 1.5, 0.5, 0.5]
        );

        let coef = blend_coefficients(3000, fs, &intervals, 3.0, TransitionShape::Linear);
        // 1 s calm gap: both turbulent supports end at 20.5 s
        assert!((coef[1000] - 0.5).abs() < 1e-12);
        assert_eq!(coef[1025], 0.0);
        assert!((coef[1050] - 0.5).abs() < 1e-12);
        // 1 s event: both calm supports end at 40.5 s
        assert_eq!(coef[2025], 1.0);
        assert!((coef[500] - 0.5).abs() < 1e-12);
        assert_eq!(coef[575], 1.0);

        let max_step = coef
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .fold(0.0, f64::max);
        assert!(max_step <= 1.0 / fs + 1e-12);
    }

    #[test]
    fn zero_transition_is_a_step() {
        let intervals = cover(&[turbulent(5, 5)], 20, Severity::None);
        let coef = blend_coefficients(20, 1.0, &intervals, 0.0, TransitionShape::Linear);
        let expected: Vec<f64> = (0..20)
            .map(|i| if (5..10).contains(&i) { 1.0 } else { 0.0 })
            .collect();
        assert_eq!(coef, expected);
    }

    #[test]
    fn blend_mixes_channels_and_keeps_flag() {
        let fs = 10.0;
        let len = 1000;
        let shape = TransitionShape::Linear;
        let intervals = cover(&[turbulent(40, 20)], 100, Severity::None);
        let coef = blend_coefficients(len, fs, &intervals, 4.0, shape);
        let turb = filled("turbulent", len, fs, 1.0, 400..600);
        let calm = filled("calm", len, fs, 0.0, 0..0);
        let series = blend(turb, calm, &coef).expect("blend");

        assert_eq!(series.len(), len);
        for (row, &c) in series.rows.iter().zip(&coef) {
            assert!((row.w - c).abs() < 1e-15);
            assert!((row.r - c).abs() < 1e-15);
        }
        assert_eq!(series.rows[399].turbulence, 0);
        assert_eq!(series.rows[400].turbulence, 1);
        assert_eq!(series.rows[599].turbulence, 1);
        assert_eq!(series.rows[600].turbulence, 0);
    }

    #[test]
    fn blend_rejects_mismatched_lengths() {
        let turb = Timeline::new("turbulent", 10, 1.0);
        let calm = Timeline::new("calm", 9, 1.0);
        let err = blend(turb, calm, &[0.0; 10]).unwrap_err();
        assert!(matches!(
            err,
            TurbulenceError::LengthMismatch {
                context: "calm timeline",
                ..
            }
        ));
    }
}
