//! Turbulence event scheduling
//!
//! Places a random number of turbulent intervals on a flight so that their
//! total share of the flight approaches the requested fraction. Durations
//! and offsets are whole seconds.

use rand::seq::index;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::spectral::Severity;
use crate::TurbulenceError;

/// Relative spread of event durations around the mean.
const DURATION_SPREAD: f64 = 0.2;

/// One scheduled interval of the flight timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurbulenceInterval {
    pub start_s: u64,
    pub duration_s: u64,
    pub severity: Severity,
    pub is_turbulent: bool,
}

impl TurbulenceInterval {
    pub fn end_s(&self) -> u64 {
        self.start_s + self.duration_s
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_s < other.end_s() && other.start_s < self.end_s()
    }
}

/// Inclusive range the event count is drawn from.
pub fn event_count_range(
    flight_duration_s: u64,
    mean_length_s: f64,
    turbulence_fraction: f64,
) -> (usize, usize) {
    let expected = (flight_duration_s as f64 * turbulence_fraction / mean_length_s).floor();
    let expected = expected.max(0.0) as usize;
    (expected.saturating_sub(1).max(1), expected + 1)
}

/// Draw the turbulent intervals of one flight, sorted by start.
///
/// Event durations follow `mean + 0.2 * mean * N(0, 1)` truncated to whole
/// seconds; non-positive draws are dropped. The remaining calm time is
/// split by `k` distinct offsets sampled without replacement, so the
/// intervals are ordered and disjoint by construction.
pub fn schedule<R: Rng + ?Sized>(
    rng: &mut R,
    flight_duration_s: u64,
    mean_length_s: f64,
    turbulence_fraction: f64,
    severity: Severity,
) -> Result<Vec<TurbulenceInterval>, TurbulenceError> {
    if flight_duration_s == 0 {
        return Err(TurbulenceError::InvalidParameter(
            "flight duration must be > 0".into(),
        ));
    }
    if !mean_length_s.is_finite() || mean_length_s <= 0.0 {
        return Err(TurbulenceError::InvalidParameter(format!(
            "mean turbulence length must be > 0, got {mean_length_s}"
        )));
    }
    if !(0.0..1.0).contains(&turbulence_fraction) {
        return Err(TurbulenceError::InvalidParameter(format!(
            "turbulence fraction must be in [0, 1), got {turbulence_fraction}"
        )));
    }
    if turbulence_fraction == 0.0 {
        return Ok(Vec::new());
    }

    let (lo, hi) = event_count_range(flight_duration_s, mean_length_s, turbulence_fraction);
    let draws = rng.gen_range(lo..=hi);

    let durations: Vec<u64> = (0..draws)
        .filter_map(|_| {
            let z: f64 = rng.sample(StandardNormal);
            let d = (mean_length_s + DURATION_SPREAD * mean_length_s * z).trunc();
            (d >= 1.0).then_some(d as u64)
        })
        .collect();

    let total: u64 = durations.iter().sum();
    if total >= flight_duration_s {
        return Err(TurbulenceError::InfeasibleSchedule(format!(
            "{} events totalling {total} s do not fit a {flight_duration_s} s flight",
            durations.len()
        )));
    }

    let calm_s = usize::try_from(flight_duration_s - total).map_err(|_| {
        TurbulenceError::InfeasibleSchedule("calm time exceeds addressable range".into())
    })?;
    if durations.len() > calm_s {
        return Err(TurbulenceError::InfeasibleSchedule(format!(
            "{} events need distinct offsets but only {calm_s} s are calm",
            durations.len()
        )));
    }

    let mut offsets = index::sample(rng, calm_s, durations.len()).into_vec();
    offsets.sort_unstable();

    let mut elapsed = 0;
    let intervals = offsets
        .into_iter()
        .zip(&durations)
        .map(|(offset, &duration_s)| {
            let start_s = offset as u64 + elapsed;
            elapsed += duration_s;
            TurbulenceInterval {
                start_s,
                duration_s,
                severity,
                is_turbulent: true,
            }
        })
        .collect();

    Ok(intervals)
}

/// Complementary calm intervals filling the gaps between `turbulent`
/// (sorted, disjoint) on `[0, flight_duration_s)`.
pub fn calm_intervals(
    turbulent: &[TurbulenceInterval],
    flight_duration_s: u64,
    background: Severity,
) -> Vec<TurbulenceInterval> {
    let mut calm = Vec::with_capacity(turbulent.len() + 1);
    let mut cursor = 0;
    let boundaries = turbulent
        .iter()
        .map(|t| (t.start_s, t.end_s()))
        .chain(std::iter::once((flight_duration_s, flight_duration_s)));

    for (start, end) in boundaries {
        let start = start.min(flight_duration_s);
        if start > cursor {
            calm.push(TurbulenceInterval {
                start_s: cursor,
                duration_s: start - cursor,
                severity: background,
                is_turbulent: false,
            });
        }
        cursor = cursor.max(end.min(flight_duration_s));
    }
    calm
}

/// Turbulent and calm intervals together, sorted, covering the flight.
pub fn cover(
    turbulent: &[TurbulenceInterval],
    flight_duration_s: u64,
    background: Severity,
) -> Vec<TurbulenceInterval> {
    let mut all = calm_intervals(turbulent, flight_duration_s, background);
    all.extend_from_slice(turbulent);
    all.sort_by_key(|i| i.start_s);
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn event_count_brackets_expectation() {
        assert_eq!(event_count_range(360, 30.0, 0.1), (1, 2));
        assert_eq!(event_count_range(3600, 180.0, 0.25), (4, 6));
        assert_eq!(event_count_range(100, 180.0, 0.05), (1, 1));
    }

    #[test]
    fn intervals_never_overlap() {
        for seed in 0..200 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let intervals = schedule(&mut rng, 3600, 120.0, 0.2, Severity::Moderate)
                .expect("feasible schedule");
            assert!(!intervals.is_empty());

            let total: u64 = intervals.iter().map(|i| i.duration_s).sum();
            assert!(total <= 3600);
            for (i, a) in intervals.iter().enumerate() {
                assert!(a.duration_s > 0);
                assert!(a.end_s() < 3600, "seed {seed}: {a:?}");
                for b in &intervals[i + 1..] {
                    assert!(!a.overlaps(b), "seed {seed}: {a:?} {b:?}");
                    assert!(b.start_s > a.end_s(), "seed {seed}: not ordered");
                }
            }
        }
    }

    #[test]
    fn zero_fraction_schedules_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let intervals = schedule(&mut rng, 600, 60.0, 0.0, Severity::Light).expect("schedule");
        assert!(intervals.is_empty());
    }

    #[test]
    fn oversized_events_are_infeasible() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let err = schedule(&mut rng, 100, 500.0, 0.5, Severity::Severe).unwrap_err();
        assert!(matches!(err, TurbulenceError::InfeasibleSchedule(_)));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert!(matches!(
            schedule(&mut rng, 600, 0.0, 0.1, Severity::Light),
            Err(TurbulenceError::InvalidParameter(_))
        ));
        assert!(matches!(
            schedule(&mut rng, 600, 30.0, 1.0, Severity::Light),
            Err(TurbulenceError::InvalidParameter(_))
        ));
    }

    #[test]
    fn cover_fills_gaps_with_background() {
        let turbulent = [
            TurbulenceInterval {
                start_s: 0,
                duration_s: 10,
                severity: Severity::Moderate,
                is_turbulent: true,
            },
            TurbulenceInterval {
                start_s: 40,
                duration_s: 20,
                severity: Severity::Moderate,
                is_turbulent: true,
            },
        ];
        let all = cover(&turbulent, 100, Severity::None);
        let spans: Vec<(u64, u64, bool)> = all
            .iter()
            .map(|i| (i.start_s, i.end_s(), i.is_turbulent))
            .collect();
        assert_eq!(
            spans,
            vec![(0, 10, true), (10, 40, false), (40, 60, true), (60, 100, false)]
        );
        assert!(all
            .iter()
            .filter(|i| !i.is_turbulent)
            .all(|i| i.severity == Severity::None));
    }

    #[test]
    fn no_turbulence_is_one_calm_interval() {
        let all = cover(&[], 42, Severity::Light);
        assert_eq!(all.len(), 1);
        assert_eq!((all[0].start_s, all[0].duration_s), (0, 42));
    }
}
