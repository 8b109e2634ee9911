//! Sampled wind signals
//!
//! Dense six-channel buffers, the flight-long timelines segments are
//! stamped onto, and the final per-sample output series.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::TurbulenceError;

pub const CHANNEL_COUNT: usize = 6;

/// One sample across all six channels, indexed by [`Channel::index`].
pub type ChannelSample = [f64; CHANNEL_COUNT];

/// Wind disturbance channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Longitudinal gust velocity [m/s]
    U,
    /// Lateral gust velocity [m/s]
    V,
    /// Vertical gust velocity [m/s]
    W,
    /// Rotary disturbance about the x axis [rad/s]
    P,
    /// Rotary disturbance about the y axis [rad/s]
    Q,
    /// Rotary disturbance about the z axis [rad/s]
    R,
}

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::U,
        Channel::V,
        Channel::W,
        Channel::P,
        Channel::Q,
        Channel::R,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Number of samples covering `duration_s` at `sampling_frequency`.
pub fn sample_count(duration_s: f64, sampling_frequency: f64) -> usize {
    (duration_s * sampling_frequency).round().max(0.0) as usize
}

/// Sample index of time `t_s`, rounded so that every component maps a
/// boundary onto the same index.
pub fn sample_index(t_s: f64, sampling_frequency: f64) -> usize {
    sample_count(t_s, sampling_frequency)
}

/// First sample index at or after `t_s`. Realization supports start and
/// end on it so that every sample strictly inside a support is covered and
/// two supports meeting at one instant never share a sample.
pub fn support_index(t_s: f64, sampling_frequency: f64) -> usize {
    (t_s * sampling_frequency).ceil().max(0.0) as usize
}

/// Timestamp of sample `index`, rounded to the microsecond.
pub fn sample_time(index: usize, sampling_frequency: f64) -> f64 {
    (index as f64 / sampling_frequency * 1e6).round() / 1e6
}

/// Uniformly sampled six-channel series.
#[derive(Clone, Debug, PartialEq)]
pub struct Signal {
    sampling_frequency: f64,
    samples: Vec<ChannelSample>,
}

impl Signal {
    pub fn zeros(len: usize, sampling_frequency: f64) -> Self {
        Self {
            sampling_frequency,
            samples: vec![[0.0; CHANNEL_COUNT]; len],
        }
    }

    /// Interleave six equally long channel buffers.
    pub fn from_channels(
        sampling_frequency: f64,
        channels: &[Vec<f64>; CHANNEL_COUNT],
    ) -> Result<Self, TurbulenceError> {
        let len = channels[0].len();
        for channel in channels.iter().skip(1) {
            if channel.len() != len {
                return Err(TurbulenceError::LengthMismatch {
                    context: "signal channel",
                    expected: len,
                    got: channel.len(),
                });
            }
        }

        let samples = (0..len)
            .map(|i| std::array::from_fn(|c| channels[c][i]))
            .collect();

        Ok(Self {
            sampling_frequency,
            samples,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    pub fn samples(&self) -> &[ChannelSample] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [ChannelSample] {
        &mut self.samples
    }

    pub fn channel(&self, channel: Channel) -> Vec<f64> {
        self.samples.iter().map(|s| s[channel.index()]).collect()
    }
}

/// Flight-long buffer holding one realization class (turbulent or calm).
///
/// Segments are stamped at their sample offset. A second write to an
/// already covered sample is rejected so that a later segment can never
/// clobber an earlier one's transition data.
#[derive(Clone, Debug)]
pub struct Timeline {
    class: &'static str,
    signal: Signal,
    flag: Vec<bool>,
    covered: Vec<bool>,
}

impl Timeline {
    pub fn new(class: &'static str, len: usize, sampling_frequency: f64) -> Self {
        Self {
            class,
            signal: Signal::zeros(len, sampling_frequency),
            flag: vec![false; len],
            covered: vec![false; len],
        }
    }

    pub fn len(&self) -> usize {
        self.signal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signal.is_empty()
    }

    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    pub fn flag(&self) -> &[bool] {
        &self.flag
    }

    pub fn is_covered(&self, index: usize) -> bool {
        self.covered.get(index).copied().unwrap_or(false)
    }

    /// Copy `segment` onto the timeline starting at `offset`, marking
    /// `flagged` (absolute indices) as turbulent. Samples past the end of
    /// the timeline are dropped.
    pub fn stamp(
        &mut self,
        offset: usize,
        segment: &Signal,
        flagged: Range<usize>,
    ) -> Result<(), TurbulenceError> {
        let end = (offset + segment.len()).min(self.len());
        if offset >= end {
            return Ok(());
        }

        if self.covered[offset..end].iter().any(|&c| c) {
            return Err(TurbulenceError::SegmentOverlap {
                class: self.class,
                start_index: offset,
                end_index: end,
            });
        }

        let target = &mut self.signal.samples_mut()[offset..end];
        target.copy_from_slice(&segment.samples()[..end - offset]);
        self.covered[offset..end].fill(true);

        let flag_end = flagged.end.min(self.flag.len());
        if flagged.start < flag_end {
            self.flag[flagged.start..flag_end].fill(true);
        }

        Ok(())
    }

    pub fn into_parts(self) -> (Signal, Vec<bool>) {
        (self.signal, self.flag)
    }
}

/// One output row: `timestamp, turbulence, u, v, w, p, q, r`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    pub timestamp: f64,
    pub turbulence: u8,
    pub u: f64,
    pub v: f64,
    pub w: f64,
    pub p: f64,
    pub q: f64,
    pub r: f64,
}

impl OutputRow {
    pub fn new(timestamp: f64, turbulent: bool, sample: &ChannelSample) -> Self {
        Self {
            timestamp,
            turbulence: u8::from(turbulent),
            u: sample[0],
            v: sample[1],
            w: sample[2],
            p: sample[3],
            q: sample[4],
            r: sample[5],
        }
    }

    pub fn value(&self, channel: Channel) -> f64 {
        match channel {
            Channel::U => self.u,
            Channel::V => self.v,
            Channel::W => self.w,
            Channel::P => self.p,
            Channel::Q => self.q,
            Channel::R => self.r,
        }
    }

    pub fn is_turbulent(&self) -> bool {
        self.turbulence == 1
    }
}

/// Complete per-flight series, owned by the caller once generated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputSeries {
    pub sampling_frequency: f64,
    pub rows: Vec<OutputRow>,
}

impl OutputSeries {
    pub fn from_signal(signal: &Signal, flag: &[bool]) -> Result<Self, TurbulenceError> {
        if flag.len() != signal.len() {
            return Err(TurbulenceError::LengthMismatch {
                context: "turbulence flag",
                expected: signal.len(),
                got: flag.len(),
            });
        }

        let fs = signal.sampling_frequency();
        let rows = signal
            .samples()
            .iter()
            .zip(flag)
            .enumerate()
            .map(|(i, (sample, &turbulent))| OutputRow::new(sample_time(i, fs), turbulent, sample))
            .collect();

        Ok(Self {
            sampling_frequency: fs,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn channel(&self, channel: Channel) -> Vec<f64> {
        self.rows.iter().map(|r| r.value(channel)).collect()
    }

    /// Share of rows flagged as turbulent.
    pub fn turbulent_fraction(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        let flagged = self.rows.iter().filter(|r| r.is_turbulent()).count();
        flagged as f64 / self.rows.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_time_rounds_to_microseconds() {
        assert_eq!(sample_time(3, 100.0), 0.03);
        assert_eq!(sample_time(1, 3.0), 0.333333);
        assert_eq!(sample_count(360.0, 50.0), 18_000);
        assert_eq!(support_index(20.5, 50.0), 1025);
        assert_eq!(support_index(2.25, 10.0), 23);
        assert_eq!(support_index(-1.0, 10.0), 0);
    }

    #[test]
    fn from_channels_rejects_ragged_input() {
        let mut channels: [Vec<f64>; CHANNEL_COUNT] = Default::default();
        for (i, c) in channels.iter_mut().enumerate() {
            *c = vec![i as f64; 4];
        }
        let signal = Signal::from_channels(10.0, &channels).expect("equal lengths");
        assert_eq!(signal.len(), 4);
        assert_eq!(signal.samples()[2][Channel::Q.index()], 4.0);

        channels[5].pop();
        assert!(matches!(
            Signal::from_channels(10.0, &channels),
            Err(TurbulenceError::LengthMismatch { got: 3, .. })
        ));
    }

    #[test]
    fn timeline_rejects_overlapping_stamps() {
        let mut timeline = Timeline::new("calm", 10, 1.0);
        let segment = Signal::zeros(4, 1.0);
        timeline.stamp(0, &segment, 0..0).expect("first stamp");
        timeline.stamp(4, &segment, 5..7).expect("adjacent stamp");
        assert!(timeline.is_covered(7));
        assert!(!timeline.is_covered(8));
        assert!(timeline.flag()[5] && timeline.flag()[6] && !timeline.flag()[7]);

        let err = timeline.stamp(6, &segment, 0..0).unwrap_err();
        assert!(matches!(err, TurbulenceError::SegmentOverlap { class: "calm", .. }));
    }

    #[test]
    fn timeline_drops_samples_past_end() {
        let mut timeline = Timeline::new("turbulent", 5, 1.0);
        let mut segment = Signal::zeros(4, 1.0);
        segment.samples_mut()[1][0] = 2.5;
        timeline.stamp(3, &segment, 3..9).expect("stamp");
        assert_eq!(timeline.signal().samples()[4][0], 2.5);
        assert!(timeline.flag()[4]);
    }

    #[test]
    fn output_series_reports_flagged_fraction() {
        let signal = Signal::zeros(4, 2.0);
        let series =
            OutputSeries::from_signal(&signal, &[false, true, true, false]).expect("series");
        assert_eq!(series.rows[1].timestamp, 0.5);
        assert_eq!(series.rows[1].turbulence, 1);
        assert!((series.turbulent_fraction() - 0.5).abs() < 1e-12);
    }
}
