//! FFT colored-noise generator
//!
//! Builds a spectrum whose magnitude equals a target transfer function at
//! every FFT bin, draws a uniform random phase per positive bin, mirrors
//! both into the negative half with conjugate symmetry and inverse
//! transforms to a real series.
//!
//! ```text
//! bin:    0 | 1 ... h | (N/2) | N-h ... N-1
//! value:  0 | H e^{iφ} |  0   | conj of 1..h, reversed
//! ```
//!
//! With `h = (N - 1) / 2` the Nyquist bin of an even-length spectrum stays
//! zero; energy there is not modelled.

use std::f64::consts::TAU;

use rand::Rng;
use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

use crate::transfer::Spectrum;

/// FFT bin frequencies [Hz] for length `n`, in the usual order
/// (non-negative first, then negative).
pub fn fft_frequencies(n: usize, sampling_frequency: f64) -> Vec<f64> {
    let df = sampling_frequency / n as f64;
    let positive_end = n.div_ceil(2);
    (0..n)
        .map(|k| {
            if k < positive_end {
                k as f64 * df
            } else {
                -((n - k) as f64) * df
            }
        })
        .collect()
}

/// Number of strictly positive, non-Nyquist bins.
pub fn positive_bin_count(n: usize) -> usize {
    n.saturating_sub(1) / 2
}

/// Bins `k >= cutoff` carry no energy.
pub fn band_limit_bin(n: usize, sampling_frequency: f64, bandwidth: f64) -> usize {
    let bandwidth = bandwidth.clamp(0.0, sampling_frequency / 2.0);
    (bandwidth * n as f64 / sampling_frequency).floor() as usize
}

/// Full length-`n` spectrum from the positive half.
///
/// `magnitude[k - 1]` and `phase[k - 1]` describe bin `k` for
/// `k = 1..=positive_bin_count(n)`. The result satisfies
/// `spectrum[n - k] == spectrum[k].conj()` with zero DC and Nyquist bins.
pub fn hermitian_spectrum(n: usize, magnitude: &[f64], phase: &[f64]) -> Vec<Complex64> {
    let half = positive_bin_count(n);
    assert_eq!(magnitude.len(), half, "magnitude must cover the positive bins");
    assert_eq!(phase.len(), half, "phase must cover the positive bins");

    let mut spectrum = vec![Complex64::new(0.0, 0.0); n];
    for k in 1..=half {
        let bin = Complex64::from_polar(magnitude[k - 1], phase[k - 1]);
        spectrum[k] = bin;
        spectrum[n - k] = bin.conj();
    }
    spectrum
}

/// Magnitude of `spectrum` at the positive bins, zeroed from the band
/// limit on.
pub fn shaped_magnitude<S>(
    n: usize,
    sampling_frequency: f64,
    bandwidth: f64,
    spectrum: &S,
) -> Vec<f64>
where
    S: Spectrum + ?Sized,
{
    let cutoff = band_limit_bin(n, sampling_frequency, bandwidth);
    fft_frequencies(n, sampling_frequency)
        .into_iter()
        .enumerate()
        .skip(1)
        .take(positive_bin_count(n))
        .map(|(k, f)| if k < cutoff { spectrum.magnitude(TAU * f) } else { 0.0 })
        .collect()
}

/// Band-limited spectrum with the target magnitude and a fresh random phase.
pub fn shaped_spectrum<R, S>(
    rng: &mut R,
    n: usize,
    sampling_frequency: f64,
    bandwidth: f64,
    spectrum: &S,
) -> Vec<Complex64>
where
    R: Rng + ?Sized,
    S: Spectrum + ?Sized,
{
    let magnitude = shaped_magnitude(n, sampling_frequency, bandwidth, spectrum);
    let phase: Vec<f64> = (0..magnitude.len()).map(|_| rng.gen_range(0.0..TAU)).collect();
    hermitian_spectrum(n, &magnitude, &phase)
}

/// Colored-noise generator keeping FFT plans across calls.
pub struct ColoredNoiseGenerator {
    planner: FftPlanner<f64>,
}

impl std::fmt::Debug for ColoredNoiseGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColoredNoiseGenerator").finish_non_exhaustive()
    }
}

impl Default for ColoredNoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ColoredNoiseGenerator {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// `n` samples whose spectrum magnitude follows `spectrum` up to
    /// `bandwidth` [Hz].
    ///
    /// The inverse transform is scaled by `sqrt(n)` relative to the
    /// normalized inverse DFT, so the mean square of the result is
    /// `(1/n) * sum |S_k|^2` and `|FFT(x)|^2 / n` equals the squared target
    /// magnitude at every kept bin.
    pub fn generate<R, S>(
        &mut self,
        rng: &mut R,
        n: usize,
        sampling_frequency: f64,
        bandwidth: f64,
        spectrum: &S,
    ) -> Vec<f64>
    where
        R: Rng + ?Sized,
        S: Spectrum + ?Sized,
    {
        if n == 0 {
            return Vec::new();
        }
        let buffer = shaped_spectrum(rng, n, sampling_frequency, bandwidth, spectrum);
        self.inverse_real(buffer)
    }

    /// Inverse transform of a Hermitian spectrum, scaled by `1/sqrt(n)`.
    pub fn inverse_real(&mut self, spectrum: Vec<Complex64>) -> Vec<f64> {
        self.inverse(spectrum).into_iter().map(|c| c.re).collect()
    }

    /// Complex inverse transform scaled by `1/sqrt(n)`.
    pub fn inverse(&mut self, mut spectrum: Vec<Complex64>) -> Vec<Complex64> {
        let n = spectrum.len();
        if n == 0 {
            return spectrum;
        }
        let ifft = self.planner.plan_fft_inverse(n);
        ifft.process(&mut spectrum);

        let scale = 1.0 / (n as f64).sqrt();
        for value in spectrum.iter_mut() {
            *value *= scale;
        }
        spectrum
    }

    /// Unnormalized forward transform of a real series.
    pub fn forward(&mut self, signal: &[f64]) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = signal.iter().map(|&x| Complex64::new(x, 0.0)).collect();
        if buffer.is_empty() {
            return buffer;
        }
        let fft = self.planner.plan_fft_forward(buffer.len());
        fft.process(&mut buffer);
        buffer
    }
}
