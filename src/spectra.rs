use num_complex::Complex;
use realfft::RealFftPlanner;

use crate::utils::{hanning_window, DynError};

/// Spectrogram segment length. Mirrors the reference analysis defaults for
/// this instrument's 8 kHz streams: 31.25 Hz bins, 32 ms windows.
pub const SEGMENT_LEN: usize = 256;

/// Overlap between consecutive spectrogram segments, in samples.
pub const SEGMENT_OVERLAP: usize = 32;

/// Single-sided amplitude spectrum: bin frequencies up to (but excluding)
/// Nyquist, paired with magnitudes normalized by the signal length.
#[derive(Debug, Clone)]
pub struct SpectralResult {
    pub frequencies: Vec<f64>,
    pub amplitudes: Vec<f64>,
}

impl SpectralResult {
    /// Largest-amplitude bin. Nothing is excluded: a dominant DC residue is
    /// reported as a 0 Hz peak.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.frequencies
            .iter()
            .zip(&self.amplitudes)
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(frequency, amplitude)| (*frequency, *amplitude))
    }
}

/// Time-frequency power matrix in decibels. `power_db[t][f]` pairs with
/// `times[t]` and `frequencies[f]`. Zero power is carried as `-inf`; the
/// render sink must tolerate it.
#[derive(Debug, Clone)]
pub struct SpectrogramResult {
    pub frequencies: Vec<f64>,
    pub times: Vec<f64>,
    pub power_db: Vec<Vec<f64>>,
}

/// Computes the single-sided amplitude spectrum of `signal`.
///
/// No windowing or detrending is applied: the transform sees the raw signal,
/// so any calibration residue shows up directly in the lowest bins. An empty
/// signal yields an empty result, not an error.
pub fn amplitude_spectrum(
    signal: &[f64],
    sampling_rate_hz: f64,
) -> Result<SpectralResult, DynError> {
    let len = signal.len();
    if len == 0 {
        return Ok(SpectralResult {
            frequencies: Vec::new(),
            amplitudes: Vec::new(),
        });
    }

    let mut planner = RealFftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(len);
    let mut input = signal.to_vec();
    let mut spectrum: Vec<Complex<f64>> = fft.make_output_vec();
    fft.process(&mut input, &mut spectrum)?;

    let keep = len / 2;
    let scale = 1.0 / len as f64;
    let bin_width_hz = sampling_rate_hz / len as f64;
    let frequencies: Vec<f64> = (0..keep).map(|bin| bin as f64 * bin_width_hz).collect();
    let amplitudes: Vec<f64> = spectrum[..keep].iter().map(|z| z.norm() * scale).collect();

    Ok(SpectralResult {
        frequencies,
        amplitudes,
    })
}

/// Computes a Hann-windowed short-time spectrogram of `signal` with power
/// expressed as `10 * log10` of the density-scaled periodogram.
///
/// A signal shorter than one segment yields an empty result, not an error.
pub fn spectrogram(
    signal: &[f64],
    sampling_rate_hz: f64,
) -> Result<SpectrogramResult, DynError> {
    if signal.len() < SEGMENT_LEN {
        return Ok(SpectrogramResult {
            frequencies: Vec::new(),
            times: Vec::new(),
            power_db: Vec::new(),
        });
    }

    let step = SEGMENT_LEN - SEGMENT_OVERLAP;
    let window = hanning_window(SEGMENT_LEN);
    let window_power: f64 = window.iter().map(|w| w * w).sum();
    let scale = 1.0 / (sampling_rate_hz * window_power);
    let bins = SEGMENT_LEN / 2 + 1;
    let bin_width_hz = sampling_rate_hz / SEGMENT_LEN as f64;

    let mut planner = RealFftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(SEGMENT_LEN);
    let mut input = fft.make_input_vec();
    let mut spectrum: Vec<Complex<f64>> = fft.make_output_vec();

    let frequencies: Vec<f64> = (0..bins).map(|bin| bin as f64 * bin_width_hz).collect();
    let mut times = Vec::new();
    let mut power_db = Vec::new();

    let mut pos = 0;
    while pos + SEGMENT_LEN <= signal.len() {
        for (dst, (sample, weight)) in input
            .iter_mut()
            .zip(signal[pos..pos + SEGMENT_LEN].iter().zip(&window))
        {
            *dst = sample * weight;
        }
        fft.process(&mut input, &mut spectrum)?;

        let row: Vec<f64> = spectrum
            .iter()
            .enumerate()
            .map(|(bin, z)| {
                let mut power = z.norm_sqr() * scale;
                // interior bins carry both halves of the symmetric spectrum
                if bin != 0 && bin != bins - 1 {
                    power *= 2.0;
                }
                10.0 * power.log10()
            })
            .collect();
        power_db.push(row);
        times.push((pos + SEGMENT_LEN / 2) as f64 / sampling_rate_hz);
        pos += step;
    }

    Ok(SpectrogramResult {
        frequencies,
        times,
        power_db,
    })
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    const RATE: f64 = 8000.0;

    fn sine(frequency_hz: f64, amplitude: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * frequency_hz * i as f64 / RATE).sin())
            .collect()
    }

    #[test]
    fn empty_signal_yields_empty_spectrum() {
        let result = amplitude_spectrum(&[], RATE).unwrap();
        assert!(result.frequencies.is_empty());
        assert!(result.amplitudes.is_empty());
    }

    #[test]
    fn sine_peak_lands_within_one_bin_of_its_frequency() {
        let signal = sine(1000.0, 1.0, 8000);
        let result = amplitude_spectrum(&signal, RATE).unwrap();
        let bin_width = RATE / signal.len() as f64;
        let (peak_freq, peak_amp) = result.peak().unwrap();
        assert!(
            (peak_freq - 1000.0).abs() <= bin_width,
            "peak at {peak_freq} Hz"
        );
        // a unit sine splits evenly between the two symmetric halves
        assert!((peak_amp - 0.5).abs() < 1e-9);
    }

    #[test]
    fn dc_bin_carries_the_signal_mean() {
        let signal = vec![3.0; 64];
        let result = amplitude_spectrum(&signal, RATE).unwrap();
        assert!((result.amplitudes[0] - 3.0).abs() < 1e-12);
        assert!(result.amplitudes[1..].iter().all(|&a| a < 1e-9));
    }

    #[test]
    fn spectrum_axis_stops_below_nyquist() {
        let result = amplitude_spectrum(&sine(100.0, 1.0, 8000), RATE).unwrap();
        assert_eq!(result.frequencies.len(), 4000);
        assert_eq!(result.frequencies[0], 0.0);
        assert!(*result.frequencies.last().unwrap() < RATE / 2.0);
    }

    #[test]
    fn silent_signal_spectrogram_is_negative_infinity() {
        let result = spectrogram(&vec![0.0; 2048], RATE).unwrap();
        assert!(!result.times.is_empty());
        for row in &result.power_db {
            assert_eq!(row.len(), SEGMENT_LEN / 2 + 1);
            assert!(row.iter().all(|&db| db == f64::NEG_INFINITY));
        }
    }

    #[test]
    fn spectrogram_peak_tracks_tone_frequency() {
        let signal = sine(1000.0, 1.0, 8192);
        let result = spectrogram(&signal, RATE).unwrap();
        let bin_width = RATE / SEGMENT_LEN as f64;
        for row in &result.power_db {
            let peak_bin = row
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .map(|(bin, _)| bin)
                .unwrap();
            let peak_freq = result.frequencies[peak_bin];
            assert!(
                (peak_freq - 1000.0).abs() <= bin_width,
                "segment peak at {peak_freq} Hz"
            );
        }
    }

    #[test]
    fn spectrogram_segments_advance_by_the_hop() {
        let result = spectrogram(&vec![1.0; 1024], RATE).unwrap();
        let step = (SEGMENT_LEN - SEGMENT_OVERLAP) as f64 / RATE;
        let expected = (1024 - SEGMENT_LEN) / (SEGMENT_LEN - SEGMENT_OVERLAP) + 1;
        assert_eq!(result.times.len(), expected);
        for pair in result.times.windows(2) {
            assert!((pair[1] - pair[0] - step).abs() < 1e-12);
        }
    }

    #[test]
    fn short_signal_spectrogram_is_empty() {
        let result = spectrogram(&vec![1.0; SEGMENT_LEN - 1], RATE).unwrap();
        assert!(result.times.is_empty());
        assert!(result.power_db.is_empty());
    }
}
