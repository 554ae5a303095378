//! Digital Signal Processing utilities

pub mod stats;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::Arc;

/// Added to bin magnitudes before the dB conversion so silence stays finite
pub const MAGNITUDE_EPSILON: f64 = 1e-10;

/// Window functions for spectral analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    Rectangular,
    #[default]
    Hann,
    Hamming,
    Blackman,
}

impl WindowFunction {
    /// Generate symmetric window coefficients
    pub fn generate(&self, size: usize) -> Vec<f64> {
        if size < 2 {
            return vec![1.0; size];
        }
        match self {
            WindowFunction::Rectangular => vec![1.0; size],
            WindowFunction::Hann => Self::hann(size),
            WindowFunction::Hamming => Self::hamming(size),
            WindowFunction::Blackman => Self::blackman(size),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "rectangular" | "rect" | "none" => Some(Self::Rectangular),
            "hann" | "hanning" => Some(Self::Hann),
            "hamming" => Some(Self::Hamming),
            "blackman" => Some(Self::Blackman),
            _ => None,
        }
    }

    fn hann(size: usize) -> Vec<f64> {
        (0..size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / (size - 1) as f64).cos()))
            .collect()
    }

    fn hamming(size: usize) -> Vec<f64> {
        (0..size)
            .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (size - 1) as f64).cos())
            .collect()
    }

    fn blackman(size: usize) -> Vec<f64> {
        (0..size)
            .map(|i| {
                let x = 2.0 * PI * i as f64 / (size - 1) as f64;
                0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
            })
            .collect()
    }
}

/// One-sided magnitude spectrum, or a frequency slice of one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectrumFrame {
    /// Bin centre frequencies in Hz, strictly increasing
    pub frequencies: Vec<f64>,
    /// Bin magnitudes in dB, parallel to `frequencies`
    pub magnitudes_db: Vec<f64>,
}

impl SpectrumFrame {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Inclusive `[min_freq, max_freq]` slice, order preserved
    pub fn sub_band(&self, min_freq: f64, max_freq: f64) -> SpectrumFrame {
        let (frequencies, magnitudes_db) = self
            .frequencies
            .iter()
            .zip(&self.magnitudes_db)
            .filter(|(&f, _)| f >= min_freq && f <= max_freq)
            .map(|(&f, &m)| (f, m))
            .unzip();
        SpectrumFrame {
            frequencies,
            magnitudes_db,
        }
    }
}

/// Windowed single-frame spectral analyzer
pub struct SpectralAnalyzer {
    window_size: usize,
    window: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
}

impl SpectralAnalyzer {
    pub fn new(window_size: usize, window_fn: WindowFunction) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            window_size,
            window: window_fn.generate(window_size),
            fft: planner.plan_fft_forward(window_size),
        }
    }

    /// Magnitude spectrum (dB) of the first `window_size` samples.
    ///
    /// Shorter input is zero-padded, longer input truncated. Only the
    /// non-negative frequency bins are returned: `(n + 1) / 2` of them, so the
    /// Nyquist bin of an even-length transform is excluded.
    pub fn analyze(&self, samples: &[f32], sample_rate: u32) -> SpectrumFrame {
        let mut buffer: Vec<Complex<f64>> = samples
            .iter()
            .take(self.window_size)
            .zip(&self.window)
            .map(|(&s, &w)| Complex::new(s as f64 * w, 0.0))
            .collect();

        buffer.resize(self.window_size, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        let bins = (self.window_size + 1) / 2;
        let resolution = sample_rate as f64 / self.window_size as f64;

        let frequencies = (0..bins).map(|bin| bin as f64 * resolution).collect();
        let magnitudes_db = buffer[..bins]
            .iter()
            .map(|c| 20.0 * (c.norm() + MAGNITUDE_EPSILON).log10())
            .collect();

        SpectrumFrame {
            frequencies,
            magnitudes_db,
        }
    }

    /// Width of one bin in Hz at the given sample rate
    pub fn bin_resolution(&self, sample_rate: u32) -> f64 {
        sample_rate as f64 / self.window_size as f64
    }
}

/// Inclusive frequency-range filter over a spectrum frame
pub fn extract_sub_band(frame: &SpectrumFrame, min_freq: f64, max_freq: f64) -> SpectrumFrame {
    frame.sub_band(min_freq, max_freq)
}
