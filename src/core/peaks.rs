// src/core/peaks.rs
//
// Peak picking and spectral feature extraction over the ultrasonic sub-band.

use std::cmp::Ordering;

use super::dsp::stats::{
    max_value, mean, min_max_normalize, population_std, spectral_centroid, spectral_flatness,
    spectral_rolloff,
};
use super::dsp::SpectrumFrame;
use crate::config::DetectionSettings;
use crate::detection::FeatureSet;

/// Fraction of cumulative magnitude used for the rolloff index
const ROLLOFF_PERCENT: f64 = 0.85;

/// Finds significant local maxima in a sub-band
#[derive(Debug, Clone)]
pub struct PeakExtractor {
    threshold_db: f64,
    min_height: f64,
    min_distance: usize,
}

impl PeakExtractor {
    pub fn new(threshold_db: f64, min_height: f64, min_distance: usize) -> Self {
        Self {
            threshold_db,
            min_height,
            min_distance: min_distance.max(1),
        }
    }

    pub fn from_settings(settings: &DetectionSettings) -> Self {
        Self::new(
            settings.threshold_db,
            settings.min_peak_height,
            settings.min_peak_distance,
        )
    }

    /// Indices of significant peaks, ascending.
    ///
    /// Candidates are local maxima of the min-max normalized magnitudes with
    /// normalized height >= `min_height`, thinned so that no two survivors are
    /// closer than `min_distance` bins (the higher one wins, the later one on a
    /// tie). Survivors must also exceed `threshold_db` in raw dB. A flat band
    /// has no peaks.
    pub fn find_peaks(&self, sub_band: &SpectrumFrame) -> Vec<usize> {
        let magnitudes = &sub_band.magnitudes_db;
        let Some(normalized) = min_max_normalize(magnitudes) else {
            return Vec::new();
        };

        let candidates: Vec<usize> = local_maxima(&normalized)
            .into_iter()
            .filter(|&i| normalized[i] >= self.min_height)
            .collect();

        select_by_distance(&candidates, &normalized, self.min_distance)
            .into_iter()
            .filter(|&i| magnitudes[i] > self.threshold_db)
            .collect()
    }

    pub fn threshold_db(&self) -> f64 {
        self.threshold_db
    }
}

/// Shape statistics of a sub-band's dB magnitudes
pub fn compute_features(sub_band: &SpectrumFrame) -> FeatureSet {
    let magnitudes = &sub_band.magnitudes_db;
    if magnitudes.is_empty() {
        return FeatureSet::default();
    }

    FeatureSet {
        peak_magnitude: max_value(magnitudes),
        mean_magnitude: mean(magnitudes),
        std_magnitude: population_std(magnitudes),
        spectral_centroid: spectral_centroid(magnitudes),
        spectral_rolloff: spectral_rolloff(magnitudes, ROLLOFF_PERCENT),
        spectral_flatness: spectral_flatness(magnitudes),
    }
}

/// Strict local maxima; a flat-topped peak reports its middle sample.
/// The first and last samples are never peaks.
fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }

    let last = x.len() - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                let right = ahead - 1;
                peaks.push((i + right) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }

    peaks
}

/// Greedy distance suppression, highest peaks first; equal heights favour
/// the higher bin
fn select_by_distance(peaks: &[usize], heights: &[f64], min_distance: usize) -> Vec<usize> {
    if min_distance <= 1 || peaks.len() < 2 {
        return peaks.to_vec();
    }

    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| {
        heights[peaks[b]]
            .partial_cmp(&heights[peaks[a]])
            .unwrap_or(Ordering::Equal)
            .then(b.cmp(&a))
    });

    let mut keep = vec![true; peaks.len()];
    for &i in &order {
        if !keep[i] {
            continue;
        }

        let mut j = i;
        while j > 0 && peaks[i] - peaks[j - 1] < min_distance {
            keep[j - 1] = false;
            j -= 1;
        }

        let mut j = i + 1;
        while j < peaks.len() && peaks[j] - peaks[i] < min_distance {
            keep[j] = false;
            j += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}
