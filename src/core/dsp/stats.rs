//! Statistical and spectral shape functions over sub-band magnitudes.
//!
//! All functions return a defined fallback on empty or degenerate input and
//! never produce NaN or infinity for finite input.

/// Guard added to means and products that could otherwise collapse to zero
pub const STATS_EPSILON: f64 = 1e-10;

/// Arithmetic mean (0.0 for empty input)
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation (0.0 for empty input)
pub fn population_std(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / data.len() as f64;
    variance.sqrt()
}

/// Largest value (0.0 for empty input)
pub fn max_value(data: &[f64]) -> f64 {
    data.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

/// Min-max scaling to [0, 1]; `None` when the range is zero
pub fn min_max_normalize(data: &[f64]) -> Option<Vec<f64>> {
    let min = data.iter().copied().reduce(f64::min)?;
    let max = data.iter().copied().reduce(f64::max)?;
    let range = max - min;
    if !(range > 0.0) || !range.is_finite() {
        return None;
    }
    Some(data.iter().map(|&x| (x - min) / range).collect())
}

/// Magnitude-weighted mean bin index.
///
/// Works on the values as given (dB in the pipeline); a zero sum yields 0.0.
pub fn spectral_centroid(magnitudes: &[f64]) -> f64 {
    let total: f64 = magnitudes.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return 0.0;
    }

    let weighted: f64 = magnitudes
        .iter()
        .enumerate()
        .map(|(i, &m)| m * i as f64)
        .sum();

    weighted / total
}

/// Smallest index whose cumulative sum reaches `percentile` of the total,
/// or the last index if none does
pub fn spectral_rolloff(magnitudes: &[f64], percentile: f64) -> f64 {
    if magnitudes.is_empty() {
        return 0.0;
    }

    let total: f64 = magnitudes.iter().sum();
    let threshold = percentile * total;

    let mut cumulative = 0.0;
    for (i, &m) in magnitudes.iter().enumerate() {
        cumulative += m;
        if cumulative >= threshold {
            return i as f64;
        }
    }

    (magnitudes.len() - 1) as f64
}

/// Spectral flatness (Wiener entropy) of dB magnitudes.
///
/// Values are converted back to linear amplitude first. The geometric mean
/// is taken in the log domain so long sub-bands cannot underflow.
/// Returns 1.0 for a perfectly flat band, approaching 0.0 for tonal content.
pub fn spectral_flatness(magnitudes_db: &[f64]) -> f64 {
    if magnitudes_db.is_empty() {
        return 0.0;
    }

    let n = magnitudes_db.len() as f64;
    let linear: Vec<f64> = magnitudes_db
        .iter()
        .map(|&db| 10f64.powf(db / 20.0))
        .collect();

    let log_sum: f64 = linear.iter().map(|&m| (m + STATS_EPSILON).ln()).sum();
    let geometric_mean = (log_sum / n).exp();
    let arithmetic_mean = linear.iter().sum::<f64>() / n;

    let flatness = geometric_mean / (arithmetic_mean + STATS_EPSILON);
    if flatness.is_finite() {
        flatness
    } else {
        0.0
    }
}
