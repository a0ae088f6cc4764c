//! Location and spread estimators
//!
//! All functions take a slice of finite values. Order statistics expect the
//! slice sorted ascending.

use mixdist_core::MAD_SCALE;
use ordered_float::OrderedFloat;

pub fn sort_values(values: &mut [f64]) {
    values.sort_unstable_by_key(|v| OrderedFloat(*v));
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); 0 for fewer than two values
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    if values.len() < 2 {
        return Some(0.0);
    }
    let ss: f64 = values.iter().map(|x| (x - m) * (x - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Quantile `q` in `[0, 1]` of sorted values, linear interpolation between
/// order statistics
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn median_sorted(sorted: &[f64]) -> Option<f64> {
    quantile_sorted(sorted, 0.5)
}

/// Scaled median absolute deviation around `center`
pub fn mad(values: &[f64], center: f64) -> Option<f64> {
    let mut deviations: Vec<f64> = values.iter().map(|x| (x - center).abs()).collect();
    sort_values(&mut deviations);
    median_sorted(&deviations).map(|m| m * MAD_SCALE)
}

pub fn iqr_sorted(sorted: &[f64]) -> Option<f64> {
    Some(quantile_sorted(sorted, 0.75)? - quantile_sorted(sorted, 0.25)?)
}

/// Symmetric trimming: drops `floor(fraction * n)` values from each tail
pub fn trim_sorted(sorted: &[f64], fraction: f64) -> &[f64] {
    let k = (fraction * sorted.len() as f64).floor() as usize;
    if 2 * k >= sorted.len() {
        return sorted;
    }
    &sorted[k..sorted.len() - k]
}
