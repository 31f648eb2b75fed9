//! Binomial proportion statistics

/// z for a two-sided 95% interval
pub const Z_95: f64 = 1.959_963_984_540_054;

/// Wilson score interval for `successes` out of `trials`.
///
/// Returns `(0, 0)` for zero trials. Bounds always lie in `[0, 1]` and
/// bracket the point estimate.
///
/// # Example
/// ```
/// use crisis_simulator_core_rs::results::stats::{wilson_interval, Z_95};
///
/// let (low, high) = wilson_interval(50, 100, Z_95);
/// assert!(low < 0.5 && 0.5 < high);
/// assert!((low - 0.4038).abs() < 1e-3);
/// ```
pub fn wilson_interval(successes: usize, trials: usize, z: f64) -> (f64, f64) {
    if trials == 0 {
        return (0.0, 0.0);
    }
    let n = trials as f64;
    let p = successes as f64 / n;
    let z2 = z * z;

    let denominator = 1.0 + z2 / n;
    let centre = (p + z2 / (2.0 * n)) / denominator;
    let margin = z * ((p * (1.0 - p) / n) + z2 / (4.0 * n * n)).sqrt() / denominator;

    ((centre - margin).max(0.0), (centre + margin).min(1.0))
}

/// Mean of the values, `None` when empty
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
