//! Wilson score lower bound.
//!
//! Candidates are compared by how sure we can be that they usually work,
//! not by their raw hit rate: 2/2 is a worse bet than 95/100.

/// Default z-value (~95% interval).
pub const DEFAULT_Z: f64 = 1.96;

/// Lower bound of the Wilson score interval for `successes` out of
/// `successes + failures` trials.
///
/// Returns 0.0 with no trials. Holding the success ratio fixed, the bound
/// rises strictly with the number of trials.
pub fn wilson_lower_bound(successes: u64, failures: u64, z: f64) -> f64 {
    let n = successes + failures;
    if n == 0 {
        return 0.0;
    }

    let n = n as f64;
    let p = successes as f64 / n;
    let z2 = z * z;

    let centre = p + z2 / (2.0 * n);
    let margin = z * ((p * (1.0 - p) + z2 / (4.0 * n)) / n).sqrt();
    let lower = (centre - margin) / (1.0 + z2 / n);

    lower.clamp(0.0, 1.0)
}

/// [`wilson_lower_bound`] at [`DEFAULT_Z`].
pub fn confidence(successes: u64, failures: u64) -> f64 {
    wilson_lower_bound(successes, failures, DEFAULT_Z)
}
