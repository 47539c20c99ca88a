//! Shape-comparison primitives for price profiles.
//!
//! Stateless functions: synthetic triangular references, normalization,
//! cosine similarity and Euclidean distance. All are pure and safe to call
//! from any thread.

use cluster_core::{Error, Result};

/// Divide each value by the sum. Returns the zero vector when the sum is zero.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| v / total).collect()
}

/// Discrete triangular distribution of `length` points peaking at `peak_index`.
///
/// Ramps linearly up to the peak and back down, then normalizes to sum 1.
/// `peak_index == 0` gives a decreasing ramp, `peak_index == length - 1` an
/// increasing one, and `length <= 1` gives `[1.0]`.
pub fn triangular_distribution(length: usize, peak_index: usize) -> Result<Vec<f64>> {
    if length <= 1 {
        if peak_index != 0 {
            return Err(Error::out_of_range(peak_index, 1));
        }
        return Ok(vec![1.0]);
    }
    if peak_index >= length {
        return Err(Error::out_of_range(peak_index, length));
    }

    let rise = (peak_index + 1) as f64;
    let fall = (length - peak_index) as f64;
    let ramp: Vec<f64> = (0..length)
        .map(|i| {
            if i <= peak_index {
                (i + 1) as f64 / rise
            } else {
                (length - i) as f64 / fall
            }
        })
        .collect();

    Ok(normalize(&ramp))
}

/// Cosine of the angle between `a` and `b`.
///
/// Returns 0 when either vector is all zeros. Fails on unequal lengths.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::dimension_mismatch(a.len(), b.len()));
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a * norm_b).sqrt()).clamp(-1.0, 1.0))
}

/// Euclidean distance between `a` and `b`. Fails on unequal lengths.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::dimension_mismatch(a.len(), b.len()));
    }

    Ok(a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_triangular_symmetric() {
        let dist = triangular_distribution(5, 2).unwrap();

        assert_eq!(dist.len(), 5);
        assert_relative_eq!(dist.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(dist[0], dist[4], epsilon = 1e-15);
        assert_relative_eq!(dist[1], dist[3], epsilon = 1e-15);
        assert!(dist[2] > dist[1] && dist[1] > dist[0]);
        // Ramp 1/3, 2/3, 1, 2/3, 1/3 over a sum of 3
        assert_relative_eq!(dist[2], 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_triangular_peak_at_start() {
        let dist = triangular_distribution(5, 0).unwrap();

        assert!(dist.windows(2).all(|w| w[0] >= w[1]));
        assert_relative_eq!(dist.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_triangular_peak_at_end() {
        let dist = triangular_distribution(5, 4).unwrap();

        assert!(dist.windows(2).all(|w| w[0] <= w[1]));
        assert_relative_eq!(dist.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_triangular_degenerate_lengths() {
        assert_eq!(triangular_distribution(1, 0).unwrap(), vec![1.0]);
        assert_eq!(triangular_distribution(0, 0).unwrap(), vec![1.0]);
        assert!(matches!(
            triangular_distribution(1, 1),
            Err(Error::OutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_triangular_peak_out_of_range() {
        assert!(matches!(
            triangular_distribution(5, 5),
            Err(Error::OutOfRange { index: 5, len: 5 })
        ));
    }

    #[test]
    fn test_cosine_identical_and_opposite() {
        let v = vec![0.1, 0.4, 0.3, 0.2];
        let neg: Vec<f64> = v.iter().map(|x| -x).collect();

        assert_abs_diff_eq!(cosine_similarity(&v, &v).unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cosine_similarity(&v, &neg).unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).unwrap();
        assert!(sim.abs() < 1e-12);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_dimension_mismatch() {
        assert!(matches!(
            cosine_similarity(&[1.0, 2.0], &[1.0]),
            Err(Error::DimensionMismatch { left: 2, right: 1 })
        ));
    }

    #[test]
    fn test_euclidean() {
        let v = vec![0.25, 0.5, 0.25];
        assert_eq!(euclidean_distance(&v, &v).unwrap(), 0.0);

        // sqrt(9 + 16) = 5
        let d = euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
        assert!((d - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_euclidean_dimension_mismatch() {
        assert!(matches!(
            euclidean_distance(&[1.0], &[1.0, 2.0, 3.0]),
            Err(Error::DimensionMismatch { left: 1, right: 3 })
        ));
    }

    #[test]
    fn test_normalize() {
        let n = normalize(&[1.0, 3.0]);
        assert_eq!(n, vec![0.25, 0.75]);
        assert_eq!(normalize(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_profile_against_reference() {
        // A profile shaped exactly like the reference matches it.
        let reference = triangular_distribution(7, 3).unwrap();
        let profile = normalize(&[1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0]);

        assert_abs_diff_eq!(cosine_similarity(&profile, &reference).unwrap(), 1.0, epsilon = 1e-12);
        assert!(euclidean_distance(&profile, &reference).unwrap() < 1e-12);
    }
}
