//! Similarity scoring
//!
//! Pearson correlation over the raw joined columns, and the label shown next
//! to it. Scoring never looks at the normalized columns.

use crate::types::{Correlation, JoinedDay, SimilarityLabel, UndefinedReason};

/// |r| above this is a strong similarity
pub const STRONG_THRESHOLD: f64 = 0.5;

/// |r| above this (and not strong) is a weak similarity
pub const WEAK_THRESHOLD: f64 = 0.3;

/// Pearson correlation between raw commits and raw mean values
pub fn score(days: &[JoinedDay]) -> Correlation {
    let commits: Vec<f64> = days.iter().map(|d| d.commits as f64).collect();
    let values: Vec<f64> = days.iter().map(|d| d.mean_value).collect();
    pearson(&commits, &values)
}

/// Pearson correlation of two equal-length columns.
///
/// Undefined for columns of different lengths, below two points, or when
/// either column has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Correlation {
    if xs.len() != ys.len() {
        return Correlation::Undefined {
            reason: UndefinedReason::LengthMismatch,
        };
    }
    let n = xs.len();
    if n < 2 {
        return Correlation::Undefined {
            reason: UndefinedReason::TooFewPoints,
        };
    }
    // Decided on the values themselves; a rounded mean leaves a tiny
    // non-zero variance for constant decimal columns.
    if is_constant(xs) || is_constant(ys) {
        return Correlation::Undefined {
            reason: UndefinedReason::ZeroVariance,
        };
    }

    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    if !r.is_finite() {
        return Correlation::Undefined {
            reason: UndefinedReason::ZeroVariance,
        };
    }

    Correlation::Defined {
        value: r.clamp(-1.0, 1.0),
    }
}

fn is_constant(column: &[f64]) -> bool {
    column.iter().all(|&v| v == column[0])
}

/// Map a correlation onto the strong / weak / none scale
pub fn classify(correlation: &Correlation) -> SimilarityLabel {
    match correlation.value() {
        Some(r) if r.abs() > STRONG_THRESHOLD => SimilarityLabel::Strong,
        Some(r) if r.abs() > WEAK_THRESHOLD => SimilarityLabel::Weak,
        Some(_) => SimilarityLabel::Unrelated,
        None => SimilarityLabel::Undetermined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn joined(rows: &[(u32, f64)]) -> Vec<JoinedDay> {
        rows.iter()
            .enumerate()
            .map(|(i, &(commits, mean_value))| JoinedDay {
                date: NaiveDate::from_ymd_opt(2024, 1, i as u32 + 1).unwrap(),
                commits,
                mean_value,
            })
            .collect()
    }

    fn value(c: Correlation) -> f64 {
        c.value().expect("correlation should be defined")
    }

    #[test]
    fn test_perfect_positive() {
        let days = joined(&[(2, 10.0), (8, 50.0), (5, 30.0)]);
        assert!((value(score(&days)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_negative() {
        let days = joined(&[(2, 50.0), (8, 10.0), (5, 30.0)]);
        assert!((value(score(&days)) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_known_value() {
        // x = 1..5, y = 2,4,5,4,5 -> r = 0.7745966...
        let r = value(pearson(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 5.0, 4.0, 5.0]));
        assert!((r - 0.774_596_669_2).abs() < 1e-9);
    }

    #[test]
    fn test_invariant_under_positive_affine_rescaling() {
        let xs = [3.0, 7.0, 1.0, 9.0, 4.0, 6.0];
        let ys = [12.0, 30.5, 8.25, 19.0, 22.0, 15.5];
        let base = value(pearson(&xs, &ys));

        let xs_scaled: Vec<f64> = xs.iter().map(|x| 4.0 * x + 100.0).collect();
        let ys_scaled: Vec<f64> = ys.iter().map(|y| 0.01 * y - 3.0).collect();

        let rescaled = value(pearson(&xs_scaled, &ys_scaled));
        assert!((base - rescaled).abs() < 1e-9);
        assert!((-1.0..=1.0).contains(&base));
    }

    #[test]
    fn test_too_few_points() {
        assert_eq!(
            pearson(&[1.0], &[2.0]),
            Correlation::Undefined {
                reason: UndefinedReason::TooFewPoints
            }
        );
        assert_eq!(
            score(&[]),
            Correlation::Undefined {
                reason: UndefinedReason::TooFewPoints
            }
        );
    }

    #[test]
    fn test_zero_variance() {
        let days = joined(&[(4, 10.0), (4, 50.0), (4, 30.0)]);
        assert_eq!(
            score(&days),
            Correlation::Undefined {
                reason: UndefinedReason::ZeroVariance
            }
        );
    }

    #[test]
    fn test_constant_decimal_column_is_zero_variance() {
        for v in [0.1, 0.7, 3.3, 12.7] {
            let days = joined(&[(2, v), (8, v), (5, v)]);
            assert_eq!(
                score(&days),
                Correlation::Undefined {
                    reason: UndefinedReason::ZeroVariance
                },
                "constant value {v}"
            );
            assert_eq!(classify(&score(&days)), SimilarityLabel::Undetermined);
        }
    }

    #[test]
    fn test_mismatched_lengths_are_undefined() {
        assert_eq!(
            pearson(&[1.0, 2.0, 3.0], &[4.0, 5.0]),
            Correlation::Undefined {
                reason: UndefinedReason::LengthMismatch
            }
        );
    }

    #[test]
    fn test_classification_thresholds() {
        let label = |r: f64| classify(&Correlation::Defined { value: r });
        assert_eq!(label(0.9), SimilarityLabel::Strong);
        assert_eq!(label(-0.51), SimilarityLabel::Strong);
        assert_eq!(label(0.5), SimilarityLabel::Weak);
        assert_eq!(label(-0.4), SimilarityLabel::Weak);
        assert_eq!(label(0.3), SimilarityLabel::Unrelated);
        assert_eq!(label(0.0), SimilarityLabel::Unrelated);
        assert_eq!(
            classify(&Correlation::Undefined {
                reason: UndefinedReason::ZeroVariance
            }),
            SimilarityLabel::Undetermined
        );
    }
}
