//! Min-max normalization
//!
//! This module rescales the joined columns onto a common 0-1 scale so the two
//! series can be overlaid.
//! - Each column is scaled independently against its own min and max
//! - Raw values are carried through untouched
//! - A zero-variance column maps to [`DEGENERATE_SCALE_VALUE`] and is flagged

use crate::types::{AlignedRecord, AnalysisFlag, JoinedDay};

/// Value assigned to every row of a column whose min equals its max
pub const DEGENERATE_SCALE_VALUE: f64 = 0.5;

/// Normalized records plus any degenerate-scale flags
#[derive(Debug, Clone)]
pub struct NormalizedSeries {
    pub records: Vec<AlignedRecord>,
    pub flags: Vec<AnalysisFlag>,
}

/// Normalizer for converting joined days to aligned records
pub struct Normalizer;

impl Normalizer {
    /// Normalize both columns of the joined dataset
    pub fn normalize(days: &[JoinedDay]) -> NormalizedSeries {
        let commits: Vec<f64> = days.iter().map(|d| d.commits as f64).collect();
        let values: Vec<f64> = days.iter().map(|d| d.mean_value).collect();

        let commit_scale = MinMax::fit(&commits);
        let value_scale = MinMax::fit(&values);

        let mut flags = Vec::new();
        if commit_scale.is_none() {
            flags.push(AnalysisFlag::DegenerateCommitScale);
        }
        if value_scale.is_none() {
            flags.push(AnalysisFlag::DegenerateValueScale);
        }

        let records = days
            .iter()
            .zip(commits.iter().zip(values.iter()))
            .map(|(day, (&c, &v))| AlignedRecord {
                day: *day,
                norm_commits: scale(commit_scale, c),
                norm_value: scale(value_scale, v),
            })
            .collect();

        NormalizedSeries { records, flags }
    }
}

/// Observed range of a column with non-zero width
#[derive(Debug, Clone, Copy, PartialEq)]
struct MinMax {
    min: f64,
    max: f64,
}

impl MinMax {
    /// `None` for an empty or constant column
    fn fit(column: &[f64]) -> Option<Self> {
        let min = column.iter().copied().reduce(f64::min)?;
        let max = column.iter().copied().reduce(f64::max)?;
        (max > min).then_some(Self { min, max })
    }
}

fn scale(range: Option<MinMax>, x: f64) -> f64 {
    match range {
        Some(MinMax { min, max }) => ((x - min) / (max - min)).clamp(0.0, 1.0),
        None => DEGENERATE_SCALE_VALUE,
    }
}
