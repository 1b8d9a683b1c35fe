//! Core types for the similarity pipeline
//!
//! This module defines the data structures that flow through each stage:
//! daily series from each source, joined days, aligned (normalized) records
//! and the final analysis result.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Commit count for one UTC calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub commits: u32,
}

/// Mean measured concentration for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyEnvironment {
    pub date: NaiveDate,
    pub mean_value: f64,
}

/// A day present in both series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JoinedDay {
    pub date: NaiveDate,
    pub commits: u32,
    pub mean_value: f64,
}

/// Joined day extended with both columns rescaled to 0-1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedRecord {
    /// Raw joined values, never rescaled
    #[serde(flatten)]
    pub day: JoinedDay,
    /// Min-max normalized commits (0-1)
    pub norm_commits: f64,
    /// Min-max normalized measurement (0-1)
    pub norm_value: f64,
}

/// Geographic coordinate of the measurement location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Smallest range covering every activity day, or `None` for an empty series
    pub fn covering(activity: &[DailyActivity]) -> Option<Self> {
        let start = activity.iter().map(|a| a.date).min()?;
        let end = activity.iter().map(|a| a.date).max()?;
        Some(Self { start, end })
    }
}

/// Why a correlation could not be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    TooFewPoints,
    ZeroVariance,
    /// Columns of different lengths
    LengthMismatch,
}

/// Pearson correlation between the raw columns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Correlation {
    Defined { value: f64 },
    Undefined { reason: UndefinedReason },
}

impl Correlation {
    pub fn value(&self) -> Option<f64> {
        match self {
            Correlation::Defined { value } => Some(*value),
            Correlation::Undefined { .. } => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Correlation::Defined { .. })
    }
}

/// Similarity classification shown next to the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityLabel {
    Strong,
    Weak,
    #[serde(rename = "none")]
    Unrelated,
    /// Correlation was undefined
    Undetermined,
}

impl SimilarityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityLabel::Strong => "strong",
            SimilarityLabel::Weak => "weak",
            SimilarityLabel::Unrelated => "none",
            SimilarityLabel::Undetermined => "undetermined",
        }
    }
}

/// Reportable conditions that did not stop the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisFlag {
    /// Commit column had zero variance; normalized to the degenerate constant
    DegenerateCommitScale,
    /// Measurement column had zero variance; normalized to the degenerate constant
    DegenerateValueScale,
    UndefinedCorrelation,
}

/// Where the analysed data came from and when
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisProvenance {
    pub run_id: String,
    pub subject: String,
    pub coordinates: Coordinates,
    /// Hourly metric averaged per day (e.g. "pm2_5")
    pub metric: String,
    pub fetched_at_utc: DateTime<Utc>,
    pub computed_at_utc: DateTime<Utc>,
    /// True when the joined data was served from the cache
    pub cache_hit: bool,
    pub engine_version: String,
}

/// Output of one analysis request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Aligned records ordered by date ascending
    pub records: Vec<AlignedRecord>,
    pub correlation: Correlation,
    pub label: SimilarityLabel,
    pub flags: Vec<AnalysisFlag>,
    pub provenance: AnalysisProvenance,
}

impl AnalysisResult {
    pub fn data_points(&self) -> usize {
        self.records.len()
    }

    /// Raw joined rows, without the normalized columns
    pub fn raw_table(&self) -> Vec<JoinedDay> {
        self.records.iter().map(|r| r.day).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_range_covering() {
        let activity = vec![
            DailyActivity {
                date: day(2024, 1, 5),
                commits: 1,
            },
            DailyActivity {
                date: day(2024, 1, 2),
                commits: 3,
            },
            DailyActivity {
                date: day(2024, 1, 9),
                commits: 2,
            },
        ];

        let range = DateRange::covering(&activity).unwrap();
        assert_eq!(range.start, day(2024, 1, 2));
        assert_eq!(range.end, day(2024, 1, 9));
        assert!(DateRange::covering(&[]).is_none());
    }

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates::new(37.7749, -122.4194).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, -180.5).is_valid());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_aligned_record_serializes_flat() {
        let record = AlignedRecord {
            day: JoinedDay {
                date: day(2024, 1, 1),
                commits: 4,
                mean_value: 12.5,
            },
            norm_commits: 0.0,
            norm_value: 1.0,
        };

        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["date"], "2024-01-01");
        assert_eq!(json["commits"], 4);
        assert_eq!(json["mean_value"], 12.5);
        assert_eq!(json["norm_value"], 1.0);
    }

    #[test]
    fn test_correlation_serialization() {
        let undefined = Correlation::Undefined {
            reason: UndefinedReason::ZeroVariance,
        };
        let json = serde_json::to_value(undefined).unwrap();
        assert_eq!(json["status"], "undefined");
        assert_eq!(json["reason"], "zero_variance");
        assert!(undefined.value().is_none());
    }

    #[test]
    fn test_label_serializes_as_str() {
        for label in [
            SimilarityLabel::Strong,
            SimilarityLabel::Weak,
            SimilarityLabel::Unrelated,
            SimilarityLabel::Undetermined,
        ] {
            assert_eq!(serde_json::to_value(label).unwrap(), label.as_str());
        }
        let parsed: SimilarityLabel = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(parsed, SimilarityLabel::Unrelated);
    }
}
