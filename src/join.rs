//! Temporal join
//!
//! Inner-joins the activity and environment series on calendar date.
//! Days present in only one series are dropped.

use crate::types::{DailyActivity, DailyEnvironment, JoinedDay};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Inner join on exact date equality, ordered by date ascending.
///
/// Input order does not matter. Duplicate dates in `environment` keep the
/// last value seen.
pub fn join_daily(activity: &[DailyActivity], environment: &[DailyEnvironment]) -> Vec<JoinedDay> {
    let by_date: HashMap<NaiveDate, f64> = environment
        .iter()
        .map(|e| (e.date, e.mean_value))
        .collect();

    let mut joined: Vec<JoinedDay> = activity
        .iter()
        .filter_map(|a| {
            by_date.get(&a.date).map(|&mean_value| JoinedDay {
                date: a.date,
                commits: a.commits,
                mean_value,
            })
        })
        .collect();

    joined.sort_by_key(|d| d.date);
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn activity(days: &[(u32, u32)]) -> Vec<DailyActivity> {
        days.iter()
            .map(|&(d, commits)| DailyActivity {
                date: day(d),
                commits,
            })
            .collect()
    }

    fn environment(days: &[(u32, f64)]) -> Vec<DailyEnvironment> {
        days.iter()
            .map(|&(d, mean_value)| DailyEnvironment {
                date: day(d),
                mean_value,
            })
            .collect()
    }

    #[test]
    fn test_inner_join_drops_unmatched() {
        let a = activity(&[(1, 2), (2, 8), (3, 5), (4, 1), (5, 9)]);
        let e = environment(&[(2, 50.0), (5, 30.0), (7, 11.0)]);

        let joined = join_daily(&a, &e);
        assert_eq!(joined.len(), 2);
        assert!(joined.len() <= a.len().min(e.len()));
        assert_eq!(
            joined[0],
            JoinedDay {
                date: day(2),
                commits: 8,
                mean_value: 50.0
            }
        );
        assert_eq!(joined[1].date, day(5));

        for record in &joined {
            assert!(a.iter().any(|x| x.date == record.date));
            assert!(e.iter().any(|x| x.date == record.date));
        }
    }

    #[test]
    fn test_output_sorted_regardless_of_input_order() {
        let a = activity(&[(3, 5), (1, 2), (2, 8)]);
        let e = environment(&[(2, 50.0), (3, 30.0), (1, 10.0)]);

        let dates: Vec<NaiveDate> = join_daily(&a, &e).iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
    }

    #[test]
    fn test_disjoint_series() {
        let a = activity(&[(1, 2)]);
        let e = environment(&[(2, 10.0)]);
        assert!(join_daily(&a, &e).is_empty());
        assert!(join_daily(&[], &e).is_empty());
    }
}
