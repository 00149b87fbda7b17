//! Interval overlap on a single date.
//!
//! Adjacent intervals (where one ends exactly when another starts) do NOT overlap.

use chrono::NaiveDateTime;

/// Whether `[a_start, a_end)` and `[b_start, b_end)` intersect.
///
/// Two intervals overlap iff `a_start < b_end && b_start < a_end`. The strict
/// comparison on both sides excludes back-to-back slots.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && b_start < a_end
}

/// Length of the shared part of two intervals in whole minutes, 0 when disjoint.
///
/// The overlap is `min(a_end, b_end) - max(a_start, b_start)`.
pub fn overlap_minutes(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> i64 {
    if !overlaps(a_start, a_end, b_start, b_end) {
        return 0;
    }
    (a_end.min(b_end) - a_start.max(b_start)).num_minutes()
}
