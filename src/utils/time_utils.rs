//! Timestamp helpers

use chrono::{DateTime, Utc};

/// Fixed-width UTC timestamp; lexicographic order equals chronological order
pub const SNAPSHOT_NAME_FORMAT: &str = "%Y%m%d_%H%M%S_%6f";

/// Name for a snapshot taken now
#[must_use]
pub fn snapshot_name() -> String {
    snapshot_name_at(Utc::now())
}

#[must_use]
pub fn snapshot_name_at(at: DateTime<Utc>) -> String {
    at.format(SNAPSHOT_NAME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn names_sort_chronologically() {
        let early = Utc.with_ymd_and_hms(2024, 1, 9, 23, 59, 59).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let a = snapshot_name_at(early);
        let b = snapshot_name_at(late);
        assert_eq!(a, "20240109_235959_000000");
        assert!(a < b);
    }
}
