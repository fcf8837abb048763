use chrono::{DateTime, Utc};

/// Whether an event still accepts new or updated picks.
///
/// The deadline is an exclusive upper bound: at exactly `now == deadline`
/// betting is closed.
pub fn is_open(deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now < deadline
}

/// Whether other participants' picks for an event may be revealed.
/// Picks become visible the moment betting locks.
pub fn picks_visible(deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    !is_open(deadline, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn deadline() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 12, 20, 0, 0).unwrap()
    }

    #[test]
    fn test_open_before_deadline() {
        assert!(is_open(deadline(), deadline() - Duration::hours(1)));
        assert!(is_open(deadline(), deadline() - Duration::seconds(1)));
    }

    #[test]
    fn test_closed_at_exact_deadline() {
        assert!(!is_open(deadline(), deadline()));
    }

    #[test]
    fn test_closed_after_deadline() {
        assert!(!is_open(deadline(), deadline() + Duration::seconds(1)));
        assert!(!is_open(deadline(), deadline() + Duration::days(3)));
    }

    #[test]
    fn test_visibility_is_inverse_of_openness() {
        let d = deadline();
        assert!(!picks_visible(d, d - Duration::seconds(1)));
        assert!(picks_visible(d, d));
        assert!(picks_visible(d, d + Duration::seconds(1)));
    }
}
