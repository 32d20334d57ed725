use chrono::{DateTime, TimeDelta, Utc};

/// A category is due when it never ran or its interval has fully elapsed.
pub fn is_due(last_run: Option<DateTime<Utc>>, interval: TimeDelta, now: DateTime<Utc>) -> bool {
    last_run.is_none_or(|last| now - last >= interval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn never_run_is_due() {
        assert!(is_due(None, TimeDelta::hours(4), at(0, 0)));
    }

    #[test]
    fn due_exactly_at_interval_boundary() {
        let interval = TimeDelta::hours(4);
        assert!(!is_due(Some(at(8, 0)), interval, at(11, 59)));
        assert!(is_due(Some(at(8, 0)), interval, at(12, 0)));
    }

    #[test]
    fn clock_moving_backwards_is_not_due() {
        assert!(!is_due(Some(at(12, 0)), TimeDelta::minutes(30), at(11, 0)));
    }
}
