//! Pure policy checks consulted before any outbound write.

mod duplicate;
mod rate;

pub use duplicate::{DUPLICATE_WINDOW_DAYS, PREFIX_CHARS, fingerprint, is_duplicate};
pub use rate::{check_rate_limit, recently_engaged};

use chrono::{DateTime, TimeDelta, Utc};

/// Start of the trailing `window` ending at `now`, clamped to the earliest
/// representable instant for windows longer than chrono's range.
fn window_start(now: DateTime<Utc>, window: TimeDelta) -> DateTime<Utc> {
    now.checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
