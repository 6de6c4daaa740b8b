use chrono::NaiveDate;

use crate::model::StreakState;

/// Minimum accuracy (percent) that keeps a daily streak alive.
pub const STREAK_ACCURACY_THRESHOLD: f64 = 70.0;

/// Advance or reset a streak for `today`.
///
/// A second call on the same calendar day returns the state unchanged, so a
/// burst of attempts counts as one day of activity. Any other day counts as
/// a new one, including a day before `last_updated` when the clock moved back.
#[must_use]
pub fn touch(streak: StreakState, accuracy_now: f64, today: NaiveDate) -> StreakState {
    if streak.last_updated == Some(today) {
        return streak;
    }

    let mut next = streak;
    if accuracy_now >= STREAK_ACCURACY_THRESHOLD {
        next.current = next.current.saturating_add(1);
        next.best = next.best.max(next.current);
    } else {
        next.current = 0;
    }
    next.last_updated = Some(today);
    next
}
