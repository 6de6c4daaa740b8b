/// Bonus points per day of active streak.
const STREAK_BONUS_PER_DAY: f64 = 2.0;

/// Confidence score in `[0, 100]`: accuracy plus a streak bonus, capped.
#[must_use]
pub fn estimate(accuracy: f64, streak_current: u32) -> f64 {
    let raw = accuracy + STREAK_BONUS_PER_DAY * f64::from(streak_current);
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, 100.0)
}
