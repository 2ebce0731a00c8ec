//! Small shared helpers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in milliseconds. All persisted timestamps use
/// this representation.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_millis_is_monotonic_enough() {
        let a = now_millis();
        let b = now_millis();
        assert!(a > 1_600_000_000_000);
        assert!(b >= a);
    }
}
