//! Time formatting helpers for countdowns to election start and end.

use sonic_types::Timestamp;

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Countdown text from `now` to `target`; `"Time's up!"` once it has passed.
pub fn format_countdown(now: Timestamp, target: Timestamp) -> String {
    match target.secs_until(now) {
        0 => "Time's up!".to_string(),
        secs => format_duration(secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_each_magnitude() {
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(45 * 60 + 10), "45m 10s");
        assert_eq!(format_duration(5 * 3600 + 7 * 60), "5h 7m");
        assert_eq!(format_duration(2 * 86400 + 3 * 3600 + 59), "2d 3h");
    }

    #[test]
    fn countdown_stops_at_target() {
        let target = Timestamp::new(1_000);
        assert_eq!(format_countdown(Timestamp::new(940), target), "1m 0s");
        assert_eq!(format_countdown(Timestamp::new(1_000), target), "Time's up!");
        assert_eq!(format_countdown(Timestamp::new(5_000), target), "Time's up!");
    }
}
