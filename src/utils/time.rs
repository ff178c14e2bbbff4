/// Formats a second count as a `MM:SS` countdown clock.
/// Negative input clamps to zero; minutes are not capped at 59.
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(300), "05:00");
        assert_eq!(format_clock(3725), "62:05");
        assert_eq!(format_clock(-3), "00:00");
    }
}
