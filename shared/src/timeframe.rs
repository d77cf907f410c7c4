//! Time frame labels
//!
//! Older clients send bare minute counts ("30"), the tables store labels
//! ("30m", "1H", "1D").

/// Map a legacy numeric token to the stored label. Anything unknown is
/// assumed to already be a stored label and is returned untouched.
pub fn normalize_time_frame(value: &str) -> &str {
    match value {
        "1" => "1m",
        "5" => "5m",
        "15" => "15m",
        "30" => "30m",
        "45" => "45m",
        "60" => "1H",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_tokens() {
        assert_eq!(normalize_time_frame("1"), "1m");
        assert_eq!(normalize_time_frame("5"), "5m");
        assert_eq!(normalize_time_frame("15"), "15m");
        assert_eq!(normalize_time_frame("30"), "30m");
        assert_eq!(normalize_time_frame("45"), "45m");
        assert_eq!(normalize_time_frame("60"), "1H");
    }

    #[test]
    fn test_passthrough() {
        for label in ["1D", "1W", "240", "", "30m", " 30"] {
            assert_eq!(normalize_time_frame(label), label);
        }
    }

    #[test]
    fn test_idempotent() {
        for input in ["1", "5", "15", "30", "45", "60", "1D", "4H"] {
            let once = normalize_time_frame(input);
            assert_eq!(normalize_time_frame(once), once);
        }
    }
}
