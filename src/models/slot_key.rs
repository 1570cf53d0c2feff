pub const DEFAULT_BOOKING_TRIGGER: &str = "我想預約";
pub const DEFAULT_AVAILABILITY_TRIGGER: &str = "我要預約";

/// The literal phrases that route inbound text.
#[derive(Debug, Clone, PartialEq)]
pub struct Triggers {
    pub booking: String,
    pub availability: String,
}

impl Default for Triggers {
    fn default() -> Self {
        Self {
            booking: DEFAULT_BOOKING_TRIGGER.to_string(),
            availability: DEFAULT_AVAILABILITY_TRIGGER.to_string(),
        }
    }
}

impl Triggers {
    /// Canonical slot key: trigger prefix removed, whitespace trimmed and
    /// collapsed. Date and time are both kept, so `04/25 13:00` and
    /// `04/26 13:00` never collide.
    pub fn normalize(&self, label: &str) -> String {
        let mut rest = label.trim();
        for prefix in [self.booking.as_str(), self.availability.as_str()] {
            if prefix.is_empty() {
                continue;
            }
            if let Some(stripped) = rest.strip_prefix(prefix) {
                rest = stripped.trim_start();
                break;
            }
        }
        rest.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Text a slot button sends back when tapped.
    pub fn booking_text(&self, slot: &str) -> String {
        format!("{} {}", self.booking, self.normalize(slot))
    }
}

/// Splits a normalized key into its date and time-of-day tokens.
pub fn split_slot(key: &str) -> (&str, &str) {
    match key.split_once(' ') {
        Some((date, time)) => (date, time.trim()),
        None => (key, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_booking_prefix() {
        let t = Triggers::default();
        assert_eq!(t.normalize("我想預約 04/25 13:00"), "04/25 13:00");
        assert_eq!(t.normalize("我想預約04/25 13:00"), "04/25 13:00");
    }

    #[test]
    fn test_normalize_trims_and_collapses() {
        let t = Triggers::default();
        assert_eq!(t.normalize("  04/25   13:00 "), "04/25 13:00");
        assert_eq!(t.normalize("04/25\t13:00"), "04/25 13:00");
    }

    #[test]
    fn test_normalize_keeps_date() {
        let t = Triggers::default();
        assert_ne!(t.normalize("04/25 13:00"), t.normalize("04/26 13:00"));
    }

    #[test]
    fn test_normalize_only_strips_leading_prefix() {
        let t = Triggers::default();
        assert_eq!(t.normalize("04/25 我想預約"), "04/25 我想預約");
    }

    #[test]
    fn test_booking_text() {
        let t = Triggers::default();
        assert_eq!(t.booking_text(" 04/25 13:00"), "我想預約 04/25 13:00");
    }

    #[test]
    fn test_split_slot() {
        assert_eq!(split_slot("04/25 13:00"), ("04/25", "13:00"));
        assert_eq!(split_slot("04/25"), ("04/25", ""));
    }
}
