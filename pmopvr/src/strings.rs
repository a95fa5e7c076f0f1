//! Localized message ids used by the coordination layer.
//!
//! Looking strings up is the job of an external [`Localizer`]. The
//! [`DefaultStrings`] table provides the English texts so that the layer
//! stays usable without one.

/// "Add-on will be disabled."
pub const MSG_ADDON_DISABLED: u32 = 24070;
/// "Server is unreachable"
pub const MSG_SERVER_UNREACHABLE: u32 = 35505;
/// "Server does not respond properly"
pub const MSG_SERVER_MISMATCH: u32 = 35506;
/// "Server version is not compatible"
pub const MSG_VERSION_MISMATCH: u32 = 35507;
/// "Access denied"
pub const MSG_ACCESS_DENIED: u32 = 35508;
/// "Connecting"
pub const MSG_CONNECTING: u32 = 35509;
/// "Connection lost"
pub const MSG_CONNECTION_LOST: u32 = 36030;
/// "Connection established"
pub const MSG_CONNECTION_ESTABLISHED: u32 = 36034;
/// "%i days"
pub const MSG_DAYS: u32 = 17999;
pub const MSG_TIMER_ONE_TIME: u32 = 820;
pub const MSG_TIMER_ONE_TIME_GUIDE: u32 = 821;
pub const MSG_TIMER_RULE: u32 = 822;
pub const MSG_TIMER_RULE_GUIDE: u32 = 823;

/// Lookup of a user-visible string by numeric id.
pub trait Localizer: Send + Sync {
    fn localize(&self, id: u32) -> String;
}

/// Built-in English strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStrings;

impl DefaultStrings {
    fn text(id: u32) -> Option<&'static str> {
        let text = match id {
            MSG_ADDON_DISABLED => "Add-on will be disabled.",
            MSG_SERVER_UNREACHABLE => "Server is unreachable",
            MSG_SERVER_MISMATCH => "Server does not respond properly",
            MSG_VERSION_MISMATCH => "Server version is not compatible",
            MSG_ACCESS_DENIED => "Access denied",
            MSG_CONNECTING => "Connecting",
            MSG_CONNECTION_LOST => "Connection lost",
            MSG_CONNECTION_ESTABLISHED => "Connection established",
            MSG_DAYS => "%i days",
            MSG_TIMER_ONE_TIME => "One time",
            MSG_TIMER_ONE_TIME_GUIDE => "One time (guide-based)",
            MSG_TIMER_RULE => "Timer rule",
            MSG_TIMER_RULE_GUIDE => "Timer rule (guide-based)",
            _ => return None,
        };
        Some(text)
    }
}

impl Localizer for DefaultStrings {
    fn localize(&self, id: u32) -> String {
        match Self::text(id) {
            Some(text) => text.to_string(),
            None => format!("#{id}"),
        }
    }
}

/// Replaces the first `%i`, `%d` or `%s` placeholder of a localized
/// pattern with `value`.
pub fn format_count(pattern: &str, value: i32) -> String {
    for placeholder in ["%i", "%d", "%s"] {
        if pattern.contains(placeholder) {
            return pattern.replacen(placeholder, &value.to_string(), 1);
        }
    }
    format!("{pattern} {value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_strings() {
        let strings = DefaultStrings;
        assert_eq!(strings.localize(MSG_CONNECTION_LOST), "Connection lost");
        assert_eq!(strings.localize(1), "#1");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count("%i days", 3), "3 days");
        assert_eq!(format_count("%s jours", 12), "12 jours");
        assert_eq!(format_count("days", 2), "days 2");
    }
}
