//! Lesson durations, sent as `"<hours>h <minutes>m"`.

use std::sync::OnceLock;

use regex::Regex;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)h (\d+)m$").expect("duration pattern is valid"))
}

/// Duration in minutes, or `None` when the text does not follow the pattern.
///
/// `None` is the only "unknown duration" value used by any entity.
pub fn parse_duration_minutes(text: &str) -> Option<u32> {
    let captures = pattern().captures(text.trim())?;
    let hours: u32 = captures[1].parse().ok()?;
    let minutes: u32 = captures[2].parse().ok()?;
    hours.checked_mul(60)?.checked_add(minutes)
}
