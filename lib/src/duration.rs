use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_MINUTES: u32 = 60;

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

// Authored durations are free text ("45 min", "about an hour"). The first
// embedded integer wins; anything else falls back to the default.
pub fn parse_minutes(raw: Option<&str>) -> u32 {
    raw.and_then(|text| DIGITS.find(text))
        .and_then(|digits| digits.as_str().parse().ok())
        .unwrap_or(DEFAULT_MINUTES)
}
