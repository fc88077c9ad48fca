//! `/interval` argument parsing.

use std::{sync::OnceLock, time::Duration};

use regex::Regex;

use crate::formatting::format_duration;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IntervalError {
    #[error("invalid interval format. Examples: 5 (minutes), 5m, 1h, 30s, 1h30m")]
    Invalid,

    #[error("interval must be at least {}", format_duration(*.min))]
    TooShort { min: Duration },
}

fn unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)(ms|s|m|h)").expect("valid regex"))
}

fn full_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:\d+(?:\.\d+)?(?:ms|s|m|h))+$").expect("valid regex"))
}

/// Parse a bare integer as minutes, otherwise a sequence of `<number><unit>`
/// groups (`90s`, `1h30m`, `2.5m`).
pub fn parse_interval(input: &str) -> Result<Duration, IntervalError> {
    let s = input.trim().to_lowercase();

    if let Ok(minutes) = s.parse::<u64>() {
        return minutes
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or(IntervalError::Invalid);
    }

    if !full_re().is_match(&s) {
        return Err(IntervalError::Invalid);
    }

    let mut total = Duration::ZERO;
    for cap in unit_re().captures_iter(&s) {
        let value: f64 = cap[1].parse().map_err(|_| IntervalError::Invalid)?;
        let secs = match &cap[2] {
            "ms" => value / 1000.0,
            "s" => value,
            "m" => value * 60.0,
            "h" => value * 3600.0,
            _ => return Err(IntervalError::Invalid),
        };
        let part = Duration::try_from_secs_f64(secs).map_err(|_| IntervalError::Invalid)?;
        total = total.checked_add(part).ok_or(IntervalError::Invalid)?;
    }
    Ok(total)
}

/// Parse and enforce the configured minimum.
pub fn parse_interval_at_least(input: &str, min: Duration) -> Result<Duration, IntervalError> {
    let d = parse_interval(input)?;
    if d < min {
        return Err(IntervalError::TooShort { min });
    }
    Ok(d)
}
