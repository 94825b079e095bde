//! Date helper functions

use chrono::{DateTime, TimeZone};

/// Format a date using a Moment.js-style format string
///
/// Supported tokens: `YYYY`, `MM`, `M`, `DD`, `D`, `HH`, `mm`, `ss`.
///
/// # Examples
/// ```ignore
/// format_date(&date, "YYYY년 M월 D일") // -> "2020년 7월 1일"
/// ```
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format(&moment_to_chrono_format(format)).to_string()
}

/// Formal `YYYY-MM-DD` date used in `<time datetime>`
pub fn date_formal<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%d").to_string()
}

/// Long Korean date (`2020년 7월 1일`)
pub fn date_long_ko<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format_date(date, "YYYY년 M월 D일")
}

/// Relative time in Korean, Moment.js `fromNow` thresholds
pub fn from_now_ko<Tz: TimeZone, Now: TimeZone>(
    date: &DateTime<Tz>,
    now: &DateTime<Now>,
) -> String {
    let duration = now.clone().signed_duration_since(date.clone());
    let seconds = duration.num_seconds();

    let (amount, future) = if seconds < 0 {
        (-seconds, true)
    } else {
        (seconds, false)
    };

    let minutes = (amount as f64 / 60.0).round() as i64;
    let hours = (amount as f64 / 3600.0).round() as i64;
    let days = (amount as f64 / 86400.0).round() as i64;

    let phrase = if amount < 45 {
        "몇 초".to_string()
    } else if amount < 90 {
        "1분".to_string()
    } else if minutes < 45 {
        format!("{}분", minutes)
    } else if minutes < 90 {
        "한 시간".to_string()
    } else if hours < 22 {
        format!("{}시간", hours)
    } else if hours < 36 {
        "하루".to_string()
    } else if days < 26 {
        format!("{}일", days)
    } else if days < 46 {
        "한 달".to_string()
    } else if days < 320 {
        format!("{}달", ((days as f64) / 30.4).round() as i64)
    } else if days < 548 {
        "일 년".to_string()
    } else {
        format!("{}년", ((days as f64) / 365.0).round() as i64)
    };

    if future {
        format!("{} 후", phrase)
    } else {
        format!("{} 전", phrase)
    }
}

/// Convert Moment.js format tokens to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    let tokens = [
        ("YYYY", "%Y"),
        ("MM", "%m"),
        ("M", "%-m"),
        ("DD", "%d"),
        ("D", "%-d"),
        ("HH", "%H"),
        ("mm", "%M"),
        ("ss", "%S"),
    ];

    let mut result = String::new();
    let mut rest = format;
    'outer: while !rest.is_empty() {
        for (token, replacement) in tokens {
            if let Some(stripped) = rest.strip_prefix(token) {
                result.push_str(replacement);
                rest = stripped;
                continue 'outer;
            }
        }
        let c = rest.chars().next().unwrap_or_default();
        if c == '%' {
            result.push_str("%%");
        } else {
            result.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    result
}
