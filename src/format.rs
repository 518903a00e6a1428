use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};

const UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Formats a byte count with binary prefixes: `0 B`, `1023 B`, `1.5 KiB`.
pub fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

fn datetime(ts: f64, tz: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    if !ts.is_finite() {
        return None;
    }
    let secs = ts.floor();
    let nanos = ((ts - secs) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::<Utc>::from_timestamp(secs as i64, nanos).map(|dt| dt.with_timezone(tz))
}

/// `2020-09-13 12:26:40` in the given timezone.
pub fn str_from_ts(ts: f64, tz: &FixedOffset) -> String {
    match datetime(ts, tz) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ts.to_string(),
    }
}

/// RFC 3339 with the offset of `tz`; fractional seconds only when present.
pub fn iso_str_from_ts(ts: f64, tz: &FixedOffset) -> String {
    match datetime(ts, tz) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        None => ts.to_string(),
    }
}

/// Short timestamp with centiseconds, the full ISO form as a hover title.
pub fn html_from_ts(ts: f64, tz: &FixedOffset) -> String {
    match datetime(ts, tz) {
        Some(dt) => {
            let mut short = dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string();
            short.truncate(short.len() - 4);
            format!("<em title=\"{}\">{}</em>", iso_str_from_ts(ts, tz), short)
        }
        None => format!("<em>{}</em>", ts),
    }
}
