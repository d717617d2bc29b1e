use chrono::{DateTime, Utc};

/// Expands `{source_id}` and `{date}` placeholders in a configured
/// filename pattern (spec §4.13). Unknown placeholders are left verbatim
/// rather than rejected, so a typo in config degrades to a literal
/// filename segment instead of crashing the sink.
pub fn render(pattern: &str, source_id: &str, timestamp: DateTime<Utc>) -> String {
    let date = timestamp.format("%Y-%m-%d").to_string();
    pattern
        .replace("{source_id}", &sanitize(source_id))
        .replace("{date}", &date)
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn substitutes_both_placeholders() {
        let ts = Utc.with_ymd_and_hms(2026, 7, 31, 0, 0, 0).unwrap();
        let name = render("{source_id}-{date}.log", "web-app", ts);
        assert_eq!(name, "web-app-2026-07-31.log");
    }

    #[test]
    fn sanitizes_unsafe_characters_in_source_id() {
        let ts = Utc.with_ymd_and_hms(2026, 7, 31, 0, 0, 0).unwrap();
        let name = render("{source_id}.log", "../etc/passwd", ts);
        assert!(!name.contains('/'));
        assert!(!name.contains(".."));
    }
}
