use chrono::{DateTime, Utc};
use colored::Colorize;

/// Format a cent amount as dollars with color
pub fn format_usd(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
        .yellow()
        .to_string()
}

/// Format timestamp in human-readable format
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn format_optional_timestamp(timestamp: Option<&DateTime<Utc>>) -> String {
    timestamp.map(format_timestamp).unwrap_or_else(|| "-".to_string())
}

/// Truncate long identifiers for table display
pub fn format_id(id: &str) -> String {
    if id.chars().count() <= 20 {
        id.to_string()
    } else {
        let head: String = id.chars().take(8).collect();
        let tail: String = id.chars().rev().take(8).collect::<Vec<_>>().into_iter().rev().collect();
        format!("{}...{}", head, tail)
    }
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    let mut row = String::new();
    for (col, width) in columns.iter().zip(widths) {
        row.push_str(&format!("{:<width$}  ", col, width = *width));
    }
    println!("{}", row.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_usd_renders_dollars_and_cents() {
        colored::control::set_override(false);
        assert_eq!(format_usd(1000), "$10.00");
        assert_eq!(format_usd(5), "$0.05");
        assert_eq!(format_usd(-1999), "-$19.99");
    }

    #[test]
    fn format_id_truncates_long_values() {
        assert_eq!(format_id("5UXD2E8A7EBQJ"), "5UXD2E8A7EBQJ");
        assert_eq!(format_id("abcdefghijklmnopqrstuvwxyz"), "abcdefgh...stuvwxyz");
    }

    #[test]
    fn optional_timestamp_uses_dash_for_missing() {
        let at = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
        assert_eq!(format_optional_timestamp(Some(&at)), "2024-02-03 04:05:06 UTC");
        assert_eq!(format_optional_timestamp(None), "-");
    }
}
