//! Display formatting for dashboard values.
//!
//! Amounts use Indian digit grouping (last three digits, then pairs), the way
//! the dashboard has always shown rupee figures: `₹12,34,567`.

use chrono::{DateTime, NaiveDate, TimeZone};

pub const UP_ARROW: &str = "▲";
pub const DOWN_ARROW: &str = "▼";

/// Group an integer with Indian separators: `1234567` -> `12,34,567`.
pub fn group_indian(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let sign = if n < 0 { "-" } else { "" };
    if digits.len() <= 3 {
        return format!("{}{}", sign, digits);
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{}{},{}", sign, groups.join(","), tail)
}

/// Fixed-point text with ties rounded away from zero (`0.25` -> `0.3`).
/// `{:.N}` alone rounds exact binary ties to even.
pub fn fixed(value: f64, places: usize) -> String {
    let scale = 10f64.powi(places as i32);
    let rounded = (value * scale).round() / scale + 0.0;
    format!("{:.*}", places, rounded)
}

/// Rupee amount, rounded to the nearest whole rupee.
pub fn money(amount: f64) -> String {
    format!("₹{}", group_indian(amount.round() as i64))
}

/// Fraction as a one-decimal percentage: `0.0312` -> `3.1%`.
pub fn pct(fraction: f64) -> String {
    format!("{}%", fixed(fraction * 100.0, 1))
}

pub fn count(n: u64) -> String {
    group_indian(n as i64)
}

pub fn arrow(up: bool) -> &'static str {
    if up {
        UP_ARROW
    } else {
        DOWN_ARROW
    }
}

/// Day-over-day caption for a KPI tile.
pub fn delta_meta(delta: f64) -> String {
    format!("{} {}% vs yesterday", arrow(delta >= 0.0), fixed(delta.abs() * 100.0, 1))
}

/// Short date label used on the time axis: `18 Oct`.
pub fn day_label(date: NaiveDate) -> String {
    date.format("%d %b").to_string()
}

/// Event and "last updated" stamp: `18/10/2026, 3:04:05 pm`.
pub fn stamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%d/%m/%Y, %-I:%M:%S %P").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_group_indian() {
        assert_eq!(group_indian(0), "0");
        assert_eq!(group_indian(999), "999");
        assert_eq!(group_indian(1000), "1,000");
        assert_eq!(group_indian(45000), "45,000");
        assert_eq!(group_indian(123456), "1,23,456");
        assert_eq!(group_indian(1234567), "12,34,567");
        assert_eq!(group_indian(-1234567), "-12,34,567");
    }

    #[test]
    fn test_money_rounds() {
        assert_eq!(money(47000.9), "₹47,001");
        assert_eq!(money(499.0), "₹499");
    }

    #[test]
    fn test_fixed_rounds_ties_up() {
        assert_eq!(fixed(0.25, 1), "0.3");
        assert_eq!(fixed(0.03125, 4), "0.0313");
        assert_eq!(fixed(-0.25, 1), "-0.3");
        assert_eq!(fixed(-0.01, 1), "0.0");
        assert_eq!(fixed(2.0, 2), "2.00");
    }

    #[test]
    fn test_pct() {
        assert_eq!(pct(0.0312), "3.1%");
        assert_eq!(pct(0.0), "0.0%");
    }

    #[test]
    fn test_delta_meta() {
        assert_eq!(delta_meta(0.05), "▲ 5.0% vs yesterday");
        assert_eq!(delta_meta(0.0), "▲ 0.0% vs yesterday");
        assert_eq!(delta_meta(-0.125), "▼ 12.5% vs yesterday");
    }

    #[test]
    fn test_day_label() {
        let d = NaiveDate::from_ymd_opt(2026, 10, 8).unwrap();
        assert_eq!(day_label(d), "08 Oct");
    }

    #[test]
    fn test_stamp_twelve_hour() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 15, 4, 5).unwrap();
        assert_eq!(stamp(&at), "18/10/2026, 3:04:05 pm");
    }
}
