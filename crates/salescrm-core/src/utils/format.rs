use chrono::NaiveDateTime;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None
pub fn format_optional(value: Option<&str>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

/// "Jun 01, 2024", or "-" when the server sent no timestamp
pub fn format_date(date: Option<&NaiveDateTime>) -> String {
    match date {
        Some(dt) => dt.format("%b %d, %Y").to_string(),
        None => "-".to_string(),
    }
}

/// "Jun 01, 2024 09:30"
pub fn format_datetime(date: Option<&NaiveDateTime>) -> String {
    match date {
        Some(dt) => dt.format("%b %d, %Y %H:%M").to_string(),
        None => "-".to_string(),
    }
}

/// Dollar figure with two decimals, e.g. "$1,250.00"
pub fn format_money(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Café au lait", 7), "Café...");
    }

    #[test]
    fn test_format_date() {
        let dt = NaiveDateTime::parse_from_str("2024-06-01T09:30:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        assert_eq!(format_date(Some(&dt)), "Jun 01, 2024");
        assert_eq!(format_datetime(Some(&dt)), "Jun 01, 2024 09:30");
        assert_eq!(format_date(None), "-");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(Some("Jane"), "-"), "Jane");
        assert_eq!(format_optional(Some(""), "-"), "-");
        assert_eq!(format_optional(None, "Unnamed"), "Unnamed");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(250.0), "$250.00");
        assert_eq!(format_money(1250.5), "$1,250.50");
        assert_eq!(format_money(1234567.891), "$1,234,567.89");
    }
}
