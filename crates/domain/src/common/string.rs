//! String helpers shared by the models and the enrichment engine.

/// Normalizes a tag or category name: trimmed and lowercased.
///
/// # Examples
///
/// ```
/// use kitsheet_domain::common::normalize_key;
///
/// assert_eq!(normalize_key("  Stamina "), "stamina");
/// assert_eq!(normalize_key("HP"), "hp");
/// ```
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Converts a blank (empty or whitespace-only) string to `None`.
///
/// # Examples
///
/// ```
/// use kitsheet_domain::common::none_if_blank;
///
/// assert_eq!(none_if_blank("2d6"), Some("2d6"));
/// assert_eq!(none_if_blank("   "), None);
/// ```
pub fn none_if_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Escapes text for safe inclusion in HTML content and attribute values.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Formats a number the way the sheet displays it: integral values
/// without a fractional part.
///
/// # Examples
///
/// ```
/// use kitsheet_domain::common::format_number;
///
/// assert_eq!(format_number(15.0), "15");
/// assert_eq!(format_number(2.5), "2.5");
/// ```
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Movement"), "movement");
        assert_eq!(normalize_key(""), "");
    }

    #[test]
    fn test_none_if_blank() {
        assert_eq!(none_if_blank(""), None);
        assert_eq!(none_if_blank(" d20 "), Some("d20"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_number(f64::NAN), "NaN");
    }
}
