//! Field validators shared by the API handlers.
//!
//! Each returns `Err(message)` suitable for `ValidationErrorBuilder::check`.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();

    /// Promo codes are stored upper-case
    static ref PROMO_CODE_REGEX: Regex = Regex::new(r"^[A-Z0-9_-]{3,32}$").unwrap();

    static ref HEX_COLOR_REGEX: Regex = Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap();

    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9 ()-]{6,20}$").unwrap();
}

/// Required free-text field with a length cap
pub fn validate_required(value: &str, label: &str, max: usize) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} is required", label));
    }
    if trimmed.chars().count() > max {
        return Err(format!("{} is too long (max {} characters)", label, max));
    }
    Ok(())
}

pub fn validate_optional_len(value: &Option<String>, label: &str, max: usize) -> Result<(), String> {
    match value {
        Some(v) if v.chars().count() > max => {
            Err(format!("{} is too long (max {} characters)", label, max))
        }
        _ => Ok(()),
    }
}

pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 254 || !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email address".to_string());
    }
    Ok(())
}

pub fn validate_phone(phone: &Option<String>) -> Result<(), String> {
    match phone.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() && !PHONE_REGEX.is_match(p) => {
            Err("Invalid phone number".to_string())
        }
        _ => Ok(()),
    }
}

pub fn validate_promo_code(code: &str) -> Result<(), String> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return Err("Promo code is required".to_string());
    }
    if !PROMO_CODE_REGEX.is_match(&code) {
        return Err(
            "Promo code must be 3-32 letters, digits, dashes or underscores".to_string(),
        );
    }
    Ok(())
}

pub fn validate_hex_color(color: &str) -> Result<(), String> {
    if HEX_COLOR_REGEX.is_match(color.trim()) {
        Ok(())
    } else {
        Err("Color must be a hex value such as #c0c0c0".to_string())
    }
}

/// `YYYY-MM-DD`
pub fn validate_date(value: &str, label: &str) -> Result<(), String> {
    chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| format!("{} must be a date in YYYY-MM-DD format", label))
}

/// `HH:MM` or `HH:MM:SS`
pub fn validate_time(value: &str, label: &str) -> Result<(), String> {
    let value = value.trim();
    chrono::NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| chrono::NaiveTime::parse_from_str(value, "%H:%M"))
        .map(|_| ())
        .map_err(|_| format!("{} must be a time in HH:MM format", label))
}

pub fn validate_optional_time(value: &Option<String>, label: &str) -> Result<(), String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => validate_time(v, label),
        _ => Ok(()),
    }
}

pub fn validate_non_negative(value: f64, label: &str) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{} must be zero or more", label));
    }
    Ok(())
}

pub fn validate_positive_int(value: i64, label: &str) -> Result<(), String> {
    if value < 1 {
        return Err(format!("{} must be at least 1", label));
    }
    Ok(())
}

/// Case-insensitive membership in an enumerated set
pub fn validate_one_of<T>(value: &str, parse: fn(&str) -> Option<T>, expected: &str) -> Result<(), String> {
    parse(value)
        .map(|_| ())
        .ok_or_else(|| format!("Must be one of: {}", expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required() {
        assert!(validate_required("Ocean Suite", "Name", 100).is_ok());
        assert!(validate_required("   ", "Name", 100).is_err());
        assert!(validate_required(&"x".repeat(101), "Name", 100).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("guest@example.com").is_ok());
        assert!(validate_email("first.last+spa@hotel.co.uk").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("guest@").is_err());
        assert!(validate_email("guest.example.com").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone(&None).is_ok());
        assert!(validate_phone(&Some("+44 20 7946 0958".into())).is_ok());
        assert!(validate_phone(&Some("call me".into())).is_err());
    }

    #[test]
    fn test_validate_promo_code() {
        assert!(validate_promo_code("SUMMER25").is_ok());
        assert!(validate_promo_code("welcome-10").is_ok());
        assert!(validate_promo_code("AB").is_err());
        assert!(validate_promo_code("NO SPACES").is_err());
    }

    #[test]
    fn test_validate_hex_color() {
        assert!(validate_hex_color("#ffd700").is_ok());
        assert!(validate_hex_color("#FFF").is_ok());
        assert!(validate_hex_color("gold").is_err());
    }

    #[test]
    fn test_validate_date_and_time() {
        assert!(validate_date("2026-07-01", "Date").is_ok());
        assert!(validate_date("01/07/2026", "Date").is_err());
        assert!(validate_time("09:30", "Start time").is_ok());
        assert!(validate_time("23:59:59", "End time").is_ok());
        assert!(validate_time("25:00", "Start time").is_err());
        assert!(validate_optional_time(&Some("".into()), "Start time").is_ok());
    }

    #[test]
    fn test_validate_numbers() {
        assert!(validate_non_negative(0.0, "Price").is_ok());
        assert!(validate_non_negative(-1.0, "Price").is_err());
        assert!(validate_non_negative(f64::NAN, "Price").is_err());
        assert!(validate_positive_int(1, "Capacity").is_ok());
        assert!(validate_positive_int(0, "Capacity").is_err());
    }
}
