use crate::server::response::ApiError;
use crate::types::PassType;

const MAX_USERNAME_LEN: usize = 64;
const MAX_NAME_LEN: usize = 100;
const MAX_REASONS_LEN: usize = 500;

fn is_valid_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
}

pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(format!(
            "Username cannot exceed {MAX_USERNAME_LEN} characters"
        ));
    }
    if !username.chars().all(is_valid_username_char) {
        return Err(
            "Username can only contain alphanumeric characters, hyphens, underscores, and periods"
                .to_string(),
        );
    }
    if username.starts_with('-') || username.starts_with('_') {
        return Err("Username cannot start with a hyphen or underscore".to_string());
    }
    Ok(())
}

pub fn validate_person_name(name: &str) -> Result<(), ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Name cannot be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ApiError::bad_request("Email cannot be empty"));
    }
    // Deliverability is the mail system's problem; only the shape is checked.
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ApiError::bad_request("Email must contain '@'"));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ApiError::bad_request("Email address is malformed"));
    }
    Ok(())
}

pub fn validate_quantity(quantity: i64) -> Result<(), ApiError> {
    if quantity <= 0 {
        return Err(ApiError::bad_request("Quantity must be at least 1"));
    }
    Ok(())
}

pub fn validate_reasons(reasons: &str) -> Result<(), ApiError> {
    if reasons.trim().is_empty() {
        return Err(ApiError::bad_request(
            "A reason for the cancellation is required",
        ));
    }
    if reasons.len() > MAX_REASONS_LEN {
        return Err(ApiError::bad_request(format!(
            "Reason cannot exceed {MAX_REASONS_LEN} characters"
        )));
    }
    Ok(())
}

/// Parses a submitted price string. Thousands separators and stray spaces
/// are stripped first, so "1,300.00" and " 900 " both parse.
pub fn parse_price(pass: PassType, raw: &str) -> Result<f64, String> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != ' ').collect();
    if cleaned.is_empty() {
        return Err(format!("{pass}: price is required"));
    }

    let price: f64 = cleaned
        .parse()
        .map_err(|_| format!("{pass}: '{raw}' is not a valid price"))?;

    if !price.is_finite() {
        return Err(format!("{pass}: '{raw}' is not a valid price"));
    }
    if price < 0.0 {
        return Err(format!("{pass}: price cannot be negative"));
    }

    Ok(price)
}

/// Validates a `YYYY-MM` month filter.
pub fn validate_month(month: &str) -> Result<(), ApiError> {
    let valid = month.is_ascii()
        && month.len() == 7
        && month.as_bytes()[4] == b'-'
        && month[..4].chars().all(|c| c.is_ascii_digit())
        && month[5..]
            .parse::<u32>()
            .is_ok_and(|m| (1..=12).contains(&m));

    if !valid {
        return Err(ApiError::bad_request("Month must be in YYYY-MM format"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_strips_commas_and_spaces() {
        assert_eq!(parse_price(PassType::Regular, "1,300.00").unwrap(), 1300.0);
        assert_eq!(parse_price(PassType::Junior, " 900 ").unwrap(), 900.0);
        assert_eq!(parse_price(PassType::Express, "2300.50").unwrap(), 2300.5);
    }

    #[test]
    fn test_parse_price_rejects_garbage() {
        assert!(parse_price(PassType::Regular, "abc").is_err());
        assert!(parse_price(PassType::Regular, "").is_err());
        assert!(parse_price(PassType::Regular, "-1").is_err());
        assert!(parse_price(PassType::Regular, "inf").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("jdoe").is_ok());
        assert!(validate_username("j.doe-1").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("_jdoe").is_err());
        assert!(validate_username("j doe").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("alice").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("alice@nodot").is_err());
    }

    #[test]
    fn test_validate_month() {
        assert!(validate_month("2025-06").is_ok());
        assert!(validate_month("2025-13").is_err());
        assert!(validate_month("202506").is_err());
        assert!(validate_month("2025-6").is_err());
    }
}
