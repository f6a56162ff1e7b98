//! Validation Utilities

use validator::ValidationErrors;

use super::error::AppError;

/// Convert validation errors to AppError
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let message = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let detail = e
                    .message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "is invalid".into());
                format!("{}: {}", field, detail)
            })
        })
        .next()
        .unwrap_or_else(|| "Validation failed".into());

    AppError::Validation(message)
}

/// Parse a wire-format snowflake ID (decimal string)
pub fn parse_snowflake(field: &str, value: &str) -> Result<i64, AppError> {
    value
        .parse::<i64>()
        .map_err(|_| AppError::Validation(format!("{}: must be a numeric ID", field)))
}

/// Username rules: 3..=150 chars of letters, digits, `_`, `.`, `-`
pub fn validate_username(username: &str) -> Result<(), AppError> {
    let len = username.chars().count();
    if !(3..=150).contains(&len) {
        return Err(AppError::Validation(
            "username: must be between 3 and 150 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(AppError::Validation(
            "username: only letters, digits, '_', '.' and '-' are allowed".into(),
        ));
    }
    Ok(())
}

/// Password rules: at least 8 characters
pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < 8 {
        return Err(AppError::Validation(
            "password: must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

/// Split a comma-separated parameter into trimmed, non-empty parts
pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn parse_snowflake_accepts_decimal() {
        use pretty_assertions::assert_eq;

        assert_eq!(parse_snowflake("chat_id", "12345").unwrap(), 12345);
    }

    #[test]
    fn parse_snowflake_rejects_garbage() {
        assert!(parse_snowflake("chat_id", "abc").is_err());
    }

    #[test_case("ab" => false; "too short")]
    #[test_case("neo" => true; "minimal length")]
    #[test_case("user.name-01_" => true; "allowed punctuation")]
    #[test_case("bad name" => false; "space rejected")]
    #[test_case("emoji🦀" => false; "non ascii rejected")]
    fn username_rules(candidate: &str) -> bool {
        validate_username(candidate).is_ok()
    }

    #[test_case("short" => false; "seven or less")]
    #[test_case("longenough" => true; "eight or more")]
    fn password_rules(candidate: &str) -> bool {
        validate_password(candidate).is_ok()
    }

    #[test]
    fn split_csv_trims_and_drops_empties() {
        use pretty_assertions::assert_eq;

        assert_eq!(
            split_csv(" rust , , guitar,"),
            vec!["rust".to_string(), "guitar".to_string()]
        );
    }
}
