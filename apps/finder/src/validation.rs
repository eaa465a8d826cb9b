//! Field validation shared by the request handlers.
//! Every check returns `AppError::Validation` with the offending field named.

use crate::errors::AppError;

pub const MIN_RANK: i64 = 1;
pub const MAX_RANK: i64 = 5;

pub fn validate_rank(rank: i64) -> Result<i16, AppError> {
    if !(MIN_RANK..=MAX_RANK).contains(&rank) {
        return Err(AppError::Validation(format!(
            "rank must be between {MIN_RANK} and {MAX_RANK}, got {rank}"
        )));
    }
    Ok(rank as i16)
}

pub fn validate_answer_value(value: f64) -> Result<f64, AppError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(AppError::Validation(format!(
            "answer_value must be between 0.0 and 1.0, got {value}"
        )));
    }
    Ok(value)
}

/// Skill and question weights.
pub fn validate_weight(field: &str, value: f64) -> Result<f64, AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::Validation(format!(
            "{field} must be a non-negative number, got {value}"
        )));
    }
    Ok(value)
}

/// Discipline feedback: 1 = poor, 2 = average, 3 = good.
pub fn validate_knowledge_level(level: i64) -> Result<i16, AppError> {
    if !(1..=3).contains(&level) {
        return Err(AppError::Validation(format!(
            "knowledge_level must be 1, 2 or 3, got {level}"
        )));
    }
    Ok(level as i16)
}

/// Trims and checks a required text field against its column width.
pub fn validate_text(field: &str, value: &str, max_chars: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    if trimmed.chars().count() > max_chars {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn validate_email(email: &str) -> Result<String, AppError> {
    let email = validate_text("email", email, 64)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::Validation(format!("'{email}' is not a valid email"))),
    }
}

pub fn validate_age(age: i32) -> Result<i32, AppError> {
    if !(0..=150).contains(&age) {
        return Err(AppError::Validation(format!("age must be between 0 and 150, got {age}")));
    }
    Ok(age)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_bounds() {
        assert_eq!(validate_rank(1).unwrap(), 1);
        assert_eq!(validate_rank(5).unwrap(), 5);
        assert!(validate_rank(0).is_err());
        assert!(validate_rank(6).is_err());
    }

    #[test]
    fn test_answer_value_bounds() {
        assert_eq!(validate_answer_value(0.0).unwrap(), 0.0);
        assert_eq!(validate_answer_value(1.0).unwrap(), 1.0);
        assert!(validate_answer_value(1.01).is_err());
        assert!(validate_answer_value(-0.1).is_err());
        assert!(validate_answer_value(f64::NAN).is_err());
    }

    #[test]
    fn test_weight_non_negative() {
        assert_eq!(validate_weight("weight", 0.0).unwrap(), 0.0);
        assert!(validate_weight("weight", -1.0).is_err());
        assert!(validate_weight("weight", f64::INFINITY).is_err());
    }

    #[test]
    fn test_knowledge_level() {
        assert_eq!(validate_knowledge_level(2).unwrap(), 2);
        assert!(validate_knowledge_level(0).is_err());
        assert!(validate_knowledge_level(4).is_err());
    }

    #[test]
    fn test_text_trimmed_and_bounded() {
        assert_eq!(validate_text("title", "  Rust  ", 32).unwrap(), "Rust");
        assert!(validate_text("title", "   ", 32).is_err());
        assert!(validate_text("title", &"x".repeat(33), 32).is_err());
    }

    #[test]
    fn test_text_counts_chars_not_bytes() {
        assert!(validate_text("title", "Навык", 5).is_ok());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("hr@example.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_age() {
        assert!(validate_age(30).is_ok());
        assert!(validate_age(-1).is_err());
    }
}
