use crate::utils::error::{CartError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(CartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(CartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(CartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 只允許數字，且長度介於 min_len..=max_len
pub fn validate_digits(field_name: &str, value: &str, min_len: usize, max_len: usize) -> Result<()> {
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(CartError::ValidationError {
            message: format!("{} must contain digits only", field_name),
        });
    }

    if value.len() < min_len || value.len() > max_len {
        return Err(CartError::ValidationError {
            message: format!(
                "{} must have between {} and {} digits, got {}",
                field_name,
                min_len,
                max_len,
                value.len()
            ),
        });
    }

    Ok(())
}
