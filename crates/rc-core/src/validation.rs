//! Input rules shared by registration, profile editing and posting.

use crate::error::{AppError, Result};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const DISPLAY_NAME_MIN: usize = 2;
pub const DISPLAY_NAME_MAX: usize = 50;
pub const BIO_MAX: usize = 500;
pub const PASSWORD_MIN: usize = 8;
pub const TITLE_MAX: usize = 200;
pub const ANNOUNCEMENT_MAX: usize = 20_000;
pub const COMMENT_MAX: usize = 2_000;
/// 5 MiB
pub const IMAGE_MAX_BYTES: usize = 5 * 1024 * 1024;

fn invalid(msg: impl Into<String>) -> AppError {
    AppError::ValidationError(msg.into())
}

pub fn email(email: &str) -> Result<()> {
    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid("invalid email address"))?;
    let domain_ok = domain
        .split_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty());
    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        return Err(invalid("invalid email address"));
    }
    Ok(())
}

pub fn password(password: &str) -> Result<()> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(invalid("password must be at least 8 characters"));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(invalid("password must contain at least one uppercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(invalid("password must contain at least one lowercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid("password must contain at least one number"));
    }
    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid("password must contain at least one special character"));
    }
    Ok(())
}

pub fn username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if len < USERNAME_MIN {
        return Err(invalid("username must be at least 3 characters"));
    }
    if len > USERNAME_MAX {
        return Err(invalid("username must be less than 20 characters"));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid(
            "username can only contain letters, numbers, and underscores",
        ));
    }
    Ok(())
}

pub fn display_name(name: &str) -> Result<()> {
    let len = name.trim().chars().count();
    if len < DISPLAY_NAME_MIN {
        return Err(invalid("display name must be at least 2 characters"));
    }
    if len > DISPLAY_NAME_MAX {
        return Err(invalid("display name must be less than 50 characters"));
    }
    Ok(())
}

pub fn bio(bio: &str) -> Result<()> {
    if bio.chars().count() > BIO_MAX {
        return Err(invalid("bio must be less than 500 characters"));
    }
    Ok(())
}

/// Trims `raw` and checks it is non-empty and at most `max` characters.
pub fn text(field: &str, raw: &str, max: usize) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(invalid(format!("{field} must be at most {max} characters")));
    }
    Ok(trimmed.to_string())
}

pub fn image_upload(data: &[u8], content_type: &str) -> Result<()> {
    if !content_type.starts_with("image/") {
        return Err(invalid("please select an image file"));
    }
    if data.is_empty() {
        return Err(invalid("image is empty"));
    }
    if data.len() > IMAGE_MAX_BYTES {
        return Err(invalid("image must be less than 5MB"));
    }
    Ok(())
}
