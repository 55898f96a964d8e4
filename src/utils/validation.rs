use crate::models::{AppError, Session};

pub const ALLOWED_GENDERS: [&str; 2] = ["male", "female"];

pub fn validate_required(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::ValidationError(format!("{} is required", field)));
    }

    Ok(())
}

/// Title and content are both mandatory for posts and comments.
pub fn validate_text_fields(title: &str, content: &str) -> Result<(), AppError> {
    validate_required("title", title)?;
    validate_required("content", content)
}

pub fn validate_gender(gender: Option<&str>) -> Result<(), AppError> {
    match gender {
        None | Some("") => Ok(()),
        Some(g) if ALLOWED_GENDERS.contains(&g) => Ok(()),
        Some(_) => Err(AppError::ValidationError(
            "gender must be 'male' or 'female'".to_string(),
        )),
    }
}

/// Only the session that authored an item may change it.
pub fn ensure_owner(author_id: &str, session: &Session, what: &str) -> Result<(), AppError> {
    if author_id != session.id {
        return Err(AppError::Forbidden(format!("you can only modify your own {}", what)));
    }

    Ok(())
}
