//! Shared content validation: publish status, template kinds, block trees.

use crate::error::{AppError, AppResult};
use serde_json::{Value, json};

/// Statuses a page or post may carry.
pub const ALLOWED_STATUSES: [&str; 2] = ["draft", "published"];

/// Kinds a template may declare.
pub const ALLOWED_TEMPLATE_TYPES: [&str; 3] = ["both", "page", "post"];

/// Normalizes a publish status (trim + lowercase) and validates it.
pub fn normalize_status(raw: &str) -> AppResult<String> {
    let status = raw.trim().to_lowercase();
    if ALLOWED_STATUSES.contains(&status.as_str()) {
        Ok(status)
    } else {
        Err(AppError::BadRequest(
            "Invalid status. Allowed: draft, published".to_string(),
        ))
    }
}

/// Normalizes a template kind (trim + lowercase) and validates it.
pub fn normalize_template_type(raw: &str) -> AppResult<String> {
    let template_type = raw.trim().to_lowercase();
    if ALLOWED_TEMPLATE_TYPES.contains(&template_type.as_str()) {
        Ok(template_type)
    } else {
        Err(AppError::BadRequest(
            "Invalid type. Allowed: both, page, post".to_string(),
        ))
    }
}

/// The block tree every page or post starts with.
pub fn default_tree() -> Value {
    json!({ "version": 1, "blocks": [] })
}

/// Validates the outer shape of a block tree: an object carrying a `blocks`
/// array. Individual blocks are opaque and pass through untouched.
pub fn validate_tree(content: &Value) -> AppResult<()> {
    let Some(object) = content.as_object() else {
        return Err(AppError::BadRequest(
            "content must be an object with 'version' and 'blocks'".to_string(),
        ));
    };

    let Some(blocks) = object.get("blocks") else {
        return Err(AppError::BadRequest(
            "content must be an object with 'version' and 'blocks'".to_string(),
        ));
    };

    if !blocks.is_array() {
        return Err(AppError::BadRequest(
            "content.blocks must be a list".to_string(),
        ));
    }

    Ok(())
}
