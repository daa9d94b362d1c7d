use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Registration input as collected from the multipart body. Text fields stay
/// optional until validation so a missing part and a blank part are both
/// reported the same way.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(required, custom(function = "not_blank"))]
    pub full_name: Option<String>,

    #[validate(required, custom(function = "not_blank"))]
    pub email: Option<String>,

    #[validate(required, custom(function = "not_blank"))]
    pub username: Option<String>,

    #[validate(required, custom(function = "not_blank"))]
    pub password: Option<String>,

    /// Local path of the staged avatar file, if one was sent.
    #[serde(skip)]
    pub avatar_local_path: Option<PathBuf>,

    #[serde(skip)]
    pub cover_image_local_path: Option<PathBuf>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Multipart body of `POST /api/users/register`, for the API docs only.
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct RegisterUserForm {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    #[schema(value_type = String, format = Binary)]
    pub avatar: Vec<u8>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub cover_image: Option<Vec<u8>>,
}

/// Row values for the insert, already normalized and hashed.
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub password: String,
}
