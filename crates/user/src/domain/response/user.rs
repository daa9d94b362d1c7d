use crate::model::user::User as UserModel;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Public view of a user. Credentials are not part of this type.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<UserModel> for UserResponse {
    fn from(value: UserModel) -> Self {
        UserResponse {
            id: value.id,
            username: value.username,
            email: value.email,
            full_name: value.full_name,
            avatar: value.avatar,
            cover_image: value.cover_image,
            created_at: value.created_at.map(|dt| dt.to_string()),
            updated_at: value.updated_at.map(|dt| dt.to_string()),
        }
    }
}
