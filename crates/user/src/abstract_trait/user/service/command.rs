use crate::domain::{
    requests::user::RegisterUserRequest,
    response::{api::ApiResponse, user::UserResponse},
};
use anyhow::Result;
use async_trait::async_trait;
use shared::errors::ServiceError;
use std::sync::Arc;

pub type DynUserCommandService = Arc<dyn UserCommandServiceTrait + Send + Sync>;

#[async_trait]
pub trait UserCommandServiceTrait {
    async fn register_user(
        &self,
        req: &RegisterUserRequest,
    ) -> Result<ApiResponse<UserResponse>, ServiceError>;
}
