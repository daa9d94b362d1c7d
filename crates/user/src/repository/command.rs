use crate::{
    abstract_trait::user::repository::UserCommandRepositoryTrait,
    domain::requests::user::CreateUserRequest, model::user::User as UserModel,
};
use async_trait::async_trait;
use shared::{config::ConnectionPool, errors::RepositoryError};
use tracing::{error, info};

pub const DUPLICATE_USER_MESSAGE: &str = "User with email or username already exists";

pub struct UserCommandRepository {
    db: ConnectionPool,
}

impl UserCommandRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserCommandRepositoryTrait for UserCommandRepository {
    async fn create_user(&self, req: &CreateUserRequest) -> Result<UserModel, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let user = sqlx::query_as::<_, UserModel>(
            r#"
            INSERT INTO users (
                username,
                email,
                full_name,
                avatar,
                cover_image,
                password,
                created_at,
                updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP
            )
            RETURNING
                id,
                username,
                email,
                full_name,
                avatar,
                cover_image,
                password,
                refresh_token,
                created_at,
                updated_at
            "#,
        )
        .bind(&req.username)
        .bind(&req.email)
        .bind(&req.full_name)
        .bind(&req.avatar)
        .bind(&req.cover_image)
        .bind(&req.password)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            let err = RepositoryError::from_unique_violation(e, DUPLICATE_USER_MESSAGE);
            match &err {
                RepositoryError::AlreadyExists(_) => {
                    info!("⚠️ Insert rejected by unique constraint: {}", req.username)
                }
                other => error!("❌ Failed to insert user '{}': {other:?}", req.username),
            }
            err
        })?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    const CREATE_USERS: &str = include_str!("../../migrations/20250101000000_create_users.sql");

    fn column_type(column: &str) -> &'static str {
        CREATE_USERS
            .lines()
            .map(str::trim)
            .find_map(|line| line.strip_prefix(column)?.strip_prefix(' '))
            .and_then(|rest| rest.split_whitespace().next())
            .unwrap_or_else(|| panic!("column {column} missing from migration"))
    }

    #[test]
    fn free_text_columns_have_no_length_cap() {
        for column in ["username", "email", "full_name", "password", "avatar", "cover_image"] {
            assert_eq!(column_type(column), "TEXT", "column {column}");
        }
    }
}
