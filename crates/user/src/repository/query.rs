use crate::{
    abstract_trait::user::repository::UserQueryRepositoryTrait, model::user::User as UserModel,
};
use async_trait::async_trait;
use shared::{config::ConnectionPool, errors::RepositoryError};
use tracing::{error, info};

const FIND_BY_USERNAME_OR_EMAIL: &str = r#"
    SELECT
        id, username, email, full_name, avatar, cover_image,
        password, refresh_token, created_at, updated_at
    FROM users
    WHERE username = lower($1) OR email = $2
    LIMIT 1
"#;

#[derive(Clone)]
pub struct UserQueryRepository {
    db: ConnectionPool,
}

impl UserQueryRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserQueryRepositoryTrait for UserQueryRepository {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<UserModel>, RepositoryError> {
        info!("🔍 Looking up user by username={username} or email={email}");

        let mut conn = self.db.acquire().await.map_err(|e| {
            error!("❌ Failed to acquire DB connection: {:?}", e);
            RepositoryError::from(e)
        })?;

        let user = sqlx::query_as::<_, UserModel>(FIND_BY_USERNAME_OR_EMAIL)
        .bind(username)
        .bind(email)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to look up user: {:?}", e);
            RepositoryError::from(e)
        })?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<UserModel>, RepositoryError> {
        info!("🔍 Fetching user by id={id}");

        let mut conn = self.db.acquire().await.map_err(|e| {
            error!("❌ Failed to acquire DB connection: {:?}", e);
            RepositoryError::from(e)
        })?;

        let user = sqlx::query_as::<_, UserModel>(
            r#"
            SELECT
                id, username, email, full_name, avatar, cover_image,
                password, refresh_token, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch user id={id}: {:?}", e);
            RepositoryError::from(e)
        })?;

        Ok(user)
    }
}
