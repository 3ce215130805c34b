//! Caller identity and the admin predicate shared by every admin-only
//! entry point.

use crate::models::user::{Role, UserIdentity};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("You do not have permission to create events.")]
    Forbidden,
    #[error("user `{0}` already exists")]
    UserAlreadyExists(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Resolves the user behind an API token.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn current_user(&self, token: &str) -> Result<Option<UserIdentity>, AuthError>;
}

/// The only place that decides whether a user may perform admin actions.
pub fn require_admin(user: &UserIdentity) -> Result<(), AuthError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Token lookup against the `users` table.
#[derive(Clone)]
pub struct SqliteAuthService {
    pub db: Arc<SqlitePool>,
}

impl SqliteAuthService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Provision a user and return it together with its freshly minted token.
    pub async fn create_user(
        &self,
        email: &str,
        name: Option<&str>,
        role: Role,
    ) -> Result<(UserIdentity, String), AuthError> {
        let token = Uuid::new_v4().simple().to_string();
        let user = sqlx::query_as::<_, UserIdentity>(
            "INSERT INTO users (id, email, name, role, api_token, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id, email, name, role, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(name)
        .bind(role)
        .bind(&token)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AuthError::UserAlreadyExists(email.to_string())
            }
            other => AuthError::Sqlx(other),
        })?;

        tracing::info!(user_id = %user.id, email = %user.email, role = ?user.role, "created user");
        Ok((user, token))
    }
}

#[async_trait]
impl AuthService for SqliteAuthService {
    async fn current_user(&self, token: &str) -> Result<Option<UserIdentity>, AuthError> {
        if token.is_empty() {
            return Ok(None);
        }
        let user = sqlx::query_as::<_, UserIdentity>(
            "SELECT id, email, name, role, created_at FROM users WHERE api_token = ?",
        )
        .bind(token)
        .fetch_optional(&*self.db)
        .await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn token_resolves_to_its_user() {
        let auth = SqliteAuthService::new(test_pool().await);
        let (created, token) = auth
            .create_user("ada@example.com", Some("Ada"), Role::Admin)
            .await
            .unwrap();

        let found = auth.current_user(&token).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.role, Role::Admin);

        assert!(auth.current_user("nope").await.unwrap().is_none());
        assert!(auth.current_user("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let auth = SqliteAuthService::new(test_pool().await);
        auth.create_user("ada@example.com", None, Role::Member)
            .await
            .unwrap();
        let err = auth
            .create_user("ada@example.com", None, Role::Member)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists(_)));
    }

    #[tokio::test]
    async fn only_admins_pass_the_admin_predicate() {
        let auth = SqliteAuthService::new(test_pool().await);
        let (admin, _) = auth
            .create_user("a@example.com", None, Role::Admin)
            .await
            .unwrap();
        let (member, _) = auth
            .create_user("m@example.com", None, Role::Member)
            .await
            .unwrap();

        assert!(require_admin(&admin).is_ok());
        assert!(matches!(require_admin(&member), Err(AuthError::Forbidden)));
    }
}
