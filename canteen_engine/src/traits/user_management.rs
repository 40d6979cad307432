use thiserror::Error;

use crate::db_types::{NewUser, User};

#[derive(Debug, Clone, Error)]
pub enum UserApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("A user with mobile number {0} already exists")]
    UserAlreadyExists(String),
    #[error("User #{0} does not exist")]
    UserNotFound(i64),
    #[error("Invalid mobile number or password")]
    InvalidCredentials,
    #[error("Invalid user details: {0}")]
    ValidationError(String),
    #[error("Could not hash password: {0}")]
    PasswordHashError(String),
}

impl From<sqlx::Error> for UserApiError {
    fn from(e: sqlx::Error) -> Self {
        UserApiError::DatabaseError(e.to_string())
    }
}

/// Account storage.
#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Creates a new user. Fails with [`UserApiError::UserAlreadyExists`] if the mobile number is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, UserApiError>;

    /// Fetches a user, including the ids of the canteens they administer.
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, UserApiError>;

    async fn fetch_user_by_mobile(&self, mobile: &str) -> Result<Option<User>, UserApiError>;

    /// Fetches every user in `ids` that exists. Unknown ids are silently skipped.
    async fn fetch_users(&self, ids: &[i64]) -> Result<Vec<User>, UserApiError>;

    async fn list_users(&self) -> Result<Vec<User>, UserApiError>;
}
