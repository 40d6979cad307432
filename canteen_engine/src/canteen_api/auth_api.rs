use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewUser, User},
    helpers::{hash_password, is_acceptable_password, is_valid_mobile, verify_password, MIN_PASSWORD_LENGTH},
    traits::{UserApiError, UserManagement},
};

/// Account registration and credential checks. Token issuing lives with the server, which owns the signing key.
pub struct AuthApi<B> {
    db: B,
}

impl<B> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi")
    }
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

/// Checks the details every new account needs, whether it comes from registration or a canteen request.
pub fn validate_new_account(name: &str, mobile: &str, password: &str) -> Result<(), UserApiError> {
    if name.trim().is_empty() {
        return Err(UserApiError::ValidationError("Name is required".into()));
    }
    if !is_valid_mobile(mobile) {
        return Err(UserApiError::ValidationError("Mobile number must be 10 digits".into()));
    }
    if !is_acceptable_password(password) {
        return Err(UserApiError::ValidationError(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

impl<B> AuthApi<B>
where B: UserManagement
{
    /// Creates an unverified `User` account.
    pub async fn register(&self, name: &str, mobile: &str, password: &str) -> Result<User, UserApiError> {
        let mobile = mobile.trim();
        validate_new_account(name, mobile, password)?;
        if self.db.fetch_user_by_mobile(mobile).await?.is_some() {
            return Err(UserApiError::UserAlreadyExists(mobile.to_string()));
        }
        let hash = hash_password(password).map_err(|e| UserApiError::PasswordHashError(e.to_string()))?;
        let user = self.db.insert_user(NewUser::new(name.trim(), mobile, hash.as_str())).await?;
        info!("🔐️ New user #{} registered", user.id);
        Ok(user)
    }

    /// Returns the user if the password matches. Unknown numbers and wrong passwords are indistinguishable.
    pub async fn login(&self, mobile: &str, password: &str) -> Result<User, UserApiError> {
        let Some(user) = self.db.fetch_user_by_mobile(mobile.trim()).await? else {
            debug!("🔐️ Login attempt for an unknown mobile number");
            return Err(UserApiError::InvalidCredentials);
        };
        let matches = verify_password(password, &user.password_hash).map_err(|e| {
            error!("🔐️ The stored password hash for user #{} is unusable. {e}", user.id);
            UserApiError::PasswordHashError(e.to_string())
        })?;
        if !matches {
            debug!("🔐️ Wrong password for user #{}", user.id);
            return Err(UserApiError::InvalidCredentials);
        }
        Ok(user)
    }

    pub async fn me(&self, user_id: i64) -> Result<User, UserApiError> {
        self.db.fetch_user(user_id).await?.ok_or(UserApiError::UserNotFound(user_id))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, UserApiError> {
        self.db.list_users().await
    }
}
