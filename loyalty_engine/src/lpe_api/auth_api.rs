use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewUser, User},
    traits::{AuthApiError, AuthManagement},
};

/// `AuthApi` registers users and fetches their stored credentials.
///
/// Passwords never reach this API in the clear. Callers hash them first and verify against [`User::password_hash`].
pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Registers a new user with an empty balance. Fails with [`AuthApiError::UsernameTaken`] if the username exists.
    pub async fn register_user(&self, username: &str, password_hash: &str) -> Result<User, AuthApiError> {
        let user = self.db.create_user(NewUser::new(username, password_hash)).await?;
        info!("🔑️ New user registered: {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>, AuthApiError> {
        self.db.fetch_user_by_username(username).await
    }
}
