use thiserror::Error;

use crate::db_types::{NewUser, User};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The username '{0}' is already taken")]
    UsernameTaken(String),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Could not process the password. {0}")]
    PasswordHashError(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

/// Behaviour for registering users and looking up their stored credentials.
///
/// Hashing is not the backend's concern: the backend only ever sees the encoded password hash.
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    /// Creates a new user, together with an empty balance snapshot, in a single atomic transaction.
    ///
    /// The user id is generated by the backend. If the username already exists, [`AuthApiError::UsernameTaken`] is
    /// returned and nothing is written.
    async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError>;

    /// Fetches the user record (including the password hash) for the given username.
    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, AuthApiError>;
}
