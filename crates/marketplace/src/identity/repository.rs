use super::domain::{AccountStatus, User, UserId};
use crate::store::RepositoryError;

/// Storage abstraction for user documents.
///
/// Implementations enforce email uniqueness: `insert_user` returns
/// [`RepositoryError::Conflict`] when the normalized email is already taken.
pub trait UserRepository: Send + Sync {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError>;
    /// Change only the account status and return the stored user.
    fn set_account_status(&self, id: &UserId, status: AccountStatus)
        -> Result<User, RepositoryError>;
    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
}
