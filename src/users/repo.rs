use async_trait::async_trait;

pub use crate::users::repo_types::{NewUser, User, UserChanges};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("user not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence for user records, keyed by numeric id and unique email.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn update(&self, id: i64, changes: UserChanges) -> Result<User, StoreError>;
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}
