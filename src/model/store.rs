use super::user::{Id, NewUser, User};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unique constraint violated on {field}")]
    ConstraintViolation { field: &'static str },

    #[error("user no longer exists")]
    NotFound,

    #[error("database error: {0}")]
    Sqlite(rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Persistence for user records.
///
/// Each call is atomic on its own; callers never need more than one record
/// per transaction. Username uniqueness is enforced here, at write time.
pub trait UserStore: Send {
    fn find_by_token(&self, token: &str) -> Result<Option<User>>;
    fn find_by_id(&self, id: Id) -> Result<Option<User>>;
    fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Fails with [`Error::ConstraintViolation`] if the username is taken.
    fn insert(&self, user: NewUser) -> Result<Id>;

    /// Overwrites username and password hash. Id and token never change.
    fn update(&self, user: &User) -> Result<()>;

    fn delete(&self, id: Id) -> Result<()>;
}
