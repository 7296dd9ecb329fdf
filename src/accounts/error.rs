use std::collections::BTreeMap;

use crate::auth::{guard, hash};
use crate::model::store;

use super::validate::USERNAME_TAKEN;

/// Field name to human-readable message, one entry per violated field.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid token")]
    Unauthorized,

    #[error("invalid user")]
    NotFound,

    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("invalid request")]
    InvalidRequest,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<store::Error> for Error {
    fn from(err: store::Error) -> Self {
        match err {
            store::Error::ConstraintViolation { field } => {
                let mut errors = FieldErrors::new();
                errors.insert(field.to_string(), USERNAME_TAKEN.to_string());
                Error::Validation(errors)
            }
            store::Error::NotFound => Error::NotFound,
            err @ store::Error::Sqlite(_) => Error::Internal(err.to_string()),
        }
    }
}

impl From<guard::Error> for Error {
    fn from(err: guard::Error) -> Self {
        match err {
            guard::Error::Unauthorized => Error::Unauthorized,
            guard::Error::Store(err) => err.into(),
        }
    }
}

impl From<hash::Error> for Error {
    fn from(err: hash::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("hashing task failed: {}", err))
    }
}
