use log::{debug, error, trace};

use super::token;
use crate::model::{store, User, UserStore};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid token")]
    Unauthorized,

    #[error(transparent)]
    Store(store::Error),
}

/// Resolve a bearer token to the user that owns it.
///
/// Possessing a valid token is the whole permission model: the caller
/// may act on any user id, not just its own.
pub fn authorize(token: Option<&str>, database: &dyn UserStore) -> Result<User, Error> {
    let Some(token) = token.filter(|token| !token.is_empty()) else {
        trace!("No token supplied");
        return Err(Error::Unauthorized);
    };

    if !token::is_well_formed(token) {
        debug!("Malformed token rejected");
        return Err(Error::Unauthorized);
    }

    match database.find_by_token(token) {
        Ok(Some(user)) => {
            trace!("Request authorized as user {}", user.id);
            Ok(user)
        }
        Ok(None) => {
            debug!("Token not found in database");
            Err(Error::Unauthorized)
        }
        Err(err) => {
            error!("Failed to get user from database: {}", err);
            Err(Error::Store(err))
        }
    }
}
