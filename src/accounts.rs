//! Account operations: registration, login, and the token-guarded user API.
//!
//! Every guarded operation takes a [`Caller`], which only [`authorize`] can
//! produce, so nothing runs before the token has been checked.

mod error;
pub mod validate;

use log::{debug, info};
use serde::Deserialize;

use crate::{
    auth::{self, token::generate_token},
    model::{
        user::{Id, NewUser, Token},
        AppState, User, UserStore,
    },
};

pub use error::Error;
use validate::USERNAME_TAKEN;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct TargetUser {
    pub id: Id,
}

/// Full replacement of a user's username and password. Both are required.
#[derive(Debug, Deserialize)]
pub struct EditUser {
    pub id: Id,
    pub username: String,
    pub password: String,
}

/// Proof that a request presented a valid token.
#[derive(Debug)]
pub struct Caller {
    user: User,
}

impl Caller {
    pub fn user(&self) -> &User {
        &self.user
    }
}

pub async fn authorize(state: &AppState, token: Option<&str>) -> Result<Caller, Error> {
    let database = state.database.lock().await;
    let user = auth::authorize(token, &**database)?;
    Ok(Caller { user })
}

/// Validate, hash, mint a token, persist. Returns the new id.
pub async fn register(state: &AppState, credentials: Credentials) -> Result<Id, Error> {
    let mut errors = validate::check_lengths(&credentials.username, &credentials.password);
    if !errors.contains_key("username") {
        let database = state.database.lock().await;
        if database.find_by_username(&credentials.username)?.is_some() {
            errors.insert("username".to_string(), USERNAME_TAKEN.to_string());
        }
    }
    if !errors.is_empty() {
        debug!("Registration rejected: {:?}", errors.keys());
        return Err(Error::Validation(errors));
    }

    let password_hash = hash_password(state, credentials.password).await?;
    let token = mint_token(state).await;

    let user = NewUser {
        username: credentials.username,
        password_hash,
        token,
    };
    let username = user.username.clone();

    // A concurrent registration may have taken the name since the check above;
    // the store's unique constraint catches that and it surfaces as a field error.
    let id = state.database.lock().await.insert(user)?;

    info!("Registered user {} ({})", id, username);
    Ok(id)
}

/// Check a username/password pair and hand back the account's existing token.
pub async fn authenticate(state: &AppState, credentials: Credentials) -> Result<User, Error> {
    let user = state
        .database
        .lock()
        .await
        .find_by_username(&credentials.username)?;

    let Some(user) = user else {
        debug!("Login for unknown user {}", credentials.username);
        return Err(Error::InvalidCredentials);
    };

    let hasher = state.hasher.clone();
    let password_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || {
        hasher.check_password(&credentials.password, &password_hash)
    })
    .await?;

    if !matches {
        debug!("Password incorrect for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    debug!("User {} logged in", user.id);
    Ok(user)
}

/// Make sure an account with `username` exists, registering it if not.
/// Run once at startup; an existing account is left untouched.
pub async fn ensure_seed_account(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<Id, Error> {
    if let Some(user) = state.database.lock().await.find_by_username(username)? {
        debug!("Seed account {} already exists as user {}", username, user.id);
        return Ok(user.id);
    }

    let id = register(
        state,
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        },
    )
    .await?;

    info!("Created seed account {} as user {}", username, id);
    Ok(id)
}

pub async fn fetch_user(state: &AppState, caller: &Caller, id: Id) -> Result<User, Error> {
    debug!("User {} fetching user {}", caller.user().id, id);
    state
        .database
        .lock()
        .await
        .find_by_id(id)?
        .ok_or(Error::NotFound)
}

pub async fn create_user(
    state: &AppState,
    caller: &Caller,
    credentials: Credentials,
) -> Result<Id, Error> {
    debug!("User {} creating a user", caller.user().id);
    register(state, credentials).await
}

/// Overwrite username and password of an existing user. The id and token stay.
pub async fn update_user(state: &AppState, caller: &Caller, edit: EditUser) -> Result<Id, Error> {
    debug!("User {} editing user {}", caller.user().id, edit.id);

    let existing = {
        let database = state.database.lock().await;
        let existing = database.find_by_id(edit.id)?.ok_or(Error::NotFound)?;

        let mut errors = validate::check_lengths(&edit.username, &edit.password);
        if !errors.contains_key("username") {
            if let Some(other) = database.find_by_username(&edit.username)? {
                if other.id != existing.id {
                    errors.insert("username".to_string(), USERNAME_TAKEN.to_string());
                }
            }
        }
        if !errors.is_empty() {
            debug!("Edit of user {} rejected: {:?}", edit.id, errors.keys());
            return Err(Error::Validation(errors));
        }

        existing
    };

    let password_hash = hash_password(state, edit.password).await?;
    let user = User {
        id: existing.id,
        username: edit.username,
        password_hash,
        token: existing.token,
    };

    state.database.lock().await.update(&user)?;

    info!("Edited user {}", user.id);
    Ok(user.id)
}

pub async fn delete_user(state: &AppState, caller: &Caller, id: Id) -> Result<Id, Error> {
    debug!("User {} deleting user {}", caller.user().id, id);

    let database = state.database.lock().await;
    if database.find_by_id(id)?.is_none() {
        return Err(Error::NotFound);
    }
    database.delete(id)?;

    info!("Deleted user {}", id);
    Ok(id)
}

/// Hash off the async runtime so other requests keep moving.
async fn hash_password(state: &AppState, password: String) -> Result<String, Error> {
    let hasher = state.hasher.clone();
    let password_hash =
        tokio::task::spawn_blocking(move || hasher.hash_password(&password)).await??;
    Ok(password_hash)
}

async fn mint_token(state: &AppState) -> Token {
    let mut rng = state.rng.lock().await;
    generate_token(&mut *rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::token, model::test_state};

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    async fn caller_for(state: &AppState, username: &str) -> Caller {
        let id = register(state, credentials(username, "secret1"))
            .await
            .unwrap();
        let user = state.database.lock().await.find_by_id(id).unwrap().unwrap();
        authorize(state, Some(user.token.as_str())).await.unwrap()
    }

    async fn user_count(state: &AppState, usernames: &[&str]) -> usize {
        let database = state.database.lock().await;
        usernames
            .iter()
            .filter(|name| database.find_by_username(name).unwrap().is_some())
            .count()
    }

    #[tokio::test]
    async fn register_stores_hash_and_token() {
        let state = test_state();
        let id = register(&state, credentials("alice", "secret1")).await.unwrap();

        let user = state.database.lock().await.find_by_id(id).unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "secret1");
        assert!(state.hasher.check_password("secret1", &user.password_hash));
        assert_eq!(user.token.len(), token::TOKEN_LENGTH);
        assert!(token::is_well_formed(&user.token));
    }

    #[tokio::test]
    async fn register_reports_all_short_fields() {
        let state = test_state();
        let Err(Error::Validation(errors)) = register(&state, credentials("abc", "12345")).await
        else {
            panic!("expected validation error");
        };

        assert!(errors.contains_key("username"));
        assert!(errors.contains_key("password"));
        assert_eq!(user_count(&state, &["abc"]).await, 0);
    }

    #[tokio::test]
    async fn register_duplicate_username() {
        let state = test_state();
        register(&state, credentials("alice", "secret1")).await.unwrap();

        let Err(Error::Validation(errors)) = register(&state, credentials("alice", "other-pw")).await
        else {
            panic!("expected validation error");
        };
        assert_eq!(errors["username"], USERNAME_TAKEN);
        assert!(!errors.contains_key("password"));
    }

    #[tokio::test]
    async fn duplicate_with_short_password_reports_both() {
        let state = test_state();
        register(&state, credentials("alice", "secret1")).await.unwrap();

        let Err(Error::Validation(errors)) = register(&state, credentials("alice", "x")).await
        else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 2);
    }

    #[tokio::test]
    async fn tokens_differ_between_accounts() {
        let state = test_state();
        let first = caller_for(&state, "alice").await;
        let second = caller_for(&state, "bobby").await;
        assert_ne!(first.user().token, second.user().token);
    }

    #[tokio::test]
    async fn concurrent_registrations_of_one_name_leave_one_record() {
        let state = std::sync::Arc::new(test_state());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let state = state.clone();
                tokio::spawn(async move { register(&state, credentials("alice", "secret1")).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(Error::Validation(errors)) => assert_eq!(errors["username"], USERNAME_TAKEN),
                Err(err) => panic!("unexpected error: {}", err),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(user_count(&state, &["alice"]).await, 1);
    }

    #[tokio::test]
    async fn authorize_rejects_unknown_tokens() {
        let state = test_state();
        caller_for(&state, "alice").await;

        assert!(matches!(
            authorize(&state, Some("AAAAAAAAAAAAAAAAAAAA")).await,
            Err(Error::Unauthorized)
        ));
        assert!(matches!(authorize(&state, None).await, Err(Error::Unauthorized)));
    }

    #[tokio::test]
    async fn authenticate_returns_existing_token() {
        let state = test_state();
        let caller = caller_for(&state, "alice").await;

        let user = authenticate(&state, credentials("alice", "secret1")).await.unwrap();
        assert_eq!(user.token, caller.user().token);

        assert!(matches!(
            authenticate(&state, credentials("alice", "wrong-pw")).await,
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&state, credentials("nobody", "secret1")).await,
            Err(Error::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn seed_account_is_idempotent() {
        let state = test_state();
        let first = ensure_seed_account(&state, "admin", "password").await.unwrap();
        let token = state.database.lock().await.find_by_id(first).unwrap().unwrap().token;

        let second = ensure_seed_account(&state, "admin", "changed").await.unwrap();
        assert_eq!(first, second);

        let user = state.database.lock().await.find_by_id(first).unwrap().unwrap();
        assert_eq!(user.token, token);
        assert!(state.hasher.check_password("password", &user.password_hash));
    }

    #[tokio::test]
    async fn seed_account_with_short_password_fails() {
        let state = test_state();
        assert!(matches!(
            ensure_seed_account(&state, "admin", "pw").await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn fetch_any_user_with_any_valid_token() {
        let state = test_state();
        let caller = caller_for(&state, "alice").await;
        let bob = register(&state, credentials("bobby", "secret1")).await.unwrap();

        let user = fetch_user(&state, &caller, bob).await.unwrap();
        assert_eq!(user.username, "bobby");

        assert!(matches!(
            fetch_user(&state, &caller, bob + 100).await,
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn create_user_validates_like_register() {
        let state = test_state();
        let caller = caller_for(&state, "alice").await;

        let id = create_user(&state, &caller, credentials("bobby", "secret1")).await.unwrap();
        assert!(id > caller.user().id);

        assert!(matches!(
            create_user(&state, &caller, credentials("bob", "secret1")).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn update_overwrites_username_and_rehashes() {
        let state = test_state();
        let caller = caller_for(&state, "alice").await;
        let id = caller.user().id;
        let before = fetch_user(&state, &caller, id).await.unwrap();

        let edited = update_user(
            &state,
            &caller,
            EditUser {
                id,
                username: "alice2".to_string(),
                password: "secret2".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(edited, id);

        let after = fetch_user(&state, &caller, id).await.unwrap();
        assert_eq!(after.username, "alice2");
        assert_ne!(after.password_hash, before.password_hash);
        assert!(state.hasher.check_password("secret2", &after.password_hash));
        assert_eq!(after.token, before.token);
    }

    #[tokio::test]
    async fn update_may_keep_own_username() {
        let state = test_state();
        let caller = caller_for(&state, "alice").await;

        let edit = EditUser {
            id: caller.user().id,
            username: "alice".to_string(),
            password: "secret9".to_string(),
        };
        assert!(update_user(&state, &caller, edit).await.is_ok());
    }

    #[tokio::test]
    async fn update_rejects_taken_username_and_missing_user() {
        let state = test_state();
        let caller = caller_for(&state, "alice").await;
        let bob = register(&state, credentials("bobby", "secret1")).await.unwrap();

        let taken = EditUser {
            id: bob,
            username: "alice".to_string(),
            password: "secret1".to_string(),
        };
        let Err(Error::Validation(errors)) = update_user(&state, &caller, taken).await else {
            panic!("expected validation error");
        };
        assert_eq!(errors["username"], USERNAME_TAKEN);

        let missing = EditUser {
            id: bob + 100,
            username: "carol".to_string(),
            password: "secret1".to_string(),
        };
        assert!(matches!(
            update_user(&state, &caller, missing).await,
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_is_permanent() {
        let state = test_state();
        let caller = caller_for(&state, "alice").await;
        let bob = register(&state, credentials("bobby", "secret1")).await.unwrap();

        assert_eq!(delete_user(&state, &caller, bob).await.unwrap(), bob);
        assert!(matches!(
            fetch_user(&state, &caller, bob).await,
            Err(Error::NotFound)
        ));
        assert!(matches!(
            delete_user(&state, &caller, bob).await,
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn deleting_self_revokes_token() {
        let state = test_state();
        let caller = caller_for(&state, "alice").await;
        let token = caller.user().token.clone();

        delete_user(&state, &caller, caller.user().id).await.unwrap();
        assert!(matches!(
            authorize(&state, Some(token.as_str())).await,
            Err(Error::Unauthorized)
        ));
    }
}
