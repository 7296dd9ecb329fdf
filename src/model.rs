pub mod database;
pub mod store;
pub mod user;

use tokio::sync::Mutex;

use crate::auth::{hash::Hasher, token::TokenRng};

pub use database::Database;
pub use store::UserStore;
pub use user::User;

pub struct AppState {
    pub database: Mutex<Box<dyn UserStore>>,
    pub hasher: Hasher,
    pub rng: Mutex<TokenRng>,
    pub strict_status_codes: bool,
}

impl AppState {
    pub fn new(
        database: Box<dyn UserStore>,
        hasher: Hasher,
        rng: TokenRng,
        strict_status_codes: bool,
    ) -> AppState {
        AppState {
            database: Mutex::new(database),
            hasher,
            rng: Mutex::new(rng),
            strict_status_codes,
        }
    }
}

#[cfg(test)]
pub fn test_state() -> AppState {
    use rand::{rngs::StdRng, SeedableRng};

    AppState::new(
        Box::new(Database::in_memory().unwrap()),
        crate::auth::hash::test_hasher(),
        Box::new(StdRng::seed_from_u64(0x5eed)),
        false,
    )
}
