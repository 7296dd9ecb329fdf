use rand::{Rng, RngCore};

use crate::model::user::Token;

pub const TOKEN_LENGTH: usize = 20;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Randomness used to mint tokens. Production wiring uses `OsRng`,
/// tests hand in a seeded generator.
pub type TokenRng = Box<dyn RngCore + Send>;

pub fn os_rng() -> TokenRng {
    Box::new(rand_core::OsRng)
}

/// Draw a fixed-length token, each symbol uniform over `[A-Za-z0-9]`.
pub fn generate_token<R: Rng + ?Sized>(rng: &mut R) -> Token {
    (0..TOKEN_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Whether `token` could have been produced by [`generate_token`].
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}
