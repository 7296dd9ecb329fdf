use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::SecurityConfig;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argon2 parameters: {0}")]
    Params(argon2::Error),

    #[error("failed to hash password: {0}")]
    Hash(argon2::password_hash::Error),
}

/// Salted Argon2id password hasher.
///
/// Cheap to clone so it can be moved onto a blocking thread per request.
#[derive(Clone, Debug)]
pub struct Hasher {
    params: Params,
}

impl Hasher {
    pub fn new(config: &SecurityConfig) -> Result<Hasher, Error> {
        let params = Params::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
            None,
        )
        .map_err(Error::Params)?;

        Ok(Hasher { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password into a PHC string (`$argon2id$v=19$...`) with a fresh salt.
    pub fn hash_password(&self, password: &str) -> Result<String, Error> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(Error::Hash)?
            .to_string();

        Ok(password_hash)
    }

    /// Check a password against a stored PHC string.
    /// The cost parameters are read from the hash itself, not from `self`.
    pub fn check_password(&self, password: &str, password_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(password_hash) else {
            return false;
        };

        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
pub fn test_hasher() -> Hasher {
    Hasher::new(&SecurityConfig {
        argon2_memory_kib: 64,
        argon2_iterations: 1,
        argon2_parallelism: 1,
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_own_hash() {
        let hasher = test_hasher();
        let hash = hasher.hash_password("secret1").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, "secret1");
        assert!(hasher.check_password("secret1", &hash));
    }

    #[test]
    fn rejects_other_password() {
        let hasher = test_hasher();
        let hash = hasher.hash_password("secret1").unwrap();

        assert!(!hasher.check_password("secret2", &hash));
        assert!(!hasher.check_password("", &hash));
    }

    #[test]
    fn same_password_gets_different_salts() {
        let hasher = test_hasher();
        let first = hasher.hash_password("secret1").unwrap();
        let second = hasher.hash_password("secret1").unwrap();

        assert_ne!(first, second);
        assert!(hasher.check_password("secret1", &first));
        assert!(hasher.check_password("secret1", &second));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        let hasher = test_hasher();
        assert!(!hasher.check_password("secret1", "secret1"));
        assert!(!hasher.check_password("secret1", ""));
    }

    #[test]
    fn hashes_from_other_params_still_verify() {
        let strong = Hasher::new(&SecurityConfig {
            argon2_memory_kib: 128,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        })
        .unwrap();
        let hash = strong.hash_password("secret1").unwrap();

        assert!(test_hasher().check_password("secret1", &hash));
    }

    #[test]
    fn invalid_params_are_rejected() {
        let result = Hasher::new(&SecurityConfig {
            argon2_memory_kib: 64,
            argon2_iterations: 0,
            argon2_parallelism: 1,
        });

        assert!(matches!(result, Err(Error::Params(_))));
    }
}
