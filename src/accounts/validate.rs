use super::error::FieldErrors;

pub const MIN_USERNAME_LENGTH: usize = 4;
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub const USERNAME_TAKEN: &str = "An account with this username already exists.";

fn too_short(min: usize) -> String {
    format!(
        "This value is too short. It should have {} characters or more.",
        min
    )
}

/// Length rules for a username/password pair. Lengths count characters, not bytes.
/// Every violated field gets an entry.
pub fn check_lengths(username: &str, password: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if username.chars().count() < MIN_USERNAME_LENGTH {
        errors.insert("username".to_string(), too_short(MIN_USERNAME_LENGTH));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.insert("password".to_string(), too_short(MIN_PASSWORD_LENGTH));
    }

    errors
}
