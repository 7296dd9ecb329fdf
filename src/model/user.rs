pub type Id = i64;
pub type Token = String;

/// A stored account.
///
/// Serialized verbatim by the fetch endpoint, hash and token included.
/// That exposure is kept for API compatibility; a hardened deployment
/// should not hand these fields to clients.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    #[serde(rename = "passwordHash")]
    pub password_hash: String,
    pub token: Token,
}

/// A [`User`] that has not been assigned an id yet.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub token: Token,
}
