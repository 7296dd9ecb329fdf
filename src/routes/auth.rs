use std::sync::Arc;

use axum::{body::Bytes, extract::State, response::Response};
use axum_macros::debug_handler;
use log::debug;
use serde_json::{json, Value};

use super::{parse_body, respond};
use crate::{
    accounts::{self, Credentials, Error},
    model::AppState,
};

/// Exchange a username and password for the account's bearer token.
/// The token is the one issued at sign-up; logging in never rotates it.
#[debug_handler]
pub async fn login(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    respond(&state, handle(&state, &body).await)
}

async fn handle(state: &AppState, body: &[u8]) -> Result<Value, Error> {
    let credentials: Credentials = parse_body(body)?;
    debug!("Got login request for user: {}", credentials.username);

    let user = accounts::authenticate(state, credentials).await?;
    Ok(json!({ "id": user.id, "token": user.token }))
}
