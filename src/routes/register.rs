use std::sync::Arc;

use axum::{body::Bytes, extract::State, response::Response};
use axum_macros::debug_handler;
use serde_json::{json, Value};

use super::{parse_body, respond};
use crate::{
    accounts::{self, Credentials, Error},
    model::AppState,
};

/// Sign-up. No token required; otherwise behaves like `POST /api/user`.
#[debug_handler]
pub async fn register(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    respond(&state, handle(&state, &body).await)
}

async fn handle(state: &AppState, body: &[u8]) -> Result<Value, Error> {
    let credentials: Credentials = parse_body(body)?;
    let id = accounts::register(state, credentials).await?;
    Ok(json!({ "created id": id }))
}
