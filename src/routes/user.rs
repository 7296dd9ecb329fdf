use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
};
use axum_macros::debug_handler;
use serde_json::{json, Value};

use super::{parse_body, respond};
use crate::{
    accounts::{self, Credentials, EditUser, Error, TargetUser},
    model::{user::Id, AppState},
};

const TOKEN_HEADER: &str = "token";

fn token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
}

/// GET carries the id in the body like the other methods, but `?id=` works too.
fn target_id(body: &[u8], query: &HashMap<String, String>) -> Result<Id, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        if let Some(id) = query.get("id") {
            return id.trim().parse().map_err(|_| Error::InvalidRequest);
        }
    }

    let target: TargetUser = parse_body(body)?;
    Ok(target.id)
}

#[debug_handler]
pub async fn fetch(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let result = async {
        let caller = accounts::authorize(&state, token(&headers)).await?;
        let id = target_id(&body, &query)?;
        let user = accounts::fetch_user(&state, &caller, id).await?;
        Ok::<_, Error>(json!(user))
    };

    respond(&state, result.await)
}

#[debug_handler]
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    respond(&state, handle_create(&state, &headers, &body).await)
}

async fn handle_create(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<Value, Error> {
    let caller = accounts::authorize(state, token(headers)).await?;
    let credentials: Credentials = parse_body(body)?;
    let id = accounts::create_user(state, &caller, credentials).await?;
    Ok(json!({ "created id": id }))
}

#[debug_handler]
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    respond(&state, handle_update(&state, &headers, &body).await)
}

async fn handle_update(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<Value, Error> {
    let caller = accounts::authorize(state, token(headers)).await?;
    let edit: EditUser = parse_body(body)?;
    let id = accounts::update_user(state, &caller, edit).await?;
    Ok(json!({ "edited user": id }))
}

#[debug_handler]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    respond(&state, handle_delete(&state, &headers, &body).await)
}

async fn handle_delete(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<Value, Error> {
    let caller = accounts::authorize(state, token(headers)).await?;
    let target: TargetUser = parse_body(body)?;
    let id = accounts::delete_user(state, &caller, target.id).await?;
    Ok(json!({ "deleted id": id }))
}
