mod auth;
mod register;
mod user;

use std::{sync::Arc, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{debug, error};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower_http::timeout::TimeoutLayer;

use crate::{accounts::Error, model::AppState};

pub fn router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/api/register", post(register::register))
        .route("/api/login", post(auth::login))
        .route(
            "/api/user",
            get(user::fetch)
                .post(user::create)
                .put(user::update)
                .delete(user::delete),
        )
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// Decode a JSON request body. An empty body reads as `{}`.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };

    serde_json::from_slice(body).map_err(|err| {
        debug!("Rejected request body: {}", err);
        Error::InvalidRequest
    })
}

fn respond(state: &AppState, result: Result<Value, Error>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(err) => error_response(err, state.strict_status_codes),
    }
}

/// Errors are told apart by payload. Status codes only differ from 200
/// when `strict` is set, except for internal failures.
fn error_response(err: Error, strict: bool) -> Response {
    let (status, body) = match err {
        Error::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "error": "invalid token" })),
        Error::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "invalid user" })),
        Error::Validation(errors) => (StatusCode::UNPROCESSABLE_ENTITY, json!(errors)),
        Error::InvalidRequest => (StatusCode::BAD_REQUEST, json!({ "error": "invalid request" })),
        Error::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            json!({ "error": "invalid credentials" }),
        ),
        Error::Internal(message) => {
            error!("Request failed: {}", message);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
                .into_response();
        }
    };

    let status = if strict { status } else { StatusCode::OK };
    (status, Json(body)).into_response()
}
