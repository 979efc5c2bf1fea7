use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::post,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    dto::admin::{
        ActionResponse, JoinRequest, ReloadResponse, ServerAddressRequest, SpectatorCommandRequest,
    },
    error::AppError,
    services::admin_service,
    state::SharedState,
};

const APP_KEY_HEADER: &str = "x-app-key";

/// Operator endpoints driving the spectator and the rotation.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/join", post(join_server))
        .route("/admin/ignore", post(ignore_server))
        .route("/admin/notice", post(notice_server))
        .route("/admin/spectator/command", post(forward_command))
        .route("/admin/rotation/reload", post(reload_rotation))
        .route_layer(middleware::from_fn_with_state(state, require_app_key))
}

/// Send the spectator to a server.
#[utoipa::path(
    post,
    path = "/admin/join",
    tag = "admin",
    params(("X-App-Key" = String, Header, description = "Configured application key")),
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Join queued or already on server", body = ActionResponse),
        (status = 400, description = "Invalid address")
    )
)]
pub async fn join_server(
    State(state): State<SharedState>,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    Ok(Json(admin_service::join_server(&state, payload).await?))
}

/// Exclude a rotation server from selection.
#[utoipa::path(
    post,
    path = "/admin/ignore",
    tag = "admin",
    params(("X-App-Key" = String, Header, description = "Configured application key")),
    request_body = ServerAddressRequest,
    responses(
        (status = 200, description = "Server ignored", body = ActionResponse),
        (status = 404, description = "Server not in rotation")
    )
)]
pub async fn ignore_server(
    State(state): State<SharedState>,
    Json(payload): Json<ServerAddressRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    Ok(Json(admin_service::set_ignored(&state, payload, true).await?))
}

/// Make an ignored rotation server selectable again.
#[utoipa::path(
    post,
    path = "/admin/notice",
    tag = "admin",
    params(("X-App-Key" = String, Header, description = "Configured application key")),
    request_body = ServerAddressRequest,
    responses(
        (status = 200, description = "Server noticed", body = ActionResponse),
        (status = 404, description = "Server not in rotation")
    )
)]
pub async fn notice_server(
    State(state): State<SharedState>,
    Json(payload): Json<ServerAddressRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    Ok(Json(admin_service::set_ignored(&state, payload, false).await?))
}

/// Forward a command to the connected spectator.
#[utoipa::path(
    post,
    path = "/admin/spectator/command",
    tag = "admin",
    params(("X-App-Key" = String, Header, description = "Configured application key")),
    request_body = SpectatorCommandRequest,
    responses(
        (status = 200, description = "Command forwarded", body = ActionResponse),
        (status = 409, description = "No spectator connected")
    )
)]
pub async fn forward_command(
    State(state): State<SharedState>,
    Json(payload): Json<SpectatorCommandRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::forward_command(&state, payload)?))
}

/// Re-read the rotation file.
#[utoipa::path(
    post,
    path = "/admin/rotation/reload",
    tag = "admin",
    params(("X-App-Key" = String, Header, description = "Configured application key")),
    responses(
        (status = 200, description = "Rotation reloaded", body = ReloadResponse),
        (status = 409, description = "Rotation file rejected, previous rotation kept")
    )
)]
pub async fn reload_rotation(
    State(state): State<SharedState>,
) -> Result<Json<ReloadResponse>, AppError> {
    Ok(Json(admin_service::reload_rotation(&state).await?))
}

#[derive(Deserialize)]
struct AppKeyQuery {
    app_key: Option<String>,
}

async fn require_app_key(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.settings().app_key.as_deref() else {
        return Ok(next.run(req).await);
    };

    let provided = req
        .headers()
        .get(APP_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .or_else(|| {
            Query::<AppKeyQuery>::try_from_uri(req.uri())
                .ok()
                .and_then(|Query(query)| query.app_key)
        })
        .ok_or_else(|| AppError::Unauthorized("missing app key".into()))?;

    if provided == expected {
        Ok(next.run(req).await)
    } else {
        Err(AppError::Unauthorized("invalid app key".into()))
    }
}
