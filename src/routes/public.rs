use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{
    config::CustomCommand,
    dto::public::{
        CurrentServerResponse, JoinTargetResponse, PlayerSummary, ServersResponse, TopPlayersQuery,
        TopPlayersResponse,
    },
    error::AppError,
    services::public_service::{self, TopPlayers},
    state::SharedState,
};

/// Public read-only endpoints exposing the rotation and the current server.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/servers", get(list_servers))
        .route("/servers/current", get(current_server))
        .route("/servers/current/players", get(player_summary))
        .route("/servers/current/players/top", get(top_players))
        .route("/servers/join", get(join_target))
        .route("/commands", get(custom_commands))
}

#[utoipa::path(
    get,
    path = "/servers",
    tag = "public",
    responses((status = 200, description = "Rotation servers", body = ServersResponse))
)]
/// Return every server tracked by the rotation.
pub async fn list_servers(
    State(state): State<SharedState>,
) -> Result<Json<ServersResponse>, AppError> {
    Ok(Json(public_service::list_servers(&state).await?))
}

#[utoipa::path(
    get,
    path = "/servers/current",
    tag = "public",
    responses(
        (status = 200, description = "Current server", body = CurrentServerResponse),
        (status = 404, description = "Spectator not on any server")
    )
)]
/// Return the server the spectator is on.
pub async fn current_server(
    State(state): State<SharedState>,
) -> Result<Json<CurrentServerResponse>, AppError> {
    Ok(Json(public_service::current_server(&state).await?))
}

#[utoipa::path(
    get,
    path = "/servers/current/players",
    tag = "public",
    responses(
        (status = 200, description = "Player counts", body = PlayerSummary),
        (status = 404, description = "Spectator not on any server")
    )
)]
/// Return player counts of the current server.
pub async fn player_summary(
    State(state): State<SharedState>,
) -> Result<Json<PlayerSummary>, AppError> {
    Ok(Json(public_service::player_summary(&state).await?))
}

#[utoipa::path(
    get,
    path = "/servers/current/players/top",
    tag = "public",
    params(TopPlayersQuery),
    responses(
        (status = 200, description = "Top players as JSON, or as text with `as_text`", body = TopPlayersResponse),
        (status = 404, description = "Spectator not on any server")
    )
)]
/// Return the best players of the current server.
pub async fn top_players(
    State(state): State<SharedState>,
    Query(query): Query<TopPlayersQuery>,
) -> Result<Response, AppError> {
    Ok(match public_service::top_players(&state, query).await? {
        TopPlayers::Entries(entries) => Json(entries).into_response(),
        TopPlayers::Text(text) => text.into_response(),
    })
}

#[utoipa::path(
    get,
    path = "/servers/join",
    tag = "public",
    responses(
        (status = 200, description = "Pending join target", body = JoinTargetResponse),
        (status = 404, description = "No server to join")
    )
)]
/// Return the server the spectator has been told to join.
pub async fn join_target(
    State(state): State<SharedState>,
) -> Result<Json<JoinTargetResponse>, AppError> {
    Ok(Json(public_service::join_target(&state).await?))
}

#[utoipa::path(
    get,
    path = "/commands",
    tag = "public",
    responses((status = 200, description = "Custom chat commands", body = [CustomCommand]))
)]
/// Return the custom chat command definitions.
pub async fn custom_commands(State(state): State<SharedState>) -> Json<Vec<CustomCommand>> {
    Json(public_service::custom_commands(&state))
}
