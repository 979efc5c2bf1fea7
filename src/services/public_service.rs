//! Read-only projections of the rotation served to the chat bot and overlays.

use std::time::Duration;

use crate::{
    config::CustomCommand,
    dto::public::{
        CurrentServerResponse, JoinTargetResponse, PlayerEntry, PlayerSummary, ServerSummary,
        ServersResponse, TopPlayersQuery, TopPlayersResponse,
    },
    error::ServiceError,
    provider::PlayerState,
    state::{SharedState, scoring::selectable},
};

const NOT_ON_SERVER: &str = "spectator is not on any server";

/// Top players, either as entries or as a single chat line.
pub enum TopPlayers {
    /// Structured ranking.
    Entries(TopPlayersResponse),
    /// Ranking rendered for chat.
    Text(String),
}

/// Render a duration the way it is posted in chat, e.g. `2 hours and a minute`.
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.as_secs() / 60;
    if total_minutes == 0 {
        return "just a moment".to_string();
    }

    let mut elements = Vec::with_capacity(2);
    match total_minutes / 60 {
        0 => {}
        1 => elements.push("an hour".to_string()),
        hours => elements.push(format!("{hours} hours")),
    }
    match total_minutes % 60 {
        0 => {}
        1 => elements.push("a minute".to_string()),
        minutes => elements.push(format!("{minutes} minutes")),
    }
    elements.join(" and ")
}

/// Render a ranking as `#1: TAG Name [Team], #2: ...`.
pub fn format_ranking(players: &[PlayerState]) -> String {
    players
        .iter()
        .enumerate()
        .map(|(index, player)| {
            let tag = if player.tag.is_empty() {
                String::new()
            } else {
                format!("{} ", player.tag)
            };
            format!(
                "#{}: {tag}{} [{}]",
                index + 1,
                player.name,
                player.team_label
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// List every server of the rotation.
pub async fn list_servers(state: &SharedState) -> Result<ServersResponse, ServiceError> {
    state
        .controller()
        .inspect(|rotation, now| ServersResponse {
            servers: rotation
                .servers()
                .map(|server| {
                    ServerSummary::new(server, selectable(server, now, rotation.settings()))
                })
                .collect(),
        })
        .await
}

/// Describe the server the spectator is on.
pub async fn current_server(state: &SharedState) -> Result<CurrentServerResponse, ServiceError> {
    state
        .controller()
        .inspect(|rotation, now| {
            rotation.current().map(|server| CurrentServerResponse {
                server: ServerSummary::new(server, selectable(server, now, rotation.settings())),
                join_link_web: server.state().and_then(|state| state.join_link_web.clone()),
                time_on_server: server.time_on_server(now).map(format_duration),
            })
        })
        .await?
        .ok_or_else(|| ServiceError::NotFound(NOT_ON_SERVER.into()))
}

/// Count players on the current server.
pub async fn player_summary(state: &SharedState) -> Result<PlayerSummary, ServiceError> {
    state
        .controller()
        .inspect(|rotation, _| {
            let spectator = rotation.settings().spectator_name.as_str();
            let server = rotation.current()?;
            let live = server.state()?;
            Some(PlayerSummary {
                max: live.max_players,
                online: server.players().len(),
                human: server.human_players(spectator).count(),
                active: server.active_players(spectator).count(),
                bots: server.bots(spectator).count(),
            })
        })
        .await?
        .ok_or_else(|| ServiceError::NotFound(NOT_ON_SERVER.into()))
}

/// Best players of the current server by round score.
pub async fn top_players(
    state: &SharedState,
    query: TopPlayersQuery,
) -> Result<TopPlayers, ServiceError> {
    let count = query.sanitized_count();
    let players = state
        .controller()
        .inspect(move |rotation, _| {
            let server = rotation.current()?;
            server.state()?;
            Some(server.players().iter().take(count).cloned().collect::<Vec<_>>())
        })
        .await?
        .ok_or_else(|| ServiceError::NotFound(NOT_ON_SERVER.into()))?;

    Ok(if query.as_text {
        TopPlayers::Text(format_ranking(&players))
    } else {
        TopPlayers::Entries(TopPlayersResponse {
            players: players.iter().map(PlayerEntry::from).collect(),
        })
    })
}

/// Server the spectator has been told to join.
pub async fn join_target(state: &SharedState) -> Result<JoinTargetResponse, ServiceError> {
    state
        .controller()
        .inspect(|rotation, _| rotation.to_join().map(JoinTargetResponse::from))
        .await?
        .ok_or_else(|| ServiceError::NotFound("no server to join".into()))
}

/// Custom chat command definitions.
pub fn custom_commands(state: &SharedState) -> Vec<CustomCommand> {
    state.custom_commands().to_vec()
}
