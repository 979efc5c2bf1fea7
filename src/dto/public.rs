use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    provider::PlayerState,
    state::server::{ConditionSet, GameServer},
};

/// Rotation policy as exposed to consumers.
#[derive(Debug, Serialize, ToSchema)]
pub struct PolicySummary {
    pub weight: f64,
    pub fallback: bool,
    pub temporary: bool,
    pub ignored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<ConditionsSummary>,
}

/// Live-state conditions of a rotation server.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConditionsSummary {
    pub min_players: Option<u32>,
    pub map_names: Option<Vec<String>>,
    pub game_types: Option<Vec<String>>,
    pub no_vehicles: Option<bool>,
}

impl From<&ConditionSet> for ConditionsSummary {
    fn from(conditions: &ConditionSet) -> Self {
        Self {
            min_players: conditions.min_players,
            map_names: conditions.map_names.clone(),
            game_types: conditions.game_types.clone(),
            no_vehicles: conditions.no_vehicles,
        }
    }
}

/// A server tracked by the rotation.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServerSummary {
    pub ip: String,
    pub port: u16,
    pub name: String,
    pub policy: PolicySummary,
    /// Mean of the score history, absent until the first sample.
    pub score: Option<f64>,
    /// Whether the selector would currently consider the server.
    pub selectable: bool,
    pub num_players: Option<u32>,
    pub max_players: Option<u32>,
    pub map_name: Option<String>,
}

impl ServerSummary {
    /// Project `server`; `selectable` is evaluated by the caller.
    pub fn new(server: &GameServer, selectable: bool) -> Self {
        let state = server.state();
        Self {
            ip: server.key().host.clone(),
            port: server.key().port,
            name: server.name(),
            policy: PolicySummary {
                weight: server.policy.weight,
                fallback: server.policy.fallback,
                temporary: server.policy.temporary,
                ignored: server.policy.ignored,
                conditions: server.policy.conditions.as_ref().map(ConditionsSummary::from),
            },
            score: server.current_score(),
            selectable,
            num_players: state.map(|state| state.num_players),
            max_players: state.map(|state| state.max_players),
            map_name: state.map(|state| state.map_name.clone()),
        }
    }
}

/// Response listing every server of the rotation.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServersResponse {
    pub servers: Vec<ServerSummary>,
}

/// Server the spectator is currently on.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentServerResponse {
    pub server: ServerSummary,
    /// Web link allowing viewers to join, when the server supports it.
    pub join_link_web: Option<String>,
    /// How long the spectator has been on the server, e.g. `an hour and 5 minutes`.
    pub time_on_server: Option<String>,
}

/// Player counts of the current server.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerSummary {
    pub max: u32,
    pub online: usize,
    pub human: usize,
    pub active: usize,
    pub bots: usize,
}

/// Query string of the top players route.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TopPlayersQuery {
    /// Number of players, 1 to 10 (defaults to 3).
    pub count: Option<i64>,
    /// Render the ranking as a single line of text.
    #[serde(default)]
    pub as_text: bool,
}

impl TopPlayersQuery {
    /// Requested count, falling back to 3 when absent or out of range.
    pub fn sanitized_count(&self) -> usize {
        match self.count {
            Some(count @ 1..=10) => count as usize,
            _ => 3,
        }
    }
}

/// A player entry of the current server.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerEntry {
    pub name: String,
    pub tag: String,
    pub score: i32,
    pub kills: u32,
    pub deaths: u32,
    pub ping: u32,
    pub team_label: String,
}

impl From<&PlayerState> for PlayerEntry {
    fn from(player: &PlayerState) -> Self {
        Self {
            name: player.name.clone(),
            tag: player.tag.clone(),
            score: player.score,
            kills: player.kills,
            deaths: player.deaths,
            ping: player.ping,
            team_label: player.team_label.clone(),
        }
    }
}

/// Response listing the best players of the current server.
#[derive(Debug, Serialize, ToSchema)]
pub struct TopPlayersResponse {
    pub players: Vec<PlayerEntry>,
}

/// Server the spectator has been told to join.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinTargetResponse {
    pub ip: String,
    pub game_port: u16,
    pub password: Option<String>,
    pub in_rotation: bool,
}

impl From<&GameServer> for JoinTargetResponse {
    fn from(server: &GameServer) -> Self {
        Self {
            ip: server.key().host.clone(),
            game_port: server.key().port,
            password: server.key().password.clone(),
            in_rotation: !server.policy.temporary,
        }
    }
}
