//! Wire models of the bflist server API.

use serde::Deserialize;

use crate::provider::models::{PlayerState, ServerState};

/// Page of servers returned by the listing endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPage {
    pub servers: Vec<BflistServer>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Server document as served by bflist.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BflistServer {
    pub ip: String,
    pub port: u16,
    pub name: String,
    pub num_players: u32,
    pub max_players: u32,
    #[serde(default)]
    pub map_name: String,
    #[serde(default)]
    pub map_size: u32,
    #[serde(default)]
    pub game_type: String,
    #[serde(default)]
    pub reserved_slots: u32,
    #[serde(default)]
    pub no_vehicles: bool,
    #[serde(default)]
    pub join_link_web: Option<String>,
    #[serde(default)]
    pub players: Vec<BflistPlayer>,
}

/// Player entry nested in a [`BflistServer`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BflistPlayer {
    pub pid: u32,
    pub name: String,
    #[serde(default)]
    pub tag: String,
    pub score: i32,
    pub kills: u32,
    pub deaths: u32,
    pub ping: u32,
    pub team: u32,
    #[serde(default)]
    pub team_label: String,
    #[serde(default)]
    pub aibot: bool,
}

impl BflistServer {
    /// `ip:port` key used to match listing entries against queries.
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

impl From<BflistServer> for ServerState {
    fn from(value: BflistServer) -> Self {
        Self {
            name: value.name,
            num_players: value.num_players,
            max_players: value.max_players,
            map_name: value.map_name,
            map_size: value.map_size,
            game_type: value.game_type,
            reserved_slots: value.reserved_slots,
            no_vehicles: value.no_vehicles,
            join_link_web: value.join_link_web,
            players: value.players.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<BflistPlayer> for PlayerState {
    fn from(value: BflistPlayer) -> Self {
        Self {
            pid: value.pid,
            name: value.name,
            tag: value.tag,
            score: value.score,
            kills: value.kills,
            deaths: value.deaths,
            ping: value.ping,
            team: value.team,
            team_label: value.team_label,
            aibot: value.aibot,
        }
    }
}
