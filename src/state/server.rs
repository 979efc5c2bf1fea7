//! Game server entities tracked by the rotation.

use std::{
    fmt,
    time::{Duration, Instant},
};

use serde::Deserialize;

use crate::{
    provider::{PlayerState, ServerQuery, ServerState},
    state::queue::SampleQueue,
};

/// Identity of a game server. Two keys are equal only if host, port and password all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerKey {
    /// IPv4 address of the server.
    pub host: String,
    /// Game port.
    pub port: u16,
    /// Join password, if the server requires one.
    pub password: Option<String>,
}

impl ServerKey {
    /// Build a key from its parts.
    pub fn new(host: impl Into<String>, port: u16, password: Option<String>) -> Self {
        Self {
            host: host.into(),
            port,
            password,
        }
    }

    /// Whether the key points at `host:port`, whatever the password.
    pub fn matches_address(&self, host: &str, port: u16) -> bool {
        self.host == host && self.port == port
    }

    /// Polling query for this server.
    pub fn query(&self) -> ServerQuery {
        ServerQuery::new(self.host.clone(), self.port)
    }
}

impl fmt::Display for ServerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Live-state requirements a server must meet to be selectable. Absent fields impose nothing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionSet {
    /// Minimum number of human players.
    pub min_players: Option<u32>,
    /// Maps the server must be playing.
    pub map_names: Option<Vec<String>>,
    /// Game types the server must be playing.
    pub game_types: Option<Vec<String>>,
    /// Required value of the "no vehicles" flag.
    pub no_vehicles: Option<bool>,
}

/// How a server takes part in the rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationPolicy {
    /// Multiplier applied to every score sample.
    pub weight: f64,
    /// Fallback servers are always selectable.
    pub fallback: bool,
    /// Temporary servers are never selectable and get dropped once unused.
    pub temporary: bool,
    /// Ignored servers are never picked by the selector.
    pub ignored: bool,
    /// Optional live-state conditions.
    pub conditions: Option<ConditionSet>,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            weight: 1.0,
            fallback: false,
            temporary: false,
            ignored: false,
            conditions: None,
        }
    }
}

impl RotationPolicy {
    /// Policy of a server added outside of the configured rotation.
    pub fn temporary() -> Self {
        Self {
            temporary: true,
            ..Self::default()
        }
    }
}

/// Last successful poll of a server.
#[derive(Debug, Clone)]
pub struct LiveState {
    /// Polled state, players sorted by descending score.
    pub state: ServerState,
    /// When the poll result was applied.
    pub updated_at: Instant,
}

/// A server of the rotation with its policy, live state, score history and session marker.
#[derive(Debug, Clone)]
pub struct GameServer {
    key: ServerKey,
    /// Rotation policy, replaced on reload.
    pub policy: RotationPolicy,
    live: Option<LiveState>,
    scores: SampleQueue<f64>,
    on_server_since: Option<Instant>,
}

impl GameServer {
    /// Build an entity without live state or score history.
    pub fn new(key: ServerKey, policy: RotationPolicy, score_sample_size: usize) -> Self {
        Self {
            key,
            policy,
            live: None,
            scores: SampleQueue::new(score_sample_size),
            on_server_since: None,
        }
    }

    /// Identity of the server.
    pub fn key(&self) -> &ServerKey {
        &self.key
    }

    /// Last applied poll result, if any.
    pub fn live(&self) -> Option<&LiveState> {
        self.live.as_ref()
    }

    /// Last polled state, if any.
    pub fn state(&self) -> Option<&ServerState> {
        self.live.as_ref().map(|live| &live.state)
    }

    /// Server name, or its address while it was never polled.
    pub fn name(&self) -> String {
        match self.state() {
            Some(state) if !state.name.is_empty() => state.name.clone(),
            _ => self.key.to_string(),
        }
    }

    /// Replace the live state wholesale.
    pub fn apply_state(&mut self, mut state: ServerState, now: Instant) {
        state.players.sort_by(|a, b| b.score.cmp(&a.score));
        self.live = Some(LiveState {
            state,
            updated_at: now,
        });
    }

    /// Players sorted by descending score, empty without live state.
    pub fn players(&self) -> &[PlayerState] {
        self.state()
            .map(|state| state.players.as_slice())
            .unwrap_or_default()
    }

    /// Players that are not bots.
    pub fn human_players<'a>(
        &'a self,
        spectator_name: &'a str,
    ) -> impl Iterator<Item = &'a PlayerState> + 'a {
        self.players()
            .iter()
            .filter(move |player| !player.is_bot(spectator_name))
    }

    /// Human players that scored, killed or died this round.
    pub fn active_players<'a>(
        &'a self,
        spectator_name: &'a str,
    ) -> impl Iterator<Item = &'a PlayerState> + 'a {
        self.human_players(spectator_name)
            .filter(|player| player.is_active())
    }

    /// Players counted as bots.
    pub fn bots<'a>(&'a self, spectator_name: &'a str) -> impl Iterator<Item = &'a PlayerState> + 'a {
        self.players()
            .iter()
            .filter(move |player| player.is_bot(spectator_name))
    }

    /// Find a player by exact name.
    pub fn player(&self, name: &str) -> Option<&PlayerState> {
        self.players().iter().find(|player| player.name == name)
    }

    /// Append a score sample, evicting the oldest when the history is full.
    pub fn push_score(&mut self, score: f64) {
        self.scores.push(score);
    }

    /// Mean of the score history, `None` when empty.
    pub fn current_score(&self) -> Option<f64> {
        self.scores.mean()
    }

    /// Whether the score history holds its full sample count.
    pub fn scores_full(&self) -> bool {
        self.scores.is_full()
    }

    /// Mark the spectator as watching this server since `now`.
    pub fn start_session(&mut self, now: Instant) {
        self.on_server_since = Some(now);
    }

    /// Forget the session marker.
    pub fn clear_session(&mut self) {
        self.on_server_since = None;
    }

    /// How long the spectator has been on this server, `None` if it has not joined.
    pub fn time_on_server(&self, now: Instant) -> Option<Duration> {
        self.on_server_since
            .map(|since| now.saturating_duration_since(since))
    }

    /// Whether the spectator is currently on this server.
    pub fn has_spectator_joined(&self) -> bool {
        self.on_server_since.is_some()
    }
}
