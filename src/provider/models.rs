//! Live server state as reported by a polling source.

/// Snapshot of a game server returned by a single successful lookup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerState {
    /// Display name of the server.
    pub name: String,
    /// Number of occupied player slots.
    pub num_players: u32,
    /// Total number of player slots.
    pub max_players: u32,
    /// Name of the map currently being played (empty when unknown).
    pub map_name: String,
    /// Size variant of the current map.
    pub map_size: u32,
    /// Game type (mode) currently being played (empty when unknown).
    pub game_type: String,
    /// Slots reserved for privileged players.
    pub reserved_slots: u32,
    /// Whether the current map layout has no vehicles.
    pub no_vehicles: bool,
    /// Web link allowing viewers to join the server, if supported.
    pub join_link_web: Option<String>,
    /// Players on the server, in the order the source reported them.
    pub players: Vec<PlayerState>,
}

/// A single player entry on a game server.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerState {
    /// Player id within the server.
    pub pid: u32,
    /// Player name without clan tag.
    pub name: String,
    /// Clan tag (empty when none).
    pub tag: String,
    /// Current round score.
    pub score: i32,
    /// Kills this round.
    pub kills: u32,
    /// Deaths this round.
    pub deaths: u32,
    /// Last reported ping.
    pub ping: u32,
    /// Team index.
    pub team: u32,
    /// Team display label.
    pub team_label: String,
    /// Whether the source flags the player as an AI bot.
    pub aibot: bool,
}

impl PlayerState {
    /// Whether this player is a bot: flagged as such, the spectator account itself, or an
    /// idle placeholder with zero ping, score, kills and deaths.
    pub fn is_bot(&self, spectator_name: &str) -> bool {
        self.aibot
            || self.name == spectator_name
            || !(self.ping > 0 || self.score != 0 || self.kills != 0 || self.deaths != 0)
    }

    /// Whether the player has done anything this round.
    pub fn is_active(&self) -> bool {
        self.score != 0 || self.kills != 0 || self.deaths != 0
    }
}
