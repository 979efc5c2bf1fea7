use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::server::ServerKey;

/// Command sent to connected spectator clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpectatorCommand {
    /// Join the given server.
    Join(ServerKey),
    /// Leave the halted phase.
    Release,
    /// Operator command forwarded as-is.
    Forward(ForwardedCommand),
}

/// Operator commands relayed verbatim to the spectator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ForwardedCommand {
    /// Start streaming.
    Start,
    /// Stop streaming.
    Stop,
    /// Toggle debug options.
    Debug,
    /// Restart the game client.
    GameRestart,
    /// Stay on the current player for a while.
    RotationPause,
    /// Resume player rotation.
    RotationResume,
    /// Skip to the next player.
    NextPlayer,
    /// Respawn and restart spectating.
    Respawn,
    /// Disconnect and rejoin the current server.
    Rejoin,
}

impl ForwardedCommand {
    /// Wire name of the command.
    pub fn as_str(self) -> &'static str {
        match self {
            ForwardedCommand::Start => "start",
            ForwardedCommand::Stop => "stop",
            ForwardedCommand::Debug => "debug",
            ForwardedCommand::GameRestart => "game_restart",
            ForwardedCommand::RotationPause => "rotation_pause",
            ForwardedCommand::RotationResume => "rotation_resume",
            ForwardedCommand::NextPlayer => "next_player",
            ForwardedCommand::Respawn => "respawn",
            ForwardedCommand::Rejoin => "rejoin",
        }
    }

    /// Canned reply confirming the command.
    pub fn acknowledgement(self) -> &'static str {
        match self {
            ForwardedCommand::Start => "Yessir, stream will start shortly",
            ForwardedCommand::Stop => "If you say so... Stream will stop shortly",
            ForwardedCommand::Debug => "Guess I can do that. Toggling debug options.",
            ForwardedCommand::GameRestart => "Ok, will restart the game shortly",
            ForwardedCommand::RotationPause => "Roger, will stay on current player for 5 minutes",
            ForwardedCommand::RotationResume => "Confirmed, resuming player rotation",
            ForwardedCommand::NextPlayer => "Right away, skipping to next player",
            ForwardedCommand::Respawn => "Alright, will spawn and restart spectating shortly",
            ForwardedCommand::Rejoin => "Sure, will disconnect and rejoin server momentarily",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_serde() {
        for command in [
            ForwardedCommand::GameRestart,
            ForwardedCommand::RotationPause,
            ForwardedCommand::NextPlayer,
            ForwardedCommand::Rejoin,
        ] {
            let json = serde_json::to_string(&command).unwrap();
            assert_eq!(json, format!("\"{}\"", command.as_str()));
        }
    }
}
