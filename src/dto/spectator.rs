//! Messages exchanged with the spectator client over `/ws/spectator`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
    dto::validation::parse_port,
    state::{
        phase::{GamePhase, PhaseReport},
        server::ServerKey,
        spectator::SpectatorCommand,
    },
};

/// Server address as the spectator sends and receives it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct ServerDto {
    /// IPv4 address of the server.
    pub ip: String,
    /// Game port, as text.
    #[serde(deserialize_with = "port_as_text")]
    pub port: String,
    /// Join password, `null` when none.
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WirePort {
    Text(String),
    Number(u64),
}

fn port_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match WirePort::deserialize(deserializer)? {
        WirePort::Text(text) => text,
        WirePort::Number(number) => number.to_string(),
    })
}

impl From<&ServerKey> for ServerDto {
    fn from(key: &ServerKey) -> Self {
        Self {
            ip: key.host.clone(),
            port: key.port.to_string(),
            password: key.password.clone(),
        }
    }
}

impl TryFrom<ServerDto> for ServerKey {
    type Error = SpectatorMessageError;

    fn try_from(dto: ServerDto) -> Result<Self, Self::Error> {
        let port = parse_port(&dto.port).map_err(|_| SpectatorMessageError::InvalidPort(dto.port))?;
        let password = dto.password.filter(|password| !password.is_empty());
        Ok(ServerKey::new(dto.ip, port, password))
    }
}

/// Problems with a message received from the spectator.
#[derive(Debug, Error)]
pub enum SpectatorMessageError {
    /// The frame is not a known message.
    #[error("malformed spectator message: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The reported port is not a valid port.
    #[error("invalid port `{0}`")]
    InvalidPort(String),
    /// A halted report did not say which server the spectator is stuck on.
    #[error("halted phase reported without a server")]
    HaltedWithoutServer,
}

/// Messages accepted from the spectator, tagged by `event`.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum SpectatorInboundMessage {
    /// The game phase changed.
    Phase {
        /// New phase.
        phase: GamePhase,
        /// Server the spectator is on, sent along with `halted`.
        #[serde(default)]
        server: Option<ServerDto>,
    },
    /// The spectator is now on this server.
    Current(ServerDto),
    /// The spectator left its server.
    Reset,
    /// The spectator moved on to the next player.
    Rotate,
}

/// Parsed and validated spectator message.
#[derive(Debug, PartialEq)]
pub enum SpectatorEvent {
    /// Phase report.
    Phase(PhaseReport),
    /// Current server report.
    Current(ServerKey),
    /// Session reset.
    Reset,
    /// Player rotation.
    Rotate,
}

impl SpectatorInboundMessage {
    /// Parse and validate a text frame.
    pub fn parse(text: &str) -> Result<SpectatorEvent, SpectatorMessageError> {
        let message: SpectatorInboundMessage = serde_json::from_str(text)?;
        message.try_into()
    }
}

impl TryFrom<SpectatorInboundMessage> for SpectatorEvent {
    type Error = SpectatorMessageError;

    fn try_from(message: SpectatorInboundMessage) -> Result<Self, Self::Error> {
        Ok(match message {
            SpectatorInboundMessage::Phase {
                phase: GamePhase::Halted,
                server,
            } => {
                let server = server.ok_or(SpectatorMessageError::HaltedWithoutServer)?;
                SpectatorEvent::Phase(PhaseReport::Halted {
                    server: server.try_into()?,
                })
            }
            SpectatorInboundMessage::Phase { phase, .. } => {
                SpectatorEvent::Phase(PhaseReport::Phase(phase))
            }
            SpectatorInboundMessage::Current(server) => SpectatorEvent::Current(server.try_into()?),
            SpectatorInboundMessage::Reset => SpectatorEvent::Reset,
            SpectatorInboundMessage::Rotate => SpectatorEvent::Rotate,
        })
    }
}

/// Arguments of an outbound command.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum CommandArgs {
    /// Server to join.
    Server(ServerDto),
    /// Plain trigger.
    Flag(bool),
}

/// Command pushed to the spectator.
#[derive(Debug, Serialize, ToSchema)]
pub struct SpectatorOutboundMessage {
    /// Command name.
    pub command: String,
    /// Command arguments.
    pub args: CommandArgs,
}

impl From<&SpectatorCommand> for SpectatorOutboundMessage {
    fn from(command: &SpectatorCommand) -> Self {
        match command {
            SpectatorCommand::Join(server) => Self {
                command: "join".into(),
                args: CommandArgs::Server(server.into()),
            },
            SpectatorCommand::Release => Self {
                command: "release".into(),
                args: CommandArgs::Flag(true),
            },
            SpectatorCommand::Forward(forwarded) => Self {
                command: forwarded.as_str().into(),
                args: CommandArgs::Flag(true),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::spectator::ForwardedCommand;

    #[test]
    fn parses_current_server_with_text_port() {
        let event = SpectatorInboundMessage::parse(
            r#"{"event":"current","ip":"1.2.3.4","port":"16567","password":null}"#,
        )
        .unwrap();
        assert_eq!(event, SpectatorEvent::Current(ServerKey::new("1.2.3.4", 16567, None)));
    }

    #[test]
    fn numeric_port_and_empty_password_are_accepted() {
        let event = SpectatorInboundMessage::parse(
            r#"{"event":"current","ip":"1.2.3.4","port":16567,"password":""}"#,
        )
        .unwrap();
        assert_eq!(event, SpectatorEvent::Current(ServerKey::new("1.2.3.4", 16567, None)));
    }

    #[test]
    fn halted_phase_carries_server() {
        let event = SpectatorInboundMessage::parse(
            r#"{"event":"phase","phase":"halted","server":{"ip":"1.2.3.4","port":"16567","password":"pw"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            SpectatorEvent::Phase(PhaseReport::Halted {
                server: ServerKey::new("1.2.3.4", 16567, Some("pw".into())),
            })
        );
    }

    #[test]
    fn halted_phase_without_server_is_rejected() {
        let err = SpectatorInboundMessage::parse(r#"{"event":"phase","phase":"halted"}"#).unwrap_err();
        assert!(matches!(err, SpectatorMessageError::HaltedWithoutServer));
    }

    #[test]
    fn plain_events() {
        assert_eq!(
            SpectatorInboundMessage::parse(r#"{"event":"phase","phase":"in-menu"}"#).unwrap(),
            SpectatorEvent::Phase(PhaseReport::Phase(GamePhase::InMenu))
        );
        assert_eq!(
            SpectatorInboundMessage::parse(r#"{"event":"reset"}"#).unwrap(),
            SpectatorEvent::Reset
        );
        assert_eq!(
            SpectatorInboundMessage::parse(r#"{"event":"rotate"}"#).unwrap(),
            SpectatorEvent::Rotate
        );
        assert!(SpectatorInboundMessage::parse(r#"{"event":"dance"}"#).is_err());
        assert!(matches!(
            SpectatorInboundMessage::parse(r#"{"event":"current","ip":"1.2.3.4","port":"0"}"#),
            Err(SpectatorMessageError::InvalidPort(_))
        ));
    }

    #[test]
    fn outbound_commands() {
        let join = SpectatorOutboundMessage::from(&SpectatorCommand::Join(ServerKey::new(
            "1.2.3.4", 16567, None,
        )));
        assert_eq!(
            serde_json::to_value(&join).unwrap(),
            json!({"command": "join", "args": {"ip": "1.2.3.4", "port": "16567", "password": null}})
        );

        let skip = SpectatorOutboundMessage::from(&SpectatorCommand::Forward(
            ForwardedCommand::NextPlayer,
        ));
        assert_eq!(
            serde_json::to_value(&skip).unwrap(),
            json!({"command": "next_player", "args": true})
        );

        let release = SpectatorOutboundMessage::from(&SpectatorCommand::Release);
        assert_eq!(
            serde_json::to_value(&release).unwrap(),
            json!({"command": "release", "args": true})
        );
    }
}
