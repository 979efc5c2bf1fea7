//! DTO definitions used by the admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::validation::{validate_ipv4, validate_port},
    state::{server::ServerKey, spectator::ForwardedCommand},
};

/// Request to send the spectator to a server, in or outside of the rotation.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinRequest {
    /// IPv4 address of the server.
    pub ip: String,
    /// Game port.
    pub port: u32,
    /// Join password, if any.
    #[serde(default)]
    pub password: Option<String>,
}

impl Validate for JoinRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_ipv4(&self.ip) {
            errors.add("ip", e);
        }
        if let Err(e) = validate_port(self.port) {
            errors.add("port", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl JoinRequest {
    /// Identity of the requested server. Call after validation.
    pub fn server_key(&self) -> ServerKey {
        let port = u16::try_from(self.port).unwrap_or_default();
        let password = self.password.clone().filter(|password| !password.is_empty());
        ServerKey::new(self.ip.clone(), port, password)
    }
}

/// Request to ignore or notice a rotation server.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ServerAddressRequest {
    /// Host of the server.
    #[validate(length(min = 1))]
    pub ip: String,
    /// Game port.
    #[validate(range(min = 1, max = 65535))]
    pub port: u32,
}

impl ServerAddressRequest {
    /// Port narrowed to its wire type. Call after validation.
    pub fn port(&self) -> u16 {
        u16::try_from(self.port).unwrap_or_default()
    }
}

/// Operator command to forward to the spectator.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SpectatorCommandRequest {
    /// Command to forward.
    pub command: ForwardedCommand,
}

/// Generic acknowledgement returned by admin operations.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Human readable outcome.
    pub message: String,
}

impl ActionResponse {
    /// Wrap `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outcome of a rotation reload.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReloadResponse {
    /// Number of servers tracked after the reload.
    pub servers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_request_validation() {
        let valid = JoinRequest {
            ip: "1.2.3.4".into(),
            port: 16567,
            password: Some(String::new()),
        };
        assert!(valid.validate().is_ok());
        assert_eq!(valid.server_key(), ServerKey::new("1.2.3.4", 16567, None));

        let invalid = JoinRequest {
            ip: "not-an-ip".into(),
            port: 0,
            password: None,
        };
        let errors = invalid.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("ip"));
        assert!(fields.contains_key("port"));
    }

    #[test]
    fn address_request_validation() {
        let request = ServerAddressRequest {
            ip: "1.2.3.4".into(),
            port: 70_000,
        };
        assert!(request.validate().is_err());
        let request = ServerAddressRequest {
            ip: String::new(),
            port: 16567,
        };
        assert!(request.validate().is_err());
    }
}
