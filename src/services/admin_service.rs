//! Operator actions: manual joins, ignore flags, forwarded commands and rotation reloads.

use tracing::{debug, info};

use crate::{
    dto::admin::{
        ActionResponse, JoinRequest, ReloadResponse, ServerAddressRequest, SpectatorCommandRequest,
    },
    error::ServiceError,
    state::{
        SharedState,
        rotation::{FlagOutcome, ManualJoinOutcome},
        spectator::SpectatorCommand,
    },
};

/// Send the spectator to the requested server.
pub async fn join_server(
    state: &SharedState,
    request: JoinRequest,
) -> Result<ActionResponse, ServiceError> {
    let server = request.server_key();
    let message = match state.controller().manual_join(server.clone()).await? {
        ManualJoinOutcome::Queued(_) => {
            info!(%server, "join server updated");
            "Spectator will join server shortly"
        }
        ManualJoinOutcome::AlreadyOnServer => "Spectator is already on requested server",
    };
    Ok(ActionResponse::new(message))
}

/// Set or clear the ignored flag of a rotation server.
pub async fn set_ignored(
    state: &SharedState,
    request: ServerAddressRequest,
    ignored: bool,
) -> Result<ActionResponse, ServiceError> {
    let port = request.port();
    let outcome = state
        .controller()
        .set_ignored(request.ip.clone(), port, ignored)
        .await?;
    let verb = if ignored { "ignored" } else { "noticed" };
    match outcome {
        FlagOutcome::Updated => {
            info!(host = %request.ip, port, ignored, "rotation server flag updated");
            Ok(ActionResponse::new(format!("Server is now {verb}")))
        }
        FlagOutcome::Unchanged => Ok(ActionResponse::new(format!("Server is already {verb}"))),
        FlagOutcome::NotFound => Err(ServiceError::NotFound(format!(
            "server {}:{port} is not in rotation",
            request.ip
        ))),
    }
}

/// Forward an operator command to the spectator, returning its acknowledgement.
pub fn forward_command(
    state: &SharedState,
    request: SpectatorCommandRequest,
) -> Result<ActionResponse, ServiceError> {
    let command = request.command;
    let delivered = state
        .spectator_hub()
        .broadcast(SpectatorCommand::Forward(command));
    if delivered == 0 {
        return Err(ServiceError::InvalidState(
            "no spectator is connected".into(),
        ));
    }
    debug!(command = command.as_str(), delivered, "forwarded spectator command");
    Ok(ActionResponse::new(command.acknowledgement()))
}

/// Re-read the rotation file and merge it into the running rotation.
pub async fn reload_rotation(state: &SharedState) -> Result<ReloadResponse, ServiceError> {
    let servers = state.controller().reload().await?;
    info!(servers, "rotation reloaded");
    Ok(ReloadResponse { servers })
}
