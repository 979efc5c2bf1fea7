use tracing::{debug, warn};

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report connected spectators and the rotation size, logging when the controller is gone.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let spectators = state.spectators().len();
    let rotation_size = match state.controller().inspect(|rotation, _| rotation.len()).await {
        Ok(size) => size,
        Err(err) => {
            warn!(error = %err, "rotation controller did not answer health check");
            0
        }
    };

    if spectators == 0 {
        debug!("no spectator connected (degraded mode)");
    }
    HealthResponse::new(spectators, rotation_size)
}
