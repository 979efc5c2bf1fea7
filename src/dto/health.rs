use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Connected spectator sockets.
    pub spectators: usize,
    /// Servers currently tracked by the rotation.
    pub rotation_size: usize,
}

impl HealthResponse {
    /// Build a response; the service counts as degraded while no spectator is connected.
    pub fn new(spectators: usize, rotation_size: usize) -> Self {
        let status = if spectators > 0 { "ok" } else { "degraded" };
        Self {
            status: status.to_string(),
            spectators,
            rotation_size,
        }
    }
}
