/// Operator actions on the rotation and the spectator.
pub mod admin_service;
/// Chat announcement sinks.
pub mod announcer;
/// Event loop owning the rotation state.
pub mod controller;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Read-only projections of the rotation.
pub mod public_service;
/// Wall-clock aligned timers.
pub mod scheduler;
/// Spectator WebSocket connection handling.
pub mod spectator_service;
/// Server-Sent Events streaming service.
pub mod sse_service;
