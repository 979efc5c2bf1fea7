pub mod hub;
pub mod phase;
pub mod queue;
pub mod rotation;
pub mod scoring;
pub mod selector;
pub mod server;
pub mod spectator;

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    config::{CustomCommand, Settings},
    services::controller::ControllerHandle,
};

pub use self::hub::{Hub, SpectatorHub, SseHub};

pub type SharedState = Arc<AppState>;

/// Capacity of the announcement stream.
const SSE_CAPACITY: usize = 16;
/// Capacity of the spectator command fan-out.
const SPECTATOR_CAPACITY: usize = 32;

#[derive(Clone)]
/// Handle used to push messages to a connected spectator.
pub struct SpectatorConnection {
    pub id: Uuid,
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state shared by the HTTP handlers.
pub struct AppState {
    settings: Settings,
    controller: ControllerHandle,
    sse: Arc<SseHub>,
    spectator_hub: Arc<SpectatorHub>,
    spectators: DashMap<Uuid, SpectatorConnection>,
    custom_commands: Vec<CustomCommand>,
}

/// Hubs created before the controller so both sides can share them.
pub struct Hubs {
    /// Announcement stream hub.
    pub sse: Arc<SseHub>,
    /// Spectator command hub.
    pub spectators: Arc<SpectatorHub>,
}

impl Hubs {
    /// Create the announcement and spectator command hubs.
    pub fn new() -> Self {
        Self {
            sse: Arc::new(SseHub::new(SSE_CAPACITY)),
            spectators: Arc::new(SpectatorHub::new(SPECTATOR_CAPACITY)),
        }
    }
}

impl Default for Hubs {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        settings: Settings,
        controller: ControllerHandle,
        hubs: Hubs,
        custom_commands: Vec<CustomCommand>,
    ) -> SharedState {
        Arc::new(Self {
            settings,
            controller,
            sse: hubs.sse,
            spectator_hub: hubs.spectators,
            spectators: DashMap::new(),
            custom_commands,
        })
    }

    /// Runtime settings read at startup.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Handle of the rotation controller loop.
    pub fn controller(&self) -> &ControllerHandle {
        &self.controller
    }

    /// Broadcast hub used for the announcement SSE stream.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    /// Broadcast hub carrying commands for the spectator.
    pub fn spectator_hub(&self) -> &SpectatorHub {
        &self.spectator_hub
    }

    /// Registry of active spectator sockets keyed by connection id.
    pub fn spectators(&self) -> &DashMap<Uuid, SpectatorConnection> {
        &self.spectators
    }

    /// Custom chat command definitions.
    pub fn custom_commands(&self) -> &[CustomCommand] {
        &self.custom_commands
    }
}
