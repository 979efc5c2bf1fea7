use tokio::sync::broadcast;

use crate::{dto::sse::ServerEvent, state::spectator::SpectatorCommand};

/// Hub fanning out announcements to SSE subscribers.
pub type SseHub = Hub<ServerEvent>;
/// Hub fanning out commands to connected spectator sockets.
pub type SpectatorHub = Hub<SpectatorCommand>;

/// Simple broadcast hub wrapper shared by the SSE and spectator channels.
pub struct Hub<T> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone> Hub<T> {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent messages.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }

    /// Send a message to all current subscribers, returning how many received it.
    pub fn broadcast(&self, message: T) -> usize {
        self.sender.send(message).unwrap_or(0)
    }
}
