//! Spectator WebSocket lifecycle: command fan-out and inbound event dispatch.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{
    sync::{broadcast::error::RecvError, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::spectator::{
        SpectatorEvent, SpectatorInboundMessage, SpectatorMessageError, SpectatorOutboundMessage,
    },
    error::ServiceError,
    services::controller::{ControllerEvent, ControllerHandle},
    state::{SharedState, SpectatorConnection, spectator::SpectatorCommand},
};

/// Failures while handling a single inbound frame.
#[derive(Debug, Error)]
enum InboundError {
    #[error(transparent)]
    Message(#[from] SpectatorMessageError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Handle the full lifecycle of a spectator WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let id = Uuid::new_v4();
    state.spectators().insert(
        id,
        SpectatorConnection {
            id,
            tx: outbound_tx.clone(),
        },
    );
    info!(%id, "spectator connected");

    // Subscribe before announcing the connection so the re-issued join is not missed.
    let forwarder = spawn_command_forwarder(&state, id, outbound_tx.clone());
    if let Err(err) = state.controller().notify(ControllerEvent::SpectatorConnected) {
        warn!(%id, error = %err, "failed to report spectator connection");
    }

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                debug!(%id, payload = %text, "received spectator message");
                if let Err(err) = dispatch(state.controller(), &text) {
                    warn!(%id, error = %err, "failed to handle spectator message");
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(%id, "spectator closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(%id, error = %err, "websocket error");
                break;
            }
        }
    }

    state.spectators().remove(&id);
    forwarder.abort();
    info!(%id, "spectator disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Parse a text frame and hand the resulting event to the controller.
fn dispatch(controller: &ControllerHandle, text: &str) -> Result<(), InboundError> {
    let event = match SpectatorInboundMessage::parse(text)? {
        SpectatorEvent::Phase(report) => ControllerEvent::PhaseReported(report),
        SpectatorEvent::Current(server) => ControllerEvent::CurrentServerReported(server),
        SpectatorEvent::Reset => ControllerEvent::SessionReset,
        SpectatorEvent::Rotate => ControllerEvent::PlayerRotated,
    };
    controller.notify(event)?;
    Ok(())
}

/// Relay hub commands onto this connection's writer until either side goes away.
fn spawn_command_forwarder(
    state: &SharedState,
    id: Uuid,
    tx: mpsc::UnboundedSender<Message>,
) -> JoinHandle<()> {
    let mut commands = state.spectator_hub().subscribe();
    tokio::spawn(async move {
        loop {
            let command = match commands.recv().await {
                Ok(command) => command,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%id, skipped, "spectator lagged behind, commands dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            if send_command(&tx, &command).is_err() {
                break;
            }
        }
    })
}

/// Serialize a command and push it onto the writer channel. Fails only when the writer is gone.
fn send_command(
    tx: &mpsc::UnboundedSender<Message>,
    command: &SpectatorCommand,
) -> Result<(), ServiceError> {
    let payload = match serde_json::to_string(&SpectatorOutboundMessage::from(command)) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, ?command, "failed to serialize spectator command");
            return Ok(());
        }
    };
    tx.send(Message::Text(payload.into()))
        .map_err(|_| ServiceError::InvalidState("spectator connection closed".into()))
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
