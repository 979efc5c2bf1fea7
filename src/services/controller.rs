//! Event loop owning the rotation state.
//!
//! Timers, the spectator socket and the HTTP handlers talk to the loop through a
//! [`ControllerHandle`]; events are processed one at a time.

use std::{path::PathBuf, sync::Arc, time::Instant};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::{
    config::read_rotation,
    error::ServiceError,
    provider::{ProviderResult, ServerQuery, ServerState, StateProvider},
    services::announcer::Announcer,
    state::{
        SpectatorHub,
        phase::PhaseReport,
        rotation::{Directive, FlagOutcome, ManualJoinOutcome, RotationState},
        server::ServerKey,
        spectator::SpectatorCommand,
    },
};

/// Read-only closure evaluated inside the loop.
pub type Inspector = Box<dyn FnOnce(&RotationState, Instant) + Send>;

/// Inputs of the controller loop.
pub enum ControllerEvent {
    /// Poll every rotation server.
    RefreshDue,
    /// A refresh round finished with these successful polls.
    StatesRefreshed(Vec<(ServerKey, ServerState)>),
    /// Push a score sample for every server.
    ScoreDue,
    /// The spectator reported a phase.
    PhaseReported(PhaseReport),
    /// The spectator reported the server it is on.
    CurrentServerReported(ServerKey),
    /// The spectator left its server.
    SessionReset,
    /// The spectator moved on to the next player.
    PlayerRotated,
    /// A spectator socket connected.
    SpectatorConnected,
    /// Operator join request.
    ManualJoin {
        /// Server to join.
        server: ServerKey,
        /// Outcome of the request.
        reply: oneshot::Sender<ManualJoinOutcome>,
    },
    /// Operator ignore or notice request.
    SetIgnored {
        /// Host of the server.
        host: String,
        /// Port of the server.
        port: u16,
        /// New value of the flag.
        ignored: bool,
        /// Outcome of the request.
        reply: oneshot::Sender<FlagOutcome>,
    },
    /// Reload the rotation file.
    ReloadRotation {
        /// Number of tracked servers after the reload, or why the file was rejected.
        reply: oneshot::Sender<Result<usize, String>>,
    },
    /// Run a read-only closure against the current state.
    Inspect(Inspector),
}

/// Cloneable sender side of the controller inbox.
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<ControllerEvent>,
}

impl ControllerHandle {
    /// Handle wired to a bare inbox, without a running loop.
    #[cfg(test)]
    pub(crate) fn detached() -> (Self, mpsc::UnboundedReceiver<ControllerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a fire-and-forget event.
    pub fn notify(&self, event: ControllerEvent) -> Result<(), ServiceError> {
        self.tx
            .send(event)
            .map_err(|_| ServiceError::ControllerUnavailable)
    }

    /// Ask the controller to join `server`.
    pub async fn manual_join(&self, server: ServerKey) -> Result<ManualJoinOutcome, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.notify(ControllerEvent::ManualJoin { server, reply })?;
        rx.await.map_err(|_| ServiceError::ControllerUnavailable)
    }

    /// Set or clear the ignored flag of the server at `host:port`.
    pub async fn set_ignored(
        &self,
        host: String,
        port: u16,
        ignored: bool,
    ) -> Result<FlagOutcome, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.notify(ControllerEvent::SetIgnored {
            host,
            port,
            ignored,
            reply,
        })?;
        rx.await.map_err(|_| ServiceError::ControllerUnavailable)
    }

    /// Reload the rotation file, returning the number of tracked servers.
    pub async fn reload(&self) -> Result<usize, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.notify(ControllerEvent::ReloadRotation { reply })?;
        rx.await
            .map_err(|_| ServiceError::ControllerUnavailable)?
            .map_err(ServiceError::InvalidState)
    }

    /// Evaluate `f` against the rotation state inside the loop.
    pub async fn inspect<T, F>(&self, f: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&RotationState, Instant) -> T + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.notify(ControllerEvent::Inspect(Box::new(move |rotation, now| {
            let _ = reply.send(f(rotation, now));
        })))?;
        rx.await.map_err(|_| ServiceError::ControllerUnavailable)
    }
}

/// Owner of the [`RotationState`], draining the inbox.
pub struct Controller {
    rotation: RotationState,
    inbox: mpsc::UnboundedReceiver<ControllerEvent>,
    handle: ControllerHandle,
    provider: Arc<dyn StateProvider>,
    announcers: Vec<Arc<dyn Announcer>>,
    spectators: Arc<SpectatorHub>,
    rotation_path: PathBuf,
    refresh_in_flight: bool,
}

impl Controller {
    /// Build the controller and the handle used to talk to it.
    pub fn new(
        rotation: RotationState,
        provider: Arc<dyn StateProvider>,
        announcers: Vec<Arc<dyn Announcer>>,
        spectators: Arc<SpectatorHub>,
        rotation_path: PathBuf,
    ) -> (Self, ControllerHandle) {
        let (tx, inbox) = mpsc::unbounded_channel();
        let handle = ControllerHandle { tx };
        let controller = Self {
            rotation,
            inbox,
            handle: handle.clone(),
            provider,
            announcers,
            spectators,
            rotation_path,
            refresh_in_flight: false,
        };
        (controller, handle)
    }

    /// Poll every server once and, with a non-empty rotation, record a first score sample.
    /// Runs before the loop starts so the first scores see live state.
    pub async fn prime(&mut self) {
        let targets = self.rotation.refresh_targets();
        if targets.is_empty() {
            info!("no servers configured, automatic server rotation disabled");
            return;
        }
        let queries = targets.iter().map(ServerKey::query).collect();
        let outcomes = self.provider.lookup_many(queries).await;
        let states = successful_states(targets, outcomes);
        self.rotation.apply_states(states, Instant::now());
        self.rotation.tick_scores();
    }

    /// Process events until every handle is dropped.
    pub async fn run(mut self) {
        info!(servers = self.rotation.len(), "rotation controller started");
        while let Some(event) = self.inbox.recv().await {
            self.handle_event(event);
        }
        info!("rotation controller stopped");
    }

    fn handle_event(&mut self, event: ControllerEvent) {
        let now = Instant::now();
        match event {
            ControllerEvent::RefreshDue => self.start_refresh(),
            ControllerEvent::StatesRefreshed(states) => {
                self.refresh_in_flight = false;
                debug!(count = states.len(), "applying refreshed server states");
                self.rotation.apply_states(states, now);
            }
            ControllerEvent::ScoreDue => self.rotation.tick_scores(),
            ControllerEvent::PhaseReported(report) => {
                let directives = self.rotation.handle_phase_report(report, now);
                self.execute(directives);
            }
            ControllerEvent::CurrentServerReported(server) => {
                let directives = self.rotation.handle_current_server(server, now);
                self.execute(directives);
            }
            ControllerEvent::SessionReset => self.rotation.handle_session_reset(),
            ControllerEvent::PlayerRotated => {
                let directives = self.rotation.handle_player_rotation(now);
                self.execute(directives);
            }
            ControllerEvent::SpectatorConnected => {
                let directives = self.rotation.handle_spectator_connected();
                self.execute(directives);
            }
            ControllerEvent::ManualJoin { server, reply } => {
                let (outcome, directives) = self.rotation.manual_join(server);
                self.execute(directives);
                let _ = reply.send(outcome);
            }
            ControllerEvent::SetIgnored {
                host,
                port,
                ignored,
                reply,
            } => {
                let outcome = self.rotation.set_ignored(&host, port, ignored);
                let _ = reply.send(outcome);
            }
            ControllerEvent::ReloadRotation { reply } => {
                let result = match read_rotation(&self.rotation_path) {
                    Ok(configs) => {
                        self.rotation.reload(configs);
                        Ok(self.rotation.len())
                    }
                    Err(err) => {
                        warn!(
                            path = %self.rotation_path.display(),
                            error = %err,
                            "rotation reload rejected"
                        );
                        Err(err.to_string())
                    }
                };
                let _ = reply.send(result);
            }
            ControllerEvent::Inspect(inspector) => inspector(&self.rotation, now),
        }
    }

    fn start_refresh(&mut self) {
        if self.refresh_in_flight {
            debug!("state refresh still running, skipping round");
            return;
        }
        let targets = self.rotation.refresh_targets();
        if targets.is_empty() {
            return;
        }

        self.refresh_in_flight = true;
        let queries = targets.iter().map(ServerKey::query).collect();
        let lookups = self.provider.lookup_many(queries);
        let handle = self.handle.clone();
        tokio::spawn(async move {
            let states = successful_states(targets, lookups.await);
            let _ = handle.notify(ControllerEvent::StatesRefreshed(states));
        });
    }

    fn execute(&self, directives: Vec<Directive>) {
        for directive in directives {
            match directive {
                Directive::Join(server) => {
                    info!(server = %server, "sending join command");
                    self.send_command(SpectatorCommand::Join(server));
                }
                Directive::Release => self.send_command(SpectatorCommand::Release),
                Directive::Announce(message) => self.announce(message),
            }
        }
    }

    fn send_command(&self, command: SpectatorCommand) {
        if self.spectators.broadcast(command) == 0 {
            debug!("no spectator connected, command dropped");
        }
    }

    fn announce(&self, message: String) {
        for announcer in &self.announcers {
            let delivery = announcer.announce(message.clone());
            tokio::spawn(async move {
                if let Err(err) = delivery.await {
                    warn!(error = %err, "failed to send announcement");
                }
            });
        }
    }
}

/// Pair lookup outcomes with their keys, logging and dropping failures.
fn successful_states(
    targets: Vec<ServerKey>,
    outcomes: Vec<(ServerQuery, ProviderResult<ServerState>)>,
) -> Vec<(ServerKey, ServerState)> {
    let mut states = Vec::with_capacity(outcomes.len());
    for (key, (_, outcome)) in targets.into_iter().zip(outcomes) {
        match outcome {
            Ok(state) => states.push((key, state)),
            Err(err) => warn!(server = %key, error = %err, "failed to update server state"),
        }
    }
    states
}
