use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::future::BoxFuture;
use spectator_controller::{
    config::{RotationSettings, ServerConfig},
    provider::{PlayerState, ProviderError, ProviderResult, ServerQuery, ServerState, StateProvider},
    services::{
        announcer::{AnnounceError, Announcer},
        controller::{Controller, ControllerEvent, ControllerHandle},
    },
    state::{
        SpectatorHub,
        phase::{GamePhase, PhaseReport},
        rotation::RotationState,
        server::{RotationPolicy, ServerKey},
        spectator::SpectatorCommand,
    },
};
use tokio::{sync::broadcast, time::timeout};

const ALPHA: &str = "10.0.0.1";
const BRAVO: &str = "10.0.0.2";

/// Serves canned states: a busy server and a quiet one.
struct InMemoryProvider;

fn players(count: usize) -> Vec<PlayerState> {
    (0..count)
        .map(|index| PlayerState {
            name: format!("player-{index}"),
            score: 10,
            kills: 2,
            ping: 40,
            team_label: "US".into(),
            ..PlayerState::default()
        })
        .collect()
}

impl StateProvider for InMemoryProvider {
    fn lookup(&self, query: ServerQuery) -> BoxFuture<'static, ProviderResult<ServerState>> {
        Box::pin(async move {
            let (name, online) = match query.host.as_str() {
                ALPHA => ("Alpha", 24),
                BRAVO => ("Bravo", 4),
                _ => {
                    return Err(ProviderError::NotFound {
                        address: query.address(),
                    });
                }
            };
            Ok(ServerState {
                name: name.into(),
                num_players: online as u32,
                max_players: 32,
                map_name: "strike_at_karkand".into(),
                game_type: "gpm_cq".into(),
                players: players(online),
                ..ServerState::default()
            })
        })
    }
}

#[derive(Default)]
struct RecordingAnnouncer {
    messages: Mutex<Vec<String>>,
}

impl Announcer for RecordingAnnouncer {
    fn announce(&self, message: String) -> BoxFuture<'static, Result<(), AnnounceError>> {
        self.messages.lock().unwrap().push(message);
        Box::pin(async { Ok(()) })
    }
}

fn key(host: &str) -> ServerKey {
    ServerKey::new(host, 16567, None)
}

struct Harness {
    handle: ControllerHandle,
    commands: broadcast::Receiver<SpectatorCommand>,
    announcer: Arc<RecordingAnnouncer>,
}

async fn start(rotation_path: PathBuf) -> Harness {
    let configs = [ALPHA, BRAVO]
        .into_iter()
        .map(|host| ServerConfig {
            key: key(host),
            policy: RotationPolicy::default(),
        })
        .collect();
    let settings = RotationSettings {
        score_sample_size: 1,
        ..RotationSettings::default()
    };
    let hub = Arc::new(SpectatorHub::new(16));
    let commands = hub.subscribe();
    let announcer = Arc::new(RecordingAnnouncer::default());
    let (mut controller, handle) = Controller::new(
        RotationState::new(configs, settings),
        Arc::new(InMemoryProvider),
        vec![announcer.clone()],
        hub,
        rotation_path,
    );
    controller.prime().await;
    tokio::spawn(controller.run());
    Harness {
        handle,
        commands,
        announcer,
    }
}

async fn next_command(commands: &mut broadcast::Receiver<SpectatorCommand>) -> SpectatorCommand {
    timeout(Duration::from_secs(1), commands.recv())
        .await
        .expect("no command within a second")
        .expect("hub closed")
}

async fn join_alpha(harness: &mut Harness) {
    harness
        .handle
        .notify(ControllerEvent::PhaseReported(PhaseReport::Phase(GamePhase::InMenu)))
        .unwrap();
    assert_eq!(
        next_command(&mut harness.commands).await,
        SpectatorCommand::Join(key(ALPHA))
    );
    harness
        .handle
        .notify(ControllerEvent::CurrentServerReported(key(ALPHA)))
        .unwrap();
}

#[tokio::test]
async fn first_selection_joins_busiest_server_without_announcement() {
    let mut harness = start(PathBuf::from("missing.yaml")).await;
    join_alpha(&mut harness).await;

    let (current, to_join) = harness
        .handle
        .inspect(|rotation, _| {
            (
                rotation.current().map(|server| server.key().clone()),
                rotation.to_join().map(|server| server.key().clone()),
            )
        })
        .await
        .unwrap();
    assert_eq!(current, Some(key(ALPHA)));
    assert_eq!(to_join, None);
    assert!(harness.announcer.messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn halted_spectator_moves_on_and_is_released() {
    let mut harness = start(PathBuf::from("missing.yaml")).await;
    join_alpha(&mut harness).await;

    harness
        .handle
        .notify(ControllerEvent::PhaseReported(PhaseReport::Phase(
            GamePhase::Spectating,
        )))
        .unwrap();
    harness
        .handle
        .notify(ControllerEvent::PhaseReported(PhaseReport::Halted {
            server: key(ALPHA),
        }))
        .unwrap();

    assert_eq!(
        next_command(&mut harness.commands).await,
        SpectatorCommand::Join(key(BRAVO))
    );
    assert_eq!(
        next_command(&mut harness.commands).await,
        SpectatorCommand::Release
    );

    let ignored = harness
        .handle
        .inspect(|rotation, _| {
            rotation
                .server(&key(ALPHA))
                .is_some_and(|server| server.policy.ignored)
        })
        .await
        .unwrap();
    assert!(ignored);
    assert_eq!(
        *harness.announcer.messages.lock().unwrap(),
        vec!["Switching servers, joining Bravo shortly".to_string()]
    );
}

#[tokio::test]
async fn unknown_current_server_reissues_expected_join() {
    let mut harness = start(PathBuf::from("missing.yaml")).await;
    harness
        .handle
        .notify(ControllerEvent::PhaseReported(PhaseReport::Phase(GamePhase::InMenu)))
        .unwrap();
    assert_eq!(
        next_command(&mut harness.commands).await,
        SpectatorCommand::Join(key(ALPHA))
    );

    harness
        .handle
        .notify(ControllerEvent::CurrentServerReported(key("10.9.9.9")))
        .unwrap();
    assert_eq!(
        next_command(&mut harness.commands).await,
        SpectatorCommand::Join(key(ALPHA))
    );

    let current = harness
        .handle
        .inspect(|rotation, _| rotation.current().is_some())
        .await
        .unwrap();
    assert!(!current);
}

#[tokio::test]
async fn reload_keeps_current_server_as_temporary() {
    let path = std::env::temp_dir().join(format!("rotation-flow-{}.yaml", std::process::id()));
    std::fs::write(&path, format!("- ip: {BRAVO}\n  port: 16567\n")).unwrap();

    let mut harness = start(path.clone()).await;
    join_alpha(&mut harness).await;

    let servers = harness.handle.reload().await.unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(servers, 2);

    let alpha_temporary = harness
        .handle
        .inspect(|rotation, _| {
            rotation
                .server(&key(ALPHA))
                .map(|server| server.policy.temporary)
        })
        .await
        .unwrap();
    assert_eq!(alpha_temporary, Some(true));
}
