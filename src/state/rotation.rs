//! Rotation core: server membership, current and pending-join slots, and the selection pass.
//!
//! Every operation is synchronous and returns the [`Directive`]s the caller has to carry
//! out (joins, releases, announcements). The controller task owns the only instance.

use std::time::{Duration, Instant, SystemTime};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::{
    config::{RotationSettings, ServerConfig},
    dto::format_system_time,
    provider::ServerState,
    state::{
        phase::{GamePhase, PhaseEdge, PhaseReport, PhaseTracker},
        queue::SampleQueue,
        scoring::tick_score,
        selector::select_server,
        server::{GameServer, RotationPolicy, ServerKey},
    },
};

/// Side effect requested by the rotation core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Send the spectator to the server.
    Join(ServerKey),
    /// Release the spectator from the halted phase.
    Release,
    /// Post a chat announcement.
    Announce(String),
}

/// Knobs of a single selection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionOptions {
    /// Treat every non-ignored server as selectable.
    pub all_selectable: bool,
    /// Switch even if the minimum time on the current server has not elapsed.
    pub ignore_time_on_server: bool,
}

/// Result of an operator join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualJoinOutcome {
    /// The server is now pending and a join was issued.
    Queued(ServerKey),
    /// The spectator is already playing on the server.
    AlreadyOnServer,
}

/// Result of toggling the ignored flag of a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagOutcome {
    /// The flag was changed.
    Updated,
    /// The flag already had the requested value.
    Unchanged,
    /// No rotation server matches.
    NotFound,
}

/// State of the rotation owned by the controller loop.
#[derive(Debug)]
pub struct RotationState {
    servers: IndexMap<ServerKey, GameServer>,
    current: Option<ServerKey>,
    to_join: Option<ServerKey>,
    phase: PhaseTracker,
    player_rotations: SampleQueue<Instant>,
    settings: RotationSettings,
}

impl RotationState {
    /// Build the rotation from validated configuration entries, keeping their order.
    pub fn new(configs: Vec<ServerConfig>, settings: RotationSettings) -> Self {
        let mut servers = IndexMap::with_capacity(configs.len());
        for config in configs {
            let server = GameServer::new(config.key.clone(), config.policy, settings.score_sample_size);
            servers.entry(config.key).or_insert(server);
        }

        Self {
            servers,
            current: None,
            to_join: None,
            phase: PhaseTracker::new(),
            player_rotations: SampleQueue::new(settings.average_time_on_player_sample_size),
            settings,
        }
    }

    /// Rotation tunables.
    pub fn settings(&self) -> &RotationSettings {
        &self.settings
    }

    /// Servers in rotation order.
    pub fn servers(&self) -> impl Iterator<Item = &GameServer> {
        self.servers.values()
    }

    /// Look up a server by identity.
    pub fn server(&self, key: &ServerKey) -> Option<&GameServer> {
        self.servers.get(key)
    }

    /// Number of tracked servers, temporary ones included.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Whether no server is tracked.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Whether at least one non-temporary server is configured.
    pub fn has_rotation(&self) -> bool {
        self.servers.values().any(|server| !server.policy.temporary)
    }

    /// Server the spectator is on.
    pub fn current(&self) -> Option<&GameServer> {
        self.current.as_ref().and_then(|key| self.servers.get(key))
    }

    /// Server the spectator was told to join.
    pub fn to_join(&self) -> Option<&GameServer> {
        self.to_join.as_ref().and_then(|key| self.servers.get(key))
    }

    /// Last reported phase.
    pub fn phase(&self) -> GamePhase {
        self.phase.phase()
    }

    /// Keys of every server to poll.
    pub fn refresh_targets(&self) -> Vec<ServerKey> {
        self.servers.keys().cloned().collect()
    }

    /// Apply a round of successful polls. Servers dropped in the meantime are skipped.
    pub fn apply_states(&mut self, states: Vec<(ServerKey, ServerState)>, now: Instant) {
        for (key, state) in states {
            if let Some(server) = self.servers.get_mut(&key) {
                server.apply_state(state, now);
            }
        }
    }

    /// Push a new score sample for every server.
    pub fn tick_scores(&mut self) {
        for server in self.servers.values_mut() {
            let score = tick_score(server, &self.settings);
            debug!(server = %server.key(), score, "updated rotation server score");
        }
    }

    /// Record a phase report and react to the edge it raises.
    pub fn handle_phase_report(&mut self, report: PhaseReport, now: Instant) -> Vec<Directive> {
        match self.phase.observe(report) {
            None => Vec::new(),
            Some(PhaseEdge::RotationEnabled { from, to }) => {
                debug!(?from, ?to, "entered rotation-enabled phase, running rotation selection");
                self.run_selection(SelectionOptions::default(), now)
            }
            Some(PhaseEdge::Halted { server }) => {
                match self.servers.get_mut(&server) {
                    Some(entry) if !entry.policy.ignored => {
                        info!(server = %server, "entered halted phase, ignoring server");
                        entry.policy.ignored = true;
                    }
                    Some(_) => {}
                    None => warn!(server = %server, "halted phase server is not in rotation"),
                }

                info!("running rotation selection to resolve halted phase");
                self.run_selection(
                    SelectionOptions {
                        all_selectable: true,
                        ignore_time_on_server: false,
                    },
                    now,
                )
            }
        }
    }

    /// The spectator reported the server it is on.
    pub fn handle_current_server(&mut self, key: ServerKey, now: Instant) -> Vec<Directive> {
        if !self.servers.contains_key(&key) {
            if !self.servers.is_empty() {
                warn!(server = %key, "current server is not in rotation");
                self.clear_current();
                self.player_rotations.clear();

                let mut directives = self.run_selection(SelectionOptions::default(), now);
                if let Some(expected) = self.to_join.clone().or_else(|| self.current.clone()) {
                    warn!(server = %expected, "re-issuing join for expected server");
                    directives.push(self.issue_join(&expected));
                }
                return directives;
            }

            debug!(server = %key, "tracking unknown current server as temporary");
            let server = GameServer::new(
                key.clone(),
                RotationPolicy::temporary(),
                self.settings.score_sample_size,
            );
            self.servers.insert(key.clone(), server);
        }

        let joined = self
            .current()
            .is_some_and(|current| current.key() == &key && current.has_spectator_joined());
        if !joined {
            self.set_current(key.clone(), now);
            self.player_rotations.clear();
            if self.to_join.as_ref() == Some(&key) {
                self.to_join = None;
            }
            info!(server = %key, "current server updated");
            self.remove_obsolete_servers();
        }
        Vec::new()
    }

    /// The spectator left its server.
    pub fn handle_session_reset(&mut self) {
        if self.current.is_some() {
            self.clear_current();
            self.player_rotations.clear();
            info!("current server reset");
        }
    }

    /// The spectator moved on to the next player.
    pub fn handle_player_rotation(&mut self, now: Instant) -> Vec<Directive> {
        self.player_rotations.push(now);
        let Some(average) = self.average_time_on_player() else {
            return Vec::new();
        };

        if average < self.settings.average_time_on_player_threshold && self.to_join.is_none() {
            info!(
                average_secs = average.as_secs_f64(),
                "short average time on player, running rotation to find a more active server"
            );
            self.run_selection(
                SelectionOptions {
                    all_selectable: true,
                    ignore_time_on_server: true,
                },
                now,
            )
        } else {
            debug!(average_secs = average.as_secs_f64(), "average time on player");
            Vec::new()
        }
    }

    /// Mean interval between the recorded player rotations, once the window is full.
    pub fn average_time_on_player(&self) -> Option<Duration> {
        if !self.player_rotations.is_full() || self.player_rotations.len() < 2 {
            return None;
        }
        let oldest = self.player_rotations.oldest()?;
        let newest = self.player_rotations.newest()?;
        let intervals = (self.player_rotations.len() - 1) as u32;
        Some(newest.saturating_duration_since(*oldest) / intervals)
    }

    /// A spectator connected; send it back to where it should be.
    pub fn handle_spectator_connected(&mut self) -> Vec<Directive> {
        match self.to_join.clone().or_else(|| self.current.clone()) {
            Some(key) => vec![self.issue_join(&key)],
            None => Vec::new(),
        }
    }

    /// Operator request to join a specific server.
    pub fn manual_join(&mut self, key: ServerKey) -> (ManualJoinOutcome, Vec<Directive>) {
        let on_server = self.current.as_ref() == Some(&key)
            && self
                .current()
                .is_some_and(|current| current.player(&self.settings.spectator_name).is_some());
        if on_server {
            return (ManualJoinOutcome::AlreadyOnServer, Vec::new());
        }

        match self.servers.get_mut(&key) {
            Some(server) => {
                if server.policy.ignored {
                    info!(server = %key, "join server is ignored, removing ignored flag");
                    server.policy.ignored = false;
                }
            }
            None => {
                let server = GameServer::new(
                    key.clone(),
                    RotationPolicy::temporary(),
                    self.settings.score_sample_size,
                );
                self.servers.insert(key.clone(), server);
            }
        }

        info!(server = %key, "join server updated");
        self.to_join = Some(key.clone());
        let join = self.issue_join(&key);
        (ManualJoinOutcome::Queued(key), vec![join])
    }

    /// Set or clear the ignored flag on the first server listening on `host:port`.
    pub fn set_ignored(&mut self, host: &str, port: u16, ignored: bool) -> FlagOutcome {
        let Some(server) = self
            .servers
            .values_mut()
            .find(|server| server.key().matches_address(host, port))
        else {
            return FlagOutcome::NotFound;
        };

        if server.policy.ignored == ignored {
            return FlagOutcome::Unchanged;
        }
        info!(server = %server.key(), ignored, "updated ignored flag");
        server.policy.ignored = ignored;
        FlagOutcome::Updated
    }

    /// Merge a freshly loaded rotation into the running one.
    ///
    /// Kept servers retain live state, scores and session but take the new policy.
    /// Dropped servers that are current or pending stay as temporary entries.
    pub fn reload(&mut self, configs: Vec<ServerConfig>) {
        let mut previous = std::mem::take(&mut self.servers);
        let mut servers = IndexMap::with_capacity(configs.len());

        for config in configs {
            if servers.contains_key(&config.key) {
                continue;
            }
            let server = match previous.shift_remove(&config.key) {
                Some(mut server) => {
                    server.policy = config.policy;
                    server
                }
                None => GameServer::new(
                    config.key.clone(),
                    config.policy,
                    self.settings.score_sample_size,
                ),
            };
            servers.insert(config.key, server);
        }

        for (key, mut server) in previous {
            let in_use = self.current.as_ref() == Some(&key) || self.to_join.as_ref() == Some(&key);
            if in_use {
                debug!(server = %key, "keeping removed rotation server as temporary while in use");
                server.policy.temporary = true;
                servers.insert(key, server);
            } else {
                debug!(server = %key, "removed rotation server");
            }
        }

        info!(count = servers.len(), "reloaded rotation");
        self.servers = servers;
    }

    /// Drop temporary servers that are neither current nor pending.
    pub fn remove_obsolete_servers(&mut self) {
        let current = self.current.clone();
        let to_join = self.to_join.clone();
        self.servers.retain(|key, server| {
            let keep = !server.policy.temporary
                || current.as_ref() == Some(key)
                || to_join.as_ref() == Some(key);
            if !keep {
                debug!(server = %key, "removing obsolete temporary rotation server");
            }
            keep
        });
    }

    /// Run a rotation selection pass.
    pub fn run_selection(&mut self, options: SelectionOptions, now: Instant) -> Vec<Directive> {
        self.remove_obsolete_servers();
        if !self.has_rotation() {
            return Vec::new();
        }

        let halted = self.phase.phase() == GamePhase::Halted;
        let all_selectable = halted || options.all_selectable;
        let candidates: Vec<&GameServer> = self.servers.values().collect();
        let Some((selected, name)) = select_server(&candidates, all_selectable, now, &self.settings)
            .map(|server| (server.key().clone(), server.name()))
        else {
            return Vec::new();
        };

        let time_on_server = self.current().and_then(|current| current.time_on_server(now));
        let dwelled = time_on_server.is_some_and(|time| time >= self.settings.minimum_time_on_server);
        let may_switch = halted
            || self.current.is_none()
            || (self.to_join.is_none() && (dwelled || options.ignore_time_on_server));

        if !may_switch {
            if self.to_join.is_some() {
                debug!("server switch already queued, not applying selection");
            } else if let Some(time_on_server) = time_on_server {
                let remaining = self.settings.minimum_time_on_server.saturating_sub(time_on_server);
                debug!(
                    switch_possible_at = %format_system_time(SystemTime::now() + remaining),
                    "server switch not possible yet, not applying selection"
                );
            }
            return Vec::new();
        }

        let mut directives = Vec::new();
        if self.current.as_ref() != Some(&selected) && self.to_join.as_ref() != Some(&selected) {
            info!(server = %selected, "selected new rotation server");
            self.to_join = Some(selected.clone());
            directives.push(self.issue_join(&selected));
            if self.current.is_some() {
                directives.push(Directive::Announce(format!(
                    "Switching servers, joining {name} shortly"
                )));
            }
        }

        if halted && self.to_join.as_ref() == Some(&selected) {
            info!("pending server switch in halted phase, sending release command");
            directives.push(Directive::Release);
        }
        directives
    }

    fn issue_join(&mut self, key: &ServerKey) -> Directive {
        if let Some(server) = self.servers.get_mut(key) {
            server.clear_session();
        }
        Directive::Join(key.clone())
    }

    fn set_current(&mut self, key: ServerKey, now: Instant) {
        if self.current.as_ref() != Some(&key) {
            self.clear_current();
        }
        if let Some(server) = self.servers.get_mut(&key) {
            server.start_session(now);
        }
        self.current = Some(key);
    }

    fn clear_current(&mut self) {
        if let Some(key) = self.current.take() {
            if let Some(server) = self.servers.get_mut(&key) {
                server.clear_session();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::PlayerState;

    const SPECTATOR: &str = "twitch.tv/BF2tv";

    fn key(host: &str) -> ServerKey {
        ServerKey::new(host, 16567, None)
    }

    fn config(host: &str, policy: RotationPolicy) -> ServerConfig {
        ServerConfig {
            key: key(host),
            policy,
        }
    }

    fn fallback() -> RotationPolicy {
        RotationPolicy {
            fallback: true,
            ..RotationPolicy::default()
        }
    }

    fn settings() -> RotationSettings {
        RotationSettings {
            score_sample_size: 1,
            average_time_on_player_sample_size: 3,
            ..RotationSettings::default()
        }
    }

    fn humans(count: usize) -> ServerState {
        ServerState {
            name: "server".into(),
            num_players: count as u32,
            max_players: 64,
            players: (0..count)
                .map(|i| PlayerState {
                    name: format!("player{i}"),
                    ping: 40,
                    ..PlayerState::default()
                })
                .collect(),
            ..ServerState::default()
        }
    }

    /// Rotation with A (4 humans) and fallback B (2 humans), both polled and scored.
    fn scored_rotation(now: Instant) -> RotationState {
        let mut rotation = RotationState::new(
            vec![
                config("a", RotationPolicy::default()),
                config("b", fallback()),
            ],
            settings(),
        );
        rotation.apply_states(vec![(key("a"), humans(4)), (key("b"), humans(2))], now);
        rotation.tick_scores();
        rotation
    }

    fn joins(directives: &[Directive]) -> Vec<&str> {
        directives
            .iter()
            .filter_map(|directive| match directive {
                Directive::Join(key) => Some(key.host.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn first_selection_joins_best_server_without_announcement() {
        let now = Instant::now();
        let mut rotation = scored_rotation(now);

        let directives = rotation.run_selection(SelectionOptions::default(), now);

        assert_eq!(directives, vec![Directive::Join(key("a"))]);
        assert_eq!(rotation.to_join().map(|s| s.key()), Some(&key("a")));
    }

    #[test]
    fn dwell_time_blocks_switching() {
        let now = Instant::now();
        let mut rotation = scored_rotation(now);
        rotation.handle_current_server(key("b"), now);

        let soon = now + Duration::from_secs(20);
        assert!(rotation.run_selection(SelectionOptions::default(), soon).is_empty());
        assert!(rotation.to_join().is_none());

        let later = now + Duration::from_secs(15 * 60);
        rotation.apply_states(vec![(key("a"), humans(4)), (key("b"), humans(2))], later);
        let directives = rotation.run_selection(SelectionOptions::default(), later);
        assert_eq!(
            directives,
            vec![
                Directive::Join(key("a")),
                Directive::Announce("Switching servers, joining server shortly".into()),
            ]
        );
    }

    #[test]
    fn ignore_time_on_server_bypasses_dwell() {
        let now = Instant::now();
        let mut rotation = scored_rotation(now);
        rotation.handle_current_server(key("b"), now);

        let directives = rotation.run_selection(
            SelectionOptions {
                all_selectable: false,
                ignore_time_on_server: true,
            },
            now,
        );
        assert_eq!(joins(&directives), vec!["a"]);
    }

    #[test]
    fn pending_join_blocks_further_switches() {
        let now = Instant::now();
        let mut rotation = scored_rotation(now);
        rotation.handle_current_server(key("b"), now);
        rotation.manual_join(key("c"));

        let directives = rotation.run_selection(
            SelectionOptions {
                all_selectable: false,
                ignore_time_on_server: true,
            },
            now,
        );
        assert!(directives.is_empty());
        assert_eq!(rotation.to_join().map(|s| s.key()), Some(&key("c")));
    }

    #[test]
    fn current_report_clears_matching_pending_join() {
        let now = Instant::now();
        let mut rotation = scored_rotation(now);
        rotation.run_selection(SelectionOptions::default(), now);

        rotation.handle_current_server(key("a"), now);

        assert!(rotation.to_join().is_none());
        assert_eq!(rotation.current().map(|s| s.key()), Some(&key("a")));
        assert!(rotation.current().is_some_and(|s| s.has_spectator_joined()));
    }

    #[test]
    fn unknown_current_server_resets_and_reselects() {
        let now = Instant::now();
        let mut rotation = scored_rotation(now);
        rotation.handle_current_server(key("b"), now);

        let directives = rotation.handle_current_server(key("x"), now);

        assert!(rotation.current().is_none());
        assert_eq!(joins(&directives), vec!["a", "a"]);
        assert_eq!(rotation.to_join().map(|s| s.key()), Some(&key("a")));
        assert!(rotation.server(&key("x")).is_none());
    }

    #[test]
    fn unknown_current_server_without_rotation_is_tracked_as_temporary() {
        let now = Instant::now();
        let mut rotation = RotationState::new(Vec::new(), settings());

        assert!(rotation.handle_current_server(key("x"), now).is_empty());

        let current = rotation.current().unwrap();
        assert!(current.policy.temporary);
        assert!(current.has_spectator_joined());

        assert!(rotation.handle_current_server(key("y"), now).is_empty());
        assert!(rotation.current().is_none());
        assert!(rotation.is_empty());

        rotation.handle_current_server(key("y"), now);
        assert_eq!(rotation.current().map(|s| s.key()), Some(&key("y")));
        assert_eq!(rotation.len(), 1);
    }

    #[test]
    fn unknown_current_server_reissues_pending_manual_join() {
        let now = Instant::now();
        let mut rotation = RotationState::new(Vec::new(), settings());
        rotation.manual_join(key("z"));

        let directives = rotation.handle_current_server(key("x"), now);

        assert_eq!(directives, vec![Directive::Join(key("z"))]);
        assert!(rotation.current().is_none());
        assert_eq!(rotation.to_join().map(|s| s.key()), Some(&key("z")));
        assert!(rotation.server(&key("x")).is_none());
    }

    #[test]
    fn halted_report_ignores_server_and_releases() {
        let now = Instant::now();
        let mut rotation = scored_rotation(now);
        rotation.handle_current_server(key("a"), now);

        let directives =
            rotation.handle_phase_report(PhaseReport::Halted { server: key("a") }, now);

        assert!(rotation.server(&key("a")).unwrap().policy.ignored);
        assert_eq!(
            directives,
            vec![
                Directive::Join(key("b")),
                Directive::Announce("Switching servers, joining server shortly".into()),
                Directive::Release,
            ]
        );
    }

    #[test]
    fn halted_with_pending_target_only_releases() {
        let now = Instant::now();
        let mut rotation = scored_rotation(now);
        rotation.handle_current_server(key("b"), now);
        rotation.run_selection(
            SelectionOptions {
                all_selectable: false,
                ignore_time_on_server: true,
            },
            now,
        );

        let directives =
            rotation.handle_phase_report(PhaseReport::Halted { server: key("b") }, now);
        assert_eq!(directives, vec![Directive::Release]);
    }

    #[test]
    fn rotation_enabled_phase_runs_selection() {
        let now = Instant::now();
        let mut rotation = scored_rotation(now);

        let directives =
            rotation.handle_phase_report(PhaseReport::Phase(GamePhase::InMenu), now);
        assert_eq!(directives, vec![Directive::Join(key("a"))]);

        assert!(rotation
            .handle_phase_report(PhaseReport::Phase(GamePhase::InMenu), now)
            .is_empty());
    }

    #[test]
    fn fast_player_rotation_forces_selection() {
        let now = Instant::now();
        let mut rotation = scored_rotation(now);
        rotation.handle_current_server(key("b"), now);

        assert!(rotation.handle_player_rotation(now).is_empty());
        assert!(rotation
            .handle_player_rotation(now + Duration::from_secs(1))
            .is_empty());
        let directives = rotation.handle_player_rotation(now + Duration::from_secs(2));

        assert_eq!(
            rotation.average_time_on_player(),
            Some(Duration::from_secs(1))
        );
        assert_eq!(joins(&directives), vec!["a"]);
    }

    #[test]
    fn slow_player_rotation_keeps_server() {
        let now = Instant::now();
        let mut rotation = scored_rotation(now);
        rotation.handle_current_server(key("b"), now);

        for step in 0..3 {
            let directives = rotation.handle_player_rotation(now + Duration::from_secs(step * 30));
            assert!(directives.is_empty());
        }
    }

    #[test]
    fn session_reset_clears_current() {
        let now = Instant::now();
        let mut rotation = scored_rotation(now);
        rotation.handle_current_server(key("a"), now);

        rotation.handle_session_reset();

        assert!(rotation.current().is_none());
        assert!(!rotation.server(&key("a")).unwrap().has_spectator_joined());
    }

    #[test]
    fn spectator_connect_rejoins_pending_or_current() {
        let now = Instant::now();
        let mut rotation = scored_rotation(now);
        assert!(rotation.handle_spectator_connected().is_empty());

        rotation.handle_current_server(key("b"), now);
        assert_eq!(
            rotation.handle_spectator_connected(),
            vec![Directive::Join(key("b"))]
        );

        rotation.manual_join(key("a"));
        assert_eq!(
            rotation.handle_spectator_connected(),
            vec![Directive::Join(key("a"))]
        );
    }

    #[test]
    fn manual_join_adds_temporary_server() {
        let mut rotation = RotationState::new(vec![config("a", RotationPolicy::default())], settings());

        let (outcome, directives) = rotation.manual_join(key("z"));

        assert_eq!(outcome, ManualJoinOutcome::Queued(key("z")));
        assert_eq!(directives, vec![Directive::Join(key("z"))]);
        assert!(rotation.server(&key("z")).unwrap().policy.temporary);
    }

    #[test]
    fn manual_join_clears_ignored_flag() {
        let mut rotation = RotationState::new(
            vec![config(
                "a",
                RotationPolicy {
                    ignored: true,
                    ..RotationPolicy::default()
                },
            )],
            settings(),
        );

        rotation.manual_join(key("a"));
        assert!(!rotation.server(&key("a")).unwrap().policy.ignored);
    }

    #[test]
    fn manual_join_to_current_server_with_spectator_present() {
        let now = Instant::now();
        let mut rotation = scored_rotation(now);
        let mut state = humans(2);
        state.players.push(PlayerState {
            name: SPECTATOR.into(),
            ..PlayerState::default()
        });
        rotation.apply_states(vec![(key("a"), state)], now);
        rotation.handle_current_server(key("a"), now);

        let (outcome, directives) = rotation.manual_join(key("a"));
        assert_eq!(outcome, ManualJoinOutcome::AlreadyOnServer);
        assert!(directives.is_empty());

        let locked = ServerKey::new("a", 16567, Some("pw".into()));
        let (outcome, _) = rotation.manual_join(locked.clone());
        assert_eq!(outcome, ManualJoinOutcome::Queued(locked));
    }

    #[test]
    fn ignore_and_notice_report_outcome() {
        let mut rotation = RotationState::new(vec![config("a", RotationPolicy::default())], settings());

        assert_eq!(rotation.set_ignored("a", 16567, true), FlagOutcome::Updated);
        assert_eq!(rotation.set_ignored("a", 16567, true), FlagOutcome::Unchanged);
        assert_eq!(rotation.set_ignored("a", 16567, false), FlagOutcome::Updated);
        assert_eq!(rotation.set_ignored("a", 1, false), FlagOutcome::NotFound);
    }

    #[test]
    fn temporary_servers_are_collected_once_unused() {
        let now = Instant::now();
        let mut rotation = scored_rotation(now);
        rotation.manual_join(key("z"));
        rotation.handle_current_server(key("z"), now);
        assert!(rotation.server(&key("z")).is_some());

        rotation.handle_current_server(key("a"), now);
        rotation.run_selection(SelectionOptions::default(), now);
        assert!(rotation.server(&key("z")).is_none());
    }

    #[test]
    fn reload_merges_rotation() {
        let now = Instant::now();
        let mut rotation = scored_rotation(now);
        rotation.handle_current_server(key("b"), now);

        rotation.reload(vec![
            config(
                "a",
                RotationPolicy {
                    weight: 2.0,
                    ..RotationPolicy::default()
                },
            ),
            config("c", RotationPolicy::default()),
        ]);

        let keys: Vec<_> = rotation.servers().map(|s| s.key().host.clone()).collect();
        assert_eq!(keys, vec!["a", "c", "b"]);

        let a = rotation.server(&key("a")).unwrap();
        assert_eq!(a.policy.weight, 2.0);
        assert!(a.current_score().is_some());
        assert!(a.state().is_some());

        let b = rotation.server(&key("b")).unwrap();
        assert!(b.policy.temporary);
        assert!(b.has_spectator_joined());
    }

    #[test]
    fn empty_rotation_never_selects() {
        let mut rotation = RotationState::new(Vec::new(), settings());
        assert!(rotation
            .run_selection(SelectionOptions::default(), Instant::now())
            .is_empty());
    }
}
