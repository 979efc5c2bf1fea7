//! Selectability and scoring rules applied to rotation servers.

use std::time::{Duration, Instant};

use crate::{
    config::RotationSettings,
    state::server::{ConditionSet, GameServer},
};

/// Poll results older than this make a server unselectable.
pub const STATE_MAX_AGE: Duration = Duration::from_secs(30);

/// Whether the server may be picked by a regular rotation pass.
pub fn selectable(server: &GameServer, now: Instant, settings: &RotationSettings) -> bool {
    if server.policy.fallback {
        return true;
    }
    if server.policy.temporary {
        return false;
    }

    let fresh = server
        .live()
        .is_some_and(|live| now.saturating_duration_since(live.updated_at) <= STATE_MAX_AGE);
    if !fresh {
        return false;
    }

    if !server.scores_full() {
        return false;
    }

    match &server.policy.conditions {
        Some(conditions) => matches_conditions(server, conditions, settings),
        None => true,
    }
}

fn matches_conditions(
    server: &GameServer,
    conditions: &ConditionSet,
    settings: &RotationSettings,
) -> bool {
    let humans = server.human_players(&settings.spectator_name).count();
    if humans < conditions.min_players.unwrap_or(0) as usize {
        return false;
    }

    let Some(state) = server.state() else {
        return true;
    };

    // An unknown map or game type never disqualifies a server.
    if let Some(map_names) = &conditions.map_names {
        if !state.map_name.is_empty() && !map_names.contains(&state.map_name) {
            return false;
        }
    }
    if let Some(game_types) = &conditions.game_types {
        if !state.game_type.is_empty() && !game_types.contains(&state.game_type) {
            return false;
        }
    }

    conditions
        .no_vehicles
        .is_none_or(|required| required == state.no_vehicles)
}

/// Weighted player count before weight and penalty.
pub fn base_score(server: &GameServer, settings: &RotationSettings) -> f64 {
    let ratio = settings.active_player_ratio;
    let humans = server.human_players(&settings.spectator_name).count() as f64;
    let active = server.active_players(&settings.spectator_name).count() as f64;
    (1.0 - ratio) * humans + ratio * active
}

/// Factor in `[max_free_slot_penalty, 1]` shrinking the score of servers running out of free slots.
pub fn free_slot_penalty(server: &GameServer, settings: &RotationSettings) -> f64 {
    let threshold = settings.free_slot_penalty_threshold;
    if threshold >= 1.0 {
        return 1.0;
    }

    let (num_players, max_players, reserved_slots) = match server.state() {
        Some(state) => (state.num_players, state.max_players, state.reserved_slots),
        None => (0, 1, 0),
    };
    if max_players == 0 {
        return 1.0;
    }

    let free = f64::from(max_players) - f64::from(num_players) - f64::from(reserved_slots);
    let raw = free / ((1.0 - threshold) * f64::from(max_players));
    raw.max(settings.max_free_slot_penalty).min(1.0)
}

/// Compute a new score sample and push it into the server's history.
pub fn tick_score(server: &mut GameServer, settings: &RotationSettings) -> f64 {
    let score =
        base_score(server, settings) * server.policy.weight * free_slot_penalty(server, settings);
    server.push_score(score);
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        provider::{PlayerState, ServerState},
        state::{
            selector::select_server,
            server::{RotationPolicy, ServerKey},
        },
    };

    fn settings() -> RotationSettings {
        RotationSettings {
            score_sample_size: 2,
            ..RotationSettings::default()
        }
    }

    fn human(name: &str, score: i32) -> PlayerState {
        PlayerState {
            name: name.into(),
            ping: 40,
            score,
            ..PlayerState::default()
        }
    }

    fn server_with(policy: RotationPolicy) -> GameServer {
        GameServer::new(ServerKey::new("1.1.1.1", 16567, None), policy, 2)
    }

    fn ready_server(policy: RotationPolicy, state: ServerState, now: Instant) -> GameServer {
        let mut server = server_with(policy);
        server.apply_state(state, now);
        server.push_score(1.0);
        server.push_score(1.0);
        server
    }

    fn state(players: Vec<PlayerState>) -> ServerState {
        ServerState {
            num_players: players.len() as u32,
            max_players: 64,
            map_name: "Strike At Karkand".into(),
            game_type: "gpm_cq".into(),
            players,
            ..ServerState::default()
        }
    }

    #[test]
    fn fallback_is_always_selectable() {
        let policy = RotationPolicy {
            fallback: true,
            ..RotationPolicy::default()
        };
        assert!(selectable(&server_with(policy), Instant::now(), &settings()));
    }

    #[test]
    fn temporary_is_never_selectable() {
        let now = Instant::now();
        let server = ready_server(RotationPolicy::temporary(), state(vec![]), now);
        assert!(!selectable(&server, now, &settings()));
    }

    #[test]
    fn never_polled_server_is_not_selectable() {
        let mut server = server_with(RotationPolicy::default());
        server.push_score(1.0);
        server.push_score(1.0);
        assert!(!selectable(&server, Instant::now(), &settings()));
    }

    #[test]
    fn stale_state_is_not_selectable() {
        let polled = Instant::now();
        let server = ready_server(RotationPolicy::default(), state(vec![]), polled);

        assert!(selectable(&server, polled + Duration::from_secs(29), &settings()));
        assert!(selectable(&server, polled + Duration::from_secs(30), &settings()));
        assert!(!selectable(&server, polled + Duration::from_secs(31), &settings()));
    }

    #[test]
    fn partial_score_history_is_not_selectable() {
        let now = Instant::now();
        let mut server = server_with(RotationPolicy::default());
        server.apply_state(state(vec![]), now);
        server.push_score(1.0);
        assert!(!selectable(&server, now, &settings()));
    }

    #[test]
    fn conditions_are_combined() {
        let now = Instant::now();
        let conditions = ConditionSet {
            min_players: Some(2),
            map_names: Some(vec!["Strike At Karkand".into()]),
            game_types: Some(vec!["gpm_cq".into()]),
            no_vehicles: Some(false),
        };
        let policy = RotationPolicy {
            conditions: Some(conditions.clone()),
            ..RotationPolicy::default()
        };

        let full = ready_server(
            policy.clone(),
            state(vec![human("a", 1), human("b", 2)]),
            now,
        );
        assert!(selectable(&full, now, &settings()));

        let too_few = ready_server(policy.clone(), state(vec![human("a", 1)]), now);
        assert!(!selectable(&too_few, now, &settings()));

        let mut other_map = state(vec![human("a", 1), human("b", 2)]);
        other_map.map_name = "Wake Island 2007".into();
        let other_map = ready_server(policy.clone(), other_map, now);
        assert!(!selectable(&other_map, now, &settings()));

        let mut infantry = state(vec![human("a", 1), human("b", 2)]);
        infantry.no_vehicles = true;
        let infantry = ready_server(policy, infantry, now);
        assert!(!selectable(&infantry, now, &settings()));
    }

    #[test]
    fn unknown_map_does_not_disqualify() {
        let now = Instant::now();
        let policy = RotationPolicy {
            conditions: Some(ConditionSet {
                map_names: Some(vec!["Dalian Plant".into()]),
                ..ConditionSet::default()
            }),
            ..RotationPolicy::default()
        };
        let mut unknown = state(vec![]);
        unknown.map_name.clear();
        let server = ready_server(policy, unknown, now);
        assert!(selectable(&server, now, &settings()));
    }

    #[test]
    fn base_score_weights_active_players() {
        let mut server = server_with(RotationPolicy::default());
        server.apply_state(
            state(vec![human("idle", 0), human("a", 5), human("b", 3)]),
            Instant::now(),
        );
        let score = base_score(&server, &settings());
        assert!((score - (0.9 * 3.0 + 0.1 * 2.0)).abs() < 1e-9);
    }

    #[test]
    fn active_players_tip_the_balance() {
        let now = Instant::now();
        let mut a = GameServer::new(ServerKey::new("a", 16567, None), RotationPolicy::default(), 2);
        a.apply_state(
            state(vec![human("a1", 4), human("a2", 1), human("a3", 0), human("a4", 0)]),
            now,
        );
        let mut b = GameServer::new(ServerKey::new("b", 16567, None), RotationPolicy::default(), 2);
        b.apply_state(state(vec![human("b1", 2), human("b2", 7)]), now);

        for _ in 0..2 {
            assert!((tick_score(&mut a, &settings()) - 3.8).abs() < 1e-9);
            assert!((tick_score(&mut b, &settings()) - 2.0).abs() < 1e-9);
        }

        let selected = select_server(&[&a, &b], false, now, &settings());
        assert_eq!(selected.map(|server| server.key().host.as_str()), Some("a"));
    }

    #[test]
    fn penalty_disabled_at_full_threshold() {
        let settings = RotationSettings {
            free_slot_penalty_threshold: 1.0,
            ..settings()
        };
        let mut server = server_with(RotationPolicy::default());
        let mut full = state(vec![]);
        full.num_players = 64;
        server.apply_state(full, Instant::now());
        assert_eq!(free_slot_penalty(&server, &settings), 1.0);
    }

    #[test]
    fn penalty_is_clamped() {
        let mut server = server_with(RotationPolicy::default());
        let mut almost_full = state(vec![]);
        almost_full.max_players = 100;
        almost_full.num_players = 95;
        server.apply_state(almost_full.clone(), Instant::now());
        assert!((free_slot_penalty(&server, &settings()) - 0.5).abs() < 1e-9);

        almost_full.num_players = 93;
        server.apply_state(almost_full.clone(), Instant::now());
        assert!((free_slot_penalty(&server, &settings()) - 0.7).abs() < 1e-9);

        almost_full.num_players = 10;
        server.apply_state(almost_full, Instant::now());
        assert_eq!(free_slot_penalty(&server, &settings()), 1.0);
    }

    #[test]
    fn zero_slot_server_has_no_penalty() {
        let mut server = server_with(RotationPolicy::default());
        let mut broken = state(vec![]);
        broken.max_players = 0;
        server.apply_state(broken, Instant::now());
        assert_eq!(free_slot_penalty(&server, &settings()), 1.0);
    }

    #[test]
    fn tick_score_applies_weight() {
        let mut server = server_with(RotationPolicy {
            weight: 2.0,
            ..RotationPolicy::default()
        });
        server.apply_state(state(vec![human("a", 0), human("b", 0)]), Instant::now());

        let score = tick_score(&mut server, &settings());
        assert!((score - 3.6).abs() < 1e-9);
        assert_eq!(server.current_score(), Some(score));
    }
}
