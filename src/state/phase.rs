use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::server::ServerKey;

/// Phases reported by the spectator client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum GamePhase {
    /// Initial phase until the spectator reports anything.
    Initializing,
    /// Game client is launching.
    Launching,
    /// Sitting in the main menu.
    InMenu,
    /// Loading a map.
    Loading,
    /// Spawning into the round.
    Spawning,
    /// Following players.
    Spectating,
    /// Round over, waiting for the next map.
    BetweenRounds,
    /// Game client is closing.
    Closing,
    /// Spectator is starting.
    Starting,
    /// Spectator is stopping.
    Stopping,
    /// Spectator is stopped.
    Stopped,
    /// Spectator got stuck on a server and waits to be released.
    Halted,
}

impl GamePhase {
    /// Whether the rotation may move the spectator in this phase.
    pub fn is_rotation_enabled(self) -> bool {
        !matches!(
            self,
            GamePhase::Loading | GamePhase::Spawning | GamePhase::Spectating | GamePhase::Halted
        )
    }
}

/// Phase report as received from the spectator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseReport {
    /// Plain phase change.
    Phase(GamePhase),
    /// The spectator is stuck on `server`.
    Halted {
        /// Server the spectator cannot leave on its own.
        server: ServerKey,
    },
}

impl PhaseReport {
    /// Phase carried by the report.
    pub fn phase(&self) -> GamePhase {
        match self {
            PhaseReport::Phase(phase) => *phase,
            PhaseReport::Halted { .. } => GamePhase::Halted,
        }
    }
}

/// Edge raised by a phase change that the rotation must react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseEdge {
    /// Entered a rotation-enabled phase from the initial or a non rotation-enabled one.
    RotationEnabled {
        /// Previous phase.
        from: GamePhase,
        /// New phase.
        to: GamePhase,
    },
    /// Entered the halted phase while on `server`.
    Halted {
        /// Server the spectator is stuck on.
        server: ServerKey,
    },
}

/// Tracks the last reported phase and detects edges.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    phase: GamePhase,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    /// Create a tracker in [`GamePhase::Initializing`].
    pub fn new() -> Self {
        Self {
            phase: GamePhase::Initializing,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Record a report, returning the edge it raises if any. Repeated phases are ignored.
    pub fn observe(&mut self, report: PhaseReport) -> Option<PhaseEdge> {
        let next = report.phase();
        if next == self.phase {
            return None;
        }

        let previous = std::mem::replace(&mut self.phase, next);
        match report {
            PhaseReport::Halted { server } => Some(PhaseEdge::Halted { server }),
            PhaseReport::Phase(_) => {
                let from_disabled =
                    previous == GamePhase::Initializing || !previous.is_rotation_enabled();
                (from_disabled && next.is_rotation_enabled()).then_some(PhaseEdge::RotationEnabled {
                    from: previous,
                    to: next,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ServerKey {
        ServerKey::new("1.1.1.1", 16567, None)
    }

    #[test]
    fn initial_phase_is_initializing() {
        assert_eq!(PhaseTracker::new().phase(), GamePhase::Initializing);
    }

    #[test]
    fn first_rotation_enabled_phase_raises_edge() {
        let mut tracker = PhaseTracker::new();
        assert_eq!(
            tracker.observe(PhaseReport::Phase(GamePhase::InMenu)),
            Some(PhaseEdge::RotationEnabled {
                from: GamePhase::Initializing,
                to: GamePhase::InMenu,
            })
        );
    }

    #[test]
    fn repeated_phase_is_ignored() {
        let mut tracker = PhaseTracker::new();
        tracker.observe(PhaseReport::Phase(GamePhase::Spectating));
        assert_eq!(tracker.observe(PhaseReport::Phase(GamePhase::Spectating)), None);
    }

    #[test]
    fn enabled_to_enabled_raises_nothing() {
        let mut tracker = PhaseTracker::new();
        tracker.observe(PhaseReport::Phase(GamePhase::InMenu));
        assert_eq!(tracker.observe(PhaseReport::Phase(GamePhase::Launching)), None);
        assert_eq!(tracker.phase(), GamePhase::Launching);
    }

    #[test]
    fn leaving_spectating_for_between_rounds_raises_edge() {
        let mut tracker = PhaseTracker::new();
        tracker.observe(PhaseReport::Phase(GamePhase::Spectating));
        assert!(matches!(
            tracker.observe(PhaseReport::Phase(GamePhase::BetweenRounds)),
            Some(PhaseEdge::RotationEnabled { .. })
        ));
    }

    #[test]
    fn entering_disabled_phase_raises_nothing() {
        let mut tracker = PhaseTracker::new();
        tracker.observe(PhaseReport::Phase(GamePhase::InMenu));
        assert_eq!(tracker.observe(PhaseReport::Phase(GamePhase::Loading)), None);
    }

    #[test]
    fn halted_raises_only_halted_edge() {
        let mut tracker = PhaseTracker::new();
        tracker.observe(PhaseReport::Phase(GamePhase::Spectating));
        assert_eq!(
            tracker.observe(PhaseReport::Halted { server: key() }),
            Some(PhaseEdge::Halted { server: key() })
        );
        assert_eq!(tracker.phase(), GamePhase::Halted);
        assert_eq!(tracker.observe(PhaseReport::Halted { server: key() }), None);
    }

    #[test]
    fn leaving_halted_for_enabled_phase_raises_edge() {
        let mut tracker = PhaseTracker::new();
        tracker.observe(PhaseReport::Halted { server: key() });
        assert!(matches!(
            tracker.observe(PhaseReport::Phase(GamePhase::InMenu)),
            Some(PhaseEdge::RotationEnabled {
                from: GamePhase::Halted,
                ..
            })
        ));
    }

    #[test]
    fn rotation_enabled_phases() {
        let disabled = [
            GamePhase::Loading,
            GamePhase::Spawning,
            GamePhase::Spectating,
            GamePhase::Halted,
        ];
        for phase in disabled {
            assert!(!phase.is_rotation_enabled());
        }
        assert!(GamePhase::Initializing.is_rotation_enabled());
        assert!(GamePhase::BetweenRounds.is_rotation_enabled());
    }

    #[test]
    fn phases_use_kebab_case() {
        let phase: GamePhase = serde_json::from_str("\"between-rounds\"").unwrap();
        assert_eq!(phase, GamePhase::BetweenRounds);
        assert_eq!(serde_json::to_string(&GamePhase::InMenu).unwrap(), "\"in-menu\"");
    }
}
