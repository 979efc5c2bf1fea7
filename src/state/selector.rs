use std::time::Instant;

use tracing::{debug, warn};

use crate::{
    config::RotationSettings,
    state::{scoring::selectable, server::GameServer},
};

/// Pick the best rotation server among `options`.
///
/// Ignored servers are never returned. Other servers must be selectable unless
/// `all_selectable` is set. The highest mean score wins; on equal scores the server
/// listed last wins.
pub fn select_server<'a>(
    options: &[&'a GameServer],
    all_selectable: bool,
    now: Instant,
    settings: &RotationSettings,
) -> Option<&'a GameServer> {
    match options {
        [] => {
            warn!("no servers in rotation");
            None
        }
        [only] => {
            if only.policy.ignored {
                warn!(server = %only.key(), "only available rotation server is ignored");
                return None;
            }
            Some(*only)
        }
        _ => {
            if !options.iter().any(|server| server.policy.fallback) {
                warn!(
                    "no fallback server configured, rotation server selection may not be possible in some cases"
                );
            }

            let mut candidates: Vec<(&GameServer, f64)> = options
                .iter()
                .copied()
                .filter(|server| {
                    if server.policy.ignored {
                        warn!(server = %server.key(), "rotation server is ignored and excluded from selection");
                        return false;
                    }
                    true
                })
                .filter_map(|server| {
                    let score = server.current_score().unwrap_or(0.0);
                    let is_selectable = selectable(server, now, settings);
                    debug!(
                        server = %server.key(),
                        score,
                        selectable = is_selectable,
                        overridden = all_selectable && !is_selectable,
                        "rotation server score"
                    );
                    (is_selectable || all_selectable).then_some((server, score))
                })
                .collect();

            candidates.sort_by(|(_, a), (_, b)| a.total_cmp(b));
            candidates.pop().map(|(server, _)| server)
        }
    }
}
