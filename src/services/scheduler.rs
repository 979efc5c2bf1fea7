//! Wall-clock aligned timers feeding the controller.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, info};

use crate::services::controller::{ControllerEvent, ControllerHandle};

/// Upstream refreshes at seconds 0, 20 and 40; poll ten seconds later.
const REFRESH_PERIOD: Duration = Duration::from_secs(20);
const REFRESH_OFFSET: Duration = Duration::from_secs(10);

/// Delay from `now` (time since the epoch) until the next instant congruent to `offset`
/// modulo `period`. An instant exactly on the grid waits a full period.
pub fn delay_until_aligned(now: Duration, period: Duration, offset: Duration) -> Duration {
    let period_ms = period.as_millis().max(1);
    let offset_ms = offset.as_millis() % period_ms;
    let phase_ms = now.as_millis() % period_ms;

    let wait_ms = if phase_ms < offset_ms {
        offset_ms - phase_ms
    } else {
        period_ms - phase_ms + offset_ms
    };
    Duration::from_millis(u64::try_from(wait_ms).unwrap_or(u64::MAX))
}

fn since_epoch() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

fn spawn_aligned(
    handle: ControllerHandle,
    name: &'static str,
    period: Duration,
    offset: Duration,
    event: fn() -> ControllerEvent,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(timer = name, period_secs = period.as_secs(), "timer started");
        loop {
            sleep(delay_until_aligned(since_epoch(), period, offset)).await;
            debug!(timer = name, "timer fired");
            if handle.notify(event()).is_err() {
                break;
            }
        }
        info!(timer = name, "timer stopped");
    })
}

/// Refresh server states at seconds 10, 30 and 50 of every minute.
pub fn spawn_refresh_timer(handle: ControllerHandle) -> JoinHandle<()> {
    spawn_aligned(
        handle,
        "state-refresh",
        REFRESH_PERIOD,
        REFRESH_OFFSET,
        || ControllerEvent::RefreshDue,
    )
}

/// Push score samples every `interval_minutes`, aligned to the wall clock.
pub fn spawn_score_timer(handle: ControllerHandle, interval_minutes: u64) -> JoinHandle<()> {
    let period = Duration::from_secs(interval_minutes.max(1).saturating_mul(60));
    spawn_aligned(handle, "score-update", period, Duration::ZERO, || {
        ControllerEvent::ScoreDue
    })
}
