//! Upload scheduling: the single-flight debounced timer in front of the
//! uploader.
//!
//! The flush guard moves `Idle -> TimerArmed -> InFlight` and then directly
//! to `TimerArmed` (rearm) or `Idle`, always under the session lock, so a
//! racing `push_bytes` can never arm a second attempt while one is pending
//! or on the wire.

use std::sync::Arc;
use std::time::Duration;

use crate::config::BackoffKind;
use crate::session::FlushState;
use crate::uploader::{self, UploadJob, UploadOutcome};
use crate::Shared;

/// Arm a flush attempt after `delay` if none is outstanding; otherwise a
/// no-op.
pub(crate) fn arm(shared: &Arc<Shared>, delay: Duration) {
    let mut state = shared.lock();
    if state.flush != FlushState::Idle {
        return;
    }
    state.flush = FlushState::TimerArmed;
    drop(state);
    spawn_flush(Arc::clone(shared), delay);
}

fn spawn_flush(shared: Arc<Shared>, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        attempt(shared).await;
    });
}

/// One timer expiry: send the current window if it is worth sending, then
/// decide the next state.
async fn attempt(shared: Arc<Shared>) {
    let job = {
        let mut state = shared.lock();
        if !state.has_useful_bytes(shared.cfg.min_first_send) {
            // Nothing worth sending; clear the guard without rescheduling.
            state.flush = FlushState::Idle;
            return;
        }
        state.flush = FlushState::InFlight;
        UploadJob {
            window:  state.window(),
            offset:  state.acknowledged(),
            version: state.version().to_string(),
            tag:     shared.tag.as_field().map(str::to_string),
            id:      state.id().map(str::to_string),
        }
    };
    let sent = job.window.len();

    let outcome = uploader::send(&shared.http, &shared.cfg.endpoint, job).await;

    let mut state = shared.lock();
    match outcome {
        UploadOutcome::Accepted(id) => {
            state.on_upload_success(sent, &id);
            if state.pending_len() > 0 {
                state.flush = FlushState::TimerArmed;
                spawn_flush(Arc::clone(&shared), shared.cfg.flush_delay());
            } else {
                state.flush = FlushState::Idle;
            }
        }
        UploadOutcome::Failed => {
            state.on_upload_failure();
            let delay = backoff_delay_ms(
                shared.cfg.retry_backoff,
                shared.cfg.retry_delay_ms,
                shared.cfg.retry_max_ms,
                state.failures(),
            );
            state.flush = FlushState::TimerArmed;
            spawn_flush(Arc::clone(&shared), Duration::from_millis(delay));
        }
    }
}

/// Delay before retry number `failures` (1-based).
fn backoff_delay_ms(kind: BackoffKind, base_ms: u64, max_ms: u64, failures: u32) -> u64 {
    match kind {
        BackoffKind::Fixed => base_ms,
        BackoffKind::Exponential => {
            let shift = failures.saturating_sub(1).min(16);
            base_ms.saturating_mul(1u64 << shift).min(max_ms)
        }
    }
}
