//! Session State: the append-only byte buffer and its upload bookkeeping.
//!
//! Every field is mutated under the recorder's single mutex. The scheduler
//! copies a window out, sends it without the lock held, and reports back
//! through [`SessionState::on_upload_success`] / [`SessionState::on_upload_failure`].

use std::collections::VecDeque;

use log::{debug, warn};

/// Single-flight guard for the flush pipeline. At most one timer or
/// in-flight request exists per session; every transition happens with the
/// session lock held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushState {
    /// No flush scheduled or running.
    Idle,
    /// A delay timer is counting down toward an attempt.
    TimerArmed,
    /// A request is on the wire.
    InFlight,
}

/// Per-session upload state. Created once per process; torn down with it.
#[derive(Debug)]
pub struct SessionState {
    /// Server-assigned id. `None` until the first accepted upload, then
    /// immutable and echoed on every request.
    id: Option<String>,
    /// Bytes the server has confirmed receiving. Doubles as the append
    /// position declared on the next request.
    acknowledged: u64,
    /// Appended, not-yet-acknowledged bytes. Only ever extended at the back
    /// and drained from the front.
    pending: VecDeque<u8>,
    /// Single-flight flush guard.
    pub(crate) flush: FlushState,
    /// Host application version, sent with every upload.
    version: String,
    /// Consecutive failed attempts; feeds the backoff strategy.
    failures: u32,
}

impl SessionState {
    pub fn new() -> Self {
        SessionState {
            id:           None,
            acknowledged: 0,
            pending:      VecDeque::new(),
            flush:        FlushState::Idle,
            version:      "0.0.0".to_string(),
            failures:     0,
        }
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.pending.extend(bytes.iter().copied());
    }

    pub fn set_version(&mut self, version: &str) {
        self.version = version.to_string();
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn acknowledged(&self) -> u64 {
        self.acknowledged
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Threshold policy: a session that has never had anything accepted
    /// holds back until the buffer strictly exceeds `min_first_send`, so a
    /// handful of stray events never registers a session with the backend.
    /// After the first acknowledgement any non-empty buffer is eligible.
    pub fn has_useful_bytes(&self, min_first_send: usize) -> bool {
        let minimum = if self.acknowledged == 0 { min_first_send } else { 0 };
        self.pending.len() > minimum
    }

    /// Copy the current window for one upload attempt. The buffer itself is
    /// only shortened by `on_upload_success`.
    pub fn window(&self) -> Vec<u8> {
        self.pending.iter().copied().collect()
    }

    /// The server accepted `sent` bytes at the declared offset and answered
    /// with the authoritative session id.
    pub fn on_upload_success(&mut self, sent: usize, id: &str) {
        match self.id.as_deref() {
            None => self.id = Some(id.to_string()),
            Some(existing) if existing != id => {
                warn!("endpoint answered session id {id:?} but {existing:?} is already assigned, keeping the original");
            }
            Some(_) => {}
        }
        self.acknowledged += sent as u64;
        self.pending.drain(..sent);
        self.failures = 0;
        debug!(
            "acknowledged {sent} bytes (total {}, {} pending)",
            self.acknowledged,
            self.pending.len()
        );
    }

    /// A failed attempt leaves the buffer and offset untouched; the window
    /// will be retried whole.
    pub fn on_upload_failure(&mut self) {
        self.failures += 1;
    }
}
