//! Buffered telemetry uploader for host applications.
//!
//! A [`Recorder`] accumulates an opaque byte stream pushed by the host and
//! incrementally appends it to a collection endpoint over HTTP POST,
//! without blocking the host and without duplicating or reordering bytes
//! across network failures. Admission is gated on user consent; delivery is
//! best-effort (a window may be retried whole, never reordered, never sent
//! twice at the same offset from the server's point of view).
//!
//! ```no_run
//! use beacon_client::{Consent, Recorder, RecorderConfig, TrackingTag};
//!
//! # fn run() -> beacon_client::Result<()> {
//! let recorder = Recorder::new(
//!     RecorderConfig::default(),
//!     Consent::Granted,
//!     TrackingTag::from_candidate(Some("demo")),
//! )?;
//! recorder.set_version("1.2.0");
//! recorder.push_bytes(&[1, 2, 3]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod consent;
pub mod error;
pub mod prefs;
mod scheduler;
pub mod session;
pub mod tag;
mod uploader;

use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

pub use config::{load_config, validate_config, BackoffKind, RecorderConfig};
pub use consent::Consent;
pub use error::{RecorderError, Result};
pub use prefs::{FilePrefStore, PrefStore};
pub use tag::TrackingTag;

use session::{FlushState, SessionState};

/// Shared innards of a [`Recorder`]; one per session.
pub(crate) struct Shared {
    pub(crate) cfg:     RecorderConfig,
    pub(crate) http:    reqwest::Client,
    pub(crate) consent: Consent,
    pub(crate) tag:     TrackingTag,
    state: Mutex<SessionState>,
}

impl Shared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionState> {
        // A poisoned lock still holds consistent session state; keep going.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Handle to one telemetry session. Cheap to clone; all clones feed the
/// same buffer.
#[derive(Clone)]
pub struct Recorder {
    shared: Arc<Shared>,
}

impl Recorder {
    /// Create a recorder from explicit parts: a consent snapshot and an
    /// already-resolved tag.
    pub fn new(cfg: RecorderConfig, consent: Consent, tag: TrackingTag) -> Result<Recorder> {
        config::validate_config(&cfg)?;
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .build()?;
        Ok(Recorder {
            shared: Arc::new(Shared {
                cfg,
                http,
                consent,
                tag,
                state: Mutex::new(SessionState::new()),
            }),
        })
    }

    /// Create a recorder resolving consent and tag through a preference
    /// store: the persisted consent choice is snapshotted, and a valid
    /// candidate tag is persisted while an absent or invalid one falls back
    /// to the stored tag. Store failures read as unset/absent.
    pub fn with_prefs(
        cfg: RecorderConfig,
        store: &dyn PrefStore,
        tag_candidate: Option<&str>,
    ) -> Result<Recorder> {
        let consent = Consent::load(store);
        let tag = TrackingTag::resolve(tag_candidate, store);
        Self::new(cfg, consent, tag)
    }

    /// Admit a chunk of telemetry bytes and arm a near-immediate flush so
    /// bursts of small pushes coalesce into one request. The chunk is
    /// silently dropped unless consent is granted and the uploader is not
    /// switched off. Safe to call at arbitrary frequency; must be called
    /// from within a tokio runtime.
    pub fn push_bytes(&self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        if !self.shared.consent.is_granted() {
            debug!("dropping {} bytes: consent not granted", chunk.len());
            return;
        }
        if self.shared.tag.is_disabled() {
            debug!("dropping {} bytes: tracking switched off", chunk.len());
            return;
        }
        self.shared.lock().append(chunk);
        scheduler::arm(&self.shared, self.shared.cfg.flush_delay());
    }

    /// Supply the host application's version string, reported with every
    /// upload. Meant to be called once, before the first flush.
    pub fn set_version(&self, version: &str) {
        self.shared.lock().set_version(version);
    }

    /// Bytes the endpoint has acknowledged so far.
    pub fn acknowledged(&self) -> u64 {
        self.shared.lock().acknowledged()
    }

    /// Bytes buffered but not yet acknowledged.
    pub fn pending_len(&self) -> usize {
        self.shared.lock().pending_len()
    }

    /// Server-assigned session id, once any upload has been accepted.
    pub fn session_id(&self) -> Option<String> {
        self.shared.lock().id().map(str::to_string)
    }

    /// True while a flush timer or request is outstanding.
    pub fn flush_outstanding(&self) -> bool {
        self.shared.lock().flush != FlushState::Idle
    }
}
