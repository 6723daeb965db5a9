//! Tracking consent, resolved once at recorder startup.

use log::debug;

use crate::prefs::{PrefStore, CONSENT_KEY};

const YES: &str = "yes";
const NO:  &str = "no";

/// Tri-state consent. Bytes are admitted into the session buffer only when
/// consent is `Granted`; `Unset` gates admission exactly like `Denied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consent {
    Granted,
    Denied,
    /// The user has not made an explicit choice.
    Unset,
}

impl Consent {
    /// Load the persisted choice. Anything other than an explicit yes/no,
    /// including a store failure, reads as `Unset`.
    pub fn load(store: &dyn PrefStore) -> Consent {
        match store.read(CONSENT_KEY).as_deref() {
            Some(YES) => Consent::Granted,
            Some(NO)  => Consent::Denied,
            Some(other) => {
                debug!("unrecognized consent value {other:?}, treating as unset");
                Consent::Unset
            }
            None => Consent::Unset,
        }
    }

    /// Persist an explicit choice. `Unset` is never written; a failed write
    /// is logged and swallowed.
    pub fn persist(self, store: &dyn PrefStore) {
        let value = match self {
            Consent::Granted => YES,
            Consent::Denied  => NO,
            Consent::Unset   => return,
        };
        if let Err(e) = store.write(CONSENT_KEY, value) {
            debug!("cannot persist consent: {e}");
        }
    }

    pub fn is_granted(self) -> bool {
        self == Consent::Granted
    }
}
