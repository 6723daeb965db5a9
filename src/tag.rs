//! Tracking tag validation and resolution.
//!
//! A tag is a short opaque identifier (1-10 ASCII alphanumerics) attached to
//! every upload so recordings can be grouped by campaign or tester. Invalid
//! values silently degrade to "no tag". The reserved value `off` switches
//! the uploader off for the whole session.

use log::debug;

use crate::prefs::{PrefStore, TAG_KEY};

/// Reserved tag value that disables the uploader.
const OFF: &str = "off";

const MAX_LEN: usize = 10;

/// Returns the candidate unchanged when it is 1-10 ASCII alphanumeric
/// characters, `None` otherwise.
pub fn validate(candidate: Option<&str>) -> Option<String> {
    let tag = candidate?;
    if tag.is_empty() || tag.len() > MAX_LEN {
        return None;
    }
    if !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(tag.to_string())
}

/// Validated tracking tag state for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingTag {
    /// No usable tag; uploads go out untagged.
    Absent,
    /// A validated tag, sent with every upload.
    Tagged(String),
    /// The reserved `off` value: nothing is recorded or sent this session.
    Disabled,
}

impl TrackingTag {
    /// Classify a candidate without touching any store.
    pub fn from_candidate(candidate: Option<&str>) -> TrackingTag {
        Self::classify(validate(candidate))
    }

    /// Resolve the session tag: a valid candidate wins and is persisted,
    /// otherwise the persisted tag is used (re-validated on the way in).
    /// Store failures fall back to no tag.
    pub fn resolve(candidate: Option<&str>, store: &dyn PrefStore) -> TrackingTag {
        let tag = match validate(candidate) {
            Some(tag) => {
                if let Err(e) = store.write(TAG_KEY, &tag) {
                    debug!("cannot persist tracking tag: {e}");
                }
                Some(tag)
            }
            None => store
                .read(TAG_KEY)
                .and_then(|stored| validate(Some(&stored))),
        };
        Self::classify(tag)
    }

    fn classify(tag: Option<String>) -> TrackingTag {
        match tag {
            Some(t) if t == OFF => TrackingTag::Disabled,
            Some(t) => TrackingTag::Tagged(t),
            None => TrackingTag::Absent,
        }
    }

    /// Form-field value, when one should be sent.
    pub fn as_field(&self) -> Option<&str> {
        match self {
            TrackingTag::Tagged(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, TrackingTag::Disabled)
    }
}
