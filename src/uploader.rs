//! One upload attempt against the collection endpoint.
//!
//! Builds the multipart form for `POST <origin>/record` and interprets the
//! response. A success status carries the session id as a plain-text body;
//! every other outcome, transport errors included, is a uniform failure and
//! the caller keeps the window for retry.

use log::{debug, warn};
use reqwest::multipart::{Form, Part};
use reqwest::Client;

/// Everything one attempt needs, copied out of the session under its lock.
#[derive(Debug)]
pub(crate) struct UploadJob {
    pub window:  Vec<u8>,
    pub offset:  u64,
    pub version: String,
    pub tag:     Option<String>,
    pub id:      Option<String>,
}

/// Outcome of one attempt.
#[derive(Debug)]
pub(crate) enum UploadOutcome {
    /// The endpoint accepted the append; the body is the session id.
    Accepted(String),
    Failed,
}

pub(crate) async fn send(http: &Client, endpoint: &str, job: UploadJob) -> UploadOutcome {
    let url = format!("{}/record", endpoint.trim_end_matches('/'));
    let len = job.window.len();

    // The endpoint parses `b` as a file field, so the part needs a filename.
    let mut form = Form::new()
        .text("v", job.version)
        .part("b", Part::bytes(job.window).file_name("blob"))
        .text("p", job.offset.to_string());
    if let Some(tag) = job.tag {
        form = form.text("t", tag);
    }
    if let Some(id) = job.id {
        form = form.text("id", id);
    }

    match http.post(&url).multipart(form).send().await {
        Ok(resp) if resp.status().is_success() => match resp.text().await {
            Ok(id) => {
                debug!("endpoint accepted {len} bytes for session {id}");
                UploadOutcome::Accepted(id)
            }
            Err(e) => {
                warn!("reading session id from {url}: {e}");
                UploadOutcome::Failed
            }
        },
        Ok(resp) => {
            warn!("upload of {len} bytes to {url}: HTTP {}", resp.status());
            UploadOutcome::Failed
        }
        Err(e) => {
            warn!("upload of {len} bytes to {url}: {e}");
            UploadOutcome::Failed
        }
    }
}
