//! Turns raw webhook bodies into typed GitLab events.

use std::fmt;

use crate::gitlab::{MergeRequestEvent, PushEvent};

pub const EVENT_HEADER: &str = "X-Gitlab-Event";

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported event `{0}`")]
    Unsupported(String),
    #[error("event kind is neither in `X-Gitlab-Event` nor in `object_kind`")]
    MissingKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Push,
    MergeRequest,
}

#[derive(Debug, serde::Deserialize)]
struct KindProbe {
    #[serde(default)]
    object_kind: Option<String>,
}

impl EventKind {
    pub fn from_header(value: &str) -> Result<Self, DecodeError> {
        match value.trim() {
            "Push Hook" => Ok(Self::Push),
            "Merge Request Hook" => Ok(Self::MergeRequest),
            other => Err(DecodeError::Unsupported(other.to_owned())),
        }
    }

    pub fn from_object_kind(value: &str) -> Result<Self, DecodeError> {
        match value {
            "push" => Ok(Self::Push),
            "merge_request" => Ok(Self::MergeRequest),
            other => Err(DecodeError::Unsupported(other.to_owned())),
        }
    }

    /// Picks the decode target: header first, then the body's `object_kind`.
    /// Without either, strict mode gives up and lenient mode assumes a merge
    /// request.
    pub fn resolve(header: Option<&str>, body: &[u8], strict: bool) -> Result<Self, DecodeError> {
        if let Some(header) = header {
            return Self::from_header(header);
        }

        let probe: KindProbe = serde_json::from_slice(body)?;
        match probe.object_kind {
            Some(kind) => Self::from_object_kind(&kind),
            None if strict => Err(DecodeError::MissingKind),
            None => Ok(Self::MergeRequest),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Push => f.write_str("push"),
            EventKind::MergeRequest => f.write_str("merge request"),
        }
    }
}

pub fn decode_merge_request(body: &[u8]) -> Result<MergeRequestEvent, DecodeError> {
    serde_json::from_slice(body).map_err(Into::into)
}

pub fn decode_push(body: &[u8]) -> Result<PushEvent, DecodeError> {
    serde_json::from_slice(body).map_err(Into::into)
}

/// A decoded webhook. Serializes as the bare payload.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Event {
    Push(PushEvent),
    MergeRequest(MergeRequestEvent),
}

impl Event {
    pub fn decode(header: Option<&str>, body: &[u8], strict: bool) -> Result<Self, DecodeError> {
        match EventKind::resolve(header, body, strict)? {
            EventKind::Push => decode_push(body).map(Self::Push),
            EventKind::MergeRequest => decode_merge_request(body).map(Self::MergeRequest),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::Push(_) => EventKind::Push,
            Event::MergeRequest(_) => EventKind::MergeRequest,
        }
    }
}
