//! Watch notifications.

use serde::Deserialize;
use serde_json::Value;

use crate::resource::InstanceDocument;
use crate::watch::WatchError;

/// One notification of the watch feed.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    Added(InstanceDocument),
    Modified(InstanceDocument),
    /// Carries the last known state of the instance.
    Deleted(InstanceDocument),
    Bookmark,
    /// Error status reported inside the feed.
    Error(Value),
    /// Any other notification type.
    Unknown(String),
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    object: Value,
}

impl WatchEvent {
    /// Decodes one newline-delimited JSON line of a watch response.
    ///
    /// The line is taken as raw bytes; invalid UTF-8 is a decode error.
    pub fn from_line(line: impl AsRef<[u8]>) -> Result<Self, WatchError> {
        let raw: RawEvent = serde_json::from_slice(line.as_ref()).map_err(WatchError::Decode)?;
        Ok(match raw.kind.as_str() {
            "ADDED" => WatchEvent::Added(raw.object.into()),
            "MODIFIED" => WatchEvent::Modified(raw.object.into()),
            "DELETED" => WatchEvent::Deleted(raw.object.into()),
            "BOOKMARK" => WatchEvent::Bookmark,
            "ERROR" => WatchEvent::Error(raw.object),
            _ => WatchEvent::Unknown(raw.kind),
        })
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &str {
        match self {
            WatchEvent::Added(_) => "ADDED",
            WatchEvent::Modified(_) => "MODIFIED",
            WatchEvent::Deleted(_) => "DELETED",
            WatchEvent::Bookmark => "BOOKMARK",
            WatchEvent::Error(_) => "ERROR",
            WatchEvent::Unknown(kind) => kind,
        }
    }
}
