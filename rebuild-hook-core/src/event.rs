//! Content lifecycle events raised by the content-management host.
//!
//! The host only tells us *that* something changed, never how. Every kind
//! maps onto the same rebuild action, so the enum exists for routing and for
//! logging, not to carry payload.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five content changes that invalidate a statically built site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentEvent {
    Copied,
    Deleted,
    Moved,
    Published,
    Unpublished,
}

impl ContentEvent {
    /// Every event kind, in the order the host documents them.
    pub const ALL: [ContentEvent; 5] = [
        ContentEvent::Copied,
        ContentEvent::Deleted,
        ContentEvent::Moved,
        ContentEvent::Published,
        ContentEvent::Unpublished,
    ];

    /// Short verb form used on the command line and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentEvent::Copied => "copy",
            ContentEvent::Deleted => "delete",
            ContentEvent::Moved => "move",
            ContentEvent::Published => "publish",
            ContentEvent::Unpublished => "unpublish",
        }
    }
}

impl fmt::Display for ContentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEvent(pub String);

impl fmt::Display for UnknownEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown content event '{}' (expected one of: copy, delete, move, publish, unpublish)",
            self.0
        )
    }
}

impl std::error::Error for UnknownEvent {}

impl FromStr for ContentEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "copy" | "copied" => Ok(ContentEvent::Copied),
            "delete" | "deleted" => Ok(ContentEvent::Deleted),
            "move" | "moved" => Ok(ContentEvent::Moved),
            "publish" | "published" => Ok(ContentEvent::Published),
            "unpublish" | "unpublished" => Ok(ContentEvent::Unpublished),
            _ => Err(UnknownEvent(s.to_string())),
        }
    }
}

/// A single occurrence of a content event, as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentNotification {
    pub event: ContentEvent,
    /// What changed (node name, id, path...). Only ever logged.
    pub subject: Option<String>,
}

impl ContentNotification {
    pub fn new(event: ContentEvent) -> Self {
        Self {
            event,
            subject: None,
        }
    }

    pub fn with_subject(event: ContentEvent, subject: impl Into<String>) -> Self {
        Self {
            event,
            subject: Some(subject.into()),
        }
    }
}

impl From<ContentEvent> for ContentNotification {
    fn from(event: ContentEvent) -> Self {
        ContentNotification::new(event)
    }
}

impl FromStr for ContentNotification {
    type Err = UnknownEvent;

    /// Parses `<kind> [subject...]`, e.g. `publish Home page`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (kind, rest) = match line.split_once(char::is_whitespace) {
            Some((kind, rest)) => (kind, rest.trim()),
            None => (line, ""),
        };
        let event: ContentEvent = kind.parse()?;
        if rest.is_empty() {
            Ok(ContentNotification::new(event))
        } else {
            Ok(ContentNotification::with_subject(event, rest))
        }
    }
}
