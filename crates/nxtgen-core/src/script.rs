//! Scripts of simulated log/command events.
//!
//! A [`Script`] is the ordered input of a sequence. Each [`Event`] carries the
//! text to display, an optional shell command shown alongside it, and the
//! delay to wait before emitting it. Emitted events land on the target as
//! [`LogLine`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Prefix marking a script line as a shell command.
pub const COMMAND_PREFIX: &str = "$ ";

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub display_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Serialized as whole milliseconds.
    #[serde(
        rename = "emit_delay_ms",
        serialize_with = "serialize_duration_ms",
        deserialize_with = "deserialize_duration_ms"
    )]
    pub emit_delay: Duration,
}

impl Event {
    pub fn new(display_text: impl Into<String>, emit_delay: Duration) -> Self {
        Self {
            display_text: display_text.into(),
            command: None,
            emit_delay,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Build an event from a display line. Lines starting with `$ ` are also
    /// recorded as the event's command.
    pub fn from_line(line: &str, emit_delay: Duration) -> Self {
        let event = Self::new(line, emit_delay);
        match line.strip_prefix(COMMAND_PREFIX) {
            Some(cmd) => event.with_command(cmd),
            None => event,
        }
    }
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    events: Vec<Event>,
}

impl Script {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// One event per line, all spaced `interval` apart.
    pub fn from_lines(lines: &[&str], interval: Duration) -> Self {
        Self::new(
            lines
                .iter()
                .map(|l| Event::from_line(l, interval))
                .collect(),
        )
    }

    /// Build from `(line, offset)` pairs where each offset is measured from
    /// the start of the sequence. Offsets must be non-decreasing; an offset
    /// earlier than its predecessor is emitted immediately after it.
    pub fn from_offsets(items: &[(&str, Duration)]) -> Self {
        let mut prev = Duration::ZERO;
        let events = items
            .iter()
            .map(|(line, at)| {
                let delay = at.saturating_sub(prev);
                prev = prev.max(*at);
                Event::from_line(line, delay)
            })
            .collect();
        Self::new(events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromIterator<Event> for Script {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// LogLine
// ---------------------------------------------------------------------------

/// A line recorded on a target, either emitted from a script or appended by
/// the sequencer when the target resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub at: DateTime<Utc>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl LogLine {
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            text: text.into(),
            command: None,
        }
    }

    pub fn from_event(event: &Event) -> Self {
        Self {
            at: Utc::now(),
            text: event.display_text.clone(),
            command: event.command.clone(),
        }
    }

    /// `[HH:MM:SS] text`
    pub fn render(&self) -> String {
        format!("[{}] {}", self.at.format("%H:%M:%S"), self.text)
    }
}

// ---------------------------------------------------------------------------
// Serde helpers for Duration (serialized as milliseconds: u64)
// ---------------------------------------------------------------------------

fn serialize_duration_ms<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_u64(d.as_millis() as u64)
}

fn deserialize_duration_ms<'de, D>(d: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = u64::deserialize(d)?;
    Ok(Duration::from_millis(ms))
}
