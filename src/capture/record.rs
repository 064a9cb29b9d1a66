//! Event formatting.
//!
//! Turns a [`RawEvent`] into a flat, immutable [`Record`]: a timestamp taken
//! at formatting time, an event kind, and a textual payload. Formatting never
//! fails; keys without a printable form use their symbolic name.

use crate::capture::events::{Key, RawEvent};
use crate::error::FormatError;
use chrono::{DateTime, Local, NaiveDateTime, SubsecRound, TimeZone};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp layout of a file-sink line (local time, microseconds).
pub const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Timestamp layout of a stored document (local time, seconds).
pub const DOCUMENT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Field separator in a file-sink line.
pub const FIELD_SEPARATOR: char = '|';

/// Length of a generated record id.
pub const RECORD_ID_LEN: usize = 20;

// ============================================================================
// Event Kind
// ============================================================================

/// Kind of a recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    MouseMoved,
    MouseScrolled,
    MouseClicked,
    KeyPressed,
    KeyReleased,
    SpecialKeyPressed,
}

impl EventKind {
    /// All kinds, in declaration order.
    pub const ALL: [EventKind; 6] = [
        EventKind::MouseMoved,
        EventKind::MouseScrolled,
        EventKind::MouseClicked,
        EventKind::KeyPressed,
        EventKind::KeyReleased,
        EventKind::SpecialKeyPressed,
    ];

    /// Name written into records.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::MouseMoved => "MouseMovement",
            EventKind::MouseScrolled => "MouseScroll",
            EventKind::MouseClicked => "MouseClicked",
            EventKind::KeyPressed => "KeyPressed",
            EventKind::KeyReleased => "KeyReleased",
            EventKind::SpecialKeyPressed => "SpecialKeyPressed",
        }
    }

    /// Parses a record name back into a kind.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Kind of the record produced for `event`.
    pub fn of(event: &RawEvent) -> Self {
        match event {
            RawEvent::MouseMoved { .. } => EventKind::MouseMoved,
            RawEvent::MouseScrolled { .. } => EventKind::MouseScrolled,
            RawEvent::MouseClicked { .. } => EventKind::MouseClicked,
            RawEvent::KeyPressed(Key::Character(_)) => EventKind::KeyPressed,
            RawEvent::KeyPressed(Key::Symbolic(_)) => EventKind::SpecialKeyPressed,
            RawEvent::KeyReleased(_) => EventKind::KeyReleased,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Textual payload for `event`.
///
/// Deterministic: the same event always yields the same text.
pub fn payload_for(event: &RawEvent) -> String {
    match event {
        RawEvent::MouseMoved { x, y } => format!("{},{}", x, y),
        RawEvent::MouseScrolled { x, y, dx, dy } => format!("{},{};{},{}", x, y, dx, dy),
        RawEvent::MouseClicked { button, .. } => button.to_string(),
        RawEvent::KeyPressed(key) | RawEvent::KeyReleased(key) => key.to_string(),
    }
}

// ============================================================================
// Record
// ============================================================================

/// Durable form of one captured event.
///
/// Every record carries a random id fixed at creation. Document stores key
/// on it, so writing the same record twice stores it once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    id: String,
    timestamp: DateTime<Local>,
    kind: EventKind,
    payload: String,
}

impl Record {
    /// Formats `event` with the current wall-clock time.
    pub fn from_event(event: &RawEvent) -> Self {
        Self::at(event, Local::now())
    }

    /// Formats `event` with an explicit timestamp.
    ///
    /// The timestamp is truncated to microseconds, the precision of a
    /// file-sink line.
    pub fn at(event: &RawEvent, timestamp: DateTime<Local>) -> Self {
        Self {
            id: new_record_id(),
            timestamp: timestamp.trunc_subsecs(6),
            kind: EventKind::of(event),
            payload: payload_for(event),
        }
    }

    /// Alphanumeric id, unique per record.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Serializes to a single file-sink line, without the trailing newline.
    pub fn to_line(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.timestamp.format(LINE_TIMESTAMP_FORMAT),
            self.kind,
            self.payload,
            sep = FIELD_SEPARATOR
        )
    }

    /// Parses a file-sink line.
    ///
    /// Only the first two separators split fields, so payloads that contain
    /// `|` themselves (the pipe key) survive.
    ///
    /// Lines hold local wall-clock time without an offset. Inside the hour
    /// repeated when clocks go back, the earlier instant is chosen; the
    /// wall-clock text itself always round-trips. Ids are not stored in
    /// lines, so parsed records get a fresh one.
    pub fn parse_line(line: &str) -> Result<Self, FormatError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut fields = line.splitn(3, FIELD_SEPARATOR);

        let ts = fields.next().ok_or(FormatError::MissingField("timestamp"))?;
        let kind = fields.next().ok_or(FormatError::MissingField("event"))?;
        let payload = fields.next().ok_or(FormatError::MissingField("value"))?;

        let naive = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S%.f")
            .map_err(|_| FormatError::BadTimestamp(ts.to_string()))?;
        let timestamp = Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| FormatError::BadTimestamp(ts.to_string()))?;
        let kind = EventKind::from_name(kind).ok_or_else(|| FormatError::UnknownKind(kind.to_string()))?;

        Ok(Self {
            id: new_record_id(),
            timestamp,
            kind,
            payload: payload.to_string(),
        })
    }

    /// Serializes to the document shape used by document stores.
    pub fn to_document(&self) -> Document {
        Document {
            timestamp: self.timestamp.format(DOCUMENT_TIMESTAMP_FORMAT).to_string(),
            event: self.kind.as_str().to_string(),
            value: self.payload.clone(),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

fn new_record_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RECORD_ID_LEN)
        .map(char::from)
        .collect()
}

/// A record as stored in a document collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Human-readable local time, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    /// Event kind name.
    pub event: String,
    /// Payload text.
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::events::{KeyName, MouseButton};
    use chrono::NaiveDate;

    fn fixed_time() -> DateTime<Local> {
        let naive = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_micro_opt(14, 5, 7, 123456)
            .unwrap();
        Local.from_local_datetime(&naive).earliest().unwrap()
    }

    #[test]
    fn test_mouse_move_payload() {
        let record = Record::at(&RawEvent::MouseMoved { x: 120, y: 45 }, fixed_time());
        assert_eq!(record.kind(), EventKind::MouseMoved);
        assert_eq!(record.to_line(), "2024-03-09 14:05:07.123456|MouseMovement|120,45");
    }

    #[test]
    fn test_mouse_move_accepts_any_coordinates() {
        for (x, y) in [(-5, 0), (i32::MAX, i32::MIN), (0, -1)] {
            let payload = payload_for(&RawEvent::MouseMoved { x, y });
            assert_eq!(payload, format!("{},{}", x, y));
        }
    }

    #[test]
    fn test_scroll_payload() {
        let event = RawEvent::MouseScrolled {
            x: 10,
            y: 10,
            dx: 0,
            dy: -3,
        };
        let record = Record::at(&event, fixed_time());
        assert_eq!(record.payload(), "10,10;0,-3");
        assert!(record.to_line().ends_with("|MouseScroll|10,10;0,-3"));
    }

    #[test]
    fn test_click_payload_is_button_name() {
        let event = RawEvent::MouseClicked {
            x: 1,
            y: 2,
            button: MouseButton::Right,
            pressed: true,
        };
        assert_eq!(EventKind::of(&event), EventKind::MouseClicked);
        assert_eq!(payload_for(&event), "Button.right");
    }

    #[test]
    fn test_key_kinds() {
        let press_char = RawEvent::KeyPressed(Key::Character('a'));
        let press_special = RawEvent::KeyPressed(Key::Symbolic(KeyName::Shift));
        let release_esc = RawEvent::KeyReleased(Key::Symbolic(KeyName::Esc));

        assert_eq!(
            Record::at(&press_char, fixed_time()).to_line(),
            "2024-03-09 14:05:07.123456|KeyPressed|a"
        );
        assert_eq!(EventKind::of(&press_special), EventKind::SpecialKeyPressed);
        assert_eq!(payload_for(&press_special), "Key.shift");
        assert_eq!(
            Record::at(&release_esc, fixed_time()).to_line(),
            "2024-03-09 14:05:07.123456|KeyReleased|Key.esc"
        );
    }

    #[test]
    fn test_formatting_is_deterministic() {
        let event = RawEvent::MouseScrolled {
            x: 3,
            y: 4,
            dx: 1,
            dy: 0,
        };
        let first = Record::from_event(&event);
        let second = Record::from_event(&event);
        assert_eq!(first.payload(), second.payload());
        assert_eq!(first.kind(), second.kind());
    }

    #[test]
    fn test_parse_line_keeps_pipe_payload() {
        let record = Record::at(&RawEvent::KeyPressed(Key::Character('|')), fixed_time());
        let line = record.to_line();
        assert_eq!(line, "2024-03-09 14:05:07.123456|KeyPressed||");

        let parsed = Record::parse_line(&line).unwrap();
        assert_eq!(parsed.timestamp(), record.timestamp());
        assert_eq!(parsed.kind(), record.kind());
        assert_eq!(parsed.payload(), "|");
    }

    #[test]
    fn test_parse_line_keeps_wall_clock_text() {
        // 01:30 on the first Sunday of November is repeated in zones that
        // observe US daylight saving; the text must survive either way.
        for line in [
            "2024-11-03 01:30:00.000001|MouseMovement|1,2",
            "2024-03-09 14:05:07.123456|KeyPressed|a",
        ] {
            assert_eq!(Record::parse_line(line).unwrap().to_line(), line);
        }
    }

    #[test]
    fn test_record_ids() {
        let event = RawEvent::KeyPressed(Key::Character('a'));
        let first = Record::from_event(&event);
        let second = Record::from_event(&event);

        assert_eq!(first.id().len(), RECORD_ID_LEN);
        assert!(first.id().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first.id(), second.id());
        assert_eq!(first.clone().id(), first.id());
    }

    #[test]
    fn test_parse_line_errors() {
        assert!(matches!(
            Record::parse_line("2024-03-09 14:05:07"),
            Err(FormatError::MissingField("event"))
        ));
        assert!(matches!(
            Record::parse_line("yesterday|KeyPressed|a"),
            Err(FormatError::BadTimestamp(_))
        ));
        assert!(matches!(
            Record::parse_line("2024-03-09 14:05:07.000001|Teleport|a"),
            Err(FormatError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_event_kind_names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_name(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_document_shape() {
        let record = Record::at(&RawEvent::KeyReleased(Key::Character('q')), fixed_time());
        let doc = record.to_document();
        assert_eq!(doc.timestamp, "2024-03-09 14:05:07");
        assert_eq!(doc.event, "KeyReleased");
        assert_eq!(doc.value, "q");

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["event"], "KeyReleased");
    }
}
