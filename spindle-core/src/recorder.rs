//! Append-only event log of a run.
//!
//! Each [`Record`] renders as one line of five whitespace-separated fields:
//!
//! ```text
//! <id> <time> <position> <event> <orientation>
//! ```
//!
//! with `time` and `position` printed to two decimals and `event` one of
//! `-1` (creation), `0` (catastrophe), `1` (rescue), `2` (loss) or
//! `3` (end of run).

use std::fmt;
use std::io;
use std::str::FromStr;

use crate::error::ParseRecordError;
use crate::types::{FilamentId, Orientation};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Creation,
    Catastrophe,
    Rescue,
    Loss,
    EndOfRun,
}

impl EventKind {
    pub fn code(self) -> i32 {
        match self {
            EventKind::Creation => -1,
            EventKind::Catastrophe => 0,
            EventKind::Rescue => 1,
            EventKind::Loss => 2,
            EventKind::EndOfRun => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(EventKind::Creation),
            0 => Some(EventKind::Catastrophe),
            1 => Some(EventKind::Rescue),
            2 => Some(EventKind::Loss),
            3 => Some(EventKind::EndOfRun),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Record {
    pub id: FilamentId,
    pub time: f64,
    pub pos: f64,
    pub kind: EventKind,
    pub orientation: Orientation,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.2} {:.2} {} {}",
            self.id,
            self.time,
            self.pos,
            self.kind.code(),
            self.orientation
        )
    }
}

impl FromStr for Record {
    type Err = ParseRecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [id, time, pos, code, orientation] = fields[..] else {
            return Err(ParseRecordError::FieldCount(fields.len()));
        };

        fn field<T: FromStr>(name: &'static str, text: &str) -> Result<T, ParseRecordError> {
            text.parse().map_err(|_| ParseRecordError::InvalidField {
                field: name,
                text: text.to_string(),
            })
        }

        let code: i32 = field("event", code)?;
        let sign: i32 = field("orientation", orientation)?;

        Ok(Record {
            id: field("id", id)?,
            time: field("time", time)?,
            pos: field("position", pos)?,
            kind: EventKind::from_code(code).ok_or(ParseRecordError::UnknownEvent(code))?,
            orientation: Orientation::from_sign(sign).ok_or_else(|| {
                ParseRecordError::InvalidField {
                    field: "orientation",
                    text: orientation.to_string(),
                }
            })?,
        })
    }
}

/// Ordered sequence of records emitted during a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventRecorder {
    records: Vec<Record>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of one filament, in emission order.
    pub fn by_filament(&self, id: FilamentId) -> impl Iterator<Item = &Record> + '_ {
        self.records.iter().filter(move |r| r.id == id)
    }

    /// Writes every record as one line.
    pub fn write_to<W: io::Write>(&self, mut out: W) -> io::Result<()> {
        for record in &self.records {
            writeln!(out, "{record}")?;
        }
        Ok(())
    }
}

impl fmt::Display for EventRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            writeln!(f, "{record}")?;
        }
        Ok(())
    }
}
