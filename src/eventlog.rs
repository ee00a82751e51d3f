/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! JSON-per-line writers for the `eventlog` and `simlog` streams
//! (`SCHED_EVENTLOG`, `SCHED_SIMLOG`). Each line is a JSON object with a
//! `"time"` (eventlog) or `"walltime"` (simlog) field holding a
//! `"<seconds>.<nanoseconds>"` string, plus whatever fields the caller
//! supplies.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Time,
    WallTime,
}

impl TimeField {
    fn key(self) -> &'static str {
        match self {
            TimeField::Time => "time",
            TimeField::WallTime => "walltime",
        }
    }
}

/// A single append-only JSON-lines stream.
pub struct EventLog {
    writer: BufWriter<File>,
    time_field: TimeField,
}

impl EventLog {
    pub fn open(path: &Path, time_field: TimeField) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| crate::error::SchedError::Config(anyhow::anyhow!(e).context(format!("opening {}", path.display()))))?;
        Ok(EventLog { writer: BufWriter::new(file), time_field })
    }

    /// Writes one record with `fields` merged alongside the time-field
    /// prefix, computed from `elapsed` (time since process start or
    /// since whatever epoch the caller tracks).
    pub fn write_record(&mut self, elapsed: Duration, fields: Map<String, Value>) -> Result<()> {
        let mut record = Map::new();
        record.insert(
            self.time_field.key().to_string(),
            Value::String(format!("{}.{:09}", elapsed.as_secs(), elapsed.subsec_nanos())),
        );
        for (k, v) in fields {
            record.insert(k, v);
        }

        let line = serde_json::to_string(&Value::Object(record))
            .map_err(|e| crate::error::SchedError::Config(anyhow::anyhow!(e)))?;
        writeln!(self.writer, "{line}")
            .map_err(|e| crate::error::SchedError::Config(anyhow::anyhow!(e)))?;
        self.writer.flush().map_err(|e| crate::error::SchedError::Config(anyhow::anyhow!(e)))?;
        Ok(())
    }

    /// Convenience for the fixed event names in §6: `SCHEDULER_START`,
    /// `SCHEDULER_STOP`, `RESOURCES`, `ALGORITHM_PARAM`, `WRAPAPP`.
    pub fn write_event(&mut self, elapsed: Duration, event: &str, payload: Map<String, Value>) -> Result<()> {
        let mut fields = Map::new();
        fields.insert("event".to_string(), Value::String(event.to_string()));
        fields.insert("payload".to_string(), Value::Object(payload));
        self.write_record(elapsed, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};

    #[test]
    fn write_record_produces_one_json_line_with_time_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eventlog.jsonl");
        let mut log = EventLog::open(&path, TimeField::Time).unwrap();

        let mut fields = Map::new();
        fields.insert("event".to_string(), Value::String("SCHEDULER_START".to_string()));
        log.write_record(Duration::from_millis(1500), fields).unwrap();

        let reader = BufReader::new(File::open(&path).unwrap());
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 1);
        let parsed: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(parsed["time"], Value::String("1.500000000".to_string()));
        assert_eq!(parsed["event"], Value::String("SCHEDULER_START".to_string()));
    }

    #[test]
    fn write_event_nests_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simlog.jsonl");
        let mut log = EventLog::open(&path, TimeField::WallTime).unwrap();

        let mut payload = Map::new();
        payload.insert("resource_count".to_string(), Value::from(3));
        log.write_event(Duration::from_secs(2), "RESOURCES", payload).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(parsed["walltime"], Value::String("2.000000000".to_string()));
        assert_eq!(parsed["payload"]["resource_count"], Value::from(3));
    }

    #[test]
    fn appends_across_multiple_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eventlog.jsonl");
        {
            let mut log = EventLog::open(&path, TimeField::Time).unwrap();
            log.write_record(Duration::from_secs(0), Map::new()).unwrap();
        }
        {
            let mut log = EventLog::open(&path, TimeField::Time).unwrap();
            log.write_record(Duration::from_secs(1), Map::new()).unwrap();
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
