//! Step-indexed production action log.
//!
//! Written as pretty-printed JSON with a four-space indent, one key per
//! step (including steps with no production):
//!
//! ```json
//! {
//!     "0": [],
//!     "1": [
//!         {
//!             "560": "Train_Marine_quick"
//!         }
//!     ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use sc2feat_core::AbilityId;
use sc2feat_obs::ActionEvent;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::ser::PrettyFormatter;

use crate::atomic::write_atomic;
use crate::error::StoreError;

/// Production events per step, in step order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionLog {
    steps: Vec<Vec<ActionEvent>>,
}

impl ActionLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the events of the next step.
    pub fn push(&mut self, events: Vec<ActionEvent>) {
        self.steps.push(events);
    }

    /// Number of steps recorded.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no steps were recorded.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Events of step `step`.
    pub fn step(&self, step: usize) -> Option<&[ActionEvent]> {
        self.steps.get(step).map(Vec::as_slice)
    }

    /// Total events across all steps.
    pub fn event_count(&self) -> usize {
        self.steps.iter().map(Vec::len).sum()
    }

    /// Encode as four-space-indented JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut ser)?;
        Ok(buf)
    }

    /// Write to `path`, atomically.
    pub fn write_json(&self, path: &Path) -> Result<(), StoreError> {
        let json = self.to_json().map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        write_atomic(path, |file| {
            use std::io::Write;
            file.write_all(&json).map_err(|e| StoreError::io(path, e))
        })
    }

    /// Read a log written by [`write_json`](Self::write_json).
    ///
    /// Steps missing from the file are read back as empty.
    pub fn read_json(path: &Path) -> Result<Self, StoreError> {
        let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
        let raw: BTreeMap<usize, Vec<BTreeMap<u32, String>>> =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        let len = raw.keys().next_back().map_or(0, |&last| last + 1);
        let mut steps = vec![Vec::new(); len];
        for (step, events) in raw {
            steps[step] = events
                .into_iter()
                .flatten()
                .map(|(id, name)| ActionEvent {
                    ability_id: AbilityId(id),
                    name,
                })
                .collect();
        }
        Ok(Self { steps })
    }
}

impl Serialize for ActionLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.steps.len()))?;
        for (step, events) in self.steps.iter().enumerate() {
            map.serialize_entry(&step, events)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marine() -> ActionEvent {
        ActionEvent {
            ability_id: AbilityId(560),
            name: "Train_Marine_quick".into(),
        }
    }

    #[test]
    fn json_layout_uses_four_space_indent() {
        let mut log = ActionLog::new();
        log.push(vec![]);
        log.push(vec![marine()]);
        let json = String::from_utf8(log.to_json().unwrap()).unwrap();
        let expected = "{\n    \"0\": [],\n    \"1\": [\n        {\n            \"560\": \"Train_Marine_quick\"\n        }\n    ]\n}";
        assert_eq!(json, expected);
    }

    #[test]
    fn written_log_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1@abc.act");
        let mut log = ActionLog::new();
        log.push(vec![marine(), marine()]);
        log.push(vec![]);
        log.push(vec![marine()]);
        log.write_json(&path).unwrap();

        let back = ActionLog::read_json(&path).unwrap();
        assert_eq!(back, log);
        assert_eq!(back.event_count(), 3);
    }

    #[test]
    fn empty_log_is_empty_object() {
        assert_eq!(ActionLog::new().to_json().unwrap(), b"{}");
    }
}
