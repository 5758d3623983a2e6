use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Mutex;

use canstream_config::CanstreamConfig;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::frame::{CanFrame, FrameData};
use super::signals::SignalMap;
use crate::registry::Element;

const CSV_HEADER: [&str; 7] = [
    "timestamp",
    "id",
    "extended",
    "dlc",
    "data",
    "interpreted",
    "value",
];

/// Change notifications for views rendered from the log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreUpdate {
    Appended { id: String, len: usize },
    Cleared,
}

/// Rolling log of received CAN frames, capped at `max_entries` with the
/// oldest evicted first.
pub struct CanLogStore {
    entries: Mutex<VecDeque<CanFrame>>,
    max_entries: usize,
    signals: SignalMap,
    updates: broadcast::Sender<StoreUpdate>,
}

impl CanLogStore {
    pub fn new(max_entries: usize, signals: SignalMap) -> Self {
        let (updates, _) = broadcast::channel(64);
        Self {
            entries: Mutex::new(VecDeque::new()),
            max_entries: max_entries.max(1),
            signals,
            updates,
        }
    }

    pub fn from_config(config: &CanstreamConfig) -> Self {
        Self::new(
            config.store.max_entries as usize,
            SignalMap::from_config(&config.signals),
        )
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreUpdate> {
        self.updates.subscribe()
    }

    /// Record one frame. Frames that arrive without an interpretation get
    /// one from the signal map; a frame without a timestamp is stamped now.
    pub fn ingest(&self, detail: &Value) -> Result<CanFrame, serde_json::Error> {
        let mut frame = CanFrame::from_value(detail)?;
        if frame.interpreted.is_none() {
            let interpretation = self.signals.interpret(&frame);
            frame.interpreted = Some(interpretation.text);
            frame.value = interpretation.value;
        }
        if frame.timestamp.is_none() {
            frame.timestamp = Some(chrono::Utc::now().to_rfc3339());
        }

        let id = frame.key();
        let len = self.with_entries(|entries| {
            entries.push_back(frame.clone());
            while entries.len() > self.max_entries {
                entries.pop_front();
            }
            entries.len()
        });
        let _ = self.updates.send(StoreUpdate::Appended { id, len });
        Ok(frame)
    }

    pub fn len(&self) -> usize {
        self.with_entries(|entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All frames, oldest first.
    pub fn entries(&self) -> Vec<CanFrame> {
        self.with_entries(|entries| entries.iter().cloned().collect())
    }

    /// The newest `limit` frames, newest first.
    pub fn recent(&self, limit: usize) -> Vec<CanFrame> {
        self.with_entries(|entries| entries.iter().rev().take(limit).cloned().collect())
    }

    /// Frames per id, most frequent first (ties by id).
    pub fn counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        self.with_entries(|entries| {
            for frame in entries.iter() {
                *counts.entry(frame.key()).or_default() += 1;
            }
        });
        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    /// Distinct ids seen, sorted. One per-machine view each.
    pub fn ids(&self) -> Vec<String> {
        self.with_entries(|entries| {
            entries
                .iter()
                .map(CanFrame::key)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        })
    }

    /// Label of the per-machine view for `id`: `"Engine Module (0x100)"`.
    pub fn tab_label(&self, id: &str) -> String {
        let name = canstream_common::parse_can_id(id)
            .and_then(|n| self.signals.get(n))
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("Device {id}"));
        format!("{name} ({id})")
    }

    /// `(timestamp, value)` points for one id, oldest first.
    pub fn series(&self, id: &str) -> Vec<(String, Option<f64>)> {
        self.with_entries(|entries| {
            entries
                .iter()
                .filter(|frame| frame.key() == id)
                .map(|frame| (frame.timestamp.clone().unwrap_or_default(), frame.value))
                .collect()
        })
    }

    /// File name for an export of the current log:
    /// `can_log_<YYYYmmdd_HHMMSS>.csv`, or `can_log_empty.csv` when empty.
    pub fn export_file_name(&self) -> String {
        if self.is_empty() {
            "can_log_empty.csv".to_string()
        } else {
            format!("can_log_{}.csv", chrono::Local::now().format("%Y%m%d_%H%M%S"))
        }
    }

    /// Write the log as CSV, oldest first. Missing fields are left blank;
    /// an empty log still gets the header row.
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> csv::Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(CSV_HEADER)?;
        for frame in self.entries() {
            out.write_record([
                frame.timestamp.clone().unwrap_or_default(),
                frame.key(),
                frame.extended.map(|e| e.to_string()).unwrap_or_default(),
                frame.dlc.map(|d| d.to_string()).unwrap_or_default(),
                frame.data.as_ref().map(FrameData::to_hex).unwrap_or_default(),
                frame.interpreted.clone().unwrap_or_default(),
                frame.value.map(|v| v.to_string()).unwrap_or_default(),
            ])?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn clear(&self) {
        self.with_entries(|entries| entries.clear());
        debug!("CAN log cleared");
        let _ = self.updates.send(StoreUpdate::Cleared);
    }

    fn with_entries<R>(&self, f: impl FnOnce(&mut VecDeque<CanFrame>) -> R) -> R {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut entries)
    }
}

impl Element for CanLogStore {
    fn dispatch_input(&self, detail: &Value) {
        if let Err(e) = self.ingest(detail) {
            warn!(error = %e, "Ignoring input that is not a CAN frame");
        }
    }
}
