//! Write-ahead log over an in-memory key/value table.
//!
//! Writes are appended to the log before they touch the table, so a crash
//! that wipes the table loses nothing acknowledged: recovery replays every
//! record past the last checkpoint. A checkpoint flushes the table to the
//! durable image and truncates the log. Deletes are tombstones until the
//! next flush.
//!
//! Unlike the other producers this one is stateful: [`Wal::produce`]
//! renders the store as it stands and each [`WalOp`] narrates one change
//! to it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stepwise_step::{
    Highlight, Highlights, IdSequence, Producer, ResetPolicy, Step, StepRecorder, Target,
    Transition,
};

/// One durable log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub lsn: u64,
    pub key: String,
    /// `None` is a delete.
    pub value: Option<String>,
}

/// Everything the log survives across operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalStore {
    pub log: Vec<LogRecord>,
    /// In-memory table; `None` marks a tombstone. Lost on crash.
    pub table: BTreeMap<String, Option<String>>,
    /// Flushed image as of `checkpoint_lsn`
    pub durable: BTreeMap<String, String>,
    pub lsns: IdSequence,
    pub checkpoint_lsn: u64,
    pub crashed: bool,
}

impl Default for WalStore {
    fn default() -> Self {
        Self {
            log: Vec::new(),
            table: BTreeMap::new(),
            durable: BTreeMap::new(),
            lsns: IdSequence::starting_at(1),
            checkpoint_lsn: 0,
            crashed: false,
        }
    }
}

impl WalStore {
    /// Visible value of `key`: table first, then the durable image.
    pub fn get(&self, key: &str) -> Lookup {
        match self.table.get(key) {
            Some(Some(value)) => Lookup::Found(value.clone()),
            Some(None) => Lookup::Deleted,
            None => self
                .durable
                .get(key)
                .map_or(Lookup::Missing, |value| Lookup::Found(value.clone())),
        }
    }

    fn append(&mut self, key: &str, value: Option<String>) -> u64 {
        let lsn = self.lsns.next_id();
        self.log.push(LogRecord {
            lsn,
            key: key.to_string(),
            value,
        });
        lsn
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Lookup {
    Found(String),
    Deleted,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WalOp {
    Put { key: String, value: String },
    Delete { key: String },
    Get { key: String },
    Checkpoint,
    Crash,
    Recover,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalSnapshot {
    pub store: WalStore,
    /// Result of the read this step narrates, if any
    pub lookup: Option<Lookup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalRole {
    /// Log record just written
    Appended,
    /// Table entry just written
    Applied,
    /// Table entry marking a delete
    Tombstone,
    /// Entry moved to the durable image
    Flushed,
    /// Log record being replayed
    Replayed,
    /// Entry lost in a crash
    Lost,
    /// Entry a read is looking at
    Probing,
    Hit,
    Miss,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Wal;

type Recorder = StepRecorder<WalSnapshot, WalRole>;

fn snap(store: &WalStore) -> WalSnapshot {
    WalSnapshot {
        store: store.clone(),
        lookup: None,
    }
}

fn key(key: &str) -> Target {
    Target::Key(key.to_string())
}

fn record(lsn: u64) -> Target {
    Target::Node(lsn)
}

impl Wal {
    fn write(store: &mut WalStore, name: &str, value: Option<String>, recorder: &mut Recorder) {
        let lsn = store.append(name, value.clone());
        let describe = match &value {
            Some(v) => format!("PUT {name} = {v}"),
            None => format!("DELETE {name}"),
        };
        recorder.record(
            format!("Append LSN {lsn} to the log: {describe}"),
            Highlights::new().with(record(lsn), WalRole::Appended),
            snap(store),
        );

        let role = if value.is_some() {
            WalRole::Applied
        } else {
            WalRole::Tombstone
        };
        let applied = match &value {
            Some(v) => format!("Log is durable; set {name} = {v} in the table"),
            None => format!("Log is durable; write a tombstone for {name}"),
        };
        store.table.insert(name.to_string(), value);
        recorder.record(
            applied,
            Highlights::new()
                .with(record(lsn), WalRole::Appended)
                .with(key(name), role),
            snap(store),
        );
    }

    fn read(store: &WalStore, name: &str, recorder: &mut Recorder) {
        recorder.record(
            format!("Look up {name} in the table"),
            Highlights::new().with(key(name), WalRole::Probing),
            snap(store),
        );
        let lookup = store.get(name);
        let message = match (&lookup, store.table.contains_key(name)) {
            (Lookup::Found(v), true) => format!("Table hit: {name} = {v}"),
            (Lookup::Deleted, _) => format!("Tombstone: {name} was deleted"),
            (Lookup::Found(v), false) => {
                format!("Not in the table; durable image has {name} = {v}")
            }
            (Lookup::Missing, _) => format!("{name} is in neither the table nor the durable image"),
        };
        let role = if matches!(lookup, Lookup::Found(_)) {
            WalRole::Hit
        } else {
            WalRole::Miss
        };
        recorder.record(
            message,
            Highlights::new().with(key(name), role),
            WalSnapshot {
                store: store.clone(),
                lookup: Some(lookup),
            },
        );
    }

    fn checkpoint(store: &mut WalStore, recorder: &mut Recorder) {
        if store.table.is_empty() && store.log.is_empty() {
            recorder.narrate("Nothing to checkpoint", snap(store));
            return;
        }
        let table = std::mem::take(&mut store.table);
        for (name, value) in table {
            let message = match &value {
                Some(v) => {
                    store.durable.insert(name.clone(), v.clone());
                    format!("Flush {name} = {v}")
                }
                None => {
                    store.durable.remove(&name);
                    format!("Drop {name} from the durable image")
                }
            };
            recorder.record(
                message,
                Highlights::new().with(key(&name), WalRole::Flushed),
                snap(store),
            );
        }
        if let Some(last) = store.log.last() {
            store.checkpoint_lsn = last.lsn;
        }
        store.log.clear();
        recorder.narrate(
            format!("Checkpoint at LSN {}; log truncated", store.checkpoint_lsn),
            snap(store),
        );
    }

    fn crash(store: &mut WalStore, recorder: &mut Recorder) {
        let lost: Highlights<WalRole> = store
            .table
            .keys()
            .map(|name| Highlight::new(key(name), WalRole::Lost))
            .collect();
        recorder.record(
            format!("Crash: {} table entries are lost", store.table.len()),
            lost,
            snap(store),
        );
        store.table.clear();
        store.crashed = true;
        recorder.narrate(
            format!(
                "Node is down. Log holds {} records past checkpoint LSN {}",
                store.log.len(),
                store.checkpoint_lsn
            ),
            snap(store),
        );
    }

    fn recover(store: &mut WalStore, recorder: &mut Recorder) {
        if !store.crashed {
            recorder.narrate("Node is running; nothing to recover", snap(store));
            return;
        }
        recorder.narrate(
            format!("Recovery: replay log records after LSN {}", store.checkpoint_lsn),
            snap(store),
        );
        let replay: Vec<LogRecord> = store
            .log
            .iter()
            .filter(|r| r.lsn > store.checkpoint_lsn)
            .cloned()
            .collect();
        for entry in replay {
            store.table.insert(entry.key.clone(), entry.value.clone());
            recorder.record(
                format!("Replay LSN {} for {}", entry.lsn, entry.key),
                Highlights::new()
                    .with(record(entry.lsn), WalRole::Replayed)
                    .with(key(&entry.key), WalRole::Applied),
                snap(store),
            );
        }
        store.crashed = false;
        recorder.narrate(
            format!("Recovered {} table entries", store.table.len()),
            snap(store),
        );
    }
}

impl Producer for Wal {
    type Params = ();
    type Store = WalStore;
    type Op = WalOp;
    type Snapshot = WalSnapshot;
    type Role = WalRole;

    const RESET: ResetPolicy = ResetPolicy::ClearStore;

    fn produce(&self, _params: &(), store: &WalStore) -> Vec<Step<WalSnapshot, WalRole>> {
        let state = if store.crashed { "down" } else { "up" };
        vec![Step::new(
            format!(
                "Node {state}: {} log records, {} table entries, {} durable keys",
                store.log.len(),
                store.table.len(),
                store.durable.len()
            ),
            Highlights::default(),
            snap(store),
        )]
    }

    fn operate(&self, _params: &(), store: &WalStore, op: WalOp) -> Transition<Self> {
        let mut store = store.clone();
        let mut recorder = Recorder::new();

        match op {
            WalOp::Put { key, .. } | WalOp::Delete { key } | WalOp::Get { key }
                if key.is_empty() =>
            {
                return Transition::new(vec![Step::idle()], store);
            }
            WalOp::Put { .. } | WalOp::Delete { .. } | WalOp::Get { .. } | WalOp::Checkpoint
                if store.crashed =>
            {
                recorder.narrate("Node is down; recover before using it", snap(&store));
            }
            WalOp::Put { key, value } => Self::write(&mut store, &key, Some(value), &mut recorder),
            WalOp::Delete { key } => Self::write(&mut store, &key, None, &mut recorder),
            WalOp::Get { key } => Self::read(&store, &key, &mut recorder),
            WalOp::Checkpoint => Self::checkpoint(&mut store, &mut recorder),
            WalOp::Crash if store.crashed => {
                recorder.narrate("Node is already down", snap(&store));
            }
            WalOp::Crash => Self::crash(&mut store, &mut recorder),
            WalOp::Recover => Self::recover(&mut store, &mut recorder),
        }

        Transition::new(recorder.finish(), store)
    }
}
