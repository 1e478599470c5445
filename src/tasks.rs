use crate::primer_binding::{BindingHit, analyze_primer_binding};
use crate::sequence_loader::SequenceSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Handle to one submitted background scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Lifecycle of a background scan. Polling is idempotent; a finished task
/// keeps its terminal state until the queue is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded { hits: Vec<BindingHit> },
    Failed { error: String },
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Succeeded { .. } | TaskStatus::Failed { .. })
    }
}

/// Registry of background binding scans. Each submission spawns a worker
/// thread that runs the same synchronous scan the direct API runs; the
/// algorithm itself knows nothing about the scheduling around it. No
/// cancellation: in-flight work runs to completion.
pub struct ScanQueue {
    statuses: Arc<Mutex<HashMap<TaskId, TaskStatus>>>,
    workers: Mutex<HashMap<TaskId, JoinHandle<()>>>,
    next_id: Mutex<u64>,
}

impl ScanQueue {
    pub fn new() -> Self {
        Self {
            statuses: Arc::new(Mutex::new(HashMap::new())),
            workers: Mutex::new(HashMap::new()),
            next_id: Mutex::new(0),
        }
    }

    fn fresh_id(&self) -> TaskId {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        TaskId(format!("task-{next}"))
    }

    /// Queues a scan of `source` for `primer_sequence` and returns
    /// immediately. Failures, including an unreadable source, end up in the
    /// task's failed state rather than here.
    pub fn submit(
        &self,
        primer_sequence: &str,
        source: SequenceSource,
        max_mismatches: usize,
        block_3prime_mismatch: bool,
    ) -> TaskId {
        let id = self.fresh_id();
        self.statuses
            .lock()
            .unwrap()
            .insert(id.clone(), TaskStatus::Pending);

        let statuses = Arc::clone(&self.statuses);
        let worker_id = id.clone();
        let primer = primer_sequence.to_string();
        let handle = thread::spawn(move || {
            statuses
                .lock()
                .unwrap()
                .insert(worker_id.clone(), TaskStatus::Running);
            let outcome =
                match analyze_primer_binding(&primer, &source, max_mismatches, block_3prime_mismatch)
                {
                    Ok(hits) => TaskStatus::Succeeded { hits },
                    Err(err) => TaskStatus::Failed {
                        error: err.to_string(),
                    },
                };
            statuses.lock().unwrap().insert(worker_id, outcome);
        });
        self.workers.lock().unwrap().insert(id.clone(), handle);
        id
    }

    /// Current status, or `None` for an id this queue never issued.
    /// Side-effect-free; polling never advances or consumes the task.
    pub fn status(&self, id: &TaskId) -> Option<TaskStatus> {
        self.statuses.lock().unwrap().get(id).cloned()
    }

    /// Blocks until the task reaches a terminal state and returns it.
    pub fn wait(&self, id: &TaskId) -> Option<TaskStatus> {
        let handle = self.workers.lock().unwrap().remove(id);
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        self.status(id)
    }
}

impl Default for ScanQueue {
    fn default() -> Self {
        Self::new()
    }
}
