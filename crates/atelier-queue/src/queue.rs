use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::types::{ActiveTask, QueueError, QueueEvent, TaskOutcome, TaskStatus};

struct QueueInner {
    /// Tasks presently executing on workers.  A single-worker deployment
    /// holds at most one entry here.
    running: Vec<ActiveTask>,
    /// FIFO of submitted tasks waiting for a worker.
    pending: VecDeque<ActiveTask>,
}

impl QueueInner {
    fn contains(&self, task_id: &str) -> bool {
        self.running.iter().any(|t| t.task_id == task_id)
            || self.pending.iter().any(|t| t.task_id == task_id)
    }
}

/// Shared handle to the scheduler's queue state.
///
/// Cloning is cheap; all clones observe the same state.  Mutations belong to
/// the scheduler; the query path must only use [`TaskQueue::snapshot`] and
/// [`TaskQueue::find`].
///
/// Uses a `tokio::sync::RwLock` so many readers can observe the queue
/// concurrently while enqueue/dequeue transitions take a brief exclusive
/// write.  Every read method takes a single guard, so each returned view
/// reflects one consistent moment.
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<RwLock<QueueInner>>,
    capacity: usize,
    events: flume::Sender<QueueEvent>,
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_read() {
            Ok(g) => write!(
                f,
                "TaskQueue({} running, {} pending)",
                g.running.len(),
                g.pending.len()
            ),
            Err(_) => write!(f, "TaskQueue(locked)"),
        }
    }
}

impl TaskQueue {
    /// Create an empty queue with the given pending capacity.
    ///
    /// Returns the handle plus the receiving side of the terminal-event
    /// channel.  Exactly one consumer (the archiver) should drain it; events
    /// sent after the receiver is dropped are discarded.
    pub fn new(capacity: usize) -> (Self, flume::Receiver<QueueEvent>) {
        let (tx, rx) = flume::unbounded();
        let queue = Self {
            inner: Arc::new(RwLock::new(QueueInner {
                running: Vec::new(),
                pending: VecDeque::new(),
            })),
            capacity,
            events: tx,
        };
        (queue, rx)
    }

    // ── Scheduler-owned mutations ────────────────────────────────────────────

    /// Append a submitted task to the back of the FIFO.
    pub async fn enqueue(&self, task: ActiveTask) -> Result<(), QueueError> {
        let mut inner = self.inner.write().await;
        if inner.pending.len() >= self.capacity {
            return Err(QueueError::QueueFull {
                capacity: self.capacity,
            });
        }
        if inner.contains(&task.task_id) {
            return Err(QueueError::DuplicateTask {
                task_id: task.task_id,
            });
        }
        debug!(task_id = %task.task_id, "task enqueued");
        inner.pending.push_back(task);
        Ok(())
    }

    /// Pop the FIFO head and mark it running.  `None` when the queue is idle.
    pub async fn start_next(&self) -> Option<ActiveTask> {
        let mut inner = self.inner.write().await;
        let mut task = inner.pending.pop_front()?;
        task.status = TaskStatus::Running;
        inner.running.push(task.clone());
        debug!(task_id = %task.task_id, "task started");
        Some(task)
    }

    /// Record a terminal outcome for a running (or still-pending, for
    /// cancellations) task, remove it from the queue, and publish the event.
    pub async fn finish(&self, task_id: &str, outcome: TaskOutcome) -> Result<(), QueueError> {
        let task = {
            let mut inner = self.inner.write().await;
            if let Some(pos) = inner.running.iter().position(|t| t.task_id == task_id) {
                inner.running.swap_remove(pos)
            } else {
                let pending_pos = inner.pending.iter().position(|t| t.task_id == task_id);
                match pending_pos.and_then(|pos| inner.pending.remove(pos)) {
                    Some(task) => task,
                    None => {
                        return Err(QueueError::TaskNotFound {
                            task_id: task_id.to_owned(),
                        });
                    }
                }
            }
        };

        debug!(task_id = %task.task_id, status = %outcome.status(), "task finished");
        if self.events.send(QueueEvent { task, outcome }).is_err() {
            debug!("terminal-event receiver dropped; event discarded");
        }
        Ok(())
    }

    // ── Read-only views (query path) ─────────────────────────────────────────

    /// Capture the running and pending sets at one consistent moment.
    pub async fn snapshot(&self) -> QueueSnapshot {
        let inner = self.inner.read().await;
        QueueSnapshot {
            current: inner.running.clone(),
            pending: inner.pending.iter().cloned().collect(),
        }
    }

    /// Look up a live task by id, running tasks first.
    pub async fn find(&self, task_id: &str) -> Option<ActiveTask> {
        let inner = self.inner.read().await;
        inner
            .running
            .iter()
            .chain(inner.pending.iter())
            .find(|t| t.task_id == task_id)
            .cloned()
    }

    /// Number of pending (not yet running) tasks.
    pub async fn pending_len(&self) -> usize {
        self.inner.read().await.pending.len()
    }
}

/// A point-in-time copy of the queue contents.
///
/// Pagination over a snapshot is position-stable: later queue mutations
/// cannot shift entries between pages computed from the same snapshot.
#[derive(Debug, Clone)]
pub struct QueueSnapshot {
    pub current: Vec<ActiveTask>,
    pub pending: Vec<ActiveTask>,
}

impl QueueSnapshot {
    /// Ids of the pending tasks in slice `[page*page_size, (page+1)*page_size)`.
    ///
    /// Pages past the end of the snapshot (and a zero page size) yield an
    /// empty vec rather than an error.
    pub fn pending_page(&self, page: usize, page_size: usize) -> Vec<String> {
        if page_size == 0 {
            return Vec::new();
        }
        let start = page.saturating_mul(page_size);
        if start >= self.pending.len() {
            return Vec::new();
        }
        let end = start.saturating_add(page_size).min(self.pending.len());
        self.pending[start..end]
            .iter()
            .map(|t| t.task_id.clone())
            .collect()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
