//! atelier-queue – scheduler-owned state for not-yet-completed generation
//! tasks.
//!
//! The scheduler (the generation worker loop) owns all mutations: it
//! enqueues submitted tasks, promotes the FIFO head to running, and reports
//! terminal outcomes.  Everything else in the system, most importantly the
//! HTTP query surface, only ever *reads* through snapshot-consistent views.
//! Terminal outcomes are additionally published on a channel so that a
//! single archiver can move the finished task into durable storage.

mod queue;
mod types;

pub use queue::{QueueSnapshot, TaskQueue};
pub use types::{ActiveTask, QueueError, QueueEvent, TaskOutcome, TaskStatus};
