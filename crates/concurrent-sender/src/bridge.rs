//! # Owner-Context Bridge
//!
//! Moves a unit of work from whatever thread produced it onto the sender's
//! owner context. Exclusive `&mut ConcurrentSender` access *is* the owner
//! context: a job receives it only once it runs there.
//!
//! Guarantees per bridge instance:
//! - jobs run in the order they were marshaled
//! - no latency bound
//! - a job marshaled to a destroyed owner is dropped without running
//!
//! The bridge never holds a strong reference to its owner.

use crate::adapters::owner_queue::WeakOwner;
use crate::error::SenderError;
use crate::service::sender::ConcurrentSender;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// A unit of work for the owner context.
pub type SenderJob = Box<dyn FnOnce(&mut ConcurrentSender) + Send>;

/// An owner type that holds a `ConcurrentSender`.
pub trait SenderOwner: Send + 'static {
    fn sender_mut(&mut self) -> &mut ConcurrentSender;
}

impl SenderOwner for ConcurrentSender {
    fn sender_mut(&mut self) -> &mut ConcurrentSender {
        self
    }
}

/// The stored marshaling primitive.
#[derive(Clone)]
pub struct OwnerBridge {
    run: Arc<dyn Fn(SenderJob) + Send + Sync>,
}

impl OwnerBridge {
    /// Build a bridge from a raw primitive.
    ///
    /// `run` must eventually execute every job it receives on the owner
    /// context, in order, or drop it if the owner is gone.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn(SenderJob) + Send + Sync + 'static,
    {
        Self { run: Arc::new(run) }
    }

    /// Build a bridge onto an owner queue through a weak handle.
    pub fn on_queue<T: SenderOwner>(owner: WeakOwner<T>) -> Self {
        Self::new(move |job: SenderJob| {
            let queued = owner.with(move |owner: &mut T| job(owner.sender_mut()));
            if let Err(gone) = queued {
                let error = SenderError::from(gone);
                trace!(error = %error, "Dropped job marshaled to a destroyed owner");
            }
        })
    }

    /// Whether both handles share the same marshaling primitive.
    pub fn is_same(&self, other: &OwnerBridge) -> bool {
        Arc::ptr_eq(&self.run, &other.run)
    }

    /// Queue `job` for the owner context.
    pub fn marshal<F>(&self, job: F)
    where
        F: FnOnce(&mut ConcurrentSender) + Send + 'static,
    {
        (self.run)(Box::new(job));
    }
}

impl fmt::Debug for OwnerBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerBridge").finish_non_exhaustive()
    }
}

/// Job queue for an owner context the caller drives by hand, such as a UI
/// loop or a single-threaded test.
///
/// Jobs accumulate until the owner calls `drain` with its sender. The queue
/// serves one sender at a time: each `bridge()` call retires every earlier
/// bridge, and jobs queued or marshaled through a retired bridge never run.
/// `drain` only runs jobs for the sender built on the current bridge. The
/// bridges hold the queue weakly, so dropping the queue drops its jobs.
#[derive(Clone, Default)]
pub struct ManualQueue {
    inner: Arc<Mutex<QueueState>>,
}

#[derive(Default)]
struct QueueState {
    jobs: VecDeque<SenderJob>,
    generation: u64,
    current: Option<OwnerBridge>,
}

impl ManualQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bridge that appends to this queue, replacing any earlier bridge.
    pub fn bridge(&self) -> OwnerBridge {
        let queue = Arc::downgrade(&self.inner);
        let mut state = self.inner.lock();
        state.generation += 1;
        let generation = state.generation;

        let bridge = OwnerBridge::new(move |job| {
            let Some(queue) = queue.upgrade() else {
                trace!("Dropped job marshaled to a dropped manual queue");
                return;
            };
            let mut state = queue.lock();
            if state.generation == generation {
                state.jobs.push_back(job);
            } else {
                drop(state);
                trace!(generation, "Dropped job marshaled through a retired bridge");
            }
        });

        let stale = std::mem::take(&mut state.jobs);
        state.current = Some(bridge.clone());
        drop(state);
        if !stale.is_empty() {
            debug!(discarded = stale.len(), "Discarded jobs of a retired bridge");
        }
        bridge
    }

    /// Run queued jobs in order, including any queued while draining.
    ///
    /// Returns how many jobs ran. Runs nothing unless `sender` was built on
    /// this queue's current bridge.
    pub fn drain(&self, sender: &mut ConcurrentSender) -> usize {
        let serves = self
            .inner
            .lock()
            .current
            .as_ref()
            .is_some_and(|current| current.is_same(sender.bridge()));
        if !serves {
            debug!("Sender is not on this queue's current bridge; nothing drained");
            return 0;
        }

        let mut ran = 0;
        loop {
            // The lock is not held while a job runs: jobs may marshal more work.
            let job = self.inner.lock().jobs.pop_front();
            let Some(job) = job else {
                break;
            };
            job(sender);
            ran += 1;
        }
        ran
    }

    pub fn len(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().jobs.is_empty()
    }
}

impl fmt::Debug for ManualQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("ManualQueue")
            .field("queued", &state.jobs.len())
            .field("generation", &state.generation)
            .finish()
    }
}
