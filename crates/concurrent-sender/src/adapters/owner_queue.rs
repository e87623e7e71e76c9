//! # Owner Queue
//!
//! A single-task actor that owns a value `T` and runs `FnOnce(&mut T)` jobs
//! against it, one at a time, in the order they were queued.
//!
//! `WeakOwner<T>` is the weak handle: it can queue work but never keeps the
//! owner alive. Work queued through a weak handle after the owner was
//! destroyed is dropped, and work already queued when the owner is destroyed
//! never runs.
//!
//! ```text
//!  engine thread ──┐
//!  engine thread ──┼── WeakOwner::with(job) ──► [ mpsc ] ──► owner task: job(&mut T)
//!  caller        ──┘
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type Job<T> = Box<dyn FnOnce(&mut T) + Send>;

/// The owner no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("owner is gone")]
pub struct OwnerGone;

/// Strong handle to an owner actor. Dropping it destroys the owner.
pub struct OwnerQueue<T: Send + 'static> {
    name: Arc<str>,
    sender: mpsc::UnboundedSender<Job<T>>,
    alive: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

/// Weak handle to an owner actor.
pub struct WeakOwner<T> {
    sender: mpsc::WeakUnboundedSender<Job<T>>,
    alive: Arc<AtomicBool>,
}

impl<T: Send + 'static> OwnerQueue<T> {
    /// Spawn an owner around an existing value.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(name: &str, state: T) -> Self {
        Self::spawn_with(name, |_| state)
    }

    /// Spawn an owner whose state needs a weak handle to itself.
    ///
    /// `init` runs on the calling thread before the owner task starts; work
    /// it queues through the handle runs first once the task is up.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_with<F>(name: &str, init: F) -> Self
    where
        F: FnOnce(WeakOwner<T>) -> T,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job<T>>();
        let alive = Arc::new(AtomicBool::new(true));
        let name: Arc<str> = Arc::from(name);

        let mut state = init(WeakOwner {
            sender: sender.downgrade(),
            alive: alive.clone(),
        });

        let task_alive = alive.clone();
        let task_name = name.clone();
        let task = tokio::spawn(async move {
            debug!(owner = %task_name, "Owner queue started");
            while let Some(job) = receiver.recv().await {
                if !task_alive.load(Ordering::Acquire) {
                    break;
                }
                job(&mut state);
            }
            // Owned state is destroyed on the owner task.
            drop(state);
            debug!(owner = %task_name, "Owner queue stopped");
        });

        Self {
            name,
            sender,
            alive,
            task: Some(task),
        }
    }

    /// Name given at spawn time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Weak handle for queuing work without keeping the owner alive.
    pub fn weak(&self) -> WeakOwner<T> {
        WeakOwner {
            sender: self.sender.downgrade(),
            alive: self.alive.clone(),
        }
    }

    /// Queue a job.
    pub fn run<F>(&self, job: F) -> Result<(), OwnerGone>
    where
        F: FnOnce(&mut T) + Send + 'static,
    {
        self.sender.send(Box::new(job)).map_err(|_| {
            warn!(owner = %self.name, "Owner task is no longer running");
            OwnerGone
        })
    }

    /// Queue a job and wait for its result.
    ///
    /// Because jobs run in order, awaiting `call` also waits for everything
    /// queued before it.
    pub async fn call<R, F>(&self, job: F) -> Result<R, OwnerGone>
    where
        R: Send + 'static,
        F: FnOnce(&mut T) -> R + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.run(move |state| {
            let _ = tx.send(job(state));
        })?;
        rx.await.map_err(|_| OwnerGone)
    }

    /// Destroy the owner and wait until its state has been dropped.
    ///
    /// Jobs still queued are discarded.
    pub async fn shutdown(mut self) {
        let task = self.task.take();
        drop(self);
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "Owner task ended abnormally");
            }
        }
    }
}

impl<T: Send + 'static> Drop for OwnerQueue<T> {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl<T: Send + 'static> fmt::Debug for OwnerQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerQueue")
            .field("name", &self.name)
            .field("alive", &self.alive.load(Ordering::Relaxed))
            .finish()
    }
}

impl<T: Send + 'static> WeakOwner<T> {
    /// Queue a job if the owner still exists.
    ///
    /// Liveness is checked again on the owner task right before the job
    /// runs.
    pub fn with<F>(&self, job: F) -> Result<(), OwnerGone>
    where
        F: FnOnce(&mut T) + Send + 'static,
    {
        if !self.is_alive() {
            return Err(OwnerGone);
        }
        let sender = self.sender.upgrade().ok_or(OwnerGone)?;
        sender.send(Box::new(job)).map_err(|_| OwnerGone)
    }

    /// Whether the owner has not been destroyed yet.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

impl<T> Clone for WeakOwner<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            alive: self.alive.clone(),
        }
    }
}

impl<T> fmt::Debug for WeakOwner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakOwner")
            .field("alive", &self.alive.load(Ordering::Relaxed))
            .finish()
    }
}
