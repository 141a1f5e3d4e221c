// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-worker queue that runs asynchronous work items one at a time.
//!
//! Items are kept on a stack and drained newest-first. Before every pop the
//! worker waits `step_interval`, so a burst of enqueues lands on the stack
//! before the first item starts. Once the stack is empty the worker parks
//! until the next [`WorkQueue::enqueue`] re-arms it.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error};

use invitrack_core::InvitrackError;

type Action = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), InvitrackError>> + Send>;

/// A queued unit of work: an id for diagnostics plus a deferred action.
pub struct Work {
    id: String,
    action: Action,
}

impl Work {
    /// Wraps `action`. It is not called until the worker pops the item.
    pub fn new<F, Fut>(id: impl Into<String>, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), InvitrackError>> + Send + 'static,
    {
        Self {
            id: id.into(),
            action: Box::new(move || action().boxed()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Debug for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Work").field("id", &self.id).finish_non_exhaustive()
    }
}

#[derive(Default)]
struct State {
    stack: Vec<Work>,
    /// Set by the enqueue that arms a drain cycle, cleared when the cycle finds the stack empty.
    draining: bool,
}

struct Shared {
    state: Mutex<State>,
    wake: Notify,
    step_interval: Duration,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pops the newest item, or ends the drain cycle when there is none.
    fn pop(&self) -> Option<Work> {
        let mut state = self.state();
        let work = state.stack.pop();
        if work.is_none() {
            state.draining = false;
        }
        work
    }
}

/// Handle to a running work queue. Clones share the same worker.
#[derive(Clone)]
pub struct WorkQueue {
    shared: Arc<Shared>,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl WorkQueue {
    /// Spawns the worker task. Must be called from within a tokio runtime.
    pub fn start(step_interval: Duration) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            wake: Notify::new(),
            step_interval,
        });
        let cancel = CancellationToken::new();
        let tasks = TaskTracker::new();
        tasks.spawn(run_worker(Arc::clone(&shared), cancel.clone()));

        Self {
            shared,
            cancel,
            tasks,
        }
    }

    /// Pushes `work` on top of the stack and arms a drain cycle if none is active.
    ///
    /// Returns immediately. Fails with [`InvitrackError::QueueClosed`] after
    /// [`WorkQueue::shutdown`], in which case `work` is dropped unrun.
    pub fn enqueue(&self, work: Work) -> Result<(), InvitrackError> {
        if self.cancel.is_cancelled() {
            return Err(InvitrackError::QueueClosed);
        }

        let arm = {
            let mut state = self.shared.state();
            debug!(work_id = %work.id, pending = state.stack.len() + 1, "work enqueued");
            state.stack.push(work);
            !std::mem::replace(&mut state.draining, true)
        };
        if arm {
            self.shared.wake.notify_one();
        }
        Ok(())
    }

    /// Number of items waiting to start.
    pub fn len(&self) -> usize {
        self.shared.state().stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state().stack.is_empty()
    }

    /// Whether a drain cycle is scheduled or running.
    pub fn is_draining(&self) -> bool {
        self.shared.state().draining
    }

    /// Drops every item that has not started yet. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let dropped = std::mem::take(&mut self.shared.state().stack);
        if !dropped.is_empty() {
            debug!(dropped = dropped.len(), "work queue cleared");
        }
        dropped.len()
    }

    /// Stops the worker. Pending items are dropped; an item already running
    /// finishes before this returns.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.clear();
        self.tasks.close();
        self.tasks.wait().await;
    }
}

impl fmt::Debug for WorkQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkQueue")
            .field("pending", &self.len())
            .field("draining", &self.is_draining())
            .field("step_interval", &self.shared.step_interval)
            .finish()
    }
}

async fn run_worker(shared: Arc<Shared>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = shared.wake.notified() => {}
        }
        drain(&shared, &cancel).await;
    }
    debug!("work queue worker stopped");
}

async fn drain(shared: &Shared, cancel: &CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(shared.step_interval) => {}
        }

        let Some(Work { id, action }) = shared.pop() else {
            return;
        };
        debug!(work_id = %id, "running queued work");
        match AssertUnwindSafe(async move { action().await })
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(work_id = %id, error = %e, "queued work failed"),
            Err(panic) => {
                error!(work_id = %id, error = %panic_message(&*panic), "queued work panicked")
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
