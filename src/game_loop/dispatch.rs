//! Deferred dispatch queue
//!
//! Work scheduled from anywhere (listeners, worker tasks, other threads)
//! that must run on the coordinating thread, strictly after the physics
//! barrier of a later frame. Draining is bounded to the tasks present when
//! the drain starts; anything enqueued during the drain waits for the next
//! frame, which keeps each frame's work finite even when tasks schedule
//! follow-up tasks.

use crossbeam_channel::{unbounded, Receiver, Sender};

type Task = Box<dyn FnOnce() + Send>;

/// Cloneable producer side of the queue.
#[derive(Clone)]
pub struct DispatchHandle {
    tx: Sender<Task>,
}

impl DispatchHandle {
    pub fn enqueue(&self, task: impl FnOnce() + Send + 'static) {
        if self.tx.send(Box::new(task)).is_err() {
            log::warn!("dispatch queue is gone; dropping task");
        }
    }
}

pub struct DispatchQueue {
    tx: Sender<Task>,
    rx: Receiver<Task>,
}

impl Default for DispatchQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn handle(&self) -> DispatchHandle {
        DispatchHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn enqueue(&self, task: impl FnOnce() + Send + 'static) {
        let _ = self.tx.send(Box::new(task));
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Runs every task that was queued when the drain started, FIFO, once.
    /// Tasks enqueued by those tasks stay queued for a later drain. Returns
    /// how many tasks ran.
    pub fn drain_current(&self) -> usize {
        let pending = self.rx.len();
        let mut ran = 0;
        for _ in 0..pending {
            match self.rx.try_recv() {
                Ok(task) => {
                    task();
                    ran += 1;
                }
                Err(_) => break,
            }
        }
        ran
    }
}
