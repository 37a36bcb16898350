//! Worker pool for per-layer physics stepping
//!
//! The pool is owned by the game loop instance — created when the loop
//! starts, torn down when it stops — so two loops (say, in tests) never
//! share worker state. `run_all` is a barrier: it returns only after every
//! submitted task has finished, which is what lets everything downstream of
//! the physics step read fresh positions.

use std::time::Duration;

use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{EngineError, EngineResult};

pub type StepTask = Box<dyn FnOnce() -> EngineResult<()> + Send>;

pub struct WorkerPoolConfig {
    /// 0 = derive from the core count, leaving one core for the
    /// coordinating thread.
    pub threads: usize,
    pub thread_name_prefix: &'static str,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            thread_name_prefix: "sim-worker",
        }
    }
}

pub struct WorkerPool {
    pool: ThreadPool,
    threads: usize,
}

impl WorkerPool {
    pub fn new(config: WorkerPoolConfig) -> EngineResult<Self> {
        let threads = if config.threads == 0 {
            num_cpus::get().saturating_sub(1).max(1)
        } else {
            config.threads
        };
        let prefix = config.thread_name_prefix;
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(move |idx| format!("{prefix}-{idx}"))
            .build()
            .map_err(|e| EngineError::WorkerPool(e.to_string()))?;
        Ok(Self { pool, threads })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Runs every task, possibly in parallel, and joins on all of them
    /// before returning (barrier). The first task error, if any, is
    /// returned after the barrier.
    pub fn run_all(&self, tasks: Vec<StepTask>) -> EngineResult<()> {
        if tasks.is_empty() {
            return Ok(());
        }
        let errors: Mutex<Vec<EngineError>> = Mutex::new(Vec::new());
        self.pool.install(|| {
            rayon::scope(|scope| {
                for task in tasks {
                    let errors = &errors;
                    scope.spawn(move |_| {
                        if let Err(err) = task() {
                            errors.lock().push(err);
                        }
                    });
                }
            });
        });
        match errors.into_inner().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Shuts the pool down, waiting up to `grace` for its threads to finish.
    /// Returns false when the grace period elapsed first; the threads are
    /// then left to finish on their own instead of being force-killed.
    pub fn shutdown(self, grace: Duration) -> bool {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let spawned = std::thread::Builder::new()
            .name("sim-worker-shutdown".to_string())
            .spawn(move || {
                drop(self.pool);
                let _ = tx.send(());
            });
        match spawned {
            Ok(_) => rx.recv_timeout(grace).is_ok(),
            Err(err) => {
                log::warn!("could not spawn shutdown helper: {err}");
                true
            }
        }
    }
}
