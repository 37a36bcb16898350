//! The frame loop
//!
//! One coordinating thread runs the loop; an owned worker pool steps the
//! scene's simulation layers. Each iteration is strictly ordered: physics
//! step (barrier) → global frame listeners → camera → scene frame listeners
//! → deferred dispatch drain → render handoff → pacing sleep. Everything
//! after the barrier may rely on positions from this frame's completed step.
//!
//! Stopping is cooperative: an atomic flag checked once per iteration, never
//! a thread interrupt. On the way out the worker pool gets a bounded grace
//! period to finish in-flight work; after that the loop stops waiting.
//!
//! Error policy: the loop fails fast. An error escaping any step of an
//! iteration stops the loop and is returned from `run` after pool shutdown —
//! a broken frame is not worth retrying against corrupted state.

pub mod dispatch;
pub mod worker_pool;

pub use dispatch::{DispatchHandle, DispatchQueue};
pub use worker_pool::{WorkerPool, WorkerPoolConfig};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::event::listeners::FrameListeners;
use crate::render::RenderTarget;
use crate::scene::Scene;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    ShuttingDown,
    Stopped,
}

impl LoopState {
    fn name(self) -> &'static str {
        match self {
            LoopState::Idle => "idle",
            LoopState::Running => "running",
            LoopState::ShuttingDown => "shutting down",
            LoopState::Stopped => "stopped",
        }
    }
}

/// Cooperative cancellation token for a running loop. Cloneable and usable
/// from any thread.
#[derive(Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A slow frame (debugger pause, allocation stall) must not inject a huge
/// simulation step that tunnels fast bodies through thin geometry, so the
/// elapsed time handed to the simulation is capped at two frame budgets.
fn clamp_elapsed(desired_frame_duration: f32, measured_duration: f32) -> f32 {
    measured_duration.min(2.0 * desired_frame_duration)
}

pub struct GameLoop {
    scene: Arc<Mutex<Scene>>,
    render_target: Box<dyn RenderTarget>,
    desired_frame_duration: f32,
    shutdown_grace: Duration,
    worker_threads: usize,
    debug: bool,
    stop: Arc<AtomicBool>,
    dispatch: DispatchQueue,
    frame_listeners: Arc<FrameListeners>,
    state: LoopState,
    frame_counter: u64,
    /// Measured duration of the previous iteration, sleep included.
    frame_duration: f32,
}

impl GameLoop {
    pub fn new(
        scene: Arc<Mutex<Scene>>,
        render_target: Box<dyn RenderTarget>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            scene,
            render_target,
            desired_frame_duration: config.desired_frame_duration(),
            shutdown_grace: Duration::from_secs_f32(config.shutdown_grace_seconds.max(0.0)),
            worker_threads: config.worker_threads,
            debug: config.debug,
            stop: Arc::new(AtomicBool::new(false)),
            dispatch: DispatchQueue::new(),
            frame_listeners: Arc::new(FrameListeners::new()),
            state: LoopState::Idle,
            frame_counter: 0,
            frame_duration: 0.0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Frames computed since the loop started.
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Measured duration of the last iteration in seconds, sleep included.
    pub fn frame_duration(&self) -> f32 {
        self.frame_duration
    }

    pub fn current_fps(&self) -> f32 {
        if self.frame_duration > 0.0 {
            1.0 / self.frame_duration
        } else {
            0.0
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    /// Producer handle for the deferred dispatch queue. Tasks enqueued
    /// during frame N run no earlier than frame N+1.
    pub fn dispatch_handle(&self) -> DispatchHandle {
        self.dispatch.handle()
    }

    /// Process-wide frame-update registry, invoked before the scene's own.
    pub fn frame_listeners(&self) -> Arc<FrameListeners> {
        Arc::clone(&self.frame_listeners)
    }

    pub fn scene(&self) -> Arc<Mutex<Scene>> {
        Arc::clone(&self.scene)
    }

    /// Runs the loop until a stop is requested or an iteration fails.
    /// Blocks the calling thread for the lifetime of the loop.
    pub fn run(&mut self) -> EngineResult<()> {
        if self.state != LoopState::Idle {
            return Err(EngineError::LoopNotIdle {
                state: self.state.name(),
            });
        }
        let pool = WorkerPool::new(WorkerPoolConfig {
            threads: self.worker_threads,
            ..Default::default()
        })?;
        self.state = LoopState::Running;
        log::info!(
            "game loop running: {:.1} fps target, {} worker thread(s)",
            1.0 / self.desired_frame_duration,
            pool.threads()
        );

        self.frame_duration = self.desired_frame_duration;
        let mut frame_start = Instant::now();
        let mut fatal: Option<EngineError> = None;

        while !self.stop.load(Ordering::SeqCst) {
            self.frame_counter += 1;
            let elapsed = clamp_elapsed(self.desired_frame_duration, self.frame_duration);

            if let Err(err) = self.run_frame(elapsed, &pool) {
                log::error!("frame {} failed: {err}", self.frame_counter);
                fatal = Some(err);
                break;
            }

            let work = frame_start.elapsed().as_secs_f32();
            if work < self.desired_frame_duration {
                std::thread::sleep(Duration::from_secs_f32(
                    self.desired_frame_duration - work,
                ));
            }
            let now = Instant::now();
            self.frame_duration = (now - frame_start).as_secs_f32();
            frame_start = now;
        }

        self.state = LoopState::ShuttingDown;
        if !pool.shutdown(self.shutdown_grace) {
            log::warn!(
                "worker pool did not drain within {:?}; proceeding with shutdown",
                self.shutdown_grace
            );
        }
        self.state = LoopState::Stopped;
        log::info!("game loop stopped after {} frames", self.frame_counter);

        match fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn run_frame(&mut self, elapsed: f32, pool: &WorkerPool) -> EngineResult<()> {
        // 1. Physics for every layer, joined before anything else runs.
        self.scene.lock().step(elapsed, pool)?;

        // 2. Process-wide observers, then camera, then scene observers. The
        // scene lock is not held while listeners run so they are free to use
        // the scene themselves.
        self.frame_listeners.invoke_frame_update(elapsed);
        self.scene.lock().camera_mut().on_frame_update();
        let scene_listeners = self.scene.lock().frame_listeners();
        scene_listeners.invoke_frame_update(elapsed);

        // 3. Deferred work queued up to (and including) the previous frame.
        self.dispatch.drain_current();

        // 4. Render handoff. The debug overlay itself is the renderer's
        // business; the loop only surfaces its counters.
        if self.debug {
            log::trace!(
                "frame {}: elapsed {:.4}s, {:.1} fps",
                self.frame_counter,
                elapsed,
                self.current_fps()
            );
        }
        let scene = Arc::clone(&self.scene);
        self.render_target
            .render(&mut |surface| scene.lock().paint(surface));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_clamped_to_two_frame_budgets() {
        let desired = 1.0 / 60.0;
        assert!((clamp_elapsed(desired, desired) - desired).abs() < 1e-7);
        assert!((clamp_elapsed(desired, 0.5) - 2.0 * desired).abs() < 1e-7);
        assert!((clamp_elapsed(desired, 0.001) - 0.001).abs() < 1e-7);
    }

    #[test]
    fn stop_handle_is_sticky_and_cloneable() {
        let flag = Arc::new(AtomicBool::new(false));
        let handle = StopHandle(Arc::clone(&flag));
        let clone = handle.clone();
        assert!(!clone.is_stop_requested());
        handle.stop();
        assert!(clone.is_stop_requested());
    }

    #[test]
    fn run_refuses_non_idle_state() {
        use crate::render::HeadlessTarget;
        let scene = Arc::new(Mutex::new(Scene::new(glam::Vec2::ZERO)));
        let config = EngineConfig::default();
        let mut game_loop = GameLoop::new(scene, Box::new(HeadlessTarget::new(64, 64)), &config);
        game_loop.state = LoopState::Stopped;
        assert!(matches!(
            game_loop.run(),
            Err(EngineError::LoopNotIdle { .. })
        ));
    }
}
