//! Timed tasks driven by frame updates
//!
//! Both task kinds are ordinary frame-update listeners: they accumulate the
//! elapsed time the loop hands them and fire when their deadline passes.
//! They unregister themselves from the registry that owns them once they are
//! exhausted, which is why they carry a weak back-reference to it.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{EngineError, EngineResult};
use crate::event::listeners::{FrameListeners, FrameUpdateListener, ListenerId};

struct Registration {
    registry: Weak<FrameListeners>,
    id: ListenerId,
}

impl Registration {
    fn unregister(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

/// One-shot task: fires once when the accumulated elapsed time reaches the
/// configured delay, then removes itself.
pub struct SingleTask {
    remaining: f32,
    task: Option<Box<dyn FnOnce() + Send>>,
    registration: Registration,
}

impl FrameUpdateListener for SingleTask {
    fn on_frame_update(&mut self, delta_seconds: f32) {
        self.remaining -= delta_seconds;
        // Pending while accumulated time is strictly less than the delay.
        if self.remaining > 0.0 {
            return;
        }
        if let Some(task) = self.task.take() {
            task();
        }
        self.registration.unregister();
    }
}

/// Schedules `task` to run once after `delay_seconds` of frame time has
/// accumulated. A zero delay fires on the next frame.
pub fn delay(
    registry: &Arc<FrameListeners>,
    delay_seconds: f32,
    task: impl FnOnce() + Send + 'static,
) -> EngineResult<ListenerId> {
    if delay_seconds < 0.0 {
        return Err(EngineError::InvalidDelay(delay_seconds));
    }
    let weak = Arc::downgrade(registry);
    let id = registry.add_with(|id| {
        let listener: Arc<Mutex<dyn FrameUpdateListener + Send>> =
            Arc::new(Mutex::new(SingleTask {
                remaining: delay_seconds,
                task: Some(Box::new(task)),
                registration: Registration { registry: weak, id },
            }));
        listener
    });
    Ok(id)
}

/// Repeating task: fires every `interval` seconds of accumulated frame time,
/// a configured number of times (or indefinitely), with an optional
/// distinguished final firing. Unregisters itself when exhausted.
pub struct PeriodicTask {
    countdown: f32,
    interval: f32,
    /// Remaining firings; `None` repeats forever.
    repetitions: Option<u32>,
    counter: u32,
    paused: bool,
    task: Box<dyn FnMut(u32) + Send>,
    final_task: Option<Box<dyn FnMut(u32) + Send>>,
    registration: Registration,
}

impl PeriodicTask {
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Replaces the interval and restarts the countdown.
    pub fn set_interval(&mut self, interval: f32) -> EngineResult<()> {
        if interval <= 0.0 {
            return Err(EngineError::InvalidInterval(interval));
        }
        self.interval = interval;
        self.countdown = interval;
        Ok(())
    }

    pub fn repetitions_left(&self) -> Option<u32> {
        self.repetitions
    }

    /// How many times the task has fired so far.
    pub fn run_count(&self) -> u32 {
        self.counter
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle(&mut self) {
        self.paused = !self.paused;
    }

    /// Stops the task for good by removing it from its registry.
    pub fn unregister(&self) {
        self.registration.unregister();
    }
}

impl FrameUpdateListener for PeriodicTask {
    fn on_frame_update(&mut self, delta_seconds: f32) {
        if self.paused {
            return;
        }
        self.countdown -= delta_seconds;
        // A long frame can cover several intervals; each one fires.
        while self.countdown <= 0.0 {
            self.countdown += self.interval;
            if let Some(reps) = self.repetitions.as_mut() {
                *reps = reps.saturating_sub(1);
            }
            self.counter += 1;
            if self.repetitions == Some(0) {
                match self.final_task.as_mut() {
                    Some(final_task) => final_task(self.counter),
                    None => (self.task)(self.counter),
                }
                self.registration.unregister();
                return;
            }
            (self.task)(self.counter);
        }
    }
}

/// Owner-side handle to a registered periodic task.
pub struct PeriodicTaskHandle {
    task: Arc<Mutex<PeriodicTask>>,
    id: ListenerId,
}

impl PeriodicTaskHandle {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn pause(&self) {
        self.task.lock().pause();
    }

    pub fn resume(&self) {
        self.task.lock().resume();
    }

    pub fn is_paused(&self) -> bool {
        self.task.lock().is_paused()
    }

    pub fn run_count(&self) -> u32 {
        self.task.lock().run_count()
    }

    /// Stops and removes the task.
    pub fn cancel(&self) {
        self.task.lock().unregister();
    }
}

/// Registers a repeating task. `repetitions` of `None` repeats forever;
/// otherwise the task fires exactly that many times, with `final_task`
/// (when given) replacing the last firing.
pub fn repeat(
    registry: &Arc<FrameListeners>,
    interval: f32,
    repetitions: Option<u32>,
    task: impl FnMut(u32) + Send + 'static,
    final_task: Option<Box<dyn FnMut(u32) + Send>>,
) -> EngineResult<PeriodicTaskHandle> {
    if interval <= 0.0 {
        return Err(EngineError::InvalidInterval(interval));
    }
    if repetitions == Some(0) {
        return Err(EngineError::InvalidRepetitions);
    }
    let weak = Arc::downgrade(registry);
    let mut created: Option<Arc<Mutex<PeriodicTask>>> = None;
    let id = registry.add_with(|id| {
        let concrete = Arc::new(Mutex::new(PeriodicTask {
            countdown: interval,
            interval,
            repetitions,
            counter: 0,
            paused: false,
            task: Box::new(task),
            final_task,
            registration: Registration { registry: weak, id },
        }));
        created = Some(Arc::clone(&concrete));
        let listener: Arc<Mutex<dyn FrameUpdateListener + Send>> = concrete;
        listener
    });
    let task = created.expect("registration callback always runs");
    Ok(PeriodicTaskHandle { task, id })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(registry: &Arc<FrameListeners>, frames: usize, delta: f32) {
        for _ in 0..frames {
            registry.invoke_frame_update(delta);
        }
    }

    #[test]
    fn repeating_task_fires_and_unregisters() {
        let registry = Arc::new(FrameListeners::new());
        let fired = Arc::new(Mutex::new(0u32));
        let fired_ref = Arc::clone(&fired);
        let handle = repeat(&registry, 1.0, Some(3), move |_| *fired_ref.lock() += 1, None)
            .expect("valid repeat config");

        // Six half-second frames cover three seconds: exactly three firings.
        drive(&registry, 6, 0.5);
        assert_eq!(*fired.lock(), 3);
        assert_eq!(handle.run_count(), 3);

        // A fourth simulated second produces nothing more.
        drive(&registry, 2, 0.5);
        assert_eq!(*fired.lock(), 3);
        assert!(registry.is_empty(), "exhausted task must unregister itself");
    }

    #[test]
    fn final_task_replaces_last_firing() {
        let registry = Arc::new(FrameListeners::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let regular = Arc::clone(&log);
        let last = Arc::clone(&log);
        repeat(
            &registry,
            1.0,
            Some(3),
            move |n| regular.lock().push(format!("run {n}")),
            Some(Box::new(move |n| last.lock().push(format!("final {n}")))),
        )
        .expect("valid repeat config");

        drive(&registry, 3, 1.0);
        assert_eq!(*log.lock(), vec!["run 1", "run 2", "final 3"]);
    }

    #[test]
    fn long_frame_covers_multiple_intervals() {
        let registry = Arc::new(FrameListeners::new());
        let fired = Arc::new(Mutex::new(0u32));
        let fired_ref = Arc::clone(&fired);
        repeat(&registry, 0.25, None, move |_| *fired_ref.lock() += 1, None)
            .expect("valid repeat config");

        registry.invoke_frame_update(1.0);
        assert_eq!(*fired.lock(), 4);
    }

    #[test]
    fn pause_suppresses_firing() {
        let registry = Arc::new(FrameListeners::new());
        let fired = Arc::new(Mutex::new(0u32));
        let fired_ref = Arc::clone(&fired);
        let handle = repeat(&registry, 1.0, None, move |_| *fired_ref.lock() += 1, None)
            .expect("valid repeat config");

        drive(&registry, 2, 1.0);
        assert_eq!(*fired.lock(), 2);

        handle.pause();
        drive(&registry, 3, 1.0);
        assert_eq!(*fired.lock(), 2);

        handle.resume();
        drive(&registry, 1, 1.0);
        assert_eq!(*fired.lock(), 3);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let registry = Arc::new(FrameListeners::new());
        assert!(matches!(
            repeat(&registry, 0.0, None, |_| {}, None),
            Err(EngineError::InvalidInterval(_))
        ));
        assert!(matches!(
            repeat(&registry, -1.0, None, |_| {}, None),
            Err(EngineError::InvalidInterval(_))
        ));
        assert!(matches!(
            repeat(&registry, 1.0, Some(0), |_| {}, None),
            Err(EngineError::InvalidRepetitions)
        ));
        assert!(matches!(
            delay(&registry, -0.5, || {}),
            Err(EngineError::InvalidDelay(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn one_shot_fires_exactly_on_the_boundary() {
        let registry = Arc::new(FrameListeners::new());
        let fired = Arc::new(Mutex::new(false));
        let fired_ref = Arc::clone(&fired);
        delay(&registry, 1.0, move || *fired_ref.lock() = true).expect("valid delay");

        registry.invoke_frame_update(0.5);
        assert!(!*fired.lock(), "accumulated 0.5 < 1.0 keeps it pending");
        registry.invoke_frame_update(0.5);
        assert!(*fired.lock(), "accumulated 1.0 >= 1.0 fires");
        assert!(registry.is_empty());

        // Firing again has no effect; the task is gone.
        registry.invoke_frame_update(1.0);
    }

    #[test]
    fn zero_delay_fires_next_frame() {
        let registry = Arc::new(FrameListeners::new());
        let fired = Arc::new(Mutex::new(false));
        let fired_ref = Arc::clone(&fired);
        delay(&registry, 0.0, move || *fired_ref.lock() = true).expect("valid delay");
        registry.invoke_frame_update(0.016);
        assert!(*fired.lock());
    }
}
