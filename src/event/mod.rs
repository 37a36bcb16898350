//! Listener registries and frame-time task scheduling.

pub mod listeners;
pub mod tasks;

pub use listeners::{EventListeners, FrameListeners, FrameUpdateListener, ListenerId};
pub use tasks::{delay, repeat, PeriodicTask, PeriodicTaskHandle, SingleTask};
