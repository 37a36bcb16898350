//! Engine error handling
//!
//! Library errors are concrete `EngineError` variants; application code and
//! binaries are free to wrap them in `anyhow`. Configuration errors surface
//! synchronously at the call site and are recoverable by the caller; errors
//! escaping a frame of the game loop are terminal for that loop.

use std::path::PathBuf;

/// Result alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Density must be strictly positive; zero or negative density would make
    /// the solver's mass computation meaningless.
    #[error("density must be strictly positive, got {0}")]
    InvalidDensity(f32),

    #[error("task interval must be greater than zero, got {0}")]
    InvalidInterval(f32),

    #[error("task delay must not be negative, got {0}")]
    InvalidDelay(f32),

    #[error("invalid collider shape: {0}")]
    InvalidShape(String),

    #[error("repetition count must be at least 1")]
    InvalidRepetitions,

    #[error("actor is already attached to a simulation world")]
    AlreadyAttached,

    #[error("simulation world has been destroyed")]
    WorldDestroyed,

    /// Attach/detach while the world step is executing would mutate solver
    /// state mid-integration. The loop's barrier normally makes this
    /// unreachable; hitting it means a callback ran on the wrong side of the
    /// barrier.
    #[error("operation is not allowed while the world step is running")]
    WorldStepInProgress,

    #[error("scene has no layer {0}")]
    UnknownLayer(usize),

    #[error("game loop can only be started from the idle state, current state is {state}")]
    LoopNotIdle { state: &'static str },

    #[error("worker pool: {0}")]
    WorkerPool(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
