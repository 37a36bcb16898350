//! Render handoff boundary
//!
//! Rendering primitives live outside this crate. The loop's only contract
//! with a renderer is `RenderTarget::render`: once per frame it hands over a
//! paint callback that draws the current scene onto whatever surface the
//! target provides. The headless target exists so the loop can run at full
//! fidelity in tests and server-side simulations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Drawing destination for one frame. Concrete surface operations are the
/// renderer's business; the engine only needs the dimensions to lay out the
/// debug overlay.
pub trait Surface {
    fn size(&self) -> (u32, u32);
}

/// Where finished frames go.
pub trait RenderTarget: Send {
    fn render(&mut self, paint: &mut dyn FnMut(&mut dyn Surface));
}

struct HeadlessSurface {
    width: u32,
    height: u32,
}

impl Surface for HeadlessSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Render target with no output. Invokes the paint callback like a real
/// target would and counts frames.
pub struct HeadlessTarget {
    width: u32,
    height: u32,
    frames: Arc<AtomicU64>,
}

impl HeadlessTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frames: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared frame counter, readable while the loop owns the target.
    pub fn frame_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.frames)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }
}

impl RenderTarget for HeadlessTarget {
    fn render(&mut self, paint: &mut dyn FnMut(&mut dyn Surface)) {
        let mut surface = HeadlessSurface {
            width: self.width,
            height: self.height,
        };
        paint(&mut surface);
        self.frames.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_target_counts_frames_and_paints() {
        let mut target = HeadlessTarget::new(640, 360);
        let counter = target.frame_counter();
        let mut seen = (0, 0);
        target.render(&mut |surface| seen = surface.size());
        assert_eq!(seen, (640, 360));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
