//! Scenes
//!
//! A scene owns one simulation world per layer, the actors mounted into
//! them, its own frame-update listener registry, and a camera. The game loop
//! drives exactly one scene at a time; `step` is where the per-layer physics
//! work fans out to the worker pool and joins again (the frame barrier).

use std::sync::Arc;

use glam::Vec2;
use parking_lot::Mutex;

use crate::actor::Actor;
use crate::camera::Camera;
use crate::error::{EngineError, EngineResult};
use crate::event::listeners::FrameListeners;
use crate::game_loop::worker_pool::{StepTask, WorkerPool};
use crate::physics::world::PhysicsWorld;
use crate::render::Surface;

pub type ActorRef = Arc<Mutex<Actor>>;

pub struct Scene {
    worlds: Vec<Arc<PhysicsWorld>>,
    actors: Vec<ActorRef>,
    frame_listeners: Arc<FrameListeners>,
    camera: Camera,
    paint: Option<Box<dyn FnMut(&mut dyn Surface) + Send>>,
    destroyed: bool,
}

impl Scene {
    /// Creates a scene with a single layer under the given gravity.
    pub fn new(gravity: Vec2) -> Self {
        Self {
            worlds: vec![Arc::new(PhysicsWorld::new(gravity))],
            actors: Vec::new(),
            frame_listeners: Arc::new(FrameListeners::new()),
            camera: Camera::default(),
            paint: None,
            destroyed: false,
        }
    }

    /// Adds another layer with its own independent simulation world and
    /// returns its index. Layers never share bodies, which is what makes
    /// stepping them in parallel sound.
    pub fn add_layer(&mut self, gravity: Vec2) -> usize {
        self.worlds
            .push(Arc::new(PhysicsWorld::new(gravity)));
        self.worlds.len() - 1
    }

    pub fn layer_count(&self) -> usize {
        self.worlds.len()
    }

    pub fn world(&self, layer: usize) -> EngineResult<&Arc<PhysicsWorld>> {
        self.worlds.get(layer).ok_or(EngineError::UnknownLayer(layer))
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Mounts an actor into layer 0.
    pub fn add_actor(&mut self, actor: &ActorRef) -> EngineResult<()> {
        self.add_actor_to_layer(actor, 0)
    }

    pub fn add_actor_to_layer(&mut self, actor: &ActorRef, layer: usize) -> EngineResult<()> {
        if self.destroyed {
            return Err(EngineError::WorldDestroyed);
        }
        let world = self.world(layer)?.clone();
        actor.lock().attach(&world)?;
        self.actors.push(Arc::clone(actor));
        Ok(())
    }

    /// Unmounts an actor, transitioning its handler back to detached.
    pub fn remove_actor(&mut self, actor: &ActorRef) -> EngineResult<()> {
        actor.lock().release()?;
        self.actors.retain(|a| !Arc::ptr_eq(a, actor));
        Ok(())
    }

    /// Advances every layer by `delta_seconds`. With more than one layer the
    /// steps run on the worker pool; this call returns only after all of
    /// them have finished.
    pub fn step(&mut self, delta_seconds: f32, pool: &WorkerPool) -> EngineResult<()> {
        match self.worlds.len() {
            0 => Ok(()),
            1 => {
                self.worlds[0].step(delta_seconds);
                Ok(())
            }
            _ => {
                let tasks: Vec<StepTask> = self
                    .worlds
                    .iter()
                    .map(|world| {
                        let world = Arc::clone(world);
                        Box::new(move || {
                            world.step(delta_seconds);
                            Ok(())
                        }) as StepTask
                    })
                    .collect();
                pool.run_all(tasks)
            }
        }
    }

    /// This scene's own frame-update registry, invoked by the loop after the
    /// global one.
    pub fn frame_listeners(&self) -> Arc<FrameListeners> {
        Arc::clone(&self.frame_listeners)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Installs the paint callback the render handoff will call with the
    /// frame's surface.
    pub fn set_paint(&mut self, paint: impl FnMut(&mut dyn Surface) + Send + 'static) {
        self.paint = Some(Box::new(paint));
    }

    pub(crate) fn paint(&mut self, surface: &mut dyn Surface) {
        if let Some(paint) = self.paint.as_mut() {
            paint(surface);
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Tears the scene down: every actor transitions back to detached first,
    /// then every world is destroyed. No body may outlive its world.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        for actor in self.actors.drain(..) {
            if let Err(err) = actor.lock().release() {
                log::error!("failed to release actor during scene destroy: {err}");
            }
        }
        for world in &self.worlds {
            world.destroy();
        }
        self.frame_listeners.clear();
        log::debug!("scene destroyed ({} layers)", self.worlds.len());
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_loop::worker_pool::WorkerPoolConfig;
    use crate::physics::data::{BodyType, PhysicsData};
    use crate::physics::shapes::{fixed_shapes, ShapeDesc};

    fn dynamic_ball() -> ActorRef {
        let mut data = PhysicsData::new(fixed_shapes(vec![ShapeDesc::Circle {
            radius: 0.5,
            offset: Vec2::ZERO,
        }]));
        data.body_type = BodyType::Dynamic;
        Arc::new(Mutex::new(Actor::with_data(data)))
    }

    #[test]
    fn mounting_attaches_and_unmounting_detaches() {
        let mut scene = Scene::new(Vec2::ZERO);
        let actor = dynamic_ball();
        scene.add_actor(&actor).expect("mount succeeds");
        assert!(actor.lock().is_attached());
        assert_eq!(scene.world(0).expect("layer 0").body_count(), 1);

        scene.remove_actor(&actor).expect("unmount succeeds");
        assert!(!actor.lock().is_attached());
        assert_eq!(scene.world(0).expect("layer 0").body_count(), 0);
        assert_eq!(scene.actor_count(), 0);
    }

    #[test]
    fn unknown_layer_is_rejected() {
        let mut scene = Scene::new(Vec2::ZERO);
        let actor = dynamic_ball();
        assert!(matches!(
            scene.add_actor_to_layer(&actor, 3),
            Err(EngineError::UnknownLayer(3))
        ));
        assert!(!actor.lock().is_attached());
    }

    #[test]
    fn destroy_detaches_every_actor_first() {
        let mut scene = Scene::new(Vec2::ZERO);
        let layer_one = scene.add_layer(Vec2::ZERO);
        let a = dynamic_ball();
        let b = dynamic_ball();
        scene.add_actor(&a).expect("mount a");
        scene
            .add_actor_to_layer(&b, layer_one)
            .expect("mount b on layer 1");

        let world_zero = scene.world(0).expect("layer 0").clone();
        let world_one = scene.world(1).expect("layer 1").clone();
        scene.destroy();

        assert!(!a.lock().is_attached());
        assert!(!b.lock().is_attached());
        assert!(world_zero.is_destroyed());
        assert!(world_one.is_destroyed());
        assert_eq!(world_zero.body_count(), 0);
        assert_eq!(world_one.body_count(), 0);

        // Mounting into a destroyed scene fails cleanly.
        let c = dynamic_ball();
        assert!(scene.add_actor(&c).is_err());
    }

    #[test]
    fn multi_layer_step_joins_before_returning() {
        let pool = WorkerPool::new(WorkerPoolConfig::default()).expect("pool builds");
        let mut scene = Scene::new(Vec2::ZERO);
        scene.add_layer(Vec2::ZERO);

        let actor = dynamic_ball();
        scene.add_actor(&actor).expect("mount succeeds");
        actor
            .lock()
            .handler_mut()
            .set_velocity(Vec2::new(2.0, 0.0));

        scene.step(0.5, &pool).expect("step succeeds");
        // The position reflects the completed step as soon as step returns.
        let x = actor.lock().position().x;
        assert!((x - 1.0).abs() < 1e-3, "expected ~1.0, got {x}");
    }
}
