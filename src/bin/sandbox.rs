//! Headless sandbox: drops a ball onto a floor and runs the full loop for a
//! couple of seconds. Useful as a smoke test and as a minimal usage example.

use std::sync::Arc;

use anyhow::Result;
use glam::Vec2;
use parking_lot::Mutex;
use stage_engine::{
    delay, fixed_shapes, repeat, Actor, BodyType, EngineConfig, GameLoop, HeadlessTarget,
    PhysicsData, Scene, ShapeDesc,
};

fn main() -> Result<()> {
    stage_engine::init_logger();
    let config = EngineConfig::default();

    let mut scene = Scene::new(config.gravity_vec());

    let floor = Arc::new(Mutex::new({
        let mut data = PhysicsData::new(fixed_shapes(vec![ShapeDesc::Rectangle {
            half_extents: Vec2::new(20.0, 0.5),
            offset: Vec2::ZERO,
        }]));
        data.body_type = BodyType::Static;
        Actor::with_data(data)
    }));

    let ball = Arc::new(Mutex::new({
        let mut data = PhysicsData::new(fixed_shapes(vec![ShapeDesc::Circle {
            radius: 0.5,
            offset: Vec2::ZERO,
        }]));
        data.body_type = BodyType::Dynamic;
        data.position = Vec2::new(0.0, 10.0);
        data.restitution = 0.6;
        Actor::with_data(data)
    }));

    scene.add_actor(&floor)?;
    scene.add_actor(&ball)?;

    let ball_for_camera = Arc::clone(&ball);
    scene
        .camera_mut()
        .set_focus(Arc::new(move || ball_for_camera.lock().center()));

    let scene = Arc::new(Mutex::new(scene));
    let mut game_loop = GameLoop::new(
        Arc::clone(&scene),
        Box::new(HeadlessTarget::new(1280, 720)),
        &config,
    );

    // Log the ball's state twice a second and stop after three seconds.
    let listeners = game_loop.frame_listeners();
    let ball_for_log = Arc::clone(&ball);
    repeat(
        &listeners,
        0.5,
        None,
        move |_| {
            let ball = ball_for_log.lock();
            log::info!(
                "ball at {:?}, velocity {:?}",
                ball.position(),
                ball.velocity()
            );
        },
        None,
    )?;
    let stop = game_loop.stop_handle();
    delay(&listeners, 3.0, move || stop.stop())?;

    game_loop.run()?;
    log::info!(
        "done: {} frames, last measured fps {:.1}",
        game_loop.frame_counter(),
        game_loop.current_fps()
    );
    Ok(())
}
