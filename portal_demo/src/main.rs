//! Portal demo application
//!
//! Runs a small headless scene: two walls, a portal fired at each, and a
//! crate thrown through the pair. Crossings and captures are logged.
//!
//! Reads `portal.toml` from the working directory when present.

use portal_engine::config::ConfigError;
use portal_engine::foundation::logging;
use portal_engine::foundation::math::constants::{HALF_PI, PI};
use portal_engine::foundation::math::utils;
use portal_engine::prelude::*;
use portal_engine::render::CaptureEvent;
use portal_engine::scene::Motion;

const CONFIG_PATH: &str = "portal.toml";
const FRAME_TIME: f32 = 1.0 / 60.0;
const FRAME_COUNT: u32 = 240;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("placement: {0}")]
    Placement(#[from] PlacementError),
    #[error("portal: {0}")]
    Portal(#[from] PortalError),
}

struct PortalDemoApp {
    world: SceneWorld,
    portals: PortalSystem,
    placer: PortalPlacer,
    capture: HeadlessCapture,
    player: ObjectId,
}

impl PortalDemoApp {
    fn new(config: &ApplicationConfig) -> Self {
        let mut world = SceneWorld::new();

        // One wall ahead of the player and one to its right, both facing back.
        world.add_portal_wall(PortalWall::new(
            Transform::from_position_rotation(Vec3::new(500.0, 0.0, 0.0), utils::yaw_rotation(PI)),
            400.0,
            300.0,
        ));
        world.add_portal_wall(PortalWall::new(
            Transform::from_position_rotation(Vec3::new(0.0, 800.0, 0.0), utils::yaw_rotation(-HALF_PI)),
            400.0,
            300.0,
        ));

        let player = world.spawn(SceneObject::pawn("player", Vec3::zeros(), Vec3::new(0.0, 0.0, 60.0)));
        log::info!("Player spawned at origin");

        let portals = PortalSystem::new(config.portal.clone()).with_viewer(Viewer::new(player, (1280, 720)));

        Self {
            world,
            portals,
            placer: PortalPlacer::new(config.placement.clone()),
            capture: HeadlessCapture::new(),
            player,
        }
    }

    fn place_portals(&mut self) -> Result<(), DemoError> {
        let eye = self
            .world
            .view_transform(self.player)
            .map_or_else(Vec3::zeros, |t| t.position);

        let shots = [(PortalSide::Left, Vec3::x()), (PortalSide::Right, Vec3::y())];
        for (side, direction) in shots {
            let id = self.placer.place(&mut self.portals, &mut self.world, side, eye, direction)?;
            if let Some(portal) = self.portals.portal(id) {
                log::info!("{:?} portal placed at {:?}", side, portal.frame().position);
            }
        }
        Ok(())
    }

    fn run(&mut self) -> Result<(), DemoError> {
        self.place_portals()?;

        // Walk the player into the right-hand portal.
        self.world.set_motion(self.player, Motion::Character { velocity: Vec3::new(0.0, 300.0, 0.0) });

        let crate_id = self.world.spawn(
            SceneObject::body("crate", Vec3::new(300.0, 0.0, 60.0), 10.0)
                .with_velocity(Vec3::new(300.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
        );

        let mut crossings = 0;
        for frame in 0..FRAME_COUNT {
            self.capture.reset();
            let crossed = self
                .portals
                .run_frame(&mut self.world, &mut self.capture, |w| w.step_physics(FRAME_TIME))?;

            for crossing in &crossed {
                log::info!(
                    "Frame {}: {:?} crossed {:?} -> {:?}, now at {:?}",
                    frame,
                    crossing.object,
                    crossing.from,
                    crossing.to,
                    crossing.transform.position
                );
            }
            crossings += crossed.len();

            let cuts = self
                .capture
                .events()
                .iter()
                .filter(|e| matches!(e, CaptureEvent::Captured { camera_cut: true, .. }))
                .count();
            if cuts > 0 {
                log::debug!("Frame {}: {} camera cut(s)", frame, cuts);
            }
        }

        let crate_end = self.world.transform(crate_id).map(|t| t.position);
        let player_end = self.world.transform(self.player).map(|t| t.position);
        log::info!(
            "Finished {} frames with {} crossing(s); crate at {:?}, player at {:?}",
            FRAME_COUNT,
            crossings,
            crate_end,
            player_end
        );
        Ok(())
    }
}

fn load_config() -> Result<ApplicationConfig, DemoError> {
    let config = ApplicationConfig::load_or_default(CONFIG_PATH)?;
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;

    logging::init_with_level(config.engine.log_filter());
    log::info!("Starting portal demo");

    let mut app = PortalDemoApp::new(&config);
    match app.run() {
        Ok(()) => {
            log::info!("Portal demo completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Portal demo failed: {}", e);
            Err(e.into())
        }
    }
}
