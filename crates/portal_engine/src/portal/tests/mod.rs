//! Frame-by-frame scenarios driving the portal system over the in-memory world
//!
//! Portal A sits at the origin facing +X. Portal B sits at (0, 1000, 0)
//! facing +Y, so A -> B maps (x, y, z) to (y, 1000 - x, z) and directions
//! (dx, dy, dz) to (dy, -dx, dz).

mod view_synthesis;

use crate::core::PortalConfig;
use crate::foundation::collections::{ObjectId, PortalId};
use crate::foundation::math::{constants::HALF_PI, utils, Transform, Vec2, Vec3};
use crate::render::{HeadlessCapture, Viewer};
use crate::scene::{SceneObject, SceneWorld};
use super::{Crossing, PortalSide, PortalSystem, TrackedObjectRegistry};

const DT: f32 = 0.1;
const VIEWPORT: (u32, u32) = (1280, 720);

fn frame_a() -> Transform {
    Transform::identity()
}

fn frame_b() -> Transform {
    Transform::from_position_rotation(Vec3::new(0.0, 1000.0, 0.0), utils::yaw_rotation(HALF_PI))
}

fn extents() -> Vec2 {
    Vec2::new(50.0, 100.0)
}

struct Scenario {
    world: SceneWorld,
    system: PortalSystem,
    capture: HeadlessCapture,
    observer: ObjectId,
    a: PortalId,
    b: PortalId,
}

impl Scenario {
    /// Linked pair with an idle observer pawn well away from both portals
    fn new(config: PortalConfig) -> Self {
        let mut world = SceneWorld::new();
        let observer = world.spawn(SceneObject::pawn("observer", Vec3::new(-500.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 60.0)));

        let mut system = PortalSystem::new(config).with_viewer(Viewer::new(observer, VIEWPORT));
        let a = system.spawn_portal(frame_a(), extents(), PortalSide::Left);
        let b = system.spawn_portal(frame_b(), extents(), PortalSide::Right);
        system.link(a, b).unwrap();

        Self {
            world,
            system,
            capture: HeadlessCapture::new(),
            observer,
            a,
            b,
        }
    }

    fn linked() -> Self {
        Self::new(PortalConfig::default())
    }

    fn frame(&mut self) -> Vec<Crossing> {
        self.system
            .run_frame(&mut self.world, &mut self.capture, |world: &mut SceneWorld| world.step_physics(DT))
            .unwrap()
    }

    fn registry(&self, portal: PortalId) -> &TrackedObjectRegistry {
        self.system.portal(portal).unwrap().registry()
    }

    fn throw_crate(&mut self, position: Vec3, velocity: Vec3) -> ObjectId {
        self.world
            .spawn(SceneObject::body("crate", position, 10.0).with_velocity(velocity, Vec3::zeros()))
    }
}
