use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u64);

/// Rigid-body backend the simulation drives. It owns body positions and
/// velocities but never decides when an entity lives or dies; contact
/// between entities is detected by the simulation, not reported from here.
pub trait PhysicsWorld {
    fn spawn_body(&mut self, mass: f32, radius: f32, position: Vec2) -> BodyHandle;
    fn remove_body(&mut self, handle: BodyHandle);
    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2);
    fn velocity(&self, handle: BodyHandle) -> Option<Vec2>;
    fn read_position(&self, handle: BodyHandle) -> Option<Vec2>;
    fn step(&mut self, dt: f32);
}

#[derive(Debug, Clone, PartialEq)]
struct Body {
    position: Vec2,
    velocity: Vec2,
    mass: f32,
    radius: f32,
}

/// Collision-free integrator: bodies move at their set velocity and wrap
/// around the world edges.
#[derive(Debug, Clone)]
pub struct KinematicPhysics {
    bounds: Vec2,
    next_handle: u64,
    bodies: BTreeMap<BodyHandle, Body>,
}

impl KinematicPhysics {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            bounds: Vec2::new(width, height),
            next_handle: 0,
            bodies: BTreeMap::new(),
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn mass(&self, handle: BodyHandle) -> Option<f32> {
        self.bodies.get(&handle).map(|body| body.mass)
    }
}

impl PhysicsWorld for KinematicPhysics {
    fn spawn_body(&mut self, mass: f32, radius: f32, position: Vec2) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(
            handle,
            Body {
                position,
                velocity: Vec2::ZERO,
                mass,
                radius,
            },
        );
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) {
        self.bodies.remove(&handle);
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.velocity = velocity;
        }
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&handle).map(|body| body.velocity)
    }

    fn read_position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&handle).map(|body| body.position)
    }

    fn step(&mut self, dt: f32) {
        let bounds = self.bounds;
        for body in self.bodies.values_mut() {
            if body.velocity == Vec2::ZERO {
                continue;
            }
            body.position += body.velocity * dt;
            body.position.x = wrap_axis(body.position.x, body.radius, bounds.x);
            body.position.y = wrap_axis(body.position.y, body.radius, bounds.y);
        }
    }
}

/// A body crossing one edge reappears just inside the opposite edge.
fn wrap_axis(coord: f32, radius: f32, extent: f32) -> f32 {
    if extent <= 2.0 * radius {
        return coord.clamp(0.0, extent);
    }
    if coord - radius < 0.0 {
        extent - radius
    } else if coord + radius > extent {
        radius
    } else {
        coord
    }
}
