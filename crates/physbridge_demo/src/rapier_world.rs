//! A rapier world behind the bridge's dynamics-world contract
//!
//! Bodies are created from converter shapes and motion states. After every
//! step each dynamic body's motion state receives the body's new transform,
//! which is how scene nodes follow the simulation.

use std::collections::HashMap;

use log::{debug, trace};
use physbridge::debug::{DebugDraw, DebugDrawModes};
use physbridge::foundation::math::{Iso3, Translation3, Vec3};
use physbridge::physics::{CollisionShape, DynamicsWorld, MotionState};
use rapier3d::prelude::*;

const DYNAMIC_COLOUR: [f32; 3] = [1.0, 1.0, 0.0];
const FIXED_COLOUR: [f32; 3] = [0.0, 1.0, 0.0];
const AABB_COLOUR: [f32; 3] = [1.0, 0.0, 0.0];
const CONTACT_COLOUR: [f32; 3] = [1.0, 1.0, 1.0];

/// Rigid-body world stepped at a fixed rate
pub struct RapierWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    motion_states: HashMap<RigidBodyHandle, Box<dyn MotionState>>,
    time_accumulator: f32,
}

impl RapierWorld {
    /// Create an empty world with the given gravity and fixed sub-step length
    pub fn new(gravity: Vec3, fixed_time_step: f32) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: fixed_time_step,
            ..IntegrationParameters::default()
        };

        Self {
            gravity,
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            motion_states: HashMap::new(),
            time_accumulator: 0.0,
        }
    }

    /// Add a body with one collider; a mass of zero makes it fixed
    ///
    /// The body starts at the motion state's transform.
    pub fn add_rigid_body(
        &mut self,
        shape: &CollisionShape,
        mass: f32,
        motion_state: Box<dyn MotionState>,
    ) -> RigidBodyHandle {
        let position = motion_state.get_world_transform();
        let body = if mass > 0.0 {
            RigidBodyBuilder::dynamic()
        } else {
            RigidBodyBuilder::fixed()
        }
        .position(position)
        .build();

        let handle = self.bodies.insert(body);
        let mut collider = ColliderBuilder::new(shape.to_shared_shape());
        if mass > 0.0 {
            collider = collider.mass(mass);
        }
        self.colliders.insert_with_parent(collider.build(), handle, &mut self.bodies);
        self.motion_states.insert(handle, motion_state);

        debug!("Added {} body with mass {mass}", shape.kind());
        handle
    }

    /// Remove a body and its colliders, handing back its motion state
    pub fn remove_rigid_body(&mut self, handle: RigidBodyHandle) -> Option<Box<dyn MotionState>> {
        self.bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        self.motion_states.remove(&handle)
    }

    /// Current transform of a body
    pub fn body_transform(&self, handle: RigidBodyHandle) -> Option<Iso3> {
        self.bodies.get(handle).map(|body| *body.position())
    }

    /// Number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of collider pairs currently touching
    pub fn contact_pair_count(&self) -> usize {
        self.narrow_phase
            .contact_pairs()
            .filter(|pair| pair.has_any_active_contact)
            .count()
    }

    fn sync_motion_states(&mut self) {
        for (handle, motion_state) in &mut self.motion_states {
            if let Some(body) = self.bodies.get(*handle) {
                if body.is_dynamic() && !body.is_sleeping() {
                    motion_state.set_world_transform(body.position());
                }
            }
        }
    }

    fn draw_collider_bounds(&self, drawer: &mut dyn DebugDraw, modes: DebugDrawModes) {
        for (_, collider) in self.colliders.iter() {
            if modes.contains(DebugDrawModes::WIREFRAME) {
                let is_dynamic = collider
                    .parent()
                    .and_then(|parent| self.bodies.get(parent))
                    .is_some_and(RigidBody::is_dynamic);
                let colour = Vec3::from(if is_dynamic { DYNAMIC_COLOUR } else { FIXED_COLOUR });

                let local = collider.shape().compute_local_aabb();
                let transform = collider.position() * Translation3::from(local.center().coords);
                drawer.draw_box(&local.half_extents(), &transform, &colour);
            }

            if modes.contains(DebugDrawModes::AABB) {
                let aabb = collider.compute_aabb();
                drawer.draw_aabb(&aabb.mins, &aabb.maxs, &Vec3::from(AABB_COLOUR));
            }
        }
    }

    fn draw_contacts(&self, drawer: &mut dyn DebugDraw) {
        let colour = Vec3::from(CONTACT_COLOUR);
        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact {
                continue;
            }
            let Some(collider) = self.colliders.get(pair.collider1) else {
                continue;
            };

            for manifold in &pair.manifolds {
                for contact in &manifold.points {
                    let point = collider.position() * contact.local_p1;
                    drawer.draw_contact_point(&point, &manifold.data.normal, contact.dist, 0, &colour);
                }
            }
        }
    }
}

impl DynamicsWorld for RapierWorld {
    fn step_simulation(&mut self, time_step: f32, max_sub_steps: u32) -> u32 {
        let fixed = self.integration_parameters.dt;
        self.time_accumulator += time_step;

        let mut sub_steps = 0;
        while self.time_accumulator >= fixed && sub_steps < max_sub_steps {
            self.physics_pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                None,
                &(),
                &(),
            );
            self.time_accumulator -= fixed;
            sub_steps += 1;
        }

        if sub_steps == max_sub_steps && self.time_accumulator >= fixed {
            trace!("Dropping {:.4}s of simulated time", self.time_accumulator);
            self.time_accumulator %= fixed;
        }

        if sub_steps > 0 {
            self.sync_motion_states();
        }
        sub_steps
    }

    fn debug_draw_world(&mut self, drawer: &mut dyn DebugDraw) {
        let modes = drawer.debug_mode();
        if modes.intersects(DebugDrawModes::WIREFRAME | DebugDrawModes::AABB) {
            self.draw_collider_bounds(drawer, modes);
        }
        if modes.contains(DebugDrawModes::CONTACT_POINTS) {
            self.draw_contacts(drawer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use physbridge::physics::DefaultMotionState;
    use rapier3d::parry::shape::Ball;

    #[test]
    fn test_fixed_step_accumulates_frame_time() {
        let mut world = RapierWorld::new(Vec3::new(0.0, -9.8, 0.0), 0.01);
        assert_eq!(world.step_simulation(0.005, 4), 0);
        assert_eq!(world.step_simulation(0.016, 4), 2);
        assert_eq!(world.step_simulation(1.0, 4), 4);
    }

    #[test]
    fn test_dynamic_body_falls_and_syncs_its_motion_state() {
        let mut world = RapierWorld::new(Vec3::new(0.0, -9.8, 0.0), 1.0 / 60.0);
        let start = Iso3::translation(0.0, 10.0, 0.0);
        let shape = CollisionShape::Sphere(Ball::new(0.5));
        let handle = world.add_rigid_body(&shape, 1.0, Box::new(DefaultMotionState::new(start, Iso3::identity())));

        for _ in 0..30 {
            world.step_simulation(1.0 / 60.0, 1);
        }

        let body = world.body_transform(handle).unwrap();
        assert!(body.translation.y < 10.0);

        let state = world.remove_rigid_body(handle).unwrap();
        assert_relative_eq!(state.get_world_transform(), body, epsilon = 1e-5);
        assert_eq!(world.body_count(), 0);
    }
}
