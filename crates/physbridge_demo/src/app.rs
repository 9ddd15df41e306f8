//! Demo scene: a player falling onto a ground, plus a posed skinned limb
//!
//! Every physics object keeps its scene node, its collision shape and its
//! body together. Teardown removes bodies first (handing back and dropping
//! their motion states) and only then drops the shapes.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use physbridge::converter::{sanity_check, AnimatedMeshToShapeConverter, BoneBox, BoneHandle, StaticMeshToShapeConverter};
use physbridge::debug::DebugDrawer;
use physbridge::foundation::convert::to_physics;
use physbridge::foundation::math::{Iso3, Quat, Vec3};
use physbridge::physics::{CollisionShape, DefaultMotionState, DynamicsWorld, MotionState, RigidBodyState};
use physbridge::render::{Entity, NodeRef, SceneManager, SceneManagerRef, SceneMemoryType, SceneNode};
use rapier3d::prelude::RigidBodyHandle;

use crate::clock::FrameClock;
use crate::config::DemoConfig;
use crate::meshes::{box_mesh, ground_mesh, skinned_limb};
use crate::rapier_world::RapierWorld;

/// A scene node with a body in the world
struct PhysicsObject {
    name: String,
    node: NodeRef,
    entity: Option<Entity>,
    shape: CollisionShape,
    body: Option<RigidBodyHandle>,
}

/// What a run did
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Frames run
    pub frames: u32,
    /// Physics sub-steps taken across all frames
    pub sub_steps: u64,
    /// Player node's world position at the end
    pub player_position: Vec3,
    /// Debug lines in the last frame
    pub debug_lines: usize,
    /// Collider pairs touching at the end
    pub contact_pairs: usize,
}

/// Owns the scene, the world and everything bridging them
pub struct DemoApp {
    config: DemoConfig,
    scene_manager: SceneManagerRef,
    world: RapierWorld,
    debug_drawer: Option<DebugDrawer>,
    objects: Vec<PhysicsObject>,
    player: NodeRef,
    clock: FrameClock,
}

impl DemoApp {
    /// Build the scene and its bodies
    pub fn new(config: DemoConfig) -> Result<Self> {
        info!("Creating demo scene...");
        let scene_manager = SceneManager::new_shared("Demo");
        let root = scene_manager.borrow().root_scene_node();

        let world = RapierWorld::new(config.physics.gravity, config.physics.fixed_time_step);
        let debug_drawer = DebugDrawer::new(&root, scene_manager.clone(), &config.debug_draw);
        let clock = FrameClock::fixed(config.run.frame_delta);

        let player = SceneNode::create_child(
            &root,
            "Player",
            SceneMemoryType::Dynamic,
            config.scene.player_start,
            Quat::identity(),
        );

        let mut app = Self {
            config,
            scene_manager,
            world,
            debug_drawer: Some(debug_drawer),
            objects: Vec::new(),
            player,
            clock,
        };

        app.create_ground(&root)?;
        app.create_player()?;
        app.create_limb(&root)?;

        info!("Demo scene ready with {} bodies", app.world.body_count());
        Ok(app)
    }

    fn create_ground(&mut self, root: &NodeRef) -> Result<()> {
        let scene = &self.config.scene;
        let mesh = Arc::new(ground_mesh("Ground", scene.ground_size, scene.ground_divisions));
        let node = SceneNode::create_child(root, "Ground", SceneMemoryType::Static, Vec3::zeros(), Quat::identity());
        let mut entity = Entity::new(mesh);
        entity.attach_to(Some(&node));

        let converter = StaticMeshToShapeConverter::from_entity(&entity, None).context("Failed to read ground mesh")?;
        let shape = converter.geometry().create_trimesh().context("Failed to build ground trimesh")?;
        debug!(
            "Ground trimesh: {} vertices, {} triangles",
            converter.geometry().vertex_count(),
            converter.geometry().triangle_count()
        );

        let start = {
            let node = node.borrow();
            to_physics(&node.derived_position(), &node.derived_orientation())
        };
        self.add_object("Ground", node, Some(entity), shape, 0.0, Box::new(DefaultMotionState::new(start, Iso3::identity())));
        Ok(())
    }

    fn create_player(&mut self) -> Result<()> {
        let mesh = Arc::new(box_mesh("Player", self.config.scene.player_half_extents));
        let mut entity = Entity::new(mesh);
        entity.attach_to(Some(&self.player));

        let converter = StaticMeshToShapeConverter::from_entity(&entity, None).context("Failed to read player mesh")?;
        if let Some(renderable) = entity.renderable(0) {
            let single = StaticMeshToShapeConverter::from_renderable(&renderable, None)
                .context("Failed to read player renderable")?;
            let mismatches = sanity_check(converter.geometry(), single.geometry());
            if mismatches > 0 {
                warn!("Player mesh and renderable disagree on {mismatches} entries");
            }
        }

        let shape = converter.geometry().create_sphere();
        let motion_state = RigidBodyState::new(Some(&self.player));
        let node = self.player.clone();
        self.add_object("Player", node, Some(entity), shape, self.config.scene.player_mass, Box::new(motion_state));
        Ok(())
    }

    fn create_limb(&mut self, root: &NodeRef) -> Result<()> {
        let scene = &self.config.scene;
        let limb = skinned_limb("Limb", scene.limb_bend);
        let node = SceneNode::create_child(root, "Limb", SceneMemoryType::Static, scene.limb_position, Quat::identity());

        let mut entity = Entity::new(Arc::new(limb.mesh));
        entity.attach_to(Some(&node));
        entity.set_skinned_pose(None, vec![Some(limb.pose)]);

        let converter = AnimatedMeshToShapeConverter::from_entity(&entity, None).context("Failed to read limb pose")?;
        let limb_transform = Iso3::translation(scene.limb_position.x, scene.limb_position.y, scene.limb_position.z);

        for bone in limb.bones {
            let aligned = converter.create_aligned_box(bone.handle, &bone.position, &bone.orientation);
            let oriented = converter.create_oriented_box(bone.handle, &bone.position, &bone.orientation);
            let (Some(aligned), Some(oriented)) = (aligned, oriented) else {
                warn!("Bone {} controls no vertices; no box built", bone.handle);
                continue;
            };
            log_bone_box(bone.handle, "aligned", &aligned);
            log_bone_box(bone.handle, "oriented", &oriented);

            let bone_node = SceneNode::create_child(
                &node,
                format!("Limb/Bone{}", bone.handle),
                SceneMemoryType::Static,
                oriented.center,
                oriented.orientation,
            );
            let start = limb_transform * to_physics(&oriented.center, &oriented.orientation);
            self.add_object(
                &format!("Bone{}", bone.handle),
                bone_node,
                None,
                oriented.shape,
                0.0,
                Box::new(DefaultMotionState::new(start, Iso3::identity())),
            );
        }
        Ok(())
    }

    fn add_object(
        &mut self,
        name: &str,
        node: NodeRef,
        entity: Option<Entity>,
        shape: CollisionShape,
        mass: f32,
        motion_state: Box<dyn MotionState>,
    ) {
        let body = self.world.add_rigid_body(&shape, mass, motion_state);
        self.objects.push(PhysicsObject {
            name: name.to_string(),
            node,
            entity,
            shape,
            body: Some(body),
        });
    }

    /// Run `frames` frames: step the world, then draw its debug geometry
    pub fn run(&mut self, frames: u32) -> Result<RunSummary> {
        info!("Running {frames} frames");
        let mut sub_steps = 0u64;

        for _ in 0..frames {
            let delta = self.clock.tick();
            sub_steps += u64::from(self.world.step_simulation(delta, self.config.physics.max_sub_steps));

            if let Some(drawer) = self.debug_drawer.as_mut() {
                drawer.step(&mut self.world).context("Debug drawing failed")?;
            }

            let log_every = u64::from(self.config.run.log_every);
            if log_every > 0 && self.clock.frame_count() % log_every == 0 {
                let position = self.player.borrow().derived_position();
                info!(
                    "t = {:.2}s: player at ({:.2}, {:.2}, {:.2}), {} debug lines",
                    self.clock.total_time(),
                    position.x,
                    position.y,
                    position.z,
                    self.debug_line_count()
                );
            }
        }

        let summary = RunSummary {
            frames,
            sub_steps,
            player_position: self.player.borrow().derived_position(),
            debug_lines: self.debug_line_count(),
            contact_pairs: self.world.contact_pair_count(),
        };
        info!("Run finished in {:.3}s real time: {summary:?}", self.clock.real_elapsed());
        Ok(summary)
    }

    /// Toggle debug drawing
    pub fn set_debug_drawing(&mut self, enabled: bool) {
        if let Some(drawer) = self.debug_drawer.as_mut() {
            drawer.set_enabled(enabled);
        }
    }

    /// Lines the debug drawer holds
    pub fn debug_line_count(&self) -> usize {
        self.debug_drawer
            .as_ref()
            .map_or(0, |drawer| drawer.line_drawer().lines().len())
    }

    /// Bodies still in the world
    pub fn body_count(&self) -> usize {
        self.world.body_count()
    }

    /// Scene manager the demo draws into
    pub fn scene_manager(&self) -> &SceneManagerRef {
        &self.scene_manager
    }

    /// Release the scene: bodies, then motion states, then shapes
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.objects.is_empty() && self.debug_drawer.is_none() {
            return;
        }
        info!("Shutting down demo scene...");

        for object in self.objects.iter_mut().rev() {
            if let Some(body) = object.body.take() {
                let motion_state = self.world.remove_rigid_body(body);
                drop(motion_state);
                debug!("Released body for {}", object.name);
            }
        }

        for mut object in self.objects.drain(..).rev() {
            if let Some(entity) = object.entity.as_mut() {
                entity.attach_to(None);
            }
            debug!(
                "Dropping {} shape for {} (node {})",
                object.shape.kind(),
                object.name,
                object.node.borrow().name()
            );
        }

        self.debug_drawer = None;
        info!("Demo scene shut down");
    }
}

impl Drop for DemoApp {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn log_bone_box(bone: BoneHandle, kind: &str, bone_box: &BoneBox) {
    let half_extents = bone_box.shape.as_box().map(|cuboid| cuboid.half_extents);
    info!(
        "Bone {bone} {kind} box: center ({:.2}, {:.2}, {:.2}), half extents {:?}",
        bone_box.center.x, bone_box.center.y, bone_box.center.z, half_extents
    );
}
