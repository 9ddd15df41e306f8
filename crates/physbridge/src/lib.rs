//! # PhysBridge
//!
//! Glue between a scene-graph renderer and a rigid-body physics engine.
//!
//! ## Features
//!
//! - **Mesh to shape conversion**: read static or skinned meshes into a flat
//!   geometry buffer and build spheres, boxes, capsules, cylinders, convex
//!   hulls, triangle meshes and per-bone boxes from it
//! - **Motion states**: push every simulated body transform straight into its
//!   scene node's world transform
//! - **Debug drawing**: batch the physics world's debug lines into one
//!   dynamic line-list primitive per frame
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use physbridge::prelude::*;
//!
//! fn player_shape(entity: &Entity) -> Result<CollisionShape, ConversionError> {
//!     let converter = StaticMeshToShapeConverter::from_entity(entity, None)?;
//!     Ok(converter.geometry().create_sphere())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod render;
pub mod converter;
pub mod physics;
pub mod debug;

/// Common imports for bridge users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        converter::{
            sanity_check, AnimatedMeshToShapeConverter, BoneBox, ConversionError, StaticMeshToShapeConverter,
            VertexIndexToShape,
        },
        debug::{DebugDraw, DebugDrawConfig, DebugDrawModes, DebugDrawer},
        foundation::{
            convert::{to_physics, to_renderer},
            math::{Iso3, Mat4, Point3, Quat, Transform, Vec3, Vec4},
        },
        physics::{CollisionShape, DefaultMotionState, DynamicsWorld, MotionState, RigidBodyState},
        render::{
            Entity, IndexData, Mesh, NodeRef, RenderError, SceneManager, SceneManagerRef, SceneMemoryType, SceneNode,
            SubMesh, VertexData,
        },
    };
}
