//! Physics-side contracts
//!
//! Collision shapes the converters produce, the motion-state contract the
//! physics engine drives, and the dynamics world the debug drawer queries.

pub mod shape;
pub mod motion_state;
pub mod world;

pub use shape::{Axis, CollisionShape, TriangleMeshData, TrimeshShape};
pub use motion_state::{DefaultMotionState, MotionState, RigidBodyState};
pub use world::DynamicsWorld;
