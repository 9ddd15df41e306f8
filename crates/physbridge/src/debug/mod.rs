//! Debug drawing of the physics world
//!
//! The physics world reports its debug geometry through the [`DebugDraw`]
//! callbacks; [`DebugDrawer`] implements them and batches the segments into a
//! single line-list primitive per frame with [`LineDrawer`].

pub mod draw;
pub mod line_drawer;
pub mod debug_drawer;

pub use draw::{DebugDraw, DebugDrawModes};
pub use line_drawer::{Line, LineDrawer};
pub use debug_drawer::{
    DebugDrawConfig, DebugDrawer, DEFAULT_CONTACT_NORMAL_SCALE, DEFAULT_DATABLOCK_NAME, DEFAULT_RESOURCE_GROUP,
};
