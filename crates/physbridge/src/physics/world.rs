//! The dynamics world seen from the bridge

use crate::debug::DebugDraw;

/// A physics world the demo steps and the debug drawer draws
pub trait DynamicsWorld {
    /// Advance the simulation by `time_step` seconds in at most `max_sub_steps`
    /// fixed sub-steps, returning the sub-steps taken
    fn step_simulation(&mut self, time_step: f32, max_sub_steps: u32) -> u32;

    /// Emit the world's debug geometry through `drawer`
    fn debug_draw_world(&mut self, drawer: &mut dyn DebugDraw);
}
