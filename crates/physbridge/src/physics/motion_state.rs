//! Motion states: how rigid bodies report their transforms
//!
//! The physics engine asks a body's motion state for the initial transform and
//! hands it the new transform after every step. [`RigidBodyState`] forwards the
//! transform straight into a scene node's world transform.

use std::rc::{Rc, Weak};

use log::trace;

use crate::foundation::convert::{to_physics, to_renderer};
use crate::foundation::math::Iso3;
use crate::render::{NodeRef, WeakNodeRef};

/// The physics engine's motion-state contract
pub trait MotionState {
    /// Transform of the body's center of mass
    fn get_world_transform(&self) -> Iso3;

    /// Receive the body's new center-of-mass transform after a step
    fn set_world_transform(&mut self, transform: &Iso3);
}

/// Motion state that only stores the transform (used for static bodies)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultMotionState {
    graphics_world_transform: Iso3,
    center_of_mass_offset: Iso3,
    start_world_transform: Iso3,
}

impl Default for DefaultMotionState {
    fn default() -> Self {
        Self::new(Iso3::identity(), Iso3::identity())
    }
}

impl DefaultMotionState {
    /// Start at `start` with the given center-of-mass offset
    pub fn new(start: Iso3, center_of_mass_offset: Iso3) -> Self {
        Self {
            graphics_world_transform: start,
            center_of_mass_offset,
            start_world_transform: start,
        }
    }

    /// Transform of the graphics object (center of mass offset applied)
    pub fn graphics_world_transform(&self) -> Iso3 {
        self.graphics_world_transform
    }

    /// Transform this state started at
    pub fn start_world_transform(&self) -> Iso3 {
        self.start_world_transform
    }
}

impl MotionState for DefaultMotionState {
    fn get_world_transform(&self) -> Iso3 {
        self.graphics_world_transform * self.center_of_mass_offset.inverse()
    }

    fn set_world_transform(&mut self, transform: &Iso3) {
        self.graphics_world_transform = transform * self.center_of_mass_offset;
    }
}

/// Motion state bound to a scene node
///
/// The node is held weakly; once it is gone (or before one is bound) the state
/// still records transforms but has nowhere to push them.
#[derive(Debug, Clone)]
pub struct RigidBodyState {
    transform: Iso3,
    center_of_mass_offset: Iso3,
    node: Option<WeakNodeRef>,
}

impl RigidBodyState {
    /// Bind to `node`, starting at the node's local position and orientation
    pub fn new(node: Option<&NodeRef>) -> Self {
        let transform = node.map_or_else(Iso3::identity, |node| {
            let node = node.borrow();
            to_physics(&node.position(), &node.orientation())
        });
        Self::with_transforms(node, transform, Iso3::identity())
    }

    /// Bind to `node` with an explicit starting transform and center-of-mass offset
    pub fn with_transforms(node: Option<&NodeRef>, transform: Iso3, center_of_mass_offset: Iso3) -> Self {
        Self {
            transform,
            center_of_mass_offset,
            node: node.map(Rc::downgrade),
        }
    }

    /// Rebind to another node (or none); the stored transform is kept
    pub fn set_node(&mut self, node: Option<&NodeRef>) {
        self.node = node.map(Rc::downgrade);
    }

    /// The bound node, if there is one and it is still alive
    pub fn node(&self) -> Option<NodeRef> {
        self.node.as_ref().and_then(Weak::upgrade)
    }

    /// Offset between the body's center of mass and the node
    pub fn center_of_mass_offset(&self) -> Iso3 {
        self.center_of_mass_offset
    }
}

impl MotionState for RigidBodyState {
    fn get_world_transform(&self) -> Iso3 {
        self.transform
    }

    fn set_world_transform(&mut self, transform: &Iso3) {
        self.transform = *transform;

        let Some(node) = self.node() else {
            trace!("Motion state has no node; transform recorded only");
            return;
        };

        let (position, orientation) = to_renderer(&(transform * self.center_of_mass_offset));
        let mut node = node.borrow_mut();
        node.set_derived_orientation(orientation);
        node.set_derived_position(position);
    }
}
