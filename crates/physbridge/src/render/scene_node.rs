//! Scene graph nodes
//!
//! Nodes are shared, single-threaded handles (`Rc<RefCell<_>>`). Children are
//! owned by their parent; the parent link is weak, and so is any link held by
//! objects that only observe a node (motion states, entities).

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::manual_object::ManualObjectRef;
use crate::foundation::math::{Quat, Transform, Vec3};

/// Shared handle to a scene node
pub type NodeRef = Rc<RefCell<SceneNode>>;

/// Non-owning handle to a scene node
pub type WeakNodeRef = Weak<RefCell<SceneNode>>;

/// Whether a node is expected to move every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneMemoryType {
    /// Moves rarely or never
    Static,
    /// Moves every frame
    Dynamic,
}

/// A node in the scene graph
#[derive(Debug)]
pub struct SceneNode {
    name: String,
    memory_type: SceneMemoryType,
    parent: Option<WeakNodeRef>,
    children: Vec<NodeRef>,
    local: Transform,
    attached: Vec<ManualObjectRef>,
}

impl SceneNode {
    /// Create a parentless root node
    pub fn new_root(name: impl Into<String>) -> NodeRef {
        Rc::new(RefCell::new(Self {
            name: name.into(),
            memory_type: SceneMemoryType::Dynamic,
            parent: None,
            children: Vec::new(),
            local: Transform::identity(),
            attached: Vec::new(),
        }))
    }

    /// Create a child of `parent` with the given local position and orientation
    pub fn create_child(
        parent: &NodeRef,
        name: impl Into<String>,
        memory_type: SceneMemoryType,
        position: Vec3,
        orientation: Quat,
    ) -> NodeRef {
        let child = Rc::new(RefCell::new(Self {
            name: name.into(),
            memory_type,
            parent: Some(Rc::downgrade(parent)),
            children: Vec::new(),
            local: Transform::from_position_rotation(position, orientation),
            attached: Vec::new(),
        }));
        parent.borrow_mut().children.push(Rc::clone(&child));
        child
    }

    /// Attach a manual object to `node`
    pub fn attach_object(node: &NodeRef, object: &ManualObjectRef) {
        object.borrow_mut().set_parent(Some(Rc::downgrade(node)));
        node.borrow_mut().attached.push(Rc::clone(object));
    }

    /// Detach a manual object; returns whether it was attached here
    pub fn detach_object(&mut self, object: &ManualObjectRef) -> bool {
        let before = self.attached.len();
        self.attached.retain(|attached| !Rc::ptr_eq(attached, object));
        let detached = self.attached.len() != before;
        if detached {
            object.borrow_mut().set_parent(None);
        }
        detached
    }

    /// Node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Static or dynamic
    pub fn memory_type(&self) -> SceneMemoryType {
        self.memory_type
    }

    /// Parent node, if it is still alive
    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Child nodes
    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// Objects attached to this node
    pub fn attached_objects(&self) -> &[ManualObjectRef] {
        &self.attached
    }

    /// Position relative to the parent
    pub fn position(&self) -> Vec3 {
        self.local.position
    }

    /// Orientation relative to the parent
    pub fn orientation(&self) -> Quat {
        self.local.rotation
    }

    /// Scale relative to the parent
    pub fn scale(&self) -> Vec3 {
        self.local.scale
    }

    /// Set the position relative to the parent
    pub fn set_position(&mut self, position: Vec3) {
        self.local.position = position;
    }

    /// Set the orientation relative to the parent
    pub fn set_orientation(&mut self, orientation: Quat) {
        self.local.rotation = orientation;
    }

    /// Set the scale relative to the parent
    pub fn set_scale(&mut self, scale: Vec3) {
        self.local.scale = scale;
    }

    /// The parent's world transform (identity for roots)
    fn parent_derived(&self) -> Transform {
        self.parent()
            .map_or_else(Transform::identity, |parent| parent.borrow().derived_transform())
    }

    /// World transform, composed up the parent chain
    pub fn derived_transform(&self) -> Transform {
        self.parent_derived().combine(&self.local)
    }

    /// World-space position
    pub fn derived_position(&self) -> Vec3 {
        self.derived_transform().position
    }

    /// World-space orientation
    pub fn derived_orientation(&self) -> Quat {
        self.derived_transform().rotation
    }

    /// World-space scale
    pub fn derived_scale(&self) -> Vec3 {
        self.derived_transform().scale
    }

    /// Place the node at a world-space position, whatever its parent does
    pub fn set_derived_position(&mut self, position: Vec3) {
        self.local.position = self.parent_derived().inverse_transform_point(&position);
    }

    /// Orient the node in world space, whatever its parent does
    pub fn set_derived_orientation(&mut self, orientation: Quat) {
        self.local.rotation = self.parent_derived().rotation.inverse() * orientation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rotated_scaled_parent() -> (NodeRef, NodeRef) {
        let root = SceneNode::new_root("root");
        let parent = SceneNode::create_child(
            &root,
            "parent",
            SceneMemoryType::Dynamic,
            Vec3::new(3.0, -2.0, 1.0),
            Quat::from_axis_angle(&Vec3::z_axis(), 0.9),
        );
        parent.borrow_mut().set_scale(Vec3::new(2.0, 0.5, 1.5));
        (root, parent)
    }

    #[test]
    fn test_derived_transform_composes_parent_chain() {
        let (_root, parent) = rotated_scaled_parent();
        let child = SceneNode::create_child(
            &parent,
            "child",
            SceneMemoryType::Dynamic,
            Vec3::new(1.0, 0.0, 0.0),
            Quat::identity(),
        );

        let expected = parent.borrow().derived_transform().transform_point(&Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(child.borrow().derived_position(), expected, epsilon = 1e-5);
        assert_relative_eq!(child.borrow().derived_scale(), Vec3::new(2.0, 0.5, 1.5), epsilon = 1e-6);
    }

    #[test]
    fn test_derived_setters_read_back_exactly_under_transformed_parent() {
        let (_root, parent) = rotated_scaled_parent();
        let child = SceneNode::create_child(&parent, "child", SceneMemoryType::Dynamic, Vec3::zeros(), Quat::identity());

        let position = Vec3::new(-7.0, 4.0, 0.25);
        let orientation = Quat::from_axis_angle(&Vec3::y_axis(), -1.1);
        child.borrow_mut().set_derived_orientation(orientation);
        child.borrow_mut().set_derived_position(position);

        assert_relative_eq!(child.borrow().derived_position(), position, epsilon = 1e-4);
        assert_relative_eq!(child.borrow().derived_orientation(), orientation, epsilon = 1e-5);
    }

    #[test]
    fn test_children_keep_weak_parent() {
        let root = SceneNode::new_root("root");
        let child = SceneNode::create_child(&root, "child", SceneMemoryType::Static, Vec3::zeros(), Quat::identity());
        assert!(child.borrow().parent().is_some());
        assert_eq!(root.borrow().children().len(), 1);

        drop(root);
        assert!(child.borrow().parent().is_none());
    }
}
