//! Scene ownership: root node, manual objects, resource groups and materials

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use super::hlms::HlmsUnlit;
use super::manual_object::{ManualObject, ManualObjectRef};
use super::scene_node::{NodeRef, SceneNode};

/// Shared handle to a scene manager
pub type SceneManagerRef = Rc<RefCell<SceneManager>>;

/// Owns the scene root and every manual object created through it
#[derive(Debug)]
pub struct SceneManager {
    name: String,
    root: NodeRef,
    manual_objects: Vec<ManualObjectRef>,
    next_object_id: u32,
    resource_groups: BTreeSet<String>,
    hlms_unlit: HlmsUnlit,
}

impl SceneManager {
    /// Create a scene manager with an empty root node
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            root: SceneNode::new_root(format!("{name}/Root")),
            name,
            manual_objects: Vec::new(),
            next_object_id: 0,
            resource_groups: BTreeSet::new(),
            hlms_unlit: HlmsUnlit::new(),
        }
    }

    /// Create a scene manager behind a shared handle
    pub fn new_shared(name: impl Into<String>) -> SceneManagerRef {
        Rc::new(RefCell::new(Self::new(name)))
    }

    /// Scene manager name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root of the scene graph
    pub fn root_scene_node(&self) -> NodeRef {
        Rc::clone(&self.root)
    }

    /// Create a new, unattached manual object
    pub fn create_manual_object(&mut self) -> ManualObjectRef {
        let name = format!("{}/ManualObject{}", self.name, self.next_object_id);
        self.next_object_id += 1;
        log::debug!("Creating manual object '{name}'");

        let object = Rc::new(RefCell::new(ManualObject::new(name)));
        self.manual_objects.push(Rc::clone(&object));
        object
    }

    /// Detach a manual object from its node and stop tracking it
    pub fn destroy_manual_object(&mut self, object: &ManualObjectRef) {
        let parent = object.borrow().parent_node();
        if let Some(node) = parent {
            node.borrow_mut().detach_object(object);
        }
        self.manual_objects.retain(|tracked| !Rc::ptr_eq(tracked, object));
    }

    /// Number of live manual objects
    pub fn manual_object_count(&self) -> usize {
        self.manual_objects.len()
    }

    /// Whether a resource group exists
    pub fn resource_group_exists(&self, group: &str) -> bool {
        self.resource_groups.contains(group)
    }

    /// Create a resource group (no-op if it exists)
    pub fn create_resource_group(&mut self, group: &str) {
        if self.resource_groups.insert(group.to_string()) {
            log::debug!("Created resource group '{group}'");
        }
    }

    /// Unlit material registry
    pub fn hlms_unlit(&self) -> &HlmsUnlit {
        &self.hlms_unlit
    }

    /// Mutable unlit material registry
    pub fn hlms_unlit_mut(&mut self) -> &mut HlmsUnlit {
        &mut self.hlms_unlit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destroy_detaches_from_node() {
        let mut scene = SceneManager::new("Test");
        let root = scene.root_scene_node();
        let object = scene.create_manual_object();
        SceneNode::attach_object(&root, &object);
        assert_eq!(root.borrow().attached_objects().len(), 1);

        scene.destroy_manual_object(&object);
        assert_eq!(root.borrow().attached_objects().len(), 0);
        assert_eq!(scene.manual_object_count(), 0);
        assert!(object.borrow().parent_node().is_none());
    }

    #[test]
    fn test_resource_groups() {
        let mut scene = SceneManager::new("Test");
        assert!(!scene.resource_group_exists("Debug"));
        scene.create_resource_group("Debug");
        scene.create_resource_group("Debug");
        assert!(scene.resource_group_exists("Debug"));
    }
}
