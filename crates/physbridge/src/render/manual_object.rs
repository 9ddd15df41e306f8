//! Manually built render geometry
//!
//! A manual object is filled section by section: `begin` opens a section with
//! a datablock and a primitive topology, `position`/`colour`/`index` feed it,
//! and `end` commits it. `clear` drops all committed geometry but keeps the
//! object itself (and its attachment) alive.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::scene_node::{SceneNode, WeakNodeRef};
use crate::foundation::math::{Vec3, Vec4};

/// Shared handle to a manual object
pub type ManualObjectRef = Rc<RefCell<ManualObject>>;

/// Primitive topology of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    /// Independent points
    PointList,
    /// Independent segments, two indices each
    LineList,
    /// Connected segments
    LineStrip,
    /// Independent triangles, three indices each
    TriangleList,
}

/// One vertex of a manual section
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualVertex {
    /// Position in the parent node's space
    pub position: Vec3,
    /// RGBA colour
    pub colour: Vec4,
}

/// A committed run of geometry sharing one datablock and topology
#[derive(Debug, Clone, PartialEq)]
pub struct ManualSection {
    datablock: String,
    operation: OperationType,
    vertices: Vec<ManualVertex>,
    indices: Vec<u32>,
}

impl ManualSection {
    /// Datablock (material) name
    pub fn datablock(&self) -> &str {
        &self.datablock
    }

    /// Topology
    pub fn operation(&self) -> OperationType {
        self.operation
    }

    /// Vertices
    pub fn vertices(&self) -> &[ManualVertex] {
        &self.vertices
    }

    /// Indices
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

/// Dynamic geometry built from code
#[derive(Debug)]
pub struct ManualObject {
    name: String,
    sections: Vec<ManualSection>,
    building: Option<ManualSection>,
    cast_shadows: bool,
    parent: Option<WeakNodeRef>,
}

impl ManualObject {
    /// Create an empty manual object
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sections: Vec::new(),
            building: None,
            cast_shadows: true,
            parent: None,
        }
    }

    /// Object name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open a new section
    pub fn begin(&mut self, datablock: &str, operation: OperationType) {
        if self.building.is_some() {
            log::warn!("ManualObject '{}': begin() while a section is open, discarding it", self.name);
        }
        self.building = Some(ManualSection {
            datablock: datablock.to_string(),
            operation,
            vertices: Vec::new(),
            indices: Vec::new(),
        });
    }

    /// Add a vertex to the open section (white until [`ManualObject::colour`] is called)
    pub fn position(&mut self, position: Vec3) {
        match self.building.as_mut() {
            Some(section) => section.vertices.push(ManualVertex {
                position,
                colour: Vec4::new(1.0, 1.0, 1.0, 1.0),
            }),
            None => log::warn!("ManualObject '{}': position() outside begin()/end()", self.name),
        }
    }

    /// Set the colour of the most recently added vertex
    pub fn colour(&mut self, colour: Vec4) {
        if let Some(vertex) = self.building.as_mut().and_then(|s| s.vertices.last_mut()) {
            vertex.colour = colour;
        } else {
            log::warn!("ManualObject '{}': colour() without a vertex", self.name);
        }
    }

    /// Add an index to the open section
    pub fn index(&mut self, index: u32) {
        match self.building.as_mut() {
            Some(section) => section.indices.push(index),
            None => log::warn!("ManualObject '{}': index() outside begin()/end()", self.name),
        }
    }

    /// Commit the open section
    pub fn end(&mut self) {
        match self.building.take() {
            Some(section) => self.sections.push(section),
            None => log::warn!("ManualObject '{}': end() without begin()", self.name),
        }
    }

    /// Drop all geometry, keeping the object
    pub fn clear(&mut self) {
        self.sections.clear();
        self.building = None;
    }

    /// Committed sections
    pub fn sections(&self) -> &[ManualSection] {
        &self.sections
    }

    /// Total committed vertices
    pub fn vertex_count(&self) -> usize {
        self.sections.iter().map(|s| s.vertices.len()).sum()
    }

    /// Total committed indices
    pub fn index_count(&self) -> usize {
        self.sections.iter().map(|s| s.indices.len()).sum()
    }

    /// Whether the object casts shadows
    pub fn cast_shadows(&self) -> bool {
        self.cast_shadows
    }

    /// Enable or disable shadow casting
    pub fn set_cast_shadows(&mut self, cast_shadows: bool) {
        self.cast_shadows = cast_shadows;
    }

    /// Node this object is attached to, if any
    pub fn parent_node(&self) -> Option<Rc<RefCell<SceneNode>>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn set_parent(&mut self, parent: Option<WeakNodeRef>) {
        self.parent = parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_collect_vertices_and_indices() {
        let mut object = ManualObject::new("lines");
        object.begin("Unlit", OperationType::LineList);
        object.position(Vec3::zeros());
        object.colour(Vec4::new(1.0, 0.0, 0.0, 1.0));
        object.index(0);
        object.position(Vec3::x());
        object.index(1);
        object.end();

        assert_eq!(object.sections().len(), 1);
        let section = &object.sections()[0];
        assert_eq!(section.operation(), OperationType::LineList);
        assert_eq!(section.indices(), &[0, 1]);
        assert_eq!(section.vertices()[0].colour, Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(section.vertices()[1].colour, Vec4::new(1.0, 1.0, 1.0, 1.0));

        object.clear();
        assert_eq!(object.vertex_count(), 0);
        assert_eq!(object.index_count(), 0);
    }

    #[test]
    fn test_feeding_outside_a_section_is_ignored() {
        let mut object = ManualObject::new("stray");
        object.position(Vec3::zeros());
        object.index(0);
        object.end();
        assert!(object.sections().is_empty());
    }
}
