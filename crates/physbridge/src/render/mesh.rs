//! Meshes, entities and renderables
//!
//! A [`Mesh`] is shared resource data: an optional block of vertices shared by
//! several sub-meshes plus the sub-meshes themselves. An [`Entity`] is one
//! instance of a mesh placed under a scene node; for skeletally animated
//! meshes it may also carry the software-skinned vertex data of its current
//! pose.

use std::rc::{Rc, Weak};
use std::sync::Arc;

use super::scene_node::{NodeRef, WeakNodeRef};
use super::vertex_data::{IndexData, VertexData};

/// Maps a vertex's blend index to a skeleton bone handle
pub type BlendIndexMap = Vec<u16>;

/// A part of a mesh drawn with one material
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    /// Name for diagnostics
    pub name: String,
    /// Whether indices reference the mesh's shared vertex data
    pub use_shared_vertices: bool,
    /// Dedicated vertex data (ignored when `use_shared_vertices` is set)
    pub vertex_data: Option<VertexData>,
    /// Triangle list indices
    pub index_data: IndexData,
    /// Blend index to bone handle map for dedicated vertex data
    pub blend_index_to_bone_index_map: BlendIndexMap,
}

impl SubMesh {
    /// A sub-mesh with its own vertex data
    pub fn with_vertices(name: impl Into<String>, vertex_data: VertexData, index_data: IndexData) -> Self {
        Self {
            name: name.into(),
            use_shared_vertices: false,
            vertex_data: Some(vertex_data),
            index_data,
            blend_index_to_bone_index_map: Vec::new(),
        }
    }

    /// A sub-mesh indexing into the mesh's shared vertex data
    pub fn shared(name: impl Into<String>, index_data: IndexData) -> Self {
        Self {
            name: name.into(),
            use_shared_vertices: true,
            vertex_data: None,
            index_data,
            blend_index_to_bone_index_map: Vec::new(),
        }
    }

    /// Set the blend index to bone handle map
    #[must_use]
    pub fn with_bone_map(mut self, map: BlendIndexMap) -> Self {
        self.blend_index_to_bone_index_map = map;
        self
    }
}

/// Mesh resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Resource name
    pub name: String,
    /// Vertex data shared between sub-meshes
    pub shared_vertex_data: Option<VertexData>,
    /// Blend index to bone handle map for the shared vertex data
    pub shared_blend_index_to_bone_index_map: BlendIndexMap,
    /// Sub-meshes, in draw order
    pub sub_meshes: Vec<SubMesh>,
    /// Skeleton driving this mesh, if any
    pub skeleton_name: Option<String>,
}

impl Mesh {
    /// Create an empty mesh
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the shared vertex data
    #[must_use]
    pub fn with_shared_vertices(mut self, vertex_data: VertexData) -> Self {
        self.shared_vertex_data = Some(vertex_data);
        self
    }

    /// Append a sub-mesh
    #[must_use]
    pub fn with_sub_mesh(mut self, sub_mesh: SubMesh) -> Self {
        self.sub_meshes.push(sub_mesh);
        self
    }

    /// Whether a skeleton animates this mesh
    pub fn has_skeleton(&self) -> bool {
        self.skeleton_name.is_some()
    }

    /// Total vertices across shared and dedicated vertex data
    pub fn vertex_count(&self) -> usize {
        let shared = self.shared_vertex_data.as_ref().map_or(0, |v| v.vertex_count);
        let dedicated: usize = self
            .sub_meshes
            .iter()
            .filter(|s| !s.use_shared_vertices)
            .filter_map(|s| s.vertex_data.as_ref())
            .map(|v| v.vertex_count)
            .sum();
        shared + dedicated
    }
}

/// Per-instance state of one sub-mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubEntity {
    skel_anim_vertex_data: Option<VertexData>,
}

impl SubEntity {
    /// Software-skinned vertex data for the current pose
    pub fn skel_anim_vertex_data(&self) -> Option<&VertexData> {
        self.skel_anim_vertex_data.as_ref()
    }
}

/// One placed instance of a mesh
#[derive(Debug, Clone)]
pub struct Entity {
    mesh: Arc<Mesh>,
    parent: Option<WeakNodeRef>,
    skel_anim_vertex_data: Option<VertexData>,
    sub_entities: Vec<SubEntity>,
}

impl Entity {
    /// Instantiate a mesh
    pub fn new(mesh: Arc<Mesh>) -> Self {
        let sub_entities = vec![SubEntity::default(); mesh.sub_meshes.len()];
        Self {
            mesh,
            parent: None,
            skel_anim_vertex_data: None,
            sub_entities,
        }
    }

    /// The instanced mesh
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Attach to (or detach from) a scene node
    pub fn attach_to(&mut self, node: Option<&NodeRef>) {
        self.parent = node.map(Rc::downgrade);
    }

    /// Node this entity hangs from, if it is still alive
    pub fn parent_node(&self) -> Option<NodeRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Sub-entity state
    pub fn sub_entity(&self, index: usize) -> Option<&SubEntity> {
        self.sub_entities.get(index)
    }

    /// Whether a skeleton animates this entity
    pub fn has_skeleton(&self) -> bool {
        self.mesh.has_skeleton()
    }

    /// Software-skinned shared vertex data for the current pose
    pub fn skel_anim_vertex_data(&self) -> Option<&VertexData> {
        self.skel_anim_vertex_data.as_ref()
    }

    /// Store the software-skinned pose: shared data plus one entry per sub-mesh
    pub fn set_skinned_pose(&mut self, shared: Option<VertexData>, per_sub_mesh: Vec<Option<VertexData>>) {
        self.skel_anim_vertex_data = shared;
        for (sub_entity, data) in self.sub_entities.iter_mut().zip(per_sub_mesh) {
            sub_entity.skel_anim_vertex_data = data;
        }
    }

    /// One sub-entity as a standalone renderable
    pub fn renderable(&self, index: usize) -> Option<SubEntityRenderable<'_>> {
        (index < self.sub_entities.len()).then_some(SubEntityRenderable { entity: self, index })
    }
}

/// What a renderable hands to the render system for drawing
#[derive(Debug, Clone, Copy)]
pub struct RenderOperation<'a> {
    /// Vertex source
    pub vertex_data: &'a VertexData,
    /// Triangle list indices, if the geometry is indexed
    pub index_data: Option<&'a IndexData>,
}

/// Anything that can be drawn with a single render operation
pub trait Renderable {
    /// Geometry of this renderable, if it has any
    fn render_operation(&self) -> Option<RenderOperation<'_>>;
}

/// A sub-entity viewed as a renderable
#[derive(Debug, Clone, Copy)]
pub struct SubEntityRenderable<'a> {
    entity: &'a Entity,
    index: usize,
}

impl Renderable for SubEntityRenderable<'_> {
    fn render_operation(&self) -> Option<RenderOperation<'_>> {
        let mesh = self.entity.mesh();
        let sub_mesh = mesh.sub_meshes.get(self.index)?;
        let vertex_data = if sub_mesh.use_shared_vertices {
            mesh.shared_vertex_data.as_ref()?
        } else {
            sub_mesh.vertex_data.as_ref()?
        };

        Some(RenderOperation {
            vertex_data,
            index_data: Some(&sub_mesh.index_data),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_part_mesh() -> Mesh {
        let shared = VertexData::from_positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let own = VertexData::from_positions(&[[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0]]);
        Mesh::new("parts")
            .with_shared_vertices(shared)
            .with_sub_mesh(SubMesh::shared("a", IndexData::from_u16(vec![0, 1, 2])))
            .with_sub_mesh(SubMesh::with_vertices("b", own, IndexData::from_u32(vec![0, 1, 2, 2, 1, 3])))
    }

    #[test]
    fn test_vertex_count_includes_shared_and_dedicated() {
        assert_eq!(two_part_mesh().vertex_count(), 7);
    }

    #[test]
    fn test_renderable_picks_the_right_vertex_source() {
        let entity = Entity::new(Arc::new(two_part_mesh()));

        let shared = entity.renderable(0).unwrap();
        let op = shared.render_operation().unwrap();
        assert_eq!(op.vertex_data.vertex_count, 3);

        let own = entity.renderable(1).unwrap();
        let op = own.render_operation().unwrap();
        assert_eq!(op.vertex_data.vertex_count, 4);
        assert_eq!(op.index_data.unwrap().index_count, 6);

        assert!(entity.renderable(2).is_none());
    }
}
