//! Static mesh ingestion
//!
//! Reads the bind pose of entities, meshes or single renderables into one
//! geometry buffer.

use log::{debug, warn};

use super::geometry::VertexIndexToShape;
use super::ConversionError;
use crate::foundation::math::{Mat4, Vec3};
use crate::render::{Entity, IndexData, Mesh, Renderable, VertexData};

/// Converter for non-animated geometry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticMeshToShapeConverter {
    geometry: VertexIndexToShape,
}

impl StaticMeshToShapeConverter {
    /// Create an empty converter; feed it with the `add_*` methods
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a single renderable
    pub fn from_renderable(renderable: &dyn Renderable, transform: Option<Mat4>) -> Result<Self, ConversionError> {
        let mut converter = Self::new();
        converter.add_renderable(renderable, transform)?;
        Ok(converter)
    }

    /// Convert every sub-mesh of an entity, honoring its node's scale
    pub fn from_entity(entity: &Entity, transform: Option<Mat4>) -> Result<Self, ConversionError> {
        let mut converter = Self::new();
        converter.add_entity(entity, transform)?;
        Ok(converter)
    }

    /// Convert every sub-mesh of a mesh resource
    pub fn from_mesh(mesh: &Mesh, transform: Option<Mat4>) -> Result<Self, ConversionError> {
        let mut converter = Self::new();
        converter.add_mesh(mesh, transform)?;
        Ok(converter)
    }

    /// The accumulated geometry and the shape builders over it
    pub fn geometry(&self) -> &VertexIndexToShape {
        &self.geometry
    }

    /// Append an entity's mesh and adopt its parent node's derived scale
    pub fn add_entity(&mut self, entity: &Entity, transform: Option<Mat4>) -> Result<(), ConversionError> {
        self.geometry.set_transform(transform.unwrap_or_else(Mat4::identity));
        let scale = entity
            .parent_node()
            .map_or_else(|| Vec3::new(1.0, 1.0, 1.0), |node| node.borrow().derived_scale());
        self.geometry.set_scale(scale);

        add_mesh_geometry(&mut self.geometry, entity.mesh(), |geometry, vertex_data, _| {
            geometry.add_static_vertex_data(vertex_data)
        })
    }

    /// Append a mesh resource
    pub fn add_mesh(&mut self, mesh: &Mesh, transform: Option<Mat4>) -> Result<(), ConversionError> {
        self.geometry.set_transform(transform.unwrap_or_else(Mat4::identity));
        add_mesh_geometry(&mut self.geometry, mesh, |geometry, vertex_data, _| {
            geometry.add_static_vertex_data(vertex_data)
        })
    }

    /// Append a single renderable's render operation
    pub fn add_renderable(&mut self, renderable: &dyn Renderable, transform: Option<Mat4>) -> Result<(), ConversionError> {
        self.geometry.set_transform(transform.unwrap_or_else(Mat4::identity));

        let Some(operation) = renderable.render_operation() else {
            warn!("Renderable has no render operation; nothing to convert");
            return Ok(());
        };

        let offset = self.geometry.next_index_offset()?;
        let indices = operation
            .index_data
            .map(|index_data| block_indices(index_data, offset, operation.vertex_data))
            .transpose()?;
        self.geometry.add_static_vertex_data(operation.vertex_data)?;
        if let Some(indices) = indices {
            self.geometry.extend_indices(indices);
        }
        Ok(())
    }
}

/// Indices of a vertex block about to be appended at `offset`
///
/// Checked before the block's vertices go in, so a bad index buffer leaves the
/// geometry as it was.
fn block_indices(index_data: &IndexData, offset: u32, vertex_data: &VertexData) -> Result<Vec<u32>, ConversionError> {
    let vertex_count = (offset as usize).saturating_add(vertex_data.vertex_count);
    VertexIndexToShape::rebase_indices(index_data, offset, vertex_count)
}

/// Which vertex block a sub-mesh is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VertexSource {
    /// The mesh's shared vertex data
    Shared,
    /// Vertex data owned by the sub-mesh at this index
    SubMesh(usize),
}

/// Walk a mesh's vertex blocks and sub-meshes in order
///
/// The shared block is appended first; each sub-mesh with its own vertex data
/// is appended next to its indices. `add_vertices` reads one block into the
/// geometry, so static and animated ingestion share the index bookkeeping.
pub(crate) fn add_mesh_geometry<F>(
    geometry: &mut VertexIndexToShape,
    mesh: &Mesh,
    mut add_vertices: F,
) -> Result<(), ConversionError>
where
    F: FnMut(&mut VertexIndexToShape, &VertexData, VertexSource) -> Result<(), ConversionError>,
{
    let shared_offset = match &mesh.shared_vertex_data {
        Some(shared) => {
            let offset = geometry.next_index_offset()?;
            add_vertices(geometry, shared, VertexSource::Shared)?;
            Some(offset)
        }
        None => None,
    };

    for (i, sub_mesh) in mesh.sub_meshes.iter().enumerate() {
        if sub_mesh.use_shared_vertices {
            let Some(offset) = shared_offset else {
                warn!("Sub-mesh '{}' of '{}' uses shared vertices the mesh lacks; skipped", sub_mesh.name, mesh.name);
                continue;
            };
            geometry.add_index_data(&sub_mesh.index_data, offset)?;
        } else if let Some(vertex_data) = &sub_mesh.vertex_data {
            let offset = geometry.next_index_offset()?;
            let indices = block_indices(&sub_mesh.index_data, offset, vertex_data)?;
            add_vertices(geometry, vertex_data, VertexSource::SubMesh(i))?;
            geometry.extend_indices(indices);
        } else {
            warn!("Sub-mesh '{}' of '{}' has no vertex data; skipped", sub_mesh.name, mesh.name);
        }
    }

    debug!(
        "Read mesh '{}': {} vertices, {} triangles so far",
        mesh.name,
        geometry.vertex_count(),
        geometry.triangle_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    use crate::foundation::math::{Quat, Translation3};
    use crate::render::{SceneMemoryType, SceneNode, SubMesh};

    fn shared_and_own_mesh() -> Mesh {
        let shared = VertexData::from_positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let own = VertexData::from_positions(&[[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]]);
        Mesh::new("parts")
            .with_shared_vertices(shared)
            .with_sub_mesh(SubMesh::shared("front", IndexData::from_u16(vec![0, 1, 2])))
            .with_sub_mesh(SubMesh::with_vertices("back", own, IndexData::from_u32(vec![0, 1, 2, 0, 2, 3])))
    }

    #[test]
    fn test_mesh_blocks_are_rebased() {
        let converter = StaticMeshToShapeConverter::from_mesh(&shared_and_own_mesh(), None).unwrap();
        let geometry = converter.geometry();

        assert_eq!(geometry.vertex_count(), 7);
        assert_eq!(geometry.indices(), &[0, 1, 2, 3, 4, 5, 3, 5, 6]);
        assert!(geometry.indices().iter().all(|&i| (i as usize) < geometry.vertex_count()));
    }

    #[test]
    fn test_two_meshes_feed_one_converter() {
        let mesh = shared_and_own_mesh();
        let mut converter = StaticMeshToShapeConverter::new();
        converter.add_mesh(&mesh, None).unwrap();
        converter
            .add_mesh(&mesh, Some(Translation3::new(0.0, 0.0, 5.0).to_homogeneous()))
            .unwrap();

        let geometry = converter.geometry();
        assert_eq!(geometry.vertex_count(), 14);
        assert_eq!(&geometry.indices()[9..12], &[7, 8, 9]);
        assert_relative_eq!(geometry.vertices()[7], Vec3::new(0.0, 0.0, 5.0), epsilon = 1e-6);
    }

    #[test]
    fn test_shared_sub_mesh_without_shared_data_is_skipped() {
        let mesh = Mesh::new("broken").with_sub_mesh(SubMesh::shared("orphan", IndexData::from_u16(vec![0, 1, 2])));
        let converter = StaticMeshToShapeConverter::from_mesh(&mesh, None).unwrap();
        assert_eq!(converter.geometry().index_count(), 0);
    }

    #[test]
    fn test_bad_sub_mesh_indices_leave_geometry_untouched() {
        let mut converter = StaticMeshToShapeConverter::from_mesh(&shared_and_own_mesh(), None).unwrap();
        let before = converter.geometry().clone();

        let far = VertexData::from_positions(&[[40.0, 0.0, 0.0], [0.0, -40.0, 0.0]]);
        let mesh = Mesh::new("dangling").with_sub_mesh(SubMesh::with_vertices(
            "far",
            far,
            IndexData::from_u16(vec![0, 1, 5]),
        ));
        let result = converter.add_mesh(&mesh, None);
        assert!(matches!(
            result,
            Err(ConversionError::IndexOutOfBounds { index: 12, vertex_count: 9 })
        ));

        let geometry = converter.geometry();
        assert_eq!(geometry.vertex_count(), 7);
        assert_eq!(geometry.index_count(), before.index_count());
        assert_relative_eq!(geometry.size(), Vec3::new(1.0, 1.0, 1.0), epsilon = 1e-6);
        assert_relative_eq!(geometry.radius(), 3.0_f32.sqrt(), epsilon = 1e-6);
        assert_eq!(geometry, &before);
    }

    #[test]
    fn test_entity_adopts_node_scale() {
        let root = SceneNode::new_root("root");
        let node = SceneNode::create_child(&root, "player", SceneMemoryType::Dynamic, Vec3::zeros(), Quat::identity());
        node.borrow_mut().set_scale(Vec3::new(2.0, 2.0, 2.0));

        let mut entity = Entity::new(Arc::new(shared_and_own_mesh()));
        entity.attach_to(Some(&node));

        let converter = StaticMeshToShapeConverter::from_entity(&entity, None).unwrap();
        assert_relative_eq!(converter.geometry().scale(), Vec3::new(2.0, 2.0, 2.0));
        let shape = converter.geometry().create_box();
        assert_relative_eq!(shape.as_box().unwrap().half_extents, Vec3::new(1.0, 1.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_renderable_matches_mesh_path() {
        let entity = Entity::new(Arc::new(shared_and_own_mesh()));
        let renderable = entity.renderable(1).unwrap();
        let converter = StaticMeshToShapeConverter::from_renderable(&renderable, None).unwrap();

        assert_eq!(converter.geometry().vertex_count(), 4);
        assert_eq!(converter.geometry().indices(), &[0, 1, 2, 0, 2, 3]);
        assert!(converter.geometry().create_trimesh().is_ok());
    }
}
