//! Skeletally animated mesh ingestion and per-bone shapes
//!
//! Vertex positions come from the entity's software-skinned pose when one is
//! available and from the bind pose otherwise. While reading, every vertex
//! whose skinning gives one bone full weight is recorded under that bone;
//! vertices blended between bones are left out of the bone index. The
//! recorded vertices then bound per-bone boxes.

use std::collections::BTreeMap;

use log::{debug, trace};
use parry3d::shape::Cuboid;

use super::geometry::VertexIndexToShape;
use super::static_mesh::{add_mesh_geometry, VertexSource};
use super::ConversionError;
use crate::foundation::math::{Mat4, Quat, Vec3};
use crate::physics::shape::CollisionShape;
use crate::render::{Entity, VertexData, VertexElementSemantic};

/// Skeleton bone identifier
pub type BoneHandle = u16;

/// Vertices fully controlled by each bone, in ingestion space
pub type BoneIndex = BTreeMap<BoneHandle, Vec<Vec3>>;

/// A weight this close to one counts as full influence
const FULL_WEIGHT_EPSILON: f32 = 1e-3;

/// Box fitted around one bone's vertices, in the bone's frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// Box centre, in ingestion space
    pub center: Vec3,
    /// Box axes (the bone orientation)
    pub orientation: Quat,
    /// Half extents along the box axes
    pub half_extents: Vec3,
}

/// A per-bone collision box and where it sits
#[derive(Debug, Clone)]
pub struct BoneBox {
    /// The box shape, scale applied
    pub shape: CollisionShape,
    /// Box centre, in ingestion space
    pub center: Vec3,
    /// Box orientation
    pub orientation: Quat,
}

/// Converter for skinned geometry with per-bone queries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimatedMeshToShapeConverter {
    geometry: VertexIndexToShape,
    bone_index: BoneIndex,
}

impl AnimatedMeshToShapeConverter {
    /// Create an empty converter
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert an entity's current pose
    pub fn from_entity(entity: &Entity, transform: Option<Mat4>) -> Result<Self, ConversionError> {
        let mut converter = Self::new();
        converter.add_entity(entity, transform)?;
        Ok(converter)
    }

    /// The accumulated geometry and the shape builders over it
    pub fn geometry(&self) -> &VertexIndexToShape {
        &self.geometry
    }

    /// Vertices recorded per bone
    pub fn bone_index(&self) -> &BoneIndex {
        &self.bone_index
    }

    /// Append an entity's current pose and adopt its parent node's derived scale
    pub fn add_entity(&mut self, entity: &Entity, transform: Option<Mat4>) -> Result<(), ConversionError> {
        self.geometry.set_transform(transform.unwrap_or_else(Mat4::identity));
        let scale = entity
            .parent_node()
            .map_or_else(|| Vec3::new(1.0, 1.0, 1.0), |node| node.borrow().derived_scale());
        self.geometry.set_scale(scale);

        let mesh = entity.mesh();
        let bone_index = &mut self.bone_index;
        add_mesh_geometry(&mut self.geometry, mesh, |geometry, vertex_data, source| {
            let (blended, index_map) = match source {
                VertexSource::Shared => (
                    entity.skel_anim_vertex_data(),
                    mesh.shared_blend_index_to_bone_index_map.as_slice(),
                ),
                VertexSource::SubMesh(i) => (
                    entity.sub_entity(i).and_then(|sub| sub.skel_anim_vertex_data()),
                    mesh.sub_meshes[i].blend_index_to_bone_index_map.as_slice(),
                ),
            };
            add_animated(geometry, bone_index, vertex_data, blended, index_map)
        })
    }

    /// Append one skinned vertex block
    ///
    /// Positions are read from `blended` (the skinned pose) when given, and
    /// from `vertex_data` otherwise. Bone attribution always reads the blend
    /// indices and weights of `vertex_data`; `index_map` maps blend indices to
    /// bone handles and may be empty when blend indices already are handles.
    pub fn add_animated_vertex_data(
        &mut self,
        vertex_data: &VertexData,
        blended: Option<&VertexData>,
        index_map: &[BoneHandle],
    ) -> Result<(), ConversionError> {
        add_animated(&mut self.geometry, &mut self.bone_index, vertex_data, blended, index_map)
    }

    /// The bone position followed by every vertex the bone fully controls
    ///
    /// `None` when no vertex is attributed to the bone.
    pub fn bone_vertices(&self, bone: BoneHandle, bone_position: &Vec3) -> Option<Vec<Vec3>> {
        let attributed = self.bone_index.get(&bone).filter(|v| !v.is_empty())?;
        let mut vertices = Vec::with_capacity(attributed.len() + 1);
        vertices.push(*bone_position);
        vertices.extend_from_slice(attributed);
        Some(vertices)
    }

    /// Fit a box to the bone's vertices along the bone's axes
    ///
    /// The vertices are projected on the axes around their centroid, and the
    /// centre is then moved to the middle of the projected range.
    pub fn oriented_box(&self, bone: BoneHandle, bone_position: &Vec3, bone_orientation: &Quat) -> Option<OrientedBox> {
        let vertices = self.bone_vertices(bone, bone_position)?;

        #[allow(clippy::cast_precision_loss)]
        let centroid = vertices.iter().sum::<Vec3>() / vertices.len() as f32;
        let axes = [
            bone_orientation * Vec3::x(),
            bone_orientation * Vec3::y(),
            bone_orientation * Vec3::z(),
        ];

        let mut min = Vec3::repeat(f32::MAX);
        let mut max = Vec3::repeat(f32::MIN);
        for vertex in &vertices {
            let diff = vertex - centroid;
            for (k, axis) in axes.iter().enumerate() {
                let projection = diff.dot(axis);
                min[k] = min[k].min(projection);
                max[k] = max[k].max(projection);
            }
        }

        let center = axes
            .iter()
            .enumerate()
            .fold(centroid, |center, (k, axis)| center + axis * ((min[k] + max[k]) * 0.5));

        Some(OrientedBox {
            center,
            orientation: *bone_orientation,
            half_extents: (max - min) * 0.5,
        })
    }

    /// Axis-aligned box bounding the bone's vertices
    ///
    /// The box keeps the ingestion axes whatever the bone's orientation, so
    /// its orientation is always the identity; `_bone_orientation` is only
    /// taken so both per-bone builders share a signature.
    pub fn create_aligned_box(&self, bone: BoneHandle, bone_position: &Vec3, _bone_orientation: &Quat) -> Option<BoneBox> {
        let vertices = self.bone_vertices(bone, bone_position)?;

        let (min, max) = vertices.iter().map(|v| v - bone_position).fold(
            (Vec3::repeat(f32::MAX), Vec3::repeat(f32::MIN)),
            |(min, max), relative| (min.inf(&relative), max.sup(&relative)),
        );

        let half_extents = (max - min) * 0.5;
        let center = bone_position + (min + max) * 0.5;
        trace!("Aligned box for bone {bone}: half extents {half_extents:?}");

        Some(self.bone_box(center, Quat::identity(), half_extents))
    }

    /// Box fitted with [`oriented_box`](Self::oriented_box)
    pub fn create_oriented_box(&self, bone: BoneHandle, bone_position: &Vec3, bone_orientation: &Quat) -> Option<BoneBox> {
        let fitted = self.oriented_box(bone, bone_position, bone_orientation)?;
        trace!("Oriented box for bone {bone}: half extents {:?}", fitted.half_extents);
        Some(self.bone_box(fitted.center, fitted.orientation, fitted.half_extents))
    }

    fn bone_box(&self, center: Vec3, orientation: Quat, half_extents: Vec3) -> BoneBox {
        let scale = self.geometry.scale();
        BoneBox {
            shape: CollisionShape::Box(Cuboid::new(half_extents.component_mul(&scale.abs()))),
            center: center.component_mul(&scale),
            orientation,
        }
    }
}

fn add_animated(
    geometry: &mut VertexIndexToShape,
    bone_index: &mut BoneIndex,
    vertex_data: &VertexData,
    blended: Option<&VertexData>,
    index_map: &[BoneHandle],
) -> Result<(), ConversionError> {
    let positions = match blended {
        Some(blended) => {
            if blended.vertex_count != vertex_data.vertex_count {
                return Err(ConversionError::VertexCountMismatch {
                    expected: vertex_data.vertex_count,
                    found: blended.vertex_count,
                });
            }
            blended.read_positions()?
        }
        None => vertex_data.read_positions()?,
    };

    let owners = bone_owners(vertex_data, index_map)?;
    let appended = geometry.append_positions(positions);

    let mut attributed = 0usize;
    for (vertex, owner) in appended.iter().zip(owners) {
        if let Some(bone) = owner {
            bone_index.entry(bone).or_default().push(*vertex);
            attributed += 1;
        }
    }

    debug!(
        "Read {} skinned vertices, {attributed} attributed to a single bone",
        appended.len()
    );
    Ok(())
}

/// The bone that fully controls each vertex, if exactly one does
fn bone_owners(vertex_data: &VertexData, index_map: &[BoneHandle]) -> Result<Vec<Option<BoneHandle>>, ConversionError> {
    if !vertex_data.has_element(VertexElementSemantic::BlendIndices) {
        trace!("Vertex data has no blend indices; no bone attribution");
        return Ok(vec![None; vertex_data.vertex_count]);
    }

    let blend_indices = vertex_data.read_element(VertexElementSemantic::BlendIndices)?;
    let blend_weights = if vertex_data.has_element(VertexElementSemantic::BlendWeights) {
        Some(vertex_data.read_element(VertexElementSemantic::BlendWeights)?)
    } else {
        None
    };

    let owners = blend_indices
        .iter()
        .enumerate()
        .map(|(i, indices)| {
            let slot = match &blend_weights {
                Some(weights) => {
                    let mut full = weights[i]
                        .iter()
                        .enumerate()
                        .filter(|(_, w)| **w >= 1.0 - FULL_WEIGHT_EPSILON);
                    match (full.next(), full.next()) {
                        (Some((slot, _)), None) => Some(slot),
                        _ => None,
                    }
                }
                None => Some(0),
            }?;
            to_bone_handle(indices[slot], index_map)
        })
        .collect();

    Ok(owners)
}

fn to_bone_handle(blend_index: f32, index_map: &[BoneHandle]) -> Option<BoneHandle> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let blend_index = blend_index.round() as usize;
    if index_map.is_empty() {
        BoneHandle::try_from(blend_index).ok()
    } else {
        index_map.get(blend_index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_4;
    use std::sync::Arc;

    use crate::render::{IndexData, Mesh, SubMesh};

    /// Two bones along +Y: bone 0 owns the lower quad, bone 1 the upper quad,
    /// and the two middle vertices are blended half and half.
    fn limb() -> (VertexData, Vec<BoneHandle>) {
        let positions = [
            [-0.5, 0.0, -0.5],
            [0.5, 0.0, -0.5],
            [0.5, 0.0, 0.5],
            [-0.5, 0.0, 0.5],
            [-0.5, 1.0, 0.0],
            [0.5, 1.0, 0.0],
            [-0.5, 2.0, -0.5],
            [0.5, 2.0, -0.5],
            [0.5, 2.0, 0.5],
            [-0.5, 2.0, 0.5],
        ];
        let indices = [
            [0, 0, 0, 0],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
            [0, 1, 0, 0],
            [0, 1, 0, 0],
            [1, 0, 0, 0],
            [1, 0, 0, 0],
            [1, 0, 0, 0],
            [1, 0, 0, 0],
        ];
        let full = [1.0, 0.0, 0.0, 0.0];
        let half = [0.5, 0.5, 0.0, 0.0];
        let weights = [full, full, full, full, half, half, full, full, full, full];

        // blend index 0 is bone 3, blend index 1 is bone 7
        (VertexData::from_skinned_positions(&positions, &indices, &weights), vec![3, 7])
    }

    #[test]
    fn test_blended_vertices_are_not_attributed() {
        let (data, map) = limb();
        let mut converter = AnimatedMeshToShapeConverter::new();
        converter.add_animated_vertex_data(&data, None, &map).unwrap();

        assert_eq!(converter.geometry().vertex_count(), 10);
        assert_eq!(converter.bone_index()[&3].len(), 4);
        assert_eq!(converter.bone_index()[&7].len(), 4);
        assert!(!converter.bone_index().contains_key(&0));
    }

    #[test]
    fn test_bone_vertices_start_with_bone_position() {
        let (data, map) = limb();
        let mut converter = AnimatedMeshToShapeConverter::new();
        converter.add_animated_vertex_data(&data, None, &map).unwrap();

        let bone_position = Vec3::new(0.0, 2.0, 0.0);
        let vertices = converter.bone_vertices(7, &bone_position).unwrap();
        assert_eq!(vertices.len(), 5);
        assert_relative_eq!(vertices[0], bone_position);
        assert!(converter.bone_vertices(42, &bone_position).is_none());
    }

    #[test]
    fn test_no_box_for_unattributed_bone() {
        let (data, map) = limb();
        let mut converter = AnimatedMeshToShapeConverter::new();
        converter.add_animated_vertex_data(&data, None, &map).unwrap();

        assert!(converter.oriented_box(9, &Vec3::zeros(), &Quat::identity()).is_none());
        assert!(converter.create_aligned_box(9, &Vec3::zeros(), &Quat::identity()).is_none());
        assert!(converter.create_oriented_box(9, &Vec3::zeros(), &Quat::identity()).is_none());
    }

    #[test]
    fn test_aligned_box_ignores_bone_rotation() {
        let (data, map) = limb();
        let mut converter = AnimatedMeshToShapeConverter::new();
        converter.add_animated_vertex_data(&data, None, &map).unwrap();

        let bone_position = Vec3::zeros();
        let orientation = Quat::from_axis_angle(&Vec3::y_axis(), FRAC_PI_4);

        let aligned = converter.create_aligned_box(3, &bone_position, &orientation).unwrap();
        let oriented = converter.create_oriented_box(3, &bone_position, &orientation).unwrap();

        let aligned_half = aligned.shape.as_box().unwrap().half_extents;
        let oriented_half = oriented.shape.as_box().unwrap().half_extents;
        assert_relative_eq!(aligned_half, Vec3::new(0.5, 0.0, 0.5), epsilon = 1e-5);
        assert_relative_eq!(aligned.orientation, Quat::identity());
        assert_relative_eq!(aligned.center, Vec3::zeros(), epsilon = 1e-5);

        // the square ring seen along diagonal axes
        let diagonal = 0.5 * 2.0_f32.sqrt();
        assert_relative_eq!(oriented_half, Vec3::new(diagonal, 0.0, diagonal), epsilon = 1e-5);
        assert_relative_eq!(oriented.orientation, orientation);
        assert_relative_eq!(oriented.center, Vec3::zeros(), epsilon = 1e-5);
    }

    #[test]
    fn test_boxes_differ_for_tilted_bone() {
        let positions = [
            [0.3, -0.2, 1.1],
            [2.4, 0.9, -0.7],
            [-1.3, 2.2, 0.4],
            [0.8, 1.6, 2.9],
            [1.9, -1.1, 1.5],
        ];
        let data = VertexData::from_skinned_positions(&positions, &[[0, 0, 0, 0]; 5], &[[1.0, 0.0, 0.0, 0.0]; 5]);
        let mut converter = AnimatedMeshToShapeConverter::new();
        converter.add_animated_vertex_data(&data, None, &[]).unwrap();

        let bone_position = Vec3::new(0.5, 0.5, 0.5);
        let orientation = Quat::from_euler_angles(0.7, -0.3, 1.2);
        let aligned = converter.create_aligned_box(0, &bone_position, &orientation).unwrap();
        let oriented = converter.create_oriented_box(0, &bone_position, &orientation).unwrap();

        // aligned box: plain min/max over the bone position and its vertices
        let aligned_half = aligned.shape.as_box().unwrap().half_extents;
        assert_relative_eq!(aligned_half, Vec3::new(1.85, 1.65, 1.8), epsilon = 1e-5);
        assert_relative_eq!(aligned.center, Vec3::new(0.55, 0.55, 1.1), epsilon = 1e-5);

        let oriented_half = oriented.shape.as_box().unwrap().half_extents;
        assert!((aligned_half - oriented_half).norm() > 1e-2);
        assert!((aligned.center - oriented.center).norm() > 1e-2);
        assert_relative_eq!(oriented.orientation, orientation);
    }

    #[test]
    fn test_skinned_pose_supplies_positions() {
        let (data, map) = limb();
        let posed_positions: Vec<[f32; 3]> = (0..10).map(|i| [i as f32, 0.0, 0.0]).collect();
        let posed = VertexData::from_positions(&posed_positions);

        let mesh = Mesh::new("limb").with_sub_mesh(
            SubMesh::with_vertices("skin", data, IndexData::from_u16(vec![0, 1, 2])).with_bone_map(map),
        );
        let mut entity = Entity::new(Arc::new(mesh));
        entity.set_skinned_pose(None, vec![Some(posed)]);

        let converter = AnimatedMeshToShapeConverter::from_entity(&entity, None).unwrap();
        assert_relative_eq!(converter.geometry().vertices()[9], Vec3::new(9.0, 0.0, 0.0));
        assert_relative_eq!(converter.bone_index()[&7][0], Vec3::new(6.0, 0.0, 0.0));
        assert_eq!(converter.geometry().triangle_count(), 1);
    }

    #[test]
    fn test_mismatched_pose_is_rejected() {
        let (data, map) = limb();
        let posed = VertexData::from_positions(&[[0.0; 3]; 3]);
        let mut converter = AnimatedMeshToShapeConverter::new();

        let result = converter.add_animated_vertex_data(&data, Some(&posed), &map);
        assert_eq!(result, Err(ConversionError::VertexCountMismatch { expected: 10, found: 3 }));
    }
}
