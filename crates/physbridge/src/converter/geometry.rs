//! The flat geometry buffer shared by both converters
//!
//! Vertices are stored after applying the ingestion transform; bounds are kept
//! up to date as vertices arrive. The accumulated scale is not applied to the
//! stored vertices, only to the shapes built from them.

use log::{debug, info, warn};
use parry3d::shape::{Ball, Capsule, ConvexPolyhedron, Cuboid, Cylinder};

use super::ConversionError;
use crate::foundation::math::{max_components, min_components, transform_position, Mat4, Point3, Vec3};
use crate::physics::shape::{Axis, CollisionShape, TriangleMeshData, TrimeshShape};
use crate::render::{IndexData, VertexData};

const HULL_EPSILON: f32 = 1e-6;

/// Owned vertex and index arrays plus cached bounds
#[derive(Debug, Clone, PartialEq)]
pub struct VertexIndexToShape {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
    bounds: Option<(Vec3, Vec3)>,
    radius: f32,
    transform: Mat4,
    scale: Vec3,
}

impl Default for VertexIndexToShape {
    fn default() -> Self {
        Self::new(Mat4::identity())
    }
}

impl VertexIndexToShape {
    /// Create an empty buffer that transforms incoming vertices by `transform`
    pub fn new(transform: Mat4) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            bounds: None,
            radius: 0.0,
            transform,
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    /// Transform applied to vertices as they are ingested
    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    /// Change the ingestion transform; already stored vertices are untouched
    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    /// Non-uniform scale baked into created shapes
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Set the non-uniform scale baked into created shapes
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Ingested vertices, in transformed space
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Number of ingested vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Ingested triangle indices
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of ingested indices (always a multiple of three)
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Number of ingested triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// The vertex count as the offset for the next block of indices
    pub fn next_index_offset(&self) -> Result<u32, ConversionError> {
        u32::try_from(self.vertices.len()).map_err(|_| ConversionError::TooManyVertices(self.vertices.len()))
    }

    /// Append the positions of a non-animated vertex stream
    pub fn add_static_vertex_data(&mut self, vertex_data: &VertexData) -> Result<(), ConversionError> {
        let positions = vertex_data.read_positions()?;
        self.append_positions(positions);
        Ok(())
    }

    /// Transform and append positions, returning the appended (transformed) vertices
    pub(crate) fn append_positions(&mut self, positions: Vec<Vec3>) -> &[Vec3] {
        let first = self.vertices.len();
        self.vertices.reserve(positions.len());

        for position in positions {
            let vertex = transform_position(&self.transform, &position);
            self.bounds = Some(match self.bounds {
                Some((min, max)) => (min_components(&min, &vertex), max_components(&max, &vertex)),
                None => (vertex, vertex),
            });
            self.radius = self.radius.max(vertex.norm());
            self.vertices.push(vertex);
        }

        &self.vertices[first..]
    }

    /// Append the whole triangles of `index_data`, each index rebased by `offset`
    ///
    /// Every rebased index must reference an already ingested vertex.
    pub fn add_index_data(&mut self, index_data: &IndexData, offset: u32) -> Result<(), ConversionError> {
        let rebased = Self::rebase_indices(index_data, offset, self.vertices.len())?;
        self.indices.extend(rebased);
        Ok(())
    }

    /// Read and rebase the whole triangles of `index_data` without storing them
    ///
    /// Every rebased index must be below `vertex_count`, so a block's indices
    /// can be checked before its vertices are appended.
    pub(crate) fn rebase_indices(
        index_data: &IndexData,
        offset: u32,
        vertex_count: usize,
    ) -> Result<Vec<u32>, ConversionError> {
        index_data
            .read_triangles()?
            .into_iter()
            .map(|index| {
                let rebased = u64::from(index) + u64::from(offset);
                u32::try_from(rebased)
                    .ok()
                    .filter(|&i| (i as usize) < vertex_count)
                    .ok_or(ConversionError::IndexOutOfBounds { index: rebased, vertex_count })
            })
            .collect()
    }

    /// Store indices already checked by [`rebase_indices`](Self::rebase_indices)
    pub(crate) fn extend_indices(&mut self, indices: Vec<u32>) {
        self.indices.extend(indices);
    }

    /// Distance of the furthest vertex from the local origin (zero when empty)
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Extents of the vertices' bounding box (zero when empty)
    pub fn size(&self) -> Vec3 {
        self.bounds.map_or_else(Vec3::zeros, |(min, max)| max - min)
    }

    fn scaled_vertices(&self) -> Vec<Point3> {
        self.vertices
            .iter()
            .map(|v| Point3::from(v.component_mul(&self.scale)))
            .collect()
    }

    /// Sphere of radius [`radius`](Self::radius) around the local origin
    pub fn create_sphere(&self) -> CollisionShape {
        let radius = self.radius * self.scale.abs().max();
        debug!("Created sphere shape with radius {radius}");
        CollisionShape::Sphere(Ball::new(radius))
    }

    /// Box whose half extents are half the bounding box extents
    pub fn create_box(&self) -> CollisionShape {
        let half_extents = (self.size() * 0.5).component_mul(&self.scale.abs());
        debug!("Created box shape with half extents {half_extents:?}");
        CollisionShape::Box(Cuboid::new(half_extents))
    }

    /// Exact triangle mesh over the ingested vertices and indices
    pub fn create_trimesh(&self) -> Result<CollisionShape, ConversionError> {
        if self.indices.is_empty() {
            return Err(ConversionError::EmptyGeometry("trimesh"));
        }

        let triangles = self
            .indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect::<Vec<_>>();
        let mesh_interface = TriangleMeshData {
            vertices: self.scaled_vertices(),
            triangles,
        };
        debug!(
            "Created trimesh shape with {} vertices and {} triangles",
            mesh_interface.vertices.len(),
            mesh_interface.triangles.len()
        );
        Ok(CollisionShape::Trimesh(TrimeshShape::new(mesh_interface)))
    }

    /// Convex hull of the ingested vertices
    pub fn create_convex(&self) -> Result<CollisionShape, ConversionError> {
        if self.vertices.is_empty() {
            return Err(ConversionError::EmptyGeometry("convex"));
        }

        let size = self.size().component_mul(&self.scale);
        if self.vertices.len() < 4 || size.iter().any(|extent| extent.abs() <= HULL_EPSILON) {
            return Err(ConversionError::DegenerateHull);
        }

        let hull = ConvexPolyhedron::from_convex_hull(&self.scaled_vertices()).ok_or(ConversionError::DegenerateHull)?;
        debug!("Created convex shape with {} hull points", hull.points().len());
        Ok(CollisionShape::Convex(hull))
    }

    /// Scaled extents and the axis along which they are largest
    fn principal_extents(&self) -> (Vec3, Axis) {
        let size = self.size().component_mul(&self.scale.abs());
        (size, Axis::dominant(&size))
    }

    /// Largest extent perpendicular to `axis`
    fn cross_extent(size: &Vec3, axis: Axis) -> f32 {
        let i = axis.index();
        size.iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, e)| *e)
            .fold(0.0, f32::max)
    }

    /// Cylinder along the dominant axis
    pub fn create_cylinder(&self) -> CollisionShape {
        let (size, axis) = self.principal_extents();
        let half_height = size[axis.index()] * 0.5;
        let radius = Self::cross_extent(&size, axis) * 0.5;
        debug!("Created cylinder shape along {axis:?}: half height {half_height}, radius {radius}");
        CollisionShape::Cylinder {
            shape: Cylinder::new(half_height, radius),
            axis,
        }
    }

    /// Capsule along the dominant axis
    ///
    /// The caps are included in the bounding extents, so the segment is
    /// shortened by the radius at each end.
    pub fn create_capsule(&self) -> CollisionShape {
        let (size, axis) = self.principal_extents();
        let radius = Self::cross_extent(&size, axis) * 0.5;
        let half_height = (size[axis.index()] * 0.5 - radius).max(0.0);
        debug!("Created capsule shape along {axis:?}: half height {half_height}, radius {radius}");
        let capsule = match axis {
            Axis::X => Capsule::new_x(half_height, radius),
            Axis::Y => Capsule::new_y(half_height, radius),
            Axis::Z => Capsule::new_z(half_height, radius),
        };
        CollisionShape::Capsule(capsule)
    }
}

/// Compare two converters' geometry, logging every difference
///
/// Returns the number of mismatches found; zero means both converters hold the
/// same vertices and indices.
pub fn sanity_check(first: &VertexIndexToShape, second: &VertexIndexToShape) -> usize {
    const TOLERANCE: f32 = 1e-5;
    let mut mismatches = 0;

    if first.index_count() != second.index_count() {
        warn!("Index count mismatch: {} vs {}", first.index_count(), second.index_count());
        mismatches += 1;
    }
    if first.vertex_count() != second.vertex_count() {
        warn!("Vertex count mismatch: {} vs {}", first.vertex_count(), second.vertex_count());
        mismatches += 1;
    }
    if first.triangle_count() != second.triangle_count() {
        warn!("Triangle count mismatch: {} vs {}", first.triangle_count(), second.triangle_count());
        mismatches += 1;
    }

    for (i, (a, b)) in first.indices().iter().zip(second.indices()).enumerate() {
        if a != b {
            warn!("Index {i} mismatch: {a} vs {b}");
            mismatches += 1;
        }
    }
    for (i, (a, b)) in first.vertices().iter().zip(second.vertices()).enumerate() {
        if (a - b).norm() > TOLERANCE {
            warn!("Vertex {i} mismatch: {a:?} vs {b:?}");
            mismatches += 1;
        }
    }

    if mismatches == 0 {
        info!(
            "Sanity check passed: {} vertices, {} triangles",
            first.vertex_count(),
            first.triangle_count()
        );
    }
    mismatches
}
