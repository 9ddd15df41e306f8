//! Collision shapes produced by the converters
//!
//! Every shape is a `parry3d` shape with the converter's accumulated scale
//! already baked in. Ownership passes to the caller on creation.

use std::f32::consts::FRAC_PI_2;
use std::fmt;

use parry3d::shape::{Ball, Capsule, ConvexPolyhedron, Cuboid, Cylinder, SharedShape, TriMesh};

use crate::foundation::math::{Iso3, Point3, Vec3};

/// Principal axis of a capsule or cylinder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Local X axis
    X,
    /// Local Y axis
    Y,
    /// Local Z axis
    Z,
}

impl Axis {
    /// The axis along which `extents` is largest (ties favour X, then Y)
    pub fn dominant(extents: &Vec3) -> Self {
        if extents.x >= extents.y && extents.x >= extents.z {
            Self::X
        } else if extents.y >= extents.z {
            Self::Y
        } else {
            Self::Z
        }
    }

    /// Component index of this axis
    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// The vertex and triangle arrays a triangle-mesh shape is built over
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMeshData {
    /// Scaled vertex positions
    pub vertices: Vec<Point3>,
    /// Triangles as vertex index triples
    pub triangles: Vec<[u32; 3]>,
}

/// An exact triangle-mesh shape together with the mesh data it was built from
///
/// Fields drop in declaration order, so the shape is always released before
/// the mesh data it references.
#[derive(Clone)]
pub struct TrimeshShape {
    shape: TriMesh,
    mesh_interface: TriangleMeshData,
}

impl TrimeshShape {
    /// Build the shape; `triangles` must not be empty
    pub(crate) fn new(mesh_interface: TriangleMeshData) -> Self {
        let shape = TriMesh::new(mesh_interface.vertices.clone(), mesh_interface.triangles.clone());
        Self { shape, mesh_interface }
    }

    /// The BVH-backed shape
    pub fn shape(&self) -> &TriMesh {
        &self.shape
    }

    /// The mesh data the shape was built over
    pub fn mesh_interface(&self) -> &TriangleMeshData {
        &self.mesh_interface
    }
}

impl fmt::Debug for TrimeshShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrimeshShape")
            .field("vertices", &self.mesh_interface.vertices.len())
            .field("triangles", &self.mesh_interface.triangles.len())
            .finish()
    }
}

/// One approximation of a converter's geometry
#[derive(Clone)]
pub enum CollisionShape {
    /// Bounding sphere centred on the local origin
    Sphere(Ball),
    /// Axis-aligned box centred on the local origin
    Box(Cuboid),
    /// Exact triangle mesh
    Trimesh(TrimeshShape),
    /// Convex hull of the vertices
    Convex(ConvexPolyhedron),
    /// Capsule along its dominant axis
    Capsule(Capsule),
    /// Cylinder along `axis` (the parry cylinder itself is Y-aligned)
    Cylinder {
        /// Y-aligned cylinder
        shape: Cylinder,
        /// Axis the cylinder should be aligned with
        axis: Axis,
    },
}

impl CollisionShape {
    /// Short name of the shape kind, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sphere(_) => "sphere",
            Self::Box(_) => "box",
            Self::Trimesh(_) => "trimesh",
            Self::Convex(_) => "convex",
            Self::Capsule(_) => "capsule",
            Self::Cylinder { .. } => "cylinder",
        }
    }

    /// Radius of a sphere shape
    pub fn as_sphere(&self) -> Option<&Ball> {
        match self {
            Self::Sphere(ball) => Some(ball),
            _ => None,
        }
    }

    /// Half extents of a box shape
    pub fn as_box(&self) -> Option<&Cuboid> {
        match self {
            Self::Box(cuboid) => Some(cuboid),
            _ => None,
        }
    }

    /// Triangle mesh of a trimesh shape
    pub fn as_trimesh(&self) -> Option<&TrimeshShape> {
        match self {
            Self::Trimesh(trimesh) => Some(trimesh),
            _ => None,
        }
    }

    /// Convert into a shape a rigid-body engine can share between colliders
    pub fn to_shared_shape(&self) -> SharedShape {
        match self {
            Self::Sphere(ball) => SharedShape::new(*ball),
            Self::Box(cuboid) => SharedShape::new(*cuboid),
            Self::Trimesh(trimesh) => SharedShape::new(trimesh.shape.clone()),
            Self::Convex(convex) => SharedShape::new(convex.clone()),
            Self::Capsule(capsule) => SharedShape::new(*capsule),
            Self::Cylinder { shape, axis } => {
                let rotation = match axis {
                    Axis::X => Some(Vec3::z() * FRAC_PI_2),
                    Axis::Y => None,
                    Axis::Z => Some(Vec3::x() * FRAC_PI_2),
                };
                match rotation {
                    None => SharedShape::new(*shape),
                    Some(axis_angle) => SharedShape::compound(vec![(
                        Iso3::rotation(axis_angle),
                        SharedShape::new(*shape),
                    )]),
                }
            }
        }
    }
}

impl fmt::Debug for CollisionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sphere(ball) => f.debug_tuple("Sphere").field(&ball.radius).finish(),
            Self::Box(cuboid) => f.debug_tuple("Box").field(&cuboid.half_extents).finish(),
            Self::Trimesh(trimesh) => f.debug_tuple("Trimesh").field(trimesh).finish(),
            Self::Convex(convex) => f
                .debug_struct("Convex")
                .field("points", &convex.points().len())
                .finish(),
            Self::Capsule(capsule) => f
                .debug_struct("Capsule")
                .field("half_height", &capsule.half_height())
                .field("radius", &capsule.radius)
                .finish(),
            Self::Cylinder { shape, axis } => f
                .debug_struct("Cylinder")
                .field("half_height", &shape.half_height)
                .field("radius", &shape.radius)
                .field("axis", axis)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dominant_axis() {
        assert_eq!(Axis::dominant(&Vec3::new(3.0, 1.0, 2.0)), Axis::X);
        assert_eq!(Axis::dominant(&Vec3::new(1.0, 3.0, 2.0)), Axis::Y);
        assert_eq!(Axis::dominant(&Vec3::new(1.0, 2.0, 3.0)), Axis::Z);
        assert_eq!(Axis::dominant(&Vec3::new(1.0, 1.0, 1.0)), Axis::X);
    }

    #[test]
    fn test_cylinder_shared_shape_follows_axis() {
        let shape = CollisionShape::Cylinder {
            shape: Cylinder::new(2.0, 0.5),
            axis: Axis::Z,
        };
        let aabb = shape.to_shared_shape().compute_local_aabb();

        assert_relative_eq!(aabb.half_extents().z, 2.0, epsilon = 1e-4);
        assert_relative_eq!(aabb.half_extents().y, 0.5, epsilon = 1e-4);
        assert_relative_eq!(aabb.half_extents().x, 0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_trimesh_keeps_its_mesh_data() {
        let trimesh = TrimeshShape::new(TriangleMeshData {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            triangles: vec![[0, 1, 2]],
        });

        assert_eq!(trimesh.shape().num_triangles(), 1);
        assert_eq!(trimesh.mesh_interface().vertices.len(), 3);
        let shape = CollisionShape::Trimesh(trimesh);
        assert_eq!(shape.kind(), "trimesh");
        assert!(shape.as_trimesh().is_some());
    }
}
