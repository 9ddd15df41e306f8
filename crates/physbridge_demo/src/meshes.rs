//! Procedurally built meshes for the demo scene

use physbridge::converter::BoneHandle;
use physbridge::foundation::math::{Quat, Vec3};
use physbridge::render::{
    IndexData, Mesh, SubMesh, VertexBuffer, VertexData, VertexDeclaration, VertexElementSemantic, VertexElementType,
};

/// Interleaved vertex layout of the player mesh
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct LitVertex {
    normal: [f32; 3],
    position: [f32; 3],
    uv: [f32; 2],
}

/// Box with one quad per face (24 vertices, 12 triangles)
///
/// Normals come first in the vertex so positions sit at a non-zero offset.
pub fn box_mesh(name: &str, half_extents: Vec3) -> Mesh {
    // (normal, u, v) with u x v = normal
    let faces = [
        (Vec3::x(), Vec3::y(), Vec3::z()),
        (-Vec3::x(), Vec3::z(), Vec3::y()),
        (Vec3::y(), Vec3::z(), Vec3::x()),
        (-Vec3::y(), Vec3::x(), Vec3::z()),
        (Vec3::z(), Vec3::x(), Vec3::y()),
        (-Vec3::z(), Vec3::y(), Vec3::x()),
    ];
    let corners = [(-1.0, -1.0, [0.0, 0.0]), (1.0, -1.0, [1.0, 0.0]), (1.0, 1.0, [1.0, 1.0]), (-1.0, 1.0, [0.0, 1.0])];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let base = vertices.len() as u16;
        for (su, sv, uv) in corners {
            let position = (normal + u * su + v * sv).component_mul(&half_extents);
            vertices.push(LitVertex {
                normal: normal.into(),
                position: position.into(),
                uv,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    let mut declaration = VertexDeclaration::new();
    declaration
        .add_element(0, 0, VertexElementType::Float3, VertexElementSemantic::Normal)
        .add_element(0, 12, VertexElementType::Float3, VertexElementSemantic::Position)
        .add_element(0, 24, VertexElementType::Float2, VertexElementSemantic::TextureCoordinates);
    let mut vertex_data = VertexData::new(declaration, vertices.len());
    vertex_data.set_binding(0, VertexBuffer::from_pod(&vertices));

    Mesh::new(name).with_sub_mesh(SubMesh::with_vertices(
        format!("{name}/Faces"),
        vertex_data,
        IndexData::from_u16(indices),
    ))
}

/// Flat square grid at y = 0 split into two sub-meshes
///
/// The near half indexes the mesh's shared vertices with 16-bit indices; the
/// far half carries its own copy of its rows and 32-bit indices.
pub fn ground_mesh(name: &str, size: f32, divisions: u32) -> Mesh {
    let cells = (divisions.max(2) + 1) & !1;
    let row_len = cells + 1;
    let step = size / cells as f32;
    let half = size * 0.5;

    let grid_row = |row: u32| -> Vec<[f32; 3]> {
        (0..row_len)
            .map(|col| [col as f32 * step - half, 0.0, row as f32 * step - half])
            .collect()
    };
    let cell_indices = |rows: std::ops::Range<u32>, first_row: u32| -> Vec<u32> {
        let mut indices = Vec::new();
        for row in rows {
            for col in 0..cells {
                let a = (row - first_row) * row_len + col;
                let b = a + 1;
                let d = a + row_len;
                let c = d + 1;
                indices.extend_from_slice(&[a, d, c, a, c, b]);
            }
        }
        indices
    };

    let middle = cells / 2;
    let shared: Vec<[f32; 3]> = (0..=cells).flat_map(&grid_row).collect();
    let own: Vec<[f32; 3]> = (middle..=cells).flat_map(&grid_row).collect();

    let near = cell_indices(0..middle, 0).into_iter().map(|i| i as u16).collect();
    let far = cell_indices(middle..cells, middle);

    Mesh::new(name)
        .with_shared_vertices(VertexData::from_positions(&shared))
        .with_sub_mesh(SubMesh::shared(format!("{name}/Near"), IndexData::from_u16(near)))
        .with_sub_mesh(SubMesh::with_vertices(
            format!("{name}/Far"),
            VertexData::from_positions(&own),
            IndexData::from_u32(far),
        ))
}

/// One bone of the limb's skeleton, posed, in mesh space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bone {
    /// Skeleton handle
    pub handle: BoneHandle,
    /// Bone origin
    pub position: Vec3,
    /// Bone orientation
    pub orientation: Quat,
}

/// A two-bone skinned limb and its current pose
pub struct Limb {
    /// Skinned mesh (bind pose plus skinning data)
    pub mesh: Mesh,
    /// Lower and upper bone, posed
    pub bones: [Bone; 2],
    /// Software-skinned positions for the pose
    pub pose: VertexData,
}

/// Handles the limb's blend indices map to
pub const LIMB_BONES: [BoneHandle; 2] = [10, 11];

/// Square tube along +Y in three rings: the bottom ring follows the lower
/// bone, the top ring the upper bone, and the middle ring is blended evenly.
/// The upper bone is bent about Z by `bend` radians around the middle ring.
pub fn skinned_limb(name: &str, bend: f32) -> Limb {
    const RADIUS: f32 = 0.3;
    let ring = [[-RADIUS, -RADIUS], [RADIUS, -RADIUS], [RADIUS, RADIUS], [-RADIUS, RADIUS]];

    let mut positions = Vec::with_capacity(12);
    let mut blend_indices = Vec::with_capacity(12);
    let mut blend_weights = Vec::with_capacity(12);
    for (height, indices, weights) in [
        (0.0, [0, 0, 0, 0], [1.0, 0.0, 0.0, 0.0]),
        (1.0, [0, 1, 0, 0], [0.5, 0.5, 0.0, 0.0]),
        (2.0, [1, 0, 0, 0], [1.0, 0.0, 0.0, 0.0]),
    ] {
        for [x, z] in ring {
            positions.push([x, height, z]);
            blend_indices.push(indices);
            blend_weights.push(weights);
        }
    }

    let mut indices: Vec<u16> = Vec::with_capacity(48);
    for band in 0..2u16 {
        for side in 0..4u16 {
            let a = band * 4 + side;
            let b = band * 4 + (side + 1) % 4;
            indices.extend_from_slice(&[a, b, b + 4, a, b + 4, a + 4]);
        }
    }

    let pivot = Vec3::new(0.0, 1.0, 0.0);
    let rotation = Quat::from_axis_angle(&Vec3::z_axis(), bend);
    let upper = |p: Vec3| pivot + rotation * (p - pivot);

    let posed: Vec<[f32; 3]> = positions
        .iter()
        .zip(&blend_indices)
        .zip(&blend_weights)
        .map(|((p, idx), w)| {
            let p = Vec3::from(*p);
            let blended = idx
                .iter()
                .zip(w)
                .map(|(&bone, &weight)| if bone == 0 { p * weight } else { upper(p) * weight })
                .sum::<Vec3>();
            blended.into()
        })
        .collect();

    let vertex_data = VertexData::from_skinned_positions(&positions, &blend_indices, &blend_weights);
    let mut mesh = Mesh::new(name).with_sub_mesh(
        SubMesh::with_vertices(format!("{name}/Skin"), vertex_data, IndexData::from_u16(indices))
            .with_bone_map(LIMB_BONES.to_vec()),
    );
    mesh.skeleton_name = Some(format!("{name}/Skeleton"));

    Limb {
        mesh,
        bones: [
            Bone {
                handle: LIMB_BONES[0],
                position: Vec3::zeros(),
                orientation: Quat::identity(),
            },
            Bone {
                handle: LIMB_BONES[1],
                position: pivot,
                orientation: rotation,
            },
        ],
        pose: VertexData::from_positions(&posed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use physbridge::converter::StaticMeshToShapeConverter;

    #[test]
    fn test_box_mesh_bounds() {
        let mesh = box_mesh("Box", Vec3::new(0.5, 1.0, 0.5));
        let converter = StaticMeshToShapeConverter::from_mesh(&mesh, None).unwrap();
        let geometry = converter.geometry();

        assert_eq!(geometry.vertex_count(), 24);
        assert_eq!(geometry.triangle_count(), 12);
        assert_relative_eq!(geometry.size(), Vec3::new(1.0, 2.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_ground_halves_cover_the_grid() {
        let mesh = ground_mesh("Ground", 10.0, 4);
        let converter = StaticMeshToShapeConverter::from_mesh(&mesh, None).unwrap();
        let geometry = converter.geometry();

        // 25 shared vertices plus the far half's own 3 rows of 5
        assert_eq!(geometry.vertex_count(), 25 + 15);
        assert_eq!(geometry.triangle_count(), 2 * 4 * 4);
        assert_relative_eq!(geometry.size(), Vec3::new(10.0, 0.0, 10.0), epsilon = 1e-5);
        assert!(geometry.create_trimesh().is_ok());
    }

    #[test]
    fn test_odd_divisions_round_up() {
        let mesh = ground_mesh("Ground", 6.0, 3);
        assert_eq!(mesh.shared_vertex_data.as_ref().unwrap().vertex_count, 25);
    }

    #[test]
    fn test_limb_pose_bends_only_the_upper_ring() {
        let limb = skinned_limb("Limb", std::f32::consts::FRAC_PI_2);
        let posed = limb.pose.read_positions().unwrap();

        assert_relative_eq!(posed[0], Vec3::new(-0.3, 0.0, -0.3), epsilon = 1e-6);
        // (0.3, 2, -0.3) rotated a quarter turn about Z around (0, 1, 0)
        assert_relative_eq!(posed[9], Vec3::new(-1.0, 1.3, -0.3), epsilon = 1e-5);
        assert_eq!(limb.bones[1].handle, 11);
    }
}
