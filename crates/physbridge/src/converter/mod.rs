//! Mesh to collision shape conversion
//!
//! A converter reads positions and triangle indices out of renderer meshes
//! into one flat geometry buffer ([`VertexIndexToShape`]) and then builds
//! collision shapes from it. Two ingestion strategies feed the buffer:
//!
//! - [`StaticMeshToShapeConverter`] reads the bind pose of static meshes
//! - [`AnimatedMeshToShapeConverter`] reads the skinned pose and also records
//!   which vertices each bone fully controls, for per-bone boxes

pub mod geometry;
pub mod static_mesh;
pub mod animated_mesh;

pub use geometry::{sanity_check, VertexIndexToShape};
pub use static_mesh::StaticMeshToShapeConverter;
pub use animated_mesh::{AnimatedMeshToShapeConverter, BoneBox, BoneHandle, BoneIndex, OrientedBox};

use thiserror::Error;

use crate::render::VertexElementSemantic;

/// Errors raised while reading renderer geometry or building shapes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// The vertex declaration lacks a required element
    #[error("Vertex declaration has no {0:?} element")]
    MissingElement(VertexElementSemantic),

    /// An element refers to a source with no buffer bound
    #[error("No vertex buffer bound to source {0}")]
    UnboundSource(u16),

    /// A vertex lies past the end of its buffer
    #[error("Vertex buffer bound to source {binding} is too short for vertex {vertex}")]
    BufferTooShort {
        /// Source the buffer is bound to
        binding: u16,
        /// First vertex that could not be read
        vertex: usize,
    },

    /// Index data reaches past the end of its index buffer
    #[error("Index range {start}..{start}+{count} exceeds buffer of {available} indices")]
    IndexRange {
        /// First index requested
        start: usize,
        /// Number of indices requested
        count: usize,
        /// Indices in the buffer
        available: usize,
    },

    /// A rebased index does not reference an ingested vertex
    #[error("Index {index} out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds {
        /// Offending index after rebasing
        index: u64,
        /// Vertices the index may reference
        vertex_count: usize,
    },

    /// The vertex count no longer fits a 32-bit index
    #[error("Too many vertices for 32-bit indices: {0}")]
    TooManyVertices(usize),

    /// Skinned vertex data does not match its bind pose
    #[error("Skinned vertex count {found} does not match bind pose count {expected}")]
    VertexCountMismatch {
        /// Bind pose vertex count
        expected: usize,
        /// Skinned vertex count
        found: usize,
    },

    /// The shape needs geometry that was never ingested
    #[error("No geometry to build a {0} shape from")]
    EmptyGeometry(&'static str),

    /// The vertices do not span a volume
    #[error("Vertices do not span a convex hull")]
    DegenerateHull,
}
