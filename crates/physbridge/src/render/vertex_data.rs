//! Vertex and index buffer access
//!
//! A read-only model of the renderer's hardware buffers: a vertex declaration
//! describes where each element lives inside the vertex buffers bound to it,
//! and index data references a 16-bit or 32-bit index buffer. All multi-byte
//! values are little-endian.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::converter::ConversionError;
use crate::foundation::math::Vec3;

/// What a vertex element means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexElementSemantic {
    /// Object-space position
    Position,
    /// Skinning weights, parallel to [`VertexElementSemantic::BlendIndices`]
    BlendWeights,
    /// Skinning blend indices (remapped to bone handles by the sub-mesh)
    BlendIndices,
    /// Surface normal
    Normal,
    /// Per-vertex colour
    Diffuse,
    /// Texture coordinates
    TextureCoordinates,
    /// Tangent for normal mapping
    Tangent,
}

/// How a vertex element is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexElementType {
    /// One `f32`
    Float1,
    /// Two `f32`
    Float2,
    /// Three `f32`
    Float3,
    /// Four `f32`
    Float4,
    /// Four unsigned bytes (blend indices)
    UByte4,
    /// Two signed 16-bit integers
    Short2,
    /// Four signed 16-bit integers
    Short4,
}

impl VertexElementType {
    /// Size of the element in bytes
    pub const fn size(self) -> usize {
        match self {
            Self::Float1 | Self::UByte4 | Self::Short2 => 4,
            Self::Float2 | Self::Short4 => 8,
            Self::Float3 => 12,
            Self::Float4 => 16,
        }
    }

    /// Number of components in the element
    pub const fn component_count(self) -> usize {
        match self {
            Self::Float1 => 1,
            Self::Float2 | Self::Short2 => 2,
            Self::Float3 => 3,
            Self::Float4 | Self::UByte4 | Self::Short4 => 4,
        }
    }

    /// Decode one element into up to four floats; missing components are zero
    fn decode(self, bytes: &[u8]) -> [f32; 4] {
        let mut out = [0.0f32; 4];
        match self {
            Self::Float1 | Self::Float2 | Self::Float3 | Self::Float4 => {
                for (i, chunk) in bytes.chunks_exact(4).take(self.component_count()).enumerate() {
                    out[i] = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                }
            }
            Self::UByte4 => {
                for (i, byte) in bytes.iter().take(4).enumerate() {
                    out[i] = f32::from(*byte);
                }
            }
            Self::Short2 | Self::Short4 => {
                for (i, chunk) in bytes.chunks_exact(2).take(self.component_count()).enumerate() {
                    out[i] = f32::from(i16::from_le_bytes([chunk[0], chunk[1]]));
                }
            }
        }
        out
    }
}

/// One element of a vertex declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexElement {
    /// Buffer binding this element is read from
    pub source: u16,
    /// Byte offset of the element inside one vertex of that buffer
    pub offset: usize,
    /// Storage type
    pub element_type: VertexElementType,
    /// Meaning
    pub semantic: VertexElementSemantic,
}

/// Ordered list of vertex elements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexDeclaration {
    elements: Vec<VertexElement>,
}

impl VertexDeclaration {
    /// Create an empty declaration
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element
    pub fn add_element(
        &mut self,
        source: u16,
        offset: usize,
        element_type: VertexElementType,
        semantic: VertexElementSemantic,
    ) -> &mut Self {
        self.elements.push(VertexElement { source, offset, element_type, semantic });
        self
    }

    /// First element with the given semantic
    pub fn find_element_by_semantic(&self, semantic: VertexElementSemantic) -> Option<&VertexElement> {
        self.elements.iter().find(|e| e.semantic == semantic)
    }

    /// All elements
    pub fn elements(&self) -> &[VertexElement] {
        &self.elements
    }

    /// Size in bytes of one vertex in the given source (tightly packed)
    pub fn vertex_size(&self, source: u16) -> usize {
        self.elements
            .iter()
            .filter(|e| e.source == source)
            .map(|e| e.offset + e.element_type.size())
            .max()
            .unwrap_or(0)
    }
}

/// Raw interleaved vertex storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexBuffer {
    vertex_size: usize,
    data: Vec<u8>,
}

impl VertexBuffer {
    /// Wrap raw bytes with the given stride
    pub fn new(vertex_size: usize, data: Vec<u8>) -> Self {
        Self { vertex_size, data }
    }

    /// Build a buffer from plain-old-data vertices; the stride is the size of `T`
    pub fn from_pod<T: bytemuck::Pod>(vertices: &[T]) -> Self {
        Self {
            vertex_size: std::mem::size_of::<T>(),
            data: bytemuck::cast_slice(vertices).to_vec(),
        }
    }

    /// Stride in bytes
    pub fn vertex_size(&self) -> usize {
        self.vertex_size
    }

    /// Number of whole vertices stored
    pub fn num_vertices(&self) -> usize {
        if self.vertex_size == 0 {
            0
        } else {
            self.data.len() / self.vertex_size
        }
    }

    /// Read-only view of the bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// A vertex declaration plus the buffers bound to its sources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexData {
    /// Element layout
    pub declaration: VertexDeclaration,
    bindings: BTreeMap<u16, Arc<VertexBuffer>>,
    /// First vertex to read
    pub vertex_start: usize,
    /// Number of vertices to read
    pub vertex_count: usize,
}

impl VertexData {
    /// Create vertex data with no bindings
    pub fn new(declaration: VertexDeclaration, vertex_count: usize) -> Self {
        Self {
            declaration,
            bindings: BTreeMap::new(),
            vertex_start: 0,
            vertex_count,
        }
    }

    /// Tightly packed `Float3` positions in source 0
    pub fn from_positions(positions: &[[f32; 3]]) -> Self {
        let mut declaration = VertexDeclaration::new();
        declaration.add_element(0, 0, VertexElementType::Float3, VertexElementSemantic::Position);

        let mut data = Self::new(declaration, positions.len());
        data.set_binding(0, VertexBuffer::from_pod(positions));
        data
    }

    /// Positions in source 0 and skinning data (`UByte4` indices, `Float4` weights) in source 1
    pub fn from_skinned_positions(
        positions: &[[f32; 3]],
        blend_indices: &[[u8; 4]],
        blend_weights: &[[f32; 4]],
    ) -> Self {
        #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
        #[repr(C)]
        struct Skin {
            indices: [u8; 4],
            weights: [f32; 4],
        }

        let skins: Vec<Skin> = blend_indices
            .iter()
            .zip(blend_weights)
            .map(|(indices, weights)| Skin { indices: *indices, weights: *weights })
            .collect();

        let mut data = Self::from_positions(positions);
        data.declaration
            .add_element(1, 0, VertexElementType::UByte4, VertexElementSemantic::BlendIndices)
            .add_element(1, 4, VertexElementType::Float4, VertexElementSemantic::BlendWeights);
        data.set_binding(1, VertexBuffer::from_pod(&skins));
        data
    }

    /// Bind a buffer to a source
    pub fn set_binding(&mut self, source: u16, buffer: VertexBuffer) {
        self.bindings.insert(source, Arc::new(buffer));
    }

    /// Bind a buffer that is already shared with other vertex data
    pub fn set_shared_binding(&mut self, source: u16, buffer: Arc<VertexBuffer>) {
        self.bindings.insert(source, buffer);
    }

    /// Buffer bound to a source
    pub fn binding(&self, source: u16) -> Option<&VertexBuffer> {
        self.bindings.get(&source).map(Arc::as_ref)
    }

    /// Whether the declaration has an element with this semantic
    pub fn has_element(&self, semantic: VertexElementSemantic) -> bool {
        self.declaration.find_element_by_semantic(semantic).is_some()
    }

    /// Decode every vertex's element with the given semantic
    ///
    /// Each entry carries up to four components; unused components are zero.
    pub fn read_element(&self, semantic: VertexElementSemantic) -> Result<Vec<[f32; 4]>, ConversionError> {
        let element = self
            .declaration
            .find_element_by_semantic(semantic)
            .ok_or(ConversionError::MissingElement(semantic))?;
        let buffer = self
            .binding(element.source)
            .ok_or(ConversionError::UnboundSource(element.source))?;

        let stride = buffer.vertex_size();
        let size = element.element_type.size();
        let bytes = buffer.as_bytes();

        let too_short = |vertex| ConversionError::BufferTooShort {
            binding: element.source,
            vertex,
        };
        let end = self
            .vertex_start
            .checked_add(self.vertex_count)
            .ok_or_else(|| too_short(self.vertex_start))?;

        (self.vertex_start..end)
            .map(|vertex| {
                let begin = vertex
                    .checked_mul(stride)
                    .and_then(|start| start.checked_add(element.offset))
                    .ok_or_else(|| too_short(vertex))?;
                let raw = begin
                    .checked_add(size)
                    .and_then(|stop| bytes.get(begin..stop))
                    .ok_or_else(|| too_short(vertex))?;
                Ok(element.element_type.decode(raw))
            })
            .collect()
    }

    /// Decode all positions
    pub fn read_positions(&self) -> Result<Vec<Vec3>, ConversionError> {
        Ok(self
            .read_element(VertexElementSemantic::Position)?
            .into_iter()
            .map(|[x, y, z, _]| Vec3::new(x, y, z))
            .collect())
    }
}

/// Index storage in either width
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexBuffer {
    /// 16-bit indices
    U16(Vec<u16>),
    /// 32-bit indices
    U32(Vec<u32>),
}

impl IndexBuffer {
    /// Number of indices stored
    pub fn len(&self) -> usize {
        match self {
            Self::U16(indices) => indices.len(),
            Self::U32(indices) => indices.len(),
        }
    }

    /// Whether the buffer holds no indices
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A window into an index buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexData {
    /// Shared index storage
    pub buffer: Arc<IndexBuffer>,
    /// First index to read
    pub index_start: usize,
    /// Number of indices to read
    pub index_count: usize,
}

impl IndexData {
    /// Index data covering a whole buffer
    pub fn new(buffer: IndexBuffer) -> Self {
        let index_count = buffer.len();
        Self {
            buffer: Arc::new(buffer),
            index_start: 0,
            index_count,
        }
    }

    /// Index data over 16-bit indices
    pub fn from_u16(indices: Vec<u16>) -> Self {
        Self::new(IndexBuffer::U16(indices))
    }

    /// Index data over 32-bit indices
    pub fn from_u32(indices: Vec<u32>) -> Self {
        Self::new(IndexBuffer::U32(indices))
    }

    /// Read the indices of whole triangles, widened to 32 bits
    ///
    /// A trailing partial triangle is ignored.
    pub fn read_triangles(&self) -> Result<Vec<u32>, ConversionError> {
        let count = self.index_count - self.index_count % 3;
        let out_of_range = || ConversionError::IndexRange {
            start: self.index_start,
            count,
            available: self.buffer.len(),
        };
        let end = self.index_start.checked_add(count).ok_or_else(out_of_range)?;
        let range = self.index_start..end;

        match self.buffer.as_ref() {
            IndexBuffer::U16(indices) => indices
                .get(range)
                .map(|slice| slice.iter().copied().map(u32::from).collect())
                .ok_or_else(out_of_range),
            IndexBuffer::U32(indices) => indices.get(range).map(<[u32]>::to_vec).ok_or_else(out_of_range),
        }
    }
}
