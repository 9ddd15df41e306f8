//! Renderer-side interfaces consumed by the bridge
//!
//! The bridge reads geometry out of mesh resources, writes world transforms
//! into scene nodes, and builds debug geometry in manual objects with unlit
//! materials. This module holds those collaborators.

pub mod vertex_data;
pub mod mesh;
pub mod scene_node;
pub mod manual_object;
pub mod hlms;
pub mod scene_manager;

pub use vertex_data::{
    IndexBuffer, IndexData, VertexBuffer, VertexData, VertexDeclaration, VertexElement,
    VertexElementSemantic, VertexElementType,
};
pub use mesh::{BlendIndexMap, Entity, Mesh, RenderOperation, Renderable, SubEntity, SubEntityRenderable, SubMesh};
pub use scene_node::{NodeRef, SceneMemoryType, SceneNode, WeakNodeRef};
pub use manual_object::{ManualObject, ManualObjectRef, ManualSection, ManualVertex, OperationType};
pub use hlms::{HlmsUnlit, UnlitDatablock};
pub use scene_manager::{SceneManager, SceneManagerRef};

use thiserror::Error;

/// Renderer-side errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// A datablock name was empty
    #[error("Datablock name must not be empty")]
    InvalidDatablockName,

    /// A datablock with this name already exists
    #[error("Datablock already exists: {0}")]
    DuplicateDatablock(String),

    /// The debug-line datablock could not be created
    #[error("Failed to create unlit datablock '{name}': {reason}")]
    DatablockCreation {
        /// Datablock that was requested
        name: String,
        /// Underlying failure
        reason: String,
    },
}
