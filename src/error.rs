//! Error types for model ingestion.
//!
//! Only input boundaries return errors. Inside the builder a malformed model is a
//! programming error and panics instead.

use thiserror::Error;

/// A model whose indices or material references cannot be built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Index stream does not describe whole triangles
    #[error("Index count {0} is not a multiple of 3")]
    IndexCountNotMultipleOfThree(usize),

    /// Triangle references a vertex that does not exist
    #[error("Triangle {triangle} references vertex {index} (vertex count: {vertex_count})")]
    VertexIndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    /// Vertex references a material that does not exist
    #[error("Vertex {vertex} references material {material} (material count: {material_count})")]
    MaterialIndexOutOfRange {
        vertex: usize,
        material: u32,
        material_count: usize,
    },
}

/// Error types for glTF loading
#[derive(Error, Debug)]
pub enum GltfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("Invalid glTF content: {0}")]
    Validation(String),

    #[error("Loaded model is malformed: {0}")]
    Model(#[from] ModelError),
}
