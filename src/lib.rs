//! Median-split BVH construction and emissive triangle extraction for a GPU
//! path tracer.
//!
//! A [`Model`] is flattened into a pre-order node array, a slot-to-triangle map
//! and a light table by [`BvhBuilder`]; [`GpuBuffers`] turns the result into the
//! byte images a traversal kernel binds.

pub mod buffers;
pub mod bvh;
pub mod error;
pub mod gltf_loader;
pub mod lights;
pub mod model;
pub mod scene;
pub mod triangle;

pub use buffers::{GpuBuffers, SceneHeader};
pub use bvh::{BuildOptions, BuildStats, BvhBuilder, BvhTree};
pub use error::{GltfError, ModelError};
pub use gltf_loader::GltfLoader;
pub use lights::{extract_lights, LightSet};
pub use model::Model;
pub use scene::SceneState;

pub use raytracer_shared::{Aabb, BvhConfig, BvhNode, Material, NodeKind, Vertex};
