#![no_std]

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use half::f16;

/// Configuration constants for BVH construction
pub struct BvhConfig;

impl BvhConfig {
    /// Largest triangle range a leaf may hold
    pub const MAX_LEAF_TRIS: u32 = 8;
    /// Marks the unused child or range pair of a node
    pub const NONE: u32 = 0xFFFF_FFFF;
    /// Index of the root node in every non-empty tree
    pub const ROOT: u32 = 0;
}

/// Axis-Aligned Bounding Box for BVH
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Aabb {
    pub min: [f32; 3],      // Minimum bounds
    pub _padding0: f32,     // Padding for alignment
    pub max: [f32; 3],      // Maximum bounds
    pub _padding1: f32,     // Padding for alignment
}

impl Aabb {
    /// Create a new AABB
    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self {
            min,
            _padding0: 0.0,
            max,
            _padding1: 0.0,
        }
    }

    /// Create an empty AABB, the identity of `union`
    pub fn empty() -> Self {
        Self::new(
            [f32::INFINITY; 3],
            [f32::NEG_INFINITY; 3],
        )
    }

    /// Smallest box enclosing all `points`; empty for no points
    pub fn from_points(points: &[[f32; 3]]) -> Self {
        points
            .iter()
            .fold(Self::empty(), |aabb, point| aabb.union_point(*point))
    }

    /// Combine this AABB with another
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(
            Vec3::from_array(self.min).min(Vec3::from_array(other.min)).to_array(),
            Vec3::from_array(self.max).max(Vec3::from_array(other.max)).to_array(),
        )
    }

    /// Grow this AABB to include a point
    pub fn union_point(&self, point: [f32; 3]) -> Aabb {
        let p = Vec3::from_array(point);
        Aabb::new(
            Vec3::from_array(self.min).min(p).to_array(),
            Vec3::from_array(self.max).max(p).to_array(),
        )
    }

    /// Per-axis size (max - min). Negative on every axis for the empty box.
    pub fn extent(&self) -> Vec3 {
        Vec3::from_array(self.max) - Vec3::from_array(self.min)
    }

    /// True when min > max on some axis
    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }

    /// True when `other` lies entirely inside this box (boundaries included)
    pub fn contains(&self, other: &Aabb) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.min[axis] && other.max[axis] <= self.max[axis])
    }

    /// Get the center point of the AABB
    pub fn center(&self) -> [f32; 3] {
        ((Vec3::from_array(self.min) + Vec3::from_array(self.max)) * 0.5).to_array()
    }

    /// Get the surface area of the AABB
    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.extent();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

/// Mesh vertex as laid out in the vertex storage buffer (48 bytes)
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 3],
    pub _padding0: f32,
    pub normal: [f32; 3],
    pub _padding1: f32,
    pub texcoord: [f32; 2],
    pub material: u32,      // Index into the material table
    pub _padding2: f32,
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], texcoord: [f32; 2], material: u32) -> Self {
        Self {
            position,
            _padding0: 0.0,
            normal,
            _padding1: 0.0,
            texcoord,
            material,
            _padding2: 0.0,
        }
    }
}

/// PBR material properties for raytracing (48 bytes).
/// Pairs of scalar factors are stored as two f16 values packed into one u32.
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Material {
    pub albedo: [f32; 3],            // Base color
    pub metallic_roughness_f16: u32, // Packed: metallic(low 16 bits) + roughness(high 16 bits)
    pub emission: [f32; 3],          // Emitted radiance; zero for non-lights
    pub sheen: f32,
    pub clearcoat_f16: u32,          // Packed: thickness(low 16 bits) + roughness(high 16 bits)
    pub _padding: [u32; 3],
}

impl Material {
    fn pack_f16_pair(low: f32, high: f32) -> u32 {
        (f16::from_f32(low).to_bits() as u32) | ((f16::from_f32(high).to_bits() as u32) << 16)
    }

    fn unpack_f16_pair(packed: u32) -> (f32, f32) {
        let low = f16::from_bits((packed & 0x0000FFFF) as u16).to_f32();
        let high = f16::from_bits(((packed >> 16) & 0x0000FFFF) as u16).to_f32();
        (low, high)
    }

    /// Create a new PBR material
    pub fn new(albedo: [f32; 3], metallic: f32, roughness: f32, emission: [f32; 3]) -> Self {
        Self {
            albedo,
            metallic_roughness_f16: Self::pack_f16_pair(metallic, roughness),
            emission,
            sheen: 0.0,
            clearcoat_f16: Self::pack_f16_pair(0.0, 0.0),
            _padding: [0; 3],
        }
    }

    /// Create a diffuse material
    pub fn diffuse(albedo: [f32; 3]) -> Self {
        Self::new(albedo, 0.0, 1.0, [0.0; 3])
    }

    /// Create a rough dielectric with the given roughness
    pub fn rough(albedo: [f32; 3], roughness: f32) -> Self {
        Self::new(albedo, 0.0, roughness, [0.0; 3])
    }

    /// Create a metallic material
    pub fn metallic(albedo: [f32; 3], roughness: f32) -> Self {
        Self::new(albedo, 1.0, roughness, [0.0; 3])
    }

    /// Create an emissive material
    pub fn emissive(albedo: [f32; 3], emission: [f32; 3]) -> Self {
        Self::new(albedo, 0.0, 1.0, emission)
    }

    /// Set sheen
    pub fn with_sheen(mut self, sheen: f32) -> Self {
        self.sheen = sheen;
        self
    }

    /// Set clearcoat thickness and roughness
    pub fn with_clearcoat(mut self, thickness: f32, roughness: f32) -> Self {
        self.clearcoat_f16 = Self::pack_f16_pair(thickness, roughness);
        self
    }

    /// True when any emission channel is non-zero
    pub fn is_emissive(&self) -> bool {
        self.emission.iter().any(|&channel| channel != 0.0)
    }

    /// Returns (metallic, roughness)
    pub fn metallic_roughness(&self) -> (f32, f32) {
        Self::unpack_f16_pair(self.metallic_roughness_f16)
    }

    /// Returns (thickness, roughness) of the clearcoat layer
    pub fn clearcoat(&self) -> (f32, f32) {
        Self::unpack_f16_pair(self.clearcoat_f16)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse([0.8, 0.8, 0.8])
    }
}

/// BVH Node for triangle acceleration structure (48 bytes).
///
/// Internal nodes use `left`/`right` and set `begin`/`end` to `BvhConfig::NONE`;
/// leaves use the half-open primitive slot range `begin..end` and set
/// `left`/`right` to `BvhConfig::NONE`.
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BvhNode {
    pub box_min: [f32; 3],
    pub _padding0: f32,
    pub box_max: [f32; 3],
    pub _padding1: f32,
    pub left: u32,
    pub right: u32,
    pub begin: u32,
    pub end: u32,
}

/// Decoded form of a `BvhNode`'s index fields
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Internal { left: u32, right: u32 },
    Leaf { begin: u32, end: u32 },
}

impl BvhNode {
    /// Create a new leaf node covering primitive slots `begin..end`
    pub fn leaf(bounds: Aabb, begin: u32, end: u32) -> Self {
        Self::from_kind(bounds, NodeKind::Leaf { begin, end })
    }

    /// Create a new internal node
    pub fn internal(bounds: Aabb, left: u32, right: u32) -> Self {
        Self::from_kind(bounds, NodeKind::Internal { left, right })
    }

    pub fn from_kind(bounds: Aabb, kind: NodeKind) -> Self {
        let (left, right, begin, end) = match kind {
            NodeKind::Internal { left, right } => (left, right, BvhConfig::NONE, BvhConfig::NONE),
            NodeKind::Leaf { begin, end } => (BvhConfig::NONE, BvhConfig::NONE, begin, end),
        };
        Self {
            box_min: bounds.min,
            _padding0: 0.0,
            box_max: bounds.max,
            _padding1: 0.0,
            left,
            right,
            begin,
            end,
        }
    }

    /// Interpret the index fields; a node with `left == NONE` is a leaf
    pub fn kind(&self) -> NodeKind {
        if self.left == BvhConfig::NONE {
            NodeKind::Leaf { begin: self.begin, end: self.end }
        } else {
            NodeKind::Internal { left: self.left, right: self.right }
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.box_min, self.box_max)
    }

    /// Check if this node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind(), NodeKind::Leaf { .. })
    }

    /// Number of triangles in a leaf, zero for internal nodes
    pub fn triangle_count(&self) -> u32 {
        match self.kind() {
            NodeKind::Leaf { begin, end } => end - begin,
            NodeKind::Internal { .. } => 0,
        }
    }
}
