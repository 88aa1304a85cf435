use std::fmt;
use std::time::{Duration, Instant};

use glam::Vec3;
use log::{debug, warn};
use raytracer_shared::{Aabb, BvhConfig, BvhNode, NodeKind};

use crate::lights::LightSet;
use crate::model::Model;
use crate::triangle::TriangleRecord;

/// Runtime parameters of a BVH build
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildOptions {
    max_leaf_tris: u32,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_leaf_tris: BvhConfig::MAX_LEAF_TRIS,
        }
    }
}

impl BuildOptions {
    pub fn with_max_leaf_tris(max_leaf_tris: u32) -> Self {
        assert!(max_leaf_tris >= 1, "leaves must be allowed to hold a triangle");
        Self { max_leaf_tris }
    }

    /// Ranges of at most this many triangles become leaves
    pub fn max_leaf_tris(&self) -> u32 {
        self.max_leaf_tris
    }
}

/// Flattened BVH plus the emissive triangle table, ready for upload.
///
/// `nodes[0]` is the root. Leaves address slots of `map`, which holds the
/// original triangle id stored at each slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BvhTree {
    pub nodes: Vec<BvhNode>,
    pub map: Vec<u32>,
    pub lights: Vec<u32>,
    pub light_areas: Vec<f32>,
    pub total_light_area: f32,
}

impl BvhTree {
    /// Build with default options
    pub fn build(model: &Model) -> Self {
        BvhBuilder::default().build(model)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.map.clear();
        self.lights.clear();
        self.light_areas.clear();
        self.total_light_area = 0.0;
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&BvhNode> {
        self.nodes.get(BvhConfig::ROOT as usize)
    }

    pub fn node_kind(&self, index: u32) -> NodeKind {
        self.nodes[index as usize].kind()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// Edges on the longest root-to-leaf path; zero for a single leaf or empty tree
    pub fn depth(&self) -> u32 {
        if self.is_empty() {
            return 0;
        }

        let mut deepest = 0;
        let mut stack = vec![(BvhConfig::ROOT, 0u32)];
        while let Some((index, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let NodeKind::Internal { left, right } = self.node_kind(index) {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        deepest
    }

    /// Index triples in slot order, so leaf ranges address triangles directly
    pub fn permuted_indices(&self, indices: &[u32]) -> Vec<u32> {
        self.map
            .iter()
            .flat_map(|&original| {
                let base = original as usize * 3;
                indices[base..base + 3].iter().copied()
            })
            .collect()
    }
}

/// Summary of one build
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuildStats {
    pub triangle_count: usize,
    pub node_count: usize,
    pub leaf_count: usize,
    pub internal_count: usize,
    pub max_depth: u32,
    pub max_leaf_size: u32,
    pub light_count: usize,
    pub total_light_area: f32,
    pub build_time: Duration,
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} triangles -> {} nodes ({} leaves, {} internal), depth {}, largest leaf {}, \
             {} lights ({:.3} area) in {:.2?}",
            self.triangle_count,
            self.node_count,
            self.leaf_count,
            self.internal_count,
            self.max_depth,
            self.max_leaf_size,
            self.light_count,
            self.total_light_area,
            self.build_time,
        )
    }
}

/// Median-split BVH builder for triangle meshes
#[derive(Clone, Copy, Debug, Default)]
pub struct BvhBuilder {
    options: BuildOptions,
}

impl BvhBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> BuildOptions {
        self.options
    }

    pub fn build(&self, model: &Model) -> BvhTree {
        let mut tree = BvhTree::default();
        self.build_into(model, &mut tree);
        tree
    }

    /// Replace the contents of `tree` with a BVH over `model`.
    ///
    /// An empty model produces an empty tree. Out-of-range vertex or material
    /// indices panic; validate untrusted models first.
    pub fn build_into(&self, model: &Model, tree: &mut BvhTree) -> BuildStats {
        let start_time = Instant::now();
        debug_assert_eq!(model.indices.len() % 3, 0, "index stream must hold whole triangles");

        let triangle_count = model.triangle_count();
        let mut triangles = Vec::with_capacity(triangle_count);
        let mut lights = LightSet::new();

        for triangle in 0..triangle_count {
            let positions = model.triangle_positions(triangle);
            triangles.push(TriangleRecord::new(triangle as u32, positions));
            lights.consider(triangle as u32, positions, model.triangle_material(triangle));
        }

        tree.clear();
        tree.nodes.reserve(triangle_count * 2);

        let mut stats = BuildStats {
            triangle_count,
            light_count: lights.len(),
            total_light_area: lights.total_area,
            ..Default::default()
        };

        if triangles.is_empty() {
            warn!("Building BVH over a model without triangles; tree is empty");
        } else {
            self.build_node(
                &mut tree.nodes,
                &mut triangles,
                0,
                triangle_count as u32,
                0,
                &mut stats,
            );
        }

        tree.map = triangles.iter().map(|t| t.original_index).collect();
        tree.lights = lights.ids;
        tree.light_areas = lights.areas;
        tree.total_light_area = lights.total_area;

        stats.node_count = tree.nodes.len();
        stats.internal_count = stats.node_count - stats.leaf_count;
        stats.build_time = start_time.elapsed();
        debug!("BVH build: {}", stats);

        stats
    }

    /// Build the subtree over `triangles[begin..end]` and return its node index.
    /// The slot is reserved before recursing so children always follow parents.
    fn build_node(
        &self,
        nodes: &mut Vec<BvhNode>,
        triangles: &mut [TriangleRecord],
        begin: u32,
        end: u32,
        depth: u32,
        stats: &mut BuildStats,
    ) -> u32 {
        debug_assert!(begin < end, "empty triangle range {}..{}", begin, end);

        let (bounds, centroid_bounds) = triangles[begin as usize..end as usize].iter().fold(
            (Aabb::empty(), Aabb::empty()),
            |(bounds, centroids), t| {
                (
                    bounds.union(&t.bounds),
                    centroids.union_point(t.centroid.to_array()),
                )
            },
        );

        let node_index = nodes.len() as u32;
        nodes.push(BvhNode::leaf(bounds, begin, end));
        stats.max_depth = stats.max_depth.max(depth);

        let count = end - begin;
        // A zero limit would split single triangles forever
        if count <= self.options.max_leaf_tris.max(1) {
            stats.leaf_count += 1;
            stats.max_leaf_size = stats.max_leaf_size.max(count);
            return node_index;
        }

        let axis = split_axis(centroid_bounds.extent());
        let mid = begin + count / 2;
        partition_at(
            &mut triangles[begin as usize..end as usize],
            (mid - begin) as usize,
            axis,
        );

        let left = self.build_node(nodes, triangles, begin, mid, depth + 1, stats);
        let right = self.build_node(nodes, triangles, mid, end, depth + 1, stats);

        nodes[node_index as usize] = BvhNode::internal(bounds, left, right);
        node_index
    }
}

/// Axis of largest extent; ties go to the earlier axis (x, then y, then z)
pub fn split_axis(extent: Vec3) -> usize {
    let mut axis = 0;
    if extent.y > extent[axis] {
        axis = 1;
    }
    if extent.z > extent[axis] {
        axis = 2;
    }
    axis
}

/// Reorder so the first `nth` records have the smallest centroids along `axis`.
/// Equal coordinates are ordered by original id, which keeps builds reproducible.
fn partition_at(triangles: &mut [TriangleRecord], nth: usize, axis: usize) {
    triangles.select_nth_unstable_by(nth, |a, b| {
        a.centroid[axis]
            .total_cmp(&b.centroid[axis])
            .then(a.original_index.cmp(&b.original_index))
    });
}
