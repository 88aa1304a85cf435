use std::fs;
use std::io;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use log::info;
use raytracer_shared::BvhConfig;

use crate::bvh::BvhTree;
use crate::model::Model;

/// Element counts of every scene buffer, uploaded ahead of them (32 bytes)
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct SceneHeader {
    pub node_count: u32,
    pub triangle_count: u32,
    pub vertex_count: u32,
    pub material_count: u32,
    pub light_count: u32,
    pub root: u32,               // NONE when the tree is empty
    pub total_light_area: f32,
    pub _padding: u32,
}

impl SceneHeader {
    pub fn new(model: &Model, tree: &BvhTree) -> Self {
        Self {
            node_count: tree.nodes.len() as u32,
            triangle_count: model.triangle_count() as u32,
            vertex_count: model.vertices.len() as u32,
            material_count: model.materials.len() as u32,
            light_count: tree.lights.len() as u32,
            root: if tree.is_empty() { BvhConfig::NONE } else { BvhConfig::ROOT },
            total_light_area: tree.total_light_area,
            _padding: 0,
        }
    }
}

/// Byte images of the storage buffers a traversal kernel binds
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GpuBuffers {
    pub header: Vec<u8>,
    pub nodes: Vec<u8>,
    pub map: Vec<u8>,
    pub lights: Vec<u8>,
    pub light_areas: Vec<u8>,
    pub indices: Vec<u8>,
    pub vertices: Vec<u8>,
    pub materials: Vec<u8>,
}

impl GpuBuffers {
    pub fn from_scene(model: &Model, tree: &BvhTree) -> Self {
        let header = SceneHeader::new(model, tree);

        Self {
            header: bytemuck::bytes_of(&header).to_vec(),
            nodes: bytemuck::cast_slice(&tree.nodes).to_vec(),
            map: bytemuck::cast_slice(&tree.map).to_vec(),
            lights: bytemuck::cast_slice(&tree.lights).to_vec(),
            light_areas: bytemuck::cast_slice(&tree.light_areas).to_vec(),
            indices: bytemuck::cast_slice(&model.indices).to_vec(),
            vertices: bytemuck::cast_slice(&model.vertices).to_vec(),
            materials: bytemuck::cast_slice(&model.materials).to_vec(),
        }
    }

    /// Buffers paired with their binding names, in binding order
    pub fn named(&self) -> [(&'static str, &[u8]); 8] {
        [
            ("header", self.header.as_slice()),
            ("nodes", self.nodes.as_slice()),
            ("map", self.map.as_slice()),
            ("lights", self.lights.as_slice()),
            ("light_areas", self.light_areas.as_slice()),
            ("indices", self.indices.as_slice()),
            ("vertices", self.vertices.as_slice()),
            ("materials", self.materials.as_slice()),
        ]
    }

    pub fn total_bytes(&self) -> usize {
        self.named().iter().map(|(_, bytes)| bytes.len()).sum()
    }

    /// Write each buffer to `<dir>/<name>.bin`, creating `dir` if needed
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P) -> io::Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        for (name, bytes) in self.named() {
            fs::write(dir.join(format!("{}.bin", name)), bytes)?;
        }

        info!("Wrote {} bytes of scene buffers to {:?}", self.total_bytes(), dir);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raytracer_shared::{BvhNode, Material, Vertex};

    fn lit_scene() -> Model {
        let mut model = Model::cube(Material::diffuse([0.6; 3]));
        model += &Model::quad(Material::emissive([1.0; 3], [2.0; 3]));
        model
    }

    #[test]
    fn test_header_layout() {
        assert_eq!(std::mem::size_of::<SceneHeader>(), 32);

        let model = lit_scene();
        let tree = BvhTree::build(&model);
        let header = SceneHeader::new(&model, &tree);

        assert_eq!(header.triangle_count, 14);
        assert_eq!(header.vertex_count, 28);
        assert_eq!(header.material_count, 2);
        assert_eq!(header.light_count, 2);
        assert_eq!(header.node_count, tree.nodes.len() as u32);
        assert_eq!(header.root, BvhConfig::ROOT);
        assert_eq!(header.total_light_area, tree.total_light_area);
    }

    #[test]
    fn test_empty_scene_header() {
        let model = Model::new();
        let tree = BvhTree::build(&model);
        let header = SceneHeader::new(&model, &tree);

        assert_eq!(header.root, BvhConfig::NONE);
        assert_eq!(header.node_count, 0);
        assert_eq!(GpuBuffers::from_scene(&model, &tree).total_bytes(), 32);
    }

    #[test]
    fn test_buffer_sizes() {
        let model = lit_scene();
        let tree = BvhTree::build(&model);
        let buffers = GpuBuffers::from_scene(&model, &tree);

        assert_eq!(buffers.nodes.len(), tree.nodes.len() * std::mem::size_of::<BvhNode>());
        assert_eq!(buffers.map.len(), 14 * 4);
        assert_eq!(buffers.lights.len(), 2 * 4);
        assert_eq!(buffers.light_areas.len(), 2 * 4);
        assert_eq!(buffers.indices.len(), 42 * 4);
        assert_eq!(buffers.vertices.len(), 28 * std::mem::size_of::<Vertex>());
        assert_eq!(buffers.materials.len(), 2 * std::mem::size_of::<Material>());

        assert_eq!(buffers.nodes, bytemuck::cast_slice::<BvhNode, u8>(&tree.nodes));
    }

    #[test]
    fn test_write_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("scene");
        let model = lit_scene();
        let buffers = GpuBuffers::from_scene(&model, &BvhTree::build(&model));

        buffers.write_to_dir(&out).unwrap();

        for (name, bytes) in buffers.named() {
            let written = std::fs::read(out.join(format!("{}.bin", name))).unwrap();
            assert_eq!(written, bytes);
        }
    }
}
