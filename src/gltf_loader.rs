use std::path::Path;

use glam::{Mat3, Mat4, Vec3};
use gltf::mesh::Mode;
use gltf::{Document, Node, Primitive};
use log::{debug, info, warn};
use raytracer_shared::{Material, Vertex};

use crate::error::GltfError;
use crate::model::Model;

/// glTF / GLB loader that flattens a scene into a single [`Model`]
pub struct GltfLoader {
    document: Document,
    buffers: Vec<gltf::buffer::Data>,
}

/// Accumulates primitives while walking the node hierarchy
struct ModelBuilder {
    model: Model,
    default_material: Option<u32>,
}

impl GltfLoader {
    /// Load a glTF or GLB file from path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, GltfError> {
        let (document, buffers, _images) = gltf::import(path)?;
        Ok(Self { document, buffers })
    }

    /// Load GLB from binary data
    pub fn load_from_glb(data: &[u8]) -> Result<Self, GltfError> {
        let (document, buffers, _images) = gltf::import_slice(data)?;
        Ok(Self { document, buffers })
    }

    /// Flatten the requested scene (or the default one) into world-space triangles.
    ///
    /// glTF materials keep their document order; primitives without a material
    /// share one default material appended after them.
    pub fn extract_model(&self, scene_index: Option<usize>) -> Result<Model, GltfError> {
        let scene = if let Some(index) = scene_index {
            self.document
                .scenes()
                .nth(index)
                .ok_or_else(|| GltfError::Validation(format!("Scene {} not found", index)))?
        } else {
            self.document
                .default_scene()
                .or_else(|| self.document.scenes().next())
                .ok_or_else(|| GltfError::Validation("No scenes found in glTF file".to_string()))?
        };

        let mut builder = ModelBuilder {
            model: Model {
                materials: self.document.materials().map(|m| convert_material(&m)).collect(),
                ..Default::default()
            },
            default_material: None,
        };

        for node in scene.nodes() {
            self.process_node(&node, &Mat4::IDENTITY, &mut builder)?;
        }

        let model = builder.model;
        model.validate()?;

        info!(
            "Loaded glTF scene {:?}: {} triangles, {} vertices, {} materials",
            scene.name().unwrap_or("<unnamed>"),
            model.triangle_count(),
            model.vertices.len(),
            model.materials.len()
        );

        Ok(model)
    }

    /// Process a single node and its children recursively
    fn process_node(
        &self,
        node: &Node,
        parent_transform: &Mat4,
        builder: &mut ModelBuilder,
    ) -> Result<(), GltfError> {
        let local_transform = Mat4::from_cols_array_2d(&node.transform().matrix());
        let transform = *parent_transform * local_transform;

        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                self.process_primitive(&primitive, &transform, builder)?;
            }
        }

        for child in node.children() {
            self.process_node(&child, &transform, builder)?;
        }

        Ok(())
    }

    /// Append one primitive's vertices and triangles in world space
    fn process_primitive(
        &self,
        primitive: &Primitive,
        transform: &Mat4,
        builder: &mut ModelBuilder,
    ) -> Result<(), GltfError> {
        let reader = primitive.reader(|buffer| self.buffers.get(buffer.index()).map(|data| data.0.as_slice()));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| GltfError::Validation("Primitive missing position data".to_string()))?
            .collect();
        let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|normals| normals.collect());
        let texcoords: Option<Vec<[f32; 2]>> =
            reader.read_tex_coords(0).map(|coords| coords.into_f32().collect());
        let element_indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        if let Some(&index) = element_indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(GltfError::Validation(format!(
                "Primitive {} references vertex {} (vertex count: {})",
                primitive.index(),
                index,
                positions.len()
            )));
        }

        let triangles = assemble_triangles(primitive.mode(), &element_indices);
        if triangles.is_empty() {
            debug!("Skipping primitive {} with no triangles", primitive.index());
            return Ok(());
        }

        let material = match primitive.material().index() {
            Some(index) => index as u32,
            None => builder.default_material(),
        };

        let model = &mut builder.model;
        let base = model.vertices.len() as u32;
        let normal_transform = Mat3::from_mat4(*transform).inverse().transpose();

        for (i, position) in positions.iter().enumerate() {
            let normal = normals
                .as_ref()
                .and_then(|normals| normals.get(i))
                .map(|&n| (normal_transform * Vec3::from_array(n)).normalize_or_zero())
                .unwrap_or(Vec3::ZERO);
            let texcoord = texcoords
                .as_ref()
                .and_then(|coords| coords.get(i).copied())
                .unwrap_or([0.0; 2]);

            model.vertices.push(Vertex::new(
                transform.transform_point3(Vec3::from_array(*position)).to_array(),
                normal.to_array(),
                texcoord,
                material,
            ));
        }

        model
            .indices
            .extend(triangles.iter().flatten().map(|index| index + base));

        if normals.is_none() {
            fill_face_normals(model, base, &triangles);
        }

        Ok(())
    }

    /// Get list of available scenes
    pub fn list_scenes(&self) -> Vec<(usize, Option<String>)> {
        self.document
            .scenes()
            .enumerate()
            .map(|(index, scene)| (index, scene.name().map(|s| s.to_string())))
            .collect()
    }

    /// Get scene count
    pub fn scene_count(&self) -> usize {
        self.document.scenes().len()
    }
}

impl ModelBuilder {
    fn default_material(&mut self) -> u32 {
        let materials = &mut self.model.materials;
        *self.default_material.get_or_insert_with(|| {
            materials.push(Material::default());
            materials.len() as u32 - 1
        })
    }
}

/// Split a primitive's element list into triangles according to its topology
fn assemble_triangles(mode: Mode, indices: &[u32]) -> Vec<[u32; 3]> {
    match mode {
        Mode::Triangles => {
            if indices.len() % 3 != 0 {
                warn!("Dropping {} trailing indices of a triangle list", indices.len() % 3);
            }
            indices
                .chunks_exact(3)
                .map(|chunk| [chunk[0], chunk[1], chunk[2]])
                .collect()
        }
        Mode::TriangleFan => (1..indices.len().saturating_sub(1))
            .map(|i| [indices[0], indices[i], indices[i + 1]])
            .collect(),
        Mode::TriangleStrip => (0..indices.len().saturating_sub(2))
            .map(|i| {
                // Alternate winding so every triangle faces the same way
                if i % 2 == 0 {
                    [indices[i], indices[i + 1], indices[i + 2]]
                } else {
                    [indices[i + 1], indices[i], indices[i + 2]]
                }
            })
            .collect(),
        other => {
            warn!("Unsupported primitive mode: {:?}", other);
            Vec::new()
        }
    }
}

/// Area-weighted vertex normals for primitives that ship without them
fn fill_face_normals(model: &mut Model, base: u32, triangles: &[[u32; 3]]) {
    let mut accumulated = vec![Vec3::ZERO; model.vertices.len() - base as usize];

    for triangle in triangles {
        let [p0, p1, p2] = triangle.map(|i| Vec3::from_array(model.vertices[(i + base) as usize].position));
        let face = (p1 - p0).cross(p2 - p0);
        for &i in triangle {
            if let Some(normal) = accumulated.get_mut(i as usize) {
                *normal += face;
            }
        }
    }

    for (vertex, normal) in model.vertices[base as usize..].iter_mut().zip(accumulated) {
        vertex.normal = normal.normalize_or_zero().to_array();
    }
}

/// Convert glTF material to raytracer material
fn convert_material(gltf_material: &gltf::Material) -> Material {
    let pbr = gltf_material.pbr_metallic_roughness();
    let base_color = pbr.base_color_factor();
    let strength = gltf_material.emissive_strength().unwrap_or(1.0);
    let emission = gltf_material.emissive_factor().map(|channel| channel * strength);

    Material::new(
        [base_color[0], base_color[1], base_color[2]],
        pbr.metallic_factor(),
        pbr.roughness_factor(),
        emission,
    )
}
