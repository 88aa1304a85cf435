use std::path::Path;

use glam::{Mat4, Vec3};
use log::{info, warn};
use raytracer_shared::Material;

use crate::bvh::{BuildOptions, BuildStats, BvhBuilder, BvhTree};
use crate::error::GltfError;
use crate::gltf_loader::GltfLoader;
use crate::model::Model;

/// Scene geometry together with the acceleration structure built over it
pub struct SceneState {
    pub model: Model,
    pub tree: BvhTree,
    options: BuildOptions,
    stats: BuildStats,
}

impl SceneState {
    pub fn new() -> Self {
        Self::with_options(BuildOptions::default())
    }

    /// Default scene built with `options`
    pub fn with_options(options: BuildOptions) -> Self {
        Self::from_model(build_default_scene(), options)
    }

    pub fn from_model(model: Model, options: BuildOptions) -> Self {
        let mut scene = Self {
            model: Model::new(),
            tree: BvhTree::default(),
            options,
            stats: BuildStats::default(),
        };
        scene.replace_model(model);
        scene
    }

    /// Load scene from glTF file
    pub fn load_from_gltf<P: AsRef<Path>>(
        path: P,
        scene_index: Option<usize>,
        options: BuildOptions,
    ) -> Result<Self, GltfError> {
        let loader = GltfLoader::load_from_path(&path)?;
        let model = loader.extract_model(scene_index)?;
        Ok(Self::from_model(model, options))
    }

    /// Load scene from glTF file with fallback to default scene
    pub fn load_from_gltf_or_default<P: AsRef<Path>>(path: P, options: BuildOptions) -> Self {
        match Self::load_from_gltf(path.as_ref(), None, options) {
            Ok(scene) => {
                info!("Successfully loaded glTF scene from: {:?}", path.as_ref());
                scene
            }
            Err(e) => {
                warn!(
                    "Failed to load glTF scene from {:?}, using default scene. Error: {}",
                    path.as_ref(),
                    e
                );
                Self::with_options(options)
            }
        }
    }

    /// Swap in new geometry and rebuild the whole tree
    pub fn replace_model(&mut self, model: Model) {
        self.model = model;
        self.stats = BvhBuilder::new(self.options).build_into(&self.model, &mut self.tree);
        info!("Scene ready: {}", self.stats);
    }

    pub fn options(&self) -> BuildOptions {
        self.options
    }

    /// Statistics of the most recent build
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }
}

impl Default for SceneState {
    fn default() -> Self {
        Self::new()
    }
}

/// Floor, three boxes and a ceiling lamp
pub fn build_default_scene() -> Model {
    let mut model = Model::quad(Material::rough([0.8, 0.8, 0.8], 0.9)).transformed(
        &(Mat4::from_translation(Vec3::new(-5.0, 0.0, -5.0))
            * Mat4::from_scale(Vec3::new(10.0, 1.0, 10.0))),
    );

    let boxes = [
        (Vec3::new(-1.0, 0.01, 2.3), Material::diffuse([0.8, 0.3, 0.3])),
        (Vec3::new(2.9, 0.01, 2.6), Material::metallic([0.9, 0.9, 0.9], 0.1)),
        (Vec3::new(2.6, 0.01, -1.2), Material::diffuse([0.3, 0.3, 0.8]).with_clearcoat(1.0, 0.05)),
    ];
    for (corner, material) in boxes {
        model += &Model::cube(material).transformed(&Mat4::from_translation(corner));
    }

    // Lamp faces down from just under a 4 unit ceiling
    let lamp = Model::quad(Material::emissive([1.0, 1.0, 1.0], [15.0, 15.0, 15.0])).transformed(
        &(Mat4::from_translation(Vec3::new(-1.0, 4.0, 1.0))
            * Mat4::from_scale(Vec3::new(2.0, 1.0, 2.0))
            * Mat4::from_rotation_x(std::f32::consts::PI)),
    );
    model += &lamp;

    model
}
