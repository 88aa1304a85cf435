//! Emissive triangle extraction for light importance sampling.
//!
//! The output is the raw input of an area-weighted discrete distribution: triangle
//! ids in ascending order, their areas, and the sum of those areas.

use glam::Vec3;
use raytracer_shared::Material;

use crate::model::Model;
use crate::triangle::triangle_area;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LightSet {
    /// Original ids of emissive triangles
    pub ids: Vec<u32>,
    /// Area of each triangle in `ids`
    pub areas: Vec<f32>,
    pub total_area: f32,
}

impl LightSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Record triangle `id` if its material emits and it has positive area.
    /// Calls must come in ascending `id` order.
    pub fn consider(&mut self, id: u32, [p0, p1, p2]: [Vec3; 3], material: &Material) {
        if !material.is_emissive() {
            return;
        }

        let area = triangle_area(p0, p1, p2);
        if area.is_nan() || area <= 0.0 {
            return;
        }

        debug_assert!(self.ids.last().map_or(true, |&last| last < id));
        self.ids.push(id);
        self.areas.push(area);
        self.total_area += area;
    }
}

/// Collect the emissive triangles of `model`
pub fn extract_lights(model: &Model) -> LightSet {
    let mut lights = LightSet::new();
    for triangle in 0..model.triangle_count() {
        lights.consider(
            triangle as u32,
            model.triangle_positions(triangle),
            model.triangle_material(triangle),
        );
    }
    lights
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;
    use raytracer_shared::Vertex;

    fn lamp() -> Material {
        Material::emissive([1.0; 3], [5.0, 5.0, 5.0])
    }

    #[test]
    fn test_non_emissive_model_has_no_lights() {
        let lights = extract_lights(&Model::cube(Material::diffuse([0.7; 3])));
        assert!(lights.is_empty());
        assert!(lights.areas.is_empty());
        assert_eq!(lights.total_area, 0.0);
    }

    #[test]
    fn test_emissive_quad_lights_sum_to_its_area() {
        let mut model = Model::cube(Material::diffuse([0.7; 3]));
        model += &Model::quad(lamp()).transformed(&Mat4::from_scale(Vec3::new(2.0, 1.0, 3.0)));

        let lights = extract_lights(&model);
        assert_eq!(lights.ids, vec![12, 13]);
        assert_eq!(lights.len(), lights.areas.len());
        assert_eq!(lights.total_area, lights.areas.iter().sum::<f32>());
        assert!((lights.total_area - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_area_emitters_are_skipped() {
        let mut model = Model::quad(lamp());
        // Collapse the second triangle onto a line
        model.vertices.push(Vertex::new([5.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0; 2], 0));
        model.vertices.push(Vertex::new([6.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0; 2], 0));
        model.indices.extend_from_slice(&[4, 5, 5]);

        let lights = extract_lights(&model);
        assert_eq!(lights.ids, vec![0, 1]);
        assert!(lights.areas.iter().all(|&area| area > 0.0));
    }

    #[test]
    fn test_material_comes_from_first_vertex() {
        let mut model = Model::quad(Material::diffuse([0.5; 3]));
        model.materials.push(lamp());
        // Both triangles start at vertex 0
        model.vertices[1].material = 1;

        let lights = extract_lights(&model);
        assert!(lights.is_empty());

        model.vertices[0].material = 1;
        let lights = extract_lights(&model);
        assert_eq!(lights.ids, vec![0, 1]);
    }
}
