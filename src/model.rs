use std::ops::AddAssign;

use glam::{Mat3, Mat4, Vec3};
use raytracer_shared::{Material, Vertex};

use crate::error::ModelError;

/// Indexed triangle mesh with a material table.
///
/// Every three consecutive entries of `indices` form one triangle; a triangle's
/// material is the one referenced by its first vertex.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Model {
    pub indices: Vec<u32>,
    pub vertices: Vec<Vertex>,
    pub materials: Vec<Material>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.indices.clear();
        self.vertices.clear();
        self.materials.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex indices of triangle `triangle`
    pub fn triangle_indices(&self, triangle: usize) -> [u32; 3] {
        let base = triangle * 3;
        [self.indices[base], self.indices[base + 1], self.indices[base + 2]]
    }

    /// Positions of the three corners of triangle `triangle`
    pub fn triangle_positions(&self, triangle: usize) -> [Vec3; 3] {
        self.triangle_indices(triangle)
            .map(|index| Vec3::from_array(self.vertices[index as usize].position))
    }

    /// Material of the first vertex of triangle `triangle`
    pub fn triangle_material(&self, triangle: usize) -> &Material {
        let first = self.indices[triangle * 3] as usize;
        &self.materials[self.vertices[first].material as usize]
    }

    /// Append `other`, rebasing its vertex and material indices onto this model
    pub fn append(&mut self, other: &Model) {
        let vertex_count = self.vertices.len() as u32;
        let material_count = self.materials.len() as u32;

        self.indices
            .extend(other.indices.iter().map(|index| index + vertex_count));
        self.vertices.extend(other.vertices.iter().map(|vertex| Vertex {
            material: vertex.material + material_count,
            ..*vertex
        }));
        self.materials.extend_from_slice(&other.materials);
    }

    /// Copy of this model with positions transformed by `transform` and normals by
    /// its inverse transpose
    pub fn transformed(&self, transform: &Mat4) -> Model {
        let normal_transform = Mat3::from_mat4(*transform).inverse().transpose();

        let vertices = self
            .vertices
            .iter()
            .map(|vertex| Vertex {
                position: transform
                    .transform_point3(Vec3::from_array(vertex.position))
                    .to_array(),
                normal: (normal_transform * Vec3::from_array(vertex.normal))
                    .normalize_or_zero()
                    .to_array(),
                ..*vertex
            })
            .collect();

        Model {
            indices: self.indices.clone(),
            vertices,
            materials: self.materials.clone(),
        }
    }

    /// Check that every index and material reference resolves
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.indices.len() % 3 != 0 {
            return Err(ModelError::IndexCountNotMultipleOfThree(self.indices.len()));
        }

        if let Some((position, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &index)| index as usize >= self.vertices.len())
        {
            return Err(ModelError::VertexIndexOutOfRange {
                triangle: position / 3,
                index,
                vertex_count: self.vertices.len(),
            });
        }

        if let Some((position, vertex)) = self
            .vertices
            .iter()
            .enumerate()
            .find(|(_, vertex)| vertex.material as usize >= self.materials.len())
        {
            return Err(ModelError::MaterialIndexOutOfRange {
                vertex: position,
                material: vertex.material,
                material_count: self.materials.len(),
            });
        }

        Ok(())
    }

    /// Unit square spanning [0,1] in X and Z at y = 0, facing +Y
    pub fn quad(material: Material) -> Model {
        let mut model = Model {
            materials: vec![material],
            ..Default::default()
        };
        model.push_face(Vec3::ZERO, Vec3::Z, Vec3::X, 0);
        model
    }

    /// Unit cube spanning [0,1]^3 with outward face normals
    pub fn cube(material: Material) -> Model {
        let mut model = Model {
            materials: vec![material],
            ..Default::default()
        };
        model.push_face(Vec3::ZERO, Vec3::X, Vec3::Z, 0); // -Y
        model.push_face(Vec3::Y, Vec3::Z, Vec3::X, 0); // +Y
        model.push_face(Vec3::ZERO, Vec3::Z, Vec3::Y, 0); // -X
        model.push_face(Vec3::X, Vec3::Y, Vec3::Z, 0); // +X
        model.push_face(Vec3::ZERO, Vec3::Y, Vec3::X, 0); // -Z
        model.push_face(Vec3::Z, Vec3::X, Vec3::Y, 0); // +Z
        model
    }

    /// Parallelogram `corner + s*u + t*v`, two triangles wound so the normal is `u x v`
    fn push_face(&mut self, corner: Vec3, u: Vec3, v: Vec3, material: u32) {
        let base = self.vertices.len() as u32;
        let normal = u.cross(v).normalize_or_zero().to_array();
        let corners = [
            (corner, [0.0, 0.0]),
            (corner + u, [1.0, 0.0]),
            (corner + u + v, [1.0, 1.0]),
            (corner + v, [0.0, 1.0]),
        ];
        for (position, texcoord) in corners {
            self.vertices
                .push(Vertex::new(position.to_array(), normal, texcoord, material));
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

impl AddAssign<&Model> for Model {
    fn add_assign(&mut self, other: &Model) {
        self.append(other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangle::triangle_area;

    #[test]
    fn test_append_rebases_indices_and_materials() {
        let mut scene = Model::quad(Material::diffuse([0.5; 3]));
        let cube = Model::cube(Material::emissive([1.0; 3], [4.0; 3]));
        scene += &cube;

        assert_eq!(scene.triangle_count(), 2 + 12);
        assert_eq!(scene.vertices.len(), 4 + 24);
        assert_eq!(scene.materials.len(), 2);
        assert_eq!(scene.indices[6], 4);
        assert_eq!(scene.vertices[4].material, 1);
        assert!(!scene.triangle_material(0).is_emissive());
        assert!(scene.triangle_material(2).is_emissive());
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_cube_faces_point_outward() {
        let cube = Model::cube(Material::default());
        let center = Vec3::splat(0.5);
        let mut total_area = 0.0f32;

        for triangle in 0..cube.triangle_count() {
            let [p0, p1, p2] = cube.triangle_positions(triangle);
            let geometric_normal = (p1 - p0).cross(p2 - p0);
            let first = cube.triangle_indices(triangle)[0] as usize;
            let shading_normal = Vec3::from_array(cube.vertices[first].normal);

            assert!(geometric_normal.dot(p0 - center) > 0.0);
            assert!(geometric_normal.dot(shading_normal) > 0.0);
            total_area += triangle_area(p0, p1, p2);
        }
        assert!((total_area - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_transformed_moves_positions_and_renormalizes() {
        let quad = Model::quad(Material::default());
        let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
            * Mat4::from_scale(Vec3::new(10.0, 1.0, 10.0));
        let moved = quad.transformed(&transform);

        assert_eq!(moved.indices, quad.indices);
        assert_eq!(moved.vertices[2].position, [11.0, 2.0, 13.0]);
        for vertex in &moved.vertices {
            assert!(Vec3::from_array(vertex.normal).abs_diff_eq(Vec3::Y, 1e-6));
        }

        let tilted = quad.transformed(
            &(Mat4::from_scale(Vec3::new(1.0, 1.0, 2.0))
                * Mat4::from_rotation_x(std::f32::consts::FRAC_PI_4)),
        );
        for vertex in &tilted.vertices {
            assert!((Vec3::from_array(vertex.normal).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_validate_rejects_bad_references() {
        let mut model = Model::quad(Material::default());
        model.indices.push(0);
        assert_eq!(
            model.validate(),
            Err(ModelError::IndexCountNotMultipleOfThree(7))
        );

        let mut model = Model::quad(Material::default());
        model.indices[4] = 9;
        assert_eq!(
            model.validate(),
            Err(ModelError::VertexIndexOutOfRange {
                triangle: 1,
                index: 9,
                vertex_count: 4
            })
        );

        let mut model = Model::quad(Material::default());
        model.vertices[3].material = 2;
        assert_eq!(
            model.validate(),
            Err(ModelError::MaterialIndexOutOfRange {
                vertex: 3,
                material: 2,
                material_count: 1
            })
        );
    }

    #[test]
    fn test_clear_empties_model() {
        let mut model = Model::cube(Material::default());
        model.clear();
        assert!(model.is_empty());
        assert_eq!(model, Model::new());
    }
}
