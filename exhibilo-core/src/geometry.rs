/// Geometry primitives shared by every decoder
use nalgebra::{Matrix4, Point3, Vector3};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }

    pub fn from_arrays(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self::new(
            position[0],
            position[1],
            position[2],
            normal[0],
            normal[1],
            normal[2],
        )
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Face normal from the winding order, zero for degenerate faces
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let cross = (v1 - v0).cross(&(v2 - v0));
        cross.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros)
    }
}

/// A triangle soup. Indexed sources (glTF, OBJ) are expanded into it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Build a mesh from indexed vertex data.
    ///
    /// Missing normals are replaced by the face normal. Indices that point
    /// past the end of `positions` make the whole mesh invalid, so the
    /// out-of-range index is returned instead.
    pub fn from_indexed(
        positions: &[[f32; 3]],
        normals: Option<&[[f32; 3]]>,
        indices: &[u32],
    ) -> Result<Self, u32> {
        let mut mesh = Self::with_capacity(indices.len() / 3);
        let normals = normals.filter(|n| n.len() == positions.len());

        for face in indices.chunks_exact(3) {
            let mut corners = [Vertex::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0); 3];
            for (corner, &index) in corners.iter_mut().zip(face) {
                let i = index as usize;
                let position = *positions.get(i).ok_or(index)?;
                let normal = normals.map_or([0.0; 3], |n| n[i]);
                *corner = Vertex::from_arrays(position, normal);
            }

            let mut triangle = Triangle::new(corners[0], corners[1], corners[2]);
            if normals.is_none() {
                let face_normal = triangle.calculate_normal();
                for vertex in &mut triangle.vertices {
                    vertex.normal = face_normal;
                }
            }
            mesh.add_triangle(triangle);
        }

        Ok(mesh)
    }

    /// Append all triangles of another mesh
    pub fn extend(&mut self, other: Mesh) {
        self.triangles.extend(other.triangles);
    }

    /// Iterate over every vertex position, transformed into world space
    pub fn world_positions<'a>(
        &'a self,
        world: &'a Matrix4<f32>,
    ) -> impl Iterator<Item = Point3<f32>> + 'a {
        self.triangles
            .iter()
            .flat_map(|t| t.vertices.iter())
            .map(move |v| world.transform_point(&v.position))
    }

    /// Create a simple cube mesh centered on the origin
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        // (normal, four corners in counter-clockwise order)
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0], [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]]),
            ([0.0, 0.0, -1.0], [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]]),
            ([0.0, 1.0, 0.0], [[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]]),
            ([0.0, -1.0, 0.0], [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]]),
            ([1.0, 0.0, 0.0], [[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]]),
            ([-1.0, 0.0, 0.0], [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]]),
        ];

        let mut mesh = Self::with_capacity(12);
        for (normal, [a, b, c, d]) in faces {
            let v = |p: [f32; 3]| Vertex::from_arrays(p, normal);
            mesh.add_triangle(Triangle::new(v(a), v(b), v(c)));
            mesh.add_triangle(Triangle::new(v(a), v(c), v(d)));
        }
        mesh
    }
}
