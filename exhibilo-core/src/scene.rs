/// Decoded scene tree: nodes, meshes and their materials
use nalgebra::Matrix4;

use crate::format::ModelFormat;
use crate::geometry::Mesh;

/// Surface parameters carried over from the source file (or synthesized
/// when the format has none).
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: Option<String>,
    /// Linear RGBA
    pub base_color: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
    pub wireframe: bool,
}

impl Material {
    /// The material synthesized for STL geometry (`#dddddd`, mostly rough).
    pub fn stl_default() -> Self {
        let grey = f32::from(0xdd_u8) / 255.0;
        Self {
            name: None,
            base_color: [grey, grey, grey, 1.0],
            metalness: 0.1,
            roughness: 0.8,
            wireframe: false,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color: [1.0, 1.0, 1.0, 1.0],
            metalness: 1.0,
            roughness: 1.0,
            wireframe: false,
        }
    }
}

/// A mesh attached to a scene node
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMesh {
    pub mesh: Mesh,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl ModelMesh {
    pub fn new(mesh: Mesh, material: Material) -> Self {
        Self {
            mesh,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn with_shadows(mut self) -> Self {
        self.cast_shadow = true;
        self.receive_shadow = true;
        self
    }
}

/// One node of the scene tree. `transform` is relative to the parent.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: Option<String>,
    pub transform: Matrix4<f32>,
    pub meshes: Vec<ModelMesh>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            transform: Matrix4::identity(),
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_mesh(mut self, mesh: ModelMesh) -> Self {
        self.meshes.push(mesh);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    fn visit<'a, F>(&'a self, parent: &Matrix4<f32>, f: &mut F)
    where
        F: FnMut(&Matrix4<f32>, &'a ModelMesh),
    {
        let world = parent * self.transform;
        for mesh in &self.meshes {
            f(&world, mesh);
        }
        for child in &self.children {
            child.visit(&world, f);
        }
    }

    fn visit_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut ModelMesh),
    {
        self.meshes.iter_mut().for_each(&mut *f);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }
}

/// The in-memory result of decoding one asset
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAsset {
    pub format: ModelFormat,
    pub root: SceneNode,
}

impl DecodedAsset {
    pub fn new(format: ModelFormat, root: SceneNode) -> Self {
        Self { format, root }
    }

    /// Walk every mesh together with its world transform
    pub fn for_each_mesh<'a, F>(&'a self, mut f: F)
    where
        F: FnMut(&Matrix4<f32>, &'a ModelMesh),
    {
        self.root.visit(&Matrix4::identity(), &mut f);
    }

    pub fn for_each_mesh_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut ModelMesh),
    {
        self.root.visit_mut(&mut f);
    }

    pub fn triangle_count(&self) -> usize {
        let mut count = 0;
        self.for_each_mesh(|_, m| count += m.mesh.triangles.len());
        count
    }

    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.for_each_mesh(|_, _| count += 1);
        count
    }

    /// Toggle wireframe rendering on every material in the tree
    pub fn set_wireframe(&mut self, wireframe: bool) {
        self.for_each_mesh_mut(|m| m.material.wireframe = wireframe);
    }
}
