/// Wavefront OBJ decoding. Material libraries are never resolved.
use std::io::Cursor;

use tracing::debug;

use crate::error::DecodeError;
use crate::format::ModelFormat;
use crate::geometry::Mesh;
use crate::scene::{DecodedAsset, Material, ModelMesh, SceneNode};

/// Decode OBJ text into one child node per object/group
pub fn decode(data: &[u8]) -> Result<DecodedAsset, DecodeError> {
    let mut root = SceneNode::new(None);
    for (name, mesh) in parse_meshes(data)? {
        let name = (!name.is_empty()).then_some(name);
        root.children
            .push(SceneNode::new(name).with_mesh(ModelMesh::new(mesh, Material::default())));
    }
    debug!(objects = root.children.len(), "decoded OBJ");

    Ok(DecodedAsset::new(ModelFormat::Obj, root))
}

/// Parse every object in the file into a named triangle mesh
pub(crate) fn parse_meshes(data: &[u8]) -> Result<Vec<(String, Mesh)>, DecodeError> {
    let (models, _materials) = tobj::load_obj_buf(
        &mut Cursor::new(data),
        &tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        },
        |_material_path| Err(tobj::LoadError::MaterialParseError),
    )?;

    models
        .into_iter()
        .map(|model| {
            let positions: Vec<[f32; 3]> = model
                .mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect();
            let normals: Vec<[f32; 3]> = model
                .mesh
                .normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect();
            let normals = (normals.len() == positions.len()).then_some(normals);

            let mesh = Mesh::from_indexed(&positions, normals.as_deref(), &model.mesh.indices)
                .map_err(|index| DecodeError::IndexOutOfRange {
                    format: ModelFormat::Obj,
                    index,
                })?;
            Ok((model.name, mesh))
        })
        .collect()
}
