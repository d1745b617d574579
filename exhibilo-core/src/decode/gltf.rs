/// glTF 2.0 decoding for both `.gltf` (JSON) and `.glb` (binary) files
use std::collections::HashMap;

use base64::Engine as _;
use gltf::buffer::Source;
use gltf::{Document, Gltf};
use nalgebra::Matrix4;
use tracing::{debug, warn};

use super::draco::{DracoPrimitives, MeshCodec};
use crate::error::DecodeError;
use crate::format::ModelFormat;
use crate::geometry::Mesh;
use crate::scene::{DecodedAsset, Material, ModelMesh, SceneNode};

const MAX_NODE_DEPTH: usize = 128;

/// Buffers stored beside a `.gltf`, keyed by the `uri` the file gives them
pub type ExternalBuffers = HashMap<String, Vec<u8>>;

struct Context<'a> {
    document: &'a Document,
    buffers: &'a [gltf::buffer::Data],
    draco: DracoPrimitives,
    codec: Option<&'a dyn MeshCodec>,
    meshes: HashMap<usize, Vec<ModelMesh>>,
}

/// Decode a self-contained glTF or GLB.
///
/// Buffers must be embedded (GLB binary chunk or `data:` URIs). Primitives
/// compressed with Draco go through `codec`, which is required as soon as
/// one is present.
pub fn decode(
    data: &[u8],
    format: ModelFormat,
    codec: Option<&dyn MeshCodec>,
) -> Result<DecodedAsset, DecodeError> {
    decode_with_buffers(data, format, codec, &ExternalBuffers::new())
}

/// Relative `uri`s of the buffers a glTF keeps outside itself, in file order
pub fn external_buffer_uris(data: &[u8]) -> Result<Vec<String>, DecodeError> {
    let Gltf { document, .. } = Gltf::from_slice_without_validation(data)?;
    let mut uris: Vec<String> = Vec::new();
    for buffer in document.buffers() {
        if let Source::Uri(uri) = buffer.source() {
            if !uri.starts_with("data:") && !uris.iter().any(|known| known == uri) {
                uris.push(uri.to_owned());
            }
        }
    }
    Ok(uris)
}

/// Like [`decode`], taking buffers that live outside the file from `external`
pub fn decode_with_buffers(
    data: &[u8],
    format: ModelFormat,
    codec: Option<&dyn MeshCodec>,
    external: &ExternalBuffers,
) -> Result<DecodedAsset, DecodeError> {
    // Validation would reject the Draco entry in `extensionsRequired`
    let Gltf { document, blob } = Gltf::from_slice_without_validation(data)?;

    let draco = if data.starts_with(b"glTF") {
        DracoPrimitives::from_json(&gltf::Glb::from_slice(data)?.json)?
    } else {
        DracoPrimitives::from_json(data)?
    };
    if !draco.is_empty() && codec.is_none() {
        return Err(DecodeError::DracoNotConfigured);
    }

    let buffers = load_buffers(&document, blob, external)?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(DecodeError::MissingScene)?;

    let mut ctx = Context {
        document: &document,
        buffers: &buffers,
        draco,
        codec,
        meshes: HashMap::new(),
    };

    let mut root = SceneNode::new(scene.name().map(str::to_owned));
    for node in scene.nodes() {
        root.children.push(build_node(&mut ctx, &node, 0)?);
    }
    debug!(
        meshes = ctx.meshes.len(),
        nodes = document.nodes().len(),
        "decoded glTF scene"
    );

    Ok(DecodedAsset::new(format, root))
}

fn load_buffers(
    document: &Document,
    mut blob: Option<Vec<u8>>,
    external: &ExternalBuffers,
) -> Result<Vec<gltf::buffer::Data>, DecodeError> {
    let mut buffers = Vec::with_capacity(document.buffers().len());
    for buffer in document.buffers() {
        let mut data = match buffer.source() {
            Source::Bin => blob
                .take()
                .ok_or_else(|| DecodeError::MissingBuffer("GLB binary chunk".to_owned()))?,
            Source::Uri(uri) if uri.starts_with("data:") => decode_data_uri(uri)?,
            Source::Uri(uri) => external
                .get(uri)
                .cloned()
                .ok_or_else(|| DecodeError::MissingBuffer(uri.to_owned()))?,
        };
        if data.len() < buffer.length() {
            return Err(DecodeError::BufferTooShort {
                index: buffer.index(),
                expected: buffer.length(),
                actual: data.len(),
            });
        }
        // accessors may read up to the next 4-byte boundary
        while data.len() % 4 != 0 {
            data.push(0);
        }
        buffers.push(gltf::buffer::Data(data));
    }
    Ok(buffers)
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>, DecodeError> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| DecodeError::DataUri("missing ','".to_owned()))?;
    if !header.ends_with(";base64") {
        return Err(DecodeError::DataUri(format!("{header} is not base64")));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|err| DecodeError::DataUri(err.to_string()))
}

fn build_node(
    ctx: &mut Context<'_>,
    node: &gltf::Node<'_>,
    depth: usize,
) -> Result<SceneNode, DecodeError> {
    if depth >= MAX_NODE_DEPTH {
        return Err(DecodeError::NodeDepth(MAX_NODE_DEPTH));
    }

    let mut out = SceneNode::new(node.name().map(str::to_owned));
    out.transform = Matrix4::from(node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        if !ctx.meshes.contains_key(&mesh.index()) {
            let decoded = decode_mesh(ctx, &mesh)?;
            ctx.meshes.insert(mesh.index(), decoded);
        }
        out.meshes = ctx.meshes[&mesh.index()].clone();
    }

    for child in node.children() {
        out.children.push(build_node(ctx, &child, depth + 1)?);
    }
    Ok(out)
}

fn decode_mesh(ctx: &Context<'_>, mesh: &gltf::Mesh<'_>) -> Result<Vec<ModelMesh>, DecodeError> {
    let mut out = Vec::new();
    for primitive in mesh.primitives() {
        let material = material(&primitive.material());

        let triangles = match (ctx.draco.get(mesh.index(), primitive.index()), ctx.codec) {
            (Some(extension), Some(codec)) => {
                let compressed = buffer_view_bytes(ctx, extension.buffer_view)?;
                codec.decode(compressed)?
            }
            (Some(_), None) => return Err(DecodeError::DracoNotConfigured),
            (None, _) => {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    warn!(
                        mesh = mesh.index(),
                        primitive = primitive.index(),
                        mode = ?primitive.mode(),
                        "skipping non-triangle primitive"
                    );
                    continue;
                }
                read_primitive(ctx, mesh.index(), &primitive)?
            }
        };

        out.push(ModelMesh::new(triangles, material));
    }
    Ok(out)
}

fn read_primitive(
    ctx: &Context<'_>,
    mesh_index: usize,
    primitive: &gltf::Primitive<'_>,
) -> Result<Mesh, DecodeError> {
    let reader = primitive.reader(|buffer| ctx.buffers.get(buffer.index()).map(|data| &**data));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or(DecodeError::MissingPositions {
            mesh: mesh_index,
            primitive: primitive.index(),
        })?
        .collect();
    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(Iterator::collect);
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    Mesh::from_indexed(&positions, normals.as_deref(), &indices).map_err(|index| {
        DecodeError::IndexOutOfRange {
            format: ModelFormat::GltfJson,
            index,
        }
    })
}

fn buffer_view_bytes<'a>(ctx: &Context<'a>, index: usize) -> Result<&'a [u8], DecodeError> {
    let view = ctx
        .document
        .views()
        .nth(index)
        .ok_or_else(|| DecodeError::Draco(format!("buffer view {index} does not exist")))?;
    let start = view.offset();
    let end = start
        .checked_add(view.length())
        .ok_or_else(|| DecodeError::Draco(format!("buffer view {index} is out of range")))?;

    ctx.buffers
        .get(view.buffer().index())
        .and_then(|data| data.get(start..end))
        .ok_or_else(|| DecodeError::Draco(format!("buffer view {index} is out of range")))
}

fn material(material: &gltf::Material<'_>) -> Material {
    let pbr = material.pbr_metallic_roughness();
    Material {
        name: material.name().map(str::to_owned),
        base_color: pbr.base_color_factor(),
        metalness: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        wireframe: false,
    }
}
