/// Minimal in-memory model files for the decoder tests.
use base64::Engine as _;
use serde_json::{json, Value};

/// Binary STL with a "solid" header and zeroed normals
pub(crate) fn binary_stl(triangles: &[[[f32; 3]; 3]]) -> Vec<u8> {
    let mut data = vec![0u8; 80];
    data[..5].copy_from_slice(b"solid");
    data.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
    for triangle in triangles {
        data.extend([0u8; 12]);
        for corner in triangle {
            for value in corner {
                data.extend_from_slice(&value.to_le_bytes());
            }
        }
        data.extend_from_slice(&[0, 0]);
    }
    data
}

pub(crate) const OBJ_TETRA: &str = "\
# tetrahedron, 2 x 4 x 1
o stand
v 0 0 0
v 2 0 0
v 0 4 0
v 0 0 1
f 1 3 2
f 1 2 4
f 1 4 3
f 2 3 4
";

/// Positions of the single glTF triangle, followed by its u16 indices
fn triangle_buffer() -> Vec<u8> {
    let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
    let mut buffer = Vec::new();
    for p in positions {
        for value in p {
            buffer.extend_from_slice(&value.to_le_bytes());
        }
    }
    for index in [0u16, 1, 2] {
        buffer.extend_from_slice(&index.to_le_bytes());
    }
    buffer
}

fn triangle_document(buffer: Value) -> Value {
    json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "base", "translation": [10.0, 0.0, 0.0], "children": [1] },
            { "name": "panel", "mesh": 0, "scale": [3.0, 3.0, 3.0] }
        ],
        "materials": [{
            "name": "acrylic",
            "pbrMetallicRoughness": {
                "baseColorFactor": [1.0, 0.0, 0.0, 1.0],
                "metallicFactor": 0.0,
                "roughnessFactor": 0.5
            }
        }],
        "meshes": [{
            "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }]
        }],
        "buffers": [buffer],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
        ],
        "accessors": [
            {
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [4.0, 2.0, 0.0]
            },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    })
}

/// Self-contained `.gltf` with the buffer embedded as a data URI
pub(crate) fn gltf_json() -> Vec<u8> {
    let buffer = triangle_buffer();
    let uri = format!(
        "data:application/octet-stream;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&buffer)
    );
    let doc = triangle_document(json!({ "byteLength": buffer.len(), "uri": uri }));
    serde_json::to_vec(&doc).unwrap()
}

/// A `.gltf` whose buffer lives in `stand.bin` beside it, plus that buffer
pub(crate) fn gltf_external() -> (Vec<u8>, Vec<u8>) {
    let buffer = triangle_buffer();
    let doc = triangle_document(json!({ "byteLength": buffer.len(), "uri": "stand.bin" }));
    (serde_json::to_vec(&doc).unwrap(), buffer)
}

/// The same scene packed as a `.glb`
pub(crate) fn glb() -> Vec<u8> {
    let buffer = triangle_buffer();
    let doc = triangle_document(json!({ "byteLength": buffer.len() }));
    pack_glb(serde_json::to_vec(&doc).unwrap(), buffer)
}

/// A `.gltf` whose only primitive is Draco-compressed
pub(crate) fn gltf_draco() -> Vec<u8> {
    let compressed = b"DRACO\x02\x02\x01\x01\x00\x00".to_vec();
    let uri = format!(
        "data:application/octet-stream;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&compressed)
    );
    let doc = json!({
        "asset": { "version": "2.0" },
        "extensionsUsed": ["KHR_draco_mesh_compression"],
        "extensionsRequired": ["KHR_draco_mesh_compression"],
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{
            "primitives": [{
                "attributes": { "POSITION": 0 },
                "indices": 1,
                "extensions": {
                    "KHR_draco_mesh_compression": {
                        "bufferView": 0,
                        "attributes": { "POSITION": 0 }
                    }
                }
            }]
        }],
        "buffers": [{ "byteLength": compressed.len(), "uri": uri }],
        "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": compressed.len() }],
        "accessors": [
            {
                "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 1.0]
            },
            { "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    });
    serde_json::to_vec(&doc).unwrap()
}

fn pack_glb(mut json: Vec<u8>, mut bin: Vec<u8>) -> Vec<u8> {
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    let total = 12 + 8 + json.len() + 8 + bin.len();

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json);
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(b"BIN\0");
    out.extend_from_slice(&bin);
    out
}
