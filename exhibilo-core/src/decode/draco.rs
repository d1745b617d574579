/// Draco (`KHR_draco_mesh_compression`) support for glTF primitives.
///
/// Decompression is delegated to a [`MeshCodec`]. The shipped codec drives
/// the reference `draco_decoder` tool from the configured decoder
/// directory, asking it for OBJ output which is then parsed like any other
/// OBJ file.
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::error::DecodeError;
use crate::geometry::Mesh;

/// Glossary name of the glTF extension
pub const EXTENSION_NAME: &str = "KHR_draco_mesh_compression";

const TOOL_NAME: &str = if cfg!(windows) {
    "draco_decoder.exe"
} else {
    "draco_decoder"
};

/// Turns one compressed primitive into triangles
pub trait MeshCodec: Send + Sync + fmt::Debug {
    fn decode(&self, compressed: &[u8]) -> Result<Mesh, DecodeError>;
}

/// The extension object found on a compressed primitive
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DracoExtension {
    pub buffer_view: usize,
    #[serde(default)]
    pub attributes: HashMap<String, u32>,
}

/// Which primitives of a document are compressed, keyed by
/// `(mesh index, primitive index)`.
///
/// Read straight from the JSON so the lookup works whether or not the glTF
/// parser knows the extension.
#[derive(Debug, Default)]
pub struct DracoPrimitives {
    by_primitive: HashMap<(usize, usize), DracoExtension>,
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    meshes: Vec<RawMesh>,
}

#[derive(Deserialize)]
struct RawMesh {
    #[serde(default)]
    primitives: Vec<RawPrimitive>,
}

#[derive(Deserialize)]
struct RawPrimitive {
    #[serde(default)]
    extensions: HashMap<String, serde_json::Value>,
}

impl DracoPrimitives {
    pub fn from_json(json: &[u8]) -> Result<Self, DecodeError> {
        let raw: RawDocument = serde_json::from_slice(json)
            .map_err(|e| DecodeError::Draco(format!("unreadable glTF JSON: {e}")))?;

        let mut by_primitive = HashMap::new();
        for (mesh_index, mesh) in raw.meshes.into_iter().enumerate() {
            for (primitive_index, mut primitive) in mesh.primitives.into_iter().enumerate() {
                if let Some(value) = primitive.extensions.remove(EXTENSION_NAME) {
                    let extension: DracoExtension = serde_json::from_value(value)
                        .map_err(|e| DecodeError::Draco(format!("invalid {EXTENSION_NAME}: {e}")))?;
                    by_primitive.insert((mesh_index, primitive_index), extension);
                }
            }
        }
        Ok(Self { by_primitive })
    }

    pub fn get(&self, mesh: usize, primitive: usize) -> Option<&DracoExtension> {
        self.by_primitive.get(&(mesh, primitive))
    }

    pub fn is_empty(&self) -> bool {
        self.by_primitive.is_empty()
    }
}

/// Codec that runs the `draco_decoder` command line tool
#[derive(Debug, Clone)]
pub struct DracoDecoder {
    executable: PathBuf,
}

impl DracoDecoder {
    /// `path` is either the decoder directory or the tool itself
    pub fn from_decoder_path(path: &Path) -> Result<Self, DecodeError> {
        let executable = if path.is_dir() {
            path.join(TOOL_NAME)
        } else {
            path.to_path_buf()
        };
        if !executable.is_file() {
            return Err(DecodeError::Draco(format!(
                "no {TOOL_NAME} found at {}",
                executable.display()
            )));
        }
        Ok(Self { executable })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl MeshCodec for DracoDecoder {
    fn decode(&self, compressed: &[u8]) -> Result<Mesh, DecodeError> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("primitive.drc");
        let output = dir.path().join("primitive.obj");
        std::fs::write(&input, compressed)?;

        let result = Command::new(&self.executable)
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .output()?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(DecodeError::Draco(format!(
                "{TOOL_NAME} exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        let obj = std::fs::read(&output)?;
        let mut mesh = Mesh::new();
        for (_, part) in super::obj::parse_meshes(&obj)? {
            mesh.extend(part);
        }
        debug!(bytes = compressed.len(), triangles = mesh.triangles.len(), "decoded Draco primitive");
        Ok(mesh)
    }
}
