use crate::format::ModelFormat;

/// Everything that can go wrong turning bytes into a [`crate::DecodedAsset`]
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("unsupported format {extension:?}, use .glb, .gltf, .obj or .stl")]
    UnsupportedFormat { extension: String },

    #[error("malformed STL: {0}")]
    Stl(String),

    #[error("malformed OBJ: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("malformed glTF: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("glTF buffer {0:?} is not embedded and was not provided")]
    MissingBuffer(String),

    #[error("glTF buffer {index} holds {actual} bytes, expected {expected}")]
    BufferTooShort {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("malformed glTF data URI: {0}")]
    DataUri(String),

    #[error("glTF file has no scene to display")]
    MissingScene,

    #[error("glTF node hierarchy deeper than {0} levels")]
    NodeDepth(usize),

    #[error("glTF primitive {mesh}/{primitive} has no positions")]
    MissingPositions { mesh: usize, primitive: usize },

    #[error("index {index} out of range in {format} mesh")]
    IndexOutOfRange { format: ModelFormat, index: u32 },

    #[error("Draco-compressed mesh found but no Draco decoder path is configured")]
    DracoNotConfigured,

    #[error("Draco decoding failed: {0}")]
    Draco(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
