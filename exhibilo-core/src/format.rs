/// Model format detection from a file name or URL
use std::fmt;

/// Extensions accepted by the viewer, as shown to users
pub const ACCEPTED_EXTENSIONS: &str = ".glb, .gltf, .obj, .stl";

/// The closed set of formats the decoder dispatches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    GltfBinary,
    GltfJson,
    Obj,
    Stl,
    Unknown,
}

impl ModelFormat {
    /// Map a file name, path or URL to a format.
    ///
    /// The extension is the lowercase text after the last `.` of the last
    /// path segment, with any query string or fragment removed first.
    pub fn from_name(name: &str) -> Self {
        Self::from_extension(&extension_of(name))
    }

    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "glb" => Self::GltfBinary,
            "gltf" => Self::GltfJson,
            "obj" => Self::Obj,
            "stl" => Self::Stl,
            _ => Self::Unknown,
        }
    }

    pub fn is_supported(self) -> bool {
        self != Self::Unknown
    }

    pub fn extension(self) -> Option<&'static str> {
        match self {
            Self::GltfBinary => Some("glb"),
            Self::GltfJson => Some("gltf"),
            Self::Obj => Some("obj"),
            Self::Stl => Some("stl"),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::GltfBinary => "glTF binary",
            Self::GltfJson => "glTF",
            Self::Obj => "Wavefront OBJ",
            Self::Stl => "STL",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Lowercase extension of a name, without query string or fragment.
/// Returns an empty string when the last segment has no `.`.
pub fn extension_of(name: &str) -> String {
    let path = name.split(['?', '#']).next().unwrap_or_default();
    let segment = path.rsplit(['/', '\\']).next().unwrap_or_default();
    match segment.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}
