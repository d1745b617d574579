/// Exhibilo core library: model decoding and normalization
///
/// Stateless building blocks for the model viewer: format detection, the
/// glTF/GLB (with Draco), OBJ and STL decoders, the scene tree they
/// produce, bounding boxes, the normalizer, and the camera math used to
/// display the result.
pub mod bounds;
pub mod decode;
pub mod error;
pub mod format;
pub mod geometry;
pub mod normalize;
pub mod projection;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use bounds::BoundingBox;
pub use decode::{external_buffer_uris, DecoderConfig, Decoders, ExternalBuffers, MeshCodec};
pub use error::DecodeError;
pub use format::{ModelFormat, ACCEPTED_EXTENSIONS};
pub use geometry::{Mesh, Triangle, Vertex};
pub use normalize::{normalize, Normalization, TARGET_SIZE};
pub use projection::{Camera, ProjectionMode};
pub use scene::{DecodedAsset, Material, ModelMesh, SceneNode};
pub use transform::{RotationState, Transform};
