/// Recentering and uniform rescaling of decoded assets
use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::bounds::BoundingBox;
use crate::scene::DecodedAsset;
use crate::transform::Transform;

/// Largest axis extent every asset is scaled to, in display units
pub const TARGET_SIZE: f32 = 2.5;

/// Where the viewer puts the floor grid, as a fraction of the extent below the origin
pub const FLOOR_OFFSET_FACTOR: f32 = 0.55;

/// What the normalizer did to an asset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    /// Center of the original bounds, now at the origin
    pub original_center: Point3<f32>,
    /// Size of the original bounds
    pub original_size: Vector3<f32>,
    /// Uniform factor applied on all three axes
    pub scale: f32,
    /// Largest axis extent after normalization
    pub extent: f32,
}

impl Normalization {
    /// Height of the floor grid beneath the normalized asset
    pub fn floor_height(&self) -> f32 {
        -(self.extent * FLOOR_OFFSET_FACTOR)
    }
}

/// Center the asset on the origin and scale it so its largest extent is
/// [`TARGET_SIZE`].
///
/// The transform is folded into the root node, so every mesh moves with
/// it. Degenerate and empty trees fall back to a unit extent.
pub fn normalize(asset: &mut DecodedAsset) -> Normalization {
    let before = BoundingBox::from_asset(asset);
    let center = before.center();
    let size = before.size();

    let mut largest = size.max();
    if largest <= 0.0 || !largest.is_finite() {
        largest = 1.0;
    }
    let scale = TARGET_SIZE / largest;

    asset.root.transform = Transform::recenter_and_scale(&center, scale) * asset.root.transform;

    let extent = BoundingBox::from_asset(asset).max_extent();
    debug!(scale, extent, "normalized asset");

    Normalization {
        original_center: center,
        original_size: size,
        scale,
        extent,
    }
}
