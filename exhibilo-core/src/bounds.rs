/// Axis-aligned bounding boxes over decoded scene trees
use nalgebra::{Point3, Vector3};

use crate::scene::DecodedAsset;

/// Smallest axis-aligned box enclosing a set of points.
///
/// A box that has seen no points is empty: its min is `+inf` and its max
/// is `-inf`, so the first `expand` always wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point3<f32>>,
    {
        let mut bounds = Self::empty();
        for point in points {
            bounds.expand(&point);
        }
        bounds
    }

    /// World-space bounds of every vertex in the asset
    pub fn from_asset(asset: &DecodedAsset) -> Self {
        let mut bounds = Self::empty();
        asset.for_each_mesh(|world, model_mesh| {
            for point in model_mesh.mesh.world_positions(world) {
                bounds.expand(&point);
            }
        });
        bounds
    }

    pub fn expand(&mut self, point: &Point3<f32>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Geometric center. The origin for an empty box.
    pub fn center(&self) -> Point3<f32> {
        if self.is_empty() {
            return Point3::origin();
        }
        nalgebra::center(&self.min, &self.max)
    }

    /// Width, height and depth. Zero for an empty box.
    pub fn size(&self) -> Vector3<f32> {
        if self.is_empty() {
            return Vector3::zeros();
        }
        self.max - self.min
    }

    /// Largest of the three axis extents
    pub fn max_extent(&self) -> f32 {
        self.size().max()
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ModelFormat;
    use crate::geometry::Mesh;
    use crate::scene::{Material, ModelMesh, SceneNode};
    use nalgebra::Matrix4;

    #[test]
    fn test_empty_box_reports_origin_and_zero_size() {
        let bounds = BoundingBox::empty();
        assert!(bounds.is_empty());
        assert_eq!(bounds.center(), Point3::origin());
        assert_eq!(bounds.max_extent(), 0.0);
    }

    #[test]
    fn test_from_points() {
        let bounds = BoundingBox::from_points([
            Point3::new(1.0, -2.0, 0.0),
            Point3::new(3.0, 4.0, 1.0),
        ]);
        assert_eq!(bounds.center(), Point3::new(2.0, 1.0, 0.5));
        assert_eq!(bounds.size(), Vector3::new(2.0, 6.0, 1.0));
        assert_eq!(bounds.max_extent(), 6.0);
    }

    #[test]
    fn test_single_point_is_degenerate_not_empty() {
        let bounds = BoundingBox::from_points([Point3::new(5.0, 5.0, 5.0)]);
        assert!(!bounds.is_empty());
        assert_eq!(bounds.max_extent(), 0.0);
        assert_eq!(bounds.center(), Point3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn test_from_asset_uses_world_transforms() {
        let mut node = SceneNode::new(None)
            .with_mesh(ModelMesh::new(Mesh::cube(2.0), Material::default()));
        node.transform = Matrix4::new_scaling(3.0);
        let asset = DecodedAsset::new(ModelFormat::Stl, node);

        let bounds = BoundingBox::from_asset(&asset);
        assert!((bounds.max_extent() - 6.0).abs() < 1e-5);
        assert!(bounds.center().coords.norm() < 1e-5);
    }
}
