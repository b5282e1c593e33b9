//! Math utilities and types
//!
//! Provides the vector and matrix aliases used by the collision code, plus the
//! axis-aligned box that bounds meshes and grids.

pub use nalgebra::{Matrix3, Matrix4, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Normalize `vector` in place and return its original length.
///
/// A zero-length vector is left untouched and `0.0` is returned.
#[inline]
pub fn normalise(vector: &mut Vec3) -> f32 {
    let length = vector.magnitude();
    if length > 0.0 {
        *vector *= 1.0 / length;
    }
    length
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundBox {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Default for BoundBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundBox {
    /// Create a new box from min and max points
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// An inverted box that any included point will replace
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::MAX),
            max: Vec3::repeat(-f32::MAX),
        }
    }

    /// True until at least one point has been included
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow the box to contain `point`
    pub fn include(&mut self, point: &Vec3) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Check if the XZ footprints of two boxes overlap (touching counts)
    pub fn intersects_xz(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalise_returns_length() {
        let mut v = Vec3::new(3.0, 0.0, 4.0);
        let len = normalise(&mut v);

        assert_relative_eq!(len, 5.0);
        assert_relative_eq!(v, Vec3::new(0.6, 0.0, 0.8), epsilon = 1e-6);
    }

    #[test]
    fn test_normalise_zero_is_noop() {
        let mut v = Vec3::zeros();
        assert_eq!(normalise(&mut v), 0.0);
        assert_eq!(v, Vec3::zeros());
    }

    #[test]
    fn test_bound_box_include() {
        let mut bounds = BoundBox::empty();
        assert!(bounds.is_empty());

        bounds.include(&Vec3::new(1.0, -2.0, 3.0));
        bounds.include(&Vec3::new(-1.0, 4.0, 0.0));

        assert!(!bounds.is_empty());
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 4.0, 3.0));
    }

    #[test]
    fn test_bound_box_xz_overlap_ignores_height() {
        let a = BoundBox::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let b = BoundBox::new(Vec3::new(1.0, 50.0, 0.5), Vec3::new(2.0, 60.0, 2.0));
        let c = BoundBox::new(Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));

        assert!(a.intersects_xz(&b));
        assert!(!a.intersects_xz(&c));
    }
}
