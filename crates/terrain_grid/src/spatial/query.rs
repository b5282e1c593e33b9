//! Parameter and result objects for grid queries

use crate::collision::{Edge, Sphere, Triangle, TriangleId};
use crate::foundation::math::Vec3;

/// Lowest normal Y a triangle may have and still count as a wall
const WALL_MIN_NORMAL_Y: f32 = -0.1;
/// Highest normal Y a triangle may have and still count as a wall
const WALL_MAX_NORMAL_Y: f32 = 0.5;

/// A thick segment cast through the grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayIntersectInfo {
    /// Segment being cast
    pub edge: Edge,
    /// Thickness of the segment
    pub cutoff: f32,
    /// Only test wall-like triangles
    pub check_horizontal: bool,
}

impl RayIntersectInfo {
    /// Creates a cast over `edge` that tests every triangle
    pub const fn new(edge: Edge, cutoff: f32) -> Self {
        Self {
            edge,
            cutoff,
            check_horizontal: false,
        }
    }

    /// Restricts the cast to wall-like triangles
    #[must_use]
    pub const fn walls_only(mut self) -> Self {
        self.check_horizontal = true;
        self
    }

    /// True if `triangle` should be tested by this cast
    pub fn condition(&self, triangle: &Triangle) -> bool {
        if !self.check_horizontal {
            return true;
        }
        let y = triangle.plane.normal.y;
        WALL_MIN_NORMAL_Y < y && y < WALL_MAX_NORMAL_Y
    }

    /// Sphere enclosing the whole segment, used to gather candidate cells
    pub fn bounding_sphere(&self) -> Sphere {
        let center = (self.edge.start + self.edge.end) * 0.5;
        let radius = self.edge.length() * 0.5 + self.cutoff;
        Sphere::new(center, radius)
    }
}

/// Nearest triangle crossing found by a ray cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Triangle that was crossed
    pub triangle: TriangleId,
    /// Crossing point
    pub point: Vec3,
    /// `cutoff` minus the height of `point` above the triangle
    pub dist_from_cutoff: f32,
}

/// Input and output of [`GridDivider::create_triangles`](super::GridDivider::create_triangles)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateTriangleArg {
    /// Only the cell holding this sphere's center is searched
    pub bounding_sphere: Sphere,
    /// Distance to push each copied vertex along its triangle normal
    pub scale: f32,
    /// Triangles need `normal.y` above this to be copied
    pub scale_limit: f32,
    /// Output: three displaced vertices per emitted triangle
    pub vertices: Vec<Vec3>,
    /// Output: source triangle of each emitted copy
    pub triangles: Vec<TriangleId>,
}

impl CreateTriangleArg {
    /// Creates an argument with empty outputs
    pub const fn new(bounding_sphere: Sphere, scale: f32, scale_limit: f32) -> Self {
        Self {
            bounding_sphere,
            scale,
            scale_limit,
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }

    /// Number of emitted triangles
    pub fn count(&self) -> usize {
        self.triangles.len()
    }

    /// The emitted triangles as vertex triples
    pub fn emitted(&self) -> impl Iterator<Item = &[Vec3]> {
        self.vertices.chunks_exact(3)
    }
}

/// Ground lookup under a position
///
/// Fill in `position` and `update_on_new_max_y`, then pass to
/// [`GridDivider::get_curr_tri`](super::GridDivider::get_curr_tri).
/// `max_y`, `min_y` and the triangle fields are only written when some
/// triangle lies under the position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrTriInfo {
    /// Query position; only X and Z are used
    pub position: Vec3,
    /// When set, report the lowest triangle under the position; otherwise the highest
    pub update_on_new_max_y: bool,
    /// Highest plane height found
    pub max_y: f32,
    /// Lowest plane height found
    pub min_y: f32,
    /// Normal of the reported triangle
    pub normal: Vec3,
    /// The reported triangle
    pub triangle: Option<TriangleId>,
}

impl CurrTriInfo {
    /// Creates a query at `position`
    pub fn new(position: Vec3, update_on_new_max_y: bool) -> Self {
        Self {
            position,
            update_on_new_max_y,
            max_y: 0.0,
            min_y: 0.0,
            normal: Vec3::y(),
            triangle: None,
        }
    }
}
