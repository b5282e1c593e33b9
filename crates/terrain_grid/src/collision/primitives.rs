//! Primitive collision shapes and intersection algorithms
//!
//! Provides the basic geometric primitives (planes, edges, spheres, tubes)
//! with the sphere-vs-primitive tests used by the terrain queries.

use crate::foundation::math::{normalise, Vec3};

/// An oriented plane: `normal · p - offset` is the signed distance of `p`.
///
/// The positive side is "outside".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Plane {
    /// Unit normal
    pub normal: Vec3,
    /// Distance of the plane from the origin along `normal`
    pub offset: f32,
}

impl Plane {
    /// Creates a plane from a unit normal and an offset
    pub const fn new(normal: Vec3, offset: f32) -> Self {
        Self { normal, offset }
    }

    /// Creates the plane with the given normal that passes through `point`
    pub fn from_point(normal: Vec3, point: &Vec3) -> Self {
        Self {
            normal,
            offset: normal.dot(point),
        }
    }

    /// Signed distance from the plane to `point`
    #[inline]
    pub fn calc_dist(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) - self.offset
    }
}

/// A line segment between two points
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Edge {
    /// First endpoint
    pub start: Vec3,
    /// Second endpoint
    pub end: Vec3,
}

impl Edge {
    /// Creates an edge between two points
    pub const fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    /// Vector from `start` to `end`
    pub fn vector(&self) -> Vec3 {
        self.end - self.start
    }

    /// Length of the edge
    pub fn length(&self) -> f32 {
        self.vector().magnitude()
    }

    /// Point a fraction `t` of the way from `start` to `end`
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.start + self.vector() * t
    }
}

/// A sphere for collision detection
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sphere {
    /// The center position of the sphere
    pub position: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

/// Outcome of a sphere-vs-sphere push-out test
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SphereOverlap {
    /// No contact. `direction` is the unit vector from this sphere toward the other
    /// (zero when the centers coincide).
    Separated {
        /// Unit separation direction
        direction: Vec3,
    },
    /// Contact. `repulsion` points from the other sphere toward this one and its
    /// length is the penetration depth.
    Overlapping {
        /// Push-out vector for this sphere
        repulsion: Vec3,
    },
}

impl SphereOverlap {
    /// True for [`SphereOverlap::Overlapping`]
    pub const fn is_overlapping(&self) -> bool {
        matches!(self, Self::Overlapping { .. })
    }

    /// The push-out vector, if the spheres overlap
    pub fn repulsion(&self) -> Option<Vec3> {
        match self {
            Self::Overlapping { repulsion } => Some(*repulsion),
            Self::Separated { .. } => None,
        }
    }
}

/// A sphere-vs-edge contact with the nearest point on the edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeHit {
    /// Fraction along the edge, 0 at `start` and 1 at `end`
    pub t: f32,
    /// Nearest point on the edge
    pub point: Vec3,
}

/// A sphere-vs-edge contact expressed as a push-out
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRepulsion {
    /// Fraction along the edge, 0 at `start` and 1 at `end`
    pub t: f32,
    /// Unit vector from the edge toward the sphere center, zero if the center is on the edge
    pub direction: Vec3,
    /// Penetration depth, `radius - distance`
    pub strength: f32,
}

impl Sphere {
    /// Creates a new sphere with the given center and radius
    pub const fn new(position: Vec3, radius: f32) -> Self {
        Self { position, radius }
    }

    /// Check if this sphere intersects with another (touching counts)
    pub fn intersects(&self, other: &Self) -> bool {
        let distance_squared = (other.position - self.position).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        radius_sum * radius_sum - distance_squared >= 0.0
    }

    /// Sphere-vs-sphere test that also reports how to push this sphere out
    pub fn intersect_sphere(&self, other: &Self) -> SphereOverlap {
        let mut direction = other.position - self.position;
        let separation = normalise(&mut direction);

        let neg_overlap = separation - (self.radius + other.radius);
        if neg_overlap > 0.0 {
            return SphereOverlap::Separated { direction };
        }

        SphereOverlap::Overlapping {
            repulsion: direction * neg_overlap,
        }
    }

    /// Sphere-vs-segment test returning the contact fraction along the edge
    pub fn intersect_edge(&self, edge: &Edge) -> Option<f32> {
        self.intersect_edge_point(edge).map(|hit| hit.t)
    }

    /// Sphere-vs-segment test returning the contact fraction and nearest edge point
    ///
    /// Endpoints are tried first; otherwise the center is projected onto the
    /// segment and the perpendicular distance is compared with the radius.
    pub fn intersect_edge_point(&self, edge: &Edge) -> Option<EdgeHit> {
        if (edge.start - self.position).magnitude() <= self.radius {
            return Some(EdgeHit { t: 0.0, point: edge.start });
        }
        if (edge.end - self.position).magnitude() <= self.radius {
            return Some(EdgeHit { t: 1.0, point: edge.end });
        }

        let mut dir = edge.vector();
        let edge_len = normalise(&mut dir);

        let sep = self.position - edge.start;
        let along = sep.dot(&dir);
        if along < 0.0 || along > edge_len {
            return None;
        }

        let perp = sep - dir * along;
        if perp.magnitude() <= self.radius {
            let t = if edge_len > 0.0 { along / edge_len } else { 0.0 };
            return Some(EdgeHit {
                t,
                point: edge.start + dir * along,
            });
        }
        None
    }

    /// Sphere-vs-segment push-out test
    ///
    /// When the projection of the center falls outside the segment only the two
    /// endpoints are considered.
    pub fn intersect_edge_repulsion(&self, edge: &Edge) -> Option<EdgeRepulsion> {
        let mut dir = edge.vector();
        let edge_len = normalise(&mut dir);

        let start_sep = self.position - edge.start;
        let along = start_sep.dot(&dir);

        if along < 0.0 || along > edge_len {
            return [(0.0, edge.start), (1.0, edge.end)]
                .into_iter()
                .find_map(|(t, endpoint)| self.endpoint_repulsion(t, &endpoint));
        }

        let mut perp = start_sep - dir * along;
        let perp_dist = normalise(&mut perp);
        if perp_dist > self.radius {
            return None;
        }

        let t = if edge_len > 0.0 { along / edge_len } else { 0.0 };
        Some(EdgeRepulsion {
            t,
            direction: perp,
            strength: self.radius - perp_dist,
        })
    }

    fn endpoint_repulsion(&self, t: f32, endpoint: &Vec3) -> Option<EdgeRepulsion> {
        let mut direction = self.position - endpoint;
        let dist = normalise(&mut direction);
        if dist > self.radius {
            return None;
        }
        Some(EdgeRepulsion {
            t,
            direction,
            strength: self.radius - dist,
        })
    }
}

/// A capsule whose radius varies linearly from `start_radius` to `end_radius`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tube {
    /// Axis start point
    pub start_pos: Vec3,
    /// Axis end point
    pub end_pos: Vec3,
    /// Radius at `start_pos`
    pub start_radius: f32,
    /// Radius at `end_pos`
    pub end_radius: f32,
}

/// A tube-vs-sphere contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TubeContact {
    /// Push-out vector for the sphere, length is the overlap
    pub repulsion: Vec3,
    /// Position of the contact along the axis, 0 at start and 1 at end
    pub pos_ratio: f32,
}

impl Tube {
    /// Creates a tube
    pub const fn new(start_pos: Vec3, end_pos: Vec3, start_radius: f32, end_radius: f32) -> Self {
        Self {
            start_pos,
            end_pos,
            start_radius,
            end_radius,
        }
    }

    /// Unit vector from start to end, zero for a degenerate tube
    pub fn axis_vector(&self) -> Vec3 {
        let mut axis = self.end_pos - self.start_pos;
        normalise(&mut axis);
        axis
    }

    /// Radius at fraction `ratio` along the axis
    pub fn radius_at(&self, ratio: f32) -> f32 {
        (1.0 - ratio) * self.start_radius + ratio * self.end_radius
    }

    /// Tube-vs-sphere test. Degenerate tubes never collide.
    pub fn collide(&self, ball: &Sphere) -> Option<TubeContact> {
        let diff = self.end_pos - self.start_pos;
        let mut axis = diff;
        let tube_len = normalise(&mut axis);
        if tube_len <= 0.0 {
            return None;
        }

        let sep = ball.position - self.start_pos;
        let ratio = axis.dot(&sep) / tube_len;

        // Axis point nearest the sphere, relative to the sphere center
        let perp = diff * ratio + self.start_pos - ball.position;
        let perp_dist = perp.magnitude();

        let overlap = (ball.radius + self.radius_at(ratio)) - perp_dist;
        if !(0.0..=1.0).contains(&ratio) || overlap < 0.0 {
            return None;
        }

        let mut repulsion = perp;
        normalise(&mut repulsion);
        Some(TubeContact {
            repulsion: repulsion * -overlap,
            pos_ratio: ratio,
        })
    }

    /// Scalar projection of `point` onto the axis in units of tube length
    ///
    /// Values outside `[0, 1]` lie before the start or past the end.
    pub fn pos_ratio(&self, point: &Vec3) -> f32 {
        let mut axis = self.end_pos - self.start_pos;
        let len = normalise(&mut axis);
        if len <= 0.0 {
            return 0.0;
        }
        axis.dot(&(point - self.start_pos)) / len
    }

    /// Point a fraction `frac` along the axis
    pub fn set_pos(&self, frac: f32) -> Vec3 {
        self.start_pos + (self.end_pos - self.start_pos) * frac
    }
}
