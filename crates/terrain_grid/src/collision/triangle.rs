//! Triangle collision geometry
//!
//! A [`Triangle`] references three vertices in a [`VertexTable`] and caches
//! the planes derived from them: the face plane, one "fence" plane per edge
//! standing perpendicular to the face, and a bounding sphere. The cached
//! data must be rebuilt with [`Triangle::make_planes`] and
//! [`Triangle::create_sphere`] whenever a referenced vertex moves.

use crate::foundation::math::{normalise, Vec3};
use super::mesh::{VertexId, VertexTable};
use super::primitives::{Edge, Plane, Sphere};

/// Below this `|normal · edge|` the triangle-plane crossing is too unstable to solve
const PARALLEL_EPSILON: f32 = 0.01;

/// A mesh triangle with cached face plane, edge planes and bounding sphere
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Triangle {
    /// Vertex handles, in winding order A, B, C
    pub vertices: [VertexId; 3],
    /// Surface attribute code
    pub code: u8,
    /// Plane through the three vertices, normal = unit((C - A) x (B - A))
    pub plane: Plane,
    /// Fence planes for edges AB, BC and CA; positive side is outside the triangle
    pub edge_planes: [Plane; 3],
    /// Centroid-centred sphere enclosing all three vertices
    pub sphere: Sphere,
}

/// A segment crossing of a triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCrossing {
    /// Where the segment meets the triangle
    pub point: Vec3,
    /// `cutoff` minus the signed height of `point` above the face plane
    pub dist_from_cutoff: f32,
}

impl Triangle {
    /// Creates a triangle over three vertices. Planes and sphere are left empty.
    pub fn new(vertices: [VertexId; 3]) -> Self {
        Self {
            vertices,
            ..Default::default()
        }
    }

    /// Creates a triangle with a surface attribute code
    pub fn with_code(vertices: [VertexId; 3], code: u8) -> Self {
        Self {
            vertices,
            code,
            ..Default::default()
        }
    }

    /// The three vertex positions, looked up in `table`
    pub fn corners(&self, table: &VertexTable) -> [Vec3; 3] {
        [
            table[self.vertices[0]],
            table[self.vertices[1]],
            table[self.vertices[2]],
        ]
    }

    /// The three edges AB, BC, CA
    pub fn edges(&self, table: &VertexTable) -> [Edge; 3] {
        let [a, b, c] = self.corners(table);
        [Edge::new(a, b), Edge::new(b, c), Edge::new(c, a)]
    }

    /// Computes the face plane and the three edge planes
    pub fn make_planes(&mut self, table: &VertexTable) {
        let [a, b, c] = self.corners(table);

        let mut normal = (c - a).cross(&(b - a));
        normalise(&mut normal);
        self.plane = Plane::from_point(normal, &a);

        let fences = [(a - b, a), (b - c, b), (c - a, c)];
        for (plane, (edge_vec, origin)) in self.edge_planes.iter_mut().zip(fences) {
            let mut fence_normal = edge_vec.cross(&normal);
            normalise(&mut fence_normal);
            *plane = Plane::from_point(fence_normal, &origin);
        }
    }

    /// Computes the bounding sphere: centroid plus the farthest vertex distance
    pub fn create_sphere(&mut self, table: &VertexTable) {
        let corners = self.corners(table);
        let center = (corners[0] + corners[1] + corners[2]) * (1.0 / 3.0);
        let radius = corners
            .iter()
            .map(|corner| (corner - center).magnitude())
            .fold(0.0_f32, f32::max);
        self.sphere = Sphere::new(center, radius);
    }

    /// Bounding-sphere overlap only. May report false positives, never false negatives.
    pub fn fast_intersect(&self, ball: &Sphere) -> bool {
        let dist = (ball.position - self.sphere.position).magnitude();
        dist <= ball.radius + self.sphere.radius
    }

    /// Signed distance from `plane` to the nearest vertex, or `0.0` if the plane
    /// touches or cuts the triangle
    pub fn calc_dist(&self, plane: &Plane, table: &VertexTable) -> f32 {
        let dists = self.corners(table).map(|corner| plane.calc_dist(&corner));
        let min = dists[0].min(dists[1]).min(dists[2]);
        let max = dists[0].max(dists[1]).max(dists[2]);

        if min * max > 0.0 {
            if min > 0.0 { min } else { max }
        } else {
            0.0
        }
    }

    /// Height of the face plane at `(x, z)` if that column passes through the
    /// triangle. Only upward-facing triangles answer.
    pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        let normal = self.plane.normal;
        if normal.y <= 0.0 {
            return None;
        }

        let y = (self.plane.offset - (normal.x * x + normal.z * z)) / normal.y;
        let projected = Vec3::new(x, y, z);
        self.edge_planes
            .iter()
            .all(|edge_plane| edge_plane.calc_dist(&projected) <= 0.0)
            .then_some(y)
    }

    /// True if `point`, dropped vertically onto the face plane, lies inside the
    /// triangle. Always false for triangles that do not face up.
    pub fn inside_xz(&self, point: &Vec3) -> bool {
        self.height_at(point.x, point.z).is_some()
    }

    /// Distances from `center` to each edge plane, or `None` once any exceeds `radius`
    fn edge_plane_dists(&self, center: &Vec3, radius: f32) -> Option<[f32; 3]> {
        let mut dists = [0.0; 3];
        for (dist, plane) in dists.iter_mut().zip(&self.edge_planes) {
            *dist = plane.calc_dist(center);
            if *dist > radius {
                return None;
            }
        }
        Some(dists)
    }

    /// Precise sphere-vs-triangle test, treating the triangle as a two-sided sheet
    pub fn intersect_sphere(&self, table: &VertexTable, ball: &Sphere) -> bool {
        if self.plane.calc_dist(&ball.position).abs() > ball.radius {
            return false;
        }
        let Some(dists) = self.edge_plane_dists(&ball.position, ball.radius) else {
            return false;
        };

        if self
            .edges(table)
            .iter()
            .any(|edge| ball.intersect_edge(edge).is_some())
        {
            return true;
        }

        dists.iter().all(|&d| d <= 0.0)
    }

    /// Sphere-vs-triangle test reporting a witness point
    ///
    /// The point is the nearest edge point when an edge is hit, otherwise the
    /// point one radius below the center along the face normal.
    pub fn intersect_sphere_point(&self, table: &VertexTable, ball: &Sphere) -> Option<Vec3> {
        if self.plane.calc_dist(&ball.position).abs() > ball.radius {
            return None;
        }
        self.contact_point(table, ball)
    }

    /// Like [`Triangle::intersect_sphere_point`] for a solid surface: a sphere
    /// whose center is below the face is never rejected by its plane distance.
    pub fn intersect_hard(&self, table: &VertexTable, ball: &Sphere) -> Option<Vec3> {
        if self.plane.calc_dist(&ball.position) > ball.radius {
            return None;
        }
        self.contact_point(table, ball)
    }

    fn contact_point(&self, table: &VertexTable, ball: &Sphere) -> Option<Vec3> {
        let dists = self.edge_plane_dists(&ball.position, ball.radius)?;

        if let Some(hit) = self
            .edges(table)
            .iter()
            .find_map(|edge| ball.intersect_edge_point(edge))
        {
            return Some(hit.point);
        }

        dists
            .iter()
            .all(|&d| d <= 0.0)
            .then(|| ball.position - self.plane.normal * ball.radius)
    }

    /// Segment-vs-triangle test with the segment thickened by `cutoff`
    pub fn intersect_edge(&self, edge: &Edge, cutoff: f32) -> Option<Vec3> {
        self.intersect_edge_with_depth(edge, cutoff)
            .map(|crossing| crossing.point)
    }

    /// Segment-vs-triangle test that also reports how far inside `cutoff` the
    /// crossing lies
    ///
    /// Zero-length segments never intersect. Segments nearly parallel to the
    /// face are tested against the edge planes instead of the face plane.
    pub fn intersect_edge_with_depth(&self, edge: &Edge, cutoff: f32) -> Option<EdgeCrossing> {
        let edge_vec = edge.vector();
        let edge_len = edge_vec.magnitude();
        if edge_len == 0.0 {
            return None;
        }

        let normal = self.plane.normal;
        let scalar_proj = normal.dot(&edge_vec);
        let ratio = cutoff / edge_len;

        if scalar_proj.abs() < PARALLEL_EPSILON {
            if self.plane.calc_dist(&edge.start).abs() > cutoff {
                return None;
            }

            return self.edge_planes.iter().find_map(|edge_plane| {
                let proj = edge_plane.normal.dot(&edge_vec);
                if proj.abs() <= PARALLEL_EPSILON {
                    return None;
                }

                let t = (edge_plane.offset - edge_plane.normal.dot(&edge.start)) / proj;
                if t <= -ratio || t >= 1.0 + ratio {
                    return None;
                }

                let point = edge.start + edge_vec * t;
                let height = self.plane.calc_dist(&point);
                (height.abs() < cutoff).then_some(EdgeCrossing {
                    point,
                    dist_from_cutoff: cutoff - height,
                })
            });
        }

        let t = (self.plane.offset - normal.dot(&edge.start)) / scalar_proj;
        if t < -ratio || t > 1.0 + ratio {
            return None;
        }

        let point = edge.start + edge_vec * t;
        if self
            .edge_planes
            .iter()
            .any(|edge_plane| edge_plane.calc_dist(&point) > cutoff)
        {
            return None;
        }

        Some(EdgeCrossing {
            point,
            dist_from_cutoff: cutoff - self.plane.calc_dist(&point),
        })
    }
}
