//! Collision geometry for static terrain
//!
//! # Module Organization
//!
//! - [`primitives`] - Planes, edges, spheres and tubes
//! - [`triangle`] - Index-handle triangles and their predicates
//! - [`mesh`] - Vertex and triangle tables
//!
//! # Key Types
//!
//! - [`Triangle`] - Triangle with cached face/edge planes and bounding sphere
//! - [`VertexTable`], [`TriangleTable`] - Mesh storage the triangles index into
//! - [`Sphere`], [`Tube`], [`Edge`], [`Plane`] - Primitive shapes

pub mod primitives;
pub mod triangle;
pub mod mesh;

// Re-export commonly used types
pub use primitives::{Edge, EdgeHit, EdgeRepulsion, Plane, Sphere, SphereOverlap, Tube, TubeContact};
pub use triangle::{EdgeCrossing, Triangle};
pub use mesh::{TriangleId, TriangleTable, VertexId, VertexTable};
