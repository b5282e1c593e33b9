//! # Terrain Grid
//!
//! Collision geometry and broad-phase queries over large static triangle meshes.
//!
//! ## Features
//!
//! - **Primitives**: planes, edges, spheres and variable-radius tubes with
//!   intersection and push-out queries
//! - **Triangles**: index-handle triangles with cached face and edge planes
//! - **Uniform Grid**: an XZ grid over the mesh bounds, one candidate list per cell
//! - **Ground Queries**: height under a point, current triangle, sphere range queries
//! - **Streams**: big-endian binary read/write of a built grid and its tables
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use terrain_grid::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut vertices = VertexTable::new("ground");
//!     let a = vertices.push(Vec3::new(0.0, 0.0, 0.0));
//!     let b = vertices.push(Vec3::new(10.0, 0.0, 0.0));
//!     let c = vertices.push(Vec3::new(0.0, 0.0, 10.0));
//!
//!     let mut triangles = TriangleTable::new();
//!     triangles.push(Triangle::new([a, b, c]), &vertices);
//!
//!     let bounds = *vertices.bound_box();
//!     let grid = GridDivider::create(bounds, 4, 4, vertices, triangles)?;
//!
//!     if let Some(candidates) = grid.find_tri_lists(&Sphere::new(Vec3::new(2.0, 0.0, 2.0), 1.0)) {
//!         println!("{} candidate triangles", candidates.len());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod collision;
pub mod spatial;
pub mod io;

/// Common imports for grid users
pub mod prelude {
    pub use crate::{
        collision::{
            Edge, EdgeCrossing, EdgeHit, EdgeRepulsion, Plane, Sphere,
            SphereOverlap, Triangle, TriangleId, TriangleTable, Tube, TubeContact, VertexId,
            VertexTable,
        },
        config::{Config, ConfigError, GridConfig},
        foundation::math::{BoundBox, Mat3, Mat4, Vec3},
        io::{StreamError, StreamReader, StreamWriter},
        spatial::{
            CreateTriangleArg, CurrTriInfo, GridDivider, GridError, RayHit, RayIntersectInfo,
            TriIndexList,
        },
    };
}
