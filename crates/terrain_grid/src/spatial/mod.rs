//! Broad-phase spatial queries over a triangle mesh
//!
//! # Module Organization
//!
//! - [`grid_divider`] - Uniform XZ grid with per-cell triangle lists
//! - [`tri_index_list`] - Growable triangle handle lists
//! - [`query`] - Parameter and result objects for grid queries

pub mod grid_divider;
pub mod query;
pub mod tri_index_list;

use thiserror::Error;

use crate::foundation::math::Vec3;
use crate::io::StreamError;

pub use grid_divider::GridDivider;
pub use query::{CreateTriangleArg, CurrTriInfo, RayHit, RayIntersectInfo};
pub use tri_index_list::TriIndexList;

/// Errors building or loading a [`GridDivider`]
#[derive(Error, Debug)]
pub enum GridError {
    /// A cell count is zero or the cell total overflows
    #[error("Invalid grid dimensions: {cells_x} x {cells_z}")]
    InvalidDimensions {
        /// Requested cells along X
        cells_x: usize,
        /// Requested cells along Z
        cells_z: usize,
    },

    /// The bounding box has no usable XZ extent
    #[error("Grid bounds have no XZ extent: {min:?} to {max:?}")]
    EmptyBounds {
        /// Minimum corner
        min: Vec3,
        /// Maximum corner
        max: Vec3,
    },

    /// Reading the grid from a stream failed
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),
}
