//! Binary serialization of grids and mesh tables

mod stream;

pub use stream::{capacity_hint, StreamError, StreamReader, StreamWriter};
