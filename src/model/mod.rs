//! # Variable Model
//!
//! Plain data types shared by every layer: values, value types and
//! dimensions. Pure data, no I/O, no state.

pub mod value;
pub mod dimension;

pub use value::{Value, ValueType, FromValue};
pub use dimension::{Dimension, DimensionKind, NamedDimension};

use smallvec::SmallVec;

/// Index tuple of a sparse store, one element per dimension.
pub type IndexKey = SmallVec<[Value; 4]>;
