//! # Variable Stores
//!
//! `VariableStore` is the contract every representation of an
//! N-dimensional variable fulfils, and the only surface bulk assignment
//! and the workspace talk to.
//!
//! ## Implementations
//!
//! | Store | Module | Index | Description |
//! |-------|--------|-------|-------------|
//! | `SparseStore` | `sparse` | `Value` | key → value map over element tuples |
//! | `DenseStore` | `dense` | `usize` | fixed-shape array over 1-based positions |
//! | `Store` | here | `Value` | either of the above, addressed by element labels |

pub mod sparse;
pub mod dense;

use std::fmt;

use crate::model::{Dimension, FromValue, Value, ValueType};
use crate::{Error, Result};

pub use sparse::SparseStore;
pub use dense::DenseStore;

// ============================================================================
// Representation
// ============================================================================

/// Which representation a store uses. Chosen at creation, never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Representation {
    #[default]
    Sparse,
    Dense,
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Representation::Sparse => f.write_str("sparse"),
            Representation::Dense => f.write_str("dense"),
        }
    }
}

/// Why a lookup found nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// Sparse: the tuple was never written.
    KeyAbsent,
    /// Dense: the cell still holds the unset sentinel.
    ValueUnset,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::KeyAbsent => f.write_str("key absent"),
            NotFoundReason::ValueUnset => f.write_str("value unset"),
        }
    }
}

// ============================================================================
// VariableStore Trait
// ============================================================================

/// The store contract.
///
/// Dimension order is fixed at construction; index tuples are positional,
/// one component per dimension. Stores are plain owned values with no
/// internal locking: concurrent writers to one store must be serialised
/// by the caller.
pub trait VariableStore {
    /// One component of an index tuple.
    type Index: Clone + fmt::Display;

    fn dimensions(&self) -> &[Dimension];

    fn value_type(&self) -> ValueType;

    /// Exact lookup. Fails with `NotFound` when nothing is stored there.
    fn get(&self, index: &[Self::Index]) -> Result<&Value>;

    /// Write one element, replacing whatever was there.
    fn set(&mut self, index: &[Self::Index], value: Value) -> Result<()>;

    /// Like `get`, but `NotFound` yields `default`. Other errors propagate.
    fn get_safe(&self, index: &[Self::Index], default: Value) -> Result<Value> {
        match self.get(index) {
            Ok(v) => Ok(v.clone()),
            Err(e) if e.is_not_found() => Ok(default),
            Err(e) => Err(e),
        }
    }

    /// Typed lookup.
    fn get_as<T: FromValue>(&self, index: &[Self::Index]) -> Result<T>
    where
        Self: Sized,
    {
        T::from_value(self.get(index)?)
    }

    /// Declared cardinality of each dimension.
    fn size(&self) -> Vec<usize> {
        self.dimensions().iter().map(Dimension::cardinality).collect()
    }

    fn arity(&self) -> usize {
        self.dimensions().len()
    }
}

pub(crate) fn check_arity(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(Error::ArityMismatch { expected, got });
    }
    Ok(())
}

// ============================================================================
// Store
// ============================================================================

/// A store of either representation, addressed by element labels.
///
/// Dense stores translate labels to positions through their dimensions,
/// so both representations accept the same index tuples here.
#[derive(Debug, Clone, PartialEq)]
pub enum Store {
    Sparse(SparseStore),
    Dense(DenseStore),
}

impl Store {
    pub fn representation(&self) -> Representation {
        match self {
            Store::Sparse(_) => Representation::Sparse,
            Store::Dense(_) => Representation::Dense,
        }
    }

    pub fn as_sparse(&self) -> Option<&SparseStore> {
        match self {
            Store::Sparse(s) => Some(s),
            Store::Dense(_) => None,
        }
    }

    pub fn as_dense(&self) -> Option<&DenseStore> {
        match self {
            Store::Dense(d) => Some(d),
            Store::Sparse(_) => None,
        }
    }

    pub fn into_sparse(self) -> Result<SparseStore> {
        match self {
            Store::Sparse(s) => Ok(s),
            Store::Dense(_) => Err(representation_error(Representation::Sparse)),
        }
    }

    pub fn into_dense(self) -> Result<DenseStore> {
        match self {
            Store::Dense(d) => Ok(d),
            Store::Sparse(_) => Err(representation_error(Representation::Dense)),
        }
    }
}

fn representation_error(expected: Representation) -> Error {
    let got = match expected {
        Representation::Sparse => Representation::Dense,
        Representation::Dense => Representation::Sparse,
    };
    Error::TypeError {
        expected: format!("{expected} store"),
        got: format!("{got} store"),
    }
}

impl VariableStore for Store {
    type Index = Value;

    fn dimensions(&self) -> &[Dimension] {
        match self {
            Store::Sparse(s) => s.dimensions(),
            Store::Dense(d) => d.dimensions(),
        }
    }

    fn value_type(&self) -> ValueType {
        match self {
            Store::Sparse(s) => s.value_type(),
            Store::Dense(d) => d.value_type(),
        }
    }

    fn get(&self, index: &[Value]) -> Result<&Value> {
        match self {
            Store::Sparse(s) => s.get(index),
            Store::Dense(d) => d.get_labeled(index),
        }
    }

    fn set(&mut self, index: &[Value], value: Value) -> Result<()> {
        match self {
            Store::Sparse(s) => s.set(index, value),
            Store::Dense(d) => d.set_labeled(index, value),
        }
    }
}

impl From<SparseStore> for Store {
    fn from(s: SparseStore) -> Self { Store::Sparse(s) }
}

impl From<DenseStore> for Store {
    fn from(d: DenseStore) -> Self { Store::Dense(d) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> Vec<Dimension> {
        vec![
            Dimension::named("reg", ["us", "eu"]),
            Dimension::named("prod", ["banana", "apples"]),
        ]
    }

    #[test]
    fn test_labeled_access_both_representations() {
        let idx = [Value::from("eu"), Value::from("apples")];
        for mut store in [
            Store::from(SparseStore::new(dims(), ValueType::Float)),
            Store::from(DenseStore::new(dims(), ValueType::Float)),
        ] {
            assert!(store.get(&idx).unwrap_err().is_not_found());
            store.set(&idx, Value::Float(1.5)).unwrap();
            assert_eq!(store.get(&idx).unwrap(), &Value::Float(1.5));
            assert_eq!(store.get_as::<f64>(&idx).unwrap(), 1.5);
            assert_eq!(store.size(), vec![2, 2]);
        }
    }

    #[test]
    fn test_into_wrong_representation() {
        let store = Store::from(SparseStore::new(dims(), ValueType::Any));
        assert!(matches!(store.clone().into_dense(), Err(Error::TypeError { .. })));
        assert!(store.into_sparse().is_ok());
    }
}
