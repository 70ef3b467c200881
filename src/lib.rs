//! # dimvars — Multi-Dimensional Variable Store
//!
//! Named, N-dimensional quantities indexed by categorical or ordinal
//! dimensions, populated from long-format tables and updated with bulk,
//! comprehension-style assignments instead of hand-written nested loops.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `VariableStore` is the contract between bulk assignment and storage
//! 2. **Two representations**: `SparseStore` (exact key map) and `DenseStore` (positional array)
//! 3. **Explicit context**: formulas read other variables through a `Workspace` they are handed
//! 4. **Positional dimensions**: dimension order is fixed at creation and drives iteration order
//!
//! ## Quick Start
//!
//! ```rust
//! use dimvars::{load, Assignment, CsvOptions, LoadOptions, Representation, Table, Value, VariableStore};
//!
//! # fn example() -> dimvars::Result<()> {
//! let csv = "reg,prod,value\nus,banana,2\nus,apples,5\neu,banana,1\neu,apples,4\n";
//! let table = Table::from_csv_reader(csv.as_bytes(), &CsvOptions::default())?;
//!
//! let opts = LoadOptions::new(["reg", "prod"]).representation(Representation::Sparse);
//! let mut tr = load(&["trValues"], &table, &opts)?.into_single()?;
//!
//! // tr[r, banana] = 2 * tr[r, banana], for r in {us, eu}
//! let snapshot = tr.clone();
//! Assignment::<Value>::new()
//!     .over("r", ["us", "eu"])
//!     .fixed("banana")
//!     .run(&mut tr, |b| {
//!         let v: f64 = snapshot.get_as(&[b["r"].clone(), "banana".into()])?;
//!         Ok(Value::Float(2.0 * v))
//!     })?;
//!
//! assert_eq!(tr.get(&["us".into(), "banana".into()])?, &Value::Float(4.0));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod catalog;
pub mod table;
pub mod store;
pub mod loader;
pub mod assign;
pub mod workspace;
pub mod export;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{Dimension, DimensionKind, FromValue, IndexKey, Value, ValueType};

// ============================================================================
// Re-exports: Stores
// ============================================================================

pub use catalog::DimensionCatalog;
pub use store::{
    DenseStore, NotFoundReason, Representation, SparseStore, Store, VariableStore,
};

// ============================================================================
// Re-exports: Loading
// ============================================================================

pub use table::{CsvOptions, Table};
pub use loader::{
    load, load_with_report, DuplicateKey, DuplicatePolicy, LoadOptions, LoadReport, Loaded,
    MissingValue,
};

// ============================================================================
// Re-exports: Assignment
// ============================================================================

pub use assign::{assign, Assignment, Binding, IndexSpec};
pub use workspace::Workspace;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Arity mismatch: expected {expected} index components, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("Index out of range: position {index} of dimension '{dimension}' (cardinality {cardinality})")]
    IndexOutOfRange { dimension: String, index: usize, cardinality: usize },

    #[error("Not found: {index} ({reason})")]
    NotFound { index: String, reason: NotFoundReason },

    #[error("Duplicate key: {rows} rows of '{variable}' match {index}")]
    DuplicateKeyDetected { variable: String, index: String, rows: usize },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    #[error("Unknown element {element} in dimension '{dimension}'")]
    UnknownElement { dimension: String, element: String },

    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("Range variable '{0}' bound twice")]
    DuplicateRange(String),

    #[error("Range variable '{0}' is not bound")]
    UnboundRange(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this is the recoverable "nothing stored here" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
