//! Table loader — builds stores from a long-format table.
//!
//! ```text
//! Table ──partition by name column──▶ sub-table per variable
//!        ├─ sparse: rows → (element tuple → value), last write wins
//!        └─ dense:  catalog → shape, one pass over rows, duplicates flagged
//! ```
//!
//! All structural checks (column names, requested names) run before any
//! store is built, so a load either produces every requested variable or
//! fails outright.

use hashbrown::HashMap;
use tracing::{debug, warn};

use crate::catalog::DimensionCatalog;
use crate::model::value::format_index;
use crate::model::{Value, ValueType};
use crate::store::{DenseStore, Representation, SparseStore, Store, VariableStore};
use crate::table::Table;
use crate::{Error, Result};

// ============================================================================
// Options
// ============================================================================

/// What a dense cell holds when no row, or more than one row, matches it.
#[derive(Debug, Clone, PartialEq)]
pub enum MissingValue {
    /// Leave the unset sentinel in place.
    Unset,
    /// Store this value (usually `Value::Null`).
    Value(Value),
}

/// How a dense load treats several rows matching one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Log, record in the report, store the missing value, continue.
    #[default]
    Warn,
    /// Abort the load with `Error::DuplicateKeyDetected`.
    Fail,
}

/// Loader configuration.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Dimension columns in dimension order. Empty means every column
    /// except the name and value columns, in table order.
    pub dimension_columns: Vec<String>,
    /// Column holding the variable name, when several variables share a table.
    pub name_column: Option<String>,
    pub value_column: String,
    pub representation: Representation,
    pub missing: MissingValue,
    pub duplicates: DuplicatePolicy,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            dimension_columns: Vec::new(),
            name_column: None,
            value_column: "value".into(),
            representation: Representation::Sparse,
            missing: MissingValue::Value(Value::Null),
            duplicates: DuplicatePolicy::Warn,
        }
    }
}

impl LoadOptions {
    pub fn new<I, S>(dimension_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dimension_columns: dimension_columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn name_column(mut self, column: impl Into<String>) -> Self {
        self.name_column = Some(column.into());
        self
    }

    pub fn value_column(mut self, column: impl Into<String>) -> Self {
        self.value_column = column.into();
        self
    }

    pub fn representation(mut self, representation: Representation) -> Self {
        self.representation = representation;
        self
    }

    pub fn missing(mut self, missing: MissingValue) -> Self {
        self.missing = missing;
        self
    }

    pub fn duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    fn resolve_dimension_columns(&self, table: &Table) -> Vec<String> {
        if !self.dimension_columns.is_empty() {
            return self.dimension_columns.clone();
        }
        table
            .columns()
            .iter()
            .filter(|c| **c != self.value_column && Some(*c) != self.name_column.as_ref())
            .cloned()
            .collect()
    }
}

// ============================================================================
// Results
// ============================================================================

/// Stores produced by a load: one store when a single variable was
/// requested, otherwise one per requested name in request order.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    Single(Store),
    Many(Vec<Store>),
}

impl Loaded {
    pub fn into_single(self) -> Result<Store> {
        match self {
            Loaded::Single(store) => Ok(store),
            Loaded::Many(stores) => Err(Error::InvalidInput(format!(
                "expected a single variable, loaded {}",
                stores.len()
            ))),
        }
    }

    pub fn into_stores(self) -> Vec<Store> {
        match self {
            Loaded::Single(store) => vec![store],
            Loaded::Many(stores) => stores,
        }
    }
}

/// A dense cell that more than one source row matched.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateKey {
    pub variable: String,
    pub index: Vec<Value>,
    pub rows: usize,
}

/// Data-quality findings of a load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub duplicates: Vec<DuplicateKey>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty()
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load the named variables from a long-format table.
///
/// Duplicate findings are logged and otherwise dropped; use
/// [`load_with_report`] to inspect them.
pub fn load(names: &[&str], table: &Table, opts: &LoadOptions) -> Result<Loaded> {
    load_with_report(names, table, opts).map(|(loaded, _)| loaded)
}

pub fn load_with_report(
    names: &[&str],
    table: &Table,
    opts: &LoadOptions,
) -> Result<(Loaded, LoadReport)> {
    if names.is_empty() {
        return Err(Error::InvalidInput("no variable names requested".into()));
    }

    // Structural validation before anything is built.
    let dim_columns = opts.resolve_dimension_columns(table);
    let dim_idx = dim_columns
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<Vec<_>>>()?;
    let value_idx = table.column_index(&opts.value_column)?;
    let name_idx = opts
        .name_column
        .as_deref()
        .map(|c| table.column_index(c))
        .transpose()?;
    if name_idx.is_none() && names.len() > 1 {
        return Err(Error::InvalidInput(format!(
            "{} variables requested without a name column",
            names.len()
        )));
    }

    let dim_refs: Vec<&str> = dim_columns.iter().map(String::as_str).collect();
    let layout = Layout { dim_columns: &dim_refs, dim_idx: &dim_idx, value_idx };

    let mut report = LoadReport::default();
    let mut stores = Vec::with_capacity(names.len());
    for name in names {
        let sub = match (name_idx, &opts.name_column) {
            (Some(_), Some(col)) => table.filter_eq(col, &Value::from(*name))?,
            _ => table.clone(),
        };
        let store = match opts.representation {
            Representation::Sparse => Store::Sparse(load_sparse(&sub, &layout)?),
            Representation::Dense => {
                Store::Dense(load_dense(name, &sub, &layout, opts, &mut report)?)
            }
        };
        debug!(
            variable = %name,
            representation = %opts.representation,
            rows = sub.len(),
            shape = ?store.size(),
            "loaded variable"
        );
        stores.push(store);
    }

    let loaded = if stores.len() == 1 {
        Loaded::Single(stores.remove(0))
    } else {
        Loaded::Many(stores)
    };
    Ok((loaded, report))
}

/// Resolved column positions shared by both load paths.
struct Layout<'a> {
    dim_columns: &'a [&'a str],
    dim_idx: &'a [usize],
    value_idx: usize,
}

/// Observed type of the value column. Under `Float`, integer cells are
/// stored widened so every number in the variable is a `Float`.
fn value_type(sub: &Table, value_idx: usize) -> ValueType {
    ValueType::observe(sub.rows().iter().map(|row| &row[value_idx]))
}

fn load_sparse(sub: &Table, layout: &Layout<'_>) -> Result<SparseStore> {
    let catalog = DimensionCatalog::infer(sub, layout.dim_columns)?;
    let ty = value_type(sub, layout.value_idx);
    let mut store = SparseStore::new(catalog.into_dimensions(), ty);
    for row in sub.rows() {
        let key: Vec<Value> = layout.dim_idx.iter().map(|&i| row[i].clone()).collect();
        store.set(&key, row[layout.value_idx].clone().widen_to(ty))?;
    }
    Ok(store)
}

fn load_dense(
    name: &str,
    sub: &Table,
    layout: &Layout<'_>,
    opts: &LoadOptions,
    report: &mut LoadReport,
) -> Result<DenseStore> {
    let catalog = DimensionCatalog::infer(sub, layout.dim_columns)?;
    let ty = value_type(sub, layout.value_idx);
    let mut store = DenseStore::new(catalog.into_dimensions(), ty);

    // Group rows by cell in a single pass: position tuple → (match count, last value).
    let mut cells: HashMap<Vec<usize>, (usize, &Value)> = HashMap::new();
    let mut order: Vec<Vec<usize>> = Vec::new();
    for row in sub.rows() {
        let labels: Vec<Value> = layout.dim_idx.iter().map(|&i| row[i].clone()).collect();
        let index = store.positions_of(&labels)?;
        let value = &row[layout.value_idx];
        match cells.get_mut(&index) {
            Some(cell) => *cell = (cell.0 + 1, value),
            None => {
                cells.insert(index.clone(), (1, value));
                order.push(index);
            }
        }
    }

    if let MissingValue::Value(missing) = &opts.missing {
        store.fill(missing.clone());
    }

    for index in order {
        let (rows, value) = cells[&index];
        if rows == 1 {
            store.set(&index, value.clone().widen_to(ty))?;
            continue;
        }

        let labels = store.labels_of(&index)?;
        if opts.duplicates == DuplicatePolicy::Fail {
            return Err(Error::DuplicateKeyDetected {
                variable: name.to_string(),
                index: format_index(&labels),
                rows,
            });
        }
        warn!(
            variable = %name,
            index = %format_index(&labels),
            rows,
            "duplicate rows for one cell; storing the missing value"
        );
        report.duplicates.push(DuplicateKey {
            variable: name.to_string(),
            index: labels,
            rows,
        });
    }
    Ok(store)
}
