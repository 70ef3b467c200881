//! Dimension catalog — resolves the ordered dimensions of a variable.
//!
//! Dimensions come either from an explicit declaration or from the distinct
//! values of a table's dimension columns. Inferred element lists are in
//! first-occurrence order, so two catalogs derived from the same table and
//! column selection agree element-for-element.

use crate::model::{Dimension, Value, ValueType};
use crate::table::Table;
use crate::{Error, Result};

/// Ordered list of dimensions used to construct a store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DimensionCatalog {
    dimensions: Vec<Dimension>,
}

impl DimensionCatalog {
    pub fn explicit(dimensions: Vec<Dimension>) -> Result<Self> {
        if let Some(dup) = first_duplicate(dimensions.iter().map(Dimension::name)) {
            return Err(Error::InvalidInput(format!("dimension '{dup}' declared twice")));
        }
        Ok(Self { dimensions })
    }

    /// Declare dimensions by name, type and element list.
    pub fn declare<'a, I>(decls: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, ValueType, Vec<Value>)>,
    {
        let dimensions = decls
            .into_iter()
            .map(|(name, ty, elements)| Dimension::named_typed(name, ty, elements))
            .collect::<Result<Vec<_>>>()?;
        Self::explicit(dimensions)
    }

    /// Infer one dimension per column from the distinct values observed in it.
    pub fn infer(table: &Table, columns: &[&str]) -> Result<Self> {
        let dimensions = columns
            .iter()
            .map(|col| Ok(Dimension::named(*col, table.column_values(col)?.cloned())))
            .collect::<Result<Vec<_>>>()?;
        Self::explicit(dimensions)
    }

    pub fn dimensions(&self) -> &[Dimension] { &self.dimensions }
    pub fn into_dimensions(self) -> Vec<Dimension> { self.dimensions }
    pub fn len(&self) -> usize { self.dimensions.len() }
    pub fn is_empty(&self) -> bool { self.dimensions.is_empty() }

    pub fn get(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name() == name)
    }

    /// Per-dimension cardinalities, in declared order.
    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(Dimension::cardinality).collect()
    }
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = hashbrown::HashSet::new();
    names.into_iter().find(|n| !seen.insert(*n))
}
