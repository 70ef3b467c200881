//! Dense store — a fixed-shape array over 1-based dimension positions.
//!
//! Every cell is either a value or the unset sentinel (`None`); cells are
//! never uninitialised. Storage is row-major: the first dimension varies
//! slowest, the last fastest.

use crate::model::value::format_index;
use crate::model::{Dimension, Value, ValueType};
use crate::store::{check_arity, NotFoundReason, VariableStore};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct DenseStore {
    dimensions: Vec<Dimension>,
    value_type: ValueType,
    shape: Vec<usize>,
    cells: Vec<Option<Value>>,
}

impl DenseStore {
    /// Allocate a store of the dimensions' shape, every cell unset.
    pub fn new(dimensions: Vec<Dimension>, value_type: ValueType) -> Self {
        let shape: Vec<usize> = dimensions.iter().map(Dimension::cardinality).collect();
        let len = shape.iter().product();
        Self {
            dimensions,
            value_type,
            shape,
            cells: vec![None; len],
        }
    }

    /// Row-major offset of a 1-based position tuple.
    fn offset(&self, index: &[usize]) -> Result<usize> {
        check_arity(self.shape.len(), index.len())?;
        let mut offset = 0;
        for (dim, (&pos, &card)) in index.iter().zip(&self.shape).enumerate() {
            if pos == 0 || pos > card {
                return Err(Error::IndexOutOfRange {
                    dimension: self.dimensions[dim].name().to_string(),
                    index: pos,
                    cardinality: card,
                });
            }
            offset = offset * card + (pos - 1);
        }
        Ok(offset)
    }

    /// Position tuple of a row-major offset.
    fn positions_at(&self, mut offset: usize) -> Vec<usize> {
        let mut index = vec![0; self.shape.len()];
        for (slot, &card) in index.iter_mut().zip(&self.shape).rev() {
            *slot = offset % card + 1;
            offset /= card;
        }
        index
    }

    /// Translate an element tuple into 1-based positions.
    ///
    /// An element that is not part of its dimension is `NotFound`: such a
    /// cell can never hold a value.
    pub fn positions_of(&self, labels: &[Value]) -> Result<Vec<usize>> {
        check_arity(self.dimensions.len(), labels.len())?;
        labels
            .iter()
            .zip(&self.dimensions)
            .map(|(label, dim)| {
                dim.position_of(label).ok_or_else(|| Error::NotFound {
                    index: format_index(labels),
                    reason: NotFoundReason::KeyAbsent,
                })
            })
            .collect()
    }

    /// Element tuple of a position tuple.
    pub fn labels_of(&self, index: &[usize]) -> Result<Vec<Value>> {
        self.offset(index)?;
        Ok(index
            .iter()
            .zip(&self.dimensions)
            .filter_map(|(pos, dim)| dim.element(*pos))
            .collect())
    }

    pub fn get_labeled(&self, labels: &[Value]) -> Result<&Value> {
        let index = self.positions_of(labels)?;
        self.get(&index)
    }

    /// Write by element tuple. Unknown elements are rejected.
    pub fn set_labeled(&mut self, labels: &[Value], value: Value) -> Result<()> {
        check_arity(self.dimensions.len(), labels.len())?;
        let mut index = Vec::with_capacity(labels.len());
        for (label, dim) in labels.iter().zip(&self.dimensions) {
            let pos = dim.position_of(label).ok_or_else(|| Error::UnknownElement {
                dimension: dim.name().to_string(),
                element: label.to_string(),
            })?;
            index.push(pos);
        }
        self.set(&index, value)
    }

    /// Reset a cell to the unset sentinel, returning what it held.
    pub fn unset(&mut self, index: &[usize]) -> Result<Option<Value>> {
        let offset = self.offset(index)?;
        Ok(self.cells[offset].take())
    }

    /// Set every cell to `value`.
    pub fn fill(&mut self, value: Value) {
        self.cells.iter_mut().for_each(|c| *c = Some(value.clone()));
    }

    /// Number of cells not holding the unset sentinel.
    pub fn populated(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_set(&self, index: &[usize]) -> Result<bool> {
        Ok(self.cells[self.offset(index)?].is_some())
    }

    /// Set cells in row-major order with their position tuples.
    pub fn iter_set(&self) -> impl Iterator<Item = (Vec<usize>, &Value)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(offset, cell)| cell.as_ref().map(|v| (self.positions_at(offset), v)))
    }
}

impl VariableStore for DenseStore {
    type Index = usize;

    fn dimensions(&self) -> &[Dimension] { &self.dimensions }
    fn value_type(&self) -> ValueType { self.value_type }

    fn get(&self, index: &[usize]) -> Result<&Value> {
        let offset = self.offset(index)?;
        self.cells[offset].as_ref().ok_or_else(|| Error::NotFound {
            index: format_index(index),
            reason: NotFoundReason::ValueUnset,
        })
    }

    fn set(&mut self, index: &[usize], value: Value) -> Result<()> {
        let offset = self.offset(index)?;
        self.cells[offset] = Some(value);
        Ok(())
    }

    fn size(&self) -> Vec<usize> {
        self.shape.clone()
    }
}
