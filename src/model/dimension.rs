//! Dimension — a named axis of a variable.

use hashbrown::HashMap;

use super::{Value, ValueType};
use crate::{Error, Result};

/// Explicit, ordered element list with a reverse lookup to 1-based positions.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedDimension {
    elements: Vec<Value>,
    positions: HashMap<Value, usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DimensionKind {
    /// Explicit ordered list of admissible values.
    Named(NamedDimension),
    /// Plain integer range `1..=size`.
    Indexed(usize),
}

/// A named axis with a finite, ordered set of elements.
///
/// Positions are 1-based throughout the crate: the first element of a
/// dimension is at position 1, the last at `cardinality()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    name: String,
    value_type: ValueType,
    kind: DimensionKind,
}

impl NamedDimension {
    fn new(elements: impl IntoIterator<Item = Value>) -> Self {
        let mut ordered = Vec::new();
        let mut positions = HashMap::new();
        for elem in elements {
            if !positions.contains_key(&elem) {
                positions.insert(elem.clone(), ordered.len() + 1);
                ordered.push(elem);
            }
        }
        NamedDimension { elements: ordered, positions }
    }
}

impl Dimension {
    /// A dimension over explicit elements. Repeated elements keep their
    /// first position; the element type is observed from the values.
    pub fn named<I, V>(name: impl Into<String>, elements: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let named = NamedDimension::new(elements.into_iter().map(Into::into));
        Dimension {
            name: name.into(),
            value_type: ValueType::observe(&named.elements),
            kind: DimensionKind::Named(named),
        }
    }

    /// A dimension over explicit elements of a declared type.
    pub fn named_typed<I, V>(name: impl Into<String>, value_type: ValueType, elements: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let name = name.into();
        let named = NamedDimension::new(elements.into_iter().map(Into::into));
        if let Some(bad) = named.elements.iter().find(|e| !e.fits(value_type)) {
            return Err(Error::TypeError {
                expected: format!("{value_type} element of dimension '{name}'"),
                got: bad.type_name().into(),
            });
        }
        Ok(Dimension { name, value_type, kind: DimensionKind::Named(named) })
    }

    /// An integer range dimension with positions `1..=size`.
    pub fn indexed(name: impl Into<String>, size: usize) -> Self {
        Dimension {
            name: name.into(),
            value_type: ValueType::Int,
            kind: DimensionKind::Indexed(size),
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn value_type(&self) -> ValueType { self.value_type }
    pub fn kind(&self) -> &DimensionKind { &self.kind }

    pub fn cardinality(&self) -> usize {
        match &self.kind {
            DimensionKind::Named(named) => named.elements.len(),
            DimensionKind::Indexed(size) => *size,
        }
    }

    /// 1-based position of an element, if it belongs to this dimension.
    pub fn position_of(&self, element: &Value) -> Option<usize> {
        match &self.kind {
            DimensionKind::Named(named) => named.positions.get(element).copied(),
            DimensionKind::Indexed(size) => match element {
                Value::Int(i) if *i >= 1 && (*i as u64) <= *size as u64 => Some(*i as usize),
                _ => None,
            },
        }
    }

    /// Element at a 1-based position.
    pub fn element(&self, position: usize) -> Option<Value> {
        if position == 0 || position > self.cardinality() {
            return None;
        }
        match &self.kind {
            DimensionKind::Named(named) => Some(named.elements[position - 1].clone()),
            DimensionKind::Indexed(_) => Some(Value::Int(position as i64)),
        }
    }

    /// All elements in declared order.
    pub fn elements(&self) -> Vec<Value> {
        match &self.kind {
            DimensionKind::Named(named) => named.elements.clone(),
            DimensionKind::Indexed(size) => (1..=*size as i64).map(Value::Int).collect(),
        }
    }
}
