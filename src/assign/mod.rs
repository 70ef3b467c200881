//! Bulk assignment — one write per element of a Cartesian product.
//!
//! A template lists one `IndexSpec` per target dimension: either a fixed
//! component or a named range. For every combination of range values the
//! right-hand side is evaluated with the current binding and the result is
//! written to the target with `set`.
//!
//! Combinations are visited row-major: the leftmost range is the outermost
//! loop. A failing `set` or right-hand side aborts the whole assignment;
//! writes made by earlier combinations stay in the target.

use std::ops::Index;

use tracing::debug;

use crate::model::Value;
use crate::store::VariableStore;
use crate::{Error, Result};

/// One component of a target index template.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexSpec<I> {
    /// Passed through unchanged.
    Fixed(I),
    /// Iterates over `values`, bound to `name` for the right-hand side.
    Range { name: String, values: Vec<I> },
}

impl<I> IndexSpec<I> {
    pub fn fixed(value: impl Into<I>) -> Self {
        IndexSpec::Fixed(value.into())
    }

    pub fn range<V, T>(name: impl Into<String>, values: V) -> Self
    where
        V: IntoIterator<Item = T>,
        T: Into<I>,
    {
        IndexSpec::Range {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Current value of each range variable during one evaluation.
#[derive(Debug)]
pub struct Binding<'a, I> {
    names: &'a [&'a str],
    values: Vec<&'a I>,
}

impl<'a, I> Binding<'a, I> {
    pub fn get(&self, name: &str) -> Option<&'a I> {
        self.names.iter().position(|n| *n == name).map(|i| self.values[i])
    }

    /// Like `get`, but an unbound name is an error.
    pub fn value(&self, name: &str) -> Result<&'a I> {
        self.get(name).ok_or_else(|| Error::UnboundRange(name.to_string()))
    }

    pub fn names(&self) -> &[&'a str] {
        self.names
    }
}

impl<I> Index<&str> for Binding<'_, I> {
    type Output = I;

    /// Panics if `name` is not a range variable of the template.
    fn index(&self, name: &str) -> &I {
        match self.get(name) {
            Some(v) => v,
            None => panic!("range variable '{name}' is not bound"),
        }
    }
}

/// Run a bulk assignment of `rhs` into `target` over `template`.
pub fn assign<S, F>(target: &mut S, template: &[IndexSpec<S::Index>], mut rhs: F) -> Result<()>
where
    S: VariableStore + ?Sized,
    F: FnMut(&Binding<'_, S::Index>) -> Result<Value>,
{
    // Range positions within the template, outermost first.
    let mut names: Vec<&str> = Vec::new();
    let mut ranges: Vec<&[S::Index]> = Vec::new();
    for spec in template {
        if let IndexSpec::Range { name, values } = spec {
            if names.contains(&name.as_str()) {
                return Err(Error::DuplicateRange(name.clone()));
            }
            names.push(name);
            ranges.push(values);
        }
    }

    if ranges.iter().any(|r| r.is_empty()) {
        debug!(ranges = ranges.len(), writes = 0, "bulk assignment over an empty range");
        return Ok(());
    }

    // Odometer over range positions, last range fastest.
    let mut cursor = vec![0usize; ranges.len()];
    let mut writes = 0usize;
    loop {
        let binding = Binding {
            names: &names,
            values: cursor.iter().zip(&ranges).map(|(&i, r)| &r[i]).collect(),
        };
        let value = rhs(&binding)?;

        let mut next_range = 0;
        let index: Vec<S::Index> = template
            .iter()
            .map(|spec| match spec {
                IndexSpec::Fixed(v) => v.clone(),
                IndexSpec::Range { .. } => {
                    let v = binding.values[next_range].clone();
                    next_range += 1;
                    v
                }
            })
            .collect();
        target.set(&index, value)?;
        writes += 1;

        if !advance(&mut cursor, &ranges) {
            break;
        }
    }

    debug!(ranges = ranges.len(), writes, "bulk assignment complete");
    Ok(())
}

/// Step the odometer; false once every combination has been visited.
fn advance<T>(cursor: &mut [usize], ranges: &[&[T]]) -> bool {
    for pos in (0..cursor.len()).rev() {
        cursor[pos] += 1;
        if cursor[pos] < ranges[pos].len() {
            return true;
        }
        cursor[pos] = 0;
    }
    false
}

/// Builder for a target template.
///
/// ```rust
/// # use dimvars::{Assignment, Dimension, SparseStore, Value, ValueType, VariableStore};
/// # fn main() -> dimvars::Result<()> {
/// let dims = vec![Dimension::named("reg", ["us", "eu"]), Dimension::named("prod", ["a", "b"])];
/// let mut x = SparseStore::new(dims, ValueType::Int);
///
/// // x[r in {us, eu}, a] = 1
/// Assignment::<Value>::new()
///     .over("r", ["us", "eu"])
///     .fixed("a")
///     .run(&mut x, |_| Ok(Value::Int(1)))?;
///
/// assert_eq!(x.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Assignment<I> {
    template: Vec<IndexSpec<I>>,
}

impl<I> Default for Assignment<I> {
    fn default() -> Self {
        Self { template: Vec::new() }
    }
}

impl<I> Assignment<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fixed(mut self, value: impl Into<I>) -> Self {
        self.template.push(IndexSpec::fixed(value));
        self
    }

    pub fn over<V, T>(mut self, name: impl Into<String>, values: V) -> Self
    where
        V: IntoIterator<Item = T>,
        T: Into<I>,
    {
        self.template.push(IndexSpec::range(name, values));
        self
    }

    pub fn template(&self) -> &[IndexSpec<I>] {
        &self.template
    }

    pub fn run<S, F>(&self, target: &mut S, rhs: F) -> Result<()>
    where
        S: VariableStore<Index = I> + ?Sized,
        F: FnMut(&Binding<'_, I>) -> Result<Value>,
    {
        assign(target, &self.template, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dimension, ValueType};
    use crate::store::{DenseStore, SparseStore};

    fn sparse() -> SparseStore {
        SparseStore::new(
            vec![Dimension::named("d1", ["a", "b", "c"]), Dimension::named("d2", ["x", "y"])],
            ValueType::Any,
        )
    }

    #[test]
    fn test_fixed_component_two_writes() {
        let mut s = sparse();
        Assignment::<Value>::new()
            .over("d1", ["a", "b"])
            .fixed("c")
            .run(&mut s, |b| Ok(b["d1"].clone()))
            .unwrap();
        let written: Vec<Vec<Value>> = s.iter().map(|(k, _)| k.to_vec()).collect();
        assert_eq!(
            written,
            vec![
                vec![Value::from("a"), Value::from("c")],
                vec![Value::from("b"), Value::from("c")],
            ]
        );
    }

    #[test]
    fn test_row_major_order() {
        let mut s = sparse();
        let mut visited = Vec::new();
        Assignment::<Value>::new()
            .over("i", ["a", "b"])
            .over("j", ["x", "y"])
            .run(&mut s, |b| {
                visited.push(format!("{}{}", b["i"], b["j"]));
                Ok(Value::Null)
            })
            .unwrap();
        assert_eq!(visited, vec!["ax", "ay", "bx", "by"]);
    }

    #[test]
    fn test_dense_positions() {
        let mut d = DenseStore::new(
            vec![Dimension::indexed("t", 3), Dimension::indexed("k", 2)],
            ValueType::Int,
        );
        Assignment::<usize>::new()
            .over("t", 1..=3usize)
            .over("k", [1usize, 2])
            .run(&mut d, |b| Ok(Value::Int((b["t"] * 10 + b["k"]) as i64)))
            .unwrap();
        assert_eq!(d.get(&[3, 2]).unwrap(), &Value::Int(32));
        assert_eq!(d.populated(), 6);
    }

    #[test]
    fn test_empty_range_writes_nothing() {
        let mut s = sparse();
        Assignment::<Value>::new()
            .over("d1", Vec::<Value>::new())
            .fixed("x")
            .run(&mut s, |_| panic!("never evaluated"))
            .unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn test_no_ranges_writes_once() {
        let mut s = sparse();
        Assignment::<Value>::new()
            .fixed("a")
            .fixed("x")
            .run(&mut s, |_| Ok(Value::Int(7)))
            .unwrap();
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_duplicate_values_last_wins() {
        let mut s = sparse();
        let mut n = 0;
        Assignment::<Value>::new()
            .over("d1", ["a", "a"])
            .fixed("x")
            .run(&mut s, |_| {
                n += 1;
                Ok(Value::Int(n))
            })
            .unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(s.get(&["a".into(), "x".into()]).unwrap(), &Value::Int(2));
    }

    #[test]
    fn test_failure_keeps_earlier_writes() {
        let mut d = DenseStore::new(vec![Dimension::indexed("t", 2)], ValueType::Int);
        let err = Assignment::<usize>::new()
            .over("t", 1..=3usize)
            .run(&mut d, |_| Ok(Value::Int(1)))
            .unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 3, .. }));
        assert_eq!(d.populated(), 2);
    }

    #[test]
    fn test_rhs_error_aborts() {
        let mut s = sparse();
        let err = Assignment::<Value>::new()
            .over("d1", ["a", "b", "c"])
            .fixed("x")
            .run(&mut s, |b| {
                if b["d1"] == Value::from("b") {
                    return Err(Error::InvalidInput("boom".into()));
                }
                Ok(Value::Int(1))
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_duplicate_range_rejected_before_writes() {
        let mut s = sparse();
        let err = Assignment::<Value>::new()
            .over("i", ["a"])
            .over("i", ["x"])
            .run(&mut s, |_| Ok(Value::Null))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRange(n) if n == "i"));
        assert!(s.is_empty());
    }

    #[test]
    fn test_binding_value_unbound() {
        let mut s = sparse();
        let err = Assignment::<Value>::new()
            .over("i", ["a"])
            .fixed("x")
            .run(&mut s, |b| b.value("j").cloned())
            .unwrap_err();
        assert!(matches!(err, Error::UnboundRange(n) if n == "j"));
    }
}
