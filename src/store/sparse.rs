//! Sparse store — a key → value mapping over element tuples.
//!
//! Entries keep the order in which their keys were first written; an
//! upsert replaces the value in place. Absent tuples mean "no value",
//! which is distinct from a present tuple holding `Value::Null`.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::model::value::format_index;
use crate::model::{Dimension, IndexKey, Value, ValueType};
use crate::store::{check_arity, NotFoundReason, VariableStore};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct SparseStore {
    dimensions: Vec<Dimension>,
    value_type: ValueType,
    /// key → slot in `entries`
    slots: HashMap<IndexKey, usize>,
    entries: Vec<(IndexKey, Value)>,
}

impl SparseStore {
    pub fn new(dimensions: Vec<Dimension>, value_type: ValueType) -> Self {
        Self {
            dimensions,
            value_type,
            slots: HashMap::new(),
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn contains(&self, index: &[Value]) -> Result<bool> {
        check_arity(self.dimensions.len(), index.len())?;
        Ok(self.slots.contains_key(index))
    }

    /// Entries in first-write order.
    pub fn iter(&self) -> impl Iterator<Item = (&[Value], &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_slice(), v))
    }

    /// Remove a tuple, returning its value if it was present.
    pub fn remove(&mut self, index: &[Value]) -> Result<Option<Value>> {
        check_arity(self.dimensions.len(), index.len())?;
        let Some(slot) = self.slots.remove(index) else {
            return Ok(None);
        };
        let (_, value) = self.entries.remove(slot);
        for s in self.slots.values_mut() {
            if *s > slot {
                *s -= 1;
            }
        }
        Ok(Some(value))
    }
}

impl VariableStore for SparseStore {
    type Index = Value;

    fn dimensions(&self) -> &[Dimension] { &self.dimensions }
    fn value_type(&self) -> ValueType { self.value_type }

    fn get(&self, index: &[Value]) -> Result<&Value> {
        check_arity(self.dimensions.len(), index.len())?;
        self.slots
            .get(index)
            .map(|slot| &self.entries[*slot].1)
            .ok_or_else(|| Error::NotFound {
                index: format_index(index),
                reason: NotFoundReason::KeyAbsent,
            })
    }

    fn set(&mut self, index: &[Value], value: Value) -> Result<()> {
        check_arity(self.dimensions.len(), index.len())?;
        match self.slots.get(index) {
            Some(slot) => self.entries[*slot].1 = value,
            None => {
                let key: IndexKey = SmallVec::from(index);
                self.slots.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SparseStore {
        SparseStore::new(
            vec![Dimension::named("reg", ["us", "eu"]), Dimension::indexed("t", 3)],
            ValueType::Float,
        )
    }

    fn key(reg: &str, t: i64) -> [Value; 2] {
        [Value::from(reg), Value::Int(t)]
    }

    #[test]
    fn test_set_get_roundtrip() {
        let mut s = store();
        s.set(&key("us", 1), Value::Float(1.0)).unwrap();
        assert_eq!(s.get(&key("us", 1)).unwrap(), &Value::Float(1.0));
    }

    #[test]
    fn test_upsert_keeps_single_entry() {
        let mut s = store();
        s.set(&key("us", 1), Value::Float(1.0)).unwrap();
        s.set(&key("eu", 2), Value::Float(2.0)).unwrap();
        s.set(&key("us", 1), Value::Float(3.0)).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.get(&key("us", 1)).unwrap(), &Value::Float(3.0));
        let order: Vec<_> = s.iter().map(|(k, _)| k.to_vec()).collect();
        assert_eq!(order, vec![key("us", 1).to_vec(), key("eu", 2).to_vec()]);
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let s = store();
        let err = s.get(&key("eu", 3)).unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound { reason: NotFoundReason::KeyAbsent, .. }
        ));
        assert_eq!(s.get_safe(&key("eu", 3), Value::Float(0.0)).unwrap(), Value::Float(0.0));
    }

    #[test]
    fn test_null_value_is_present() {
        let mut s = store();
        s.set(&key("us", 2), Value::Null).unwrap();
        assert_eq!(s.get(&key("us", 2)).unwrap(), &Value::Null);
        assert_eq!(s.get_safe(&key("us", 2), Value::Float(9.0)).unwrap(), Value::Null);
    }

    #[test]
    fn test_arity_mismatch() {
        let mut s = store();
        assert!(matches!(
            s.set(&[Value::from("us")], Value::Null),
            Err(Error::ArityMismatch { expected: 2, got: 1 })
        ));
        // get_safe never hides structural errors
        assert!(matches!(
            s.get_safe(&[Value::from("us")], Value::Null),
            Err(Error::ArityMismatch { .. })
        ));
    }

    #[test]
    fn test_remove_reindexes() {
        let mut s = store();
        s.set(&key("us", 1), 1.0.into()).unwrap();
        s.set(&key("us", 2), 2.0.into()).unwrap();
        s.set(&key("us", 3), 3.0.into()).unwrap();
        assert_eq!(s.remove(&key("us", 1)).unwrap(), Some(Value::Float(1.0)));
        assert_eq!(s.remove(&key("us", 1)).unwrap(), None);
        assert_eq!(s.get(&key("us", 3)).unwrap(), &Value::Float(3.0));
        s.set(&key("us", 2), 4.0.into()).unwrap();
        assert_eq!(s.get(&key("us", 2)).unwrap(), &Value::Float(4.0));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_size_is_declared_shape() {
        assert_eq!(store().size(), vec![2, 3]);
    }
}
