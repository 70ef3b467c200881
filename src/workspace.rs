//! Workspace — named variables and formulas over them.
//!
//! The workspace maps variable names to stores so formulas can refer to a
//! variable by its short name. Right-hand sides of an assignment receive
//! the workspace explicitly; nothing is bound globally.

use hashbrown::HashMap;

use crate::assign::{self, Binding, IndexSpec};
use crate::loader::{self, LoadOptions, LoadReport};
use crate::model::{FromValue, Value};
use crate::store::{Store, VariableStore};
use crate::table::Table;
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct Workspace {
    stores: HashMap<String, Store>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a variable, returning the previous store.
    pub fn insert(&mut self, name: impl Into<String>, store: impl Into<Store>) -> Option<Store> {
        self.stores.insert(name.into(), store.into())
    }

    pub fn get(&self, name: &str) -> Result<&Store> {
        self.stores
            .get(name)
            .ok_or_else(|| Error::UnknownVariable(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Store> {
        self.stores
            .get_mut(name)
            .ok_or_else(|| Error::UnknownVariable(name.to_string()))
    }

    pub fn remove(&mut self, name: &str) -> Option<Store> {
        self.stores.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stores.contains_key(name)
    }

    /// Variable names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.stores.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Load variables from a table and register each under its name.
    pub fn load(&mut self, names: &[&str], table: &Table, opts: &LoadOptions) -> Result<LoadReport> {
        let (loaded, report) = loader::load_with_report(names, table, opts)?;
        for (name, store) in names.iter().zip(loaded.into_stores()) {
            self.insert(*name, store);
        }
        Ok(report)
    }

    /// Element of a variable, by element labels.
    pub fn value(&self, name: &str, index: &[Value]) -> Result<&Value> {
        self.get(name)?.get(index)
    }

    /// Like `value`, but `NotFound` yields `default`.
    pub fn value_or(&self, name: &str, index: &[Value], default: Value) -> Result<Value> {
        self.get(name)?.get_safe(index, default)
    }

    /// Typed element of a variable.
    pub fn value_as<T: FromValue>(&self, name: &str, index: &[Value]) -> Result<T> {
        self.get(name)?.get_as(index)
    }

    /// Bulk-assign into `target`.
    ///
    /// The target is detached from the workspace while the assignment runs,
    /// so the right-hand side reads every variable except the target (which
    /// reports `UnknownVariable`). The target is re-attached afterwards,
    /// also when the assignment fails part-way.
    pub fn assign<F>(&mut self, target: &str, template: &[IndexSpec<Value>], mut rhs: F) -> Result<()>
    where
        F: FnMut(&Workspace, &Binding<'_, Value>) -> Result<Value>,
    {
        let mut store = self
            .stores
            .remove(target)
            .ok_or_else(|| Error::UnknownVariable(target.to_string()))?;
        let this = &*self;
        let result = assign::assign(&mut store, template, |b| rhs(this, b));
        self.stores.insert(target.to_string(), store);
        result
    }
}
