//! Property tests for the store contract.
//!
//! - write-then-read returns the written value, for both representations
//! - `get_safe` returns the default for never-written indices
//! - sparse and dense loads of the same table agree on every key

use dimvars::{
    load, DenseStore, Dimension, LoadOptions, Representation, SparseStore, Table, Value,
    ValueType, VariableStore,
};
use proptest::prelude::*;

/// Shape of a store with 1 to 3 dimensions of 1 to 4 elements each.
fn shape() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..=4, 1..=3)
}

fn dims(shape: &[usize]) -> Vec<Dimension> {
    shape
        .iter()
        .enumerate()
        .map(|(i, &n)| Dimension::named(format!("d{i}"), (0..n).map(|e| format!("e{e}"))))
        .collect()
}

/// A shape plus a list of (positions, value) writes within it.
fn shape_and_writes() -> impl Strategy<Value = (Vec<usize>, Vec<(Vec<usize>, i64)>)> {
    let raw_writes = prop::collection::vec(
        (prop::collection::vec(0usize..100, 3), any::<i64>()),
        0..12,
    );
    (shape(), raw_writes).prop_map(|(shape, raw)| {
        let writes: Vec<(Vec<usize>, i64)> = raw
            .into_iter()
            .map(|(raw_pos, v)| {
                let pos: Vec<usize> = shape.iter().zip(raw_pos).map(|(&n, r)| r % n + 1).collect();
                (pos, v)
            })
            .collect();
        (shape, writes)
    })
}

fn labels(positions: &[usize]) -> Vec<Value> {
    positions.iter().map(|p| Value::from(format!("e{}", p - 1))).collect()
}

proptest! {
    #[test]
    fn dense_write_then_read((shape, writes) in shape_and_writes()) {
        let mut store = DenseStore::new(dims(&shape), ValueType::Int);
        for (pos, v) in &writes {
            store.set(pos, Value::Int(*v)).unwrap();
            prop_assert_eq!(store.get(pos).unwrap(), &Value::Int(*v));
        }
        prop_assert_eq!(store.size(), shape);
    }

    #[test]
    fn sparse_write_then_read((shape, writes) in shape_and_writes()) {
        let mut store = SparseStore::new(dims(&shape), ValueType::Int);
        for (pos, v) in &writes {
            let key = labels(pos);
            store.set(&key, Value::Int(*v)).unwrap();
            prop_assert_eq!(store.get(&key).unwrap(), &Value::Int(*v));
        }
        prop_assert!(store.len() <= writes.len());
    }

    #[test]
    fn get_safe_defaults_for_unwritten((shape, writes) in shape_and_writes(), default in any::<i64>()) {
        let mut dense = DenseStore::new(dims(&shape), ValueType::Int);
        let mut sparse = SparseStore::new(dims(&shape), ValueType::Int);
        for (pos, v) in &writes {
            dense.set(pos, Value::Int(*v)).unwrap();
            sparse.set(&labels(pos), Value::Int(*v)).unwrap();
        }

        let probe: Vec<usize> = shape.clone();
        let written = writes.iter().any(|(pos, _)| *pos == probe);
        if !written {
            prop_assert_eq!(dense.get_safe(&probe, Value::Int(default)).unwrap(), Value::Int(default));
            prop_assert_eq!(sparse.get_safe(&labels(&probe), Value::Int(default)).unwrap(), Value::Int(default));
        }
    }

    #[test]
    fn sparse_and_dense_loads_agree((shape, writes) in shape_and_writes()) {
        let mut columns: Vec<String> = (0..shape.len()).map(|i| format!("d{i}")).collect();
        columns.push("value".into());
        let mut table = Table::new(columns.clone());

        // Unique cells only: the dense path flags duplicates.
        let mut seen = std::collections::HashSet::new();
        for (pos, v) in &writes {
            if seen.insert(pos.clone()) {
                let mut row = labels(pos);
                row.push(Value::Int(*v));
                table.push_row(row).unwrap();
            }
        }

        let dim_cols: Vec<&str> = columns[..shape.len()].iter().map(String::as_str).collect();
        let sparse_opts = LoadOptions::new(dim_cols.clone());
        let dense_opts = LoadOptions::new(dim_cols).representation(Representation::Dense);

        let sparse = load(&["x"], &table, &sparse_opts).unwrap().into_single().unwrap().into_sparse().unwrap();
        let dense = load(&["x"], &table, &dense_opts).unwrap().into_single().unwrap().into_dense().unwrap();

        prop_assert_eq!(sparse.size(), dense.size());
        for (key, value) in sparse.iter() {
            let pos = dense.positions_of(key).unwrap();
            prop_assert_eq!(dense.get(&pos).unwrap(), value);
        }
    }
}
