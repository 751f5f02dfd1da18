//! Per-instance, per-node-identity caches: options lists, compiled regex
//! generators, and iterator states are each resolved lazily on first
//! visit and then kept for the lifetime of the generator, keyed by
//! [`NodeId`] rather than by schema structure so that two textually
//! identical nodes placed at different tree positions get independent state.

use std::collections::HashMap;

use crate::{
    iterator::{BoolIterator, IntIterator},
    schema::NodeId,
    value::Value,
};

/// The cached state of one node's `iteration` directive. Boolean iteration
/// needs no mutable fast-forward state beyond its current flag, so it is
/// stored directly; integral and decimal iteration carry `BigInt` state.
#[derive(Clone, Debug)]
pub enum IteratorState {
    /// Boolean iteration.
    Bool(BoolIterator),
    /// `int`/`long` iteration.
    Int(IntIterator),
    /// `float`/`double` iteration, represented as fixed-point `BigInt`
    /// arithmetic (see `crate::iterator::DecimalIterator`).
    Decimal(crate::iterator::DecimalIterator),
}

/// Holds every per-node cache a [`crate::generator::Generator`] consults
/// while walking the schema.
#[derive(Default, Debug)]
pub struct Caches {
    /// Fully materialized options lists, keyed by the node they belong to.
    pub options: HashMap<NodeId, Vec<Value>>,
    /// Compiled regex samplers, keyed by the node carrying the `regex`
    /// directive.
    pub regexes: HashMap<NodeId, rand_regex::Regex>,
    /// Live iteration state, keyed by the node carrying the `iteration`
    /// directive.
    pub iterators: HashMap<NodeId, IteratorState>,
    /// Materialized map-key option lists, keyed by the `map` node carrying a
    /// `keys.options` directive (kept separate from `options` since a map
    /// node can independently have value-options and key-options).
    pub key_options: HashMap<NodeId, Vec<String>>,
}

impl Caches {
    /// Creates an empty cache set.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_caches_are_empty() {
        let c = Caches::new();
        assert!(c.options.is_empty());
        assert!(c.regexes.is_empty());
        assert!(c.iterators.is_empty());
        assert!(c.key_options.is_empty());
    }

    #[test]
    fn test_distinct_node_ids_get_distinct_entries() {
        let mut c = Caches::new();
        c.options.insert(NodeId(0), vec![Value::Int(1)]);
        c.options.insert(NodeId(1), vec![Value::Int(2)]);
        assert_eq!(c.options.len(), 2);
        assert_ne!(c.options[&NodeId(0)], c.options[&NodeId(1)]);
    }
}
