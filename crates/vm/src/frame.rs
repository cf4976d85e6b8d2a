//! Variable storage for one scope.

use std::collections::BTreeMap;

use ippcode_common::Value;

/// What a frame knows about a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'a> {
    /// Never declared in this frame.
    Undeclared,
    /// Declared by DEFVAR but never assigned.
    Uninitialized,
    /// Declared and holding a value (possibly `Nil`).
    Initialized(&'a Value),
}

/// A mapping from variable name to an optional value.
///
/// Absent names are undeclared; present names map to `None` until their
/// first assignment. Names are kept ordered so state dumps are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    vars: BTreeMap<String, Option<Value>>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, name: &str) -> Slot<'_> {
        match self.vars.get(name) {
            None => Slot::Undeclared,
            Some(None) => Slot::Uninitialized,
            Some(Some(value)) => Slot::Initialized(value),
        }
    }

    /// Declare `name` as uninitialized. Returns false if it already exists.
    pub fn declare(&mut self, name: &str) -> bool {
        if self.vars.contains_key(name) {
            return false;
        }
        self.vars.insert(name.to_string(), None);
        true
    }

    /// Overwrite a declared name. Returns false if `name` is undeclared.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        match self.vars.get_mut(name) {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_states() {
        let mut frame = Frame::new();
        assert_eq!(frame.lookup("x"), Slot::Undeclared);

        assert!(frame.declare("x"));
        assert_eq!(frame.lookup("x"), Slot::Uninitialized);

        assert!(frame.assign("x", Value::Nil));
        assert_eq!(frame.lookup("x"), Slot::Initialized(&Value::Nil));
    }

    #[test]
    fn declare_twice_fails_even_when_uninitialized() {
        let mut frame = Frame::new();
        assert!(frame.declare("x"));
        assert!(!frame.declare("x"));

        frame.assign("x", Value::Int(1));
        assert!(!frame.declare("x"));
        // Redeclaration attempt leaves the value alone.
        assert_eq!(frame.lookup("x"), Slot::Initialized(&Value::Int(1)));
    }

    #[test]
    fn assign_requires_declaration() {
        let mut frame = Frame::new();
        assert!(!frame.assign("ghost", Value::Int(1)));
        assert!(frame.is_empty());
    }

    #[test]
    fn iter_is_name_ordered() {
        let mut frame = Frame::new();
        frame.declare("b");
        frame.declare("a");
        frame.assign("b", Value::Bool(true));
        let items: Vec<_> = frame.iter().collect();
        assert_eq!(items, vec![("a", None), ("b", Some(&Value::Bool(true)))]);
        assert_eq!(frame.len(), 2);
    }
}
