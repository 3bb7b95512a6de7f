// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! `Scope<T>` maps variables to values, where each variable may be bound
//! several times with inner bindings shadowing outer ones.
//! - `push(var, value)` binds `var`, hiding any earlier binding of it.
//! - `pop(var)` removes the innermost binding and reveals the previous one.
//! - `get(&var)` finds the innermost binding, falling back on an optional
//!   read-only containing scope borrowed from the caller.
//!
//! Pushes and pops must balance. Call sites that bind around a recursive
//! walk wrap the walk in a closure so the pop happens on every path.

use crate::ir::Var;
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct Scope<'a, T> {
    // Each variable has its own stack of bindings, innermost last.
    table: BTreeMap<Var, Vec<T>>,
    containing: Option<&'a Scope<'a, T>>,
}

impl<T> Default for Scope<'_, T> {
    fn default() -> Self {
        Self {
            table: BTreeMap::new(),
            containing: None,
        }
    }
}

impl<'a, T> Scope<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty scope whose lookups fall back on `containing`.
    pub fn with_containing(containing: &'a Scope<'a, T>) -> Self {
        Self {
            table: BTreeMap::new(),
            containing: Some(containing),
        }
    }

    pub fn containing(&self) -> Option<&'a Scope<'a, T>> {
        self.containing
    }

    pub fn push(&mut self, var: Var, value: T) {
        self.table.entry(var).or_default().push(value);
    }

    /// Remove the innermost binding of `var` in this scope and return it.
    pub fn pop(&mut self, var: &Var) -> T {
        let Some(stack) = self.table.get_mut(var) else {
            panic!("Bug: pop of `{}` which is not bound in this scope", var.name())
        };
        let Some(value) = stack.pop() else {
            panic!("Bug: pop of `{}` which is not bound in this scope", var.name())
        };
        if stack.is_empty() {
            self.table.remove(var);
        }
        value
    }

    pub fn get(&self, var: &Var) -> Option<&T> {
        match self.table.get(var).and_then(|stack| stack.last()) {
            Some(value) => Some(value),
            None => self.containing.and_then(|outer| outer.get(var)),
        }
    }

    /// Innermost binding of `var` in this scope only.
    pub fn get_mut(&mut self, var: &Var) -> Option<&mut T> {
        self.table.get_mut(var).and_then(|stack| stack.last_mut())
    }

    pub fn contains(&self, var: &Var) -> bool {
        self.get(var).is_some()
    }

    /// Whether this scope itself has no bindings. The containing scope is not consulted.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The innermost binding of each variable bound in this scope.
    pub fn iter(&self) -> impl Iterator<Item = (&Var, &T)> {
        self.table
            .iter()
            .filter_map(|(var, stack)| stack.last().map(|value| (var, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadowing() {
        let x = Var::new("x");
        let mut scope = Scope::new();
        scope.push(x.clone(), 1);
        scope.push(x.clone(), 2);
        assert_eq!(scope.get(&x), Some(&2));
        assert_eq!(scope.pop(&x), 2);
        assert_eq!(scope.get(&x), Some(&1));
        scope.pop(&x);
        assert!(!scope.contains(&x));
        assert!(scope.is_empty());
    }

    #[test]
    fn test_containing_scope() {
        let x = Var::new("x");
        let y = Var::new("y");
        let mut outer = Scope::new();
        outer.push(x.clone(), "outer");
        let mut inner = Scope::with_containing(&outer);
        assert_eq!(inner.get(&x), Some(&"outer"));
        assert!(inner.get_mut(&x).is_none());
        inner.push(x.clone(), "inner");
        inner.push(y.clone(), "y");
        assert_eq!(inner.get(&x), Some(&"inner"));
        assert_eq!(inner.iter().count(), 2);
        inner.pop(&x);
        assert_eq!(inner.get(&x), Some(&"outer"));
    }

    #[test]
    fn test_same_name_distinct_vars() {
        let a = Var::new("t");
        let b = Var::new("t");
        let mut scope = Scope::new();
        scope.push(a.clone(), 1);
        assert!(!scope.contains(&b));
    }

    #[test]
    #[should_panic(expected = "not bound")]
    fn test_pop_unbound_panics() {
        let mut scope: Scope<i32> = Scope::new();
        scope.pop(&Var::new("x"));
    }
}
