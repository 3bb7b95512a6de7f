// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Replacement of variables or of whole subexpressions.
//!
//! The `substitute*` functions are tree mutators. The `graph_substitute*`
//! functions memoise results and so run in time linear in the number of
//! distinct nodes, which matters on heavily shared inputs.
//!
//! A `Let`, `LetStmt` or `For` that rebinds a variable being replaced hides
//! it in its body: the body keeps referring to the inner binding.

use crate::{
    ir::{Expr, ExprKind, Stmt, StmtKind, Var},
    mutator::{walk_expr, walk_stmt, IrMutator, MutatorCache},
};
use log::trace;
use std::collections::BTreeMap;

struct VarSubstituter<'a> {
    replacements: &'a BTreeMap<Var, Expr>,
    // Variables hidden by an enclosing rebinding.
    hidden: Vec<Var>,
    cache: Option<MutatorCache>,
}

impl<'a> VarSubstituter<'a> {
    fn new(replacements: &'a BTreeMap<Var, Expr>, graph: bool) -> Self {
        Self {
            replacements,
            hidden: vec![],
            cache: graph.then(MutatorCache::new),
        }
    }

    fn lookup(&self, var: &Var) -> Option<&Expr> {
        if self.hidden.contains(var) {
            None
        } else {
            self.replacements.get(var)
        }
    }

    /// Runs `f` with `var` hidden if it is being replaced. Memoised results do not
    /// carry over between regions with different hidden sets.
    fn hiding<R>(&mut self, var: &Var, f: impl FnOnce(&mut Self) -> R) -> R {
        if self.lookup(var).is_none() {
            return f(self);
        }
        self.hidden.push(var.clone());
        let outer_cache = self.cache.as_mut().map(std::mem::take);
        let result = f(self);
        if let Some(outer_cache) = outer_cache {
            self.cache = Some(outer_cache);
        }
        self.hidden.pop();
        result
    }
}

impl IrMutator for VarSubstituter<'_> {
    fn cache(&mut self) -> Option<&mut MutatorCache> {
        self.cache.as_mut()
    }

    fn visit_expr(&mut self, e: &Expr) -> Expr {
        match e.kind() {
            ExprKind::Variable(var) => match self.lookup(var) {
                Some(replacement) => replacement.clone(),
                None => e.clone(),
            },
            ExprKind::Let { var, value, body } => {
                let new_value = self.mutate_expr(value);
                let new_body = self.hiding(var, |this| this.mutate_expr(body));
                if new_value.same_as(value) && new_body.same_as(body) {
                    e.clone()
                } else {
                    Expr::make_let(var.clone(), new_value, new_body)
                }
            },
            _ => walk_expr(self, e),
        }
    }

    fn visit_stmt(&mut self, s: &Stmt) -> Stmt {
        match s.kind() {
            StmtKind::LetStmt { var, value, body } => {
                let new_value = self.mutate_expr(value);
                let new_body = self.hiding(var, |this| this.mutate_stmt(body));
                if new_value.same_as(value) && new_body.same_as(body) {
                    s.clone()
                } else {
                    Stmt::make_let_stmt(var.clone(), new_value, new_body)
                }
            },
            StmtKind::For {
                var,
                min,
                extent,
                for_type,
                body,
            } => {
                let new_min = self.mutate_expr(min);
                let new_extent = self.mutate_expr(extent);
                let new_body = self.hiding(var, |this| this.mutate_stmt(body));
                if new_min.same_as(min) && new_extent.same_as(extent) && new_body.same_as(body) {
                    s.clone()
                } else {
                    Stmt::make_for(var.clone(), new_min, new_extent, *for_type, new_body)
                }
            },
            _ => walk_stmt(self, s),
        }
    }
}

fn single(var: &Var, replacement: &Expr) -> BTreeMap<Var, Expr> {
    BTreeMap::from([(var.clone(), replacement.clone())])
}

/// Replace free references to `var` in `e` with `replacement`.
pub fn substitute(var: &Var, replacement: &Expr, e: &Expr) -> Expr {
    substitute_map(&single(var, replacement), e)
}

/// Replace free references to each variable in `replacements`.
pub fn substitute_map(replacements: &BTreeMap<Var, Expr>, e: &Expr) -> Expr {
    if replacements.is_empty() {
        return e.clone();
    }
    VarSubstituter::new(replacements, false).mutate_expr(e)
}

pub fn substitute_stmt(var: &Var, replacement: &Expr, s: &Stmt) -> Stmt {
    substitute_map_stmt(&single(var, replacement), s)
}

pub fn substitute_map_stmt(replacements: &BTreeMap<Var, Expr>, s: &Stmt) -> Stmt {
    if replacements.is_empty() {
        return s.clone();
    }
    VarSubstituter::new(replacements, false).mutate_stmt(s)
}

/// Memoising form of `substitute`.
pub fn graph_substitute(var: &Var, replacement: &Expr, e: &Expr) -> Expr {
    let replacements = single(var, replacement);
    VarSubstituter::new(&replacements, true).mutate_expr(e)
}

pub fn graph_substitute_map(replacements: &BTreeMap<Var, Expr>, e: &Expr) -> Expr {
    VarSubstituter::new(replacements, true).mutate_expr(e)
}

struct ExprSubstituter<'a> {
    find: &'a Expr,
    replacement: &'a Expr,
    cache: MutatorCache,
}

impl<'a> ExprSubstituter<'a> {
    fn new(find: &'a Expr, replacement: &'a Expr) -> Self {
        Self {
            find,
            replacement,
            cache: MutatorCache::new(),
        }
    }
}

// A structural match does not depend on the enclosing bindings, so every
// pattern substitution is memoised over shared subgraphs.
impl IrMutator for ExprSubstituter<'_> {
    fn cache(&mut self) -> Option<&mut MutatorCache> {
        Some(&mut self.cache)
    }

    fn visit_expr(&mut self, e: &Expr) -> Expr {
        if e == self.find {
            trace!("replacing `{}` with `{}`", e, self.replacement);
            self.replacement.clone()
        } else {
            walk_expr(self, e)
        }
    }
}

/// Replace every subexpression structurally equal to `find` with `replacement`.
/// Shared subexpressions are rewritten once and stay shared in the result.
pub fn substitute_expr(find: &Expr, replacement: &Expr, e: &Expr) -> Expr {
    ExprSubstituter::new(find, replacement).mutate_expr(e)
}

pub fn substitute_expr_stmt(find: &Expr, replacement: &Expr, s: &Stmt) -> Stmt {
    ExprSubstituter::new(find, replacement).mutate_stmt(s)
}

/// Same as `substitute_expr`, which is already graph-aware.
pub fn graph_substitute_expr(find: &Expr, replacement: &Expr, e: &Expr) -> Expr {
    substitute_expr(find, replacement, e)
}

struct LetInliner {
    cache: MutatorCache,
}

impl IrMutator for LetInliner {
    fn cache(&mut self) -> Option<&mut MutatorCache> {
        Some(&mut self.cache)
    }

    fn visit_expr(&mut self, e: &Expr) -> Expr {
        match e.as_let() {
            Some((var, value, body)) => {
                let value = self.mutate_expr(value);
                let body = self.mutate_expr(body);
                graph_substitute(var, &value, &body)
            },
            None => walk_expr(self, e),
        }
    }
}

/// Inline every `Let` binding. The result is meant for structural comparison
/// only: on a deep chain of lets its tree form may be exponentially large.
pub fn substitute_in_all_lets(e: &Expr) -> Expr {
    LetInliner {
        cache: MutatorCache::new(),
    }
    .mutate_expr(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ir::ForType, ir_operator::*, types::Type};

    fn int(v: i64) -> Expr {
        make_const(Type::int(32), v)
    }

    #[test]
    fn test_substitute_var() {
        let x = Var::new("x");
        let y = Var::new("y");
        let (xe, ye) = (x.to_expr(Type::int(32)), y.to_expr(Type::int(32)));
        let e = &xe * 2 + &ye;
        assert_eq!(substitute(&x, &int(3), &e), int(3) * 2 + &ye);

        let map = BTreeMap::from([(x.clone(), ye.clone()), (y.clone(), xe.clone())]);
        assert_eq!(substitute_map(&map, &e), &ye * 2 + &xe);
        // Untouched input comes back as is.
        let z = Var::new("z");
        assert!(substitute(&z, &int(1), &e).same_as(&e));
    }

    #[test]
    fn test_rebinding_is_not_substituted() {
        let x = Var::new("x");
        let xe = x.to_expr(Type::int(32));
        let e = Expr::make_let(x.clone(), &xe + 1, &xe * 2);
        let expected = Expr::make_let(x.clone(), int(5) + 1, &xe * 2);
        assert_eq!(substitute(&x, &int(5), &e), expected);
        assert_eq!(graph_substitute(&x, &int(5), &e), expected);

        let s = Stmt::make_for(
            x.clone(),
            xe.clone(),
            int(4),
            ForType::Serial,
            Stmt::make_evaluate(xe.clone()),
        );
        let expected = Stmt::make_for(x.clone(), int(7), int(4), ForType::Serial, Stmt::make_evaluate(xe));
        assert_eq!(substitute_stmt(&x, &int(7), &s), expected);
    }

    #[test]
    fn test_substitute_subexpression() {
        let x = Expr::variable(Type::int(32), "x");
        let y = Expr::variable(Type::int(32), "y");
        let find = &x + &y;
        let e = min(&x + &y, 3) * (&x + &y);
        let r = substitute_expr(&find, &x, &e);
        assert_eq!(r, min(&x, 3) * &x);
        assert_eq!(graph_substitute_expr(&find, &x, &e), r);
    }

    #[test]
    fn test_graph_substitute_on_shared_graph() {
        let x = Var::new("x");
        let xe = x.to_expr(Type::int(32));
        let mut e = &xe + 1;
        for _ in 0..16 {
            e = &e * &e;
        }
        // Linear in distinct nodes; the tree form has 2^16 leaves.
        let r = graph_substitute(&x, &int(2), &e);
        let mut expected = int(2) + 1;
        for _ in 0..16 {
            expected = &expected * &expected;
        }
        assert_eq!(r, expected);
    }

    #[test]
    fn test_pattern_substitution_keeps_sharing() {
        let x = Expr::variable(Type::int(32), "x");
        let y = Expr::variable(Type::int(32), "y");
        let find = &x + 1;
        let mut e = &find * &y;
        for _ in 0..48 {
            e = &e * &e;
        }
        // Only terminates if shared operands are rewritten once.
        let r = substitute_expr(&find, &y, &e);
        let (a, b) = r.as_mul().unwrap();
        assert!(a.same_as(b));
        let mut leaf = &r;
        while let Some((a, _)) = leaf.as_mul().filter(|(a, _)| a.as_mul().is_some()) {
            leaf = a;
        }
        assert_eq!(leaf, &(&y * &y));

        let rs = substitute_expr_stmt(&find, &y, &Stmt::make_evaluate(e));
        let (a, b) = rs.as_evaluate().and_then(|v| v.as_mul()).unwrap();
        assert!(a.same_as(b));
    }

    #[test]
    fn test_substitute_in_all_lets() {
        let x = Var::new("x");
        let y = Var::new("y");
        let z = Expr::variable(Type::int(32), "z");
        let (xe, ye) = (x.to_expr(Type::int(32)), y.to_expr(Type::int(32)));
        let e = Expr::make_let(
            x.clone(),
            &z + 1,
            Expr::make_let(y.clone(), &xe * 2, &ye + &xe),
        );
        let inlined = substitute_in_all_lets(&e);
        assert_eq!(inlined, (&z + 1) * 2 + (&z + 1));
    }
}
