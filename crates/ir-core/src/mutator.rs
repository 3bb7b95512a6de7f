// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Rewriting traversal over expressions and statements.
//!
//! An `IrMutator` overrides `visit_expr` / `visit_stmt` for the node kinds it
//! cares about and falls back on `walk_expr` / `walk_stmt` for the rest. The
//! walks rebuild a node only when some child changed; otherwise they return
//! the input handle itself, so `result.same_as(&input)` tells a caller that
//! nothing happened.
//!
//! Mutators whose result depends only on the node (not on traversal context)
//! can return a `MutatorCache` from `cache()`. Expressions are then memoised by
//! structural value and statements by node identity, so shared subgraphs are
//! rewritten once.

use crate::ir::{Expr, ExprKind, Stmt, StmtKind};
use std::collections::HashMap;

#[derive(Default)]
pub struct MutatorCache {
    exprs: HashMap<Expr, Expr>,
    // Keyed by node address; the original node is kept alive next to its result.
    stmts: HashMap<usize, (Stmt, Stmt)>,
}

impl MutatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.exprs.clear();
        self.stmts.clear();
    }

    pub fn len(&self) -> usize {
        self.exprs.len() + self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait IrMutator {
    /// Memo table for graph-aware mutation. Tree mutators return `None`.
    fn cache(&mut self) -> Option<&mut MutatorCache> {
        None
    }

    fn mutate_expr(&mut self, e: &Expr) -> Expr {
        if let Some(hit) = self.cache().and_then(|cache| cache.exprs.get(e).cloned()) {
            return hit;
        }
        let result = self.visit_expr(e);
        if let Some(cache) = self.cache() {
            cache.exprs.insert(e.clone(), result.clone());
        }
        result
    }

    fn mutate_stmt(&mut self, s: &Stmt) -> Stmt {
        if let Some(hit) = self
            .cache()
            .and_then(|cache| cache.stmts.get(&s.identity()).map(|(_, r)| r.clone()))
        {
            return hit;
        }
        let result = self.visit_stmt(s);
        if let Some(cache) = self.cache() {
            cache
                .stmts
                .insert(s.identity(), (s.clone(), result.clone()));
        }
        result
    }

    fn visit_expr(&mut self, e: &Expr) -> Expr {
        walk_expr(self, e)
    }

    fn visit_stmt(&mut self, s: &Stmt) -> Stmt {
        walk_stmt(self, s)
    }
}

/// Mutate each expression, reporting whether any of them changed.
pub fn mutate_exprs<M: IrMutator + ?Sized>(m: &mut M, exprs: &[Expr]) -> (Vec<Expr>, bool) {
    let mut changed = false;
    let new_exprs = exprs
        .iter()
        .map(|e| {
            let new_e = m.mutate_expr(e);
            changed |= !new_e.same_as(e);
            new_e
        })
        .collect();
    (new_exprs, changed)
}

macro_rules! walk_binary {
    ($m:expr, $e:expr, $a:expr, $b:expr, $make:ident) => {{
        let a = $m.mutate_expr($a);
        let b = $m.mutate_expr($b);
        if a.same_as($a) && b.same_as($b) {
            $e.clone()
        } else {
            Expr::$make(a, b)
        }
    }};
}

/// Rebuild `e` from mutated children, reusing `e` when none changed.
pub fn walk_expr<M: IrMutator + ?Sized>(m: &mut M, e: &Expr) -> Expr {
    use ExprKind::*;
    match e.kind() {
        IntImm(_) | UIntImm(_) | FloatImm(_) | StringImm(_) | Variable(_) | Poison(_)
        | Indeterminate(_) => e.clone(),
        Cast(v) => {
            let new_v = m.mutate_expr(v);
            if new_v.same_as(v) {
                e.clone()
            } else {
                Expr::make_cast(e.ty(), new_v)
            }
        },
        Add(a, b) => walk_binary!(m, e, a, b, make_add),
        Sub(a, b) => walk_binary!(m, e, a, b, make_sub),
        Mul(a, b) => walk_binary!(m, e, a, b, make_mul),
        Div(a, b) => walk_binary!(m, e, a, b, make_div),
        Mod(a, b) => walk_binary!(m, e, a, b, make_mod),
        Min(a, b) => walk_binary!(m, e, a, b, make_min),
        Max(a, b) => walk_binary!(m, e, a, b, make_max),
        Eq(a, b) => walk_binary!(m, e, a, b, make_eq),
        Ne(a, b) => walk_binary!(m, e, a, b, make_ne),
        Lt(a, b) => walk_binary!(m, e, a, b, make_lt),
        Le(a, b) => walk_binary!(m, e, a, b, make_le),
        Gt(a, b) => walk_binary!(m, e, a, b, make_gt),
        Ge(a, b) => walk_binary!(m, e, a, b, make_ge),
        And(a, b) => walk_binary!(m, e, a, b, make_and),
        Or(a, b) => walk_binary!(m, e, a, b, make_or),
        Not(a) => {
            let new_a = m.mutate_expr(a);
            if new_a.same_as(a) {
                e.clone()
            } else {
                Expr::make_not(new_a)
            }
        },
        Select(c, t, f) => {
            let (new_c, new_t, new_f) = (m.mutate_expr(c), m.mutate_expr(t), m.mutate_expr(f));
            if new_c.same_as(c) && new_t.same_as(t) && new_f.same_as(f) {
                e.clone()
            } else {
                Expr::make_select(new_c, new_t, new_f)
            }
        },
        Load {
            buffer,
            index,
            predicate,
        } => {
            let new_index = m.mutate_expr(index);
            let new_predicate = m.mutate_expr(predicate);
            if new_index.same_as(index) && new_predicate.same_as(predicate) {
                e.clone()
            } else {
                Expr::make_load(e.ty(), buffer.clone(), new_index, new_predicate)
            }
        },
        Ramp {
            base,
            stride,
            lanes,
        } => {
            let (new_base, new_stride) = (m.mutate_expr(base), m.mutate_expr(stride));
            if new_base.same_as(base) && new_stride.same_as(stride) {
                e.clone()
            } else {
                Expr::make_ramp(new_base, new_stride, *lanes)
            }
        },
        Broadcast { value, lanes } => {
            let new_value = m.mutate_expr(value);
            if new_value.same_as(value) {
                e.clone()
            } else {
                Expr::make_broadcast(new_value, *lanes)
            }
        },
        Let { var, value, body } => {
            let (new_value, new_body) = (m.mutate_expr(value), m.mutate_expr(body));
            if new_value.same_as(value) && new_body.same_as(body) {
                e.clone()
            } else {
                Expr::make_let(var.clone(), new_value, new_body)
            }
        },
        Shuffle { vectors, indices } => {
            let (new_vectors, changed) = mutate_exprs(m, vectors);
            if changed {
                Expr::make_shuffle(new_vectors, indices.clone())
            } else {
                e.clone()
            }
        },
        Call {
            name,
            args,
            call_type,
        } => {
            let (new_args, changed) = mutate_exprs(m, args);
            if changed {
                Expr::make_call(e.ty(), name.clone(), new_args, *call_type)
            } else {
                e.clone()
            }
        },
    }
}

/// Rebuild `s` from mutated children, reusing `s` when none changed.
pub fn walk_stmt<M: IrMutator + ?Sized>(m: &mut M, s: &Stmt) -> Stmt {
    match s.kind() {
        StmtKind::LetStmt { var, value, body } => {
            let (new_value, new_body) = (m.mutate_expr(value), m.mutate_stmt(body));
            if new_value.same_as(value) && new_body.same_as(body) {
                s.clone()
            } else {
                Stmt::make_let_stmt(var.clone(), new_value, new_body)
            }
        },
        StmtKind::AssertStmt {
            condition,
            message,
            body,
        } => {
            let new_condition = m.mutate_expr(condition);
            let new_message = m.mutate_expr(message);
            let new_body = m.mutate_stmt(body);
            if new_condition.same_as(condition) && new_message.same_as(message) && new_body.same_as(body) {
                s.clone()
            } else {
                Stmt::make_assert(new_condition, new_message, new_body)
            }
        },
        StmtKind::For {
            var,
            min,
            extent,
            for_type,
            body,
        } => {
            let (new_min, new_extent) = (m.mutate_expr(min), m.mutate_expr(extent));
            let new_body = m.mutate_stmt(body);
            if new_min.same_as(min) && new_extent.same_as(extent) && new_body.same_as(body) {
                s.clone()
            } else {
                Stmt::make_for(var.clone(), new_min, new_extent, *for_type, new_body)
            }
        },
        StmtKind::Store {
            buffer,
            value,
            index,
            predicate,
        } => {
            let new_value = m.mutate_expr(value);
            let new_index = m.mutate_expr(index);
            let new_predicate = m.mutate_expr(predicate);
            if new_value.same_as(value) && new_index.same_as(index) && new_predicate.same_as(predicate) {
                s.clone()
            } else {
                Stmt::make_store(buffer.clone(), new_value, new_index, new_predicate)
            }
        },
        StmtKind::Allocate {
            buffer,
            ty,
            extents,
            condition,
            body,
        } => {
            let (new_extents, extents_changed) = mutate_exprs(m, extents);
            let new_condition = m.mutate_expr(condition);
            let new_body = m.mutate_stmt(body);
            if !extents_changed && new_condition.same_as(condition) && new_body.same_as(body) {
                s.clone()
            } else {
                Stmt::make_allocate(buffer.clone(), *ty, new_extents, new_condition, new_body)
            }
        },
        StmtKind::ProducerConsumer {
            name,
            is_producer,
            body,
        } => {
            let new_body = m.mutate_stmt(body);
            if new_body.same_as(body) {
                s.clone()
            } else {
                Stmt::make_producer_consumer(name.clone(), *is_producer, new_body)
            }
        },
        StmtKind::IfThenElse {
            condition,
            then_case,
            else_case,
        } => {
            let new_condition = m.mutate_expr(condition);
            let new_then = m.mutate_stmt(then_case);
            let new_else = else_case.as_ref().map(|e| m.mutate_stmt(e));
            let else_same = match (else_case, &new_else) {
                (Some(old), Some(new)) => old.same_as(new),
                _ => true,
            };
            if new_condition.same_as(condition) && new_then.same_as(then_case) && else_same {
                s.clone()
            } else {
                Stmt::make_if(new_condition, new_then, new_else)
            }
        },
        StmtKind::Evaluate(value) => {
            let new_value = m.mutate_expr(value);
            if new_value.same_as(value) {
                s.clone()
            } else {
                Stmt::make_evaluate(new_value)
            }
        },
        StmtKind::Block { first, rest } => {
            let (new_first, new_rest) = (m.mutate_stmt(first), m.mutate_stmt(rest));
            if new_first.same_as(first) && new_rest.same_as(rest) {
                s.clone()
            } else {
                Stmt::make_block(new_first, new_rest)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ir_operator::*, types::Type};

    /// Replaces every integer constant 1 with 2.
    struct OneToTwo {
        visits: usize,
        cache: Option<MutatorCache>,
    }

    impl IrMutator for OneToTwo {
        fn cache(&mut self) -> Option<&mut MutatorCache> {
            self.cache.as_mut()
        }

        fn visit_expr(&mut self, e: &Expr) -> Expr {
            self.visits += 1;
            match e.kind() {
                ExprKind::IntImm(1) => make_const(e.ty(), 2),
                _ => walk_expr(self, e),
            }
        }
    }

    #[test]
    fn test_unchanged_returns_same_node() {
        let x = Expr::variable(Type::int(32), "x");
        let e = min(&x + 3, &x * 4);
        let mut m = OneToTwo {
            visits: 0,
            cache: None,
        };
        assert!(m.mutate_expr(&e).same_as(&e));

        let s = Stmt::make_evaluate(e.clone());
        assert!(m.mutate_stmt(&s).same_as(&s));
    }

    #[test]
    fn test_changed_rebuilds_path() {
        let x = Expr::variable(Type::int(32), "x");
        let e = (&x + 1) * 3;
        let mut m = OneToTwo {
            visits: 0,
            cache: None,
        };
        let r = m.mutate_expr(&e);
        assert_eq!(r, (&x + 2) * 3);
        // The untouched sibling is shared with the input.
        assert!(r.as_mul().unwrap().1.same_as(e.as_mul().unwrap().1));
    }

    #[test]
    fn test_graph_mutation_visits_shared_nodes_once() {
        let x = Expr::variable(Type::int(32), "x");
        let mut e = &x + 1;
        for _ in 0..20 {
            e = &e + &e;
        }
        let mut m = OneToTwo {
            visits: 0,
            cache: Some(MutatorCache::new()),
        };
        let r = m.mutate_expr(&e);
        // One visit per distinct node: 20 sums, `x + 1`, `x` and `1`.
        assert_eq!(m.visits, 23);
        assert!(!r.same_as(&e));
    }
}
