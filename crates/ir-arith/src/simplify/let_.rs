// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Let peeling and elision, shared by `Let` and `LetStmt`.
//!
//! On entry the bound value is stripped of invertible layers (a constant
//! offset or factor, a constant bound, a widening cast, a broadcast or ramp,
//! a slice or a concat with a variable). Each stripped layer is re-applied
//! to a fresh inner variable and the result becomes the replacement for the
//! original variable in the body. Once the body is simplified, the inner let
//! is kept only if the replacement was used and the original let only if the
//! variable survived un-replaced.

use super::{no_overflow_scalar_int, Simplifier, VarInfo};
use crate::modulus_remainder::ModulusRemainder;
use ir_core::{
    ir::shuffle_is_slice,
    ir_operator::is_const,
    mutator::{walk_expr, walk_stmt, IrMutator},
    substitute::substitute,
    Expr, Stmt, Var,
};
use log::trace;

/// The body of a let: an expression or a statement.
pub(super) trait LetBody: Clone {
    fn simplify(&self, s: &mut Simplifier) -> Self;

    fn make_let(var: Var, value: Expr, body: Self) -> Self;

    fn as_let(&self) -> Option<(&Var, &Expr, &Self)>;

    fn same_as(&self, other: &Self) -> bool;
}

impl LetBody for Expr {
    fn simplify(&self, s: &mut Simplifier) -> Self {
        s.mutate_expr(self)
    }

    fn make_let(var: Var, value: Expr, body: Self) -> Self {
        Expr::make_let(var, value, body)
    }

    fn as_let(&self) -> Option<(&Var, &Expr, &Self)> {
        Expr::as_let(self)
    }

    fn same_as(&self, other: &Self) -> bool {
        Expr::same_as(self, other)
    }
}

impl LetBody for Stmt {
    fn simplify(&self, s: &mut Simplifier) -> Self {
        s.mutate_stmt(self)
    }

    fn make_let(var: Var, value: Expr, body: Self) -> Self {
        Stmt::make_let_stmt(var, value, body)
    }

    fn as_let(&self) -> Option<(&Var, &Expr, &Self)> {
        self.as_let_stmt()
    }

    fn same_as(&self, other: &Self) -> bool {
        Stmt::same_as(self, other)
    }
}

pub(super) fn visit_let(s: &mut Simplifier, e: &Expr, var: &Var, value: &Expr, body: &Expr) -> Expr {
    if s.simplify_lets {
        simplify_let(s, e, var, value, body)
    } else {
        walk_expr(s, e)
    }
}

pub(super) fn visit_let_stmt(s: &mut Simplifier, st: &Stmt, var: &Var, value: &Expr, body: &Stmt) -> Stmt {
    if s.simplify_lets {
        simplify_let(s, st, var, value, body)
    } else {
        walk_stmt(s, st)
    }
}

/// One invertible layer of a let value.
struct Layer {
    /// What remains bound once the layer is removed.
    inner: Expr,
    /// The layer applied to `var`.
    outer: Expr,
    /// The variable standing for `inner`.
    var: Var,
}

fn peel_layer(value: &Expr, var: &Var, name: &str) -> Option<Layer> {
    let same = |inner: &Expr, make: fn(Expr, Expr) -> Expr, b: &Expr| Layer {
        inner: inner.clone(),
        outer: make(var.to_expr(inner.ty()), b.clone()),
        var: var.clone(),
    };
    let const_or_var = |b: &Expr| is_const(b) || b.as_variable().is_some();

    if let Some((a, b)) = value.as_add().filter(|&(_, b)| const_or_var(b)) {
        return Some(same(a, Expr::make_add, b));
    }
    if let Some((a, b)) = value.as_mul().filter(|&(_, b)| const_or_var(b)) {
        return Some(same(a, Expr::make_mul, b));
    }
    if let Some((a, b)) = value.as_div().filter(|&(_, b)| is_const(b)) {
        return Some(same(a, Expr::make_div, b));
    }
    if let Some((a, b)) = value.as_sub().filter(|&(_, b)| const_or_var(b)) {
        return Some(same(a, Expr::make_sub, b));
    }
    if let Some((a, b)) = value.as_mod().filter(|&(_, b)| is_const(b)) {
        return Some(same(a, Expr::make_mod, b));
    }
    if let Some((a, b)) = value.as_min().filter(|&(_, b)| is_const(b)) {
        return Some(same(a, Expr::make_min, b));
    }
    if let Some((a, b)) = value.as_max().filter(|&(_, b)| is_const(b)) {
        return Some(same(a, Expr::make_max, b));
    }

    // The remaining layers change the type of the bound value.
    let fresh = Var::new(name);
    let changed = |inner: Expr, outer: Expr| Layer {
        inner,
        outer,
        var: fresh.clone(),
    };
    if let Some((base, stride, lanes)) = value.as_ramp().filter(|&(_, stride, _)| is_const(stride)) {
        let outer = Expr::make_ramp(fresh.to_expr(base.ty()), stride.clone(), lanes);
        return Some(changed(base.clone(), outer));
    }
    if let Some((v, lanes)) = value.as_broadcast() {
        let outer = Expr::make_broadcast(fresh.to_expr(v.ty()), lanes);
        return Some(changed(v.clone(), outer));
    }
    if let Some(v) = value.as_cast() {
        // Widening casts move out of the binding so the temporary stays narrow.
        if value.ty().bits() > v.ty().bits() {
            let outer = Expr::make_cast(value.ty(), fresh.to_expr(v.ty()));
            return Some(changed(v.clone(), outer));
        }
        return None;
    }
    let (vectors, indices) = value.as_shuffle()?;
    if shuffle_is_slice(vectors, indices) {
        let inner = Expr::make_concat(vectors.to_vec());
        let outer = Expr::make_shuffle(vec![fresh.to_expr(inner.ty())], indices.to_vec());
        return Some(changed(inner, outer));
    }
    if let [a, b] = vectors {
        let is_concat = indices.len() == usize::from(value.ty().lanes())
            && indices.iter().enumerate().all(|(i, &j)| j == i as i32);
        match (a.as_variable().is_some(), b.as_variable().is_some()) {
            (true, false) if is_concat => {
                let outer = Expr::make_concat(vec![a.clone(), fresh.to_expr(b.ty())]);
                return Some(changed(b.clone(), outer));
            },
            (false, true) if is_concat => {
                let outer = Expr::make_concat(vec![fresh.to_expr(a.ty()), b.clone()]);
                return Some(changed(a.clone(), outer));
            },
            _ => {},
        }
    }
    None
}

/// Alignment and bounds worth recording for a value bound to a variable.
fn facts_of(s: &Simplifier, value: &Expr) -> (Option<ModulusRemainder>, Option<(i64, i64)>) {
    if !no_overflow_scalar_int(value.ty()) {
        return (None, None);
    }
    let alignment = s.modulus_remainder(value);
    (
        (alignment.modulus > 1).then_some(alignment),
        s.const_int_bounds(value),
    )
}

pub(super) fn simplify_let<B: LetBody>(
    s: &mut Simplifier,
    node: &B,
    var: &Var,
    value: &Expr,
    body: &B,
) -> B {
    let new_value = s.mutate(value);

    let name = format!("{}.s", var.name());
    let mut inner_var = Var::new(name.as_str());
    let mut replacement = inner_var.to_expr(new_value.ty());
    let mut inner_value = Some(new_value.clone());
    while let Some(current) = inner_value.as_ref() {
        // Markers flow into the body so its operators absorb them.
        if is_const(current)
            || current.as_variable().is_some()
            || current.is_poison()
            || current.is_indeterminate()
        {
            replacement = substitute(&inner_var, current, &replacement);
            inner_value = None;
            break;
        }
        let Some(layer) = peel_layer(current, &inner_var, &name) else {
            break;
        };
        replacement = substitute(&inner_var, &layer.outer, &replacement);
        inner_var = layer.var;
        inner_value = Some(layer.inner);
    }

    let (inner_value, replacement) = match inner_value {
        Some(inner) if inner.same_as(&new_value) => (None, None),
        inner => {
            trace!("new let {} = {:?} in ... {} ...", inner_var, inner, replacement);
            (inner, Some(replacement))
        },
    };

    s.var_info.push(var.clone(), VarInfo {
        replacement,
        old_uses: 0,
        new_uses: 0,
    });
    let (inner_alignment, inner_bounds) = match &inner_value {
        Some(inner) => facts_of(s, inner),
        None => (None, None),
    };
    let (alignment, bounds) = facts_of(s, &new_value);
    let new_body = s.with_alignment(var, alignment, |s| {
        s.with_bounds(var, bounds, |s| {
            s.with_alignment(&inner_var, inner_alignment, |s| {
                s.with_bounds(&inner_var, inner_bounds, |s| body.simplify(s))
            })
        })
    });
    let info = s.var_info.pop(var);

    let mut result = new_body;
    if let Some(inner) = inner_value {
        if info.new_uses > 0 {
            result = B::make_let(inner_var, inner, result);
        }
    }
    if info.old_uses > 0 {
        result = B::make_let(var.clone(), new_value, result);
    }

    let unchanged = result.as_let().is_some_and(|(v, new_val, new_body)| {
        v == var && new_val.same_as(value) && new_body.same_as(body)
    });
    if unchanged {
        node.clone()
    } else {
        result
    }
}
