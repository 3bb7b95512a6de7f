// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Rules for `Add` and `Sub`.

use super::{
    const_float, const_int, const_uint, fold_int, is_simple_const, no_overflow, propagate_markers,
    vector::hoist_slice_vector, Binary, Rule, Simplifier,
};
use ir_core::{
    ir_operator::{
        is_const, is_negative_negatable_const, is_positive_const, is_zero, make_const, make_one,
        make_zero,
    },
    ir::shuffle_is_slice,
    Expr,
};

fn is_slice(e: &Expr) -> bool {
    matches!(e.as_shuffle(), Some((vectors, indices)) if shuffle_is_slice(vectors, indices))
}

// ----------------------------------------------------------------------------------
// Add

pub(super) fn visit_add(s: &mut Simplifier, e: &Expr, a: &Expr, b: &Expr) -> Expr {
    let mut a = s.mutate(a);
    let mut b = s.mutate(b);
    if let Some(marker) = propagate_markers(e.ty(), &[&a, &b]) {
        return marker;
    }
    // Canonical order: constants, mins and maxes go right, and a min goes
    // right of a max.
    if (is_simple_const(&a) && !is_simple_const(&b))
        || (b.as_min().is_some() && a.as_min().is_none())
        || (b.as_max().is_some() && a.as_max().is_none())
    {
        std::mem::swap(&mut a, &mut b);
    }
    if b.as_min().is_some() && a.as_max().is_some() {
        std::mem::swap(&mut a, &mut b);
    }
    let op = Binary::new(e, a, b);
    s.apply_rules("Add", ADD_RULES, &op)
        .unwrap_or_else(|| op.rebuild(Expr::make_add))
}

const ADD_RULES: &[Rule<Binary>] = &[
    ("fold", add_fold),
    ("identity", add_identity),
    ("hoist_slices", add_hoist_slices),
    ("vectors", add_vectors),
    ("select", add_select),
    ("pull_constant", add_pull_constant),
    ("cancel_sub", add_cancel_sub),
    ("negative_factor", add_negative_factor),
    ("factor", add_factor),
    ("min_max_cancel", add_min_max_cancel),
    ("min_plus_max", add_min_plus_max),
    ("rounded_div", add_rounded_div),
    ("common_factor", add_common_factor),
    ("mod_mul", add_mod_mul),
    ("scaled_terms", add_scaled_terms),
];

fn add_fold(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ty = op.a.ty();
    if let (Some(ia), Some(ib)) = (const_int(&op.a), const_int(&op.b)) {
        return Some(fold_int(ty, ia as i128 + ib as i128));
    }
    if let (Some(ua), Some(ub)) = (const_uint(&op.a), const_uint(&op.b)) {
        return Some(Expr::make_uint(ty, ua.wrapping_add(ub)));
    }
    let (fa, fb) = (const_float(&op.a)?, const_float(&op.b)?);
    Some(Expr::make_float(ty, fa + fb))
}

fn add_identity(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    if is_zero(b) {
        Some(a.clone())
    } else if is_zero(a) {
        Some(b.clone())
    } else if a == b {
        // x + x -> x*2
        Some(s.mutate(&(a * make_const(op.ty(), 2))))
    } else {
        None
    }
}

fn add_hoist_slices(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    (is_slice(&op.a) && is_slice(&op.b)).then(|| hoist_slice_vector(op, Expr::make_add))
}

fn add_vectors(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    if let (Some((base_a, stride_a, lanes)), Some((base_b, stride_b, _))) = (a.as_ramp(), b.as_ramp()) {
        return Some(s.mutate(&Expr::make_ramp(base_a + base_b, stride_a + stride_b, lanes)));
    }
    if let (Some((base, stride, lanes)), Some((value, _))) = (a.as_ramp(), b.as_broadcast()) {
        return Some(s.mutate(&Expr::make_ramp(base + value, stride.clone(), lanes)));
    }
    if let (Some((value, _)), Some((base, stride, lanes))) = (a.as_broadcast(), b.as_ramp()) {
        return Some(s.mutate(&Expr::make_ramp(value + base, stride.clone(), lanes)));
    }
    let ((va, lanes), (vb, _)) = (a.as_broadcast()?, b.as_broadcast()?);
    Some(Expr::make_broadcast(s.mutate(&(va + vb)), lanes))
}

fn add_select(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (c, ta, fa) = op.a.as_select()?;
    if let Some((cb, tb, fb)) = op.b.as_select() {
        if c == cb {
            // select(c, a, b) + select(c, d, e) -> select(c, a + d, b + e)
            return Some(s.mutate(&Expr::make_select(c.clone(), ta + tb, fa + fb)));
        }
    }
    if is_simple_const(&op.b) && (is_simple_const(ta) || is_simple_const(fa)) {
        // select(c, c1, c2) + c3 -> select(c, c1 + c3, c2 + c3)
        let b = &op.b;
        return Some(s.mutate(&Expr::make_select(c.clone(), ta + b, fa + b)));
    }
    None
}

fn add_pull_constant(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    if let Some((x, c)) = a.as_add() {
        if is_simple_const(c) {
            return Some(if is_simple_const(b) {
                s.mutate(&(x + (c + b)))
            } else {
                s.mutate(&((x + b) + c))
            });
        }
    }
    if let Some((y, c)) = b.as_add() {
        if is_simple_const(c) {
            return Some(s.mutate(&((a + y) + c)));
        }
    }
    let (c, x) = a.as_sub()?;
    if !is_simple_const(c) {
        return None;
    }
    Some(if is_simple_const(b) {
        s.mutate(&((c + b) - x))
    } else {
        s.mutate(&((b - x) + c))
    })
}

fn add_cancel_sub(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    let sub_a = a.as_sub();
    let sub_b = b.as_sub();
    if let Some((x, y)) = sub_a {
        if y == b {
            // (a - b) + b
            return Some(x.clone());
        }
        if is_zero(x) {
            return Some(s.mutate(&(b - y)));
        }
    }
    if let Some((x, y)) = sub_b {
        if y == a {
            // a + (b - a)
            return Some(x.clone());
        }
        if is_simple_const(x) {
            // a + (7 - b) -> (a - b) + 7
            return Some(s.mutate(&((a - y) + x)));
        }
    }
    let ((aa, ab), (ba, bb)) = (sub_a?, sub_b?);
    if ab == ba {
        // (a - b) + (b - c) -> a - c
        Some(s.mutate(&(aa - bb)))
    } else if aa == bb {
        // (a - b) + (c - a) -> c - b
        Some(s.mutate(&(ba - ab)))
    } else {
        None
    }
}

fn add_negative_factor(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    if let Some((x, k)) = b.as_mul() {
        if is_negative_negatable_const(k) {
            // a + b*-k -> a - b*k
            return Some(s.mutate(&(a - x * -k)));
        }
    }
    let (x, k) = a.as_mul()?;
    if is_negative_negatable_const(k) {
        // a*-k + b -> b - a*k
        return Some(s.mutate(&(b - x * -k)));
    }
    None
}

fn add_factor(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    let ty = op.ty();
    if !no_overflow(ty) {
        return None;
    }
    if let Some((x, y)) = b.as_mul() {
        if !is_const(a) && a == x {
            // a + a*b -> a*(1 + b)
            return Some(s.mutate(&(a * (make_one(ty) + y))));
        }
        if !is_const(a) && a == y {
            // a + b*a -> (1 + b)*a
            return Some(s.mutate(&((make_one(ty) + x) * a)));
        }
    }
    let (x, y) = a.as_mul()?;
    if !is_const(b) && x == b {
        // a*b + a -> a*(b + 1)
        Some(s.mutate(&(x * (y + make_one(ty)))))
    } else if !is_const(b) && y == b {
        // a*b + b -> (a + 1)*b
        Some(s.mutate(&((x + make_one(ty)) * b)))
    } else {
        None
    }
}

fn add_min_max_cancel(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    if !no_overflow(op.ty()) {
        return None;
    }
    let b = &op.b;
    let (is_min, (x, y)) = match (op.a.as_min(), op.a.as_max()) {
        (Some(pair), _) => (true, pair),
        (_, Some(pair)) => (false, pair),
        _ => return None,
    };
    let make = if is_min { Expr::make_min } else { Expr::make_max };
    if let Some((y_a, y_b)) = y.as_sub() {
        if y_b == b {
            // min(a, b - c) + c -> min(a + c, b)
            return Some(s.mutate(&make(Expr::make_add(x.clone(), b.clone()), y_a.clone())));
        }
    }
    if let Some((x_a, x_b)) = x.as_sub() {
        if x_b == b {
            // min(a - c, b) + c -> min(a, b + c)
            return Some(s.mutate(&make(x_a.clone(), Expr::make_add(y.clone(), b.clone()))));
        }
    }
    let cancels = |c: &Expr| match (const_int(c), const_int(b)) {
        (Some(ia), Some(ib)) => ia.checked_add(ib) == Some(0),
        _ => false,
    };
    if let Some((y_a, y_b)) = y.as_add() {
        if cancels(y_b) {
            // min(a, b + (-2)) + 2 -> min(a + 2, b)
            return Some(s.mutate(&make(Expr::make_add(x.clone(), b.clone()), y_a.clone())));
        }
    }
    if let Some((x_a, x_b)) = x.as_add() {
        if cancels(x_b) {
            // min(a + (-2), b) + 2 -> min(a, b + 2)
            return Some(s.mutate(&make(x_a.clone(), Expr::make_add(y.clone(), b.clone()))));
        }
    }
    None
}

fn add_min_plus_max(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (x, y) = op.a.as_min()?;
    let (p, q) = op.b.as_max()?;
    // min(x, y) + max(x, y) -> x + y, in either order.
    if (x == p && y == q) || (x == q && y == p) {
        Some(s.mutate(&(x + y)))
    } else {
        None
    }
}

fn add_rounded_div(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    if !no_overflow(op.ty()) {
        return None;
    }
    let (num, den) = op.a.as_div()?;
    let (x, c) = num.as_add()?;
    let (ia, ib, ic) = (const_int(c)?, const_int(den)?, const_int(&op.b)?);
    if ib == 0 {
        return None;
    }
    // (a + ia)/ib + ic -> (a + (ia + ib*ic))/ib
    let offset = ib.checked_mul(ic)?.checked_add(ia)?;
    Some(s.mutate(&((x + Expr::make_int(op.ty(), offset)) / den)))
}

fn add_common_factor(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (aa, ab) = op.a.as_mul()?;
    let (ba, bb) = op.b.as_mul()?;
    // a*x + b*x -> x*(a + b), for each position of the common factor.
    if aa == ba {
        Some(s.mutate(&(aa * (ab + bb))))
    } else if ab == ba {
        Some(s.mutate(&(ab * (aa + bb))))
    } else if ab == bb {
        Some(s.mutate(&(ab * (aa + ba))))
    } else if aa == bb {
        Some(s.mutate(&(aa * (ab + ba))))
    } else {
        None
    }
}

fn add_mod_mul(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    if let (Some((_, m)), Some((_, k))) = (a.as_mod(), b.as_mul()) {
        if m == k {
            // (x%3) + y*3 -> y*3 + x%3
            return Some(s.mutate(&(b + a)));
        }
    }
    if !no_overflow(op.ty()) {
        return None;
    }
    if let (Some((q, k)), Some((x, m))) = (a.as_mul(), b.as_mod()) {
        if let Some((n, d)) = q.as_div() {
            if k == d && k == m && n == x {
                // (x/3)*3 + x%3 -> x
                return Some(n.clone());
            }
        }
    }
    let (aa, ab) = a.as_add()?;
    let mod_divisor = |e: &Expr| e.as_mod().map(|(_, m)| m.clone());
    let mul_factor = |e: &Expr| e.as_mul().map(|(_, k)| k.clone());
    let differs = |divisor: Option<Expr>, k: &Expr| divisor.is_none_or(|d| d != *k);
    if let (Some(k), Some(m)) = (mul_factor(aa), mod_divisor(b)) {
        if k == m && differs(mod_divisor(ab), &m) {
            // ((x*3) + y) + z%3 -> (x*3 + z%3) + y
            return Some(s.mutate(&((aa + b) + ab)));
        }
    }
    if let (Some(m), Some(k)) = (mod_divisor(aa), mul_factor(b)) {
        if m == k && differs(mod_divisor(ab), &k) {
            // ((x%3) + y) + z*3 -> (z*3 + x%3) + y
            return Some(s.mutate(&((b + aa) + ab)));
        }
    }
    if let (Some(k), Some(m)) = (mul_factor(ab), mod_divisor(b)) {
        if k == m && differs(mod_divisor(aa), &m) {
            // (y + (x*3)) + z%3 -> y + (x*3 + z%3)
            return Some(s.mutate(&(aa + (ab + b))));
        }
    }
    if let (Some(m), Some(k)) = (mod_divisor(ab), mul_factor(b)) {
        if m == k && differs(mod_divisor(aa), &k) {
            // (y + (x%3)) + z*3 -> y + (z*3 + x%3)
            return Some(s.mutate(&(aa + (b + ab))));
        }
    }
    None
}

fn add_scaled_terms(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    if !no_overflow(op.ty()) {
        return None;
    }
    let (x, ka) = op.a.as_mul()?;
    let (y, kb) = op.b.as_mul()?;
    let (ia, ib) = (const_int(ka)?, const_int(kb)?);
    if ia.checked_rem(ib)? != 0 {
        return None;
    }
    // x*4 + y*2 -> (x*2 + y)*2
    let ratio = make_const(op.a.ty(), ia.wrapping_div_euclid(ib));
    Some(s.mutate(&((x * ratio + y) * kb)))
}

// ----------------------------------------------------------------------------------
// Sub

pub(super) fn visit_sub(s: &mut Simplifier, e: &Expr, a: &Expr, b: &Expr) -> Expr {
    let a = s.mutate(a);
    let b = s.mutate(b);
    if let Some(marker) = propagate_markers(e.ty(), &[&a, &b]) {
        return marker;
    }
    let op = Binary::new(e, a, b);
    s.apply_rules("Sub", SUB_RULES, &op)
        .unwrap_or_else(|| op.rebuild(Expr::make_sub))
}

const SUB_RULES: &[Rule<Binary>] = &[
    ("identity", sub_identity),
    ("fold", sub_fold),
    ("negate_constant", sub_negate_constant),
    ("vectors", sub_vectors),
    ("select", sub_select),
    ("cancel_add", sub_cancel_add),
    ("min_max_cancel", sub_min_max_cancel),
    ("pull_constant", sub_pull_constant),
    ("constant_subtrahends", sub_constant_subtrahends),
    ("distribute_sub", sub_distribute_sub),
    ("negative_factor", sub_negative_factor),
    ("factor", sub_factor),
    ("constant_addend", sub_constant_addend),
    ("common_factor", sub_common_factor),
    ("cancel_add_add", sub_cancel_add_add),
    ("cancel_add_min", sub_cancel_add_min),
    ("min_max_difference", sub_min_max_difference),
    ("round_down", sub_round_down),
    ("div_difference", sub_div_difference),
];

fn sub_identity(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    if is_zero(&op.b) {
        Some(op.a.clone())
    } else if op.a == op.b {
        Some(make_zero(op.ty()))
    } else {
        None
    }
}

fn sub_fold(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ty = op.a.ty();
    if let (Some(ia), Some(ib)) = (const_int(&op.a), const_int(&op.b)) {
        return Some(fold_int(ty, ia as i128 - ib as i128));
    }
    if let (Some(ua), Some(ub)) = (const_uint(&op.a), const_uint(&op.b)) {
        return Some(Expr::make_uint(ty, ua.wrapping_sub(ub)));
    }
    let (fa, fb) = (const_float(&op.a)?, const_float(&op.b)?);
    Some(Expr::make_float(ty, fa - fb))
}

fn sub_negate_constant(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ty = op.a.ty();
    if let Some(ib) = const_int(&op.b) {
        return Some(s.mutate(&(&op.a + Expr::make_int(ty, ib.wrapping_neg()))));
    }
    let fb = const_float(&op.b)?;
    Some(s.mutate(&(&op.a + Expr::make_float(ty, -fb))))
}

fn sub_vectors(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    if let (Some((base_a, stride_a, lanes)), Some((base_b, stride_b, _))) = (a.as_ramp(), b.as_ramp()) {
        return Some(s.mutate(&Expr::make_ramp(base_a - base_b, stride_a - stride_b, lanes)));
    }
    if let (Some((base, stride, lanes)), Some((value, _))) = (a.as_ramp(), b.as_broadcast()) {
        return Some(s.mutate(&Expr::make_ramp(base - value, stride.clone(), lanes)));
    }
    if let (Some((value, _)), Some((base, stride, lanes))) = (a.as_broadcast(), b.as_ramp()) {
        let neg_stride = make_zero(stride.ty()) - stride;
        return Some(s.mutate(&Expr::make_ramp(value - base, neg_stride, lanes)));
    }
    let ((va, lanes), (vb, _)) = (a.as_broadcast()?, b.as_broadcast()?);
    Some(Expr::make_broadcast(s.mutate(&(va - vb)), lanes))
}

fn sub_select(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    let zero = || make_zero(op.ty());
    if let Some((c, t, f)) = a.as_select() {
        if let Some((cb, tb, fb)) = b.as_select() {
            if c == cb {
                // select(c, a, b) - select(c, d, e) -> select(c, a - d, b - e)
                return Some(s.mutate(&Expr::make_select(c.clone(), t - tb, f - fb)));
            }
        }
        if t == b {
            // select(c, a, b) - a -> select(c, 0, b - a)
            return Some(s.mutate(&Expr::make_select(c.clone(), zero(), f - t)));
        }
        if f == b {
            // select(c, a, b) - b -> select(c, a - b, 0)
            return Some(s.mutate(&Expr::make_select(c.clone(), t - f, zero())));
        }
    }
    let (c, t, f) = b.as_select()?;
    if t == a {
        // a - select(c, a, b) -> select(c, 0, a - b)
        Some(s.mutate(&Expr::make_select(c.clone(), zero(), t - f)))
    } else if f == a {
        // b - select(c, a, b) -> select(c, b - a, 0)
        Some(s.mutate(&Expr::make_select(c.clone(), f - t, zero())))
    } else {
        None
    }
}

fn sub_cancel_add(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    if let Some((x, y)) = a.as_add() {
        if y == b {
            return Some(x.clone());
        }
        if x == b {
            return Some(y.clone());
        }
    }
    let (x, y) = b.as_add()?;
    if y == a {
        Some(s.mutate(&(make_zero(x.ty()) - x)))
    } else if x == a {
        Some(s.mutate(&(make_zero(x.ty()) - y)))
    } else {
        None
    }
}

fn sub_min_max_cancel(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    let ty = op.ty();
    if !no_overflow(ty) {
        return None;
    }
    let zero = || make_zero(ty);
    if !is_const(b) {
        if let Some((x, y)) = a.as_max() {
            if x == b {
                // max(a, b) - a -> max(0, b - a)
                return Some(s.mutate(&Expr::make_max(zero(), y - x)));
            }
        }
        if let Some((x, y)) = a.as_min() {
            if x == b {
                // min(a, b) - a -> min(0, b - a)
                return Some(s.mutate(&Expr::make_min(zero(), y - x)));
            }
        }
        if let Some((x, y)) = a.as_max() {
            if y == b {
                // max(a, b) - b -> max(a - b, 0)
                return Some(s.mutate(&Expr::make_max(x - y, zero())));
            }
        }
        if let Some((x, y)) = a.as_min() {
            if y == b {
                // min(a, b) - b -> min(a - b, 0)
                return Some(s.mutate(&Expr::make_min(x - y, zero())));
            }
        }
    }
    if is_const(a) {
        return None;
    }
    if let Some((x, y)) = b.as_max() {
        if x == a {
            // a - max(a, b) -> min(0, a - b)
            return Some(s.mutate(&Expr::make_min(zero(), x - y)));
        }
    }
    if let Some((x, y)) = b.as_min() {
        if x == a {
            // a - min(a, b) -> max(0, a - b)
            return Some(s.mutate(&Expr::make_max(zero(), x - y)));
        }
    }
    if let Some((x, y)) = b.as_max() {
        if y == a {
            // b - max(a, b) -> min(b - a, 0)
            return Some(s.mutate(&Expr::make_min(y - x, zero())));
        }
    }
    if let Some((x, y)) = b.as_min() {
        if y == a {
            // b - min(a, b) -> max(b - a, 0)
            return Some(s.mutate(&Expr::make_max(y - x, zero())));
        }
    }
    None
}

fn sub_pull_constant(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let b = &op.b;
    let (x, c) = op.a.as_add()?;
    if !is_simple_const(c) {
        return None;
    }
    Some(if is_simple_const(b) {
        s.mutate(&(x + (c - b)))
    } else {
        s.mutate(&((x - b) + c))
    })
}

fn sub_constant_subtrahends(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (c1, x) = op.a.as_sub()?;
    let (c2, y) = op.b.as_sub()?;
    if is_const(c1) && is_const(c2) {
        // (c1 - a) - (c2 - b) -> (b - a) + (c1 - c2)
        Some(s.mutate(&((y - x) + (c1 - c2))))
    } else {
        None
    }
}

fn sub_distribute_sub(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (x, y) = op.b.as_sub()?;
    // a - (b - c) -> a + (c - b)
    Some(s.mutate(&(&op.a + (y - x))))
}

fn sub_negative_factor(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (x, k) = op.b.as_mul()?;
    // a - b*-k -> a + b*k
    is_negative_negatable_const(k).then(|| s.mutate(&(&op.a + x * -k)))
}

fn sub_factor(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    let ty = op.ty();
    if !no_overflow(ty) {
        return None;
    }
    if let Some((x, y)) = b.as_mul() {
        if !is_const(a) && a == x {
            // a - a*b -> a*(1 - b)
            return Some(s.mutate(&(a * (make_one(ty) - y))));
        }
        if !is_const(a) && a == y {
            // a - b*a -> (1 - b)*a
            return Some(s.mutate(&((make_one(ty) - x) * a)));
        }
    }
    let (x, y) = a.as_mul()?;
    if !is_const(b) && x == b {
        // a*b - a -> a*(b - 1)
        Some(s.mutate(&(x * (y - make_one(ty)))))
    } else if !is_const(b) && y == b {
        // a*b - b -> (a - 1)*b
        Some(s.mutate(&((x - make_one(ty)) * b)))
    } else {
        None
    }
}

fn sub_constant_addend(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    if let Some((y, c)) = b.as_add() {
        if is_simple_const(c) {
            // a - (y + c) -> (a - y) - c
            return Some(s.mutate(&((a - y) - c)));
        }
    }
    let (c, x) = a.as_sub()?;
    if is_simple_const(c) && is_simple_const(b) {
        // (c1 - x) - c2 -> (c1 - c2) - x
        Some(s.mutate(&((c - b) - x)))
    } else {
        None
    }
}

fn sub_common_factor(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (aa, ab) = op.a.as_mul()?;
    let (ba, bb) = op.b.as_mul()?;
    if aa == ba {
        Some(s.mutate(&(aa * (ab - bb))))
    } else if ab == ba {
        Some(s.mutate(&(ab * (aa - bb))))
    } else if ab == bb {
        Some(s.mutate(&(ab * (aa - ba))))
    } else if aa == bb {
        Some(s.mutate(&(aa * (ab - ba))))
    } else {
        None
    }
}

fn sub_cancel_add_add(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (aa, ab) = op.a.as_add()?;
    let (ba, bb) = op.b.as_add()?;
    if ab == bb {
        // (a + b) - (c + b) -> a - c
        Some(s.mutate(&(aa - ba)))
    } else if aa == ba {
        // (a + b) - (a + c) -> b - c
        Some(s.mutate(&(ab - bb)))
    } else if aa == bb {
        // (a + b) - (c + a) -> b - c
        Some(s.mutate(&(ab - ba)))
    } else if ab == ba {
        // (b + a) - (a + c) -> b - c
        Some(s.mutate(&(aa - bb)))
    } else {
        None
    }
}

fn sub_cancel_add_min(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    if !no_overflow(op.ty()) {
        return None;
    }
    let (a, b) = (&op.a, &op.b);
    if let Some((p, q)) = b.as_min() {
        if let Some((x, y)) = p.as_add() {
            if a == x {
                // a - min(a + b, c) -> max(-b, a - c)
                return Some(s.mutate(&Expr::make_max(0 - y, a - q)));
            }
            if a == y {
                // a - min(b + a, c) -> max(-b, a - c)
                return Some(s.mutate(&Expr::make_max(0 - x, a - q)));
            }
        }
        if let Some((x, y)) = q.as_add() {
            if a == x {
                // a - min(c, a + b) -> max(-b, a - c)
                return Some(s.mutate(&Expr::make_max(0 - y, a - p)));
            }
            if a == y {
                // a - min(c, b + a) -> max(-b, a - c)
                return Some(s.mutate(&Expr::make_max(0 - x, a - p)));
            }
        }
    }
    let (p, q) = a.as_min()?;
    if let Some((x, y)) = p.as_add() {
        if b == x {
            // min(a + b, c) - a -> min(b, c - a)
            return Some(s.mutate(&Expr::make_min(y.clone(), q - b)));
        }
        if b == y {
            // min(b + a, c) - a -> min(b, c - a)
            return Some(s.mutate(&Expr::make_min(x.clone(), q - b)));
        }
    }
    if let Some((x, y)) = q.as_add() {
        if b == x {
            // min(c, a + b) - a -> min(b, c - a)
            return Some(s.mutate(&Expr::make_min(y.clone(), p - b)));
        }
        if b == y {
            // min(c, b + a) - a -> min(b, c - a)
            return Some(s.mutate(&Expr::make_min(x.clone(), p - b)));
        }
    }
    None
}

fn sub_min_max_difference(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ty = op.ty();
    let (a, b) = (&op.a, &op.b);
    let pairs = match (a.as_min(), b.as_min(), a.as_max(), b.as_max()) {
        (Some(pa), Some(pb), _, _) => (pa, pb),
        (_, _, Some(pa), Some(pb)) => (pa, pb),
        _ => return None,
    };
    let ((w, x), (y, z)) = pairs;
    if w == z && x == y {
        // min(a, b) - min(b, a) -> 0
        return Some(make_zero(ty));
    }
    if !no_overflow(ty) {
        return None;
    }
    if is_zero(&s.mutate(&((w + z) - (x + y)))) {
        // min(a, b) - min(c, d) where a - b == c - d -> b - d
        return Some(s.mutate(&(x - z)));
    }
    if is_zero(&s.mutate(&((w + y) - (x + z)))) {
        // min(a, b) - min(c, d) where a - b == d - c -> b - c
        return Some(s.mutate(&(x - y)));
    }
    None
}

fn sub_round_down(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ty = op.ty();
    if !(no_overflow(ty) && (ty.is_int() || ty.is_uint())) {
        return None;
    }
    let (a, b) = (&op.a, &op.b);
    let rounded = |e: &Expr, x: &Expr| -> Option<Expr> {
        let (q, k) = e.as_mul()?;
        let (n, d) = q.as_div()?;
        (is_positive_const(k) && k == d && n == x).then(|| k.clone())
    };
    if let Some(k) = rounded(a, b) {
        // (x/4)*4 - x -> -(x%4)
        return Some(s.mutate(&(make_zero(a.ty()) - b % k)));
    }
    let k = rounded(b, a)?;
    // x - (x/4)*4 -> x%4
    Some(s.mutate(&(a % k)))
}

fn sub_div_difference(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ty = op.ty();
    let (na, c) = op.a.as_div()?;
    let (nb, cb) = op.b.as_div()?;
    if !(is_positive_const(c) && c == cb && ty.is_int() && no_overflow(ty)) {
        return None;
    }
    let (add_a, add_b) = (na.as_add(), nb.as_add());
    let (sub_a, sub_b) = (na.as_sub(), nb.as_sub());
    if let (Some((x, a)), Some((xb, b))) = (add_a, add_b) {
        if x == xb && (is_simple_const(a) || is_simple_const(b)) {
            // (x + a)/c - (x + b)/c, with one copy of whichever offset is not constant.
            return Some(if is_simple_const(b) {
                s.mutate(&(((x + b % c) % c + (a - b)) / c))
            } else {
                s.mutate(&(((c + a - 1 - b) - (x + a % c) % c) / c))
            });
        }
    }
    if let Some((x, b)) = add_b {
        if na == x {
            // x/c - (x + b)/c
            return Some(s.mutate(&(((c - 1 - b) - na % c) / c)));
        }
    }
    if let Some((x, a)) = add_a {
        if x == nb {
            // (x + a)/c - x/c
            return Some(s.mutate(&((x % c + a) / c)));
        }
    }
    if let Some((x, b)) = sub_b {
        if na == x {
            // x/c - (x - b)/c
            return Some(s.mutate(&(((c - 1 + b) - na % c) / c)));
        }
    }
    if let Some((x, a)) = sub_a {
        if x == nb {
            // (x - a)/c - x/c
            return Some(s.mutate(&((x % c - a) / c)));
        }
    }
    if let (Some((x, a)), Some((xb, b))) = (sub_a, add_b) {
        if x == xb && is_simple_const(b) {
            // (x - a)/c - (x + b)/c -> ((x + b)%c - a - b)/c
            return Some(s.mutate(&(((x + b % c) % c - a - b) / c)));
        }
    }
    if let (Some((x, a)), Some((xb, b))) = (add_a, sub_b) {
        if x == xb && is_simple_const(a) {
            // (x + a)/c - (x - b)/c -> (b - (x + a)%c + (a + c - 1))/c
            return Some(s.mutate(&((b - (x + a % c) % c + (a + c - 1)) / c)));
        }
    }
    None
}
