// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Rules for `Mul`, `Div` and `Mod`. Integer division and modulo are
//! Euclidean; a zero integer divisor produces an indeterminate value.

use super::{
    const_float, const_int, const_uint, fold_int, is_simple_const, no_overflow,
    no_overflow_scalar_int, propagate_markers, vector::hoist_slice_vector, Binary, Rule,
    Simplifier,
};
use crate::modulus_remainder::ModulusRemainder;
use ir_core::{
    ir::shuffle_is_slice,
    ir_operator::{
        div_imp, is_const, is_const_value, is_negative_negatable_const, is_one, is_zero,
        make_const, make_one, make_zero, mod_imp, mod_imp_float, select,
    },
    Expr,
};

fn both_slices(op: &Binary) -> bool {
    let is_slice = |e: &Expr| {
        matches!(e.as_shuffle(), Some((vectors, indices)) if shuffle_is_slice(vectors, indices))
    };
    is_slice(&op.a) && is_slice(&op.b)
}

/// `ia` is a multiple of the positive `ib`.
fn divides(ia: i64, ib: i64) -> bool {
    ib > 0 && ia.checked_rem(ib) == Some(0)
}

// ----------------------------------------------------------------------------------
// Mul

pub(super) fn visit_mul(s: &mut Simplifier, e: &Expr, a: &Expr, b: &Expr) -> Expr {
    let mut a = s.mutate(a);
    let mut b = s.mutate(b);
    if let Some(marker) = propagate_markers(e.ty(), &[&a, &b]) {
        return marker;
    }
    if is_simple_const(&a) || (b.as_min().is_some() && a.as_max().is_some()) {
        std::mem::swap(&mut a, &mut b);
    }
    let op = Binary::new(e, a, b);
    s.apply_rules("Mul", MUL_RULES, &op)
        .unwrap_or_else(|| op.rebuild(Expr::make_mul))
}

const MUL_RULES: &[Rule<Binary>] = &[
    ("identity", mul_identity),
    ("fold", mul_fold),
    ("hoist_slices", mul_hoist_slices),
    ("vectors", mul_vectors),
    ("distribute_constant", mul_distribute_constant),
    ("negate", mul_negate),
    ("combine_constants", mul_combine_constants),
    ("pull_constant", mul_pull_constant),
    ("min_times_max", mul_min_times_max),
];

fn mul_identity(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    if is_zero(a) || is_one(b) {
        Some(a.clone())
    } else if is_zero(b) || is_one(a) {
        Some(b.clone())
    } else {
        None
    }
}

fn mul_fold(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ty = op.a.ty();
    if let (Some(ia), Some(ib)) = (const_int(&op.a), const_int(&op.b)) {
        return Some(fold_int(ty, ia as i128 * ib as i128));
    }
    if let (Some(ua), Some(ub)) = (const_uint(&op.a), const_uint(&op.b)) {
        return Some(Expr::make_uint(ty, ua.wrapping_mul(ub)));
    }
    let (fa, fb) = (const_float(&op.a)?, const_float(&op.b)?);
    Some(Expr::make_float(ty, fa * fb))
}

fn mul_hoist_slices(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    both_slices(op).then(|| hoist_slice_vector(op, Expr::make_mul))
}

fn mul_vectors(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    if let (Some((va, lanes)), Some((vb, _))) = (a.as_broadcast(), b.as_broadcast()) {
        return Some(Expr::make_broadcast(s.mutate(&(va * vb)), lanes));
    }
    if let (Some((base, stride, lanes)), Some((m, _))) = (a.as_ramp(), b.as_broadcast()) {
        return Some(s.mutate(&Expr::make_ramp(base * m, stride * m, lanes)));
    }
    let ((m, _), (base, stride, lanes)) = (a.as_broadcast()?, b.as_ramp()?);
    Some(s.mutate(&Expr::make_ramp(m * base, m * stride, lanes)))
}

fn mul_distribute_constant(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let b = &op.b;
    let (x, c) = op.a.as_add()?;
    // (x + c1)*c2 -> x*c2 + c1*c2
    (is_simple_const(c) && is_simple_const(b)).then(|| s.mutate(&(x * b + c * b)))
}

fn mul_negate(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (x, y) = op.a.as_sub()?;
    // (x - y)*-k -> (y - x)*k
    is_negative_negatable_const(&op.b)
        .then(|| s.mutate(&Expr::make_mul(Expr::make_sub(y.clone(), x.clone()), -&op.b)))
}

fn mul_combine_constants(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let b = &op.b;
    let (x, c) = op.a.as_mul()?;
    // (x*c1)*c2 -> x*(c1*c2)
    (is_simple_const(c) && is_simple_const(b)).then(|| s.mutate(&(x * (c * b))))
}

fn mul_pull_constant(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (y, c) = op.b.as_mul()?;
    // a*(y*c) -> (a*y)*c
    is_simple_const(c).then(|| s.mutate(&((&op.a * y) * c)))
}

fn mul_min_times_max(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (x, y) = op.a.as_min()?;
    let (p, q) = op.b.as_max()?;
    // min(x, y)*max(x, y) -> x*y, in either order.
    ((x == p && y == q) || (x == q && y == p)).then(|| s.mutate(&(x * y)))
}

// ----------------------------------------------------------------------------------
// Div

pub(super) fn visit_div(s: &mut Simplifier, e: &Expr, a: &Expr, b: &Expr) -> Expr {
    let a = s.mutate(a);
    let b = s.mutate(b);
    if let Some(marker) = propagate_markers(e.ty(), &[&a, &b]) {
        return marker;
    }
    let op = Binary::new(e, a, b);
    s.apply_rules("Div", DIV_RULES, &op)
        .unwrap_or_else(|| op.rebuild(Expr::make_div))
}

const DIV_RULES: &[Rule<Binary>] = &[
    ("bounded_numerator", div_bounded_numerator),
    ("by_zero", div_by_zero),
    ("identity", div_identity),
    ("fold", div_fold),
    ("broadcasts", div_broadcasts),
    ("minus_one", div_minus_one),
    ("ramp_stride", div_ramp_stride),
    ("ramp_aligned", div_ramp_aligned),
    ("nested_div", div_nested_div),
    ("nested_div_offset", div_nested_div_offset),
    ("mul_constant", div_mul_constant),
    ("pull_multiples", div_pull_multiples),
    ("pull_constant", div_pull_constant),
    ("add_divisor", div_add_divisor),
    ("nested_add_divisor", div_nested_add_divisor),
    ("cancel_factor", div_cancel_factor),
    ("pull_factor", div_pull_factor),
    ("float_reciprocal", div_float_reciprocal),
];

fn div_bounded_numerator(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ib = const_int(&op.b).filter(|&ib| ib != 0)?;
    let (min, max) = s.const_int_bounds(&op.a)?;
    let quotient = (max as i128).div_euclid(ib as i128);
    // Every numerator in range gives the same quotient.
    (quotient == (min as i128).div_euclid(ib as i128)).then(|| fold_int(op.ty(), quotient))
}

fn div_by_zero(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    (is_zero(&op.b) && !op.ty().is_float()).then(|| Expr::make_indeterminate(op.ty()))
}

fn div_identity(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    if is_zero(&op.a) || is_one(&op.b) {
        Some(op.a.clone())
    } else if op.a == op.b {
        Some(make_one(op.ty()))
    } else {
        None
    }
}

fn div_fold(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ty = op.ty();
    if let (Some(ia), Some(ib)) = (const_int(&op.a), const_int(&op.b)) {
        // The only overflowing quotient is MIN / -1.
        return Some(fold_int(ty, (ia as i128).div_euclid(ib as i128)));
    }
    if let (Some(ua), Some(ub)) = (const_uint(&op.a), const_uint(&op.b)) {
        return Some(Expr::make_uint(ty, ua.checked_div(ub)?));
    }
    let (fa, fb) = (const_float(&op.a)?, const_float(&op.b)?);
    (fb != 0.0).then(|| Expr::make_float(ty, fa / fb))
}

fn div_broadcasts(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ((va, lanes), (vb, _)) = (op.a.as_broadcast()?, op.b.as_broadcast()?);
    let quotient = Expr::make_div(va.clone(), vb.clone());
    Some(s.mutate(&Expr::make_broadcast(quotient, lanes)))
}

fn div_minus_one(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ty = op.ty();
    if !(no_overflow_scalar_int(ty) && is_const_value(&op.a, -1)) {
        return None;
    }
    // -1/x -> select(x < 0, 1, -1)
    let negative = Expr::make_lt(op.b.clone(), make_zero(ty));
    Some(s.mutate(&select(negative, make_one(ty), make_const(ty, -1))))
}

/// A ramp with a constant stride over a broadcast constant divisor:
/// `(base, stride, lanes, divisor)`.
fn ramp_over_constant(op: &Binary) -> Option<(&Expr, i64, u16, i64)> {
    let (base, stride, lanes) = op.a.as_ramp()?;
    if !no_overflow_scalar_int(base.ty()) {
        return None;
    }
    let ia = const_int(stride)?;
    let (value, _) = op.b.as_broadcast()?;
    let ib = const_int(value).filter(|&ib| ib != 0)?;
    Some((base, ia, lanes, ib))
}

/// Whether every lane of the ramp lies in the same multiple of `divisor`,
/// judging by the alignment of its base. On success, the base's remainder.
fn ramp_within_one_multiple(
    s: &Simplifier,
    base: &Expr,
    stride: i64,
    lanes: u16,
    divisor: i64,
) -> Option<i64> {
    let fact = s.modulus_remainder(base);
    if fact.modulus.checked_rem(divisor)? != 0 {
        return None;
    }
    let last = stride
        .checked_mul(i64::from(lanes) - 1)?
        .checked_add(fact.remainder)?;
    (div_imp(fact.remainder, divisor) == div_imp(last, divisor)).then_some(fact.remainder)
}

fn div_ramp_stride(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (base, ia, lanes, ib) = ramp_over_constant(op)?;
    if ia.checked_rem(ib)? != 0 {
        return None;
    }
    // ramp(x, 4, w) / broadcast(2, w) -> ramp(x / 2, 2, w)
    let (value, _) = op.b.as_broadcast()?;
    let stride = Expr::make_int(op.ty().element_of(), div_imp(ia, ib));
    Some(s.mutate(&Expr::make_ramp(base / value, stride, lanes)))
}

fn div_ramp_aligned(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (base, ia, lanes, ib) = ramp_over_constant(op)?;
    ramp_within_one_multiple(s, base, ia, lanes, ib)?;
    // ramp(k*z + x, y, w) / z -> broadcast(k, w) when no lane crosses a multiple of z
    let (value, _) = op.b.as_broadcast()?;
    Some(s.mutate(&Expr::make_broadcast(base / value, lanes)))
}

fn div_nested_div(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    if !no_overflow(op.ty()) {
        return None;
    }
    let (x, c) = op.a.as_div()?;
    let (ia, ib) = (const_int(c)?, const_int(&op.b)?);
    if ia < 0 || ib < 0 {
        return None;
    }
    // (x / 3) / 4 -> x / 12
    Some(s.mutate(&(x / make_const(op.ty(), ia.checked_mul(ib)?))))
}

fn div_nested_div_offset(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ty = op.ty();
    if !no_overflow(ty) {
        return None;
    }
    let (inner, c) = op.a.as_add()?;
    let (x, d) = inner.as_div()?;
    let (ia, ib, ic) = (const_int(d)?, const_int(c)?, const_int(&op.b)?);
    if ia < 0 || ic < 0 {
        return None;
    }
    // (x / ia + ib) / ic -> (x + ia*ib) / (ia*ic)
    let offset = make_const(ty, ia.checked_mul(ib)?);
    let divisor = make_const(ty, ia.checked_mul(ic)?);
    Some(s.mutate(&((x + offset) / divisor)))
}

fn div_mul_constant(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ty = op.ty();
    if !no_overflow(ty) {
        return None;
    }
    let (x, c) = op.a.as_mul()?;
    let (ia, ib) = (const_int(c)?, const_int(&op.b)?);
    if ia <= 0 || ib <= 0 {
        return None;
    }
    if ia % ib == 0 {
        // (x * 4) / 2 -> x * 2
        Some(s.mutate(&(x * make_const(ty, div_imp(ia, ib)))))
    } else if ib % ia == 0 {
        // (x * 2) / 4 -> x / 2
        Some(s.mutate(&(x / make_const(ty, div_imp(ib, ia)))))
    } else {
        None
    }
}

/// If `e` is `x * k` with `k` a multiple of the positive `divisor`, the `x`
/// and the ratio `k / divisor` as a constant.
fn multiple_of<'e>(e: &'e Expr, divisor: i64) -> Option<(&'e Expr, Expr)> {
    let (x, k) = e.as_mul()?;
    let ia = const_int(k)?;
    divides(ia, divisor).then(|| (x, make_const(e.ty(), div_imp(ia, divisor))))
}

fn div_pull_multiples(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    if !no_overflow(op.ty()) {
        return None;
    }
    let b = &op.b;
    let ib = const_int(b).filter(|&ib| ib > 0)?;
    let a = &op.a;
    let add_a = a.as_add();
    let sub_a = a.as_sub();
    if let Some((p, q)) = add_a {
        if let Some((x, ratio)) = multiple_of(p, ib) {
            // (x*4 + y) / 2 -> x*2 + y/2
            return Some(s.mutate(&(x * ratio + q / b)));
        }
        if let Some((x, ratio)) = multiple_of(q, ib) {
            // (y + x*4) / 2 -> y/2 + x*2
            return Some(s.mutate(&(p / b + x * ratio)));
        }
    }
    if let Some((p, q)) = sub_a {
        if let Some((x, ratio)) = multiple_of(p, ib) {
            // (x*4 - y) / 2 -> x*2 + (-y)/2
            return Some(s.mutate(&(x * ratio + (-q) / b)));
        }
        if let Some((x, ratio)) = multiple_of(q, ib) {
            // (y - x*4) / 2 -> y/2 - x*2
            return Some(s.mutate(&(p / b - x * ratio)));
        }
    }
    // One level deeper on the left.
    let (outer_a, z, outer_is_add) = match (add_a, sub_a) {
        (Some((p, q)), _) => (p, q, true),
        (_, Some((p, q))) => (p, q, false),
        _ => return None,
    };
    if let Some((m, y)) = outer_a.as_add() {
        if let Some((x, ratio)) = multiple_of(m, ib) {
            return Some(if outer_is_add {
                // ((x*4 + y) + z) / 2 -> x*2 + (y + z)/2
                s.mutate(&(x * ratio + (y + z) / b))
            } else {
                // ((x*4 + y) - z) / 2 -> x*2 + (y - z)/2
                s.mutate(&(x * ratio + (y - z) / b))
            });
        }
    }
    if let Some((m, y)) = outer_a.as_sub() {
        if let Some((x, ratio)) = multiple_of(m, ib) {
            return Some(if outer_is_add {
                // ((x*4 - y) + z) / 2 -> x*2 + (z - y)/2
                s.mutate(&(x * ratio + (z - y) / b))
            } else {
                // ((x*4 - y) - z) / 2 -> x*2 + (-y - z)/2
                s.mutate(&(x * ratio + (-y - z) / b))
            });
        }
    }
    // One level deeper on the right.
    let w = outer_a;
    if let Some((m, y)) = z.as_add() {
        if let Some((x, ratio)) = multiple_of(m, ib) {
            return Some(if outer_is_add {
                // (w + (x*4 + y)) / 2 -> x*2 + (w + y)/2
                s.mutate(&(x * ratio + (w + y) / b))
            } else {
                // (w - (x*4 + y)) / 2 -> (w - y)/2 - x*2
                s.mutate(&((w - y) / b - x * ratio))
            });
        }
    }
    if let Some((m, y)) = z.as_sub() {
        if outer_is_add {
            if let Some((x, ratio)) = multiple_of(m, ib) {
                // (w + (x*4 - y)) / 2 -> x*2 + (w - y)/2
                return Some(s.mutate(&(x * ratio + (w - y) / b)));
            }
            if let Some((x, ratio)) = multiple_of(y, ib) {
                // (w + (y - x*4)) / 2 -> (w + y)/2 - x*2
                return Some(s.mutate(&((w + m) / b - x * ratio)));
            }
        }
    }
    None
}

fn div_pull_constant(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ty = op.ty();
    if !no_overflow(ty) {
        return None;
    }
    let (y, c) = op.a.as_add()?;
    let (ia, ib) = (const_int(c)?, const_int(&op.b)?);
    // (y + 8) / 2 -> y/2 + 4
    divides(ia, ib).then(|| s.mutate(&(y / &op.b + make_const(ty, div_imp(ia, ib)))))
}

fn div_add_divisor(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ty = op.ty();
    if !no_overflow(ty) {
        return None;
    }
    let b = &op.b;
    let one = || make_one(ty);
    if let Some((p, q)) = op.a.as_add() {
        if p == b {
            // (x + y)/x -> y/x + 1
            return Some(s.mutate(&(q / b + one())));
        }
        if q == b {
            // (y + x)/x -> y/x + 1
            return Some(s.mutate(&(p / b + one())));
        }
    }
    let (p, q) = op.a.as_sub()?;
    if !is_zero(b) && p == b {
        // (x - y)/x -> (-y)/x + 1
        Some(s.mutate(&((make_zero(ty) - q) / b + one())))
    } else if q == b {
        // (y - x)/x -> y/x - 1
        Some(s.mutate(&(p / b + make_const(ty, -1))))
    } else {
        None
    }
}

fn div_nested_add_divisor(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ty = op.ty();
    if !no_overflow(ty) {
        return None;
    }
    let b = &op.b;
    let (p, z) = op.a.as_add()?;
    if let Some((x, y)) = p.as_add() {
        if x == b {
            // ((x + y) + z)/x -> (y + z)/x + 1
            return Some(s.mutate(&((y + z) / b + make_one(ty))));
        }
        if y == b {
            // ((y + x) + z)/x -> (y + z)/x + 1
            return Some(s.mutate(&((x + z) / b + make_one(ty))));
        }
    }
    let (x, y) = z.as_add()?;
    if y == b {
        // (y + (z + x))/x -> (y + z)/x + 1
        Some(s.mutate(&((p + x) / b + make_one(ty))))
    } else if x == b {
        // (y + (x + z))/x -> (y + z)/x + 1
        Some(s.mutate(&((p + y) / b + make_one(ty))))
    } else {
        None
    }
}

fn div_cancel_factor(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    if !no_overflow(op.ty()) {
        return None;
    }
    let (x, y) = op.a.as_mul()?;
    if y == &op.b {
        // (x*y)/y -> x
        Some(x.clone())
    } else if x == &op.b {
        // (y*x)/y -> x
        Some(y.clone())
    } else {
        None
    }
}

fn div_pull_factor(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ty = op.ty();
    if !no_overflow(ty) {
        return None;
    }
    let b = &op.b;
    // The other factor of `e` when `e` is a product with `b`.
    let cofactor = |e: &Expr| -> Option<Expr> {
        let (x, y) = e.as_mul()?;
        if y == b {
            Some(x.clone())
        } else if x == b {
            Some(y.clone())
        } else {
            None
        }
    };
    if let Some((p, q)) = op.a.as_add() {
        if let Some(x) = cofactor(p) {
            // (x*a + y) / a -> x + y/a
            return Some(s.mutate(&(x + q / b)));
        }
        if let Some(x) = cofactor(q) {
            // (y + x*a) / a -> y/a + x
            return Some(s.mutate(&(p / b + x)));
        }
    }
    let (p, q) = op.a.as_sub()?;
    if let Some(x) = cofactor(p) {
        // (x*a - y) / a -> x + (-y)/a
        return Some(s.mutate(&(x + (make_zero(ty) - q) / b)));
    }
    let x = cofactor(q)?;
    // (y - x*a) / a -> y/a - x
    Some(s.mutate(&(p / b - x)))
}

fn div_float_reciprocal(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let b = &op.b;
    // x / 2 -> x * 0.5
    (b.ty().is_float() && is_simple_const(b) && !is_zero(b))
        .then(|| s.mutate(&(&op.a * (make_one(b.ty()) / b))))
}

// ----------------------------------------------------------------------------------
// Mod

pub(super) fn visit_mod(s: &mut Simplifier, e: &Expr, a: &Expr, b: &Expr) -> Expr {
    let a = s.mutate(a);
    let b = s.mutate(b);
    if let Some(marker) = propagate_markers(e.ty(), &[&a, &b]) {
        return marker;
    }
    let op = Binary::new(e, a, b);
    s.apply_rules("Mod", MOD_RULES, &op)
        .unwrap_or_else(|| op.rebuild(Expr::make_mod))
}

const MOD_RULES: &[Rule<Binary>] = &[
    ("bounded_numerator", mod_bounded_numerator),
    ("by_zero", mod_by_zero),
    ("zero", mod_zero),
    ("fold", mod_fold),
    ("broadcasts", mod_broadcasts),
    ("multiple", mod_multiple),
    ("drop_multiple", mod_drop_multiple),
    ("alignment", mod_alignment),
    ("ramp_stride", mod_ramp_stride),
    ("ramp_aligned", mod_ramp_aligned),
    ("ramp_base", mod_ramp_base),
];

/// The alignment of a scalar numerator modulo a constant divisor.
fn scalar_alignment(s: &Simplifier, op: &Binary) -> Option<(ModulusRemainder, i64)> {
    let ib = const_int(&op.b).filter(|&ib| ib != 0)?;
    if !no_overflow_scalar_int(op.ty()) {
        return None;
    }
    Some((s.modulus_remainder(&op.a), ib))
}

fn mod_bounded_numerator(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ib = const_int(&op.b).filter(|&ib| ib != 0)?;
    if !no_overflow_scalar_int(op.ty()) {
        return None;
    }
    let (min, max) = s.const_int_bounds(&op.a)?;
    (min >= 0 && max < ib).then(|| op.a.clone())
}

fn mod_by_zero(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    (is_zero(&op.b) && !op.ty().is_float()).then(|| Expr::make_indeterminate(op.ty()))
}

fn mod_zero(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    is_zero(&op.a).then(|| op.a.clone())
}

fn mod_fold(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ty = op.ty();
    if let (Some(ia), Some(ib)) = (const_int(&op.a), const_int(&op.b)) {
        return Some(Expr::make_int(ty, mod_imp(ia, ib)));
    }
    if let (Some(ua), Some(ub)) = (const_uint(&op.a), const_uint(&op.b)) {
        return Some(Expr::make_uint(ty, ua.checked_rem(ub)?));
    }
    let (fa, fb) = (const_float(&op.a)?, const_float(&op.b)?);
    Some(Expr::make_float(ty, mod_imp_float(fa, fb)))
}

fn mod_broadcasts(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ((va, lanes), (vb, _)) = (op.a.as_broadcast()?, op.b.as_broadcast()?);
    let remainder = Expr::make_mod(va.clone(), vb.clone());
    Some(s.mutate(&Expr::make_broadcast(remainder, lanes)))
}

fn mod_multiple(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    if !no_overflow(op.ty()) {
        return None;
    }
    let (_, k) = op.a.as_mul()?;
    let (ia, ib) = (const_int(k)?, const_int(&op.b)?);
    // (x * (b*a)) % b -> 0
    (ia.checked_rem(ib)? == 0).then(|| make_zero(op.ty()))
}

fn mod_drop_multiple(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    if !no_overflow(op.ty()) {
        return None;
    }
    let b = &op.b;
    let ib = const_int(b).filter(|&ib| ib != 0)?;
    let is_multiple = |k: &Expr| const_int(k).and_then(|ia| ia.checked_rem(ib)) == Some(0);
    let (p, q) = op.a.as_add()?;
    if let Some((_, k)) = p.as_mul() {
        if is_multiple(k) {
            // (x * (b*a) + y) % b -> y % b
            return Some(s.mutate(&(q % b)));
        }
    }
    if is_multiple(q) {
        // (y + (b*a)) % b -> y % b
        return Some(s.mutate(&(p % b)));
    }
    let (_, k) = q.as_mul()?;
    // (y + x * (b*a)) % b -> y % b
    is_multiple(k).then(|| s.mutate(&(p % b)))
}

fn mod_alignment(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (fact, ib) = scalar_alignment(s, op)?;
    // ((a*b)*x + c) % a -> c % a
    (fact.modulus.checked_rem(ib)? == 0).then(|| make_const(op.ty(), mod_imp(fact.remainder, ib)))
}

fn mod_ramp_stride(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    if !no_overflow(op.ty()) {
        return None;
    }
    let (base, stride, lanes) = op.a.as_ramp()?;
    let (value, _) = op.b.as_broadcast()?;
    let (ia, ib) = (const_int(stride)?, const_int(value)?);
    // ramp(x, 4, w) % broadcast(2, w) -> broadcast(x % 2, w)
    (ia.checked_rem(ib)? == 0).then(|| s.mutate(&Expr::make_broadcast(base % value, lanes)))
}

fn mod_ramp_aligned(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (base, ia, lanes, ib) = ramp_over_constant(op)?;
    let remainder = ramp_within_one_multiple(s, base, ia, lanes, ib)?;
    // ramp(k*z + x, y, w) % z -> ramp(x, y, w) when no lane crosses a multiple of z
    let (_, stride, _) = op.a.as_ramp()?;
    let new_base = make_const(base.ty(), mod_imp(remainder, ib));
    Some(s.mutate(&Expr::make_ramp(new_base, stride.clone(), lanes)))
}

fn mod_ramp_base(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (base, _, lanes, ib) = ramp_over_constant(op)?;
    if is_const(base) {
        return None;
    }
    let fact = s.modulus_remainder(base);
    if fact.modulus.checked_rem(ib)? != 0 {
        return None;
    }
    // ramp(k*z + x, y, w) % z -> ramp(x, y, w) % z
    let (_, stride, _) = op.a.as_ramp()?;
    let new_base = make_const(base.ty(), mod_imp(fact.remainder, ib));
    Some(s.mutate(&(Expr::make_ramp(new_base, stride.clone(), lanes) % &op.b)))
}

#[cfg(test)]
mod tests {
    use crate::{
        interval::Interval,
        modulus_remainder::ModulusRemainder,
        simplify::{simplify, simplify_expr},
    };
    use ir_core::{ir_operator::*, Expr, Scope, Type, Var};

    fn x() -> Expr {
        Expr::variable(Type::int(32), "x")
    }

    #[test]
    fn test_mul_constants() {
        let x = x();
        assert_eq!(simplify_expr(&(3 * &x)), &x * 3);
        assert_eq!(simplify_expr(&((&x * 3) * 4)), &x * 12);
        assert_eq!(simplify_expr(&((&x + 2) * 3)), &x * 3 + 6);
        assert_eq!(simplify_expr(&(&x * 1)), x.clone());
        assert!(is_zero(&simplify_expr(&(&x * 0))));
        let big = make_const(Type::int(32), 1 << 20);
        assert!(simplify_expr(&(&big * (1 << 12))).is_poison());
    }

    #[test]
    fn test_div_euclidean_folding() {
        let c = |v: i64| make_const(Type::int(32), v);
        assert_eq!(as_const_int(&simplify_expr(&(c(-7) / c(2)))), Some(-4));
        assert_eq!(as_const_int(&simplify_expr(&(c(-7) % c(2)))), Some(1));
        assert_eq!(as_const_int(&simplify_expr(&(c(7) / c(-2)))), Some(-3));
        assert_eq!(as_const_int(&simplify_expr(&(c(7) % c(-2)))), Some(1));
        let min = c(i32::MIN as i64);
        assert!(simplify_expr(&(&min / c(-1))).is_poison());
    }

    #[test]
    fn test_division_by_zero_is_indeterminate() {
        let x = x();
        let r = simplify_expr(&(&x / 0));
        assert!(r.is_indeterminate());
        assert!(simplify_expr(&(&x % 0)).is_indeterminate());
        assert!(simplify_expr(&((&x / 0) * 0 + 1)).is_indeterminate());
        // Float division by zero is left to IEEE semantics.
        let f = Expr::variable(Type::float(32), "f");
        assert!(!simplify_expr(&(&f / 0.0f32)).is_indeterminate());
    }

    #[test]
    fn test_div_pulls_out_multiples() {
        let x = x();
        let y = Expr::variable(Type::int(32), "y");
        assert_eq!(simplify_expr(&((&x * 4 + &y) / 2)), &x * 2 + &y / 2);
        assert_eq!(simplify_expr(&((&x * 2) / 4)), &x / 2);
        assert_eq!(simplify_expr(&((&x / 3) / 4)), &x / 12);
        assert_eq!(simplify_expr(&((&x + 8) / 2)), &x / 2 + 4);
        assert_eq!(simplify_expr(&((&x * &y) / &y)), x.clone());
    }

    #[test]
    fn test_round_trip_of_quotient_and_remainder() {
        let x = x();
        assert_eq!(simplify_expr(&((&x / 8) * 8 + &x % 8)), x.clone());
        assert!(is_zero(&simplify_expr(&((&x * 6) % 3))));
        assert_eq!(simplify_expr(&((&x * 6 + 5) % 3)), make_const(Type::int(32), 2));
    }

    #[test]
    fn test_ramp_division() {
        let x = x();
        let e = ramp(&x, 4, 4) / broadcast(2, 4);
        assert_eq!(simplify_expr(&e), ramp(&x / 2, 2, 4));
        let e = ramp(&x * 8, 1, 4) / broadcast(8, 4);
        assert_eq!(simplify_expr(&e), broadcast(&x, 4));
        let e = ramp(&x * 8 + 3, 1, 4) % broadcast(8, 4);
        assert_eq!(simplify_expr(&e), ramp(3, 1, 4));
    }

    #[test]
    fn test_bounds_and_alignment_facts() {
        let v = Var::new("v");
        let ve = v.to_expr(Type::int(32));
        let mut bounds = Scope::new();
        bounds.push(v.clone(), Interval::new(0, 7));
        let alignment = Scope::new();
        assert_eq!(simplify(&(&ve / 8), true, &bounds, &alignment), make_zero(Type::int(32)));
        assert_eq!(simplify(&(&ve % 8), true, &bounds, &alignment), ve.clone());

        let bounds = Scope::new();
        let mut alignment = Scope::new();
        alignment.push(v, ModulusRemainder::new(4, 1));
        assert_eq!(
            simplify(&(&ve % 2), true, &bounds, &alignment),
            make_one(Type::int(32))
        );
    }
}
