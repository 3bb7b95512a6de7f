// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Rules for comparisons.
//!
//! Equality is decided on `a - b`, which brings both sides into the additive
//! normal form the other rules produce. `<` is the only ordering with rules
//! of its own; `<=`, `>` and `>=` are rewritten in terms of it.

use super::{
    const_int, const_uint, is_simple_const, no_overflow, no_overflow_scalar_int,
    propagate_markers, Binary, Rule, Simplifier,
};
use crate::modulus_remainder::ModulusRemainder;
use ir_core::{
    ir_operator::{
        and, as_const_float, const_false, const_true, is_const, is_negative_const, is_one,
        is_positive_const, is_zero, lt, make_bool, make_const, make_one, make_zero, or,
    },
    Expr, ExprKind,
};

// ----------------------------------------------------------------------------------
// Equality

struct Equality {
    /// The comparison being simplified, before its operands were.
    op: Expr,
    delta: Expr,
}

impl Equality {
    fn lanes(&self) -> u16 {
        self.op.ty().lanes()
    }

    fn zero(&self) -> Expr {
        make_zero(self.delta.ty())
    }
}

pub(super) fn visit_eq(s: &mut Simplifier, e: &Expr, a: &Expr, b: &Expr) -> Expr {
    let delta = s.mutate(&(a - b));
    if let Some(marker) = propagate_markers(e.ty(), &[&delta]) {
        return marker;
    }
    let args = Equality {
        op: e.clone(),
        delta,
    };
    s.apply_rules("EQ", EQ_RULES, &args)
        .unwrap_or_else(|| Expr::make_eq(args.delta.clone(), args.zero()))
}

const EQ_RULES: &[Rule<Equality>] = &[
    ("zero", eq_zero),
    ("constant", eq_constant),
    ("alignment", eq_alignment),
    ("bounds", eq_bounds),
    ("broadcast", eq_broadcast),
    ("add_constant", eq_add_constant),
    ("sub", eq_sub),
    ("mul", eq_mul),
    ("select", eq_select),
];

fn eq_zero(_: &mut Simplifier, args: &Equality) -> Option<Expr> {
    is_zero(&args.delta).then(|| const_true(args.lanes()))
}

/// Whether each lane of a constant is zero, when every lane can be read.
fn zero_lanes(e: &Expr) -> Option<Vec<bool>> {
    let lanes = usize::from(e.ty().lanes());
    match e.kind() {
        ExprKind::IntImm(_) | ExprKind::UIntImm(_) | ExprKind::FloatImm(_) => {
            Some(vec![is_zero(e)])
        },
        ExprKind::Broadcast { value, .. } => {
            let zero = *zero_lanes(value)?.first()?;
            Some(vec![zero; lanes])
        },
        ExprKind::Ramp { base, stride, .. } => {
            if let (Some(base), Some(stride)) = (const_int(base), const_int(stride)) {
                let (base, stride) = (i128::from(base), i128::from(stride));
                return Some((0..lanes as i128).map(|i| base + stride * i == 0).collect());
            }
            let (base, stride) = (as_const_float(base)?, as_const_float(stride)?);
            Some((0..lanes).map(|i| base + stride * i as f64 == 0.0).collect())
        },
        _ => None,
    }
}

fn eq_constant(_: &mut Simplifier, args: &Equality) -> Option<Expr> {
    if !is_const(&args.delta) {
        return None;
    }
    let zeros = zero_lanes(&args.delta)?;
    if zeros.iter().all(|&z| z) {
        Some(const_true(args.lanes()))
    } else if zeros.iter().all(|&z| !z) {
        Some(const_false(args.lanes()))
    } else {
        None
    }
}

fn eq_alignment(s: &mut Simplifier, args: &Equality) -> Option<Expr> {
    if !no_overflow_scalar_int(args.delta.ty()) {
        return None;
    }
    // A nonzero remainder rules out zero.
    let mr = s.modulus_remainder(&args.delta);
    (mr.remainder != 0).then(|| const_false(1))
}

fn eq_bounds(s: &mut Simplifier, args: &Equality) -> Option<Expr> {
    if !no_overflow_scalar_int(args.delta.ty()) {
        return None;
    }
    let (min, max) = s.const_int_bounds(&args.delta)?;
    (min > 0 || max < 0).then(|| const_false(1))
}

fn eq_broadcast(s: &mut Simplifier, args: &Equality) -> Option<Expr> {
    let (value, lanes) = args.delta.as_broadcast()?;
    let scalar = Expr::make_eq(value.clone(), make_zero(value.ty()));
    Some(Expr::make_broadcast(s.mutate(&scalar), lanes))
}

fn eq_add_constant(s: &mut Simplifier, args: &Equality) -> Option<Expr> {
    let (x, c) = args.delta.as_add()?;
    if !is_const(c) {
        return None;
    }
    // x + c == 0 -> x == -c
    let negated = s.mutate(&(args.zero() - c));
    Some(Expr::make_eq(x.clone(), negated))
}

fn eq_sub(_: &mut Simplifier, args: &Equality) -> Option<Expr> {
    let (x, y) = args.delta.as_sub()?;
    if is_const(x) {
        // c - y == 0 -> y == c
        return Some(Expr::make_eq(y.clone(), x.clone()));
    }
    match args.op.as_eq() {
        Some((a, b)) if a.same_as(x) && b.same_as(y) => Some(args.op.clone()),
        _ => Some(Expr::make_eq(x.clone(), y.clone())),
    }
}

fn eq_mul(s: &mut Simplifier, args: &Equality) -> Option<Expr> {
    let (x, y) = args.delta.as_mul()?;
    // Narrow types wrap, so a product can be zero without either factor being zero.
    if !no_overflow(args.delta.ty()) {
        return None;
    }
    let zero = args.zero();
    let either = Expr::make_or(
        Expr::make_eq(x.clone(), zero.clone()),
        Expr::make_eq(y.clone(), zero),
    );
    Some(s.mutate(&either))
}

fn eq_select(s: &mut Simplifier, args: &Equality) -> Option<Expr> {
    let (c, t, f) = args.delta.as_select()?;
    let zero = args.zero();
    let nonzero = |e: &Expr| is_positive_const(e) || is_negative_const(e);
    let rewritten = if is_zero(t) {
        // select(c, 0, f) == 0 -> c || f == 0
        or(c.clone(), Expr::make_eq(f.clone(), zero))
    } else if nonzero(t) {
        // select(c, 4, f) == 0 -> !c && f == 0
        and(Expr::make_not(c.clone()), Expr::make_eq(f.clone(), zero))
    } else if is_zero(f) {
        // select(c, t, 0) == 0 -> !c || t == 0
        or(Expr::make_not(c.clone()), Expr::make_eq(t.clone(), zero))
    } else if nonzero(f) {
        // select(c, t, 4) == 0 -> c && t == 0
        and(c.clone(), Expr::make_eq(t.clone(), zero))
    } else {
        return None;
    };
    Some(s.mutate(&rewritten))
}

pub(super) fn visit_ne(s: &mut Simplifier, _: &Expr, a: &Expr, b: &Expr) -> Expr {
    s.mutate(&Expr::make_not(Expr::make_eq(a.clone(), b.clone())))
}

// ----------------------------------------------------------------------------------
// Ordering

struct Comparison {
    op: Binary,
    delta: Expr,
    /// Alignment of the base of `delta`, when `delta` is a ramp.
    delta_base: ModulusRemainder,
}

impl Comparison {
    fn lanes(&self) -> u16 {
        self.op.ty().lanes()
    }
}

pub(super) fn visit_lt(s: &mut Simplifier, e: &Expr, a: &Expr, b: &Expr) -> Expr {
    let a = s.mutate(a);
    let b = s.mutate(b);
    if let Some(marker) = propagate_markers(e.ty(), &[&a, &b]) {
        return marker;
    }
    let lanes = e.ty().lanes();
    if let (Some((a_min, a_max)), Some((b_min, b_max))) =
        (s.const_int_bounds(&a), s.const_int_bounds(&b))
    {
        if a_max < b_min {
            return const_true(lanes);
        }
        if a_min >= b_max {
            return const_false(lanes);
        }
    }

    let delta = s.mutate(&(&a - &b));
    let delta_base = match delta.as_ramp() {
        Some((base, _, _)) if no_overflow_scalar_int(base.ty()) => s.modulus_remainder(base),
        _ => ModulusRemainder::unknown(),
    };
    let args = Comparison {
        op: Binary::new(e, a, b),
        delta,
        delta_base,
    };
    if let Some(result) = s.apply_rules("LT", LT_RULES, &args) {
        return result;
    }
    // Moving terms between the sides is only valid when nothing wraps.
    if no_overflow(args.delta.ty()) {
        if let Some(result) = s.apply_rules("LT", LT_ORDER_RULES, &args) {
            return result;
        }
    }
    args.op.rebuild(Expr::make_lt)
}

const LT_RULES: &[Rule<Comparison>] = &[
    ("fold", lt_fold),
    ("type_limits", lt_type_limits),
    ("delta_sign", lt_delta_sign),
    ("broadcasts", lt_broadcasts),
];

const LT_ORDER_RULES: &[Rule<Comparison>] = &[
    ("ramps", lt_ramps),
    ("cancel_terms", lt_cancel_terms),
    ("move_terms", lt_move_terms),
    ("scale", lt_scale),
    ("split_extremum", lt_split_extremum),
    ("rounded_down", lt_rounded_down),
    ("delta_ramp", lt_delta_ramp),
    ("delta_ramp_alignment", lt_delta_ramp_alignment),
];

fn lt_fold(_: &mut Simplifier, args: &Comparison) -> Option<Expr> {
    let (a, b) = (&args.op.a, &args.op.b);
    if let (Some(ia), Some(ib)) = (const_int(a), const_int(b)) {
        return Some(make_bool(ia < ib, args.lanes()));
    }
    let (ua, ub) = (const_uint(a)?, const_uint(b)?);
    Some(make_bool(ua < ub, args.lanes()))
}

fn lt_type_limits(_: &mut Simplifier, args: &Comparison) -> Option<Expr> {
    let (a, b) = (&args.op.a, &args.op.b);
    // Nothing is above the type's maximum or below its minimum.
    let a_is_max = const_int(a).is_some_and(|ia| a.ty().is_max(ia));
    let b_is_min = const_int(b).is_some_and(|ib| b.ty().is_min(ib));
    (a_is_max || b_is_min).then(|| const_false(args.lanes()))
}

fn lt_delta_sign(_: &mut Simplifier, args: &Comparison) -> Option<Expr> {
    let delta = &args.delta;
    let exact = no_overflow(delta.ty());
    if is_zero(delta) || (exact && is_positive_const(delta)) {
        Some(const_false(args.lanes()))
    } else if exact && is_negative_const(delta) {
        Some(const_true(args.lanes()))
    } else {
        None
    }
}

fn lt_broadcasts(s: &mut Simplifier, args: &Comparison) -> Option<Expr> {
    let ((va, lanes), (vb, _)) = (args.op.a.as_broadcast()?, args.op.b.as_broadcast()?);
    let scalar = Expr::make_lt(va.clone(), vb.clone());
    Some(s.mutate(&Expr::make_broadcast(scalar, lanes)))
}

fn lt_ramps(s: &mut Simplifier, args: &Comparison) -> Option<Expr> {
    let (base_a, stride_a, lanes) = args.op.a.as_ramp()?;
    let (base_b, stride_b, _) = args.op.b.as_ramp()?;
    if stride_a != stride_b {
        return None;
    }
    let bases = Expr::make_lt(base_a.clone(), base_b.clone());
    Some(s.mutate(&Expr::make_broadcast(bases, lanes)))
}

fn lt_cancel_terms(s: &mut Simplifier, args: &Comparison) -> Option<Expr> {
    let (a, b) = (&args.op.a, &args.op.b);
    if let (Some((aa, ab)), Some((ba, bb))) = (a.as_add(), b.as_add()) {
        // Subtract a common term from both sides.
        let pair = if aa == ba {
            Some((ab, bb))
        } else if aa == bb {
            Some((ab, ba))
        } else if ab == ba {
            Some((aa, bb))
        } else if ab == bb {
            Some((aa, ba))
        } else {
            None
        };
        if let Some((x, y)) = pair {
            return Some(s.mutate(&Expr::make_lt(x.clone(), y.clone())));
        }
    }
    let ((aa, ab), (ba, bb)) = (a.as_sub()?, b.as_sub()?);
    if aa == ba {
        // c - x < c - y -> y < x
        Some(s.mutate(&Expr::make_lt(bb.clone(), ab.clone())))
    } else if ab == bb {
        Some(s.mutate(&Expr::make_lt(aa.clone(), ba.clone())))
    } else {
        None
    }
}

fn lt_move_terms(s: &mut Simplifier, args: &Comparison) -> Option<Expr> {
    let (a, b) = (&args.op.a, &args.op.b);
    // Gather every add and sub on the right hand side.
    if let Some((x, y)) = a.as_add() {
        return Some(s.mutate(&Expr::make_lt(x.clone(), b - y)));
    }
    if let Some((x, y)) = a.as_sub() {
        return Some(s.mutate(&Expr::make_lt(x.clone(), b + y)));
    }
    if let Some((x, y)) = b.as_add() {
        if x == a {
            return Some(s.mutate(&Expr::make_lt(make_zero(y.ty()), y.clone())));
        }
        if y == a {
            return Some(s.mutate(&Expr::make_lt(make_zero(x.ty()), x.clone())));
        }
        if is_simple_const(a) && is_simple_const(y) {
            // c1 < x + c2 -> c1 - c2 < x
            return Some(s.mutate(&Expr::make_lt(a - y, x.clone())));
        }
    }
    let (x, y) = b.as_sub()?;
    if x == a {
        return Some(s.mutate(&Expr::make_lt(y.clone(), make_zero(y.ty()))));
    }
    if is_const(a) && is_const(x) && !is_const(y) {
        // c1 < c2 - y -> y < c2 - c1
        return Some(s.mutate(&Expr::make_lt(y.clone(), x - a)));
    }
    None
}

fn lt_scale(s: &mut Simplifier, args: &Comparison) -> Option<Expr> {
    let (a, b) = (&args.op.a, &args.op.b);
    let ty = a.ty();
    let (mul_a, mul_b) = (a.as_mul(), b.as_mul());
    if let (Some((x, c1)), Some((y, c2))) = (mul_a, mul_b) {
        if is_positive_const(c1) && is_positive_const(c2) && c1 == c2 {
            // Divide both sides by a positive constant.
            return Some(s.mutate(&Expr::make_lt(x.clone(), y.clone())));
        }
    }
    if let Some((x, c1)) = mul_a {
        if is_positive_const(c1) && is_const(b) {
            let bound = if ty.is_int() {
                // x * c1 < c2 <=> x < (c2 - 1) / c1 + 1
                (b - 1) / c1 + 1
            } else {
                b / c1
            };
            return Some(s.mutate(&Expr::make_lt(x.clone(), bound)));
        }
    }
    if let Some((y, c2)) = mul_b {
        if is_positive_const(c2) && is_const(a) {
            // c1 < y * c2 <=> c1 / c2 < y
            return Some(s.mutate(&Expr::make_lt(a / c2, y.clone())));
        }
    }
    if !ty.is_int() {
        return None;
    }
    if let Some((x, c1)) = a.as_div() {
        if is_positive_const(c1) && is_const(b) {
            // x / c1 < c2 <=> x < c1 * c2
            return Some(s.mutate(&Expr::make_lt(x.clone(), c1 * b)));
        }
    }
    let (y, c2) = b.as_div()?;
    if is_positive_const(c2) && is_const(a) {
        // c1 < y / c2 <=> (c1 + 1) * c2 - 1 < y
        let one = make_one(ty);
        let bound = (a + &one) * c2 - one;
        return Some(s.mutate(&Expr::make_lt(bound, y.clone())));
    }
    None
}

fn lt_split_extremum(s: &mut Simplifier, args: &Comparison) -> Option<Expr> {
    let (a, b) = (&args.op.a, &args.op.b);
    let lt_of = |x: &Expr, y: &Expr| Expr::make_lt(x.clone(), y.clone());
    // (min(x, y) < b) <=> (x < b || y < b), and likewise for the other three shapes.
    let (first, second, join): (Expr, Expr, fn(Expr, Expr) -> Expr) =
        if let Some((x, y)) = a.as_min() {
            (lt_of(x, b), lt_of(y, b), Expr::make_or)
        } else if let Some((x, y)) = a.as_max() {
            (lt_of(x, b), lt_of(y, b), Expr::make_and)
        } else if let Some((x, y)) = b.as_min() {
            (lt_of(a, x), lt_of(a, y), Expr::make_and)
        } else if let Some((x, y)) = b.as_max() {
            (lt_of(a, x), lt_of(a, y), Expr::make_or)
        } else {
            return None;
        };
    let first = s.mutate(&first);
    let second = s.mutate(&second);
    if is_const(&first) || is_const(&second) {
        Some(s.mutate(&join(first, second)))
    } else {
        Some(args.op.rebuild(Expr::make_lt))
    }
}

/// If `e` is `(x / k) * k` for a positive constant `k`, the `x` and the `k`.
fn rounded_down(e: &Expr) -> Option<(&Expr, &Expr, i64)> {
    let (q, k) = e.as_mul()?;
    let (x, d) = q.as_div()?;
    let (id, ik) = (const_int(d)?, const_int(k)?);
    (id > 0 && id == ik).then_some((x, d, id))
}

fn lt_rounded_down(s: &mut Simplifier, args: &Comparison) -> Option<Expr> {
    let (a, b) = (&args.op.a, &args.op.b);
    let ty = a.ty();
    let (x, k, ik) = rounded_down(a)?;
    let zero = || make_zero(ty);
    // Subtract the rounded value from both sides.
    if x == b {
        // (x/k)*k < x -> 0 < x % k
        return Some(s.mutate(&Expr::make_lt(zero(), b % make_const(ty, ik))));
    }
    if let Some((y, z)) = b.as_add() {
        if x == y {
            // (x/k)*k < x + z -> 0 < x % k + z
            return Some(s.mutate(&Expr::make_lt(zero(), y % k + z)));
        }
    }
    if let Some((y, z)) = b.as_sub() {
        if x == y {
            // (x/k)*k < x - z -> z < x % k
            return Some(s.mutate(&Expr::make_lt(z.clone(), y % k)));
        }
    }
    let (inner, c) = x.as_add()?;
    let ic = const_int(c)?;
    if inner == b {
        // ((x + c)/k)*k < x -> c < (x + c) % k
        return Some(s.mutate(&Expr::make_lt(c.clone(), x % k)));
    }
    if let Some((y, z)) = b.as_add() {
        if inner == y {
            // ((x + c)/k)*k < x + z -> c < (x + c) % k + z
            return Some(s.mutate(&Expr::make_lt(c.clone(), x % k + z)));
        }
    }
    let (y, z) = b.as_sub()?;
    if inner != y {
        return None;
    }
    // ((x + c)/k)*k < x - z -> z < (x + c) % k - c
    let negated = make_const(ty, ic.checked_neg()?);
    Some(s.mutate(&Expr::make_lt(z.clone(), x % k + negated)))
}

fn lt_delta_ramp(s: &mut Simplifier, args: &Comparison) -> Option<Expr> {
    let (base, stride, lanes) = args.delta.as_ramp()?;
    let last = || base + stride * (i32::from(lanes) - 1);
    let holds = |s: &mut Simplifier, e: Expr| is_one(&s.mutate(&e));
    if is_positive_const(stride) {
        if holds(s, lt(last(), 0)) {
            return Some(const_true(lanes));
        }
        if holds(s, Expr::make_not(lt(base, 0))) {
            return Some(const_false(lanes));
        }
    } else if is_negative_const(stride) {
        if holds(s, lt(base, 0)) {
            return Some(const_true(lanes));
        }
        if holds(s, Expr::make_not(lt(last(), 0))) {
            return Some(const_false(lanes));
        }
    }
    None
}

fn lt_delta_ramp_alignment(s: &mut Simplifier, args: &Comparison) -> Option<Expr> {
    let (base, stride, lanes) = args.delta.as_ramp()?;
    let ModulusRemainder { modulus, remainder } = args.delta_base;
    if modulus <= 0 {
        return None;
    }
    let stride = i128::from(const_int(stride)?);
    let span = stride * (i128::from(lanes) - 1) + i128::from(remainder);
    if !(0 <= span && span < i128::from(modulus)) {
        return None;
    }
    // Every lane falls in the same multiple of the modulus as the base does.
    let quotient = base / make_const(base.ty(), modulus);
    let scalar = Expr::make_lt(quotient, make_zero(base.ty()));
    Some(Expr::make_broadcast(s.mutate(&scalar), lanes))
}

pub(super) fn visit_le(s: &mut Simplifier, _: &Expr, a: &Expr, b: &Expr) -> Expr {
    s.mutate(&Expr::make_not(Expr::make_lt(b.clone(), a.clone())))
}

pub(super) fn visit_gt(s: &mut Simplifier, _: &Expr, a: &Expr, b: &Expr) -> Expr {
    s.mutate(&Expr::make_lt(b.clone(), a.clone()))
}

pub(super) fn visit_ge(s: &mut Simplifier, _: &Expr, a: &Expr, b: &Expr) -> Expr {
    s.mutate(&Expr::make_not(Expr::make_lt(a.clone(), b.clone())))
}

#[cfg(test)]
mod tests {
    use crate::{interval::Interval, modulus_remainder::ModulusRemainder, simplify::*};
    use ir_core::{ir_operator::*, Expr, Scope, Type, Var};

    fn x() -> Expr {
        Expr::variable(Type::int(32), "x")
    }

    fn y() -> Expr {
        Expr::variable(Type::int(32), "y")
    }

    #[test]
    fn test_equality_of_constants() {
        let x = x();
        assert!(is_one(&simplify_expr(&eq(&x, &x))));
        assert!(is_one(&simplify_expr(&eq(3, 3))));
        assert!(is_zero(&simplify_expr(&eq(3, 4))));
        assert!(is_zero(&simplify_expr(&eq(&x + 1, &x))));
        assert!(is_zero(&simplify_expr(&ne(&x, &x))));
        assert!(is_one(&simplify_expr(&eq(ramp(&x, 1, 4), ramp(&x, 1, 4)))));
    }

    #[test]
    fn test_equality_normal_form() {
        let (x, y) = (x(), y());
        assert_eq!(simplify_expr(&eq(&x + 3, 5)), eq(&x, 2));
        assert_eq!(simplify_expr(&eq(&x, &y)), eq(&x, &y));
        assert_eq!(simplify_expr(&eq(&x * &y, 0)), or(eq(&x, 0), eq(&y, 0)));
    }

    #[test]
    fn test_equality_disproved_by_alignment() {
        let x = x();
        assert!(is_zero(&simplify_expr(&eq(&x * 2, 7))));
        assert!(is_zero(&simplify_expr(&eq(&x * 4 + 1, &x * 4 + 2))));
    }

    #[test]
    fn test_orderings_reduce_to_less_than() {
        let (x, y) = (x(), y());
        assert_eq!(simplify_expr(&gt(&x, &y)), lt(&y, &x));
        // Negated less-than comes back as less-or-equal with the sides swapped.
        assert_eq!(simplify_expr(&le(&x, &y)), le(&x, &y));
        assert_eq!(simplify_expr(&ge(&x, &y)), le(&y, &x));
        assert_eq!(simplify_expr(&ne(&x, &y)), ne(&x, &y));
        assert!(is_zero(&simplify_expr(&lt(&x, &x))));
        assert!(is_one(&simplify_expr(&le(&x, &x))));
        assert!(is_one(&simplify_expr(&lt(&x, &x + 1))));
        assert!(is_zero(&simplify_expr(&lt(type_max(Type::int(32)), &x))));
        assert!(is_zero(&simplify_expr(&lt(&x, type_min(Type::int(32))))));
    }

    #[test]
    fn test_terms_move_to_one_side() {
        let (x, y) = (x(), y());
        let z = Expr::variable(Type::int(32), "z");
        assert_eq!(simplify_expr(&lt(&x + &z, &y + &z)), lt(&x, &y));
        assert_eq!(simplify_expr(&lt(&x + 3, 10)), lt(&x, 7));
        assert_eq!(simplify_expr(&lt(&x * 4, &y * 4)), lt(&x, &y));
        assert_eq!(simplify_expr(&lt(&x * 4, 10)), lt(&x, 3));
        assert_eq!(simplify_expr(&lt(&x / 4, 3)), lt(&x, 12));
        assert_eq!(simplify_expr(&lt(3, &y / 4)), lt(15, &y));
    }

    #[test]
    fn test_split_extremum_when_one_side_is_known() {
        let (x, y) = (x(), y());
        // min(x, 3) < 5 is always true because 3 < 5.
        assert!(is_one(&simplify_expr(&lt(min(&x, 3), 5))));
        assert_eq!(simplify_expr(&lt(max(&x, 3), 5)), lt(&x, 5));
        assert_eq!(simplify_expr(&lt(min(&x, &y), 5)), lt(min(&x, &y), 5));
    }

    #[test]
    fn test_bounds_decide_comparisons() {
        let v = Var::new("v");
        let ve = v.to_expr(Type::int(32));
        let mut bounds = Scope::new();
        bounds.push(v, Interval::new(0, 10));
        let alignment = Scope::new();
        assert!(is_one(&simplify(&lt(&ve, 11), true, &bounds, &alignment)));
        assert!(is_zero(&simplify(&lt(&ve, 0), true, &bounds, &alignment)));
        assert!(is_zero(&simplify(&eq(&ve, 20), true, &bounds, &alignment)));
        let e = lt(&ve, 5);
        assert_eq!(simplify(&e, true, &bounds, &alignment), e);
    }

    #[test]
    fn test_alignment_decides_ramp_comparison() {
        let v = Var::new("v");
        let ve = v.to_expr(Type::int(32));
        let bounds = Scope::new();
        let mut alignment = Scope::new();
        alignment.push(v, ModulusRemainder::new(8, 0));
        // Lanes 0..3 of a ramp based on a multiple of 8 share the sign of the base.
        let e = lt(ramp(&ve, 1, 4), broadcast(0, 4));
        let result = simplify(&e, true, &bounds, &alignment);
        assert_eq!(result, broadcast(lt(&ve, 0), 4));
    }

    #[test]
    fn test_vector_comparisons() {
        let x = x();
        assert!(is_one(&simplify_expr(&lt(ramp(0, 1, 4), broadcast(4, 4)))));
        assert_eq!(
            simplify_expr(&lt(broadcast(&x, 4), broadcast(3, 4))),
            broadcast(lt(&x, 3), 4)
        );
        assert_eq!(
            simplify_expr(&lt(ramp(&x, 2, 4), ramp(3, 2, 4))),
            broadcast(lt(&x, 3), 4)
        );
    }

    #[test]
    fn test_comparison_of_poison_is_poison() {
        let p = Expr::make_poison(Type::int(32));
        let e = simplify_expr(&lt(&p, 3));
        assert!(e.is_poison());
        assert_eq!(e.ty(), Type::boolean());
        assert!(simplify_expr(&eq(&p, &p)).is_poison());
    }
}
