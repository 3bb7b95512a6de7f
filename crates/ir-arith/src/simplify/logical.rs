// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Rules for `&&`, `||`, `!` and `select`.

use super::{
    const_int, is_simple_const, propagate_markers, var_simple_const_comparison, Binary, Rule,
    Simplifier,
};
use ir_core::{
    ir::intrinsic,
    ir_operator::{and, const_false, const_true, is_one, is_zero, make_one, make_zero, or},
    substitute::substitute,
    visitor::expr_uses_var,
    Expr, Var,
};

/// The integer range a comparison against a constant allows for `x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    /// `x <= bound`
    Upper(i128),
    /// `bound <= x`
    Lower(i128),
}

/// Reads `x < k`, `k < x`, `x <= k` and `k <= x` as a one-sided bound on `x`.
fn one_sided_bound(e: &Expr) -> Option<(&Expr, Side)> {
    if let Some((a, b)) = e.as_lt() {
        if let Some(k) = const_int(b) {
            return Some((a, Side::Upper(i128::from(k) - 1)));
        }
        let k = const_int(a)?;
        return Some((b, Side::Lower(i128::from(k) + 1)));
    }
    let (a, b) = e.as_le()?;
    if let Some(k) = const_int(b) {
        return Some((a, Side::Upper(i128::from(k))));
    }
    let k = const_int(a)?;
    Some((b, Side::Lower(i128::from(k))))
}

/// The bounds `a` and `b` put on one expression, as `(lower, upper)`.
fn opposite_bounds(a: &Expr, b: &Expr) -> Option<(i128, i128)> {
    let (x, side_a) = one_sided_bound(a)?;
    let (y, side_b) = one_sided_bound(b)?;
    if x != y {
        return None;
    }
    match (side_a, side_b) {
        (Side::Upper(upper), Side::Lower(lower)) | (Side::Lower(lower), Side::Upper(upper)) => {
            Some((lower, upper))
        },
        _ => None,
    }
}

/// Whether one operand is `x == y` and the other `x != y`, in either order.
fn eq_and_ne(a: &Expr, b: &Expr) -> bool {
    let check = |eq: &Expr, ne: &Expr| match (eq.as_eq(), ne.as_ne()) {
        (Some((p, q)), Some((r, s))) => (p == r && q == s) || (p == s && q == r),
        _ => false,
    };
    check(a, b) || check(b, a)
}

/// Whether one operand is the negation of the other.
fn complementary(a: &Expr, b: &Expr) -> bool {
    let negates = |n: &Expr, e: &Expr| n.as_not().is_some_and(|inner| inner == e);
    let flips = |le: &Expr, lt: &Expr| match (le.as_le(), lt.as_lt()) {
        // a <= b against b < a
        (Some((p, q)), Some((r, s))) => p == s && q == r,
        _ => false,
    };
    negates(a, b) || negates(b, a) || flips(a, b) || flips(b, a)
}

// ----------------------------------------------------------------------------------
// And

pub(super) fn visit_and(s: &mut Simplifier, e: &Expr, a: &Expr, b: &Expr) -> Expr {
    let a = s.mutate(a);
    let b = s.mutate(b);
    if let Some(marker) = propagate_markers(e.ty(), &[&a, &b]) {
        return marker;
    }
    let op = Binary::new(e, a, b);
    s.apply_rules("And", AND_RULES, &op)
        .unwrap_or_else(|| op.rebuild(Expr::make_and))
}

const AND_RULES: &[Rule<Binary>] = &[
    ("constants", and_constants),
    ("equal", and_equal),
    ("merge_bounds", and_merge_bounds),
    ("contradiction", and_contradiction),
    ("empty_range", and_empty_range),
    ("eq_ne_constants", and_eq_ne_constants),
    ("substitute_eq", and_substitute_eq),
    ("broadcasts", and_broadcasts),
    ("substitute_var", and_substitute_var),
];

fn and_constants(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    if is_one(a) {
        Some(b.clone())
    } else if is_one(b) || is_zero(a) {
        Some(a.clone())
    } else if is_zero(b) {
        Some(b.clone())
    } else {
        None
    }
}

fn and_equal(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    (op.a == op.b).then(|| op.a.clone())
}

fn and_merge_bounds(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    if let (Some((x, p)), Some((y, q))) = (a.as_le(), b.as_le()) {
        if x == y {
            // x <= p && x <= q -> x <= min(p, q)
            let merged = Expr::make_le(x.clone(), Expr::make_min(p.clone(), q.clone()));
            return Some(s.mutate(&merged));
        }
        if p == q {
            // x <= p && y <= p -> max(x, y) <= p
            let merged = Expr::make_le(Expr::make_max(x.clone(), y.clone()), p.clone());
            return Some(s.mutate(&merged));
        }
    }
    let ((x, p), (y, q)) = (a.as_lt()?, b.as_lt()?);
    if x == y {
        // x < p && x < q -> x < min(p, q)
        let merged = Expr::make_lt(x.clone(), Expr::make_min(p.clone(), q.clone()));
        Some(s.mutate(&merged))
    } else if p == q {
        // x < p && y < p -> max(x, y) < p
        let merged = Expr::make_lt(Expr::make_max(x.clone(), y.clone()), p.clone());
        Some(s.mutate(&merged))
    } else {
        None
    }
}

fn and_contradiction(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    (eq_and_ne(&op.a, &op.b) || complementary(&op.a, &op.b))
        .then(|| const_false(op.ty().lanes()))
}

fn and_empty_range(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    // No integer lies between the two bounds.
    let (lower, upper) = opposite_bounds(&op.a, &op.b)?;
    (lower > upper).then(|| const_false(op.ty().lanes()))
}

fn and_eq_ne_constants(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    if let (Some((x, k1)), Some((y, k2))) = (a.as_eq(), b.as_ne()) {
        if x == y && is_simple_const(k1) && is_simple_const(k2) {
            // (x == k1) && (x != k2) -> (x == k1) && (k1 != k2)
            let folded = Expr::make_and(a.clone(), Expr::make_ne(k1.clone(), k2.clone()));
            return Some(s.mutate(&folded));
        }
    }
    let ((x, k1), (y, k2)) = (a.as_ne()?, b.as_eq()?);
    if x == y && is_simple_const(k1) && is_simple_const(k2) {
        // (x != k1) && (x == k2) -> (x == k2) && (k1 != k2)
        let folded = Expr::make_and(b.clone(), Expr::make_ne(k1.clone(), k2.clone()));
        Some(s.mutate(&folded))
    } else {
        None
    }
}

fn and_substitute_eq(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    // Within `x == k && b`, every x in b is k.
    fn fact(e: &Expr) -> Option<(&Var, &Expr)> {
        let (x, k) = e.as_eq()?;
        let var = x.as_variable()?;
        is_simple_const(k).then_some((var, k))
    }
    if let Some((var, k)) = fact(a) {
        if expr_uses_var(b, var) {
            let rewritten = Expr::make_and(a.clone(), substitute(var, k, b));
            return Some(s.mutate(&rewritten));
        }
    }
    let (var, k) = fact(b)?;
    if !expr_uses_var(a, var) {
        return None;
    }
    let rewritten = Expr::make_and(substitute(var, k, a), b.clone());
    Some(s.mutate(&rewritten))
}

fn and_broadcasts(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ((va, lanes), (vb, lanes_b)) = (op.a.as_broadcast()?, op.b.as_broadcast()?);
    if lanes != lanes_b {
        return None;
    }
    let scalar = s.mutate(&Expr::make_and(va.clone(), vb.clone()));
    Some(Expr::make_broadcast(scalar, lanes))
}

fn and_substitute_var(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    // A boolean variable is true wherever its conjunction is.
    if let Some(var) = a.as_variable() {
        if expr_uses_var(b, var) {
            let rewritten = and(a, substitute(var, &make_one(a.ty()), b));
            return Some(s.mutate(&rewritten));
        }
    }
    let var = b.as_variable()?;
    if !expr_uses_var(a, var) {
        return None;
    }
    let rewritten = and(substitute(var, &make_one(b.ty()), a), b);
    Some(s.mutate(&rewritten))
}

// ----------------------------------------------------------------------------------
// Or

pub(super) fn visit_or(s: &mut Simplifier, e: &Expr, a: &Expr, b: &Expr) -> Expr {
    let a = s.mutate(a);
    let b = s.mutate(b);
    if let Some(marker) = propagate_markers(e.ty(), &[&a, &b]) {
        return marker;
    }
    let op = Binary::new(e, a, b);
    s.apply_rules("Or", OR_RULES, &op)
        .unwrap_or_else(|| op.rebuild(Expr::make_or))
}

const OR_RULES: &[Rule<Binary>] = &[
    ("constants", or_constants),
    ("equal", or_equal),
    ("tautology", or_tautology),
    ("full_range", or_full_range),
    ("broadcasts", or_broadcasts),
    ("eq_ne_constants", or_eq_ne_constants),
    ("substitute_var", or_substitute_var),
    ("distribute_and", or_distribute_and),
];

fn or_constants(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    if is_one(a) || is_zero(b) {
        Some(a.clone())
    } else if is_one(b) || is_zero(a) {
        Some(b.clone())
    } else {
        None
    }
}

fn or_equal(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    (op.a == op.b).then(|| op.a.clone())
}

fn or_tautology(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    (eq_and_ne(&op.a, &op.b) || complementary(&op.a, &op.b))
        .then(|| const_true(op.ty().lanes()))
}

fn or_full_range(_: &mut Simplifier, op: &Binary) -> Option<Expr> {
    // Every integer satisfies one of the two bounds.
    let (lower, upper) = opposite_bounds(&op.a, &op.b)?;
    (lower <= upper + 1).then(|| const_true(op.ty().lanes()))
}

fn or_broadcasts(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let ((va, lanes), (vb, lanes_b)) = (op.a.as_broadcast()?, op.b.as_broadcast()?);
    if lanes != lanes_b {
        return None;
    }
    let scalar = s.mutate(&Expr::make_or(va.clone(), vb.clone()));
    Some(Expr::make_broadcast(scalar, lanes))
}

fn or_eq_ne_constants(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    if let (Some((x, k1)), Some((y, k2))) = (a.as_eq(), b.as_ne()) {
        if x == y && is_simple_const(k1) && is_simple_const(k2) {
            // (x == k1) || (x != k2) -> (x != k2) || (k1 == k2)
            let folded = Expr::make_or(b.clone(), Expr::make_eq(k1.clone(), k2.clone()));
            return Some(s.mutate(&folded));
        }
    }
    let ((x, k1), (y, k2)) = (a.as_ne()?, b.as_eq()?);
    if x == y && is_simple_const(k1) && is_simple_const(k2) {
        // (x != k1) || (x == k2) -> (x != k1) || (k1 == k2)
        let folded = Expr::make_or(a.clone(), Expr::make_eq(k1.clone(), k2.clone()));
        Some(s.mutate(&folded))
    } else {
        None
    }
}

fn or_substitute_var(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    // A boolean variable is false wherever its disjunction still needs the other side.
    if let Some(var) = a.as_variable() {
        if expr_uses_var(b, var) {
            let rewritten = or(a, substitute(var, &make_zero(a.ty()), b));
            return Some(s.mutate(&rewritten));
        }
    }
    let var = b.as_variable()?;
    if !expr_uses_var(a, var) {
        return None;
    }
    let rewritten = or(substitute(var, &make_zero(b.ty()), a), b);
    Some(s.mutate(&rewritten))
}

fn or_distribute_and(s: &mut Simplifier, op: &Binary) -> Option<Expr> {
    let (a, b) = (&op.a, &op.b);
    // (p && q) || c -> (p || c) && (q || c), when c and p or q test the same
    // variable against a constant.
    let distributes = |conj: &Expr, c: &Expr| -> Option<Expr> {
        let var = var_simple_const_comparison(c)?;
        let (p, q) = conj.as_and()?;
        let same = |e: &Expr| var_simple_const_comparison(e) == Some(var);
        (same(p) || same(q)).then(|| {
            Expr::make_and(
                Expr::make_or(p.clone(), c.clone()),
                Expr::make_or(q.clone(), c.clone()),
            )
        })
    };
    let rewritten = distributes(a, b).or_else(|| distributes(b, a))?;
    Some(s.mutate(&rewritten))
}

// ----------------------------------------------------------------------------------
// Not

pub(super) fn visit_not(s: &mut Simplifier, e: &Expr, a: &Expr) -> Expr {
    let a = s.mutate(a);
    if let Some(marker) = propagate_markers(e.ty(), &[&a]) {
        return marker;
    }
    if is_one(&a) {
        return make_zero(a.ty());
    }
    if is_zero(&a) {
        return make_one(a.ty());
    }
    if let Some(inner) = a.as_not() {
        return inner.clone();
    }
    // Negated comparisons flip into the opposite comparison.
    if let Some((x, y)) = a.as_le() {
        return Expr::make_lt(y.clone(), x.clone());
    }
    if let Some((x, y)) = a.as_ge() {
        return Expr::make_lt(x.clone(), y.clone());
    }
    if let Some((x, y)) = a.as_lt() {
        return Expr::make_le(y.clone(), x.clone());
    }
    if let Some((x, y)) = a.as_gt() {
        return Expr::make_le(x.clone(), y.clone());
    }
    if let Some((x, y)) = a.as_ne() {
        return Expr::make_eq(x.clone(), y.clone());
    }
    if let Some((x, y)) = a.as_eq() {
        return Expr::make_ne(x.clone(), y.clone());
    }
    if let Some((value, lanes)) = a.as_broadcast() {
        return s.mutate(&Expr::make_broadcast(Expr::make_not(value.clone()), lanes));
    }
    match e.as_not() {
        Some(original) if original.same_as(&a) => e.clone(),
        _ => Expr::make_not(a),
    }
}

// ----------------------------------------------------------------------------------
// Select

pub(crate) struct Select {
    op: Expr,
    condition: Expr,
    true_value: Expr,
    false_value: Expr,
}

impl Select {
    fn unchanged(&self) -> bool {
        match self.op.as_select() {
            Some((c, t, f)) => {
                c.same_as(&self.condition)
                    && t.same_as(&self.true_value)
                    && f.same_as(&self.false_value)
            },
            None => false,
        }
    }

    fn rebuild(&self) -> Expr {
        if self.unchanged() {
            self.op.clone()
        } else {
            Expr::make_select(
                self.condition.clone(),
                self.true_value.clone(),
                self.false_value.clone(),
            )
        }
    }

    /// `condition` as a boolean of the lanes of the values.
    fn condition_like_values(&self, condition: Expr) -> Expr {
        let lanes = self.true_value.ty().lanes();
        if lanes > 1 && condition.ty().is_scalar() {
            Expr::make_broadcast(condition, lanes)
        } else {
            condition
        }
    }
}

pub(super) fn visit_select(s: &mut Simplifier, e: &Expr, c: &Expr, t: &Expr, f: &Expr) -> Expr {
    let condition = s.mutate(c);
    let true_value = s.mutate(t);
    let false_value = s.mutate(f);
    if let Some(marker) = propagate_markers(e.ty(), &[&condition, &true_value, &false_value]) {
        return marker;
    }
    let args = Select {
        op: e.clone(),
        condition,
        true_value,
        false_value,
    };
    s.apply_rules("Select", SELECT_RULES, &args)
        .unwrap_or_else(|| args.rebuild())
}

const SELECT_RULES: &[Rule<Select>] = &[
    ("constant_condition", select_constant_condition),
    ("equal_values", select_equal_values),
    ("boolean_values", select_boolean_values),
    ("broadcast_condition", select_broadcast_condition),
    ("normalize_condition", select_normalize_condition),
    ("likely", select_likely),
    ("nested", select_nested),
    ("factor_add_sub", select_factor_add_sub),
    ("factor_mul", select_factor_mul),
];

fn select_constant_condition(_: &mut Simplifier, args: &Select) -> Option<Expr> {
    if is_zero(&args.condition) {
        Some(args.false_value.clone())
    } else if is_one(&args.condition) {
        Some(args.true_value.clone())
    } else {
        None
    }
}

fn select_equal_values(_: &mut Simplifier, args: &Select) -> Option<Expr> {
    (args.true_value == args.false_value).then(|| args.true_value.clone())
}

fn select_boolean_values(s: &mut Simplifier, args: &Select) -> Option<Expr> {
    let (t, f) = (&args.true_value, &args.false_value);
    if !t.ty().is_bool() {
        return None;
    }
    if is_one(t) && is_zero(f) {
        // select(c, true, false) -> c
        Some(args.condition_like_values(args.condition.clone()))
    } else if is_zero(t) && is_one(f) {
        let negated = s.mutate(&Expr::make_not(args.condition.clone()));
        Some(args.condition_like_values(negated))
    } else {
        None
    }
}

fn select_broadcast_condition(s: &mut Simplifier, args: &Select) -> Option<Expr> {
    // A broadcast condition selects whole vectors.
    let (c, _) = args.condition.as_broadcast()?;
    let scalar = Expr::make_select(c.clone(), args.true_value.clone(), args.false_value.clone());
    Some(s.mutate(&scalar))
}

fn select_normalize_condition(s: &mut Simplifier, args: &Select) -> Option<Expr> {
    let (t, f) = (&args.true_value, &args.false_value);
    let flipped = if let Some((x, y)) = args.condition.as_ne() {
        // select(x != y, t, f) -> select(x == y, f, t)
        Expr::make_eq(x.clone(), y.clone())
    } else if let Some((x, y)) = args.condition.as_le() {
        // select(x <= y, t, f) -> select(y < x, f, t)
        Expr::make_lt(y.clone(), x.clone())
    } else {
        return None;
    };
    Some(s.mutate(&Expr::make_select(flipped, f.clone(), t.clone())))
}

fn select_likely(_: &mut Simplifier, args: &Select) -> Option<Expr> {
    let (t, f) = (&args.true_value, &args.false_value);
    let likely_of = |call: &Expr, value: &Expr| {
        call.is_intrinsic(intrinsic::LIKELY)
            && matches!(call.as_call(), Some((_, call_args, _)) if call_args.first() == Some(value))
    };
    if likely_of(t, f) {
        // select(c, likely(a), a) -> likely(a)
        Some(t.clone())
    } else if likely_of(f, t) {
        Some(f.clone())
    } else {
        None
    }
}

fn select_nested(s: &mut Simplifier, args: &Select) -> Option<Expr> {
    let (c, t, f) = (&args.condition, &args.true_value, &args.false_value);
    if let Some((inner, p, q)) = t.as_select() {
        if p == f {
            // select(c, select(d, f, q), f) -> select(c && !d, q, f)
            let cond = and(c, Expr::make_not(inner.clone()));
            return Some(s.mutate(&Expr::make_select(cond, q.clone(), f.clone())));
        }
        if q == f {
            // select(c, select(d, p, f), f) -> select(c && d, p, f)
            let cond = and(c, inner);
            return Some(s.mutate(&Expr::make_select(cond, p.clone(), f.clone())));
        }
    }
    let (inner, p, q) = f.as_select()?;
    if q == t {
        // select(c, t, select(d, p, t)) -> select(c || !d, t, p)
        let cond = or(c, Expr::make_not(inner.clone()));
        Some(s.mutate(&Expr::make_select(cond, t.clone(), p.clone())))
    } else if p == t {
        // select(c, t, select(d, t, q)) -> select(c || d, t, q)
        let cond = or(c, inner);
        Some(s.mutate(&Expr::make_select(cond, t.clone(), q.clone())))
    } else {
        None
    }
}

fn select_factor_add_sub(s: &mut Simplifier, args: &Select) -> Option<Expr> {
    let (c, t, f) = (&args.condition, &args.true_value, &args.false_value);
    let pick = |x: &Expr, y: &Expr| Expr::make_select(c.clone(), x.clone(), y.clone());
    let negate = |x: &Expr| make_zero(x.ty()) - x;
    let rewritten = match (t.as_add(), f.as_add(), t.as_sub(), f.as_sub()) {
        (Some((ta, tb)), Some((fa, fb)), _, _) => {
            if ta == fa {
                // select(c, a + b, a + d) -> a + select(c, b, d)
                ta + pick(tb, fb)
            } else if ta == fb {
                ta + pick(tb, fa)
            } else if tb == fa {
                tb + pick(ta, fb)
            } else if tb == fb {
                pick(ta, fa) + tb
            } else {
                return None;
            }
        },
        (_, _, Some((ta, tb)), Some((fa, fb))) => {
            if ta == fa {
                // select(c, a - b, a - d) -> a - select(c, b, d)
                ta - pick(tb, fb)
            } else if tb == fb {
                pick(ta, fa) - tb
            } else {
                return None;
            }
        },
        (Some((ta, tb)), _, _, Some((fa, fb))) => {
            if ta == fa {
                // select(c, a + b, a - d) -> a + select(c, b, 0 - d)
                ta + pick(tb, &negate(fb))
            } else if tb == fa {
                tb + pick(ta, &negate(fb))
            } else {
                return None;
            }
        },
        (_, Some((fa, fb)), Some((ta, tb)), _) => {
            if ta == fa {
                // select(c, a - b, a + d) -> a + select(c, 0 - b, d)
                ta + pick(&negate(tb), fb)
            } else if ta == fb {
                ta + pick(&negate(tb), fa)
            } else {
                return None;
            }
        },
        _ => return None,
    };
    Some(s.mutate(&rewritten))
}

fn select_factor_mul(s: &mut Simplifier, args: &Select) -> Option<Expr> {
    let (c, t, f) = (&args.condition, &args.true_value, &args.false_value);
    let pick = |x: &Expr, y: &Expr| Expr::make_select(c.clone(), x.clone(), y.clone());
    let ((ta, tb), (fa, fb)) = (t.as_mul()?, f.as_mul()?);
    let rewritten = if ta == fa {
        // select(c, a * b, a * d) -> a * select(c, b, d)
        ta * pick(tb, fb)
    } else if ta == fb {
        ta * pick(tb, fa)
    } else if tb == fa {
        tb * pick(ta, fb)
    } else if tb == fb {
        pick(ta, fa) * tb
    } else {
        return None;
    };
    Some(s.mutate(&rewritten))
}

#[cfg(test)]
mod tests {
    use crate::simplify::simplify_expr;
    use ir_core::{ir_operator::*, Expr, Type};

    fn x() -> Expr {
        Expr::variable(Type::int(32), "x")
    }

    fn y() -> Expr {
        Expr::variable(Type::int(32), "y")
    }

    fn check(input: Expr, expected: Expr) {
        assert_eq!(simplify_expr(&input), expected, "simplifying {}", input);
    }

    #[test]
    fn test_boolean_identities() {
        let (x, y) = (x(), y());
        let p = lt(&x, &y);
        check(and(&p, const_true(1)), p.clone());
        check(and(&p, const_false(1)), const_false(1));
        check(or(&p, const_true(1)), const_true(1));
        check(or(const_false(1), &p), p.clone());
        check(and(&p, &p), p.clone());
        check(or(&p, not(&p)), const_true(1));
        check(and(not(&p), &p), const_false(1));
        check(and(eq(&x, &y), ne(&x, &y)), const_false(1));
        check(or(eq(&x, &y), ne(&y, &x)), const_true(1));
        check(not(not(&p)), p.clone());
    }

    #[test]
    fn test_negated_comparisons_flip() {
        let (x, y) = (x(), y());
        check(not(lt(&x, &y)), le(&y, &x));
        check(not(eq(&x, &y)), ne(&x, &y));
        check(not(ne(&x, &y)), eq(&x, &y));
    }

    #[test]
    fn test_integer_ranges() {
        let x = x();
        // No integer lies strictly between 3 and 4.
        check(and(lt(&x, 4), lt(3, &x)), const_false(1));
        check(and(le(&x, 3), le(5, &x)), const_false(1));
        check(or(lt(&x, 5), le(4, &x)), const_true(1));
        check(or(le(&x, 3), le(4, &x)), const_true(1));
        check(and(lt(&x, 5), lt(&x, 8)), lt(&x, 5));
    }

    #[test]
    fn test_equality_facts_are_substituted() {
        let (x, y) = (x(), y());
        check(and(eq(&x, 3), lt(&x, 5)), eq(&x, 3));
        check(and(eq(&x, 3), eq(&x, 4)), const_false(1));
        check(and(eq(&x, 3), ne(&x, 4)), eq(&x, 3));
        check(or(eq(&x, 3), ne(&x, 4)), ne(&x, 4));
        check(and(eq(&x, 3), lt(&y, &x)), and(eq(&x, 3), lt(&y, 3)));
    }

    #[test]
    fn test_boolean_variables() {
        let b = Expr::variable(Type::boolean(), "b");
        let c = Expr::variable(Type::boolean(), "c");
        check(and(&b, or(&b, &c)), b.clone());
        check(or(&b, and(&b, &c)), b.clone());
    }

    #[test]
    fn test_select_normalization() {
        let (x, y) = (x(), y());
        let c = lt(&x, &y);
        check(select(const_true(1), &x, &y), x.clone());
        check(select(&c, &x, &x), x.clone());
        check(select(&c, const_true(1), const_false(1)), c.clone());
        check(select(ne(&x, 3), &x, &y), select(eq(&x, 3), &y, &x));
        check(select(le(&x, &y), 1, 2), select(lt(&y, &x), 2, 1));
    }

    #[test]
    fn test_select_factoring() {
        let (x, y) = (x(), y());
        let c = Expr::variable(Type::boolean(), "c");
        check(select(&c, &x + 1, &x + 2), &x + select(&c, 1, 2));
        check(select(&c, &x * 3, &y * 3), select(&c, &x, &y) * 3);
        check(
            select(&c, select(lt(&x, 0), &x, &y), &y),
            select(and(&c, lt(&x, 0)), &x, &y),
        );
    }
}
