// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Rules for `Min` and `Max`.
//!
//! The two operators are mirror images of each other, so a single rule table
//! serves both. Each rule is written for an `Extremum` and refers to the
//! opposite operator through `Extremum::dual`.

use super::{
    bounds::is_round_up, const_float, const_int, const_uint, is_simple_const, no_overflow,
    propagate_markers, vector::hoist_slice_vector, Binary, Rule, Simplifier,
};
use ir_core::{
    ir::{intrinsic, shuffle_is_slice},
    ir_operator::{is_const_value, is_zero, make_const},
    Expr,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Extremum {
    Min,
    Max,
}

impl Extremum {
    fn dual(self) -> Self {
        match self {
            Extremum::Min => Extremum::Max,
            Extremum::Max => Extremum::Min,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Extremum::Min => "Min",
            Extremum::Max => "Max",
        }
    }

    fn make(self, a: Expr, b: Expr) -> Expr {
        match self {
            Extremum::Min => Expr::make_min(a, b),
            Extremum::Max => Expr::make_max(a, b),
        }
    }

    /// The operands of `e` if it is this operator.
    fn of(self, e: &Expr) -> Option<(&Expr, &Expr)> {
        match self {
            Extremum::Min => e.as_min(),
            Extremum::Max => e.as_max(),
        }
    }

    /// Of two expressions ordered `lo <= hi`, the one this operator picks.
    fn pick<'e>(self, lo: &'e Expr, hi: &'e Expr) -> &'e Expr {
        match self {
            Extremum::Min => lo,
            Extremum::Max => hi,
        }
    }

    fn fold_i64(self, a: i64, b: i64) -> i64 {
        match self {
            Extremum::Min => a.min(b),
            Extremum::Max => a.max(b),
        }
    }

    fn fold_u64(self, a: u64, b: u64) -> u64 {
        match self {
            Extremum::Min => a.min(b),
            Extremum::Max => a.max(b),
        }
    }

    fn fold_f64(self, a: f64, b: f64) -> f64 {
        match self {
            Extremum::Min => a.min(b),
            Extremum::Max => a.max(b),
        }
    }
}

pub(crate) struct MinMax {
    kind: Extremum,
    op: Binary,
}

impl MinMax {
    /// Picks from `lo <= hi`, cloned.
    fn pick(&self, lo: &Expr, hi: &Expr) -> Expr {
        self.kind.pick(lo, hi).clone()
    }
}

pub(super) fn visit_min_max(s: &mut Simplifier, e: &Expr, a: &Expr, b: &Expr, kind: Extremum) -> Expr {
    let mut a = s.mutate(a);
    let mut b = s.mutate(b);
    if let Some(marker) = propagate_markers(e.ty(), &[&a, &b]) {
        return marker;
    }
    // Constants and broadcasts go right, the opposite operator goes left.
    if is_simple_const(&a) && !is_simple_const(&b) {
        std::mem::swap(&mut a, &mut b);
    } else if a.as_broadcast().is_some() && b.as_broadcast().is_none() {
        std::mem::swap(&mut a, &mut b);
    } else if kind.dual().of(&a).is_none() && kind.dual().of(&b).is_some() {
        std::mem::swap(&mut a, &mut b);
    }
    let args = MinMax {
        kind,
        op: Binary::new(e, a, b),
    };
    s.apply_rules(kind.name(), MIN_MAX_RULES, &args)
        .unwrap_or_else(|| {
            args.op.rebuild(match kind {
                Extremum::Min => Expr::make_min,
                Extremum::Max => Expr::make_max,
            })
        })
}

const MIN_MAX_RULES: &[Rule<MinMax>] = &[
    ("equal", equal),
    ("fold", fold),
    ("type_limits", type_limits),
    ("broadcasts", broadcasts),
    ("bounds", bounds),
    ("constant_offsets", constant_offsets),
    ("round_up", round_up),
    ("absorb_pair", absorb_pair),
    ("absorb_dual", absorb_dual),
    ("absorb_same", absorb_same),
    ("merge_broadcasts", merge_broadcasts),
    ("absorb_chain", absorb_chain),
    ("distribute_dual", distribute_dual),
    ("distribute_same", distribute_same),
    ("absorb_nested", absorb_nested),
    ("distribute_add", distribute_add),
    ("pull_constant", pull_constant),
    ("common_divisor", common_divisor),
    ("common_factor", common_factor),
    ("factor_constant", factor_constant),
    ("likely", likely),
    ("hoist_slices", hoist_slices),
    ("reflect_sub", reflect_sub),
    ("select", select),
];

fn equal(_: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    (args.op.a == args.op.b).then(|| args.op.a.clone())
}

fn fold(_: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let (a, b, kind) = (&args.op.a, &args.op.b, args.kind);
    let ty = args.op.ty();
    if let (Some(ia), Some(ib)) = (const_int(a), const_int(b)) {
        return Some(Expr::make_int(ty, kind.fold_i64(ia, ib)));
    }
    if let (Some(ua), Some(ub)) = (const_uint(a), const_uint(b)) {
        return Some(Expr::make_uint(ty, kind.fold_u64(ua, ub)));
    }
    let (fa, fb) = (const_float(a)?, const_float(b)?);
    Some(Expr::make_float(ty, kind.fold_f64(fa, fb)))
}

fn type_limits(_: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let (a, b) = (&args.op.a, &args.op.b);
    let ty = b.ty();
    // The type's minimum is below everything else, its maximum above.
    if let Some(ib) = const_int(b) {
        if ty.is_max(ib) {
            return Some(args.pick(a, b));
        }
        if ty.is_min(ib) {
            return Some(args.pick(b, a));
        }
    }
    if let Some(ub) = const_uint(b) {
        if ty.is_max_uint(ub) {
            return Some(args.pick(a, b));
        }
    }
    (ty.is_uint() && is_zero(b)).then(|| args.pick(b, a))
}

fn broadcasts(s: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let ((va, lanes), (vb, _)) = (args.op.a.as_broadcast()?, args.op.b.as_broadcast()?);
    let inner = args.kind.make(va.clone(), vb.clone());
    Some(s.mutate(&Expr::make_broadcast(inner, lanes)))
}

fn bounds(s: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let (a, b) = (&args.op.a, &args.op.b);
    let (a_min, a_max) = s.const_int_bounds(a)?;
    let (b_min, b_max) = s.const_int_bounds(b)?;
    if a_min >= b_max {
        Some(args.pick(b, a))
    } else if b_min >= a_max {
        Some(args.pick(a, b))
    } else {
        None
    }
}

fn constant_offsets(_: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    if !no_overflow(args.op.ty()) {
        return None;
    }
    let (a, b) = (&args.op.a, &args.op.b);
    let add_a = a.as_add().and_then(|(x, c)| Some((x, const_int(c)?)));
    let add_b = b.as_add().and_then(|(x, c)| Some((x, const_int(c)?)));
    if let (Some((x, ia)), Some((y, ib))) = (add_a, add_b) {
        if x == y {
            // min(x + 3, x - 2) -> x - 2
            return Some(if ia > ib { args.pick(b, a) } else { args.pick(a, b) });
        }
    }
    if let Some((x, ia)) = add_a {
        if x == b {
            // min(x + 5, x) -> x
            return Some(if ia > 0 { args.pick(b, a) } else { args.pick(a, b) });
        }
    }
    if let Some((y, ib)) = add_b {
        if y == a {
            // min(x, x + 5) -> x
            return Some(if ib > 0 { args.pick(a, b) } else { args.pick(b, a) });
        }
    }
    let (ca, x) = a.as_sub()?;
    let (cb, y) = b.as_sub()?;
    let (ia, ib) = (const_int(ca)?, const_int(cb)?);
    if x != y {
        return None;
    }
    // min(100 - x, 101 - x) -> 100 - x
    Some(if ia < ib { args.pick(a, b) } else { args.pick(b, a) })
}

fn round_up(_: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    if args.kind != Extremum::Min {
        return None;
    }
    let (a, b) = (&args.op.a, &args.op.b);
    // The rounded-up value of x is never less than x.
    let dominates = |rounded: &Expr, other: &Expr| -> bool {
        let Some((x, factor)) = is_round_up(rounded) else {
            return false;
        };
        if x == other {
            return true;
        }
        matches!(other.as_max(), Some((y, k)) if y == x && is_const_value(k, factor))
    };
    if dominates(a, b) {
        // min(((a + 3)/4)*4, max(a, 4)) -> max(a, 4)
        Some(b.clone())
    } else if dominates(b, a) {
        // min(a, ((a + 3)/4)*4) -> a
        Some(a.clone())
    } else {
        None
    }
}

fn absorb_pair(s: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let kind = args.kind;
    let (x, y) = kind.dual().of(&args.op.a)?;
    let (p, q) = kind.of(&args.op.b)?;
    // min(max(x, y), min(x, y)) -> min(x, y), in either order.
    ((x == p && y == q) || (x == q && y == p))
        .then(|| s.mutate(&kind.make(x.clone(), y.clone())))
}

fn absorb_dual(_: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let b = &args.op.b;
    let (x, y) = args.kind.dual().of(&args.op.a)?;
    // min(max(x, y), x) -> x
    (x == b || y == b).then(|| b.clone())
}

fn absorb_same(_: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let (a, b) = (&args.op.a, &args.op.b);
    let kind = args.kind;
    if let Some((x, y)) = kind.of(a) {
        if x == b || y == b {
            // min(min(x, y), y) -> min(x, y)
            return Some(a.clone());
        }
    }
    let (x, y) = kind.of(b)?;
    // min(y, min(x, y)) -> min(x, y)
    (x == a || y == a).then(|| b.clone())
}

fn merge_broadcasts(s: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let kind = args.kind;
    let (x, inner) = kind.of(&args.op.a)?;
    let (vy, _) = inner.as_broadcast()?;
    let (vz, lanes) = args.op.b.as_broadcast()?;
    // min(min(x, broadcast(y)), broadcast(z)) -> min(x, broadcast(min(y, z)))
    let merged = Expr::make_broadcast(kind.make(vy.clone(), vz.clone()), lanes);
    Some(s.mutate(&kind.make(x.clone(), merged)))
}

fn absorb_chain(_: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let kind = args.kind;
    let b = &args.op.b;
    // min(min(min(min(x, y), z), w), y) -> min(min(min(x, y), z), w), up to four deep.
    let (mut inner, _) = kind.of(&args.op.a)?;
    for _ in 0..3 {
        let Some((next, last)) = kind.of(inner) else {
            return None;
        };
        if last == b {
            return Some(args.op.a.clone());
        }
        inner = next;
    }
    None
}

/// For `f(x, y)` and `f(z, w)`, the shared operand and the other two, in order.
fn shared_operand<'e>(
    (a0, a1): (&'e Expr, &'e Expr),
    (b0, b1): (&'e Expr, &'e Expr),
) -> Option<(&'e Expr, &'e Expr, &'e Expr)> {
    if a0 == b0 {
        Some((a0, a1, b1))
    } else if a0 == b1 {
        Some((a0, a1, b0))
    } else if a1 == b0 {
        Some((a1, a0, b1))
    } else if a1 == b1 {
        Some((a1, a0, b0))
    } else {
        None
    }
}

fn distribute_dual(s: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let (kind, dual) = (args.kind, args.kind.dual());
    let (x, y, z) = shared_operand(dual.of(&args.op.a)?, dual.of(&args.op.b)?)?;
    // min(max(x, y), max(x, z)) -> max(min(y, z), x)
    let inner = kind.make(y.clone(), z.clone());
    Some(s.mutate(&dual.make(inner, x.clone())))
}

fn distribute_same(s: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let kind = args.kind;
    let (x, y, z) = shared_operand(kind.of(&args.op.a)?, kind.of(&args.op.b)?)?;
    // min(min(x, y), min(x, z)) -> min(min(y, z), x)
    let inner = kind.make(y.clone(), z.clone());
    Some(s.mutate(&kind.make(inner, x.clone())))
}

fn absorb_nested(s: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let (kind, dual) = (args.kind, args.kind.dual());
    let b = &args.op.b;
    let (inner, z) = dual.of(&args.op.a)?;
    let (x, y) = kind.of(inner)?;
    // min(max(min(x, y), z), y) -> min(max(x, z), y)
    let keep = if y == b {
        x
    } else if x == b {
        y
    } else {
        return None;
    };
    let rebuilt = kind.make(dual.make(keep.clone(), z.clone()), b.clone());
    Some(s.mutate(&rebuilt))
}

fn distribute_add(s: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    if !no_overflow(args.op.ty()) {
        return None;
    }
    let (a0, a1) = args.op.a.as_add()?;
    let (b0, b1) = args.op.b.as_add()?;
    // min(a + b, c + b) -> min(a, c) + b, for each position of the common term.
    let (common, x, y) = if a1 == b1 {
        (a1, a0, b0)
    } else if a0 == b0 {
        (a0, a1, b1)
    } else if a0 == b1 {
        (a0, a1, b0)
    } else if a1 == b0 {
        (a1, a0, b1)
    } else {
        return None;
    };
    let inner = s.mutate(&args.kind.make(x.clone(), y.clone()));
    Some(s.mutate(&(inner + common)))
}

fn pull_constant(s: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let kind = args.kind;
    let b = &args.op.b;
    let (x, c) = kind.of(&args.op.a)?;
    if !is_simple_const(c) {
        return None;
    }
    Some(if is_simple_const(b) {
        // min(min(x, 4), 5) -> min(x, 4)
        let bound = s.mutate(&kind.make(b.clone(), c.clone()));
        s.mutate(&kind.make(x.clone(), bound))
    } else {
        // min(min(x, 4), y) -> min(min(x, y), 4)
        s.mutate(&kind.make(kind.make(x.clone(), b.clone()), c.clone()))
    })
}

/// The extremum to use after pulling out a constant factor `k`: a negative
/// factor flips the order.
fn under_factor(kind: Extremum, k: i64) -> Extremum {
    if k > 0 { kind } else { kind.dual() }
}

fn common_divisor(s: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let ty = args.op.ty();
    if !no_overflow(ty) {
        return None;
    }
    let (x, c) = args.op.a.as_div()?;
    let (y, d) = args.op.b.as_div()?;
    let (ia, ib) = (const_int(c)?, const_int(d)?);
    if ia == 0 || ia != ib {
        return None;
    }
    // min(a / 4, b / 4) -> min(a, b) / 4
    let inner = under_factor(args.kind, ia).make(x.clone(), y.clone());
    Some(s.mutate(&(inner / make_const(ty, ia))))
}

fn common_factor(s: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let ty = args.op.ty();
    if !no_overflow(ty) {
        return None;
    }
    let (x, c) = args.op.a.as_mul()?;
    let (y, d) = args.op.b.as_mul()?;
    let (ia, ib) = (const_int(c)?, const_int(d)?);
    if ia != ib {
        return None;
    }
    // min(a * 4, b * 4) -> min(a, b) * 4
    let inner = under_factor(args.kind, ia).make(x.clone(), y.clone());
    Some(s.mutate(&(inner * make_const(ty, ia))))
}

fn factor_constant(s: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let ty = args.op.ty();
    if !no_overflow(ty) {
        return None;
    }
    let (x, c) = args.op.a.as_mul()?;
    let (ia, ib) = (const_int(c)?, const_int(&args.op.b)?);
    if ia == 0 || ib.checked_rem(ia)? != 0 {
        return None;
    }
    // min(x*8, 24) -> min(x, 3)*8
    let ratio = make_const(ty, ib / ia);
    let inner = under_factor(args.kind, ia).make(x.clone(), ratio);
    Some(s.mutate(&(inner * make_const(ty, ia))))
}

fn likely(_: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let (a, b) = (&args.op.a, &args.op.b);
    let wraps = |call: &Expr, value: &Expr| {
        call.is_intrinsic(intrinsic::LIKELY)
            && matches!(call.as_call(), Some((_, call_args, _)) if call_args.first() == Some(value))
    };
    if wraps(a, b) {
        // min(likely(b), b) -> likely(b)
        Some(a.clone())
    } else if wraps(b, a) {
        Some(b.clone())
    } else {
        None
    }
}

fn hoist_slices(_: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let is_slice = |e: &Expr| {
        matches!(e.as_shuffle(), Some((vectors, indices)) if shuffle_is_slice(vectors, indices))
    };
    let op = &args.op;
    (is_slice(&op.a) && is_slice(&op.b)).then(|| {
        hoist_slice_vector(op, match args.kind {
            Extremum::Min => Expr::make_min,
            Extremum::Max => Expr::make_max,
        })
    })
}

fn reflect_sub(s: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    if !no_overflow(args.op.ty()) {
        return None;
    }
    let b = &args.op.b;
    let (c, x) = args.op.a.as_sub()?;
    if !(is_simple_const(c) && is_simple_const(b)) {
        return None;
    }
    // min(8 - x, 3) -> 8 - max(x, 5)
    let reflected = args.kind.dual().make(x.clone(), c - b);
    Some(s.mutate(&(c - reflected)))
}

fn select(s: &mut Simplifier, args: &MinMax) -> Option<Expr> {
    let kind = args.kind;
    let (c, ta, fa) = args.op.a.as_select()?;
    let (cb, tb, fb) = args.op.b.as_select()?;
    if c != cb {
        return None;
    }
    // min(select(c, a, b), select(c, d, e)) -> select(c, min(a, d), min(b, e))
    let t = kind.make(ta.clone(), tb.clone());
    let f = kind.make(fa.clone(), fb.clone());
    Some(s.mutate(&Expr::make_select(c.clone(), t, f)))
}

#[cfg(test)]
mod tests {
    use crate::{interval::Interval, simplify::simplify, simplify::simplify_expr};
    use ir_core::{ir_operator::*, Expr, Scope, Type, Var};

    fn x() -> Expr {
        Expr::variable(Type::int(32), "x")
    }

    fn y() -> Expr {
        Expr::variable(Type::int(32), "y")
    }

    #[test]
    fn test_fold_and_type_limits() {
        let x = x();
        assert_eq!(as_const_int(&simplify_expr(&min(make_const(Type::int(32), 3), 7))), Some(3));
        assert_eq!(as_const_int(&simplify_expr(&max(make_const(Type::int(32), 3), 7))), Some(7));
        assert_eq!(simplify_expr(&min(&x, type_max(Type::int(32)))), x.clone());
        assert_eq!(simplify_expr(&max(&x, type_min(Type::int(32)))), x.clone());
        let u = Expr::variable(Type::uint(8), "u");
        assert_eq!(simplify_expr(&max(&u, make_zero(Type::uint(8)))), u.clone());
        assert!(is_zero(&simplify_expr(&min(&u, make_zero(Type::uint(8))))));
    }

    #[test]
    fn test_constant_offsets() {
        let x = x();
        assert_eq!(simplify_expr(&min(&x + 3, &x - 2)), &x + -2);
        assert_eq!(simplify_expr(&max(&x + 3, &x - 2)), &x + 3);
        assert_eq!(simplify_expr(&min(&x + 5, &x)), x.clone());
        assert_eq!(simplify_expr(&max(&x, &x + 5)), &x + 5);
        assert_eq!(simplify_expr(&min(100 - &x, 101 - &x)), 100 - &x);
    }

    #[test]
    fn test_absorption() {
        let (x, y) = (x(), y());
        assert_eq!(simplify_expr(&min(max(&x, &y), &x)), x.clone());
        assert_eq!(simplify_expr(&max(min(&x, &y), &y)), y.clone());
        assert_eq!(simplify_expr(&min(min(&x, &y), &y)), min(&x, &y));
        assert_eq!(simplify_expr(&max(&y, max(&x, &y))), max(&x, &y));
        assert_eq!(simplify_expr(&min(max(&x, &y), min(&y, &x))), min(&x, &y));
    }

    #[test]
    fn test_distribution() {
        let (x, y) = (x(), y());
        let z = Expr::variable(Type::int(32), "z");
        assert_eq!(simplify_expr(&min(&x + &z, &y + &z)), min(&x, &y) + &z);
        assert_eq!(simplify_expr(&min(&x * 4, &y * 4)), min(&x, &y) * 4);
        assert_eq!(simplify_expr(&min(&x * -4, &y * -4)), max(&x, &y) * -4);
        assert_eq!(simplify_expr(&max(&x * 8, 24)), max(&x, 3) * 8);
        assert_eq!(simplify_expr(&min(min(&x, 4), 5)), min(&x, 4));
        assert_eq!(simplify_expr(&min(min(&x, 4), &y)), min(min(&x, &y), 4));
    }

    #[test]
    fn test_rebuilt_extremes_are_renormalised() {
        let (x, y) = (x(), y());
        // The merged constant bound exposes a common factor.
        assert_eq!(simplify_expr(&max(max(&x * 2, -1), 0)), max(&x, 0) * 2);
        let e = min(&x, max(max(&x + &x, -1), &x % 1));
        let once = simplify_expr(&e);
        assert_eq!(simplify_expr(&once), once, "{}", e);
        let e = min(&x * 4 + &y, &x * 4 + 8);
        let once = simplify_expr(&e);
        assert_eq!(simplify_expr(&once), once, "{}", e);
    }

    #[test]
    fn test_reflect_through_subtraction() {
        let x = x();
        assert_eq!(simplify_expr(&min(8 - &x, 3)), 8 - max(&x, 5));
        assert_eq!(simplify_expr(&max(8 - &x, 3)), 8 - min(&x, 5));
    }

    #[test]
    fn test_round_up_dominates() {
        let x = x();
        let rounded = ((&x + 3) / 4) * 4;
        assert_eq!(simplify_expr(&min(&rounded, &x)), x.clone());
        assert_eq!(simplify_expr(&min(&x, &rounded)), x.clone());
    }

    #[test]
    fn test_bounds_pick_a_side() {
        let v = Var::new("v");
        let ve = v.to_expr(Type::int(32));
        let mut bounds = Scope::new();
        bounds.push(v, Interval::new(0, 10));
        let alignment = Scope::new();
        let e = min(&ve, 20);
        assert_eq!(simplify(&e, true, &bounds, &alignment), ve.clone());
        let e = max(&ve, 20);
        assert_eq!(
            as_const_int(&simplify(&e, true, &bounds, &alignment)),
            Some(20)
        );
        let e = max(&ve, 5);
        assert_eq!(simplify(&e, true, &bounds, &alignment), e);
    }

    #[test]
    fn test_vector_extremes() {
        let x = x();
        let e = min(broadcast(&x, 4), broadcast(3, 4));
        assert_eq!(simplify_expr(&e), broadcast(min(&x, 3), 4));
        let e = max(ramp(0, 1, 4), broadcast(10, 4));
        assert_eq!(simplify_expr(&e), broadcast(10, 4));
    }
}
