// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Constant integer bounds, derived without simplifying anything.
//!
//! The bounds of some expressions are at least as complex as the expressions
//! themselves, so this gives up as soon as anything is not constant instead
//! of trying to simplify the bounds it found.

use super::{const_int, no_overflow, no_overflow_scalar_int, Simplifier};
use ir_core::{
    ir_operator::{as_const_int, div_imp, is_const_value},
    Expr, ExprKind,
};

impl Simplifier<'_> {
    /// Inclusive constant bounds of `e`, if they can be read off directly.
    pub(crate) fn const_int_bounds(&self, e: &Expr) -> Option<(i64, i64)> {
        let (min, max) = self.bounds_wide(e)?;
        let ty = e.ty();
        let fits = i64::try_from(min).is_ok() && i64::try_from(max).is_ok();
        if !fits {
            return None;
        }
        let (min, max) = (min as i64, max as i64);
        // Only results of arithmetic need to be representable; leaves always are.
        let arithmetic = matches!(
            e.kind(),
            ExprKind::Add(..)
                | ExprKind::Sub(..)
                | ExprKind::Mul(..)
                | ExprKind::Div(..)
                | ExprKind::Mod(..)
                | ExprKind::Ramp { .. }
        );
        if arithmetic
            && !no_overflow_scalar_int(ty.element_of())
            && !(ty.can_represent(min) && ty.can_represent(max))
        {
            return None;
        }
        Some((min, max))
    }

    fn bounds_of(&self, e: &Expr) -> Option<(i128, i128)> {
        self.const_int_bounds(e)
            .map(|(min, max)| (min as i128, max as i128))
    }

    fn bounds_wide(&self, e: &Expr) -> Option<(i128, i128)> {
        if let Some(i) = as_const_int(e) {
            return Some((i as i128, i as i128));
        }
        use ExprKind::*;
        match e.kind() {
            Variable(var) => self
                .bounds_info
                .get(var)
                .map(|&(min, max)| (min as i128, max as i128)),
            Broadcast { value, .. } => self.bounds_of(value),
            Max(a, b) => match a.as_min() {
                // max(min(x, a), b) lies in [min_b, max(max_a, max_b)]. The clamp
                // bound may sit on either side of the inner min.
                Some((x, y)) => {
                    let (min_b, max_b) = self.bounds_of(b)?;
                    let (_, max_a) = self.bounds_of(y).or_else(|| self.bounds_of(x))?;
                    Some((min_b, max_a.max(max_b)))
                },
                None => {
                    let (min_a, max_a) = self.bounds_of(a)?;
                    let (min_b, max_b) = self.bounds_of(b)?;
                    Some((min_a.max(min_b), max_a.max(max_b)))
                },
            },
            Min(a, b) => match a.as_max() {
                // min(max(x, a), b) lies in [min(min_a, min_b), max_b].
                Some((x, y)) => {
                    let (min_b, max_b) = self.bounds_of(b)?;
                    let (min_a, _) = self.bounds_of(y).or_else(|| self.bounds_of(x))?;
                    Some((min_a.min(min_b), max_b))
                },
                None => {
                    let (min_a, max_a) = self.bounds_of(a)?;
                    let (min_b, max_b) = self.bounds_of(b)?;
                    Some((min_a.min(min_b), max_a.min(max_b)))
                },
            },
            Select(_, t, f) => {
                let (min_a, max_a) = self.bounds_of(t)?;
                let (min_b, max_b) = self.bounds_of(f)?;
                Some((min_a.min(min_b), max_a.max(max_b)))
            },
            Add(a, b) => {
                let (min_a, max_a) = self.bounds_of(a)?;
                let (min_b, max_b) = self.bounds_of(b)?;
                Some((min_a + min_b, max_a + max_b))
            },
            Sub(a, b) => {
                let (min_a, max_a) = self.bounds_of(a)?;
                let (min_b, max_b) = self.bounds_of(b)?;
                Some((min_a - max_b, max_a - min_b))
            },
            Mul(a, b) => {
                let (min_a, max_a) = self.bounds_of(a)?;
                let (min_b, max_b) = self.bounds_of(b)?;
                let corners = [min_a * min_b, min_a * max_b, max_a * min_b, max_a * max_b];
                Some(extremes(&corners))
            },
            Mod(_, b) => {
                let (min_b, max_b) = self.bounds_of(b)?;
                if min_b > 0 || max_b < 0 {
                    Some((0, min_b.abs().max(max_b.abs()) - 1))
                } else {
                    None
                }
            },
            Div(a, b) => {
                let (min_a, max_a) = self.const_int_bounds(a)?;
                let (min_b, max_b) = self.const_int_bounds(b)?;
                if min_b > 0 || max_b < 0 {
                    let corners = [
                        div_imp(min_a, min_b) as i128,
                        div_imp(min_a, max_b) as i128,
                        div_imp(max_a, min_b) as i128,
                        div_imp(max_a, max_b) as i128,
                    ];
                    Some(extremes(&corners))
                } else {
                    None
                }
            },
            Ramp {
                base,
                stride,
                lanes,
            } => {
                let (min_base, max_base) = self.bounds_of(base)?;
                let (min_stride, max_stride) = self.bounds_of(stride)?;
                let last = (*lanes as i128) - 1;
                let min_last_lane = min_base + min_stride * last;
                let max_last_lane = max_base + max_stride * last;
                Some((min_base.min(min_last_lane), max_base.max(max_last_lane)))
            },
            _ => None,
        }
    }
}

fn extremes(values: &[i128]) -> (i128, i128) {
    let min = values.iter().copied().min().unwrap_or(0);
    let max = values.iter().copied().max().unwrap_or(0);
    (min, max)
}

/// If `e` is `(x + (factor - 1)) / factor`, the `x`.
pub(crate) fn is_round_up_div(e: &Expr, factor: i64) -> Option<&Expr> {
    if !no_overflow(e.ty()) {
        return None;
    }
    let (num, den) = e.as_div()?;
    if !is_const_value(den, factor) {
        return None;
    }
    let (x, c) = num.as_add()?;
    let rounding = factor.checked_sub(1)?;
    is_const_value(c, rounding).then_some(x)
}

/// If `e` rounds up to a multiple of a constant, `((x + (f - 1)) / f) * f`,
/// the `x` and the factor `f`.
pub(crate) fn is_round_up(e: &Expr) -> Option<(&Expr, i64)> {
    if !no_overflow(e.ty()) {
        return None;
    }
    let (a, b) = e.as_mul()?;
    let factor = const_int(b)?;
    Some((is_round_up_div(a, factor)?, factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir_core::{ir_operator::*, Scope, Type, Var};

    #[test]
    fn test_const_int_bounds() {
        let x = Var::new("x");
        let xe = x.to_expr(Type::int(32));
        let (bounds, alignment) = (Scope::new(), Scope::new());
        let mut s = Simplifier::new(true, &bounds, &alignment);
        s.bounds_info.push(x.clone(), (0, 10));

        assert_eq!(s.const_int_bounds(&(&xe * 3 - 4)), Some((-4, 26)));
        assert_eq!(s.const_int_bounds(&(&xe / 4)), Some((0, 2)));
        assert_eq!(s.const_int_bounds(&(&xe % 4)), Some((0, 3)));
        assert_eq!(s.const_int_bounds(&max(min(&xe, 8), 2)), Some((2, 8)));
        assert_eq!(s.const_int_bounds(&select(lt(&xe, 3), 20, -1)), Some((-1, 20)));
        assert_eq!(s.const_int_bounds(&ramp(&xe, 2, 4)), Some((0, 16)));

        let y = Expr::variable(Type::int(32), "y");
        assert_eq!(s.const_int_bounds(&(&xe + &y)), None);
        assert_eq!(s.const_int_bounds(&(&y % 4)), Some((0, 3)));
    }

    #[test]
    fn test_bounds_of_narrow_types_must_fit() {
        let x = Var::new("x");
        let xe = x.to_expr(Type::int(8));
        let (bounds, alignment) = (Scope::new(), Scope::new());
        let mut s = Simplifier::new(true, &bounds, &alignment);
        s.bounds_info.push(x, (100, 120));
        assert_eq!(s.const_int_bounds(&(&xe - 10)), Some((90, 110)));
        assert_eq!(s.const_int_bounds(&(&xe + 10)), None);
    }

    #[test]
    fn test_round_up() {
        let x = Expr::variable(Type::int(32), "x");
        let e = ((&x + 7) / 8) * 8;
        let (inner, factor) = is_round_up(&e).unwrap();
        assert_eq!(inner, &x);
        assert_eq!(factor, 8);
        assert!(is_round_up_div(&((&x + 3) / 8), 8).is_none());
    }
}
