// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Modulus-remainder analysis of scalar integer expressions.
//!
//! The analysis computes a pair `(m, r)` such that the expression is always
//! congruent to `r` modulo `m`. A modulus of zero means the expression is the
//! exact constant `r`; `(1, 0)` carries no information. The following facts
//! are derived:
//!
//! - Constants are exact; variables take their fact from the caller's scope.
//! - Sums and differences keep the gcd of the operand moduli.
//! - Products scale exactly by a constant operand, keep zero remainders
//!   multiplied through, and otherwise fall back on the gcd of the moduli.
//! - `a % b` keeps what `a` and `b` share with the divisor.
//! - `min`, `max` and `select` unify their alternatives.
//! - `let` makes the fact of its value visible in the body.
//!
//! Everything else, including division, carries no information.

use ir_core::{ir_operator::mod_imp, Expr, ExprKind, Scope, Type};
use log::trace;
use num_integer::Integer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModulusRemainder {
    pub modulus: i64,
    pub remainder: i64,
}

impl ModulusRemainder {
    pub fn new(modulus: i64, remainder: i64) -> Self {
        Self { modulus, remainder }
    }

    pub fn unknown() -> Self {
        Self::new(1, 0)
    }

    pub fn constant(value: i64) -> Self {
        Self::new(0, value)
    }

    pub fn is_constant(&self) -> bool {
        self.modulus == 0
    }

    /// Normalise to a non-negative modulus and a remainder in `[0, modulus)`.
    fn reduced(modulus: i64, remainder: i64) -> Self {
        if modulus == 0 {
            return Self::constant(remainder);
        }
        match modulus.checked_abs() {
            Some(m) => Self::new(m, mod_imp(remainder, m)),
            None => Self::unknown(),
        }
    }

    /// The most precise fact that holds for a value that is either `a` or `b`.
    ///
    /// For example `max(30*x + 13, 40*y + 27)`: the moduli share 10, the
    /// remainders 3 and 7 agree modulo 2, so the result is `2*_ + 1`.
    pub fn unify(a: Self, b: Self) -> Self {
        let modulus = gcd(a.modulus, b.modulus);
        let Some(diff) = a.remainder.checked_sub(b.remainder) else {
            return Self::unknown();
        };
        if !Type::int(32).can_represent(diff) {
            return Self::unknown();
        }
        let modulus = gcd(diff, modulus);
        Self::reduced(modulus, a.remainder)
    }
}

/// Non-negative greatest common divisor; `gcd(0, x) == |x|`.
pub fn gcd(a: i64, b: i64) -> i64 {
    i64::try_from((a as i128).gcd(&(b as i128))).unwrap_or(1)
}

/// Least common multiple, or `None` if it does not fit.
pub fn lcm(a: i64, b: i64) -> Option<i64> {
    i64::try_from((a as i128).lcm(&(b as i128))).ok()
}

struct ComputeModulusRemainder<'a> {
    scope: Scope<'a, ModulusRemainder>,
}

impl ComputeModulusRemainder<'_> {
    fn analyze(&mut self, e: &Expr) -> ModulusRemainder {
        let ty = e.ty();
        if !(ty.is_int() || ty.is_uint()) || ty.is_bool() || ty.is_vector() {
            debug_assert!(
                false,
                "modulus remainder analysis of non-scalar-integer `{}` of type {}",
                e, ty
            );
            return ModulusRemainder::unknown();
        }
        use ExprKind::*;
        match e.kind() {
            IntImm(v) => ModulusRemainder::constant(*v),
            UIntImm(v) => i64::try_from(*v)
                .map(ModulusRemainder::constant)
                .unwrap_or_else(|_| ModulusRemainder::unknown()),
            Variable(var) => self
                .scope
                .get(var)
                .copied()
                .unwrap_or_else(ModulusRemainder::unknown),
            Add(a, b) => {
                let (a, b) = (self.analyze(a), self.analyze(b));
                match a.remainder.checked_add(b.remainder) {
                    Some(r) => ModulusRemainder::reduced(gcd(a.modulus, b.modulus), r),
                    None => ModulusRemainder::unknown(),
                }
            },
            Sub(a, b) => {
                let (a, b) = (self.analyze(a), self.analyze(b));
                match a.remainder.checked_sub(b.remainder) {
                    Some(r) => ModulusRemainder::reduced(gcd(a.modulus, b.modulus), r),
                    None => ModulusRemainder::unknown(),
                }
            },
            Mul(a, b) => {
                let (a, b) = (self.analyze(a), self.analyze(b));
                mul(a, b).unwrap_or_else(ModulusRemainder::unknown)
            },
            Mod(a, b) => {
                let (a, b) = (self.analyze(a), self.analyze(b));
                if b.is_constant() {
                    if b.remainder == 0 {
                        ModulusRemainder::unknown()
                    } else if a.is_constant() {
                        ModulusRemainder::constant(mod_imp(a.remainder, b.remainder))
                    } else {
                        ModulusRemainder::reduced(gcd(a.modulus, b.remainder), a.remainder)
                    }
                } else {
                    let modulus = gcd(gcd(a.modulus, b.modulus), b.remainder);
                    ModulusRemainder::reduced(modulus, a.remainder)
                }
            },
            Min(a, b) | Max(a, b) => {
                let (a, b) = (self.analyze(a), self.analyze(b));
                ModulusRemainder::unify(a, b)
            },
            Select(_, t, f) => {
                let (t, f) = (self.analyze(t), self.analyze(f));
                ModulusRemainder::unify(t, f)
            },
            Let { var, value, body } => {
                let value_ty = value.ty();
                if value_ty.is_scalar() && (value_ty.is_int() || value_ty.is_uint()) && !value_ty.is_bool() {
                    let fact = self.analyze(value);
                    self.scope.push(var.clone(), fact);
                    let result = self.analyze(body);
                    self.scope.pop(var);
                    result
                } else {
                    self.analyze(body)
                }
            },
            _ => ModulusRemainder::unknown(),
        }
    }
}

fn mul(a: ModulusRemainder, b: ModulusRemainder) -> Option<ModulusRemainder> {
    let result = if a.is_constant() {
        ModulusRemainder::reduced(
            a.remainder.checked_mul(b.modulus)?,
            a.remainder.checked_mul(b.remainder)?,
        )
    } else if b.is_constant() {
        ModulusRemainder::reduced(
            b.remainder.checked_mul(a.modulus)?,
            a.remainder.checked_mul(b.remainder)?,
        )
    } else if a.remainder == 0 && b.remainder == 0 {
        ModulusRemainder::reduced(a.modulus.checked_mul(b.modulus)?, 0)
    } else if a.remainder == 0 {
        ModulusRemainder::reduced(a.modulus.checked_mul(gcd(b.modulus, b.remainder))?, 0)
    } else if b.remainder == 0 {
        ModulusRemainder::reduced(b.modulus.checked_mul(gcd(a.modulus, a.remainder))?, 0)
    } else {
        // (ma*i + ra) * (mb*j + rb) == ra*rb modulo gcd(ma, mb).
        ModulusRemainder::reduced(
            gcd(a.modulus, b.modulus),
            a.remainder.checked_mul(b.remainder)?,
        )
    };
    Some(result)
}

/// The modulus-remainder fact of a scalar integer expression.
pub fn modulus_remainder(e: &Expr) -> ModulusRemainder {
    let scope = Scope::new();
    modulus_remainder_in(e, &scope)
}

/// As `modulus_remainder`, with facts about free variables taken from `scope`.
pub fn modulus_remainder_in(e: &Expr, scope: &Scope<ModulusRemainder>) -> ModulusRemainder {
    let mut compute = ComputeModulusRemainder {
        scope: Scope::with_containing(scope),
    };
    let result = compute.analyze(e);
    trace!("modulus_remainder({}) = {:?}", e, result);
    result
}

/// The remainder of `e` modulo `modulus`, if the analysis determines it.
pub fn reduce_expr_modulo(e: &Expr, modulus: i64) -> Option<i64> {
    let scope = Scope::new();
    reduce_expr_modulo_in(e, modulus, &scope)
}

pub fn reduce_expr_modulo_in(e: &Expr, modulus: i64, scope: &Scope<ModulusRemainder>) -> Option<i64> {
    if modulus == 0 {
        return None;
    }
    let result = modulus_remainder_in(e, scope);
    // A fact modulo 8 answers questions modulo 4, not modulo 16.
    (result.modulus % modulus == 0).then(|| mod_imp(result.remainder, modulus))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir_core::{ir_operator::*, Var};

    fn check(e: Expr, modulus: i64, remainder: i64) {
        assert_eq!(
            modulus_remainder(&e),
            ModulusRemainder::new(modulus, remainder),
            "{}",
            e
        );
    }

    #[test]
    fn test_linear_combinations() {
        let x = Expr::variable(Type::int(32), "x");
        let y = Expr::variable(Type::int(32), "y");
        check((&x * 30 + 3) + (&y * 40 + 2), 10, 5);
        check(&x * 10 - &y * 33, 1, 0);
        check(&x * 10 - &y * 35, 5, 0);
        check(make_const(Type::int(32), 123), 0, 123);
        check(&x * 4 - 1, 4, 3);
    }

    #[test]
    fn test_products() {
        let x = Expr::variable(Type::int(32), "x");
        let y = Expr::variable(Type::int(32), "y");
        // Neither side constant and neither remainder zero.
        check((&x * 6 + 3) * (&y * 4 + 1), 2, 1);
        check((&x * 6) * (&y * 4 + 2), 12, 0);
        check((&x * 6) * (&y * 4), 24, 0);
    }

    #[test]
    fn test_alternatives() {
        let x = Expr::variable(Type::int(32), "x");
        let y = Expr::variable(Type::int(32), "y");
        check(max(&x * 30 - 24, &y * 40 + 31), 5, 1);
        check(select(lt(&x, &y), &x * 4 + 1, &y * 8 + 5), 4, 1);
        check(min(make_const(Type::int(32), 3), make_const(Type::int(32), 3)), 0, 3);
    }

    #[test]
    fn test_mod_and_let() {
        let x = Expr::variable(Type::int(32), "x");
        check((&x * 6 + 5) % 4, 2, 1);
        check(make_const(Type::int(32), -7) % 4, 0, 1);

        let v = Var::new("v");
        let ve = v.to_expr(Type::int(32));
        let e = Expr::make_let(v, &x * 3 + 4, &ve * 3 + 4);
        check(e, 9, 7);
    }

    #[test]
    fn test_scoped_facts_and_reduction() {
        let v = Var::new("v");
        let ve = v.to_expr(Type::int(32));
        let mut scope = Scope::new();
        scope.push(v, ModulusRemainder::new(8, 3));
        assert_eq!(
            modulus_remainder_in(&(&ve * 2), &scope),
            ModulusRemainder::new(16, 6)
        );
        assert_eq!(reduce_expr_modulo_in(&(&ve + 1), 4, &scope), Some(0));
        assert_eq!(reduce_expr_modulo_in(&ve, 16, &scope), None);
        assert_eq!(reduce_expr_modulo(&make_const(Type::int(32), -3), 4), Some(1));
    }

    #[test]
    fn test_gcd_lcm() {
        assert_eq!(gcd(0, 12), 12);
        assert_eq!(gcd(-25, 10), 5);
        assert_eq!(lcm(4, 6), Some(12));
    }
}
