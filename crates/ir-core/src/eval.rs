// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! A reference evaluator for scalar integer and boolean expressions, used to
//! check rewrites against concrete variable assignments.
//!
//! Booleans evaluate to 0 or 1. Division and modulo are Euclidean. Narrow
//! integer types wrap; signed types of 32 bits or more have undefined
//! overflow, so an overflowing operation evaluates to `None`, as do division
//! by zero, poison, indeterminate values and unsupported node kinds.

use crate::{
    ir::{Expr, ExprKind},
    ir_operator::{div_imp, mod_imp},
    scope::Scope,
    types::Type,
};

/// Bring an exact result into the range of `ty`, or `None` on undefined overflow.
fn fit(ty: Type, value: i128) -> Option<i64> {
    if ty.is_bool() {
        return Some((value != 0) as i64);
    }
    let bits = ty.bits() as u32;
    if ty.is_int() {
        if bits >= 32 {
            let v = i64::try_from(value).ok()?;
            return ty.can_represent(v).then_some(v);
        }
        let shift = 128 - bits;
        Some(((value << shift) >> shift) as i64)
    } else if ty.is_uint() {
        let mask = if bits >= 64 { u64::MAX as i128 } else { (1i128 << bits) - 1 };
        // Unsigned values above i64::MAX are not supported.
        i64::try_from(value & mask).ok()
    } else {
        None
    }
}

/// Evaluate `e` with variables bound in `env`.
pub fn eval(e: &Expr, env: &Scope<i64>) -> Option<i64> {
    let mut scope = Scope::with_containing(env);
    eval_in(e, &mut scope)
}

fn binary(env: &mut Scope<i64>, a: &Expr, b: &Expr) -> Option<(i128, i128)> {
    Some((eval_in(a, env)? as i128, eval_in(b, env)? as i128))
}

fn eval_in(e: &Expr, env: &mut Scope<i64>) -> Option<i64> {
    let ty = e.ty();
    if ty.is_vector() || ty.is_float() || ty.is_handle() {
        return None;
    }
    use ExprKind::*;
    match e.kind() {
        IntImm(v) => Some(*v),
        UIntImm(v) => i64::try_from(*v).ok(),
        Variable(var) => env.get(var).copied(),
        Cast(v) => {
            let value = eval_in(v, env)?;
            fit(ty, value as i128).or_else(|| {
                // Casts wrap at every width.
                let shift = 128 - ty.bits() as u32;
                ty.is_int().then(|| ((value as i128) << shift >> shift) as i64)
            })
        },
        Add(a, b) => {
            let (a, b) = binary(env, a, b)?;
            fit(ty, a + b)
        },
        Sub(a, b) => {
            let (a, b) = binary(env, a, b)?;
            fit(ty, a - b)
        },
        Mul(a, b) => {
            let (a, b) = binary(env, a, b)?;
            fit(ty, a.checked_mul(b)?)
        },
        Div(a, b) => {
            let (a, b) = binary(env, a, b)?;
            if b == 0 {
                return None;
            }
            let q = if ty.is_uint() {
                a / b
            } else {
                div_imp(a as i64, b as i64) as i128
            };
            fit(ty, q)
        },
        Mod(a, b) => {
            let (a, b) = binary(env, a, b)?;
            if b == 0 {
                return None;
            }
            let r = if ty.is_uint() {
                a % b
            } else {
                mod_imp(a as i64, b as i64) as i128
            };
            fit(ty, r)
        },
        Min(a, b) => {
            let (a, b) = binary(env, a, b)?;
            Some(a.min(b) as i64)
        },
        Max(a, b) => {
            let (a, b) = binary(env, a, b)?;
            Some(a.max(b) as i64)
        },
        Eq(a, b) => binary(env, a, b).map(|(a, b)| (a == b) as i64),
        Ne(a, b) => binary(env, a, b).map(|(a, b)| (a != b) as i64),
        Lt(a, b) => binary(env, a, b).map(|(a, b)| (a < b) as i64),
        Le(a, b) => binary(env, a, b).map(|(a, b)| (a <= b) as i64),
        Gt(a, b) => binary(env, a, b).map(|(a, b)| (a > b) as i64),
        Ge(a, b) => binary(env, a, b).map(|(a, b)| (a >= b) as i64),
        And(a, b) => binary(env, a, b).map(|(a, b)| (a != 0 && b != 0) as i64),
        Or(a, b) => binary(env, a, b).map(|(a, b)| (a != 0 || b != 0) as i64),
        Not(a) => eval_in(a, env).map(|a| (a == 0) as i64),
        Select(c, t, f) => {
            // All three operands are evaluated, as a select does.
            let (c, t, f) = (eval_in(c, env)?, eval_in(t, env)?, eval_in(f, env)?);
            Some(if c != 0 { t } else { f })
        },
        Let { var, value, body } => {
            let value = eval_in(value, env)?;
            env.push(var.clone(), value);
            let result = eval_in(body, env);
            env.pop(var);
            result
        },
        Call { .. } if e.is_intrinsic(crate::ir::intrinsic::LIKELY) => {
            let (_, args, _) = e.as_call()?;
            eval_in(&args[0], env)
        },
        StringImm(_) | FloatImm(_) | Load { .. } | Ramp { .. } | Broadcast { .. }
        | Shuffle { .. } | Call { .. } | Poison(_) | Indeterminate(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ir::Var, ir_operator::*};

    #[test]
    fn test_eval_arithmetic() {
        let x = Var::new("x");
        let xe = x.to_expr(Type::int(32));
        let mut env = Scope::new();
        env.push(x, -23);
        assert_eq!(eval(&(&xe / 4), &env), Some(-6));
        assert_eq!(eval(&(&xe % 4), &env), Some(1));
        assert_eq!(eval(&select(lt(&xe, 0), 1, 2), &env), Some(1));
        assert_eq!(eval(&(&xe / 0), &env), None);
    }

    #[test]
    fn test_eval_overflow() {
        let x = Var::new("x");
        let xe = x.to_expr(Type::int(32));
        let mut env = Scope::new();
        env.push(x, i32::MAX as i64);
        assert_eq!(eval(&(&xe + 1), &env), None);
        let narrow = cast(Type::int(8), make_const(Type::int(32), 100));
        assert_eq!(eval(&(&narrow + &narrow), &env), Some(-56));
    }

    #[test]
    fn test_eval_let() {
        let x = Var::new("x");
        let y = Var::new("y");
        let e = Expr::make_let(
            y.clone(),
            x.to_expr(Type::int(32)) * 2,
            y.to_expr(Type::int(32)) + 1,
        );
        let mut env = Scope::new();
        env.push(x, 5);
        assert_eq!(eval(&e, &env), Some(11));
    }
}
