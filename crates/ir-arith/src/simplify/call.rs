// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Intrinsic and math-function calls.

use super::{const_float, const_int, const_uint, propagate_markers, Simplifier};
use ir_core::{
    ir::intrinsic,
    ir_operator::{
        as_string, is_const_power_of_two_integer, make_bool, make_const, make_const_float,
        make_const_uint,
    },
    mutator::mutate_exprs,
    CallType, Expr, ExprKind,
};
use log::warn;

const ROUNDING: &[&str] = &["floor", "ceil", "round", "trunc"];

pub(super) fn visit_call(s: &mut Simplifier, e: &Expr) -> Expr {
    let Some((name, args, call_type)) = e.as_call() else {
        return e.clone();
    };
    if call_type.is_intrinsic() {
        match name {
            intrinsic::SHIFT_LEFT | intrinsic::SHIFT_RIGHT if args.len() == 2 => {
                return visit_shift(s, e, name, args, call_type);
            },
            intrinsic::BITWISE_AND if args.len() == 2 => return visit_bitwise_and(s, e, args, call_type),
            intrinsic::BITWISE_OR | intrinsic::BITWISE_XOR | intrinsic::BITWISE_NOT => {
                return rebuild(s, e, true);
            },
            intrinsic::ABS if args.len() == 1 => return visit_abs(s, e, args, call_type),
            intrinsic::STRINGIFY => return visit_stringify(s, e, args, call_type),
            _ => {},
        }
    } else if call_type == CallType::PureExtern {
        if let Some(func) = name.strip_suffix("_f32").or_else(|| name.strip_suffix("_f64")) {
            return visit_math(s, e, func);
        }
    }
    rebuild(s, e, false)
}

/// Simplifies the arguments only. Pure operators absorb markers.
fn rebuild(s: &mut Simplifier, e: &Expr, absorb_markers: bool) -> Expr {
    let Some((name, args, call_type)) = e.as_call() else {
        return e.clone();
    };
    let (new_args, changed) = mutate_exprs(s, args);
    if absorb_markers {
        let refs: Vec<&Expr> = new_args.iter().collect();
        if let Some(marker) = propagate_markers(e.ty(), &refs) {
            return marker;
        }
    }
    if changed {
        Expr::make_call(e.ty(), name, new_args, call_type)
    } else {
        e.clone()
    }
}

fn visit_shift(s: &mut Simplifier, e: &Expr, name: &str, args: &[Expr], call_type: CallType) -> Expr {
    let ty = e.ty();
    let a = s.mutate(&args[0]);
    let b = s.mutate(&args[1]);
    if let Some(marker) = propagate_markers(ty, &[&a, &b]) {
        return marker;
    }
    let amount = const_int(&b).or_else(|| const_uint(&b).and_then(|u| i64::try_from(u).ok()));
    if let Some(mut amount) = amount {
        let mut left = name == intrinsic::SHIFT_LEFT;
        if ty.is_int() && amount < 0 {
            left = !left;
            amount = amount.saturating_neg();
        }
        if (0..i64::from(ty.bits().min(64)) - 1).contains(&amount) {
            let factor = make_const(ty, 1i64 << amount);
            return if left {
                s.mutate(&Expr::make_mul(a, factor))
            } else {
                s.mutate(&Expr::make_div(a, factor))
            };
        }
        warn!("cannot replace shift by {} of {} with arithmetic without overflow", amount, ty);
    }
    if a.same_as(&args[0]) && b.same_as(&args[1]) {
        e.clone()
    } else {
        Expr::make_call(ty, name, vec![a, b], call_type)
    }
}

fn visit_bitwise_and(s: &mut Simplifier, e: &Expr, args: &[Expr], call_type: CallType) -> Expr {
    let ty = e.ty();
    let a = s.mutate(&args[0]);
    let b = s.mutate(&args[1]);
    if let Some(marker) = propagate_markers(ty, &[&a, &b]) {
        return marker;
    }
    let b_ty = b.ty();
    // A low-bit mask is a Euclidean modulo by the next power of two.
    let modulus = if let Some(mask) = const_int(&b) {
        (!b_ty.is_max(mask))
            .then(|| mask.checked_add(1))
            .flatten()
            .map(|m| make_const(a.ty(), m))
    } else if let Some(mask) = const_uint(&b) {
        if b_ty.is_max_uint(mask) {
            return a;
        }
        mask.checked_add(1).map(|m| make_const_uint(a.ty(), m))
    } else {
        None
    };
    if let Some(modulus) = modulus.filter(|m| is_const_power_of_two_integer(m).is_some()) {
        return s.mutate(&Expr::make_mod(a, modulus));
    }
    if a.same_as(&args[0]) && b.same_as(&args[1]) {
        e.clone()
    } else {
        Expr::make_call(ty, intrinsic::BITWISE_AND, vec![a, b], call_type)
    }
}

fn visit_abs(s: &mut Simplifier, e: &Expr, args: &[Expr], call_type: CallType) -> Expr {
    let a = s.mutate(&args[0]);
    if let Some(marker) = propagate_markers(e.ty(), &[&a]) {
        return marker;
    }
    let a_ty = a.ty();
    if a_ty.is_int() {
        if let Some(v) = const_int(&a) {
            // The minimum of int64 has no positive counterpart.
            return make_const(e.ty(), v.checked_abs().unwrap_or(v));
        }
    } else if a_ty.is_uint() {
        return a;
    } else if let Some(f) = const_float(&a) {
        return make_const_float(a_ty, f.abs());
    }
    if a.same_as(&args[0]) {
        e.clone()
    } else {
        Expr::make_call(e.ty(), intrinsic::ABS, vec![a], call_type)
    }
}

/// Concatenates runs of constant arguments eagerly. Integers always render;
/// floats render only after a string they can join.
fn visit_stringify(s: &mut Simplifier, e: &Expr, args: &[Expr], call_type: CallType) -> Expr {
    let mut new_args: Vec<Expr> = Vec::with_capacity(args.len());
    let mut changed = false;
    for arg in args {
        let new_arg = s.mutate(arg);
        changed |= !new_arg.same_as(arg);
        let last = new_args.last().and_then(as_string).map(str::to_owned);
        let text = match new_arg.kind() {
            ExprKind::StringImm(v) if last.is_some() => Some(v.to_string()),
            ExprKind::IntImm(v) => Some(v.to_string()),
            ExprKind::FloatImm(v) if last.is_some() => Some(format!("{:.6}", v.0)),
            _ => None,
        };
        match (text, last) {
            (Some(text), Some(last)) => {
                if let Some(slot) = new_args.last_mut() {
                    *slot = Expr::make_string(last + &text);
                }
                changed = true;
            },
            (Some(text), None) => {
                new_args.push(Expr::make_string(text));
                changed = true;
            },
            (None, _) => new_args.push(new_arg),
        }
    }
    if new_args.len() == 1 && as_string(&new_args[0]).is_some() {
        return new_args.swap_remove(0);
    }
    if changed {
        Expr::make_call(e.ty(), intrinsic::STRINGIFY, new_args, call_type)
    } else {
        e.clone()
    }
}

fn fold_math(func: &str, args: &[f64]) -> Option<f64> {
    Some(match (func, args) {
        ("sqrt", [x]) => x.sqrt(),
        ("log", [x]) => x.ln(),
        ("exp", [x]) => x.exp(),
        ("pow", [x, y]) => x.powf(*y),
        ("floor", [x]) => x.floor(),
        ("ceil", [x]) => x.ceil(),
        ("round", [x]) => x.round_ties_even(),
        ("trunc", [x]) => x.trunc(),
        _ => return None,
    })
}

fn is_rounding_call(e: &Expr) -> bool {
    matches!(e.as_call(), Some((name, _, CallType::PureExtern))
        if name.strip_suffix("_f32")
            .or_else(|| name.strip_suffix("_f64"))
            .is_some_and(|func| ROUNDING.contains(&func)))
}

fn visit_math(s: &mut Simplifier, e: &Expr, func: &str) -> Expr {
    let Some((name, args, call_type)) = e.as_call() else {
        return e.clone();
    };
    let (new_args, changed) = mutate_exprs(s, args);
    let refs: Vec<&Expr> = new_args.iter().collect();
    if let Some(marker) = propagate_markers(e.ty(), &refs) {
        return marker;
    }
    let constants: Option<Vec<f64>> = new_args.iter().map(const_float).collect();
    if let Some(constants) = constants {
        if func == "is_nan" {
            if let [x] = constants.as_slice() {
                return make_bool(x.is_nan(), 1);
            }
        } else if let Some(value) = fold_math(func, &constants) {
            return Expr::make_float(e.ty(), value);
        }
    }
    if ROUNDING.contains(&func) {
        // Rounding an integer-valued result is the identity.
        if let [arg] = new_args.as_slice() {
            if is_rounding_call(arg) {
                return arg.clone();
            }
        }
    }
    if changed {
        Expr::make_call(e.ty(), name, new_args, call_type)
    } else {
        e.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::super::simplify_expr;
    use ir_core::{ir::intrinsic, ir_operator::*, CallType, Expr, Type};

    fn var(name: &str) -> Expr {
        Expr::variable(Type::int(32), name)
    }

    #[test]
    fn test_shifts_become_arithmetic() {
        let x = var("x");
        assert_eq!(simplify_expr(&shift_left(&x, 3)), &x * 8);
        assert_eq!(simplify_expr(&shift_right(&x, 2)), &x / 4);
        // A negative signed shift goes the other way.
        assert_eq!(simplify_expr(&shift_left(&x, -1)), &x / 2);
        // Shifting into the sign bit is left alone.
        let e = shift_left(&x, 31);
        assert!(simplify_expr(&e).same_as(&e));
        assert_eq!(simplify_expr(&shift_left(3, 2)), make_const(Type::int(32), 12));
    }

    #[test]
    fn test_low_bit_masks_become_modulo() {
        let x = var("x");
        assert_eq!(simplify_expr(&bitwise_and(&x, 7)), &x % 8);
        let e = bitwise_and(&x, 6);
        assert!(simplify_expr(&e).same_as(&e));
        let u = Expr::variable(Type::uint(8), "u");
        let all = make_const_uint(Type::uint(8), 255);
        assert_eq!(simplify_expr(&bitwise_and(&u, all)), u);
        let low = make_const_uint(Type::uint(8), 15);
        assert_eq!(
            simplify_expr(&bitwise_and(&u, low)),
            Expr::make_mod(u.clone(), make_const_uint(Type::uint(8), 16))
        );
    }

    #[test]
    fn test_abs_of_constants() {
        assert_eq!(simplify_expr(&abs(-5)), make_const(Type::uint(32), 5));
        assert_eq!(
            simplify_expr(&abs(make_const_float(Type::float(32), -2.5))),
            make_const_float(Type::float(32), 2.5)
        );
        let u = Expr::variable(Type::uint(16), "u");
        let e = Expr::make_call(Type::uint(16), intrinsic::ABS, vec![u.clone()], CallType::PureIntrinsic);
        assert_eq!(simplify_expr(&e), u);
    }

    #[test]
    fn test_stringify_concatenates_constants() {
        let e = stringify(vec![Expr::make_string("a"), make_const(Type::int(32), 3), Expr::make_string("b")]);
        assert_eq!(simplify_expr(&e), Expr::make_string("a3b"));
        let e = stringify(vec![Expr::make_string("f="), make_const_float(Type::float(32), 0.5)]);
        assert_eq!(simplify_expr(&e), Expr::make_string("f=0.500000"));
        let x = var("x");
        let e = stringify(vec![Expr::make_string("x="), x.clone()]);
        assert!(simplify_expr(&e).same_as(&e));
        let e = stringify(vec![make_const(Type::int(32), 1), Expr::make_string("+"), x.clone()]);
        assert_eq!(
            simplify_expr(&e),
            stringify(vec![Expr::make_string("1+"), x])
        );
    }

    #[test]
    fn test_math_functions_fold() {
        let f = |v: f64| make_const_float(Type::float(32), v);
        assert_eq!(simplify_expr(&sqrt(f(16.0))), f(4.0));
        assert_eq!(simplify_expr(&floor(f(-1.5))), f(-2.0));
        assert_eq!(simplify_expr(&ceil(f(-1.5))), f(-1.0));
        assert_eq!(simplify_expr(&round(f(2.5))), f(2.0));
        assert_eq!(simplify_expr(&trunc(f(-1.5))), f(-1.0));
        assert_eq!(simplify_expr(&pow(f(2.0), f(10.0))), f(1024.0));
        assert_eq!(simplify_expr(&exp(f(0.0))), f(1.0));
        let d = Expr::make_float(Type::float(64), 1.0);
        assert_eq!(simplify_expr(&log(d)), Expr::make_float(Type::float(64), 0.0));
    }

    #[test]
    fn test_nested_rounding_collapses() {
        let y = Expr::variable(Type::float(32), "y");
        assert_eq!(simplify_expr(&floor(ceil(&y))), ceil(&y));
        let e = floor(sqrt(&y));
        assert!(simplify_expr(&e).same_as(&e));
    }

    #[test]
    fn test_is_nan_folds() {
        let call = |v: f64| {
            Expr::make_call(
                Type::boolean(),
                "is_nan_f32",
                vec![make_const_float(Type::float(32), v)],
                CallType::PureExtern,
            )
        };
        assert_eq!(simplify_expr(&call(f64::NAN)), const_true(1));
        assert_eq!(simplify_expr(&call(1.0)), const_false(1));
    }

    #[test]
    fn test_markers_absorb_pure_intrinsics() {
        let x = var("x");
        let p = Expr::make_poison(Type::int(32));
        assert!(simplify_expr(&bitwise_xor(&x, &p)).is_poison());
        assert!(simplify_expr(&shift_left(&p, 1)).is_poison());
    }
}
