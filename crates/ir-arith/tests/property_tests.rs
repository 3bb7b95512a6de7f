// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Randomised checks of the simplifier and the analyses against the
//! reference evaluator.

use anyhow::anyhow;
use ir_arith::{can_prove, extract_lane, extract_lanes, modulus_remainder, simplify_expr};
use ir_core::{eval::eval, ir_operator::*, visitor::expr_uses_var, Expr, Scope, Type, Var};
use itertools::iproduct;
use proptest::{
    prelude::*,
    test_runner::{Config, TestRunner},
};

fn int() -> Type {
    Type::int(32)
}

fn arb_const() -> impl Strategy<Value = i64> {
    prop_oneof![
        8 => -1000i64..1000,
        1 => Just(0i64),
        1 => Just(-1i64),
        1 => Just(i32::MIN as i64),
        1 => Just(i32::MAX as i64),
    ]
}

/// Integer expressions over `x` and `y` with small constants. Division and
/// modulo are by positive constants only.
fn arb_expr(x: &Var, y: &Var, with_division: bool) -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        Just(x.to_expr(int())),
        Just(y.to_expr(int())),
        (-8i64..8).prop_map(|v| make_const(int(), v)),
    ];
    leaf.prop_recursive(4, 32, 2, move |inner| {
        let divisor = if with_division { 1i64..6 } else { 1i64..2 };
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a + b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a - b),
            (inner.clone(), -4i64..5).prop_map(|(a, k)| a * k),
            (inner.clone(), divisor.clone()).prop_map(|(a, k)| a / k),
            (inner.clone(), divisor).prop_map(|(a, k)| a % k),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| min(a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| max(a, b)),
            (inner.clone(), inner.clone(), inner).prop_map(|(a, b, c)| select(lt(&a, &b), b, c)),
        ]
    })
}

fn env_of(x: &Var, xv: i64, y: &Var, yv: i64) -> Scope<'static, i64> {
    let mut env = Scope::new();
    env.push(x.clone(), xv);
    env.push(y.clone(), yv);
    env
}

#[test]
fn test_constant_folding_matches_evaluation() -> anyhow::Result<()> {
    let strategy = (0usize..7, arb_const(), arb_const());
    let mut runner = TestRunner::new(Config::with_cases(512));
    runner
        .run(&strategy, |(op, a, b)| {
            let (a, b) = (make_const(int(), a), make_const(int(), b));
            let e = match op {
                0 => &a + &b,
                1 => &a - &b,
                2 => &a * &b,
                3 => &a / &b,
                4 => &a % &b,
                5 => min(&a, &b),
                _ => max(&a, &b),
            };
            let folded = simplify_expr(&e);
            match eval(&e, &Scope::new()) {
                Some(v) => {
                    prop_assert_eq!(as_const_int(&folded), Some(v), "{}", e);
                },
                None => {
                    prop_assert!(
                        folded.is_poison() || folded.is_indeterminate(),
                        "{} => {}",
                        e,
                        folded
                    );
                },
            }
            Ok(())
        })
        .map_err(|err| anyhow!("{}", err))
}

#[test]
fn test_simplification_preserves_values() -> anyhow::Result<()> {
    let (x, y) = (Var::new("x"), Var::new("y"));
    let strategy = (arb_expr(&x, &y, true), -100i64..100, -100i64..100);
    let mut runner = TestRunner::new(Config::with_cases(256));
    runner
        .run(&strategy, |(e, xv, yv)| {
            let env = env_of(&x, xv, &y, yv);
            if let Some(v) = eval(&e, &env) {
                let simplified = simplify_expr(&e);
                prop_assert_eq!(eval(&simplified, &env), Some(v), "{} => {}", e, simplified);
            }
            Ok(())
        })
        .map_err(|err| anyhow!("{}", err))
}

#[test]
fn test_simplification_is_idempotent() -> anyhow::Result<()> {
    let (x, y) = (Var::new("x"), Var::new("y"));
    let mut runner = TestRunner::new(Config::with_cases(512));
    runner
        .run(&arb_expr(&x, &y, true), |e| {
            let once = simplify_expr(&e);
            let twice = simplify_expr(&once);
            prop_assert_eq!(&twice, &once, "{}", e);
            Ok(())
        })
        .map_err(|err| anyhow!("{}", err))
}

#[test]
fn test_let_bindings_are_transparent() -> anyhow::Result<()> {
    let (x, v) = (Var::new("x"), Var::new("v"));
    let strategy = (arb_expr(&x, &x, true), arb_expr(&x, &v, true), -100i64..100);
    let mut runner = TestRunner::new(Config::with_cases(512));
    runner
        .run(&strategy, |(value, body, xv)| {
            let e = Expr::make_let(v.clone(), value, body);
            let mut env = Scope::new();
            env.push(x.clone(), xv);
            if let Some(expected) = eval(&e, &env) {
                let simplified = simplify_expr(&e);
                prop_assert_eq!(eval(&simplified, &env), Some(expected), "{} => {}", e, simplified);
            }
            Ok(())
        })
        .map_err(|err| anyhow!("{}", err))
}

#[test]
fn test_let_bound_markers_poison_their_uses() -> anyhow::Result<()> {
    let (x, v) = (Var::new("x"), Var::new("v"));
    let strategy = (any::<bool>(), arb_expr(&x, &v, true));
    let mut runner = TestRunner::new(Config::with_cases(256));
    runner
        .run(&strategy, |(poison, body)| {
            let marker = if poison {
                Expr::make_poison(int())
            } else {
                Expr::make_indeterminate(int())
            };
            let uses_marker = expr_uses_var(&body, &v);
            let e = Expr::make_let(v.clone(), marker, body);
            let simplified = simplify_expr(&e);
            if uses_marker {
                let absorbed = if poison {
                    simplified.is_poison()
                } else {
                    simplified.is_indeterminate()
                };
                prop_assert!(absorbed, "{} => {}", e, simplified);
            } else {
                prop_assert!(!expr_uses_var(&simplified, &v), "{} => {}", e, simplified);
            }
            Ok(())
        })
        .map_err(|err| anyhow!("{}", err))
}

#[test]
fn test_proven_comparisons_hold() -> anyhow::Result<()> {
    let (x, y) = (Var::new("x"), Var::new("y"));
    let strategy = (arb_expr(&x, &y, false), arb_expr(&x, &y, false));
    let mut runner = TestRunner::new(Config::with_cases(128));
    runner
        .run(&strategy, |(a, b)| {
            let claim = le(&a, &b);
            if can_prove(&claim) {
                for (xv, yv) in iproduct!([-50i64, -1, 0, 3, 41], [-7i64, 0, 2, 64]) {
                    let env = env_of(&x, xv, &y, yv);
                    let holds = eval(&claim, &env);
                    prop_assert!(holds.is_none_or(|v| v == 1), "{} at x={} y={}", claim, xv, yv);
                }
            }
            Ok(())
        })
        .map_err(|err| anyhow!("{}", err))
}

#[test]
fn test_modulus_remainder_is_sound() -> anyhow::Result<()> {
    let (x, y) = (Var::new("x"), Var::new("y"));
    let strategy = (arb_expr(&x, &y, true), -100i64..100, -100i64..100);
    let mut runner = TestRunner::new(Config::with_cases(256));
    runner
        .run(&strategy, |(e, xv, yv)| {
            let mr = modulus_remainder(&e);
            if let Some(v) = eval(&e, &env_of(&x, xv, &y, yv)) {
                if mr.modulus == 0 {
                    prop_assert_eq!(v, mr.remainder, "{}", e);
                } else {
                    prop_assert_eq!(mod_imp(v - mr.remainder, mr.modulus), 0, "{} is {:?}", e, mr);
                }
            }
            Ok(())
        })
        .map_err(|err| anyhow!("{}", err))
}

#[test]
fn test_extracted_lanes_of_affine_vectors() -> anyhow::Result<()> {
    let x = Var::new("x");
    let strategy = (2u16..17, -5i64..6, -5i64..6, -50i64..50)
        .prop_flat_map(|(lanes, stride, offset, xv)| {
            (Just((lanes, stride, offset, xv)), 0..lanes)
        })
        .prop_flat_map(|(params, start)| {
            let lanes = params.0;
            (Just((params, start)), 1..=(lanes - start))
        });
    let mut runner = TestRunner::new(Config::with_cases(128));
    runner
        .run(&strategy, |(((lanes, stride, offset, xv), start), lane_stride)| {
            let xe = x.to_expr(int());
            let e = ramp(&xe * 3, stride, lanes) + broadcast(&xe + offset, lanes);
            let new_lanes = (lanes - start).div_ceil(lane_stride);
            let picked = extract_lanes(&e, start, lane_stride, new_lanes);
            prop_assert_eq!(picked.ty().lanes(), new_lanes);

            let mut env = Scope::new();
            env.push(x.clone(), xv);
            for i in 0..new_lanes {
                let lane = if new_lanes == 1 { picked.clone() } else { extract_lane(&picked, i) };
                let original = extract_lane(&e, start + i * lane_stride);
                prop_assert_eq!(eval(&lane, &env), eval(&original, &env));
                prop_assert!(eval(&lane, &env).is_some());
            }
            Ok(())
        })
        .map_err(|err| anyhow!("{}", err))
}
