// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use ir_core::{
    eval::eval,
    ir_operator::*,
    substitute::{graph_substitute, substitute, substitute_expr, substitute_map},
    visitor::{count_var_uses, expr_uses_var},
    Expr, Scope, Type, Var,
};
use proptest::{
    prelude::*,
    test_runner::{Config, TestRunner},
};
use std::collections::BTreeMap;
use test_case::test_case;

fn int() -> Type {
    Type::int(32)
}

/// Integer expressions over `x` and `y` with small constants.
fn arb_expr(x: &Var, y: &Var) -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        Just(x.to_expr(int())),
        Just(y.to_expr(int())),
        (-8i64..8).prop_map(|v| make_const(int(), v)),
    ];
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a + b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a - b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a * b),
            (inner.clone(), 1i64..5).prop_map(|(a, k)| a / k),
            (inner.clone(), 1i64..5).prop_map(|(a, k)| a % k),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| min(a, b)),
            (inner.clone(), inner.clone(), inner).prop_map(|(a, b, c)| select(lt(&a, &b), b, c)),
        ]
    })
}

#[test]
fn test_euclidean_division_law() {
    let strategy = (-1000i64..1000, prop_oneof![-50i64..-1, 1i64..50]);
    let mut runner = TestRunner::new(Config::with_cases(512));
    runner
        .run(&strategy, |(a, b)| {
            let (q, r) = (div_imp(a, b), mod_imp(a, b));
            prop_assert_eq!(q * b + r, a);
            prop_assert!(0 <= r && r < b.abs());
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_substitution_agrees_with_binding() {
    let (x, y) = (Var::new("x"), Var::new("y"));
    let strategy = (arb_expr(&x, &y), -20i64..20, -20i64..20);
    let mut runner = TestRunner::new(Config::with_cases(256));
    runner
        .run(&strategy, |(e, xv, yv)| {
            let mut env = Scope::new();
            env.push(x.clone(), xv);
            env.push(y.clone(), yv);
            let expected = eval(&e, &env);

            let mut y_only = Scope::new();
            y_only.push(y.clone(), yv);
            let replaced = substitute(&x, &make_const(int(), xv), &e);
            prop_assert!(!expr_uses_var(&replaced, &x));
            prop_assert_eq!(eval(&replaced, &y_only), expected);
            let shared = graph_substitute(&x, &make_const(int(), xv), &e);
            prop_assert_eq!(&shared, &replaced);
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_substitute_map_is_simultaneous() {
    let (x, y) = (Var::new("x"), Var::new("y"));
    let (xe, ye) = (x.to_expr(int()), y.to_expr(int()));
    let mut swap = BTreeMap::new();
    swap.insert(x, ye.clone());
    swap.insert(y, xe.clone());
    assert_eq!(substitute_map(&swap, &(&xe - &ye)), &ye - &xe);
}

#[test_case(1, 1 ; "single use")]
#[test_case(2, 2 ; "shared subterm")]
#[test_case(3, 3 ; "three copies")]
fn test_pattern_substitution_replaces_every_copy(copies: usize, expected_uses: usize) {
    let (x, y, z) = (Var::new("x"), Var::new("y"), Var::new("z"));
    let pattern = x.to_expr(int()) + y.to_expr(int());
    let e = (1..copies).fold(pattern.clone(), |acc, _| acc * &pattern);
    let replaced = substitute_expr(&pattern, &z.to_expr(int()), &e);
    assert_eq!(count_var_uses(&replaced, &z), expected_uses);
    assert!(!expr_uses_var(&replaced, &x));
}
