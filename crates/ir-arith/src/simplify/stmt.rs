// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Statement rules.

use super::{const_int, let_, Simplifier};
use ir_core::{
    ir_operator::{
        const_false, const_true, is_const, is_no_op, is_one, is_undef, is_zero, no_op, not,
    },
    mutator::{mutate_exprs, walk_stmt, IrMutator},
    substitute::{substitute_expr_stmt, substitute_stmt},
    visitor::expr_is_pure,
    Expr, Stmt, StmtKind, Var,
};
use log::warn;

pub(super) fn visit_stmt(s: &mut Simplifier, st: &Stmt) -> Stmt {
    use StmtKind::*;
    match st.kind() {
        LetStmt { var, value, body } => let_::visit_let_stmt(s, st, var, value, body),
        AssertStmt { .. } => visit_assert(s, st),
        For {
            var,
            min,
            extent,
            body,
            ..
        } => visit_for(s, st, var, min, extent, body),
        Store {
            buffer,
            value,
            index,
            predicate,
        } => visit_store(s, st, buffer, value, index, predicate),
        Allocate { .. } => visit_allocate(s, st),
        ProducerConsumer {
            name,
            is_producer,
            body,
        } => {
            let new_body = s.mutate_stmt(body);
            if is_no_op(&new_body) {
                no_op()
            } else if new_body.same_as(body) {
                st.clone()
            } else {
                Stmt::make_producer_consumer(name.clone(), *is_producer, new_body)
            }
        },
        IfThenElse {
            condition,
            then_case,
            else_case,
        } => visit_if(s, st, condition, then_case, else_case.as_ref()),
        Evaluate(value) => visit_evaluate(s, st, value),
        Block { first, rest } => visit_block(s, st, first, rest),
    }
}

fn visit_assert(s: &mut Simplifier, st: &Stmt) -> Stmt {
    let result = walk_stmt(s, st);
    if let StmtKind::AssertStmt { condition, body, .. } = result.kind() {
        if is_zero(condition) {
            warn!("assertion is guaranteed to fail at runtime:\n{}", result);
        } else if is_one(condition) {
            return body.clone();
        }
    }
    result
}

fn visit_for(s: &mut Simplifier, st: &Stmt, var: &Var, min: &Expr, extent: &Expr, body: &Stmt) -> Stmt {
    let new_min = s.mutate(min);
    let new_extent = s.mutate(extent);
    let bounds = const_int(&new_min).zip(const_int(&new_extent)).and_then(|(min, extent)| {
        let max = i64::try_from(i128::from(min) + i128::from(extent) - 1).ok()?;
        Some((min, max))
    });
    let new_body = s.with_bounds(var, bounds, |s| s.mutate_stmt(body));
    if is_no_op(&new_body) {
        new_body
    } else if new_min.same_as(min) && new_extent.same_as(extent) && new_body.same_as(body) {
        st.clone()
    } else {
        let StmtKind::For { for_type, .. } = st.kind() else {
            return st.clone();
        };
        Stmt::make_for(var.clone(), new_min, new_extent, *for_type, new_body)
    }
}

fn visit_store(
    s: &mut Simplifier,
    st: &Stmt,
    buffer: &Var,
    value: &Expr,
    index: &Expr,
    predicate: &Expr,
) -> Stmt {
    let new_predicate = s.mutate(predicate);
    let new_value = s.mutate(value);
    let new_index = s.mutate(index);

    if is_zero(&new_predicate) {
        return no_op();
    }
    if let Some((scalar, _)) = new_predicate.as_broadcast() {
        if !is_one(scalar) {
            // A uniform predicate guards the whole store.
            let lanes = new_value.ty().lanes();
            let store = Stmt::make_store(buffer.clone(), new_value, new_index, const_true(lanes));
            return Stmt::make_if(scalar.clone(), store, None);
        }
    }
    // foo[x] = foo[x] and foo[x] = undef do nothing.
    let reloads = new_value
        .as_load()
        .is_some_and(|(b, i, _)| b == buffer && *i == new_index);
    if is_undef(&new_value) || reloads {
        return no_op();
    }
    if new_predicate.same_as(predicate) && new_value.same_as(value) && new_index.same_as(index) {
        st.clone()
    } else {
        Stmt::make_store(buffer.clone(), new_value, new_index, new_predicate)
    }
}

fn visit_allocate(s: &mut Simplifier, st: &Stmt) -> Stmt {
    let StmtKind::Allocate {
        buffer,
        ty,
        extents,
        condition,
        body,
    } = st.kind()
    else {
        return st.clone();
    };
    let (new_extents, extents_changed) = mutate_exprs(s, extents);
    let new_body = s.mutate_stmt(body);
    let new_condition = s.mutate(condition);
    if let Some((if_condition, then_case, else_case)) = new_body.as_if() {
        if if_condition == condition {
            // The allocation moves into the branch that can use it.
            let inner = Stmt::make_allocate(
                buffer.clone(),
                *ty,
                new_extents,
                new_condition,
                then_case.clone(),
            );
            return Stmt::make_if(if_condition.clone(), inner, else_case.cloned());
        }
    }
    if !extents_changed && new_body.same_as(body) && new_condition.same_as(condition) {
        st.clone()
    } else {
        Stmt::make_allocate(buffer.clone(), *ty, new_extents, new_condition, new_body)
    }
}

fn visit_evaluate(s: &mut Simplifier, st: &Stmt, value: &Expr) -> Stmt {
    let mut new_value = s.mutate(value);
    if new_value.same_as(value) {
        return st.clone();
    }
    // Lets inside an evaluate become statements around it.
    let mut lets = Vec::new();
    while let Some((var, bound, body)) = new_value.as_let() {
        lets.push((var.clone(), bound.clone()));
        let body = body.clone();
        new_value = body;
    }
    lets.into_iter()
        .rev()
        .fold(Stmt::make_evaluate(new_value), |body, (var, bound)| {
            Stmt::make_let_stmt(var, bound, body)
        })
}

/// Substitutes the facts implied by an `if` condition into its branches.
///
/// Conjuncts hold in the then-branch and disjuncts fail in the else-branch.
/// Besides whole subconditions, `var == value`, a bare boolean `var`,
/// `expr == const` and `expr != const` are turned into substitutions.
fn mine_condition(condition: &Expr, mut then_case: Stmt, mut else_case: Option<Stmt>) -> (Stmt, Option<Stmt>) {
    let lanes = condition.ty().lanes();
    let mut stack = vec![condition.clone()];
    let (mut and_chain, mut or_chain) = (false, false);
    while let Some(next) = stack.pop() {
        if !or_chain {
            then_case = substitute_expr_stmt(&next, &const_true(lanes), &then_case);
        }
        if !and_chain {
            else_case = else_case.map(|e| substitute_expr_stmt(&next, &const_false(lanes), &e));
        }

        if let Some((a, b)) = next.as_and() {
            if !or_chain {
                stack.push(b.clone());
                stack.push(a.clone());
                and_chain = true;
            }
            continue;
        }
        if let Some((a, b)) = next.as_or() {
            if !and_chain {
                stack.push(b.clone());
                stack.push(a.clone());
                or_chain = true;
            }
            continue;
        }

        let eq = next.as_eq();
        let var = match eq {
            Some((a, _)) => a.as_variable(),
            None => next.as_variable(),
        };
        match (eq, var) {
            (Some((_, value)), Some(var)) => {
                if !or_chain {
                    then_case = substitute_stmt(var, value, &then_case);
                }
                if !and_chain && value.ty().is_bool() {
                    else_case = else_case.map(|e| substitute_stmt(var, &not(value), &e));
                }
            },
            (None, Some(var)) => {
                if !or_chain {
                    then_case = substitute_stmt(var, &const_true(lanes), &then_case);
                }
                if !and_chain {
                    else_case = else_case.map(|e| substitute_stmt(var, &const_false(lanes), &e));
                }
            },
            (Some((a, value)), None) => {
                if is_const(value) && !or_chain {
                    then_case = substitute_expr_stmt(a, value, &then_case);
                }
            },
            (None, None) => {
                if let Some((a, value)) = next.as_ne() {
                    if is_const(value) && !and_chain {
                        else_case = else_case.map(|e| substitute_expr_stmt(a, value, &e));
                    }
                }
            },
        }
    }
    (then_case, else_case)
}

fn same_optional(a: Option<&Stmt>, b: Option<&Stmt>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.same_as(b),
        (None, None) => true,
        _ => false,
    }
}

fn visit_if(
    s: &mut Simplifier,
    st: &Stmt,
    condition: &Expr,
    then_case: &Stmt,
    else_case: Option<&Stmt>,
) -> Stmt {
    let new_condition = s.mutate(condition);
    // A constant condition drops the dead branch unvisited.
    if is_one(&new_condition) {
        return s.mutate_stmt(then_case);
    }
    if is_zero(&new_condition) {
        return match else_case {
            Some(else_case) => s.mutate_stmt(else_case),
            None => no_op(),
        };
    }

    let new_then = s.mutate_stmt(then_case);
    let new_else = else_case.map(|e| s.mutate_stmt(e));
    if is_no_op(&new_then) && new_else.as_ref().is_none_or(is_no_op) {
        return new_then;
    }

    let (mut mined_then, mut mined_else) = mine_condition(&new_condition, new_then.clone(), new_else.clone());
    if !mined_then.same_as(&new_then) {
        mined_then = s.mutate_stmt(&mined_then);
    }
    if !same_optional(mined_else.as_ref(), new_else.as_ref()) {
        mined_else = mined_else.map(|e| s.mutate_stmt(&e));
    }

    if new_condition.same_as(condition)
        && mined_then.same_as(then_case)
        && same_optional(mined_else.as_ref(), else_case)
    {
        st.clone()
    } else {
        Stmt::make_if(new_condition, mined_then, mined_else)
    }
}

fn visit_block(s: &mut Simplifier, st: &Stmt, first: &Stmt, rest: &Stmt) -> Stmt {
    let new_first = s.mutate_stmt(first);
    let new_rest = s.mutate_stmt(rest);

    match (is_no_op(&new_first), is_no_op(&new_rest)) {
        (true, true) => return no_op(),
        (true, false) => return new_rest,
        (false, true) => return new_first,
        (false, false) => {},
    }

    // Both halves bind the same pure value, as happens after unrolling.
    if let (Some((var_a, value_a, body_a)), Some((var_b, value_b, body_b))) =
        (new_first.as_let_stmt(), new_rest.as_let_stmt())
    {
        if value_a == value_b && expr_is_pure(value_a) {
            let block = s.mutate_stmt(&Stmt::make_block(body_a.clone(), body_b.clone()));
            let shared = Var::new("t");
            let shared_expr = shared.to_expr(value_a.ty());
            let block = substitute_stmt(var_a, &shared_expr, &block);
            let block = substitute_stmt(var_b, &shared_expr, &block);
            return Stmt::make_let_stmt(shared, value_a.clone(), block);
        }
    }

    if let (Some((cond_a, then_a, else_a)), Some((cond_b, then_b, else_b))) =
        (new_first.as_if(), new_rest.as_if())
    {
        if cond_a == cond_b && expr_is_pure(cond_a) {
            // Two ifs on one condition merge their branches.
            let then_case = s.mutate_stmt(&Stmt::make_block(then_a.clone(), then_b.clone()));
            let else_case = match (else_a, else_b) {
                (Some(a), Some(b)) => Some(s.mutate_stmt(&Stmt::make_block(a.clone(), b.clone()))),
                (a, b) => a.or(b).cloned(),
            };
            return Stmt::make_if(cond_a.clone(), then_case, else_case);
        }
        if else_b.is_none() && expr_is_pure(cond_a) && expr_is_pure(cond_b) {
            // A second, tighter condition nests inside the first.
            let tighter = Expr::make_eq(Expr::make_and(cond_a.clone(), cond_b.clone()), cond_b.clone());
            if is_one(&s.mutate(&tighter)) {
                let then_case = s.mutate_stmt(&Stmt::make_block(then_a.clone(), new_rest.clone()));
                let else_case = else_a.map(|e| s.mutate_stmt(e));
                return Stmt::make_if(cond_a.clone(), then_case, else_case);
            }
        }
    }

    if new_first.same_as(first) && new_rest.same_as(rest) {
        st.clone()
    } else {
        Stmt::make_block(new_first, new_rest)
    }
}

#[cfg(test)]
mod tests {
    use super::super::simplify_stmt;
    use ir_core::{ir_operator::*, CallType, Expr, ForType, Scope, Stmt, Type, Var};

    fn int() -> Type {
        Type::int(32)
    }

    fn simplify(s: &Stmt) -> Stmt {
        simplify_stmt(s, true, &Scope::new(), &Scope::new())
    }

    fn store(buf: &Var, value: Expr, index: Expr) -> Stmt {
        Stmt::make_store(buf.clone(), value, index, const_true(1))
    }

    #[test]
    fn test_constant_conditions_drop_dead_branches() {
        let buf = Var::new("buf");
        let x = Expr::variable(int(), "x");
        let then_case = store(&buf, make_const(int(), 1), x.clone());
        let else_case = store(&buf, make_const(int(), 2), x.clone());
        let s = Stmt::make_if(lt(3, 4), then_case.clone(), Some(else_case.clone()));
        assert_eq!(simplify(&s), then_case);
        let s = Stmt::make_if(lt(4, 3), then_case.clone(), Some(else_case.clone()));
        assert_eq!(simplify(&s), else_case);
        let s = Stmt::make_if(lt(4, 3), then_case, None);
        assert!(is_no_op(&simplify(&s)));
    }

    #[test]
    fn test_if_facts_reach_branches() {
        let buf = Var::new("buf");
        let x = Expr::variable(int(), "x");
        let y = Expr::variable(int(), "y");
        let s = Stmt::make_if(
            and(eq(&x, 3), lt(&y, 5)),
            store(&buf, &x + 1, y.clone()),
            Some(store(&buf, select(lt(&y, 5), 1, 2), y.clone())),
        );
        let expected = Stmt::make_if(
            and(eq(&x, 3), lt(&y, 5)),
            store(&buf, make_const(int(), 4), y.clone()),
            Some(store(&buf, select(lt(&y, 5), 1, 2), y.clone())),
        );
        assert_eq!(simplify(&s), expected);
    }

    #[test]
    fn test_boolean_variable_facts() {
        let buf = Var::new("buf");
        let c = Expr::variable(Type::boolean(), "c");
        let x = Expr::variable(int(), "x");
        let s = Stmt::make_if(
            c.clone(),
            store(&buf, select(&c, 1, 2), x.clone()),
            Some(store(&buf, select(&c, 3, 4), x.clone())),
        );
        let expected = Stmt::make_if(
            c,
            store(&buf, make_const(int(), 1), x.clone()),
            Some(store(&buf, make_const(int(), 4), x)),
        );
        assert_eq!(simplify(&s), expected);
    }

    #[test]
    fn test_trivial_stores_vanish() {
        let buf = Var::new("buf");
        let other = Var::new("other");
        let x = Expr::variable(int(), "x");
        let reload = Expr::make_load(int(), buf.clone(), x.clone(), const_true(1));
        assert!(is_no_op(&simplify(&store(&buf, reload.clone(), x.clone()))));
        assert!(is_no_op(&simplify(&store(&buf, undef(int()), x.clone()))));
        let copy = store(&other, reload, x.clone());
        assert!(simplify(&copy).same_as(&copy));
        let never = Stmt::make_store(buf.clone(), make_one(int()), x.clone(), const_false(1));
        assert!(is_no_op(&simplify(&never)));
    }

    #[test]
    fn test_uniform_predicate_guards_store() {
        let buf = Var::new("buf");
        let c = Expr::variable(Type::boolean(), "c");
        let x = Expr::variable(int(), "x");
        let value = broadcast(make_one(int()), 4);
        let s = Stmt::make_store(buf.clone(), value.clone(), ramp(&x, 1, 4), broadcast(&c, 4));
        let expected = Stmt::make_if(
            c,
            Stmt::make_store(buf, value, ramp(&x, 1, 4), const_true(4)),
            None,
        );
        assert_eq!(simplify(&s), expected);
    }

    #[test]
    fn test_loop_bounds_decide_conditions() {
        let buf = Var::new("buf");
        let i = Var::new("i");
        let ie = i.to_expr(int());
        let body = Stmt::make_if(lt(&ie, 10), store(&buf, make_one(int()), ie.clone()), None);
        let s = Stmt::make_for(i.clone(), make_zero(int()), make_const(int(), 10), ForType::Serial, body);
        let expected = Stmt::make_for(
            i,
            make_zero(int()),
            make_const(int(), 10),
            ForType::Serial,
            store(&buf, make_one(int()), ie),
        );
        assert_eq!(simplify(&s), expected);
    }

    #[test]
    fn test_empty_loops_and_blocks_vanish() {
        let i = Var::new("i");
        let s = Stmt::make_for(i, make_zero(int()), make_const(int(), 10), ForType::Serial, no_op());
        assert!(is_no_op(&simplify(&s)));
        let buf = Var::new("buf");
        let x = Expr::variable(int(), "x");
        let st = store(&buf, make_one(int()), x);
        assert_eq!(simplify(&Stmt::make_block(no_op(), st.clone())), st);
        assert_eq!(simplify(&Stmt::make_block(st.clone(), no_op())), st);
        let pc = Stmt::make_producer_consumer("f", true, no_op());
        assert!(is_no_op(&simplify(&pc)));
    }

    #[test]
    fn test_asserts() {
        let x = Expr::variable(int(), "x");
        let buf = Var::new("buf");
        let body = store(&buf, make_one(int()), x.clone());
        let s = Stmt::make_assert(lt(1, 2), Expr::make_string("ok"), body.clone());
        assert_eq!(simplify(&s), body);
        let s = Stmt::make_assert(lt(&x, 2), Expr::make_string("x"), body);
        assert!(simplify(&s).same_as(&s));
    }

    #[test]
    fn test_lets_hoist_out_of_evaluate() {
        let v = Var::new("v");
        let y = Expr::variable(int(), "y");
        let z = Expr::variable(int(), "z");
        let ve = v.to_expr(int());
        let call = |args| Expr::make_call(int(), "f", args, CallType::Extern);
        let s = Stmt::make_evaluate(Expr::make_let(
            v.clone(),
            &y / &z,
            call(vec![ve.clone(), &ve + 0]),
        ));
        let expected = Stmt::make_let_stmt(v, &y / &z, Stmt::make_evaluate(call(vec![ve.clone(), ve])));
        assert_eq!(simplify(&s), expected);
    }

    #[test]
    fn test_matching_ifs_merge() {
        let buf = Var::new("buf");
        let c = Expr::variable(Type::boolean(), "c");
        let x = Expr::variable(int(), "x");
        let a = store(&buf, make_one(int()), x.clone());
        let b = store(&buf, make_const(int(), 2), &x + 1);
        let s = Stmt::make_block(
            Stmt::make_if(c.clone(), a.clone(), None),
            Stmt::make_if(c.clone(), b.clone(), None),
        );
        assert_eq!(simplify(&s), Stmt::make_if(c, Stmt::make_block(a, b), None));
    }

    #[test]
    fn test_shared_lets_merge() {
        let buf = Var::new("buf");
        let (u, v) = (Var::new("u"), Var::new("v"));
        let y = Expr::variable(int(), "y");
        let z = Expr::variable(int(), "z");
        let value = &y / &z;
        let s = Stmt::make_block(
            Stmt::make_let_stmt(u.clone(), value.clone(), store(&buf, u.to_expr(int()), y.clone())),
            Stmt::make_let_stmt(v.clone(), value.clone(), store(&buf, v.to_expr(int()), z.clone())),
        );
        let result = simplify(&s);
        let (shared, bound, body) = result.as_let_stmt().unwrap();
        assert_eq!(shared.name(), "t");
        assert_eq!(bound, &value);
        let t = shared.to_expr(int());
        assert_eq!(
            body,
            &Stmt::make_block(store(&buf, t.clone(), y), store(&buf, t, z))
        );
    }

    #[test]
    fn test_allocation_moves_into_guarding_if() {
        let buf = Var::new("buf");
        let c = Expr::variable(Type::boolean(), "c");
        let x = Expr::variable(int(), "x");
        let use_buf = store(&buf, make_one(int()), x);
        let s = Stmt::make_allocate(
            buf.clone(),
            int(),
            vec![make_const(int(), 16)],
            c.clone(),
            Stmt::make_if(c.clone(), use_buf.clone(), None),
        );
        let expected = Stmt::make_if(
            c.clone(),
            Stmt::make_allocate(buf, int(), vec![make_const(int(), 16)], c, use_buf),
            None,
        );
        assert_eq!(simplify(&s), expected);
    }
}
