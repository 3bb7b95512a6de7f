// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Read-only traversal and the variable-use queries built on it.

use crate::{
    ir::{Expr, ExprKind, Stmt, StmtKind, Var},
    scope::Scope,
};

pub trait IrVisitor {
    fn visit_expr(&mut self, e: &Expr) {
        visit_expr_children(self, e)
    }

    fn visit_stmt(&mut self, s: &Stmt) {
        visit_stmt_children(self, s)
    }
}

pub fn visit_expr_children<V: IrVisitor + ?Sized>(v: &mut V, e: &Expr) {
    use ExprKind::*;
    match e.kind() {
        IntImm(_) | UIntImm(_) | FloatImm(_) | StringImm(_) | Variable(_) | Poison(_)
        | Indeterminate(_) => {},
        Cast(a) | Not(a) => v.visit_expr(a),
        Add(a, b) | Sub(a, b) | Mul(a, b) | Div(a, b) | Mod(a, b) | Min(a, b) | Max(a, b)
        | Eq(a, b) | Ne(a, b) | Lt(a, b) | Le(a, b) | Gt(a, b) | Ge(a, b) | And(a, b)
        | Or(a, b) => {
            v.visit_expr(a);
            v.visit_expr(b);
        },
        Select(c, t, f) => {
            v.visit_expr(c);
            v.visit_expr(t);
            v.visit_expr(f);
        },
        Load {
            index, predicate, ..
        } => {
            v.visit_expr(index);
            v.visit_expr(predicate);
        },
        Ramp { base, stride, .. } => {
            v.visit_expr(base);
            v.visit_expr(stride);
        },
        Broadcast { value, .. } => v.visit_expr(value),
        Let { value, body, .. } => {
            v.visit_expr(value);
            v.visit_expr(body);
        },
        Shuffle { vectors, .. } => vectors.iter().for_each(|x| v.visit_expr(x)),
        Call { args, .. } => args.iter().for_each(|x| v.visit_expr(x)),
    }
}

pub fn visit_stmt_children<V: IrVisitor + ?Sized>(v: &mut V, s: &Stmt) {
    match s.kind() {
        StmtKind::LetStmt { value, body, .. } => {
            v.visit_expr(value);
            v.visit_stmt(body);
        },
        StmtKind::AssertStmt {
            condition,
            message,
            body,
        } => {
            v.visit_expr(condition);
            v.visit_expr(message);
            v.visit_stmt(body);
        },
        StmtKind::For {
            min, extent, body, ..
        } => {
            v.visit_expr(min);
            v.visit_expr(extent);
            v.visit_stmt(body);
        },
        StmtKind::Store {
            value,
            index,
            predicate,
            ..
        } => {
            v.visit_expr(value);
            v.visit_expr(index);
            v.visit_expr(predicate);
        },
        StmtKind::Allocate {
            extents,
            condition,
            body,
            ..
        } => {
            extents.iter().for_each(|e| v.visit_expr(e));
            v.visit_expr(condition);
            v.visit_stmt(body);
        },
        StmtKind::ProducerConsumer { body, .. } => v.visit_stmt(body),
        StmtKind::IfThenElse {
            condition,
            then_case,
            else_case,
        } => {
            v.visit_expr(condition);
            v.visit_stmt(then_case);
            if let Some(else_case) = else_case {
                v.visit_stmt(else_case);
            }
        },
        StmtKind::Evaluate(value) => v.visit_expr(value),
        StmtKind::Block { first, rest } => {
            v.visit_stmt(first);
            v.visit_stmt(rest);
        },
    }
}

/// Counts free references to the variables a predicate selects. A binding
/// construct that rebinds a selected variable hides it in its body.
struct VarUses<F: Fn(&Var) -> bool> {
    selects: F,
    hidden: Vec<Var>,
    count: usize,
    stop_at_first: bool,
}

impl<F: Fn(&Var) -> bool> VarUses<F> {
    fn new(selects: F, stop_at_first: bool) -> Self {
        Self {
            selects,
            hidden: vec![],
            count: 0,
            stop_at_first,
        }
    }

    fn done(&self) -> bool {
        self.stop_at_first && self.count > 0
    }

    fn selected(&self, var: &Var) -> bool {
        (self.selects)(var) && !self.hidden.contains(var)
    }

    fn hide_during(&mut self, var: &Var, f: impl FnOnce(&mut Self)) {
        if (self.selects)(var) {
            self.hidden.push(var.clone());
            f(self);
            self.hidden.pop();
        } else {
            f(self)
        }
    }
}

impl<F: Fn(&Var) -> bool> IrVisitor for VarUses<F> {
    fn visit_expr(&mut self, e: &Expr) {
        if self.done() {
            return;
        }
        match e.kind() {
            ExprKind::Variable(var) => {
                if self.selected(var) {
                    self.count += 1;
                }
            },
            ExprKind::Load { buffer, .. } => {
                if self.selected(buffer) {
                    self.count += 1;
                }
                visit_expr_children(self, e)
            },
            ExprKind::Let { var, value, body } => {
                self.visit_expr(value);
                self.hide_during(var, |this| this.visit_expr(body));
            },
            _ => visit_expr_children(self, e),
        }
    }

    fn visit_stmt(&mut self, s: &Stmt) {
        if self.done() {
            return;
        }
        match s.kind() {
            StmtKind::LetStmt { var, value, body } => {
                self.visit_expr(value);
                self.hide_during(var, |this| this.visit_stmt(body));
            },
            StmtKind::For {
                var,
                min,
                extent,
                body,
                ..
            } => {
                self.visit_expr(min);
                self.visit_expr(extent);
                self.hide_during(var, |this| this.visit_stmt(body));
            },
            StmtKind::Store { buffer, .. } => {
                if self.selected(buffer) {
                    self.count += 1;
                }
                visit_stmt_children(self, s)
            },
            _ => visit_stmt_children(self, s),
        }
    }
}

/// Whether `e` references `var` outside any rebinding of it.
pub fn expr_uses_var(e: &Expr, var: &Var) -> bool {
    let mut uses = VarUses::new(|v: &Var| v == var, true);
    uses.visit_expr(e);
    uses.count > 0
}

pub fn stmt_uses_var(s: &Stmt, var: &Var) -> bool {
    let mut uses = VarUses::new(|v: &Var| v == var, true);
    uses.visit_stmt(s);
    uses.count > 0
}

/// Whether `e` references any variable bound in `vars` (or its containing scopes).
pub fn expr_uses_vars<T>(e: &Expr, vars: &Scope<T>) -> bool {
    let mut uses = VarUses::new(|v: &Var| vars.contains(v), true);
    uses.visit_expr(e);
    uses.count > 0
}

pub fn stmt_uses_vars<T>(s: &Stmt, vars: &Scope<T>) -> bool {
    let mut uses = VarUses::new(|v: &Var| vars.contains(v), true);
    uses.visit_stmt(s);
    uses.count > 0
}

/// Number of free references to `var` in `e`, counting each occurrence in the tree.
pub fn count_var_uses(e: &Expr, var: &Var) -> usize {
    let mut uses = VarUses::new(|v: &Var| v == var, false);
    uses.visit_expr(e);
    uses.count
}

struct Purity(bool);

impl IrVisitor for Purity {
    fn visit_expr(&mut self, e: &Expr) {
        if !self.0 {
            return;
        }
        match e.as_call() {
            Some((_, _, call_type)) if !call_type.is_pure() => self.0 = false,
            _ => visit_expr_children(self, e),
        }
    }
}

/// Whether `e` evaluates to the same value wherever it appears: it contains
/// no calls to impure externs or intrinsics.
pub fn expr_is_pure(e: &Expr) -> bool {
    let mut purity = Purity(true);
    purity.visit_expr(e);
    purity.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ir::{CallType, Stmt},
        ir_operator::*,
        types::Type,
    };

    #[test]
    fn test_uses_var() {
        let x = Var::new("x");
        let y = Var::new("y");
        let xe = x.to_expr(Type::int(32));
        let ye = y.to_expr(Type::int(32));
        let e = &xe + &ye * 2;
        assert!(expr_uses_var(&e, &x));
        assert!(!expr_uses_var(&(&ye + 1), &x));
        assert_eq!(count_var_uses(&(&xe * &xe + &ye), &x), 2);
    }

    #[test]
    fn test_rebinding_hides_var() {
        let x = Var::new("x");
        let xe = x.to_expr(Type::int(32));
        let e = Expr::make_let(x.clone(), make_const(Type::int(32), 3), &xe + 1);
        assert!(!expr_uses_var(&e, &x));
        let e = Expr::make_let(x.clone(), &xe + 3, &xe + 1);
        assert!(expr_uses_var(&e, &x));

        let s = Stmt::make_for(
            x.clone(),
            make_zero(Type::int(32)),
            make_const(Type::int(32), 4),
            crate::ir::ForType::Serial,
            Stmt::make_evaluate(xe.clone()),
        );
        assert!(!stmt_uses_var(&s, &x));
    }

    #[test]
    fn test_uses_vars_in_scope() {
        let x = Var::new("x");
        let y = Var::new("y");
        let mut scope = Scope::new();
        scope.push(y.clone(), ());
        assert!(!expr_uses_vars(&(x.to_expr(Type::int(32)) + 1), &scope));
        assert!(expr_uses_vars(&(y.to_expr(Type::int(32)) + 1), &scope));
    }

    #[test]
    fn test_purity() {
        let x = Expr::variable(Type::int(32), "x");
        assert!(expr_is_pure(&(&x + 1)));
        assert!(expr_is_pure(&sqrt(&x)));
        let impure = Expr::make_call(Type::int(32), "rand", vec![], CallType::Extern);
        assert!(!expr_is_pure(&(&x + impure)));
    }
}
