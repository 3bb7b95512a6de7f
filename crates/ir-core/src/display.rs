// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Textual rendering of expressions and statements for logs and test output.

use crate::{
    ir::{Expr, ExprKind, ForType, Stmt, StmtKind},
    types::Type,
};
use itertools::Itertools;
use std::fmt::{self, Display, Formatter};

fn binop(f: &mut Formatter, a: &Expr, op: &str, b: &Expr) -> fmt::Result {
    write!(f, "({} {} {})", a, op, b)
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        use ExprKind::*;
        match self.kind() {
            IntImm(v) => {
                if self.ty() == Type::int(32) {
                    write!(f, "{}", v)
                } else {
                    write!(f, "({}){}", self.ty(), v)
                }
            },
            UIntImm(v) => {
                if self.ty().is_bool() {
                    write!(f, "{}", if *v == 1 { "true" } else { "false" })
                } else {
                    write!(f, "({}){}", self.ty(), v)
                }
            },
            FloatImm(v) => match self.ty().bits() {
                32 => write!(f, "{:?}f", v.0),
                _ => write!(f, "{:?}", v.0),
            },
            StringImm(s) => write!(f, "{:?}", s),
            Cast(v) => write!(f, "{}({})", self.ty(), v),
            Variable(v) => write!(f, "{}", v),
            Add(a, b) => binop(f, a, "+", b),
            Sub(a, b) => binop(f, a, "-", b),
            Mul(a, b) => binop(f, a, "*", b),
            Div(a, b) => binop(f, a, "/", b),
            Mod(a, b) => binop(f, a, "%", b),
            Min(a, b) => write!(f, "min({}, {})", a, b),
            Max(a, b) => write!(f, "max({}, {})", a, b),
            Eq(a, b) => binop(f, a, "==", b),
            Ne(a, b) => binop(f, a, "!=", b),
            Lt(a, b) => binop(f, a, "<", b),
            Le(a, b) => binop(f, a, "<=", b),
            Gt(a, b) => binop(f, a, ">", b),
            Ge(a, b) => binop(f, a, ">=", b),
            And(a, b) => binop(f, a, "&&", b),
            Or(a, b) => binop(f, a, "||", b),
            Not(a) => write!(f, "!{}", a),
            Select(c, t, e) => write!(f, "select({}, {}, {})", c, t, e),
            Load {
                buffer,
                index,
                predicate,
            } => {
                write!(f, "{}[{}]", buffer, index)?;
                if !is_true(predicate) {
                    write!(f, " if {}", predicate)?;
                }
                Ok(())
            },
            Ramp {
                base,
                stride,
                lanes,
            } => write!(f, "ramp({}, {}, {})", base, stride, lanes),
            Broadcast { value, lanes } => write!(f, "x{}({})", lanes, value),
            Let { var, value, body } => write!(f, "(let {} = {} in {})", var, value, body),
            Shuffle { vectors, indices } => write!(
                f,
                "shuffle({}; {})",
                vectors.iter().join(", "),
                indices.iter().join(", ")
            ),
            Call { name, args, .. } => write!(f, "{}({})", name, args.iter().join(", ")),
            Poison(token) => write!(f, "poison<{}>#{}", self.ty(), token),
            Indeterminate(token) => write!(f, "indeterminate<{}>#{}", self.ty(), token),
        }
    }
}

fn is_true(e: &Expr) -> bool {
    match e.kind() {
        ExprKind::UIntImm(1) => true,
        ExprKind::Broadcast { value, .. } => is_true(value),
        _ => false,
    }
}

struct Indented<'a>(&'a Stmt, usize);

impl Display for Indented<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let Indented(stmt, depth) = *self;
        let pad = "  ".repeat(depth);
        match stmt.kind() {
            StmtKind::LetStmt { var, value, body } => {
                writeln!(f, "{}let {} = {}", pad, var, value)?;
                write!(f, "{}", Indented(body, depth))
            },
            StmtKind::AssertStmt {
                condition,
                message,
                body,
            } => {
                writeln!(f, "{}assert({}, {})", pad, condition, message)?;
                write!(f, "{}", Indented(body, depth))
            },
            StmtKind::For {
                var,
                min,
                extent,
                for_type,
                body,
            } => {
                let kind = match for_type {
                    ForType::Serial => "for",
                    ForType::Parallel => "parallel",
                    ForType::Vectorized => "vectorized",
                    ForType::Unrolled => "unrolled",
                };
                writeln!(f, "{}{} ({}, {}, {}) {{", pad, kind, var, min, extent)?;
                write!(f, "{}", Indented(body, depth + 1))?;
                writeln!(f, "{}}}", pad)
            },
            StmtKind::Store {
                buffer,
                value,
                index,
                predicate,
            } => {
                write!(f, "{}{}[{}] = {}", pad, buffer, index, value)?;
                if !is_true(predicate) {
                    write!(f, " if {}", predicate)?;
                }
                writeln!(f)
            },
            StmtKind::Allocate {
                buffer,
                ty,
                extents,
                condition,
                body,
            } => {
                write!(f, "{}allocate {}[{}", pad, buffer, ty)?;
                for extent in extents {
                    write!(f, " * {}", extent)?;
                }
                write!(f, "]")?;
                if !is_true(condition) {
                    write!(f, " if {}", condition)?;
                }
                writeln!(f)?;
                write!(f, "{}", Indented(body, depth))
            },
            StmtKind::ProducerConsumer {
                name,
                is_producer,
                body,
            } => {
                let kind = if *is_producer { "produce" } else { "consume" };
                writeln!(f, "{}{} {} {{", pad, kind, name)?;
                write!(f, "{}", Indented(body, depth + 1))?;
                writeln!(f, "{}}}", pad)
            },
            StmtKind::IfThenElse {
                condition,
                then_case,
                else_case,
            } => {
                writeln!(f, "{}if ({}) {{", pad, condition)?;
                write!(f, "{}", Indented(then_case, depth + 1))?;
                if let Some(else_case) = else_case {
                    writeln!(f, "{}}} else {{", pad)?;
                    write!(f, "{}", Indented(else_case, depth + 1))?;
                }
                writeln!(f, "{}}}", pad)
            },
            StmtKind::Evaluate(value) => writeln!(f, "{}{}", pad, value),
            StmtKind::Block { first, rest } => {
                write!(f, "{}", Indented(first, depth))?;
                write!(f, "{}", Indented(rest, depth))
            },
        }
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", Indented(self, 0))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ir::{Expr, Stmt, Var},
        ir_operator::*,
        types::Type,
    };

    #[test]
    fn test_expr_display() {
        let x = Expr::variable(Type::int(32), "x");
        assert_eq!((&x + 3).to_string(), "(x + 3)");
        assert_eq!(min(&x, 2).to_string(), "min(x, 2)");
        assert_eq!(
            select(lt(&x, 0), 1, -1).to_string(),
            "select((x < 0), 1, -1)"
        );
        assert_eq!(broadcast(&x, 4).to_string(), "x4(x)");
        assert_eq!(cast(Type::int(64), &x).to_string(), "int64(x)");
        assert_eq!(make_const_float(Type::float(32), 2.5).to_string(), "2.5f");
    }

    #[test]
    fn test_stmt_display() {
        let x = Var::new("x");
        let body = Stmt::make_evaluate(x.to_expr(Type::int(32)) + 1);
        let s = Stmt::make_let_stmt(x, make_const(Type::int(32), 3), body);
        assert_eq!(s.to_string(), "let x = 3\n(x + 1)\n");
    }
}
