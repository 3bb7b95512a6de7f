// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Algebraic simplification of expressions and statements.
//!
//! The `Simplifier` is a bottom-up rewriter. Each node first has its operands
//! simplified, then the simplified operands are matched against an ordered
//! table of named rules for that node kind. The first rule that applies wins;
//! when none applies, the node is rebuilt only if an operand changed. Rules
//! routinely call back into `mutate` on the expressions they build, so every
//! local rewrite is renormalised immediately. The order of rules within a
//! table is significant for termination and must be preserved.
//!
//! # Numeric semantics
//!
//! - Constant folding of signed integer types of 32 bits or more checks the
//!   exact result against the type range. An overflowing fold yields a fresh
//!   *poison* value.
//! - Integer division and modulo are Euclidean. Division or modulo by a
//!   provable zero yields a fresh *indeterminate* value.
//! - Poison and indeterminate operands are propagated before any rule runs,
//!   so no algebraic identity can eliminate them.
//!
//! # Context
//!
//! While descending, the simplifier tracks three facts per variable:
//! pending let replacements with use counters, constant integer bounds and
//! modulus-remainder alignment. Bounds and alignment of free variables may
//! be supplied by the caller.

mod add_sub;
mod bounds;
mod call;
mod compare;
mod let_;
mod logical;
mod min_max;
mod mul_div_mod;
mod stmt;
mod vector;

use crate::{
    interval::Interval,
    modulus_remainder::{modulus_remainder_in, ModulusRemainder},
    options::{Experiment, Options},
};
use ir_core::{
    ir_operator::{as_const_float, as_const_int, as_const_uint, is_one},
    mutator::{walk_expr, walk_stmt, IrMutator},
    Expr, ExprKind, Scope, Stmt, Type, Var,
};
use log::{debug, trace};

/// Enables a dump of every node the simplifier changes.
const DEBUG: bool = false;

/// A named rewrite. Returns `None` when the rule does not apply.
pub(crate) type Rule<T> = (&'static str, fn(&mut Simplifier<'_>, &T) -> Option<Expr>);

/// Operands of a binary node after simplification, together with the node itself.
pub(crate) struct Binary {
    pub op: Expr,
    pub a: Expr,
    pub b: Expr,
}

impl Binary {
    pub fn new(op: &Expr, a: Expr, b: Expr) -> Self {
        Self {
            op: op.clone(),
            a,
            b,
        }
    }

    /// The type of the node. For comparisons this is boolean; see `operand_ty`.
    pub fn ty(&self) -> Type {
        self.op.ty()
    }

    pub fn operand_ty(&self) -> Type {
        self.a.ty()
    }

    /// Whether simplification left both operands untouched.
    pub fn unchanged(&self) -> bool {
        match binary_operands(&self.op) {
            Some((a, b)) => a.same_as(&self.a) && b.same_as(&self.b),
            None => false,
        }
    }

    /// The node itself if nothing changed, else a new node of the same kind.
    pub fn rebuild(&self, make: fn(Expr, Expr) -> Expr) -> Expr {
        if self.unchanged() {
            self.op.clone()
        } else {
            make(self.a.clone(), self.b.clone())
        }
    }
}

fn binary_operands(e: &Expr) -> Option<(&Expr, &Expr)> {
    use ExprKind::*;
    match e.kind() {
        Add(a, b) | Sub(a, b) | Mul(a, b) | Div(a, b) | Mod(a, b) | Min(a, b) | Max(a, b)
        | Eq(a, b) | Ne(a, b) | Lt(a, b) | Le(a, b) | Gt(a, b) | Ge(a, b) | And(a, b)
        | Or(a, b) => Some((a, b)),
        _ => None,
    }
}

pub(crate) struct VarInfo {
    replacement: Option<Expr>,
    old_uses: usize,
    new_uses: usize,
}

pub(crate) struct Simplifier<'a> {
    simplify_lets: bool,
    trace_rules: bool,
    var_info: Scope<'static, VarInfo>,
    bounds_info: Scope<'static, (i64, i64)>,
    alignment_info: Scope<'a, ModulusRemainder>,
}

impl<'a> Simplifier<'a> {
    pub fn new(
        simplify_lets: bool,
        bounds: &Scope<Interval>,
        alignment: &'a Scope<'a, ModulusRemainder>,
    ) -> Self {
        let mut bounds_info = Scope::new();
        // Only constant bounds of the caller are respected.
        for (var, interval) in bounds.iter() {
            if interval.is_bounded() {
                bounds_info.push(var.clone(), (interval.min, interval.max));
            }
        }
        Self {
            simplify_lets,
            trace_rules: false,
            var_info: Scope::new(),
            bounds_info,
            alignment_info: Scope::with_containing(alignment),
        }
    }

    pub fn with_trace_rules(mut self, trace_rules: bool) -> Self {
        self.trace_rules = trace_rules;
        self
    }

    pub fn mutate(&mut self, e: &Expr) -> Expr {
        self.mutate_expr(e)
    }

    /// Runs the rules of a table in order and returns the result of the first
    /// one that applies.
    pub fn apply_rules<T>(&mut self, node: &str, rules: &[Rule<T>], args: &T) -> Option<Expr> {
        for (name, rule) in rules {
            if let Some(result) = rule(self, args) {
                if self.trace_rules {
                    debug!("{}::{} => {}", node, name, result);
                } else {
                    trace!("{}::{} => {}", node, name, result);
                }
                return Some(result);
            }
        }
        None
    }

    pub fn modulus_remainder(&self, e: &Expr) -> ModulusRemainder {
        modulus_remainder_in(e, &self.alignment_info)
    }

    /// Runs `f` with `var` bound to `bounds`, when bounds are known.
    fn with_bounds<R>(
        &mut self,
        var: &Var,
        bounds: Option<(i64, i64)>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        match bounds {
            Some(bounds) => {
                self.bounds_info.push(var.clone(), bounds);
                let result = f(self);
                self.bounds_info.pop(var);
                result
            },
            None => f(self),
        }
    }

    /// Runs `f` with `var` aligned as `alignment`, when the fact says anything.
    fn with_alignment<R>(
        &mut self,
        var: &Var,
        alignment: Option<ModulusRemainder>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        match alignment {
            Some(alignment) => {
                self.alignment_info.push(var.clone(), alignment);
                let result = f(self);
                self.alignment_info.pop(var);
                result
            },
            None => f(self),
        }
    }

    fn visit_variable(&mut self, e: &Expr, var: &Var) -> Expr {
        match self.var_info.get_mut(var) {
            Some(info) => match &info.replacement {
                Some(replacement) => {
                    debug_assert_eq!(
                        replacement.ty(),
                        e.ty(),
                        "replacement of `{}` changes its type",
                        var
                    );
                    info.new_uses += 1;
                    replacement.clone()
                },
                None => {
                    info.old_uses += 1;
                    e.clone()
                },
            },
            // Bound outside of anything we simplified.
            None => e.clone(),
        }
    }
}

impl IrMutator for Simplifier<'_> {
    fn visit_expr(&mut self, e: &Expr) -> Expr {
        use ExprKind::*;
        let result = match e.kind() {
            IntImm(_) | UIntImm(_) | FloatImm(_) | StringImm(_) | Poison(_) | Indeterminate(_) => {
                e.clone()
            },
            Variable(var) => self.visit_variable(e, var),
            Cast(value) => vector::visit_cast(self, e, value),
            Add(a, b) => add_sub::visit_add(self, e, a, b),
            Sub(a, b) => add_sub::visit_sub(self, e, a, b),
            Mul(a, b) => mul_div_mod::visit_mul(self, e, a, b),
            Div(a, b) => mul_div_mod::visit_div(self, e, a, b),
            Mod(a, b) => mul_div_mod::visit_mod(self, e, a, b),
            Min(a, b) => min_max::visit_min_max(self, e, a, b, min_max::Extremum::Min),
            Max(a, b) => min_max::visit_min_max(self, e, a, b, min_max::Extremum::Max),
            Eq(a, b) => compare::visit_eq(self, e, a, b),
            Ne(a, b) => compare::visit_ne(self, e, a, b),
            Lt(a, b) => compare::visit_lt(self, e, a, b),
            Le(a, b) => compare::visit_le(self, e, a, b),
            Gt(a, b) => compare::visit_gt(self, e, a, b),
            Ge(a, b) => compare::visit_ge(self, e, a, b),
            And(a, b) => logical::visit_and(self, e, a, b),
            Or(a, b) => logical::visit_or(self, e, a, b),
            Not(a) => logical::visit_not(self, e, a),
            Select(c, t, f) => logical::visit_select(self, e, c, t, f),
            Load { .. } => vector::visit_load(self, e),
            Ramp { .. } => vector::visit_ramp(self, e),
            Shuffle { .. } => vector::visit_shuffle(self, e),
            Let { var, value, body } => let_::visit_let(self, e, var, value, body),
            Call { .. } => call::visit_call(self, e),
            Broadcast { .. } => walk_expr(self, e),
        };
        if DEBUG && !result.same_as(e) {
            debug!("simplified `{}` to `{}`", e, result);
        }
        result
    }

    fn visit_stmt(&mut self, s: &Stmt) -> Stmt {
        let result = stmt::visit_stmt(self, s);
        if DEBUG && !result.same_as(s) {
            debug!("simplified statement\n{}\nto\n{}", s, result);
        }
        result
    }
}

// ----------------------------------------------------------------------------------
// Helpers shared by the rule tables

/// Immediates and broadcasts of immediates. NaN is excluded because it does
/// not obey the equalities the rules assume.
pub(crate) fn is_simple_const(e: &Expr) -> bool {
    match e.kind() {
        ExprKind::IntImm(_) | ExprKind::UIntImm(_) => true,
        ExprKind::FloatImm(f) => !f.0.is_nan(),
        ExprKind::Broadcast { value, .. } => is_simple_const(value),
        _ => false,
    }
}

/// Scalar signed constant.
pub(crate) fn const_int(e: &Expr) -> Option<i64> {
    if e.ty().is_vector() {
        None
    } else {
        as_const_int(e)
    }
}

pub(crate) fn const_uint(e: &Expr) -> Option<u64> {
    if e.ty().is_vector() {
        None
    } else {
        as_const_uint(e)
    }
}

pub(crate) fn const_float(e: &Expr) -> Option<f64> {
    if e.ty().is_vector() {
        None
    } else {
        as_const_float(e)
    }
}

/// A scalar integer type whose overflow is undefined.
pub(crate) fn no_overflow_scalar_int(ty: Type) -> bool {
    ty.is_scalar() && ty.is_int() && ty.bits() >= 32
}

/// A type without well defined overflow behaviour.
pub(crate) fn no_overflow(ty: Type) -> bool {
    ty.is_float() || no_overflow_scalar_int(ty.element_of())
}

/// Whether the exact value does not fit a signed integer of `bits` bits.
pub(crate) fn would_overflow(bits: u8, value: i128) -> bool {
    let bits = u32::from(bits.min(64));
    let max = (1i128 << (bits - 1)) - 1;
    let min = -(1i128 << (bits - 1));
    value < min || value > max
}

/// Fold an exact signed integer result into `ty`, yielding poison on undefined overflow.
pub(crate) fn fold_int(ty: Type, value: i128) -> Expr {
    if no_overflow(ty) && would_overflow(ty.bits(), value) {
        Expr::make_poison(ty)
    } else {
        Expr::make_int(ty, value as i64)
    }
}

/// Poison and indeterminate values absorb every operator. An indeterminate
/// operand wins over poison; a marker of another type is replaced by a fresh
/// one of type `ty`.
pub(crate) fn propagate_markers(ty: Type, operands: &[&Expr]) -> Option<Expr> {
    if let Some(marker) = operands.iter().find(|e| e.is_indeterminate()) {
        return Some(if marker.ty() == ty {
            (*marker).clone()
        } else {
            Expr::make_indeterminate(ty)
        });
    }
    let marker = operands.iter().find(|e| e.is_poison())?;
    Some(if marker.ty() == ty {
        (*marker).clone()
    } else {
        Expr::make_poison(ty)
    })
}

/// If `e` compares a variable for (in)equality with a simple constant, the variable.
pub(crate) fn var_simple_const_comparison(e: &Expr) -> Option<&Var> {
    let (a, b) = e.as_eq().or_else(|| e.as_ne())?;
    if is_simple_const(b) {
        a.as_variable()
    } else if is_simple_const(a) {
        b.as_variable()
    } else {
        None
    }
}

// ----------------------------------------------------------------------------------
// Entry points

/// Simplify an expression, with bounds and alignment facts for free variables.
pub fn simplify(
    e: &Expr,
    simplify_lets: bool,
    bounds: &Scope<Interval>,
    alignment: &Scope<ModulusRemainder>,
) -> Expr {
    let result = Simplifier::new(simplify_lets, bounds, alignment).mutate_expr(e);
    if !result.same_as(e) {
        debug!("simplify: `{}` => `{}`", e, result);
    }
    result
}

pub fn simplify_stmt(
    s: &Stmt,
    simplify_lets: bool,
    bounds: &Scope<Interval>,
    alignment: &Scope<ModulusRemainder>,
) -> Stmt {
    let result = Simplifier::new(simplify_lets, bounds, alignment).mutate_stmt(s);
    if !result.same_as(s) {
        debug!("simplify:\n{}\n=>\n{}", s, result);
    }
    result
}

/// Simplify an expression with no outside facts.
pub fn simplify_expr(e: &Expr) -> Expr {
    simplify(e, true, &Scope::new(), &Scope::new())
}

pub fn simplify_with_options(e: &Expr, options: &Options) -> Expr {
    let (bounds, alignment) = (Scope::new(), Scope::new());
    Simplifier::new(options.simplify_lets(), &bounds, &alignment)
        .with_trace_rules(options.experiment_on(Experiment::TRACE_RULES))
        .mutate_expr(e)
}

pub fn simplify_stmt_with_options(s: &Stmt, options: &Options) -> Stmt {
    let (bounds, alignment) = (Scope::new(), Scope::new());
    Simplifier::new(options.simplify_lets(), &bounds, &alignment)
        .with_trace_rules(options.experiment_on(Experiment::TRACE_RULES))
        .mutate_stmt(s)
}

/// Whether `e` simplifies to the constant true. A `false` answer means the
/// fact could not be shown, not that it is false.
pub fn can_prove(e: &Expr) -> bool {
    debug_assert!(e.ty().is_bool(), "can_prove of non-boolean `{}`", e);
    is_one(&simplify_expr(e))
}

struct ExprSimplifier;

impl IrMutator for ExprSimplifier {
    fn visit_expr(&mut self, e: &Expr) -> Expr {
        simplify_expr(e)
    }

    fn visit_stmt(&mut self, s: &Stmt) -> Stmt {
        walk_stmt(self, s)
    }
}

/// Simplify each expression of a statement on its own, leaving the
/// statement structure alone.
pub fn simplify_exprs(s: &Stmt) -> Stmt {
    ExprSimplifier.mutate_stmt(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir_core::ir_operator::*;

    #[test]
    fn test_overflow_predicates() {
        assert!(would_overflow(32, i32::MAX as i128 + 1));
        assert!(!would_overflow(32, i32::MIN as i128));
        assert!(would_overflow(64, i64::MIN as i128 - 1));
        assert!(no_overflow(Type::int(32)));
        assert!(no_overflow(Type::float(32).with_lanes(4)));
        assert!(no_overflow(Type::int(64).with_lanes(4)));
        assert!(!no_overflow_scalar_int(Type::int(32).with_lanes(4)));
        assert!(!no_overflow(Type::int(16)));
        assert!(!no_overflow(Type::uint(32)));
    }

    #[test]
    fn test_simple_constants() {
        let x = Expr::variable(Type::int(32), "x");
        assert!(is_simple_const(&make_const(Type::int(32).with_lanes(4), 3)));
        assert!(!is_simple_const(&make_const_float(Type::float(32), f64::NAN)));
        assert!(!is_simple_const(&ramp(0, 1, 4)));
        assert_eq!(const_int(&make_const(Type::int(32).with_lanes(4), 3)), None);
        assert_eq!(const_int(&make_const(Type::int(32), 3)), Some(3));
        assert!(var_simple_const_comparison(&eq(&x, 3)).is_some());
        assert!(var_simple_const_comparison(&ne(4, &x)).is_some());
        assert!(var_simple_const_comparison(&lt(&x, 3)).is_none());
    }

    #[test]
    fn test_marker_propagation() {
        let x = Expr::variable(Type::int(32), "x");
        let p = Expr::make_poison(Type::int(32));
        let i = Expr::make_indeterminate(Type::int(32));
        assert!(propagate_markers(Type::int(32), &[&x, &p]).unwrap().same_as(&p));
        assert!(propagate_markers(Type::int(32), &[&p, &i]).unwrap().same_as(&i));
        let b = propagate_markers(Type::boolean(), &[&x, &p]).unwrap();
        assert!(b.is_poison());
        assert_eq!(b.ty(), Type::boolean());
        assert!(propagate_markers(Type::int(32), &[&x]).is_none());
    }

    #[test]
    fn test_fold_int_poisons_on_overflow() {
        assert!(fold_int(Type::int(32), i32::MAX as i128 + 1).is_poison());
        assert_eq!(as_const_int(&fold_int(Type::int(32), 7)), Some(7));
        // Narrow types wrap.
        assert_eq!(as_const_int(&fold_int(Type::int(8), 130)), Some(-126));
    }

    #[test]
    fn test_unchanged_binary_rebuilds_to_self() {
        let x = Expr::variable(Type::int(32), "x");
        let y = Expr::variable(Type::int(32), "y");
        let e = &x + &y;
        let op = Binary::new(&e, x.clone(), y.clone());
        assert!(op.rebuild(Expr::make_add).same_as(&e));
        let op = Binary::new(&e, y, x);
        assert!(!op.rebuild(Expr::make_add).same_as(&e));
    }
}
