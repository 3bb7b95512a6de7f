// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Builders and constant helpers on top of the raw node constructors.
//!
//! Binary operators on `Expr` coerce their operands the usual way: a scalar is
//! broadcast to the other side's lanes, an integer side is converted to float,
//! and the wider of two floats or two unsigned types wins. Mixed signedness
//! goes to a signed type of the larger width. An integer literal on one side
//! becomes a constant of the other side's type.

use crate::{
    error::{IrError, IrResult},
    ir::{intrinsic, CallType, Expr, ExprKind, Stmt, StmtKind},
    types::Type,
};
use std::ops;

// ----------------------------------------------------------------------------------
// Constants

/// A constant of type `ty`, broadcast if `ty` is a vector.
pub fn make_const(ty: Type, value: i64) -> Expr {
    if ty.is_vector() {
        return Expr::make_broadcast(make_const(ty.element_of(), value), ty.lanes());
    }
    if ty.is_int() {
        Expr::make_int(ty, value)
    } else if ty.is_uint() {
        Expr::make_uint(ty, value as u64)
    } else if ty.is_float() {
        Expr::make_float(ty, value as f64)
    } else {
        panic!("cannot make a constant of type {}", ty)
    }
}

pub fn make_const_uint(ty: Type, value: u64) -> Expr {
    if ty.is_vector() {
        return Expr::make_broadcast(make_const_uint(ty.element_of(), value), ty.lanes());
    }
    if ty.is_int() {
        Expr::make_int(ty, value as i64)
    } else if ty.is_uint() {
        Expr::make_uint(ty, value)
    } else if ty.is_float() {
        Expr::make_float(ty, value as f64)
    } else {
        panic!("cannot make a constant of type {}", ty)
    }
}

pub fn make_const_float(ty: Type, value: f64) -> Expr {
    if ty.is_vector() {
        return Expr::make_broadcast(make_const_float(ty.element_of(), value), ty.lanes());
    }
    if ty.is_int() {
        Expr::make_int(ty, value as i64)
    } else if ty.is_uint() {
        Expr::make_uint(ty, value as u64)
    } else if ty.is_float() {
        Expr::make_float(ty, value)
    } else {
        panic!("cannot make a constant of type {}", ty)
    }
}

pub fn make_zero(ty: Type) -> Expr {
    make_const(ty, 0)
}

pub fn make_one(ty: Type) -> Expr {
    make_const(ty, 1)
}

pub fn make_two(ty: Type) -> Expr {
    make_const(ty, 2)
}

pub fn make_bool(value: bool, lanes: u16) -> Expr {
    make_const(Type::boolean().with_lanes(lanes), value as i64)
}

pub fn const_true(lanes: u16) -> Expr {
    make_bool(true, lanes)
}

pub fn const_false(lanes: u16) -> Expr {
    make_bool(false, lanes)
}

/// The largest value of `ty`, as a constant.
pub fn type_max(ty: Type) -> Expr {
    let elem = ty.element_of();
    match () {
        _ if elem.is_int() => make_const(ty, elem.imax()),
        _ if elem.is_uint() => make_const_uint(ty, elem.umax()),
        _ if elem.bits() == 32 => make_const_float(ty, f32::MAX as f64),
        _ => make_const_float(ty, f64::MAX),
    }
}

/// The smallest value of `ty`, as a constant.
pub fn type_min(ty: Type) -> Expr {
    let elem = ty.element_of();
    match () {
        _ if elem.is_int() => make_const(ty, elem.imin()),
        _ if elem.is_uint() => make_zero(ty),
        _ if elem.bits() == 32 => make_const_float(ty, f32::MIN as f64),
        _ => make_const_float(ty, f64::MIN),
    }
}

/// Signed integer constant, looking through broadcasts.
pub fn as_const_int(e: &Expr) -> Option<i64> {
    match e.kind() {
        ExprKind::IntImm(v) => Some(*v),
        ExprKind::Broadcast { value, .. } => as_const_int(value),
        _ => None,
    }
}

pub fn as_const_uint(e: &Expr) -> Option<u64> {
    match e.kind() {
        ExprKind::UIntImm(v) => Some(*v),
        ExprKind::Broadcast { value, .. } => as_const_uint(value),
        _ => None,
    }
}

pub fn as_const_float(e: &Expr) -> Option<f64> {
    match e.kind() {
        ExprKind::FloatImm(v) => Some(v.0),
        ExprKind::Broadcast { value, .. } => as_const_float(value),
        _ => None,
    }
}

/// Scalar signed immediate only.
pub fn as_scalar_int(e: &Expr) -> Option<i64> {
    match e.kind() {
        ExprKind::IntImm(v) => Some(*v),
        _ => None,
    }
}

pub fn as_scalar_uint(e: &Expr) -> Option<u64> {
    match e.kind() {
        ExprKind::UIntImm(v) => Some(*v),
        _ => None,
    }
}

pub fn as_scalar_float(e: &Expr) -> Option<f64> {
    match e.kind() {
        ExprKind::FloatImm(v) => Some(v.0),
        _ => None,
    }
}

pub fn as_string(e: &Expr) -> Option<&str> {
    match e.kind() {
        ExprKind::StringImm(s) => Some(s),
        _ => None,
    }
}

/// Whether `e` is a compile-time constant, including ramps and broadcasts of constants.
pub fn is_const(e: &Expr) -> bool {
    match e.kind() {
        ExprKind::IntImm(_)
        | ExprKind::UIntImm(_)
        | ExprKind::FloatImm(_)
        | ExprKind::StringImm(_) => true,
        ExprKind::Cast(v) => is_const(v),
        ExprKind::Ramp { base, stride, .. } => is_const(base) && is_const(stride),
        ExprKind::Broadcast { value, .. } => is_const(value),
        _ => false,
    }
}

/// Whether `e` is a constant equal to `value` in every lane.
pub fn is_const_value(e: &Expr, value: i64) -> bool {
    match e.kind() {
        ExprKind::IntImm(v) => *v == value,
        ExprKind::UIntImm(v) => value >= 0 && *v == value as u64,
        ExprKind::FloatImm(v) => v.0 == value as f64,
        ExprKind::Cast(v) => is_const_value(v, value),
        ExprKind::Broadcast { value: v, .. } => is_const_value(v, value),
        _ => false,
    }
}

pub fn is_zero(e: &Expr) -> bool {
    is_const_value(e, 0)
}

pub fn is_one(e: &Expr) -> bool {
    is_const_value(e, 1)
}

pub fn is_two(e: &Expr) -> bool {
    e.ty().bits() >= 2 && is_const_value(e, 2)
}

pub fn is_positive_const(e: &Expr) -> bool {
    match e.kind() {
        ExprKind::IntImm(v) => *v > 0,
        ExprKind::UIntImm(v) => *v > 0,
        ExprKind::FloatImm(v) => v.0 > 0.0,
        ExprKind::Cast(v) => is_positive_const(v),
        ExprKind::Ramp { base, stride, .. } => is_positive_const(base) && is_positive_const(stride),
        ExprKind::Broadcast { value, .. } => is_positive_const(value),
        _ => false,
    }
}

pub fn is_negative_const(e: &Expr) -> bool {
    match e.kind() {
        ExprKind::IntImm(v) => *v < 0,
        ExprKind::FloatImm(v) => v.0 < 0.0,
        ExprKind::Cast(v) => is_negative_const(v),
        ExprKind::Ramp { base, stride, .. } => is_negative_const(base) && is_negative_const(stride),
        ExprKind::Broadcast { value, .. } => is_negative_const(value),
        _ => false,
    }
}

/// A negative constant whose negation is representable in its type.
pub fn is_negative_negatable_const(e: &Expr) -> bool {
    negatable_in(e, e.ty())
}

fn negatable_in(e: &Expr, ty: Type) -> bool {
    match e.kind() {
        ExprKind::IntImm(v) => *v < 0 && !ty.element_of().is_min(*v),
        ExprKind::FloatImm(v) => v.0 < 0.0,
        ExprKind::Cast(v) => negatable_in(v, e.ty()),
        ExprKind::Ramp { base, stride, .. } => {
            is_negative_negatable_const(base) && is_negative_const(stride)
        },
        ExprKind::Broadcast { value, .. } => is_negative_negatable_const(value),
        _ => false,
    }
}

/// If `e` is a constant positive power of two, its base-two logarithm.
pub fn is_const_power_of_two_integer(e: &Expr) -> Option<u32> {
    if !(e.ty().is_int() || e.ty().is_uint()) {
        return None;
    }
    let val = match e.kind() {
        ExprKind::Broadcast { value, .. } => return is_const_power_of_two_integer(value),
        ExprKind::Cast(value) => return is_const_power_of_two_integer(value),
        ExprKind::IntImm(v) if *v >= 0 => *v as u64,
        ExprKind::UIntImm(v) => *v,
        _ => return None,
    };
    if val != 0 && val & (val - 1) == 0 {
        Some(val.trailing_zeros())
    } else {
        None
    }
}

/// A statement that does nothing: an `Evaluate` of a constant.
pub fn is_no_op(s: &Stmt) -> bool {
    matches!(s.kind(), StmtKind::Evaluate(v) if is_const(v))
}

pub fn no_op() -> Stmt {
    Stmt::make_evaluate(make_zero(Type::int(32)))
}

pub fn is_undef(e: &Expr) -> bool {
    e.is_intrinsic(intrinsic::UNDEF)
}

// ----------------------------------------------------------------------------------
// Euclidean division

/// Integer division rounding towards negative infinity for positive divisors,
/// so that `a == b * div_imp(a, b) + mod_imp(a, b)` with a non-negative remainder.
/// The divisor must be non-zero.
pub fn div_imp(a: i64, b: i64) -> i64 {
    a.wrapping_div_euclid(b)
}

/// Non-negative remainder matching `div_imp`. The divisor must be non-zero.
pub fn mod_imp(a: i64, b: i64) -> i64 {
    a.wrapping_rem_euclid(b)
}

/// Float remainder with the sign of the divisor.
pub fn mod_imp_float(a: f64, b: f64) -> f64 {
    a - b * (a / b).floor()
}

// ----------------------------------------------------------------------------------
// Type coercion

/// Coerce two operands to a common type.
pub fn try_match_types(a: Expr, b: Expr) -> IrResult<(Expr, Expr)> {
    if a.ty() == b.ty() {
        return Ok((a, b));
    }
    let (ta, tb) = (a.ty(), b.ty());
    let (a, b) = if ta.is_scalar() && tb.is_vector() {
        (Expr::make_broadcast(a, tb.lanes()), b)
    } else if ta.is_vector() && tb.is_scalar() {
        let lanes = ta.lanes();
        (a, Expr::make_broadcast(b, lanes))
    } else if ta.lanes() != tb.lanes() {
        return Err(IrError::LaneMismatch(ta.lanes(), tb.lanes()));
    } else {
        (a, b)
    };
    let (ta, tb) = (a.ty(), b.ty());
    if ta == tb {
        return Ok((a, b));
    }
    if ta.is_handle() || tb.is_handle() {
        return Err(IrError::TypeMismatch(ta, tb));
    }
    Ok(match (ta.is_float(), tb.is_float()) {
        (false, true) => (cast(tb, a), b),
        (true, false) => (a, cast(ta, b)),
        (true, true) | (false, false) if ta.code() == tb.code() => {
            if ta.bits() > tb.bits() {
                (a, cast(ta, b))
            } else {
                (cast(tb, a), b)
            }
        },
        _ => {
            let ty = Type::int(ta.bits().max(tb.bits())).with_lanes(ta.lanes());
            (cast(ty, a), cast(ty, b))
        },
    })
}

/// Coerce two operands to a common type. Lane mismatches are a contract violation.
pub fn match_types(a: Expr, b: Expr) -> (Expr, Expr) {
    match try_match_types(a.clone(), b.clone()) {
        Ok(pair) => pair,
        Err(err) => {
            debug_assert!(false, "{}", err);
            (a, b)
        },
    }
}

/// Either side of a builder: an expression or a bare literal.
#[derive(Clone, Debug)]
pub enum Operand {
    Expr(Expr),
    Int(i64),
    Float(f64),
}

impl From<Expr> for Operand {
    fn from(e: Expr) -> Self {
        Operand::Expr(e)
    }
}

impl From<&Expr> for Operand {
    fn from(e: &Expr) -> Self {
        Operand::Expr(e.clone())
    }
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Operand::Int(v as i64)
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Operand::Int(v)
    }
}

impl From<f32> for Operand {
    fn from(v: f32) -> Self {
        Operand::Float(v as f64)
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Operand::Float(v)
    }
}

impl From<bool> for Operand {
    fn from(v: bool) -> Self {
        Operand::Expr(make_bool(v, 1))
    }
}

impl Operand {
    /// Standalone expression: `int32` for integer literals, `float32` for floats.
    pub fn into_expr(self) -> Expr {
        match self {
            Operand::Expr(e) => e,
            Operand::Int(v) => make_const(Type::int(32), v),
            Operand::Float(v) => make_const_float(Type::float(32), v),
        }
    }

    /// Expression of type `ty` for integer literals; floats stay float.
    fn into_expr_like(self, ty: Type) -> Expr {
        match self {
            Operand::Expr(e) => e,
            Operand::Int(v) => make_const(ty, v),
            Operand::Float(v) if ty.element_of().is_float() => make_const_float(ty, v),
            Operand::Float(v) => make_const_float(Type::float(32), v),
        }
    }
}

fn operands(a: Operand, b: Operand) -> (Expr, Expr) {
    let (a, b) = match (a, b) {
        (Operand::Expr(a), b) => {
            let ty = a.ty();
            (a, b.into_expr_like(ty))
        },
        (a, Operand::Expr(b)) => {
            let ty = b.ty();
            (a.into_expr_like(ty), b)
        },
        (a, b) => (a.into_expr(), b.into_expr()),
    };
    match_types(a, b)
}

macro_rules! binary_builder {
    ($($fn_name:ident => $make:ident),* $(,)?) => {
        $(
            pub fn $fn_name(a: impl Into<Operand>, b: impl Into<Operand>) -> Expr {
                let (a, b) = operands(a.into(), b.into());
                Expr::$make(a, b)
            }
        )*
    };
}

binary_builder! {
    add => make_add,
    sub => make_sub,
    mul => make_mul,
    div => make_div,
    modulo => make_mod,
    min => make_min,
    max => make_max,
    eq => make_eq,
    ne => make_ne,
    lt => make_lt,
    le => make_le,
    gt => make_gt,
    ge => make_ge,
}

pub fn and(a: impl Into<Operand>, b: impl Into<Operand>) -> Expr {
    let (a, b) = operands(a.into(), b.into());
    Expr::make_and(a, b)
}

pub fn or(a: impl Into<Operand>, b: impl Into<Operand>) -> Expr {
    let (a, b) = operands(a.into(), b.into());
    Expr::make_or(a, b)
}

pub fn not(a: impl Into<Operand>) -> Expr {
    Expr::make_not(a.into().into_expr())
}

/// `max(min(a, hi), lo)`.
pub fn clamp(a: impl Into<Operand>, lo: impl Into<Operand>, hi: impl Into<Operand>) -> Expr {
    let a = a.into().into_expr();
    let ty = a.ty();
    let lo = lo.into().into_expr_like(ty);
    let hi = hi.into().into_expr_like(ty);
    max(min(a, hi), lo)
}

/// A select, broadcasting a scalar condition and coercing literal branches.
pub fn select(
    condition: impl Into<Operand>,
    true_value: impl Into<Operand>,
    false_value: impl Into<Operand>,
) -> Expr {
    let (t, f) = operands(true_value.into(), false_value.into());
    let mut c = condition.into().into_expr();
    if c.ty().is_scalar() && t.ty().is_vector() {
        c = Expr::make_broadcast(c, t.ty().lanes());
    }
    Expr::make_select(c, t, f)
}

/// Convert to `ty`, folding constants and broadcasting scalars to vector types.
pub fn cast(ty: Type, value: impl Into<Operand>) -> Expr {
    let value = match value.into() {
        Operand::Int(v) => return make_const(ty, v),
        Operand::Float(v) => return make_const_float(ty, v),
        Operand::Expr(e) => e,
    };
    if value.ty() == ty {
        return value;
    }
    if ty.is_vector() {
        if value.ty().is_scalar() {
            return Expr::make_broadcast(cast(ty.element_of(), value), ty.lanes());
        }
        if let Some((v, lanes)) = value.as_broadcast() {
            return Expr::make_broadcast(cast(ty.element_of(), v.clone()), lanes);
        }
    }
    if !ty.is_handle() {
        match value.kind() {
            ExprKind::IntImm(v) => return make_const(ty, *v),
            ExprKind::UIntImm(v) => return make_const_uint(ty, *v),
            ExprKind::FloatImm(v) => return make_const_float(ty, v.0),
            _ => {},
        }
    }
    Expr::make_cast(ty, value)
}

pub fn ramp(base: impl Into<Operand>, stride: impl Into<Operand>, lanes: u16) -> Expr {
    let (base, stride) = operands(base.into(), stride.into());
    Expr::make_ramp(base, stride, lanes)
}

pub fn broadcast(value: impl Into<Operand>, lanes: u16) -> Expr {
    Expr::make_broadcast(value.into().into_expr(), lanes)
}

// ----------------------------------------------------------------------------------
// Intrinsics and math

fn intrinsic_call(ty: Type, name: &str, args: Vec<Expr>) -> Expr {
    Expr::make_call(ty, name, args, CallType::PureIntrinsic)
}

/// Marks a condition as likely to be true.
pub fn likely(e: impl Into<Operand>) -> Expr {
    let e = e.into().into_expr();
    intrinsic_call(e.ty(), intrinsic::LIKELY, vec![e])
}

/// Absolute value. Signed integers produce the unsigned type of the same width.
pub fn abs(e: impl Into<Operand>) -> Expr {
    let e = e.into().into_expr();
    let ty = e.ty();
    if ty.is_uint() {
        return e;
    }
    let out = if ty.is_int() {
        ty.with_code(crate::types::TypeCode::UInt)
    } else {
        ty
    };
    intrinsic_call(out, intrinsic::ABS, vec![e])
}

macro_rules! bit_builder {
    ($($fn_name:ident => $name:expr),* $(,)?) => {
        $(
            pub fn $fn_name(a: impl Into<Operand>, b: impl Into<Operand>) -> Expr {
                let (a, b) = operands(a.into(), b.into());
                intrinsic_call(a.ty(), $name, vec![a, b])
            }
        )*
    };
}

bit_builder! {
    shift_left => intrinsic::SHIFT_LEFT,
    shift_right => intrinsic::SHIFT_RIGHT,
    bitwise_and => intrinsic::BITWISE_AND,
    bitwise_or => intrinsic::BITWISE_OR,
    bitwise_xor => intrinsic::BITWISE_XOR,
}

pub fn bitwise_not(a: impl Into<Operand>) -> Expr {
    let a = a.into().into_expr();
    intrinsic_call(a.ty(), intrinsic::BITWISE_NOT, vec![a])
}

/// Float type the math builders compute in: `float64` stays, anything else is `float32`.
fn math_type(ty: Type) -> Type {
    if ty.element_of() == Type::float(64) {
        ty
    } else {
        Type::float(32).with_lanes(ty.lanes())
    }
}

fn math_call(name: &str, args: Vec<Expr>) -> Expr {
    let ty = math_type(args[0].ty());
    let suffix = if ty.bits() == 64 { "f64" } else { "f32" };
    let args = args.into_iter().map(|a| cast(ty, a)).collect();
    Expr::make_call(ty, format!("{}_{}", name, suffix), args, CallType::PureExtern)
}

macro_rules! math_builder {
    ($($fn_name:ident),* $(,)?) => {
        $(
            pub fn $fn_name(x: impl Into<Operand>) -> Expr {
                math_call(stringify!($fn_name), vec![x.into().into_expr()])
            }
        )*
    };
}

math_builder!(sqrt, log, exp, floor, ceil, round, trunc);

pub fn pow(x: impl Into<Operand>, y: impl Into<Operand>) -> Expr {
    math_call("pow", vec![x.into().into_expr(), y.into().into_expr()])
}

/// Concatenates its arguments as text.
pub fn stringify(args: Vec<Expr>) -> Expr {
    Expr::make_call(Type::handle(), intrinsic::STRINGIFY, args, CallType::PureIntrinsic)
}

/// An unspecified value of type `ty`.
pub fn undef(ty: Type) -> Expr {
    Expr::make_call(ty, intrinsic::UNDEF, vec![], CallType::PureIntrinsic)
}

// ----------------------------------------------------------------------------------
// Operator overloads

macro_rules! overload {
    ($trait:ident, $method:ident, $builder:ident) => {
        impl<T: Into<Operand>> ops::$trait<T> for Expr {
            type Output = Expr;

            fn $method(self, rhs: T) -> Expr {
                $builder(self, rhs)
            }
        }

        impl<T: Into<Operand>> ops::$trait<T> for &Expr {
            type Output = Expr;

            fn $method(self, rhs: T) -> Expr {
                $builder(self.clone(), rhs)
            }
        }

        impl ops::$trait<Expr> for i32 {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                $builder(self, rhs)
            }
        }

        impl ops::$trait<&Expr> for i32 {
            type Output = Expr;

            fn $method(self, rhs: &Expr) -> Expr {
                $builder(self, rhs.clone())
            }
        }

        impl ops::$trait<Expr> for f32 {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                $builder(self, rhs)
            }
        }
    };
}

overload!(Add, add, add);
overload!(Sub, sub, sub);
overload!(Mul, mul, mul);
overload!(Div, div, div);
overload!(Rem, rem, modulo);

impl ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        let zero = make_zero(self.ty());
        Expr::make_sub(zero, self)
    }
}

impl ops::Neg for &Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        -self.clone()
    }
}

impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::make_not(self)
    }
}

impl ops::Not for &Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::make_not(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::variable(Type::int(32), "x")
    }

    #[test]
    fn test_euclidean_helpers() {
        assert_eq!(div_imp(23, 4), 5);
        assert_eq!(div_imp(-23, 4), -6);
        assert_eq!(div_imp(-23, -4), 6);
        assert_eq!(div_imp(23, -4), -5);
        assert_eq!(mod_imp(-23, 4), 1);
        assert_eq!(mod_imp(-23, -4), 1);
        assert_eq!(mod_imp(23, -4), 3);
        assert_eq!(mod_imp(-2000000000, 1000000001), 2);
        assert_eq!(mod_imp_float(7.25, 2.0), 1.25);
        assert_eq!(mod_imp_float(-7.25, 2.0), 0.75);
        assert_eq!(mod_imp_float(-7.25, -2.0), -1.25);
        assert_eq!(mod_imp_float(7.25, -2.0), -0.75);
    }

    #[test]
    fn test_literal_takes_expression_type() {
        let y = Expr::variable(Type::int(16), "y");
        let e = &y + 3;
        let (_, c) = e.as_add().unwrap();
        assert_eq!(c.ty(), Type::int(16));
        assert_eq!(as_const_int(c), Some(3));
    }

    #[test]
    fn test_match_types() {
        let f = Expr::variable(Type::float(32), "f");
        let e = x() + f;
        assert_eq!(e.ty(), Type::float(32));

        let v = Expr::variable(Type::int(32).with_lanes(4), "v");
        let e = x() + v;
        assert_eq!(e.ty(), Type::int(32).with_lanes(4));
        assert!(e.as_add().unwrap().0.as_broadcast().is_some());

        let u = Expr::variable(Type::uint(8), "u");
        let e = x() + u;
        assert_eq!(e.ty(), Type::int(32));

        let a = Expr::variable(Type::int(32).with_lanes(4), "a");
        let b = Expr::variable(Type::int(32).with_lanes(8), "b");
        assert_eq!(try_match_types(a, b).unwrap_err(), IrError::LaneMismatch(4, 8));
    }

    #[test]
    fn test_cast_folds_constants() {
        let e = cast(Type::int(32), cast(Type::int(8), 1232));
        assert_eq!(as_const_int(&e), Some(-48));
        let e = cast(Type::uint(64), cast(Type::uint(32), cast(Type::int(8), -1)));
        assert_eq!(as_const_uint(&e), Some(0xffff_ffff));
        let v = cast(Type::int(32).with_lanes(4), x());
        assert!(v.as_broadcast().is_some());
    }

    #[test]
    fn test_constant_predicates() {
        assert!(is_zero(&make_zero(Type::float(32).with_lanes(4))));
        assert!(is_one(&const_true(1)));
        assert!(is_negative_negatable_const(&make_const(Type::int(32), -3)));
        assert!(!is_negative_negatable_const(&make_const(Type::int(8), -128)));
        assert_eq!(is_const_power_of_two_integer(&make_const(Type::int(32), 64)), Some(6));
        assert_eq!(is_const_power_of_two_integer(&make_const(Type::int(32), 6)), None);
        assert!(is_no_op(&no_op()));
        assert!(is_const(&ramp(0, 1, 4)));
        assert!(!is_const(&x()));
    }

    #[test]
    fn test_math_builders() {
        let e = sqrt(x());
        let (name, args, call_type) = e.as_call().unwrap();
        assert_eq!(name, "sqrt_f32");
        assert_eq!(call_type, CallType::PureExtern);
        assert_eq!(args[0].ty(), Type::float(32));
        assert_eq!(abs(x()).ty(), Type::uint(32));
        let x = x();
        assert_eq!(clamp(&x, 0, 10), max(min(&x, 10), 0));
    }
}
