// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Expression and statement nodes.
//!
//! Nodes are immutable and shared through `Arc`. Each node caches a structural
//! hash computed from its children at construction, so that structural equality
//! and hashing are cheap: `Expr: Eq + Hash` compares by value, while
//! `same_as` compares by identity. Rewriters return the very same `Arc` when
//! nothing changed, which is how callers detect progress.
//!
//! Variables are identified by a unique id handed out at creation; two
//! variables with the same name are distinct bindings.

use crate::{
    error::{IrError, IrResult},
    types::Type,
};
use ordered_float::OrderedFloat;
use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

static NEXT_VAR_ID: AtomicU64 = AtomicU64::new(0);
static NEXT_MARKER_TOKEN: AtomicU64 = AtomicU64::new(0);

// ----------------------------------------------------------------------------------
// Variables

#[derive(Debug)]
struct VarData {
    id: u64,
    name: String,
}

/// A variable binding. Equality, ordering and hashing use the unique id only.
#[derive(Clone)]
pub struct Var(Arc<VarData>);

impl Var {
    pub fn new(name: impl Into<String>) -> Self {
        Var(Arc::new(VarData {
            id: NEXT_VAR_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// A reference to this variable as an expression of type `ty`.
    pub fn to_expr(&self, ty: Type) -> Expr {
        Expr::make_var(ty, self.clone())
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Var {}

impl PartialOrd for Var {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Var {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.id.cmp(&other.0.id)
    }
}

impl Hash for Var {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}#{}", self.0.name, self.0.id)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

// ----------------------------------------------------------------------------------
// Calls

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallType {
    Extern,
    PureExtern,
    Intrinsic,
    PureIntrinsic,
}

impl CallType {
    pub fn is_pure(self) -> bool {
        matches!(self, CallType::PureExtern | CallType::PureIntrinsic)
    }

    pub fn is_intrinsic(self) -> bool {
        matches!(self, CallType::Intrinsic | CallType::PureIntrinsic)
    }
}

/// Names of the intrinsics the simplifier understands.
pub mod intrinsic {
    pub const LIKELY: &str = "likely";
    pub const SHIFT_LEFT: &str = "shift_left";
    pub const SHIFT_RIGHT: &str = "shift_right";
    pub const BITWISE_AND: &str = "bitwise_and";
    pub const BITWISE_OR: &str = "bitwise_or";
    pub const BITWISE_XOR: &str = "bitwise_xor";
    pub const BITWISE_NOT: &str = "bitwise_not";
    pub const ABS: &str = "abs";
    pub const STRINGIFY: &str = "stringify";
    pub const UNDEF: &str = "undef";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ForType {
    Serial,
    Parallel,
    Vectorized,
    Unrolled,
}

// ----------------------------------------------------------------------------------
// Expressions

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExprKind {
    IntImm(i64),
    UIntImm(u64),
    FloatImm(OrderedFloat<f64>),
    StringImm(Arc<str>),
    Cast(Expr),
    Variable(Var),
    Add(Expr, Expr),
    Sub(Expr, Expr),
    Mul(Expr, Expr),
    Div(Expr, Expr),
    Mod(Expr, Expr),
    Min(Expr, Expr),
    Max(Expr, Expr),
    Eq(Expr, Expr),
    Ne(Expr, Expr),
    Lt(Expr, Expr),
    Le(Expr, Expr),
    Gt(Expr, Expr),
    Ge(Expr, Expr),
    And(Expr, Expr),
    Or(Expr, Expr),
    Not(Expr),
    Select(Expr, Expr, Expr),
    Load {
        buffer: Var,
        index: Expr,
        predicate: Expr,
    },
    Ramp {
        base: Expr,
        stride: Expr,
        lanes: u16,
    },
    Broadcast {
        value: Expr,
        lanes: u16,
    },
    Let {
        var: Var,
        value: Expr,
        body: Expr,
    },
    Shuffle {
        vectors: Vec<Expr>,
        indices: Vec<i32>,
    },
    Call {
        name: Arc<str>,
        args: Vec<Expr>,
        call_type: CallType,
    },
    /// Result of a constant fold that overflowed a type with undefined overflow.
    Poison(u64),
    /// Result of an integer division or modulo by a provable zero.
    Indeterminate(u64),
}

pub struct ExprNode {
    ty: Type,
    hash: u64,
    kind: ExprKind,
}

#[derive(Clone)]
pub struct Expr(Arc<ExprNode>);

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.hash == other.0.hash
                && self.0.ty == other.0.ty
                && self.0.kind == other.0.kind)
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash)
    }
}

macro_rules! binary_accessors {
    ($($name:ident => $variant:ident),* $(,)?) => {
        $(
            pub fn $name(&self) -> Option<(&Expr, &Expr)> {
                match &self.0.kind {
                    ExprKind::$variant(a, b) => Some((a, b)),
                    _ => None,
                }
            }
        )*
    };
}

macro_rules! binary_constructors {
    ($($name:ident => $variant:ident),* $(,)?) => {
        $(
            pub fn $name(a: Expr, b: Expr) -> Expr {
                debug_assert_eq!(a.ty(), b.ty(), "operands of {} must share a type", stringify!($variant));
                let ty = a.ty();
                Expr::new(ty, ExprKind::$variant(a, b))
            }
        )*
    };
}

macro_rules! comparison_constructors {
    ($($name:ident => $variant:ident),* $(,)?) => {
        $(
            pub fn $name(a: Expr, b: Expr) -> Expr {
                debug_assert_eq!(a.ty(), b.ty(), "operands of {} must share a type", stringify!($variant));
                let ty = Type::boolean().with_lanes(a.ty().lanes());
                Expr::new(ty, ExprKind::$variant(a, b))
            }
        )*
    };
}

impl Expr {
    fn new(ty: Type, kind: ExprKind) -> Expr {
        let mut hasher = DefaultHasher::new();
        ty.hash(&mut hasher);
        kind.hash(&mut hasher);
        Expr(Arc::new(ExprNode {
            ty,
            hash: hasher.finish(),
            kind,
        }))
    }

    pub fn ty(&self) -> Type {
        self.0.ty
    }

    pub fn kind(&self) -> &ExprKind {
        &self.0.kind
    }

    /// Identity comparison: whether both handles point at the same node.
    pub fn same_as(&self, other: &Expr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn structural_hash(&self) -> u64 {
        self.0.hash
    }

    // ---- Leaf constructors

    /// An integer immediate, normalised to the width of `ty`.
    pub fn make_int(ty: Type, value: i64) -> Expr {
        debug_assert!(ty.is_int() && ty.is_scalar(), "IntImm must be a scalar int");
        let shift = 64 - ty.bits() as u32;
        let value = if shift == 0 {
            value
        } else {
            (value << shift) >> shift
        };
        Expr::new(ty, ExprKind::IntImm(value))
    }

    /// An unsigned immediate, normalised to the width of `ty`.
    pub fn make_uint(ty: Type, value: u64) -> Expr {
        debug_assert!(ty.is_uint() && ty.is_scalar(), "UIntImm must be a scalar uint");
        let shift = 64 - ty.bits() as u32;
        let value = if shift == 0 {
            value
        } else {
            (value << shift) >> shift
        };
        Expr::new(ty, ExprKind::UIntImm(value))
    }

    /// A float immediate, rounded to the width of `ty`.
    pub fn make_float(ty: Type, value: f64) -> Expr {
        debug_assert!(ty.is_float() && ty.is_scalar(), "FloatImm must be a scalar float");
        let value = if ty.bits() == 32 {
            value as f32 as f64
        } else {
            value
        };
        Expr::new(ty, ExprKind::FloatImm(OrderedFloat(value)))
    }

    pub fn make_string(value: impl Into<Arc<str>>) -> Expr {
        Expr::new(Type::handle(), ExprKind::StringImm(value.into()))
    }

    pub fn make_var(ty: Type, var: Var) -> Expr {
        Expr::new(ty, ExprKind::Variable(var))
    }

    /// A fresh variable of type `ty`.
    pub fn variable(ty: Type, name: impl Into<String>) -> Expr {
        Expr::make_var(ty, Var::new(name))
    }

    pub fn make_poison(ty: Type) -> Expr {
        Expr::new(
            ty,
            ExprKind::Poison(NEXT_MARKER_TOKEN.fetch_add(1, Ordering::Relaxed)),
        )
    }

    pub fn make_indeterminate(ty: Type) -> Expr {
        Expr::new(
            ty,
            ExprKind::Indeterminate(NEXT_MARKER_TOKEN.fetch_add(1, Ordering::Relaxed)),
        )
    }

    // ---- Operators

    pub fn make_cast(ty: Type, value: Expr) -> Expr {
        debug_assert_eq!(ty.lanes(), value.ty().lanes(), "cast may not change lanes");
        Expr::new(ty, ExprKind::Cast(value))
    }

    binary_constructors! {
        make_add => Add,
        make_sub => Sub,
        make_mul => Mul,
        make_div => Div,
        make_mod => Mod,
        make_min => Min,
        make_max => Max,
    }

    comparison_constructors! {
        make_eq => Eq,
        make_ne => Ne,
        make_lt => Lt,
        make_le => Le,
        make_gt => Gt,
        make_ge => Ge,
    }

    pub fn make_and(a: Expr, b: Expr) -> Expr {
        debug_assert!(a.ty().is_bool() && a.ty() == b.ty(), "And of non-boolean operands");
        let ty = a.ty();
        Expr::new(ty, ExprKind::And(a, b))
    }

    pub fn make_or(a: Expr, b: Expr) -> Expr {
        debug_assert!(a.ty().is_bool() && a.ty() == b.ty(), "Or of non-boolean operands");
        let ty = a.ty();
        Expr::new(ty, ExprKind::Or(a, b))
    }

    pub fn make_not(a: Expr) -> Expr {
        debug_assert!(a.ty().is_bool(), "Not of non-boolean operand");
        let ty = a.ty();
        Expr::new(ty, ExprKind::Not(a))
    }

    pub fn make_select(condition: Expr, true_value: Expr, false_value: Expr) -> Expr {
        debug_assert!(condition.ty().is_bool(), "select condition must be boolean");
        debug_assert_eq!(true_value.ty(), false_value.ty());
        let ty = true_value.ty();
        Expr::new(ty, ExprKind::Select(condition, true_value, false_value))
    }

    /// Checked form of `make_select`.
    pub fn try_make_select(condition: Expr, true_value: Expr, false_value: Expr) -> IrResult<Expr> {
        if !condition.ty().is_bool() {
            return Err(IrError::NotBoolean(condition.ty()));
        }
        if true_value.ty() != false_value.ty() {
            return Err(IrError::TypeMismatch(true_value.ty(), false_value.ty()));
        }
        if condition.ty().is_vector() && condition.ty().lanes() != true_value.ty().lanes() {
            return Err(IrError::LaneMismatch(
                condition.ty().lanes(),
                true_value.ty().lanes(),
            ));
        }
        Ok(Expr::make_select(condition, true_value, false_value))
    }

    pub fn make_load(ty: Type, buffer: Var, index: Expr, predicate: Expr) -> Expr {
        debug_assert_eq!(ty.lanes(), index.ty().lanes());
        Expr::new(ty, ExprKind::Load {
            buffer,
            index,
            predicate,
        })
    }

    pub fn make_ramp(base: Expr, stride: Expr, lanes: u16) -> Expr {
        debug_assert!(base.ty().is_scalar() && lanes > 1, "ramp of a vector or of one lane");
        debug_assert_eq!(base.ty(), stride.ty());
        let ty = base.ty().with_lanes(lanes);
        Expr::new(ty, ExprKind::Ramp {
            base,
            stride,
            lanes,
        })
    }

    pub fn make_broadcast(value: Expr, lanes: u16) -> Expr {
        debug_assert!(value.ty().is_scalar() && lanes > 1, "broadcast of a vector or to one lane");
        let ty = value.ty().with_lanes(lanes);
        Expr::new(ty, ExprKind::Broadcast { value, lanes })
    }

    pub fn make_let(var: Var, value: Expr, body: Expr) -> Expr {
        let ty = body.ty();
        Expr::new(ty, ExprKind::Let { var, value, body })
    }

    pub fn make_call(ty: Type, name: impl Into<Arc<str>>, args: Vec<Expr>, call_type: CallType) -> Expr {
        Expr::new(ty, ExprKind::Call {
            name: name.into(),
            args,
            call_type,
        })
    }

    pub fn make_shuffle(vectors: Vec<Expr>, indices: Vec<i32>) -> Expr {
        debug_assert!(!vectors.is_empty() && !indices.is_empty(), "empty shuffle");
        let ty = vectors[0].ty().element_of().with_lanes(indices.len() as u16);
        Expr::new(ty, ExprKind::Shuffle { vectors, indices })
    }

    /// Checked form of `make_shuffle`.
    pub fn try_make_shuffle(vectors: Vec<Expr>, indices: Vec<i32>) -> IrResult<Expr> {
        if vectors.is_empty() || indices.is_empty() {
            return Err(IrError::EmptyShuffle);
        }
        let element = vectors[0].ty().element_of();
        let mut input_lanes: u16 = 0;
        for v in &vectors {
            if v.ty().element_of() != element {
                return Err(IrError::ShuffleElementMismatch(element, v.ty().element_of()));
            }
            input_lanes += v.ty().lanes();
        }
        if let Some(&index) = indices
            .iter()
            .find(|&&i| i < 0 || i >= input_lanes as i32)
        {
            return Err(IrError::ShuffleIndexOutOfRange { index, input_lanes });
        }
        Ok(Expr::make_shuffle(vectors, indices))
    }

    /// Interleaves vectors of equal length lane by lane.
    pub fn make_interleave(mut vectors: Vec<Expr>) -> Expr {
        debug_assert!(!vectors.is_empty());
        if vectors.len() == 1 {
            if let Some(v) = vectors.pop() {
                return v;
            }
        }
        let lanes = vectors[0].ty().lanes() as i32;
        let n = vectors.len() as i32;
        let indices = (0..lanes)
            .flat_map(|i| (0..n).map(move |j| j * lanes + i))
            .collect();
        Expr::make_shuffle(vectors, indices)
    }

    pub fn make_concat(mut vectors: Vec<Expr>) -> Expr {
        debug_assert!(!vectors.is_empty());
        if vectors.len() == 1 {
            if let Some(v) = vectors.pop() {
                return v;
            }
        }
        let total: i32 = vectors.iter().map(|v| v.ty().lanes() as i32).sum();
        Expr::make_shuffle(vectors, (0..total).collect())
    }

    pub fn make_slice(vector: Expr, begin: i32, stride: i32, size: u16) -> Expr {
        if begin == 0 && stride == 1 && size == vector.ty().lanes() {
            return vector;
        }
        let indices = (0..size as i32).map(|i| begin + i * stride).collect();
        Expr::make_shuffle(vec![vector], indices)
    }

    pub fn make_extract_element(vector: Expr, lane: i32) -> Expr {
        Expr::make_slice(vector, lane, 1, 1)
    }

    // ---- Accessors

    binary_accessors! {
        as_add => Add,
        as_sub => Sub,
        as_mul => Mul,
        as_div => Div,
        as_mod => Mod,
        as_min => Min,
        as_max => Max,
        as_eq => Eq,
        as_ne => Ne,
        as_lt => Lt,
        as_le => Le,
        as_gt => Gt,
        as_ge => Ge,
        as_and => And,
        as_or => Or,
    }

    pub fn as_not(&self) -> Option<&Expr> {
        match &self.0.kind {
            ExprKind::Not(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_cast(&self) -> Option<&Expr> {
        match &self.0.kind {
            ExprKind::Cast(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&Var> {
        match &self.0.kind {
            ExprKind::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_select(&self) -> Option<(&Expr, &Expr, &Expr)> {
        match &self.0.kind {
            ExprKind::Select(c, t, f) => Some((c, t, f)),
            _ => None,
        }
    }

    pub fn as_ramp(&self) -> Option<(&Expr, &Expr, u16)> {
        match &self.0.kind {
            ExprKind::Ramp {
                base,
                stride,
                lanes,
            } => Some((base, stride, *lanes)),
            _ => None,
        }
    }

    pub fn as_broadcast(&self) -> Option<(&Expr, u16)> {
        match &self.0.kind {
            ExprKind::Broadcast { value, lanes } => Some((value, *lanes)),
            _ => None,
        }
    }

    pub fn as_load(&self) -> Option<(&Var, &Expr, &Expr)> {
        match &self.0.kind {
            ExprKind::Load {
                buffer,
                index,
                predicate,
            } => Some((buffer, index, predicate)),
            _ => None,
        }
    }

    pub fn as_let(&self) -> Option<(&Var, &Expr, &Expr)> {
        match &self.0.kind {
            ExprKind::Let { var, value, body } => Some((var, value, body)),
            _ => None,
        }
    }

    pub fn as_shuffle(&self) -> Option<(&[Expr], &[i32])> {
        match &self.0.kind {
            ExprKind::Shuffle { vectors, indices } => Some((vectors, indices)),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<(&str, &[Expr], CallType)> {
        match &self.0.kind {
            ExprKind::Call {
                name,
                args,
                call_type,
            } => Some((name, args, *call_type)),
            _ => None,
        }
    }

    /// Whether this is a call to the named intrinsic.
    pub fn is_intrinsic(&self, intrinsic: &str) -> bool {
        matches!(self.as_call(), Some((name, _, call_type)) if call_type.is_intrinsic() && name == intrinsic)
    }

    pub fn is_poison(&self) -> bool {
        matches!(self.0.kind, ExprKind::Poison(_))
    }

    pub fn is_indeterminate(&self) -> bool {
        matches!(self.0.kind, ExprKind::Indeterminate(_))
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// ----------------------------------------------------------------------------------
// Shuffle shape recognition

fn indices_form_ramp(indices: &[i32], stride: i32) -> bool {
    indices
        .windows(2)
        .all(|w| w[1].checked_sub(w[0]) == Some(stride))
}

fn input_lanes(vectors: &[Expr]) -> usize {
    vectors.iter().map(|v| v.ty().lanes() as usize).sum()
}

/// Whether the shuffle is a complete interleaving of equally sized vectors.
pub fn shuffle_is_interleave(vectors: &[Expr], indices: &[i32]) -> bool {
    let lanes = vectors[0].ty().lanes() as usize;
    // A concat of scalars is not an interleave.
    if lanes == 1 {
        return false;
    }
    if vectors.iter().any(|v| v.ty().lanes() as usize != lanes) {
        return false;
    }
    if lanes * vectors.len() != indices.len() {
        return false;
    }
    let n = vectors.len();
    (0..n).all(|i| (0..lanes).all(|j| indices[j * n + i] as usize == i * lanes + j))
}

/// Whether the shuffle concatenates all of its inputs in order.
pub fn shuffle_is_concat(vectors: &[Expr], indices: &[i32]) -> bool {
    indices.len() == input_lanes(vectors) && indices[0] == 0 && indices_form_ramp(indices, 1)
}

/// Whether the shuffle is a strided subset of its inputs.
pub fn shuffle_is_slice(vectors: &[Expr], indices: &[i32]) -> bool {
    indices.len() < input_lanes(vectors) && indices_form_ramp(indices, shuffle_slice_stride(indices))
}

pub fn shuffle_slice_begin(indices: &[i32]) -> i32 {
    indices[0]
}

pub fn shuffle_slice_stride(indices: &[i32]) -> i32 {
    if indices.len() >= 2 {
        indices[1] - indices[0]
    } else {
        1
    }
}

pub fn shuffle_is_extract_element(indices: &[i32]) -> bool {
    indices.len() == 1
}

// ----------------------------------------------------------------------------------
// Statements

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StmtKind {
    LetStmt {
        var: Var,
        value: Expr,
        body: Stmt,
    },
    AssertStmt {
        condition: Expr,
        message: Expr,
        body: Stmt,
    },
    For {
        var: Var,
        min: Expr,
        extent: Expr,
        for_type: ForType,
        body: Stmt,
    },
    Store {
        buffer: Var,
        value: Expr,
        index: Expr,
        predicate: Expr,
    },
    Allocate {
        buffer: Var,
        ty: Type,
        extents: Vec<Expr>,
        condition: Expr,
        body: Stmt,
    },
    ProducerConsumer {
        name: Arc<str>,
        is_producer: bool,
        body: Stmt,
    },
    IfThenElse {
        condition: Expr,
        then_case: Stmt,
        else_case: Option<Stmt>,
    },
    Evaluate(Expr),
    Block {
        first: Stmt,
        rest: Stmt,
    },
}

pub struct StmtNode {
    hash: u64,
    kind: StmtKind,
}

#[derive(Clone)]
pub struct Stmt(Arc<StmtNode>);

impl PartialEq for Stmt {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || (self.0.hash == other.0.hash && self.0.kind == other.0.kind)
    }
}

impl Eq for Stmt {}

impl Hash for Stmt {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash)
    }
}

impl fmt::Debug for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Stmt {
    fn new(kind: StmtKind) -> Stmt {
        let mut hasher = DefaultHasher::new();
        kind.hash(&mut hasher);
        Stmt(Arc::new(StmtNode {
            hash: hasher.finish(),
            kind,
        }))
    }

    pub fn kind(&self) -> &StmtKind {
        &self.0.kind
    }

    pub fn same_as(&self, other: &Stmt) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the shared node, usable as an identity key while the
    /// node is kept alive.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn make_let_stmt(var: Var, value: Expr, body: Stmt) -> Stmt {
        Stmt::new(StmtKind::LetStmt { var, value, body })
    }

    pub fn make_assert(condition: Expr, message: Expr, body: Stmt) -> Stmt {
        debug_assert!(condition.ty().is_bool(), "assert condition must be boolean");
        Stmt::new(StmtKind::AssertStmt {
            condition,
            message,
            body,
        })
    }

    pub fn make_for(var: Var, min: Expr, extent: Expr, for_type: ForType, body: Stmt) -> Stmt {
        Stmt::new(StmtKind::For {
            var,
            min,
            extent,
            for_type,
            body,
        })
    }

    pub fn make_store(buffer: Var, value: Expr, index: Expr, predicate: Expr) -> Stmt {
        debug_assert_eq!(value.ty().lanes(), index.ty().lanes());
        Stmt::new(StmtKind::Store {
            buffer,
            value,
            index,
            predicate,
        })
    }

    pub fn make_allocate(buffer: Var, ty: Type, extents: Vec<Expr>, condition: Expr, body: Stmt) -> Stmt {
        Stmt::new(StmtKind::Allocate {
            buffer,
            ty,
            extents,
            condition,
            body,
        })
    }

    pub fn make_producer_consumer(name: impl Into<Arc<str>>, is_producer: bool, body: Stmt) -> Stmt {
        Stmt::new(StmtKind::ProducerConsumer {
            name: name.into(),
            is_producer,
            body,
        })
    }

    pub fn make_if(condition: Expr, then_case: Stmt, else_case: Option<Stmt>) -> Stmt {
        debug_assert!(condition.ty().is_bool(), "if condition must be boolean");
        Stmt::new(StmtKind::IfThenElse {
            condition,
            then_case,
            else_case,
        })
    }

    pub fn make_evaluate(value: Expr) -> Stmt {
        Stmt::new(StmtKind::Evaluate(value))
    }

    pub fn make_block(first: Stmt, rest: Stmt) -> Stmt {
        Stmt::new(StmtKind::Block { first, rest })
    }

    /// Right-nested block of a non-empty statement sequence.
    pub fn make_block_list(stmts: Vec<Stmt>) -> Option<Stmt> {
        stmts
            .into_iter()
            .rev()
            .reduce(|rest, first| Stmt::make_block(first, rest))
    }

    pub fn as_let_stmt(&self) -> Option<(&Var, &Expr, &Stmt)> {
        match &self.0.kind {
            StmtKind::LetStmt { var, value, body } => Some((var, value, body)),
            _ => None,
        }
    }

    pub fn as_if(&self) -> Option<(&Expr, &Stmt, Option<&Stmt>)> {
        match &self.0.kind {
            StmtKind::IfThenElse {
                condition,
                then_case,
                else_case,
            } => Some((condition, then_case, else_case.as_ref())),
            _ => None,
        }
    }

    pub fn as_evaluate(&self) -> Option<&Expr> {
        match &self.0.kind {
            StmtKind::Evaluate(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<(&Stmt, &Stmt)> {
        match &self.0.kind {
            StmtKind::Block { first, rest } => Some((first, rest)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediates_are_normalised() {
        let e = Expr::make_int(Type::int(8), 1232);
        assert!(matches!(e.kind(), ExprKind::IntImm(-48)));
        let u = Expr::make_uint(Type::uint(16), u64::MAX);
        assert!(matches!(u.kind(), ExprKind::UIntImm(65535)));
        let f = Expr::make_float(Type::float(32), 0.1);
        assert!(matches!(f.kind(), ExprKind::FloatImm(v) if v.0 == 0.1f32 as f64));
    }

    #[test]
    fn test_structural_equality_and_identity() {
        let x = Expr::variable(Type::int(32), "x");
        let one = Expr::make_int(Type::int(32), 1);
        let a = Expr::make_add(x.clone(), one.clone());
        let b = Expr::make_add(x.clone(), one);
        assert_eq!(a, b);
        assert!(!a.same_as(&b));
        assert_eq!(a.structural_hash(), b.structural_hash());

        // Same name, different binding.
        let other_x = Expr::variable(Type::int(32), "x");
        assert_ne!(x, other_x);
    }

    #[test]
    fn test_markers_never_equal() {
        let p1 = Expr::make_poison(Type::int(32));
        let p2 = Expr::make_poison(Type::int(32));
        assert_ne!(p1, p2);
        assert_eq!(p1, p1.clone());
        let i1 = Expr::make_indeterminate(Type::int(32));
        assert_ne!(p1, i1);
    }

    #[test]
    fn test_shuffle_shapes() {
        let a = Expr::variable(Type::int(32).with_lanes(4), "a");
        let b = Expr::variable(Type::int(32).with_lanes(4), "b");
        let il = Expr::make_interleave(vec![a.clone(), b.clone()]);
        let (vs, is) = il.as_shuffle().unwrap();
        assert!(shuffle_is_interleave(vs, is));
        assert!(!shuffle_is_concat(vs, is));

        let cc = Expr::make_concat(vec![a.clone(), b]);
        let (vs, is) = cc.as_shuffle().unwrap();
        assert!(shuffle_is_concat(vs, is));

        let sl = Expr::make_slice(a.clone(), 1, 2, 2);
        let (vs, is) = sl.as_shuffle().unwrap();
        assert!(shuffle_is_slice(vs, is));
        assert_eq!(shuffle_slice_begin(is), 1);
        assert_eq!(shuffle_slice_stride(is), 2);

        assert!(Expr::make_slice(a.clone(), 0, 1, 4).same_as(&a));
    }

    #[test]
    fn test_checked_shuffle() {
        let a = Expr::variable(Type::int(32).with_lanes(4), "a");
        assert_eq!(
            Expr::try_make_shuffle(vec![a.clone()], vec![0, 4]).unwrap_err(),
            IrError::ShuffleIndexOutOfRange {
                index: 4,
                input_lanes: 4
            }
        );
        assert_eq!(
            Expr::try_make_shuffle(vec![], vec![0]).unwrap_err(),
            IrError::EmptyShuffle
        );
        assert!(Expr::try_make_shuffle(vec![a], vec![3, 2, 1, 0]).is_ok());
    }
}
