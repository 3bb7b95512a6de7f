// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Intermediate representation for vectorised loop nests: typed expression and
//! statement nodes, nested scopes, rewriting traversals and substitution.

pub mod display;
pub mod error;
pub mod eval;
pub mod ir;
pub mod ir_operator;
pub mod mutator;
pub mod scope;
pub mod substitute;
pub mod types;
pub mod visitor;

pub use error::{IrError, IrResult};
pub use ir::{CallType, Expr, ExprKind, ForType, Stmt, StmtKind, Var};
pub use scope::Scope;
pub use types::{Type, TypeCode};
