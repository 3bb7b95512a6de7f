// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::types::Type;
use thiserror::Error;

/// Errors reported by fallible IR construction.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IrError {
    #[error("invalid type `{0}`")]
    InvalidType(String),
    #[error("operand types `{0}` and `{1}` do not match")]
    TypeMismatch(Type, Type),
    #[error("operand lane counts {0} and {1} do not match")]
    LaneMismatch(u16, u16),
    #[error("expected a boolean expression, found type `{0}`")]
    NotBoolean(Type),
    #[error("shuffle of zero vectors or with zero indices")]
    EmptyShuffle,
    #[error("shuffle index {index} out of range for {input_lanes} input lanes")]
    ShuffleIndexOutOfRange { index: i32, input_lanes: u16 },
    #[error("shuffle inputs have mismatched element types `{0}` and `{1}`")]
    ShuffleElementMismatch(Type, Type),
    #[error("constant {value} is not representable in `{ty}`")]
    NotRepresentable { value: i64, ty: Type },
}

pub type IrResult<T> = Result<T, IrError>;
