// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Arithmetic reasoning over the vector IR.
//!
//! - `simplify`: the rule-based algebraic simplifier and `can_prove`.
//! - `modulus_remainder`: the congruence analysis `e ≡ r (mod m)` the
//!   simplifier uses for alignment facts.
//! - `deinterleave`: strided lane extraction from vector expressions.
//! - `interval` and `options`: caller-supplied bounds and run options.

pub mod deinterleave;
pub mod interval;
pub mod modulus_remainder;
pub mod options;
pub mod simplify;

pub use deinterleave::{extract_even_lanes, extract_lane, extract_lanes, extract_odd_lanes};
pub use interval::Interval;
pub use modulus_remainder::{modulus_remainder, reduce_expr_modulo, ModulusRemainder};
pub use options::{Experiment, Options};
pub use simplify::{
    can_prove, simplify, simplify_expr, simplify_exprs, simplify_stmt, simplify_stmt_with_options,
    simplify_with_options,
};
