// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Strided lane extraction from vector expressions.
//!
//! `extract_lanes(e, start, stride, n)` builds an expression whose lane `i`
//! is lane `start + i * stride` of `e`. Instead of wrapping `e` in a shuffle,
//! the extraction is pushed through the node kinds that allow it: a ramp
//! becomes a ramp with a scaled stride, a broadcast just gets narrower,
//! element-wise nodes extract from their operands, and an interleave gives
//! back one of its inputs. Only nodes with no structural shortcut (an
//! unknown vector variable, an impure call) are wrapped in a shuffle. Every
//! result is simplified before it is returned.

use crate::simplify::simplify_expr;
use ir_core::{
    ir::shuffle_is_interleave,
    ir_operator::{add, mul},
    mutator::{mutate_exprs, walk_expr, IrMutator},
    Expr, ExprKind, Scope, Var,
};
use log::trace;

/// Vector variables a caller has already split into their even and odd lanes.
#[derive(Clone, Debug)]
pub struct LaneSplit {
    pub even: Var,
    pub odd: Var,
}

struct Deinterleaver<'a> {
    starting_lane: u16,
    lane_stride: u16,
    new_lanes: u16,
    external: &'a Scope<'a, LaneSplit>,
    // Vector lets met on the way down, bound to their extracted copies.
    internal: Scope<'static, Expr>,
}

impl<'a> Deinterleaver<'a> {
    fn new(
        starting_lane: u16,
        lane_stride: u16,
        new_lanes: u16,
        external: &'a Scope<'a, LaneSplit>,
    ) -> Self {
        Self {
            starting_lane,
            lane_stride,
            new_lanes,
            external,
            internal: Scope::new(),
        }
    }

    fn lane_indices(&self) -> impl Iterator<Item = usize> {
        let (start, stride) = (self.starting_lane as usize, self.lane_stride as usize);
        (0..self.new_lanes as usize).map(move |i| start + i * stride)
    }

    /// The fallback: an explicit shuffle picking the lanes out of `e`.
    fn shuffle(&self, e: &Expr) -> Expr {
        Expr::make_slice(
            e.clone(),
            self.starting_lane as i32,
            self.lane_stride as i32,
            self.new_lanes,
        )
    }

    fn visit_variable(&self, e: &Expr, var: &Var) -> Expr {
        if let Some(replacement) = self.internal.get(var) {
            return replacement.clone();
        }
        if let Some(split) = self.external.get(var) {
            let lanes = e.ty().lanes();
            let half = match self.starting_lane {
                0 => Some((&split.even, lanes.div_ceil(2))),
                1 => Some((&split.odd, lanes / 2)),
                _ => None,
            };
            if let Some((half_var, half_lanes)) = half {
                if self.lane_stride == 2 && self.new_lanes == half_lanes {
                    return half_var.to_expr(e.ty().with_lanes(half_lanes));
                }
            }
        }
        self.shuffle(e)
    }

    fn visit_let(&mut self, var: &Var, value: &Expr, body: &Expr) -> Expr {
        if value.ty().is_scalar() {
            let new_body = self.mutate_expr(body);
            return Expr::make_let(var.clone(), value.clone(), new_body);
        }
        let new_value = self.mutate_expr(value);
        let new_var = Var::new(format!("{}.lanes", var.name()));
        self.internal
            .push(var.clone(), new_var.to_expr(new_value.ty()));
        let new_body = self.mutate_expr(body);
        self.internal.pop(var);
        // The original binding stays for anything that still refers to it.
        Expr::make_let(
            var.clone(),
            value.clone(),
            Expr::make_let(new_var, new_value, new_body),
        )
    }

    fn visit_shuffle(&self, vectors: &[Expr], indices: &[i32]) -> Expr {
        let (start, stride) = (self.starting_lane as usize, self.lane_stride as usize);
        if shuffle_is_interleave(vectors, indices) {
            let k = vectors.len();
            let lanes = vectors[0].ty().lanes() as usize;
            if k == stride {
                return Expr::make_slice(
                    vectors[start % k].clone(),
                    (start / k) as i32,
                    1,
                    self.new_lanes,
                );
            }
            if start < stride && k % stride == 0 && self.new_lanes as usize == lanes * k / stride {
                let picked = vectors.iter().skip(start).step_by(stride).cloned().collect();
                return Expr::make_interleave(picked);
            }
        }
        let picked = self.lane_indices().map(|lane| indices[lane]).collect();
        Expr::make_shuffle(vectors.to_vec(), picked)
    }
}

impl IrMutator for Deinterleaver<'_> {
    fn visit_expr(&mut self, e: &Expr) -> Expr {
        let ty = e.ty();
        if ty.is_scalar() {
            return e.clone();
        }
        let new_ty = ty.with_lanes(self.new_lanes);
        match e.kind() {
            ExprKind::Broadcast { value, .. } => {
                if self.new_lanes == 1 {
                    value.clone()
                } else {
                    Expr::make_broadcast(value.clone(), self.new_lanes)
                }
            },
            ExprKind::Ramp { base, stride, .. } => {
                let new_base = add(base, mul(stride, self.starting_lane as i64));
                if self.new_lanes == 1 {
                    new_base
                } else {
                    let new_stride = mul(stride, self.lane_stride as i64);
                    Expr::make_ramp(new_base, new_stride, self.new_lanes)
                }
            },
            ExprKind::Variable(var) => self.visit_variable(e, var),
            ExprKind::Cast(value) => Expr::make_cast(new_ty, self.mutate_expr(value)),
            ExprKind::Load {
                buffer,
                index,
                predicate,
            } => {
                let new_index = self.mutate_expr(index);
                let new_predicate = self.mutate_expr(predicate);
                Expr::make_load(new_ty, buffer.clone(), new_index, new_predicate)
            },
            ExprKind::Call {
                name,
                args,
                call_type,
            } => {
                if call_type.is_pure() {
                    let (new_args, _) = mutate_exprs(self, args);
                    Expr::make_call(new_ty, name.clone(), new_args, *call_type)
                } else {
                    self.shuffle(e)
                }
            },
            ExprKind::Let { var, value, body } => self.visit_let(var, value, body),
            ExprKind::Shuffle { vectors, indices } => self.visit_shuffle(vectors, indices),
            ExprKind::Poison(_) => Expr::make_poison(new_ty),
            ExprKind::Indeterminate(_) => Expr::make_indeterminate(new_ty),
            _ => walk_expr(self, e),
        }
    }
}

// ----------------------------------------------------------------------------------
// Entry points

/// Lanes `starting_lane + i * lane_stride` for `i` in `0..new_lanes`, with
/// vector variables of `lets` read through their split halves.
pub fn extract_lanes_in(
    e: &Expr,
    starting_lane: u16,
    lane_stride: u16,
    new_lanes: u16,
    lets: &Scope<LaneSplit>,
) -> Expr {
    let lanes = e.ty().lanes() as usize;
    let last_lane =
        starting_lane as usize + (new_lanes as usize).saturating_sub(1) * (lane_stride as usize);
    debug_assert!(
        new_lanes > 0 && lane_stride > 0 && last_lane < lanes,
        "extracting {} lanes from {} with stride {} out of range of `{}`",
        new_lanes,
        starting_lane,
        lane_stride,
        e
    );
    if e.ty().is_scalar() {
        return e.clone();
    }
    let extracted =
        Deinterleaver::new(starting_lane, lane_stride, new_lanes, lets).mutate_expr(e);
    trace!(
        "lanes {}..{} by {} of `{}` => `{}`",
        starting_lane,
        new_lanes,
        lane_stride,
        e,
        extracted
    );
    simplify_expr(&extracted)
}

pub fn extract_lanes(e: &Expr, starting_lane: u16, lane_stride: u16, new_lanes: u16) -> Expr {
    extract_lanes_in(e, starting_lane, lane_stride, new_lanes, &Scope::new())
}

pub fn extract_even_lanes_in(e: &Expr, lets: &Scope<LaneSplit>) -> Expr {
    let lanes = e.ty().lanes();
    extract_lanes_in(e, 0, 2, lanes.div_ceil(2), lets)
}

pub fn extract_odd_lanes_in(e: &Expr, lets: &Scope<LaneSplit>) -> Expr {
    let lanes = e.ty().lanes();
    extract_lanes_in(e, 1, 2, lanes / 2, lets)
}

pub fn extract_even_lanes(e: &Expr) -> Expr {
    extract_even_lanes_in(e, &Scope::new())
}

pub fn extract_odd_lanes(e: &Expr) -> Expr {
    extract_odd_lanes_in(e, &Scope::new())
}

/// The scalar value of one lane.
pub fn extract_lane(e: &Expr, lane: u16) -> Expr {
    extract_lanes(e, lane, e.ty().lanes(), 1)
}
