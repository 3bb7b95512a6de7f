// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Casts, loads, ramps and shuffles.

use super::{const_float, const_int, const_uint, propagate_markers, Binary, Simplifier};
use ir_core::{
    ir::{
        shuffle_is_concat, shuffle_is_extract_element, shuffle_is_interleave, shuffle_is_slice,
        shuffle_slice_begin, shuffle_slice_stride,
    },
    ir_operator::{const_true, is_const, is_one, is_zero, make_bool, make_const, undef},
    mutator::mutate_exprs,
    Expr, Type,
};

// ----------------------------------------------------------------------------------
// Cast

/// Folds a cast of a scalar constant.
fn fold_cast(ty: Type, value: &Expr) -> Option<Expr> {
    if ty.is_vector() || ty.is_handle() {
        return None;
    }
    if ty.is_bool() {
        let truth = match (const_int(value), const_uint(value), const_float(value)) {
            (Some(i), _, _) => i != 0,
            (_, Some(u), _) => u != 0,
            (_, _, Some(f)) => f != 0.0,
            _ => return None,
        };
        return Some(make_bool(truth, 1));
    }
    if let Some(f) = const_float(value) {
        return Some(if ty.is_int() {
            Expr::make_int(ty, f as i64)
        } else if ty.is_uint() {
            Expr::make_uint(ty, f as u64)
        } else {
            Expr::make_float(ty, f)
        });
    }
    if let Some(i) = const_int(value) {
        return Some(if ty.is_int() {
            Expr::make_int(ty, i)
        } else if ty.is_uint() {
            Expr::make_uint(ty, i as u64)
        } else {
            Expr::make_float(ty, i as f64)
        });
    }
    let u = const_uint(value)?;
    Some(if ty.is_int() {
        Expr::make_int(ty, u as i64)
    } else if ty.is_uint() {
        Expr::make_uint(ty, u)
    } else {
        Expr::make_float(ty, u as f64)
    })
}

fn is_integer(ty: Type) -> bool {
    ty.is_int() || ty.is_uint()
}

pub(super) fn visit_cast(s: &mut Simplifier, e: &Expr, value: &Expr) -> Expr {
    let ty = e.ty();
    let new_value = s.mutate(value);
    if let Some(marker) = propagate_markers(ty, &[&new_value]) {
        return marker;
    }
    if new_value.ty() == ty {
        return new_value;
    }
    if let Some(folded) = fold_cast(ty, &new_value) {
        return folded;
    }
    if let Some(inner) = new_value.as_cast() {
        let middle = new_value.ty();
        // A narrowing cast of a cast of the same kind skips the inner one.
        let same_code = ty.code() == middle.code() && ty.bits() < middle.bits();
        // Truncating an integer extension keeps only bits of the source.
        let truncates = is_integer(ty)
            && is_integer(middle)
            && is_integer(inner.ty())
            && ty.bits() <= middle.bits();
        if same_code || truncates {
            return s.mutate(&Expr::make_cast(ty, inner.clone()));
        }
    }
    if let Some((v, lanes)) = new_value.as_broadcast() {
        return s.mutate(&Expr::make_broadcast(
            Expr::make_cast(ty.element_of(), v.clone()),
            lanes,
        ));
    }
    let widens_32_to_64 =
        ty.element_of() == Type::int(64) && value.ty().element_of() == Type::int(32);
    if widens_32_to_64 {
        if let Some((base, stride, lanes)) = new_value.as_ramp() {
            let elem = ty.element_of();
            return s.mutate(&Expr::make_ramp(
                Expr::make_cast(elem, base.clone()),
                Expr::make_cast(elem, stride.clone()),
                lanes,
            ));
        }
        if let Some((x, c)) = new_value.as_add() {
            if ty.is_scalar() && is_const(c) {
                // Move the constant outwards so it can cancel.
                return s.mutate(&Expr::make_add(
                    Expr::make_cast(ty, x.clone()),
                    Expr::make_cast(ty, c.clone()),
                ));
            }
        }
    }
    if new_value.same_as(value) {
        e.clone()
    } else {
        Expr::make_cast(ty, new_value)
    }
}

// ----------------------------------------------------------------------------------
// Load

pub(super) fn visit_load(s: &mut Simplifier, e: &Expr) -> Expr {
    let Some((buffer, index, predicate)) = e.as_load() else {
        return e.clone();
    };
    let new_predicate = s.mutate(predicate);
    let new_index = s.mutate(index);
    if is_zero(&new_predicate) {
        return undef(e.ty());
    }
    if let (Some((i, lanes)), Some((p, _))) = (new_index.as_broadcast(), new_predicate.as_broadcast()) {
        let load = Expr::make_load(e.ty().element_of(), buffer.clone(), i.clone(), p.clone());
        return Expr::make_broadcast(load, lanes);
    }
    if new_predicate.same_as(predicate) && new_index.same_as(index) {
        e.clone()
    } else {
        Expr::make_load(e.ty(), buffer.clone(), new_index, new_predicate)
    }
}

// ----------------------------------------------------------------------------------
// Ramp

pub(super) fn visit_ramp(s: &mut Simplifier, e: &Expr) -> Expr {
    let Some((base, stride, lanes)) = e.as_ramp() else {
        return e.clone();
    };
    let new_base = s.mutate(base);
    let new_stride = s.mutate(stride);
    if let Some(marker) = propagate_markers(e.ty(), &[&new_base, &new_stride]) {
        return marker;
    }
    if is_zero(&new_stride) {
        Expr::make_broadcast(new_base, lanes)
    } else if new_base.same_as(base) && new_stride.same_as(stride) {
        e.clone()
    } else {
        Expr::make_ramp(new_base, new_stride, lanes)
    }
}

// ----------------------------------------------------------------------------------
// Shuffle

pub(super) fn visit_shuffle(s: &mut Simplifier, e: &Expr) -> Expr {
    let Some((vectors, indices)) = e.as_shuffle() else {
        return e.clone();
    };

    if shuffle_is_extract_element(indices) {
        let lane = indices[0];
        if let Some((base, stride, lanes)) = vectors[0].as_ramp() {
            if lane < i32::from(lanes) {
                let offset = make_const(stride.ty(), i64::from(lane));
                return s.mutate(&(base + offset * stride));
            }
        }
        if let Some((value, lanes)) = vectors[0].as_broadcast() {
            if lane < i32::from(lanes) {
                return s.mutate(value);
            }
        }
    }

    let (new_vectors, changed) = mutate_exprs(s, vectors);
    let refs: Vec<&Expr> = new_vectors.iter().collect();
    if let Some(marker) = propagate_markers(e.ty(), &refs) {
        return marker;
    }

    if let Some(dense) = dense_load(s, &new_vectors, indices) {
        return dense;
    }
    if let Some(collapsed) = collapse_broadcasts(s, &new_vectors, indices) {
        return collapsed;
    }
    if shuffle_is_interleave(&new_vectors, indices) {
        if let Some(collapsed) = interleave_of_ramps(s, &new_vectors) {
            return collapsed;
        }
        if let Some(collapsed) = interleave_of_slices(&new_vectors) {
            return collapsed;
        }
    } else if shuffle_is_concat(&new_vectors, indices) {
        if let Some(collapsed) = concat_of_ramps(s, &new_vectors, indices) {
            return collapsed;
        }
        if let Some(collapsed) = concat_of_scalars(s, &new_vectors, indices) {
            return collapsed;
        }
    }

    if changed {
        Expr::make_shuffle(new_vectors, indices.to_vec())
    } else {
        e.clone()
    }
}

/// A shuffle of loads from one buffer whose shuffled index is a ramp
/// becomes a single dense load.
fn dense_load(s: &mut Simplifier, vectors: &[Expr], indices: &[i32]) -> Option<Expr> {
    let (buffer, _, _) = vectors[0].as_load()?;
    let mut load_indices = Vec::with_capacity(vectors.len());
    let mut load_predicates = Vec::with_capacity(vectors.len());
    for v in vectors {
        let (b, index, predicate) = v.as_load()?;
        if b != buffer {
            return None;
        }
        load_indices.push(index.clone());
        load_predicates.push(predicate.clone());
    }
    let lanes = indices.len() as u16;
    let index = s.mutate(&Expr::make_shuffle(load_indices, indices.to_vec()));
    index.as_ramp()?;
    let predicate = if load_predicates.iter().all(is_one) {
        const_true(lanes)
    } else {
        s.mutate(&Expr::make_shuffle(load_predicates, indices.to_vec()))
    };
    let ty = vectors[0].ty().with_lanes(lanes);
    Some(Expr::make_load(ty, buffer.clone(), index, predicate))
}

/// A shuffle of broadcasts of one value is a broadcast, whatever the indices.
fn collapse_broadcasts(s: &mut Simplifier, vectors: &[Expr], indices: &[i32]) -> Option<Expr> {
    let (value, _) = vectors[0].as_broadcast()?;
    for v in &vectors[1..] {
        let (other, _) = v.as_broadcast()?;
        if !is_zero(&s.mutate(&(value - other))) {
            return None;
        }
    }
    Some(if indices.len() == 1 {
        value.clone()
    } else {
        Expr::make_broadcast(value.clone(), indices.len() as u16)
    })
}

fn interleave_of_ramps(s: &mut Simplifier, vectors: &[Expr]) -> Option<Expr> {
    let (base, stride, lanes) = vectors[0].as_ramp()?;
    let terms = vectors.len();
    let terms_const = make_const(stride.ty(), terms as i64);
    for pair in vectors.windows(2) {
        // Adjacent terms must differ by the stride of the collapsed ramp.
        let diff = s.mutate(&(&pair[1] - &pair[0]));
        let (step, _) = diff.as_broadcast()?;
        if !is_zero(&s.mutate(&(step * &terms_const - stride))) {
            return None;
        }
    }
    let new_lanes = u16::try_from(usize::from(lanes) * terms).ok()?;
    let new_stride = s.mutate(&(stride / &terms_const));
    Some(Expr::make_ramp(base.clone(), new_stride, new_lanes))
}

/// Interleaving the strided slices of one vector reassembles it.
fn interleave_of_slices(vectors: &[Expr]) -> Option<Expr> {
    let (sources, _) = vectors[0].as_shuffle()?;
    let terms = i32::try_from(vectors.len()).ok()?;
    for (i, v) in vectors.iter().enumerate() {
        let (v_sources, v_indices) = v.as_shuffle()?;
        if !shuffle_is_slice(v_sources, v_indices)
            || shuffle_slice_begin(v_indices) != i as i32
            || shuffle_slice_stride(v_indices) != terms
            || v_sources != sources
        {
            return None;
        }
    }
    let total: usize = vectors.iter().map(|v| usize::from(v.ty().lanes())).sum();
    let source_lanes: usize = sources.iter().map(|v| usize::from(v.ty().lanes())).sum();
    (total == source_lanes).then(|| Expr::make_concat(sources.to_vec()))
}

fn concat_of_ramps(s: &mut Simplifier, vectors: &[Expr], indices: &[i32]) -> Option<Expr> {
    let (base, stride, _) = vectors[0].as_ramp()?;
    for pair in vectors.windows(2) {
        let lanes = pair[0].ty().lanes();
        if pair[1].ty().lanes() != lanes {
            return None;
        }
        let diff = s.mutate(&(&pair[1] - &pair[0]));
        let (step, _) = diff.as_broadcast()?;
        let expected = stride * make_const(stride.ty(), i64::from(lanes));
        if !is_zero(&s.mutate(&(step - expected))) {
            return None;
        }
    }
    Some(Expr::make_ramp(base.clone(), stride.clone(), indices.len() as u16))
}

fn concat_of_scalars(s: &mut Simplifier, vectors: &[Expr], indices: &[i32]) -> Option<Expr> {
    if vectors.len() < 2 || vectors.iter().any(|v| v.ty().is_vector()) {
        return None;
    }
    let stride = s.mutate(&(&vectors[1] - &vectors[0]));
    for pair in vectors.windows(2) {
        if !is_zero(&s.mutate(&(&pair[1] - &pair[0] - &stride))) {
            return None;
        }
    }
    Some(Expr::make_ramp(vectors[0].clone(), stride, indices.len() as u16))
}

/// `op(slice(a), slice(b))` with identical slicing becomes a slice of the
/// element-wise op, applied to the sliced vectors pairwise.
pub(crate) fn hoist_slice_vector(op: &Binary, make: fn(Expr, Expr) -> Expr) -> Expr {
    let unchanged = || op.rebuild(make);
    let (Some((slices_a, indices_a)), Some((slices_b, indices_b))) =
        (op.a.as_shuffle(), op.b.as_shuffle())
    else {
        return unchanged();
    };
    if indices_a != indices_b
        || slices_a.len() != slices_b.len()
        || slices_a.iter().zip(slices_b).any(|(a, b)| a.ty() != b.ty())
    {
        return unchanged();
    }
    let new_slices = slices_a
        .iter()
        .zip(slices_b)
        .map(|(a, b)| make(a.clone(), b.clone()))
        .collect();
    Expr::make_shuffle(new_slices, indices_a.to_vec())
}

#[cfg(test)]
mod tests {
    use super::super::simplify_expr;
    use ir_core::{ir_operator::*, Expr, Type, Var};

    fn int() -> Type {
        Type::int(32)
    }

    #[test]
    fn test_constant_casts() {
        let f = make_const_float(Type::float(32), 3.75);
        assert_eq!(simplify_expr(&Expr::make_cast(int(), f)), make_const(int(), 3));
        let i = make_const(int(), 300);
        assert_eq!(
            simplify_expr(&Expr::make_cast(Type::uint(8), i)),
            make_const_uint(Type::uint(8), 44)
        );
        let n = make_const(int(), -1);
        assert_eq!(
            simplify_expr(&Expr::make_cast(Type::float(64), n)),
            make_const_float(Type::float(64), -1.0)
        );
        let two = make_const(int(), 2);
        assert_eq!(simplify_expr(&Expr::make_cast(Type::boolean(), two)), const_true(1));
    }

    #[test]
    fn test_nested_casts() {
        let x = Expr::variable(Type::int(16), "x");
        // Narrowing through a wider integer keeps only the source bits.
        let e = Expr::make_cast(Type::int(8), Expr::make_cast(int(), x.clone()));
        assert_eq!(simplify_expr(&e), Expr::make_cast(Type::int(8), x.clone()));
        // A widening outer cast keeps the inner one.
        let e = Expr::make_cast(Type::int(64), Expr::make_cast(Type::int(8), x.clone()));
        assert_eq!(simplify_expr(&e), e);
        // Identity casts disappear.
        assert_eq!(simplify_expr(&Expr::make_cast(Type::int(16), x.clone())), x);
    }

    #[test]
    fn test_cast_moves_inside_vectors() {
        let x = Expr::variable(int(), "x");
        let i64x4 = Type::int(64).with_lanes(4);
        let e = Expr::make_cast(i64x4, broadcast(&x, 4));
        assert_eq!(
            simplify_expr(&e),
            broadcast(Expr::make_cast(Type::int(64), x.clone()), 4)
        );
        let e = Expr::make_cast(i64x4, ramp(&x, 2, 4));
        assert_eq!(
            simplify_expr(&e),
            Expr::make_ramp(
                Expr::make_cast(Type::int(64), x.clone()),
                make_const(Type::int(64), 2),
                4
            )
        );
        let e = Expr::make_cast(Type::int(64), &x + 3);
        assert_eq!(
            simplify_expr(&e),
            Expr::make_cast(Type::int(64), x) + make_const(Type::int(64), 3)
        );
    }

    #[test]
    fn test_loads() {
        let buf = Var::new("buf");
        let x = Expr::variable(int(), "x");
        let ty = Type::float(32).with_lanes(4);
        let e = Expr::make_load(ty, buf.clone(), broadcast(&x, 4), const_false(4));
        assert!(is_undef(&simplify_expr(&e)));
        let e = Expr::make_load(ty, buf.clone(), broadcast(&x + 0, 4), const_true(4));
        assert_eq!(
            simplify_expr(&e),
            broadcast(Expr::make_load(Type::float(32), buf, x, const_true(1)), 4)
        );
    }

    #[test]
    fn test_ramp_of_zero_stride() {
        let x = Expr::variable(int(), "x");
        let y = Expr::variable(int(), "y");
        assert_eq!(simplify_expr(&ramp(&x, &y - &y, 4)), broadcast(&x, 4));
        let e = ramp(&x, 1, 4);
        assert!(simplify_expr(&e).same_as(&e));
    }

    #[test]
    fn test_extract_lane_of_ramp_and_broadcast() {
        let x = Expr::variable(int(), "x");
        let e = Expr::make_extract_element(ramp(&x, 3, 4), 2);
        assert_eq!(simplify_expr(&e), &x + 6);
        let e = Expr::make_extract_element(broadcast(&x, 4), 3);
        assert_eq!(simplify_expr(&e), x);
    }

    #[test]
    fn test_shuffles_collapse_to_ramps() {
        let x = Expr::variable(int(), "x");
        // Interleaving the even and odd lanes of a ramp.
        let e = Expr::make_interleave(vec![ramp(&x, 2, 4), ramp(&x + 1, 2, 4)]);
        assert_eq!(simplify_expr(&e), ramp(&x, 1, 8));
        let e = Expr::make_concat(vec![ramp(&x, 1, 4), ramp(&x + 4, 1, 4)]);
        assert_eq!(simplify_expr(&e), ramp(&x, 1, 8));
        let e = Expr::make_concat(vec![x.clone(), &x + 2, &x + 4]);
        assert_eq!(simplify_expr(&e), ramp(&x, 2, 3));
        let e = Expr::make_concat(vec![broadcast(&x, 2), broadcast(&x, 2)]);
        assert_eq!(simplify_expr(&e), broadcast(&x, 4));
    }

    #[test]
    fn test_interleave_of_slices_reassembles_vector() {
        let v = Expr::variable(int().with_lanes(8), "v");
        let e = Expr::make_interleave(vec![
            Expr::make_slice(v.clone(), 0, 2, 4),
            Expr::make_slice(v.clone(), 1, 2, 4),
        ]);
        assert_eq!(simplify_expr(&e), v);
    }

    #[test]
    fn test_shuffle_of_loads_becomes_dense_load() {
        let buf = Var::new("buf");
        let x = Expr::variable(int(), "x");
        let ty = Type::float(32).with_lanes(4);
        let even = Expr::make_load(ty, buf.clone(), ramp(&x, 2, 4), const_true(4));
        let odd = Expr::make_load(ty, buf.clone(), ramp(&x + 1, 2, 4), const_true(4));
        let e = Expr::make_interleave(vec![even, odd]);
        assert_eq!(
            simplify_expr(&e),
            Expr::make_load(Type::float(32).with_lanes(8), buf, ramp(&x, 1, 8), const_true(8))
        );
    }

    #[test]
    fn test_slices_hoist_out_of_arithmetic() {
        let a = Expr::variable(int().with_lanes(8), "a");
        let b = Expr::variable(int().with_lanes(8), "b");
        let e = Expr::make_slice(a.clone(), 0, 2, 4) + Expr::make_slice(b.clone(), 0, 2, 4);
        assert_eq!(simplify_expr(&e), Expr::make_slice(&a + &b, 0, 2, 4));
    }
}
