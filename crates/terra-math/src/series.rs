//! Elementwise helpers over flat series of per-entity values.
//!
//! These cover the handful of array operations the mesh code needs (gather by id,
//! group-by accumulation, means) without an operator overload for every numeric type.

/// Apply `f` to every element.
pub fn map<T, U>(a: &[T], f: impl FnMut(&T) -> U) -> Vec<U> {
    a.iter().map(f).collect()
}

/// Apply `f` to matching pairs of elements. Zips to the shorter series.
pub fn zip_map<A, B, U>(a: &[A], b: &[B], mut f: impl FnMut(&A, &B) -> U) -> Vec<U> {
    a.iter().zip(b).map(|(x, y)| f(x, y)).collect()
}

/// Arithmetic mean, or `0.0` for an empty series.
#[must_use]
pub fn mean(a: &[f32]) -> f32 {
    if a.is_empty() {
        return 0.0;
    }
    a.iter().sum::<f32>() / a.len() as f32
}

/// Smallest element, ignoring NaN. `None` for an empty series.
#[must_use]
pub fn min(a: &[f32]) -> Option<f32> {
    a.iter().copied().filter(|x| !x.is_nan()).reduce(f32::min)
}

/// Look up `values[id]` for every id.
///
/// # Panics
///
/// Panics if any id is out of range for `values`.
pub fn gather<T: Copy>(values: &[T], ids: &[u32]) -> Vec<T> {
    ids.iter().map(|&id| values[id as usize]).collect()
}

/// Group-by accumulation: `out[ids[i]] = f(out[ids[i]], values[i])`.
///
/// # Panics
///
/// Panics if any id is out of range for `out`.
pub fn aggregate_into<T: Copy, U: Copy>(
    values: &[T],
    ids: &[u32],
    out: &mut [U],
    mut f: impl FnMut(U, T) -> U,
) {
    for (&value, &id) in values.iter().zip(ids) {
        let slot = &mut out[id as usize];
        *slot = f(*slot, value);
    }
}
