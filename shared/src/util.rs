/**
 * file: util.rs
 * desc: Misc. numeric utility functions.
 */
use num_traits::Float;

/**
 * Arithmetic mean of the given values. An empty slice has a mean of zero.
 */
pub fn mean<T>(vs: &[T]) -> T
where
    T: Float,
{
    if vs.is_empty() {
        return T::zero();
    }

    let n = T::from(vs.len()).unwrap_or_else(T::nan);

    vs.iter().fold(T::zero(), |ac: T, v| ac + *v) / n
}

/**
 * Scale the given weights so they sum to one.
 *
 * args
 *  weights: non-negative weights
 *
 * returns
 *  the normalized weights, or None if the weights don't have a positive, finite sum
 */
pub fn normalize<T>(weights: &[T]) -> Option<Vec<T>>
where
    T: Float,
{
    let total = weights.iter().fold(T::zero(), |ac: T, w| ac + *w);

    if !(total > T::zero()) || !total.is_finite() {
        return None;
    }

    Some(weights.iter().map(|w| *w / total).collect())
}

/**
 * True if a and b are equal within the given relative tolerance. Values close to zero are
 * compared using the tolerance as an absolute bound.
 */
pub fn approx_eq<T>(a: T, b: T, tolerance: T) -> bool
where
    T: Float,
{
    let scale = a.abs().max(b.abs()).max(T::one());

    (a - b).abs() <= tolerance * scale
}
