//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Clamp a value into the inclusive range `(min, max)`.
///
/// Unlike `f64::clamp` this never panics on an inverted range, the lower bound simply wins. `NAN`
/// values are mapped onto the lower bound.
pub fn clamp<T>(value: T, range: (T, T)) -> T
where
    T: Float,
{
    let mut ret = value;

    if ret > range.1 {
        ret = range.1
    }
    if !(ret >= range.0) {
        ret = range.0
    }

    ret
}

/// Wrap an angle into the range `(-pi, pi]`.
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float,
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap_or_else(T::zero);
    let tau_t: T = pi_t + pi_t;

    let mut a = rem_euclid(angle + pi_t, tau_t) - pi_t;
    if a <= -pi_t {
        a = a + tau_t;
    }
    a
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}
