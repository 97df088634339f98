//! Shared test utilities for the firesmoke workspace.
//!
//! This crate provides common testing infrastructure including:
//! - KML documents and feed payloads used across crates
//! - Generators that populate a temporary data root
//! - Approximate float and ring assertions
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, write_snapshot};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use generators::*;
pub use paths::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of two rings (`[x, y]` position lists).
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_ring_approx_eq;
///
/// assert_ring_approx_eq!(vec![[1.0001, 2.0]], vec![[1.0, 2.0]], 0.001);
/// ```
#[macro_export]
macro_rules! assert_ring_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: Vec<[f64; 2]> = $left.into_iter().collect();
        let right: Vec<[f64; 2]> = $right.into_iter().collect();
        assert_eq!(
            left.len(),
            right.len(),
            "ring lengths differ: {:?} vs {:?}",
            left,
            right
        );
        for (a, b) in left.iter().zip(right.iter()) {
            $crate::assert_approx_eq!(a[0], b[0], $epsilon);
            $crate::assert_approx_eq!(a[1], b[1], $epsilon);
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-97.73, -97.730001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    fn test_assert_ring_approx_eq_passes() {
        assert_ring_approx_eq!(vec![[1.0001, 2.0001], [0.0, 0.0]], vec![[1.0, 2.0], [0.0, 0.0]], 0.001);
    }

    #[test]
    #[should_panic(expected = "ring lengths differ")]
    fn test_assert_ring_approx_eq_length_mismatch() {
        assert_ring_approx_eq!(vec![[1.0, 2.0]], Vec::<[f64; 2]>::new(), 0.001);
    }
}
