//! Shared floating-point tolerance for conditions comparing sensor values.

/// Tolerance used when a condition does not configure its own.
pub const DEFAULT_EPS: f64 = 5e-3;

/// True if `x` and `y` are strictly closer than `eps`.
///
/// `eps` is not validated: zero never matches and a negative value never
/// matches either. NaN on either side yields false.
pub fn close_to(x: f64, y: f64, eps: f64) -> bool {
    (x - y).abs() < eps
}

/// [`close_to`] with [`DEFAULT_EPS`].
pub fn close_to_default(x: f64, y: f64) -> bool {
    close_to(x, y, DEFAULT_EPS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_is_close_to_itself_for_positive_eps() {
        for x in [0.0, -3.25, 1e9, f64::MIN_POSITIVE] {
            assert!(close_to(x, x, 1e-12));
            assert!(close_to_default(x, x));
        }
    }

    #[test]
    fn gap_of_exactly_eps_is_not_close() {
        assert!(!close_to(0.0, 0.5, 0.5));
        assert!(!close_to(0.5, 0.0, 0.5));
        assert!(close_to(0.0, 0.25, 0.5));
    }

    #[test]
    fn default_eps_boundary() {
        assert!(close_to_default(1.0, 1.0049));
        assert!(!close_to_default(1.0, 1.006));
    }

    #[test]
    fn non_positive_eps_never_matches() {
        assert!(!close_to(1.0, 1.0, 0.0));
        assert!(!close_to(1.0, 1.0, -1.0));
    }

    #[test]
    fn nan_is_never_close() {
        assert!(!close_to(f64::NAN, 1.0, 1.0));
        assert!(!close_to(f64::NAN, f64::NAN, 1.0));
    }
}
