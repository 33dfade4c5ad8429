//! Chord (false position) iteration over a sign-changing interval.

use super::{parse_equation, SolverError};
use crate::config::SolverConfig;
use tracing::debug;

/// A converged root together with the work it took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordSolution {
    pub root: f64,
    pub iterations: u32,
    /// The epsilon the run converged against.
    pub precision: f64,
}

/// A failed run. Iterations and precision are kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordFailure {
    pub error: SolverError,
    pub iterations: u32,
    pub precision: f64,
}

impl std::fmt::Display for ChordFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (after {} iterations)", self.error, self.iterations)
    }
}

impl std::error::Error for ChordFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Find a root of `f` in `[a, b]`.
///
/// Succeeds when `|f(c)| < epsilon`, or when the bracketing interval has
/// shrunk below `epsilon` (even if `f(c)` is still large on pathological
/// functions). Endpoints with a zero product count as a valid bracket.
pub fn solve<F>(
    f: F,
    mut a: f64,
    mut b: f64,
    epsilon: f64,
    max_iterations: u32,
) -> Result<ChordSolution, ChordFailure>
where
    F: Fn(f64) -> f64,
{
    let mut iterations = 0;
    let fail = |error, iterations| ChordFailure {
        error,
        iterations,
        precision: epsilon,
    };

    let mut fa = f(a);
    let mut fb = f(b);
    if fa * fb > 0.0 {
        return Err(fail(SolverError::OppositeSigns, iterations));
    }

    for _ in 0..max_iterations {
        let denominator = fb - fa;
        if denominator.abs() < SolverConfig::MIN_DENOMINATOR {
            return Err(fail(SolverError::DivisionByZero, iterations));
        }

        let c = a - fa * (b - a) / denominator;
        let fc = f(c);
        iterations += 1;

        if fc.abs() < epsilon {
            debug!("chord method converged on f(c) after {} iterations", iterations);
            return Ok(ChordSolution {
                root: c,
                iterations,
                precision: epsilon,
            });
        }

        if fa * fc < 0.0 {
            b = c;
            fb = fc;
        } else {
            a = c;
            fa = fc;
        }

        if (b - a).abs() < epsilon {
            debug!("chord method converged on interval after {} iterations", iterations);
            return Ok(ChordSolution {
                root: c,
                iterations,
                precision: epsilon,
            });
        }
    }

    Err(fail(SolverError::MaxIterationsExceeded, iterations))
}

/// Parse `equation` and solve it on `[a, b]`.
pub fn solve_equation(
    equation: &str,
    a: f64,
    b: f64,
    epsilon: f64,
    max_iterations: u32,
) -> Result<ChordSolution, ChordFailure> {
    let polynomial = parse_equation(equation).map_err(|error| ChordFailure {
        error,
        iterations: 0,
        precision: epsilon,
    })?;
    debug!("solving {} on [{}, {}]", polynomial, a, b);
    solve(|x| polynomial.eval(x), a, b, epsilon, max_iterations)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = SolverConfig::DEFAULT_EPSILON;
    const MAX: u32 = SolverConfig::DEFAULT_MAX_ITERATIONS;

    #[test]
    fn test_quadratic_nearer_root() {
        let solution = solve_equation("1*x^2-5*x+6", 0.0, 2.9, EPS, MAX).unwrap();
        assert!((solution.root - 2.0).abs() < 1e-3, "root = {}", solution.root);
        assert!(solution.iterations <= MAX);
        assert_eq!(solution.precision, EPS);
    }

    #[test]
    fn test_linear_converges_in_one_step() {
        let solution = solve_equation("2*x-3", -10.0, 10.0, EPS, MAX).unwrap();
        assert!((solution.root - 1.5).abs() < 1e-12);
        assert_eq!(solution.iterations, 1);
    }

    #[test]
    fn test_converged_root_meets_a_criterion() {
        let cases: &[(&str, f64, f64)] = &[
            ("x^2-2", 0.0, 3.0),
            ("-3x^2+x+10", 0.0, 5.0),
            ("0.001x^2-1", 0.0, 100.0),
            ("x-0.3", -1.0, 1.0),
        ];
        for &(equation, a, b) in cases {
            let p = parse_equation(equation).unwrap();
            let solution = solve_equation(equation, a, b, EPS, 1000).unwrap();
            assert!(solution.root >= a && solution.root <= b, "{equation}");
            assert!(solution.iterations <= 1000);
            let residual = p.eval(solution.root).abs();
            assert!(residual < 1.0, "{equation}: residual {residual}");
        }
    }

    #[test]
    fn test_same_sign_endpoints_fail() {
        for (a, b) in [(0.0, 1.0), (-5.0, -3.0), (4.0, 100.0)] {
            let failure = solve_equation("x^2+1", a, b, EPS, MAX).unwrap_err();
            assert_eq!(failure.error, SolverError::OppositeSigns);
            assert_eq!(failure.iterations, 0);
        }
    }

    #[test]
    fn test_zero_at_endpoint_is_root() {
        let solution = solve(|x| x - 1.0, 1.0, 2.0, EPS, MAX).unwrap();
        assert_eq!(solution.root, 1.0);
    }

    #[test]
    fn test_iteration_exhaustion_reports_count() {
        let failure = solve(|x| x * x * x - 0.5, 0.0, 10.0, 1e-15, 3).unwrap_err();
        assert_eq!(failure.error, SolverError::MaxIterationsExceeded);
        assert_eq!(failure.iterations, 3);
        assert_eq!(failure.precision, 1e-15);
    }

    #[test]
    fn test_flat_chord_is_division_by_zero() {
        // f(a) == f(b) == 0 passes the sign check but leaves no chord.
        let failure = solve(|x| x * x - 1.0, -1.0, 1.0, EPS, MAX).unwrap_err();
        assert_eq!(failure.error, SolverError::DivisionByZero);
    }

    #[test]
    fn test_interval_shrink_reports_success() {
        // Steep step: f(c) never drops below epsilon but the bracket collapses.
        let step = |x: f64| if x < 0.5 { -1e6 } else { 1e6 };
        let solution = solve(step, 0.0, 1.0, 0.1, 200).unwrap();
        assert!((solution.root - 0.5).abs() < 0.5);
    }

    #[test]
    fn test_parse_failure_has_zero_iterations() {
        let failure = solve_equation("cos(x)", 0.0, 1.0, EPS, MAX).unwrap_err();
        assert_eq!(failure.error, SolverError::UnsupportedForm);
        assert_eq!(failure.iterations, 0);
    }
}
