//! Equation solving.

use crate::session::protocol::Response;
use crate::solver::solve_equation;
use serde_json::Map;

/// Solver failures still report how far the iteration got.
pub(super) fn solve(
    equation: &str,
    a: f64,
    b: f64,
    epsilon: f64,
    max_iterations: u32,
) -> Response {
    match solve_equation(equation, a, b, epsilon, max_iterations) {
        Ok(solution) => Response::success(Map::new())
            .with_data("root", solution.root)
            .with_data("iterations", solution.iterations)
            .with_data("precision", solution.precision),
        Err(failure) => Response::error(failure.error.to_string())
            .with_data("iterations", failure.iterations)
            .with_data("precision", failure.precision),
    }
}
