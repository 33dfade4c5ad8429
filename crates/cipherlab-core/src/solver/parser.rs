//! Parser for single-variable linear and quadratic polynomials.
//!
//! Accepted shapes, after all whitespace is removed:
//!
//! ```text
//! [a][*]x^2 [(+|-)[b][*]x] [(+|-)c] [=0]
//! [a][*]x   [(+|-)b]                [=0]
//! ```
//!
//! An empty leading coefficient is 1, a lone sign is +1 or -1, and a missing
//! term is 0. The quadratic shape is tried first.

use super::SolverError;
use regex::Regex;
use std::sync::LazyLock;

static QUADRATIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?\d*\.?\d*)\*?x\^2(?:([+-]\d*\.?\d*)\*?x)?([+-]\d*\.?\d*)?(?:=0)?$").unwrap()
});

static LINEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]?\d*\.?\d*)\*?x([+-]\d*\.?\d*)?(?:=0)?$").unwrap());

/// A parsed polynomial, evaluated with [`Polynomial::eval`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Polynomial {
    Linear { a: f64, b: f64 },
    Quadratic { a: f64, b: f64, c: f64 },
}

impl Polynomial {
    pub fn eval(&self, x: f64) -> f64 {
        match *self {
            Polynomial::Linear { a, b } => a * x + b,
            Polynomial::Quadratic { a, b, c } => a * x * x + b * x + c,
        }
    }
}

impl std::fmt::Display for Polynomial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polynomial::Linear { a, b } => write!(f, "{}*x + {}", a, b),
            Polynomial::Quadratic { a, b, c } => write!(f, "{}*x^2 + {}*x + {}", a, b, c),
        }
    }
}

/// Parse a coefficient capture. `None` means the term is absent.
fn coefficient(
    name: char,
    capture: Option<&str>,
    absent: f64,
) -> Result<f64, SolverError> {
    match capture {
        None => Ok(absent),
        Some("") | Some("+") => Ok(1.0),
        Some("-") => Ok(-1.0),
        Some(text) => text.parse::<f64>().map_err(|_| SolverError::InvalidCoefficient {
            name,
            value: text.to_string(),
        }),
    }
}

/// Parse an equation string into a [`Polynomial`].
pub fn parse_equation(equation: &str) -> Result<Polynomial, SolverError> {
    let normalized: String = equation.chars().filter(|c| !c.is_whitespace()).collect();

    if let Some(caps) = QUADRATIC.captures(&normalized) {
        let a = coefficient('a', caps.get(1).map(|m| m.as_str()), 1.0)?;
        let b = coefficient('b', caps.get(2).map(|m| m.as_str()), 0.0)?;
        let c = coefficient('c', caps.get(3).map(|m| m.as_str()), 0.0)?;
        return Ok(Polynomial::Quadratic { a, b, c });
    }

    if let Some(caps) = LINEAR.captures(&normalized) {
        let a = coefficient('a', caps.get(1).map(|m| m.as_str()), 1.0)?;
        let b = coefficient('b', caps.get(2).map(|m| m.as_str()), 0.0)?;
        return Ok(Polynomial::Linear { a, b });
    }

    Err(SolverError::UnsupportedForm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_quadratic() {
        assert_eq!(
            parse_equation("1*x^2-5*x+6").unwrap(),
            Polynomial::Quadratic { a: 1.0, b: -5.0, c: 6.0 }
        );
    }

    #[test]
    fn test_whitespace_and_implicit_coefficients() {
        assert_eq!(
            parse_equation(" x^2 - x - 2.5 ").unwrap(),
            Polynomial::Quadratic { a: 1.0, b: -1.0, c: -2.5 }
        );
        assert_eq!(
            parse_equation("-x^2+4").unwrap(),
            Polynomial::Quadratic { a: -1.0, b: 0.0, c: 4.0 }
        );
    }

    #[test]
    fn test_quadratic_with_trailing_equals_zero() {
        assert_eq!(
            parse_equation("2x^2+3x-1 = 0").unwrap(),
            Polynomial::Quadratic { a: 2.0, b: 3.0, c: -1.0 }
        );
    }

    #[test]
    fn test_linear_forms() {
        assert_eq!(
            parse_equation("3*x-6").unwrap(),
            Polynomial::Linear { a: 3.0, b: -6.0 }
        );
        assert_eq!(
            parse_equation("-x").unwrap(),
            Polynomial::Linear { a: -1.0, b: 0.0 }
        );
        assert_eq!(
            parse_equation("0.5x+.25").unwrap(),
            Polynomial::Linear { a: 0.5, b: 0.25 }
        );
    }

    #[test]
    fn test_bad_coefficient_is_named() {
        assert_eq!(
            parse_equation(".x+1"),
            Err(SolverError::InvalidCoefficient {
                name: 'a',
                value: ".".to_string()
            })
        );
    }

    #[test]
    fn test_unsupported_forms() {
        for equation in ["", "x^3+1", "sin(x)", "y+1", "2*x^2-3*x+1=5"] {
            assert_eq!(
                parse_equation(equation),
                Err(SolverError::UnsupportedForm),
                "{equation}"
            );
        }
    }

    #[test]
    fn test_eval() {
        let p = Polynomial::Quadratic { a: 1.0, b: -5.0, c: 6.0 };
        assert_eq!(p.eval(2.0), 0.0);
        assert_eq!(p.eval(0.0), 6.0);
        assert_eq!(Polynomial::Linear { a: 2.0, b: 1.0 }.eval(3.0), 7.0);
    }
}
