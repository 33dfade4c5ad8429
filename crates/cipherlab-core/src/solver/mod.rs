//! Root finder: polynomial parser plus the chord (false position) method.

pub mod chord;
pub mod parser;

pub use chord::{solve, solve_equation, ChordFailure, ChordSolution};
pub use parser::{parse_equation, Polynomial};

use thiserror::Error;

/// Errors from parsing or solving an equation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SolverError {
    #[error("could not recognize the equation, supported forms are a*x^2 + b*x + c and a*x + b")]
    UnsupportedForm,

    #[error("could not parse coefficient {name}: {value}")]
    InvalidCoefficient { name: char, value: String },

    #[error("the function must have opposite signs at interval ends")]
    OppositeSigns,

    #[error("division by zero in the chord method")]
    DivisionByZero,

    #[error("max iterations exceeded")]
    MaxIterationsExceeded,
}
