//! The symbolic equation builder and solver of linNet.
//!
//! Starting from an analyzed circuit, this crate fills the Modified Nodal
//! Analysis coefficient matrix (one stamping rule per device class), runs a
//! fraction-free Gauss elimination over the exact coefficient algebra, and
//! produces a [Solution]: one determinant plus a numerator per requested
//! (dependent, independent) pair, all of them sums of signed products of
//! the circuit's symbolic device constants.

pub mod coeff;
mod eliminate;
mod matrix;
pub mod passes;
mod solution;
mod solve;

#[cfg(test)]
mod tests;

use miden_diagnostics::{Diagnostic, ToDiagnostic};

pub use self::eliminate::{eliminate, SolverError};
pub use self::matrix::{MnaMatrix, StampBuilder};
pub use self::solution::{NameLookup, Solution};
pub use self::solve::solve;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] linnet_netlist::ParseError),
    #[error(transparent)]
    Analysis(#[from] linnet_analysis::AnalysisError),
    #[error(transparent)]
    Solver(#[from] SolverError),
}

impl ToDiagnostic for CompileError {
    fn to_diagnostic(self) -> Diagnostic {
        match self {
            Self::Parse(err) => err.to_diagnostic(),
            Self::Analysis(err) => err.to_diagnostic(),
            Self::Solver(err) => Diagnostic::error().with_message(err.to_string()),
        }
    }
}
