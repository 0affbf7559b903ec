//! Parser for the linNet netlist format.
//!
//! The netlist names the nodes and devices of an ideal linear circuit,
//! optional user-defined voltages, and the result requests driving the
//! analysis. This crate owns tokenization, parsing and the semantic name
//! checks; everything downstream consumes the immutable [ast::Circuit].

pub mod ast;
pub mod lexer;
mod parser;
mod sema;

pub use self::parser::{parse, parse_file, ParseError};
pub use self::sema::SemanticAnalysisError;
