//! linNet: symbolic analysis of ideal linear electrical circuits.
//!
//! The pipeline parses a netlist, analyzes the network topology, solves the
//! Modified Nodal Analysis equation system fully symbolically, and renders
//! the requested transfer functions to a GNU Octave script. This crate ties
//! the stages together; the binary adds file handling and logging on top.

use std::sync::Arc;

use linnet_analysis::passes::AnalyzeNetwork;
use linnet_codegen_octave::{CodeGenerator, OctaveCodeGenerator};
use linnet_pass::Pass;
use linnet_solver::passes::Solve;
use miden_diagnostics::{CodeMap, DiagnosticsHandler};

pub use linnet_analysis::AnalysisConfig;
pub use linnet_solver::CompileError;

/// Runs the whole pipeline over one netlist source, producing the Octave
/// script.
///
/// Every input gets its own codemap and diagnostics handler; no state
/// survives from one compilation to the next.
pub fn compile(
    diagnostics: &DiagnosticsHandler,
    codemap: Arc<CodeMap>,
    source: &str,
    config: AnalysisConfig,
) -> anyhow::Result<String> {
    let circuit =
        linnet_netlist::parse(diagnostics, codemap, source).map_err(CompileError::Parse)?;

    let mut pipeline =
        AnalyzeNetwork::with_config(diagnostics, config).chain(Solve::new(diagnostics));
    let solution = pipeline.run(circuit)?;

    OctaveCodeGenerator::new().generate(&solution)
}
