use std::sync::Arc;

use miden_diagnostics::term::termcolor::ColorChoice;
use miden_diagnostics::{CodeMap, DefaultEmitter, DiagnosticsHandler};

use crate::{Analysis, AnalysisConfig, AnalysisError, NetworkAnalyzer};

mod grounds;

/// Parses and analyzes a netlist with default capacities.
fn analyze(source: &str) -> Result<Analysis, AnalysisError> {
    analyze_with_config(source, AnalysisConfig::default())
}

fn analyze_with_config(
    source: &str,
    config: AnalysisConfig,
) -> Result<Analysis, AnalysisError> {
    let codemap = Arc::new(CodeMap::new());
    let emitter = Arc::new(DefaultEmitter::new(ColorChoice::Auto));
    let diagnostics = DiagnosticsHandler::new(Default::default(), codemap.clone(), emitter);
    let circuit = linnet_netlist::parse(&diagnostics, codemap, source)
        .expect("netlist failed to parse");
    NetworkAnalyzer::new(&diagnostics, config).analyze(Arc::new(circuit))
}

/// Analyzes a netlist expected to be structurally valid.
fn analyze_ok(source: &str) -> Analysis {
    analyze(source).expect("expected analysis to succeed")
}
