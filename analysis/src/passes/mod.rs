use std::sync::Arc;

use linnet_netlist::ast::Circuit;
use linnet_pass::Pass;
use miden_diagnostics::DiagnosticsHandler;

use crate::network::{Analysis, AnalysisConfig, AnalysisError, NetworkAnalyzer};

/// This pass runs network analysis over a parsed [Circuit], producing the
/// sub-network structure and the populated variable table.
pub struct AnalyzeNetwork<'a> {
    diagnostics: &'a DiagnosticsHandler,
    config: AnalysisConfig,
}
impl<'a> AnalyzeNetwork<'a> {
    /// Create a new instance of this pass
    #[inline]
    pub fn new(diagnostics: &'a DiagnosticsHandler) -> Self {
        Self { diagnostics, config: AnalysisConfig::default() }
    }

    pub fn with_config(diagnostics: &'a DiagnosticsHandler, config: AnalysisConfig) -> Self {
        Self { diagnostics, config }
    }
}
impl Pass for AnalyzeNetwork<'_> {
    type Input<'a> = Circuit;
    type Output<'a> = Analysis;
    type Error = AnalysisError;

    fn run<'a>(&mut self, circuit: Self::Input<'a>) -> Result<Self::Output<'a>, Self::Error> {
        NetworkAnalyzer::new(self.diagnostics, self.config).analyze(Arc::new(circuit))
    }
}
