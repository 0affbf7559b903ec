use linnet_analysis::Analysis;
use linnet_pass::Pass;
use miden_diagnostics::DiagnosticsHandler;

use crate::{solve, CompileError, Solution};

/// This pass solves an analyzed circuit for every demanded unknown,
/// producing the [Solution] consumed by renderers.
pub struct Solve<'a> {
    diagnostics: &'a DiagnosticsHandler,
}
impl<'a> Solve<'a> {
    /// Create a new instance of this pass
    #[inline]
    pub fn new(diagnostics: &'a DiagnosticsHandler) -> Self {
        Self { diagnostics }
    }
}
impl Pass for Solve<'_> {
    type Input<'a> = Analysis;
    type Output<'a> = Solution;
    type Error = CompileError;

    fn run<'a>(&mut self, analysis: Self::Input<'a>) -> Result<Self::Output<'a>, Self::Error> {
        solve(analysis, self.diagnostics)
    }
}
