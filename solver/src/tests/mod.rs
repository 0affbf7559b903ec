use std::sync::Arc;

use miden_diagnostics::term::termcolor::ColorChoice;
use miden_diagnostics::{CodeMap, DefaultEmitter, DiagnosticsHandler};

use linnet_analysis::{AnalysisConfig, NetworkAnalyzer};

use crate::coeff::{Coefficient, ProductMask};
use crate::{solve, CompileError, Solution};

mod scenarios;
mod transfer;

/// Parses, analyzes and solves a netlist.
fn compile(source: &str) -> Result<Solution, CompileError> {
    let codemap = Arc::new(CodeMap::new());
    let emitter = Arc::new(DefaultEmitter::new(ColorChoice::Auto));
    let diagnostics = DiagnosticsHandler::new(Default::default(), codemap.clone(), emitter);
    let circuit = linnet_netlist::parse(&diagnostics, codemap, source)?;
    let analysis = NetworkAnalyzer::new(&diagnostics, AnalysisConfig::default())
        .analyze(Arc::new(circuit))?;
    solve(analysis, &diagnostics)
}

fn compile_ok(source: &str) -> Solution {
    compile(source).expect("expected the circuit to solve")
}

/// Builds a coefficient from `(factor, constant bits)` pairs.
fn coeff(addends: &[(i64, &[u8])]) -> Coefficient {
    let mut c = Coefficient::zero();
    for (factor, bits) in addends {
        let mask = bits
            .iter()
            .fold(ProductMask::EMPTY, |m, &b| m | ProductMask::bit(b));
        c.add_addend(*factor, mask);
    }
    c
}

/// Evaluates a coefficient numerically under an assignment of constant
/// values by bit position.
fn eval(c: &Coefficient, values: &[f64]) -> f64 {
    c.addends()
        .iter()
        .map(|a| {
            a.factor as f64
                * a.product
                    .bits()
                    .map(|b| values[b as usize])
                    .product::<f64>()
        })
        .sum()
}

/// The numeric value of the transfer function `dep / indep` under the given
/// constant assignment.
fn eval_transfer(solution: &Solution, dep: usize, indep: usize, values: &[f64]) -> f64 {
    eval(solution.numerator(dep, indep), values) / eval(solution.determinant(), values)
}

/// Dependent index of the unknown with the given name.
fn unknown_index(solution: &Solution, name: &str) -> usize {
    solution
        .find_name(name)
        .idx_unknown
        .unwrap_or_else(|| panic!("no unknown named '{name}'"))
}
