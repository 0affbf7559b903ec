//! The whole-solution driver: works out which unknowns the result requests
//! demand, then runs one elimination per demanded unknown, collecting the
//! shared determinant and the per-source numerators.

use either::Either;
use log::debug;
use miden_diagnostics::{DiagnosticsHandler, Severity};

use linnet_analysis::{Analysis, VariableTable};
use linnet_netlist::ast::ResultRequest;

use crate::coeff::Coefficient;
use crate::eliminate::eliminate;
use crate::matrix::StampBuilder;
use crate::solution::Solution;
use crate::CompileError;

/// A result-request name resolved against the variable table.
enum DependentRef {
    Unknown(usize),
    Voltage(usize),
}

fn resolve_name(table: &VariableTable, name: &str) -> Option<Either<usize, DependentRef>> {
    if let Some(idx) = table.knowns().iter().position(|k| k.name == *name) {
        return Some(Either::Left(idx));
    }
    if let Some(idx) = table.unknowns().iter().position(|u| u.name == *name) {
        return Some(Either::Right(DependentRef::Unknown(idx)));
    }
    if let Some(idx) = table
        .circuit()
        .voltages
        .iter()
        .position(|v| v.name == *name)
    {
        return Some(Either::Right(DependentRef::Voltage(idx)));
    }
    None
}

/// Marks every unknown a result request depends on. A user-defined voltage
/// marks both of its defining node-voltage unknowns. Names that match
/// nothing get a warning; the corresponding output is reported as not
/// available downstream.
fn required_unknowns(analysis: &Analysis, diagnostics: &DiagnosticsHandler) -> Vec<bool> {
    let table = &analysis.table;
    let mut required = vec![false; table.num_unknowns()];
    let mark = |required: &mut Vec<bool>, name: &linnet_netlist::ast::Ident| {
        match resolve_name(table, name.as_str()) {
            Some(Either::Left(_)) => {
                // An independent source: nothing to solve for.
            }
            Some(Either::Right(DependentRef::Unknown(idx))) => required[idx] = true,
            Some(Either::Right(DependentRef::Voltage(idx))) => {
                let voltage = &table.circuit().voltages[idx];
                for node in [voltage.plus, voltage.minus] {
                    if let Some(unknown) = table.unknown_by_node(node) {
                        required[unknown.row] = true;
                    }
                }
            }
            None => {
                diagnostics
                    .diagnostic(Severity::Warning)
                    .with_message(format!(
                        "result references '{name}', which names no quantity in this circuit"
                    ))
                    .with_primary_label(name.span, "this output will not be available")
                    .emit();
            }
        }
    };

    for result in &table.circuit().results {
        for dependent in result.dependents() {
            mark(&mut required, dependent);
        }
        if let ResultRequest::Bode(bode) = result {
            let is_known = matches!(
                resolve_name(table, bode.independent.as_str()),
                Some(Either::Left(_))
            );
            if !is_known {
                diagnostics
                    .diagnostic(Severity::Warning)
                    .with_message(format!(
                        "'{}' is not an independent source",
                        bode.independent
                    ))
                    .with_primary_label(
                        bode.independent.span,
                        "a Bode result needs an independent source here",
                    )
                    .emit();
            }
        }
    }
    required
}

/// Solves the circuit for every demanded unknown and assembles the
/// [Solution].
///
/// One elimination runs per demanded unknown: the variable table rotates the
/// target's column to the last position, the matrix is refilled, and the
/// triangularized last row yields the determinant and the numerators. The
/// determinant moves out of the matrix on the first success; its sign is
/// re-oriented to the natural column order via the rotation parity, and
/// every later solve's determinant must agree (debug-checked). Once all
/// unknowns are in, the determinant's leading factor is normalised positive,
/// flipping every numerator with it.
pub fn solve(
    mut analysis: Analysis,
    diagnostics: &DiagnosticsHandler,
) -> Result<Solution, CompileError> {
    let snapshot = analysis.table.snapshot();
    let m = snapshot.num_unknowns();
    let k = snapshot.num_knowns();
    let num_voltages = snapshot.circuit().voltages.len();

    let required = required_unknowns(&analysis, diagnostics);
    let mut computed = vec![false; m + num_voltages];
    let mut numerators = vec![vec![Coefficient::zero(); k]; m + num_voltages];
    let mut determinant = Coefficient::zero();
    let mut have_determinant = false;

    let mut matrix = StampBuilder::new(&analysis.table).build_matrix();
    for target in 0..m {
        if !required[target] {
            continue;
        }
        debug!(
            "solving for '{}' ({} of {} unknowns)",
            snapshot.unknowns()[target].name,
            target + 1,
            m
        );
        analysis.table.set_target_by_index(target);
        let parity = analysis.table.swap_parity();
        StampBuilder::new(&analysis.table).rebuild(&mut matrix);
        eliminate(&mut matrix)?;

        let mut det = matrix.take(m - 1, m - 1);
        if parity {
            det.negate();
        }
        if have_determinant {
            // Invariant: one determinant, shared by every solve.
            debug_assert!(
                determinant.sub(&det).is_zero(),
                "determinant mismatch between solves"
            );
        } else {
            determinant = det;
            have_determinant = true;
        }
        for j in 0..k {
            let mut num = matrix.take(m - 1, m + j);
            // The last row reads det*x + num_raw*known = 0, so the transfer
            // function carries a minus sign; folding it into the stored
            // numerator together with the parity correction makes every
            // transfer function literally numerator/determinant.
            if !parity {
                num.negate();
            }
            numerators[target][j] = num;
        }
        computed[target] = true;
    }

    // User-defined voltages are +/-1 combinations of node-voltage solutions;
    // a ground-side node contributes zero.
    for (v, voltage) in snapshot.circuit().voltages.iter().enumerate() {
        let plus = snapshot.unknown_by_node(voltage.plus).map(|u| u.row);
        let minus = snapshot.unknown_by_node(voltage.minus).map(|u| u.row);
        let available = plus.is_none_or(|u| computed[u]) && minus.is_none_or(|u| computed[u]);
        if !available {
            continue;
        }
        for j in 0..k {
            let plus_num = plus.map_or_else(Coefficient::zero, |u| numerators[u][j].clone());
            let num = match minus {
                Some(u) => plus_num.sub(&numerators[u][j]),
                None => plus_num,
            };
            numerators[m + v][j] = num;
        }
        computed[m + v] = true;
    }

    // The determinant is defined up to a unit; fix its leading sign so the
    // rendered expressions do not carry a gratuitous global minus.
    if determinant.leading().is_some_and(|lead| lead.factor < 0) {
        determinant.negate();
        for row in numerators.iter_mut() {
            for num in row.iter_mut() {
                num.negate();
            }
        }
    }

    Ok(Solution::new(snapshot, computed, determinant, numerators))
}
