//! GNU Octave renderer for linNet solutions.
//!
//! The emitted script assigns every device value (taken from the netlist
//! annotations where present), then defines, per requested result, the
//! numerator and denominator polynomial coefficient vectors of the transfer
//! function in the Laplace variable `s` — ready for `freqs(num, den, w)`.

mod expr;

#[cfg(test)]
mod tests;

use std::fmt::Write;

use linnet_netlist::ast::ResultRequest;
use linnet_solver::coeff::Coefficient;
use linnet_solver::Solution;

use crate::expr::{parse_value, sanitize, ExprBuilder};

/// A backend turning a [Solution] into renderer output.
pub trait CodeGenerator {
    type Output;

    fn generate(&self, solution: &Solution) -> anyhow::Result<Self::Output>;
}

/// The GNU Octave backend.
#[derive(Default, Debug, Copy, Clone)]
pub struct OctaveCodeGenerator;

impl OctaveCodeGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl CodeGenerator for OctaveCodeGenerator {
    type Output = String;

    fn generate(&self, solution: &Solution) -> anyhow::Result<String> {
        let mut script = String::new();
        let table = solution.table();
        let circuit = table.circuit().clone();
        let exprs = ExprBuilder::new(table);

        writeln!(script, "% Transfer functions of circuit '{}'", circuit.name)?;
        writeln!(script, "% generated by linnet")?;
        writeln!(script)?;

        writeln!(script, "% Device values")?;
        for constant in table.constants() {
            let device = circuit.device(constant.device);
            let name = sanitize(device.name.as_str());
            match device.value.as_deref().map(str::trim) {
                Some(raw) => match parse_value(raw) {
                    Some(value) => writeln!(script, "{name} = {value};")?,
                    None => {
                        writeln!(script, "{name} = 1; % value '{raw}' not understood")?
                    }
                },
                None => writeln!(script, "{name} = 1; % no value in netlist")?,
            }
        }
        writeln!(script)?;

        for result in &circuit.results {
            match result {
                ResultRequest::Bode(bode) => {
                    self.emit_transfer(
                        &mut script,
                        solution,
                        &exprs,
                        result.name().as_str(),
                        bode.dependent.as_str(),
                        bode.independent.as_str(),
                        bode.plot.as_deref(),
                    )?;
                }
                ResultRequest::Full(full) => {
                    for dependent in &full.dependents {
                        for known in table.knowns() {
                            let name = format!(
                                "{}_{}_{}",
                                result.name(),
                                dependent,
                                known.name
                            );
                            self.emit_transfer(
                                &mut script,
                                solution,
                                &exprs,
                                &name,
                                dependent.as_str(),
                                known.name.as_str(),
                                None,
                            )?;
                        }
                    }
                }
            }
        }
        Ok(script)
    }
}

impl OctaveCodeGenerator {
    /// Emits one transfer function `dependent / independent` as a pair of
    /// polynomial vectors.
    #[allow(clippy::too_many_arguments)]
    fn emit_transfer(
        &self,
        script: &mut String,
        solution: &Solution,
        exprs: &ExprBuilder<'_>,
        result_name: &str,
        dependent: &str,
        independent: &str,
        plot: Option<&str>,
    ) -> anyhow::Result<()> {
        let name = sanitize(result_name);
        writeln!(script, "% Result '{result_name}': {dependent} / {independent}")?;
        if let Some(plot) = plot {
            writeln!(script, "% plot: {plot}")?;
        }

        let indep = solution.find_name(independent);
        let Some(known) = indep.idx_known else {
            writeln!(
                script,
                "% not available: '{independent}' is not an independent source"
            )?;
            writeln!(script)?;
            return Ok(());
        };

        let dep = solution.find_name(dependent);
        let numerator: Option<Coefficient> = if let Some(idx) = dep.idx_unknown {
            solution
                .is_computed(idx)
                .then(|| solution.numerator(idx, known).clone())
        } else if let Some(idx) = dep.idx_user_voltage {
            let idx = solution.voltage_dependent_index(idx);
            solution
                .is_computed(idx)
                .then(|| solution.numerator(idx, known).clone())
        } else if let Some(idx) = dep.idx_known {
            // A source requested as its own output: the identity, or zero
            // against any other source.
            let factor = if idx == known { 1 } else { 0 };
            let mut num = solution.determinant().clone();
            num.scale(factor);
            Some(num)
        } else {
            None
        };

        match numerator {
            Some(num) => {
                let (num_vec, den_vec) = exprs.rational(&num, solution.determinant());
                writeln!(script, "{name}_num = {num_vec};")?;
                writeln!(script, "{name}_den = {den_vec};")?;
                writeln!(script, "% h = freqs({name}_num, {name}_den, w);")?;
            }
            None => {
                writeln!(script, "% not available: '{dependent}' was not computed")?;
            }
        }
        writeln!(script)?;
        Ok(())
    }
}
