//! Lowering of symbolic coefficients to Octave expressions.
//!
//! A coefficient is a sum of signed products of device constants. Rendered
//! against the device values, each constant contributes either a numerator
//! factor (conductances, capacitances, gains) or a denominator factor
//! (resistances, inductances), and a power of the Laplace variable `s`
//! (+1 per capacitance, -1 per inductance). Collecting addends by their
//! `s`-degree turns a coefficient into a polynomial in `s` whose entries are
//! plain Octave arithmetic over the device value variables.

use std::collections::BTreeMap;

use linnet_analysis::{ConstantEntry, ConstantKind, VariableTable};
use linnet_solver::coeff::{Addend, Coefficient};

/// Octave identifiers allow fewer characters than netlist names; everything
/// else maps to an underscore.
pub(crate) fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if i == 0 && c.is_ascii_digit() {
                out.push('n');
            }
            out.push(c);
        } else {
            out.push('_');
        }
    }
    out
}

/// Renders coefficients against the constant table of one solution.
pub(crate) struct ExprBuilder<'a> {
    table: &'a VariableTable,
    /// Constant entries indexed by bit position.
    by_bit: Vec<&'a ConstantEntry>,
}

impl<'a> ExprBuilder<'a> {
    pub fn new(table: &'a VariableTable) -> Self {
        let mut by_bit: Vec<&ConstantEntry> = table.constants().iter().collect();
        by_bit.sort_by_key(|c| c.bit);
        Self { table, by_bit }
    }

    fn device_name(&self, entry: &ConstantEntry) -> String {
        sanitize(self.table.circuit().device(entry.device).name.as_str())
    }

    /// The `s`-degree a single addend contributes: one per capacitance,
    /// minus one per inductance.
    fn degree(&self, addend: &Addend) -> i64 {
        let mut degree = 0;
        for bit in addend.product.bits() {
            match self.by_bit[bit as usize].kind {
                ConstantKind::Capacitance => degree += 1,
                ConstantKind::Inductance => degree -= 1,
                _ => {}
            }
        }
        degree
    }

    /// One addend as an Octave term, sign included.
    fn term(&self, addend: &Addend) -> String {
        let mut numerator: Vec<String> = vec![];
        let mut denominator: Vec<String> = vec![];
        for bit in addend.product.bits() {
            let entry = self.by_bit[bit as usize];
            let name = self.device_name(entry);
            match entry.kind {
                ConstantKind::Resistance | ConstantKind::Inductance => denominator.push(name),
                ConstantKind::Conductance
                | ConstantKind::Capacitance
                | ConstantKind::Gain => numerator.push(name),
            }
        }

        let mut out = String::new();
        match addend.factor {
            -1 if !(numerator.is_empty() && denominator.is_empty()) => out.push('-'),
            1 if !(numerator.is_empty() && denominator.is_empty()) => {}
            factor => {
                out.push_str(&factor.to_string());
                if !(numerator.is_empty() && denominator.is_empty()) {
                    out.push('*');
                }
            }
        }
        if numerator.is_empty() && !denominator.is_empty() {
            out.push('1');
        }
        out.push_str(&numerator.join("*"));
        if !denominator.is_empty() {
            out.push('/');
            if denominator.len() > 1 {
                out.push('(');
                out.push_str(&denominator.join("*"));
                out.push(')');
            } else {
                out.push_str(&denominator[0]);
            }
        }
        out
    }

    /// Splits a coefficient into `s`-degree buckets of rendered terms.
    fn buckets(&self, coeff: &Coefficient) -> BTreeMap<i64, Vec<String>> {
        let mut buckets: BTreeMap<i64, Vec<String>> = BTreeMap::new();
        for addend in coeff.addends() {
            buckets.entry(self.degree(addend)).or_default().push(self.term(addend));
        }
        buckets
    }

    /// Renders a numerator/denominator pair as two Octave polynomial
    /// coefficient vectors in `s`, highest power first, shifted together so
    /// both are plain polynomials.
    pub fn rational(&self, num: &Coefficient, den: &Coefficient) -> (String, String) {
        let num_buckets = self.buckets(num);
        let den_buckets = self.buckets(den);
        let shift = num_buckets
            .keys()
            .chain(den_buckets.keys())
            .copied()
            .min()
            .unwrap_or(0);
        (
            polynomial_vector(&num_buckets, shift),
            polynomial_vector(&den_buckets, shift),
        )
    }
}

fn join_terms(terms: &[String]) -> String {
    let mut out = String::new();
    for (i, term) in terms.iter().enumerate() {
        if i == 0 {
            out.push_str(term);
        } else if let Some(rest) = term.strip_prefix('-') {
            out.push_str(" - ");
            out.push_str(rest);
        } else {
            out.push_str(" + ");
            out.push_str(term);
        }
    }
    out
}

fn polynomial_vector(buckets: &BTreeMap<i64, Vec<String>>, shift: i64) -> String {
    if buckets.is_empty() {
        return "[0]".to_string();
    }
    let max = *buckets.keys().next_back().unwrap() - shift;
    let mut cells = Vec::with_capacity(max as usize + 1);
    for degree in (0..=max).rev() {
        match buckets.get(&(degree + shift)) {
            Some(terms) => cells.push(join_terms(terms)),
            None => cells.push("0".to_string()),
        }
    }
    format!("[{}]", cells.join(", "))
}

/// Parses a netlist value annotation: a number with an optional SI suffix.
/// Returns the value as an Octave-ready literal.
pub(crate) fn parse_value(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.is_ascii() {
        return None;
    }
    if raw.parse::<f64>().is_ok() {
        return Some(raw.to_string());
    }
    let (body, suffix) = raw.split_at(raw.len() - 1);
    let exponent = match suffix {
        "T" => 12,
        "G" => 9,
        "M" => 6,
        "k" => 3,
        "m" => -3,
        "u" => -6,
        "n" => -9,
        "p" => -12,
        "f" => -15,
        _ => return None,
    };
    body.parse::<f64>().ok()?;
    Some(format!("{body}e{exponent}"))
}
