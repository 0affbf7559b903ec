//! The solution object handed to renderers.
//!
//! A [Solution] owns a frozen snapshot of the variable table (taken before
//! the solver started permuting columns), one determinant shared by every
//! transfer function, and a numerator per (dependent, independent) pair.
//! Dependents are indexed with the unknowns first, followed by the
//! user-defined voltages.

use linnet_analysis::VariableTable;
use linnet_netlist::ast::Ident;

use crate::coeff::Coefficient;

/// The result of searching a solution for a quantity name: how many
/// categories matched, and the index within each.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NameLookup {
    /// Total number of matching quantities across the three categories.
    pub matches: usize,
    /// Index into the unknowns, when an unknown carries the name.
    pub idx_unknown: Option<usize>,
    /// Index into the user-defined voltages.
    pub idx_user_voltage: Option<usize>,
    /// Index into the knowns (independent sources).
    pub idx_known: Option<usize>,
}

/// The symbolic solution of one circuit.
#[derive(Debug, Clone)]
pub struct Solution {
    table: VariableTable,
    computed: Vec<bool>,
    determinant: Coefficient,
    numerators: Vec<Vec<Coefficient>>,
}

impl Solution {
    pub(crate) fn new(
        table: VariableTable,
        computed: Vec<bool>,
        determinant: Coefficient,
        numerators: Vec<Vec<Coefficient>>,
    ) -> Self {
        debug_assert_eq!(computed.len(), numerators.len());
        debug_assert_eq!(
            computed.len(),
            table.num_unknowns() + table.circuit().voltages.len()
        );
        Self { table, computed, determinant, numerators }
    }

    /// The frozen variable table, with columns in their natural order.
    pub fn table(&self) -> &VariableTable {
        &self.table
    }

    /// The number of independent sources.
    pub fn num_independents(&self) -> usize {
        self.table.num_knowns()
    }

    /// The number of dependent quantities: unknowns plus user-defined
    /// voltages.
    pub fn num_dependents(&self) -> usize {
        self.computed.len()
    }

    pub fn independent_name(&self, idx: usize) -> &Ident {
        &self.table.knowns()[idx].name
    }

    pub fn dependent_name(&self, idx: usize) -> &Ident {
        let m = self.table.num_unknowns();
        if idx < m {
            &self.table.unknowns()[idx].name
        } else {
            &self.table.circuit().voltages[idx - m].name
        }
    }

    /// Whether the dependent at `idx` was solved for.
    pub fn is_computed(&self, idx: usize) -> bool {
        self.computed[idx]
    }

    /// The determinant of the equation system: the common denominator of
    /// every transfer function.
    pub fn determinant(&self) -> &Coefficient {
        &self.determinant
    }

    /// The numerator of dependent `dep` with respect to independent `indep`;
    /// the transfer function is `numerator / determinant`. Zero when the
    /// dependent was not computed.
    pub fn numerator(&self, dep: usize, indep: usize) -> &Coefficient {
        &self.numerators[dep][indep]
    }

    /// The dependent index of a user-defined voltage.
    pub fn voltage_dependent_index(&self, voltage: usize) -> usize {
        self.table.num_unknowns() + voltage
    }

    /// Searches every category for a quantity name. The caller disambiguates
    /// through the per-category indices; an auxiliary current and the source
    /// that introduced it legitimately share a name.
    pub fn find_name(&self, name: &str) -> NameLookup {
        let mut lookup = NameLookup::default();
        if let Some(idx) = self.table.unknowns().iter().position(|u| u.name == *name) {
            lookup.idx_unknown = Some(idx);
            lookup.matches += 1;
        }
        if let Some(idx) = self
            .table
            .circuit()
            .voltages
            .iter()
            .position(|v| v.name == *name)
        {
            lookup.idx_user_voltage = Some(idx);
            lookup.matches += 1;
        }
        if let Some(idx) = self.table.knowns().iter().position(|k| k.name == *name) {
            lookup.idx_known = Some(idx);
            lookup.matches += 1;
        }
        lookup
    }
}
