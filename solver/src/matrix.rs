//! The MNA coefficient matrix and the device stamping that fills it.
//!
//! The matrix has one row per unknown and `m + k` columns: the first `m`
//! multiply the unknowns (in the variable table's current column order), the
//! remaining `k` multiply the independent sources. Every equation is stored
//! in the all-on-the-left form `A*x + B*k = 0`, with current taken positive
//! into the node whose balance a row expresses.
//!
//! Terms that would land on a ground node's column or row are silently
//! omitted; the ground potential is the zero reference of its sub-network.

use linnet_analysis::VariableTable;
use linnet_netlist::ast::{Device, DeviceId, DeviceKind, NodeId};

use crate::coeff::{Coefficient, ProductMask};

/// A dense matrix of symbolic coefficients.
#[derive(Debug, Clone)]
pub struct MnaMatrix {
    rows: usize,
    cols: usize,
    elems: Vec<Coefficient>,
}

impl MnaMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            elems: vec![Coefficient::zero(); rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn at(&self, row: usize, col: usize) -> &Coefficient {
        &self.elems[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, coeff: Coefficient) {
        self.elems[row * self.cols + col] = coeff;
    }

    /// Moves a coefficient out of the matrix, leaving zero behind.
    pub fn take(&mut self, row: usize, col: usize) -> Coefficient {
        core::mem::take(&mut self.elems[row * self.cols + col])
    }

    pub fn add_addend(&mut self, row: usize, col: usize, factor: i64, product: ProductMask) {
        self.elems[row * self.cols + col].add_addend(factor, product);
    }

    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for col in 0..self.cols {
            self.elems.swap(a * self.cols + col, b * self.cols + col);
        }
    }

    /// Resets every entry to zero, keeping the allocation.
    pub fn clear(&mut self) {
        for elem in self.elems.iter_mut() {
            *elem = Coefficient::zero();
        }
    }
}

/// Fills an [MnaMatrix] from a circuit and its variable table, one stamping
/// rule per device class.
pub struct StampBuilder<'a> {
    table: &'a VariableTable,
}

impl<'a> StampBuilder<'a> {
    pub fn new(table: &'a VariableTable) -> Self {
        Self { table }
    }

    /// A matrix dimensioned for the table.
    pub fn build_matrix(&self) -> MnaMatrix {
        let m = self.table.num_unknowns();
        MnaMatrix::new(m, m + self.table.num_knowns())
    }

    /// Reinitialises the matrix and stamps every device. Run once per solve
    /// target, after the variable table's column rotation.
    pub fn rebuild(&self, matrix: &mut MnaMatrix) {
        matrix.clear();
        let circuit = self.table.circuit().clone();
        for (id, device) in circuit.devices() {
            self.stamp(matrix, id, device);
        }
    }

    /// KCL row of a node's balance; `None` for ground nodes.
    fn row(&self, node: NodeId) -> Option<usize> {
        self.table.unknown_by_node(node).map(|u| u.row)
    }

    /// Current column of a node's potential unknown; `None` for ground.
    fn col(&self, node: NodeId) -> Option<usize> {
        self.table.unknown_by_node(node).map(|u| u.column)
    }

    fn aux_row(&self, device: DeviceId) -> usize {
        self.table.unknown_by_device(device).row
    }

    fn aux_col(&self, device: DeviceId) -> usize {
        self.table.unknown_by_device(device).column
    }

    fn known_col(&self, device: DeviceId) -> usize {
        // Every independent source is registered as a known.
        self.table.num_unknowns() + self.table.known_column(device).unwrap()
    }

    fn mask(&self, device: DeviceId) -> ProductMask {
        // Every passive and controlled device is registered as a constant.
        ProductMask::bit(self.table.constant_bit(device).unwrap())
    }

    fn stamp(&self, m: &mut MnaMatrix, id: DeviceId, device: &Device) {
        match device.kind {
            DeviceKind::Resistor
            | DeviceKind::Conductance
            | DeviceKind::Inductor
            | DeviceKind::Capacitor => {
                self.stamp_admittance(m, device.from_node(), device.to_node(), self.mask(id));
            }
            DeviceKind::VoltageSource => {
                self.stamp_voltage_rows(m, id, device);
                m.add_addend(self.aux_row(id), self.known_col(id), -1, ProductMask::EMPTY);
            }
            DeviceKind::CurrentSource => {
                let col = self.known_col(id);
                if let Some(row) = self.row(device.from_node()) {
                    m.add_addend(row, col, -1, ProductMask::EMPTY);
                }
                if let Some(row) = self.row(device.to_node()) {
                    m.add_addend(row, col, 1, ProductMask::EMPTY);
                }
            }
            DeviceKind::OpAmp => {
                // The output sources whatever current the rest of the
                // circuit demands; the inputs draw none. The auxiliary row
                // pins the two input potentials to each other.
                if let Some(row) = self.row(device.output()) {
                    m.add_addend(row, self.aux_col(id), 1, ProductMask::EMPTY);
                }
                let row = self.aux_row(id);
                if let Some(col) = self.col(device.input_pos()) {
                    m.add_addend(row, col, 1, ProductMask::EMPTY);
                }
                if let Some(col) = self.col(device.input_neg()) {
                    m.add_addend(row, col, -1, ProductMask::EMPTY);
                }
            }
            DeviceKind::CurrentProbe => {
                // Zero voltage drop, measured branch current.
                if let Some(row) = self.row(device.from_node()) {
                    m.add_addend(row, self.aux_col(id), -1, ProductMask::EMPTY);
                }
                if let Some(row) = self.row(device.to_node()) {
                    m.add_addend(row, self.aux_col(id), 1, ProductMask::EMPTY);
                }
                let row = self.aux_row(id);
                if let Some(col) = self.col(device.from_node()) {
                    m.add_addend(row, col, 1, ProductMask::EMPTY);
                }
                if let Some(col) = self.col(device.to_node()) {
                    m.add_addend(row, col, -1, ProductMask::EMPTY);
                }
            }
            DeviceKind::Vcvs => {
                self.stamp_voltage_rows(m, id, device);
                let row = self.aux_row(id);
                let k = self.mask(id);
                if let Some(col) = self.col(device.ctrl_plus()) {
                    m.add_addend(row, col, -1, k);
                }
                if let Some(col) = self.col(device.ctrl_minus()) {
                    m.add_addend(row, col, 1, k);
                }
            }
            DeviceKind::Ccvs => {
                self.stamp_voltage_rows(m, id, device);
                // The probe is resolved during parsing for this device class.
                let probe = device.probe.unwrap();
                m.add_addend(self.aux_row(id), self.aux_col(probe), -1, self.mask(id));
            }
            DeviceKind::Vccs => {
                let k = self.mask(id);
                for (node, sign) in [(device.from_node(), -1), (device.to_node(), 1)] {
                    if let Some(row) = self.row(node) {
                        if let Some(col) = self.col(device.ctrl_plus()) {
                            m.add_addend(row, col, sign, k);
                        }
                        if let Some(col) = self.col(device.ctrl_minus()) {
                            m.add_addend(row, col, -sign, k);
                        }
                    }
                }
            }
            DeviceKind::Cccs => {
                let k = self.mask(id);
                let probe = device.probe.unwrap();
                let col = self.aux_col(probe);
                if let Some(row) = self.row(device.from_node()) {
                    m.add_addend(row, col, -1, k);
                }
                if let Some(row) = self.row(device.to_node()) {
                    m.add_addend(row, col, 1, k);
                }
            }
        }
    }

    /// The shared admittance stamp of the four passive classes: the device
    /// passes `y*(U_other - U_this)` into each terminal's balance.
    fn stamp_admittance(&self, m: &mut MnaMatrix, from: NodeId, to: NodeId, y: ProductMask) {
        for (this, other) in [(from, to), (to, from)] {
            if let Some(row) = self.row(this) {
                // `col(this)` exists whenever `row(this)` does.
                m.add_addend(row, self.col(this).unwrap(), -1, y);
                if let Some(col) = self.col(other) {
                    m.add_addend(row, col, 1, y);
                }
            }
        }
    }

    /// The rows shared by every voltage-source-like device: the branch
    /// current enters the KCL balances, and the auxiliary row fixes the
    /// terminal potential difference.
    fn stamp_voltage_rows(&self, m: &mut MnaMatrix, id: DeviceId, device: &Device) {
        let aux_col = self.aux_col(id);
        if let Some(row) = self.row(device.from_node()) {
            m.add_addend(row, aux_col, 1, ProductMask::EMPTY);
        }
        if let Some(row) = self.row(device.to_node()) {
            m.add_addend(row, aux_col, -1, ProductMask::EMPTY);
        }
        let row = self.aux_row(id);
        if let Some(col) = self.col(device.from_node()) {
            m.add_addend(row, col, 1, ProductMask::EMPTY);
        }
        if let Some(col) = self.col(device.to_node()) {
            m.add_addend(row, col, -1, ProductMask::EMPTY);
        }
    }
}
