//! The variable table: the mapping between the symbolic quantities of a
//! circuit and the rows, columns and constant bits of the equation system.
//!
//! Three ordered lists are maintained:
//!
//! * **knowns** — the independent sources, one matrix column each beyond the
//!   unknown block;
//! * **unknowns** — node voltages and auxiliary branch currents, each with a
//!   fixed row and a mutable column (the solver rotates columns to place its
//!   current target last);
//! * **constants** — the symbolic device constants, each with a bit position
//!   in the product bitset.

use std::sync::Arc;

use linnet_netlist::ast::{Circuit, DeviceId, DeviceKind, Ident, NodeId};

use crate::network::SubnetId;

/// The number of distinct symbolic constants a circuit may carry; products
/// of constants are represented as one bit per constant in a 64-bit set.
pub const MAX_CONSTANTS: usize = 64;

/// An independent source: a free parameter of every computed expression.
#[derive(Debug, Clone)]
pub struct KnownEntry {
    pub device: DeviceId,
    pub name: Ident,
    /// Column index within the known block; the matrix column is
    /// `num_unknowns + column`.
    pub column: usize,
}

/// What an unknown stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownKind {
    /// The potential of a non-ground node.
    NodeVoltage(NodeId),
    /// The branch current introduced by a voltage source, controlled
    /// voltage source, op-amp output or current probe.
    AuxCurrent(DeviceId),
}

/// One unknown of the equation system.
#[derive(Debug, Clone)]
pub struct UnknownEntry {
    /// Node name for node voltages, device name for auxiliary currents.
    pub name: Ident,
    pub kind: UnknownKind,
    pub subnet: SubnetId,
    /// The fixed matrix row carrying this unknown's equation.
    pub row: usize,
    /// The current matrix column; mutated by [VariableTable::set_target_unknown].
    pub column: usize,
}

/// The physical dimension a symbolic constant stands for. The order of the
/// variants is the canonical constant ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConstantKind {
    Resistance,
    Conductance,
    Inductance,
    Capacitance,
    Gain,
}
impl ConstantKind {
    pub fn of_device(kind: DeviceKind) -> Option<Self> {
        match kind {
            DeviceKind::Resistor => Some(Self::Resistance),
            DeviceKind::Conductance => Some(Self::Conductance),
            DeviceKind::Inductor => Some(Self::Inductance),
            DeviceKind::Capacitor => Some(Self::Capacitance),
            k if k.has_gain() => Some(Self::Gain),
            _ => None,
        }
    }
}

/// One symbolic device constant and its bit position.
#[derive(Debug, Clone)]
pub struct ConstantEntry {
    pub device: DeviceId,
    pub kind: ConstantKind,
    pub bit: u8,
}

/// The variable table of one circuit.
///
/// Cloning is shallow with respect to the circuit (shared `Arc`) but deep
/// with respect to the index assignments, so a clone taken before the solver
/// starts rotating columns observes the natural ordering forever — the
/// solution object relies on this.
#[derive(Debug, Clone)]
pub struct VariableTable {
    circuit: Arc<Circuit>,
    knowns: Vec<KnownEntry>,
    unknowns: Vec<UnknownEntry>,
    constants: Vec<ConstantEntry>,
    /// node index -> unknown index
    node_unknown: Vec<Option<usize>>,
    /// device index -> aux-current unknown index
    device_unknown: Vec<Option<usize>>,
    /// device index -> constant index
    device_constant: Vec<Option<usize>>,
    /// device index -> known index
    device_known: Vec<Option<usize>>,
    constants_sorted: bool,
    swap_parity: bool,
}

impl VariableTable {
    pub fn new(circuit: Arc<Circuit>) -> Self {
        let num_nodes = circuit.num_nodes();
        let num_devices = circuit.num_devices();
        Self {
            circuit,
            knowns: vec![],
            unknowns: vec![],
            constants: vec![],
            node_unknown: vec![None; num_nodes],
            device_unknown: vec![None; num_devices],
            device_constant: vec![None; num_devices],
            device_known: vec![None; num_devices],
            constants_sorted: false,
            swap_parity: false,
        }
    }

    pub fn circuit(&self) -> &Arc<Circuit> {
        &self.circuit
    }

    pub fn num_knowns(&self) -> usize {
        self.knowns.len()
    }

    pub fn num_unknowns(&self) -> usize {
        self.unknowns.len()
    }

    pub fn num_constants(&self) -> usize {
        self.constants.len()
    }

    pub fn knowns(&self) -> &[KnownEntry] {
        &self.knowns
    }

    pub fn unknowns(&self) -> &[UnknownEntry] {
        &self.unknowns
    }

    pub fn constants(&self) -> &[ConstantEntry] {
        &self.constants
    }

    /// Registers an independent source, assigning the next known column.
    pub fn add_known(&mut self, device: DeviceId, name: Ident) {
        let column = self.knowns.len();
        self.device_known[device.index()] = Some(column);
        self.knowns.push(KnownEntry { device, name, column });
    }

    /// Registers an unknown, assigning the next row and column.
    pub fn add_unknown(&mut self, name: Ident, kind: UnknownKind, subnet: SubnetId) {
        let index = self.unknowns.len();
        match kind {
            UnknownKind::NodeVoltage(node) => self.node_unknown[node.index()] = Some(index),
            UnknownKind::AuxCurrent(device) => self.device_unknown[device.index()] = Some(index),
        }
        self.unknowns.push(UnknownEntry {
            name,
            kind,
            subnet,
            row: index,
            column: index,
        });
    }

    /// Registers a symbolic constant for the given device, assigning a
    /// provisional bit position.
    pub fn add_constant(&mut self, device: DeviceId, kind: ConstantKind) {
        debug_assert!(!self.constants_sorted, "constants added after sorting");
        let bit = self.constants.len();
        debug_assert!(bit < MAX_CONSTANTS);
        self.device_constant[device.index()] = Some(bit);
        self.constants.push(ConstantEntry { device, kind, bit: bit as u8 });
    }

    /// Re-permutes the constant bit assignment into the canonical order:
    /// R, G, L, C, then controlled-source gains, stable by device index
    /// within a kind. Must run before any bit position is baked into a
    /// matrix coefficient.
    pub fn sort_constants(&mut self) {
        self.constants.sort_by_key(|c| (c.kind, c.device));
        for (bit, constant) in self.constants.iter_mut().enumerate() {
            constant.bit = bit as u8;
            self.device_constant[constant.device.index()] = Some(bit);
        }
        self.constants_sorted = true;
    }

    /// Looks up the unknown carrying the given node's potential; `None` iff
    /// the node is the ground of its sub-network (or unconnected).
    pub fn unknown_by_node(&self, node: NodeId) -> Option<&UnknownEntry> {
        self.node_unknown[node.index()].map(|i| &self.unknowns[i])
    }

    /// Looks up the auxiliary-current unknown introduced by the given device.
    pub fn unknown_by_device(&self, device: DeviceId) -> &UnknownEntry {
        // Indexing is safe: the analyser registers an aux unknown for every
        // device class that has one before any lookup happens.
        &self.unknowns[self.device_unknown[device.index()].unwrap()]
    }

    /// The constant bit position assigned to the given device.
    pub fn constant_bit(&self, device: DeviceId) -> Option<u8> {
        debug_assert!(self.constants_sorted, "constant bits referenced before sorting");
        self.device_constant[device.index()].map(|i| self.constants[i].bit)
    }

    /// The known column assigned to the given independent source.
    pub fn known_column(&self, device: DeviceId) -> Option<usize> {
        self.device_known[device.index()]
    }

    /// Makes the named unknown the elimination target by rotating its column
    /// to `m - 1`; the columns after it shift down by one. Returns false if
    /// no unknown carries that name.
    pub fn set_target_unknown(&mut self, name: &str) -> bool {
        let Some(index) = self.unknowns.iter().position(|u| u.name == *name) else {
            return false;
        };
        self.set_target_by_index(index);
        true
    }

    /// See [VariableTable::set_target_unknown]; targets by unknown index.
    pub fn set_target_by_index(&mut self, index: usize) {
        let last = self.unknowns.len() - 1;
        let column = self.unknowns[index].column;
        if column == last {
            return;
        }
        for unknown in self.unknowns.iter_mut() {
            if unknown.column > column {
                unknown.column -= 1;
            }
        }
        self.unknowns[index].column = last;
        // A rotation by k positions decomposes into k adjacent transpositions.
        if (last - column) % 2 == 1 {
            self.swap_parity = !self.swap_parity;
        }
    }

    /// The parity of the cumulative column permutation relative to the
    /// natural (registration) order: true when the permutation is odd.
    pub fn swap_parity(&self) -> bool {
        self.swap_parity
    }

    /// A frozen copy for the solution object: shared circuit, independent
    /// column assignments.
    pub fn snapshot(&self) -> VariableTable {
        self.clone()
    }
}
