//! Network analysis: sub-network discovery, ground-node election, structural
//! validation and the enumeration of knowns, unknowns and constants.
//!
//! Every structural and capacity problem found here is emitted through the
//! diagnostics handler before the analyser gives up, so one run reports the
//! whole list.

use std::collections::BTreeMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use miden_diagnostics::{Diagnostic, DiagnosticsHandler, Severity, SourceSpan, ToDiagnostic};
use petgraph::unionfind::UnionFind;
use regex::Regex;

use linnet_netlist::ast::{Circuit, DeviceId, DeviceKind, NodeId};

use crate::vartable::{ConstantKind, UnknownKind, VariableTable, MAX_CONSTANTS};

/// Identifies a maximal connected component of the device-interconnection
/// graph. Each sub-network has exactly one ground node.
pub type SubnetId = usize;

lazy_static! {
    /// Name fragments that mark a node as the intended ground of its
    /// sub-network. Matching is case-sensitive over these exact variants.
    static ref GROUND_NAME: Regex =
        Regex::new("gnd|Gnd|GND|ground|Ground|GROUND").unwrap();
}

/// Errors which can occur during network analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("network analysis failed, see diagnostics for more information")]
    Invalid,
}
impl ToDiagnostic for AnalysisError {
    fn to_diagnostic(self) -> Diagnostic {
        Diagnostic::error().with_message(self.to_string())
    }
}

/// Capacity limits for a single circuit.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisConfig {
    /// Ceiling on symbolic constants; never above [MAX_CONSTANTS].
    pub max_constants: usize,
    pub max_nodes: usize,
    pub max_devices: usize,
}
impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_constants: MAX_CONSTANTS,
            max_nodes: 512,
            max_devices: 1024,
        }
    }
}

/// The sub-network structure of a circuit.
#[derive(Debug, Clone)]
pub struct SubNetworks {
    /// Sub-network of each node; `None` for nodes with no true (current
    /// carrying) connection.
    node_subnet: Vec<Option<SubnetId>>,
    /// Elected ground node per sub-network.
    grounds: Vec<NodeId>,
}
impl SubNetworks {
    pub fn count(&self) -> usize {
        self.grounds.len()
    }

    pub fn subnet_of(&self, node: NodeId) -> Option<SubnetId> {
        self.node_subnet[node.index()]
    }

    pub fn ground_of(&self, subnet: SubnetId) -> NodeId {
        self.grounds[subnet]
    }

    pub fn is_ground(&self, node: NodeId) -> bool {
        self.grounds.contains(&node)
    }
}

/// The product of network analysis: the validated circuit, its sub-network
/// structure and the fully populated variable table.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub circuit: Arc<Circuit>,
    pub subnets: SubNetworks,
    pub table: VariableTable,
}

/// Walks a parsed circuit and produces an [Analysis], accumulating every
/// structural and capacity violation on the way.
pub struct NetworkAnalyzer<'a> {
    diagnostics: &'a DiagnosticsHandler,
    config: AnalysisConfig,
    failed: bool,
}

impl<'a> NetworkAnalyzer<'a> {
    pub fn new(diagnostics: &'a DiagnosticsHandler, config: AnalysisConfig) -> Self {
        Self { diagnostics, config, failed: false }
    }

    fn error(&mut self, span: SourceSpan, message: impl ToString, label: impl ToString) {
        self.failed = true;
        self.diagnostics
            .diagnostic(Severity::Error)
            .with_message(message.to_string())
            .with_primary_label(span, label.to_string())
            .emit();
    }

    pub fn analyze(mut self, circuit: Arc<Circuit>) -> Result<Analysis, AnalysisError> {
        if circuit.devices.is_empty() {
            self.diagnostics
                .diagnostic(Severity::Error)
                .with_message("the netlist connects no devices")
                .emit();
            return Err(AnalysisError::Invalid);
        }
        self.check_capacity(&circuit);

        let num_nodes = circuit.num_nodes();
        let mut fused: UnionFind<usize> = UnionFind::new(num_nodes);
        // A second union-find without the op-amp edges: an op-amp's
        // terminals must already be interconnected by the rest of the
        // circuit, since its inputs carry no current.
        let mut conducting: UnionFind<usize> = UnionFind::new(num_nodes);
        let mut connected = vec![false; num_nodes];

        for (_, device) in circuit.devices() {
            let terminals = device.interconnection_terminals();
            for terminal in terminals {
                connected[terminal.index()] = true;
            }
            for pair in terminals.windows(2) {
                fused.union(pair[0].index(), pair[1].index());
                if device.kind != DeviceKind::OpAmp {
                    conducting.union(pair[0].index(), pair[1].index());
                }
            }
        }

        // Compact sub-network ids in node order.
        let mut subnet_of_root: BTreeMap<usize, SubnetId> = BTreeMap::new();
        let mut node_subnet: Vec<Option<SubnetId>> = vec![None; num_nodes];
        for node in 0..num_nodes {
            if connected[node] {
                let root = fused.find(node);
                let next = subnet_of_root.len();
                let id = *subnet_of_root.entry(root).or_insert(next);
                node_subnet[node] = Some(id);
            }
        }
        let num_subnets = subnet_of_root.len();

        let opamp_outputs = self.check_opamps(&circuit, &conducting);
        self.check_sense_terminals(&circuit, &node_subnet);
        self.check_user_voltages(&circuit, &node_subnet);

        let grounds =
            self.elect_grounds(&circuit, &node_subnet, num_subnets, &opamp_outputs);

        if self.failed {
            return Err(AnalysisError::Invalid);
        }

        let subnets = SubNetworks { node_subnet, grounds };
        let table = self.build_table(&circuit, &subnets);
        Ok(Analysis { circuit, subnets, table })
    }

    fn check_capacity(&mut self, circuit: &Circuit) {
        if circuit.num_nodes() > self.config.max_nodes {
            self.failed = true;
            self.diagnostics
                .diagnostic(Severity::Error)
                .with_message(format!(
                    "circuit has {} nodes, the configured maximum is {}",
                    circuit.num_nodes(),
                    self.config.max_nodes
                ))
                .emit();
        }
        if circuit.num_devices() > self.config.max_devices {
            self.failed = true;
            self.diagnostics
                .diagnostic(Severity::Error)
                .with_message(format!(
                    "circuit has {} devices, the configured maximum is {}",
                    circuit.num_devices(),
                    self.config.max_devices
                ))
                .emit();
        }
        let num_constants = circuit
            .devices
            .iter()
            .filter(|d| d.kind.is_passive() || d.kind.has_gain())
            .count();
        let ceiling = self.config.max_constants.min(MAX_CONSTANTS);
        if num_constants > ceiling {
            self.failed = true;
            self.diagnostics
                .diagnostic(Severity::Error)
                .with_message(format!(
                    "circuit carries {num_constants} symbolic constants, \
                     the supported maximum is {ceiling}"
                ))
                .emit();
        }
    }

    /// Validates op-amps and returns the map from output node to the device
    /// driving it.
    fn check_opamps(
        &mut self,
        circuit: &Circuit,
        conducting: &UnionFind<usize>,
    ) -> BTreeMap<NodeId, DeviceId> {
        let mut outputs: BTreeMap<NodeId, DeviceId> = BTreeMap::new();
        for (id, device) in circuit.devices() {
            if device.kind != DeviceKind::OpAmp {
                continue;
            }
            if let Some(&other) = outputs.get(&device.output()) {
                self.error(
                    device.span,
                    format!(
                        "op-amps '{}' and '{}' both drive node '{}'",
                        circuit.device(other).name,
                        device.name,
                        circuit.node_name(device.output())
                    ),
                    "two outputs on one node make the system contradictory",
                );
            } else {
                outputs.insert(device.output(), id);
            }
            let a = device.input_neg().index();
            let b = device.input_pos().index();
            let out = device.output().index();
            if !(conducting.equiv(a, b) && conducting.equiv(a, out)) {
                self.error(
                    device.span,
                    format!(
                        "the terminals of op-amp '{}' span more than one sub-network",
                        device.name
                    ),
                    "op-amp inputs carry no current, so they cannot bridge sub-networks",
                );
            }
        }
        outputs
    }

    /// The two voltage-sense terminals of a controlled source must land in
    /// one sub-network, on truly connected nodes.
    fn check_sense_terminals(&mut self, circuit: &Circuit, node_subnet: &[Option<SubnetId>]) {
        for (_, device) in circuit.devices() {
            if !device.kind.is_voltage_controlled() {
                continue;
            }
            let plus = device.ctrl_plus();
            let minus = device.ctrl_minus();
            match (node_subnet[plus.index()], node_subnet[minus.index()]) {
                (Some(a), Some(b)) if a == b => {}
                (Some(_), Some(_)) => {
                    self.error(
                        device.span,
                        format!(
                            "the sense terminals of '{}' lie in different sub-networks",
                            device.name
                        ),
                        "a sensed voltage must be defined against a single ground",
                    );
                }
                _ => {
                    self.error(
                        device.span,
                        format!("'{}' senses a node with no connected device", device.name),
                        "sense terminals do not count as connections",
                    );
                }
            }
        }
    }

    fn check_user_voltages(&mut self, circuit: &Circuit, node_subnet: &[Option<SubnetId>]) {
        for voltage in &circuit.voltages {
            match (
                node_subnet[voltage.plus.index()],
                node_subnet[voltage.minus.index()],
            ) {
                (Some(a), Some(b)) if a == b => {}
                (Some(_), Some(_)) => {
                    self.error(
                        voltage.span,
                        format!(
                            "user-defined voltage '{}' spans two sub-networks",
                            voltage.name
                        ),
                        "both nodes must share a ground reference",
                    );
                }
                _ => {
                    self.error(
                        voltage.span,
                        format!(
                            "user-defined voltage '{}' references an unconnected node",
                            voltage.name
                        ),
                        "no device connects here",
                    );
                }
            }
        }
    }

    /// Elects one ground node per sub-network:
    ///
    /// 1. a uniquely ground-named node, unless it is an op-amp output;
    /// 2. otherwise the first node in list order, provided the sub-network
    ///    contains no op-amp;
    /// 3. otherwise the user must name the ground — error.
    fn elect_grounds(
        &mut self,
        circuit: &Circuit,
        node_subnet: &[Option<SubnetId>],
        num_subnets: usize,
        opamp_outputs: &BTreeMap<NodeId, DeviceId>,
    ) -> Vec<NodeId> {
        let mut named: Vec<Vec<NodeId>> = vec![vec![]; num_subnets];
        let mut first: Vec<Option<NodeId>> = vec![None; num_subnets];
        for node in 0..circuit.num_nodes() {
            let Some(subnet) = node_subnet[node] else { continue };
            let node = NodeId::from(node);
            if first[subnet].is_none() {
                first[subnet] = Some(node);
            }
            if GROUND_NAME.is_match(circuit.node_name(node).as_str()) {
                named[subnet].push(node);
            }
        }
        let mut has_opamp = vec![false; num_subnets];
        for (_, device) in circuit.devices() {
            if device.kind == DeviceKind::OpAmp {
                if let Some(subnet) = node_subnet[device.output().index()] {
                    has_opamp[subnet] = true;
                }
            }
        }

        let mut grounds = Vec::with_capacity(num_subnets);
        for subnet in 0..num_subnets {
            match named[subnet].as_slice() {
                [node] => {
                    if let Some(&opamp) = opamp_outputs.get(node) {
                        self.error(
                            circuit.node_name(*node).span,
                            format!(
                                "ground-named node '{}' is the output of op-amp '{}'",
                                circuit.node_name(*node),
                                circuit.device(opamp).name
                            ),
                            "a driven node cannot be the ground reference",
                        );
                    }
                    grounds.push(*node);
                }
                [] => {
                    if has_opamp[subnet] {
                        self.failed = true;
                        self.diagnostics
                            .diagnostic(Severity::Error)
                            .with_message(format!(
                                "sub-network {subnet} contains an op-amp but no \
                                 ground-named node; name the ground explicitly"
                            ))
                            .emit();
                    }
                    // First node in list order; on the op-amp error path it
                    // is a placeholder keeping indices aligned.
                    grounds.push(first[subnet].unwrap());
                }
                multiple => {
                    let names = multiple
                        .iter()
                        .map(|n| format!("'{}'", circuit.node_name(*n)))
                        .collect::<Vec<_>>()
                        .join(", ");
                    self.failed = true;
                    self.diagnostics
                        .diagnostic(Severity::Error)
                        .with_message(format!(
                            "sub-network {subnet} has several ground-named nodes: {names}"
                        ))
                        .emit();
                    grounds.push(multiple[0]);
                }
            }
        }
        grounds
    }

    /// Populates the variable table: knowns, then node-voltage unknowns in
    /// node order, then auxiliary-current unknowns in device order, then the
    /// symbolic constants in canonical order.
    fn build_table(&self, circuit: &Arc<Circuit>, subnets: &SubNetworks) -> VariableTable {
        let mut table = VariableTable::new(circuit.clone());

        for (id, device) in circuit.devices() {
            if device.kind.is_independent_source() {
                table.add_known(id, device.name.clone());
            }
        }
        for node in 0..circuit.num_nodes() {
            let node = NodeId::from(node);
            let Some(subnet) = subnets.subnet_of(node) else { continue };
            if subnets.is_ground(node) {
                continue;
            }
            table.add_unknown(
                circuit.node_name(node).clone(),
                UnknownKind::NodeVoltage(node),
                subnet,
            );
        }
        for (id, device) in circuit.devices() {
            if device.kind.has_aux_current() {
                let reference = device.interconnection_terminals()[0];
                // The device's terminals all share one sub-network here;
                // structural checks have passed.
                let subnet = subnets.subnet_of(reference).unwrap();
                table.add_unknown(device.name.clone(), UnknownKind::AuxCurrent(id), subnet);
            }
        }
        for (id, device) in circuit.devices() {
            if let Some(kind) = ConstantKind::of_device(device.kind) {
                table.add_constant(id, kind);
            }
        }
        table.sort_constants();

        debug_assert_eq!(
            table.num_unknowns(),
            circuit.num_nodes() - subnets.count()
                + circuit.devices.iter().filter(|d| d.kind.has_aux_current()).count()
                - subnets
                    .node_subnet
                    .iter()
                    .filter(|s| s.is_none())
                    .count()
        );
        table
    }
}
