//! This module provides the AST structures produced by parsing a netlist.
//!
//! A netlist describes one circuit: its equipotential nodes, the devices
//! connected between them, optional user-defined voltages (derived output
//! quantities), and the result requests naming which transfer functions the
//! analysis should produce.
//!
//! The circuit is immutable once parsed; all later pipeline stages share it
//! by reference.

use std::{fmt, sync::Arc};

use miden_diagnostics::{SourceSpan, Spanned};

/// A unique identifier for a node in a [Circuit]
///
/// The raw value of this identifier is an index in the `nodes` vector of the
/// [Circuit] struct.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl From<usize> for NodeId {
    fn from(u: usize) -> Self {
        Self(u)
    }
}
impl From<NodeId> for usize {
    fn from(val: NodeId) -> usize {
        val.0
    }
}
impl NodeId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A unique identifier for a device in a [Circuit]
///
/// The raw value of this identifier is an index in the `devices` vector of
/// the [Circuit] struct.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(usize);

impl From<usize> for DeviceId {
    fn from(u: usize) -> Self {
        Self(u)
    }
}
impl From<DeviceId> for usize {
    fn from(val: DeviceId) -> usize {
        val.0
    }
}
impl DeviceId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A named entity in a netlist: a node, device, voltage or result name.
///
/// Equality and ordering ignore the source span, so parsed identifiers
/// compare equal to identifiers constructed in tests with an unknown span.
#[derive(Clone, Spanned)]
pub struct Ident {
    #[span]
    pub span: SourceSpan,
    name: Arc<str>,
}
impl Ident {
    pub fn new(span: SourceSpan, name: impl Into<Arc<str>>) -> Self {
        Self { span, name: name.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}
impl Eq for Ident {}
impl PartialEq for Ident {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl PartialEq<str> for Ident {
    fn eq(&self, other: &str) -> bool {
        self.name.as_ref() == other
    }
}
impl Ord for Ident {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}
impl PartialOrd for Ident {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl core::hash::Hash for Ident {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Ident({})", &self.name)
    }
}
impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The class of a [Device], determining its terminal layout and its
/// contribution to the equation system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeviceKind {
    /// An ideal resistor
    Resistor,
    /// An ideal conductance
    Conductance,
    /// An ideal inductor
    Inductor,
    /// An ideal capacitor
    Capacitor,
    /// An independent voltage source
    VoltageSource,
    /// An independent current source
    CurrentSource,
    /// A voltage-controlled voltage source, `U(U)`
    Vcvs,
    /// A current-controlled voltage source, `U(I)`
    Ccvs,
    /// A voltage-controlled current source, `I(U)`
    Vccs,
    /// A current-controlled current source, `I(I)`
    Cccs,
    /// An ideal operational amplifier
    OpAmp,
    /// A current probe: a zero-drop device exposing its branch current
    CurrentProbe,
}
impl DeviceKind {
    /// Parses the netlist type mnemonic of a device class.
    pub fn from_mnemonic(s: &str) -> Option<Self> {
        Some(match s {
            "R" => Self::Resistor,
            "G" => Self::Conductance,
            "L" => Self::Inductor,
            "C" => Self::Capacitor,
            "U" => Self::VoltageSource,
            "I" => Self::CurrentSource,
            "U(U)" => Self::Vcvs,
            "U(I)" => Self::Ccvs,
            "I(U)" => Self::Vccs,
            "I(I)" => Self::Cccs,
            "OP" => Self::OpAmp,
            "PI" => Self::CurrentProbe,
            _ => return None,
        })
    }

    /// The netlist type mnemonic of this device class.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Resistor => "R",
            Self::Conductance => "G",
            Self::Inductor => "L",
            Self::Capacitor => "C",
            Self::VoltageSource => "U",
            Self::CurrentSource => "I",
            Self::Vcvs => "U(U)",
            Self::Ccvs => "U(I)",
            Self::Vccs => "I(U)",
            Self::Cccs => "I(I)",
            Self::OpAmp => "OP",
            Self::CurrentProbe => "PI",
        }
    }

    /// The number of node terminals this device class names in the netlist.
    pub fn num_terminals(&self) -> usize {
        match self {
            Self::Vcvs | Self::Vccs => 4,
            Self::OpAmp => 3,
            _ => 2,
        }
    }

    /// True for devices represented by a symbolic constant (R, G, L, C).
    pub fn is_passive(&self) -> bool {
        matches!(
            self,
            Self::Resistor | Self::Conductance | Self::Inductor | Self::Capacitor
        )
    }

    /// True for independent sources, whose values are the free parameters of
    /// every computed transfer function.
    pub fn is_independent_source(&self) -> bool {
        matches!(self, Self::VoltageSource | Self::CurrentSource)
    }

    /// True for the four controlled-source classes, which carry a symbolic
    /// gain constant.
    pub fn has_gain(&self) -> bool {
        matches!(self, Self::Vcvs | Self::Ccvs | Self::Vccs | Self::Cccs)
    }

    /// True for devices that introduce an auxiliary branch-current unknown.
    pub fn has_aux_current(&self) -> bool {
        matches!(
            self,
            Self::VoltageSource | Self::Vcvs | Self::Ccvs | Self::OpAmp | Self::CurrentProbe
        )
    }

    /// True for devices controlled by a current probe.
    pub fn is_current_controlled(&self) -> bool {
        matches!(self, Self::Ccvs | Self::Cccs)
    }

    /// True for devices with a pair of voltage-sense terminals.
    pub fn is_voltage_controlled(&self) -> bool {
        matches!(self, Self::Vcvs | Self::Vccs)
    }
}
impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A device connected into the circuit.
///
/// The `nodes` vector holds the device's terminals in netlist order:
///
/// * two-terminal devices: `from`, `to`;
/// * op-amps: inverting input, non-inverting input, output;
/// * voltage-controlled sources: output `from`, output `to`, control plus,
///   control minus (the control pair is sense-only);
/// * current-controlled sources: output `from`, output `to`, with the
///   controlling probe referenced through `probe`.
#[derive(Clone, Debug, Spanned)]
pub struct Device {
    #[span]
    pub span: SourceSpan,
    pub kind: DeviceKind,
    pub name: Ident,
    pub nodes: Vec<NodeId>,
    /// The controlling current probe, for `U(I)` and `I(I)` devices.
    pub probe: Option<DeviceId>,
    /// Opaque value annotation from the netlist, preserved for the renderer.
    pub value: Option<String>,
}
impl Device {
    pub fn from_node(&self) -> NodeId {
        debug_assert_ne!(self.kind, DeviceKind::OpAmp);
        self.nodes[0]
    }

    pub fn to_node(&self) -> NodeId {
        debug_assert_ne!(self.kind, DeviceKind::OpAmp);
        self.nodes[1]
    }

    /// The positive voltage-sense terminal of a `U(U)` or `I(U)` device.
    pub fn ctrl_plus(&self) -> NodeId {
        debug_assert!(self.kind.is_voltage_controlled());
        self.nodes[2]
    }

    /// The negative voltage-sense terminal of a `U(U)` or `I(U)` device.
    pub fn ctrl_minus(&self) -> NodeId {
        debug_assert!(self.kind.is_voltage_controlled());
        self.nodes[3]
    }

    pub fn input_neg(&self) -> NodeId {
        debug_assert_eq!(self.kind, DeviceKind::OpAmp);
        self.nodes[0]
    }

    pub fn input_pos(&self) -> NodeId {
        debug_assert_eq!(self.kind, DeviceKind::OpAmp);
        self.nodes[1]
    }

    pub fn output(&self) -> NodeId {
        debug_assert_eq!(self.kind, DeviceKind::OpAmp);
        self.nodes[2]
    }

    /// The terminals through which this device conducts current, fusing
    /// their nodes into one sub-network. The sense pair of a
    /// voltage-controlled source is excluded.
    pub fn interconnection_terminals(&self) -> &[NodeId] {
        match self.kind {
            DeviceKind::OpAmp => &self.nodes[..3],
            _ => &self.nodes[..2],
        }
    }

    /// The sense-only node terminals of this device, if any.
    pub fn sense_terminals(&self) -> &[NodeId] {
        if self.kind.is_voltage_controlled() {
            &self.nodes[2..4]
        } else {
            &[]
        }
    }
}
impl Eq for Device {}
impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.nodes == other.nodes
            && self.probe == other.probe
            && self.value == other.value
    }
}

/// A user-defined voltage: a derived output quantity equal to the potential
/// difference between two nodes. Not an unknown of the equation system.
#[derive(Clone, Debug, Spanned)]
pub struct VoltageDef {
    #[span]
    pub span: SourceSpan,
    pub name: Ident,
    pub plus: NodeId,
    pub minus: NodeId,
}
impl Eq for VoltageDef {}
impl PartialEq for VoltageDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.plus == other.plus && self.minus == other.minus
    }
}

/// A full result request: every transfer function from each independent
/// source to each of the named dependent quantities.
#[derive(Clone, Debug, Spanned)]
pub struct FullResult {
    #[span]
    pub span: SourceSpan,
    pub name: Ident,
    pub dependents: Vec<Ident>,
}
impl Eq for FullResult {}
impl PartialEq for FullResult {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.dependents == other.dependents
    }
}

/// A Bode-style result request: the single transfer function from one
/// independent source to one dependent quantity, with an optional plot
/// annotation passed through to the renderer.
#[derive(Clone, Debug, Spanned)]
pub struct BodeResult {
    #[span]
    pub span: SourceSpan,
    pub name: Ident,
    pub dependent: Ident,
    pub independent: Ident,
    pub plot: Option<String>,
}
impl Eq for BodeResult {}
impl PartialEq for BodeResult {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.dependent == other.dependent
            && self.independent == other.independent
            && self.plot == other.plot
    }
}

/// A result request from the netlist.
#[derive(Clone, Debug, PartialEq, Eq, Spanned)]
pub enum ResultRequest {
    Full(FullResult),
    Bode(BodeResult),
}
impl ResultRequest {
    pub fn name(&self) -> &Ident {
        match self {
            Self::Full(r) => &r.name,
            Self::Bode(r) => &r.name,
        }
    }

    /// The dependent quantity names this request demands.
    pub fn dependents(&self) -> &[Ident] {
        match self {
            Self::Full(r) => &r.dependents,
            Self::Bode(r) => core::slice::from_ref(&r.dependent),
        }
    }
}

/// A parsed circuit: the immutable input to network analysis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Circuit {
    pub name: Ident,
    /// Node names in first-reference order; [NodeId] indexes this list.
    pub nodes: Vec<Ident>,
    /// Devices in netlist order; [DeviceId] indexes this list.
    pub devices: Vec<Device>,
    pub voltages: Vec<VoltageDef>,
    pub results: Vec<ResultRequest>,
}
impl Circuit {
    pub fn new(name: Ident) -> Self {
        Self {
            name,
            nodes: vec![],
            devices: vec![],
            voltages: vec![],
            results: vec![],
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_devices(&self) -> usize {
        self.devices.len()
    }

    pub fn node_name(&self, id: NodeId) -> &Ident {
        &self.nodes[id.index()]
    }

    pub fn device(&self, id: DeviceId) -> &Device {
        &self.devices[id.index()]
    }

    /// Iterates over all devices together with their ids.
    pub fn devices(&self) -> impl Iterator<Item = (DeviceId, &Device)> {
        self.devices.iter().enumerate().map(|(i, d)| (DeviceId::from(i), d))
    }

    pub fn device_by_name(&self, name: &str) -> Option<(DeviceId, &Device)> {
        self.devices().find(|(_, d)| d.name == *name)
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| *n == *name).map(NodeId::from)
    }
}
