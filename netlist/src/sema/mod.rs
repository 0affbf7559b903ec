//! Semantic checks run after parsing, before the circuit is handed to the
//! network analyser.
//!
//! All violations are accumulated through the diagnostics handler so the
//! user sees the full list in one run; the checks only fail once everything
//! has been inspected.

use std::collections::BTreeMap;

use miden_diagnostics::{Diagnostic, DiagnosticsHandler, Severity, SourceSpan, ToDiagnostic};

use crate::ast::*;

#[derive(Debug, thiserror::Error)]
pub enum SemanticAnalysisError {
    #[error("invalid netlist, see diagnostics for more information")]
    Invalid,
}
impl ToDiagnostic for SemanticAnalysisError {
    fn to_diagnostic(self) -> Diagnostic {
        Diagnostic::error().with_message(self.to_string())
    }
}

/// Validates the name rules and device shapes of a parsed [Circuit].
pub struct SemanticAnalysis<'a> {
    diagnostics: &'a DiagnosticsHandler,
    failed: bool,
}
impl<'a> SemanticAnalysis<'a> {
    pub fn new(diagnostics: &'a DiagnosticsHandler) -> Self {
        Self { diagnostics, failed: false }
    }

    pub fn run(mut self, circuit: &Circuit) -> Result<(), SemanticAnalysisError> {
        self.check_unique(circuit.devices.iter().map(|d| &d.name), "device");
        self.check_unique(circuit.voltages.iter().map(|v| &v.name), "voltage");
        self.check_unique(circuit.results.iter().map(|r| r.name()), "result");
        self.check_device_shapes(circuit);

        if self.failed {
            Err(SemanticAnalysisError::Invalid)
        } else {
            Ok(())
        }
    }

    fn error(&mut self, span: SourceSpan, message: impl ToString, label: &str) {
        self.failed = true;
        self.diagnostics
            .diagnostic(Severity::Error)
            .with_message(message.to_string())
            .with_primary_label(span, label.to_string())
            .emit();
    }

    /// Names must be unique within their namespace; devices, user-defined
    /// voltages and results each form their own.
    fn check_unique<'c>(&mut self, names: impl Iterator<Item = &'c Ident>, what: &str) {
        let mut seen: BTreeMap<&str, &Ident> = BTreeMap::new();
        for name in names {
            if seen.insert(name.as_str(), name).is_some() {
                self.error(
                    name.span,
                    format!("duplicate {what} name '{name}'"),
                    "a previous declaration uses this name",
                );
            }
        }
    }

    fn check_device_shapes(&mut self, circuit: &Circuit) {
        for (_, device) in circuit.devices() {
            // A two-terminal device looped onto a single node contributes
            // nothing to the equations and almost always indicates a typo.
            if device.kind != DeviceKind::OpAmp && device.from_node() == device.to_node() {
                self.error(
                    device.span,
                    format!(
                        "both terminals of '{}' connect to node '{}'",
                        device.name,
                        circuit.node_name(device.from_node())
                    ),
                    "this device is shorted onto itself",
                );
            }
            if device.kind.is_voltage_controlled() && device.ctrl_plus() == device.ctrl_minus() {
                self.error(
                    device.span,
                    format!("'{}' senses a zero voltage", device.name),
                    "both sense terminals reference the same node",
                );
            }
        }
    }
}
