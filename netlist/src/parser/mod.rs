//! The netlist parser.
//!
//! Parsing is line-oriented: the lexer's `Newline` tokens delimit
//! statements, and each statement is either a device line (`R R1 in out`),
//! or a dot-directive (`.circuit`, `.voltage`, `.result`). Errors are
//! accumulated through the diagnostics handler so a broken netlist reports
//! every problem at once; the parser keeps going past a bad line.

use std::collections::BTreeMap;
use std::sync::Arc;

use miden_diagnostics::{CodeMap, Diagnostic, DiagnosticsHandler, Severity, SourceSpan, ToDiagnostic};

use crate::ast::*;
use crate::lexer::{Lexer, LexicalError, Token};
use crate::sema;

#[cfg(test)]
mod tests;

/// Errors which can occur while parsing a netlist.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("error reading netlist: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Lexer(#[from] LexicalError),
    #[error(transparent)]
    SemanticAnalysis(#[from] sema::SemanticAnalysisError),
    #[error("parsing failed, see diagnostics for more information")]
    Failed,
}
impl ToDiagnostic for ParseError {
    fn to_diagnostic(self) -> Diagnostic {
        match self {
            Self::Lexer(err) => err.to_diagnostic(),
            err => Diagnostic::error().with_message(err.to_string()),
        }
    }
}

/// Parses a circuit from the given source string.
pub fn parse(
    diagnostics: &DiagnosticsHandler,
    codemap: Arc<CodeMap>,
    source: &str,
) -> Result<Circuit, ParseError> {
    let source_id = codemap.add("nofile", source.to_string());
    let mut tokens = Vec::new();
    for token in Lexer::new(source_id, source) {
        tokens.push(token?);
    }
    Parser::new(diagnostics).parse(&tokens)
}

/// Parses a circuit from the file at `path`.
pub fn parse_file(
    diagnostics: &DiagnosticsHandler,
    codemap: Arc<CodeMap>,
    path: &std::path::Path,
) -> Result<Circuit, ParseError> {
    let source = std::fs::read_to_string(path)?;
    let source_id = codemap.add(path.to_path_buf(), source.clone());
    let mut tokens = Vec::new();
    for token in Lexer::new(source_id, &source) {
        tokens.push(token?);
    }
    Parser::new(diagnostics).parse(&tokens)
}

type SpannedToken = (SourceSpan, Token);

struct Parser<'a> {
    diagnostics: &'a DiagnosticsHandler,
    failed: bool,
    name: Option<Ident>,
    nodes: Vec<Ident>,
    node_index: BTreeMap<String, usize>,
    devices: Vec<Device>,
    voltages: Vec<VoltageDef>,
    results: Vec<ResultRequest>,
    /// Current-controlled devices waiting for their probe name to resolve.
    pending_probes: Vec<(usize, Ident)>,
}

impl<'a> Parser<'a> {
    fn new(diagnostics: &'a DiagnosticsHandler) -> Self {
        Self {
            diagnostics,
            failed: false,
            name: None,
            nodes: vec![],
            node_index: BTreeMap::new(),
            devices: vec![],
            voltages: vec![],
            results: vec![],
            pending_probes: vec![],
        }
    }

    fn parse(mut self, tokens: &[SpannedToken]) -> Result<Circuit, ParseError> {
        for line in tokens.split(|(_, t)| *t == Token::Newline) {
            if line.is_empty() {
                continue;
            }
            self.parse_line(line);
        }
        self.resolve_probes();

        let mut circuit = Circuit::new(
            self.name
                .take()
                .unwrap_or_else(|| Ident::new(SourceSpan::UNKNOWN, "circuit")),
        );
        circuit.nodes = self.nodes;
        circuit.devices = self.devices;
        circuit.voltages = self.voltages;
        circuit.results = self.results;

        if self.failed {
            return Err(ParseError::Failed);
        }
        sema::SemanticAnalysis::new(self.diagnostics).run(&circuit)?;
        Ok(circuit)
    }

    fn error(&mut self, span: SourceSpan, message: impl ToString) {
        self.failed = true;
        self.diagnostics
            .diagnostic(Severity::Error)
            .with_message(message.to_string())
            .with_primary_label(span, "here")
            .emit();
    }

    fn parse_line(&mut self, line: &[SpannedToken]) {
        match &line[0] {
            (span, Token::Directive(name)) => match name.as_str() {
                "circuit" => self.parse_circuit_directive(*span, &line[1..]),
                "voltage" => self.parse_voltage(*span, &line[1..]),
                "result" => self.parse_result(*span, &line[1..]),
                other => self.error(*span, format!("unknown directive '.{other}'")),
            },
            (span, Token::Ident(mnemonic)) => match DeviceKind::from_mnemonic(mnemonic) {
                Some(kind) => self.parse_device(kind, &line[1..]),
                None => self.error(*span, format!("unknown device type '{mnemonic}'")),
            },
            (span, token) => {
                self.error(*span, format!("expected a device type or directive, found {token}"))
            }
        }
    }

    /// Takes the next token as an identifier, or reports an error.
    fn expect_ident(&mut self, line: &[SpannedToken], at: &mut usize, what: &str) -> Option<Ident> {
        match line.get(*at) {
            Some((span, Token::Ident(name))) => {
                *at += 1;
                Some(Ident::new(*span, name.as_str()))
            }
            Some((span, token)) => {
                self.error(*span, format!("expected {what}, found {token}"));
                None
            }
            None => {
                let span = line.last().map(|(s, _)| *s).unwrap_or(SourceSpan::UNKNOWN);
                self.error(span, format!("expected {what} before end of line"));
                None
            }
        }
    }

    fn expect_end(&mut self, line: &[SpannedToken], at: usize) {
        if let Some((span, token)) = line.get(at) {
            self.error(*span, format!("unexpected {token} at end of statement"));
        }
    }

    /// Interns a node name, returning its id.
    fn node_id(&mut self, ident: &Ident) -> NodeId {
        if let Some(&idx) = self.node_index.get(ident.as_str()) {
            return NodeId::from(idx);
        }
        let idx = self.nodes.len();
        self.node_index.insert(ident.as_str().to_string(), idx);
        self.nodes.push(ident.clone());
        NodeId::from(idx)
    }

    fn parse_circuit_directive(&mut self, span: SourceSpan, rest: &[SpannedToken]) {
        let mut at = 0;
        let Some(name) = self.expect_ident(rest, &mut at, "a circuit name") else {
            return;
        };
        self.expect_end(rest, at);
        if self.name.is_some() {
            self.error(span, "duplicate '.circuit' directive");
            return;
        }
        self.name = Some(name);
    }

    fn parse_device(&mut self, kind: DeviceKind, rest: &[SpannedToken]) {
        let mut at = 0;
        let Some(name) = self.expect_ident(rest, &mut at, "a device name") else {
            return;
        };

        let mut nodes = Vec::with_capacity(kind.num_terminals());
        for _ in 0..kind.num_terminals() {
            let Some(node) = self.expect_ident(rest, &mut at, "a node name") else {
                return;
            };
            nodes.push(self.node_id(&node));
        }

        let mut probe_name = None;
        if kind.is_current_controlled() {
            let Some(probe) = self.expect_ident(rest, &mut at, "a current probe name") else {
                return;
            };
            probe_name = Some(probe);
        }

        let mut value = None;
        if let Some((_, Token::Value(v))) = rest.get(at) {
            at += 1;
            value = Some(v.clone());
        }
        self.expect_end(rest, at);

        let index = self.devices.len();
        self.devices.push(Device {
            span: name.span,
            kind,
            name,
            nodes,
            probe: None,
            value,
        });
        if let Some(probe) = probe_name {
            self.pending_probes.push((index, probe));
        }
    }

    fn parse_voltage(&mut self, _span: SourceSpan, rest: &[SpannedToken]) {
        let mut at = 0;
        let Some(name) = self.expect_ident(rest, &mut at, "a voltage name") else {
            return;
        };
        let Some(plus) = self.expect_ident(rest, &mut at, "the positive node name") else {
            return;
        };
        let Some(minus) = self.expect_ident(rest, &mut at, "the negative node name") else {
            return;
        };
        self.expect_end(rest, at);

        let plus = self.node_id(&plus);
        let minus = self.node_id(&minus);
        self.voltages.push(VoltageDef {
            span: name.span,
            name,
            plus,
            minus,
        });
    }

    fn parse_result(&mut self, span: SourceSpan, rest: &[SpannedToken]) {
        let mut at = 0;
        let Some(name) = self.expect_ident(rest, &mut at, "a result name") else {
            return;
        };

        // A slash anywhere in the statement selects the Bode form.
        if rest.iter().any(|(_, t)| *t == Token::Slash) {
            let Some(dependent) = self.expect_ident(rest, &mut at, "a dependent quantity name")
            else {
                return;
            };
            match rest.get(at) {
                Some((_, Token::Slash)) => at += 1,
                Some((span, token)) => {
                    self.error(*span, format!("expected '/', found {token}"));
                    return;
                }
                None => unreachable!("slash was found above"),
            }
            let Some(independent) = self.expect_ident(rest, &mut at, "an independent source name")
            else {
                return;
            };
            let mut plot = None;
            if let Some((kw_span, Token::Ident(kw))) = rest.get(at) {
                if kw == "plot" {
                    at += 1;
                    match rest.get(at) {
                        Some((_, Token::Str(s))) => {
                            at += 1;
                            plot = Some(s.clone());
                        }
                        _ => {
                            self.error(*kw_span, "expected a quoted string after 'plot'");
                            return;
                        }
                    }
                }
            }
            self.expect_end(rest, at);
            self.results.push(ResultRequest::Bode(BodeResult {
                span: name.span,
                name,
                dependent,
                independent,
                plot,
            }));
            return;
        }

        let mut dependents = Vec::new();
        while let Some((_, Token::Ident(_))) = rest.get(at) {
            // expect_ident cannot fail here
            dependents.push(self.expect_ident(rest, &mut at, "a quantity name").unwrap());
        }
        self.expect_end(rest, at);
        if dependents.is_empty() {
            self.error(span, format!("result '{name}' names no dependent quantities"));
            return;
        }
        self.results.push(ResultRequest::Full(FullResult {
            span: name.span,
            name,
            dependents,
        }));
    }

    /// Resolves the controlling-probe references recorded while parsing
    /// current-controlled sources. The probe may be declared after its user,
    /// so resolution runs once the whole netlist is read.
    fn resolve_probes(&mut self) {
        let pending = core::mem::take(&mut self.pending_probes);
        for (device, probe) in pending {
            let found = self
                .devices
                .iter()
                .position(|d| d.name == probe);
            match found {
                Some(idx) if self.devices[idx].kind == DeviceKind::CurrentProbe => {
                    self.devices[device].probe = Some(DeviceId::from(idx));
                }
                Some(idx) => {
                    let kind = self.devices[idx].kind;
                    self.error(
                        probe.span,
                        format!(
                            "device '{probe}' controls '{}' but is a {kind}, not a current probe",
                            self.devices[device].name
                        ),
                    );
                }
                None => {
                    self.error(
                        probe.span,
                        format!("no current probe named '{probe}' in this netlist"),
                    );
                }
            }
        }
    }
}
