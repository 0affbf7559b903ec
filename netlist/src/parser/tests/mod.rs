use std::sync::Arc;

use miden_diagnostics::term::termcolor::ColorChoice;
use miden_diagnostics::{CodeMap, DefaultEmitter, DiagnosticsHandler, SourceSpan};
use pretty_assertions::assert_eq;

use crate::ast::*;
use crate::parser::{parse, ParseError};


/// A test harness around [parse] with its own codemap and diagnostics.
struct ParseTest {
    codemap: Arc<CodeMap>,
    diagnostics: DiagnosticsHandler,
}
impl ParseTest {
    fn new() -> Self {
        let codemap = Arc::new(CodeMap::new());
        let emitter = Arc::new(DefaultEmitter::new(ColorChoice::Auto));
        let diagnostics = DiagnosticsHandler::new(Default::default(), codemap.clone(), emitter);
        Self { codemap, diagnostics }
    }

    fn parse(&self, source: &str) -> Result<Circuit, ParseError> {
        parse(&self.diagnostics, self.codemap.clone(), source)
    }

    fn expect_circuit(&self, source: &str, expected: Circuit) {
        match self.parse(source) {
            Ok(circuit) => assert_eq!(circuit, expected),
            Err(err) => panic!("expected a valid circuit, got {err:?}"),
        }
    }

    fn expect_failure(&self, source: &str) {
        if let Ok(circuit) = self.parse(source) {
            panic!("expected parsing to fail, got {circuit:?}");
        }
    }
}

fn ident(name: &str) -> Ident {
    Ident::new(SourceSpan::UNKNOWN, name)
}

fn device(kind: DeviceKind, name: &str, nodes: &[usize]) -> Device {
    Device {
        span: SourceSpan::UNKNOWN,
        kind,
        name: ident(name),
        nodes: nodes.iter().copied().map(NodeId::from).collect(),
        probe: None,
        value: None,
    }
}
