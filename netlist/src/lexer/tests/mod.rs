use std::sync::Arc;

use miden_diagnostics::CodeMap;

use crate::lexer::{Lexer, LexicalError, Token};


/// Tokenizes `source` and asserts the token stream matches `expected`,
/// ignoring spans.
fn expect_valid_tokenization(source: &str, expected: Vec<Token>) {
    let codemap = Arc::new(CodeMap::new());
    let source_id = codemap.add("test", source.to_string());
    let tokens: Vec<Token> = Lexer::new(source_id, source)
        .map(|res| res.expect("unexpected lexical error").1)
        .collect();
    assert_eq!(tokens, expected);
}

/// Tokenizes `source` and asserts that lexing fails with an error for which
/// `matches` returns true.
fn expect_lexical_error(source: &str, matches: impl Fn(&LexicalError) -> bool) {
    let codemap = Arc::new(CodeMap::new());
    let source_id = codemap.add("test", source.to_string());
    let err = Lexer::new(source_id, source)
        .find_map(Result::err)
        .expect("expected a lexical error");
    assert!(matches(&err), "unexpected error: {err:?}");
}

fn ident(name: &str) -> Token {
    Token::Ident(name.to_string())
}
