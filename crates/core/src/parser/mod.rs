//! Recursive-descent parser for Vero scripts.
//!
//! The parser backs live editor diagnostics, so it never gives up on a file:
//! [`Parser::consume`] records a mismatch and hands back a synthetic token,
//! and hard failures inside a statement, a feature member or a declaration
//! are caught at that level and followed by panic-mode synchronization.
//! [`parse`] therefore always returns a [`Program`] -- possibly incomplete --
//! together with every error collected along the way.

use crate::ast::Program;
use crate::error::ParseError;
use crate::lexer::{self, Token, TokenKind};

mod data;
mod declarations;
mod expressions;
mod statements;
mod utility;

type PResult<T> = Result<T, ParseError>;

/// Default maximum number of errors collected before parsing stops.
pub const DEFAULT_MAX_ERRORS: usize = 100;

/// Deepest allowed nesting of parenthesized or negated conditions and
/// FOR EACH bodies. Anything deeper is reported instead of recursed into.
pub const MAX_NESTING_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub max_errors: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_errors: DEFAULT_MAX_ERRORS,
        }
    }
}

/// Output of a parse. Callers must not assume `program` is complete when
/// `errors` is non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub program: Program,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a token stream with default options.
pub fn parse(tokens: &[Token]) -> ParseResult {
    parse_with_options(tokens, ParseOptions::default())
}

pub fn parse_with_options(tokens: &[Token], options: ParseOptions) -> ParseResult {
    let mut p = Parser::new(tokens, options.max_errors);
    let program = p.parse_program();
    tracing::debug!(
        pages = program.pages.len(),
        features = program.features.len(),
        fixtures = program.fixtures.len(),
        errors = p.errors.len(),
        "parsed program"
    );
    ParseResult {
        program,
        errors: p.errors,
    }
}

/// Tokenize and parse source text.
pub fn parse_source(src: &str) -> ParseResult {
    parse(&lexer::tokenize(src))
}

pub fn parse_source_with_options(src: &str, options: ParseOptions) -> ParseResult {
    parse_with_options(&lexer::tokenize(src), options)
}

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
    max_errors: usize,
    depth: usize,
}

impl Parser {
    /// Comments are dropped here; lexer error tokens are reported with their
    /// own message and removed so the grammar never has to consider them.
    fn new(input: &[Token], max_errors: usize) -> Self {
        let mut errors = Vec::new();
        let mut tokens = Vec::with_capacity(input.len() + 1);
        for t in input {
            match t.kind {
                TokenKind::Comment => {}
                TokenKind::Error => {
                    if errors.len() < max_errors {
                        errors.push(ParseError::new(t.value.clone(), t.line, t.column));
                    }
                }
                _ => tokens.push(t.clone()),
            }
        }
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let (line, column) = input.last().map(|t| (t.line, t.column)).unwrap_or((1, 1));
            tokens.push(Token::new(TokenKind::Eof, "", line, column));
        }
        Parser {
            tokens,
            pos: 0,
            errors,
            max_errors,
            depth: 0,
        }
    }

    // -- Cursor ----------------------------------------------------

    fn cur(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.cur().kind
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        let i = (self.pos + offset).min(self.tokens.len() - 1);
        self.tokens[i].kind
    }

    fn cur_line(&self) -> u32 {
        self.cur().line
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let t = self.cur().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    /// Advance past `kind` if it is next.
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    // -- Errors ----------------------------------------------------

    /// Consume `kind` or record `message` and return a synthetic token of
    /// that kind positioned at the current token, without advancing.
    fn consume(&mut self, kind: TokenKind, message: &str) -> Token {
        if self.check(kind) {
            return self.advance();
        }
        let err = self.fail(message);
        self.record(err);
        let cur = self.cur();
        Token::new(kind, "", cur.line, cur.column)
    }

    fn consume_identifier(&mut self, message: &str) -> String {
        self.consume(TokenKind::Identifier, message).value
    }

    /// Build an error at the current token: "<message>, found <token>".
    fn fail(&self, message: &str) -> ParseError {
        let cur = self.cur();
        ParseError::new(
            format!("{}, found {}", message, describe(cur)),
            cur.line,
            cur.column,
        )
    }

    fn record(&mut self, err: ParseError) {
        if self.errors.len() < self.max_errors {
            self.errors.push(err);
        }
    }

    /// Run `f` one nesting level deeper, failing at the current token once
    /// [`MAX_NESTING_DEPTH`] is reached.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.fail(&format!(
                "Nesting deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn error_limit_reached(&self) -> bool {
        self.errors.len() >= self.max_errors
    }

    // -- Top level -------------------------------------------------

    fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        let mut in_stray_run = false;

        while !self.is_at_end() && !self.error_limit_reached() {
            let outcome = match self.peek_kind() {
                TokenKind::Page => self.parse_page().map(|p| program.pages.push(p)),
                TokenKind::Feature | TokenKind::Annotation => {
                    self.parse_feature().map(|f| program.features.push(f))
                }
                TokenKind::Fixture => self.parse_fixture().map(|f| program.fixtures.push(f)),
                _ => {
                    if !in_stray_run {
                        let err = self.fail("Expected PAGE, FEATURE or FIXTURE");
                        self.record(err);
                    }
                    in_stray_run = true;
                    self.advance();
                    continue;
                }
            };
            in_stray_run = false;
            if let Err(e) = outcome {
                self.record(e);
                self.synchronize();
            }
        }

        program
    }

    /// Panic-mode recovery after a failed declaration: skip to the next
    /// declaration keyword, or past the closing brace of the broken one.
    fn synchronize(&mut self) {
        let mut depth: usize = 0;
        loop {
            match self.peek_kind() {
                TokenKind::Eof | TokenKind::Page | TokenKind::Feature | TokenKind::Fixture => {
                    return
                }
                TokenKind::Annotation if self.annotations_lead_to_feature() => return,
                TokenKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    self.advance();
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn annotations_lead_to_feature(&self) -> bool {
        let mut i = 0;
        while self.peek_kind_at(i) == TokenKind::Annotation {
            i += 1;
        }
        self.peek_kind_at(i) == TokenKind::Feature
    }

    /// Recovery inside a brace-delimited body: skip to the first token on a
    /// later line than `from_line` that `starts` accepts, to the body's
    /// closing brace, or to a declaration boundary. Nested braces are skipped
    /// whole.
    fn recover_in_block(&mut self, from_line: u32, starts: fn(TokenKind) -> bool) {
        let mut depth: usize = 0;
        loop {
            let kind = self.peek_kind();
            match kind {
                TokenKind::Eof => return,
                k if is_boundary(k) => return,
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                k if depth == 0 && self.cur_line() > from_line && starts(k) => return,
                _ => {}
            }
            self.advance();
        }
    }
}

/// Tokens that can only begin a declaration or scenario; every body loop
/// stops at them so a missing `}` costs one error instead of the rest of
/// the file.
fn is_boundary(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Page
            | TokenKind::Feature
            | TokenKind::Fixture
            | TokenKind::Scenario
            | TokenKind::Annotation
    )
}

fn describe(t: &Token) -> String {
    match t.kind {
        TokenKind::Identifier => format!("identifier '{}'", t.value),
        TokenKind::String => format!("string \"{}\"", t.value),
        TokenKind::Number => format!("number {}", t.value),
        TokenKind::Boolean => format!("boolean {}", t.value),
        TokenKind::Annotation | TokenKind::Tag => format!("'@{}'", t.value),
        TokenKind::EnvVar => format!("'{{{{{}}}}}'", t.value),
        TokenKind::Eof => "end of input".to_owned(),
        k if k.is_keyword() => format!("'{}'", t.value),
        k => k.describe().to_owned(),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;

    #[test]
    fn empty_input_parses_to_empty_program() {
        let result = parse_source("");
        assert!(result.program.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn comments_only_is_empty() {
        let result = parse_source("// nothing here\n/* or here */\n");
        assert!(result.program.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn missing_page_name_reports_once_at_brace() {
        let result = parse_source("PAGE { }");
        assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
        assert_eq!(result.errors[0].line, 1);
        assert_eq!(result.errors[0].column, 6);
        assert_eq!(result.program.pages.len(), 1);
        assert_eq!(result.program.pages[0].name, "");
    }

    #[test]
    fn missing_page_name_does_not_stop_later_declarations() {
        let src = "PAGE { }\nFEATURE Login {\n  SCENARIO \"a\" { REFRESH }\n}\n";
        let result = parse_source(src);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.program.features.len(), 1);
        assert_eq!(result.program.features[0].scenarios.len(), 1);
    }

    #[test]
    fn stray_top_level_run_reports_once() {
        let result = parse_source("foo bar baz\nPAGE P { }");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.starts_with("Expected PAGE, FEATURE or FIXTURE"));
        assert_eq!(result.program.pages.len(), 1);
    }

    #[test]
    fn lexer_errors_surface_as_parse_errors() {
        let result = parse_source("FEATURE F {\n  SCENARIO \"s\" {\n    CLICK $\n  }\n}");
        assert!(result
            .errors
            .iter()
            .any(|e| e.message.contains("unexpected character '$'") && e.line == 3));
        assert_eq!(result.program.features.len(), 1);
    }

    #[test]
    fn bad_statement_recovers_at_next_line() {
        let src = r#"FEATURE F {
  SCENARIO "s" {
    CLICK "a"
    bogus thing here
    CLICK "b"
  }
}"#;
        let result = parse_source(src);
        assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
        let stmts = &result.program.features[0].scenarios[0].statements;
        assert_eq!(stmts.len(), 2);
        assert!(matches!(&stmts[1], Statement::Click(c) if c.line == 5));
    }

    #[test]
    fn missing_close_brace_keeps_next_scenario() {
        let src = r#"FEATURE F {
  SCENARIO "one" {
    REFRESH
  SCENARIO "two" {
    REFRESH
  }
}"#;
        let result = parse_source(src);
        assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
        let names: Vec<_> = result.program.features[0]
            .scenarios
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["one", "two"]);
    }

    #[test]
    fn error_cap_stops_collection() {
        let mut src = String::from("FEATURE F {\n SCENARIO \"s\" {\n");
        for _ in 0..20 {
            src.push_str("  CLICK\n");
        }
        src.push_str(" }\n}\n");
        let result = parse_source_with_options(&src, ParseOptions { max_errors: 5 });
        assert_eq!(result.errors.len(), 5);
    }

    #[test]
    fn annotation_without_feature_synchronizes() {
        let src = "@skip SCENARIO \"x\" { REFRESH }\nPAGE P { }";
        let result = parse_source(src);
        assert!(!result.errors.is_empty());
        assert_eq!(result.program.pages.len(), 1);
        assert!(result.program.features.is_empty());
    }
}
