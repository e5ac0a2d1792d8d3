#![allow(clippy::result_large_err)]
//! vero-core: front end for the Vero test-scripting language.
//!
//! Source text goes through [`lexer::tokenize`] and [`parser::parse`] to a
//! [`Program`] plus any [`ParseError`]s. The parser never stops at the first
//! error; it recovers and keeps going so editors always get a best-effort AST.
//!
//! Independently of the parser, [`SymbolRegistry`] indexes raw text across
//! files for navigation, and [`folding::folding_ranges`] and
//! [`outline::outline`] work on text that may not parse at all.
//!
//! # Public API
//!
//! - [`parse_source()`] -- tokenize and parse in one call
//! - [`SymbolRegistry`] -- cross-file definitions and references
//! - [`ScriptListener`] / [`walk()`] -- enter/exit callbacks per production
//! - AST types: [`Program`], [`Page`], [`Feature`], [`Scenario`],
//!   [`Fixture`], [`Statement`]

pub mod ast;
pub mod error;
pub mod folding;
pub mod lexer;
pub mod listener;
pub mod outline;
pub mod parser;
pub mod registry;

mod scan;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{Feature, Fixture, Page, Program, Scenario, Selector, Statement};
pub use error::ParseError;
pub use lexer::{Token, TokenKind};
pub use listener::{walk, ScriptListener};
pub use registry::{SymbolKind, SymbolLocation, SymbolRegistry};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use folding::folding_ranges;
pub use lexer::tokenize;
pub use outline::outline;
pub use parser::{parse, parse_source, ParseOptions, ParseResult};
