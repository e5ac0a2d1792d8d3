//! Semantic token provider.
//!
//! Token positions come from the lexer. Identifiers get their meaning from a
//! [`ScriptListener`] pass over the best-effort AST (pages, fields, actions,
//! variables declared in this file) plus the workspace registry for pages
//! declared elsewhere. Works on incomplete files: whatever the parser
//! recovered is used.

use lsp_types::{SemanticToken, SemanticTokenModifier, SemanticTokenType};
use std::collections::HashSet;
use vero_core::ast::*;
use vero_core::lexer::{self, Token, TokenKind};
use vero_core::{ScriptListener, SymbolRegistry};

use crate::position::utf16_len;

/// Index into TOKEN_TYPES for each semantic category.
const TK_KEYWORD: u32 = 0;
const TK_TYPE: u32 = 1;
const TK_VARIABLE: u32 = 2;
const TK_PROPERTY: u32 = 3;
const TK_FUNCTION: u32 = 4;
const TK_CLASS: u32 = 5;
const TK_NAMESPACE: u32 = 6;
const TK_STRING: u32 = 7;
const TK_NUMBER: u32 = 8;
const TK_COMMENT: u32 = 9;
const TK_DECORATOR: u32 = 10;
const TK_PARAMETER: u32 = 11;

/// Semantic token types registered with the client.
pub static TOKEN_TYPES: &[SemanticTokenType] = &[
    SemanticTokenType::KEYWORD,   // 0
    SemanticTokenType::TYPE,      // 1
    SemanticTokenType::VARIABLE,  // 2
    SemanticTokenType::PROPERTY,  // 3
    SemanticTokenType::FUNCTION,  // 4
    SemanticTokenType::CLASS,     // 5
    SemanticTokenType::NAMESPACE, // 6
    SemanticTokenType::STRING,    // 7
    SemanticTokenType::NUMBER,    // 8
    SemanticTokenType::COMMENT,   // 9
    SemanticTokenType::DECORATOR, // 10
    SemanticTokenType::PARAMETER, // 11
];

/// Semantic token modifiers.
pub static TOKEN_MODIFIERS: &[SemanticTokenModifier] = &[
    SemanticTokenModifier::DECLARATION, // bit 0
    SemanticTokenModifier::READONLY,    // bit 1
];

const MOD_DECLARATION: u32 = 1 << 0;
const MOD_READONLY: u32 = 1 << 1;

/// A raw token with absolute position before delta-encoding.
struct RawSemanticToken {
    line: u32,
    col: u32,
    length: u32,
    token_type: u32,
    modifiers: u32,
}

/// Names this file declares or refers to, by role.
#[derive(Default)]
struct NameCollector {
    pages: HashSet<String>,
    fields: HashSet<String>,
    actions: HashSet<String>,
    namespaces: HashSet<String>,
    variables: HashSet<String>,
    parameters: HashSet<String>,
    /// (1-based line, name) of each declaration site.
    declarations: HashSet<(u32, String)>,
}

impl NameCollector {
    fn declare(&mut self, line: u32, name: &str) {
        self.declarations.insert((line, name.to_owned()));
    }

    fn variable(&mut self, line: u32, name: &str) {
        self.variables.insert(name.to_owned());
        self.declare(line, name);
    }
}

impl ScriptListener for NameCollector {
    fn enter_page_declaration(&mut self, p: &Page) {
        self.pages.insert(p.name.clone());
        self.declare(p.line, &p.name);
    }

    fn enter_field_declaration(&mut self, f: &Field) {
        self.fields.insert(f.name.clone());
        self.declare(f.line, &f.name);
    }

    fn enter_variable_declaration(&mut self, v: &Variable) {
        self.variable(v.line, &v.name);
    }

    fn enter_action_declaration(&mut self, a: &ActionDefinition) {
        self.actions.insert(a.name.clone());
        self.declare(a.line, &a.name);
        self.parameters.extend(a.parameters.iter().cloned());
    }

    fn enter_feature_declaration(&mut self, f: &Feature) {
        self.namespaces.insert(f.name.clone());
        self.declare(f.line, &f.name);
    }

    fn enter_use_statement(&mut self, u: &UseStatement) {
        self.pages.insert(u.page_name.clone());
    }

    fn enter_fixture_use(&mut self, u: &FixtureUse) {
        self.namespaces.insert(u.fixture_name.clone());
    }

    fn enter_fixture_declaration(&mut self, f: &Fixture) {
        self.namespaces.insert(f.name.clone());
        self.declare(f.line, &f.name);
        self.parameters.extend(f.parameters.iter().cloned());
    }

    fn enter_fixture_option(&mut self, o: &FixtureOption) {
        self.parameters.insert(o.name.clone());
    }

    fn enter_perform_statement(&mut self, s: &PerformStatement) {
        self.actions.insert(s.action.clone());
        if let Some(page) = &s.page {
            self.pages.insert(page.clone());
        }
    }

    fn enter_for_each_statement(&mut self, s: &ForEachStatement) {
        self.variable(s.line, &s.item);
    }

    fn enter_load_statement(&mut self, s: &LoadStatement) {
        self.variable(s.line, &s.variable);
    }

    fn enter_row_statement(&mut self, s: &RowStatement) {
        self.variable(s.line, &s.variable);
    }

    fn enter_rows_statement(&mut self, s: &RowsStatement) {
        self.variable(s.line, &s.variable);
    }

    fn enter_count_statement(&mut self, s: &CountStatement) {
        self.variable(s.line, &s.variable);
    }

    fn enter_column_access_statement(&mut self, s: &ColumnAccessStatement) {
        self.variable(s.line, &s.variable);
        self.fields.insert(s.column.clone());
    }

    fn enter_utility_assignment_statement(&mut self, s: &UtilityAssignmentStatement) {
        self.variable(s.line, &s.variable);
    }

    fn enter_variable_declaration_statement(&mut self, s: &VariableDeclarationStatement) {
        self.variable(s.line, &s.name);
    }

    fn enter_target(&mut self, t: &Target) {
        if let Target::Field { page: Some(page), .. } = t {
            self.pages.insert(page.clone());
        }
    }

    fn enter_data_condition(&mut self, c: &DataCondition) {
        if let DataCondition::Comparison { column, .. } = c {
            self.fields.insert(column.clone());
        }
    }

    fn enter_order_by(&mut self, o: &OrderBy) {
        self.fields.insert(o.column.clone());
    }
}

/// Compute delta-encoded semantic tokens for `content`.
pub fn compute_semantic_tokens(content: &str, registry: Option<&SymbolRegistry>) -> Vec<SemanticToken> {
    let tokens = lexer::tokenize(content);
    let result = vero_core::parser::parse(&tokens);

    let mut names = NameCollector::default();
    vero_core::walk(&result.program, &mut names);
    if let Some(registry) = registry {
        names.pages.extend(registry.pages().iter().map(|p| p.name.clone()));
    }

    let lines: Vec<Vec<char>> = content.lines().map(|l| l.chars().collect()).collect();
    let significant: Vec<&Token> = tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Comment)
        .collect();

    let mut raw_tokens = Vec::new();
    for (i, tok) in significant.iter().enumerate() {
        let prev = i.checked_sub(1).map(|j| significant[j].kind);
        let next = significant.get(i + 1).map(|t| t.kind);
        if let Some((token_type, modifiers)) = classify_token(tok, prev, next, &names) {
            push_token(&mut raw_tokens, &lines, tok, token_type, modifiers);
        }
    }
    for tok in tokens.iter().filter(|t| t.kind == TokenKind::Comment) {
        push_token(&mut raw_tokens, &lines, tok, TK_COMMENT, 0);
    }

    raw_tokens.sort_by(|a, b| a.line.cmp(&b.line).then(a.col.cmp(&b.col)));
    delta_encode(&raw_tokens)
}

fn push_token(
    out: &mut Vec<RawSemanticToken>,
    lines: &[Vec<char>],
    tok: &Token,
    token_type: u32,
    modifiers: u32,
) {
    let line = tok.line.saturating_sub(1);
    let col = tok.column.saturating_sub(1);
    let Some(chars) = lines.get(line as usize) else {
        return;
    };
    let length = source_len(chars, col as usize, tok);
    if length > 0 {
        out.push(RawSemanticToken {
            line,
            col: utf16_len(chars, 0, col as usize),
            length: utf16_len(chars, col as usize, length as usize),
            token_type,
            modifiers,
        });
    }
}

/// Width of the token's source text on its first line.
fn source_len(chars: &[char], col: usize, tok: &Token) -> u32 {
    let rest = chars.len().saturating_sub(col);
    let len = match tok.kind {
        TokenKind::String => {
            let quote = chars.get(col).copied().unwrap_or('"');
            let mut i = col + 1;
            loop {
                match chars.get(i) {
                    None => break i - col,
                    Some('\\') => i += 2,
                    Some(&c) if c == quote => break i + 1 - col,
                    Some(_) => i += 1,
                }
            }
        }
        TokenKind::Annotation | TokenKind::Tag => tok.value.chars().count() + 1,
        TokenKind::EnvVar => tok.value.chars().count() + 4,
        TokenKind::Comment => tok.value.lines().next().map_or(0, |l| l.chars().count()),
        _ => tok.value.chars().count(),
    };
    len.min(rest) as u32
}

fn classify_token(
    tok: &Token,
    prev: Option<TokenKind>,
    next: Option<TokenKind>,
    names: &NameCollector,
) -> Option<(u32, u32)> {
    match tok.kind {
        TokenKind::String => Some((TK_STRING, 0)),
        TokenKind::Number => Some((TK_NUMBER, 0)),
        TokenKind::Boolean => Some((TK_KEYWORD, 0)),
        TokenKind::Annotation | TokenKind::Tag => Some((TK_DECORATOR, 0)),
        TokenKind::EnvVar => Some((TK_VARIABLE, MOD_READONLY)),
        TokenKind::Text | TokenKind::NumberType | TokenKind::Flag | TokenKind::List
            if next == Some(TokenKind::Identifier) =>
        {
            Some((TK_TYPE, 0))
        }
        TokenKind::Identifier => Some(classify_identifier(tok, prev, names)),
        k if k.is_keyword() => Some((TK_KEYWORD, 0)),
        _ => None,
    }
}

fn classify_identifier(tok: &Token, prev: Option<TokenKind>, names: &NameCollector) -> (u32, u32) {
    let name = tok.value.as_str();
    let modifiers = if names.declarations.contains(&(tok.line, tok.value.clone())) {
        MOD_DECLARATION
    } else {
        0
    };

    // member after `Page.`
    if prev == Some(TokenKind::Dot) {
        let tt = if names.actions.contains(name) {
            TK_FUNCTION
        } else {
            TK_PROPERTY
        };
        return (tt, modifiers);
    }

    let tt = if names.parameters.contains(name) {
        TK_PARAMETER
    } else if names.variables.contains(name) {
        TK_VARIABLE
    } else if names.pages.contains(name) {
        TK_CLASS
    } else if names.actions.contains(name) {
        TK_FUNCTION
    } else if names.namespaces.contains(name) {
        TK_NAMESPACE
    } else if names.fields.contains(name) {
        TK_PROPERTY
    } else {
        TK_VARIABLE
    };
    (tt, modifiers)
}

fn delta_encode(raw: &[RawSemanticToken]) -> Vec<SemanticToken> {
    let mut result = Vec::with_capacity(raw.len());
    let mut prev_line: u32 = 0;
    let mut prev_col: u32 = 0;

    for tok in raw {
        let delta_line = tok.line - prev_line;
        let delta_start = if delta_line == 0 {
            tok.col - prev_col
        } else {
            tok.col
        };

        result.push(SemanticToken {
            delta_line,
            delta_start,
            length: tok.length,
            token_type: tok.token_type,
            token_modifiers_bitset: tok.modifiers,
        });

        prev_line = tok.line;
        prev_col = tok.col;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Undo delta encoding: (line, col, len, type, mods).
    fn absolute(tokens: &[SemanticToken]) -> Vec<(u32, u32, u32, u32, u32)> {
        let (mut line, mut col) = (0, 0);
        tokens
            .iter()
            .map(|t| {
                if t.delta_line > 0 {
                    col = 0;
                }
                line += t.delta_line;
                col += t.delta_start;
                (line, col, t.length, t.token_type, t.token_modifiers_bitset)
            })
            .collect()
    }

    #[test]
    fn classifies_declarations_and_references() {
        let src = "PAGE Login {\n  FIELD email = \"Email\"\n  go WITH who {\n    FILL email WITH who\n  }\n}\n";
        let toks = absolute(&compute_semantic_tokens(src, None));

        assert!(toks.contains(&(0, 0, 4, TK_KEYWORD, 0)));
        assert!(toks.contains(&(0, 5, 5, TK_CLASS, MOD_DECLARATION)));
        assert!(toks.contains(&(1, 8, 5, TK_PROPERTY, MOD_DECLARATION)));
        assert!(toks.contains(&(1, 16, 7, TK_STRING, 0)));
        assert!(toks.contains(&(2, 2, 2, TK_FUNCTION, MOD_DECLARATION)));
        assert!(toks.contains(&(3, 9, 5, TK_PROPERTY, 0)));
        assert!(toks.contains(&(3, 20, 3, TK_PARAMETER, 0)));
    }

    #[test]
    fn comments_annotations_and_env_vars() {
        let src = "// hi\n@skip FEATURE F {\n  SCENARIO s @smoke {\n    OPEN {{BASE_URL}}\n  }\n}\n";
        let toks = absolute(&compute_semantic_tokens(src, None));
        assert!(toks.contains(&(0, 0, 5, TK_COMMENT, 0)));
        assert!(toks.contains(&(1, 0, 5, TK_DECORATOR, 0)));
        assert!(toks.contains(&(2, 13, 6, TK_DECORATOR, 0)));
        assert!(toks.contains(&(3, 9, 12, TK_VARIABLE, MOD_READONLY)));
    }

    #[test]
    fn member_after_dot_uses_registry_pages() {
        let mut registry = SymbolRegistry::new();
        registry.index_file("/p.vero", "PAGE Cart {\n  FIELD total = \"Total\"\n}\n");
        let src = "FEATURE F {\n  SCENARIO s {\n    CLICK Cart.total\n  }\n}\n";
        let toks = absolute(&compute_semantic_tokens(src, Some(&registry)));
        assert!(toks.contains(&(2, 10, 4, TK_CLASS, 0)));
        assert!(toks.contains(&(2, 15, 5, TK_PROPERTY, 0)));
    }

    #[test]
    fn columns_and_lengths_are_utf16() {
        let src = "FEATURE F {\n  SCENARIO s {\n    LOG \"🎉\" \n    LOG \"a🎉\"\n  }\n}\n";
        let toks = absolute(&compute_semantic_tokens(src, None));
        assert!(toks.contains(&(2, 8, 4, TK_STRING, 0)));
        assert!(toks.contains(&(3, 8, 5, TK_STRING, 0)));
    }

    #[test]
    fn broken_input_still_yields_tokens() {
        let toks = compute_semantic_tokens("PAGE {\n  FIELD = \n", None);
        assert!(!toks.is_empty());
    }
}
