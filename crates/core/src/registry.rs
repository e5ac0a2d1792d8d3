//! Workspace symbol registry.
//!
//! The registry scans raw script text line by line with case-insensitive,
//! line-anchored regexes instead of going through the parser, so it keeps
//! working on files that do not parse. Brace depth (outside strings and
//! comments) decides which page owns a field or action and where actions and
//! features end.
//!
//! All lines and columns are 1-based.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lexer::TokenKind;
use crate::scan::{char_column, scan_line, LineScan};

static PAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*page\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());
static FEATURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*(?:@\w+\s+)*feature\s+(?:"([^"]*)"|([A-Za-z_][A-Za-z0-9_]*))"#).unwrap()
});
static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*field\s+([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*?)\s*$").unwrap()
});
static ACTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*([A-Za-z_][A-Za-z0-9_]*)(?:\s+with\s+([A-Za-z_]\w*(?:\s*,\s*[A-Za-z_]\w*)*))?(?:\s+returns\s+\w+)?\s*\{",
    )
    .unwrap()
});
static SCENARIO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*(?:@\w+\s+)*scenario\s+(?:"([^"]*)"|([A-Za-z_][A-Za-z0-9_]*))"#).unwrap()
});
static USE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*use\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());
static DO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bdo\s+([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});
static MEMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)\b").unwrap()
});
static FIXTURE_USE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bwith\s+fixture\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});

// ──────────────────────────────────────────────
// Symbol types
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Page,
    Field,
    Action,
    Feature,
    Fixture,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Page => "page",
            SymbolKind::Field => "field",
            SymbolKind::Action => "action",
            SymbolKind::Feature => "feature",
            SymbolKind::Fixture => "fixture",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolLocation {
    pub file_path: String,
    pub line: u32,
    pub column: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDefinition {
    pub name: String,
    pub fields: Vec<String>,
    pub actions: Vec<String>,
    pub file_path: Option<String>,
    pub line: Option<u32>,
    pub column: u32,
    pub end_line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    /// Selector source text after `=`.
    pub selector: String,
    pub page: String,
    pub line: u32,
    pub column: u32,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    pub name: String,
    pub parameters: Vec<String>,
    pub page: String,
    pub line: u32,
    pub column: u32,
    pub end_line: Option<u32>,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDefinition {
    pub name: String,
    pub scenarios: Vec<String>,
    pub uses: Vec<String>,
    pub line: u32,
    pub column: u32,
    pub end_line: Option<u32>,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolReference {
    /// `Page`, `Page.member` or a fixture name.
    pub symbol_name: String,
    pub symbol_type: SymbolKind,
    pub location: SymbolLocation,
    /// The trimmed source line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// A definition as listed per file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    /// Owning page for fields and actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    pub location: SymbolLocation,
}

impl PageDefinition {
    pub fn location(&self) -> Option<SymbolLocation> {
        Some(SymbolLocation {
            file_path: self.file_path.clone()?,
            line: self.line?,
            column: self.column,
            end_line: self.end_line,
            end_column: Some(self.column + char_len(&self.name)),
        })
    }
}

impl FieldDefinition {
    pub fn location(&self) -> Option<SymbolLocation> {
        Some(SymbolLocation {
            file_path: self.file_path.clone()?,
            line: self.line,
            column: self.column,
            end_line: None,
            end_column: Some(self.column + char_len(&self.name)),
        })
    }
}

impl ActionDefinition {
    pub fn location(&self) -> Option<SymbolLocation> {
        Some(SymbolLocation {
            file_path: self.file_path.clone()?,
            line: self.line,
            column: self.column,
            end_line: self.end_line,
            end_column: Some(self.column + char_len(&self.name)),
        })
    }

    /// `login(user, pass)`
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.parameters.join(", "))
    }
}

impl FeatureDefinition {
    pub fn location(&self) -> Option<SymbolLocation> {
        Some(SymbolLocation {
            file_path: self.file_path.clone()?,
            line: self.line,
            column: self.column,
            end_line: self.end_line,
            end_column: Some(self.column + char_len(&self.name)),
        })
    }
}

// ──────────────────────────────────────────────
// Registry
// ──────────────────────────────────────────────

/// Everything one file contributed. Definitions live here rather than in
/// shared maps, so re-indexing or clearing a file never touches another
/// file's symbols. Members are keyed by qualified name `Page.member`.
#[derive(Debug, Default)]
struct FileSymbols {
    pages: BTreeMap<String, PageDefinition>,
    fields: BTreeMap<String, FieldDefinition>,
    actions: BTreeMap<String, ActionDefinition>,
    features: BTreeMap<String, FeatureDefinition>,
    references: Vec<SymbolReference>,
}

/// Definitions and references across a workspace.
///
/// When several files define the same name, lookups resolve to the file
/// whose path sorts first.
#[derive(Debug, Default)]
pub struct SymbolRegistry {
    files: BTreeMap<String, FileSymbols>,
}

struct OpenBlock {
    key: String,
    base_depth: usize,
    opened: bool,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        SymbolRegistry::default()
    }

    /// Replace everything previously indexed for `path` with the symbols in
    /// `text`.
    pub fn index_file(&mut self, path: &str, text: &str) {
        self.clear_file(path);

        let mut file = FileSymbols::default();
        let mut in_block_comment = false;
        let mut depth: usize = 0;
        let mut page: Option<OpenBlock> = None;
        let mut action: Option<OpenBlock> = None;
        let mut feature: Option<OpenBlock> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx as u32 + 1;
            let scan = scan_line(raw, &mut in_block_comment);
            if scan.is_blank() {
                continue;
            }
            let code = scan.code.as_str();

            // -- definitions ------------------------------------------
            let in_page_body = page
                .as_ref()
                .is_some_and(|p| p.opened && depth == p.base_depth + 1);

            if let Some(c) = PAGE_RE.captures(code) {
                let m = c.get(1).map_or(("", 0), |m| (m.as_str(), m.start()));
                let name = m.0.to_owned();
                file.pages.insert(
                    name.clone(),
                    PageDefinition {
                        name: name.clone(),
                        fields: Vec::new(),
                        actions: Vec::new(),
                        file_path: Some(path.to_owned()),
                        line: Some(line_no),
                        column: char_column(raw, m.1),
                        end_line: None,
                    },
                );
                page = Some(OpenBlock {
                    key: name,
                    base_depth: depth,
                    opened: false,
                });
            } else if let Some(c) = FEATURE_RE.captures(code) {
                if let Some(m) = c.get(1).or_else(|| c.get(2)) {
                    let name = m.as_str().to_owned();
                    file.features.insert(
                        name.clone(),
                        FeatureDefinition {
                            name: name.clone(),
                            scenarios: Vec::new(),
                            uses: Vec::new(),
                            line: line_no,
                            column: char_column(raw, m.start()),
                            end_line: None,
                            file_path: Some(path.to_owned()),
                        },
                    );
                    feature = Some(OpenBlock {
                        key: name,
                        base_depth: depth,
                        opened: false,
                    });
                }
            } else if in_page_body {
                let page_name = page.as_ref().map(|p| p.key.clone()).unwrap_or_default();
                if let Some(c) = FIELD_RE.captures(code) {
                    if let (Some(n), Some(sel)) = (c.get(1), c.get(2)) {
                        file.fields.insert(
                            format!("{}.{}", page_name, n.as_str()),
                            FieldDefinition {
                                name: n.as_str().to_owned(),
                                selector: sel.as_str().to_owned(),
                                page: page_name.clone(),
                                line: line_no,
                                column: char_column(raw, n.start()),
                                file_path: Some(path.to_owned()),
                            },
                        );
                        if let Some(p) = file.pages.get_mut(&page_name) {
                            p.fields.push(n.as_str().to_owned());
                        }
                    }
                } else if let Some(c) = ACTION_RE.captures(code) {
                    let n = c.get(1).map_or("", |m| m.as_str());
                    if TokenKind::keyword(&n.to_ascii_uppercase()).is_none() {
                        let parameters = c
                            .get(2)
                            .map(|m| {
                                m.as_str()
                                    .split(',')
                                    .map(|s| s.trim().to_owned())
                                    .collect::<Vec<_>>()
                            })
                            .unwrap_or_default();
                        let column = c.get(1).map_or(1, |m| char_column(raw, m.start()));
                        let key = format!("{}.{}", page_name, n);
                        file.actions.insert(
                            key.clone(),
                            ActionDefinition {
                                name: n.to_owned(),
                                parameters,
                                page: page_name.clone(),
                                line: line_no,
                                column,
                                end_line: None,
                                file_path: Some(path.to_owned()),
                            },
                        );
                        if let Some(p) = file.pages.get_mut(&page_name) {
                            p.actions.push(n.to_owned());
                        }
                        action = Some(OpenBlock {
                            key,
                            base_depth: depth,
                            opened: false,
                        });
                    }
                }
            }

            if let Some(f) = feature.as_ref().and_then(|o| file.features.get_mut(&o.key)) {
                if let Some(n) = SCENARIO_RE
                    .captures(code)
                    .and_then(|c| c.get(1).or_else(|| c.get(2)))
                {
                    f.scenarios.push(n.as_str().to_owned());
                }
                if let Some(n) = USE_RE.captures(code).and_then(|c| c.get(1)) {
                    f.uses.push(n.as_str().to_owned());
                }
            }

            // -- references -------------------------------------------
            let refs = self.collect_references(path, raw, &scan, line_no, &file.actions);
            file.references.extend(refs);

            // -- braces -----------------------------------------------
            for ch in scan.braces() {
                match ch {
                    '{' => {
                        depth += 1;
                        for block in [&mut page, &mut action, &mut feature].into_iter().flatten() {
                            if depth > block.base_depth {
                                block.opened = true;
                            }
                        }
                    }
                    '}' => {
                        depth = depth.saturating_sub(1);
                        if let Some(key) = close_block(&mut action, depth) {
                            if let Some(a) = file.actions.get_mut(&key) {
                                a.end_line = Some(line_no);
                            }
                        }
                        if let Some(key) = close_block(&mut feature, depth) {
                            if let Some(f) = file.features.get_mut(&key) {
                                f.end_line = Some(line_no);
                            }
                        }
                        if let Some(key) = close_block(&mut page, depth) {
                            if let Some(p) = file.pages.get_mut(&key) {
                                p.end_line = Some(line_no);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        tracing::debug!(
            file = path,
            pages = file.pages.len(),
            fields = file.fields.len(),
            actions = file.actions.len(),
            features = file.features.len(),
            references = file.references.len(),
            "indexed file"
        );
        self.files.insert(path.to_owned(), file);
    }

    /// References on one line. `Page.member` counts as an action when an
    /// action with that qualified name is known here or in `local_actions`.
    fn collect_references(
        &self,
        path: &str,
        raw: &str,
        scan: &LineScan,
        line_no: u32,
        local_actions: &BTreeMap<String, ActionDefinition>,
    ) -> Vec<SymbolReference> {
        let code = scan.code.as_str();
        let context = Some(raw.trim().to_owned());
        let mut references = Vec::new();
        let mut push = |name: String, kind: SymbolKind, start: usize, end: usize| {
            references.push(SymbolReference {
                symbol_name: name,
                symbol_type: kind,
                location: SymbolLocation {
                    file_path: path.to_owned(),
                    line: line_no,
                    column: char_column(raw, start),
                    end_line: Some(line_no),
                    end_column: Some(char_column(raw, end)),
                },
                context: context.clone(),
            });
        };

        if let Some(m) = USE_RE.captures(code).and_then(|c| c.get(1)) {
            push(m.as_str().to_owned(), SymbolKind::Page, m.start(), m.end());
        }

        let mut claimed: Vec<(usize, usize)> = Vec::new();
        for c in DO_RE.captures_iter(code) {
            if let (Some(p), Some(a)) = (c.get(1), c.get(2)) {
                if scan.in_string(p.start()) {
                    continue;
                }
                claimed.push((p.start(), a.end()));
                push(
                    format!("{}.{}", p.as_str(), a.as_str()),
                    SymbolKind::Action,
                    p.start(),
                    a.end(),
                );
            }
        }
        for c in MEMBER_RE.captures_iter(code) {
            let (Some(p), Some(m)) = (c.get(1), c.get(2)) else {
                continue;
            };
            if scan.in_string(p.start()) || claimed.iter().any(|&(s, e)| p.start() >= s && p.start() < e) {
                continue;
            }
            let name = format!("{}.{}", p.as_str(), m.as_str());
            let kind = if local_actions.contains_key(&name) || self.action(&name).is_some() {
                SymbolKind::Action
            } else {
                SymbolKind::Field
            };
            push(name, kind, p.start(), m.end());
        }
        for c in FIXTURE_USE_RE.captures_iter(code) {
            if let Some(m) = c.get(1) {
                if !scan.in_string(m.start()) {
                    push(m.as_str().to_owned(), SymbolKind::Fixture, m.start(), m.end());
                }
            }
        }
        references
    }

    /// Remove every symbol `path` contributed. Definitions of the same
    /// names in other files become visible again.
    pub fn clear_file(&mut self, path: &str) {
        self.files.remove(path);
    }

    pub fn clear(&mut self) {
        *self = SymbolRegistry::default();
    }

    // -- queries ------------------------------------------------------

    /// First definition of `key` in path order.
    fn lookup<'a, T: 'a>(
        &'a self,
        key: &str,
        map: impl Fn(&'a FileSymbols) -> &'a BTreeMap<String, T>,
    ) -> Option<&'a T> {
        self.files.values().find_map(|f| map(f).get(key))
    }

    /// Every defined key once, resolved the same way as [`Self::lookup`].
    fn resolved<'a, T: 'a>(
        &'a self,
        map: impl Fn(&'a FileSymbols) -> &'a BTreeMap<String, T>,
    ) -> BTreeMap<&'a str, &'a T> {
        let mut out = BTreeMap::new();
        for file in self.files.values() {
            for (key, def) in map(file) {
                out.entry(key.as_str()).or_insert(def);
            }
        }
        out
    }

    /// Qualified key first, then the first member (in key order) with that
    /// bare name.
    fn lookup_member<'a, T: 'a>(
        &'a self,
        name: &str,
        map: impl Fn(&'a FileSymbols) -> &'a BTreeMap<String, T> + Copy,
        bare: impl Fn(&T) -> &str,
    ) -> Option<&'a T> {
        if let Some(v) = self.lookup(name, map) {
            return Some(v);
        }
        if name.contains('.') {
            return None;
        }
        self.resolved(map).into_values().find(|v| bare(*v) == name)
    }

    /// Resolve `name` (`Page`, `Page.member`, bare member or feature name),
    /// checking pages, then fields, then actions, then features, or only
    /// `kind` when given.
    pub fn find_definition(&self, name: &str, kind: Option<SymbolKind>) -> Option<SymbolLocation> {
        let wants = |k: SymbolKind| kind.is_none() || kind == Some(k);

        if wants(SymbolKind::Page) {
            if let Some(loc) = self.page(name).and_then(PageDefinition::location) {
                return Some(loc);
            }
        }
        if wants(SymbolKind::Field) {
            if let Some(loc) = self
                .lookup_member(name, |f| &f.fields, |d: &FieldDefinition| d.name.as_str())
                .and_then(FieldDefinition::location)
            {
                return Some(loc);
            }
        }
        if wants(SymbolKind::Action) {
            if let Some(loc) = self
                .lookup_member(name, |f| &f.actions, |d: &ActionDefinition| d.name.as_str())
                .and_then(ActionDefinition::location)
            {
                return Some(loc);
            }
        }
        if wants(SymbolKind::Feature) {
            if let Some(loc) = self.feature(name).and_then(FeatureDefinition::location) {
                return Some(loc);
            }
        }
        None
    }

    /// Every recorded reference to `name`, ordered by file then position.
    pub fn find_references(&self, name: &str) -> Vec<SymbolReference> {
        let mut refs: Vec<SymbolReference> = self
            .files
            .values()
            .flat_map(|f| f.references.iter())
            .filter(|r| r.symbol_name == name)
            .cloned()
            .collect();
        refs.sort_by(|a, b| {
            (&a.location.file_path, a.location.line, a.location.column).cmp(&(
                &b.location.file_path,
                b.location.line,
                b.location.column,
            ))
        });
        refs
    }

    pub fn page(&self, name: &str) -> Option<&PageDefinition> {
        self.lookup(name, |f| &f.pages)
    }

    /// Look up a field by qualified name `Page.field`.
    pub fn field(&self, qualified: &str) -> Option<&FieldDefinition> {
        self.lookup(qualified, |f| &f.fields)
    }

    /// Look up an action by qualified name `Page.action`.
    pub fn action(&self, qualified: &str) -> Option<&ActionDefinition> {
        self.lookup(qualified, |f| &f.actions)
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureDefinition> {
        self.lookup(name, |f| &f.features)
    }

    pub fn pages(&self) -> Vec<&PageDefinition> {
        self.resolved(|f| &f.pages).into_values().collect()
    }

    pub fn features(&self) -> Vec<&FeatureDefinition> {
        self.resolved(|f| &f.features).into_values().collect()
    }

    /// Fields and actions of `page`, in name order.
    pub fn members_of(&self, page: &str) -> (Vec<&FieldDefinition>, Vec<&ActionDefinition>) {
        let fields = self
            .resolved(|f| &f.fields)
            .into_values()
            .filter(|f| f.page == page)
            .collect();
        let actions = self
            .resolved(|f| &f.actions)
            .into_values()
            .filter(|a| a.page == page)
            .collect();
        (fields, actions)
    }

    /// Definitions contributed by `path`, in source order.
    pub fn symbols_in_file(&self, path: &str) -> Vec<SymbolInfo> {
        let Some(file) = self.files.get(path) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for p in file.pages.values() {
            if let Some(loc) = p.location() {
                out.push(info(&p.name, SymbolKind::Page, None, loc));
            }
        }
        for f in file.fields.values() {
            if let Some(loc) = f.location() {
                out.push(info(&f.name, SymbolKind::Field, Some(&f.page), loc));
            }
        }
        for a in file.actions.values() {
            if let Some(loc) = a.location() {
                out.push(info(&a.name, SymbolKind::Action, Some(&a.page), loc));
            }
        }
        for f in file.features.values() {
            if let Some(loc) = f.location() {
                out.push(info(&f.name, SymbolKind::Feature, None, loc));
            }
        }
        out.sort_by_key(|s| (s.location.line, s.location.column));
        out
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Take `block` if this closing brace ends it.
fn close_block(block: &mut Option<OpenBlock>, depth: usize) -> Option<String> {
    if block.as_ref().is_some_and(|b| b.opened && depth <= b.base_depth) {
        return block.take().map(|b| b.key);
    }
    None
}

fn info(name: &str, kind: SymbolKind, container: Option<&str>, location: SymbolLocation) -> SymbolInfo {
    SymbolInfo {
        name: name.to_owned(),
        kind,
        container: container.map(str::to_owned),
        location,
    }
}

fn char_len(s: &str) -> u32 {
    s.chars().count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGES: &str = r#"PAGE LoginPage {
  FIELD email = LABEL "Email"
  FIELD submit = BUTTON "Sign in"

  login WITH user, pass {
    FILL email WITH user
    CLICK submit
  }
}
"#;

    const FEATURES: &str = r#"// checkout flows
@serial
FEATURE Checkout {
  USE LoginPage
  WITH FIXTURE seededCart

  SCENARIO "pays with card" @smoke {
    DO LoginPage.login WITH "a", "b"
    FILL LoginPage.email WITH "x@y.z"
    LOG "LoginPage.email is not a reference"
  }
}
"#;

    fn registry() -> SymbolRegistry {
        let mut r = SymbolRegistry::new();
        r.index_file("pages/login.vero", PAGES);
        r.index_file("features/checkout.vero", FEATURES);
        r
    }

    #[test]
    fn indexes_pages_fields_and_actions() {
        let r = registry();
        let page = r.page("LoginPage").expect("page");
        assert_eq!(page.fields, vec!["email", "submit"]);
        assert_eq!(page.actions, vec!["login"]);
        assert_eq!(page.end_line, Some(9));

        let field = r.field("LoginPage.email").expect("field");
        assert_eq!(field.selector, r#"LABEL "Email""#);
        assert_eq!((field.line, field.column), (2, 9));

        let action = r.action("LoginPage.login").expect("action");
        assert_eq!(action.parameters, vec!["user", "pass"]);
        assert_eq!((action.line, action.end_line), (5, Some(8)));
        assert_eq!(action.signature(), "login(user, pass)");
    }

    #[test]
    fn indexes_features_with_scenarios_and_uses() {
        let r = registry();
        let f = r.feature("Checkout").expect("feature");
        assert_eq!(f.line, 3);
        assert_eq!(f.end_line, Some(12));
        assert_eq!(f.scenarios, vec!["pays with card"]);
        assert_eq!(f.uses, vec!["LoginPage"]);
    }

    #[test]
    fn find_definition_precedence() {
        let r = registry();
        let page = r.find_definition("LoginPage", None).expect("page");
        assert_eq!((page.file_path.as_str(), page.line, page.column), ("pages/login.vero", 1, 6));

        let field = r.find_definition("LoginPage.email", None).expect("field");
        assert_eq!(field.line, 2);
        let bare = r.find_definition("email", None).expect("bare field");
        assert_eq!(bare, field);

        let action = r.find_definition("LoginPage.login", Some(SymbolKind::Action)).expect("action");
        assert_eq!(action.line, 5);
        assert!(r.find_definition("LoginPage.login", Some(SymbolKind::Field)).is_none());
        assert!(r.find_definition("Nowhere", None).is_none());
    }

    #[test]
    fn references_skip_strings_and_classify_members() {
        let r = registry();
        let page_refs = r.find_references("LoginPage");
        assert_eq!(page_refs.len(), 1);
        assert_eq!(page_refs[0].symbol_type, SymbolKind::Page);
        assert_eq!(page_refs[0].location.line, 4);

        let action_refs = r.find_references("LoginPage.login");
        assert_eq!(action_refs.len(), 1);
        assert_eq!(action_refs[0].symbol_type, SymbolKind::Action);

        let field_refs = r.find_references("LoginPage.email");
        assert_eq!(field_refs.len(), 1, "{:?}", field_refs);
        assert_eq!(field_refs[0].location.line, 9);
        assert_eq!(field_refs[0].symbol_type, SymbolKind::Field);

        let fixture_refs = r.find_references("seededCart");
        assert_eq!(fixture_refs[0].symbol_type, SymbolKind::Fixture);
    }

    #[test]
    fn reindexing_is_idempotent() {
        let mut r = registry();
        let before = r.symbols_in_file("pages/login.vero");
        r.index_file("pages/login.vero", PAGES);
        r.index_file("pages/login.vero", PAGES);
        assert_eq!(r.symbols_in_file("pages/login.vero"), before);
        assert_eq!(r.page("LoginPage").map(|p| p.fields.len()), Some(2));
        assert_eq!(r.file_count(), 2);
    }

    #[test]
    fn clear_file_removes_only_that_file() {
        let mut r = registry();
        r.clear_file("pages/login.vero");
        assert!(r.page("LoginPage").is_none());
        assert!(r.field("LoginPage.email").is_none());
        assert!(r.feature("Checkout").is_some());
        assert_eq!(r.file_count(), 1);
        r.clear();
        assert_eq!(r.file_count(), 0);
        assert!(r.features().is_empty());
    }

    #[test]
    fn duplicate_page_survives_clearing_one_file() {
        let mut r = SymbolRegistry::new();
        r.index_file("b/login.vero", "PAGE LoginPage {\n  FIELD pin = \"PIN\"\n}\n");
        r.index_file("a/login.vero", PAGES);

        let page = r.page("LoginPage").expect("page");
        assert_eq!(page.file_path.as_deref(), Some("a/login.vero"));
        assert_eq!(r.pages().len(), 1);
        assert!(r.field("LoginPage.pin").is_some());

        r.clear_file("a/login.vero");
        let page = r.page("LoginPage").expect("still declared in b");
        assert_eq!(page.file_path.as_deref(), Some("b/login.vero"));
        assert_eq!(page.fields, vec!["pin"]);
        assert!(r.field("LoginPage.email").is_none());
        let loc = r.find_definition("LoginPage", None).expect("definition");
        assert_eq!(loc.file_path, "b/login.vero");

        r.index_file("b/login.vero", "");
        assert!(r.page("LoginPage").is_none());
    }

    #[test]
    fn bare_scenario_names_are_indexed() {
        let mut r = SymbolRegistry::new();
        r.index_file("f.vero", "FEATURE F {\n  SCENARIO first {\n  }\n  SCENARIO \"second\" {\n  }\n}\n");
        assert_eq!(r.feature("F").expect("feature").scenarios, vec!["first", "second"]);
    }

    #[test]
    fn keywords_are_matched_case_insensitively() {
        let mut r = SymbolRegistry::new();
        r.index_file("a.vero", "page Home {\n  field logo = \"img\"\n}\n");
        assert!(r.page("Home").is_some());
        assert!(r.field("Home.logo").is_some());
    }

    #[test]
    fn commented_out_definitions_are_ignored() {
        let mut r = SymbolRegistry::new();
        r.index_file("a.vero", "// PAGE Ghost {\n/*\nPAGE Hidden {\n*/\nPAGE Real {\n}\n");
        let names: Vec<_> = r.pages().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["Real"]);
    }

    #[test]
    fn symbols_in_file_are_in_source_order() {
        let r = registry();
        let kinds: Vec<_> = r
            .symbols_in_file("pages/login.vero")
            .into_iter()
            .map(|s| (s.kind, s.name))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (SymbolKind::Page, "LoginPage".to_owned()),
                (SymbolKind::Field, "email".to_owned()),
                (SymbolKind::Field, "submit".to_owned()),
                (SymbolKind::Action, "login".to_owned()),
            ]
        );
        let (fields, actions) = r.members_of("LoginPage");
        assert_eq!((fields.len(), actions.len()), (2, 1));
    }
}
