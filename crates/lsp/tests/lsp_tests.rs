//! Tests for LSP navigation, hover, outline and diagnostics.
//!
//! These tests write .vero fixtures to a temporary workspace, index it into
//! an EditorSession and call the feature functions directly (not via the
//! LSP protocol).

use lsp_types::{HoverContents, Position, SymbolKind};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vero_lsp::config::{self, ConfigError};
use vero_lsp::document::EditorSession;
use vero_lsp::navigation::{self, path_to_uri};
use vero_lsp::{diagnostics, folding, hover, semantic_tokens};

const LOGIN_PAGE: &str = r#"PAGE LoginPage {
  FIELD email = LABEL "Email"
  FIELD submit = "Sign in"
  login WITH user {
    FILL email WITH user
    CLICK submit
  }
}
"#;

const LOGIN_FEATURE: &str = r#"FEATURE Login {
  USE LoginPage
  SCENARIO "signs in" @smoke {
    DO LoginPage.login WITH "a@b.c"
    CLICK LoginPage.submit
  }
}
"#;

struct Workspace {
    _dir: TempDir,
    root: PathBuf,
    session: EditorSession,
}

impl Workspace {
    fn page(&self) -> PathBuf {
        self.root.join("pages/login.vero")
    }

    fn feature(&self) -> PathBuf {
        self.root.join("features/login.vero")
    }
}

/// Helper: write the fixtures, discover config and index the workspace.
fn workspace_with(extra: &[(&str, &str)]) -> Workspace {
    let dir = TempDir::new().expect("temp dir");
    let root = dir.path().canonicalize().expect("canonical root");
    let files = [
        ("pages/login.vero", LOGIN_PAGE),
        ("features/login.vero", LOGIN_FEATURE),
    ];
    for (rel, text) in files.iter().chain(extra) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, text).expect("write fixture");
    }
    let mut session = EditorSession::new(config::discover(&root).expect("config"));
    session.index_workspace(&root).expect("index");
    Workspace {
        _dir: dir,
        root,
        session,
    }
}

fn uri(path: &Path) -> lsp_types::Uri {
    path_to_uri(path).expect("uri")
}

// ──────────────────────────────────────────────
// Navigation: Go-to-definition
// ──────────────────────────────────────────────

#[test]
fn goto_definition_page_from_feature() {
    let ws = workspace_with(&[]);
    let loc = navigation::goto_definition(
        &ws.session,
        &ws.feature(),
        Position::new(3, 9),
        LOGIN_FEATURE,
    )
    .expect("definition");
    assert_eq!(loc.uri, uri(&ws.page()));
    assert_eq!(loc.range.start, Position::new(0, 5));
    assert_eq!(loc.range.end, Position::new(0, 14));
}

#[test]
fn goto_definition_action_from_do() {
    let ws = workspace_with(&[]);
    let loc = navigation::goto_definition(
        &ws.session,
        &ws.feature(),
        Position::new(3, 19),
        LOGIN_FEATURE,
    )
    .expect("definition");
    assert_eq!(loc.uri, uri(&ws.page()));
    assert_eq!(loc.range.start, Position::new(3, 2));
}

#[test]
fn goto_definition_bare_member_inside_page() {
    let ws = workspace_with(&[]);
    // `CLICK submit` inside the action body
    let loc = navigation::goto_definition(&ws.session, &ws.page(), Position::new(5, 11), LOGIN_PAGE)
        .expect("definition");
    assert_eq!(loc.range.start, Position::new(2, 8));
}

#[test]
fn goto_definition_on_whitespace_is_none() {
    let ws = workspace_with(&[]);
    let loc = navigation::goto_definition(&ws.session, &ws.feature(), Position::new(3, 1), LOGIN_FEATURE);
    assert!(loc.is_none());
}

// ──────────────────────────────────────────────
// Navigation: References
// ──────────────────────────────────────────────

#[test]
fn field_references_with_and_without_declaration() {
    let ws = workspace_with(&[]);
    let pos = Position::new(2, 9);
    let with_decl = navigation::find_references(&ws.session, &ws.page(), pos, LOGIN_PAGE, true);
    let without = navigation::find_references(&ws.session, &ws.page(), pos, LOGIN_PAGE, false);

    assert_eq!(with_decl.len(), 2);
    assert_eq!(with_decl[0].uri, uri(&ws.page()));
    assert_eq!(without.len(), 1);
    assert_eq!(without[0].uri, uri(&ws.feature()));
    assert_eq!(without[0].range.start, Position::new(4, 10));
}

#[test]
fn page_references_include_member_accesses() {
    let ws = workspace_with(&[]);
    let refs = navigation::find_references(
        &ws.session,
        &ws.feature(),
        Position::new(1, 8),
        LOGIN_FEATURE,
        false,
    );
    let starts: Vec<Position> = refs.iter().map(|l| l.range.start).collect();
    assert_eq!(
        starts,
        vec![Position::new(1, 6), Position::new(3, 7), Position::new(4, 10)]
    );
    // member accesses are narrowed to the page name
    assert_eq!(refs[1].range.end, Position::new(3, 16));
}

// ──────────────────────────────────────────────
// Hover
// ──────────────────────────────────────────────

fn hover_text(ws: &Workspace, path: &Path, pos: Position, content: &str) -> String {
    let h = hover::compute_hover(&ws.session, path, pos, content).expect("hover");
    match h.contents {
        HoverContents::Markup(m) => m.value,
        other => panic!("unexpected hover contents {:?}", other),
    }
}

#[test]
fn hover_across_files() {
    let ws = workspace_with(&[]);
    let page = hover_text(&ws, &ws.feature(), Position::new(1, 8), LOGIN_FEATURE);
    assert!(page.contains("**page** `LoginPage`"), "{}", page);
    assert!(page.contains("2 fields, 1 action"), "{}", page);

    let field = hover_text(&ws, &ws.feature(), Position::new(4, 20), LOGIN_FEATURE);
    assert!(field.contains("FIELD submit = \"Sign in\""), "{}", field);
}

#[test]
fn hover_feature_summary() {
    let ws = workspace_with(&[]);
    let text = hover_text(&ws, &ws.feature(), Position::new(0, 9), LOGIN_FEATURE);
    assert!(text.contains("1 scenario"), "{}", text);
    assert!(text.contains("Uses: LoginPage"), "{}", text);
}

// ──────────────────────────────────────────────
// Document symbols
// ──────────────────────────────────────────────

#[test]
fn page_outline_lists_members() {
    let ws = workspace_with(&[]);
    let syms = navigation::document_symbols(&ws.session, &ws.page(), LOGIN_PAGE);
    assert_eq!(syms.len(), 1);
    assert_eq!(syms[0].name, "LoginPage");
    assert_eq!(syms[0].kind, SymbolKind::CLASS);
    assert_eq!(syms[0].range.end.line, 7);
    let children = syms[0].children.as_ref().expect("members");
    let names: Vec<(&str, SymbolKind)> = children.iter().map(|c| (c.name.as_str(), c.kind)).collect();
    assert_eq!(
        names,
        vec![
            ("email", SymbolKind::FIELD),
            ("submit", SymbolKind::FIELD),
            ("login", SymbolKind::METHOD),
        ]
    );
}

#[test]
fn feature_outline_lists_scenarios_with_tags() {
    let ws = workspace_with(&[]);
    let syms = navigation::document_symbols(&ws.session, &ws.feature(), LOGIN_FEATURE);
    assert_eq!(syms.len(), 1);
    assert_eq!(syms[0].kind, SymbolKind::MODULE);
    let scenarios = syms[0].children.as_ref().expect("scenarios");
    assert_eq!(scenarios[0].name, "signs in");
    assert_eq!(scenarios[0].detail.as_deref(), Some("@smoke"));
}

// ──────────────────────────────────────────────
// Editing lifecycle
// ──────────────────────────────────────────────

#[test]
fn unsaved_edits_drive_navigation_until_close() {
    let mut ws = workspace_with(&[]);
    let page = ws.page();
    let page_uri = uri(&page);
    ws.session
        .open(page_uri.as_str(), page.clone(), 1, LOGIN_PAGE.to_owned());

    let edited = LOGIN_PAGE.replace("  FIELD submit = \"Sign in\"\n", "");
    ws.session.change(page_uri.as_str(), 2, edited);
    let gone = navigation::goto_definition(
        &ws.session,
        &ws.feature(),
        Position::new(4, 20),
        LOGIN_FEATURE,
    );
    assert!(gone.is_none());

    // closing without saving falls back to the file on disk
    ws.session.close(page_uri.as_str());
    let back = navigation::goto_definition(
        &ws.session,
        &ws.feature(),
        Position::new(4, 20),
        LOGIN_FEATURE,
    );
    assert!(back.is_some());
}

#[test]
fn deleted_file_is_forgotten_on_close() {
    let mut ws = workspace_with(&[]);
    let page = ws.page();
    let page_uri = uri(&page);
    ws.session
        .open(page_uri.as_str(), page.clone(), 1, LOGIN_PAGE.to_owned());
    std::fs::remove_file(&page).expect("remove");
    ws.session.close(page_uri.as_str());
    assert!(ws.session.registry().page("LoginPage").is_none());
}

// ──────────────────────────────────────────────
// Diagnostics, folding, semantic tokens
// ──────────────────────────────────────────────

#[test]
fn diagnostics_for_broken_buffer() {
    let ws = workspace_with(&[]);
    let diags = diagnostics::compute_diagnostics(&ws.session, "PAGE {\n}\nPAGE Ok {\n}\n");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].range.start, Position::new(0, 5));
    assert_eq!(diags[0].source.as_deref(), Some("vero"));
}

#[test]
fn folding_ranges_cover_page_and_action() {
    let ranges = folding::compute_folding_ranges(LOGIN_PAGE);
    let spans: Vec<(u32, u32)> = ranges.iter().map(|r| (r.start_line, r.end_line)).collect();
    assert_eq!(spans, vec![(0, 7), (3, 6)]);
}

#[test]
fn semantic_tokens_reach_the_last_statement() {
    let ws = workspace_with(&[]);
    let tokens = semantic_tokens::compute_semantic_tokens(LOGIN_FEATURE, Some(ws.session.registry()));
    // braces are not highlighted, so the last token is on the CLICK line
    let last_line: u32 = tokens.iter().map(|t| t.delta_line).sum();
    assert_eq!(last_line, 4);
    assert_eq!(tokens[0].length, 7); // FEATURE
}

// ──────────────────────────────────────────────
// Configuration
// ──────────────────────────────────────────────

#[test]
fn config_limits_reported_errors() {
    let ws = workspace_with(&[("vero.toml", "[diagnostics]\nmax_errors = 1\n")]);
    let broken = "PAGE {\n}\nPAGE {\n}\nPAGE {\n}\n";
    assert_eq!(diagnostics::compute_diagnostics(&ws.session, broken).len(), 1);
}

#[test]
fn config_excludes_directories() {
    let ws = workspace_with(&[
        ("vero.toml", "[workspace]\nexclude = [\"vendor\"]\n"),
        ("vendor/other.vero", "PAGE Vendored {\n}\n"),
    ]);
    assert!(ws.session.registry().page("Vendored").is_none());
    assert!(ws.session.registry().page("LoginPage").is_some());
    assert_eq!(ws.session.registry().file_count(), 2);
}

#[test]
fn malformed_config_is_a_parse_error() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("vero.toml"), "[diagnostics\n").expect("write");
    let err = config::discover(dir.path()).expect_err("should fail");
    assert!(matches!(err, ConfigError::Parse { .. }), "{:?}", err);
}
