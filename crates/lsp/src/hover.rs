//! Hover information for symbol references and keywords.
//!
//! Fields show their selector, actions their signature, pages and features
//! a short summary. Anything else falls back to keyword descriptions.

use lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position};
use std::path::Path;

use crate::document::EditorSession;
use crate::navigation::resolve_at;

/// Compute hover information for the reference at the given position.
pub fn compute_hover(
    session: &EditorSession,
    path: &Path,
    position: Position,
    content: &str,
) -> Option<Hover> {
    let word = resolve_at(session, path, position, content)?;
    let registry = session.registry();

    if let Some(field) = registry.field(&word) {
        return Some(make_hover(format!(
            "**field** `{}.{}`\n\n```vero\nFIELD {} = {}\n```",
            field.page, field.name, field.name, field.selector
        )));
    }
    if let Some(action) = registry.action(&word) {
        return Some(make_hover(format!(
            "**action** `{}.{}`\n\n```vero\n{}\n```",
            action.page,
            action.name,
            action.signature()
        )));
    }

    if let Some(page) = registry.page(&word) {
        let mut md = format!(
            "**page** `{}` -- {} field{}, {} action{}",
            page.name,
            page.fields.len(),
            plural(page.fields.len()),
            page.actions.len(),
            plural(page.actions.len()),
        );
        if !page.fields.is_empty() {
            md.push_str(&format!("\n\nFields: {}", page.fields.join(", ")));
        }
        if !page.actions.is_empty() {
            md.push_str(&format!("\n\nActions: {}", page.actions.join(", ")));
        }
        return Some(make_hover(md));
    }

    if let Some(feature) = registry.feature(&word) {
        let mut md = format!(
            "**feature** `{}` -- {} scenario{}",
            feature.name,
            feature.scenarios.len(),
            plural(feature.scenarios.len())
        );
        if !feature.uses.is_empty() {
            md.push_str(&format!("\n\nUses: {}", feature.uses.join(", ")));
        }
        return Some(make_hover(md));
    }

    keyword_hover(&word)
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Create a Hover with markdown content.
fn make_hover(markdown: String) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: markdown,
        }),
        range: None,
    }
}

/// Provide hover info for declaration and control keywords.
fn keyword_hover(word: &str) -> Option<Hover> {
    let desc = match word {
        "PAGE" => "**PAGE** -- groups the fields and actions of one application screen",
        "FIELD" => "**FIELD** -- names an element selector: `FIELD email = LABEL \"Email\"`",
        "FEATURE" => "**FEATURE** -- groups scenarios, hooks and page imports",
        "SCENARIO" => "**SCENARIO** -- one executable test case",
        "FIXTURE" => "**FIXTURE** -- reusable setup and teardown, scoped per test or worker",
        "USE" => "**USE** -- makes a page's fields and actions available in a feature",
        "DO" => "**DO** -- runs a page action: `DO LoginPage.login WITH \"a\", \"b\"`",
        "VERIFY" => "**VERIFY** -- asserts element state, text, URL or title",
        "ROW" => "**ROW** -- binds the first matching row of a data table",
        "ROWS" => "**ROWS** -- binds all matching rows of a data table",
        "LOAD" => "**LOAD** -- loads a data table into a variable",
        "BEFORE" | "AFTER" => "**BEFORE / AFTER** -- hooks run around `EACH` scenario or `ALL` of them",
        "TEXT" => "**TEXT** -- string variable type",
        "NUMBER" => "**NUMBER** -- numeric variable type",
        "FLAG" => "**FLAG** -- boolean variable type",
        "LIST" => "**LIST** -- list variable type",
        _ => return None,
    };
    Some(make_hover(desc.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn session_with(src: &str) -> (EditorSession, PathBuf) {
        let mut session = EditorSession::default();
        let path = PathBuf::from("/ws/login.vero");
        session.open("file:///ws/login.vero", path.clone(), 1, src.to_owned());
        (session, path)
    }

    fn text(h: Hover) -> String {
        match h.contents {
            HoverContents::Markup(m) => m.value,
            other => panic!("unexpected hover contents {:?}", other),
        }
    }

    const SRC: &str = "PAGE LoginPage {\n  FIELD email = LABEL \"Email\"\n  login WITH user {\n    FILL email WITH user\n  }\n}\n";

    #[test]
    fn field_hover_shows_selector() {
        let (session, path) = session_with(SRC);
        let h = compute_hover(&session, &path, Position::new(3, 10), SRC).expect("hover");
        assert!(text(h).contains("FIELD email = LABEL \"Email\""));
    }

    #[test]
    fn page_and_action_hover() {
        let (session, path) = session_with(SRC);
        let page = text(compute_hover(&session, &path, Position::new(0, 7), SRC).expect("page"));
        assert!(page.contains("1 field, 1 action"), "{}", page);
        let action = text(compute_hover(&session, &path, Position::new(2, 3), SRC).expect("action"));
        assert!(action.contains("login(user)"), "{}", action);
    }

    #[test]
    fn keywords_fall_back() {
        let (session, path) = session_with(SRC);
        let h = compute_hover(&session, &path, Position::new(1, 3), SRC).expect("keyword");
        assert!(text(h).starts_with("**FIELD**"));
    }
}
