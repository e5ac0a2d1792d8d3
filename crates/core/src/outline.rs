//! Two-level document outline: features and pages at the top, scenarios
//! under the feature that precedes them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::scan::{char_column, scan_line};

static CONTAINER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*(?:@\w+\s+)*(feature|page)\s+(?:"([^"]*)"|(\w+))"#).unwrap()
});
static SCENARIO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*((?:@\w+\s+)*)scenario\s+(?:"([^"]*)"|(\w+))"#).unwrap()
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(\w+)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlineKind {
    Feature,
    Page,
    Scenario,
}

impl OutlineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OutlineKind::Feature => "feature",
            OutlineKind::Page => "page",
            OutlineKind::Scenario => "scenario",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineItem {
    pub name: String,
    pub kind: OutlineKind,
    /// 1-based.
    pub line: u32,
    pub column: u32,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<OutlineItem>,
}

/// Build the outline of `text` in a single pass.
///
/// Scenarios seen before any feature are dropped. Tags are the `@word`s
/// written before `SCENARIO` and after its name on the same line.
pub fn outline(text: &str) -> Vec<OutlineItem> {
    let mut items: Vec<OutlineItem> = Vec::new();
    let mut current_feature: Option<usize> = None;
    let mut in_block_comment = false;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx as u32 + 1;
        let scan = scan_line(raw, &mut in_block_comment);
        if scan.is_blank() {
            continue;
        }
        let code = scan.code.as_str();

        if let Some(caps) = CONTAINER_RE.captures(code) {
            let kind = if caps[1].eq_ignore_ascii_case("feature") {
                OutlineKind::Feature
            } else {
                OutlineKind::Page
            };
            let Some(name) = caps.get(2).or_else(|| caps.get(3)) else {
                continue;
            };
            items.push(OutlineItem {
                name: name.as_str().to_string(),
                kind,
                line: line_no,
                column: char_column(raw, indent(code)),
                tags: Vec::new(),
                children: Vec::new(),
            });
            current_feature = (kind == OutlineKind::Feature).then(|| items.len() - 1);
            continue;
        }

        if let Some(caps) = SCENARIO_RE.captures(code) {
            let Some(feature) = current_feature else {
                continue;
            };
            let Some(name) = caps.get(2).or_else(|| caps.get(3)) else {
                continue;
            };
            let prefix = caps.get(1).map_or("", |m| m.as_str());
            let rest = &code[name.end()..];
            let rest = rest.split('{').next().unwrap_or("");
            let tags = TAG_RE
                .captures_iter(prefix)
                .chain(TAG_RE.captures_iter(rest))
                .map(|c| c[1].to_string())
                .collect();
            items[feature].children.push(OutlineItem {
                name: name.as_str().to_string(),
                kind: OutlineKind::Scenario,
                line: line_no,
                column: char_column(raw, indent(code)),
                tags,
                children: Vec::new(),
            });
        }
    }

    tracing::debug!(items = items.len(), "built outline");
    items
}

fn indent(code: &str) -> usize {
    code.len() - code.trim_start().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_own_their_scenarios() {
        let src = r#"PAGE LoginPage {
  FIELD email = "Email"
}

FEATURE Login {
  USE LoginPage
  SCENARIO "valid" @smoke @critical {
    OPEN "/login"
  }
  SCENARIO invalid {
  }
}
"#;
        let tree = outline(src);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].kind, OutlineKind::Page);
        assert_eq!(tree[0].name, "LoginPage");
        assert!(tree[0].children.is_empty());

        let feature = &tree[1];
        assert_eq!(feature.kind, OutlineKind::Feature);
        assert_eq!(feature.line, 5);
        assert_eq!(feature.children.len(), 2);
        assert_eq!(feature.children[0].name, "valid");
        assert_eq!(feature.children[0].tags, vec!["smoke", "critical"]);
        assert_eq!(feature.children[0].line, 7);
        assert_eq!(feature.children[0].column, 3);
        assert_eq!(feature.children[1].name, "invalid");
        assert!(feature.children[1].tags.is_empty());
    }

    #[test]
    fn leading_annotations_become_tags() {
        let tree = outline("@serial FEATURE F {\n  @skip SCENARIO s {\n  }\n}\n");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "F");
        assert_eq!(tree[0].children[0].tags, vec!["skip"]);
        assert_eq!(tree[0].children[0].column, 3);
    }

    #[test]
    fn commented_headers_are_ignored() {
        let src = "// FEATURE Old {\n/*\nSCENARIO x {\n*/\nfeature New {\n  scenario \"a\" {\n  }\n}\n";
        let tree = outline(src);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "New");
        assert_eq!(tree[0].children.len(), 1);
    }

    #[test]
    fn scenarios_after_a_page_are_not_attached() {
        let tree = outline("PAGE P {\n}\nSCENARIO lost {\n}\n");
        assert_eq!(tree.len(), 1);
        assert!(tree[0].children.is_empty());
    }
}
