//! Navigation features: go-to-definition, find-all-references, document symbols.
//!
//! Backed by the session's [`SymbolRegistry`](vero_core::SymbolRegistry),
//! which keeps 1-based positions keyed by file path. Everything leaving this
//! module is converted to 0-based LSP positions and `file://` URIs.

use lsp_types::{DocumentSymbol, Location, Position, Range, SymbolKind, Uri};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use vero_core::outline::{OutlineItem, OutlineKind};
use vero_core::registry::{SymbolInfo, SymbolKind as VeroKind};
use vero_core::SymbolLocation;

use crate::document::{registry_key, EditorSession};
use crate::position::{char_col, utf16_col};

/// Go-to-definition for the reference under the cursor.
pub fn goto_definition(
    session: &EditorSession,
    path: &Path,
    position: Position,
    content: &str,
) -> Option<Location> {
    let name = resolve_at(session, path, position, content)?;
    let loc = session.registry().find_definition(&name, None)?;
    Sources::new(session).location(&loc)
}

/// Every reference to the symbol under the cursor, optionally preceded by
/// its declaration. References to `Page.member` also count as references to
/// `Page`.
pub fn find_references(
    session: &EditorSession,
    path: &Path,
    position: Position,
    content: &str,
    include_declaration: bool,
) -> Vec<Location> {
    let Some(name) = resolve_at(session, path, position, content) else {
        return Vec::new();
    };
    let registry = session.registry();
    let mut sources = Sources::new(session);
    let mut result = Vec::new();

    if include_declaration {
        if let Some(loc) = registry
            .find_definition(&name, None)
            .and_then(|d| sources.location(&d))
        {
            result.push(loc);
        }
    }
    for r in registry.find_references(&name) {
        result.extend(sources.location(&r.location));
    }

    if registry.page(&name).is_some() {
        let width = name.chars().count() as u32;
        for member in members(registry, &name) {
            for r in registry.find_references(&member) {
                let mut loc = r.location;
                loc.end_line = Some(loc.line);
                loc.end_column = Some(loc.column + width);
                result.extend(sources.location(&loc));
            }
        }
        result.sort_by(|a, b| {
            (a.uri.as_str(), a.range.start.line, a.range.start.character).cmp(&(
                b.uri.as_str(),
                b.range.start.line,
                b.range.start.character,
            ))
        });
        result.dedup();
    }
    result
}

/// Qualified names of every field and action of `page`.
fn members(registry: &vero_core::SymbolRegistry, page: &str) -> Vec<String> {
    let (fields, actions) = registry.members_of(page);
    fields
        .iter()
        .map(|f| format!("{}.{}", page, f.name))
        .chain(actions.iter().map(|a| format!("{}.{}", page, a.name)))
        .collect()
}

/// Outline of the document: pages with their fields and actions, features
/// with their scenarios.
pub fn document_symbols(session: &EditorSession, path: &Path, content: &str) -> Vec<DocumentSymbol> {
    let registry = session.registry();
    let file_symbols = registry.symbols_in_file(&registry_key(path));

    vero_core::outline(content)
        .iter()
        .map(|item| {
            let end_line = match item.kind {
                OutlineKind::Page => registry.page(&item.name).and_then(|p| p.end_line),
                _ => registry.feature(&item.name).and_then(|f| f.end_line),
            };
            let children: Vec<DocumentSymbol> = match item.kind {
                OutlineKind::Page => file_symbols
                    .iter()
                    .filter(|s| s.container.as_deref() == Some(item.name.as_str()))
                    .map(|s| member_symbol(s, content))
                    .collect(),
                _ => item
                    .children
                    .iter()
                    .map(|c| outline_symbol(c, None, content, Vec::new()))
                    .collect(),
            };
            outline_symbol(item, end_line, content, children)
        })
        .collect()
}

#[allow(deprecated)]
fn outline_symbol(
    item: &OutlineItem,
    end_line: Option<u32>,
    content: &str,
    children: Vec<DocumentSymbol>,
) -> DocumentSymbol {
    let (kind, detail) = match item.kind {
        OutlineKind::Page => (SymbolKind::CLASS, "page".to_owned()),
        OutlineKind::Feature => (SymbolKind::MODULE, "feature".to_owned()),
        OutlineKind::Scenario if item.tags.is_empty() => (SymbolKind::FUNCTION, "scenario".to_owned()),
        OutlineKind::Scenario => (
            SymbolKind::FUNCTION,
            item.tags.iter().map(|t| format!("@{}", t)).collect::<Vec<_>>().join(" "),
        ),
    };
    let selection_range = line_range(content, item.line);
    let range = match end_line {
        Some(end) if end > item.line => Range::new(
            selection_range.start,
            line_range(content, end).end,
        ),
        _ => selection_range,
    };
    DocumentSymbol {
        name: item.name.clone(),
        detail: Some(detail),
        kind,
        tags: None,
        deprecated: None,
        range,
        selection_range,
        children: if children.is_empty() { None } else { Some(children) },
    }
}

#[allow(deprecated)]
fn member_symbol(info: &SymbolInfo, content: &str) -> DocumentSymbol {
    let kind = match info.kind {
        VeroKind::Action => SymbolKind::METHOD,
        _ => SymbolKind::FIELD,
    };
    let selection_range = name_range(&info.location, line_text(content, info.location.line));
    let range = match info.location.end_line {
        Some(end) if end > info.location.line => Range::new(
            line_range(content, info.location.line).start,
            line_range(content, end).end,
        ),
        _ => line_range(content, info.location.line),
    };
    DocumentSymbol {
        name: info.name.clone(),
        detail: Some(info.kind.as_str().to_owned()),
        kind,
        tags: None,
        deprecated: None,
        range,
        selection_range,
        children: None,
    }
}

// ──────────────────────────────────────────────
// Cursor resolution
// ──────────────────────────────────────────────

/// The dotted reference under the cursor. On the first segment of
/// `Page.member` this is `Page`; anywhere else it is `Page.member`.
pub fn reference_at_position(content: &str, position: Position) -> Option<String> {
    let line = content.lines().nth(position.line as usize)?;
    let chars: Vec<char> = line.chars().collect();
    let is_ident_char = |c: char| c.is_alphanumeric() || c == '_';

    let mut col = char_col(line, position.character);
    if col >= chars.len() || !is_ident_char(chars[col]) {
        // cursor just past the end of a word
        if col > 0 && col <= chars.len() && is_ident_char(chars[col - 1]) {
            col -= 1;
        } else {
            return None;
        }
    }

    let mut start = col;
    while start > 0 && is_ident_char(chars[start - 1]) {
        start -= 1;
    }
    let mut end = col;
    while end < chars.len() && is_ident_char(chars[end]) {
        end += 1;
    }

    // extend over `a.b` on either side
    let mut first = start;
    while first >= 2 && chars[first - 1] == '.' && is_ident_char(chars[first - 2]) {
        first -= 1;
        while first > 0 && is_ident_char(chars[first - 1]) {
            first -= 1;
        }
    }
    let mut last = end;
    while last + 1 < chars.len() && chars[last] == '.' && is_ident_char(chars[last + 1]) {
        last += 1;
        while last < chars.len() && is_ident_char(chars[last]) {
            last += 1;
        }
    }

    let dotted: String = chars[first..last].iter().collect();
    let segments: Vec<&str> = dotted.split('.').collect();
    let index = chars[first..col].iter().filter(|&&c| c == '.').count();
    if segments.len() > 1 && index == 0 {
        return Some(segments[0].to_owned());
    }
    Some(segments[..segments.len().min(2)].join("."))
}

/// Reference under the cursor, qualified with the enclosing page when it is
/// a bare member name used inside that page.
pub(crate) fn resolve_at(
    session: &EditorSession,
    path: &Path,
    position: Position,
    content: &str,
) -> Option<String> {
    let name = reference_at_position(content, position)?;
    if name.contains('.') {
        return Some(name);
    }
    let registry = session.registry();
    let key = registry_key(path);
    let line = position.line + 1;
    let enclosing = registry.pages().into_iter().find(|p| {
        p.file_path.as_deref() == Some(key.as_str())
            && p.line.is_some_and(|start| start <= line)
            && p.end_line.map_or(true, |end| line <= end)
    });
    if let Some(page) = enclosing {
        let qualified = format!("{}.{}", page.name, name);
        if registry.field(&qualified).is_some() || registry.action(&qualified).is_some() {
            return Some(qualified);
        }
    }
    Some(name)
}

// ──────────────────────────────────────────────
// Conversions
// ──────────────────────────────────────────────

/// File text for the locations of one request, loaded once per file from
/// the open buffer or from disk.
struct Sources<'a> {
    session: &'a EditorSession,
    texts: HashMap<String, String>,
}

impl<'a> Sources<'a> {
    fn new(session: &'a EditorSession) -> Self {
        Sources {
            session,
            texts: HashMap::new(),
        }
    }

    /// Registry location (1-based) to an LSP location (0-based) covering
    /// the symbol's name.
    fn location(&mut self, loc: &SymbolLocation) -> Option<Location> {
        let uri = path_to_uri(Path::new(&loc.file_path))?;
        let session = self.session;
        let text = self
            .texts
            .entry(loc.file_path.clone())
            .or_insert_with(|| session.text_of(Path::new(&loc.file_path)));
        Some(Location::new(uri, name_range(loc, line_text(text, loc.line))))
    }
}

/// Text of a 1-based line, empty when out of range.
fn line_text(content: &str, line_1indexed: u32) -> &str {
    content
        .lines()
        .nth(line_1indexed.saturating_sub(1) as usize)
        .unwrap_or("")
}

/// The name's range on its line, in UTF-16 units of `text`.
fn name_range(loc: &SymbolLocation, text: &str) -> Range {
    let line = loc.line.saturating_sub(1);
    let start = loc.column.saturating_sub(1);
    // end_column always sits on the name's line; end_line may mark a block end
    let end = loc.end_column.map_or(start, |c| c.saturating_sub(1)).max(start);
    Range::new(
        Position::new(line, utf16_col(text, start)),
        Position::new(line, utf16_col(text, end)),
    )
}

/// Whole-line range for a 1-based line.
fn line_range(content: &str, line_1indexed: u32) -> Range {
    let line = line_1indexed.saturating_sub(1);
    let text = line_text(content, line_1indexed);
    let end = utf16_col(text, text.chars().count() as u32);
    Range::new(Position::new(line, 0), Position::new(line, end))
}

/// Convert a file path to a `file://` URI.
pub fn path_to_uri(path: &Path) -> Option<Uri> {
    let abs = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let s = abs.to_string_lossy().replace('\\', "/");
    let s = s.strip_prefix("//?/").unwrap_or(&s);
    let uri = if s.starts_with('/') {
        format!("file://{}", s)
    } else {
        format!("file:///{}", s)
    };
    uri.replace(' ', "%20").parse().ok()
}

/// Convert an LSP URI to a file system path.
///
/// Handles `file:///path/to/file` URIs by stripping the scheme and authority
/// and percent-decoding (e.g. `%3A` → `:`).
pub fn uri_to_path(uri: &Uri) -> PathBuf {
    let s = uri.as_str();
    if let Some(path) = s.strip_prefix("file://") {
        let decoded = percent_decode(path);
        #[cfg(windows)]
        {
            let decoded = decoded.strip_prefix('/').unwrap_or(&decoded);
            PathBuf::from(decoded)
        }
        #[cfg(not(windows))]
        {
            PathBuf::from(decoded)
        }
    } else {
        PathBuf::from(s)
    }
}

/// Decode percent-encoded bytes in a URI path.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                out.push(h << 4 | l);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
