//! Parse-error-to-diagnostic conversion.
//!
//! The parser recovers from errors, so a file can report several
//! diagnostics at once; each is anchored at the offending token.

use lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range};
use vero_core::ParseError;

use crate::document::EditorSession;
use crate::position::utf16_col;

/// Parse `content` and return one diagnostic per parse error.
pub fn compute_diagnostics(session: &EditorSession, content: &str) -> Vec<Diagnostic> {
    let result = session.parse(content);
    let lines: Vec<&str> = content.lines().collect();
    result
        .errors
        .iter()
        .map(|e| to_diagnostic(e, &lines))
        .collect()
}

/// ParseError positions are 1-based; LSP positions are 0-based. The range
/// covers the word starting at the error column, or one character.
pub fn to_diagnostic(error: &ParseError, lines: &[&str]) -> Diagnostic {
    let line = error.line.saturating_sub(1);
    let start = error.column.saturating_sub(1);
    let text = lines.get(line as usize).copied().unwrap_or("");
    let width = (text
        .chars()
        .skip(start as usize)
        .take_while(|c| !c.is_whitespace())
        .count() as u32)
        .max(1);
    Diagnostic {
        range: Range::new(
            Position::new(line, utf16_col(text, start)),
            Position::new(line, utf16_col(text, start + width)),
        ),
        severity: Some(DiagnosticSeverity::ERROR),
        source: Some("vero".to_string()),
        message: error.message.clone(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_file_has_no_diagnostics() {
        let session = EditorSession::default();
        assert!(compute_diagnostics(&session, "PAGE A {\n  FIELD x = \"X\"\n}\n").is_empty());
    }

    #[test]
    fn errors_are_zero_based_and_cover_the_token() {
        let session = EditorSession::default();
        let diags = compute_diagnostics(&session, "PAGE { }\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].range.start, Position::new(0, 5));
        assert_eq!(diags[0].range.end, Position::new(0, 6));
        assert_eq!(diags[0].severity, Some(DiagnosticSeverity::ERROR));
    }

    #[test]
    fn columns_after_astral_characters_count_utf16_units() {
        let session = EditorSession::default();
        let src = "FEATURE F {\n  SCENARIO \"🎉\" {\n    LOG \"🎉\" ?\n  }\n}\n";
        let diags = compute_diagnostics(&session, src);
        assert_eq!(diags.len(), 1, "{:?}", diags);
        assert_eq!(diags[0].range.start, Position::new(2, 13));
        assert_eq!(diags[0].range.end, Position::new(2, 14));
    }
}
