//! Folding ranges for the editor, from the text-based scanner in core.

use lsp_types::{FoldingRange, FoldingRangeKind};
use vero_core::folding::{self, FoldKind};

/// Fold regions with 0-based lines.
pub fn compute_folding_ranges(content: &str) -> Vec<FoldingRange> {
    folding::folding_ranges(content)
        .into_iter()
        .map(|r| FoldingRange {
            start_line: r.start_line - 1,
            start_character: None,
            end_line: r.end_line - 1,
            end_character: None,
            kind: Some(match r.kind {
                FoldKind::Region => FoldingRangeKind::Region,
                FoldKind::Comment => FoldingRangeKind::Comment,
                FoldKind::Imports => FoldingRangeKind::Imports,
            }),
            collapsed_text: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_shifted_to_zero_based() {
        let ranges = compute_folding_ranges("PAGE A {\n  FIELD x = \"x\"\n}\n");
        assert_eq!(ranges.len(), 1);
        assert_eq!((ranges[0].start_line, ranges[0].end_line), (0, 2));
        assert_eq!(ranges[0].kind, Some(FoldingRangeKind::Region));
    }
}
