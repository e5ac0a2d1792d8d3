//! Fold regions computed from raw text.
//!
//! Works on files that do not parse: a brace stack pairs `{`/`}` outside
//! strings and comments, and the header on the opening line names the block.
//! Runs of two or more comment-only lines, multi-line `/* */` comments and runs of
//! two or more `USE` lines fold on their own. Lines are 1-based.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::scan::scan_line;

static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:@\w+\s+)*(page|feature|scenario|fixture|before|after|setup|teardown)\b")
        .unwrap()
});
static USE_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*use\s+\w+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoldKind {
    Region,
    Comment,
    Imports,
}

/// What opened a `Region` fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Page,
    Feature,
    Scenario,
    Fixture,
    Hook,
    Setup,
    Teardown,
    /// Actions, `FOR EACH` bodies and anything else with braces.
    Block,
}

impl FoldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FoldKind::Region => "region",
            FoldKind::Comment => "comment",
            FoldKind::Imports => "imports",
        }
    }
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Page => "page",
            BlockKind::Feature => "feature",
            BlockKind::Scenario => "scenario",
            BlockKind::Fixture => "fixture",
            BlockKind::Hook => "hook",
            BlockKind::Setup => "setup",
            BlockKind::Teardown => "teardown",
            BlockKind::Block => "block",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldingRange {
    pub start_line: u32,
    pub end_line: u32,
    pub kind: FoldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockKind>,
}

/// Compute fold regions, ordered by start line.
pub fn folding_ranges(text: &str) -> Vec<FoldingRange> {
    let mut ranges = Vec::new();
    let mut stack: Vec<(u32, BlockKind)> = Vec::new();
    let mut in_block_comment = false;
    let mut block_comment_start: Option<u32> = None;
    let mut comment_run: Option<(u32, u32)> = None;
    let mut use_run: Option<(u32, u32)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx as u32 + 1;
        let was_in_block = in_block_comment;
        let scan = scan_line(raw, &mut in_block_comment);

        // `/* ... */` spanning lines
        if !was_in_block && in_block_comment {
            block_comment_start = Some(line_no);
        }
        if was_in_block && !in_block_comment {
            if let Some(start) = block_comment_start.take() {
                push_range(&mut ranges, start, line_no, FoldKind::Comment, None);
            }
        }

        // runs of comment-only lines
        let comment_only =
            scan.has_comment && scan.is_blank() && !was_in_block && !in_block_comment;
        if comment_only {
            comment_run = Some(comment_run.map_or((line_no, line_no), |(s, _)| (s, line_no)));
        } else if let Some((s, e)) = comment_run.take() {
            push_range(&mut ranges, s, e, FoldKind::Comment, None);
        }

        // runs of `USE` lines
        if USE_LINE_RE.is_match(&scan.code) {
            use_run = Some(use_run.map_or((line_no, line_no), |(s, _)| (s, line_no)));
        } else if let Some((s, e)) = use_run.take() {
            push_range(&mut ranges, s, e, FoldKind::Imports, None);
        }

        let header = block_kind(&scan.code);
        let mut header_used = false;
        for ch in scan.braces() {
            if ch == '{' {
                let kind = if header_used { BlockKind::Block } else { header };
                header_used = true;
                stack.push((line_no, kind));
            } else if let Some((start, kind)) = stack.pop() {
                push_range(&mut ranges, start, line_no, FoldKind::Region, Some(kind));
            }
        }
    }

    if let Some((s, e)) = comment_run {
        push_range(&mut ranges, s, e, FoldKind::Comment, None);
    }
    if let Some((s, e)) = use_run {
        push_range(&mut ranges, s, e, FoldKind::Imports, None);
    }

    ranges.sort_by_key(|r| (r.start_line, std::cmp::Reverse(r.end_line)));
    ranges
}

fn block_kind(code: &str) -> BlockKind {
    let Some(word) = HEADER_RE.captures(code).and_then(|c| c.get(1)) else {
        return BlockKind::Block;
    };
    match word.as_str().to_ascii_lowercase().as_str() {
        "page" => BlockKind::Page,
        "feature" => BlockKind::Feature,
        "scenario" => BlockKind::Scenario,
        "fixture" => BlockKind::Fixture,
        "before" | "after" => BlockKind::Hook,
        "setup" => BlockKind::Setup,
        "teardown" => BlockKind::Teardown,
        _ => BlockKind::Block,
    }
}

fn push_range(
    ranges: &mut Vec<FoldingRange>,
    start_line: u32,
    end_line: u32,
    kind: FoldKind,
    block: Option<BlockKind>,
) {
    if end_line > start_line {
        ranges.push(FoldingRange {
            start_line,
            end_line,
            kind,
            block,
        });
    }
}
