//! Line-level masking shared by the raw-text scanners (registry, folding,
//! outline). None of them go through the lexer, so they agree on what counts
//! as code here.

/// A source line with comments blanked out (byte offsets preserved) and the
/// byte spans of string literals, quotes included.
pub(crate) struct LineScan {
    pub code: String,
    pub strings: Vec<(usize, usize)>,
    /// The line contained `//` or any part of a `/* */` comment.
    pub has_comment: bool,
}

impl LineScan {
    pub fn in_string(&self, byte: usize) -> bool {
        self.strings.iter().any(|&(s, e)| byte >= s && byte < e)
    }

    pub fn is_blank(&self) -> bool {
        self.code.trim().is_empty()
    }

    /// Brace characters outside strings, in order.
    pub fn braces(&self) -> impl Iterator<Item = char> + '_ {
        self.code
            .char_indices()
            .filter(|&(i, c)| (c == '{' || c == '}') && !self.in_string(i))
            .map(|(_, c)| c)
    }
}

/// Mask one line. `in_block_comment` carries `/* */` state across lines.
pub(crate) fn scan_line(line: &str, in_block_comment: &mut bool) -> LineScan {
    let mut code = String::with_capacity(line.len());
    let mut strings = Vec::new();
    let mut has_comment = *in_block_comment;
    let mut quote: Option<(char, usize)> = None;
    let mut chars = line.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if *in_block_comment {
            if c == '*' && chars.peek().map(|&(_, n)| n) == Some('/') {
                chars.next();
                code.push_str("  ");
                *in_block_comment = false;
            } else {
                blank(&mut code, c);
            }
            continue;
        }
        if let Some((q, start)) = quote {
            code.push(c);
            if c == '\\' {
                if let Some((_, n)) = chars.next() {
                    code.push(n);
                }
            } else if c == q {
                strings.push((start, i + c.len_utf8()));
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some((c, i));
                code.push(c);
            }
            '/' if chars.peek().map(|&(_, n)| n) == Some('/') => {
                has_comment = true;
                for ch in line[i..].chars() {
                    blank(&mut code, ch);
                }
                break;
            }
            '/' if chars.peek().map(|&(_, n)| n) == Some('*') => {
                chars.next();
                code.push_str("  ");
                has_comment = true;
                *in_block_comment = true;
            }
            _ => code.push(c),
        }
    }
    if let Some((_, start)) = quote {
        strings.push((start, line.len()));
    }
    LineScan {
        code,
        strings,
        has_comment,
    }
}

fn blank(code: &mut String, c: char) {
    for _ in 0..c.len_utf8() {
        code.push(' ');
    }
}

/// 1-based character column of a byte offset.
pub(crate) fn char_column(line: &str, byte: usize) -> u32 {
    line.get(..byte).map_or(0, |s| s.chars().count()) as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_line_comments_but_keeps_offsets() {
        let mut in_block = false;
        let s = scan_line(r#"CLICK "a // b" // tail {"#, &mut in_block);
        assert_eq!(s.code.len(), r#"CLICK "a // b" // tail {"#.len());
        assert!(s.code.contains(r#""a // b""#));
        assert!(!s.code.contains("tail"));
        assert_eq!(s.braces().count(), 0);
        assert!(s.has_comment);
    }

    #[test]
    fn block_comment_spans_lines() {
        let mut in_block = false;
        let a = scan_line("PAGE A { /* open", &mut in_block);
        assert!(in_block);
        assert_eq!(a.braces().collect::<Vec<_>>(), vec!['{']);
        let b = scan_line("} still comment */ }", &mut in_block);
        assert!(!in_block);
        assert_eq!(b.braces().collect::<Vec<_>>(), vec!['}']);
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let mut in_block = false;
        let s = scan_line(r#"FIELD x = CSS "div{a}" {"#, &mut in_block);
        assert_eq!(s.braces().collect::<Vec<_>>(), vec!['{']);
    }
}
