//! Single-pass tokenizer for Vero scripts.
//!
//! Keywords are fixed uppercase literals and are matched case-sensitively:
//! `CLICK` is a keyword, `click` is an identifier. Comments are emitted as
//! tokens so tooling can see them; [`significant_tokens`] drops them before
//! parsing. Lexical problems never abort the scan -- they surface as
//! [`TokenKind::Error`] tokens carrying the message.

use serde::{Deserialize, Serialize};

macro_rules! token_kinds {
    (
        symbols { $($sym:ident => $sdesc:literal,)* }
        keywords { $($kw:ident => $text:literal,)* }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum TokenKind {
            $($sym,)*
            $($kw,)*
        }

        impl TokenKind {
            /// Look up the keyword kind for an exact (case-sensitive) word.
            pub fn keyword(word: &str) -> Option<TokenKind> {
                match word {
                    $($text => Some(TokenKind::$kw),)*
                    _ => None,
                }
            }

            pub fn is_keyword(self) -> bool {
                matches!(self, $(TokenKind::$kw)|*)
            }

            /// Human-readable name used in error messages.
            pub fn describe(self) -> &'static str {
                match self {
                    $(TokenKind::$sym => $sdesc,)*
                    $(TokenKind::$kw => $text,)*
                }
            }
        }

        /// Every keyword spelling, in declaration order.
        pub const KEYWORDS: &[&str] = &[$($text),*];
    };
}

token_kinds! {
    symbols {
        Identifier => "identifier",
        String => "string",
        Number => "number",
        Boolean => "boolean",
        Annotation => "annotation",
        Tag => "tag",
        EnvVar => "environment variable",
        LBrace => "'{'",
        RBrace => "'}'",
        LBracket => "'['",
        RBracket => "']'",
        LParen => "'('",
        RParen => "')'",
        Comma => "','",
        Dot => "'.'",
        Equals => "'='",
        EqualEqual => "'=='",
        NotEqual => "'!='",
        Less => "'<'",
        LessEqual => "'<='",
        Greater => "'>'",
        GreaterEqual => "'>='",
        Comment => "comment",
        Error => "invalid token",
        Eof => "end of input",
    }
    keywords {
        // declarations
        Page => "PAGE",
        Feature => "FEATURE",
        Scenario => "SCENARIO",
        Field => "FIELD",
        Use => "USE",
        Fixture => "FIXTURE",
        With => "WITH",
        Scope => "SCOPE",
        Depends => "DEPENDS",
        On => "ON",
        Auto => "AUTO",
        Option => "OPTION",
        Default => "DEFAULT",
        Setup => "SETUP",
        Teardown => "TEARDOWN",
        Before => "BEFORE",
        After => "AFTER",
        Each => "EACH",
        All => "ALL",
        Returns => "RETURNS",
        Return => "RETURN",
        // variable types
        Text => "TEXT",
        NumberType => "NUMBER",
        Flag => "FLAG",
        List => "LIST",
        // selectors
        Role => "ROLE",
        Name => "NAME",
        Label => "LABEL",
        Placeholder => "PLACEHOLDER",
        Alt => "ALT",
        Title => "TITLE",
        TestId => "TESTID",
        Css => "CSS",
        Xpath => "XPATH",
        Button => "BUTTON",
        Link => "LINK",
        Textbox => "TEXTBOX",
        Checkbox => "CHECKBOX",
        Heading => "HEADING",
        First => "FIRST",
        Last => "LAST",
        Nth => "NTH",
        Without => "WITHOUT",
        Has => "HAS",
        Not => "NOT",
        // interactions
        Click => "CLICK",
        Right => "RIGHT",
        Double => "DOUBLE",
        Force => "FORCE",
        Drag => "DRAG",
        To => "TO",
        Fill => "FILL",
        Open => "OPEN",
        Check => "CHECK",
        Uncheck => "UNCHECK",
        Select => "SELECT",
        From => "FROM",
        Hover => "HOVER",
        Press => "PRESS",
        Scroll => "SCROLL",
        Up => "UP",
        Down => "DOWN",
        Left => "LEFT",
        Wait => "WAIT",
        For => "FOR",
        Seconds => "SECONDS",
        Milliseconds => "MILLISECONDS",
        Refresh => "REFRESH",
        Log => "LOG",
        Take => "TAKE",
        Screenshot => "SCREENSHOT",
        As => "AS",
        Upload => "UPLOAD",
        Do => "DO",
        // assertions
        Verify => "VERIFY",
        Is => "IS",
        Visible => "VISIBLE",
        Hidden => "HIDDEN",
        Enabled => "ENABLED",
        Disabled => "DISABLED",
        Checked => "CHECKED",
        Empty => "EMPTY",
        Focused => "FOCUSED",
        Url => "URL",
        Contains => "CONTAINS",
        Equal => "EQUAL",
        Matches => "MATCHES",
        Count => "COUNT",
        Value => "VALUE",
        Attribute => "ATTRIBUTE",
        Class => "CLASS",
        // data queries
        Load => "LOAD",
        Where => "WHERE",
        In => "IN",
        Row => "ROW",
        Rows => "ROWS",
        Order => "ORDER",
        By => "BY",
        Asc => "ASC",
        Desc => "DESC",
        Limit => "LIMIT",
        Offset => "OFFSET",
        And => "AND",
        Or => "OR",
        Null => "NULL",
        Starts => "STARTS",
        Ends => "ENDS",
        // utility functions
        Then => "THEN",
        Trim => "TRIM",
        Uppercase => "UPPERCASE",
        Lowercase => "LOWERCASE",
        Length => "LENGTH",
        Replace => "REPLACE",
        Substring => "SUBSTRING",
        Split => "SPLIT",
        Join => "JOIN",
        Concat => "CONCAT",
        Today => "TODAY",
        Now => "NOW",
        Add => "ADD",
        Subtract => "SUBTRACT",
        Days => "DAYS",
        Months => "MONTHS",
        Years => "YEARS",
        Format => "FORMAT",
        Round => "ROUND",
        Decimals => "DECIMALS",
        Absolute => "ABSOLUTE",
        Convert => "CONVERT",
        Generate => "GENERATE",
        Random => "RANDOM",
        Uuid => "UUID",
        // browser context
        Switch => "SWITCH",
        New => "NEW",
        Tab => "TAB",
        Close => "CLOSE",
        Accept => "ACCEPT",
        Dismiss => "DISMISS",
        Dialog => "DIALOG",
        Frame => "FRAME",
        Main => "MAIN",
        Download => "DOWNLOAD",
        Set => "SET",
        Get => "GET",
        Cookie => "COOKIE",
        Cookies => "COOKIES",
        Storage => "STORAGE",
        Clear => "CLEAR",
        Into => "INTO",
    }
}

/// Annotation names with a reserved meaning; any other `@name` is a free-form tag.
pub const RESERVED_ANNOTATIONS: &[&str] = &["serial", "skip", "only", "slow", "fixme"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text for words and punctuation; unescaped contents for strings;
    /// the bare name for annotations, tags and env vars; the message for errors.
    pub value: String,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, line: u32, column: u32) -> Self {
        Token {
            kind,
            value: value.into(),
            line,
            column,
        }
    }
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Lexer {
            chars: src.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn push(&mut self, kind: TokenKind, value: impl Into<String>, line: u32, column: u32) {
        self.tokens.push(Token::new(kind, value, line, column));
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(c) = self.peek_at(0) {
            let line = self.line;
            let column = self.column;

            if c.is_whitespace() {
                self.bump();
                continue;
            }

            if c == '/' && self.peek_at(1) == Some('/') {
                let mut text = String::new();
                while let Some(ch) = self.peek_at(0) {
                    if ch == '\n' {
                        break;
                    }
                    text.push(ch);
                    self.bump();
                }
                self.push(TokenKind::Comment, text, line, column);
                continue;
            }

            if c == '/' && self.peek_at(1) == Some('*') {
                self.lex_block_comment(line, column);
                continue;
            }

            if c == '"' || c == '\'' {
                self.lex_string(c, line, column);
                continue;
            }

            if c.is_ascii_digit()
                || (c == '-' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit()))
            {
                self.lex_number(line, column);
                continue;
            }

            if c == '@' {
                self.lex_annotation(line, column);
                continue;
            }

            if c == '{' && self.peek_at(1) == Some('{') && self.env_var_ahead() {
                self.lex_env_var(line, column);
                continue;
            }

            if c.is_alphabetic() || c == '_' {
                self.lex_word(line, column);
                continue;
            }

            self.lex_punct(c, line, column);
        }

        let (line, column) = (self.line, self.column);
        self.push(TokenKind::Eof, "", line, column);
        self.tokens
    }

    fn lex_block_comment(&mut self, line: u32, column: u32) {
        let mut text = String::new();
        text.push(self.bump().unwrap_or('/'));
        text.push(self.bump().unwrap_or('*'));
        loop {
            match self.peek_at(0) {
                None => {
                    self.push(TokenKind::Error, "unterminated block comment", line, column);
                    return;
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.bump();
                    self.bump();
                    text.push_str("*/");
                    break;
                }
                Some(ch) => {
                    text.push(ch);
                    self.bump();
                }
            }
        }
        self.push(TokenKind::Comment, text, line, column);
    }

    fn lex_string(&mut self, quote: char, line: u32, column: u32) {
        self.bump();
        let mut s = String::new();
        loop {
            match self.peek_at(0) {
                None | Some('\n') => {
                    self.push(TokenKind::Error, "unterminated string literal", line, column);
                    return;
                }
                Some(ch) if ch == quote => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.bump() {
                        Some('n') => s.push('\n'),
                        Some('t') => s.push('\t'),
                        Some('\\') => s.push('\\'),
                        Some('"') => s.push('"'),
                        Some('\'') => s.push('\''),
                        Some(other) => {
                            s.push('\\');
                            s.push(other);
                        }
                        None => {
                            self.push(TokenKind::Error, "unterminated escape in string", line, column);
                            return;
                        }
                    }
                }
                Some(ch) => {
                    s.push(ch);
                    self.bump();
                }
            }
        }
        self.push(TokenKind::String, s, line, column);
    }

    fn lex_number(&mut self, line: u32, column: u32) {
        let mut text = String::new();
        if self.peek_at(0) == Some('-') {
            text.push('-');
            self.bump();
        }
        while let Some(ch) = self.peek_at(0).filter(|c| c.is_ascii_digit()) {
            text.push(ch);
            self.bump();
        }
        if self.peek_at(0) == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.bump();
            while let Some(ch) = self.peek_at(0).filter(|c| c.is_ascii_digit()) {
                text.push(ch);
                self.bump();
            }
        }
        self.push(TokenKind::Number, text, line, column);
    }

    fn lex_annotation(&mut self, line: u32, column: u32) {
        self.bump();
        let name = self.take_ident_chars();
        if name.is_empty() {
            self.push(TokenKind::Error, "expected name after '@'", line, column);
            return;
        }
        let kind = if RESERVED_ANNOTATIONS.contains(&name.as_str()) {
            TokenKind::Annotation
        } else {
            TokenKind::Tag
        };
        self.push(kind, name, line, column);
    }

    /// `{{` opens an env var only when an identifier and `}}` follow directly.
    fn env_var_ahead(&self) -> bool {
        let mut i = 2;
        let mut seen = false;
        while let Some(ch) = self.peek_at(i) {
            if ch.is_alphanumeric() || ch == '_' {
                seen = true;
                i += 1;
                continue;
            }
            return seen && ch == '}' && self.peek_at(i + 1) == Some('}');
        }
        false
    }

    fn lex_env_var(&mut self, line: u32, column: u32) {
        self.bump();
        self.bump();
        let name = self.take_ident_chars();
        self.bump();
        self.bump();
        self.push(TokenKind::EnvVar, name, line, column);
    }

    fn lex_word(&mut self, line: u32, column: u32) {
        let word = self.take_ident_chars();
        let kind = match word.as_str() {
            "true" | "false" | "TRUE" | "FALSE" => TokenKind::Boolean,
            w => TokenKind::keyword(w).unwrap_or(TokenKind::Identifier),
        };
        self.push(kind, word, line, column);
    }

    fn take_ident_chars(&mut self) -> String {
        let mut s = String::new();
        while let Some(ch) = self.peek_at(0).filter(|c| c.is_alphanumeric() || *c == '_') {
            s.push(ch);
            self.bump();
        }
        s
    }

    fn lex_punct(&mut self, c: char, line: u32, column: u32) {
        let next = self.peek_at(1);
        let (kind, width) = match (c, next) {
            ('=', Some('=')) => (TokenKind::EqualEqual, 2),
            ('!', Some('=')) => (TokenKind::NotEqual, 2),
            ('<', Some('=')) => (TokenKind::LessEqual, 2),
            ('>', Some('=')) => (TokenKind::GreaterEqual, 2),
            ('=', _) => (TokenKind::Equals, 1),
            ('<', _) => (TokenKind::Less, 1),
            ('>', _) => (TokenKind::Greater, 1),
            ('{', _) => (TokenKind::LBrace, 1),
            ('}', _) => (TokenKind::RBrace, 1),
            ('[', _) => (TokenKind::LBracket, 1),
            (']', _) => (TokenKind::RBracket, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            (',', _) => (TokenKind::Comma, 1),
            ('.', _) => (TokenKind::Dot, 1),
            _ => {
                self.bump();
                self.push(
                    TokenKind::Error,
                    format!("unexpected character '{}'", c),
                    line,
                    column,
                );
                return;
            }
        };
        let mut text = String::new();
        for _ in 0..width {
            if let Some(ch) = self.bump() {
                text.push(ch);
            }
        }
        self.push(kind, text, line, column);
    }
}

/// Tokenize `src`. The stream always ends with a single [`TokenKind::Eof`].
pub fn tokenize(src: &str) -> Vec<Token> {
    Lexer::new(src).run()
}

/// Drop comment tokens, leaving the stream the parser consumes.
pub fn significant_tokens(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Comment)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_are_case_sensitive() {
        assert_eq!(
            kinds("CLICK click"),
            vec![TokenKind::Click, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn positions_are_one_based() {
        let toks = tokenize("PAGE Login {\n  FIELD email = \"Email\"\n}");
        assert_eq!((toks[0].line, toks[0].column), (1, 1));
        assert_eq!((toks[1].line, toks[1].column), (1, 6));
        let field = &toks[3];
        assert_eq!(field.kind, TokenKind::Field);
        assert_eq!((field.line, field.column), (2, 3));
        let s = &toks[6];
        assert_eq!(s.kind, TokenKind::String);
        assert_eq!(s.value, "Email");
        assert_eq!(s.column, 17);
    }

    #[test]
    fn comments_are_emitted_then_filtered() {
        let toks = tokenize("// hello\nCLICK /* inline */ \"x\"");
        assert_eq!(toks[0].kind, TokenKind::Comment);
        assert_eq!(toks[0].value, "// hello");
        assert_eq!(toks[2].kind, TokenKind::Comment);
        let sig = significant_tokens(toks);
        let k: Vec<_> = sig.iter().map(|t| t.kind).collect();
        assert_eq!(k, vec![TokenKind::Click, TokenKind::String, TokenKind::Eof]);
    }

    #[test]
    fn annotations_and_tags() {
        let toks = tokenize("@skip @smoke");
        assert_eq!(toks[0].kind, TokenKind::Annotation);
        assert_eq!(toks[0].value, "skip");
        assert_eq!(toks[1].kind, TokenKind::Tag);
        assert_eq!(toks[1].value, "smoke");
    }

    #[test]
    fn env_var_and_braces() {
        assert_eq!(
            kinds("{{BASE_URL}} { }"),
            vec![
                TokenKind::EnvVar,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("{{"),
            vec![TokenKind::LBrace, TokenKind::LBrace, TokenKind::Eof]
        );
    }

    #[test]
    fn numbers_and_operators() {
        let toks = tokenize("age >= -12.5 == != <");
        let k: Vec<_> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            k,
            vec![
                TokenKind::Identifier,
                TokenKind::GreaterEqual,
                TokenKind::Number,
                TokenKind::EqualEqual,
                TokenKind::NotEqual,
                TokenKind::Less,
                TokenKind::Eof
            ]
        );
        assert_eq!(toks[2].value, "-12.5");
    }

    #[test]
    fn string_escapes_and_single_quotes() {
        let toks = tokenize(r#""a\"b" 'c'"#);
        assert_eq!(toks[0].value, "a\"b");
        assert_eq!(toks[1].value, "c");
    }

    #[test]
    fn lexical_problems_become_error_tokens() {
        let toks = tokenize("CLICK \"open\nCLICK $");
        assert_eq!(toks[1].kind, TokenKind::Error);
        assert_eq!(toks[1].value, "unterminated string literal");
        assert_eq!(toks[2].kind, TokenKind::Click);
        assert_eq!(toks[2].line, 2);
        assert_eq!(toks[3].kind, TokenKind::Error);
        assert_eq!(toks.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn booleans_in_both_cases() {
        assert_eq!(
            kinds("true FALSE"),
            vec![TokenKind::Boolean, TokenKind::Boolean, TokenKind::Eof]
        );
    }
}
