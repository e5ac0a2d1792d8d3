use serde::{Deserialize, Serialize};
use std::fmt;

/// A syntax error. Every accumulated error becomes one diagnostic marker at
/// its reported 1-based line/column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: u32, column: u32) -> Self {
        ParseError {
            message: message.into(),
            line,
            column,
        }
    }

    /// Serialize to the JSON shape consumed by editor tooling.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "message": self.message,
            "line":    self.line,
            "column":  self.column,
        })
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_position() {
        let e = ParseError::new("Expected '{'", 3, 14);
        assert_eq!(e.to_string(), "3:14: Expected '{'");
    }

    #[test]
    fn json_shape_has_all_fields() {
        let e = ParseError::new("boom", 1, 2);
        let v = e.to_json_value();
        assert_eq!(v["message"], "boom");
        assert_eq!(v["line"], 1);
        assert_eq!(v["column"], 2);
    }
}
