use super::{PResult, Parser};
use crate::ast::{Expression, Selector, SelectorModifier, SelectorType, Target};
use crate::lexer::TokenKind;

impl Parser {
    // -- Expressions --------------------------------------------------

    /// Literals, `name`, `Page.name` and `{{ENV}}`. There are no operators.
    pub(super) fn parse_expression(&mut self) -> PResult<Expression> {
        match self.peek_kind() {
            TokenKind::String => Ok(Expression::StringLiteral {
                value: self.advance().value,
            }),
            TokenKind::Number => {
                let value = self.parse_number_value()?;
                Ok(Expression::NumberLiteral { value })
            }
            TokenKind::Boolean => {
                let tok = self.advance();
                Ok(Expression::BooleanLiteral {
                    value: tok.value.eq_ignore_ascii_case("true"),
                })
            }
            TokenKind::EnvVar => Ok(Expression::EnvVarReference {
                name: self.advance().value,
            }),
            TokenKind::Identifier => {
                let (page, name) = self.parse_qualified_name();
                Ok(Expression::VariableReference { page, name })
            }
            _ => Err(self.fail("Expected an expression")),
        }
    }

    pub(super) fn is_expression_start(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::String
                | TokenKind::Number
                | TokenKind::Boolean
                | TokenKind::EnvVar
                | TokenKind::Identifier
        )
    }

    /// Comma-separated expressions, at least one.
    pub(super) fn parse_expression_list(&mut self) -> PResult<Vec<Expression>> {
        let mut items = vec![self.parse_expression()?];
        while self.eat(TokenKind::Comma) {
            items.push(self.parse_expression()?);
        }
        Ok(items)
    }

    /// `name` or `Qualifier.name`; the current token must be an identifier.
    fn parse_qualified_name(&mut self) -> (Option<String>, String) {
        let first = self.advance().value;
        if self.check(TokenKind::Dot) && self.peek_kind_at(1) == TokenKind::Identifier {
            self.advance();
            let second = self.advance().value;
            (Some(first), second)
        } else {
            (None, first)
        }
    }

    pub(super) fn parse_number_value(&mut self) -> PResult<f64> {
        if !self.check(TokenKind::Number) {
            return Err(self.fail("Expected a number"));
        }
        let tok = self.advance();
        tok.value.parse::<f64>().map_err(|_| {
            crate::error::ParseError::new(
                format!("Invalid number '{}'", tok.value),
                tok.line,
                tok.column,
            )
        })
    }

    /// A non-negative integer (row index, limit, tab index).
    pub(super) fn parse_integer(&mut self, message: &str) -> PResult<u64> {
        if !self.check(TokenKind::Number) {
            return Err(self.fail(message));
        }
        let tok = self.advance();
        tok.value.parse::<u64>().map_err(|_| {
            crate::error::ParseError::new(
                format!("Expected a non-negative integer, found '{}'", tok.value),
                tok.line,
                tok.column,
            )
        })
    }

    /// A bare string literal value.
    pub(super) fn parse_string(&mut self, message: &str) -> PResult<String> {
        if !self.check(TokenKind::String) {
            return Err(self.fail(message));
        }
        Ok(self.advance().value)
    }

    // -- Targets ------------------------------------------------------

    pub(super) fn parse_target(&mut self) -> PResult<Target> {
        match self.peek_kind() {
            TokenKind::String if !self.string_has_modifiers() => Ok(Target::Text {
                text: self.advance().value,
            }),
            TokenKind::Identifier => {
                let (page, field) = self.parse_qualified_name();
                Ok(Target::Field { page, field })
            }
            k if is_selector_start(k) => Ok(Target::Selector {
                selector: self.parse_selector()?,
            }),
            _ => Err(self.fail("Expected a target (text, field reference or selector)")),
        }
    }

    /// `"Save" FIRST` is an auto selector with a modifier, not plain text.
    fn string_has_modifiers(&self) -> bool {
        match self.peek_kind_at(1) {
            TokenKind::First | TokenKind::Last | TokenKind::Nth | TokenKind::Without => true,
            TokenKind::With => self.peek_kind_at(2) == TokenKind::Text,
            TokenKind::Has => {
                is_selector_start(self.peek_kind_at(2))
                    || (self.peek_kind_at(2) == TokenKind::Not
                        && is_selector_start(self.peek_kind_at(3)))
            }
            _ => false,
        }
    }

    // -- Selectors ----------------------------------------------------

    pub(super) fn parse_selector(&mut self) -> PResult<Selector> {
        let mut selector = self.parse_selector_base()?;
        selector.modifiers = self.parse_selector_modifiers()?;
        Ok(selector)
    }

    /// A selector without modifiers. HAS operands are parsed this way so
    /// every trailing modifier stays with the outer selector.
    fn parse_selector_base(&mut self) -> PResult<Selector> {
        let kind = self.peek_kind();
        let selector = match kind {
            TokenKind::String => Selector::auto(self.advance().value),
            TokenKind::Role => {
                self.advance();
                let role = self.parse_string("Expected role name string after ROLE")?;
                let name_param = if self.eat(TokenKind::Name) {
                    Some(self.parse_string("Expected accessible name string after NAME")?)
                } else {
                    None
                };
                Selector {
                    selector_type: SelectorType::Role,
                    value: role,
                    name_param,
                    modifiers: Vec::new(),
                }
            }
            TokenKind::Button
            | TokenKind::Link
            | TokenKind::Textbox
            | TokenKind::Checkbox
            | TokenKind::Heading => {
                let role = self.advance().value.to_ascii_lowercase();
                let name = self.parse_string(&format!(
                    "Expected accessible name string after {}",
                    role.to_ascii_uppercase()
                ))?;
                Selector {
                    selector_type: SelectorType::Role,
                    value: role,
                    name_param: Some(name),
                    modifiers: Vec::new(),
                }
            }
            _ => {
                let selector_type = match kind {
                    TokenKind::Label => SelectorType::Label,
                    TokenKind::Placeholder => SelectorType::Placeholder,
                    TokenKind::Alt => SelectorType::Alt,
                    TokenKind::Title => SelectorType::Title,
                    TokenKind::TestId => SelectorType::TestId,
                    TokenKind::Css => SelectorType::Css,
                    TokenKind::Xpath => SelectorType::Xpath,
                    _ => return Err(self.fail("Expected a selector")),
                };
                let keyword = self.advance().value;
                let value = self.parse_string(&format!("Expected string after {}", keyword))?;
                Selector {
                    selector_type,
                    value,
                    name_param: None,
                    modifiers: Vec::new(),
                }
            }
        };
        Ok(selector)
    }

    fn parse_selector_modifiers(&mut self) -> PResult<Vec<SelectorModifier>> {
        let mut modifiers = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::First => {
                    self.advance();
                    modifiers.push(SelectorModifier::First);
                }
                TokenKind::Last => {
                    self.advance();
                    modifiers.push(SelectorModifier::Last);
                }
                TokenKind::Nth => {
                    self.advance();
                    let index = self.parse_integer("Expected index after NTH")?;
                    modifiers.push(SelectorModifier::Nth {
                        index: u32::try_from(index).unwrap_or(u32::MAX),
                    });
                }
                TokenKind::With if self.peek_kind_at(1) == TokenKind::Text => {
                    self.advance();
                    self.advance();
                    let text = self.parse_string("Expected string after WITH TEXT")?;
                    modifiers.push(SelectorModifier::WithText { text });
                }
                TokenKind::Without => {
                    self.advance();
                    self.consume(TokenKind::Text, "Expected TEXT after WITHOUT");
                    let text = self.parse_string("Expected string after WITHOUT TEXT")?;
                    modifiers.push(SelectorModifier::WithoutText { text });
                }
                TokenKind::Has if is_selector_start(self.peek_kind_at(1)) => {
                    self.advance();
                    let inner = self.parse_selector_base()?;
                    modifiers.push(SelectorModifier::Has {
                        selector: Box::new(inner),
                    });
                }
                TokenKind::Has
                    if self.peek_kind_at(1) == TokenKind::Not
                        && is_selector_start(self.peek_kind_at(2)) =>
                {
                    self.advance();
                    self.advance();
                    let inner = self.parse_selector_base()?;
                    modifiers.push(SelectorModifier::HasNot {
                        selector: Box::new(inner),
                    });
                }
                _ => return Ok(modifiers),
            }
        }
    }
}

pub(super) fn is_selector_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::String
            | TokenKind::Role
            | TokenKind::Button
            | TokenKind::Link
            | TokenKind::Textbox
            | TokenKind::Checkbox
            | TokenKind::Heading
            | TokenKind::Label
            | TokenKind::Placeholder
            | TokenKind::Alt
            | TokenKind::Title
            | TokenKind::TestId
            | TokenKind::Css
            | TokenKind::Xpath
    )
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::parser::parse_source;

    fn first_statement(body: &str) -> Statement {
        let src = format!("FEATURE F {{\n  SCENARIO \"s\" {{\n    {}\n  }}\n}}", body);
        let result = parse_source(&src);
        assert!(result.errors.is_empty(), "{}: {:?}", body, result.errors);
        result.program.features[0].scenarios[0].statements[0].clone()
    }

    #[test]
    fn text_field_and_qualified_targets() {
        match first_statement(r#"CLICK "Submit""#) {
            Statement::Click(s) => assert_eq!(s.target.text(), Some("Submit")),
            other => panic!("unexpected {:?}", other),
        }
        match first_statement("CLICK LoginPage.submit") {
            Statement::Click(s) => assert_eq!(
                s.target,
                Target::Field {
                    page: Some("LoginPage".into()),
                    field: "submit".into()
                }
            ),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn selector_with_modifiers() {
        let stmt = first_statement(r#"CLICK CSS ".row" WITH TEXT "Alice" HAS BUTTON "Edit" NTH 2"#);
        let Statement::Click(s) = stmt else {
            panic!("expected click");
        };
        let Target::Selector { selector } = s.target else {
            panic!("expected selector target");
        };
        assert_eq!(selector.selector_type, SelectorType::Css);
        assert_eq!(selector.modifiers.len(), 3);
        assert_eq!(
            selector.modifiers[0],
            SelectorModifier::WithText {
                text: "Alice".into()
            }
        );
        let SelectorModifier::Has { selector: inner } = &selector.modifiers[1] else {
            panic!("expected HAS, got {:?}", selector.modifiers[1]);
        };
        assert_eq!(inner.value, "button");
        assert!(inner.modifiers.is_empty());
        assert_eq!(selector.modifiers[2], SelectorModifier::Nth { index: 2 });
    }

    #[test]
    fn modifiers_after_has_not_stay_on_outer_selector() {
        let stmt = first_statement(r#"CLICK CSS "li" HAS NOT TEXTBOX "Note" FIRST"#);
        let Statement::Click(s) = stmt else {
            panic!("expected click");
        };
        let Target::Selector { selector } = s.target else {
            panic!("expected selector target");
        };
        assert_eq!(selector.modifiers.len(), 2);
        let SelectorModifier::HasNot { selector: inner } = &selector.modifiers[0] else {
            panic!("expected HAS NOT, got {:?}", selector.modifiers[0]);
        };
        assert_eq!(inner.name_param.as_deref(), Some("Note"));
        assert!(inner.modifiers.is_empty());
        assert_eq!(selector.modifiers[1], SelectorModifier::First);
    }

    #[test]
    fn string_with_modifier_becomes_auto_selector() {
        let Statement::Click(s) = first_statement(r#"CLICK "Delete" LAST"#) else {
            panic!("expected click");
        };
        let Target::Selector { selector } = s.target else {
            panic!("expected selector target");
        };
        assert_eq!(selector.selector_type, SelectorType::Auto);
        assert_eq!(selector.modifiers, vec![SelectorModifier::Last]);
    }

    #[test]
    fn fill_value_is_not_a_modifier() {
        let Statement::Fill(s) = first_statement(r##"FILL CSS "#q" WITH "rust""##) else {
            panic!("expected fill");
        };
        let Target::Selector { selector } = &s.target else {
            panic!("expected selector target");
        };
        assert!(selector.modifiers.is_empty());
        assert_eq!(
            s.value,
            Expression::StringLiteral {
                value: "rust".into()
            }
        );
    }

    #[test]
    fn expression_forms() {
        let Statement::Log(s) = first_statement("LOG {{BASE_URL}}") else {
            panic!("expected log");
        };
        assert_eq!(
            s.message,
            Expression::EnvVarReference {
                name: "BASE_URL".into()
            }
        );
        let Statement::Log(s) = first_statement("LOG -2.5") else {
            panic!("expected log");
        };
        assert_eq!(s.message, Expression::NumberLiteral { value: -2.5 });
        let Statement::Log(s) = first_statement("LOG false") else {
            panic!("expected log");
        };
        assert_eq!(s.message, Expression::BooleanLiteral { value: false });
    }
}
