use super::declarations::is_var_type;
use super::{PResult, Parser};
use crate::ast::*;
use crate::lexer::TokenKind;

impl Parser {
    /// A statement led by TEXT/NUMBER/FLAG/LIST. Only the exact shape
    /// `varType name = (COUNT | utility keyword | Table [)` takes the
    /// count/utility/column-access path; anything else is a plain
    /// declaration.
    pub(super) fn parse_typed_assignment(&mut self, line: u32) -> PResult<Statement> {
        if !self.at_function_assignment() {
            let var_type = self.parse_var_type()?;
            let name = self.consume_identifier("Expected variable name");
            self.consume(TokenKind::Equals, "Expected '=' after variable name");
            let value = self.parse_expression()?;
            return Ok(Statement::VariableDeclaration(VariableDeclarationStatement {
                var_type,
                name,
                value,
                line,
            }));
        }

        let var_type = self.parse_var_type()?;
        let variable = self.advance().value;
        self.advance(); // '='

        match self.peek_kind() {
            TokenKind::Count => {
                self.advance();
                let table_ref = self.parse_table_ref()?;
                let where_clause = self.parse_where()?;
                Ok(Statement::Count(CountStatement {
                    variable,
                    table_ref,
                    where_clause,
                    line,
                }))
            }
            TokenKind::Identifier => {
                let table_ref = self.parse_table_ref()?;
                self.advance(); // '['
                let index = self.parse_integer("Expected row index")?;
                self.consume(TokenKind::RBracket, "Expected ']' after row index");
                self.consume(TokenKind::Dot, "Expected '.' before column name");
                let column = self.consume_identifier("Expected column name");
                Ok(Statement::ColumnAccess(ColumnAccessStatement {
                    var_type,
                    variable,
                    table_ref,
                    index,
                    column,
                    line,
                }))
            }
            _ => {
                let mut chain = vec![self.parse_utility_function(false)?];
                while self.eat(TokenKind::Then) {
                    chain.push(self.parse_utility_function(true)?);
                }
                Ok(Statement::UtilityAssignment(UtilityAssignmentStatement {
                    var_type,
                    variable,
                    chain,
                    line,
                }))
            }
        }
    }

    fn at_function_assignment(&self) -> bool {
        if !(is_var_type(self.peek_kind_at(0))
            && self.peek_kind_at(1) == TokenKind::Identifier
            && self.peek_kind_at(2) == TokenKind::Equals)
        {
            return false;
        }
        let fourth = self.peek_kind_at(3);
        fourth == TokenKind::Count
            || is_utility_keyword(fourth)
            || (fourth == TokenKind::Identifier && self.peek_kind_at(4) == TokenKind::LBracket)
    }

    /// Chained calls (`THEN ...`) take the previous result as input and
    /// omit their own input operand.
    fn parse_utility_function(&mut self, chained: bool) -> PResult<UtilityFunction> {
        let tok = self.advance();
        let f = match tok.kind {
            TokenKind::Trim => UtilityFunction::Trim {
                input: self.utility_input(chained)?,
            },
            TokenKind::Uppercase => UtilityFunction::Uppercase {
                input: self.utility_input(chained)?,
            },
            TokenKind::Lowercase => UtilityFunction::Lowercase {
                input: self.utility_input(chained)?,
            },
            TokenKind::Length => UtilityFunction::Length {
                input: self.utility_input(chained)?,
            },
            TokenKind::Absolute => UtilityFunction::Absolute {
                input: self.utility_input(chained)?,
            },
            TokenKind::Replace => {
                let input = self.utility_input(chained)?;
                let search = self.parse_expression()?;
                self.consume(TokenKind::With, "Expected WITH after search value");
                let replacement = self.parse_expression()?;
                UtilityFunction::Replace {
                    input,
                    search,
                    replacement,
                }
            }
            TokenKind::Substring => {
                let input = self.utility_input(chained)?;
                let start = self.parse_expression()?;
                let end = if self.eat(TokenKind::Comma) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                UtilityFunction::Substring { input, start, end }
            }
            TokenKind::Split => {
                let input = self.utility_input(chained)?;
                self.consume(TokenKind::By, "Expected BY after SPLIT input");
                let delimiter = self.parse_expression()?;
                UtilityFunction::Split { input, delimiter }
            }
            TokenKind::Join => {
                let input = self.utility_input(chained)?;
                self.consume(TokenKind::With, "Expected WITH after JOIN input");
                let delimiter = self.parse_expression()?;
                UtilityFunction::Join { input, delimiter }
            }
            TokenKind::Concat => {
                let input = self.utility_input(chained)?;
                let mut parts = Vec::new();
                if chained {
                    parts.push(self.parse_expression()?);
                }
                while self.eat(TokenKind::Comma) {
                    parts.push(self.parse_expression()?);
                }
                UtilityFunction::Concat { input, parts }
            }
            TokenKind::Today => UtilityFunction::Today,
            TokenKind::Now => UtilityFunction::Now,
            TokenKind::Uuid => UtilityFunction::Uuid,
            TokenKind::Add | TokenKind::Subtract => {
                let amount = self.parse_expression()?;
                let unit = self.parse_date_unit()?;
                let input = if chained {
                    None
                } else if tok.kind == TokenKind::Add {
                    self.consume(TokenKind::To, "Expected TO after date unit");
                    Some(self.parse_expression()?)
                } else {
                    self.consume(TokenKind::From, "Expected FROM after date unit");
                    Some(self.parse_expression()?)
                };
                if tok.kind == TokenKind::Add {
                    UtilityFunction::AddDate {
                        amount,
                        unit,
                        input,
                    }
                } else {
                    UtilityFunction::SubtractDate {
                        amount,
                        unit,
                        input,
                    }
                }
            }
            TokenKind::Format => {
                let input = self.utility_input(chained)?;
                self.consume(TokenKind::As, "Expected AS after FORMAT input");
                let pattern = self.parse_expression()?;
                UtilityFunction::FormatDate { input, pattern }
            }
            TokenKind::Round => {
                let input = self.utility_input(chained)?;
                let decimals = if self.eat(TokenKind::To) {
                    let n = self.parse_expression()?;
                    self.consume(TokenKind::Decimals, "Expected DECIMALS after ROUND TO n");
                    Some(n)
                } else {
                    None
                };
                UtilityFunction::Round { input, decimals }
            }
            TokenKind::Convert => {
                let input = self.utility_input(chained)?;
                self.consume(TokenKind::To, "Expected TO after CONVERT input");
                let target = self.parse_var_type()?;
                UtilityFunction::Convert { input, target }
            }
            TokenKind::Generate => UtilityFunction::Generate {
                pattern: self.parse_expression()?,
            },
            TokenKind::Random => {
                self.consume(TokenKind::NumberType, "Expected NUMBER after RANDOM");
                self.consume(TokenKind::From, "Expected FROM after RANDOM NUMBER");
                let min = self.parse_expression()?;
                self.consume(TokenKind::To, "Expected TO after minimum");
                let max = self.parse_expression()?;
                UtilityFunction::RandomNumber { min, max }
            }
            _ => {
                return Err(crate::error::ParseError::new(
                    format!("Expected a utility function, found '{}'", tok.value),
                    tok.line,
                    tok.column,
                ))
            }
        };
        Ok(f)
    }

    fn utility_input(&mut self, chained: bool) -> PResult<Option<Expression>> {
        if chained {
            Ok(None)
        } else {
            self.parse_expression().map(Some)
        }
    }

    fn parse_date_unit(&mut self) -> PResult<DateUnit> {
        let unit = match self.peek_kind() {
            TokenKind::Days => DateUnit::Days,
            TokenKind::Months => DateUnit::Months,
            TokenKind::Years => DateUnit::Years,
            _ => return Err(self.fail("Expected DAYS, MONTHS or YEARS")),
        };
        self.advance();
        Ok(unit)
    }
}

fn is_utility_keyword(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Trim
            | TokenKind::Uppercase
            | TokenKind::Lowercase
            | TokenKind::Length
            | TokenKind::Replace
            | TokenKind::Substring
            | TokenKind::Split
            | TokenKind::Join
            | TokenKind::Concat
            | TokenKind::Today
            | TokenKind::Now
            | TokenKind::Add
            | TokenKind::Subtract
            | TokenKind::Format
            | TokenKind::Round
            | TokenKind::Absolute
            | TokenKind::Convert
            | TokenKind::Generate
            | TokenKind::Random
            | TokenKind::Uuid
    )
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::parser::parse_source;

    fn statement(body: &str) -> Statement {
        let src = format!("FEATURE F {{\n  SCENARIO \"s\" {{\n    {}\n  }}\n}}", body);
        let result = parse_source(&src);
        assert!(result.errors.is_empty(), "{}: {:?}", body, result.errors);
        result.program.features[0].scenarios[0].statements[0].clone()
    }

    fn chain(body: &str) -> Vec<UtilityFunction> {
        match statement(body) {
            Statement::UtilityAssignment(u) => u.chain,
            other => panic!("expected utility assignment, got {:?}", other),
        }
    }

    #[test]
    fn plain_declaration_when_lookahead_fails() {
        // a variable named like a table but without `[` is an ordinary value
        let Statement::VariableDeclaration(v) = statement("TEXT copy = original") else {
            panic!("expected declaration");
        };
        assert_eq!(v.name, "copy");
        assert_eq!(
            v.value,
            Expression::VariableReference {
                page: None,
                name: "original".into()
            }
        );
    }

    #[test]
    fn chained_calls_omit_input() {
        let c = chain(r#"TEXT s = TRIM raw THEN UPPERCASE THEN REPLACE " " WITH "-""#);
        assert_eq!(c.len(), 3);
        assert!(matches!(&c[0], UtilityFunction::Trim { input: Some(_) }));
        assert!(matches!(&c[1], UtilityFunction::Uppercase { input: None }));
        assert!(matches!(&c[2], UtilityFunction::Replace { input: None, .. }));
    }

    #[test]
    fn date_arithmetic() {
        let c = chain("TEXT due = SUBTRACT 1 MONTHS FROM start");
        assert!(matches!(
            &c[0],
            UtilityFunction::SubtractDate {
                unit: DateUnit::Months,
                input: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn date_functions_chain() {
        let c = chain(r#"TEXT due = TODAY THEN ADD 7 DAYS THEN FORMAT AS "yyyy-MM-dd""#);
        assert_eq!(c.len(), 3);
        assert_eq!(c[0], UtilityFunction::Today);
        assert!(matches!(
            &c[1],
            UtilityFunction::AddDate {
                unit: DateUnit::Days,
                input: None,
                ..
            }
        ));
        assert!(matches!(&c[2], UtilityFunction::FormatDate { input: None, .. }));
    }

    #[test]
    fn generators_and_numbers() {
        assert_eq!(chain("TEXT id = UUID"), vec![UtilityFunction::Uuid]);
        assert!(matches!(
            chain("NUMBER n = RANDOM NUMBER FROM 1 TO 6")[0],
            UtilityFunction::RandomNumber { .. }
        ));
        assert!(matches!(
            chain("NUMBER p = ROUND price TO 2 DECIMALS")[0],
            UtilityFunction::Round {
                decimals: Some(_),
                ..
            }
        ));
        assert!(matches!(
            chain("NUMBER n = CONVERT raw TO NUMBER")[0],
            UtilityFunction::Convert {
                target: VarType::Number,
                ..
            }
        ));
    }

    #[test]
    fn concat_parts() {
        let c = chain(r#"TEXT full = CONCAT first, " ", last"#);
        let UtilityFunction::Concat { input, parts } = &c[0] else {
            panic!("expected concat");
        };
        assert!(input.is_some());
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn column_access_and_count() {
        let Statement::ColumnAccess(c) = statement("TEXT email = Users[2].email") else {
            panic!("expected column access");
        };
        assert_eq!((c.table_ref.table_name.as_str(), c.index, c.column.as_str()), ("Users", 2, "email"));
        let Statement::Count(n) = statement("NUMBER n = COUNT Users") else {
            panic!("expected count");
        };
        assert!(n.where_clause.is_none());
    }
}
