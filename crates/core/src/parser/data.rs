use super::{PResult, Parser};
use crate::ast::*;
use crate::lexer::TokenKind;

impl Parser {
    /// `LOAD name FROM "table" (WHERE cond)?`
    pub(super) fn parse_load(&mut self, line: u32) -> PResult<Statement> {
        self.advance();
        let variable = self.consume_identifier("Expected variable name after LOAD");
        self.consume(TokenKind::From, "Expected FROM after variable name");
        let table_name = match self.peek_kind() {
            TokenKind::String | TokenKind::Identifier => self.advance().value,
            _ => return Err(self.fail("Expected table name after FROM")),
        };
        let where_clause = self.parse_where()?;
        Ok(Statement::Load(LoadStatement {
            variable,
            table_name,
            where_clause,
            line,
        }))
    }

    /// `FOR EACH item IN collection { stmt* }`
    pub(super) fn parse_for_each(&mut self, line: u32) -> PResult<Statement> {
        self.advance();
        self.consume(TokenKind::Each, "Expected EACH after FOR");
        let item = self.consume_identifier("Expected loop variable name");
        self.consume(TokenKind::In, "Expected IN after loop variable");
        let collection = self.consume_identifier("Expected collection name after IN");
        let statements = self.nested(|p| Ok(p.parse_block("FOR EACH body")))?;
        Ok(Statement::ForEach(ForEachStatement {
            item,
            collection,
            statements,
            line,
        }))
    }

    /// `ROW name = Table (WHERE cond)? (ORDER BY ..)?`
    pub(super) fn parse_row(&mut self, line: u32) -> PResult<Statement> {
        self.advance();
        let variable = self.consume_identifier("Expected variable name after ROW");
        self.consume(TokenKind::Equals, "Expected '=' after variable name");
        let table_ref = self.parse_table_ref()?;
        let where_clause = self.parse_where()?;
        let order_by = self.parse_order_by()?;
        Ok(Statement::Row(RowStatement {
            variable,
            table_ref,
            where_clause,
            order_by,
            line,
        }))
    }

    /// `ROWS name = Table (WHERE ..)? (ORDER BY ..)? (LIMIT n)? (OFFSET n)?`
    pub(super) fn parse_rows(&mut self, line: u32) -> PResult<Statement> {
        self.advance();
        let variable = self.consume_identifier("Expected variable name after ROWS");
        self.consume(TokenKind::Equals, "Expected '=' after variable name");
        let table_ref = self.parse_table_ref()?;
        let where_clause = self.parse_where()?;
        let order_by = self.parse_order_by()?;
        let limit = if self.eat(TokenKind::Limit) {
            Some(self.parse_integer("Expected a number after LIMIT")?)
        } else {
            None
        };
        let offset = if self.eat(TokenKind::Offset) {
            Some(self.parse_integer("Expected a number after OFFSET")?)
        } else {
            None
        };
        Ok(Statement::Rows(RowsStatement {
            variable,
            table_ref,
            where_clause,
            order_by,
            limit,
            offset,
            line,
        }))
    }

    pub(super) fn parse_table_ref(&mut self) -> PResult<TableReference> {
        if !self.check(TokenKind::Identifier) {
            return Err(self.fail("Expected table name"));
        }
        Ok(TableReference {
            table_name: self.advance().value,
        })
    }

    pub(super) fn parse_where(&mut self) -> PResult<Option<DataCondition>> {
        if self.eat(TokenKind::Where) {
            Ok(Some(self.parse_condition()?))
        } else {
            Ok(None)
        }
    }

    fn parse_order_by(&mut self) -> PResult<Vec<OrderBy>> {
        let mut order = Vec::new();
        if !self.eat(TokenKind::Order) {
            return Ok(order);
        }
        self.consume(TokenKind::By, "Expected BY after ORDER");
        loop {
            if !self.check(TokenKind::Identifier) {
                return Err(self.fail("Expected column name in ORDER BY"));
            }
            let column = self.advance().value;
            let direction = if self.eat(TokenKind::Desc) {
                SortDirection::Desc
            } else {
                self.eat(TokenKind::Asc);
                SortDirection::Asc
            };
            order.push(OrderBy { column, direction });
            if !self.eat(TokenKind::Comma) {
                return Ok(order);
            }
        }
    }

    // -- Conditions ---------------------------------------------------
    //
    // or -> and -> not -> primary

    pub(super) fn parse_condition(&mut self) -> PResult<DataCondition> {
        let mut left = self.parse_and_condition()?;
        while self.eat(TokenKind::Or) {
            let right = self.parse_and_condition()?;
            left = DataCondition::Or {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and_condition(&mut self) -> PResult<DataCondition> {
        let mut left = self.parse_not_condition()?;
        while self.eat(TokenKind::And) {
            let right = self.parse_not_condition()?;
            left = DataCondition::And {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not_condition(&mut self) -> PResult<DataCondition> {
        if self.eat(TokenKind::Not) {
            let inner = self.nested(Self::parse_not_condition)?;
            return Ok(DataCondition::Not {
                condition: Box::new(inner),
            });
        }
        self.parse_primary_condition()
    }

    fn parse_primary_condition(&mut self) -> PResult<DataCondition> {
        if self.eat(TokenKind::LParen) {
            let inner = self.nested(Self::parse_condition)?;
            self.consume(TokenKind::RParen, "Expected ')' to close condition");
            return Ok(inner);
        }
        if !self.check(TokenKind::Identifier) {
            return Err(self.fail("Expected column name in condition"));
        }
        let column = self.advance().value;

        let operator = match self.peek_kind() {
            TokenKind::In => {
                self.advance();
                let values = self.parse_value_list()?;
                return Ok(comparison_list(column, ComparisonOperator::In, values));
            }
            TokenKind::Not => {
                self.advance();
                self.consume(TokenKind::In, "Expected IN after NOT");
                let values = self.parse_value_list()?;
                return Ok(comparison_list(column, ComparisonOperator::NotIn, values));
            }
            TokenKind::Is => {
                self.advance();
                let negated = self.eat(TokenKind::Not);
                let operator = match (self.peek_kind(), negated) {
                    (TokenKind::Empty, false) => ComparisonOperator::IsEmpty,
                    (TokenKind::Empty, true) => ComparisonOperator::IsNotEmpty,
                    (TokenKind::Null, false) => ComparisonOperator::IsNull,
                    (TokenKind::Null, true) => ComparisonOperator::IsNotNull,
                    _ => return Err(self.fail("Expected EMPTY or NULL after IS")),
                };
                self.advance();
                return Ok(DataCondition::Comparison {
                    column,
                    operator,
                    value: None,
                    values: None,
                });
            }
            TokenKind::Contains => ComparisonOperator::Contains,
            TokenKind::Matches => ComparisonOperator::Matches,
            TokenKind::Starts | TokenKind::Ends => {
                let tok = self.advance();
                self.consume(
                    TokenKind::With,
                    &format!("Expected WITH after {}", tok.value),
                );
                let value = self.parse_expression()?;
                let operator = if tok.kind == TokenKind::Starts {
                    ComparisonOperator::StartsWith
                } else {
                    ComparisonOperator::EndsWith
                };
                return Ok(comparison(column, operator, value));
            }
            TokenKind::Equals | TokenKind::EqualEqual => ComparisonOperator::Eq,
            TokenKind::NotEqual => ComparisonOperator::Ne,
            TokenKind::Less => ComparisonOperator::Lt,
            TokenKind::LessEqual => ComparisonOperator::Le,
            TokenKind::Greater => ComparisonOperator::Gt,
            TokenKind::GreaterEqual => ComparisonOperator::Ge,
            _ => {
                return Err(self.fail(&format!(
                    "Expected a comparison operator after column '{}'",
                    column
                )))
            }
        };
        self.advance();
        let value = self.parse_expression()?;
        Ok(comparison(column, operator, value))
    }

    /// `[ expr (, expr)* ]`, possibly empty.
    fn parse_value_list(&mut self) -> PResult<Vec<Expression>> {
        self.consume(TokenKind::LBracket, "Expected '[' to open value list");
        let mut values = Vec::new();
        if !self.check(TokenKind::RBracket) {
            values = self.parse_expression_list()?;
        }
        self.consume(TokenKind::RBracket, "Expected ']' to close value list");
        Ok(values)
    }
}

fn comparison(column: String, operator: ComparisonOperator, value: Expression) -> DataCondition {
    DataCondition::Comparison {
        column,
        operator,
        value: Some(value),
        values: None,
    }
}

fn comparison_list(
    column: String,
    operator: ComparisonOperator,
    values: Vec<Expression>,
) -> DataCondition {
    DataCondition::Comparison {
        column,
        operator,
        value: None,
        values: Some(values),
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::parser::parse_source;

    fn where_of(cond: &str) -> DataCondition {
        let src = format!(
            "FEATURE F {{\n  SCENARIO \"s\" {{\n    ROW r = Users WHERE {}\n  }}\n}}",
            cond
        );
        let result = parse_source(&src);
        assert!(result.errors.is_empty(), "{}: {:?}", cond, result.errors);
        match &result.program.features[0].scenarios[0].statements[0] {
            Statement::Row(r) => r.where_clause.clone().expect("where clause"),
            other => panic!("expected row, got {:?}", other),
        }
    }

    fn op(cond: &DataCondition) -> ComparisonOperator {
        match cond {
            DataCondition::Comparison { operator, .. } => *operator,
            other => panic!("expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn single_equals_normalizes() {
        assert_eq!(op(&where_of("age = 30")), ComparisonOperator::Eq);
        assert_eq!(op(&where_of("age == 30")), ComparisonOperator::Eq);
        assert_eq!(ComparisonOperator::Eq.as_str(), "==");
    }

    #[test]
    fn precedence_or_and_not() {
        // a OR b AND NOT c  ==>  Or(a, And(b, Not(c)))
        let cond = where_of("a = 1 OR b = 2 AND NOT c = 3");
        let DataCondition::Or { left, right } = cond else {
            panic!("expected OR at the root");
        };
        assert_eq!(op(&left), ComparisonOperator::Eq);
        let DataCondition::And { right: inner, .. } = *right else {
            panic!("expected AND under OR");
        };
        assert!(matches!(*inner, DataCondition::Not { .. }));
    }

    #[test]
    fn parentheses_override_precedence() {
        let cond = where_of("(a = 1 OR b = 2) AND c = 3");
        assert!(matches!(cond, DataCondition::And { .. }));
    }

    #[test]
    fn list_and_null_operators() {
        let cond = where_of(r#"status IN ["open", "pending"]"#);
        match &cond {
            DataCondition::Comparison {
                operator, values, ..
            } => {
                assert_eq!(*operator, ComparisonOperator::In);
                assert_eq!(values.as_ref().map(Vec::len), Some(2));
            }
            other => panic!("{:?}", other),
        }
        assert_eq!(op(&where_of("tag NOT IN []")), ComparisonOperator::NotIn);
        assert_eq!(op(&where_of("email IS NOT NULL")), ComparisonOperator::IsNotNull);
        assert_eq!(op(&where_of("notes IS EMPTY")), ComparisonOperator::IsEmpty);
        assert_eq!(op(&where_of(r#"name STARTS WITH "A""#)), ComparisonOperator::StartsWith);
        assert_eq!(op(&where_of(r#"name ENDS WITH "z""#)), ComparisonOperator::EndsWith);
        assert_eq!(op(&where_of(r#"bio CONTAINS "rust""#)), ComparisonOperator::Contains);
        assert_eq!(op(&where_of("score >= 10")), ComparisonOperator::Ge);
    }

    #[test]
    fn rows_clauses() {
        let src = "FEATURE F {\n  SCENARIO \"s\" {\n    ROWS r = Orders WHERE total > 100 ORDER BY placed DESC, id LIMIT 10 OFFSET 20\n  }\n}";
        let result = parse_source(src);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let Statement::Rows(r) = &result.program.features[0].scenarios[0].statements[0] else {
            panic!("expected rows");
        };
        assert_eq!(r.table_ref.table_name, "Orders");
        assert_eq!(r.order_by.len(), 2);
        assert_eq!(r.order_by[0].direction, SortDirection::Desc);
        assert_eq!(r.order_by[1].direction, SortDirection::Asc);
        assert_eq!(r.limit, Some(10));
        assert_eq!(r.offset, Some(20));
    }

    #[test]
    fn missing_operator_is_reported_at_value() {
        let src = "FEATURE F {\n  SCENARIO \"s\" {\n    ROW r = Users WHERE age 30\n    REFRESH\n  }\n}";
        let result = parse_source(src);
        assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
        assert!(result.errors[0].message.contains("comparison operator"));
        assert_eq!(result.program.features[0].scenarios[0].statements.len(), 1);
    }
}
