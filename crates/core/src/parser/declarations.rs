use super::{is_boundary, PResult, Parser};
use crate::ast::*;
use crate::lexer::TokenKind;

impl Parser {
    // ──────────────────────────────────────────────
    // PAGE
    // ──────────────────────────────────────────────

    pub(super) fn parse_page(&mut self) -> PResult<Page> {
        let line = self.advance().line;
        let name = self.consume_identifier("Expected page name");
        self.consume(TokenKind::LBrace, "Expected '{' after page name");

        let mut page = Page {
            name,
            fields: Vec::new(),
            variables: Vec::new(),
            actions: Vec::new(),
            line,
        };

        while !self.check(TokenKind::RBrace) && !self.is_at_end() && !is_boundary(self.peek_kind())
        {
            let start = self.pos;
            let member_line = self.cur_line();
            let outcome = match self.peek_kind() {
                TokenKind::Field => self.parse_field().map(|f| page.fields.push(f)),
                k if is_var_type(k) => self.parse_variable().map(|v| page.variables.push(v)),
                TokenKind::Identifier => self.parse_action().map(|a| page.actions.push(a)),
                _ => Err(self.fail("Expected FIELD, a variable or an action in page body")),
            };
            if let Err(e) = outcome {
                self.record(e);
                self.recover_in_block(member_line, is_page_member_start);
            }
            if self.pos == start {
                self.advance();
            }
        }

        self.consume(TokenKind::RBrace, "Expected '}' to close page");
        Ok(page)
    }

    /// `FIELD name = selector`
    fn parse_field(&mut self) -> PResult<Field> {
        let line = self.advance().line;
        let name = self.consume_identifier("Expected field name");
        self.consume(TokenKind::Equals, "Expected '=' after field name");
        let selector = self.parse_selector()?;
        Ok(Field {
            name,
            selector,
            line,
        })
    }

    /// `TEXT name = expr` at page level.
    fn parse_variable(&mut self) -> PResult<Variable> {
        let line = self.cur_line();
        let var_type = self.parse_var_type()?;
        let name = self.consume_identifier("Expected variable name");
        self.consume(TokenKind::Equals, "Expected '=' after variable name");
        let value = self.parse_expression()?;
        Ok(Variable {
            var_type,
            name,
            value,
            line,
        })
    }

    /// `name (WITH p (, p)*)? (RETURNS varType)? { stmt* }`
    fn parse_action(&mut self) -> PResult<ActionDefinition> {
        let tok = self.advance();
        let mut parameters = Vec::new();
        if self.eat(TokenKind::With) {
            loop {
                parameters.push(self.consume_identifier("Expected parameter name"));
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        let return_type = if self.eat(TokenKind::Returns) {
            Some(self.parse_var_type()?)
        } else {
            None
        };
        let statements = self.parse_block("action");
        Ok(ActionDefinition {
            name: tok.value,
            parameters,
            return_type,
            statements,
            line: tok.line,
        })
    }

    pub(super) fn parse_var_type(&mut self) -> PResult<VarType> {
        let var_type = match self.peek_kind() {
            TokenKind::Text => VarType::Text,
            TokenKind::NumberType => VarType::Number,
            TokenKind::Flag => VarType::Flag,
            TokenKind::List => VarType::List,
            _ => return Err(self.fail("Expected TEXT, NUMBER, FLAG or LIST")),
        };
        self.advance();
        Ok(var_type)
    }

    // ──────────────────────────────────────────────
    // FEATURE
    // ──────────────────────────────────────────────

    pub(super) fn parse_feature(&mut self) -> PResult<Feature> {
        let mut annotations = Vec::new();
        while self.check(TokenKind::Annotation) {
            let tok = self.advance();
            match tok.value.as_str() {
                "serial" => annotations.push(FeatureAnnotation::Serial),
                "skip" => annotations.push(FeatureAnnotation::Skip),
                "only" => annotations.push(FeatureAnnotation::Only),
                other => self.record(crate::error::ParseError::new(
                    format!("Annotation '@{}' is not valid on a feature", other),
                    tok.line,
                    tok.column,
                )),
            }
        }
        if !self.check(TokenKind::Feature) {
            return Err(self.fail("Expected FEATURE after annotations"));
        }
        let line = self.advance().line;
        let name = self.parse_declaration_name("Expected feature name");
        self.consume(TokenKind::LBrace, "Expected '{' after feature name");

        let mut feature = Feature {
            name,
            annotations,
            uses: Vec::new(),
            fixture_uses: Vec::new(),
            hooks: Vec::new(),
            scenarios: Vec::new(),
            line,
        };

        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if matches!(
                self.peek_kind(),
                TokenKind::Page | TokenKind::Feature | TokenKind::Fixture
            ) {
                break;
            }
            let start = self.pos;
            let member_line = self.cur_line();
            let outcome = match self.peek_kind() {
                TokenKind::Use => {
                    self.advance();
                    let page_name = self.consume_identifier("Expected page name after USE");
                    feature.uses.push(UseStatement {
                        page_name,
                        line: member_line,
                    });
                    Ok(())
                }
                TokenKind::With => self.parse_fixture_use().map(|u| feature.fixture_uses.push(u)),
                TokenKind::Before | TokenKind::After => {
                    self.parse_hook().map(|h| feature.hooks.push(h))
                }
                TokenKind::Annotation | TokenKind::Scenario => {
                    self.parse_scenario().map(|s| feature.scenarios.push(s))
                }
                _ => Err(self.fail("Expected SCENARIO, USE, WITH FIXTURE or a hook in feature body")),
            };
            if let Err(e) = outcome {
                self.record(e);
                self.recover_in_block(member_line, is_feature_member_start);
            }
            if self.pos == start {
                self.advance();
            }
        }

        self.consume(TokenKind::RBrace, "Expected '}' to close feature");
        Ok(feature)
    }

    /// Feature and scenario names are written bare or quoted.
    fn parse_declaration_name(&mut self, message: &str) -> String {
        if self.check(TokenKind::String) {
            return self.advance().value;
        }
        self.consume_identifier(message)
    }

    /// `WITH FIXTURE name ( opt = expr (, opt = expr)* )?`
    fn parse_fixture_use(&mut self) -> PResult<FixtureUse> {
        let line = self.advance().line;
        self.consume(TokenKind::Fixture, "Expected FIXTURE after WITH");
        let fixture_name = self.consume_identifier("Expected fixture name");
        let mut options = Vec::new();
        if self.eat(TokenKind::LParen) {
            if !self.check(TokenKind::RParen) {
                loop {
                    let name = self.consume_identifier("Expected fixture option name");
                    self.consume(TokenKind::Equals, "Expected '=' after option name");
                    let value = self.parse_expression()?;
                    options.push(FixtureOptionValue { name, value });
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.consume(TokenKind::RParen, "Expected ')' to close fixture options");
        }
        Ok(FixtureUse {
            fixture_name,
            options,
            line,
        })
    }

    /// `BEFORE EACH { .. }`, `AFTER ALL { .. }`
    fn parse_hook(&mut self) -> PResult<Hook> {
        let tok = self.advance();
        let before = tok.kind == TokenKind::Before;
        let hook_type = match (before, self.peek_kind()) {
            (true, TokenKind::Each) => HookType::BeforeEach,
            (true, TokenKind::All) => HookType::BeforeAll,
            (false, TokenKind::Each) => HookType::AfterEach,
            (false, TokenKind::All) => HookType::AfterAll,
            _ => return Err(self.fail(&format!("Expected EACH or ALL after {}", tok.value))),
        };
        self.advance();
        let statements = self.parse_block("hook");
        Ok(Hook {
            hook_type,
            statements,
            line: tok.line,
        })
    }

    // ──────────────────────────────────────────────
    // SCENARIO
    // ──────────────────────────────────────────────

    fn parse_scenario(&mut self) -> PResult<Scenario> {
        let mut annotations = Vec::new();
        while self.check(TokenKind::Annotation) {
            let tok = self.advance();
            self.push_scenario_annotation(&mut annotations, &tok.value, tok.line, tok.column);
        }
        if !self.check(TokenKind::Scenario) {
            return Err(self.fail("Expected SCENARIO after annotations"));
        }
        let line = self.advance().line;
        let name = self.parse_declaration_name("Expected scenario name");

        let mut tags = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Tag => tags.push(self.advance().value),
                TokenKind::Annotation => {
                    let tok = self.advance();
                    self.push_scenario_annotation(&mut annotations, &tok.value, tok.line, tok.column);
                }
                _ => break,
            }
        }

        let statements = self.parse_block("scenario");
        Ok(Scenario {
            name,
            annotations,
            tags,
            statements,
            line,
        })
    }

    fn push_scenario_annotation(
        &mut self,
        annotations: &mut Vec<ScenarioAnnotation>,
        name: &str,
        line: u32,
        column: u32,
    ) {
        let annotation = match name {
            "skip" => ScenarioAnnotation::Skip,
            "only" => ScenarioAnnotation::Only,
            "slow" => ScenarioAnnotation::Slow,
            "fixme" => ScenarioAnnotation::Fixme,
            other => {
                self.record(crate::error::ParseError::new(
                    format!("Annotation '@{}' is not valid on a scenario", other),
                    line,
                    column,
                ));
                return;
            }
        };
        annotations.push(annotation);
    }

    // ──────────────────────────────────────────────
    // FIXTURE
    // ──────────────────────────────────────────────

    pub(super) fn parse_fixture(&mut self) -> PResult<Fixture> {
        let line = self.advance().line;
        let name = self.consume_identifier("Expected fixture name");
        let mut parameters = Vec::new();
        if self.eat(TokenKind::With) {
            loop {
                parameters.push(self.consume_identifier("Expected parameter name"));
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::LBrace, "Expected '{' after fixture name");

        let mut fixture = Fixture {
            name,
            parameters,
            scope: FixtureScope::default(),
            dependencies: Vec::new(),
            auto: false,
            options: Vec::new(),
            setup: Vec::new(),
            teardown: Vec::new(),
            line,
        };

        while !self.check(TokenKind::RBrace) && !self.is_at_end() && !is_boundary(self.peek_kind())
        {
            let start = self.pos;
            let member_line = self.cur_line();
            let outcome = match self.peek_kind() {
                TokenKind::Scope => {
                    self.advance();
                    let tok = self.consume(TokenKind::Identifier, "Expected fixture scope");
                    match tok.value.to_ascii_lowercase().as_str() {
                        "test" => fixture.scope = FixtureScope::Test,
                        "worker" => fixture.scope = FixtureScope::Worker,
                        "" => {}
                        other => self.record(crate::error::ParseError::new(
                            format!("Fixture scope must be 'test' or 'worker', found '{}'", other),
                            tok.line,
                            tok.column,
                        )),
                    }
                    Ok(())
                }
                TokenKind::Depends => {
                    self.advance();
                    self.consume(TokenKind::On, "Expected ON after DEPENDS");
                    loop {
                        let dep = self.consume_identifier("Expected fixture name");
                        fixture.dependencies.push(dep);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    Ok(())
                }
                TokenKind::Auto => {
                    self.advance();
                    fixture.auto = true;
                    Ok(())
                }
                TokenKind::Option => {
                    self.advance();
                    let name = self.consume_identifier("Expected option name");
                    self.consume(TokenKind::Default, "Expected DEFAULT after option name");
                    self.parse_expression().map(|default| {
                        fixture.options.push(FixtureOption {
                            name,
                            default,
                            line: member_line,
                        })
                    })
                }
                TokenKind::Setup => {
                    self.advance();
                    fixture.setup = self.parse_block("fixture setup");
                    Ok(())
                }
                TokenKind::Teardown => {
                    self.advance();
                    fixture.teardown = self.parse_block("fixture teardown");
                    Ok(())
                }
                _ => Err(self.fail(
                    "Expected SCOPE, DEPENDS ON, AUTO, OPTION, SETUP or TEARDOWN in fixture body",
                )),
            };
            if let Err(e) = outcome {
                self.record(e);
                self.recover_in_block(member_line, is_fixture_member_start);
            }
            if self.pos == start {
                self.advance();
            }
        }

        self.consume(TokenKind::RBrace, "Expected '}' to close fixture");
        Ok(fixture)
    }
}

pub(super) fn is_var_type(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Text | TokenKind::NumberType | TokenKind::Flag | TokenKind::List
    )
}

fn is_page_member_start(kind: TokenKind) -> bool {
    kind == TokenKind::Field || kind == TokenKind::Identifier || is_var_type(kind)
}

fn is_feature_member_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Use | TokenKind::With | TokenKind::Before | TokenKind::After
    )
}

fn is_fixture_member_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Scope
            | TokenKind::Depends
            | TokenKind::Auto
            | TokenKind::Option
            | TokenKind::Setup
            | TokenKind::Teardown
    )
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::parser::parse_source;

    #[test]
    fn page_members() {
        let src = r#"PAGE LoginPage {
  FIELD email = LABEL "Email"
  FIELD submit = BUTTON "Sign in"
  TEXT baseUrl = "https://example.com"
  login WITH user, pass RETURNS FLAG {
    FILL email WITH user
    CLICK submit
    RETURN TRUE
  }
}"#;
        let result = parse_source(src);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let page = &result.program.pages[0];
        assert_eq!(page.name, "LoginPage");
        assert_eq!(page.fields.len(), 2);
        assert_eq!(page.fields[1].selector.selector_type, SelectorType::Role);
        assert_eq!(page.fields[1].selector.value, "button");
        assert_eq!(page.fields[1].selector.name_param.as_deref(), Some("Sign in"));
        assert_eq!(page.variables[0].var_type, VarType::Text);
        let action = &page.actions[0];
        assert_eq!(action.name, "login");
        assert_eq!(action.parameters, vec!["user", "pass"]);
        assert_eq!(action.return_type, Some(VarType::Flag));
        assert_eq!(action.statements.len(), 3);
        assert_eq!(action.line, 5);
    }

    #[test]
    fn feature_members_in_order() {
        let src = r#"@serial
FEATURE Checkout {
  USE CartPage
  USE PaymentPage
  WITH FIXTURE loggedIn(user = "alice", retries = 2)
  BEFORE EACH { OPEN "/" }
  AFTER ALL { CLEAR COOKIES }
  @skip SCENARIO "pays" @smoke @regression {
    CLICK "Pay"
  }
  SCENARIO "second" { REFRESH }
}"#;
        let result = parse_source(src);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let f = &result.program.features[0];
        assert_eq!(f.annotations, vec![FeatureAnnotation::Serial]);
        assert_eq!(f.line, 2);
        let uses: Vec<_> = f.uses.iter().map(|u| u.page_name.as_str()).collect();
        assert_eq!(uses, vec!["CartPage", "PaymentPage"]);
        assert_eq!(f.fixture_uses[0].fixture_name, "loggedIn");
        assert_eq!(f.fixture_uses[0].options.len(), 2);
        let hooks: Vec<_> = f.hooks.iter().map(|h| h.hook_type).collect();
        assert_eq!(hooks, vec![HookType::BeforeEach, HookType::AfterAll]);
        assert_eq!(f.scenarios[0].annotations, vec![ScenarioAnnotation::Skip]);
        assert_eq!(f.scenarios[0].tags, vec!["smoke", "regression"]);
        assert_eq!(f.scenarios[1].name, "second");
    }

    #[test]
    fn scenario_names_bare_or_quoted() {
        let src = "FEATURE F {\n  SCENARIO first @smoke {\n    REFRESH\n  }\n  SCENARIO \"second one\" { REFRESH }\n}";
        let result = parse_source(src);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let scenarios = &result.program.features[0].scenarios;
        assert_eq!(scenarios[0].name, "first");
        assert_eq!(scenarios[0].tags, vec!["smoke"]);
        assert_eq!(scenarios[0].statements.len(), 1);
        assert_eq!(scenarios[1].name, "second one");
    }

    #[test]
    fn missing_scenario_name_keeps_body() {
        let src = "FEATURE F {\n  SCENARIO {\n    REFRESH\n  }\n  SCENARIO next { REFRESH }\n}";
        let result = parse_source(src);
        assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
        assert_eq!((result.errors[0].line, result.errors[0].column), (2, 12));
        let scenarios = &result.program.features[0].scenarios;
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[0].name, "");
        assert_eq!(scenarios[0].statements.len(), 1);
        assert_eq!(scenarios[1].name, "next");
    }

    #[test]
    fn invalid_annotation_placement_is_reported() {
        let src = "@slow FEATURE F {\n  @serial SCENARIO \"s\" { REFRESH }\n}";
        let result = parse_source(src);
        assert_eq!(result.errors.len(), 2, "{:?}", result.errors);
        assert!(result.errors[0].message.contains("@slow"));
        assert!(result.errors[1].message.contains("@serial"));
        assert_eq!(result.program.features[0].scenarios.len(), 1);
    }

    #[test]
    fn fixture_declaration() {
        let src = r#"FIXTURE loggedIn WITH user {
  SCOPE worker
  DEPENDS ON database, browser
  AUTO
  OPTION retries DEFAULT 3
  SETUP {
    OPEN "/login"
  }
  TEARDOWN {
    CLEAR STORAGE
  }
}"#;
        let result = parse_source(src);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let fx = &result.program.fixtures[0];
        assert_eq!(fx.name, "loggedIn");
        assert_eq!(fx.parameters, vec!["user"]);
        assert_eq!(fx.scope, FixtureScope::Worker);
        assert_eq!(fx.dependencies, vec!["database", "browser"]);
        assert!(fx.auto);
        assert_eq!(fx.options[0].name, "retries");
        assert_eq!(fx.options[0].line, 5);
        assert_eq!(fx.setup.len(), 1);
        assert_eq!(fx.teardown.len(), 1);
    }

    #[test]
    fn bad_fixture_scope_is_reported() {
        let result = parse_source("FIXTURE f {\n  SCOPE galaxy\n}");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].line, 2);
        assert_eq!(result.program.fixtures[0].scope, FixtureScope::Test);
    }

    #[test]
    fn broken_field_recovers_to_next_member() {
        let src = "PAGE P {\n  FIELD a = \n  FIELD b = \"ok\"\n}";
        let result = parse_source(src);
        assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
        let names: Vec<_> = result.program.pages[0]
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["b"]);
    }
}
