use super::declarations::is_var_type;
use super::{is_boundary, PResult, Parser};
use crate::ast::*;
use crate::lexer::TokenKind;

impl Parser {
    /// `{ stmt* }` with per-statement recovery. `what` names the enclosing
    /// construct in brace errors.
    pub(super) fn parse_block(&mut self, what: &str) -> Vec<Statement> {
        self.consume(TokenKind::LBrace, &format!("Expected '{{' to open {}", what));
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() && !is_boundary(self.peek_kind())
        {
            let start = self.pos;
            let line = self.cur_line();
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    self.record(e);
                    self.recover_in_block(line, is_statement_start);
                }
            }
            if self.pos == start {
                self.advance();
            }
        }
        self.consume(TokenKind::RBrace, &format!("Expected '}}' to close {}", what));
        statements
    }

    fn parse_statement(&mut self) -> PResult<Statement> {
        let line = self.cur_line();
        match self.peek_kind() {
            TokenKind::Click => {
                self.advance();
                Ok(Statement::Click(self.target_statement(line)?))
            }
            TokenKind::Right | TokenKind::Double | TokenKind::Force => {
                let modifier = self.advance();
                self.consume(
                    TokenKind::Click,
                    &format!("Expected CLICK after {}", modifier.value),
                );
                let stmt = self.target_statement(line)?;
                Ok(match modifier.kind {
                    TokenKind::Right => Statement::RightClick(stmt),
                    TokenKind::Double => Statement::DoubleClick(stmt),
                    _ => Statement::ForceClick(stmt),
                })
            }
            TokenKind::Drag => {
                self.advance();
                let source = self.parse_target()?;
                self.consume(TokenKind::To, "Expected TO after drag source");
                let destination = self.parse_target()?;
                Ok(Statement::Drag(DragStatement {
                    source,
                    destination,
                    line,
                }))
            }
            TokenKind::Fill => {
                self.advance();
                let target = self.parse_target()?;
                self.consume(TokenKind::With, "Expected WITH after fill target");
                let value = self.parse_expression()?;
                Ok(Statement::Fill(FillStatement {
                    target,
                    value,
                    line,
                }))
            }
            TokenKind::Open => {
                self.advance();
                if self.eat(TokenKind::In) {
                    self.consume(TokenKind::New, "Expected NEW after OPEN IN");
                    self.consume(TokenKind::Tab, "Expected TAB after OPEN IN NEW");
                    let url = self.parse_expression()?;
                    return Ok(Statement::OpenInNewTab(OpenStatement { url, line }));
                }
                let url = self.parse_expression()?;
                Ok(Statement::Open(OpenStatement { url, line }))
            }
            TokenKind::Check => {
                self.advance();
                Ok(Statement::Check(self.target_statement(line)?))
            }
            TokenKind::Uncheck => {
                self.advance();
                Ok(Statement::Uncheck(self.target_statement(line)?))
            }
            TokenKind::Select => {
                self.advance();
                let option = self.parse_expression()?;
                self.consume(TokenKind::From, "Expected FROM after select option");
                let target = self.parse_target()?;
                Ok(Statement::Select(SelectStatement {
                    option,
                    target,
                    line,
                }))
            }
            TokenKind::Hover => {
                self.advance();
                Ok(Statement::Hover(self.target_statement(line)?))
            }
            TokenKind::Press => {
                self.advance();
                let key = self.parse_expression()?;
                Ok(Statement::Press(PressStatement { key, line }))
            }
            TokenKind::Scroll => self.parse_scroll(line),
            TokenKind::Wait => {
                self.advance();
                if self.eat(TokenKind::For) {
                    return Ok(Statement::WaitFor(self.target_statement(line)?));
                }
                let duration = self.parse_number_value()?;
                let unit = if self.eat(TokenKind::Milliseconds) {
                    TimeUnit::Milliseconds
                } else {
                    self.eat(TokenKind::Seconds);
                    TimeUnit::Seconds
                };
                Ok(Statement::Wait(WaitStatement {
                    duration,
                    unit,
                    line,
                }))
            }
            TokenKind::Refresh => {
                self.advance();
                Ok(Statement::Refresh(MarkerStatement { line }))
            }
            TokenKind::Log => {
                self.advance();
                let message = self.parse_expression()?;
                Ok(Statement::Log(LogStatement { message, line }))
            }
            TokenKind::Take => {
                self.advance();
                self.consume(TokenKind::Screenshot, "Expected SCREENSHOT after TAKE");
                let file_name = if self.eat(TokenKind::As) {
                    Some(self.parse_string("Expected file name string after AS")?)
                } else {
                    None
                };
                Ok(Statement::Screenshot(ScreenshotStatement { file_name, line }))
            }
            TokenKind::Upload => {
                self.advance();
                let files = self.parse_expression_list()?;
                self.consume(TokenKind::To, "Expected TO after upload files");
                let target = self.parse_target()?;
                Ok(Statement::Upload(UploadStatement {
                    files,
                    target,
                    line,
                }))
            }
            TokenKind::Do => self.parse_perform(line),
            TokenKind::Verify => self.parse_verify(line),
            TokenKind::Load => self.parse_load(line),
            TokenKind::For => self.parse_for_each(line),
            TokenKind::Row => self.parse_row(line),
            TokenKind::Rows => self.parse_rows(line),
            k if is_var_type(k) => self.parse_typed_assignment(line),
            TokenKind::Switch => self.parse_switch(line),
            TokenKind::Close => {
                self.advance();
                self.consume(TokenKind::Tab, "Expected TAB after CLOSE");
                Ok(Statement::CloseTab(MarkerStatement { line }))
            }
            TokenKind::Accept => {
                self.advance();
                self.consume(TokenKind::Dialog, "Expected DIALOG after ACCEPT");
                let response = if self.eat(TokenKind::With) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                Ok(Statement::AcceptDialog(AcceptDialogStatement { response, line }))
            }
            TokenKind::Dismiss => {
                self.advance();
                self.consume(TokenKind::Dialog, "Expected DIALOG after DISMISS");
                Ok(Statement::DismissDialog(MarkerStatement { line }))
            }
            TokenKind::Download => {
                self.advance();
                self.consume(TokenKind::From, "Expected FROM after DOWNLOAD");
                let target = self.parse_target()?;
                let save_as = if self.eat(TokenKind::As) {
                    Some(self.parse_string("Expected file name string after AS")?)
                } else {
                    None
                };
                Ok(Statement::Download(DownloadStatement {
                    target,
                    save_as,
                    line,
                }))
            }
            TokenKind::Set => {
                self.advance();
                let cookie = match self.peek_kind() {
                    TokenKind::Cookie => true,
                    TokenKind::Storage => false,
                    _ => return Err(self.fail("Expected COOKIE or STORAGE after SET")),
                };
                self.advance();
                let key = self.parse_expression()?;
                self.consume(TokenKind::To, "Expected TO after key");
                let value = self.parse_expression()?;
                let stmt = KeyValueStatement { key, value, line };
                Ok(if cookie {
                    Statement::SetCookie(stmt)
                } else {
                    Statement::SetStorage(stmt)
                })
            }
            TokenKind::Get => {
                self.advance();
                self.consume(TokenKind::Storage, "Expected STORAGE after GET");
                let key = self.parse_expression()?;
                self.consume(TokenKind::Into, "Expected INTO after storage key");
                let variable = self.consume_identifier("Expected variable name after INTO");
                Ok(Statement::GetStorage(GetStorageStatement {
                    key,
                    variable,
                    line,
                }))
            }
            TokenKind::Clear => {
                self.advance();
                match self.peek_kind() {
                    TokenKind::Cookies => {
                        self.advance();
                        Ok(Statement::ClearCookies(MarkerStatement { line }))
                    }
                    TokenKind::Storage => {
                        self.advance();
                        Ok(Statement::ClearStorage(MarkerStatement { line }))
                    }
                    _ => Err(self.fail("Expected COOKIES or STORAGE after CLEAR")),
                }
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.is_expression_start() && self.cur_line() == line {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                Ok(Statement::Return(ReturnStatement { value, line }))
            }
            _ => Err(self.fail("Expected a statement")),
        }
    }

    fn target_statement(&mut self, line: u32) -> PResult<TargetStatement> {
        let target = self.parse_target()?;
        Ok(TargetStatement { target, line })
    }

    /// `SCROLL UP|DOWN|LEFT|RIGHT` or `SCROLL TO target`
    fn parse_scroll(&mut self, line: u32) -> PResult<Statement> {
        self.advance();
        if self.eat(TokenKind::To) {
            let target = self.parse_target()?;
            return Ok(Statement::Scroll(ScrollStatement {
                direction: None,
                target: Some(target),
                line,
            }));
        }
        let direction = match self.peek_kind() {
            TokenKind::Up => ScrollDirection::Up,
            TokenKind::Down => ScrollDirection::Down,
            TokenKind::Left => ScrollDirection::Left,
            TokenKind::Right => ScrollDirection::Right,
            _ => return Err(self.fail("Expected UP, DOWN, LEFT, RIGHT or TO after SCROLL")),
        };
        self.advance();
        Ok(Statement::Scroll(ScrollStatement {
            direction: Some(direction),
            target: None,
            line,
        }))
    }

    /// `DO Page.action (WITH expr (, expr)*)?`
    fn parse_perform(&mut self, line: u32) -> PResult<Statement> {
        self.advance();
        let first = self.consume_identifier("Expected action name after DO");
        let (page, action) = if self.eat(TokenKind::Dot) {
            let action = self.consume_identifier("Expected action name after '.'");
            (Some(first), action)
        } else {
            (None, first)
        };
        let arguments = if self.eat(TokenKind::With) {
            self.parse_expression_list()?
        } else {
            Vec::new()
        };
        Ok(Statement::Perform(PerformStatement {
            page,
            action,
            arguments,
            line,
        }))
    }

    fn parse_verify(&mut self, line: u32) -> PResult<Statement> {
        self.advance();

        if self.eat(TokenKind::Url) {
            let condition = self.parse_text_match(true)?;
            let value = self.parse_expression()?;
            return Ok(Statement::VerifyUrl(VerifyTextStatement {
                condition,
                value,
                line,
            }));
        }
        // TITLE is also a selector keyword; only the assertion form is
        // followed directly by a match keyword.
        if self.check(TokenKind::Title)
            && matches!(
                self.peek_kind_at(1),
                TokenKind::Contains | TokenKind::Equal
            )
        {
            self.advance();
            let condition = self.parse_text_match(false)?;
            let value = self.parse_expression()?;
            return Ok(Statement::VerifyTitle(VerifyTextStatement {
                condition,
                value,
                line,
            }));
        }

        let target = self.parse_target()?;
        match self.peek_kind() {
            TokenKind::Is => {
                self.advance();
                let negated = self.eat(TokenKind::Not);
                let state = match self.peek_kind() {
                    TokenKind::Visible => ElementState::Visible,
                    TokenKind::Hidden => ElementState::Hidden,
                    TokenKind::Enabled => ElementState::Enabled,
                    TokenKind::Disabled => ElementState::Disabled,
                    TokenKind::Checked => ElementState::Checked,
                    TokenKind::Empty => ElementState::Empty,
                    TokenKind::Focused => ElementState::Focused,
                    _ => return Err(self.fail("Expected an element state after IS")),
                };
                self.advance();
                Ok(Statement::VerifyElement(VerifyElementStatement {
                    target,
                    negated,
                    state,
                    line,
                }))
            }
            TokenKind::Has => {
                self.advance();
                let assertion = match self.peek_kind() {
                    TokenKind::Count => {
                        self.advance();
                        HasAssertion::Count {
                            value: self.parse_expression()?,
                        }
                    }
                    TokenKind::Value => {
                        self.advance();
                        HasAssertion::Value {
                            value: self.parse_expression()?,
                        }
                    }
                    TokenKind::Attribute => {
                        self.advance();
                        let name = self.parse_expression()?;
                        self.consume(TokenKind::Equal, "Expected EQUAL after attribute name");
                        let value = self.parse_expression()?;
                        HasAssertion::Attribute { name, value }
                    }
                    TokenKind::Text => {
                        self.advance();
                        HasAssertion::Text {
                            value: self.parse_expression()?,
                        }
                    }
                    TokenKind::Class => {
                        self.advance();
                        HasAssertion::Class {
                            value: self.parse_expression()?,
                        }
                    }
                    _ => {
                        return Err(
                            self.fail("Expected COUNT, VALUE, ATTRIBUTE, TEXT or CLASS after HAS")
                        )
                    }
                };
                Ok(Statement::VerifyHas(VerifyHasStatement {
                    target,
                    assertion,
                    line,
                }))
            }
            TokenKind::Contains => {
                self.advance();
                self.eat(TokenKind::Text);
                let value = self.parse_expression()?;
                Ok(Statement::VerifyHas(VerifyHasStatement {
                    target,
                    assertion: HasAssertion::ContainsText { value },
                    line,
                }))
            }
            _ => Err(self.fail("Expected IS, HAS or CONTAINS after verify target")),
        }
    }

    fn parse_text_match(&mut self, allow_matches: bool) -> PResult<TextMatch> {
        let condition = match self.peek_kind() {
            TokenKind::Contains => TextMatch::Contains,
            TokenKind::Equal => TextMatch::Equal,
            TokenKind::Matches if allow_matches => TextMatch::Matches,
            _ if allow_matches => return Err(self.fail("Expected CONTAINS, EQUAL or MATCHES")),
            _ => return Err(self.fail("Expected CONTAINS or EQUAL")),
        };
        self.advance();
        Ok(condition)
    }

    /// `SWITCH TO NEW TAB expr? | TAB n | FRAME target | MAIN FRAME`
    fn parse_switch(&mut self, line: u32) -> PResult<Statement> {
        self.advance();
        self.consume(TokenKind::To, "Expected TO after SWITCH");
        match self.peek_kind() {
            TokenKind::New => {
                self.advance();
                self.consume(TokenKind::Tab, "Expected TAB after SWITCH TO NEW");
                let url = if self.is_expression_start() && self.cur_line() == line {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                Ok(Statement::SwitchToNewTab(SwitchToNewTabStatement { url, line }))
            }
            TokenKind::Tab => {
                self.advance();
                let index = self.parse_integer("Expected tab index after SWITCH TO TAB")?;
                Ok(Statement::SwitchToTab(SwitchToTabStatement {
                    index: u32::try_from(index).unwrap_or(u32::MAX),
                    line,
                }))
            }
            TokenKind::Frame => {
                self.advance();
                Ok(Statement::SwitchToFrame(self.target_statement(line)?))
            }
            TokenKind::Main => {
                self.advance();
                self.consume(TokenKind::Frame, "Expected FRAME after SWITCH TO MAIN");
                Ok(Statement::SwitchToMainFrame(MarkerStatement { line }))
            }
            _ => Err(self.fail("Expected NEW TAB, TAB, FRAME or MAIN FRAME after SWITCH TO")),
        }
    }
}

/// Keywords that can begin a statement; used as resynchronization points.
pub(super) fn is_statement_start(kind: TokenKind) -> bool {
    is_var_type(kind)
        || matches!(
            kind,
            TokenKind::Click
                | TokenKind::Right
                | TokenKind::Double
                | TokenKind::Force
                | TokenKind::Drag
                | TokenKind::Fill
                | TokenKind::Open
                | TokenKind::Check
                | TokenKind::Uncheck
                | TokenKind::Select
                | TokenKind::Hover
                | TokenKind::Press
                | TokenKind::Scroll
                | TokenKind::Wait
                | TokenKind::Refresh
                | TokenKind::Log
                | TokenKind::Take
                | TokenKind::Upload
                | TokenKind::Do
                | TokenKind::Verify
                | TokenKind::Load
                | TokenKind::For
                | TokenKind::Row
                | TokenKind::Rows
                | TokenKind::Switch
                | TokenKind::Close
                | TokenKind::Accept
                | TokenKind::Dismiss
                | TokenKind::Download
                | TokenKind::Set
                | TokenKind::Get
                | TokenKind::Clear
                | TokenKind::Return
        )
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::parser::parse_source;
    use rstest::rstest;

    fn statements(body: &str) -> Vec<Statement> {
        let src = format!("FEATURE F {{\n  SCENARIO \"s\" {{\n{}\n  }}\n}}", body);
        let result = parse_source(&src);
        assert!(result.errors.is_empty(), "{}: {:?}", body, result.errors);
        result.program.features[0].scenarios[0].statements.clone()
    }

    #[rstest]
    #[case::click(r#"CLICK "Go""#, "Click")]
    #[case::right_click(r#"RIGHT CLICK "Go""#, "RightClick")]
    #[case::double_click(r#"DOUBLE CLICK "Go""#, "DoubleClick")]
    #[case::force_click(r#"FORCE CLICK "Go""#, "ForceClick")]
    #[case::drag(r#"DRAG "a" TO "b""#, "Drag")]
    #[case::fill(r#"FILL email WITH "x@y.z""#, "Fill")]
    #[case::open(r#"OPEN "/home""#, "Open")]
    #[case::check(r#"CHECK "Remember me""#, "Check")]
    #[case::uncheck(r#"UNCHECK "Remember me""#, "Uncheck")]
    #[case::select(r#"SELECT "Red" FROM colour"#, "Select")]
    #[case::hover(r#"HOVER menu"#, "Hover")]
    #[case::press(r#"PRESS "Enter""#, "Press")]
    #[case::scroll(r#"SCROLL DOWN"#, "Scroll")]
    #[case::scroll_to(r#"SCROLL TO footer"#, "Scroll")]
    #[case::wait(r#"WAIT 2 SECONDS"#, "Wait")]
    #[case::wait_for(r#"WAIT FOR spinner"#, "WaitFor")]
    #[case::refresh("REFRESH", "Refresh")]
    #[case::log(r#"LOG "hello""#, "Log")]
    #[case::screenshot(r#"TAKE SCREENSHOT AS "home.png""#, "Screenshot")]
    #[case::upload(r#"UPLOAD "a.txt", "b.txt" TO picker"#, "Upload")]
    #[case::perform(r#"DO LoginPage.login WITH "u", "p""#, "Perform")]
    #[case::verify_element(r#"VERIFY banner IS NOT VISIBLE"#, "VerifyElement")]
    #[case::verify_url(r#"VERIFY URL CONTAINS "/dashboard""#, "VerifyUrl")]
    #[case::verify_title(r#"VERIFY TITLE EQUAL "Home""#, "VerifyTitle")]
    #[case::verify_has(r#"VERIFY rows HAS COUNT 3"#, "VerifyHas")]
    #[case::verify_contains(r#"VERIFY panel CONTAINS TEXT "saved""#, "VerifyHas")]
    #[case::load(r#"LOAD users FROM "users" WHERE active = true"#, "Load")]
    #[case::row(r#"ROW user = Users WHERE role == "admin""#, "Row")]
    #[case::rows(r#"ROWS top = Users ORDER BY score DESC LIMIT 5"#, "Rows")]
    #[case::column_access(r#"TEXT email = Users[0].email"#, "ColumnAccess")]
    #[case::count(r#"NUMBER n = COUNT Users WHERE active = true"#, "Count")]
    #[case::utility(r#"TEXT slug = LOWERCASE title THEN TRIM"#, "UtilityAssignment")]
    #[case::declaration(r#"TEXT greeting = "hi""#, "VariableDeclaration")]
    #[case::switch_new_tab(r#"SWITCH TO NEW TAB "/help""#, "SwitchToNewTab")]
    #[case::switch_tab(r#"SWITCH TO TAB 1"#, "SwitchToTab")]
    #[case::open_in_new_tab(r#"OPEN IN NEW TAB "/docs""#, "OpenInNewTab")]
    #[case::close_tab(r#"CLOSE TAB"#, "CloseTab")]
    #[case::accept_dialog(r#"ACCEPT DIALOG WITH "yes""#, "AcceptDialog")]
    #[case::dismiss_dialog(r#"DISMISS DIALOG"#, "DismissDialog")]
    #[case::switch_frame(r#"SWITCH TO FRAME CSS "iframe#pay""#, "SwitchToFrame")]
    #[case::main_frame(r#"SWITCH TO MAIN FRAME"#, "SwitchToMainFrame")]
    #[case::download(r#"DOWNLOAD FROM "Export" AS "report.csv""#, "Download")]
    #[case::set_cookie(r#"SET COOKIE "session" TO "abc""#, "SetCookie")]
    #[case::clear_cookies(r#"CLEAR COOKIES"#, "ClearCookies")]
    #[case::set_storage(r#"SET STORAGE "theme" TO "dark""#, "SetStorage")]
    #[case::get_storage(r#"GET STORAGE "theme" INTO theme"#, "GetStorage")]
    #[case::clear_storage(r#"CLEAR STORAGE"#, "ClearStorage")]
    #[case::return_value(r#"RETURN result"#, "Return")]
    fn statement_kind(#[case] body: &str, #[case] kind: &str) {
        let stmts = statements(&format!("    {}", body));
        assert_eq!(stmts.len(), 1, "{}", body);
        assert_eq!(stmts[0].kind(), kind);
        assert_eq!(stmts[0].line(), 3);
    }

    #[test]
    fn lines_follow_source_order() {
        let stmts = statements("    OPEN \"/\"\n\n    CLICK \"a\"\n    REFRESH");
        let lines: Vec<u32> = stmts.iter().map(Statement::line).collect();
        assert_eq!(lines, vec![3, 5, 6]);
    }

    #[test]
    fn verify_title_selector_is_a_target() {
        let stmts = statements(r#"    VERIFY TITLE "Close dialog" IS VISIBLE"#);
        let Statement::VerifyElement(v) = &stmts[0] else {
            panic!("expected element assertion, got {:?}", stmts[0]);
        };
        let Target::Selector { selector } = &v.target else {
            panic!("expected selector");
        };
        assert_eq!(selector.selector_type, SelectorType::Title);
    }

    #[test]
    fn verify_attribute() {
        let stmts = statements(r#"    VERIFY link HAS ATTRIBUTE "href" EQUAL "/home""#);
        let Statement::VerifyHas(v) = &stmts[0] else {
            panic!("expected has assertion");
        };
        assert!(matches!(v.assertion, HasAssertion::Attribute { .. }));
    }

    #[test]
    fn wait_defaults_to_seconds() {
        let stmts = statements("    WAIT 1.5\n    WAIT 300 MILLISECONDS");
        let Statement::Wait(a) = &stmts[0] else { panic!() };
        let Statement::Wait(b) = &stmts[1] else { panic!() };
        assert_eq!((a.duration, a.unit), (1.5, TimeUnit::Seconds));
        assert_eq!((b.duration, b.unit), (300.0, TimeUnit::Milliseconds));
    }

    #[test]
    fn bare_return_and_new_tab_do_not_swallow_next_line() {
        let src = "PAGE P {\n  go {\n    SWITCH TO NEW TAB\n    RETURN\n  }\n}";
        let result = crate::parser::parse_source(src);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let stmts = &result.program.pages[0].actions[0].statements;
        assert_eq!(stmts.len(), 2);
        let Statement::Return(r) = &stmts[1] else { panic!() };
        assert!(r.value.is_none());
    }

    #[test]
    fn perform_without_page() {
        let stmts = statements("    DO login");
        let Statement::Perform(p) = &stmts[0] else { panic!() };
        assert_eq!(p.page, None);
        assert_eq!(p.action, "login");
    }

    #[test]
    fn nested_for_each_recovers_inside_body() {
        let body = "    FOR EACH u IN users {\n      CLICK\n      LOG u\n    }\n    REFRESH";
        let src = format!("FEATURE F {{\n  SCENARIO \"s\" {{\n{}\n  }}\n}}", body);
        let result = parse_source(&src);
        assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
        let stmts = &result.program.features[0].scenarios[0].statements;
        assert_eq!(stmts.len(), 2);
        let Statement::ForEach(f) = &stmts[0] else { panic!() };
        assert_eq!(f.statements.len(), 1);
    }
}
