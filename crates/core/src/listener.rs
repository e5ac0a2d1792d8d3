//! Listener contract over the Vero grammar.
//!
//! [`ScriptListener`] has one `enter_*`/`exit_*` pair per grammar
//! production, all defaulting to no-ops. The trait and [`PRODUCTIONS`] are
//! generated from a single table, so adding a production to the table is the
//! only way to extend the contract. [`walk`] drives a listener over a parsed
//! [`Program`] in source order.

use crate::ast::*;

macro_rules! listener_contract {
    ($( $name:ident($node:ty) => $enter:ident / $exit:ident; )*) => {
        /// Callbacks fired by [`walk`]. Implement the ones you need.
        pub trait ScriptListener {
            $(
                fn $enter(&mut self, _node: &$node) {}
                fn $exit(&mut self, _node: &$node) {}
            )*
        }

        /// Production names, in table order.
        pub const PRODUCTIONS: &[&str] = &[$(stringify!($name)),*];
    };
}

listener_contract! {
    program(Program) => enter_program / exit_program;

    // declarations
    page_declaration(Page) => enter_page_declaration / exit_page_declaration;
    field_declaration(Field) => enter_field_declaration / exit_field_declaration;
    variable_declaration(Variable) => enter_variable_declaration / exit_variable_declaration;
    action_declaration(ActionDefinition) => enter_action_declaration / exit_action_declaration;
    feature_declaration(Feature) => enter_feature_declaration / exit_feature_declaration;
    feature_annotation(FeatureAnnotation) => enter_feature_annotation / exit_feature_annotation;
    use_statement(UseStatement) => enter_use_statement / exit_use_statement;
    fixture_use(FixtureUse) => enter_fixture_use / exit_fixture_use;
    fixture_option_value(FixtureOptionValue) => enter_fixture_option_value / exit_fixture_option_value;
    hook_declaration(Hook) => enter_hook_declaration / exit_hook_declaration;
    scenario_declaration(Scenario) => enter_scenario_declaration / exit_scenario_declaration;
    scenario_annotation(ScenarioAnnotation) => enter_scenario_annotation / exit_scenario_annotation;
    tag(str) => enter_tag / exit_tag;
    fixture_declaration(Fixture) => enter_fixture_declaration / exit_fixture_declaration;
    fixture_option(FixtureOption) => enter_fixture_option / exit_fixture_option;
    fixture_setup([Statement]) => enter_fixture_setup / exit_fixture_setup;
    fixture_teardown([Statement]) => enter_fixture_teardown / exit_fixture_teardown;

    // statements
    statement(Statement) => enter_statement / exit_statement;
    click_statement(TargetStatement) => enter_click_statement / exit_click_statement;
    right_click_statement(TargetStatement) => enter_right_click_statement / exit_right_click_statement;
    double_click_statement(TargetStatement) => enter_double_click_statement / exit_double_click_statement;
    force_click_statement(TargetStatement) => enter_force_click_statement / exit_force_click_statement;
    drag_statement(DragStatement) => enter_drag_statement / exit_drag_statement;
    fill_statement(FillStatement) => enter_fill_statement / exit_fill_statement;
    open_statement(OpenStatement) => enter_open_statement / exit_open_statement;
    check_statement(TargetStatement) => enter_check_statement / exit_check_statement;
    uncheck_statement(TargetStatement) => enter_uncheck_statement / exit_uncheck_statement;
    select_statement(SelectStatement) => enter_select_statement / exit_select_statement;
    hover_statement(TargetStatement) => enter_hover_statement / exit_hover_statement;
    press_statement(PressStatement) => enter_press_statement / exit_press_statement;
    scroll_statement(ScrollStatement) => enter_scroll_statement / exit_scroll_statement;
    wait_statement(WaitStatement) => enter_wait_statement / exit_wait_statement;
    wait_for_statement(TargetStatement) => enter_wait_for_statement / exit_wait_for_statement;
    refresh_statement(MarkerStatement) => enter_refresh_statement / exit_refresh_statement;
    log_statement(LogStatement) => enter_log_statement / exit_log_statement;
    screenshot_statement(ScreenshotStatement) => enter_screenshot_statement / exit_screenshot_statement;
    upload_statement(UploadStatement) => enter_upload_statement / exit_upload_statement;
    perform_statement(PerformStatement) => enter_perform_statement / exit_perform_statement;
    verify_element_statement(VerifyElementStatement) => enter_verify_element_statement / exit_verify_element_statement;
    verify_url_statement(VerifyTextStatement) => enter_verify_url_statement / exit_verify_url_statement;
    verify_title_statement(VerifyTextStatement) => enter_verify_title_statement / exit_verify_title_statement;
    verify_has_statement(VerifyHasStatement) => enter_verify_has_statement / exit_verify_has_statement;
    load_statement(LoadStatement) => enter_load_statement / exit_load_statement;
    for_each_statement(ForEachStatement) => enter_for_each_statement / exit_for_each_statement;
    row_statement(RowStatement) => enter_row_statement / exit_row_statement;
    rows_statement(RowsStatement) => enter_rows_statement / exit_rows_statement;
    column_access_statement(ColumnAccessStatement) => enter_column_access_statement / exit_column_access_statement;
    count_statement(CountStatement) => enter_count_statement / exit_count_statement;
    utility_assignment_statement(UtilityAssignmentStatement) => enter_utility_assignment_statement / exit_utility_assignment_statement;
    variable_declaration_statement(VariableDeclarationStatement) => enter_variable_declaration_statement / exit_variable_declaration_statement;
    switch_to_new_tab_statement(SwitchToNewTabStatement) => enter_switch_to_new_tab_statement / exit_switch_to_new_tab_statement;
    switch_to_tab_statement(SwitchToTabStatement) => enter_switch_to_tab_statement / exit_switch_to_tab_statement;
    open_in_new_tab_statement(OpenStatement) => enter_open_in_new_tab_statement / exit_open_in_new_tab_statement;
    close_tab_statement(MarkerStatement) => enter_close_tab_statement / exit_close_tab_statement;
    accept_dialog_statement(AcceptDialogStatement) => enter_accept_dialog_statement / exit_accept_dialog_statement;
    dismiss_dialog_statement(MarkerStatement) => enter_dismiss_dialog_statement / exit_dismiss_dialog_statement;
    switch_to_frame_statement(TargetStatement) => enter_switch_to_frame_statement / exit_switch_to_frame_statement;
    switch_to_main_frame_statement(MarkerStatement) => enter_switch_to_main_frame_statement / exit_switch_to_main_frame_statement;
    download_statement(DownloadStatement) => enter_download_statement / exit_download_statement;
    set_cookie_statement(KeyValueStatement) => enter_set_cookie_statement / exit_set_cookie_statement;
    clear_cookies_statement(MarkerStatement) => enter_clear_cookies_statement / exit_clear_cookies_statement;
    set_storage_statement(KeyValueStatement) => enter_set_storage_statement / exit_set_storage_statement;
    get_storage_statement(GetStorageStatement) => enter_get_storage_statement / exit_get_storage_statement;
    clear_storage_statement(MarkerStatement) => enter_clear_storage_statement / exit_clear_storage_statement;
    return_statement(ReturnStatement) => enter_return_statement / exit_return_statement;

    // operands
    target(Target) => enter_target / exit_target;
    selector(Selector) => enter_selector / exit_selector;
    selector_modifier(SelectorModifier) => enter_selector_modifier / exit_selector_modifier;
    expression(Expression) => enter_expression / exit_expression;
    data_condition(DataCondition) => enter_data_condition / exit_data_condition;
    order_by(OrderBy) => enter_order_by / exit_order_by;
    utility_function(UtilityFunction) => enter_utility_function / exit_utility_function;
}

/// enter, children, exit
macro_rules! visit {
    ($l:ident, $n:expr, $enter:ident, $exit:ident $(, $child:expr)*) => {{
        $l.$enter($n);
        $( $child; )*
        $l.$exit($n);
    }};
}

/// Walk `program` depth-first in source order.
pub fn walk(program: &Program, l: &mut dyn ScriptListener) {
    l.enter_program(program);
    for page in &program.pages {
        walk_page(page, l);
    }
    for fixture in &program.fixtures {
        walk_fixture(fixture, l);
    }
    for feature in &program.features {
        walk_feature(feature, l);
    }
    l.exit_program(program);
}

fn walk_page(page: &Page, l: &mut dyn ScriptListener) {
    l.enter_page_declaration(page);
    for field in &page.fields {
        visit!(l, field, enter_field_declaration, exit_field_declaration,
            walk_selector(&field.selector, l));
    }
    for var in &page.variables {
        visit!(l, var, enter_variable_declaration, exit_variable_declaration,
            walk_expression(&var.value, l));
    }
    for action in &page.actions {
        visit!(l, action, enter_action_declaration, exit_action_declaration,
            walk_statements(&action.statements, l));
    }
    l.exit_page_declaration(page);
}

fn walk_feature(feature: &Feature, l: &mut dyn ScriptListener) {
    l.enter_feature_declaration(feature);
    for a in &feature.annotations {
        visit!(l, a, enter_feature_annotation, exit_feature_annotation);
    }
    for u in &feature.uses {
        visit!(l, u, enter_use_statement, exit_use_statement);
    }
    for fu in &feature.fixture_uses {
        visit!(l, fu, enter_fixture_use, exit_fixture_use,
            for opt in &fu.options {
                visit!(l, opt, enter_fixture_option_value, exit_fixture_option_value,
                    walk_expression(&opt.value, l));
            });
    }
    for hook in &feature.hooks {
        visit!(l, hook, enter_hook_declaration, exit_hook_declaration,
            walk_statements(&hook.statements, l));
    }
    for scenario in &feature.scenarios {
        l.enter_scenario_declaration(scenario);
        for a in &scenario.annotations {
            visit!(l, a, enter_scenario_annotation, exit_scenario_annotation);
        }
        for tag in &scenario.tags {
            visit!(l, tag.as_str(), enter_tag, exit_tag);
        }
        walk_statements(&scenario.statements, l);
        l.exit_scenario_declaration(scenario);
    }
    l.exit_feature_declaration(feature);
}

fn walk_fixture(fixture: &Fixture, l: &mut dyn ScriptListener) {
    l.enter_fixture_declaration(fixture);
    for opt in &fixture.options {
        visit!(l, opt, enter_fixture_option, exit_fixture_option,
            walk_expression(&opt.default, l));
    }
    visit!(l, fixture.setup.as_slice(), enter_fixture_setup, exit_fixture_setup,
        walk_statements(&fixture.setup, l));
    visit!(l, fixture.teardown.as_slice(), enter_fixture_teardown, exit_fixture_teardown,
        walk_statements(&fixture.teardown, l));
    l.exit_fixture_declaration(fixture);
}

fn walk_statements(statements: &[Statement], l: &mut dyn ScriptListener) {
    for s in statements {
        walk_statement(s, l);
    }
}

fn walk_statement(stmt: &Statement, l: &mut dyn ScriptListener) {
    l.enter_statement(stmt);
    match stmt {
        Statement::Click(n) => visit!(l, n, enter_click_statement, exit_click_statement,
            walk_target(&n.target, l)),
        Statement::RightClick(n) => visit!(l, n, enter_right_click_statement, exit_right_click_statement,
            walk_target(&n.target, l)),
        Statement::DoubleClick(n) => visit!(l, n, enter_double_click_statement, exit_double_click_statement,
            walk_target(&n.target, l)),
        Statement::ForceClick(n) => visit!(l, n, enter_force_click_statement, exit_force_click_statement,
            walk_target(&n.target, l)),
        Statement::Drag(n) => visit!(l, n, enter_drag_statement, exit_drag_statement,
            walk_target(&n.source, l), walk_target(&n.destination, l)),
        Statement::Fill(n) => visit!(l, n, enter_fill_statement, exit_fill_statement,
            walk_target(&n.target, l), walk_expression(&n.value, l)),
        Statement::Open(n) => visit!(l, n, enter_open_statement, exit_open_statement,
            walk_expression(&n.url, l)),
        Statement::Check(n) => visit!(l, n, enter_check_statement, exit_check_statement,
            walk_target(&n.target, l)),
        Statement::Uncheck(n) => visit!(l, n, enter_uncheck_statement, exit_uncheck_statement,
            walk_target(&n.target, l)),
        Statement::Select(n) => visit!(l, n, enter_select_statement, exit_select_statement,
            walk_expression(&n.option, l), walk_target(&n.target, l)),
        Statement::Hover(n) => visit!(l, n, enter_hover_statement, exit_hover_statement,
            walk_target(&n.target, l)),
        Statement::Press(n) => visit!(l, n, enter_press_statement, exit_press_statement,
            walk_expression(&n.key, l)),
        Statement::Scroll(n) => visit!(l, n, enter_scroll_statement, exit_scroll_statement,
            if let Some(t) = &n.target { walk_target(t, l) }),
        Statement::Wait(n) => visit!(l, n, enter_wait_statement, exit_wait_statement),
        Statement::WaitFor(n) => visit!(l, n, enter_wait_for_statement, exit_wait_for_statement,
            walk_target(&n.target, l)),
        Statement::Refresh(n) => visit!(l, n, enter_refresh_statement, exit_refresh_statement),
        Statement::Log(n) => visit!(l, n, enter_log_statement, exit_log_statement,
            walk_expression(&n.message, l)),
        Statement::Screenshot(n) => visit!(l, n, enter_screenshot_statement, exit_screenshot_statement),
        Statement::Upload(n) => visit!(l, n, enter_upload_statement, exit_upload_statement,
            for f in &n.files { walk_expression(f, l) }, walk_target(&n.target, l)),
        Statement::Perform(n) => visit!(l, n, enter_perform_statement, exit_perform_statement,
            for a in &n.arguments { walk_expression(a, l) }),
        Statement::VerifyElement(n) => visit!(l, n, enter_verify_element_statement, exit_verify_element_statement,
            walk_target(&n.target, l)),
        Statement::VerifyUrl(n) => visit!(l, n, enter_verify_url_statement, exit_verify_url_statement,
            walk_expression(&n.value, l)),
        Statement::VerifyTitle(n) => visit!(l, n, enter_verify_title_statement, exit_verify_title_statement,
            walk_expression(&n.value, l)),
        Statement::VerifyHas(n) => visit!(l, n, enter_verify_has_statement, exit_verify_has_statement,
            walk_target(&n.target, l), walk_has_assertion(&n.assertion, l)),
        Statement::Load(n) => visit!(l, n, enter_load_statement, exit_load_statement,
            walk_where(&n.where_clause, l)),
        Statement::ForEach(n) => visit!(l, n, enter_for_each_statement, exit_for_each_statement,
            walk_statements(&n.statements, l)),
        Statement::Row(n) => visit!(l, n, enter_row_statement, exit_row_statement,
            walk_where(&n.where_clause, l), walk_order_by(&n.order_by, l)),
        Statement::Rows(n) => visit!(l, n, enter_rows_statement, exit_rows_statement,
            walk_where(&n.where_clause, l), walk_order_by(&n.order_by, l)),
        Statement::ColumnAccess(n) => visit!(l, n, enter_column_access_statement, exit_column_access_statement),
        Statement::Count(n) => visit!(l, n, enter_count_statement, exit_count_statement,
            walk_where(&n.where_clause, l)),
        Statement::UtilityAssignment(n) => visit!(l, n, enter_utility_assignment_statement, exit_utility_assignment_statement,
            for f in &n.chain { walk_utility(f, l) }),
        Statement::VariableDeclaration(n) => visit!(l, n, enter_variable_declaration_statement, exit_variable_declaration_statement,
            walk_expression(&n.value, l)),
        Statement::SwitchToNewTab(n) => visit!(l, n, enter_switch_to_new_tab_statement, exit_switch_to_new_tab_statement,
            if let Some(u) = &n.url { walk_expression(u, l) }),
        Statement::SwitchToTab(n) => visit!(l, n, enter_switch_to_tab_statement, exit_switch_to_tab_statement),
        Statement::OpenInNewTab(n) => visit!(l, n, enter_open_in_new_tab_statement, exit_open_in_new_tab_statement,
            walk_expression(&n.url, l)),
        Statement::CloseTab(n) => visit!(l, n, enter_close_tab_statement, exit_close_tab_statement),
        Statement::AcceptDialog(n) => visit!(l, n, enter_accept_dialog_statement, exit_accept_dialog_statement,
            if let Some(r) = &n.response { walk_expression(r, l) }),
        Statement::DismissDialog(n) => visit!(l, n, enter_dismiss_dialog_statement, exit_dismiss_dialog_statement),
        Statement::SwitchToFrame(n) => visit!(l, n, enter_switch_to_frame_statement, exit_switch_to_frame_statement,
            walk_target(&n.target, l)),
        Statement::SwitchToMainFrame(n) => visit!(l, n, enter_switch_to_main_frame_statement, exit_switch_to_main_frame_statement),
        Statement::Download(n) => visit!(l, n, enter_download_statement, exit_download_statement,
            walk_target(&n.target, l)),
        Statement::SetCookie(n) => visit!(l, n, enter_set_cookie_statement, exit_set_cookie_statement,
            walk_expression(&n.key, l), walk_expression(&n.value, l)),
        Statement::ClearCookies(n) => visit!(l, n, enter_clear_cookies_statement, exit_clear_cookies_statement),
        Statement::SetStorage(n) => visit!(l, n, enter_set_storage_statement, exit_set_storage_statement,
            walk_expression(&n.key, l), walk_expression(&n.value, l)),
        Statement::GetStorage(n) => visit!(l, n, enter_get_storage_statement, exit_get_storage_statement,
            walk_expression(&n.key, l)),
        Statement::ClearStorage(n) => visit!(l, n, enter_clear_storage_statement, exit_clear_storage_statement),
        Statement::Return(n) => visit!(l, n, enter_return_statement, exit_return_statement,
            if let Some(v) = &n.value { walk_expression(v, l) }),
    }
    l.exit_statement(stmt);
}

fn walk_target(target: &Target, l: &mut dyn ScriptListener) {
    visit!(l, target, enter_target, exit_target,
        if let Target::Selector { selector } = target { walk_selector(selector, l) });
}

fn walk_selector(selector: &Selector, l: &mut dyn ScriptListener) {
    l.enter_selector(selector);
    for m in &selector.modifiers {
        l.enter_selector_modifier(m);
        match m {
            SelectorModifier::Has { selector } | SelectorModifier::HasNot { selector } => {
                walk_selector(selector, l)
            }
            _ => {}
        }
        l.exit_selector_modifier(m);
    }
    l.exit_selector(selector);
}

fn walk_expression(expr: &Expression, l: &mut dyn ScriptListener) {
    visit!(l, expr, enter_expression, exit_expression);
}

fn walk_has_assertion(assertion: &HasAssertion, l: &mut dyn ScriptListener) {
    match assertion {
        HasAssertion::Attribute { name, value } => {
            walk_expression(name, l);
            walk_expression(value, l);
        }
        HasAssertion::Count { value }
        | HasAssertion::Value { value }
        | HasAssertion::Text { value }
        | HasAssertion::ContainsText { value }
        | HasAssertion::Class { value } => walk_expression(value, l),
    }
}

fn walk_where(cond: &Option<DataCondition>, l: &mut dyn ScriptListener) {
    if let Some(c) = cond {
        walk_condition(c, l);
    }
}

fn walk_condition(cond: &DataCondition, l: &mut dyn ScriptListener) {
    l.enter_data_condition(cond);
    match cond {
        DataCondition::And { left, right } | DataCondition::Or { left, right } => {
            walk_condition(left, l);
            walk_condition(right, l);
        }
        DataCondition::Not { condition } => walk_condition(condition, l),
        DataCondition::Comparison { value, values, .. } => {
            if let Some(v) = value {
                walk_expression(v, l);
            }
            for v in values.iter().flatten() {
                walk_expression(v, l);
            }
        }
    }
    l.exit_data_condition(cond);
}

fn walk_order_by(order: &[OrderBy], l: &mut dyn ScriptListener) {
    for o in order {
        visit!(l, o, enter_order_by, exit_order_by);
    }
}

fn walk_utility(f: &UtilityFunction, l: &mut dyn ScriptListener) {
    l.enter_utility_function(f);
    let operands: Vec<&Expression> = match f {
        UtilityFunction::Trim { input }
        | UtilityFunction::Uppercase { input }
        | UtilityFunction::Lowercase { input }
        | UtilityFunction::Length { input }
        | UtilityFunction::Absolute { input }
        | UtilityFunction::Convert { input, .. } => input.iter().collect(),
        UtilityFunction::Replace {
            input,
            search,
            replacement,
        } => input.iter().chain([search, replacement]).collect(),
        UtilityFunction::Substring { input, start, end } => {
            input.iter().chain([start]).chain(end.iter()).collect()
        }
        UtilityFunction::Split { input, delimiter } | UtilityFunction::Join { input, delimiter } => {
            input.iter().chain([delimiter]).collect()
        }
        UtilityFunction::Concat { input, parts } => input.iter().chain(parts.iter()).collect(),
        UtilityFunction::AddDate { amount, input, .. }
        | UtilityFunction::SubtractDate { amount, input, .. } => {
            [amount].into_iter().chain(input.iter()).collect()
        }
        UtilityFunction::FormatDate { input, pattern } => input.iter().chain([pattern]).collect(),
        UtilityFunction::Round { input, decimals } => input.iter().chain(decimals.iter()).collect(),
        UtilityFunction::Generate { pattern } => vec![pattern],
        UtilityFunction::RandomNumber { min, max } => vec![min, max],
        UtilityFunction::Today | UtilityFunction::Now | UtilityFunction::Uuid => Vec::new(),
    };
    for e in operands {
        walk_expression(e, l);
    }
    l.exit_utility_function(f);
}
