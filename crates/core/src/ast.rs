//! Typed AST for Vero scripts.
//!
//! Produced once per parse and never mutated afterwards. Every node that maps
//! to a source construct carries the 1-based `line` of its leading token.
//! Tagged unions serialize internally tagged under `"type"` so the JSON form
//! reads `{"type":"Comparison","column":"role",...}`.

use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Program and declarations
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub pages: Vec<Page>,
    pub features: Vec<Feature>,
    pub fixtures: Vec<Fixture>,
}

impl Program {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.features.is_empty() && self.fixtures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub name: String,
    pub fields: Vec<Field>,
    pub variables: Vec<Variable>,
    pub actions: Vec<ActionDefinition>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    pub selector: Selector,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub var_type: VarType,
    pub name: String,
    pub value: Expression,
    pub line: u32,
}

/// A reusable page action: `login WITH email, password RETURNS FLAG { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    pub name: String,
    pub parameters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<VarType>,
    pub statements: Vec<Statement>,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    Text,
    Number,
    Flag,
    List,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub name: String,
    pub annotations: Vec<FeatureAnnotation>,
    pub uses: Vec<UseStatement>,
    pub fixture_uses: Vec<FixtureUse>,
    pub hooks: Vec<Hook>,
    pub scenarios: Vec<Scenario>,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureAnnotation {
    Serial,
    Skip,
    Only,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseStatement {
    pub page_name: String,
    pub line: u32,
}

/// `WITH FIXTURE name(option = value, ...)` inside a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureUse {
    pub fixture_name: String,
    pub options: Vec<FixtureOptionValue>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureOptionValue {
    pub name: String,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hook {
    pub hook_type: HookType,
    pub statements: Vec<Statement>,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookType {
    BeforeEach,
    BeforeAll,
    AfterEach,
    AfterAll,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub name: String,
    pub annotations: Vec<ScenarioAnnotation>,
    pub tags: Vec<String>,
    pub statements: Vec<Statement>,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioAnnotation {
    Skip,
    Only,
    Slow,
    Fixme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub name: String,
    pub parameters: Vec<String>,
    pub scope: FixtureScope,
    pub dependencies: Vec<String>,
    pub auto: bool,
    pub options: Vec<FixtureOption>,
    pub setup: Vec<Statement>,
    pub teardown: Vec<Statement>,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureScope {
    #[default]
    Test,
    Worker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureOption {
    pub name: String,
    pub default: Expression,
    pub line: u32,
}

// ──────────────────────────────────────────────
// Selectors and targets
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    pub selector_type: SelectorType,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_param: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub modifiers: Vec<SelectorModifier>,
}

impl Selector {
    pub fn auto(value: impl Into<String>) -> Self {
        Selector {
            selector_type: SelectorType::Auto,
            value: value.into(),
            name_param: None,
            modifiers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorType {
    /// Bare string; the runner infers text, css or test-id matching.
    Auto,
    /// `ROLE "button" NAME "Save"`, or the shorthand `BUTTON "Save"`.
    Role,
    Label,
    Placeholder,
    Alt,
    Title,
    #[serde(rename = "testid")]
    TestId,
    Css,
    Xpath,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SelectorModifier {
    First,
    Last,
    Nth { index: u32 },
    WithText { text: String },
    WithoutText { text: String },
    Has { selector: Box<Selector> },
    HasNot { selector: Box<Selector> },
}

/// The element an interaction or assertion acts on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Target {
    /// `email` or `LoginPage.email`
    Field {
        #[serde(skip_serializing_if = "Option::is_none")]
        page: Option<String>,
        field: String,
    },
    /// A visible-text target: `CLICK "Submit"`
    Text { text: String },
    /// An inline selector: `CLICK CSS "#go"`
    Selector { selector: Selector },
}

impl Target {
    pub fn text(&self) -> Option<&str> {
        match self {
            Target::Text { text } => Some(text),
            _ => None,
        }
    }
}

// ──────────────────────────────────────────────
// Expressions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expression {
    StringLiteral {
        value: String,
    },
    NumberLiteral {
        value: f64,
    },
    BooleanLiteral {
        value: bool,
    },
    /// `name` or `Page.name`
    VariableReference {
        #[serde(skip_serializing_if = "Option::is_none")]
        page: Option<String>,
        name: String,
    },
    /// `{{NAME}}`
    EnvVarReference {
        name: String,
    },
}

// ──────────────────────────────────────────────
// Data conditions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DataCondition {
    And {
        left: Box<DataCondition>,
        right: Box<DataCondition>,
    },
    Or {
        left: Box<DataCondition>,
        right: Box<DataCondition>,
    },
    Not {
        condition: Box<DataCondition>,
    },
    Comparison {
        column: String,
        operator: ComparisonOperator,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Expression>,
        #[serde(skip_serializing_if = "Option::is_none")]
        values: Option<Vec<Expression>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "startsWith")]
    StartsWith,
    #[serde(rename = "endsWith")]
    EndsWith,
    #[serde(rename = "matches")]
    Matches,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "notIn")]
    NotIn,
    #[serde(rename = "isEmpty")]
    IsEmpty,
    #[serde(rename = "isNotEmpty")]
    IsNotEmpty,
    #[serde(rename = "isNull")]
    IsNull,
    #[serde(rename = "isNotNull")]
    IsNotNull,
}

impl ComparisonOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "==",
            ComparisonOperator::Ne => "!=",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Le => "<=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::Contains => "contains",
            ComparisonOperator::StartsWith => "startsWith",
            ComparisonOperator::EndsWith => "endsWith",
            ComparisonOperator::Matches => "matches",
            ComparisonOperator::In => "in",
            ComparisonOperator::NotIn => "notIn",
            ComparisonOperator::IsEmpty => "isEmpty",
            ComparisonOperator::IsNotEmpty => "isNotEmpty",
            ComparisonOperator::IsNull => "isNull",
            ComparisonOperator::IsNotNull => "isNotNull",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    pub table_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

// ──────────────────────────────────────────────
// Utility functions
// ──────────────────────────────────────────────

/// One link of a `THEN` chain. `input` is `None` on chained calls, which
/// operate on the previous link's result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UtilityFunction {
    Trim {
        input: Option<Expression>,
    },
    Uppercase {
        input: Option<Expression>,
    },
    Lowercase {
        input: Option<Expression>,
    },
    Length {
        input: Option<Expression>,
    },
    Replace {
        input: Option<Expression>,
        search: Expression,
        replacement: Expression,
    },
    Substring {
        input: Option<Expression>,
        start: Expression,
        end: Option<Expression>,
    },
    Split {
        input: Option<Expression>,
        delimiter: Expression,
    },
    Join {
        input: Option<Expression>,
        delimiter: Expression,
    },
    Concat {
        input: Option<Expression>,
        parts: Vec<Expression>,
    },
    Today,
    Now,
    AddDate {
        amount: Expression,
        unit: DateUnit,
        input: Option<Expression>,
    },
    SubtractDate {
        amount: Expression,
        unit: DateUnit,
        input: Option<Expression>,
    },
    FormatDate {
        input: Option<Expression>,
        pattern: Expression,
    },
    Round {
        input: Option<Expression>,
        decimals: Option<Expression>,
    },
    Absolute {
        input: Option<Expression>,
    },
    Convert {
        input: Option<Expression>,
        target: VarType,
    },
    Generate {
        pattern: Expression,
    },
    RandomNumber {
        min: Expression,
        max: Expression,
    },
    Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateUnit {
    Days,
    Months,
    Years,
}

// ──────────────────────────────────────────────
// Statements
// ──────────────────────────────────────────────

/// Every statement form of the language. Adding a variant is a compile-time
/// change everywhere statements are matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Statement {
    Click(TargetStatement),
    RightClick(TargetStatement),
    DoubleClick(TargetStatement),
    ForceClick(TargetStatement),
    Drag(DragStatement),
    Fill(FillStatement),
    Open(OpenStatement),
    Check(TargetStatement),
    Uncheck(TargetStatement),
    Select(SelectStatement),
    Hover(TargetStatement),
    Press(PressStatement),
    Scroll(ScrollStatement),
    Wait(WaitStatement),
    WaitFor(TargetStatement),
    Refresh(MarkerStatement),
    Log(LogStatement),
    Screenshot(ScreenshotStatement),
    Upload(UploadStatement),
    Perform(PerformStatement),
    VerifyElement(VerifyElementStatement),
    VerifyUrl(VerifyTextStatement),
    VerifyTitle(VerifyTextStatement),
    VerifyHas(VerifyHasStatement),
    Load(LoadStatement),
    ForEach(ForEachStatement),
    Row(RowStatement),
    Rows(RowsStatement),
    ColumnAccess(ColumnAccessStatement),
    Count(CountStatement),
    UtilityAssignment(UtilityAssignmentStatement),
    VariableDeclaration(VariableDeclarationStatement),
    SwitchToNewTab(SwitchToNewTabStatement),
    SwitchToTab(SwitchToTabStatement),
    OpenInNewTab(OpenStatement),
    CloseTab(MarkerStatement),
    AcceptDialog(AcceptDialogStatement),
    DismissDialog(MarkerStatement),
    SwitchToFrame(TargetStatement),
    SwitchToMainFrame(MarkerStatement),
    Download(DownloadStatement),
    SetCookie(KeyValueStatement),
    ClearCookies(MarkerStatement),
    SetStorage(KeyValueStatement),
    GetStorage(GetStorageStatement),
    ClearStorage(MarkerStatement),
    Return(ReturnStatement),
}

impl Statement {
    pub fn line(&self) -> u32 {
        match self {
            Statement::Click(s)
            | Statement::RightClick(s)
            | Statement::DoubleClick(s)
            | Statement::ForceClick(s)
            | Statement::Check(s)
            | Statement::Uncheck(s)
            | Statement::Hover(s)
            | Statement::WaitFor(s)
            | Statement::SwitchToFrame(s) => s.line,
            Statement::Refresh(s)
            | Statement::CloseTab(s)
            | Statement::DismissDialog(s)
            | Statement::SwitchToMainFrame(s)
            | Statement::ClearCookies(s)
            | Statement::ClearStorage(s) => s.line,
            Statement::Open(s) | Statement::OpenInNewTab(s) => s.line,
            Statement::VerifyUrl(s) | Statement::VerifyTitle(s) => s.line,
            Statement::SetCookie(s) | Statement::SetStorage(s) => s.line,
            Statement::Drag(s) => s.line,
            Statement::Fill(s) => s.line,
            Statement::Select(s) => s.line,
            Statement::Press(s) => s.line,
            Statement::Scroll(s) => s.line,
            Statement::Wait(s) => s.line,
            Statement::Log(s) => s.line,
            Statement::Screenshot(s) => s.line,
            Statement::Upload(s) => s.line,
            Statement::Perform(s) => s.line,
            Statement::VerifyElement(s) => s.line,
            Statement::VerifyHas(s) => s.line,
            Statement::Load(s) => s.line,
            Statement::ForEach(s) => s.line,
            Statement::Row(s) => s.line,
            Statement::Rows(s) => s.line,
            Statement::ColumnAccess(s) => s.line,
            Statement::Count(s) => s.line,
            Statement::UtilityAssignment(s) => s.line,
            Statement::VariableDeclaration(s) => s.line,
            Statement::SwitchToNewTab(s) => s.line,
            Statement::SwitchToTab(s) => s.line,
            Statement::AcceptDialog(s) => s.line,
            Statement::Download(s) => s.line,
            Statement::GetStorage(s) => s.line,
            Statement::Return(s) => s.line,
        }
    }

    /// The variant tag, as it appears in serialized output.
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Click(_) => "Click",
            Statement::RightClick(_) => "RightClick",
            Statement::DoubleClick(_) => "DoubleClick",
            Statement::ForceClick(_) => "ForceClick",
            Statement::Drag(_) => "Drag",
            Statement::Fill(_) => "Fill",
            Statement::Open(_) => "Open",
            Statement::Check(_) => "Check",
            Statement::Uncheck(_) => "Uncheck",
            Statement::Select(_) => "Select",
            Statement::Hover(_) => "Hover",
            Statement::Press(_) => "Press",
            Statement::Scroll(_) => "Scroll",
            Statement::Wait(_) => "Wait",
            Statement::WaitFor(_) => "WaitFor",
            Statement::Refresh(_) => "Refresh",
            Statement::Log(_) => "Log",
            Statement::Screenshot(_) => "Screenshot",
            Statement::Upload(_) => "Upload",
            Statement::Perform(_) => "Perform",
            Statement::VerifyElement(_) => "VerifyElement",
            Statement::VerifyUrl(_) => "VerifyUrl",
            Statement::VerifyTitle(_) => "VerifyTitle",
            Statement::VerifyHas(_) => "VerifyHas",
            Statement::Load(_) => "Load",
            Statement::ForEach(_) => "ForEach",
            Statement::Row(_) => "Row",
            Statement::Rows(_) => "Rows",
            Statement::ColumnAccess(_) => "ColumnAccess",
            Statement::Count(_) => "Count",
            Statement::UtilityAssignment(_) => "UtilityAssignment",
            Statement::VariableDeclaration(_) => "VariableDeclaration",
            Statement::SwitchToNewTab(_) => "SwitchToNewTab",
            Statement::SwitchToTab(_) => "SwitchToTab",
            Statement::OpenInNewTab(_) => "OpenInNewTab",
            Statement::CloseTab(_) => "CloseTab",
            Statement::AcceptDialog(_) => "AcceptDialog",
            Statement::DismissDialog(_) => "DismissDialog",
            Statement::SwitchToFrame(_) => "SwitchToFrame",
            Statement::SwitchToMainFrame(_) => "SwitchToMainFrame",
            Statement::Download(_) => "Download",
            Statement::SetCookie(_) => "SetCookie",
            Statement::ClearCookies(_) => "ClearCookies",
            Statement::SetStorage(_) => "SetStorage",
            Statement::GetStorage(_) => "GetStorage",
            Statement::ClearStorage(_) => "ClearStorage",
            Statement::Return(_) => "Return",
        }
    }
}

/// Shared shape of the single-target interactions (click family, check,
/// hover, wait-for, switch-to-frame).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetStatement {
    pub target: Target,
    pub line: u32,
}

/// Statements with no operands (`REFRESH`, `CLOSE TAB`, `CLEAR COOKIES`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStatement {
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragStatement {
    pub source: Target,
    pub destination: Target,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillStatement {
    pub target: Target,
    pub value: Expression,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenStatement {
    pub url: Expression,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectStatement {
    pub option: Expression,
    pub target: Target,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressStatement {
    pub key: Expression,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollStatement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<ScrollDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitStatement {
    pub duration: f64,
    pub unit: TimeUnit,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Seconds,
    Milliseconds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogStatement {
    pub message: Expression,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotStatement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadStatement {
    pub files: Vec<Expression>,
    pub target: Target,
    pub line: u32,
}

/// `DO Page.action WITH arg, ...`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformStatement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    pub action: String,
    pub arguments: Vec<Expression>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyElementStatement {
    pub target: Target,
    pub negated: bool,
    pub state: ElementState,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    Visible,
    Hidden,
    Enabled,
    Disabled,
    Checked,
    Empty,
    Focused,
}

/// URL and title assertions share this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyTextStatement {
    pub condition: TextMatch,
    pub value: Expression,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextMatch {
    Contains,
    Equal,
    Matches,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyHasStatement {
    pub target: Target,
    pub assertion: HasAssertion,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HasAssertion {
    Count { value: Expression },
    Value { value: Expression },
    Attribute { name: Expression, value: Expression },
    Text { value: Expression },
    ContainsText { value: Expression },
    Class { value: Expression },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStatement {
    pub variable: String,
    pub table_name: String,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<DataCondition>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForEachStatement {
    pub item: String,
    pub collection: String,
    pub statements: Vec<Statement>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowStatement {
    pub variable: String,
    pub table_ref: TableReference,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<DataCondition>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub order_by: Vec<OrderBy>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowsStatement {
    pub variable: String,
    pub table_ref: TableReference,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<DataCondition>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub order_by: Vec<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    pub line: u32,
}

/// `TEXT email = Users[0].email`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnAccessStatement {
    pub var_type: VarType,
    pub variable: String,
    pub table_ref: TableReference,
    pub index: u64,
    pub column: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountStatement {
    pub variable: String,
    pub table_ref: TableReference,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<DataCondition>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilityAssignmentStatement {
    pub var_type: VarType,
    pub variable: String,
    pub chain: Vec<UtilityFunction>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDeclarationStatement {
    pub var_type: VarType,
    pub name: String,
    pub value: Expression,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchToNewTabStatement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Expression>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchToTabStatement {
    pub index: u32,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptDialogStatement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Expression>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadStatement {
    pub target: Target,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_as: Option<String>,
    pub line: u32,
}

/// `SET COOKIE key TO value` and `SET STORAGE key TO value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValueStatement {
    pub key: Expression,
    pub value: Expression,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetStorageStatement {
    pub key: Expression,
    pub variable: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStatement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Expression>,
    pub line: u32,
}
