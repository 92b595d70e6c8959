use serde::{Deserialize, Serialize};

/// Semantic ids are deterministic, human-readable strings (see
/// `identity::semantic_id`), not random uuids — re-running analysis over an
/// unchanged file must reproduce the same id.
pub type NodeId = String;
pub type EdgeId = u64;

/// The language a module was parsed with. The visitor framework in
/// `grafema-analyzer` only implements the full fact-extraction surface for
/// `JavaScript`/`TypeScript` (the reference language); the other variants
/// are still detected for module discovery and dependency-edge purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    JavaScript,
    TypeScript,
    Rust,
    Python,
    Go,
    Other,
}

/// Closed enum of node kinds the graph can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Module,
    Service,
    Entrypoint,
    Function,
    Method,
    Parameter,
    Scope,
    Branch,
    Case,
    Call,
    MethodCall,
    ConstructorCall,
    Variable,
    Constant,
    Literal,
    ObjectLiteral,
    ArrayLiteral,
    Class,
    Interface,
    Type,
    TypeParameter,
    Enum,
    Decorator,
    Expression,
    PropertyAccess,
    Import,
    Export,
    EventListener,
    Issue,
    TryBlock,
    CatchBlock,
    FinallyBlock,
    External,
    BrowserApi,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Module => "MODULE",
            NodeKind::Service => "SERVICE",
            NodeKind::Entrypoint => "ENTRYPOINT",
            NodeKind::Function => "FUNCTION",
            NodeKind::Method => "METHOD",
            NodeKind::Parameter => "PARAMETER",
            NodeKind::Scope => "SCOPE",
            NodeKind::Branch => "BRANCH",
            NodeKind::Case => "CASE",
            NodeKind::Call => "CALL",
            NodeKind::MethodCall => "METHOD_CALL",
            NodeKind::ConstructorCall => "CONSTRUCTOR_CALL",
            NodeKind::Variable => "VARIABLE",
            NodeKind::Constant => "CONSTANT",
            NodeKind::Literal => "LITERAL",
            NodeKind::ObjectLiteral => "OBJECT_LITERAL",
            NodeKind::ArrayLiteral => "ARRAY_LITERAL",
            NodeKind::Class => "CLASS",
            NodeKind::Interface => "INTERFACE",
            NodeKind::Type => "TYPE",
            NodeKind::TypeParameter => "TYPE_PARAMETER",
            NodeKind::Enum => "ENUM",
            NodeKind::Decorator => "DECORATOR",
            NodeKind::Expression => "EXPRESSION",
            NodeKind::PropertyAccess => "PROPERTY_ACCESS",
            NodeKind::Import => "IMPORT",
            NodeKind::Export => "EXPORT",
            NodeKind::EventListener => "EVENT_LISTENER",
            NodeKind::Issue => "ISSUE",
            NodeKind::TryBlock => "TRY_BLOCK",
            NodeKind::CatchBlock => "CATCH_BLOCK",
            NodeKind::FinallyBlock => "FINALLY_BLOCK",
            NodeKind::External => "EXTERNAL",
            NodeKind::BrowserApi => "BROWSER_API",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed enum of edge kinds the graph can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    Contains,
    Declares,
    Calls,
    CallsOn,
    HasCallback,
    Returns,
    Throws,
    Rejects,
    CatchesFrom,
    AssignedFrom,
    DerivesFrom,
    ReadsFrom,
    Uses,
    HasScope,
    Captures,
    ImportsFrom,
    Imports,
    DependsOn,
    Extends,
    Implements,
    Overrides,
    ImplementsOverload,
    HasOverload,
    HasType,
    ReturnsType,
    ConstrainedBy,
    UnionMember,
    IntersectsWith,
    Infers,
    ChainsFrom,
    Awaits,
    Aliases,
    ListensTo,
    BindsThisTo,
    Invokes,
    PassesArgument,
    FlowsInto,
    SpreadsFrom,
    Deletes,
    Shadows,
    MergesWith,
    AccessesPrivate,
    DefaultsTo,
    ExtendsScopeWith,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Contains => "CONTAINS",
            EdgeKind::Declares => "DECLARES",
            EdgeKind::Calls => "CALLS",
            EdgeKind::CallsOn => "CALLS_ON",
            EdgeKind::HasCallback => "HAS_CALLBACK",
            EdgeKind::Returns => "RETURNS",
            EdgeKind::Throws => "THROWS",
            EdgeKind::Rejects => "REJECTS",
            EdgeKind::CatchesFrom => "CATCHES_FROM",
            EdgeKind::AssignedFrom => "ASSIGNED_FROM",
            EdgeKind::DerivesFrom => "DERIVES_FROM",
            EdgeKind::ReadsFrom => "READS_FROM",
            EdgeKind::Uses => "USES",
            EdgeKind::HasScope => "HAS_SCOPE",
            EdgeKind::Captures => "CAPTURES",
            EdgeKind::ImportsFrom => "IMPORTS_FROM",
            EdgeKind::Imports => "IMPORTS",
            EdgeKind::DependsOn => "DEPENDS_ON",
            EdgeKind::Extends => "EXTENDS",
            EdgeKind::Implements => "IMPLEMENTS",
            EdgeKind::Overrides => "OVERRIDES",
            EdgeKind::ImplementsOverload => "IMPLEMENTS_OVERLOAD",
            EdgeKind::HasOverload => "HAS_OVERLOAD",
            EdgeKind::HasType => "HAS_TYPE",
            EdgeKind::ReturnsType => "RETURNS_TYPE",
            EdgeKind::ConstrainedBy => "CONSTRAINED_BY",
            EdgeKind::UnionMember => "UNION_MEMBER",
            EdgeKind::IntersectsWith => "INTERSECTS_WITH",
            EdgeKind::Infers => "INFERS",
            EdgeKind::ChainsFrom => "CHAINS_FROM",
            EdgeKind::Awaits => "AWAITS",
            EdgeKind::Aliases => "ALIASES",
            EdgeKind::ListensTo => "LISTENS_TO",
            EdgeKind::BindsThisTo => "BINDS_THIS_TO",
            EdgeKind::Invokes => "INVOKES",
            EdgeKind::PassesArgument => "PASSES_ARGUMENT",
            EdgeKind::FlowsInto => "FLOWS_INTO",
            EdgeKind::SpreadsFrom => "SPREADS_FROM",
            EdgeKind::Deletes => "DELETES",
            EdgeKind::Shadows => "SHADOWS",
            EdgeKind::MergesWith => "MERGES_WITH",
            EdgeKind::AccessesPrivate => "ACCESSES_PRIVATE",
            EdgeKind::DefaultsTo => "DEFAULTS_TO",
            EdgeKind::ExtendsScopeWith => "EXTENDS_SCOPE_WITH",
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Source position, always relative to the file the node/edge was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}
