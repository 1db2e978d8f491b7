//! Documents, namespaces and statements

use super::expressions::{CallArgument, Expression, RefVariable};
use super::range::Range;
use super::types::TypeExpression;
use serde::{Deserialize, Serialize};

/// Identifier of the namespace that collects top-level statements outside any `namespace`.
pub const DEFAULT_NAMESPACE: &str = "__default__";

/// Parsed source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub imports: Vec<Import>,
    pub namespaces: Vec<Namespace>,
    pub range: Range,
}

impl Document {
    /// The implicit namespace holding statements written outside any `namespace` block.
    pub fn default_namespace(&self) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.is_default())
    }
}

/// `import "uri";`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub uri: String,
    pub range: Range,
}

/// `use A.B;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Use {
    pub namespace: Vec<String>,
    pub namespace_ranges: Vec<Range>,
    pub range: Range,
}

/// `namespace A.B { ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: Vec<String>,
    pub id_ranges: Vec<Range>,
    pub uses: Vec<Use>,
    pub namespaces: Vec<Namespace>,
    pub schemas: Vec<Schema>,
    pub types: Vec<TypeDeclaration>,
    pub translations: Vec<Translation>,
    pub range: Range,
}

impl Namespace {
    pub fn new(id: Vec<String>, id_ranges: Vec<Range>, range: Range) -> Self {
        Self {
            id,
            id_ranges,
            uses: Vec::new(),
            namespaces: Vec::new(),
            schemas: Vec::new(),
            types: Vec::new(),
            translations: Vec::new(),
            range,
        }
    }

    pub fn is_default(&self) -> bool {
        self.id.len() == 1 && self.id[0] == DEFAULT_NAMESPACE
    }

    pub fn is_empty(&self) -> bool {
        self.uses.is_empty()
            && self.namespaces.is_empty()
            && self.schemas.is_empty()
            && self.types.is_empty()
            && self.translations.is_empty()
    }
}

/// `type Name<G> = TypeExpr;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub id: String,
    pub generics: Vec<Generic>,
    pub type_expr: TypeExpression,
    pub range: Range,
    pub id_range: Range,
}

/// `T`, `T extends Bound` or `T = Default`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generic {
    pub id: String,
    pub extends: Option<TypeExpression>,
    pub default: Option<TypeExpression>,
    pub range: Range,
    pub id_range: Range,
}

/// `schema Name<G>(params) { body }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub id: String,
    pub generics: Vec<Generic>,
    pub params: Vec<SchemaParam>,
    pub body: Vec<SchemaStatement>,
    pub range: Range,
    pub id_range: Range,
}

/// `*? name: Type = default`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaParam {
    pub id: String,
    pub type_expr: TypeExpression,
    pub default: Option<Expression>,
    pub rest: bool,
    pub range: Range,
    pub id_range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum SchemaStatement {
    Variable(Variable),
    Action(Action),
    Return(Return),
}

impl SchemaStatement {
    pub fn range(&self) -> Range {
        match self {
            SchemaStatement::Variable(node) => node.range,
            SchemaStatement::Action(node) => node.range,
            SchemaStatement::Return(node) => node.range,
        }
    }
}

/// `override? action name(params) { body }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub params: Vec<SchemaParam>,
    #[serde(rename = "override")]
    pub is_override: bool,
    pub body: Vec<ActionStatement>,
    pub range: Range,
    pub id_range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum ActionStatement {
    Variable(Variable),
    Set(Set),
    Invoke(Invoke),
}

impl ActionStatement {
    pub fn range(&self) -> Range {
        match self {
            ActionStatement::Variable(node) => node.range,
            ActionStatement::Set(node) => node.range,
            ActionStatement::Invoke(node) => node.range,
        }
    }
}

/// `let (propagate|inherit)? state? name (: Type)? = value;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub id: String,
    pub type_expr: Option<TypeExpression>,
    pub value: Expression,
    pub stateful: bool,
    pub propagated: bool,
    pub inherited: bool,
    pub range: Range,
    pub id_range: Range,
}

/// `return value;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Return {
    pub value: Expression,
    pub range: Range,
    pub keyword_range: Range,
}

/// `set name = value;` (also spelled `update`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Set {
    pub target: RefVariable,
    pub value: Expression,
    pub range: Range,
}

/// `invoke target#action(args);`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoke {
    pub action: Expression,
    pub args: Vec<CallArgument>,
    pub range: Range,
}

/// `translation Name { term.id(params) => value; ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub id: String,
    pub terms: Vec<TranslationTerm>,
    pub range: Range,
    pub id_range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationTerm {
    pub id: Vec<String>,
    pub id_ranges: Vec<Range>,
    pub params: Vec<SchemaParam>,
    pub value: Expression,
    pub range: Range,
}
