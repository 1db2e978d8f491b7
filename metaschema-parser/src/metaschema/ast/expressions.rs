//! Value expression nodes
//!
//! Operators do not have nodes of their own. `a < b` is a [`Call`] of `Meta.Compare.lt`
//! with `left`/`right` arguments, `!a` a call of `Meta.Logic.not` with a `value` argument,
//! and a string template a call of `Meta.concat` with one `value` argument per segment.

use super::builtins::Builtin;
use super::declarations::SchemaParam;
use super::range::Range;
use super::types::{TypeExpression, TypeRef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Expression {
    Scalar(Scalar),
    List(ValueList),
    Struct(ValueStruct),
    RefAction(RefAction),
    RefParam(RefParam),
    RefVariable(RefVariable),
    RefProperty(RefProperty),
    RefTranslation(RefTranslation),
    RefSchema(RefSchema),
    Call(Call),
    Lambda(Lambda),
    Condition(Condition),
    ConditionType(ConditionType),
}

impl Expression {
    pub fn range(&self) -> Range {
        match self {
            Expression::Scalar(node) => node.range,
            Expression::List(node) => node.range,
            Expression::Struct(node) => node.range,
            Expression::RefAction(node) => node.range,
            Expression::RefParam(node) => node.range,
            Expression::RefVariable(node) => node.range,
            Expression::RefProperty(node) => node.range,
            Expression::RefTranslation(node) => node.range,
            Expression::RefSchema(node) => node.range,
            Expression::Call(node) => node.range,
            Expression::Lambda(node) => node.range,
            Expression::Condition(node) => node.range,
            Expression::ConditionType(node) => node.range,
        }
    }

    /// Short node name used in diagnostics and debug output.
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::Scalar(_) => "scalar",
            Expression::List(_) => "list",
            Expression::Struct(_) => "struct",
            Expression::RefAction(_) => "ref_action",
            Expression::RefParam(_) => "ref_param",
            Expression::RefVariable(_) => "ref_variable",
            Expression::RefProperty(_) => "ref_property",
            Expression::RefTranslation(_) => "ref_translation",
            Expression::RefSchema(_) => "ref_schema",
            Expression::Call(_) => "call",
            Expression::Lambda(_) => "lambda",
            Expression::Condition(_) => "condition",
            Expression::ConditionType(_) => "condition_type",
        }
    }
}

/// Literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

/// A literal together with its built-in type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scalar {
    pub type_ref: TypeRef,
    pub value: ScalarValue,
    pub range: Range,
}

impl Scalar {
    pub fn new(builtin: Builtin, value: ScalarValue, range: Range) -> Self {
        Self {
            type_ref: TypeRef::builtin(builtin, range),
            value,
            range,
        }
    }
}

/// `[a, b, c]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueList {
    pub elements: Vec<Expression>,
    pub range: Range,
}

/// `{ key: value, ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueStruct {
    pub props: IndexMap<String, Expression>,
    /// From the key to the end of its value
    pub prop_ranges: IndexMap<String, Range>,
    pub range: Range,
}

/// `target#action`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefAction {
    pub target: Box<Expression>,
    pub id: String,
    pub range: Range,
    pub id_range: Range,
}

/// `@param`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefParam {
    pub name: String,
    pub range: Range,
    pub name_range: Range,
}

/// Bare identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefVariable {
    pub name: String,
    pub range: Range,
    pub name_range: Range,
}

/// `value.name` or `value[index]`; the dotted form stores the name as a string scalar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefProperty {
    pub value: Box<Expression>,
    pub index: Box<Expression>,
    pub range: Range,
}

/// `$ns.term(args)$`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefTranslation {
    pub namespace: Vec<String>,
    pub name: String,
    pub args: Vec<CallArgument>,
    pub range: Range,
    pub namespace_ranges: Vec<Range>,
    pub name_range: Range,
}

/// Reference to a schema, only produced by desugaring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefSchema {
    pub namespace: Vec<String>,
    pub name: String,
    pub range: Range,
}

impl RefSchema {
    pub fn builtin(builtin: Builtin, range: Range) -> Self {
        Self {
            namespace: builtin.namespace_owned(),
            name: builtin.name.to_string(),
            range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub callee: Box<Expression>,
    pub type_params: Vec<TypeExpression>,
    pub args: Vec<CallArgument>,
    pub range: Range,
}

impl Call {
    /// Call of a built-in schema with the given arguments.
    pub fn builtin(builtin: Builtin, callee_range: Range, args: Vec<CallArgument>, range: Range) -> Self {
        Self {
            callee: Box::new(Expression::RefSchema(RefSchema::builtin(builtin, callee_range))),
            type_params: Vec::new(),
            args,
            range,
        }
    }
}

/// `~? value` or `name: value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallArgument {
    pub id: Option<String>,
    pub value: Expression,
    pub unpack: bool,
    pub range: Range,
    pub id_range: Option<Range>,
}

impl CallArgument {
    /// Argument named by the desugaring rather than by source text.
    pub fn named(id: &str, value: Expression, range: Range) -> Self {
        Self {
            id: Some(id.to_string()),
            value,
            unpack: false,
            range,
            id_range: None,
        }
    }
}

/// `fn (params) => body`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lambda {
    pub params: Vec<SchemaParam>,
    pub body: Box<Expression>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionBranch {
    pub when: Expression,
    pub then: Expression,
}

/// `when { (c) => v; ... }`, `c then a else b` and `c ? a : b`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub branches: Vec<ConditionBranch>,
    pub default: Option<Box<Expression>>,
    pub range: Range,
}

/// `value is <Type>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionType {
    pub value: Box<Expression>,
    pub type_expr: TypeExpression,
    pub range: Range,
}
