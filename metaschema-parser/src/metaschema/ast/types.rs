//! Type expression nodes

use super::builtins::Builtin;
use super::range::Range;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Any type expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TypeExpression {
    Ref(TypeRef),
    Struct(TypeStruct),
    OneOf(TypeOneOf),
    AllOf(TypeAllOf),
}

impl TypeExpression {
    pub fn range(&self) -> Range {
        match self {
            TypeExpression::Ref(node) => node.range,
            TypeExpression::Struct(node) => node.range,
            TypeExpression::OneOf(node) => node.range,
            TypeExpression::AllOf(node) => node.range,
        }
    }

    pub fn as_type_ref(&self) -> Option<&TypeRef> {
        match self {
            TypeExpression::Ref(node) => Some(node),
            _ => None,
        }
    }
}

/// Reference to a named type, `NS.Name<Params>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRef {
    pub namespace: Vec<String>,
    pub name: String,
    pub params: Vec<TypeExpression>,
    pub range: Range,
    pub namespace_ranges: Vec<Range>,
    pub name_range: Range,
}

impl TypeRef {
    /// Reference to a `Meta` built-in type, anchored at `range`.
    pub fn builtin(builtin: Builtin, range: Range) -> Self {
        Self {
            namespace: builtin.namespace_owned(),
            name: builtin.name.to_string(),
            params: Vec::new(),
            range,
            namespace_ranges: Vec::new(),
            name_range: range,
        }
    }

    /// `Meta.String` style display name.
    pub fn qualified_name(&self) -> String {
        let mut parts = self.namespace.clone();
        parts.push(self.name.clone());
        parts.join(".")
    }
}

/// Inline structure type, `{ name: Type; ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeStruct {
    pub props: IndexMap<String, TypeExpression>,
    /// Range of each property identifier
    pub prop_ranges: IndexMap<String, Range>,
    pub range: Range,
}

/// Union, `A | B | C`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeOneOf {
    pub types: Vec<TypeExpression>,
    pub range: Range,
}

/// Intersection, `A & B & C`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAllOf {
    pub types: Vec<TypeExpression>,
    pub range: Range,
}
