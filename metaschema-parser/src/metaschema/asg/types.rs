//! Type expression nodes

use super::{NodeId, NodeKind, NodeMeta};
use crate::metaschema::ast::Range;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TypeNode {
    #[serde(rename = "ref_type")]
    Ref(RefType),
    #[serde(rename = "type_struct")]
    Struct(TypeStruct),
    #[serde(rename = "type_oneof")]
    OneOf(TypeOneOf),
    #[serde(rename = "type_allof")]
    AllOf(TypeAllOf),
}

impl TypeNode {
    pub fn meta(&self) -> &NodeMeta {
        match self {
            TypeNode::Ref(node) => &node.meta,
            TypeNode::Struct(node) => &node.meta,
            TypeNode::OneOf(node) => &node.meta,
            TypeNode::AllOf(node) => &node.meta,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            TypeNode::Ref(_) => NodeKind::RefType,
            TypeNode::Struct(_) => NodeKind::TypeStruct,
            TypeNode::OneOf(_) => NodeKind::TypeOneof,
            TypeNode::AllOf(_) => NodeKind::TypeAllof,
        }
    }

    pub fn as_ref_type(&self) -> Option<&RefType> {
        match self {
            TypeNode::Ref(node) => Some(node),
            _ => None,
        }
    }
}

/// Named type reference, unresolved after lowering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefType {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub type_name: String,
    /// Namespace path as written
    pub namespace_def: Vec<String>,
    /// Namespace the path resolves to
    pub namespace_ref: Option<NodeId>,
    pub params: Vec<TypeNode>,
    pub type_desc: Option<NodeId>,
    pub type_name_range: Range,
    pub namespace_ranges: Vec<Range>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeStruct {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub props: IndexMap<String, TypeNode>,
    pub prop_ranges: IndexMap<String, Range>,
    pub type_desc: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeOneOf {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub types: Vec<TypeNode>,
    pub type_desc: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeAllOf {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub types: Vec<TypeNode>,
    pub type_desc: Option<NodeId>,
}
