//! Value expression nodes

use super::declarations::SchemaParam;
use super::types::TypeNode;
use super::{NodeId, NodeKind, NodeMeta};
use crate::metaschema::ast::{Range, ScalarValue};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum ValueNode {
    #[serde(rename = "val_scalar")]
    Scalar(ValueScalar),
    #[serde(rename = "val_list")]
    List(ValueList),
    #[serde(rename = "val_struct")]
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

impl ValueNode {
    pub fn meta(&self) -> &NodeMeta {
        match self {
            ValueNode::Scalar(node) => &node.meta,
            ValueNode::List(node) => &node.meta,
            ValueNode::Struct(node) => &node.meta,
            ValueNode::RefAction(node) => &node.meta,
            ValueNode::RefParam(node) => &node.meta,
            ValueNode::RefVariable(node) => &node.meta,
            ValueNode::RefProperty(node) => &node.meta,
            ValueNode::RefTranslation(node) => &node.meta,
            ValueNode::RefSchema(node) => &node.meta,
            ValueNode::Call(node) => &node.meta,
            ValueNode::Lambda(node) => &node.meta,
            ValueNode::Condition(node) => &node.meta,
            ValueNode::ConditionType(node) => &node.meta,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            ValueNode::Scalar(_) => NodeKind::ValScalar,
            ValueNode::List(_) => NodeKind::ValList,
            ValueNode::Struct(_) => NodeKind::ValStruct,
            ValueNode::RefAction(_) => NodeKind::RefAction,
            ValueNode::RefParam(_) => NodeKind::RefParam,
            ValueNode::RefVariable(_) => NodeKind::RefVariable,
            ValueNode::RefProperty(_) => NodeKind::RefProperty,
            ValueNode::RefTranslation(_) => NodeKind::RefTranslation,
            ValueNode::RefSchema(_) => NodeKind::RefSchema,
            ValueNode::Call(_) => NodeKind::Call,
            ValueNode::Lambda(_) => NodeKind::Lambda,
            ValueNode::Condition(_) => NodeKind::Condition,
            ValueNode::ConditionType(_) => NodeKind::ConditionType,
        }
    }

    pub fn range(&self) -> Range {
        match self {
            ValueNode::Scalar(node) => node.range,
            ValueNode::List(node) => node.range,
            ValueNode::Struct(node) => node.range,
            ValueNode::RefAction(node) => node.range,
            ValueNode::RefParam(node) => node.range,
            ValueNode::RefVariable(node) => node.range,
            ValueNode::RefProperty(node) => node.range,
            ValueNode::RefTranslation(node) => node.range,
            ValueNode::RefSchema(node) => node.range,
            ValueNode::Call(node) => node.range,
            ValueNode::Lambda(node) => node.range,
            ValueNode::Condition(node) => node.range,
            ValueNode::ConditionType(node) => node.range,
        }
    }
}

/// Literal with its built-in type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueScalar {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub type_def: TypeNode,
    pub type_desc: Option<NodeId>,
    pub value: ScalarValue,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueList {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub value: Vec<ValueNode>,
    pub type_desc: Option<NodeId>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueStruct {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub props: IndexMap<String, ValueNode>,
    pub prop_ranges: IndexMap<String, Range>,
    pub type_desc: Option<NodeId>,
    pub range: Range,
}

/// `target#action`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefAction {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub target: Box<ValueNode>,
    pub action_name: String,
    pub action_name_range: Range,
    pub range: Range,
}

/// `@name`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefParam {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub param_name: String,
    pub type_desc: Option<NodeId>,
    pub param_name_range: Range,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefVariable {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub var_name: String,
    /// Declaration the name resolves to
    pub var_ref: Option<NodeId>,
    pub type_desc: Option<NodeId>,
    pub var_name_range: Range,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefProperty {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub value: Box<ValueNode>,
    pub index: Box<ValueNode>,
    pub type_desc: Option<NodeId>,
    pub range: Range,
}

/// `$ns.term(args)$`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefTranslation {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub term_name: String,
    pub namespace_def: Vec<String>,
    pub namespace_ref: Option<NodeId>,
    pub args: Vec<CallArgument>,
    pub term_name_range: Range,
    pub namespace_ranges: Vec<Range>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefSchema {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub schema_name: String,
    pub namespace_def: Vec<String>,
    pub namespace_ref: Option<NodeId>,
    pub type_desc: Option<NodeId>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Call {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub callee: Box<ValueNode>,
    pub type_params: Vec<TypeNode>,
    pub args: Vec<CallArgument>,
    pub type_desc: Option<NodeId>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallArgument {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub id: Option<String>,
    /// Parameter the argument binds to
    pub arg_name: Option<String>,
    pub value: ValueNode,
    pub unpack: bool,
    pub type_desc: Option<NodeId>,
    pub id_range: Option<Range>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lambda {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub params: IndexMap<String, SchemaParam>,
    pub body: Box<ValueNode>,
    pub type_desc: Option<NodeId>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionBranch {
    pub when: ValueNode,
    pub then: ValueNode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub branches: Vec<ConditionBranch>,
    pub default: Option<Box<ValueNode>>,
    pub type_desc: Option<NodeId>,
    pub range: Range,
}

/// `value is <Type>`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionType {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub value: Box<ValueNode>,
    pub type_def: TypeNode,
    pub range: Range,
}
