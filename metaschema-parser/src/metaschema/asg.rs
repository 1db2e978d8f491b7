//! Abstract semantic graph
//!
//! The ASG is what [analysis](crate::metaschema::analysis) lowers a parsed [`Document`] into.
//! It keeps the shapes of the syntax tree but normalizes them for semantic work:
//!
//! - namespaces are keyed by identifier, and a dotted `A.B.C` is a chain of three nested
//!   namespaces; repeated declarations of one path are merged (see [`merge_namespace`])
//! - declarations inside a namespace are grouped by identifier, each key holding a list
//! - schema parameters, variables and actions are keyed by identifier
//!
//! ## Identity and links
//!
//! Nodes are owned by their parent like any tree. Every node also carries a [`NodeMeta`]:
//! a document-unique [`NodeId`], the id of its parent, and the ids of nodes referencing it.
//! Parent ids are navigational only; [`Document::find`] and [`Document::parent_of`] resolve
//! them through the [walker](walk).
//!
//! Slots that later passes fill in (`refs`, `type_desc`, `namespace_ref`, `var_ref`) are
//! empty after lowering.
//!
//! [`Document`]: declarations::Document

pub mod declarations;
pub mod types;
pub mod values;
pub mod walk;

pub use declarations::{
    merge_namespace, Action, ActionStatement, Document, Import, Namespace, OpInvoke, OpSet,
    Return, Schema, SchemaParam, Translation, TranslationTerm, TypeDeclaration, TypeParam, Use,
    Variable,
};
pub use types::{RefType, TypeAllOf, TypeNode, TypeOneOf, TypeStruct};
pub use values::{
    Call, CallArgument, Condition, ConditionBranch, ConditionType, Lambda, RefAction, RefParam,
    RefProperty, RefSchema, RefTranslation, RefVariable, ValueList, ValueNode, ValueScalar,
    ValueStruct,
};
pub use walk::{Flow, NodeRef, Visitor};

use serde::Serialize;
use std::fmt;

/// Identifier of an ASG node, unique within one lowered document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Fields shared by every node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeMeta {
    #[serde(rename = "node_id")]
    pub id: NodeId,
    pub parent: Option<NodeId>,
    /// Nodes referencing this one. Filled by reference resolution, not by lowering.
    pub refs: Vec<NodeId>,
}

impl NodeMeta {
    pub fn new(id: NodeId, parent: Option<NodeId>) -> Self {
        Self {
            id,
            parent,
            refs: Vec::new(),
        }
    }
}

/// Node kinds, named as they appear in serialized output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Document,
    Namespace,
    DlImport,
    DlUse,
    DlType,
    DlTypeParam,
    DlSchema,
    DlSchemaParam,
    DlTranslation,
    DlTranslationTerm,
    DlVariable,
    DlReturn,
    DlAction,
    TypeStruct,
    TypeOneof,
    TypeAllof,
    RefType,
    RefVariable,
    RefParam,
    RefProperty,
    RefAction,
    RefSchema,
    RefTranslation,
    CallArgument,
    Call,
    Lambda,
    Condition,
    ConditionType,
    OpInvoke,
    OpSet,
    ValScalar,
    ValList,
    ValStruct,
}

impl NodeKind {
    pub const ALL: &'static [NodeKind] = &[
        NodeKind::Document,
        NodeKind::Namespace,
        NodeKind::DlImport,
        NodeKind::DlUse,
        NodeKind::DlType,
        NodeKind::DlTypeParam,
        NodeKind::DlSchema,
        NodeKind::DlSchemaParam,
        NodeKind::DlTranslation,
        NodeKind::DlTranslationTerm,
        NodeKind::DlVariable,
        NodeKind::DlReturn,
        NodeKind::DlAction,
        NodeKind::TypeStruct,
        NodeKind::TypeOneof,
        NodeKind::TypeAllof,
        NodeKind::RefType,
        NodeKind::RefVariable,
        NodeKind::RefParam,
        NodeKind::RefProperty,
        NodeKind::RefAction,
        NodeKind::RefSchema,
        NodeKind::RefTranslation,
        NodeKind::CallArgument,
        NodeKind::Call,
        NodeKind::Lambda,
        NodeKind::Condition,
        NodeKind::ConditionType,
        NodeKind::OpInvoke,
        NodeKind::OpSet,
        NodeKind::ValScalar,
        NodeKind::ValList,
        NodeKind::ValStruct,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Namespace => "namespace",
            NodeKind::DlImport => "dl_import",
            NodeKind::DlUse => "dl_use",
            NodeKind::DlType => "dl_type",
            NodeKind::DlTypeParam => "dl_type_param",
            NodeKind::DlSchema => "dl_schema",
            NodeKind::DlSchemaParam => "dl_schema_param",
            NodeKind::DlTranslation => "dl_translation",
            NodeKind::DlTranslationTerm => "dl_translation_term",
            NodeKind::DlVariable => "dl_variable",
            NodeKind::DlReturn => "dl_return",
            NodeKind::DlAction => "dl_action",
            NodeKind::TypeStruct => "type_struct",
            NodeKind::TypeOneof => "type_oneof",
            NodeKind::TypeAllof => "type_allof",
            NodeKind::RefType => "ref_type",
            NodeKind::RefVariable => "ref_variable",
            NodeKind::RefParam => "ref_param",
            NodeKind::RefProperty => "ref_property",
            NodeKind::RefAction => "ref_action",
            NodeKind::RefSchema => "ref_schema",
            NodeKind::RefTranslation => "ref_translation",
            NodeKind::CallArgument => "call_argument",
            NodeKind::Call => "call",
            NodeKind::Lambda => "lambda",
            NodeKind::Condition => "condition",
            NodeKind::ConditionType => "condition_type",
            NodeKind::OpInvoke => "op_invoke",
            NodeKind::OpSet => "op_set",
            NodeKind::ValScalar => "val_scalar",
            NodeKind::ValList => "val_list",
            NodeKind::ValStruct => "val_struct",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
