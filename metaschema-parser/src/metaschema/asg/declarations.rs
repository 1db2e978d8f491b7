//! Documents, namespaces and declarations

use super::types::TypeNode;
use super::values::{CallArgument, RefVariable, ValueNode};
use super::{NodeId, NodeKind, NodeMeta};
use crate::metaschema::ast::Range;
use indexmap::IndexMap;
use serde::Serialize;

/// Root of the graph for one source unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub document_uri: String,
    pub imports: Vec<Import>,
    /// Top-level namespaces by identifier
    pub namespaces: IndexMap<String, Namespace>,
}

impl Document {
    pub fn new(meta: NodeMeta, document_uri: impl Into<String>) -> Self {
        Self {
            meta,
            document_uri: document_uri.into(),
            imports: Vec::new(),
            namespaces: IndexMap::new(),
        }
    }

    /// Adds a top-level namespace, merging it into one with the same identifier.
    pub fn insert_namespace(&mut self, namespace: Namespace) {
        insert_namespace(&mut self.namespaces, self.meta.id, namespace);
    }

    /// Follows a namespace path from the root, `["A", "B"]` for `A.B`.
    pub fn namespace(&self, path: &[&str]) -> Option<&Namespace> {
        let (first, rest) = path.split_first()?;
        let mut current = self.namespaces.get(*first)?;
        for segment in rest {
            current = current.namespaces.get(*segment)?;
        }
        Some(current)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Namespace {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub id: String,
    /// One range per declaration merged into this namespace
    pub id_ranges: Vec<Range>,
    pub namespaces: IndexMap<String, Namespace>,
    pub uses: Vec<Use>,
    pub types: IndexMap<String, Vec<TypeDeclaration>>,
    pub schemas: IndexMap<String, Vec<Schema>>,
    pub translations: IndexMap<String, Vec<Translation>>,
}

impl Namespace {
    pub fn new(meta: NodeMeta, id: impl Into<String>, id_range: Option<Range>) -> Self {
        Self {
            meta,
            id: id.into(),
            id_ranges: id_range.into_iter().collect(),
            namespaces: IndexMap::new(),
            uses: Vec::new(),
            types: IndexMap::new(),
            schemas: IndexMap::new(),
            translations: IndexMap::new(),
        }
    }

    pub fn insert_namespace(&mut self, namespace: Namespace) {
        insert_namespace(&mut self.namespaces, self.meta.id, namespace);
    }

    pub fn add_type(&mut self, node: TypeDeclaration) {
        self.types.entry(node.id.clone()).or_default().push(node);
    }

    pub fn add_schema(&mut self, node: Schema) {
        self.schemas.entry(node.id.clone()).or_default().push(node);
    }

    pub fn add_translation(&mut self, node: Translation) {
        self.translations.entry(node.id.clone()).or_default().push(node);
    }
}

fn insert_namespace(map: &mut IndexMap<String, Namespace>, parent: NodeId, mut namespace: Namespace) {
    namespace.meta.parent = Some(parent);
    match map.get_mut(&namespace.id) {
        Some(existing) => merge_namespace(existing, namespace),
        None => {
            map.insert(namespace.id.clone(), namespace);
        }
    }
}

/// Deep union of `source` into `target`.
///
/// Child namespaces merge recursively by identifier, declaration lists and identifier
/// ranges are concatenated, and everything moved over is re-parented to `target`. The
/// `source` node itself is dropped.
pub fn merge_namespace(target: &mut Namespace, source: Namespace) {
    tracing::debug!(namespace = %target.id, into = %target.meta.id, from = %source.meta.id, "merging namespace");
    let parent = Some(target.meta.id);

    target.id_ranges.extend(source.id_ranges);

    for (_, namespace) in source.namespaces {
        target.insert_namespace(namespace);
    }
    for mut node in source.uses {
        node.meta.parent = parent;
        target.uses.push(node);
    }
    for mut node in source.types.into_values().flatten() {
        node.meta.parent = parent;
        target.add_type(node);
    }
    for mut node in source.schemas.into_values().flatten() {
        node.meta.parent = parent;
        target.add_schema(node);
    }
    for mut node in source.translations.into_values().flatten() {
        node.meta.parent = parent;
        target.add_translation(node);
    }
}

/// `import "uri";`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Import {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub uri: String,
    pub range: Range,
}

/// `use A.B;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Use {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub namespace_def: Vec<String>,
    pub namespace_ref: Option<NodeId>,
    pub namespace_ranges: Vec<Range>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDeclaration {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub id: String,
    pub generics: Vec<TypeParam>,
    pub type_def: TypeNode,
    pub type_desc: Option<NodeId>,
    pub id_range: Range,
    pub range: Range,
}

/// Generic parameter of a type or schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeParam {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub id: String,
    pub extends_type_def: Option<TypeNode>,
    pub default_type_def: Option<TypeNode>,
    pub id_range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub id: String,
    pub generics: Vec<TypeParam>,
    pub params: IndexMap<String, SchemaParam>,
    pub variables: IndexMap<String, Variable>,
    pub actions: IndexMap<String, Action>,
    #[serde(rename = "return")]
    pub return_value: Option<Return>,
    pub type_desc: Option<NodeId>,
    pub id_range: Range,
    pub range: Range,
}

/// Parameter of a schema, action, lambda or translation term
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaParam {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub id: String,
    pub type_def: TypeNode,
    pub default_value: Option<ValueNode>,
    pub rest: bool,
    pub type_desc: Option<NodeId>,
    pub id_range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub id: String,
    pub type_def: Option<TypeNode>,
    pub value: ValueNode,
    pub stateful: bool,
    pub propagated: bool,
    pub inherited: bool,
    pub type_desc: Option<NodeId>,
    pub id_range: Range,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Return {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub value: ValueNode,
    pub type_desc: Option<NodeId>,
    pub keyword_range: Range,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub id: String,
    pub params: IndexMap<String, SchemaParam>,
    pub body: Vec<ActionStatement>,
    #[serde(rename = "override")]
    pub is_override: bool,
    pub id_range: Range,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node")]
pub enum ActionStatement {
    #[serde(rename = "dl_variable")]
    Variable(Variable),
    #[serde(rename = "op_set")]
    Set(OpSet),
    #[serde(rename = "op_invoke")]
    Invoke(OpInvoke),
}

impl ActionStatement {
    pub fn meta(&self) -> &NodeMeta {
        match self {
            ActionStatement::Variable(node) => &node.meta,
            ActionStatement::Set(node) => &node.meta,
            ActionStatement::Invoke(node) => &node.meta,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            ActionStatement::Variable(_) => NodeKind::DlVariable,
            ActionStatement::Set(_) => NodeKind::OpSet,
            ActionStatement::Invoke(_) => NodeKind::OpInvoke,
        }
    }
}

/// `set name = value;`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpSet {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub target: RefVariable,
    pub value: ValueNode,
    pub type_desc: Option<NodeId>,
    pub range: Range,
}

/// `invoke target#action(args);`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpInvoke {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub action: ValueNode,
    pub args: Vec<CallArgument>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub id: String,
    pub terms: Vec<TranslationTerm>,
    pub id_range: Range,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationTerm {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub id: Vec<String>,
    pub id_ranges: Vec<Range>,
    pub params: IndexMap<String, SchemaParam>,
    pub value: ValueNode,
    pub range: Range,
}
