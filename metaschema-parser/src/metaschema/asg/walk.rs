//! Graph traversal
//!
//! [`NodeRef`] is a borrowed view of any ASG node. [`walk`] visits a subtree depth-first in
//! source order, calling [`Visitor::visit`] before a node's children and [`Visitor::leave`]
//! after them. Lookups by [`NodeId`] are built on top of it.

use super::declarations::{
    Action, ActionStatement, Document, Import, Namespace, OpInvoke, OpSet, Return, Schema,
    SchemaParam, Translation, TranslationTerm, TypeDeclaration, TypeParam, Use, Variable,
};
use super::types::TypeNode;
use super::values::{CallArgument, RefVariable, ValueNode};
use super::{NodeId, NodeKind, NodeMeta};

/// Borrowed reference to any node
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Document(&'a Document),
    Namespace(&'a Namespace),
    Import(&'a Import),
    Use(&'a Use),
    TypeDeclaration(&'a TypeDeclaration),
    TypeParam(&'a TypeParam),
    Schema(&'a Schema),
    SchemaParam(&'a SchemaParam),
    Variable(&'a Variable),
    Return(&'a Return),
    Action(&'a Action),
    Set(&'a OpSet),
    SetTarget(&'a RefVariable),
    Invoke(&'a OpInvoke),
    Translation(&'a Translation),
    TranslationTerm(&'a TranslationTerm),
    CallArgument(&'a CallArgument),
    Type(&'a TypeNode),
    Value(&'a ValueNode),
}

impl<'a> NodeRef<'a> {
    pub fn meta(&self) -> &'a NodeMeta {
        match *self {
            NodeRef::Document(node) => &node.meta,
            NodeRef::Namespace(node) => &node.meta,
            NodeRef::Import(node) => &node.meta,
            NodeRef::Use(node) => &node.meta,
            NodeRef::TypeDeclaration(node) => &node.meta,
            NodeRef::TypeParam(node) => &node.meta,
            NodeRef::Schema(node) => &node.meta,
            NodeRef::SchemaParam(node) => &node.meta,
            NodeRef::Variable(node) => &node.meta,
            NodeRef::Return(node) => &node.meta,
            NodeRef::Action(node) => &node.meta,
            NodeRef::Set(node) => &node.meta,
            NodeRef::SetTarget(node) => &node.meta,
            NodeRef::Invoke(node) => &node.meta,
            NodeRef::Translation(node) => &node.meta,
            NodeRef::TranslationTerm(node) => &node.meta,
            NodeRef::CallArgument(node) => &node.meta,
            NodeRef::Type(node) => node.meta(),
            NodeRef::Value(node) => node.meta(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.meta().id
    }

    pub fn kind(&self) -> NodeKind {
        match *self {
            NodeRef::Document(_) => NodeKind::Document,
            NodeRef::Namespace(_) => NodeKind::Namespace,
            NodeRef::Import(_) => NodeKind::DlImport,
            NodeRef::Use(_) => NodeKind::DlUse,
            NodeRef::TypeDeclaration(_) => NodeKind::DlType,
            NodeRef::TypeParam(_) => NodeKind::DlTypeParam,
            NodeRef::Schema(_) => NodeKind::DlSchema,
            NodeRef::SchemaParam(_) => NodeKind::DlSchemaParam,
            NodeRef::Variable(_) => NodeKind::DlVariable,
            NodeRef::Return(_) => NodeKind::DlReturn,
            NodeRef::Action(_) => NodeKind::DlAction,
            NodeRef::Set(_) => NodeKind::OpSet,
            NodeRef::SetTarget(_) => NodeKind::RefVariable,
            NodeRef::Invoke(_) => NodeKind::OpInvoke,
            NodeRef::Translation(_) => NodeKind::DlTranslation,
            NodeRef::TranslationTerm(_) => NodeKind::DlTranslationTerm,
            NodeRef::CallArgument(_) => NodeKind::CallArgument,
            NodeRef::Type(node) => node.kind(),
            NodeRef::Value(node) => node.kind(),
        }
    }

    /// Direct children in source order
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        let mut out = Vec::new();
        match *self {
            NodeRef::Document(node) => {
                out.extend(node.imports.iter().map(NodeRef::Import));
                out.extend(node.namespaces.values().map(NodeRef::Namespace));
            }
            NodeRef::Namespace(node) => {
                out.extend(node.uses.iter().map(NodeRef::Use));
                out.extend(node.namespaces.values().map(NodeRef::Namespace));
                out.extend(node.types.values().flatten().map(NodeRef::TypeDeclaration));
                out.extend(node.schemas.values().flatten().map(NodeRef::Schema));
                out.extend(node.translations.values().flatten().map(NodeRef::Translation));
            }
            NodeRef::Import(_) | NodeRef::Use(_) | NodeRef::SetTarget(_) => {}
            NodeRef::TypeDeclaration(node) => {
                out.extend(node.generics.iter().map(NodeRef::TypeParam));
                out.push(NodeRef::Type(&node.type_def));
            }
            NodeRef::TypeParam(node) => {
                out.extend(node.extends_type_def.iter().map(NodeRef::Type));
                out.extend(node.default_type_def.iter().map(NodeRef::Type));
            }
            NodeRef::Schema(node) => {
                out.extend(node.generics.iter().map(NodeRef::TypeParam));
                out.extend(node.params.values().map(NodeRef::SchemaParam));
                out.extend(node.variables.values().map(NodeRef::Variable));
                out.extend(node.actions.values().map(NodeRef::Action));
                out.extend(node.return_value.iter().map(NodeRef::Return));
            }
            NodeRef::SchemaParam(node) => {
                out.push(NodeRef::Type(&node.type_def));
                out.extend(node.default_value.iter().map(NodeRef::Value));
            }
            NodeRef::Variable(node) => {
                out.extend(node.type_def.iter().map(NodeRef::Type));
                out.push(NodeRef::Value(&node.value));
            }
            NodeRef::Return(node) => out.push(NodeRef::Value(&node.value)),
            NodeRef::Action(node) => {
                out.extend(node.params.values().map(NodeRef::SchemaParam));
                out.extend(node.body.iter().map(|statement| match statement {
                    ActionStatement::Variable(node) => NodeRef::Variable(node),
                    ActionStatement::Set(node) => NodeRef::Set(node),
                    ActionStatement::Invoke(node) => NodeRef::Invoke(node),
                }));
            }
            NodeRef::Set(node) => {
                out.push(NodeRef::SetTarget(&node.target));
                out.push(NodeRef::Value(&node.value));
            }
            NodeRef::Invoke(node) => {
                out.push(NodeRef::Value(&node.action));
                out.extend(node.args.iter().map(NodeRef::CallArgument));
            }
            NodeRef::Translation(node) => {
                out.extend(node.terms.iter().map(NodeRef::TranslationTerm));
            }
            NodeRef::TranslationTerm(node) => {
                out.extend(node.params.values().map(NodeRef::SchemaParam));
                out.push(NodeRef::Value(&node.value));
            }
            NodeRef::CallArgument(node) => out.push(NodeRef::Value(&node.value)),
            NodeRef::Type(node) => match node {
                TypeNode::Ref(node) => out.extend(node.params.iter().map(NodeRef::Type)),
                TypeNode::Struct(node) => out.extend(node.props.values().map(NodeRef::Type)),
                TypeNode::OneOf(node) => out.extend(node.types.iter().map(NodeRef::Type)),
                TypeNode::AllOf(node) => out.extend(node.types.iter().map(NodeRef::Type)),
            },
            NodeRef::Value(node) => value_children(node, &mut out),
        }
        out
    }
}

fn value_children<'a>(node: &'a ValueNode, out: &mut Vec<NodeRef<'a>>) {
    match node {
        ValueNode::Scalar(node) => out.push(NodeRef::Type(&node.type_def)),
        ValueNode::List(node) => out.extend(node.value.iter().map(NodeRef::Value)),
        ValueNode::Struct(node) => out.extend(node.props.values().map(NodeRef::Value)),
        ValueNode::RefAction(node) => out.push(NodeRef::Value(&node.target)),
        ValueNode::RefParam(_) | ValueNode::RefVariable(_) | ValueNode::RefSchema(_) => {}
        ValueNode::RefProperty(node) => {
            out.push(NodeRef::Value(&node.value));
            out.push(NodeRef::Value(&node.index));
        }
        ValueNode::RefTranslation(node) => out.extend(node.args.iter().map(NodeRef::CallArgument)),
        ValueNode::Call(node) => {
            out.push(NodeRef::Value(&node.callee));
            out.extend(node.type_params.iter().map(NodeRef::Type));
            out.extend(node.args.iter().map(NodeRef::CallArgument));
        }
        ValueNode::Lambda(node) => {
            out.extend(node.params.values().map(NodeRef::SchemaParam));
            out.push(NodeRef::Value(&node.body));
        }
        ValueNode::Condition(node) => {
            for branch in &node.branches {
                out.push(NodeRef::Value(&branch.when));
                out.push(NodeRef::Value(&branch.then));
            }
            out.extend(node.default.as_deref().map(NodeRef::Value));
        }
        ValueNode::ConditionType(node) => {
            out.push(NodeRef::Value(&node.value));
            out.push(NodeRef::Type(&node.type_def));
        }
    }
}

/// What the walk does after [`Visitor::visit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    SkipChildren,
    Stop,
}

/// Implement the methods you need; both default to doing nothing.
pub trait Visitor<'a> {
    fn visit(&mut self, _node: NodeRef<'a>) -> Flow {
        Flow::Continue
    }

    fn leave(&mut self, _node: NodeRef<'a>) {}
}

/// Depth-first walk. Returns `false` when a visitor stopped it.
pub fn walk<'a>(node: NodeRef<'a>, visitor: &mut dyn Visitor<'a>) -> bool {
    match visitor.visit(node) {
        Flow::Stop => return false,
        Flow::SkipChildren => {}
        Flow::Continue => {
            for child in node.children() {
                if !walk(child, visitor) {
                    return false;
                }
            }
        }
    }
    visitor.leave(node);
    true
}

struct Finder<'a> {
    id: NodeId,
    found: Option<NodeRef<'a>>,
}

impl<'a> Visitor<'a> for Finder<'a> {
    fn visit(&mut self, node: NodeRef<'a>) -> Flow {
        if node.id() == self.id {
            self.found = Some(node);
            Flow::Stop
        } else {
            Flow::Continue
        }
    }
}

struct Collector<'a> {
    nodes: Vec<NodeRef<'a>>,
}

impl<'a> Visitor<'a> for Collector<'a> {
    fn visit(&mut self, node: NodeRef<'a>) -> Flow {
        self.nodes.push(node);
        Flow::Continue
    }
}

impl Document {
    pub fn find(&self, id: NodeId) -> Option<NodeRef<'_>> {
        let mut finder = Finder { id, found: None };
        walk(NodeRef::Document(self), &mut finder);
        finder.found
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeRef<'_>> {
        let parent = self.find(id)?.meta().parent?;
        self.find(parent)
    }

    /// Every node of the document in walk order, the document first.
    pub fn nodes(&self) -> Vec<NodeRef<'_>> {
        let mut collector = Collector { nodes: Vec::new() };
        walk(NodeRef::Document(self), &mut collector);
        collector.nodes
    }
}
