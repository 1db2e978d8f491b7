//! AST to ASG lowering
//!
//! One function per node kind, each taking the id of the graph node that will own the
//! result. Ids are handed out in creation order, parents before children.

use super::Analyzer;
use crate::metaschema::asg::{self, NodeId, NodeMeta, TypeNode, ValueNode};
use crate::metaschema::ast::{self, Range};
use crate::metaschema::diagnostics::{Diagnostic, ErrorCode};
use indexmap::IndexMap;

/// Lowers `document` on behalf of `analyzer`, which must have `uri` as its current document.
pub fn lower_document(analyzer: &mut Analyzer, uri: &str, document: &ast::Document) -> asg::Document {
    let span = tracing::debug_span!("lower", uri);
    let _guard = span.enter();

    let mut lowering = Lowering {
        analyzer,
        uri: uri.to_string(),
        next_id: 0,
    };
    let document = lowering.document(document);
    tracing::debug!(nodes = lowering.next_id, namespaces = document.namespaces.len(), "lowered");
    document
}

/// What a duplicate declaration is called in its two diagnostics
struct Duplicate {
    code: ErrorCode,
    subject: &'static str,
    message: String,
    counterpart: String,
}

struct Lowering<'a> {
    analyzer: &'a mut Analyzer,
    uri: String,
    next_id: u32,
}

impl Lowering<'_> {
    fn meta(&mut self, parent: Option<NodeId>) -> NodeMeta {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        NodeMeta::new(id, parent)
    }

    fn child(&mut self, parent: NodeId) -> NodeMeta {
        self.meta(Some(parent))
    }

    /// Reports both sides of a duplicate, each pointing at the other.
    fn duplicate(&mut self, duplicate: Duplicate, range: Range, original: Range) {
        tracing::debug!(subject = duplicate.subject, %range, %original, "duplicate declaration");
        let uri = self.uri.clone();
        self.analyzer.add_error(
            Diagnostic::error(range, duplicate.code, duplicate.message).with_related(
                uri.clone(),
                original,
                format!("{} is already declared here.", duplicate.subject),
            ),
        );
        self.analyzer.add_error(
            Diagnostic::error(original, duplicate.code, duplicate.counterpart).with_related(
                uri,
                range,
                format!("{} is also declared here.", duplicate.subject),
            ),
        );
    }

    fn document(&mut self, ast: &ast::Document) -> asg::Document {
        let mut document = asg::Document::new(self.meta(None), self.uri.clone());
        let id = document.meta.id;

        for import in &ast.imports {
            let meta = self.child(id);
            document.imports.push(asg::Import {
                meta,
                uri: import.uri.clone(),
                range: import.range,
            });
        }
        for namespace in &ast.namespaces {
            let namespace = self.namespace(id, namespace);
            document.insert_namespace(namespace);
        }
        document
    }

    /// `A.B.C { ... }` becomes `A { B { C { ... } } }`.
    fn namespace(&mut self, parent: NodeId, ast: &ast::Namespace) -> asg::Namespace {
        let Some((innermost, outer)) = ast.id.split_last() else {
            panic!("namespace without an identifier reached lowering");
        };

        let mut chain = Vec::with_capacity(outer.len());
        let mut parent = parent;
        for (index, segment) in outer.iter().enumerate() {
            let namespace =
                asg::Namespace::new(self.child(parent), segment.clone(), ast.id_ranges.get(index).copied());
            parent = namespace.meta.id;
            chain.push(namespace);
        }

        let meta = self.child(parent);
        let mut target = asg::Namespace::new(meta, innermost.clone(), ast.id_ranges.get(outer.len()).copied());
        let id = target.meta.id;

        for node in &ast.uses {
            let node = self.use_declaration(id, node);
            target.uses.push(node);
        }
        for node in &ast.namespaces {
            let node = self.namespace(id, node);
            target.insert_namespace(node);
        }
        for node in &ast.types {
            let node = self.type_declaration(id, node);
            target.add_type(node);
        }
        for node in &ast.schemas {
            let node = self.schema(id, node);
            target.add_schema(node);
        }
        for node in &ast.translations {
            let node = self.translation(id, node);
            target.add_translation(node);
        }

        while let Some(mut outer) = chain.pop() {
            outer.insert_namespace(target);
            target = outer;
        }
        target
    }

    fn use_declaration(&mut self, parent: NodeId, ast: &ast::Use) -> asg::Use {
        asg::Use {
            meta: self.child(parent),
            namespace_def: ast.namespace.clone(),
            namespace_ref: None,
            namespace_ranges: ast.namespace_ranges.clone(),
            range: ast.range,
        }
    }

    fn type_declaration(&mut self, parent: NodeId, ast: &ast::TypeDeclaration) -> asg::TypeDeclaration {
        let meta = self.child(parent);
        let id = meta.id;
        let generics = self.type_params(id, &ast.generics);
        asg::TypeDeclaration {
            meta,
            id: ast.id.clone(),
            generics,
            type_def: self.type_node(id, &ast.type_expr),
            type_desc: None,
            id_range: ast.id_range,
            range: ast.range,
        }
    }

    fn type_params(&mut self, parent: NodeId, generics: &[ast::Generic]) -> Vec<asg::TypeParam> {
        generics
            .iter()
            .map(|generic| {
                let meta = self.child(parent);
                let id = meta.id;
                asg::TypeParam {
                    meta,
                    id: generic.id.clone(),
                    extends_type_def: generic.extends.as_ref().map(|t| self.type_node(id, t)),
                    default_type_def: generic.default.as_ref().map(|t| self.type_node(id, t)),
                    id_range: generic.id_range,
                }
            })
            .collect()
    }

    fn type_node(&mut self, parent: NodeId, ast: &ast::TypeExpression) -> TypeNode {
        let meta = self.child(parent);
        let id = meta.id;
        match ast {
            ast::TypeExpression::Ref(node) => TypeNode::Ref(self.ref_type(meta, node)),
            ast::TypeExpression::Struct(node) => TypeNode::Struct(asg::TypeStruct {
                props: node
                    .props
                    .iter()
                    .map(|(key, value)| (key.clone(), self.type_node(id, value)))
                    .collect(),
                prop_ranges: node.prop_ranges.clone(),
                meta,
                type_desc: None,
            }),
            ast::TypeExpression::OneOf(node) => TypeNode::OneOf(asg::TypeOneOf {
                types: node.types.iter().map(|t| self.type_node(id, t)).collect(),
                meta,
                type_desc: None,
            }),
            ast::TypeExpression::AllOf(node) => TypeNode::AllOf(asg::TypeAllOf {
                types: node.types.iter().map(|t| self.type_node(id, t)).collect(),
                meta,
                type_desc: None,
            }),
        }
    }

    fn ref_type(&mut self, meta: NodeMeta, ast: &ast::TypeRef) -> asg::RefType {
        let id = meta.id;
        asg::RefType {
            params: ast.params.iter().map(|t| self.type_node(id, t)).collect(),
            meta,
            type_name: ast.name.clone(),
            namespace_def: ast.namespace.clone(),
            namespace_ref: None,
            type_desc: None,
            type_name_range: ast.name_range,
            namespace_ranges: ast.namespace_ranges.clone(),
        }
    }

    fn schema(&mut self, parent: NodeId, ast: &ast::Schema) -> asg::Schema {
        let meta = self.child(parent);
        let id = meta.id;
        let generics = self.type_params(id, &ast.generics);
        let params = self.params(id, &ast.params);
        let mut schema = asg::Schema {
            meta,
            id: ast.id.clone(),
            generics,
            params,
            variables: IndexMap::new(),
            actions: IndexMap::new(),
            return_value: None,
            type_desc: None,
            id_range: ast.id_range,
            range: ast.range,
        };

        for statement in &ast.body {
            match statement {
                ast::SchemaStatement::Variable(node) => {
                    let variable = self.variable(id, node);
                    if let Some(existing) = schema.variables.get(&variable.id).map(|v| v.id_range) {
                        let duplicate = Duplicate {
                            code: ErrorCode::DuplicateIdentifier,
                            subject: "Variable",
                            message: format!("Variable with name '{}' is already declared.", variable.id),
                            counterpart: "Variable cannot be re-declared elsewhere.".to_string(),
                        };
                        self.duplicate(duplicate, variable.id_range, existing);
                        continue;
                    }
                    schema.variables.insert(variable.id.clone(), variable);
                }
                ast::SchemaStatement::Action(node) => {
                    let action = self.action(id, node);
                    if let Some(existing) = schema.actions.get(&action.id).map(|a| a.id_range) {
                        let duplicate = Duplicate {
                            code: ErrorCode::DuplicateIdentifier,
                            subject: "Action",
                            message: format!("Action with name '{}' is already declared.", action.id),
                            counterpart: format!(
                                "Action with name '{}' cannot be re-declared elsewhere.",
                                action.id
                            ),
                        };
                        self.duplicate(duplicate, action.id_range, existing);
                        continue;
                    }
                    schema.actions.insert(action.id.clone(), action);
                }
                ast::SchemaStatement::Return(node) => {
                    let value = self.return_value(id, node);
                    if let Some(existing) = schema.return_value.as_ref().map(|r| r.keyword_range) {
                        let duplicate = Duplicate {
                            code: ErrorCode::DuplicateReturn,
                            subject: "Return value",
                            message: "Return value was already defined.".to_string(),
                            counterpart: "Return value cannot be re-declared elsewhere.".to_string(),
                        };
                        self.duplicate(duplicate, value.keyword_range, existing);
                        continue;
                    }
                    schema.return_value = Some(value);
                }
            }
        }
        schema
    }

    /// Parameters by identifier. A repeated name keeps the first declaration.
    fn params(&mut self, parent: NodeId, params: &[ast::SchemaParam]) -> IndexMap<String, asg::SchemaParam> {
        let mut out: IndexMap<String, asg::SchemaParam> = IndexMap::new();
        for param in params {
            let lowered = self.schema_param(parent, param);
            if let Some(existing) = out.get(&lowered.id).map(|p| p.id_range) {
                let diagnostic = Diagnostic::error(
                    lowered.id_range,
                    ErrorCode::DuplicateIdentifier,
                    format!("Parameter with name '{}' is already declared.", lowered.id),
                )
                .with_related(self.uri.clone(), existing, "Parameter is already declared here.");
                self.analyzer.add_error(diagnostic);
                continue;
            }
            out.insert(lowered.id.clone(), lowered);
        }
        out
    }

    fn schema_param(&mut self, parent: NodeId, ast: &ast::SchemaParam) -> asg::SchemaParam {
        let meta = self.child(parent);
        let id = meta.id;
        asg::SchemaParam {
            meta,
            id: ast.id.clone(),
            type_def: self.type_node(id, &ast.type_expr),
            default_value: ast.default.as_ref().map(|value| self.value(id, value)),
            rest: ast.rest,
            type_desc: None,
            id_range: ast.id_range,
        }
    }

    fn variable(&mut self, parent: NodeId, ast: &ast::Variable) -> asg::Variable {
        let meta = self.child(parent);
        let id = meta.id;
        asg::Variable {
            meta,
            id: ast.id.clone(),
            type_def: ast.type_expr.as_ref().map(|t| self.type_node(id, t)),
            value: self.value(id, &ast.value),
            stateful: ast.stateful,
            propagated: ast.propagated,
            inherited: ast.inherited,
            type_desc: None,
            id_range: ast.id_range,
            range: ast.range,
        }
    }

    fn return_value(&mut self, parent: NodeId, ast: &ast::Return) -> asg::Return {
        let meta = self.child(parent);
        let id = meta.id;
        asg::Return {
            meta,
            value: self.value(id, &ast.value),
            type_desc: None,
            keyword_range: ast.keyword_range,
            range: ast.range,
        }
    }

    fn action(&mut self, parent: NodeId, ast: &ast::Action) -> asg::Action {
        let meta = self.child(parent);
        let id = meta.id;
        let params = self.params(id, &ast.params);
        let body = ast
            .body
            .iter()
            .map(|statement| match statement {
                ast::ActionStatement::Variable(node) => asg::ActionStatement::Variable(self.variable(id, node)),
                ast::ActionStatement::Set(node) => asg::ActionStatement::Set(self.set(id, node)),
                ast::ActionStatement::Invoke(node) => asg::ActionStatement::Invoke(self.invoke(id, node)),
            })
            .collect();
        asg::Action {
            meta,
            id: ast.id.clone(),
            params,
            body,
            is_override: ast.is_override,
            id_range: ast.id_range,
            range: ast.range,
        }
    }

    fn set(&mut self, parent: NodeId, ast: &ast::Set) -> asg::OpSet {
        let meta = self.child(parent);
        let id = meta.id;
        let target_meta = self.child(id);
        asg::OpSet {
            meta,
            target: self.ref_variable(target_meta, &ast.target),
            value: self.value(id, &ast.value),
            type_desc: None,
            range: ast.range,
        }
    }

    fn invoke(&mut self, parent: NodeId, ast: &ast::Invoke) -> asg::OpInvoke {
        let meta = self.child(parent);
        let id = meta.id;
        asg::OpInvoke {
            meta,
            action: self.value(id, &ast.action),
            args: self.call_arguments(id, &ast.args),
            range: ast.range,
        }
    }

    fn translation(&mut self, parent: NodeId, ast: &ast::Translation) -> asg::Translation {
        let meta = self.child(parent);
        let id = meta.id;
        asg::Translation {
            meta,
            id: ast.id.clone(),
            terms: ast.terms.iter().map(|term| self.translation_term(id, term)).collect(),
            id_range: ast.id_range,
            range: ast.range,
        }
    }

    fn translation_term(&mut self, parent: NodeId, ast: &ast::TranslationTerm) -> asg::TranslationTerm {
        let meta = self.child(parent);
        let id = meta.id;
        let params = self.params(id, &ast.params);
        asg::TranslationTerm {
            meta,
            id: ast.id.clone(),
            id_ranges: ast.id_ranges.clone(),
            params,
            value: self.value(id, &ast.value),
            range: ast.range,
        }
    }

    fn call_arguments(&mut self, parent: NodeId, args: &[ast::CallArgument]) -> Vec<asg::CallArgument> {
        args.iter()
            .map(|arg| {
                let meta = self.child(parent);
                let id = meta.id;
                asg::CallArgument {
                    meta,
                    id: arg.id.clone(),
                    arg_name: None,
                    value: self.value(id, &arg.value),
                    unpack: arg.unpack,
                    type_desc: None,
                    id_range: arg.id_range,
                    range: arg.range,
                }
            })
            .collect()
    }

    fn ref_variable(&mut self, meta: NodeMeta, ast: &ast::RefVariable) -> asg::RefVariable {
        asg::RefVariable {
            meta,
            var_name: ast.name.clone(),
            var_ref: None,
            type_desc: None,
            var_name_range: ast.name_range,
            range: ast.range,
        }
    }

    fn value(&mut self, parent: NodeId, ast: &ast::Expression) -> ValueNode {
        let meta = self.child(parent);
        let id = meta.id;
        match ast {
            ast::Expression::Scalar(node) => {
                let type_meta = self.child(id);
                ValueNode::Scalar(asg::ValueScalar {
                    type_def: TypeNode::Ref(self.ref_type(type_meta, &node.type_ref)),
                    meta,
                    type_desc: None,
                    value: node.value.clone(),
                    range: node.range,
                })
            }
            ast::Expression::List(node) => ValueNode::List(asg::ValueList {
                value: node.elements.iter().map(|e| self.value(id, e)).collect(),
                meta,
                type_desc: None,
                range: node.range,
            }),
            ast::Expression::Struct(node) => ValueNode::Struct(asg::ValueStruct {
                props: node
                    .props
                    .iter()
                    .map(|(key, value)| (key.clone(), self.value(id, value)))
                    .collect(),
                prop_ranges: node.prop_ranges.clone(),
                meta,
                type_desc: None,
                range: node.range,
            }),
            ast::Expression::RefAction(node) => ValueNode::RefAction(asg::RefAction {
                target: Box::new(self.value(id, &node.target)),
                meta,
                action_name: node.id.clone(),
                action_name_range: node.id_range,
                range: node.range,
            }),
            ast::Expression::RefParam(node) => ValueNode::RefParam(asg::RefParam {
                meta,
                param_name: node.name.clone(),
                type_desc: None,
                param_name_range: node.name_range,
                range: node.range,
            }),
            ast::Expression::RefVariable(node) => ValueNode::RefVariable(self.ref_variable(meta, node)),
            ast::Expression::RefProperty(node) => ValueNode::RefProperty(asg::RefProperty {
                value: Box::new(self.value(id, &node.value)),
                index: Box::new(self.value(id, &node.index)),
                meta,
                type_desc: None,
                range: node.range,
            }),
            ast::Expression::RefTranslation(node) => ValueNode::RefTranslation(asg::RefTranslation {
                args: self.call_arguments(id, &node.args),
                meta,
                term_name: node.name.clone(),
                namespace_def: node.namespace.clone(),
                namespace_ref: None,
                term_name_range: node.name_range,
                namespace_ranges: node.namespace_ranges.clone(),
                range: node.range,
            }),
            ast::Expression::RefSchema(node) => ValueNode::RefSchema(asg::RefSchema {
                meta,
                schema_name: node.name.clone(),
                namespace_def: node.namespace.clone(),
                namespace_ref: None,
                type_desc: None,
                range: node.range,
            }),
            ast::Expression::Call(node) => ValueNode::Call(asg::Call {
                callee: Box::new(self.value(id, &node.callee)),
                type_params: node.type_params.iter().map(|t| self.type_node(id, t)).collect(),
                args: self.call_arguments(id, &node.args),
                meta,
                type_desc: None,
                range: node.range,
            }),
            ast::Expression::Lambda(node) => ValueNode::Lambda(asg::Lambda {
                params: self.params(id, &node.params),
                body: Box::new(self.value(id, &node.body)),
                meta,
                type_desc: None,
                range: node.range,
            }),
            ast::Expression::Condition(node) => ValueNode::Condition(asg::Condition {
                branches: node
                    .branches
                    .iter()
                    .map(|branch| asg::ConditionBranch {
                        when: self.value(id, &branch.when),
                        then: self.value(id, &branch.then),
                    })
                    .collect(),
                default: node.default.as_ref().map(|value| Box::new(self.value(id, value))),
                meta,
                type_desc: None,
                range: node.range,
            }),
            ast::Expression::ConditionType(node) => ValueNode::ConditionType(asg::ConditionType {
                value: Box::new(self.value(id, &node.value)),
                type_def: self.type_node(id, &node.type_expr),
                meta,
                range: node.range,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metaschema::asg::NodeKind;
    use crate::metaschema::ast::ScalarValue;
    use crate::metaschema::parsing::parse;

    fn lower(source: &str) -> (asg::Document, Vec<Diagnostic>) {
        let parsed = parse("test://doc", source);
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        let mut analyzer = Analyzer::new();
        let document = analyzer.add_document("test://doc", &parsed.document);
        let diagnostics = analyzer.document_diagnostics("test://doc").to_vec();
        (document, diagnostics)
    }

    fn default_schema<'a>(document: &'a asg::Document, name: &str) -> &'a asg::Schema {
        &document.namespaces[ast::declarations::DEFAULT_NAMESPACE].schemas[name][0]
    }

    #[test]
    fn test_empty_document() {
        let (document, diagnostics) = lower("");
        assert!(diagnostics.is_empty());
        assert_eq!(document.document_uri, "test://doc");
        assert!(document.meta.parent.is_none());
        assert!(document.imports.is_empty());
        assert_eq!(document.namespaces.len(), 1);
    }

    #[test]
    fn test_dotted_namespace_is_a_chain() {
        let (document, _) = lower("namespace A.B.C { type T = String; }");
        let a = &document.namespaces["A"];
        let b = &a.namespaces["B"];
        let c = &b.namespaces["C"];
        assert_eq!(a.meta.parent, Some(document.meta.id));
        assert_eq!(b.meta.parent, Some(a.meta.id));
        assert_eq!(c.meta.parent, Some(b.meta.id));
        assert!(a.types.is_empty());
        assert_eq!(c.types["T"].len(), 1);
        assert_eq!(a.id_ranges, vec![Range::at(1, 11, 1, 12)]);
        assert_eq!(c.id_ranges, vec![Range::at(1, 15, 1, 16)]);
    }

    #[test]
    fn test_repeated_namespaces_merge() {
        let (document, diagnostics) =
            lower("namespace X { type T = String; }\nnamespace X { type T = Number; }");
        assert!(diagnostics.is_empty());
        let x = &document.namespaces["X"];
        assert_eq!(x.types["T"].len(), 2);
        assert_eq!(x.id_ranges.len(), 2);
        for declaration in &x.types["T"] {
            assert_eq!(declaration.meta.parent, Some(x.meta.id));
        }
    }

    #[test]
    fn test_nested_namespace_declarations_merge() {
        let source = "namespace A.B {\n\tnamespace C.D {}\n\tnamespace C.D { type T = String; }\n}";
        let (document, _) = lower(source);
        let b = document.namespace(&["A", "B"]).unwrap();
        assert_eq!(b.namespaces.len(), 1);
        let d = document.namespace(&["A", "B", "C", "D"]).unwrap();
        assert_eq!(d.types["T"].len(), 1);
        assert_eq!(b.namespaces["C"].id_ranges, vec![Range::at(2, 12, 2, 13), Range::at(3, 12, 3, 13)]);
    }

    #[test]
    fn test_variable_declaration() {
        let (document, _) = lower("schema S () {\n\tlet myVar: String = \"hello\";\n}");
        let variable = &default_schema(&document, "S").variables["myVar"];
        assert!(!variable.stateful);
        assert!(!variable.propagated);
        assert_eq!(variable.type_def.as_ref().unwrap().as_ref_type().unwrap().type_name, "String");
        let ValueNode::Scalar(scalar) = &variable.value else {
            panic!("expected a scalar");
        };
        assert_eq!(scalar.value, ScalarValue::String("hello".to_string()));
        let type_ref = scalar.type_def.as_ref_type().unwrap();
        assert_eq!(type_ref.namespace_def, vec!["Meta"]);
        assert_eq!(type_ref.type_name, "String");
    }

    #[test]
    fn test_duplicate_variable() {
        let (document, diagnostics) =
            lower("schema MySchema () {\n\tlet myVar = 42;\n\tlet myVar = 43;\n}");
        let schema = default_schema(&document, "MySchema");
        let ValueNode::Scalar(kept) = &schema.variables["myVar"].value else {
            panic!("expected a scalar");
        };
        assert_eq!(kept.value, ScalarValue::Number(42.0));

        assert_eq!(diagnostics.len(), 2);
        let (first, second) = (&diagnostics[0], &diagnostics[1]);
        assert_eq!(first.name, ErrorCode::DuplicateIdentifier);
        assert_eq!(first.message, "Variable with name 'myVar' is already declared.");
        assert_eq!(first.range, Range::at(3, 6, 3, 11));
        assert_eq!(first.related_information[0].location.range, Range::at(2, 6, 2, 11));
        assert_eq!(first.related_information[0].message, "Variable is already declared here.");
        assert_eq!(second.range, Range::at(2, 6, 2, 11));
        assert_eq!(second.related_information[0].location.range, Range::at(3, 6, 3, 11));
        assert_eq!(second.related_information[0].location.uri, "test://doc");
    }

    #[test]
    fn test_duplicate_action() {
        let (document, diagnostics) =
            lower("schema MySchema () {\n\taction myAction {}\n\taction myAction {}\n}");
        assert_eq!(default_schema(&document, "MySchema").actions.len(), 1);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].range, Range::at(3, 9, 3, 17));
        assert_eq!(
            diagnostics[1].message,
            "Action with name 'myAction' cannot be re-declared elsewhere."
        );
    }

    #[test]
    fn test_duplicate_return() {
        let (document, diagnostics) =
            lower("schema MySchema () {\n\treturn true;\n\treturn false;\n}");
        let kept = default_schema(&document, "MySchema").return_value.as_ref().unwrap();
        let ValueNode::Scalar(scalar) = &kept.value else {
            panic!("expected a scalar");
        };
        assert_eq!(scalar.value, ScalarValue::Boolean(true));

        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.name == ErrorCode::DuplicateReturn));
        assert_eq!(diagnostics[0].range, Range::at(3, 2, 3, 8));
        assert_eq!(diagnostics[1].range, Range::at(2, 2, 2, 8));
        assert_eq!(
            diagnostics[1].related_information[0].message,
            "Return value is also declared here."
        );
    }

    #[test]
    fn test_duplicate_parameter_keeps_first() {
        let (document, diagnostics) = lower("schema S (a: String, a: Number) {}");
        let schema = default_schema(&document, "S");
        assert_eq!(schema.params.len(), 1);
        assert_eq!(schema.params["a"].type_def.as_ref_type().unwrap().type_name, "String");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Parameter with name 'a' is already declared.");
    }

    #[test]
    fn test_namespace_level_duplicates_coexist() {
        let (document, diagnostics) = lower("type A = String;\ntype A = Number;");
        assert!(diagnostics.is_empty());
        assert_eq!(document.namespaces[ast::declarations::DEFAULT_NAMESPACE].types["A"].len(), 2);
    }

    #[test]
    fn test_action_body() {
        let source = "schema S () {\n\taction MyAction(param1: String) {\n\t\tlet myVar = 42;\n\t\tset someVar = true;\n\t\tinvoke someVar#someAction(param1: true, param2);\n\t}\n}";
        let (document, diagnostics) = lower(source);
        assert!(diagnostics.is_empty());
        let action = &default_schema(&document, "S").actions["MyAction"];
        let kinds: Vec<_> = action.body.iter().map(asg::ActionStatement::kind).collect();
        assert_eq!(kinds, vec![NodeKind::DlVariable, NodeKind::OpSet, NodeKind::OpInvoke]);

        let asg::ActionStatement::Set(set) = &action.body[1] else {
            panic!("expected a set");
        };
        assert_eq!(set.target.var_name, "someVar");
        assert!(set.target.var_ref.is_none());

        let asg::ActionStatement::Invoke(invoke) = &action.body[2] else {
            panic!("expected an invoke");
        };
        let ValueNode::RefAction(reference) = &invoke.action else {
            panic!("expected an action reference");
        };
        assert_eq!(reference.action_name, "someAction");
        assert_eq!(invoke.args[0].id.as_deref(), Some("param1"));
        assert_eq!(invoke.args[1].id, None);
    }

    #[test]
    fn test_expressions_are_lowered() {
        let source = "schema S () {\n\tlet a = when { (x > 1) => \"big\"; };\n\tlet b = fn (v: Number) => v * 2;\n\tlet c = x is <String>;\n\tlet d = $texts.greeting(name: \"x\")$;\n\tlet e = [1, {k: 2}];\n}";
        let (document, diagnostics) = lower(source);
        assert!(diagnostics.is_empty());
        let variables = &default_schema(&document, "S").variables;
        assert_eq!(variables["a"].value.kind(), NodeKind::Condition);
        assert_eq!(variables["b"].value.kind(), NodeKind::Lambda);
        assert_eq!(variables["c"].value.kind(), NodeKind::ConditionType);
        assert_eq!(variables["d"].value.kind(), NodeKind::RefTranslation);
        assert_eq!(variables["e"].value.kind(), NodeKind::ValList);

        let ValueNode::Lambda(lambda) = &variables["b"].value else {
            panic!("expected a lambda");
        };
        let ValueNode::Call(call) = lambda.body.as_ref() else {
            panic!("expected an operator call");
        };
        let ValueNode::RefSchema(callee) = call.callee.as_ref() else {
            panic!("expected a schema reference");
        };
        assert_eq!(callee.namespace_def, vec!["Meta", "Arithmetic"]);
        assert_eq!(callee.schema_name, "multiply");
    }

    #[test]
    fn test_imports_uses_and_translations() {
        let source = "import \"std\";\nuse Std.Types;\ntranslation Texts {\n\thello => \"Hello\";\n}";
        let (document, _) = lower(source);
        assert_eq!(document.imports[0].uri, "std");
        let default = &document.namespaces[ast::declarations::DEFAULT_NAMESPACE];
        assert_eq!(default.uses[0].namespace_def, vec!["Std", "Types"]);
        assert_eq!(default.translations["Texts"][0].terms[0].id, vec!["hello"]);
    }

    #[test]
    fn test_ids_are_unique_and_parents_resolve() {
        let source = "namespace A.B {\n\tschema S<T>(p: T) {\n\t\tlet v = @p;\n\t\taction run() { set v = 1; }\n\t\treturn v;\n\t}\n}";
        let (document, _) = lower(source);
        let nodes = document.nodes();
        let mut ids: Vec<_> = nodes.iter().map(|node| node.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), nodes.len());

        for node in nodes.iter().skip(1) {
            let parent = document.parent_of(node.id()).unwrap();
            assert!(parent.children().iter().any(|child| child.id() == node.id()));
        }
    }

    #[test]
    #[should_panic(expected = "without an identifier")]
    fn test_namespace_without_identifier_panics() {
        let mut document = parse("test://doc", "").document;
        document.namespaces.push(ast::Namespace::new(Vec::new(), Vec::new(), Range::default()));
        Analyzer::new().add_document("test://doc", &document);
    }
}
