//! Documents and namespaces
//!
//!     Document  = (Import | NamespaceStatement)*
//!     Import    = "import" _ String _ ";"
//!     NamespaceStatement
//!               = "use" _ NsIdentifier _ ";"
//!               | "namespace" _ NsIdentifier __ "{" NamespaceStatement* "}"
//!               | "type" TypeDeclaration | "schema" Schema | "translation" Translation
//!
//! Statements outside any `namespace` block land in the `__default__` namespace, which is
//! always the first namespace of a document. A statement that fails to parse is dropped
//! and parsing resumes with the next one.

use super::declarations::{schema_declaration, translation_declaration, type_declaration};
use super::ns_identifier;
use crate::metaschema::ast::declarations::DEFAULT_NAMESPACE;
use crate::metaschema::ast::{
    Document, Import, Namespace, Range, Schema, Translation, TypeDeclaration, Use,
};
use crate::metaschema::parsing::combinators::{
    any_until, expect_one_of, one_of, repeat, sequence, token, trivia, ws, Alt, Outcome, Parsed,
};
use crate::metaschema::parsing::context::ParseContext;
use crate::metaschema::parsing::rules;

#[derive(Debug, Clone, PartialEq)]
enum Statement {
    Import(Import),
    Use(Use),
    Namespace(Namespace),
    Type(TypeDeclaration),
    Schema(Schema),
    Translation(Translation),
}

impl Statement {
    fn widen(mut self, keyword: Range) -> Self {
        let range = match &mut self {
            Statement::Import(node) => &mut node.range,
            Statement::Use(node) => &mut node.range,
            Statement::Namespace(node) => &mut node.range,
            Statement::Type(node) => &mut node.range,
            Statement::Schema(node) => &mut node.range,
            Statement::Translation(node) => &mut node.range,
        };
        *range = keyword.to(range);
        self
    }
}

/// Adds a namespace-level statement to its bucket. Imports are not namespace members.
fn bucket(namespace: &mut Namespace, statement: Statement) -> Option<Import> {
    match statement {
        Statement::Import(import) => return Some(import),
        Statement::Use(node) => namespace.uses.push(node),
        Statement::Namespace(node) => namespace.namespaces.push(node),
        Statement::Type(node) => namespace.types.push(node),
        Statement::Schema(node) => namespace.schemas.push(node),
        Statement::Translation(node) => namespace.translations.push(node),
    }
    None
}

/// One document or namespace level statement. The keyword is consumed here.
fn statement(ctx: &mut ParseContext, top_level: bool) -> Outcome<Option<Statement>> {
    fn after_keyword<T>(
        ctx: &mut ParseContext,
        parser: fn(&mut ParseContext) -> Outcome<T>,
        wrap: fn(T) -> Statement,
    ) -> Outcome<Option<Statement>> {
        let keyword = ctx.current_range();
        parser(ctx).map(|node| Some(wrap(node).widen(keyword)))
    }

    let skip_comment = |ctx: &mut ParseContext| any_until(ctx, &rules::COMMENT_CLOSE).map(|_| None);
    let nothing = |_: &mut ParseContext| Outcome::Success(None);
    let use_ = |ctx: &mut ParseContext| after_keyword(ctx, use_statement, Statement::Use);
    let namespace =
        |ctx: &mut ParseContext| after_keyword(ctx, namespace_declaration, Statement::Namespace);
    let type_ = |ctx: &mut ParseContext| after_keyword(ctx, type_declaration, Statement::Type);
    let schema = |ctx: &mut ParseContext| after_keyword(ctx, schema_declaration, Statement::Schema);
    let translation = |ctx: &mut ParseContext| {
        after_keyword(ctx, translation_declaration, Statement::Translation)
    };
    let import = |ctx: &mut ParseContext| after_keyword(ctx, import_statement, Statement::Import);

    let alternatives = [
        Alt::hidden(&rules::COMMENT_OPEN, &skip_comment),
        Alt::hidden(&rules::COMMENT, &nothing),
        Alt::hidden(&rules::WS, &nothing),
        Alt::hidden(&rules::NL, &nothing),
        Alt::new(&rules::USE, &use_),
        Alt::new(&rules::NAMESPACE, &namespace),
        Alt::new(&rules::TYPE, &type_),
        Alt::new(&rules::SCHEMA, &schema),
        Alt::new(&rules::TRANSLATION, &translation),
        Alt::new(&rules::IMPORT, &import),
    ];

    if top_level {
        expect_one_of(ctx, &alternatives, false)
    } else {
        one_of(ctx, &alternatives[..alternatives.len() - 1], false)
    }
}

/// `import` body: `"uri";`
pub fn import_statement(ctx: &mut ParseContext) -> Outcome<Import> {
    sequence(ctx, Some(&rules::SEMICOLON), |ctx| {
        ws(ctx);
        let uri = token(ctx, &rules::URI_STRING)?;
        ws(ctx);
        Ok(uri.value)
    })
    .map(|Parsed { value, range }| Import { uri: value, range })
}

/// `use` body: `A.B;`
pub fn use_statement(ctx: &mut ParseContext) -> Outcome<Use> {
    sequence(ctx, Some(&rules::SEMICOLON), |ctx| {
        ws(ctx);
        let id = ns_identifier(ctx)?;
        ws(ctx);
        Ok(id)
    })
    .map(|Parsed { value, range }| Use {
        namespace: value.segments,
        namespace_ranges: value.ranges,
        range,
    })
}

/// `namespace` body: `A.B { statements }`
pub fn namespace_declaration(ctx: &mut ParseContext) -> Outcome<Namespace> {
    sequence(ctx, Some(&rules::BRACE_CLOSE), |ctx| {
        ws(ctx);
        let id = ns_identifier(ctx)?;
        trivia(ctx);
        token(ctx, &rules::BRACE_OPEN)?;
        let statements = repeat(ctx, |ctx| statement(ctx, false)).required()?;
        Ok((id, statements))
    })
    .map(|Parsed { value: (id, statements), range }| {
        let mut namespace = Namespace::new(id.segments, id.ranges, range);
        for statement in statements.into_iter().flatten() {
            bucket(&mut namespace, statement);
        }
        namespace
    })
}

/// Parses a whole document. Never fails: broken statements are reported and skipped.
pub fn document(ctx: &mut ParseContext) -> Document {
    let begin = ctx.mark();
    let mut imports = Vec::new();
    let mut default = Namespace::new(vec![DEFAULT_NAMESPACE.to_string()], Vec::new(), Range::default());
    let mut namespaces = Vec::new();

    while ctx.has_next() {
        match statement(ctx, true) {
            Outcome::Success(Some(Statement::Namespace(namespace))) => namespaces.push(namespace),
            Outcome::Success(Some(statement)) => imports.extend(bucket(&mut default, statement)),
            Outcome::Success(None) | Outcome::Skip => {}
            Outcome::Fail => tracing::trace!("statement dropped"),
        }
    }

    let range = ctx.range_since(begin);
    default.range = range;
    namespaces.insert(0, default);

    Document {
        imports,
        namespaces,
        range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metaschema::parsing::context::FlushPolicy;

    fn parse_document(source: &str) -> (Document, Vec<String>) {
        let mut ctx = ParseContext::from_source(source, FlushPolicy::Buffered);
        let document = document(&mut ctx);
        let messages = ctx
            .finish()
            .diagnostics
            .into_iter()
            .map(|d| d.message)
            .collect();
        (document, messages)
    }

    #[test]
    fn test_empty_document() {
        let (document, messages) = parse_document("");
        assert!(messages.is_empty());
        assert!(document.imports.is_empty());
        assert_eq!(document.namespaces.len(), 1);
        assert!(document.namespaces[0].is_default());
        assert!(document.namespaces[0].is_empty());
    }

    #[test]
    fn test_import() {
        let (document, messages) = parse_document("import \"hello\";");
        assert!(messages.is_empty());
        assert_eq!(document.imports.len(), 1);
        assert_eq!(document.imports[0].uri, "hello");
        assert_eq!(document.imports[0].range, Range::at(1, 1, 1, 16));
    }

    #[test]
    fn test_top_level_statements_go_to_default_namespace() {
        let source = "use Std.Types;\ntype Id = String;\nschema Empty() {}\ntranslation T {}\n";
        let (document, messages) = parse_document(source);
        assert!(messages.is_empty(), "{messages:?}");

        let default = document.default_namespace().unwrap();
        assert_eq!(default.uses[0].namespace, vec!["Std", "Types"]);
        assert_eq!(default.types[0].id, "Id");
        assert_eq!(default.types[0].range, Range::at(2, 1, 2, 18));
        assert_eq!(default.schemas[0].id, "Empty");
        assert_eq!(default.translations[0].id, "T");
        assert_eq!(document.namespaces.len(), 1);
    }

    #[test]
    fn test_nested_namespaces() {
        let (namespace, messages) = {
            let mut ctx =
                ParseContext::from_source("A.B {\n\t\t\tnamespace C.D {}\n\t\t}", FlushPolicy::Buffered);
            let namespace = namespace_declaration(&mut ctx).ok().unwrap();
            (namespace, ctx.finish().diagnostics)
        };
        assert!(messages.is_empty());
        assert_eq!(namespace.id, vec!["A", "B"]);
        assert_eq!(namespace.id_ranges[0], Range::at(1, 1, 1, 2));

        let inner = &namespace.namespaces[0];
        assert_eq!(inner.id, vec!["C", "D"]);
        assert_eq!(inner.id_ranges[0], Range::at(2, 14, 2, 15));
        assert_eq!(inner.range, Range::at(2, 4, 2, 20));
    }

    #[test]
    fn test_namespace_blocks_are_document_namespaces() {
        let (document, messages) =
            parse_document("namespace X { type T = String; }\nnamespace X { type T = Number; }");
        assert!(messages.is_empty());
        assert_eq!(document.namespaces.len(), 3);
        assert!(document.namespaces[0].is_default());
        assert_eq!(document.namespaces[1].types[0].id, "T");
    }

    #[test]
    fn test_unterminated_namespace() {
        let (document, messages) = parse_document("namespace A { ");
        assert_eq!(messages, vec!["} expected."]);
        assert_eq!(document.namespaces.len(), 1);
    }

    #[test]
    fn test_unknown_statement_is_reported_and_skipped() {
        let (document, messages) = parse_document("foo;\ntype A = B;");
        assert_eq!(
            messages,
            vec![
                "Expecting one of use | namespace | type | schema | translation | import, got 'identifier'.",
                "Expecting one of use | namespace | type | schema | translation | import, got 'semicolon'.",
            ]
        );
        assert_eq!(document.default_namespace().unwrap().types.len(), 1);
    }
}
