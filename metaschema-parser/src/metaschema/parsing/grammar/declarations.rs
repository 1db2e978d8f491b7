//! Declarations and statements
//!
//!     TypeDeclaration = _ Identifier _ Generics? __ "=" __ TypeExpression ";"
//!     Schema          = _ Identifier _ Generics? __ SchemaParams? __ "{" SchemaStatement* "}"
//!     SchemaStatement = Let | Action | Return
//!     Action          = ("override" _)? "action" _ Identifier __ SchemaParams? __ "{" ActionStatement* "}"
//!     ActionStatement = Let | Set | Invoke
//!     Translation     = _ Identifier __ "{" __ (NsIdentifier _ SchemaParams? _ "=>" __ Expression __ ";" __)* "}"
//!
//! Type, schema and translation declarations start after their keyword. Statements inside
//! schema and action bodies include it.

use super::expressions::{attribute, call_arguments, expression, ref_variable};
use super::ns_identifier;
use super::types::type_expression;
use crate::metaschema::ast::{
    Action, ActionStatement, Expression, Generic, Invoke, RefVariable, Return, Schema,
    SchemaParam, SchemaStatement, Set, Translation, TranslationTerm, TypeDeclaration, Variable,
};
use crate::metaschema::diagnostics::ErrorCode;
use crate::metaschema::parsing::combinators::{
    any_until, block, expect_one_of, list, one_of, opt, repeat, repeat_since, sequence,
    starts_with, token, trivia, ws, Alt, Outcome, Parsed,
};
use crate::metaschema::parsing::context::{token_range, ParseContext};
use crate::metaschema::parsing::rules;

/// `type` body: `Name<G> = TypeExpr;`
pub fn type_declaration(ctx: &mut ParseContext) -> Outcome<TypeDeclaration> {
    sequence(ctx, Some(&rules::SEMICOLON), |ctx| {
        ws(ctx);
        let id = token(ctx, &rules::IDENTIFIER_DECLARATION)?;
        ws(ctx);
        let generics = generics(ctx).optional()?.unwrap_or_default();
        trivia(ctx);
        token(ctx, &rules::ASSIGNMENT)?;
        trivia(ctx);
        let type_expr = type_expression(ctx).required()?;
        Ok((id, generics, type_expr))
    })
    .map(|Parsed { value: (id, generics, type_expr), range }| TypeDeclaration {
        id: id.value.clone(),
        generics,
        type_expr,
        range,
        id_range: token_range(&id),
    })
}

/// `<A, B extends C, D = E>`
pub fn generics(ctx: &mut ParseContext) -> Outcome<Vec<Generic>> {
    block(ctx, &rules::LT, Some(&rules::GT), |ctx| {
        list(ctx, &rules::COMMA, generic).required()
    })
    .map(|parsed| parsed.value)
}

fn generic(ctx: &mut ParseContext) -> Outcome<Generic> {
    sequence(ctx, None, |ctx| {
        trivia(ctx);
        let id = token(ctx, &rules::IDENTIFIER_DECLARATION)?;
        ws(ctx);
        let extends = block(ctx, &rules::EXTENDS, None, |ctx| {
            ws(ctx);
            type_expression(ctx).required()
        })
        .optional()?;
        trivia(ctx);
        let default = starts_with(ctx, &rules::ASSIGNMENT, false, |ctx| {
            trivia(ctx);
            type_expression(ctx).required()
        })
        .optional()?;
        trivia(ctx);
        Ok((id, extends, default))
    })
    .map(|Parsed { value: (id, extends, default), range }| Generic {
        id: id.value.clone(),
        extends: extends.map(|parsed| parsed.value),
        default: default.map(|parsed| parsed.value),
        range,
        id_range: token_range(&id),
    })
}

/// `(a: T, b: T = default, *rest: T)`; `Skip` when no `(` follows.
pub fn schema_params(ctx: &mut ParseContext) -> Outcome<Vec<SchemaParam>> {
    let param_list = |ctx: &mut ParseContext| list(ctx, &rules::COMMA, schema_param);

    block(ctx, &rules::PAREN_OPEN, Some(&rules::PAREN_CLOSE), |ctx| {
        trivia(ctx);
        let params = one_of(
            ctx,
            &[
                Alt::new(&rules::IDENTIFIER_DECLARATION, &param_list),
                Alt::new(&rules::MULTIPLY, &param_list),
            ],
            true,
        )
        .optional()?;
        Ok(params.unwrap_or_default())
    })
    .map(|parsed| parsed.value)
}

fn schema_param(ctx: &mut ParseContext) -> Outcome<SchemaParam> {
    sequence(ctx, None, |ctx| {
        trivia(ctx);
        let rest = opt(ctx, &rules::MULTIPLY).is_some();
        let id = token(ctx, &rules::IDENTIFIER_DECLARATION)?;
        ws(ctx);
        token(ctx, &rules::COLON)?;
        trivia(ctx);
        let type_expr = type_expression(ctx).required()?;
        trivia(ctx);
        let default = starts_with(ctx, &rules::ASSIGNMENT, false, |ctx| {
            trivia(ctx);
            let value = expression(ctx).required()?;
            trivia(ctx);
            Ok(value)
        })
        .optional()?;
        Ok((rest, id, type_expr, default.map(|parsed| parsed.value)))
    })
    .map(|Parsed { value: (rest, id, type_expr, default), range }| SchemaParam {
        id: id.value.clone(),
        type_expr,
        default,
        rest,
        range,
        id_range: token_range(&id),
    })
}

/// `schema` body: `Name<G>(params) { statements }`
pub fn schema_declaration(ctx: &mut ParseContext) -> Outcome<Schema> {
    sequence(ctx, Some(&rules::BRACE_CLOSE), |ctx| {
        ws(ctx);
        let id = token(ctx, &rules::IDENTIFIER_DECLARATION)?;
        ws(ctx);
        let generics = generics(ctx).optional()?.unwrap_or_default();
        trivia(ctx);
        let params = schema_params(ctx).optional()?.unwrap_or_default();
        trivia(ctx);
        token(ctx, &rules::BRACE_OPEN)?;
        let body = repeat(ctx, schema_statement).required()?;
        Ok((id, generics, params, body))
    })
    .map(|Parsed { value: (id, generics, params, body), range }| Schema {
        id: id.value.clone(),
        generics,
        params,
        body: body.into_iter().flatten().collect(),
        range,
        id_range: token_range(&id),
    })
}

fn skip_comment<T>(ctx: &mut ParseContext) -> Outcome<Option<T>> {
    any_until(ctx, &rules::COMMENT_CLOSE).map(|_| None)
}

fn skip_token<T>(ctx: &mut ParseContext) -> Outcome<Option<T>> {
    ctx.next();
    Outcome::Success(None)
}

/// One statement of a schema body; `Success(None)` for whitespace and comments.
pub fn schema_statement(ctx: &mut ParseContext) -> Outcome<Option<SchemaStatement>> {
    let variable = |ctx: &mut ParseContext| {
        let_statement(ctx).map(|variable| Some(SchemaStatement::Variable(variable)))
    };
    let action = |ctx: &mut ParseContext| {
        action_declaration(ctx).map(|action| Some(SchemaStatement::Action(action)))
    };
    let return_ = |ctx: &mut ParseContext| {
        return_statement(ctx).map(|value| Some(SchemaStatement::Return(value)))
    };

    one_of(
        ctx,
        &[
            Alt::hidden(&rules::COMMENT_OPEN, &skip_comment::<SchemaStatement>),
            Alt::hidden(&rules::COMMENT, &skip_token::<SchemaStatement>),
            Alt::new(&rules::LET, &variable),
            Alt::new(&rules::ACTION, &action),
            Alt::new(&rules::OVERRIDE, &action),
            Alt::new(&rules::RETURN, &return_),
            Alt::hidden(&rules::WS, &skip_token::<SchemaStatement>),
            Alt::hidden(&rules::NL, &skip_token::<SchemaStatement>),
        ],
        true,
    )
}

/// One statement of an action body; `Success(None)` for whitespace and comments.
pub fn action_statement(ctx: &mut ParseContext) -> Outcome<Option<ActionStatement>> {
    let variable = |ctx: &mut ParseContext| {
        let_statement(ctx).map(|variable| Some(ActionStatement::Variable(variable)))
    };
    let set = |ctx: &mut ParseContext| set_statement(ctx).map(|set| Some(ActionStatement::Set(set)));
    let invoke = |ctx: &mut ParseContext| {
        invoke_statement(ctx).map(|invoke| Some(ActionStatement::Invoke(invoke)))
    };

    one_of(
        ctx,
        &[
            Alt::hidden(&rules::COMMENT_OPEN, &skip_comment::<ActionStatement>),
            Alt::hidden(&rules::COMMENT, &skip_token::<ActionStatement>),
            Alt::new(&rules::LET, &variable),
            Alt::new(&rules::SET, &set),
            Alt::new(&rules::UPDATE, &set),
            Alt::new(&rules::INVOKE, &invoke),
            Alt::hidden(&rules::WS, &skip_token::<ActionStatement>),
            Alt::hidden(&rules::NL, &skip_token::<ActionStatement>),
        ],
        true,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Propagate,
    Inherit,
}

/// `let (propagate|inherit)? state? name (: Type)? = value;`
pub fn let_statement(ctx: &mut ParseContext) -> Outcome<Variable> {
    let propagate = |_: &mut ParseContext| Outcome::Success(Scope::Propagate);
    let inherit = |_: &mut ParseContext| Outcome::Success(Scope::Inherit);

    sequence(ctx, Some(&rules::SEMICOLON), |ctx| {
        token(ctx, &rules::LET)?;
        ws(ctx);
        let scope = one_of(
            ctx,
            &[
                Alt::new(&rules::PROPAGATE, &propagate),
                Alt::new(&rules::INHERIT, &inherit),
            ],
            false,
        )
        .optional()?;
        ws(ctx);
        let stateful = opt(ctx, &rules::STATE).is_some();
        ws(ctx);
        let id = token(ctx, &rules::IDENTIFIER_DECLARATION)?;
        ws(ctx);
        let type_expr = starts_with(ctx, &rules::COLON, false, |ctx| {
            ws(ctx);
            type_expression(ctx).required()
        })
        .optional()?;
        ws(ctx);
        token(ctx, &rules::ASSIGNMENT)?;
        trivia(ctx);
        let value = expression(ctx).required()?;
        trivia(ctx);
        Ok((scope, stateful, id, type_expr.map(|parsed| parsed.value), value))
    })
    .map(
        |Parsed {
             value: (scope, stateful, id, type_expr, value),
             range,
         }| Variable {
            id: id.value.clone(),
            type_expr,
            value,
            stateful,
            propagated: scope == Some(Scope::Propagate),
            inherited: scope == Some(Scope::Inherit),
            range,
            id_range: token_range(&id),
        },
    )
}

/// `return value;`
pub fn return_statement(ctx: &mut ParseContext) -> Outcome<Return> {
    sequence(ctx, Some(&rules::SEMICOLON), |ctx| {
        let keyword = token(ctx, &rules::RETURN)?;
        ws(ctx);
        let value = expression(ctx).required()?;
        Ok((token_range(&keyword), value))
    })
    .map(|Parsed { value: (keyword_range, value), range }| Return {
        value,
        range,
        keyword_range,
    })
}

/// `set name = value;` or `update name = value;`
pub fn set_statement(ctx: &mut ParseContext) -> Outcome<Set> {
    let keyword = |_: &mut ParseContext| Outcome::Success(());

    sequence(ctx, Some(&rules::SEMICOLON), |ctx| {
        expect_one_of(
            ctx,
            &[
                Alt::new(&rules::SET, &keyword),
                Alt::new(&rules::UPDATE, &keyword),
            ],
            false,
        )
        .required()?;
        ws(ctx);
        let name = token(ctx, &rules::IDENTIFIER)?;
        ws(ctx);
        token(ctx, &rules::ASSIGNMENT)?;
        trivia(ctx);
        let value = expression(ctx).required()?;
        Ok((name, value))
    })
    .map(|Parsed { value: (name, value), range }| {
        let name_range = token_range(&name);
        Set {
            target: RefVariable {
                name: name.value.clone(),
                range: name_range,
                name_range,
            },
            value,
            range,
        }
    })
}

/// `invoke target#action(args);`
pub fn invoke_statement(ctx: &mut ParseContext) -> Outcome<Invoke> {
    let attribute = |ctx: &mut ParseContext| attribute(ctx);
    let variable = |ctx: &mut ParseContext| ref_variable(ctx);

    let parsed = sequence(ctx, Some(&rules::SEMICOLON), |ctx| {
        token(ctx, &rules::INVOKE)?;
        ws(ctx);
        let action = expect_one_of(
            ctx,
            &[
                Alt::new(&rules::ATTRIBUTE, &attribute),
                Alt::new(&rules::IDENTIFIER, &variable),
            ],
            true,
        )
        .required()?;
        trivia(ctx);
        let args = call_arguments(ctx).optional()?.unwrap_or_default();
        trivia(ctx);
        Ok((action, args))
    });

    parsed.map(|Parsed { value: (action, args), range }| {
        if !matches!(action, Expression::RefAction(_)) {
            ctx.error(
                ErrorCode::InvalidSyntaxActionRef,
                "Expected reference to an action (using # notation).",
                Some(action.range()),
            );
        }
        Invoke { action, args, range }
    })
}

/// `override? action name(params) { statements }`
pub fn action_declaration(ctx: &mut ParseContext) -> Outcome<Action> {
    sequence(ctx, Some(&rules::BRACE_CLOSE), |ctx| {
        let is_override = opt(ctx, &rules::OVERRIDE).is_some();
        ws(ctx);
        token(ctx, &rules::ACTION)?;
        ws(ctx);
        let id = token(ctx, &rules::IDENTIFIER_DECLARATION)?;
        trivia(ctx);
        let params = schema_params(ctx).optional()?.unwrap_or_default();
        trivia(ctx);
        token(ctx, &rules::BRACE_OPEN)?;
        let body = repeat(ctx, action_statement).required()?;
        Ok((is_override, id, params, body))
    })
    .map(|Parsed { value: (is_override, id, params, body), range }| Action {
        id: id.value.clone(),
        params,
        is_override,
        body: body.into_iter().flatten().collect(),
        range,
        id_range: token_range(&id),
    })
}

/// `translation` body: `Name { term.id(params) => value; ... }`
pub fn translation_declaration(ctx: &mut ParseContext) -> Outcome<Translation> {
    sequence(ctx, Some(&rules::BRACE_CLOSE), |ctx| {
        ws(ctx);
        let id = token(ctx, &rules::IDENTIFIER_DECLARATION)?;
        trivia(ctx);
        token(ctx, &rules::BRACE_OPEN)?;
        trivia(ctx);
        let terms =
            repeat_since(ctx, &rules::IDENTIFIER_DECLARATION, true, translation_term).required()?;
        Ok((id, terms))
    })
    .map(|Parsed { value: (id, terms), range }| Translation {
        id: id.value.clone(),
        terms,
        range,
        id_range: token_range(&id),
    })
}

fn translation_term(ctx: &mut ParseContext) -> Outcome<TranslationTerm> {
    sequence(ctx, None, |ctx| {
        let id = ns_identifier(ctx)?;
        ws(ctx);
        let params = schema_params(ctx).optional()?.unwrap_or_default();
        ws(ctx);
        token(ctx, &rules::ARROW)?;
        trivia(ctx);
        let value = expression(ctx).required()?;
        trivia(ctx);
        token(ctx, &rules::SEMICOLON)?;
        trivia(ctx);
        Ok((id, params, value))
    })
    .map(|Parsed { value: (id, params, value), range }| TranslationTerm {
        id: id.segments,
        id_ranges: id.ranges,
        params,
        value,
        range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metaschema::ast::{Range, ScalarValue};
    use crate::metaschema::parsing::context::FlushPolicy;

    fn parse_with<T>(
        source: &str,
        parser: impl FnOnce(&mut ParseContext) -> Outcome<T>,
    ) -> (Outcome<T>, Vec<String>) {
        let mut ctx = ParseContext::from_source(source, FlushPolicy::Buffered);
        let outcome = parser(&mut ctx);
        let messages = ctx
            .finish()
            .diagnostics
            .into_iter()
            .map(|d| d.message)
            .collect();
        (outcome, messages)
    }

    fn parse_ok<T: std::fmt::Debug>(
        source: &str,
        parser: impl FnOnce(&mut ParseContext) -> Outcome<T>,
    ) -> T {
        let (outcome, messages) = parse_with(source, parser);
        assert!(messages.is_empty(), "{source:?}: {messages:?}");
        outcome.ok().unwrap()
    }

    #[test]
    fn test_type_declaration_with_generics() {
        let declaration = parse_ok("MyType<A, B extends C> = Map<A,B>;", type_declaration);
        assert_eq!(declaration.id, "MyType");
        assert_eq!(declaration.id_range, Range::at(1, 1, 1, 7));
        assert_eq!(declaration.generics.len(), 2);
        assert_eq!(declaration.generics[0].id, "A");
        assert!(declaration.generics[0].extends.is_none());

        let bound = declaration.generics[1].extends.as_ref().unwrap();
        assert_eq!(bound.as_type_ref().unwrap().name, "C");
        assert_eq!(bound.range(), Range::at(1, 21, 1, 22));
        assert_eq!(declaration.range, Range::at(1, 1, 1, 35));
    }

    #[test]
    fn test_generic_default() {
        let declaration = parse_ok("Box<T = String> = List<T>;", type_declaration);
        let default = declaration.generics[0].default.as_ref().unwrap();
        assert_eq!(default.as_type_ref().unwrap().name, "String");
    }

    #[test]
    fn test_type_declaration_missing_semicolon_recovers() {
        let (outcome, messages) = parse_with("MyType = String }", type_declaration);
        assert!(outcome.is_fail());
        assert_eq!(messages, vec!["; expected, got 'braceClose'."]);
    }

    #[test]
    fn test_schema_params() {
        let source = "(\n\t\t\tparam1: String,\n\t\t\tparam2: Number = 42,\n\t\t\t*param3: String\n\t\t)";
        let params = parse_ok(source, schema_params);
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].id_range, Range::at(2, 4, 2, 10));
        assert!(params[1].default.is_some());
        assert!(params[2].rest);
        assert_eq!(params[2].id_range, Range::at(4, 5, 4, 11));
        assert_eq!(params[2].range, Range::at(4, 4, 4, 19));
    }

    #[test]
    fn test_schema_params_starting_with_rest() {
        let params = parse_ok("(*items: String)", schema_params);
        assert_eq!(params.len(), 1);
        assert!(params[0].rest);
    }

    #[test]
    fn test_let_statement() {
        let variable = parse_ok("let myVar: String = \"hello\";", let_statement);
        assert_eq!(variable.id, "myVar");
        assert_eq!(variable.id_range, Range::at(1, 5, 1, 10));
        assert!(!variable.stateful && !variable.propagated && !variable.inherited);
        assert_eq!(
            variable.type_expr.as_ref().and_then(|t| t.as_type_ref()).map(|t| t.name.as_str()),
            Some("String")
        );
        assert!(matches!(&variable.value, Expression::Scalar(s) if s.value == ScalarValue::String("hello".into())));
        assert_eq!(variable.range, Range::at(1, 1, 1, 29));
    }

    #[test]
    fn test_let_modifiers() {
        let variable = parse_ok("let propagate state varName = 1;", let_statement);
        assert!(variable.propagated && variable.stateful && !variable.inherited);
        assert_eq!(variable.id_range, Range::at(1, 21, 1, 28));

        let variable = parse_ok("let inherit varName = 1;", let_statement);
        assert!(variable.inherited && !variable.stateful);
    }

    #[test]
    fn test_return_statement() {
        let statement = parse_ok("return a + 1;", return_statement);
        assert_eq!(statement.keyword_range, Range::at(1, 1, 1, 7));
        assert_eq!(statement.range, Range::at(1, 1, 1, 14));
        assert!(matches!(statement.value, Expression::Call(_)));
    }

    #[test]
    fn test_set_and_update() {
        let set = parse_ok("set myVar = 123;", set_statement);
        assert_eq!(set.target.name, "myVar");
        assert_eq!(set.target.range, Range::at(1, 5, 1, 10));
        assert_eq!(set.range, Range::at(1, 1, 1, 17));

        let update = parse_ok("update myVar = myVar + 1;", set_statement);
        assert_eq!(update.target.name, "myVar");
    }

    #[test]
    fn test_invoke_statement() {
        let invoke = parse_ok("invoke myVar#action(arg1: var1);", invoke_statement);
        assert_eq!(invoke.range, Range::at(1, 1, 1, 33));
        assert_eq!(invoke.args.len(), 1);
        let Expression::RefAction(action) = &invoke.action else {
            panic!("expected an action reference");
        };
        assert_eq!(action.id, "action");
    }

    #[test]
    fn test_invoke_requires_action_reference() {
        let mut ctx = ParseContext::from_source("invoke myVar();", FlushPolicy::Buffered);
        assert!(invoke_statement(&mut ctx).is_success());
        let diagnostics = ctx.finish().diagnostics;
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].name, ErrorCode::InvalidSyntaxActionRef);
        assert_eq!(diagnostics[0].range, Range::at(1, 8, 1, 13));
    }

    #[test]
    fn test_action_declaration() {
        let source = "override action reset(value: Number) {\n\tlet x = @value;\n\t// note\n\tset count = x;\n\tinvoke @parent#refresh();\n}";
        let action = parse_ok(source, action_declaration);
        assert!(action.is_override);
        assert_eq!(action.id, "reset");
        assert_eq!(action.params.len(), 1);
        assert_eq!(action.body.len(), 3);
        assert!(matches!(action.body[0], ActionStatement::Variable(_)));
        assert!(matches!(action.body[1], ActionStatement::Set(_)));
        assert!(matches!(action.body[2], ActionStatement::Invoke(_)));
        assert_eq!(action.range, Range::at(1, 1, 6, 2));
    }

    #[test]
    fn test_schema_declaration() {
        let source = "MySchema<T>(value: T) {\n\tlet doubled = @value * 2;\n\t/* block\n\tcomment */\n\taction run() {}\n\treturn doubled;\n}";
        let schema = parse_ok(source, schema_declaration);
        assert_eq!(schema.id, "MySchema");
        assert_eq!(schema.generics.len(), 1);
        assert_eq!(schema.params.len(), 1);
        assert_eq!(schema.body.len(), 3);
        let SchemaStatement::Return(statement) = &schema.body[2] else {
            panic!("expected a return statement");
        };
        assert_eq!(statement.keyword_range, Range::at(6, 2, 6, 8));
    }

    #[test]
    fn test_schema_body_recovers_from_broken_statement() {
        let (outcome, messages) = parse_with(
            "MySchema() {\n\tlet = 1;\n\treturn true;\n}",
            schema_declaration,
        );
        assert!(outcome.is_fail());
        assert_eq!(messages[0], "Identifier expected, got 'assignment'.");
    }

    #[test]
    fn test_statement_expectations_leave_out_whitespace() {
        let (outcome, messages) = parse_with("foo", schema_statement);
        assert!(outcome.is_fail());
        assert_eq!(
            messages,
            vec!["Expecting one of let | action | override | return, got 'identifier'."]
        );

        let (outcome, messages) = parse_with("foo", action_statement);
        assert!(outcome.is_fail());
        assert_eq!(
            messages,
            vec!["Expecting one of let | set | update | invoke, got 'identifier'."]
        );
    }

    #[test]
    fn test_translation_declaration() {
        let source = "Texts {\n\tgreeting.hello(name: String) => `Hello ${@name}`;\n\tbye => \"Bye\";\n}";
        let translation = parse_ok(source, translation_declaration);
        assert_eq!(translation.id, "Texts");
        assert_eq!(translation.terms.len(), 2);
        assert_eq!(translation.terms[0].id, vec!["greeting", "hello"]);
        assert_eq!(translation.terms[0].params.len(), 1);
        assert_eq!(translation.terms[1].range, Range::at(3, 2, 3, 15));
    }
}
