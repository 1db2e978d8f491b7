//! Type expressions
//!
//!     TypeExpression = __ TypeElement __ (("|" | "&") TypeExpression)? __
//!     TypeElement    = TypeRef | "(" TypeExpression ")" | TypeStruct
//!     TypeRef        = NsIdentifier _ TypeParameters?
//!     TypeStruct     = "{" __ (Identifier _ ":" __ TypeExpression __ ";" __)* "}"

use super::ns_identifier;
use crate::metaschema::ast::{Range, TypeAllOf, TypeExpression, TypeOneOf, TypeRef, TypeStruct};
use crate::metaschema::diagnostics::ErrorCode;
use crate::metaschema::parsing::combinators::{
    block, expect_one_of, list, one_of, repeat_since, sequence, token, trivia, ws, Alt, Outcome,
    Parsed,
};
use crate::metaschema::parsing::context::{token_range, ParseContext};
use crate::metaschema::parsing::rules;
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    OneOf,
    AllOf,
}

pub fn type_expression(ctx: &mut ParseContext) -> Outcome<TypeExpression> {
    let one_of_rest = |ctx: &mut ParseContext| type_expression(ctx).map(|t| (Combinator::OneOf, t));
    let all_of_rest = |ctx: &mut ParseContext| type_expression(ctx).map(|t| (Combinator::AllOf, t));

    sequence(ctx, None, |ctx| {
        trivia(ctx);
        let element = type_element(ctx).required()?;
        trivia(ctx);
        let rest = one_of(
            ctx,
            &[
                Alt::new(&rules::PIPE, &one_of_rest),
                Alt::new(&rules::AMP, &all_of_rest),
            ],
            false,
        )
        .optional()?;
        trivia(ctx);
        Ok((element, rest))
    })
    .map(|Parsed { value, range }| match value {
        (element, None) => element,
        (element, Some((Combinator::OneOf, right))) => {
            let mut types = vec![element];
            match right {
                TypeExpression::OneOf(union) => types.extend(union.types),
                other => types.push(other),
            }
            TypeExpression::OneOf(TypeOneOf { types, range })
        }
        (element, Some((Combinator::AllOf, right))) => {
            let mut types = vec![element];
            match right {
                TypeExpression::AllOf(intersection) => types.extend(intersection.types),
                other => types.push(other),
            }
            TypeExpression::AllOf(TypeAllOf { types, range })
        }
    })
}

fn type_element(ctx: &mut ParseContext) -> Outcome<TypeExpression> {
    let reference = |ctx: &mut ParseContext| type_reference(ctx).map(TypeExpression::Ref);
    let parenthesis = |ctx: &mut ParseContext| {
        block(ctx, &rules::PAREN_OPEN, Some(&rules::PAREN_CLOSE), |ctx| {
            type_expression(ctx).required()
        })
        .map(|parsed| parsed.value)
    };
    let structure = |ctx: &mut ParseContext| type_struct(ctx).map(TypeExpression::Struct);

    expect_one_of(
        ctx,
        &[
            Alt::new(&rules::IDENTIFIER, &reference),
            Alt::new(&rules::PAREN_OPEN, &parenthesis),
            Alt::new(&rules::BRACE_OPEN, &structure),
        ],
        true,
    )
}

pub fn type_reference(ctx: &mut ParseContext) -> Outcome<TypeRef> {
    sequence(ctx, None, |ctx| {
        let id = ns_identifier(ctx)?;
        ws(ctx);
        let params = type_parameters(ctx).optional()?;
        Ok((id, params.unwrap_or_default()))
    })
    .map(|Parsed { value: (id, params), range }| {
        let (namespace, namespace_ranges, name, name_range) = id.split();
        TypeRef {
            namespace,
            name,
            params,
            range,
            namespace_ranges,
            name_range,
        }
    })
}

/// `<A, B>`; `Skip` when no `<` follows.
pub fn type_parameters(ctx: &mut ParseContext) -> Outcome<Vec<TypeExpression>> {
    block(ctx, &rules::LT, Some(&rules::GT), |ctx| {
        list(ctx, &rules::COMMA, type_expression).required()
    })
    .map(|parsed| parsed.value)
}

pub fn type_struct(ctx: &mut ParseContext) -> Outcome<TypeStruct> {
    let parsed = block(ctx, &rules::BRACE_OPEN, Some(&rules::BRACE_CLOSE), |ctx| {
        trivia(ctx);
        repeat_since(ctx, &rules::IDENTIFIER_DECLARATION, true, struct_property).required()
    });

    let Parsed { value, range } = match parsed {
        Outcome::Success(parsed) => parsed,
        Outcome::Skip => return Outcome::Skip,
        Outcome::Fail => return Outcome::Fail,
    };

    let mut props = IndexMap::new();
    let mut prop_ranges = IndexMap::new();
    for (key, key_range, type_expr) in value {
        if props.contains_key(&key) {
            ctx.error(
                ErrorCode::DuplicateIdentifier,
                format!("Property '{key}' is already defined."),
                Some(key_range),
            );
            continue;
        }
        prop_ranges.insert(key.clone(), key_range);
        props.insert(key, type_expr);
    }

    Outcome::Success(TypeStruct {
        props,
        prop_ranges,
        range,
    })
}

fn struct_property(ctx: &mut ParseContext) -> Outcome<(String, Range, TypeExpression)> {
    sequence(ctx, None, |ctx| {
        let key = token(ctx, &rules::IDENTIFIER_DECLARATION)?;
        ws(ctx);
        token(ctx, &rules::COLON)?;
        trivia(ctx);
        let type_expr = type_expression(ctx).required()?;
        trivia(ctx);
        token(ctx, &rules::SEMICOLON)?;
        trivia(ctx);
        Ok((key.value.clone(), token_range(&key), type_expr))
    })
    .map(|parsed| parsed.value)
}
