//! Value expressions
//!
//!     Expression   = Operand __ ("is" __ "!"? __ "<" TypeExpression ">" __)? Continuation?
//!     Continuation = Operator __ Expression
//!                  | "then" __ Expression __ ("else" __ Expression)?
//!                  | "?" __ Expression __ (":" __ Expression)?
//!     Operand      = "!" Operand | Lambda | When | Constant | StringTemplate | RefOrCall
//!                  | "(" Expression ")" | List | Struct | "$" RefTranslation "$"
//!
//! Operators carry no precedence. The continuation takes everything to its right, so
//! `a + b * c` reads `a + (b * c)` and `a * b + c` reads `a * (b + c)`. Each operator is
//! rewritten into a call of its `Meta` schema with `left` and `right` arguments.

use super::declarations::schema_params;
use super::ns_identifier;
use super::types::{type_expression, type_parameters};
use crate::metaschema::ast::builtins::{schemas, types as builtin_types, Builtin};
use crate::metaschema::ast::{
    Call, CallArgument, Condition, ConditionBranch, ConditionType, Expression, Lambda, Range,
    RefAction, RefParam, RefProperty, RefTranslation, RefVariable, Scalar, ScalarValue,
    TypeExpression, ValueList, ValueStruct,
};
use crate::metaschema::diagnostics::ErrorCode;
use crate::metaschema::parsing::combinators::{
    block, expect_block, expect_one_of, list, one_of, opt, repeat, repeat_since, sequence,
    starts_with, token, trivia, try_parse, ws, Alt, Failed, Outcome, Parsed, Step,
};
use crate::metaschema::parsing::context::{token_range, ParseContext};
use crate::metaschema::parsing::rules;
use indexmap::IndexMap;

/// What follows a complete left operand
enum Continuation {
    Operator {
        schema: Builtin,
        operator_range: Range,
        right: Expression,
        end: Range,
    },
    Condition {
        then: Expression,
        otherwise: Option<Expression>,
        end: Range,
    },
}

impl Continuation {
    fn apply(self, left: Expression) -> Expression {
        let start = left.range();
        match self {
            Continuation::Operator {
                schema,
                operator_range,
                right,
                end,
            } => {
                let right_range = right.range();
                let args = vec![
                    CallArgument::named("left", left, start),
                    CallArgument::named("right", right, right_range),
                ];
                Expression::Call(Call::builtin(schema, operator_range, args, start.to(&end)))
            }
            Continuation::Condition {
                then,
                otherwise,
                end,
            } => Expression::Condition(Condition {
                branches: vec![ConditionBranch { when: left, then }],
                default: otherwise.map(Box::new),
                range: start.to(&end),
            }),
        }
    }
}

pub fn expression(ctx: &mut ParseContext) -> Outcome<Expression> {
    let lt = |ctx: &mut ParseContext| operator(ctx, schemas::LT);
    let lte = |ctx: &mut ParseContext| operator(ctx, schemas::LTE);
    let gt = |ctx: &mut ParseContext| operator(ctx, schemas::GT);
    let gte = |ctx: &mut ParseContext| operator(ctx, schemas::GTE);
    let equal = |ctx: &mut ParseContext| operator(ctx, schemas::EQUAL);
    let not_equal = |ctx: &mut ParseContext| operator(ctx, schemas::NOT_EQUAL);
    let and = |ctx: &mut ParseContext| operator(ctx, schemas::AND);
    let or = |ctx: &mut ParseContext| operator(ctx, schemas::OR);
    let multiply = |ctx: &mut ParseContext| operator(ctx, schemas::MULTIPLY);
    let divide = |ctx: &mut ParseContext| operator(ctx, schemas::DIVIDE);
    let modulo = |ctx: &mut ParseContext| operator(ctx, schemas::MODULO);
    let sum = |ctx: &mut ParseContext| operator(ctx, schemas::SUM);
    let sub = |ctx: &mut ParseContext| operator(ctx, schemas::SUB);
    let then = |ctx: &mut ParseContext| inline_condition(ctx, &rules::ELSE);
    let ternary = |ctx: &mut ParseContext| inline_condition(ctx, &rules::COLON);

    sequence(ctx, None, |ctx| {
        let operand = operand(ctx).required()?;
        trivia(ctx);
        let left = match type_guard(ctx).optional()? {
            Some((negated, type_expr, end)) => {
                let start = operand.range();
                let guard = Expression::ConditionType(ConditionType {
                    value: Box::new(operand),
                    type_expr,
                    range: start.to(&end),
                });
                if negated {
                    negate(guard, start, start.to(&end))
                } else {
                    guard
                }
            }
            None => operand,
        };

        let continuation = one_of(
            ctx,
            &[
                Alt::new(&rules::LT, &lt),
                Alt::new(&rules::LTE, &lte),
                Alt::new(&rules::GT, &gt),
                Alt::new(&rules::GTE, &gte),
                Alt::new(&rules::EQUAL, &equal),
                Alt::new(&rules::NOT_EQUAL, &not_equal),
                Alt::new(&rules::AND, &and),
                Alt::new(&rules::OR, &or),
                Alt::new(&rules::PIPE, &or),
                Alt::new(&rules::AMP, &and),
                Alt::new(&rules::MULTIPLY, &multiply),
                Alt::new(&rules::DIVIDE, &divide),
                Alt::new(&rules::MODULO, &modulo),
                Alt::new(&rules::PLUS, &sum),
                Alt::new(&rules::MINUS, &sub),
                Alt::new(&rules::THEN, &then),
                Alt::new(&rules::QUESTION_MARK, &ternary),
            ],
            false,
        )
        .optional()?;

        Ok(match continuation {
            Some(continuation) => continuation.apply(left),
            None => left,
        })
    })
    .map(|parsed| parsed.value)
}

/// `is !? <Type>` after an operand: whether it is negated, the type and where it ends.
fn type_guard(ctx: &mut ParseContext) -> Outcome<(bool, TypeExpression, Range)> {
    starts_with(ctx, &rules::IS, false, |ctx| {
        trivia(ctx);
        let negated = opt(ctx, &rules::NOT).is_some();
        trivia(ctx);
        let guarded = expect_block(ctx, &rules::LT, Some(&rules::GT), |ctx| {
            type_expression(ctx).required()
        })
        .required()?;
        trivia(ctx);
        Ok((negated, guarded.value, guarded.range))
    })
    .map(|parsed| parsed.value)
}

fn negate(value: Expression, operator_range: Range, range: Range) -> Expression {
    let value_range = value.range();
    Expression::Call(Call::builtin(
        schemas::NOT,
        operator_range,
        vec![CallArgument::named("value", value, value_range)],
        range,
    ))
}

fn operator(ctx: &mut ParseContext, schema: Builtin) -> Outcome<Continuation> {
    let operator_range = ctx.current_range();
    sequence(ctx, None, |ctx| {
        trivia(ctx);
        expression(ctx).required()
    })
    .map(|Parsed { value, range }| Continuation::Operator {
        schema,
        operator_range,
        right: value,
        end: range,
    })
}

fn inline_condition(ctx: &mut ParseContext, otherwise: &rules::Rule) -> Outcome<Continuation> {
    sequence(ctx, None, |ctx| {
        trivia(ctx);
        let then = expression(ctx).required()?;
        trivia(ctx);
        let otherwise = starts_with(ctx, otherwise, false, |ctx| {
            trivia(ctx);
            expression(ctx).required()
        })
        .optional()?;
        Ok((then, otherwise.map(|parsed| parsed.value)))
    })
    .map(|Parsed { value: (then, otherwise), range }| Continuation::Condition {
        then,
        otherwise,
        end: range,
    })
}

pub fn operand(ctx: &mut ParseContext) -> Outcome<Expression> {
    let not = |ctx: &mut ParseContext| not_operator(ctx);
    let lambda = |ctx: &mut ParseContext| lambda(ctx).map(Expression::Lambda);
    let when = |ctx: &mut ParseContext| when(ctx).map(Expression::Condition);
    let constant = |ctx: &mut ParseContext| constant(ctx).map(Expression::Scalar);
    let template = |ctx: &mut ParseContext| string_template(ctx).map(Expression::Call);
    let reference = |ctx: &mut ParseContext| ref_or_call(ctx);
    let string = |ctx: &mut ParseContext| string_literal(ctx).map(Expression::Scalar);
    let number = |ctx: &mut ParseContext| number_literal(ctx).map(Expression::Scalar);
    let sub_expression = |ctx: &mut ParseContext| sub_expression(ctx);
    let list = |ctx: &mut ParseContext| value_list(ctx).map(Expression::List);
    let structure = |ctx: &mut ParseContext| value_struct(ctx).map(Expression::Struct);
    let translation = |ctx: &mut ParseContext| ref_translation(ctx).map(Expression::RefTranslation);

    expect_one_of(
        ctx,
        &[
            Alt::new(&rules::NOT, &not),
            Alt::new(&rules::FN, &lambda),
            Alt::new(&rules::WHEN, &when),
            Alt::new(&rules::TRUE, &constant),
            Alt::new(&rules::FALSE, &constant),
            Alt::new(&rules::NULL, &constant),
            Alt::new(&rules::TEMPLATE_OPEN, &template),
            Alt::new(&rules::ATTRIBUTE, &reference),
            Alt::new(&rules::IDENTIFIER, &reference),
            Alt::new(&rules::STRING_LITERAL, &string),
            Alt::new(&rules::NUMBER_LITERAL, &number),
            Alt::new(&rules::PAREN_OPEN, &sub_expression),
            Alt::new(&rules::BRACKET_OPEN, &list),
            Alt::new(&rules::BRACE_OPEN, &structure),
            Alt::new(&rules::DOLLAR, &translation),
        ],
        true,
    )
}

fn not_operator(ctx: &mut ParseContext) -> Outcome<Expression> {
    sequence(ctx, None, |ctx| {
        let not = token(ctx, &rules::NOT)?;
        trivia(ctx);
        let value = operand(ctx).required()?;
        Ok((token_range(&not), value))
    })
    .map(|Parsed { value: (operator_range, value), range }| negate(value, operator_range, range))
}

/// `fn (params) => body`
pub fn lambda(ctx: &mut ParseContext) -> Outcome<Lambda> {
    sequence(ctx, None, |ctx| {
        token(ctx, &rules::FN)?;
        ws(ctx);
        let params = schema_params(ctx).optional()?.unwrap_or_default();
        trivia(ctx);
        token(ctx, &rules::ARROW)?;
        trivia(ctx);
        let body = expression(ctx).required()?;
        Ok((params, body))
    })
    .map(|Parsed { value: (params, body), range }| Lambda {
        params,
        body: Box::new(body),
        range,
    })
}

/// `when { (condition) => value; ... }`
pub fn when(ctx: &mut ParseContext) -> Outcome<Condition> {
    sequence(ctx, Some(&rules::BRACE_CLOSE), |ctx| {
        token(ctx, &rules::WHEN)?;
        trivia(ctx);
        token(ctx, &rules::BRACE_OPEN)?;
        trivia(ctx);
        repeat_since(ctx, &rules::PAREN_OPEN, false, when_branch).required()
    })
    .map(|Parsed { value, range }| Condition {
        branches: value,
        default: None,
        range,
    })
}

fn when_branch(ctx: &mut ParseContext) -> Outcome<ConditionBranch> {
    sequence(ctx, None, |ctx| {
        trivia(ctx);
        let when = expression(ctx).required()?;
        trivia(ctx);
        token(ctx, &rules::PAREN_CLOSE)?;
        trivia(ctx);
        token(ctx, &rules::ARROW)?;
        trivia(ctx);
        let then = expression(ctx).required()?;
        trivia(ctx);
        token(ctx, &rules::SEMICOLON)?;
        trivia(ctx);
        Ok(ConditionBranch { when, then })
    })
    .map(|parsed| parsed.value)
}

/// `true`, `false` or `null`
fn constant(ctx: &mut ParseContext) -> Outcome<Scalar> {
    let Some(token) = ctx.peek().cloned() else {
        return Outcome::Skip;
    };
    ctx.next();
    let range = token_range(&token);
    let scalar = match token.value.as_str() {
        "true" => Scalar::new(builtin_types::BOOLEAN, ScalarValue::Boolean(true), range),
        "false" => Scalar::new(builtin_types::BOOLEAN, ScalarValue::Boolean(false), range),
        _ => Scalar::new(builtin_types::NULL, ScalarValue::Null, range),
    };
    Outcome::Success(scalar)
}

fn string_literal(ctx: &mut ParseContext) -> Outcome<Scalar> {
    Outcome::from(token(ctx, &rules::STRING_LITERAL)).map(|literal| {
        Scalar::new(
            builtin_types::STRING,
            ScalarValue::String(literal.value.clone()),
            token_range(&literal),
        )
    })
}

fn number_literal(ctx: &mut ParseContext) -> Outcome<Scalar> {
    Outcome::from(token(ctx, &rules::NUMBER_LITERAL).and_then(|literal| {
        let value = literal.number().ok_or(Failed)?;
        Ok(Scalar::new(
            builtin_types::NUMBER,
            ScalarValue::Number(value),
            token_range(&literal),
        ))
    }))
}

fn sub_expression(ctx: &mut ParseContext) -> Outcome<Expression> {
    sequence(ctx, Some(&rules::PAREN_CLOSE), |ctx| {
        token(ctx, &rules::PAREN_OPEN)?;
        trivia(ctx);
        let inner = expression(ctx).required()?;
        trivia(ctx);
        Ok(inner)
    })
    .map(|parsed| parsed.value)
}

/// `[a, b, c]`
pub fn value_list(ctx: &mut ParseContext) -> Outcome<ValueList> {
    block(ctx, &rules::BRACKET_OPEN, Some(&rules::BRACKET_CLOSE), |ctx| {
        list(ctx, &rules::COMMA, list_element).required()
    })
    .map(|Parsed { value, range }| ValueList {
        elements: value.into_iter().flatten().collect(),
        range,
    })
}

fn list_element(ctx: &mut ParseContext) -> Outcome<Option<Expression>> {
    let end = |_: &mut ParseContext| Outcome::Success(None);
    let element = |ctx: &mut ParseContext| expression(ctx).map(Some);

    sequence(ctx, None, |ctx| {
        trivia(ctx);
        let value = one_of(
            ctx,
            &[
                Alt::hidden(&rules::BRACKET_CLOSE, &end),
                Alt::new(&rules::ANY, &element),
            ],
            true,
        )
        .optional()?;
        trivia(ctx);
        Ok(value.flatten())
    })
    .map(|parsed| parsed.value)
}

/// `{ key: value, ... }`
pub fn value_struct(ctx: &mut ParseContext) -> Outcome<ValueStruct> {
    let parsed = block(ctx, &rules::BRACE_OPEN, Some(&rules::BRACE_CLOSE), |ctx| {
        trivia(ctx);
        let entries = starts_with(ctx, &rules::IDENTIFIER, true, |ctx| {
            list(ctx, &rules::COMMA, struct_entry).required()
        })
        .optional()?;
        Ok(entries.map(|parsed| parsed.value).unwrap_or_default())
    });

    let Parsed {
        value: entries,
        range,
    } = match parsed {
        Outcome::Success(parsed) => parsed,
        Outcome::Skip => return Outcome::Skip,
        Outcome::Fail => return Outcome::Fail,
    };

    let mut props = IndexMap::new();
    let mut prop_ranges = IndexMap::new();
    for Parsed {
        value: (key, key_range, value),
        range: entry_range,
    } in entries
    {
        if props.contains_key(&key) {
            ctx.error(
                ErrorCode::DuplicateIdentifier,
                format!("Property '{key}' is already defined."),
                Some(key_range),
            );
            continue;
        }
        prop_ranges.insert(key.clone(), entry_range);
        props.insert(key, value);
    }

    Outcome::Success(ValueStruct {
        props,
        prop_ranges,
        range,
    })
}

fn struct_entry(ctx: &mut ParseContext) -> Outcome<Parsed<(String, Range, Expression)>> {
    sequence(ctx, None, |ctx| {
        trivia(ctx);
        let key = token(ctx, &rules::IDENTIFIER)?;
        ws(ctx);
        token(ctx, &rules::COLON)?;
        trivia(ctx);
        let value = expression(ctx).required()?;
        trivia(ctx);
        Ok((key.value.clone(), token_range(&key), value))
    })
}

/// `$ns.term(args)$`
pub fn ref_translation(ctx: &mut ParseContext) -> Outcome<RefTranslation> {
    block(ctx, &rules::DOLLAR, Some(&rules::DOLLAR), |ctx| {
        let id = ns_identifier(ctx)?;
        ws(ctx);
        let args = call_arguments(ctx).optional()?.unwrap_or_default();
        Ok((id, args))
    })
    .map(|Parsed { value: (id, args), range }| {
        let (namespace, namespace_ranges, name, name_range) = id.split();
        RefTranslation {
            namespace,
            name,
            args,
            range,
            namespace_ranges,
            name_range,
        }
    })
}

/// A reference, optionally followed by type parameters and call arguments.
pub fn ref_or_call(ctx: &mut ParseContext) -> Outcome<Expression> {
    let attribute = |ctx: &mut ParseContext| attribute(ctx);
    let variable = |ctx: &mut ParseContext| ref_variable(ctx);

    let parsed = sequence(ctx, None, |ctx| {
        let target = expect_one_of(
            ctx,
            &[
                Alt::new(&rules::ATTRIBUTE, &attribute),
                Alt::new(&rules::IDENTIFIER, &variable),
            ],
            true,
        )
        .required()?;
        ws(ctx);
        let type_params = try_parse(ctx, type_parameters).optional()?;
        ws(ctx);
        let args = starts_with(ctx, &rules::PAREN_OPEN, true, |ctx| {
            call_arguments(ctx).required()
        })
        .optional()?;
        Ok((target, type_params, args.map(|parsed| parsed.value)))
    });

    match parsed {
        Outcome::Success(Parsed {
            value: (target, type_params, Some(args)),
            range,
        }) => Outcome::Success(Expression::Call(Call {
            callee: Box::new(target),
            type_params: type_params.unwrap_or_default(),
            args,
            range,
        })),
        Outcome::Success(Parsed {
            value: (_, Some(_), None),
            range,
        }) => {
            ctx.error(
                ErrorCode::InvalidSyntax,
                "Type parameters are allowed only for calls.",
                Some(range),
            );
            Outcome::Fail
        }
        Outcome::Success(Parsed {
            value: (target, None, None),
            ..
        }) => Outcome::Success(target),
        Outcome::Skip => Outcome::Skip,
        Outcome::Fail => Outcome::Fail,
    }
}

/// `@name` with an optional accessor chain
pub fn attribute(ctx: &mut ParseContext) -> Outcome<Expression> {
    sequence(ctx, None, |ctx| {
        let at = token(ctx, &rules::ATTRIBUTE)?;
        let name = token(ctx, &rules::IDENTIFIER)?;
        let name_range = token_range(&name);
        let base = Expression::RefParam(RefParam {
            name: name.value.clone(),
            range: token_range(&at).to(&name_range),
            name_range,
        });
        let accessors = accessors(ctx)?;
        Ok(accessors.into_iter().fold(base, |target, accessor| accessor.apply(target)))
    })
    .map(|parsed| parsed.value)
}

/// Identifier with an optional accessor chain
pub fn ref_variable(ctx: &mut ParseContext) -> Outcome<Expression> {
    sequence(ctx, None, |ctx| {
        let name = token(ctx, &rules::IDENTIFIER)?;
        let name_range = token_range(&name);
        let base = Expression::RefVariable(RefVariable {
            name: name.value.clone(),
            range: name_range,
            name_range,
        });
        let accessors = accessors(ctx)?;
        Ok(accessors.into_iter().fold(base, |target, accessor| accessor.apply(target)))
    })
    .map(|parsed| parsed.value)
}

/// `.name`, `[index]` or `#action` after a reference
enum Accessor {
    Property { index: Expression, end: Range },
    Action { id: String, id_range: Range },
}

impl Accessor {
    fn apply(self, target: Expression) -> Expression {
        let start = target.range();
        match self {
            Accessor::Property { index, end } => Expression::RefProperty(RefProperty {
                value: Box::new(target),
                index: Box::new(index),
                range: start.to(&end),
            }),
            Accessor::Action { id, id_range } => Expression::RefAction(RefAction {
                target: Box::new(target),
                id,
                range: start.to(&id_range),
                id_range,
            }),
        }
    }
}

fn accessors(ctx: &mut ParseContext) -> Step<Vec<Accessor>> {
    let dot = |ctx: &mut ParseContext| {
        Outcome::from(token(ctx, &rules::IDENTIFIER).map(|name| {
            let range = token_range(&name);
            Accessor::Property {
                index: Expression::Scalar(Scalar::new(
                    builtin_types::STRING,
                    ScalarValue::String(name.value.clone()),
                    range,
                )),
                end: range,
            }
        }))
    };
    let index = |ctx: &mut ParseContext| {
        sequence(ctx, None, |ctx| {
            trivia(ctx);
            let index = expression(ctx).required()?;
            trivia(ctx);
            let close = token(ctx, &rules::BRACKET_CLOSE)?;
            Ok(Accessor::Property {
                index,
                end: token_range(&close),
            })
        })
        .map(|parsed| parsed.value)
    };
    let action = |ctx: &mut ParseContext| {
        Outcome::from(token(ctx, &rules::IDENTIFIER).map(|name| Accessor::Action {
            id: name.value.clone(),
            id_range: token_range(&name),
        }))
    };

    let mut chain = Vec::new();
    loop {
        let accessor = one_of(
            ctx,
            &[
                Alt::new(&rules::DOT, &dot),
                Alt::new(&rules::BRACKET_OPEN, &index),
                Alt::new(&rules::HASH, &action),
            ],
            false,
        )
        .optional()?;

        match accessor {
            Some(action @ Accessor::Action { .. }) => {
                chain.push(action);
                return Ok(chain);
            }
            Some(property) => chain.push(property),
            None => return Ok(chain),
        }
    }
}

/// `(args)`; `Skip` when no `(` follows.
pub fn call_arguments(ctx: &mut ParseContext) -> Outcome<Vec<CallArgument>> {
    let empty = |_: &mut ParseContext| Outcome::Success(Vec::new());
    let arguments = |ctx: &mut ParseContext| list(ctx, &rules::COMMA, call_argument);

    block(ctx, &rules::PAREN_OPEN, Some(&rules::PAREN_CLOSE), |ctx| {
        trivia(ctx);
        let args = one_of(
            ctx,
            &[
                Alt::hidden(&rules::PAREN_CLOSE, &empty),
                Alt::new(&rules::ANY, &arguments),
            ],
            true,
        )
        .optional()?;
        Ok(args.unwrap_or_default())
    })
    .map(|parsed| parsed.value)
}

/// `~? value` or `name: value`
pub fn call_argument(ctx: &mut ParseContext) -> Outcome<CallArgument> {
    let parsed = sequence(ctx, None, |ctx| {
        trivia(ctx);
        let unpack = opt(ctx, &rules::TILDA);
        let value = expression(ctx).required()?;
        ws(ctx);
        let named = starts_with(ctx, &rules::COLON, false, |ctx| {
            trivia(ctx);
            expression(ctx).required()
        })
        .optional()?;
        trivia(ctx);
        Ok((unpack, value, named.map(|parsed| parsed.value)))
    });

    let Parsed {
        value: (unpack, value, named),
        range,
    } = match parsed {
        Outcome::Success(parsed) => parsed,
        Outcome::Skip => return Outcome::Skip,
        Outcome::Fail => return Outcome::Fail,
    };

    let Some(named) = named else {
        return Outcome::Success(CallArgument {
            id: None,
            value,
            unpack: unpack.is_some(),
            range,
            id_range: None,
        });
    };

    if let Some(tilda) = unpack {
        ctx.error(
            ErrorCode::InvalidSyntax,
            "Unpack operator is allowed only for rest arguments.",
            Some(token_range(&tilda)),
        );
        return Outcome::Fail;
    }

    match value {
        Expression::RefVariable(name) => Outcome::Success(CallArgument {
            id: Some(name.name),
            value: named,
            unpack: false,
            range,
            id_range: Some(name.name_range),
        }),
        other => {
            ctx.error(
                ErrorCode::InvalidSyntax,
                "Expecting identifier.",
                Some(other.range()),
            );
            Outcome::Fail
        }
    }
}

/// `` `text ${expr} \` `` as a `Meta.concat` call
pub fn string_template(ctx: &mut ParseContext) -> Outcome<Call> {
    let constant = |ctx: &mut ParseContext| {
        Outcome::from(token(ctx, &rules::TEMPLATE_CONST)).map(|segment| {
            let range = token_range(&segment);
            let value = Scalar::new(
                builtin_types::STRING,
                ScalarValue::String(segment.value.clone()),
                range,
            );
            CallArgument::named("value", Expression::Scalar(value), range)
        })
    };
    let escape = |ctx: &mut ParseContext| {
        Outcome::from(token(ctx, &rules::TEMPLATE_ESCAPE)).map(|segment| {
            let range = token_range(&segment);
            let escaped = segment.text.chars().skip(1).collect::<String>();
            let value = Scalar::new(builtin_types::STRING, ScalarValue::String(escaped), range);
            CallArgument::named("value", Expression::Scalar(value), range)
        })
    };
    let interpolation = |ctx: &mut ParseContext| {
        block(
            ctx,
            &rules::TEMPLATE_INTERPOLATION,
            Some(&rules::BRACE_CLOSE),
            |ctx| {
                trivia(ctx);
                expression(ctx).required()
            },
        )
        .map(|Parsed { value, range }| CallArgument::named("value", value, range))
    };

    expect_block(
        ctx,
        &rules::TEMPLATE_OPEN,
        Some(&rules::TEMPLATE_CLOSE),
        |ctx| {
            let open = ctx.current_range();
            let segments = repeat(ctx, |ctx| {
                one_of(
                    ctx,
                    &[
                        Alt::new(&rules::TEMPLATE_CONST, &constant),
                        Alt::new(&rules::TEMPLATE_ESCAPE, &escape),
                        Alt::new(&rules::TEMPLATE_INTERPOLATION, &interpolation),
                    ],
                    true,
                )
            })
            .required()?;
            Ok((open, segments))
        },
    )
    .map(|Parsed { value: (open, segments), range }| {
        Call::builtin(schemas::CONCAT, open, segments, range)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metaschema::parsing::context::FlushPolicy;

    fn parse_with(
        source: &str,
        parser: impl FnOnce(&mut ParseContext) -> Outcome<Expression>,
    ) -> (Expression, Vec<String>) {
        let mut ctx = ParseContext::from_source(source, FlushPolicy::Buffered);
        let outcome = parser(&mut ctx);
        let messages = ctx
            .finish()
            .diagnostics
            .into_iter()
            .map(|d| d.message)
            .collect();
        match outcome {
            Outcome::Success(expression) => (expression, messages),
            other => panic!("{source:?} did not parse: {other:?} {messages:?}"),
        }
    }

    fn parse_expr(source: &str) -> Expression {
        let (expression, messages) = parse_with(source, expression);
        assert!(messages.is_empty(), "{source:?}: {messages:?}");
        expression
    }

    fn callee_name(call: &Call) -> String {
        match call.callee.as_ref() {
            Expression::RefSchema(schema) => {
                let mut parts = schema.namespace.clone();
                parts.push(schema.name.clone());
                parts.join(".")
            }
            Expression::RefVariable(variable) => variable.name.clone(),
            other => other.kind().to_string(),
        }
    }

    fn as_call(expression: &Expression) -> &Call {
        match expression {
            Expression::Call(call) => call,
            other => panic!("expected a call, got {}", other.kind()),
        }
    }

    #[test]
    fn test_scalars() {
        let Expression::Scalar(number) = parse_expr("42.5") else {
            panic!("expected a scalar");
        };
        assert_eq!(number.value, ScalarValue::Number(42.5));
        assert_eq!(number.type_ref.qualified_name(), "Meta.Number");

        let Expression::Scalar(string) = parse_expr("\"hello\"") else {
            panic!("expected a scalar");
        };
        assert_eq!(string.value, ScalarValue::String("hello".to_string()));
        assert_eq!(string.range, Range::at(1, 1, 1, 8));

        let Expression::Scalar(null) = parse_expr("null") else {
            panic!("expected a scalar");
        };
        assert_eq!(null.type_ref.qualified_name(), "Meta.Null");
    }

    #[test]
    fn test_binary_operator_desugars_to_call() {
        let expression = parse_expr("a < 1");
        let call = as_call(&expression);
        assert_eq!(callee_name(call), "Meta.Compare.lt");
        assert_eq!(call.args[0].id.as_deref(), Some("left"));
        assert_eq!(call.args[1].id.as_deref(), Some("right"));
        assert_eq!(call.range, Range::at(1, 1, 1, 6));
        assert_eq!(call.callee.range(), Range::at(1, 3, 1, 4));
    }

    #[test]
    fn test_operators_are_right_associative() {
        let expression = parse_expr("a * b + c");
        let outer = as_call(&expression);
        assert_eq!(callee_name(outer), "Meta.Arithmetic.multiply");
        let inner = as_call(&outer.args[1].value);
        assert_eq!(callee_name(inner), "Meta.Arithmetic.sum");
        assert_eq!(inner.range, Range::at(1, 5, 1, 10));
    }

    #[test]
    fn test_word_operators() {
        let expression = parse_expr("a and not b");
        let call = as_call(&expression);
        assert_eq!(callee_name(call), "Meta.Logic.and");
        let negated = as_call(&call.args[1].value);
        assert_eq!(callee_name(negated), "Meta.Logic.not");
        assert_eq!(negated.args[0].id.as_deref(), Some("value"));
    }

    #[test]
    fn test_inline_conditions() {
        let Expression::Condition(condition) = parse_expr("a then 1 else 2") else {
            panic!("expected a condition");
        };
        assert_eq!(condition.branches.len(), 1);
        assert!(condition.default.is_some());
        assert_eq!(condition.range, Range::at(1, 1, 1, 16));

        let Expression::Condition(ternary) = parse_expr("a ? 1") else {
            panic!("expected a condition");
        };
        assert!(ternary.default.is_none());
    }

    #[test]
    fn test_type_guard() {
        let Expression::ConditionType(guard) = parse_expr("value is <String>") else {
            panic!("expected a type guard");
        };
        assert_eq!(guard.type_expr.as_type_ref().unwrap().name, "String");
        assert_eq!(guard.range, Range::at(1, 1, 1, 18));

        let expression = parse_expr("value is !<String>");
        let call = as_call(&expression);
        assert_eq!(callee_name(call), "Meta.Logic.not");
        assert!(matches!(call.args[0].value, Expression::ConditionType(_)));
    }

    #[test]
    fn test_comparison_is_not_taken_for_type_parameters() {
        let expression = parse_expr("x < y");
        assert_eq!(callee_name(as_call(&expression)), "Meta.Compare.lt");
    }

    #[test]
    fn test_call_with_type_parameters() {
        let expression = parse_expr("convert<String>(value)");
        let call = as_call(&expression);
        assert_eq!(callee_name(call), "convert");
        assert_eq!(call.type_params.len(), 1);
        assert_eq!(call.args.len(), 1);
    }

    #[test]
    fn test_type_parameters_require_a_call() {
        let mut ctx = ParseContext::from_source("convert<String>;", FlushPolicy::Buffered);
        assert!(ref_or_call(&mut ctx).is_fail());
        let diagnostics = ctx.finish().diagnostics;
        assert_eq!(diagnostics[0].message, "Type parameters are allowed only for calls.");
        assert_eq!(diagnostics[0].name, ErrorCode::InvalidSyntax);
    }

    #[test]
    fn test_call_arguments() {
        let mut ctx = ParseContext::from_source("(arg1: var1, ~rest, 42.5)", FlushPolicy::Buffered);
        let args = call_arguments(&mut ctx).ok().unwrap();
        assert!(ctx.finish().diagnostics.is_empty());

        assert_eq!(args.len(), 3);
        assert_eq!(args[0].id.as_deref(), Some("arg1"));
        assert_eq!(args[0].range, Range::at(1, 2, 1, 12));
        assert_eq!(args[0].id_range, Some(Range::at(1, 2, 1, 6)));
        assert!(matches!(&args[0].value, Expression::RefVariable(v) if v.name == "var1"));
        assert!(args[1].unpack);
        assert_eq!(args[1].range, Range::at(1, 14, 1, 19));
        assert_eq!(args[2].range, Range::at(1, 21, 1, 25));
    }

    #[test]
    fn test_named_argument_cannot_be_unpacked() {
        let mut ctx = ParseContext::from_source("(~a: b)", FlushPolicy::Buffered);
        assert!(call_arguments(&mut ctx).is_fail());
        let diagnostics = ctx.finish().diagnostics;
        assert_eq!(
            diagnostics[0].message,
            "Unpack operator is allowed only for rest arguments."
        );
    }

    #[test]
    fn test_named_argument_needs_identifier() {
        let mut ctx = ParseContext::from_source("(a.b: c)", FlushPolicy::Buffered);
        assert!(call_arguments(&mut ctx).is_fail());
        let diagnostics = ctx.finish().diagnostics;
        assert_eq!(diagnostics[0].message, "Expecting identifier.");
        assert_eq!(diagnostics[0].range, Range::at(1, 2, 1, 5));
    }

    #[test]
    fn test_empty_call_arguments() {
        let mut ctx = ParseContext::from_source("()", FlushPolicy::Buffered);
        assert_eq!(call_arguments(&mut ctx), Outcome::Success(Vec::new()));
    }

    #[test]
    fn test_accessor_chain() {
        let Expression::RefAction(action) = parse_expr("@item.list[0]#run") else {
            panic!("expected an action reference");
        };
        assert_eq!(action.id, "run");
        assert_eq!(action.range, Range::at(1, 1, 1, 18));

        let Expression::RefProperty(index) = action.target.as_ref() else {
            panic!("expected an index access");
        };
        assert_eq!(index.range, Range::at(1, 1, 1, 14));
        let Expression::RefProperty(dot) = index.value.as_ref() else {
            panic!("expected a property access");
        };
        assert!(matches!(dot.index.as_ref(), Expression::Scalar(s) if s.value == ScalarValue::String("list".into())));
        let Expression::RefParam(param) = dot.value.as_ref() else {
            panic!("expected a param reference");
        };
        assert_eq!(param.name, "item");
        assert_eq!(param.range, Range::at(1, 1, 1, 6));
        assert_eq!(param.name_range, Range::at(1, 2, 1, 6));
    }

    #[test]
    fn test_list_and_struct() {
        let Expression::List(list) = parse_expr("[1, \"two\", [3]]") else {
            panic!("expected a list");
        };
        assert_eq!(list.elements.len(), 3);
        assert!(matches!(list.elements[2], Expression::List(_)));

        let Expression::List(empty) = parse_expr("[]") else {
            panic!("expected a list");
        };
        assert!(empty.elements.is_empty());

        let Expression::Struct(structure) = parse_expr("{ a: 1, b: x + 1 }") else {
            panic!("expected a struct");
        };
        assert_eq!(structure.props.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(structure.prop_ranges["b"], Range::at(1, 9, 1, 17));
    }

    #[test]
    fn test_struct_duplicate_key() {
        let (expression, messages) = parse_with("{ a: 1, a: 2 }", expression);
        assert_eq!(messages, vec!["Property 'a' is already defined."]);
        let Expression::Struct(structure) = expression else {
            panic!("expected a struct");
        };
        assert_eq!(structure.props.len(), 1);
        assert!(matches!(&structure.props["a"], Expression::Scalar(s) if s.value == ScalarValue::Number(1.0)));
    }

    #[test]
    fn test_lambda() {
        let Expression::Lambda(lambda) = parse_expr("fn (a: Number) => a * 2") else {
            panic!("expected a lambda");
        };
        assert_eq!(lambda.params.len(), 1);
        assert_eq!(lambda.params[0].id, "a");
        assert!(matches!(lambda.body.as_ref(), Expression::Call(_)));
    }

    #[test]
    fn test_when() {
        let source = "when {\n\t(a > 1) => \"big\";\n\t(true) => \"small\";\n}";
        let Expression::Condition(condition) = parse_expr(source) else {
            panic!("expected a condition");
        };
        assert_eq!(condition.branches.len(), 2);
        assert_eq!(condition.range, Range::at(1, 1, 4, 2));
    }

    #[test]
    fn test_translation_reference() {
        let Expression::RefTranslation(translation) = parse_expr("$Texts.greeting(name: n)$") else {
            panic!("expected a translation reference");
        };
        assert_eq!(translation.namespace, vec!["Texts"]);
        assert_eq!(translation.name, "greeting");
        assert_eq!(translation.args.len(), 1);
        assert_eq!(translation.range, Range::at(1, 1, 1, 26));
    }

    #[test]
    fn test_string_template() {
        let expression = parse_expr("`Hello, \\`${name}\\` \\${name}!`");
        let call = as_call(&expression);
        assert_eq!(callee_name(call), "Meta.concat");

        let values = call
            .args
            .iter()
            .map(|arg| match &arg.value {
                Expression::Scalar(Scalar {
                    value: ScalarValue::String(s),
                    ..
                }) => s.clone(),
                Expression::RefVariable(v) => format!("{{{}}}", v.name),
                other => other.kind().to_string(),
            })
            .collect::<Vec<_>>();
        assert_eq!(values, vec!["Hello, ", "`", "{name}", "`", " ", "$", "{name}!"]);
    }

    #[test]
    fn test_unknown_operand() {
        let mut ctx = ParseContext::from_source(";", FlushPolicy::Buffered);
        assert!(expression(&mut ctx).is_fail());
        let message = &ctx.finish().diagnostics[0].message;
        assert!(message.starts_with("Expecting one of not | fn | when | true"));
        assert!(message.ends_with(", got 'semicolon'."));
    }
}
