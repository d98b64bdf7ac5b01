// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Emit routines for expressions, identifier references and function
//! invocations.

use crate::ast::{Argument, AstNode, FunctionInvocation, IdentGroup};
use crate::context::TypeCategory;
use crate::syntax::{SyntaxElement, SyntaxKind, SyntaxNode};
use crate::transpile::TransformError;

use super::{emit_children, plain_ident_group, rewrite_token, Emitter};

pub(crate) fn emit_expression(
    e: &mut Emitter,
    node: &SyntaxNode,
) -> Result<String, TransformError> {
    emit_children(e, node)
}

/// Emits an identifier group, applying reference rewrites:
///
/// * `SYSDATE` / `SYSTIMESTAMP` become `CURRENT_TIMESTAMP`
/// * reads of package variables become accessor calls
/// * anything else is passed through lowercased
pub(crate) fn emit_ident_group(
    e: &mut Emitter,
    node: &SyntaxNode,
) -> Result<String, TransformError> {
    let group = IdentGroup::cast(node.clone())
        .ok_or_else(|| TransformError::internal("expected an identifier group"))?;

    if group.is_bind_var() {
        // `:NEW.col` correlations survive as written; the trigger rewriter
        // post-processes them.
        return Ok(node.text().to_string());
    }

    let parts = group.parts();

    match parts.as_slice() {
        [name] if name == "sysdate" || name == "systimestamp" => {
            Ok("CURRENT_TIMESTAMP".to_string())
        }
        [name] => {
            if let Some((schema, package, _)) = e.package_variable(None, name) {
                return Ok(format!("{schema}.{package}__get_{name}()"));
            }

            Ok(plain_ident_group(node))
        }
        [qualifier, name] => {
            if let Some((schema, package, _)) =
                e.package_variable(Some(qualifier.as_str()), name)
            {
                return Ok(format!("{schema}.{package}__get_{name}()"));
            }

            Ok(plain_ident_group(node))
        }
        _ => Ok(plain_ident_group(node)),
    }
}

/// Emits a function invocation, lowering Oracle built-ins and flattening
/// package functions and object-type methods.
pub(crate) fn emit_function_invocation(
    e: &mut Emitter,
    node: &SyntaxNode,
) -> Result<String, TransformError> {
    let invocation = FunctionInvocation::cast(node.clone())
        .ok_or_else(|| TransformError::internal("expected a function invocation"))?;
    let parts = invocation.name_parts();
    let args = invocation.arguments();

    if let [name] = parts.as_slice() {
        match name.as_str() {
            "nvl" => return emit_coalesce(e, &args),
            "nvl2" => return emit_nvl2(e, &args),
            "decode" => return emit_decode(e, &args),
            "instr" => return emit_instr(e, &args),
            "to_number" => return emit_to_number(e, &args),
            "trunc" => return emit_trunc(e, &args),
            "sys_connect_by_path" => {
                return Err(TransformError::UnsupportedConstruct {
                    construct: "SYS_CONNECT_BY_PATH outside CONNECT BY".to_string(),
                    sql: node.text().to_string(),
                })
            }
            _ => {}
        }
    }

    let arg_list = emit_arguments(e, &args)?;

    match parts.as_slice() {
        [name] => {
            // Calls to routines of the package currently being transformed
            // flatten like external package calls.
            if let Some(env) = e.package.as_ref().filter(|env| env.routines.contains(name)) {
                return Ok(format!("{}.{}__{name}({arg_list})", env.schema, env.name));
            }

            Ok(format!("{name}({arg_list})"))
        }
        [qualifier, name] => {
            let package_fn = e.meta.package_function(&e.schema, qualifier, name);
            let static_method = e
                .meta
                .type_method(&e.schema, qualifier, name)
                .filter(|m| !m.is_member);

            match (package_fn, static_method) {
                (Some(_), Some(_)) => Err(TransformError::AmbiguousReference {
                    name: format!("{qualifier}.{name}"),
                    sql: node.text().to_string(),
                }),
                (Some(_), None) => Ok(format!(
                    "{}.{qualifier}__{name}({arg_list})",
                    e.schema
                )),
                (None, Some(method)) => Ok(format!(
                    "{}.{}__{}({arg_list})",
                    method.schema, method.type_name, method.method
                )),
                (None, None) => emit_receiver_method(e, node, qualifier, name, &arg_list),
            }
        }
        [schema, package, name] => {
            if e.meta.package_function(schema, package, name).is_some() {
                Ok(format!("{schema}.{package}__{name}({arg_list})"))
            } else {
                // A qualified standalone function; passes through.
                Ok(format!("{schema}.{package}.{name}({arg_list})"))
            }
        }
        _ => emit_children(e, node),
    }
}

/// Resolves `var.method(args)` where `var` is a declared variable or
/// column of an object type.
fn emit_receiver_method(
    e: &mut Emitter,
    node: &SyntaxNode,
    receiver: &str,
    method: &str,
    arg_list: &str,
) -> Result<String, TransformError> {
    let receiver_type = e
        .routine
        .var_types
        .get(receiver)
        .map(|t| base_type_name(t))
        .or_else(|| receiver_column_type(e, receiver));

    if let Some(type_name) = receiver_type {
        if let Some(found) = e.meta.type_method(&e.schema, &type_name, method) {
            let sep = if arg_list.is_empty() { "" } else { ", " };
            return Ok(format!(
                "{}.{}__{}({receiver}{sep}{arg_list})",
                found.schema, found.type_name, found.method
            ));
        }

        // The receiver is typed with a user-defined type, so this rewrite
        // genuinely needs the method record.
        if !e.meta.methods_of_type(&e.schema, &type_name).is_empty() {
            return Err(TransformError::MetadataMissing {
                name: format!("{type_name}.{method}"),
                sql: node.text().to_string(),
            });
        }
    }

    // No resolution required; pass the call through unchanged.
    Ok(format!("{receiver}.{method}({arg_list})"))
}

/// Looks up the Oracle datatype of `receiver` as a column of a registered
/// FROM table.
fn receiver_column_type(e: &Emitter, receiver: &str) -> Option<String> {
    let frame = e.stack.top()?;

    for table in frame.outer_join.tables.values() {
        let schema = table.schema.as_deref().unwrap_or(&e.schema);
        if let Some(column) = e.meta.table_column(schema, &table.table, receiver) {
            return Some(base_type_name(&column.datatype));
        }
    }

    None
}

/// Strips precision arguments from a datatype: `address_t` from
/// `address_t`, `number` from `NUMBER(10)`.
fn base_type_name(datatype: &str) -> String {
    datatype
        .split('(')
        .next()
        .unwrap_or(datatype)
        .trim()
        .to_lowercase()
}

pub(crate) fn emit_argument(e: &mut Emitter, arg: &Argument) -> Result<String, TransformError> {
    let mut out = String::new();

    for element in arg.syntax().children_with_tokens() {
        match element {
            SyntaxElement::Token(token) => out.push_str(&rewrite_token(&token)),
            SyntaxElement::Node(node) => out.push_str(&e.emit(&node)?),
        }
    }

    Ok(out.trim().to_string())
}

pub(crate) fn emit_arguments(
    e: &mut Emitter,
    args: &[Argument],
) -> Result<String, TransformError> {
    Ok(args
        .iter()
        .map(|arg| emit_argument(e, arg))
        .collect::<Result<Vec<_>, _>>()?
        .join(", "))
}

/// `NVL(a, b)` becomes `COALESCE(a, b)`; the arity is preserved and nested
/// invocations transform transitively.
fn emit_coalesce(e: &mut Emitter, args: &[Argument]) -> Result<String, TransformError> {
    Ok(format!("COALESCE({})", emit_arguments(e, args)?))
}

/// `NVL2(a, b, c)` becomes `CASE WHEN a IS NOT NULL THEN b ELSE c END`.
fn emit_nvl2(e: &mut Emitter, args: &[Argument]) -> Result<String, TransformError> {
    if args.len() != 3 {
        return Ok(format!("nvl2({})", emit_arguments(e, args)?));
    }

    let a = emit_argument(e, &args[0])?;
    let b = emit_argument(e, &args[1])?;
    let c = emit_argument(e, &args[2])?;
    Ok(format!("CASE WHEN {a} IS NOT NULL THEN {b} ELSE {c} END"))
}

/// `DECODE(e, k1, v1, .., default)` becomes a searched CASE expression.
fn emit_decode(e: &mut Emitter, args: &[Argument]) -> Result<String, TransformError> {
    if args.len() < 3 {
        return Ok(format!("decode({})", emit_arguments(e, args)?));
    }

    let mut out = format!("CASE {}", emit_argument(e, &args[0])?);
    let pairs = &args[1..];

    let mut i = 0;
    while i + 1 < pairs.len() {
        out.push_str(&format!(
            " WHEN {} THEN {}",
            emit_argument(e, &pairs[i])?,
            emit_argument(e, &pairs[i + 1])?
        ));
        i += 2;
    }

    if pairs.len() % 2 == 1 {
        out.push_str(&format!(" ELSE {}", emit_argument(e, &pairs[pairs.len() - 1])?));
    }

    out.push_str(" END");
    Ok(out)
}

/// Two-argument `INSTR(s, p)` becomes `POSITION(p IN s)`; other arities
/// pass through.
fn emit_instr(e: &mut Emitter, args: &[Argument]) -> Result<String, TransformError> {
    if args.len() != 2 {
        return Ok(format!("instr({})", emit_arguments(e, args)?));
    }

    let haystack = emit_argument(e, &args[0])?;
    let needle = emit_argument(e, &args[1])?;
    Ok(format!("POSITION({needle} IN {haystack})"))
}

/// `TO_NUMBER(x)` becomes a cast; multi-argument forms pass through.
fn emit_to_number(e: &mut Emitter, args: &[Argument]) -> Result<String, TransformError> {
    if args.len() != 1 {
        return Ok(format!("to_number({})", emit_arguments(e, args)?));
    }

    let value = emit_argument(e, &args[0])?;
    if is_simple_operand(&args[0]) {
        Ok(format!("{value}::NUMERIC"))
    } else {
        Ok(format!("({value})::NUMERIC"))
    }
}

/// Type-directed `TRUNC`: on DATE/TIMESTAMP operands it becomes
/// `DATE_TRUNC('day', x)::DATE`, otherwise it stays a function call.
fn emit_trunc(e: &mut Emitter, args: &[Argument]) -> Result<String, TransformError> {
    if args.len() == 1 {
        if let Some(node) = args[0].node() {
            let category = e.cached_type(&node).map(|t| t.category);
            if matches!(
                category,
                Some(TypeCategory::Date) | Some(TypeCategory::Timestamp)
            ) {
                let value = emit_argument(e, &args[0])?;
                return Ok(format!("DATE_TRUNC('day', {value})::DATE"));
            }
        }
    }

    Ok(format!("trunc({})", emit_arguments(e, args)?))
}

/// Whether the argument is a single primary that casts cleanly without
/// extra parentheses.
fn is_simple_operand(arg: &Argument) -> bool {
    let nodes = arg.syntax().children().count();
    let significant_tokens = arg
        .syntax()
        .children_with_tokens()
        .filter_map(|it| it.into_token())
        .filter(|t| {
            !matches!(
                t.kind(),
                SyntaxKind::Whitespace | SyntaxKind::Comment
            )
        })
        .count();

    match (nodes, significant_tokens) {
        // A lone literal token.
        (0, 1) => true,
        // A lone identifier group or invocation.
        (1, 0) => matches!(
            arg.syntax().children().next().map(|n| n.kind()),
            Some(SyntaxKind::IdentGroup) | Some(SyntaxKind::FunctionInvocation)
        ),
        _ => false,
    }
}
