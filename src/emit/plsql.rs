// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Emit routines for PL/SQL functions, procedures, blocks and statements.

use crate::ast::{
    AssignmentStmt, AstNode, Block, CursorDecl, Function, IdentGroup, Param, Procedure,
};
use crate::syntax::{SyntaxElement, SyntaxKind, SyntaxNode};
use crate::transpile::TransformError;

use super::{emit_children, emit_elements, plain_ident_group, rewrite_token, Emitter};

/// Emits a `CREATE OR REPLACE FUNCTION` DDL in PL/pgSQL shape.
pub(crate) fn emit_function(e: &mut Emitter, node: &SyntaxNode) -> Result<String, TransformError> {
    let function = Function::cast(node.clone())
        .ok_or_else(|| TransformError::internal("expected a function"))?;

    let name = routine_name(e, function.header().and_then(|h| h.ident_group()))?;
    let params = emit_params(
        e,
        function.param_list().map(|p| p.params()).unwrap_or_default(),
    )?;
    let returns = match function.return_type() {
        Some(datatype) => emit_datatype(e, datatype.syntax())?,
        None => "void".to_string(),
    };

    let block = function
        .block()
        .ok_or_else(|| TransformError::internal("function without a body"))?;
    let body = emit_block(e, block.syntax())?;

    Ok(format!(
        "CREATE OR REPLACE FUNCTION {name}({params}) RETURNS {returns} AS $$\n{body}\n$$ LANGUAGE plpgsql;"
    ))
}

/// Emits a procedure as a `void`-returning function.
pub(crate) fn emit_procedure(e: &mut Emitter, node: &SyntaxNode) -> Result<String, TransformError> {
    let procedure = Procedure::cast(node.clone())
        .ok_or_else(|| TransformError::internal("expected a procedure"))?;

    let name = routine_name(e, procedure.header().and_then(|h| h.ident_group()))?;
    let params = emit_params(
        e,
        procedure
            .param_list()
            .map(|p| p.params())
            .unwrap_or_default(),
    )?;

    let block = procedure
        .block()
        .ok_or_else(|| TransformError::internal("procedure without a body"))?;
    let body = emit_block(e, block.syntax())?;

    Ok(format!(
        "CREATE OR REPLACE FUNCTION {name}({params}) RETURNS void AS $$\n{body}\n$$ LANGUAGE plpgsql;"
    ))
}

/// The emitted routine name: an explicit override from a rewriter, or the
/// source name qualified with the current schema.
fn routine_name(
    e: &Emitter,
    ident_group: Option<IdentGroup>,
) -> Result<String, TransformError> {
    if let Some(rename) = &e.routine.rename_to {
        return Ok(rename.clone());
    }

    let group =
        ident_group.ok_or_else(|| TransformError::internal("routine without a name"))?;
    let parts = group.parts();

    match parts.as_slice() {
        [name] => Ok(format!("{}.{name}", e.schema)),
        _ => Ok(parts.join(".")),
    }
}

fn emit_params(e: &mut Emitter, params: Vec<Param>) -> Result<String, TransformError> {
    let mut rendered = Vec::new();

    if let Some(extra) = e.routine.extra_first_param.clone() {
        if let Some((name, datatype)) = extra.split_once(' ') {
            e.routine.locals.insert(name.to_string());
            e.routine
                .var_types
                .insert(name.to_string(), datatype.to_string());
        }
        rendered.push(extra);
    }

    for param in params {
        rendered.push(emit_param(e, &param)?);
    }

    Ok(rendered.join(", "))
}

fn emit_param(e: &mut Emitter, param: &Param) -> Result<String, TransformError> {
    let name = param
        .name()
        .ok_or_else(|| TransformError::internal("parameter without a name"))?;

    let has_in = param
        .syntax()
        .children_with_tokens()
        .filter_map(|it| it.into_token())
        .any(|t| t.kind() == SyntaxKind::Keyword && t.text().eq_ignore_ascii_case("in"));
    let mode = match (has_in, param.is_out()) {
        (true, true) => "INOUT ",
        (false, true) => "OUT ",
        _ => "",
    };

    let datatype = match param.datatype() {
        Some(datatype) => {
            e.routine
                .var_types
                .insert(name.clone(), datatype.text());
            emit_datatype(e, datatype.syntax())?
        }
        None => "text".to_string(),
    };
    e.routine.locals.insert(name.clone());

    let mut out = format!("{mode}{name} {datatype}");

    let default = default_elements(param.syntax());
    if !default.is_empty() {
        out.push_str(" DEFAULT ");
        out.push_str(emit_elements(e, &default)?.trim());
    }

    Ok(out)
}

/// Collects the elements following `:=` or `DEFAULT`, up to a closing
/// semicolon.
fn default_elements(node: &SyntaxNode) -> Vec<SyntaxElement> {
    let mut after_assign = false;
    let mut elements = Vec::new();

    for element in node.children_with_tokens() {
        match &element {
            SyntaxElement::Token(t)
                if t.kind() == SyntaxKind::Assign
                    || (t.kind() == SyntaxKind::Keyword
                        && t.text().eq_ignore_ascii_case("default")) =>
            {
                after_assign = true;
                continue;
            }
            SyntaxElement::Token(t) if t.kind() == SyntaxKind::Semicolon => break,
            _ => {}
        }

        if after_assign {
            elements.push(element);
        }
    }

    elements
}

/// Emits a PL/SQL block in PL/pgSQL shape: an explicit `DECLARE` section
/// when declarations survive, the `BEGIN .. END;` frame with the end label
/// dropped, and every statement dispatched.
pub(crate) fn emit_block(e: &mut Emitter, node: &SyntaxNode) -> Result<String, TransformError> {
    let block = Block::cast(node.clone())
        .ok_or_else(|| TransformError::internal("expected a block"))?;

    let mut out = String::new();

    if let Some(declare_section) = block.declare_section() {
        let decls = emit_declare_section(e, declare_section.syntax())?;
        if !decls.trim().is_empty() {
            out.push_str("DECLARE\n");
            out.push_str(decls.trim_end());
            out.push('\n');
        }
    }

    let mut after_end = false;
    for element in node.children_with_tokens() {
        match element {
            SyntaxElement::Token(token) => match token.kind() {
                SyntaxKind::Keyword if token.text().eq_ignore_ascii_case("declare") => {}
                SyntaxKind::Keyword if token.text().eq_ignore_ascii_case("end") => {
                    after_end = true;
                    out.push_str(&rewrite_token(&token));
                }
                // The optional label after `END` is dropped, along with the
                // whitespace that separated it.
                SyntaxKind::Ident if after_end => {}
                SyntaxKind::Whitespace if after_end => {}
                _ => out.push_str(&rewrite_token(&token)),
            },
            SyntaxElement::Node(child) => {
                if child.kind() == SyntaxKind::DeclareSection {
                    continue;
                }
                out.push_str(&e.emit(&child)?);
            }
        }
    }

    Ok(out.trim().to_string())
}

/// Emits the declarations of a declare section.
///
/// PL/pgSQL has no local `TYPE` declarations; those are dropped with a
/// warning. Cursor declarations are rewritten to `CURSOR FOR` form.
fn emit_declare_section(e: &mut Emitter, node: &SyntaxNode) -> Result<String, TransformError> {
    let mut out = String::new();

    for element in node.children_with_tokens() {
        match element {
            SyntaxElement::Token(token) => out.push_str(&rewrite_token(&token)),
            SyntaxElement::Node(child) => match child.kind() {
                SyntaxKind::TypeDecl => {
                    log::warn!(
                        "dropping local type declaration without PL/pgSQL counterpart: {}",
                        child.text()
                    );
                }
                SyntaxKind::VariableDecl => {
                    register_local(e, &child);
                    out.push_str(&emit_children(e, &child)?);
                }
                _ => out.push_str(&e.emit(&child)?),
            },
        }
    }

    Ok(out)
}

fn register_local(e: &mut Emitter, node: &SyntaxNode) {
    let Some(decl) = crate::ast::VariableDecl::cast(node.clone()) else {
        return;
    };

    if let Some(name) = decl.name() {
        if let Some(datatype) = decl.datatype() {
            e.routine.var_types.insert(name.clone(), datatype.text());
        }
        e.routine.locals.insert(name);
    }
}

/// Emits a single block statement, lowering call statements to `PERFORM`.
pub(crate) fn emit_block_statement(
    e: &mut Emitter,
    node: &SyntaxNode,
) -> Result<String, TransformError> {
    let mut out = String::new();

    for element in node.children_with_tokens() {
        match element {
            SyntaxElement::Token(token) => out.push_str(&rewrite_token(&token)),
            SyntaxElement::Node(child) => match child.kind() {
                SyntaxKind::FunctionInvocation => out.push_str(&emit_call(e, &child)?),
                SyntaxKind::IdentGroup => out.push_str(&emit_bare_call(e, &child)?),
                _ => out.push_str(&e.emit(&child)?),
            },
        }
    }

    Ok(out)
}

/// Lowers a procedure/function call used as a statement.
///
/// `pkg.proc(args)` flattens to `PERFORM schema.pkg__proc(args)`;
/// `raise_application_error` becomes `RAISE EXCEPTION`. OUT-parameter
/// call sites are rejected.
fn emit_call(e: &mut Emitter, node: &SyntaxNode) -> Result<String, TransformError> {
    let invocation = crate::ast::FunctionInvocation::cast(node.clone())
        .ok_or_else(|| TransformError::internal("expected a function invocation"))?;
    let parts = invocation.name_parts();
    let args = invocation.arguments();

    if parts.as_slice() == ["raise_application_error"] && args.len() >= 2 {
        let code = super::expr::emit_argument(e, &args[0])?;
        let message = super::expr::emit_argument(e, &args[1])?;
        return Ok(format!("RAISE EXCEPTION '% (code %)', {message}, {code}"));
    }

    if let [qualifier, name] = parts.as_slice() {
        if let Some(function) = e.meta.package_function(&e.schema, qualifier, name) {
            if function.has_out_params {
                return Err(TransformError::UnsupportedConstruct {
                    construct: format!("call to '{qualifier}.{name}' with OUT parameters"),
                    sql: node.text().to_string(),
                });
            }
        }
    }

    Ok(format!("PERFORM {}", e.emit(node)?))
}

/// Lowers an argument-less call statement, e.g. `commit_work;`.
fn emit_bare_call(e: &mut Emitter, node: &SyntaxNode) -> Result<String, TransformError> {
    let Some(group) = IdentGroup::cast(node.clone()) else {
        return emit_children(e, node);
    };

    let parts = group.parts();

    match parts.as_slice() {
        [single] if single == "commit" => return Ok("COMMIT".to_string()),
        [single] if single == "rollback" => return Ok("ROLLBACK".to_string()),
        _ => {}
    }

    let target = match parts.as_slice() {
        [name] => match e.package.as_ref().filter(|env| env.routines.contains(name)) {
            Some(env) => format!("{}.{}__{name}", env.schema, env.name),
            None => name.clone(),
        },
        [qualifier, name] => {
            if e.meta.package_function(&e.schema, qualifier, name).is_some() {
                format!("{}.{qualifier}__{name}", e.schema)
            } else {
                parts.join(".")
            }
        }
        _ => parts.join("."),
    };

    Ok(format!("PERFORM {target}()"))
}

/// Emits an assignment, rewriting package-variable writes into setter
/// calls.
pub(crate) fn emit_assignment(
    e: &mut Emitter,
    node: &SyntaxNode,
) -> Result<String, TransformError> {
    let assignment = AssignmentStmt::cast(node.clone())
        .ok_or_else(|| TransformError::internal("expected an assignment"))?;
    let target = assignment
        .target()
        .ok_or_else(|| TransformError::internal("assignment without a target"))?;

    let value = emit_elements(e, &assignment.value_elements())?
        .trim()
        .to_string();

    if !target.is_bind_var() {
        let parts = target.parts();
        let variable = match parts.as_slice() {
            [name] => e.package_variable(None, name).map(|v| (v, name.clone())),
            [qualifier, name] => e
                .package_variable(Some(qualifier.as_str()), name)
                .map(|v| (v, name.clone())),
            _ => None,
        };

        if let Some(((schema, package, record), name)) = variable {
            if record.constant {
                return Err(TransformError::UnsupportedConstruct {
                    construct: format!("assignment to package constant '{package}.{name}'"),
                    sql: node.text().to_string(),
                });
            }

            return Ok(format!(
                "PERFORM {schema}.{package}__set_{name}({value});"
            ));
        }
    }

    let target_text = if target.is_bind_var() {
        target.syntax().text().to_string()
    } else {
        plain_ident_group(target.syntax())
    };

    Ok(format!("{target_text} := {value};"))
}

/// Emits a `RAISE` statement; a named Oracle exception becomes
/// `RAISE EXCEPTION`.
pub(crate) fn emit_raise(_e: &mut Emitter, node: &SyntaxNode) -> Result<String, TransformError> {
    let exception = node.children().find_map(IdentGroup::cast);

    match exception {
        Some(group) => Ok(format!("RAISE EXCEPTION '{}';", group.name())),
        None => Ok("RAISE;".to_string()),
    }
}

/// Emits loop statements; a `FOR r IN (SELECT ..)` loses the parentheses
/// around its query.
pub(crate) fn emit_loop(e: &mut Emitter, node: &SyntaxNode) -> Result<String, TransformError> {
    let mut out = String::new();

    for element in node.children_with_tokens() {
        match element {
            SyntaxElement::Token(token) => out.push_str(&rewrite_token(&token)),
            SyntaxElement::Node(child) => {
                if child.kind() == SyntaxKind::Subquery {
                    let subquery = crate::ast::Subquery::cast(child.clone())
                        .and_then(|s| s.query());
                    match subquery {
                        Some(query) => out.push_str(&e.emit(query.syntax())?),
                        None => out.push_str(&e.emit(&child)?),
                    }
                } else {
                    out.push_str(&e.emit(&child)?);
                }
            }
        }
    }

    Ok(out)
}

/// Emits a cursor declaration in `CURSOR FOR` form.
pub(crate) fn emit_cursor_decl(
    e: &mut Emitter,
    node: &SyntaxNode,
) -> Result<String, TransformError> {
    let decl = CursorDecl::cast(node.clone())
        .ok_or_else(|| TransformError::internal("expected a cursor declaration"))?;

    let name = decl
        .syntax()
        .children_with_tokens()
        .filter_map(|it| it.into_token())
        .find(|t| t.kind() == SyntaxKind::Ident)
        .map(|t| t.text().to_lowercase())
        .ok_or_else(|| TransformError::internal("cursor without a name"))?;

    let query = decl
        .syntax()
        .children()
        .find(|n| n.kind() == SyntaxKind::SelectStmt)
        .ok_or_else(|| TransformError::internal("cursor without a query"))?;
    let query_text = e.emit(&query)?;
    let query_text = query_text.trim_end_matches(';');

    Ok(format!("{name} CURSOR FOR {query_text};"))
}

/// Emits a datatype reference mapped to PostgreSQL.
pub(crate) fn emit_datatype(
    _e: &mut Emitter,
    node: &SyntaxNode,
) -> Result<String, TransformError> {
    Ok(map_oracle_datatype(&node.text().to_string()))
}

/// Maps a raw Oracle datatype string to its PostgreSQL counterpart.
///
/// Anchored `%TYPE`/`%ROWTYPE` references pass through; PostgreSQL
/// understands both.
pub(crate) fn map_oracle_datatype(datatype: &str) -> String {
    let text = datatype.trim();

    if text.contains('%') {
        return text.to_lowercase();
    }

    let precision = text
        .find('(')
        .and_then(|start| text.rfind(')').map(|end| &text[start..=end]));
    let base = text
        .split(['(', ' '])
        .next()
        .unwrap_or(text)
        .to_lowercase();

    let numeric_precision = || {
        precision
            .map(|p| {
                let digits = p
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == ',')
                    .collect::<String>();
                if digits.is_empty() {
                    String::new()
                } else {
                    format!("({digits})")
                }
            })
            .unwrap_or_default()
    };

    match base.as_str() {
        "number" | "numeric" | "decimal" | "dec" => format!("numeric{}", numeric_precision()),
        "varchar2" | "nvarchar2" | "varchar" => {
            let p = numeric_precision();
            if p.is_empty() {
                "text".to_string()
            } else {
                format!("varchar{p}")
            }
        }
        "char" | "nchar" => format!("char{}", numeric_precision()),
        "clob" | "nclob" | "long" => "text".to_string(),
        "blob" | "raw" => "bytea".to_string(),
        "date" => "timestamp".to_string(),
        "pls_integer" | "binary_integer" | "integer" | "int" | "smallint" => {
            "integer".to_string()
        }
        "boolean" => "boolean".to_string(),
        "float" | "binary_double" => "double precision".to_string(),
        "real" | "binary_float" => "real".to_string(),
        _ => text.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn map_common_datatypes() {
        assert_eq!(map_oracle_datatype("NUMBER"), "numeric");
        assert_eq!(map_oracle_datatype("NUMBER(10,2)"), "numeric(10,2)");
        assert_eq!(map_oracle_datatype("VARCHAR2(30)"), "varchar(30)");
        assert_eq!(map_oracle_datatype("VARCHAR2(30 CHAR)"), "varchar(30)");
        assert_eq!(map_oracle_datatype("CLOB"), "text");
        assert_eq!(map_oracle_datatype("DATE"), "timestamp");
        assert_eq!(map_oracle_datatype("PLS_INTEGER"), "integer");
        assert_eq!(map_oracle_datatype("BOOLEAN"), "boolean");
        assert_eq!(
            map_oracle_datatype("emp.sal%TYPE"),
            "emp.sal%type"
        );
    }
}
