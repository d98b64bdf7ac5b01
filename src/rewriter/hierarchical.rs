// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Rewrites `CONNECT BY` hierarchical queries into recursive CTEs.

use crate::ast::{AstNode, ColumnExpr, FunctionInvocation, IdentGroup, SelectStmt};
use crate::emit::{expr::emit_argument, Emitter};
use crate::syntax::{SyntaxKind, SyntaxNode};
use crate::transpile::TransformError;

/// Rewrites one hierarchical query block.
///
/// The anchor member selects the base columns plus `1 AS level` (and the
/// path array when `SYS_CONNECT_BY_PATH` appears); the recursive member
/// joins the table against the CTE using the `CONNECT BY` predicate with
/// `PRIOR x` rewritten to the CTE side.
pub(crate) fn rewrite(e: &mut Emitter, select: &SelectStmt) -> Result<String, TransformError> {
    let sql = select.syntax().text().to_string();

    let hierarchical = select
        .hierarchical_clause()
        .ok_or_else(|| TransformError::internal("missing hierarchical clause"))?;

    if hierarchical.is_nocycle() {
        // No cycle guard is generated; the plain recursive CTE will spin
        // on cyclic data where Oracle pruned.
        log::warn!("NOCYCLE has no direct counterpart; emitting a plain recursive CTE");
    }

    let table = select
        .from_clause()
        .and_then(|from| from.items().first().and_then(|item| item.name()))
        .map(|name| name.name())
        .ok_or_else(|| TransformError::UnsupportedConstruct {
            construct: "CONNECT BY without a plain FROM table".to_string(),
            sql: sql.clone(),
        })?;

    let columns = select
        .select_clause()
        .map(|clause| clause.columns())
        .unwrap_or_default();

    if columns.iter().any(|c| c.is_asterisk()) {
        return Err(TransformError::UnsupportedConstruct {
            construct: "CONNECT BY with a * select list".to_string(),
            sql,
        });
    }

    // Projection plan: plain columns pass through, LEVEL maps to the level
    // column, SYS_CONNECT_BY_PATH materializes via the path array.
    let mut base_columns: Vec<String> = Vec::new();
    let mut outer_columns: Vec<String> = Vec::new();
    let mut path: Option<(String, String)> = None;

    for column in &columns {
        let plan = classify_column(e, column)?;
        match plan {
            ColumnPlan::Plain(name) => {
                if !base_columns.contains(&name) {
                    base_columns.push(name.clone());
                }
                outer_columns.push(with_alias(name, column));
            }
            ColumnPlan::Level => {
                outer_columns.push(with_alias("level".to_string(), column));
            }
            ColumnPlan::Path { column_name, separator } => {
                if !base_columns.contains(&column_name) {
                    base_columns.push(column_name.clone());
                }
                outer_columns.push(with_alias(
                    format!("array_to_string(path, {separator})"),
                    column,
                ));
                path = Some((column_name, separator));
            }
        }
    }

    if base_columns.is_empty() {
        return Err(TransformError::UnsupportedConstruct {
            construct: "CONNECT BY without resolvable base columns".to_string(),
            sql,
        });
    }

    let start_with = hierarchical
        .start_with()
        .map(|condition| e.emit(&condition))
        .transpose()?;

    let connect_by = hierarchical
        .connect_by()
        .ok_or_else(|| TransformError::UnsupportedConstruct {
            construct: "CONNECT BY without a predicate".to_string(),
            sql: sql.clone(),
        })?;
    let join_condition = connect_condition(&connect_by, &table);

    // Anchor member.
    let mut anchor = format!("SELECT {}, 1 AS level", base_columns.join(", "));
    if let Some((column, _)) = &path {
        anchor.push_str(&format!(", ARRAY[{column}] AS path"));
    }
    anchor.push_str(&format!(" FROM {table}"));
    if let Some(condition) = start_with {
        anchor.push_str(&format!(" WHERE {}", condition.trim()));
    }

    // Recursive member.
    let recursive_columns = base_columns
        .iter()
        .map(|c| format!("{table}.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut recursive = format!("SELECT {recursive_columns}, rec.level + 1");
    if let Some((column, _)) = &path {
        recursive.push_str(&format!(", rec.path || {table}.{column}"));
    }
    recursive.push_str(&format!(
        " FROM {table} JOIN rec ON {join_condition}"
    ));

    Ok(format!(
        "WITH RECURSIVE rec AS ({anchor} UNION ALL {recursive}) SELECT {} FROM rec",
        outer_columns.join(", ")
    ))
}

enum ColumnPlan {
    Plain(String),
    Level,
    Path { column_name: String, separator: String },
}

fn classify_column(e: &mut Emitter, column: &ColumnExpr) -> Result<ColumnPlan, TransformError> {
    // LEVEL parses as a bare keyword token below the column expression.
    let has_level_keyword = column
        .syntax()
        .children_with_tokens()
        .filter_map(|it| it.into_token())
        .any(|t| t.kind() == SyntaxKind::Keyword && t.text().eq_ignore_ascii_case("level"));
    if has_level_keyword && column.syntax().children().next().is_none() {
        return Ok(ColumnPlan::Level);
    }

    let Some(node) = column.expression() else {
        return Err(TransformError::UnsupportedConstruct {
            construct: "unsupported column in CONNECT BY select list".to_string(),
            sql: column.syntax().text().to_string(),
        });
    };

    match node.kind() {
        SyntaxKind::IdentGroup => {
            let group = IdentGroup::cast(node)
                .ok_or_else(|| TransformError::internal("expected an identifier group"))?;
            let parts = group.parts();
            match parts.as_slice() {
                [name] => Ok(ColumnPlan::Plain(name.clone())),
                [_, name] => Ok(ColumnPlan::Plain(name.clone())),
                _ => Err(TransformError::UnsupportedConstruct {
                    construct: "qualified column in CONNECT BY select list".to_string(),
                    sql: group.text(),
                }),
            }
        }
        SyntaxKind::FunctionInvocation => {
            let invocation = FunctionInvocation::cast(node.clone())
                .ok_or_else(|| TransformError::internal("expected a function invocation"))?;

            if invocation.name_parts() == ["sys_connect_by_path"] {
                let args = invocation.arguments();
                if args.len() != 2 {
                    return Err(TransformError::UnsupportedConstruct {
                        construct: "SYS_CONNECT_BY_PATH with unexpected arity".to_string(),
                        sql: node.text().to_string(),
                    });
                }

                let column_name = args[0].text().trim().to_lowercase();
                let separator = emit_argument(e, &args[1])?;
                return Ok(ColumnPlan::Path {
                    column_name,
                    separator,
                });
            }

            Err(TransformError::UnsupportedConstruct {
                construct: "function call in CONNECT BY select list".to_string(),
                sql: node.text().to_string(),
            })
        }
        _ => Err(TransformError::UnsupportedConstruct {
            construct: "unsupported column in CONNECT BY select list".to_string(),
            sql: node.text().to_string(),
        }),
    }
}

fn with_alias(rendered: String, column: &ColumnExpr) -> String {
    match column.alias() {
        Some(alias) if alias != rendered => format!("{rendered} AS {alias}"),
        _ => rendered,
    }
}

/// Renders the `CONNECT BY` predicate as the recursive join condition:
/// `PRIOR x` references the CTE side, plain columns the table side.
fn connect_condition(node: &SyntaxNode, table: &str) -> String {
    render_condition(node, table, false)
}

fn render_condition(node: &SyntaxNode, table: &str, under_prior: bool) -> String {
    match node.kind() {
        SyntaxKind::IdentGroup => {
            let text = node.text().to_string().to_lowercase();
            let column = text.rsplit('.').next().unwrap_or(&text).to_string();
            if under_prior {
                format!("rec.{column}")
            } else {
                format!("{table}.{column}")
            }
        }
        _ => {
            let mut out = String::new();
            let mut prior_pending = false;

            for element in node.children_with_tokens() {
                match element {
                    rowan::NodeOrToken::Token(t) => match t.kind() {
                        SyntaxKind::Keyword if t.text().eq_ignore_ascii_case("prior") => {
                            prior_pending = true;
                        }
                        SyntaxKind::Whitespace => {
                            if !out.ends_with(' ') && !out.is_empty() {
                                out.push(' ');
                            }
                        }
                        _ => out.push_str(t.text()),
                    },
                    rowan::NodeOrToken::Node(child) => {
                        out.push_str(&render_condition(
                            &child,
                            table,
                            prior_pending || under_prior,
                        ));
                        prior_pending = false;
                    }
                }
            }

            out.trim().to_string()
        }
    }
}
