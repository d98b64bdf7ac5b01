// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Emit routines for `SELECT` statements; the spine of the whole
//! transformation.

use crate::analysis::{self, resolve_table_ref};
use crate::ast::{AstNode, SelectStmt, Subquery};
use crate::context::{JoinKind, OuterJoinContext};
use crate::syntax::{SyntaxKind, SyntaxNode};
use crate::transpile::TransformError;

use super::{emit_children, plain_ident_group, Emitter};

/// Emits one query block, in strict analyze-then-emit order:
///
/// 1. hierarchical queries delegate entirely to the recursive-CTE rewriter
/// 2. a sole `DUAL` in the `FROM` suppresses the clause
/// 3. fresh contexts are pushed, analysis visitors run
/// 4. `FROM` emits before the select list, so aliases are registered
/// 5.-9. the clauses assemble in output order, `ROWNUM` becomes `LIMIT`
/// 10. contexts pop on every exit path
pub(crate) fn emit_select_stmt(
    e: &mut Emitter,
    node: &SyntaxNode,
) -> Result<String, TransformError> {
    let select = SelectStmt::cast(node.clone())
        .ok_or_else(|| TransformError::internal("expected a SELECT statement"))?;

    if select.hierarchical_clause().is_some() {
        return crate::rewriter::hierarchical::rewrite(e, &select);
    }

    let mut scope = e.query_scope();
    emit_query_block(&mut scope, &select)
}

fn emit_query_block(e: &mut Emitter, select: &SelectStmt) -> Result<String, TransformError> {
    let from_is_dual = from_is_dual(select);

    analysis::analyze_query_block(e, select)?;

    // FROM first: the select-list expressions name-resolve against the
    // aliases registered here.
    let from_text = if from_is_dual {
        None
    } else {
        Some(emit_from(e, select)?)
    };

    let mut out = String::from("SELECT ");
    if has_direct_keyword(select.syntax(), "distinct") {
        out.push_str("DISTINCT ");
    }
    out.push_str(&emit_select_list(e, select)?);

    if let Some(into) = select.into_clause() {
        let targets = into
            .targets()
            .iter()
            .map(|t| plain_ident_group(t.syntax()))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(" INTO ");
        out.push_str(&targets);
    }

    if let Some(from_text) = from_text.filter(|t| !t.is_empty()) {
        out.push_str(" FROM ");
        out.push_str(&from_text);
    }

    if select.where_clause().is_some() {
        let kept = e
            .stack
            .top()
            .map(|frame| frame.outer_join.kept.clone())
            .unwrap_or_default();

        if !kept.is_empty() {
            let conditions = kept
                .iter()
                .map(|c| e.emit(c).map(|t| t.trim().to_string()))
                .collect::<Result<Vec<_>, _>>()?
                .join(" AND ");
            out.push_str(" WHERE ");
            out.push_str(&conditions);
        }
    }

    if let Some(group_by) = select.group_by_clause() {
        out.push(' ');
        out.push_str(emit_children(e, group_by.syntax())?.trim());
    }

    if let Some(order_by) = select.order_by_clause() {
        out.push(' ');
        out.push_str(emit_children(e, order_by.syntax())?.trim());
    }

    if let Some(limit) = e.stack.top().and_then(|frame| frame.rownum.limit()) {
        out.push_str(&format!(" LIMIT {limit}"));
    }

    if let Some(next) = select.union_query() {
        out.push_str(" UNION ");
        if has_direct_keyword(select.syntax(), "all") {
            out.push_str("ALL ");
        }
        out.push_str(&e.emit(next.syntax())?);
    }

    if select
        .syntax()
        .children_with_tokens()
        .filter_map(|it| it.into_token())
        .any(|t| t.kind() == SyntaxKind::Semicolon)
    {
        out.push(';');
    }

    Ok(out)
}

/// Emits a parenthesized subquery.
pub(crate) fn emit_subquery(e: &mut Emitter, node: &SyntaxNode) -> Result<String, TransformError> {
    let subquery = Subquery::cast(node.clone())
        .ok_or_else(|| TransformError::internal("expected a subquery"))?;

    match subquery.query() {
        Some(query) => Ok(format!("({})", e.emit(query.syntax())?)),
        None => Ok(node.text().to_string()),
    }
}

fn from_is_dual(select: &SelectStmt) -> bool {
    let Some(from) = select.from_clause() else {
        return false;
    };

    let items = from.items();
    if items.len() != 1 {
        return false;
    }

    items[0]
        .name()
        .map(|name| {
            let parts = name.parts();
            parts == ["dual"] || parts == ["sys", "dual"]
        })
        .unwrap_or(false)
}

fn has_direct_keyword(node: &SyntaxNode, keyword: &str) -> bool {
    node.children_with_tokens()
        .filter_map(|it| it.into_token())
        .any(|t| t.kind() == SyntaxKind::Keyword && t.text().eq_ignore_ascii_case(keyword))
}

fn emit_select_list(e: &mut Emitter, select: &SelectStmt) -> Result<String, TransformError> {
    let Some(clause) = select.select_clause() else {
        return Ok("*".to_string());
    };

    let columns = clause
        .columns()
        .iter()
        .map(|column| emit_children(e, column.syntax()).map(|t| t.trim().to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(columns.join(", "))
}

/// Emits the `FROM` clause. With `(+)`-derived joins present, the
/// comma-separated table list is rewritten into ANSI JOIN syntax anchored
/// at the first registered table; otherwise the items emit as written.
fn emit_from(e: &mut Emitter, select: &SelectStmt) -> Result<String, TransformError> {
    let Some(from) = select.from_clause() else {
        return Ok(String::new());
    };

    let ctx = e
        .stack
        .top()
        .map(|frame| frame.outer_join.clone())
        .unwrap_or_default();

    if ctx.has_joins() {
        return emit_ansi_joins(e, &ctx);
    }

    let mut rendered = Vec::new();
    for item in from.items() {
        if let Some(subquery) = item.subquery() {
            let mut text = emit_subquery(e, subquery.syntax())?;
            if let Some(alias) = item.alias() {
                text.push(' ');
                text.push_str(&alias);
            }
            rendered.push(text);
        } else if let Some(table_ref) = resolve_table_ref(e, &item) {
            rendered.push(table_ref.emitted);
        }
    }

    Ok(rendered.join(", "))
}

/// Rebuilds the table list as a chain of ANSI joins, walking the join list
/// in registration order. Tables participating in no join are appended as
/// CROSS JOINs.
fn emit_ansi_joins(e: &mut Emitter, ctx: &OuterJoinContext) -> Result<String, TransformError> {
    let Some(anchor) = ctx.tables.values().next() else {
        return Err(TransformError::internal(
            "outer-join context without registered tables",
        ));
    };

    let mut out = anchor.emitted.clone();
    let mut placed = vec![anchor.key().to_string()];
    let mut remaining = ctx.joins.clone();

    while !remaining.is_empty() {
        let next = remaining.iter().position(|join| {
            placed.contains(&join.source) || placed.contains(&join.target)
        });

        let Some(index) = next else {
            // A join island not connected to the anchor; bridge it with a
            // CROSS JOIN to its source.
            let island = remaining[0].source.clone();
            out.push_str(" CROSS JOIN ");
            out.push_str(&emitted_table(ctx, &island));
            placed.push(island);
            continue;
        };

        let join = remaining.remove(index);
        let (new_table, kind) = if placed.contains(&join.source) {
            (join.target.clone(), join.kind)
        } else {
            let flipped = match join.kind {
                JoinKind::Left => JoinKind::Right,
                JoinKind::Right => JoinKind::Left,
            };
            (join.source.clone(), flipped)
        };

        let conditions = join
            .conditions
            .iter()
            .map(|c| e.emit(c).map(|t| collapse_spaces(t.trim())))
            .collect::<Result<Vec<_>, _>>()?
            .join(" AND ");

        let keyword = match kind {
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        };

        out.push_str(&format!(
            " {keyword} {} ON ({conditions})",
            emitted_table(ctx, &new_table)
        ));
        placed.push(new_table);
    }

    for table in ctx.tables.values() {
        if !placed.iter().any(|key| key == table.key()) {
            out.push_str(" CROSS JOIN ");
            out.push_str(&table.emitted);
        }
    }

    Ok(out)
}

fn emitted_table(ctx: &OuterJoinContext, key: &str) -> String {
    ctx.tables
        .get(key)
        .map(|t| t.emitted.clone())
        .unwrap_or_else(|| key.to_string())
}

/// Collapses runs of whitespace left behind by dropped `(+)` markers.
fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }

    out
}
