// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Detects Oracle `(+)` outer-join markers in the `WHERE` clause and
//! derives ANSI join edges from them.

use crate::ast::SelectStmt;
use crate::context::{JoinKind, OuterJoin};
use crate::emit::Emitter;
use crate::syntax::{SyntaxKind, SyntaxNode};
use crate::transpile::TransformError;

/// Walks the `WHERE` AND-chain, turning `(+)` conditions into join edges
/// and collecting everything else as kept conditions.
pub(crate) fn detect(e: &mut Emitter, select: &SelectStmt) -> Result<(), TransformError> {
    let Some(condition) = select.where_clause().and_then(|wc| wc.condition()) else {
        return Ok(());
    };

    let mut conjuncts = Vec::new();
    split_and_chain(&condition, &mut conjuncts);

    for conjunct in conjuncts {
        if !contains_join_marker(&conjunct) {
            if let Some(frame) = e.stack.top_mut() {
                frame.outer_join.kept.push(conjunct);
            }
            continue;
        }

        analyze_join_condition(e, &conjunct)?;
    }

    Ok(())
}

/// Splits a condition tree along top-level `AND` operators.
///
/// `OR`-combined subtrees and compound predicates (`BETWEEN` carries its
/// own `AND`) are captured whole.
fn split_and_chain(node: &SyntaxNode, out: &mut Vec<SyntaxNode>) {
    let is_and = node.kind() == SyntaxKind::Expression
        && has_direct_keyword(node, "and")
        && !has_direct_keyword(node, "or")
        && !has_direct_keyword(node, "between");

    if is_and {
        for child in node.children() {
            split_and_chain(&child, out);
        }
    } else {
        out.push(node.clone());
    }
}

fn has_direct_keyword(node: &SyntaxNode, keyword: &str) -> bool {
    node.children_with_tokens()
        .filter_map(|it| it.into_token())
        .any(|t| t.kind() == SyntaxKind::Keyword && t.text().eq_ignore_ascii_case(keyword))
}

fn contains_join_marker(node: &SyntaxNode) -> bool {
    node.descendants_with_tokens()
        .filter_map(|it| it.into_token())
        .any(|t| t.kind() == SyntaxKind::OracleJoin)
}

fn contains_subquery(node: &SyntaxNode) -> bool {
    node.descendants().any(|n| n.kind() == SyntaxKind::Subquery)
}

/// Derives a join edge from a single `(+)` condition.
fn analyze_join_condition(e: &mut Emitter, node: &SyntaxNode) -> Result<(), TransformError> {
    let sql = node.text().to_string();

    if contains_subquery(node) {
        return Err(TransformError::UnsupportedConstruct {
            construct: "(+) combined with a subquery".to_string(),
            sql,
        });
    }

    if has_direct_keyword(node, "or") {
        return Err(TransformError::UnsupportedConstruct {
            construct: "(+) inside an OR subtree".to_string(),
            sql,
        });
    }

    // The condition must be a plain comparison; `(+)` on compound
    // predicates is not translatable.
    let operator = node
        .children_with_tokens()
        .filter_map(|it| it.into_token())
        .find(|t| t.kind() == SyntaxKind::ComparisonOp);

    let Some(operator) = operator else {
        return Err(TransformError::UnsupportedConstruct {
            construct: "(+) outside a comparison".to_string(),
            sql,
        });
    };

    if operator.text() != "=" {
        return Err(TransformError::UnsupportedConstruct {
            construct: format!("(+) with operator '{}'", operator.text()),
            sql,
        });
    }

    // Split the condition text at the operator into its two sides.
    let offset = u32::from(operator.text_range().start())
        - u32::from(node.text_range().start());
    let text = node.text().to_string();
    let (left_text, rest) = text.split_at(offset as usize);
    let right_text = &rest[operator.text().len()..];

    let left_marked = left_text.contains("(+)");
    let right_marked = right_text.contains("(+)");

    if left_marked && right_marked {
        return Err(TransformError::UnsupportedConstruct {
            construct: "(+) on both sides of a condition".to_string(),
            sql,
        });
    }

    let Some(left_key) = table_key(e, left_text) else {
        keep_condition(e, node);
        return Ok(());
    };
    let Some(right_key) = table_key(e, right_text) else {
        keep_condition(e, node);
        return Ok(());
    };

    // `(+)` marks the optional side: on the right it is a LEFT JOIN from
    // the left table to the right, on the left a RIGHT JOIN. The edge is
    // stored left-to-right; the FROM emitter flips the keyword when it
    // reaches the edge from the other end.
    let (source, target, kind) = if right_marked {
        (left_key, right_key, JoinKind::Left)
    } else {
        (left_key, right_key, JoinKind::Right)
    };

    let Some(frame) = e.stack.top_mut() else {
        return Err(TransformError::internal("missing query context frame"));
    };

    frame.outer_join.suppressed.insert(sql.trim().to_string());

    // Conditions on an already-known table pair merge into one join.
    if let Some(existing) = frame.outer_join.joins.iter_mut().find(|j| {
        (j.source == source && j.target == target) || (j.source == target && j.target == source)
    }) {
        existing.conditions.push(node.clone());
        return Ok(());
    }

    frame.outer_join.joins.push(OuterJoin {
        source,
        target,
        kind,
        conditions: vec![node.clone()],
    });

    Ok(())
}

fn keep_condition(e: &mut Emitter, node: &SyntaxNode) {
    if let Some(frame) = e.stack.top_mut() {
        frame.outer_join.kept.push(node.clone());
    }
}

/// Extracts the table key from one side of a join condition: the first
/// dot-qualifier of the side's text, after stripping the `(+)` marker.
///
/// Unqualified sides resolve only when the `FROM` clause registers exactly
/// one table.
fn table_key(e: &Emitter, side_text: &str) -> Option<String> {
    let cleaned = side_text.replace("(+)", "");
    let cleaned = cleaned.trim();

    if let Some((qualifier, _)) = cleaned.split_once('.') {
        let qualifier = qualifier.trim().to_lowercase();
        if qualifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '#')
            && !qualifier.is_empty()
        {
            return Some(qualifier);
        }
    }

    let frame = e.stack.top()?;
    if frame.outer_join.tables.len() == 1 {
        return frame.outer_join.tables.keys().next().cloned();
    }

    None
}
