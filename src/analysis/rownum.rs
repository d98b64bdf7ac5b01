// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Recognizes `ROWNUM` limit patterns in the top-level `WHERE` AND-chain.
//!
//! Only shapes mappable to `LIMIT` are recognized: `ROWNUM <= n`,
//! `ROWNUM < n`, `ROWNUM = 1` and `ROWNUM BETWEEN lo AND hi`. Everything
//! else disables the rewrite and lets the condition pass through.

use crate::ast::{AstNode, IdentGroup, SelectStmt};
use crate::context::RownumContext;
use crate::emit::Emitter;
use crate::syntax::{SyntaxKind, SyntaxNode};

/// Scans the kept conditions recorded by outer-join analysis and moves
/// recognized `ROWNUM` conditions into the rownum context.
pub(crate) fn detect(e: &mut Emitter, _select: &SelectStmt) {
    let Some(frame) = e.stack.top_mut() else {
        return;
    };

    let mut recognized: Vec<(usize, RownumContext)> = Vec::new();
    let mut unrecognized_rownum = false;

    for (index, condition) in frame.outer_join.kept.iter().enumerate() {
        if !mentions_rownum(condition) {
            continue;
        }

        match recognize(condition) {
            Some(context) => recognized.push((index, context)),
            None => unrecognized_rownum = true,
        }
    }

    // A single recognized pattern and no stray ROWNUM use is required;
    // anything else keeps all conditions untouched.
    if unrecognized_rownum || recognized.len() != 1 {
        return;
    }

    let (index, context) = recognized.remove(0);
    let condition = frame.outer_join.kept.remove(index);
    frame
        .outer_join
        .suppressed
        .insert(condition.text().to_string().trim().to_string());
    frame.rownum = context;
}

fn mentions_rownum(node: &SyntaxNode) -> bool {
    node.descendants_with_tokens()
        .filter_map(|it| it.into_token())
        .any(|t| t.kind() == SyntaxKind::Ident && t.text().eq_ignore_ascii_case("rownum"))
}

/// Tries to match one condition against the supported `ROWNUM` shapes.
fn recognize(node: &SyntaxNode) -> Option<RownumContext> {
    if node.kind() != SyntaxKind::Expression {
        return None;
    }

    let tokens = node
        .children_with_tokens()
        .filter_map(|it| it.into_token())
        .filter(|t| !matches!(t.kind(), SyntaxKind::Whitespace | SyntaxKind::Comment))
        .collect::<Vec<_>>();
    let nodes = node.children().collect::<Vec<_>>();

    // `ROWNUM BETWEEN lo AND hi`
    let is_between = tokens
        .iter()
        .any(|t| t.kind() == SyntaxKind::Keyword && t.text().eq_ignore_ascii_case("between"));
    if is_between {
        if nodes.len() != 1 || !is_rownum_ref(&nodes[0]) {
            return None;
        }

        let bounds = tokens
            .iter()
            .filter(|t| t.kind() == SyntaxKind::Integer)
            .filter_map(|t| t.text().parse::<u64>().ok())
            .collect::<Vec<_>>();

        return match bounds.as_slice() {
            [lo, hi] => Some(RownumContext::Range { lo: *lo, hi: *hi }),
            _ => None,
        };
    }

    // A plain comparison with ROWNUM on one side and an integer literal on
    // the other.
    let operator = tokens
        .iter()
        .find(|t| t.kind() == SyntaxKind::ComparisonOp)?;
    let literal = tokens
        .iter()
        .find(|t| t.kind() == SyntaxKind::Integer)
        .and_then(|t| t.text().parse::<u64>().ok())?;

    if nodes.len() != 1 || !is_rownum_ref(&nodes[0]) {
        return None;
    }

    // For reversed operand order (`10 >= ROWNUM`) the operator flips.
    let rownum_first = nodes[0].text_range().start() < operator.text_range().start();
    let op = if rownum_first {
        operator.text().to_string()
    } else {
        match operator.text() {
            "<" => ">".to_string(),
            "<=" => ">=".to_string(),
            ">" => "<".to_string(),
            ">=" => "<=".to_string(),
            other => other.to_string(),
        }
    };

    match op.as_str() {
        "<=" => Some(RownumContext::SimpleLimit(literal)),
        "<" if literal > 0 => Some(RownumContext::SimpleLimit(literal - 1)),
        "=" if literal == 1 => Some(RownumContext::SimpleLimit(1)),
        _ => None,
    }
}

fn is_rownum_ref(node: &SyntaxNode) -> bool {
    IdentGroup::cast(node.clone())
        .map(|ig| ig.parts() == vec!["rownum".to_string()])
        .unwrap_or(false)
}
