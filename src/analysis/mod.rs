// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the analysis visitors that run before a query block is
//! emitted.
//!
//! Analysis is strictly side-effect-only: the passes walk the tree and
//! populate the top frame of the context stack (and the type cache), but
//! never mutate the tree and never produce output. Emit runs afterwards
//! and consumes what analysis recorded.

pub(crate) mod outer_join;
pub(crate) mod rownum;
pub(crate) mod typing;

use crate::ast::{FromItem, SelectStmt};
use crate::context::TableRef;
use crate::emit::Emitter;
use crate::transpile::TransformError;

/// Runs all analysis passes for one query block, in order: FROM-table
/// registration, outer-join detection, ROWNUM detection, type inference.
///
/// Expects the caller to have pushed a fresh context frame.
pub(crate) fn analyze_query_block(
    e: &mut Emitter,
    select: &SelectStmt,
) -> Result<(), TransformError> {
    register_from_tables(e, select);
    outer_join::detect(e, select)?;
    rownum::detect(e, select);
    typing::infer(e, select);

    Ok(())
}

/// Registers every plain table of the `FROM` clause in the current frame,
/// applying synonym substitution to unqualified names.
///
/// Subquery items are not registered; their aliases resolve to nothing and
/// their inner query blocks are analyzed in their own scope.
fn register_from_tables(e: &mut Emitter, select: &SelectStmt) {
    let Some(from) = select.from_clause() else {
        return;
    };

    for item in from.items() {
        let Some(table_ref) = resolve_table_ref(e, &item) else {
            continue;
        };

        if let Some(frame) = e.stack.top_mut() {
            frame
                .outer_join
                .tables
                .insert(table_ref.key().to_string(), table_ref);
        }
    }
}

/// Resolves a plain-table `FROM` item into a [`TableRef`], applying
/// synonym substitution to unqualified names. Returns `None` for subquery
/// items.
pub(crate) fn resolve_table_ref(e: &Emitter, item: &FromItem) -> Option<TableRef> {
    let name = item.name()?;
    let parts = name.parts();
    let alias = item.alias();

    let (schema, table) = match parts.as_slice() {
        [table] => match e.meta.resolve_synonym(&e.schema, table) {
            Some((target_schema, target_name)) => {
                (Some(target_schema.to_string()), target_name.to_string())
            }
            None => (None, table.clone()),
        },
        [schema, table] => (Some(schema.clone()), table.clone()),
        _ => return None,
    };

    let mut emitted = match &schema {
        Some(schema) => format!("{schema}.{table}"),
        None => table.clone(),
    };
    if let Some(alias) = &alias {
        emitted.push(' ');
        emitted.push_str(alias);
    }

    Some(TableRef {
        schema,
        table,
        alias,
        emitted,
    })
}
