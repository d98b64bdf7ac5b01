// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the per-query-block transformation contexts.
//!
//! One frame is pushed for every `SELECT` block the emitter enters and
//! popped when it leaves, on every exit path. Subqueries therefore see a
//! fresh, isolated analysis scope.

use indexmap::IndexMap;
use std::collections::HashSet;

use crate::syntax::SyntaxNode;

/// Inferred expression type categories, deliberately coarse.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeCategory {
    Numeric,
    Text,
    Date,
    Timestamp,
    Boolean,
    Unknown,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TypeInfo {
    pub category: TypeCategory,
    pub nullable: Option<bool>,
}

impl TypeInfo {
    pub fn of(category: TypeCategory) -> Self {
        Self {
            category,
            nullable: None,
        }
    }

    pub fn unknown() -> Self {
        Self::of(TypeCategory::Unknown)
    }
}

/// A table registered in the current `FROM` clause.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableRef {
    /// Explicit schema qualifier, if written.
    pub schema: Option<String>,
    /// Normalized table name, after synonym substitution.
    pub table: String,
    pub alias: Option<String>,
    /// The reference exactly as it should be emitted, e.g. `hr.employees e`.
    pub emitted: String,
}

impl TableRef {
    /// The key this table registers under: its alias if present, else its
    /// name.
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum JoinKind {
    Left,
    Right,
}

/// One ANSI join edge derived from `(+)` conditions, possibly merged from
/// several conditions on the same table pair.
#[derive(Clone, Debug)]
pub struct OuterJoin {
    /// Key of the driving (non-optional) table.
    pub source: String,
    /// Key of the joined table.
    pub target: String,
    pub kind: JoinKind,
    /// The original condition nodes, AND-combined into the `ON` clause.
    pub conditions: Vec<SyntaxNode>,
}

/// Context produced by outer-join analysis of a single query block.
#[derive(Clone, Debug, Default)]
pub struct OuterJoinContext {
    /// All `FROM` tables in registration order, keyed by alias or name.
    pub tables: IndexMap<String, TableRef>,
    pub joins: Vec<OuterJoin>,
    /// Raw text of conditions consumed by the join rewrite; these are
    /// suppressed from the emitted `WHERE`.
    pub suppressed: HashSet<String>,
    /// Conditions that stay in the `WHERE`, kept as nodes so they are
    /// transformed during emit.
    pub kept: Vec<SyntaxNode>,
}

impl OuterJoinContext {
    pub fn has_joins(&self) -> bool {
        !self.joins.is_empty()
    }

    pub fn table(&self, key: &str) -> Option<&TableRef> {
        self.tables.get(key)
    }
}

/// Result of ROWNUM pattern analysis of a single query block.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum RownumContext {
    #[default]
    None,
    /// `ROWNUM <= n`-shaped conditions, emitted as `LIMIT n`.
    SimpleLimit(u64),
    /// `ROWNUM BETWEEN lo AND hi`; only `lo = 1` is emittable.
    Range { lo: u64, hi: u64 },
}

impl RownumContext {
    /// The `LIMIT` value this context maps to, if any.
    pub fn limit(&self) -> Option<u64> {
        match self {
            Self::None => None,
            Self::SimpleLimit(n) => Some(*n),
            Self::Range { lo: 1, hi } => Some(*hi),
            Self::Range { .. } => None,
        }
    }
}

/// All per-query-block state, pushed and popped as one unit.
#[derive(Clone, Debug, Default)]
pub struct QueryContext {
    pub outer_join: OuterJoinContext,
    pub rownum: RownumContext,
}

impl QueryContext {
    /// Looks up a registered table by alias-or-name key.
    pub fn table_alias(&self, key: &str) -> Option<&TableRef> {
        self.outer_join.tables.get(key)
    }
}

/// Strict stack of [`QueryContext`] frames.
#[derive(Debug, Default)]
pub struct ContextStack {
    frames: Vec<QueryContext>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.frames.push(QueryContext::default());
    }

    /// Pops the top frame. Returns `false` on imbalance instead of
    /// panicking; the caller reports it as an internal invariant violation.
    pub fn pop(&mut self) -> bool {
        self.frames.pop().is_some()
    }

    pub fn top(&self) -> Option<&QueryContext> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut QueryContext> {
        self.frames.last_mut()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn stack_push_pop() {
        let mut stack = ContextStack::new();
        assert!(stack.is_empty());

        stack.push();
        stack.push();
        assert_eq!(stack.depth(), 2);

        assert!(stack.pop());
        assert!(stack.pop());
        assert!(!stack.pop());
    }

    #[test]
    fn rownum_limits() {
        assert_eq!(RownumContext::None.limit(), None);
        assert_eq!(RownumContext::SimpleLimit(10).limit(), Some(10));
        assert_eq!(RownumContext::Range { lo: 1, hi: 5 }.limit(), Some(5));
        assert_eq!(RownumContext::Range { lo: 2, hi: 5 }.limit(), None);
    }

    #[test]
    fn table_ref_key_prefers_alias() {
        let with_alias = TableRef {
            schema: None,
            table: "employees".to_string(),
            alias: Some("e".to_string()),
            emitted: "employees e".to_string(),
        };
        assert_eq!(with_alias.key(), "e");

        let without_alias = TableRef {
            schema: None,
            table: "employees".to_string(),
            alias: None,
            emitted: "employees".to_string(),
        };
        assert_eq!(without_alias.key(), "employees");
    }
}
