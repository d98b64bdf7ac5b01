// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Bottom-up type inference over expression trees.
//!
//! Every non-terminal is cached in the emitter's type cache under its
//! `"start:stop"` token positions; emit routines consult the cache for
//! type-directed rewrites such as `TRUNC` on dates.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::ast::{AstNode, IdentGroup, SelectStmt};
use crate::context::{TypeCategory, TypeInfo};
use crate::emit::Emitter;
use crate::syntax::{SyntaxKind, SyntaxNode};

/// How a built-in function determines its result type.
#[derive(Copy, Clone, Debug)]
enum Builtin {
    Fixed(TypeCategory),
    /// Result type equals the type of the n-th argument (0-based).
    Arg(usize),
}

lazy_static! {
    static ref BUILTINS: HashMap<&'static str, Builtin> = {
        let mut m = HashMap::new();
        m.insert("abs", Builtin::Fixed(TypeCategory::Numeric));
        m.insert("ceil", Builtin::Fixed(TypeCategory::Numeric));
        m.insert("coalesce", Builtin::Arg(0));
        m.insert("decode", Builtin::Arg(2));
        m.insert("floor", Builtin::Fixed(TypeCategory::Numeric));
        m.insert("greatest", Builtin::Arg(0));
        m.insert("instr", Builtin::Fixed(TypeCategory::Numeric));
        m.insert("least", Builtin::Arg(0));
        m.insert("length", Builtin::Fixed(TypeCategory::Numeric));
        m.insert("lower", Builtin::Fixed(TypeCategory::Text));
        m.insert("lpad", Builtin::Fixed(TypeCategory::Text));
        m.insert("ltrim", Builtin::Fixed(TypeCategory::Text));
        m.insert("mod", Builtin::Fixed(TypeCategory::Numeric));
        m.insert("nvl", Builtin::Arg(0));
        m.insert("nvl2", Builtin::Arg(1));
        m.insert("round", Builtin::Arg(0));
        m.insert("rpad", Builtin::Fixed(TypeCategory::Text));
        m.insert("rtrim", Builtin::Fixed(TypeCategory::Text));
        m.insert("substr", Builtin::Fixed(TypeCategory::Text));
        m.insert("to_char", Builtin::Fixed(TypeCategory::Text));
        m.insert("to_date", Builtin::Fixed(TypeCategory::Date));
        m.insert("to_number", Builtin::Fixed(TypeCategory::Numeric));
        m.insert("trim", Builtin::Fixed(TypeCategory::Text));
        m.insert("trunc", Builtin::Arg(0));
        m.insert("upper", Builtin::Fixed(TypeCategory::Text));
        m
    };
}

/// Maps a raw Oracle datatype to its coarse category.
pub(crate) fn category_of_oracle_type(datatype: &str) -> TypeCategory {
    let base = datatype
        .split(['(', ' '])
        .next()
        .unwrap_or(datatype)
        .to_lowercase();

    match base.as_str() {
        "number" | "integer" | "int" | "smallint" | "decimal" | "numeric" | "float" | "real"
        | "pls_integer" | "binary_integer" | "binary_float" | "binary_double" => {
            TypeCategory::Numeric
        }
        "varchar2" | "varchar" | "nvarchar2" | "char" | "nchar" | "clob" | "nclob" | "long" => {
            TypeCategory::Text
        }
        "date" => TypeCategory::Date,
        "timestamp" => TypeCategory::Timestamp,
        "boolean" => TypeCategory::Boolean,
        _ => TypeCategory::Unknown,
    }
}

/// Runs type inference over the select list and the `WHERE` condition of
/// one query block.
pub(crate) fn infer(e: &mut Emitter, select: &SelectStmt) {
    if let Some(clause) = select.select_clause() {
        for column in clause.columns() {
            for child in column.syntax().children() {
                infer_node(e, &child);
            }
        }
    }

    if let Some(condition) = select.where_clause().and_then(|wc| wc.condition()) {
        infer_node(e, &condition);
    }
}

/// Infers and caches the type of `node`, bottom-up.
pub(crate) fn infer_node(e: &mut Emitter, node: &SyntaxNode) -> TypeInfo {
    for child in node.children() {
        infer_node(e, &child);
    }

    let info = match node.kind() {
        SyntaxKind::Expression => infer_expression(e, node),
        SyntaxKind::IdentGroup => infer_ident_group(e, node),
        SyntaxKind::FunctionInvocation => infer_invocation(e, node),
        SyntaxKind::CaseExpr => TypeInfo::unknown(),
        SyntaxKind::Subquery => TypeInfo::unknown(),
        _ => return TypeInfo::unknown(),
    };

    e.type_cache.insert(Emitter::node_key(node), info);
    info
}

fn infer_expression(e: &mut Emitter, node: &SyntaxNode) -> TypeInfo {
    let mut has_comparison = false;
    let mut has_concat = false;
    let mut has_arithmetic = false;
    let mut datetime_literal = None;

    let mut tokens = node
        .children_with_tokens()
        .filter_map(|it| it.into_token())
        .filter(|t| !matches!(t.kind(), SyntaxKind::Whitespace | SyntaxKind::Comment))
        .peekable();

    while let Some(token) = tokens.next() {
        match token.kind() {
            SyntaxKind::ComparisonOp => has_comparison = true,
            SyntaxKind::Keyword
                if ["and", "or", "not", "between", "like", "is", "in"]
                    .contains(&token.text().to_lowercase().as_str()) =>
            {
                has_comparison = true
            }
            SyntaxKind::Concat => has_concat = true,
            SyntaxKind::Plus | SyntaxKind::Minus | SyntaxKind::Asterisk | SyntaxKind::Slash => {
                has_arithmetic = true
            }
            SyntaxKind::Keyword if token.text().eq_ignore_ascii_case("date") => {
                if tokens.peek().map(|t| t.kind()) == Some(SyntaxKind::QuotedLiteral) {
                    datetime_literal = Some(TypeCategory::Date);
                }
            }
            SyntaxKind::Keyword if token.text().eq_ignore_ascii_case("timestamp") => {
                if tokens.peek().map(|t| t.kind()) == Some(SyntaxKind::QuotedLiteral) {
                    datetime_literal = Some(TypeCategory::Timestamp);
                }
            }
            _ => {}
        }
    }

    if let Some(category) = datetime_literal {
        return TypeInfo::of(category);
    }
    if has_comparison {
        return TypeInfo::of(TypeCategory::Boolean);
    }
    if has_concat {
        return TypeInfo::of(TypeCategory::Text);
    }
    if has_arithmetic {
        return TypeInfo::of(TypeCategory::Numeric);
    }

    // Prefix wrappers (`PRIOR x`, unary minus) take their operand's type.
    node.children()
        .next()
        .and_then(|child| e.cached_type(&child))
        .unwrap_or_else(TypeInfo::unknown)
}

fn infer_ident_group(e: &mut Emitter, node: &SyntaxNode) -> TypeInfo {
    let Some(group) = IdentGroup::cast(node.clone()) else {
        return TypeInfo::unknown();
    };

    let parts = group.parts();
    match parts.as_slice() {
        [name] if name == "rownum" => TypeInfo::of(TypeCategory::Numeric),
        [name] if name == "sysdate" || name == "systimestamp" => {
            TypeInfo::of(TypeCategory::Timestamp)
        }
        [name] => {
            // Unqualified column: search all registered FROM tables.
            let Some(frame) = e.stack.top() else {
                return TypeInfo::unknown();
            };

            for table in frame.outer_join.tables.values() {
                let schema = table.schema.as_deref().unwrap_or(&e.schema);
                if let Some(column) = e.meta.table_column(schema, &table.table, name) {
                    return TypeInfo {
                        category: category_of_oracle_type(&column.datatype),
                        nullable: Some(column.nullable),
                    };
                }
            }

            TypeInfo::unknown()
        }
        [qualifier, name] => {
            let Some(table) = e.stack.top().and_then(|f| f.table_alias(qualifier)) else {
                return TypeInfo::unknown();
            };

            let schema = table.schema.clone().unwrap_or_else(|| e.schema.clone());
            match e.meta.table_column(&schema, &table.table, name) {
                Some(column) => TypeInfo {
                    category: category_of_oracle_type(&column.datatype),
                    nullable: Some(column.nullable),
                },
                None => TypeInfo::unknown(),
            }
        }
        _ => TypeInfo::unknown(),
    }
}

fn infer_invocation(e: &mut Emitter, node: &SyntaxNode) -> TypeInfo {
    let Some(invocation) = crate::ast::FunctionInvocation::cast(node.clone()) else {
        return TypeInfo::unknown();
    };

    let parts = invocation.name_parts();
    let [name] = parts.as_slice() else {
        return TypeInfo::unknown();
    };

    match BUILTINS.get(name.as_str()) {
        Some(Builtin::Fixed(category)) => TypeInfo::of(*category),
        Some(Builtin::Arg(index)) => invocation
            .arguments()
            .get(*index)
            .and_then(|arg| arg.node())
            .and_then(|n| e.cached_type(&n))
            .unwrap_or_else(TypeInfo::unknown),
        None => TypeInfo::unknown(),
    }
}
