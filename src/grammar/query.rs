// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of `SELECT` statements.

use crate::lexer::{TokenKind, T};
use crate::parser::{safe_loop, Parser};
use crate::syntax::SyntaxKind;

use super::{parse_expr, parse_ident, parse_subquery};

/// Parses a full `SELECT` statement, including set operations chained onto
/// it. `allow_into` enables the PL/SQL `SELECT .. INTO ..` form.
pub(crate) fn parse_query(p: &mut Parser, allow_into: bool) {
    p.start(SyntaxKind::SelectStmt);
    p.expect(T![select]);
    p.eat_one_of(&[T![distinct], T![all]]);

    parse_select_clause(p);

    if allow_into && p.at(T![into]) {
        parse_into_clause(p);
    }

    p.expect(T![from]);
    parse_from_clause(p);

    if p.at(T![where]) {
        parse_where_clause(p);
    }

    if p.at(T![start]) || p.at(T![connect]) {
        parse_hierarchical_clause(p);
    }

    if p.at(T![group]) {
        parse_group_by_clause(p);
    }

    if p.at(T![order]) {
        parse_order_by_clause(p);
    }

    if p.eat(T![union]) {
        p.eat(T![all]);
        parse_query(p, false);
    }

    p.eat(T![;]);
    p.finish();
}

fn parse_select_clause(p: &mut Parser) {
    p.start(SyntaxKind::SelectClause);

    safe_loop!(p, {
        p.start(SyntaxKind::ColumnExpr);

        if p.at(T![*]) {
            p.bump(T![*]);
        } else {
            parse_expr(p);

            // Optional column alias, with or without `AS`.
            if p.eat(T![as]) {
                p.expect_one_of(&[T![ident], T![quoted_ident]]);
            } else if p.at(T![ident]) || p.at(T![quoted_ident]) {
                p.bump_any();
            }
        }

        p.finish();

        if !p.eat(T![,]) {
            break;
        }
    });

    p.finish();
}

/// Parses the `INTO` target list of a PL/SQL `SELECT .. INTO` statement.
pub(crate) fn parse_into_clause(p: &mut Parser) {
    p.start(SyntaxKind::IntoClause);
    p.bump(T![into]);

    safe_loop!(p, {
        parse_ident(p, 3);
        if !p.eat(T![,]) {
            break;
        }
    });

    p.finish();
}

fn parse_from_clause(p: &mut Parser) {
    p.start(SyntaxKind::FromClause);

    safe_loop!(p, {
        p.start(SyntaxKind::FromItem);

        if p.at(T!["("]) {
            parse_subquery(p);
        } else {
            parse_ident(p, 2);
        }

        // Optional table alias.
        if p.at(T![ident]) || p.at(T![quoted_ident]) {
            p.bump_any();
        }

        p.finish();

        if !p.eat(T![,]) {
            break;
        }
    });

    p.finish();
}

pub(crate) fn parse_where_clause(p: &mut Parser) {
    p.start(SyntaxKind::WhereClause);
    p.expect(T![where]);
    parse_expr(p);
    p.finish();
}

/// Parses `START WITH .. CONNECT BY ..`; Oracle accepts both orders.
fn parse_hierarchical_clause(p: &mut Parser) {
    p.start(SyntaxKind::HierarchicalClause);

    if p.eat(T![start]) {
        p.expect(T![with]);
        parse_expr(p);
    }

    p.expect(T![connect]);
    p.expect(T![by]);
    p.eat(T![nocycle]);
    parse_expr(p);

    if p.eat(T![start]) {
        p.expect(T![with]);
        parse_expr(p);
    }

    p.finish();
}

fn parse_group_by_clause(p: &mut Parser) {
    p.start(SyntaxKind::GroupByClause);
    p.bump(T![group]);
    p.expect(T![by]);

    safe_loop!(p, {
        parse_expr(p);
        if !p.eat(T![,]) {
            break;
        }
    });

    if p.eat(T![having]) {
        parse_expr(p);
    }

    p.finish();
}

fn parse_order_by_clause(p: &mut Parser) {
    p.start(SyntaxKind::OrderByClause);
    p.bump(T![order]);
    p.expect(T![by]);

    safe_loop!(p, {
        parse_expr(p);
        p.eat_one_of(&[T![asc], T![desc]]);
        if p.eat(T![nulls]) {
            p.expect_one_of(&[T![first], T![last]]);
        }

        if !p.eat(T![,]) {
            break;
        }
    });

    p.finish();
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::super::tests::{check, parse};
    use super::*;

    #[test]
    fn test_parse_simple_select() {
        check(
            parse("SELECT empno, ename FROM emp", |p| parse_query(p, false)),
            expect![[r#"
                Root@0..28
                  SelectStmt@0..28
                    Keyword@0..6 "SELECT"
                    Whitespace@6..7 " "
                    SelectClause@7..19
                      ColumnExpr@7..12
                        IdentGroup@7..12
                          Ident@7..12 "empno"
                      Comma@12..13 ","
                      Whitespace@13..14 " "
                      ColumnExpr@14..19
                        IdentGroup@14..19
                          Ident@14..19 "ename"
                    Whitespace@19..20 " "
                    Keyword@20..24 "FROM"
                    Whitespace@24..25 " "
                    FromClause@25..28
                      FromItem@25..28
                        IdentGroup@25..28
                          Ident@25..28 "emp"
            "#]],
        );
    }

    #[test]
    fn test_parse_oracle_outer_join() {
        let parsed = parse(
            "SELECT a.id, b.name FROM a, b WHERE a.id = b.id(+) AND a.active = 1",
            |p| parse_query(p, false),
        );
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }

    #[test]
    fn test_parse_connect_by() {
        let parsed = parse(
            "SELECT id FROM t START WITH parent IS NULL CONNECT BY PRIOR id = parent",
            |p| parse_query(p, false),
        );
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }

    #[test]
    fn test_parse_group_and_order() {
        let parsed = parse(
            "SELECT deptno, COUNT(*) FROM emp GROUP BY deptno HAVING COUNT(*) > 1 ORDER BY deptno DESC NULLS LAST",
            |p| parse_query(p, false),
        );
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }

    #[test]
    fn test_parse_subquery_in_from() {
        let parsed = parse(
            "SELECT x.a FROM (SELECT a FROM t) x WHERE x.a > 1",
            |p| parse_query(p, false),
        );
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }

    #[test]
    fn test_parse_union_all() {
        let parsed = parse(
            "SELECT a FROM t UNION ALL SELECT b FROM u",
            |p| parse_query(p, false),
        );
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }
}
