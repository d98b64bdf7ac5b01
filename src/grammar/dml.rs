// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of DML statements.

use crate::lexer::{TokenKind, T};
use crate::parser::{safe_loop, Parser};
use crate::syntax::SyntaxKind;

use super::{parse_expr, parse_ident, parse_query, parse_where_clause};

/// Parses an `INSERT INTO .. VALUES | SELECT` statement.
pub(crate) fn parse_insert(p: &mut Parser) {
    p.start(SyntaxKind::InsertStmt);
    p.bump(T![insert]);
    p.expect(T![into]);
    parse_ident(p, 2);

    if p.at(T!["("]) {
        p.bump(T!["("]);
        safe_loop!(p, {
            parse_ident(p, 1);
            if !p.eat(T![,]) {
                break;
            }
        });
        p.expect(T![")"]);
    }

    if p.at(T![select]) {
        parse_query(p, false);
    } else {
        p.expect(T![values]);
        p.expect(T!["("]);
        safe_loop!(p, {
            parse_expr(p);
            if !p.eat(T![,]) {
                break;
            }
        });
        p.expect(T![")"]);

        // RETURNING .. INTO; `returning` lexes as a plain ident.
        if p.at(T![ident]) && p.current_text().eq_ignore_ascii_case("returning") {
            p.bump(T![ident]);
            parse_expr(p);
            p.expect(T![into]);
            parse_ident(p, 2);
        }

        p.eat(T![;]);
    }

    p.finish();
}

/// Parses an `UPDATE .. SET .. [WHERE ..]` statement.
pub(crate) fn parse_update(p: &mut Parser) {
    p.start(SyntaxKind::UpdateStmt);
    p.bump(T![update]);
    parse_ident(p, 2);

    // Optional alias.
    if p.at(T![ident]) && !p.nth(1).map_or(false, |k| k == T![.]) && !p.at(T![set]) {
        p.bump(T![ident]);
    }

    p.expect(T![set]);

    safe_loop!(p, {
        parse_ident(p, 2);
        p.expect(T![comparison]);
        parse_expr(p);
        if !p.eat(T![,]) {
            break;
        }
    });

    if p.at(T![where]) {
        parse_where_clause(p);
    }

    p.eat(T![;]);
    p.finish();
}

/// Parses a `DELETE [FROM] .. [WHERE ..]` statement.
pub(crate) fn parse_delete(p: &mut Parser) {
    p.start(SyntaxKind::DeleteStmt);
    p.bump(T![delete]);
    p.eat(T![from]);
    parse_ident(p, 2);

    if p.at(T![ident]) {
        p.bump(T![ident]);
    }

    if p.at(T![where]) {
        parse_where_clause(p);
    }

    p.eat(T![;]);
    p.finish();
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse;
    use super::*;

    #[test]
    fn test_parse_insert_values() {
        let parsed = parse(
            "INSERT INTO job_history(employee_id, start_date) VALUES(p_emp_id, p_start_date);",
            parse_insert,
        );
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }

    #[test]
    fn test_parse_insert_select() {
        let parsed = parse(
            "INSERT INTO archive_emp SELECT empno, ename FROM emp",
            parse_insert,
        );
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }

    #[test]
    fn test_parse_update() {
        let parsed = parse(
            "UPDATE emp SET sal = sal * 1.1, comm = 0 WHERE deptno = 10;",
            parse_update,
        );
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }

    #[test]
    fn test_parse_delete() {
        let parsed = parse("DELETE FROM emp WHERE empno = 7839;", parse_delete);
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }
}
