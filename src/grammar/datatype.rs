// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of datatype references.

use crate::lexer::{TokenKind, T};
use crate::parser::{safe_loop, Parser};
use crate::syntax::SyntaxKind;

/// Parses a datatype reference.
///
/// Covers built-in types with optional precision/scale (`NUMBER(10,2)`,
/// `VARCHAR2(30 CHAR)`), `DATE`/`TIMESTAMP [WITH [LOCAL] TIME ZONE]`, and
/// anchored references (`emp.sal%TYPE`, `emp%ROWTYPE`).
pub(crate) fn parse_datatype(p: &mut Parser) {
    p.start(SyntaxKind::Datatype);

    match p.current() {
        T![date] => {
            p.bump(T![date]);
        }
        T![timestamp] => {
            p.bump(T![timestamp]);
            parse_precision(p);
            if p.at(T![with]) {
                // WITH [LOCAL] TIME ZONE; LOCAL/TIME/ZONE lex as plain idents.
                p.bump(T![with]);
                safe_loop!(p, {
                    if !p.eat(T![ident]) {
                        break;
                    }
                });
            }
        }
        _ => {
            p.expect_one_of(&[T![ident], T![quoted_ident]]);
            while p.at(T![.]) {
                p.bump(T![.]);
                p.expect_one_of(&[T![ident], T![quoted_ident]]);
            }

            if p.at(T![%]) {
                p.bump(T![%]);
                p.expect_one_of(&[T![type], T![rowtype]]);
            } else {
                parse_precision(p);
            }
        }
    }

    p.finish();
}

fn parse_precision(p: &mut Parser) {
    if p.eat(T!["("]) {
        safe_loop!(p, {
            if p.eat(T![")"]) {
                break;
            }
            p.bump_any();
        });
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::super::tests::{check, parse};
    use super::*;

    #[test]
    fn test_parse_number_with_precision() {
        check(
            parse("NUMBER(10,2)", parse_datatype),
            expect![[r#"
                Root@0..12
                  Datatype@0..12
                    Ident@0..6 "NUMBER"
                    LParen@6..7 "("
                    Integer@7..9 "10"
                    Comma@9..10 ","
                    Integer@10..11 "2"
                    RParen@11..12 ")"
            "#]],
        );
    }

    #[test]
    fn test_parse_anchored_type() {
        check(
            parse("emp.sal%TYPE", parse_datatype),
            expect![[r#"
                Root@0..12
                  Datatype@0..12
                    Ident@0..3 "emp"
                    Dot@3..4 "."
                    Ident@4..7 "sal"
                    Percentage@7..8 "%"
                    Keyword@8..12 "TYPE"
            "#]],
        );
    }

    #[test]
    fn test_parse_timestamp_with_time_zone() {
        let parsed = parse("TIMESTAMP(6) WITH TIME ZONE", parse_datatype);
        assert!(parsed.ok(), "{:?}", parsed.errors());
        assert_eq!(
            parsed.syntax().text().to_string(),
            "TIMESTAMP(6) WITH TIME ZONE"
        );
    }
}
