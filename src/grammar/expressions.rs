// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of logic/arithmetic SQL expressions.

//  Heavily inspired by
//    https://matklad.github.io/2020/04/13/simple-but-powerful-pratt-parsing.html
//    https://arzg.github.io/lang/10/

use crate::lexer::{TokenKind, T};
use crate::parser::{safe_loop, ParseError, Parser};
use crate::syntax::SyntaxKind;

use super::parse_query;

const BP_OR: (u8, u8) = (1, 2);
const BP_AND: (u8, u8) = (3, 4);
const BP_NOT: u8 = 5;
const BP_COMPARISON: (u8, u8) = (7, 8);
const BP_CONCAT: (u8, u8) = (9, 10);
const BP_ADDITIVE: (u8, u8) = (11, 12);
const BP_MULTIPLICATIVE: (u8, u8) = (13, 14);
const BP_UNARY: u8 = 15;
const BP_POSTFIX: u8 = 17;

pub(crate) fn parse_expr(p: &mut Parser) {
    expr_bp(p, 0);
}

fn expr_bp(p: &mut Parser, min_bp: u8) {
    let checkpoint = p.checkpoint();

    match p.current() {
        T![integer]
        | T![decimal]
        | T![quoted_literal]
        | T![null]
        | T![level] => p.bump_any(),
        T![date] | T![timestamp] => {
            // A datetime literal such as `DATE '2020-01-01'`; a bare keyword
            // is consumed as an identifier-like primary.
            if p.nth(1) == Some(T![quoted_literal]) {
                p.start_node_at(checkpoint, SyntaxKind::Expression);
                p.bump_any();
                p.bump(T![quoted_literal]);
                p.finish();
            } else {
                p.bump_any();
            }
        }
        T![case] => parse_case_expr(p),
        T![not] => {
            p.bump_any();
            p.start_node_at(checkpoint, SyntaxKind::Expression);
            expr_bp(p, BP_NOT);
            p.finish();
        }
        T![+] | T![-] | T![prior] => {
            p.bump_any();
            p.start_node_at(checkpoint, SyntaxKind::Expression);
            expr_bp(p, BP_UNARY);
            p.finish();
        }
        T!["("] => {
            if p.nth(1) == Some(T![select]) {
                parse_subquery(p);
            } else {
                p.bump_any();
                expr_bp(p, 0);
                if !p.expect(T![")"]) {
                    let offset = p.offset();
                    p.error(ParseError::UnbalancedParens(offset));
                }
            }
        }
        T![bind_var] => parse_bind_var_group(p),
        T![ident] | T![quoted_ident] => parse_name_or_invocation(p),
        current => {
            p.error(ParseError::ExpectedStatement(current));
            p.bump_any();
        }
    }

    loop {
        let op = p.current();

        // The Oracle outer-join marker binds tighter than anything else.
        if op == T!["(+)"] {
            if BP_POSTFIX < min_bp {
                break;
            }

            p.bump_any();
            p.start_node_at(checkpoint, SyntaxKind::Expression);
            p.finish();
            continue;
        }

        // `IS [NOT] NULL`
        if op == T![is] {
            if BP_COMPARISON.0 < min_bp {
                break;
            }

            p.bump_any();
            p.eat(T![not]);
            p.expect(T![null]);
            p.start_node_at(checkpoint, SyntaxKind::Expression);
            p.finish();
            continue;
        }

        // `[NOT] BETWEEN | IN | LIKE`
        let negated = op == T![not]
            && matches!(p.nth(1), Some(T![between]) | Some(T![in]) | Some(T![like]));
        let compound = if negated { p.nth(1).unwrap() } else { op };

        if matches!(compound, T![between] | T![in] | T![like]) {
            if BP_COMPARISON.0 < min_bp {
                break;
            }

            if negated {
                p.bump(T![not]);
            }

            match compound {
                T![between] => {
                    p.bump(T![between]);
                    expr_bp(p, BP_COMPARISON.1);
                    p.expect(T![and]);
                    expr_bp(p, BP_COMPARISON.1);
                }
                T![in] => {
                    p.bump(T![in]);
                    parse_paren_list_or_subquery(p);
                }
                T![like] => {
                    p.bump(T![like]);
                    expr_bp(p, BP_COMPARISON.1);
                }
                _ => unreachable!(),
            }

            p.start_node_at(checkpoint, SyntaxKind::Expression);
            p.finish();
            continue;
        }

        if let Some((l_bp, r_bp)) = infix_bp(op) {
            if l_bp < min_bp {
                break;
            }

            p.bump_any();
            p.start_node_at(checkpoint, SyntaxKind::Expression);
            expr_bp(p, r_bp);
            p.finish();
            continue;
        }

        break;
    }
}

fn infix_bp(op: TokenKind) -> Option<(u8, u8)> {
    match op {
        T![or] => Some(BP_OR),
        T![and] => Some(BP_AND),
        T![comparison] => Some(BP_COMPARISON),
        T![||] => Some(BP_CONCAT),
        T![+] | T![-] => Some(BP_ADDITIVE),
        T![*] | T![/] => Some(BP_MULTIPLICATIVE),
        _ => None,
    }
}

/// Parses an identifier group, continuing into a function invocation if an
/// argument list follows.
pub(crate) fn parse_name_or_invocation(p: &mut Parser) {
    let checkpoint = p.checkpoint();

    p.start(SyntaxKind::IdentGroup);
    p.expect_one_of(&[T![ident], T![quoted_ident]]);
    while p.at(T![.]) {
        p.bump(T![.]);
        p.expect_one_of(&[T![ident], T![quoted_ident]]);
    }
    p.finish();

    if p.at(T!["("]) {
        p.start_node_at(checkpoint, SyntaxKind::FunctionInvocation);
        parse_argument_list(p);
        p.finish();
    }
}

/// Parses `:NEW.col`-style correlation references.
fn parse_bind_var_group(p: &mut Parser) {
    p.start(SyntaxKind::IdentGroup);
    p.bump(T![bind_var]);
    while p.at(T![.]) {
        p.bump(T![.]);
        p.expect_one_of(&[T![ident], T![quoted_ident]]);
    }
    p.finish();
}

pub(crate) fn parse_argument_list(p: &mut Parser) {
    p.start(SyntaxKind::ArgumentList);
    p.bump(T!["("]);

    if !p.at(T![")"]) {
        safe_loop!(p, {
            p.start(SyntaxKind::Argument);
            p.eat(T![distinct]);
            if p.at(T![*]) {
                p.bump(T![*]);
            } else if p.at(T![select]) {
                parse_query(p, false);
            } else {
                parse_expr(p);
            }
            p.finish();

            if !p.eat(T![,]) {
                break;
            }
        });
    }

    p.expect(T![")"]);
    p.finish();
}

/// Parses either an `IN` value list or an `IN (SELECT ..)` subquery.
fn parse_paren_list_or_subquery(p: &mut Parser) {
    if p.nth(1) == Some(T![select]) {
        parse_subquery(p);
        return;
    }

    p.expect(T!["("]);
    safe_loop!(p, {
        parse_expr(p);
        if !p.eat(T![,]) {
            break;
        }
    });
    p.expect(T![")"]);
}

pub(crate) fn parse_subquery(p: &mut Parser) {
    p.start(SyntaxKind::Subquery);
    p.expect(T!["("]);
    parse_query(p, false);
    p.expect(T![")"]);
    p.finish();
}

/// Parses a simple or searched CASE expression.
fn parse_case_expr(p: &mut Parser) {
    p.start(SyntaxKind::CaseExpr);
    p.bump(T![case]);

    if !p.at(T![when]) {
        parse_expr(p);
    }

    safe_loop!(p, {
        if !p.eat(T![when]) {
            break;
        }
        parse_expr(p);
        p.expect(T![then]);
        parse_expr(p);

        if p.at(T![else]) || p.at(T![end]) {
            break;
        }
    });

    if p.eat(T![else]) {
        parse_expr(p);
    }

    p.expect(T![end]);
    p.finish();
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::super::tests::{check, parse};
    use super::*;

    #[test]
    fn test_parse_literal() {
        check(
            parse("1", parse_expr),
            expect![[r#"
                Root@0..1
                  Integer@0..1 "1"
            "#]],
        );
    }

    #[test]
    fn test_parse_simple_expr() {
        check(
            parse("1 + a", parse_expr),
            expect![[r#"
                Root@0..5
                  Expression@0..5
                    Integer@0..1 "1"
                    Whitespace@1..2 " "
                    Plus@2..3 "+"
                    Whitespace@3..4 " "
                    IdentGroup@4..5
                      Ident@4..5 "a"
            "#]],
        );
    }

    #[test]
    fn test_parse_op_precedence() {
        check(
            parse("1 + a * 2", parse_expr),
            expect![[r#"
                Root@0..9
                  Expression@0..9
                    Integer@0..1 "1"
                    Whitespace@1..2 " "
                    Plus@2..3 "+"
                    Whitespace@3..4 " "
                    Expression@4..9
                      IdentGroup@4..5
                        Ident@4..5 "a"
                      Whitespace@5..6 " "
                      Asterisk@6..7 "*"
                      Whitespace@7..8 " "
                      Integer@8..9 "2"
            "#]],
        );
    }

    #[test]
    fn test_parse_outer_join_condition() {
        let parsed = parse("a.id = b.id(+)", parse_expr);
        assert!(parsed.ok(), "{:?}", parsed.errors());
        assert_eq!(parsed.syntax().text().to_string(), "a.id = b.id(+)");
    }

    #[test]
    fn test_parse_function_invocation() {
        check(
            parse("NVL(commission, 0)", parse_expr),
            expect![[r#"
                Root@0..18
                  FunctionInvocation@0..18
                    IdentGroup@0..3
                      Ident@0..3 "NVL"
                    ArgumentList@3..18
                      LParen@3..4 "("
                      Argument@4..14
                        IdentGroup@4..14
                          Ident@4..14 "commission"
                      Comma@14..15 ","
                      Whitespace@15..16 " "
                      Argument@16..17
                        Integer@16..17 "0"
                      RParen@17..18 ")"
            "#]],
        );
    }

    #[test]
    fn test_parse_compound_predicates() {
        for input in [
            "x BETWEEN 1 AND 10",
            "x NOT IN (1, 2, 3)",
            "name LIKE '%foo%'",
            "c IS NOT NULL",
            "a = 1 AND (b <= 2 OR c LIKE 'x%')",
        ] {
            let parsed = parse(input, parse_expr);
            assert!(parsed.ok(), "{input}: {:?}", parsed.errors());
            assert_eq!(parsed.syntax().text().to_string(), input);
        }
    }

    #[test]
    fn test_parse_case_expr() {
        let parsed = parse(
            "CASE deptno WHEN 10 THEN 'ACCOUNTING' ELSE 'OTHER' END",
            parse_expr,
        );
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }

    #[test]
    fn test_parse_in_subquery() {
        let parsed = parse("deptno IN (SELECT deptno FROM dept)", parse_expr);
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }
}
