// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements grammar parsing of the token stream from the lexer.

mod block;
mod datatype;
mod dml;
mod expressions;
mod function;
mod package;
mod procedure;
mod query;

pub(crate) use block::*;
pub(crate) use datatype::*;
pub(crate) use dml::*;
pub(crate) use expressions::*;
pub(crate) use function::*;
pub(crate) use package::*;
pub(crate) use procedure::*;
pub(crate) use query::*;

use crate::lexer::{TokenKind, T};
use crate::parser::{safe_loop, Parser};
use crate::syntax::SyntaxKind;

/// Dispatches on `CREATE [OR REPLACE] FUNCTION | PROCEDURE`.
pub(crate) fn parse_function_or_procedure(p: &mut Parser) {
    let mut n = 0;
    let routine = loop {
        match p.nth(n) {
            Some(T![function]) | None => break T![function],
            Some(T![procedure]) => break T![procedure],
            _ if n > 4 => break T![function],
            _ => n += 1,
        }
    };

    if routine == T![procedure] {
        parse_procedure(p, false);
    } else {
        parse_function(p, false);
    }
}

/// Parses a dot-separated identifier group with up to `max_parts` parts.
///
/// Records an error when no identifier is present at all.
pub(crate) fn parse_ident(p: &mut Parser, max_parts: u8) {
    p.start(SyntaxKind::IdentGroup);

    if !p.expect_one_of(&[T![ident], T![quoted_ident]]) {
        p.finish();
        return;
    }

    let mut parts = 1;
    while parts < max_parts && p.at(T![.]) {
        p.bump(T![.]);
        p.expect_one_of(&[T![ident], T![quoted_ident]]);
        parts += 1;
    }

    p.finish();
}

/// Parses the parameter list in a function or procedure header.
pub(crate) fn parse_param_list(p: &mut Parser) {
    if p.at(T!["("]) {
        p.start(SyntaxKind::ParamList);
        p.bump(T!["("]);

        safe_loop!(p, {
            parse_param(p);
            if !p.eat(T![,]) {
                break;
            }
        });

        p.expect(T![")"]);
        p.finish();
    }
}

/// Parses a single parameter in a parameter list.
///
/// Example:
///   p_name IN VARCHAR2 := 'unknown'
fn parse_param(p: &mut Parser) {
    p.start(SyntaxKind::Param);
    p.expect_one_of(&[T![ident], T![quoted_ident]]);

    p.eat(T![in]);
    p.eat(T![out]);
    p.eat(T![nocopy]);

    parse_datatype(p);

    if p.eat(T![:=]) || p.eat(T![default]) {
        parse_expr(p);
    }

    p.finish();
}

/// Skips a `PRAGMA ..;` directive, which carries no meaning in PostgreSQL.
pub(crate) fn parse_pragma(p: &mut Parser) {
    p.bump(T![pragma]);
    safe_loop!(p, {
        if p.eat(T![;]) {
            break;
        }
        p.bump_any();
    });
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::parser::{Parse, Parser};
    use expect_test::Expect;

    /// Helper function to compare the built syntax tree with the expected
    /// output.
    pub fn check(parse: Parse, expected_tree: Expect) {
        expected_tree.assert_eq(parse.tree().as_str())
    }

    /// A helper to allow to call the different parse functions.
    pub fn parse<F>(input: &str, f: F) -> Parse
    where
        F: Fn(&mut Parser),
    {
        let mut parser = Parser::new(input);
        f(&mut parser);
        parser.build()
    }

    #[test]
    fn test_parse_ident() {
        check(
            parse("hello", |p| super::parse_ident(p, 1)),
            expect_test::expect![[r#"
                Root@0..5
                  IdentGroup@0..5
                    Ident@0..5 "hello"
            "#]],
        );
    }

    #[test]
    fn test_parse_qualified_ident() {
        check(
            parse("hr.employees", |p| super::parse_ident(p, 2)),
            expect_test::expect![[r#"
                Root@0..12
                  IdentGroup@0..12
                    Ident@0..2 "hr"
                    Dot@2..3 "."
                    Ident@3..12 "employees"
            "#]],
        );
    }

    #[test]
    fn test_parse_param_with_default() {
        check(
            parse("p2 VARCHAR2 := 'not empty'", super::parse_param),
            expect_test::expect![[r#"
                Root@0..26
                  Param@0..26
                    Ident@0..2 "p2"
                    Whitespace@2..3 " "
                    Datatype@3..11
                      Ident@3..11 "VARCHAR2"
                    Whitespace@11..12 " "
                    Assign@12..14 ":="
                    Whitespace@14..15 " "
                    QuotedLiteral@15..26 "'not empty'"
            "#]],
        );
    }
}
