// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of PL/SQL blocks and statements.

use crate::lexer::{TokenKind, T};
use crate::parser::{safe_loop, ParseError, Parser};
use crate::syntax::SyntaxKind;

use super::{
    parse_datatype, parse_delete, parse_expr, parse_ident, parse_insert,
    parse_name_or_invocation, parse_pragma, parse_query, parse_update,
};

/// Parses a complete block: `[DECLARE] <decls> BEGIN <stmts> [EXCEPTION
/// <handlers>] END [label];`.
pub(crate) fn parse_block(p: &mut Parser) {
    p.start(SyntaxKind::Block);

    p.eat(T![declare]);
    if !p.at(T![begin]) {
        parse_declare_section(p);
    }

    p.expect(T![begin]);

    safe_loop!(p, {
        parse_stmt(p);
        if p.at(T![exception]) || p.at(T![end]) {
            break;
        }
    });

    if p.at(T![exception]) {
        parse_exception_section(p);
    }

    p.expect(T![end]);
    p.eat_one_of(&[T![ident], T![quoted_ident]]);
    p.expect(T![;]);

    p.finish();
}

/// Parses declare-section items up to the following `BEGIN` or `END`.
pub(crate) fn parse_declare_section(p: &mut Parser) {
    p.start(SyntaxKind::DeclareSection);

    safe_loop!(p, {
        match p.current() {
            T![type] => parse_type_decl(p),
            T![cursor] => parse_cursor_decl(p),
            T![pragma] => parse_pragma(p),
            T![begin] | T![end] | T![function] | T![procedure] | T![EOF] => break,
            _ => parse_variable_decl(p),
        }

        if p.at(T![begin]) || p.at(T![end]) {
            break;
        }
    });

    p.finish();
}

/// Parses a variable or constant declaration.
///
/// Example:
///   l_total CONSTANT NUMBER(10) := 0;
fn parse_variable_decl(p: &mut Parser) {
    p.start(SyntaxKind::VariableDecl);

    p.expect_one_of(&[T![ident], T![quoted_ident]]);
    p.eat(T![constant]);
    parse_datatype(p);

    if p.eat(T![not]) {
        p.expect(T![null]);
    }

    if p.eat(T![:=]) || p.eat(T![default]) {
        parse_expr(p);
    }

    p.expect(T![;]);
    p.finish();
}

/// Parses a `TYPE .. IS RECORD | TABLE OF | VARRAY` declaration.
pub(crate) fn parse_type_decl(p: &mut Parser) {
    p.start(SyntaxKind::TypeDecl);
    p.bump(T![type]);
    p.expect_one_of(&[T![ident], T![quoted_ident]]);
    p.expect(T![is]);

    match p.current() {
        T![record] => {
            p.bump(T![record]);
            p.expect(T!["("]);

            safe_loop!(p, {
                p.expect_one_of(&[T![ident], T![quoted_ident]]);
                parse_datatype(p);

                if p.eat(T![not]) {
                    p.expect(T![null]);
                }
                if p.eat(T![:=]) || p.eat(T![default]) {
                    parse_expr(p);
                }

                if !p.eat(T![,]) {
                    break;
                }
            });

            p.expect(T![")"]);
        }
        T![table] => {
            p.bump(T![table]);
            p.expect(T![of]);
            parse_datatype(p);

            if p.eat(T![index]) {
                p.expect(T![by]);
                parse_datatype(p);
            }
        }
        T![varray] => {
            p.bump(T![varray]);
            p.expect(T!["("]);
            p.expect(T![integer]);
            p.expect(T![")"]);
            p.expect(T![of]);
            parse_datatype(p);
        }
        current => {
            p.error(ParseError::Unimplemented(format!(
                "type declaration starting with '{current}'"
            )));
        }
    }

    p.expect(T![;]);
    p.finish();
}

/// Parses a cursor declaration: `CURSOR c [(params)] IS <query>;`.
pub(crate) fn parse_cursor_decl(p: &mut Parser) {
    p.start(SyntaxKind::CursorDecl);
    p.bump(T![cursor]);
    p.expect_one_of(&[T![ident], T![quoted_ident]]);

    if p.at(T!["("]) {
        super::parse_param_list(p);
    }

    p.expect(T![is]);
    parse_query(p, false);
    p.eat(T![;]);
    p.finish();
}

/// Parses a single statement inside a block.
pub(crate) fn parse_stmt(p: &mut Parser) {
    p.start(SyntaxKind::BlockStatement);

    match p.current() {
        T![declare] | T![begin] => parse_block(p),
        T![if] => parse_if_stmt(p),
        T![loop] | T![while] | T![for] => parse_loop_stmt(p),
        T![null] => {
            p.start(SyntaxKind::NullStmt);
            p.bump(T![null]);
            p.expect(T![;]);
            p.finish();
        }
        T![return] => {
            p.start(SyntaxKind::ReturnStmt);
            p.bump(T![return]);
            if !p.at(T![;]) {
                parse_expr(p);
            }
            p.expect(T![;]);
            p.finish();
        }
        T![exit] => {
            p.start(SyntaxKind::ExitStmt);
            p.bump(T![exit]);
            if p.eat(T![when]) {
                parse_expr(p);
            }
            p.expect(T![;]);
            p.finish();
        }
        T![raise] => {
            p.start(SyntaxKind::RaiseStmt);
            p.bump(T![raise]);
            if p.at(T![ident]) {
                parse_ident(p, 2);
            }
            p.expect(T![;]);
            p.finish();
        }
        T![select] => parse_query(p, true),
        T![insert] => parse_insert(p),
        T![update] => parse_update(p),
        T![delete] => parse_delete(p),
        current => {
            if !opt_assignment_or_call(p) {
                p.error(ParseError::ExpectedStatement(current));
                p.bump_any();
            }
        }
    }

    p.finish();
}

/// Tries to parse an assignment or a procedure-call statement, returning
/// `false` if neither shape applies.
fn opt_assignment_or_call(p: &mut Parser) -> bool {
    if !matches!(
        p.current(),
        TokenKind::Ident | TokenKind::QuotedIdent | TokenKind::BindVar
    ) {
        return false;
    }

    // Scan past the dotted name to decide between `name := ..` and a call.
    let mut n = 1;
    while p.nth(n) == Some(T![.]) {
        match p.nth(n + 1) {
            Some(T![ident]) | Some(T![quoted_ident]) => n += 2,
            _ => break,
        }
    }

    if p.nth(n) == Some(T![:=]) {
        p.start(SyntaxKind::AssignmentStmt);

        p.start(SyntaxKind::IdentGroup);
        p.bump_any();
        while p.at(T![.]) {
            p.bump(T![.]);
            p.expect_one_of(&[T![ident], T![quoted_ident]]);
        }
        p.finish();

        p.bump(T![:=]);
        parse_expr(p);
        p.expect(T![;]);
        p.finish();
    } else {
        // A call statement; with or without an argument list.
        parse_name_or_invocation(p);
        p.expect(T![;]);
    }

    true
}

fn parse_if_stmt(p: &mut Parser) {
    p.start(SyntaxKind::IfStmt);
    p.bump(T![if]);
    parse_expr(p);
    p.expect(T![then]);

    safe_loop!(p, {
        parse_stmt(p);
        if [T![elsif], T![else], T![end]].contains(&p.current()) {
            break;
        }
    });

    safe_loop!(p, {
        if !p.eat(T![elsif]) {
            break;
        }

        parse_expr(p);
        p.expect(T![then]);

        safe_loop!(p, {
            parse_stmt(p);
            if [T![elsif], T![else], T![end]].contains(&p.current()) {
                break;
            }
        });
    });

    if p.eat(T![else]) {
        safe_loop!(p, {
            parse_stmt(p);
            if p.at(T![end]) {
                break;
            }
        });
    }

    p.expect(T![end]);
    p.expect(T![if]);
    p.expect(T![;]);
    p.finish();
}

fn parse_loop_stmt(p: &mut Parser) {
    p.start(SyntaxKind::LoopStmt);

    match p.current() {
        T![while] => {
            p.bump(T![while]);
            parse_expr(p);
        }
        T![for] => {
            p.bump(T![for]);
            p.expect_one_of(&[T![ident], T![quoted_ident]]);
            p.expect(T![in]);

            if p.at(T!["("]) {
                super::parse_subquery(p);
            } else {
                // Either a numeric range `lo .. hi` or a cursor name.
                parse_expr(p);
                if p.eat(T![.]) {
                    p.expect(T![.]);
                    parse_expr(p);
                }
            }
        }
        _ => {}
    }

    p.expect(T![loop]);

    safe_loop!(p, {
        parse_stmt(p);
        if p.at(T![end]) {
            break;
        }
    });

    p.expect(T![end]);
    p.expect(T![loop]);
    p.expect(T![;]);
    p.finish();
}

fn parse_exception_section(p: &mut Parser) {
    p.start(SyntaxKind::ExceptionSection);
    p.bump(T![exception]);

    safe_loop!(p, {
        if !p.at(T![when]) {
            break;
        }

        p.start(SyntaxKind::ExceptionHandler);
        p.bump(T![when]);

        if !p.eat(T![others]) {
            safe_loop!(p, {
                parse_ident(p, 2);
                if !p.eat(T![or]) {
                    break;
                }
            });
        }

        p.expect(T![then]);

        safe_loop!(p, {
            parse_stmt(p);
            if p.at(T![when]) || p.at(T![end]) {
                break;
            }
        });

        p.finish();

        if p.at(T![end]) {
            break;
        }
    });

    p.finish();
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse;
    use super::*;

    #[test]
    fn test_parse_trigger_style_block() {
        let parsed = parse(
            "BEGIN IF :NEW.salary < 0 THEN :NEW.salary := 0; END IF; END;",
            parse_block,
        );
        assert!(parsed.ok(), "{:?}", parsed.errors());
        assert_eq!(
            parsed.syntax().text().to_string(),
            "BEGIN IF :NEW.salary < 0 THEN :NEW.salary := 0; END IF; END;"
        );
    }

    #[test]
    fn test_parse_declare_block() {
        let parsed = parse(
            "DECLARE l_count NUMBER := 0; BEGIN l_count := l_count + 1; END;",
            parse_block,
        );
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }

    #[test]
    fn test_parse_select_into() {
        let parsed = parse(
            "BEGIN SELECT ename INTO l_name FROM emp WHERE empno = p_empno; END;",
            parse_block,
        );
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }

    #[test]
    fn test_parse_exception_section() {
        let parsed = parse(
            "BEGIN NULL; EXCEPTION WHEN no_data_found THEN RETURN NULL; WHEN OTHERS THEN RAISE; END;",
            parse_block,
        );
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }

    #[test]
    fn test_parse_loops() {
        for input in [
            "BEGIN LOOP EXIT WHEN l_i > 10; END LOOP; END;",
            "BEGIN WHILE l_i < 10 LOOP l_i := l_i + 1; END LOOP; END;",
            "BEGIN FOR i IN 1 .. 10 LOOP NULL; END LOOP; END;",
        ] {
            let parsed = parse(input, parse_block);
            assert!(parsed.ok(), "{input}: {:?}", parsed.errors());
        }
    }

    #[test]
    fn test_parse_call_statement() {
        let parsed = parse(
            "BEGIN log_pkg.write_line('hello'); commit_work; END;",
            parse_block,
        );
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }
}
