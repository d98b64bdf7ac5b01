// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of package specifications and bodies.
//! Refer to https://docs.oracle.com/en/database/oracle/oracle-database/23/lnpls/CREATE-PACKAGE-BODY-statement.html

use crate::lexer::{TokenKind, T};
use crate::parser::{safe_loop, Parser};
use crate::syntax::SyntaxKind;

use super::{
    parse_cursor_decl, parse_datatype, parse_expr, parse_function, parse_function_header,
    parse_ident, parse_pragma, parse_procedure, parse_procedure_header, parse_stmt,
    parse_type_decl,
};

/// Parses a `CREATE PACKAGE` specification.
pub(crate) fn parse_package_spec(p: &mut Parser) {
    p.start(SyntaxKind::PackageSpec);
    parse_prologue(p, false);

    safe_loop!(p, {
        match p.current() {
            T![function] => {
                parse_function_header(p, true);
                p.expect(T![;]);
            }
            T![procedure] => {
                parse_procedure_header(p, true);
                p.expect(T![;]);
            }
            T![type] => parse_type_decl(p),
            T![cursor] => parse_cursor_decl(p),
            T![pragma] => parse_pragma(p),
            T![end] | T![EOF] => break,
            _ => parse_spec_variable_decl(p),
        }
    });

    parse_epilogue(p);
    p.finish();
}

/// Parses a `CREATE PACKAGE BODY`.
pub(crate) fn parse_package_body(p: &mut Parser) {
    p.start(SyntaxKind::PackageBody);
    parse_prologue(p, true);

    safe_loop!(p, {
        match p.current() {
            T![function] => parse_function(p, true),
            T![procedure] => parse_procedure(p, true),
            T![type] => parse_type_decl(p),
            T![cursor] => parse_cursor_decl(p),
            T![pragma] => parse_pragma(p),
            T![begin] => {
                parse_initializer(p);
                break;
            }
            T![end] | T![EOF] => break,
            _ => parse_spec_variable_decl(p),
        }
    });

    parse_epilogue(p);
    p.finish();
}

fn parse_prologue(p: &mut Parser, body: bool) {
    p.expect(T![create]);
    if p.eat(T![or]) {
        p.expect(T![replace]);
    }

    p.expect(T![package]);
    if body {
        p.expect(T![body]);
    }

    parse_ident(p, 2);
    p.expect_one_of(&[T![as], T![is]]);
}

fn parse_epilogue(p: &mut Parser) {
    p.expect(T![end]);
    p.eat_one_of(&[T![ident], T![quoted_ident]]);
    p.eat(T![;]);
}

/// Parses the package initializer: `BEGIN <stmts>` up to the package-level
/// `END`, which is left for the epilogue.
fn parse_initializer(p: &mut Parser) {
    p.start(SyntaxKind::Block);
    p.bump(T![begin]);

    safe_loop!(p, {
        parse_stmt(p);
        if p.at(T![end]) {
            break;
        }
    });

    p.finish();
}

/// Parses a package-level variable or constant declaration.
fn parse_spec_variable_decl(p: &mut Parser) {
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

#[cfg(test)]
mod tests {
    use super::super::tests::parse;
    use super::*;

    #[test]
    fn test_parse_package_spec() {
        const INPUT: &str = r#"
CREATE OR REPLACE PACKAGE emp_mgmt AS
  g_max_salary NUMBER := 24000;
  g_app_name CONSTANT VARCHAR2(30) := 'HR suite';
  FUNCTION hire(p_last_name VARCHAR2) RETURN NUMBER;
  PROCEDURE remove_emp(p_employee_id NUMBER);
END emp_mgmt;
"#;
        let parsed = parse(INPUT.trim(), parse_package_spec);
        assert!(parsed.ok(), "{:?}", parsed.errors());
        assert_eq!(parsed.syntax().text().to_string(), INPUT.trim());
    }

    #[test]
    fn test_parse_package_body() {
        const INPUT: &str = r#"
CREATE OR REPLACE PACKAGE BODY emp_mgmt AS
  g_counter NUMBER := 0;

  FUNCTION hire(p_last_name VARCHAR2) RETURN NUMBER IS
  BEGIN
    RETURN 1;
  END hire;

  PROCEDURE remove_emp(p_employee_id NUMBER) IS
  BEGIN
    DELETE FROM employees WHERE employee_id = p_employee_id;
  END remove_emp;
END emp_mgmt;
"#;
        let parsed = parse(INPUT.trim(), parse_package_body);
        assert!(parsed.ok(), "{:?}", parsed.errors());
        assert_eq!(parsed.syntax().text().to_string(), INPUT.trim());
    }

    #[test]
    fn test_parse_package_body_with_initializer() {
        const INPUT: &str = r#"
CREATE PACKAGE BODY counters AS
  g_hits NUMBER := 0;
BEGIN
  g_hits := 1;
END counters;
"#;
        let parsed = parse(INPUT.trim(), parse_package_body);
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }

    #[test]
    fn test_parse_package_spec_with_types() {
        const INPUT: &str = r#"
CREATE PACKAGE typed AS
  TYPE emp_rec IS RECORD (empno NUMBER, ename VARCHAR2(10));
  TYPE num_tab IS TABLE OF NUMBER INDEX BY VARCHAR2(30);
  TYPE num_arr IS VARRAY(10) OF NUMBER;
END typed;
"#;
        let parsed = parse(INPUT.trim(), parse_package_spec);
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }
}
