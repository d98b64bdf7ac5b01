// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of functions.

use crate::lexer::{TokenKind, T};
use crate::parser::Parser;
use crate::syntax::SyntaxKind;

use super::{parse_block, parse_datatype, parse_ident, parse_param_list};

/// Parses a complete function definition.
///
/// `nested` functions (inside package bodies) carry no `CREATE` prologue.
pub(crate) fn parse_function(p: &mut Parser, nested: bool) {
    p.start(SyntaxKind::Function);
    parse_function_header(p, nested);
    p.expect_one_of(&[T![is], T![as]]);
    parse_block(p);
    p.finish();
}

pub(crate) fn parse_function_header(p: &mut Parser, nested: bool) {
    p.start(SyntaxKind::FunctionHeader);

    if !nested {
        p.expect(T![create]);
        if p.eat(T![or]) {
            p.expect(T![replace]);
        }
    }

    p.expect(T![function]);
    parse_ident(p, 2);
    parse_param_list(p);

    p.expect(T![return]);
    parse_datatype(p);
    p.eat(T![deterministic]);

    p.finish();
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse;
    use super::*;

    #[test]
    fn test_parse_standalone_function() {
        const INPUT: &str = r#"
CREATE OR REPLACE FUNCTION get_salary(p_empno IN NUMBER) RETURN NUMBER IS
  l_sal NUMBER;
BEGIN
  SELECT sal INTO l_sal FROM emp WHERE empno = p_empno;
  RETURN l_sal;
END;
"#;
        let parsed = parse(INPUT.trim(), |p| parse_function(p, false));
        assert!(parsed.ok(), "{:?}", parsed.errors());
        assert_eq!(parsed.syntax().text().to_string(), INPUT.trim());
    }

    #[test]
    fn test_parse_deterministic_function() {
        let parsed = parse(
            "CREATE FUNCTION double_it(p_n NUMBER) RETURN NUMBER DETERMINISTIC IS BEGIN RETURN p_n * 2; END;",
            |p| parse_function(p, false),
        );
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }
}
