// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of procedures.

use crate::lexer::{TokenKind, T};
use crate::parser::Parser;
use crate::syntax::SyntaxKind;

use super::{parse_block, parse_ident, parse_param_list};

/// Parses a complete procedure definition.
///
/// `nested` procedures (inside package bodies) carry no `CREATE` prologue.
pub(crate) fn parse_procedure(p: &mut Parser, nested: bool) {
    p.start(SyntaxKind::Procedure);
    parse_procedure_header(p, nested);
    p.expect_one_of(&[T![is], T![as]]);
    parse_block(p);
    p.finish();
}

pub(crate) fn parse_procedure_header(p: &mut Parser, nested: bool) {
    p.start(SyntaxKind::ProcedureHeader);

    if !nested {
        p.expect(T![create]);
        if p.eat(T![or]) {
            p.expect(T![replace]);
        }
    }

    p.expect(T![procedure]);
    parse_ident(p, 2);
    parse_param_list(p);

    p.finish();
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse;
    use super::*;

    #[test]
    fn test_parse_standalone_procedure() {
        const INPUT: &str = r#"
CREATE OR REPLACE PROCEDURE add_job_history
  (  p_emp_id          job_history.employee_id%type
   , p_start_date      job_history.start_date%type
   )
IS
BEGIN
  INSERT INTO job_history (employee_id, start_date)
    VALUES(p_emp_id, p_start_date);
END;
"#;
        let parsed = parse(INPUT.trim(), |p| parse_procedure(p, false));
        assert!(parsed.ok(), "{:?}", parsed.errors());
        assert_eq!(parsed.syntax().text().to_string(), INPUT.trim());
    }

    #[test]
    fn test_parse_nested_procedure() {
        let parsed = parse(
            "PROCEDURE reset_counter IS BEGIN g_counter := 0; END;",
            |p| parse_procedure(p, true),
        );
        assert!(parsed.ok(), "{:?}", parsed.errors());
    }
}
