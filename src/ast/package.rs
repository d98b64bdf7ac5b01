// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements typed AST nodes for package specifications and bodies.

use super::{typed_syntax_node, AstNode, Block, Function, IdentGroup, Procedure, TypeDecl,
    VariableDecl};

typed_syntax_node!(PackageSpec, PackageBody);

impl PackageSpec {
    pub fn ident_group(&self) -> Option<IdentGroup> {
        self.syntax.children().find_map(IdentGroup::cast)
    }

    pub fn name(&self) -> Option<String> {
        self.ident_group().map(|ig| ig.name())
    }

    pub fn variable_decls(&self) -> Vec<VariableDecl> {
        self.syntax
            .children()
            .filter_map(VariableDecl::cast)
            .collect()
    }

    pub fn type_decls(&self) -> Vec<TypeDecl> {
        self.syntax.children().filter_map(TypeDecl::cast).collect()
    }
}

impl PackageBody {
    pub fn ident_group(&self) -> Option<IdentGroup> {
        self.syntax.children().find_map(IdentGroup::cast)
    }

    pub fn name(&self) -> Option<String> {
        self.ident_group().map(|ig| ig.name())
    }

    pub fn variable_decls(&self) -> Vec<VariableDecl> {
        self.syntax
            .children()
            .filter_map(VariableDecl::cast)
            .collect()
    }

    pub fn functions(&self) -> Vec<Function> {
        self.syntax.children().filter_map(Function::cast).collect()
    }

    pub fn procedures(&self) -> Vec<Procedure> {
        self.syntax.children().filter_map(Procedure::cast).collect()
    }

    /// The package initializer block, if present.
    pub fn initializer(&self) -> Option<Block> {
        self.syntax.children().find_map(Block::cast)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::Root;
    use crate::parser::parse_package_body;

    #[test]
    fn access_package_body_parts() {
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
        let parse = parse_package_body(INPUT.trim());
        assert!(parse.ok(), "{:?}", parse.errors());

        let root = Root::cast(parse.syntax()).unwrap();
        let body = root.package_body().unwrap();

        assert_eq!(body.name(), Some("emp_mgmt".to_string()));
        assert_eq!(body.variable_decls().len(), 1);
        assert_eq!(body.functions().len(), 1);
        assert_eq!(body.procedures().len(), 1);
        assert!(body.initializer().is_none());
    }
}
