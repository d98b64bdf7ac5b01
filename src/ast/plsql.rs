// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements typed AST nodes for PL/SQL functions, procedures and blocks.

use crate::syntax::{SyntaxKind, SyntaxNode};

use super::{normalize_ident, typed_syntax_node, AstNode, IdentGroup};

typed_syntax_node!(
    Function,
    FunctionHeader,
    Procedure,
    ProcedureHeader,
    ParamList,
    Param,
    Datatype,
    Block,
    BlockStatement,
    DeclareSection,
    VariableDecl,
    TypeDecl,
    CursorDecl,
    ExceptionSection,
    ExceptionHandler,
    AssignmentStmt,
);

impl Function {
    pub fn header(&self) -> Option<FunctionHeader> {
        self.syntax.children().find_map(FunctionHeader::cast)
    }

    pub fn name(&self) -> Option<String> {
        self.header()?.name()
    }

    pub fn param_list(&self) -> Option<ParamList> {
        self.header()?.param_list()
    }

    pub fn return_type(&self) -> Option<Datatype> {
        self.header()?.return_type()
    }

    pub fn block(&self) -> Option<Block> {
        self.syntax.children().find_map(Block::cast)
    }
}

impl FunctionHeader {
    pub fn ident_group(&self) -> Option<IdentGroup> {
        self.syntax.children().find_map(IdentGroup::cast)
    }

    pub fn name(&self) -> Option<String> {
        self.ident_group().map(|ig| ig.name())
    }

    pub fn param_list(&self) -> Option<ParamList> {
        self.syntax.children().find_map(ParamList::cast)
    }

    pub fn return_type(&self) -> Option<Datatype> {
        self.syntax.children().find_map(Datatype::cast)
    }
}

impl Procedure {
    pub fn header(&self) -> Option<ProcedureHeader> {
        self.syntax.children().find_map(ProcedureHeader::cast)
    }

    pub fn name(&self) -> Option<String> {
        self.header()?.name()
    }

    pub fn param_list(&self) -> Option<ParamList> {
        self.header()?.param_list()
    }

    pub fn block(&self) -> Option<Block> {
        self.syntax.children().find_map(Block::cast)
    }
}

impl ProcedureHeader {
    pub fn ident_group(&self) -> Option<IdentGroup> {
        self.syntax.children().find_map(IdentGroup::cast)
    }

    pub fn name(&self) -> Option<String> {
        self.ident_group().map(|ig| ig.name())
    }

    pub fn param_list(&self) -> Option<ParamList> {
        self.syntax.children().find_map(ParamList::cast)
    }
}

impl ParamList {
    pub fn params(&self) -> Vec<Param> {
        self.syntax.children().filter_map(Param::cast).collect()
    }
}

impl Param {
    pub fn name(&self) -> Option<String> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| t.kind() == SyntaxKind::Ident)
            .map(|t| normalize_ident(t.text()))
    }

    pub fn datatype(&self) -> Option<Datatype> {
        self.syntax.children().find_map(Datatype::cast)
    }

    /// Whether the parameter carries the `OUT` mode (plain or `IN OUT`).
    pub fn is_out(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .any(|t| t.kind() == SyntaxKind::Keyword && t.text().eq_ignore_ascii_case("out"))
    }
}

impl Datatype {
    pub fn text(&self) -> String {
        self.syntax.text().to_string()
    }

    /// Whether this is an anchored `%TYPE`/`%ROWTYPE` reference.
    pub fn is_anchored(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .any(|t| t.kind() == SyntaxKind::Percentage)
    }
}

impl Block {
    pub fn declare_section(&self) -> Option<DeclareSection> {
        self.syntax.children().find_map(DeclareSection::cast)
    }

    pub fn statements(&self) -> Vec<BlockStatement> {
        self.syntax
            .children()
            .filter_map(BlockStatement::cast)
            .collect()
    }

    pub fn exception_section(&self) -> Option<ExceptionSection> {
        self.syntax.children().find_map(ExceptionSection::cast)
    }
}

impl DeclareSection {
    pub fn variable_decls(&self) -> Vec<VariableDecl> {
        self.syntax
            .children()
            .filter_map(VariableDecl::cast)
            .collect()
    }
}

impl VariableDecl {
    pub fn name(&self) -> Option<String> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| t.kind() == SyntaxKind::Ident)
            .map(|t| normalize_ident(t.text()))
    }

    pub fn datatype(&self) -> Option<Datatype> {
        self.syntax.children().find_map(Datatype::cast)
    }

    pub fn is_constant(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .any(|t| t.kind() == SyntaxKind::Keyword && t.text().eq_ignore_ascii_case("constant"))
    }

    /// The raw default expression text following `:=` or `DEFAULT`.
    pub fn default_text(&self) -> Option<String> {
        let mut after_assign = false;
        let mut text = String::new();

        for element in self.syntax.children_with_tokens() {
            match &element {
                rowan::NodeOrToken::Token(t)
                    if t.kind() == SyntaxKind::Assign
                        || (t.kind() == SyntaxKind::Keyword
                            && t.text().eq_ignore_ascii_case("default")) =>
                {
                    after_assign = true;
                    continue;
                }
                rowan::NodeOrToken::Token(t) if t.kind() == SyntaxKind::Semicolon => break,
                _ => {}
            }

            if after_assign {
                match element {
                    rowan::NodeOrToken::Token(t) => text.push_str(t.text()),
                    rowan::NodeOrToken::Node(n) => text.push_str(&n.text().to_string()),
                }
            }
        }

        let text = text.trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

impl TypeDecl {
    pub fn name(&self) -> Option<String> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| t.kind() == SyntaxKind::Ident)
            .map(|t| normalize_ident(t.text()))
    }
}

impl AssignmentStmt {
    pub fn target(&self) -> Option<IdentGroup> {
        self.syntax.children().find_map(IdentGroup::cast)
    }

    /// Everything between `:=` and the closing semicolon.
    pub fn value_elements(&self) -> Vec<crate::syntax::SyntaxElement> {
        let mut after_assign = false;
        let mut elements = Vec::new();

        for element in self.syntax.children_with_tokens() {
            match &element {
                rowan::NodeOrToken::Token(t) if t.kind() == SyntaxKind::Assign => {
                    after_assign = true;
                    continue;
                }
                rowan::NodeOrToken::Token(t) if t.kind() == SyntaxKind::Semicolon => break,
                _ => {}
            }

            if after_assign {
                elements.push(element);
            }
        }

        elements
    }
}

impl BlockStatement {
    /// The statement content node, when the statement is node-shaped.
    pub fn content(&self) -> Option<SyntaxNode> {
        self.syntax.children().next()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::Root;
    use crate::parser::parse_function_or_procedure;

    #[test]
    fn access_function_parts() {
        let parse = parse_function_or_procedure(
            "CREATE FUNCTION get_sal(p_empno IN NUMBER) RETURN NUMBER IS BEGIN RETURN 1; END;",
        );
        let root = Root::cast(parse.syntax()).unwrap();
        let function = root.function().unwrap();

        assert_eq!(function.name(), Some("get_sal".to_string()));
        let params = function.param_list().unwrap().params();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name(), Some("p_empno".to_string()));
        assert!(!params[0].is_out());
        assert_eq!(
            function.return_type().map(|d| d.text()),
            Some("NUMBER".to_string())
        );
    }

    #[test]
    fn access_procedure_parts() {
        let parse = parse_function_or_procedure(
            "CREATE OR REPLACE PROCEDURE secure_dml(p_out OUT NUMBER) IS BEGIN p_out := 1; END;",
        );
        let root = Root::cast(parse.syntax()).unwrap();
        let procedure = root.procedure().unwrap();

        assert_eq!(procedure.name(), Some("secure_dml".to_string()));
        assert!(procedure.param_list().unwrap().params()[0].is_out());

        let block = procedure.block().unwrap();
        assert_eq!(block.statements().len(), 1);
    }
}
