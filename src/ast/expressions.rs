// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements typed AST nodes for SQL expressions.

use crate::syntax::{SyntaxKind, SyntaxNode, SyntaxToken};

use super::{normalize_ident, typed_syntax_node, AstNode};

typed_syntax_node!(Expression, IdentGroup, FunctionInvocation, ArgumentList, Argument, CaseExpr, Subquery);

impl Expression {
    pub fn filter_tokens<F>(&self, filter: F) -> impl Iterator<Item = SyntaxToken>
    where
        F: Fn(&SyntaxToken) -> bool,
    {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(filter)
    }

    /// Whether any token anywhere below this expression satisfies `filter`.
    pub fn contains_token<F>(&self, filter: F) -> bool
    where
        F: Fn(&SyntaxToken) -> bool,
    {
        self.syntax
            .descendants_with_tokens()
            .filter_map(|it| it.into_token())
            .any(|t| filter(&t))
    }
}

impl IdentGroup {
    /// Returns the normalized, dot-separated parts of this identifier group.
    pub fn parts(&self) -> Vec<String> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|t| {
                matches!(
                    t.kind(),
                    SyntaxKind::Ident | SyntaxKind::BindVar | SyntaxKind::Keyword
                )
            })
            .map(|t| normalize_ident(t.text()))
            .collect()
    }

    /// Returns the full name as written in the source.
    pub fn text(&self) -> String {
        self.syntax.text().to_string()
    }

    /// The normalized name, e.g. `hr.employees`.
    pub fn name(&self) -> String {
        self.parts().join(".")
    }

    /// Whether the first component is a bind variable (`:NEW`, `:OLD`).
    pub fn is_bind_var(&self) -> bool {
        self.syntax
            .first_token()
            .map(|t| t.kind() == SyntaxKind::BindVar)
            .unwrap_or(false)
    }
}

impl FunctionInvocation {
    pub fn ident_group(&self) -> Option<IdentGroup> {
        self.syntax.children().find_map(IdentGroup::cast)
    }

    /// The normalized callee name parts, e.g. `["pkg", "fn"]`.
    pub fn name_parts(&self) -> Vec<String> {
        self.ident_group().map(|ig| ig.parts()).unwrap_or_default()
    }

    pub fn argument_list(&self) -> Option<ArgumentList> {
        self.syntax.children().find_map(ArgumentList::cast)
    }

    pub fn arguments(&self) -> Vec<Argument> {
        self.argument_list()
            .map(|list| list.syntax.children().filter_map(Argument::cast).collect())
            .unwrap_or_default()
    }
}

impl Argument {
    /// The argument content; either a single child node or raw tokens.
    pub fn node(&self) -> Option<SyntaxNode> {
        self.syntax.children().next()
    }

    pub fn text(&self) -> String {
        self.syntax.text().to_string()
    }
}

impl Subquery {
    pub fn query(&self) -> Option<super::SelectStmt> {
        self.syntax.children().find_map(super::SelectStmt::cast)
    }
}
