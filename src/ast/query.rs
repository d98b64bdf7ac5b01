// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements typed AST nodes for `SELECT` statements.

use crate::syntax::{SyntaxKind, SyntaxNode, SyntaxToken};

use super::{normalize_ident, typed_syntax_node, AstNode, IdentGroup, Subquery};

typed_syntax_node!(
    SelectStmt,
    SelectClause,
    ColumnExpr,
    IntoClause,
    FromClause,
    FromItem,
    WhereClause,
    HierarchicalClause,
    GroupByClause,
    OrderByClause,
);

impl SelectStmt {
    pub fn select_clause(&self) -> Option<SelectClause> {
        self.syntax.children().find_map(SelectClause::cast)
    }

    pub fn into_clause(&self) -> Option<IntoClause> {
        self.syntax.children().find_map(IntoClause::cast)
    }

    pub fn from_clause(&self) -> Option<FromClause> {
        self.syntax.children().find_map(FromClause::cast)
    }

    pub fn where_clause(&self) -> Option<WhereClause> {
        self.syntax.children().find_map(WhereClause::cast)
    }

    pub fn hierarchical_clause(&self) -> Option<HierarchicalClause> {
        self.syntax.children().find_map(HierarchicalClause::cast)
    }

    pub fn group_by_clause(&self) -> Option<GroupByClause> {
        self.syntax.children().find_map(GroupByClause::cast)
    }

    pub fn order_by_clause(&self) -> Option<OrderByClause> {
        self.syntax.children().find_map(OrderByClause::cast)
    }

    /// A chained set operation (`UNION [ALL] SELECT ..`), if present.
    pub fn union_query(&self) -> Option<SelectStmt> {
        self.syntax.children().find_map(SelectStmt::cast)
    }
}

impl SelectClause {
    pub fn columns(&self) -> Vec<ColumnExpr> {
        self.syntax.children().filter_map(ColumnExpr::cast).collect()
    }
}

impl ColumnExpr {
    /// Whether this column expression is a plain `*`.
    pub fn is_asterisk(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .any(|t| t.kind() == SyntaxKind::Asterisk)
    }

    /// The expression content as a node, when it is one.
    pub fn expression(&self) -> Option<SyntaxNode> {
        self.syntax.children().next()
    }

    /// The column alias: the trailing identifier token directly below this
    /// node, e.g. `p` in `SYS_CONNECT_BY_PATH(name, '/') p`.
    pub fn alias(&self) -> Option<String> {
        self.alias_token().map(|t| normalize_ident(t.text()))
    }

    pub fn alias_token(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|t| t.kind() == SyntaxKind::Ident)
            .last()
    }
}

impl IntoClause {
    pub fn targets(&self) -> Vec<IdentGroup> {
        self.syntax.children().filter_map(IdentGroup::cast).collect()
    }
}

impl FromClause {
    pub fn items(&self) -> Vec<FromItem> {
        self.syntax.children().filter_map(FromItem::cast).collect()
    }
}

impl FromItem {
    /// The referenced table name, unless this item is a subquery.
    pub fn name(&self) -> Option<IdentGroup> {
        self.syntax.children().find_map(IdentGroup::cast)
    }

    pub fn subquery(&self) -> Option<Subquery> {
        self.syntax.children().find_map(Subquery::cast)
    }

    /// The table alias: a trailing identifier token directly below this node.
    pub fn alias(&self) -> Option<String> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|t| t.kind() == SyntaxKind::Ident)
            .last()
            .map(|t| normalize_ident(t.text()))
    }
}

impl WhereClause {
    /// The condition tree below the `WHERE` keyword.
    pub fn condition(&self) -> Option<SyntaxNode> {
        self.syntax.children().next()
    }
}

impl HierarchicalClause {
    /// The `START WITH` condition, if present.
    pub fn start_with(&self) -> Option<SyntaxNode> {
        let mut after_start_with = false;

        for element in self.syntax.children_with_tokens() {
            match element {
                rowan::NodeOrToken::Token(t)
                    if t.kind() == SyntaxKind::Keyword
                        && t.text().eq_ignore_ascii_case("start") =>
                {
                    after_start_with = true;
                }
                rowan::NodeOrToken::Token(t)
                    if t.kind() == SyntaxKind::Keyword
                        && t.text().eq_ignore_ascii_case("connect") =>
                {
                    after_start_with = false;
                }
                rowan::NodeOrToken::Node(n) if after_start_with => return Some(n),
                _ => {}
            }
        }

        None
    }

    /// The `CONNECT BY` condition.
    pub fn connect_by(&self) -> Option<SyntaxNode> {
        let mut after_connect_by = false;

        for element in self.syntax.children_with_tokens() {
            match element {
                rowan::NodeOrToken::Token(t)
                    if t.kind() == SyntaxKind::Keyword
                        && t.text().eq_ignore_ascii_case("connect") =>
                {
                    after_connect_by = true;
                }
                rowan::NodeOrToken::Token(t)
                    if t.kind() == SyntaxKind::Keyword
                        && t.text().eq_ignore_ascii_case("start") =>
                {
                    after_connect_by = false;
                }
                rowan::NodeOrToken::Node(n) if after_connect_by => return Some(n),
                _ => {}
            }
        }

        None
    }

    pub fn is_nocycle(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .any(|t| t.kind() == SyntaxKind::Keyword && t.text().eq_ignore_ascii_case("nocycle"))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::Root;
    use crate::parser::parse_select;

    #[test]
    fn access_select_parts() {
        let parse = parse_select(
            "SELECT a.id, b.name FROM a, b WHERE a.id = b.id(+) ORDER BY a.id",
        );
        let root = Root::cast(parse.syntax()).unwrap();
        let query = root.query().unwrap();

        let columns = query.select_clause().unwrap().columns();
        assert_eq!(columns.len(), 2);

        let items = query.from_clause().unwrap().items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name().unwrap().name(), "a");

        assert!(query.where_clause().is_some());
        assert!(query.order_by_clause().is_some());
        assert!(query.hierarchical_clause().is_none());
    }

    #[test]
    fn access_hierarchical_parts() {
        let parse = parse_select(
            "SELECT id FROM t START WITH parent IS NULL CONNECT BY PRIOR id = parent",
        );
        let root = Root::cast(parse.syntax()).unwrap();
        let query = root.query().unwrap();
        let hierarchical = query.hierarchical_clause().unwrap();

        assert_eq!(
            hierarchical.start_with().unwrap().text().to_string(),
            "parent IS NULL"
        );
        assert_eq!(
            hierarchical.connect_by().unwrap().text().to_string(),
            "PRIOR id = parent"
        );
        assert!(!hierarchical.is_nocycle());
    }

    #[test]
    fn from_item_alias() {
        let parse = parse_select("SELECT e.ename FROM emp e");
        let root = Root::cast(parse.syntax()).unwrap();
        let items = root.query().unwrap().from_clause().unwrap().items();
        assert_eq!(items[0].name().unwrap().name(), "emp");
        assert_eq!(items[0].alias(), Some("e".to_string()));
    }
}
