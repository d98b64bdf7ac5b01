// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements a syntax-level representation of the input.

use num_traits::{FromPrimitive, ToPrimitive};

use crate::lexer::TokenKind;

/// Represents all possible kinds of syntax items the parser can process.
///
/// Examples
/// * <https://blog.kiranshila.com/blog/easy_cst.md>
/// * <https://arzg.github.io/lang/10/>
/// * <https://github.com/rust-analyzer/rowan/blob/master/examples/s_expressions.rs>
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Ord,
    PartialOrd,
    num_derive::FromPrimitive,
    num_derive::ToPrimitive,
)]
#[repr(u16)]
pub enum SyntaxKind {
    /// Any whitespace character
    Whitespace,
    /// An inline or block comment
    Comment,
    /// A SQL keyword, e.g. `CREATE`
    Keyword,
    /// An identifier, either quoted or unquoted
    Ident,
    /// A bind variable, e.g. `:OLD`
    BindVar,
    /// A single quoted literal
    QuotedLiteral,
    /// Any integer, positive and negative
    Integer,
    /// Any decimal number literal
    Decimal,
    /// A single dot
    Dot,
    /// A single comma
    Comma,
    /// A semicolon
    Semicolon,
    /// An assign operator `:=`
    Assign,
    /// Left paren
    LParen,
    /// Right paren
    RParen,
    /// Percentage symbol
    Percentage,
    /// A plus `+`
    Plus,
    /// A minus `-`
    Minus,
    /// An asterisk `*`
    Asterisk,
    /// Slash char `/`
    Slash,
    /// Any comparison operator, e.g. `=` or `<>`
    ComparisonOp,
    /// A concatenation operator `||`
    Concat,
    /// The Oracle outer-join marker `(+)`
    OracleJoin,
    /// An error token produced by the lexer
    Error,
    /// An identifier group, consisting of multiple idents
    IdentGroup,
    /// A type name with optional precision/scale arguments
    Datatype,
    /// A node that marks a full SELECT statement
    SelectStmt,
    /// A node that contains the whole SELECT column list of a query
    SelectClause,
    /// A single column expression, as part of a SELECT clause
    ColumnExpr,
    /// An `INTO` target list inside PL/SQL SELECT statements
    IntoClause,
    /// A node that contains the whole FROM clause of a query
    FromClause,
    /// A single table reference with an optional alias
    FromItem,
    /// A node that marks the WHERE clause of a query or DML statement
    WhereClause,
    /// The `START WITH .. CONNECT BY ..` clause of a hierarchical query
    HierarchicalClause,
    /// A `GROUP BY` clause, including `HAVING`
    GroupByClause,
    /// An `ORDER BY` clause
    OrderByClause,
    /// A parenthesized subquery
    Subquery,
    /// Any expression non-terminal
    Expression,
    /// A searched or simple CASE expression
    CaseExpr,
    /// An invocation of a function, from the identifier to the closing bracket
    FunctionInvocation,
    /// A list of arguments inside a `FunctionInvocation`
    ArgumentList,
    /// A singular argument inside an argument list
    Argument,
    /// A node that marks a full CREATE [..] FUNCTION block
    Function,
    /// A node that marks a FUNCTION header with params and return type
    FunctionHeader,
    /// A node that marks a full CREATE [..] PROCEDURE block
    Procedure,
    /// A node that marks a PROCEDURE header with params
    ProcedureHeader,
    /// A node that consists of multiple parameters
    ParamList,
    /// A single Param node, consisting of name & type
    Param,
    /// A node that marks a block
    Block,
    /// A node that marks an individual statement inside a block
    BlockStatement,
    /// A node that marks the declare section of a block
    DeclareSection,
    /// A single variable or constant declaration
    VariableDecl,
    /// A PL/SQL type declaration (RECORD, TABLE OF, VARRAY, INDEX BY)
    TypeDecl,
    /// A cursor declaration inside a declare section
    CursorDecl,
    /// The EXCEPTION section of a block
    ExceptionSection,
    /// A single `WHEN .. THEN` exception handler
    ExceptionHandler,
    /// An assignment statement, e.g. `x := 1;`
    AssignmentStmt,
    /// An `IF .. END IF;` statement
    IfStmt,
    /// Any `LOOP`/`WHILE`/`FOR` statement
    LoopStmt,
    /// A `RETURN` statement
    ReturnStmt,
    /// A `NULL;` statement
    NullStmt,
    /// An `EXIT [WHEN ..];` statement
    ExitStmt,
    /// A `RAISE` statement
    RaiseStmt,
    /// A node that marks a full INSERT statement
    InsertStmt,
    /// A node that marks a full UPDATE statement
    UpdateStmt,
    /// A node that marks a full DELETE statement
    DeleteStmt,
    /// A node that marks a full CREATE PACKAGE spec
    PackageSpec,
    /// A node that marks a full CREATE PACKAGE BODY
    PackageBody,
    /// The topmost element of the tree
    Root,
}

impl From<TokenKind> for SyntaxKind {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Whitespace => SyntaxKind::Whitespace,
            TokenKind::Comment => SyntaxKind::Comment,
            TokenKind::Ident | TokenKind::QuotedIdent => SyntaxKind::Ident,
            TokenKind::BindVar => SyntaxKind::BindVar,
            TokenKind::QuotedLiteral => SyntaxKind::QuotedLiteral,
            TokenKind::Integer => SyntaxKind::Integer,
            TokenKind::Decimal => SyntaxKind::Decimal,
            TokenKind::Dot => SyntaxKind::Dot,
            TokenKind::Comma => SyntaxKind::Comma,
            TokenKind::Semicolon => SyntaxKind::Semicolon,
            TokenKind::Assign => SyntaxKind::Assign,
            TokenKind::LParen => SyntaxKind::LParen,
            TokenKind::RParen => SyntaxKind::RParen,
            TokenKind::Percentage => SyntaxKind::Percentage,
            TokenKind::Plus => SyntaxKind::Plus,
            TokenKind::Minus => SyntaxKind::Minus,
            TokenKind::Asterisk => SyntaxKind::Asterisk,
            TokenKind::Slash => SyntaxKind::Slash,
            TokenKind::ComparisonOp => SyntaxKind::ComparisonOp,
            TokenKind::Concat => SyntaxKind::Concat,
            TokenKind::OracleJoin => SyntaxKind::OracleJoin,
            TokenKind::Error | TokenKind::Eof => SyntaxKind::Error,
            kind if kind.is_keyword() => SyntaxKind::Keyword,
            // `is_keyword()` covers every remaining variant.
            _ => SyntaxKind::Error,
        }
    }
}

/// Dummy type for our PL/SQL language definition, for use with rowan.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum SqlProcedureLang {}

impl rowan::Language for SqlProcedureLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        Self::Kind::from_u16(raw.0).unwrap()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind.to_u16().unwrap())
    }
}

/// Typed [`SyntaxNode`] with our [`SqlProcedureLang`] language definition.
pub type SyntaxNode = rowan::SyntaxNode<SqlProcedureLang>;
/// Typed [`SyntaxToken`] with our [`SqlProcedureLang`] language definition.
pub type SyntaxToken = rowan::SyntaxToken<SqlProcedureLang>;
/// Typed [`SyntaxElement`] with our [`SqlProcedureLang`] language definition.
pub type SyntaxElement = rowan::SyntaxElement<SqlProcedureLang>;
