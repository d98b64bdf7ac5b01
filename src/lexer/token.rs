// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Token definition for the [`logos`] lexer.

use std::fmt;

/// Used to tokenize the input text.
#[derive(logos::Logos, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    #[regex("[ \t\n\r]+")]
    Whitespace,

    #[regex("--[^\n]*")]
    #[regex(r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
    Comment,

    #[token("all", ignore(case))]
    AllKw,

    #[token("and", ignore(case))]
    AndKw,

    #[token("as", ignore(case))]
    AsKw,

    #[token("asc", ignore(case))]
    AscKw,

    #[token("begin", ignore(case))]
    BeginKw,

    #[token("between", ignore(case))]
    BetweenKw,

    #[token("body", ignore(case))]
    BodyKw,

    #[token("by", ignore(case))]
    ByKw,

    #[token("case", ignore(case))]
    CaseKw,

    #[token("connect", ignore(case))]
    ConnectKw,

    #[token("constant", ignore(case))]
    ConstantKw,

    #[token("create", ignore(case))]
    CreateKw,

    #[token("cursor", ignore(case))]
    CursorKw,

    #[token("date", ignore(case))]
    DateKw,

    #[token("declare", ignore(case))]
    DeclareKw,

    #[token("default", ignore(case))]
    DefaultKw,

    #[token("delete", ignore(case))]
    DeleteKw,

    #[token("desc", ignore(case))]
    DescKw,

    #[token("deterministic", ignore(case))]
    DeterministicKw,

    #[token("distinct", ignore(case))]
    DistinctKw,

    #[token("else", ignore(case))]
    ElseKw,

    #[token("elsif", ignore(case))]
    ElsifKw,

    #[token("end", ignore(case))]
    EndKw,

    #[token("exception", ignore(case))]
    ExceptionKw,

    #[token("exit", ignore(case))]
    ExitKw,

    #[token("first", ignore(case))]
    FirstKw,

    #[token("for", ignore(case))]
    ForKw,

    #[token("from", ignore(case))]
    FromKw,

    #[token("function", ignore(case))]
    FunctionKw,

    #[token("group", ignore(case))]
    GroupKw,

    #[token("having", ignore(case))]
    HavingKw,

    #[token("if", ignore(case))]
    IfKw,

    #[token("in", ignore(case))]
    InKw,

    #[token("index", ignore(case))]
    IndexKw,

    #[token("insert", ignore(case))]
    InsertKw,

    #[token("into", ignore(case))]
    IntoKw,

    #[token("is", ignore(case))]
    IsKw,

    #[token("last", ignore(case))]
    LastKw,

    #[token("level", ignore(case))]
    LevelKw,

    #[regex(r"(?i)i?like")]
    LikeKw,

    #[token("loop", ignore(case))]
    LoopKw,

    #[token("member", ignore(case))]
    MemberKw,

    #[token("nocopy", ignore(case))]
    NocopyKw,

    #[token("nocycle", ignore(case))]
    NocycleKw,

    #[token("not", ignore(case))]
    NotKw,

    #[token("null", ignore(case))]
    NullKw,

    #[token("nulls", ignore(case))]
    NullsKw,

    #[token("of", ignore(case))]
    OfKw,

    #[token("or", priority = 100, ignore(case))]
    OrKw,

    #[token("order", ignore(case))]
    OrderKw,

    #[token("others", ignore(case))]
    OthersKw,

    #[token("out", ignore(case))]
    OutKw,

    #[token("package", ignore(case))]
    PackageKw,

    #[token("pragma", ignore(case))]
    PragmaKw,

    #[token("prior", ignore(case))]
    PriorKw,

    #[token("procedure", ignore(case))]
    ProcedureKw,

    #[token("raise", ignore(case))]
    RaiseKw,

    #[token("record", ignore(case))]
    RecordKw,

    #[token("replace", ignore(case))]
    ReplaceKw,

    #[token("return", ignore(case))]
    ReturnKw,

    #[token("rowtype", ignore(case))]
    RowtypeKw,

    #[token("select", ignore(case))]
    SelectKw,

    #[token("set", ignore(case))]
    SetKw,

    #[token("start", ignore(case))]
    StartKw,

    #[token("static", ignore(case))]
    StaticKw,

    #[token("table", ignore(case))]
    TableKw,

    #[token("then", ignore(case))]
    ThenKw,

    #[token("timestamp", ignore(case))]
    TimestampKw,

    #[token("type", ignore(case))]
    TypeKw,

    #[token("union", ignore(case))]
    UnionKw,

    #[token("update", ignore(case))]
    UpdateKw,

    #[token("values", ignore(case))]
    ValuesKw,

    #[token("varray", ignore(case))]
    VarrayKw,

    #[token("when", ignore(case))]
    WhenKw,

    #[token("where", ignore(case))]
    WhereKw,

    #[token("while", ignore(case))]
    WhileKw,

    #[token("with", ignore(case))]
    WithKw,

    #[token("(+)")]
    OracleJoin,

    #[regex(r"[0-9]+\.[0-9]+")]
    Decimal,

    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r"(?i)[a-z_][a-z0-9_$#]*", priority = 1)]
    Ident,

    #[regex(r#""(?:[^"]|"")+""#)]
    QuotedIdent,

    #[regex(r":(?i)[a-z_][a-z0-9_]*")]
    BindVar,

    #[regex(r"'(?:[^']|'')*'")]
    QuotedLiteral,

    #[token(".")]
    Dot,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token(":=")]
    Assign,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("%")]
    Percentage,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Asterisk,

    #[token("/")]
    Slash,

    #[regex("=|<>|!=|<=|>=|<|>")]
    ComparisonOp,

    #[token("||")]
    Concat,

    /// Produced for input the lexer does not recognize.
    Error,

    /// Marker token to indicate end of input, not produced by the lexer.
    Eof,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment)
    }

    pub fn is_keyword(self) -> bool {
        (Self::AllKw as u16..=Self::WithKw as u16).contains(&(self as u16))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Shorthand for referring to [`TokenKind`] variants by their spelling.
macro_rules! T {
    [EOF] => { $crate::lexer::TokenKind::Eof };
    [ident] => { $crate::lexer::TokenKind::Ident };
    [quoted_ident] => { $crate::lexer::TokenKind::QuotedIdent };
    [quoted_literal] => { $crate::lexer::TokenKind::QuotedLiteral };
    [bind_var] => { $crate::lexer::TokenKind::BindVar };
    [integer] => { $crate::lexer::TokenKind::Integer };
    [decimal] => { $crate::lexer::TokenKind::Decimal };
    [comparison] => { $crate::lexer::TokenKind::ComparisonOp };
    ["(+)"] => { $crate::lexer::TokenKind::OracleJoin };
    ["("] => { $crate::lexer::TokenKind::LParen };
    [")"] => { $crate::lexer::TokenKind::RParen };
    [.] => { $crate::lexer::TokenKind::Dot };
    [,] => { $crate::lexer::TokenKind::Comma };
    [;] => { $crate::lexer::TokenKind::Semicolon };
    [:=] => { $crate::lexer::TokenKind::Assign };
    [%] => { $crate::lexer::TokenKind::Percentage };
    [+] => { $crate::lexer::TokenKind::Plus };
    [-] => { $crate::lexer::TokenKind::Minus };
    [*] => { $crate::lexer::TokenKind::Asterisk };
    [/] => { $crate::lexer::TokenKind::Slash };
    [||] => { $crate::lexer::TokenKind::Concat };
    [all] => { $crate::lexer::TokenKind::AllKw };
    [and] => { $crate::lexer::TokenKind::AndKw };
    [as] => { $crate::lexer::TokenKind::AsKw };
    [asc] => { $crate::lexer::TokenKind::AscKw };
    [begin] => { $crate::lexer::TokenKind::BeginKw };
    [between] => { $crate::lexer::TokenKind::BetweenKw };
    [body] => { $crate::lexer::TokenKind::BodyKw };
    [by] => { $crate::lexer::TokenKind::ByKw };
    [case] => { $crate::lexer::TokenKind::CaseKw };
    [connect] => { $crate::lexer::TokenKind::ConnectKw };
    [constant] => { $crate::lexer::TokenKind::ConstantKw };
    [create] => { $crate::lexer::TokenKind::CreateKw };
    [cursor] => { $crate::lexer::TokenKind::CursorKw };
    [date] => { $crate::lexer::TokenKind::DateKw };
    [declare] => { $crate::lexer::TokenKind::DeclareKw };
    [default] => { $crate::lexer::TokenKind::DefaultKw };
    [delete] => { $crate::lexer::TokenKind::DeleteKw };
    [desc] => { $crate::lexer::TokenKind::DescKw };
    [deterministic] => { $crate::lexer::TokenKind::DeterministicKw };
    [distinct] => { $crate::lexer::TokenKind::DistinctKw };
    [else] => { $crate::lexer::TokenKind::ElseKw };
    [elsif] => { $crate::lexer::TokenKind::ElsifKw };
    [end] => { $crate::lexer::TokenKind::EndKw };
    [exception] => { $crate::lexer::TokenKind::ExceptionKw };
    [exit] => { $crate::lexer::TokenKind::ExitKw };
    [first] => { $crate::lexer::TokenKind::FirstKw };
    [for] => { $crate::lexer::TokenKind::ForKw };
    [from] => { $crate::lexer::TokenKind::FromKw };
    [function] => { $crate::lexer::TokenKind::FunctionKw };
    [group] => { $crate::lexer::TokenKind::GroupKw };
    [having] => { $crate::lexer::TokenKind::HavingKw };
    [if] => { $crate::lexer::TokenKind::IfKw };
    [in] => { $crate::lexer::TokenKind::InKw };
    [index] => { $crate::lexer::TokenKind::IndexKw };
    [insert] => { $crate::lexer::TokenKind::InsertKw };
    [into] => { $crate::lexer::TokenKind::IntoKw };
    [is] => { $crate::lexer::TokenKind::IsKw };
    [last] => { $crate::lexer::TokenKind::LastKw };
    [level] => { $crate::lexer::TokenKind::LevelKw };
    [like] => { $crate::lexer::TokenKind::LikeKw };
    [loop] => { $crate::lexer::TokenKind::LoopKw };
    [member] => { $crate::lexer::TokenKind::MemberKw };
    [nocopy] => { $crate::lexer::TokenKind::NocopyKw };
    [nocycle] => { $crate::lexer::TokenKind::NocycleKw };
    [not] => { $crate::lexer::TokenKind::NotKw };
    [null] => { $crate::lexer::TokenKind::NullKw };
    [nulls] => { $crate::lexer::TokenKind::NullsKw };
    [of] => { $crate::lexer::TokenKind::OfKw };
    [or] => { $crate::lexer::TokenKind::OrKw };
    [order] => { $crate::lexer::TokenKind::OrderKw };
    [others] => { $crate::lexer::TokenKind::OthersKw };
    [out] => { $crate::lexer::TokenKind::OutKw };
    [package] => { $crate::lexer::TokenKind::PackageKw };
    [pragma] => { $crate::lexer::TokenKind::PragmaKw };
    [prior] => { $crate::lexer::TokenKind::PriorKw };
    [procedure] => { $crate::lexer::TokenKind::ProcedureKw };
    [raise] => { $crate::lexer::TokenKind::RaiseKw };
    [record] => { $crate::lexer::TokenKind::RecordKw };
    [replace] => { $crate::lexer::TokenKind::ReplaceKw };
    [return] => { $crate::lexer::TokenKind::ReturnKw };
    [rowtype] => { $crate::lexer::TokenKind::RowtypeKw };
    [select] => { $crate::lexer::TokenKind::SelectKw };
    [set] => { $crate::lexer::TokenKind::SetKw };
    [start] => { $crate::lexer::TokenKind::StartKw };
    [static] => { $crate::lexer::TokenKind::StaticKw };
    [table] => { $crate::lexer::TokenKind::TableKw };
    [then] => { $crate::lexer::TokenKind::ThenKw };
    [timestamp] => { $crate::lexer::TokenKind::TimestampKw };
    [type] => { $crate::lexer::TokenKind::TypeKw };
    [union] => { $crate::lexer::TokenKind::UnionKw };
    [update] => { $crate::lexer::TokenKind::UpdateKw };
    [values] => { $crate::lexer::TokenKind::ValuesKw };
    [varray] => { $crate::lexer::TokenKind::VarrayKw };
    [when] => { $crate::lexer::TokenKind::WhenKw };
    [where] => { $crate::lexer::TokenKind::WhereKw };
    [while] => { $crate::lexer::TokenKind::WhileKw };
    [with] => { $crate::lexer::TokenKind::WithKw };
}
pub(crate) use T;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn check(input: &str, kind: TokenKind) {
        let mut lexer = Lexer::new(input);
        let token = lexer.next().unwrap();
        assert_eq!(token.kind, kind);
        assert_eq!(token.text, input);
    }

    #[test]
    fn lex_spaces_and_newlines() {
        check("  \n", TokenKind::Whitespace);
    }

    #[test]
    fn lex_ident() {
        check("hello", TokenKind::Ident);
    }

    #[test]
    fn lex_keyword_case_insensitive() {
        check("SeLeCt", TokenKind::SelectKw);
    }

    #[test]
    fn lex_oracle_join_marker() {
        check("(+)", TokenKind::OracleJoin);

        let kinds = Lexer::new("a.id = b.id(+)")
            .map(|t| t.kind)
            .filter(|k| !k.is_trivia())
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::ComparisonOp,
                TokenKind::Ident,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::OracleJoin,
            ]
        );
    }

    #[test]
    fn lex_bind_var() {
        check(":NEW", TokenKind::BindVar);
        check(":old", TokenKind::BindVar);
    }

    #[test]
    fn lex_assign_not_bind_var() {
        check(":=", TokenKind::Assign);
    }

    #[test]
    fn lex_literals() {
        check("42", TokenKind::Integer);
        check("4.2", TokenKind::Decimal);
        check("'it''s'", TokenKind::QuotedLiteral);
    }

    #[test]
    fn lex_block_comment() {
        check("/* multi\nline */", TokenKind::Comment);
    }

    #[test]
    fn keyword_range_is_contiguous() {
        assert!(TokenKind::SelectKw.is_keyword());
        assert!(TokenKind::WithKw.is_keyword());
        assert!(!TokenKind::Ident.is_keyword());
        assert!(!TokenKind::OracleJoin.is_keyword());
    }
}
