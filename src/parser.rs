// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements a permissive parser producing a lossless [`rowan`] syntax tree.

use rowan::{GreenNode, GreenNodeBuilder, Language};

use crate::grammar;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::syntax::{SqlProcedureLang, SyntaxKind, SyntaxNode};

/// Error type describing all possible parser failures.
#[derive(Debug, Clone, Eq, thiserror::Error, PartialEq)]
pub enum ParseError {
    /// The input is incomplete, i.e. it could not be fully parsed through.
    #[error("Incomplete input; unparsed: {0}")]
    Incomplete(String),

    /// A token could not be parsed by the lexer
    #[error("Unknown token found at offset {0}")]
    UnknownToken(u32),

    /// The parser expected a specific token, but found another.
    #[error("Expected token '{expected}', found '{found}' at offset {offset}")]
    ExpectedToken {
        expected: TokenKind,
        found: TokenKind,
        offset: u32,
    },

    /// The parser expected one token out of a set, but found none of them.
    #[error("Expected one of {expected:?}, found '{found}' at offset {offset}")]
    ExpectedOneOfTokens {
        expected: Vec<TokenKind>,
        found: TokenKind,
        offset: u32,
    },

    /// The parser found a statement it does not know.
    #[error("Expected a statement, found '{0}'")]
    ExpectedStatement(TokenKind),

    /// The parser stumbled upon an unbalanced pair of parentheses.
    #[error("Unbalanced pair of parentheses at offset {0}")]
    UnbalancedParens(u32),

    /// A construct the grammar knows about but does not implement.
    #[error("Unimplemented construct: {0}")]
    Unimplemented(String),

    /// The parser made no forward progress and forcibly consumed a token.
    #[error("Expected a valid construct, got stuck at '{0}'")]
    Stuck(TokenKind),

    /// The parser ran out of input where more was required.
    #[error("Unexpected end of input")]
    Eof,
}

/// The result of parsing some input, holding the lossless syntax tree and
/// all errors encountered along the way.
///
/// Partial trees are the norm rather than the exception here; the caller
/// decides based on [`Parse::errors()`] whether to proceed.
#[derive(Debug)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<ParseError>,
}

impl Parse {
    /// Returns the (untyped) root node of the parsed syntax tree.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// Whether parsing finished without any error.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Returns a debug representation of the full syntax tree.
    pub fn tree(&self) -> String {
        let mut out = String::new();
        dump_node(&self.syntax(), 0, &mut out);
        out
    }
}

fn dump_node(node: &SyntaxNode, depth: usize, out: &mut String) {
    out.push_str(&format!(
        "{:indent$}{:?}@{:?}\n",
        "",
        node.kind(),
        node.text_range(),
        indent = depth * 2
    ));

    for child in node.children_with_tokens() {
        match child {
            rowan::NodeOrToken::Node(child) => dump_node(&child, depth + 1, out),
            rowan::NodeOrToken::Token(token) => out.push_str(&format!(
                "{:indent$}{:?}@{:?} {:?}\n",
                "",
                token.kind(),
                token.text_range(),
                token.text(),
                indent = (depth + 1) * 2
            )),
        }
    }
}

/// Builds the syntax tree directly while consuming the token stream.
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut parser = Self {
            tokens: Lexer::new(input).collect(),
            pos: 0,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
        };

        parser
            .builder
            .start_node(SqlProcedureLang::kind_to_raw(SyntaxKind::Root));
        parser
    }

    /// Finishes parsing, consuming any trailing trivia into the tree.
    pub fn build(mut self) -> Parse {
        self.eat_trivia();
        self.builder.finish_node();

        Parse {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    /// Returns the kind of the current (non-trivia) token, or
    /// [`TokenKind::Eof`] at the end of input.
    pub fn current(&self) -> TokenKind {
        self.nth(0).unwrap_or(TokenKind::Eof)
    }

    /// Peeks `n` non-trivia tokens ahead without consuming anything.
    pub fn nth(&self, n: usize) -> Option<TokenKind> {
        self.tokens[self.pos..]
            .iter()
            .map(|t| t.kind)
            .filter(|k| !k.is_trivia())
            .nth(n)
    }

    /// Returns the original text of the current token.
    pub fn current_text(&self) -> &str {
        self.tokens[self.pos..]
            .iter()
            .find(|t| !t.kind.is_trivia())
            .map(|t| t.text)
            .unwrap_or("")
    }

    pub fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    pub fn at_end(&self) -> bool {
        self.current() == TokenKind::Eof
    }

    /// Raw token cursor, used to detect stuck loops.
    pub fn token_pos(&self) -> usize {
        self.pos
    }

    /// Offset of the current token into the input, for error messages.
    pub fn offset(&self) -> u32 {
        self.current_offset()
    }

    fn current_offset(&self) -> u32 {
        self.tokens[self.pos..]
            .iter()
            .find(|t| !t.kind.is_trivia())
            .map(|t| u32::from(t.range.start()))
            .unwrap_or_else(|| {
                self.tokens
                    .last()
                    .map(|t| u32::from(t.range.end()))
                    .unwrap_or(0)
            })
    }

    /// Consumes the current token, asserting its kind.
    pub fn bump(&mut self, kind: TokenKind) {
        assert_eq!(self.current(), kind);
        self.do_bump();
    }

    /// Consumes the current token, whatever it is. Does nothing at Eof.
    pub fn bump_any(&mut self) {
        if !self.at_end() {
            self.do_bump();
        }
    }

    /// Consumes the current token if it matches `kind`.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.do_bump();
            true
        } else {
            false
        }
    }

    /// Consumes the current token if it matches any kind in `kinds`.
    pub fn eat_one_of(&mut self, kinds: &[TokenKind]) -> bool {
        if kinds.contains(&self.current()) {
            self.do_bump();
            true
        } else {
            false
        }
    }

    /// Consumes the current token if it matches `kind`, records an error
    /// otherwise.
    pub fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            return true;
        }

        self.error(ParseError::ExpectedToken {
            expected: kind,
            found: self.current(),
            offset: self.current_offset(),
        });
        false
    }

    /// Consumes the current token if it matches any kind in `kinds`,
    /// records an error otherwise.
    pub fn expect_one_of(&mut self, kinds: &[TokenKind]) -> bool {
        if self.eat_one_of(kinds) {
            return true;
        }

        self.error(ParseError::ExpectedOneOfTokens {
            expected: kinds.to_vec(),
            found: self.current(),
            offset: self.current_offset(),
        });
        false
    }

    pub fn error(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn start(&mut self, kind: SyntaxKind) {
        // Attach pending trivia to the enclosing node; a node begins with
        // its first real token.
        self.eat_trivia();
        self.builder
            .start_node(SqlProcedureLang::kind_to_raw(kind));
    }

    pub fn finish(&mut self) {
        self.builder.finish_node();
    }

    pub fn checkpoint(&mut self) -> rowan::Checkpoint {
        // Attach pending trivia to the enclosing node, so that a later
        // `start_node_at` does not capture leading whitespace.
        self.eat_trivia();
        self.builder.checkpoint()
    }

    pub fn start_node_at(&mut self, checkpoint: rowan::Checkpoint, kind: SyntaxKind) {
        self.builder
            .start_node_at(checkpoint, SqlProcedureLang::kind_to_raw(kind));
    }

    fn do_bump(&mut self) {
        self.eat_trivia();

        let token = &self.tokens[self.pos];
        if token.kind == TokenKind::Error {
            self.errors
                .push(ParseError::UnknownToken(u32::from(token.range.start())));
        }

        self.builder.token(
            SqlProcedureLang::kind_to_raw(SyntaxKind::from(token.kind)),
            token.text,
        );
        self.pos += 1;
    }

    fn eat_trivia(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            if !token.kind.is_trivia() {
                break;
            }

            self.builder.token(
                SqlProcedureLang::kind_to_raw(SyntaxKind::from(token.kind)),
                token.text,
            );
            self.pos += 1;
        }
    }
}

/// Guards grammar loops against missing forward progress.
///
/// If an iteration consumed no token, an error is recorded and one token is
/// forcibly consumed; the loop ends at Eof in any case.
macro_rules! safe_loop {
    ($p:expr, $body:block) => {{
        let mut prev_pos = usize::MAX;
        loop {
            if $p.at_end() {
                break;
            }
            if $p.token_pos() == prev_pos {
                let current = $p.current();
                $p.error($crate::parser::ParseError::Stuck(current));
                $p.bump_any();
                continue;
            }
            prev_pos = $p.token_pos();
            $body
        }
    }};
}
pub(crate) use safe_loop;

fn parse_with<F>(input: &str, f: F) -> Parse
where
    F: Fn(&mut Parser),
{
    let mut parser = Parser::new(input);
    f(&mut parser);
    parser.build()
}

/// Parses an Oracle `SELECT` statement.
pub fn parse_select(input: &str) -> Parse {
    parse_with(input, |p| grammar::parse_query(p, false))
}

/// Parses a standalone `CREATE FUNCTION` or `CREATE PROCEDURE`.
pub fn parse_function_or_procedure(input: &str) -> Parse {
    parse_with(input, grammar::parse_function_or_procedure)
}

/// Parses a `CREATE PACKAGE` specification.
pub fn parse_package_spec(input: &str) -> Parse {
    parse_with(input, grammar::parse_package_spec)
}

/// Parses a `CREATE PACKAGE BODY`.
pub fn parse_package_body(input: &str) -> Parse {
    parse_with(input, grammar::parse_package_body)
}

/// Parses a `PROCEDURE .. IS ..` without a `CREATE` prologue, as produced
/// by the trigger rewriter's wrapping step.
pub(crate) fn parse_nested_procedure(input: &str) -> Parse {
    parse_with(input, |p| grammar::parse_procedure(p, true))
}

/// Parses a `FUNCTION .. RETURN .. IS ..` without a `CREATE` prologue, as
/// produced by the object-type body slicer.
pub(crate) fn parse_nested_function(input: &str) -> Parse {
    parse_with(input, |p| grammar::parse_function(p, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_permissive_on_garbage() {
        let parse = parse_select("SELECT FROM WHERE");
        assert!(!parse.ok());
        // The tree still covers the full input.
        assert_eq!(parse.syntax().text().to_string(), "SELECT FROM WHERE");
    }

    #[test]
    fn parse_reconstructs_input_verbatim() {
        const INPUT: &str = "SELECT a.id,  b.name\nFROM a, b\nWHERE a.id = b.id(+)";
        let parse = parse_select(INPUT);
        assert!(parse.ok(), "{:?}", parse.errors());
        assert_eq!(parse.syntax().text().to_string(), INPUT);
    }
}
