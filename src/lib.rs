// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Source-to-source transformer migrating Oracle SQL and PL/SQL to
//! PostgreSQL.
//!
//! The crate parses Oracle views, standalone functions and procedures,
//! package bodies, object-type bodies and trigger bodies into a lossless
//! syntax tree, analyzes each query block (outer joins, `ROWNUM`, types)
//! and emits semantically equivalent PL/pgSQL. See
//! [`transform_view`], [`transform_function_or_procedure`],
//! [`transform_trigger`], [`transform_package_body`] and
//! [`transform_type_body`] for the entry points.
//!
//! The transformer performs no I/O. Schema facts reach it through the
//! read-only [`MetadataIndex`], built once per job from the extraction
//! jobs' catalog snapshots.

mod analysis;
pub mod ast;
mod comments;
mod context;
mod emit;
mod grammar;
mod lexer;
mod metadata;
mod parser;
mod rewriter;
pub mod syntax;
mod transpile;

pub use comments::strip_comments;
pub use lexer::{Lexer, Token, TokenKind};
pub use metadata::*;
pub use parser::{
    parse_function_or_procedure, parse_package_body, parse_package_spec, parse_select, Parse,
    ParseError,
};
pub use transpile::*;
