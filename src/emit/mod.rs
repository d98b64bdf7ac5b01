// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the code builder: a dispatch table from syntax-node kinds to
//! emit routines producing PostgreSQL text.
//!
//! The dispatch table is the single extensibility point; every rewrite
//! lives in the emit function registered for its node kind. Kinds without
//! an entry fall back to [`emit_children`], which reconstructs the node
//! while applying token-level rewrites.

pub(crate) mod expr;
pub(crate) mod plsql;
pub(crate) mod query;

use std::collections::{HashMap, HashSet};
use std::ops::{Deref, DerefMut};

use lazy_static::lazy_static;

use crate::ast::normalize_ident;
use crate::context::{ContextStack, TypeInfo};
use crate::metadata::{MetadataIndex, PackageVariableRecord};
use crate::syntax::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};
use crate::transpile::TransformError;
use indexmap::IndexMap;

type EmitFn = fn(&mut Emitter, &SyntaxNode) -> Result<String, TransformError>;

lazy_static! {
    static ref EMITTERS: HashMap<SyntaxKind, EmitFn> = {
        let mut m = HashMap::new();
        m.insert(SyntaxKind::SelectStmt, query::emit_select_stmt as EmitFn);
        m.insert(SyntaxKind::Subquery, query::emit_subquery as EmitFn);
        m.insert(SyntaxKind::Expression, expr::emit_expression as EmitFn);
        m.insert(SyntaxKind::IdentGroup, expr::emit_ident_group as EmitFn);
        m.insert(
            SyntaxKind::FunctionInvocation,
            expr::emit_function_invocation as EmitFn,
        );
        m.insert(SyntaxKind::Function, plsql::emit_function as EmitFn);
        m.insert(SyntaxKind::Procedure, plsql::emit_procedure as EmitFn);
        m.insert(SyntaxKind::Block, plsql::emit_block as EmitFn);
        m.insert(
            SyntaxKind::BlockStatement,
            plsql::emit_block_statement as EmitFn,
        );
        m.insert(
            SyntaxKind::AssignmentStmt,
            plsql::emit_assignment as EmitFn,
        );
        m.insert(SyntaxKind::RaiseStmt, plsql::emit_raise as EmitFn);
        m.insert(SyntaxKind::LoopStmt, plsql::emit_loop as EmitFn);
        m.insert(SyntaxKind::Datatype, plsql::emit_datatype as EmitFn);
        m.insert(SyntaxKind::CursorDecl, plsql::emit_cursor_decl as EmitFn);
        m
    };
}

/// State describing the package whose body is currently being transformed.
#[derive(Clone, Debug, Default)]
pub(crate) struct PackageEnv {
    pub schema: String,
    pub name: String,
    pub variables: IndexMap<String, PackageVariableRecord>,
    /// Names of the functions/procedures declared by the package, for
    /// resolving package-internal calls.
    pub routines: HashSet<String>,
}

/// Per-routine emission state, reset for every function or procedure.
#[derive(Clone, Debug, Default)]
pub(crate) struct RoutineEnv {
    /// Override for the emitted (qualified) routine name.
    pub rename_to: Option<String>,
    /// A synthetic first parameter, e.g. `self hr.address_t`.
    pub extra_first_param: Option<String>,
    /// Declared locals and parameters; these shadow package variables.
    pub locals: HashSet<String>,
    /// Local name to raw Oracle datatype, for object-type method lookup.
    pub var_types: HashMap<String, String>,
}

/// The code builder. One per transformation invocation; single-threaded,
/// no I/O.
pub(crate) struct Emitter<'a> {
    pub meta: &'a MetadataIndex,
    pub schema: String,
    pub stack: ContextStack,
    /// Type analysis results keyed by `"start:stop"` token positions.
    pub type_cache: HashMap<String, TypeInfo>,
    pub package: Option<PackageEnv>,
    pub routine: RoutineEnv,
}

impl<'a> Emitter<'a> {
    pub fn new(meta: &'a MetadataIndex, schema: &str) -> Self {
        Self {
            meta,
            schema: schema.to_lowercase(),
            stack: ContextStack::new(),
            type_cache: HashMap::new(),
            package: None,
            routine: RoutineEnv::default(),
        }
    }

    /// Emits a single node by looking up its kind in the dispatch table.
    pub fn emit(&mut self, node: &SyntaxNode) -> Result<String, TransformError> {
        match EMITTERS.get(&node.kind()) {
            Some(emit_fn) => emit_fn(self, node),
            None => emit_children(self, node),
        }
    }

    /// Opens a query-block scope. The returned guard pops the context frame
    /// when dropped, on every exit path.
    pub fn query_scope(&mut self) -> QueryScope<'_, 'a> {
        self.stack.push();
        QueryScope { emitter: self }
    }

    /// The type-cache key of a node: its token start/stop positions.
    pub fn node_key(node: &SyntaxNode) -> String {
        let range = node.text_range();
        format!("{}:{}", u32::from(range.start()), u32::from(range.end()))
    }

    pub fn cached_type(&self, node: &SyntaxNode) -> Option<TypeInfo> {
        self.type_cache.get(&Self::node_key(node)).copied()
    }

    /// Looks up a package variable visible under `name`, either in the
    /// package currently being transformed or via the metadata index.
    pub fn package_variable(
        &self,
        package: Option<&str>,
        name: &str,
    ) -> Option<(String, String, PackageVariableRecord)> {
        match package {
            Some(package) => {
                if let Some(env) = self
                    .package
                    .as_ref()
                    .filter(|env| env.name == package)
                {
                    return env
                        .variables
                        .get(name)
                        .map(|v| (env.schema.clone(), env.name.clone(), v.clone()));
                }

                self.meta
                    .package(&self.schema, package)
                    .and_then(|p| p.variables.get(name).map(|v| (p.schema.clone(), p.name.clone(), v.clone())))
            }
            None => {
                let env = self.package.as_ref()?;
                if self.routine.locals.contains(name) {
                    return None;
                }
                env.variables
                    .get(name)
                    .map(|v| (env.schema.clone(), env.name.clone(), v.clone()))
            }
        }
    }
}

/// Scope guard for one query block; pops the context frame on drop.
pub(crate) struct QueryScope<'s, 'a> {
    emitter: &'s mut Emitter<'a>,
}

impl<'a> Deref for QueryScope<'_, 'a> {
    type Target = Emitter<'a>;

    fn deref(&self) -> &Self::Target {
        self.emitter
    }
}

impl DerefMut for QueryScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.emitter
    }
}

impl Drop for QueryScope<'_, '_> {
    fn drop(&mut self) {
        self.emitter.stack.pop();
    }
}

/// Default emit: reconstruct the node, recursing into child nodes via the
/// dispatch table and rewriting tokens in place.
pub(crate) fn emit_children(e: &mut Emitter, node: &SyntaxNode) -> Result<String, TransformError> {
    let mut out = String::new();

    for element in node.children_with_tokens() {
        match element {
            SyntaxElement::Token(token) => out.push_str(&rewrite_token(&token)),
            SyntaxElement::Node(child) => out.push_str(&e.emit(&child)?),
        }
    }

    Ok(out)
}

/// Token-level rewrites applied during reconstruction.
///
/// Unquoted identifiers are lowercased; the `(+)` marker never survives
/// into PostgreSQL output.
pub(crate) fn rewrite_token(token: &SyntaxToken) -> String {
    match token.kind() {
        SyntaxKind::OracleJoin => String::new(),
        SyntaxKind::Ident if !token.text().starts_with('"') => token.text().to_lowercase(),
        _ => token.text().to_string(),
    }
}

/// Emits all elements of a slice, used where statements or expressions are
/// partially reassembled.
pub(crate) fn emit_elements(
    e: &mut Emitter,
    elements: &[SyntaxElement],
) -> Result<String, TransformError> {
    let mut out = String::new();

    for element in elements {
        match element {
            SyntaxElement::Token(token) => out.push_str(&rewrite_token(token)),
            SyntaxElement::Node(node) => out.push_str(&e.emit(node)?),
        }
    }

    Ok(out)
}

/// Lowercases the dotted parts of an identifier group while keeping quoted
/// parts and bind variables exactly as written.
pub(crate) fn plain_ident_group(node: &SyntaxNode) -> String {
    node.children_with_tokens()
        .filter_map(|it| it.into_token())
        .map(|t| match t.kind() {
            SyntaxKind::Ident if !t.text().starts_with('"') => t.text().to_lowercase(),
            SyntaxKind::Ident => {
                // Quoted identifiers keep their quoting when the inner
                // spelling needs it.
                let inner = normalize_ident(t.text());
                if inner.chars().all(|c| c.is_ascii_lowercase() || c == '_' || c.is_ascii_digit()) {
                    inner
                } else {
                    t.text().to_string()
                }
            }
            _ => t.text().to_string(),
        })
        .collect()
}
