// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the public transformation entry points.
//!
//! Errors are returned, never thrown: every entry point yields a result
//! struct carrying the produced PostgreSQL text alongside the errors
//! collected on the way. Batch transforms (package and type bodies)
//! attempt every member and report partial success.

use std::panic::{catch_unwind, AssertUnwindSafe};

use indexmap::IndexMap;
use serde::Serialize;

use crate::ast::{AstNode, Root};
use crate::comments::strip_comments;
use crate::emit::{Emitter, PackageEnv, RoutineEnv};
use crate::metadata::{MetadataIndex, PackageVariableRecord, TriggerRecord};
use crate::parser::{
    parse_function_or_procedure, parse_package_body, parse_package_spec, parse_select, Parse,
};
use crate::rewriter;

/// Errors a transformation can produce.
///
/// `Parse` means the grammar rejected the input; `UnsupportedConstruct`
/// means it parsed but the rewrite refuses it. Both carry the offending
/// SQL for operator triage.
#[derive(Clone, Debug, Eq, thiserror::Error, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum TransformError {
    #[error("Error during parsing: {message}")]
    Parse { message: String, sql: String },

    #[error("Language construct unsupported: {construct}")]
    UnsupportedConstruct { construct: String, sql: String },

    #[error("Reference '{name}' resolves to multiple targets")]
    AmbiguousReference { name: String, sql: String },

    #[error("Metadata for '{name}' is missing but required by the rewrite")]
    MetadataMissing { name: String, sql: String },

    #[error("Internal invariant violation: {message}")]
    Internal { message: String },

    #[error("{object}: {source}")]
    InObject {
        object: String,
        source: Box<TransformError>,
    },
}

impl TransformError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Wraps the error with the trigger/package/type member it occurred
    /// in.
    pub(crate) fn in_object(self, object: &str) -> Self {
        Self::InObject {
            object: object.to_string(),
            source: Box::new(self),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewTransform {
    pub postgres_sql: String,
    pub errors: Vec<TransformError>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineTransform {
    pub postgres_sql: String,
    pub errors: Vec<TransformError>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerTransform {
    pub function_ddl: String,
    pub trigger_ddl: String,
    pub errors: Vec<TransformError>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageTransform {
    /// `(qualified name, DDL)` per successfully transformed member.
    pub functions: Vec<(String, String)>,
    /// Package-variable accessor DDLs, emitted once per package.
    pub helpers: Vec<String>,
    pub errors: Vec<TransformError>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeBodyTransform {
    pub methods: Vec<(String, String)>,
    pub errors: Vec<TransformError>,
}

fn parse_errors(parse: &Parse, sql: &str) -> Vec<TransformError> {
    parse
        .errors()
        .iter()
        .map(|error| TransformError::Parse {
            message: error.to_string(),
            sql: sql.to_string(),
        })
        .collect()
}

/// Runs one emit invocation, converting panics into internal errors and
/// checking the context-balance invariant.
fn run_emit<F>(emitter: &mut Emitter, f: F) -> Result<String, TransformError>
where
    F: FnOnce(&mut Emitter) -> Result<String, TransformError>,
{
    let result = catch_unwind(AssertUnwindSafe(|| f(&mut *emitter)));

    let output = match result {
        Ok(output) => output?,
        Err(_) => return Err(TransformError::internal("emit visitor panicked")),
    };

    if !emitter.stack.is_empty() {
        return Err(TransformError::internal(
            "context stack not empty after transformation",
        ));
    }

    Ok(output)
}

/// Transforms an Oracle view query into PostgreSQL form.
pub fn transform_view(
    oracle_sql: &str,
    current_schema: &str,
    metadata: &MetadataIndex,
) -> ViewTransform {
    let stripped = strip_comments(oracle_sql);
    let parse = parse_select(&stripped);

    let mut errors = parse_errors(&parse, oracle_sql);
    if !errors.is_empty() {
        return ViewTransform {
            postgres_sql: String::new(),
            errors,
        };
    }

    let query = Root::cast(parse.syntax()).and_then(|root| root.query());
    let Some(query) = query else {
        errors.push(TransformError::Parse {
            message: "failed to find a SELECT statement".to_string(),
            sql: oracle_sql.to_string(),
        });
        return ViewTransform {
            postgres_sql: String::new(),
            errors,
        };
    };

    let mut emitter = Emitter::new(metadata, current_schema);
    match run_emit(&mut emitter, |e| e.emit(query.syntax())) {
        Ok(postgres_sql) => ViewTransform {
            postgres_sql,
            errors,
        },
        Err(error) => {
            errors.push(error);
            ViewTransform {
                postgres_sql: String::new(),
                errors,
            }
        }
    }
}

/// Transforms a standalone `CREATE FUNCTION`/`CREATE PROCEDURE`.
pub fn transform_function_or_procedure(
    oracle_source: &str,
    current_schema: &str,
    metadata: &MetadataIndex,
) -> RoutineTransform {
    let stripped = strip_comments(oracle_source);
    let parse = parse_function_or_procedure(&stripped);

    let mut errors = parse_errors(&parse, oracle_source);
    if !errors.is_empty() {
        return RoutineTransform {
            postgres_sql: String::new(),
            errors,
        };
    }

    let root = Root::cast(parse.syntax());
    let node = root
        .as_ref()
        .and_then(|r| r.function().map(|f| f.syntax().clone()))
        .or_else(|| {
            root.as_ref()
                .and_then(|r| r.procedure().map(|p| p.syntax().clone()))
        });

    let Some(node) = node else {
        errors.push(TransformError::Parse {
            message: "failed to find a function or procedure".to_string(),
            sql: oracle_source.to_string(),
        });
        return RoutineTransform {
            postgres_sql: String::new(),
            errors,
        };
    };

    let mut emitter = Emitter::new(metadata, current_schema);
    match run_emit(&mut emitter, |e| e.emit(&node)) {
        Ok(postgres_sql) => RoutineTransform {
            postgres_sql,
            errors,
        },
        Err(error) => {
            errors.push(error);
            RoutineTransform {
                postgres_sql: String::new(),
                errors,
            }
        }
    }
}

/// Transforms an Oracle trigger into its PostgreSQL function + trigger
/// DDL pair. Both DDLs must be applied in order by the caller.
pub fn transform_trigger(record: &TriggerRecord, metadata: &MetadataIndex) -> TriggerTransform {
    match rewriter::trigger::rewrite(record, metadata) {
        Ok((function_ddl, trigger_ddl)) => TriggerTransform {
            function_ddl,
            trigger_ddl,
            errors: Vec::new(),
        },
        Err(error) => TriggerTransform {
            function_ddl: String::new(),
            trigger_ddl: String::new(),
            errors: vec![error.in_object(&record.name.to_lowercase())],
        },
    }
}

/// Transforms a whole package body.
///
/// Every function and procedure is attempted; per-member errors are
/// collected and do not abort the remaining members. Package variables
/// (from the spec and the body) lower into session-scoped accessors,
/// returned in `helpers`.
pub fn transform_package_body(
    schema: &str,
    package_name: &str,
    spec_source: &str,
    body_source: &str,
    metadata: &MetadataIndex,
) -> PackageTransform {
    let schema = schema.to_lowercase();
    let package_name = package_name.to_lowercase();

    let mut errors = Vec::new();
    let mut variables: IndexMap<String, PackageVariableRecord> = IndexMap::new();

    // Variables declared in the specification come first, in order.
    if !spec_source.trim().is_empty() {
        let stripped = strip_comments(spec_source);
        let parse = parse_package_spec(&stripped);

        if parse.ok() {
            if let Some(spec) = Root::cast(parse.syntax()).and_then(|r| r.package_spec()) {
                collect_variables(&mut variables, spec.variable_decls());
            }
        } else {
            errors.extend(
                parse_errors(&parse, spec_source)
                    .into_iter()
                    .map(|e| e.in_object(&package_name)),
            );
        }
    }

    // Fall back to the metadata index when the spec is unavailable.
    if variables.is_empty() {
        if let Some(record) = metadata.package(&schema, &package_name) {
            variables = record.variables.clone();
        }
    }

    let stripped_body = strip_comments(body_source);
    let parse = parse_package_body(&stripped_body);
    if !parse.ok() {
        errors.extend(
            parse_errors(&parse, body_source)
                .into_iter()
                .map(|e| e.in_object(&package_name)),
        );
        return PackageTransform {
            functions: Vec::new(),
            helpers: Vec::new(),
            errors,
        };
    }

    let Some(body) = Root::cast(parse.syntax()).and_then(|r| r.package_body()) else {
        errors.push(
            TransformError::Parse {
                message: "failed to find a package body".to_string(),
                sql: body_source.to_string(),
            }
            .in_object(&package_name),
        );
        return PackageTransform {
            functions: Vec::new(),
            helpers: Vec::new(),
            errors,
        };
    };

    // Body-private variables get accessors too.
    collect_variables(&mut variables, body.variable_decls());

    if body.initializer().is_some() {
        log::warn!(
            "package '{package_name}' has an initializer block; its statements do not transform \
             into session-scoped state and are skipped"
        );
    }

    let mut package_env = PackageEnv {
        schema: schema.clone(),
        name: package_name.clone(),
        variables: variables.clone(),
        routines: Default::default(),
    };

    let mut members: Vec<(String, crate::syntax::SyntaxNode)> = Vec::new();
    for function in body.functions() {
        if let Some(name) = function.name() {
            package_env.routines.insert(name.clone());
            members.push((name, function.syntax().clone()));
        }
    }
    for procedure in body.procedures() {
        if let Some(name) = procedure.name() {
            package_env.routines.insert(name.clone());
            members.push((name, procedure.syntax().clone()));
        }
    }

    // Lazily emitted, once per package: initializer plus accessors.
    let helpers = rewriter::package_vars::emit_helpers(&schema, &package_name, &variables);

    let mut functions = Vec::new();
    let mut emitter = Emitter::new(metadata, &schema);
    emitter.package = Some(package_env);

    for (name, node) in members {
        let qualified = format!("{schema}.{package_name}__{name}");
        emitter.routine = RoutineEnv {
            rename_to: Some(qualified.clone()),
            ..RoutineEnv::default()
        };

        match run_emit(&mut emitter, |e| e.emit(&node)) {
            Ok(ddl) => functions.push((qualified, ddl)),
            Err(error) => errors.push(error.in_object(&format!("{package_name}.{name}"))),
        }
    }

    PackageTransform {
        functions,
        helpers,
        errors,
    }
}

fn collect_variables(
    variables: &mut IndexMap<String, PackageVariableRecord>,
    decls: Vec<crate::ast::VariableDecl>,
) {
    for decl in decls {
        let Some(name) = decl.name() else {
            continue;
        };
        let Some(datatype) = decl.datatype() else {
            continue;
        };

        variables.entry(name.clone()).or_insert(PackageVariableRecord {
            name,
            datatype: datatype.text(),
            default_expr: decl.default_text(),
            constant: decl.is_constant(),
        });
    }
}

/// Transforms an object-type body into per-method functions.
pub fn transform_type_body(
    schema: &str,
    type_name: &str,
    body_source: &str,
    metadata: &MetadataIndex,
) -> TypeBodyTransform {
    let (methods, errors) = rewriter::type_body::rewrite(schema, type_name, body_source, metadata);

    TypeBodyTransform { methods, errors }
}
