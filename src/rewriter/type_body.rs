// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Flattens Oracle object-type method bodies into standalone functions.
//!
//! A type body is sliced into per-method sources by a lightweight
//! boundary scanner over the token stream; no full reparse of the body is
//! needed. Each slice transforms independently into a function named
//! `schema.type__method`, with member methods receiving the object value
//! as synthetic first parameter.

use crate::ast::{AstNode, Root};
use crate::comments::strip_comments;
use crate::emit::{plsql, Emitter, RoutineEnv};
use crate::lexer::{Lexer, TokenKind};
use crate::metadata::MetadataIndex;
use crate::parser::{parse_nested_function, parse_nested_procedure};
use crate::transpile::TransformError;

/// One method slice produced by the boundary scanner.
#[derive(Debug)]
pub(crate) struct MethodSlice {
    pub name: String,
    pub is_member: bool,
    pub is_function: bool,
    /// The method source starting at `FUNCTION`/`PROCEDURE` (the
    /// `MEMBER`/`STATIC` marker is stripped).
    pub source: String,
}

/// Transforms every method of a type body. Returns the per-method DDLs
/// and the errors of methods that failed; one failing method never stops
/// the others.
pub(crate) fn rewrite(
    schema: &str,
    type_name: &str,
    body_source: &str,
    meta: &MetadataIndex,
) -> (Vec<(String, String)>, Vec<TransformError>) {
    let schema = schema.to_lowercase();
    let type_name = type_name.to_lowercase();

    let stripped = strip_comments(body_source);
    let slices = slice_methods(&stripped);

    let mut methods = Vec::new();
    let mut errors = Vec::new();

    for slice in slices {
        match transform_method(&schema, &type_name, &slice, meta) {
            Ok(ddl) => {
                let qualified = format!("{schema}.{type_name}__{}", slice.name);
                methods.push((qualified, ddl));
            }
            Err(error) => {
                errors.push(error.in_object(&format!("{type_name}.{}", slice.name)));
            }
        }
    }

    (methods, errors)
}

fn transform_method(
    schema: &str,
    type_name: &str,
    slice: &MethodSlice,
    meta: &MetadataIndex,
) -> Result<String, TransformError> {
    let parse = if slice.is_function {
        parse_nested_function(&slice.source)
    } else {
        parse_nested_procedure(&slice.source)
    };

    if !parse.ok() {
        return Err(TransformError::Parse {
            message: parse
                .errors()
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
            sql: slice.source.clone(),
        });
    }

    let root = Root::cast(parse.syntax())
        .ok_or_else(|| TransformError::internal("failed to find root node"))?;

    let mut emitter = Emitter::new(meta, schema);
    emitter.routine = RoutineEnv {
        rename_to: Some(format!("{schema}.{type_name}__{}", slice.name)),
        extra_first_param: slice
            .is_member
            .then(|| format!("self {schema}.{type_name}")),
        ..RoutineEnv::default()
    };

    let ddl = if slice.is_function {
        let function = root
            .function()
            .ok_or_else(|| TransformError::internal("sliced method is not a function"))?;
        plsql::emit_function(&mut emitter, function.syntax())?
    } else {
        let procedure = root
            .procedure()
            .ok_or_else(|| TransformError::internal("sliced method is not a procedure"))?;
        plsql::emit_procedure(&mut emitter, procedure.syntax())?
    };

    if !emitter.stack.is_empty() {
        return Err(TransformError::internal("context stack not balanced"));
    }

    Ok(ddl)
}

/// Scans the type body for `MEMBER|STATIC FUNCTION|PROCEDURE` boundaries.
///
/// A boundary counts only where a new declaration can start: directly
/// after the body prologue's `IS`/`AS`, or after the `;` that closed the
/// previous method. The final slice ends before the closing `END;` of the
/// body.
pub(crate) fn slice_methods(source: &str) -> Vec<MethodSlice> {
    let tokens = Lexer::new(source)
        .filter(|t| !t.kind.is_trivia())
        .collect::<Vec<_>>();

    let mut boundaries: Vec<(usize, bool)> = Vec::new();
    let mut previous_significant: Option<TokenKind> = None;

    for (i, token) in tokens.iter().enumerate() {
        let starts_declaration = matches!(
            previous_significant,
            None | Some(TokenKind::IsKw) | Some(TokenKind::AsKw) | Some(TokenKind::Semicolon)
        );

        if starts_declaration
            && matches!(token.kind, TokenKind::MemberKw | TokenKind::StaticKw)
            && matches!(
                tokens.get(i + 1).map(|t| t.kind),
                Some(TokenKind::FunctionKw) | Some(TokenKind::ProcedureKw)
            )
        {
            boundaries.push((i, token.kind == TokenKind::MemberKw));
        }

        previous_significant = Some(token.kind);
    }

    // The closing `END [name];` of the body bounds the last method.
    let body_end = tokens
        .iter()
        .rposition(|t| t.kind == TokenKind::EndKw)
        .unwrap_or(tokens.len());

    let mut slices = Vec::new();
    for (n, (start, is_member)) in boundaries.iter().enumerate() {
        let end = boundaries
            .get(n + 1)
            .map(|(next, _)| *next)
            .unwrap_or(body_end);
        if end <= start + 2 {
            continue;
        }

        let keyword = &tokens[start + 1];
        let name = tokens
            .get(start + 2)
            .map(|t| t.text.to_lowercase())
            .unwrap_or_default();

        let from = u32::from(keyword.range.start()) as usize;
        let to = u32::from(tokens[end - 1].range.end()) as usize;

        slices.push(MethodSlice {
            name,
            is_member: *is_member,
            is_function: keyword.kind == TokenKind::FunctionKw,
            source: source[from..to].to_string(),
        });
    }

    slices
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const BODY: &str = r#"
TYPE BODY address_t IS
  MEMBER FUNCTION formatted RETURN VARCHAR2 IS
  BEGIN
    RETURN street || ', ' || city;
  END;

  STATIC FUNCTION empty RETURN NUMBER IS
  BEGIN
    RETURN 0;
  END;
END;
"#;

    #[test]
    fn slices_find_both_methods() {
        let slices = slice_methods(BODY);
        assert_eq!(slices.len(), 2);

        assert_eq!(slices[0].name, "formatted");
        assert!(slices[0].is_member);
        assert!(slices[0].is_function);
        assert!(slices[0].source.starts_with("FUNCTION formatted"));
        assert!(slices[0].source.trim_end().ends_with("END;"));

        assert_eq!(slices[1].name, "empty");
        assert!(!slices[1].is_member);
        assert!(slices[1].source.starts_with("FUNCTION empty"));
    }

    #[test]
    fn member_method_gets_self_parameter() {
        let meta = MetadataIndex::default();
        let (methods, errors) = rewrite("HR", "address_t", BODY, &meta);

        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].0, "hr.address_t__formatted");
        assert!(methods[0]
            .1
            .contains("FUNCTION hr.address_t__formatted(self hr.address_t) RETURNS text"));
        assert!(methods[1].1.contains("hr.address_t__empty()"));
    }
}
