// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Rewrites an Oracle trigger into a PostgreSQL function + trigger pair.
//!
//! The trigger body is an anonymous block. It is wrapped into a throwaway
//! procedure so the standard PL/SQL transform applies, the transformed
//! body is sliced back out of the dollar quoting, correlation colons are
//! removed, and a terminal `RETURN` is injected.

use crate::ast::{AstNode, Root};
use crate::comments::strip_comments;
use crate::emit::{plsql, Emitter};
use crate::metadata::{MetadataIndex, TriggerEvent, TriggerRecord, TriggerTiming};
use crate::parser::parse_nested_procedure;
use crate::transpile::TransformError;

const WRAPPER_NAME: &str = "trigger_temp_wrapper";

pub(crate) fn rewrite(
    record: &TriggerRecord,
    meta: &MetadataIndex,
) -> Result<(String, String), TransformError> {
    let schema = record.schema.to_lowercase();
    let name = record.name.to_lowercase();
    let table = record.table_name.to_lowercase();

    let body = strip_comments(&record.body);
    let wrapped = wrap_body(&body);

    let parse = parse_nested_procedure(&wrapped);
    if !parse.ok() {
        return Err(TransformError::Parse {
            message: parse
                .errors()
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
            sql: record.body.clone(),
        });
    }

    let root = Root::cast(parse.syntax())
        .ok_or_else(|| TransformError::internal("failed to find root node"))?;
    let procedure = root
        .procedure()
        .ok_or_else(|| TransformError::internal("failed to parse wrapped trigger body"))?;

    let mut emitter = Emitter::new(meta, &schema);
    let ddl = plsql::emit_procedure(&mut emitter, procedure.syntax())?;

    if !emitter.stack.is_empty() {
        return Err(TransformError::internal("context stack not balanced"));
    }

    let inner = extract_dollar_quoted(&ddl)
        .ok_or_else(|| TransformError::internal("transformed body lost its dollar quoting"))?;
    let inner = strip_correlation_colons(inner);

    let terminal_return = match (record.timing, record.for_each_row) {
        (TriggerTiming::Before, true) => "RETURN NEW;",
        _ => "RETURN NULL;",
    };
    let inner = inject_terminal_return(&inner, terminal_return);

    let function_ddl = format!(
        "CREATE OR REPLACE FUNCTION {schema}.{name}_func() RETURNS TRIGGER AS $$\n{inner}\n$$ LANGUAGE plpgsql;"
    );

    let mut trigger_ddl = format!(
        "CREATE TRIGGER {name} {} {} ON {schema}.{table}",
        record.timing.as_sql(),
        events_sql(&record.events),
    );
    if record.for_each_row {
        trigger_ddl.push_str(" FOR EACH ROW");
    }
    if let Some(when) = &record.when_clause {
        trigger_ddl.push_str(&format!(
            " WHEN ({})",
            strip_correlation_colons(when.trim())
        ));
    }
    trigger_ddl.push_str(&format!(" EXECUTE FUNCTION {schema}.{name}_func();"));

    Ok((function_ddl, trigger_ddl))
}

/// Wraps the anonymous block as a procedure so the standard transform
/// applies. A leading `DECLARE` folds into the procedure's `IS` section.
fn wrap_body(body: &str) -> String {
    let trimmed = body.trim_start();

    if trimmed.len() >= 7 && trimmed[..7].eq_ignore_ascii_case("declare") {
        format!("PROCEDURE {WRAPPER_NAME} IS{}", &trimmed[7..])
    } else {
        format!("PROCEDURE {WRAPPER_NAME} IS\n{trimmed}")
    }
}

/// Returns the text between `AS $$` and the closing `$$`.
fn extract_dollar_quoted(ddl: &str) -> Option<&str> {
    let start = ddl.find("AS $$")? + "AS $$".len();
    let end = ddl.rfind("$$")?;
    if end <= start {
        return None;
    }

    Some(ddl[start..end].trim_matches('\n'))
}

/// Removes the colon from `:NEW`/`:OLD` correlation references, keeping
/// the original case of the name.
fn strip_correlation_colons(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b':' {
            let rest = &text[i + 1..];
            let word_len = rest
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
                .count();
            let word = &rest[..word_len];

            if word.eq_ignore_ascii_case("new") || word.eq_ignore_ascii_case("old") {
                out.push_str(word);
                i += 1 + word_len;
                continue;
            }
        }

        let c = text[i..].chars().next().unwrap();
        out.push(c);
        i += c.len_utf8();
    }

    out
}

/// Injects `RETURN NEW;`/`RETURN NULL;` directly before the final `END;`.
fn inject_terminal_return(body: &str, terminal_return: &str) -> String {
    let lower: String = body.chars().map(|c| c.to_ascii_lowercase()).collect();

    if let Some(index) = lower.rfind("end") {
        let tail = &body[index + 3..];
        let standalone = index == 0
            || !body[..index]
                .chars()
                .next_back()
                .map(|c| c.is_ascii_alphanumeric() || c == '_')
                .unwrap_or(false);
        if standalone && tail.trim_start().starts_with(';') {
            return format!("{}{terminal_return}\n{}", &body[..index], &body[index..]);
        }
    }

    // No recognizable epilogue; append instead of dropping the statement.
    format!("{body}\n{terminal_return}")
}

fn events_sql(events: &[TriggerEvent]) -> String {
    events
        .iter()
        .map(|event| match event {
            TriggerEvent::Insert => "INSERT".to_string(),
            TriggerEvent::Delete => "DELETE".to_string(),
            TriggerEvent::Update { columns } if columns.is_empty() => "UPDATE".to_string(),
            TriggerEvent::Update { columns } => {
                format!(
                    "UPDATE OF {}",
                    columns
                        .iter()
                        .map(|c| c.to_lowercase())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
        })
        .collect::<Vec<_>>()
        .join(" OR ")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn strip_colons_preserves_case() {
        assert_eq!(
            strip_correlation_colons(":NEW.salary := :old.salary;"),
            "NEW.salary := old.salary;"
        );
        assert_eq!(strip_correlation_colons(":New.x"), "New.x");
        // Other bind variables keep their colon.
        assert_eq!(strip_correlation_colons(":param"), ":param");
    }

    #[test]
    fn inject_return_before_final_end() {
        let body = "BEGIN\n  NULL;\nEND;";
        assert_eq!(
            inject_terminal_return(body, "RETURN NEW;"),
            "BEGIN\n  NULL;\nRETURN NEW;\nEND;"
        );
    }

    #[test]
    fn events_render_with_or() {
        let events = vec![
            TriggerEvent::Insert,
            TriggerEvent::Update {
                columns: vec!["SAL".to_string(), "comm".to_string()],
            },
        ];
        assert_eq!(events_sql(&events), "INSERT OR UPDATE OF sal, comm");
    }
}
