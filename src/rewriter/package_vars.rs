// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Lowers Oracle package variables to session-scoped accessors.
//!
//! PostgreSQL has no package state; every variable is backed by a
//! `set_config`/`current_setting` key of the form `schema.pkg.var`. Each
//! package gets an idempotent initializer plus per-variable getters and
//! setters (constants get no setter). Reads and writes inside transformed
//! bodies are rewritten by the emit visitors to call these accessors.

use indexmap::IndexMap;

use crate::emit::plsql::map_oracle_datatype;
use crate::metadata::PackageVariableRecord;

/// Emits the helper DDLs for one package: the initializer first, then
/// accessors per variable in declaration order.
pub(crate) fn emit_helpers(
    schema: &str,
    package: &str,
    variables: &IndexMap<String, PackageVariableRecord>,
) -> Vec<String> {
    if variables.is_empty() {
        return Vec::new();
    }

    let schema = schema.to_lowercase();
    let package = package.to_lowercase();

    let mut helpers = vec![emit_initializer(&schema, &package, variables)];

    for variable in variables.values() {
        helpers.push(emit_getter(&schema, &package, variable));
        if !variable.constant {
            helpers.push(emit_setter(&schema, &package, variable));
        }
    }

    helpers
}

/// The initializer seeds every variable's config key, guarded by the
/// `__initialized` sentinel so repeated calls are no-ops.
fn emit_initializer(
    schema: &str,
    package: &str,
    variables: &IndexMap<String, PackageVariableRecord>,
) -> String {
    let sentinel = format!("{schema}.{package}.__initialized");

    let mut body = String::new();
    for variable in variables.values() {
        let key = config_key(schema, package, &variable.name);
        let value = match &variable.default_expr {
            Some(default) => lowered_default(default),
            None => "NULL".to_string(),
        };
        body.push_str(&format!(
            "    PERFORM set_config('{key}', ({value})::text, false);\n"
        ));
    }

    format!(
        "CREATE OR REPLACE FUNCTION {schema}.{package}__initialize() RETURNS void AS $$\n\
         BEGIN\n\
         \x20 IF COALESCE(current_setting('{sentinel}', true), '') <> 'true' THEN\n\
         {body}\
         \x20   PERFORM set_config('{sentinel}', 'true', false);\n\
         \x20 END IF;\n\
         END;\n\
         $$ LANGUAGE plpgsql;"
    )
}

fn emit_getter(schema: &str, package: &str, variable: &PackageVariableRecord) -> String {
    let key = config_key(schema, package, &variable.name);
    let pg_type = map_oracle_datatype(&variable.datatype);
    let name = &variable.name;

    let value_expr = match &variable.default_expr {
        Some(default) => format!(
            "COALESCE(current_setting('{key}', true), ({})::text)::{pg_type}",
            lowered_default(default)
        ),
        None => format!("current_setting('{key}', true)::{pg_type}"),
    };

    format!(
        "CREATE OR REPLACE FUNCTION {schema}.{package}__get_{name}() RETURNS {pg_type} AS $$\n\
         BEGIN\n\
         \x20 RETURN {value_expr};\n\
         END;\n\
         $$ LANGUAGE plpgsql;"
    )
}

fn emit_setter(schema: &str, package: &str, variable: &PackageVariableRecord) -> String {
    let key = config_key(schema, package, &variable.name);
    let pg_type = map_oracle_datatype(&variable.datatype);
    let name = &variable.name;

    format!(
        "CREATE OR REPLACE FUNCTION {schema}.{package}__set_{name}(p_value {pg_type}) RETURNS void AS $$\n\
         BEGIN\n\
         \x20 PERFORM set_config('{key}', p_value::text, false);\n\
         END;\n\
         $$ LANGUAGE plpgsql;"
    )
}

/// The config key of a package variable: `schema.pkg.var`, dotted and
/// lowercase.
fn config_key(schema: &str, package: &str, variable: &str) -> String {
    format!(
        "{}.{}.{}",
        schema.to_lowercase(),
        package.to_lowercase(),
        variable.to_lowercase()
    )
}

/// Lowers an Oracle default expression into PostgreSQL form.
///
/// `SYSDATE`/`SYSTIMESTAMP` become `CURRENT_TIMESTAMP`; quoted strings and
/// bare numerics pass through as SQL literals.
fn lowered_default(default: &str) -> String {
    let trimmed = default.trim();

    if trimmed.eq_ignore_ascii_case("sysdate") || trimmed.eq_ignore_ascii_case("systimestamp") {
        return "CURRENT_TIMESTAMP".to_string();
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn variables() -> IndexMap<String, PackageVariableRecord> {
        let mut map = IndexMap::new();
        map.insert(
            "g_limit".to_string(),
            PackageVariableRecord {
                name: "g_limit".to_string(),
                datatype: "NUMBER".to_string(),
                default_expr: Some("100".to_string()),
                constant: false,
            },
        );
        map.insert(
            "c_app".to_string(),
            PackageVariableRecord {
                name: "c_app".to_string(),
                datatype: "VARCHAR2(30)".to_string(),
                default_expr: Some("'HR suite'".to_string()),
                constant: true,
            },
        );
        map
    }

    #[test]
    fn helpers_cover_initializer_getters_and_setters() {
        let helpers = emit_helpers("HR", "conf", &variables());

        // Initializer, two getters, one setter (constants get none).
        assert_eq!(helpers.len(), 4);
        assert!(helpers[0].contains("hr.conf.__initialized"));
        assert!(helpers[0].contains("PERFORM set_config('hr.conf.g_limit', (100)::text, false);"));
        assert!(helpers[1].contains("FUNCTION hr.conf__get_g_limit() RETURNS numeric"));
        assert!(helpers[2].contains("PERFORM set_config('hr.conf.g_limit', p_value::text, false);"));
        assert!(helpers[3].contains("get_c_app"));
        assert!(!helpers.iter().any(|h| h.contains("set_c_app")));
    }

    #[test]
    fn sysdate_defaults_are_lowered() {
        assert_eq!(lowered_default("SYSDATE"), "CURRENT_TIMESTAMP");
        assert_eq!(lowered_default("'abc'"), "'abc'");
        assert_eq!(lowered_default(" 42 "), "42");
    }
}
