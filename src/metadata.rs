// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the read-only schema metadata index consumed by the
//! transformer.
//!
//! The index is populated once per job from snapshots the extraction jobs
//! took of the Oracle catalog, and is treated as frozen afterwards. All
//! identifiers are normalized to lowercase on ingest; schemas keep their
//! ingestion order while objects within a schema are sorted alphabetically.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRecord {
    pub name: String,
    /// The raw Oracle datatype, e.g. `NUMBER(10,2)` or `VARCHAR2(30)`.
    pub datatype: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRecord {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnRecord>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynonymRecord {
    /// The owning schema, or `PUBLIC`.
    pub owner: String,
    pub name: String,
    pub target_schema: String,
    pub target_name: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoutineKind {
    Function,
    Procedure,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageFunctionRecord {
    pub schema: String,
    pub package: String,
    pub name: String,
    pub kind: RoutineKind,
    pub arity: usize,
    /// Whether any parameter is declared `OUT` or `IN OUT`.
    #[serde(default)]
    pub has_out_params: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamMode {
    In,
    Out,
    InOut,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMethodParam {
    pub name: String,
    pub datatype: String,
    pub mode: ParamMode,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMethodRecord {
    pub schema: String,
    pub type_name: String,
    pub method: String,
    pub kind: RoutineKind,
    /// Member methods receive the object value as implicit first argument;
    /// static methods do not.
    pub is_member: bool,
    pub params: Vec<TypeMethodParam>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageVariableRecord {
    pub name: String,
    pub datatype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_expr: Option<String>,
    pub constant: bool,
}

/// A type declared inside a package specification.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PackageTypeDecl {
    Record { fields: Vec<(String, String)> },
    TableOf { element: String },
    Varray { size: usize, element: String },
    IndexBy { key: String, element: String },
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    pub schema: String,
    pub name: String,
    pub variables: IndexMap<String, PackageVariableRecord>,
    pub types: IndexMap<String, PackageTypeDecl>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerTiming {
    Before,
    After,
    InsteadOf,
}

impl TriggerTiming {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Before => "BEFORE",
            Self::After => "AFTER",
            Self::InsteadOf => "INSTEAD OF",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "event")]
pub enum TriggerEvent {
    Insert,
    Update { columns: Vec<String> },
    Delete,
}

/// Everything the extraction jobs know about one Oracle trigger.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRecord {
    pub schema: String,
    pub name: String,
    pub table_name: String,
    pub timing: TriggerTiming,
    pub events: Vec<TriggerEvent>,
    pub for_each_row: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when_clause: Option<String>,
    /// The trigger body: an anonymous `[DECLARE ..] BEGIN .. END;` block.
    pub body: String,
}

/// Snapshot of all Oracle schema facts the transformer needs.
///
/// Shared immutably across transformer invocations; never mutated after
/// [`MetadataBuilder::build()`].
#[derive(Clone, Debug, Default)]
pub struct MetadataIndex {
    tables: IndexMap<(String, String), TableRecord>,
    synonyms: HashMap<(String, String), (String, String)>,
    public_synonyms: HashMap<String, (String, String)>,
    package_functions: HashMap<(String, String, String), PackageFunctionRecord>,
    type_methods: HashMap<(String, String, String), TypeMethodRecord>,
    packages: IndexMap<(String, String), PackageRecord>,
}

impl MetadataIndex {
    pub fn builder() -> MetadataBuilder {
        MetadataBuilder::default()
    }

    pub fn table(&self, schema: &str, name: &str) -> Option<&TableRecord> {
        self.tables
            .get(&(schema.to_lowercase(), name.to_lowercase()))
    }

    pub fn table_column(&self, schema: &str, table: &str, column: &str) -> Option<&ColumnRecord> {
        let column = column.to_lowercase();
        self.table(schema, table)?
            .columns
            .iter()
            .find(|c| c.name == column)
    }

    /// Resolves a synonym, trying the current schema first, then `PUBLIC`.
    ///
    /// Returns `None` when no synonym matches; callers pass the original
    /// name through in that case (fail-soft, dangling targets included).
    pub fn resolve_synonym(&self, schema: &str, name: &str) -> Option<(&str, &str)> {
        let key = (schema.to_lowercase(), name.to_lowercase());

        self.synonyms
            .get(&key)
            .or_else(|| self.public_synonyms.get(&key.1))
            .map(|(s, n)| (s.as_str(), n.as_str()))
    }

    pub fn package_function(
        &self,
        schema: &str,
        package: &str,
        name: &str,
    ) -> Option<&PackageFunctionRecord> {
        self.package_functions.get(&(
            schema.to_lowercase(),
            package.to_lowercase(),
            name.to_lowercase(),
        ))
    }

    pub fn type_method(
        &self,
        schema: &str,
        type_name: &str,
        method: &str,
    ) -> Option<&TypeMethodRecord> {
        self.type_methods.get(&(
            schema.to_lowercase(),
            type_name.to_lowercase(),
            method.to_lowercase(),
        ))
    }

    /// All methods of one object type, in deterministic (name) order.
    pub fn methods_of_type(&self, schema: &str, type_name: &str) -> Vec<&TypeMethodRecord> {
        let schema = schema.to_lowercase();
        let type_name = type_name.to_lowercase();

        let mut methods = self
            .type_methods
            .iter()
            .filter(|((s, t, _), _)| *s == schema && *t == type_name)
            .map(|(_, record)| record)
            .collect::<Vec<_>>();
        methods.sort_by(|a, b| a.method.cmp(&b.method));
        methods
    }

    pub fn package(&self, schema: &str, name: &str) -> Option<&PackageRecord> {
        self.packages
            .get(&(schema.to_lowercase(), name.to_lowercase()))
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableRecord> {
        self.tables.values()
    }
}

/// Accumulates schema snapshots and freezes them into a [`MetadataIndex`].
#[derive(Debug, Default)]
pub struct MetadataBuilder {
    tables: Vec<TableRecord>,
    synonyms: Vec<SynonymRecord>,
    package_functions: Vec<PackageFunctionRecord>,
    type_methods: Vec<TypeMethodRecord>,
    packages: Vec<PackageRecord>,
}

impl MetadataBuilder {
    pub fn add_table(&mut self, mut table: TableRecord) -> &mut Self {
        table.schema = table.schema.to_lowercase();
        table.name = table.name.to_lowercase();
        for column in &mut table.columns {
            column.name = column.name.to_lowercase();
        }

        self.tables.push(table);
        self
    }

    pub fn add_synonym(&mut self, mut synonym: SynonymRecord) -> &mut Self {
        synonym.owner = synonym.owner.to_lowercase();
        synonym.name = synonym.name.to_lowercase();
        synonym.target_schema = synonym.target_schema.to_lowercase();
        synonym.target_name = synonym.target_name.to_lowercase();

        self.synonyms.push(synonym);
        self
    }

    pub fn add_package_function(&mut self, mut function: PackageFunctionRecord) -> &mut Self {
        function.schema = function.schema.to_lowercase();
        function.package = function.package.to_lowercase();
        function.name = function.name.to_lowercase();

        self.package_functions.push(function);
        self
    }

    pub fn add_type_method(&mut self, mut method: TypeMethodRecord) -> &mut Self {
        method.schema = method.schema.to_lowercase();
        method.type_name = method.type_name.to_lowercase();
        method.method = method.method.to_lowercase();
        for param in &mut method.params {
            param.name = param.name.to_lowercase();
        }

        self.type_methods.push(method);
        self
    }

    pub fn add_package(&mut self, mut package: PackageRecord) -> &mut Self {
        package.schema = package.schema.to_lowercase();
        package.name = package.name.to_lowercase();
        package.variables = package
            .variables
            .into_iter()
            .map(|(name, mut variable)| {
                variable.name = variable.name.to_lowercase();
                (name.to_lowercase(), variable)
            })
            .collect();

        self.packages.push(package);
        self
    }

    pub fn build(self) -> MetadataIndex {
        let mut index = MetadataIndex::default();

        // Schemas keep caller order, objects sort alphabetically within
        // each; a stable sort keyed on the name alone preserves exactly
        // that.
        let mut tables = self.tables;
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        for table in tables {
            index
                .tables
                .insert((table.schema.clone(), table.name.clone()), table);
        }

        for synonym in self.synonyms {
            let target = (synonym.target_schema, synonym.target_name);
            if synonym.owner == "public" {
                index.public_synonyms.insert(synonym.name, target);
            } else {
                index.synonyms.insert((synonym.owner, synonym.name), target);
            }
        }

        for function in self.package_functions {
            index.package_functions.insert(
                (
                    function.schema.clone(),
                    function.package.clone(),
                    function.name.clone(),
                ),
                function,
            );
        }

        for method in self.type_methods {
            index.type_methods.insert(
                (
                    method.schema.clone(),
                    method.type_name.clone(),
                    method.method.clone(),
                ),
                method,
            );
        }

        let mut packages = self.packages;
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        for package in packages {
            index
                .packages
                .insert((package.schema.clone(), package.name.clone()), package);
        }

        index
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn table(schema: &str, name: &str, columns: &[(&str, &str)]) -> TableRecord {
        TableRecord {
            schema: schema.to_string(),
            name: name.to_string(),
            columns: columns
                .iter()
                .map(|(name, datatype)| ColumnRecord {
                    name: name.to_string(),
                    datatype: datatype.to_string(),
                    nullable: true,
                    default: None,
                })
                .collect(),
        }
    }

    #[test]
    fn identifiers_are_lowercased_on_ingest() {
        let mut builder = MetadataIndex::builder();
        builder.add_table(table("HR", "EMP", &[("EMPNO", "NUMBER")]));
        let index = builder.build();

        assert!(index.table("hr", "emp").is_some());
        assert!(index.table_column("HR", "Emp", "empno").is_some());
    }

    #[test]
    fn synonym_resolution_prefers_current_schema() {
        let mut builder = MetadataIndex::builder();
        builder
            .add_synonym(SynonymRecord {
                owner: "hr".to_string(),
                name: "emp".to_string(),
                target_schema: "hr".to_string(),
                target_name: "employees".to_string(),
            })
            .add_synonym(SynonymRecord {
                owner: "PUBLIC".to_string(),
                name: "emp".to_string(),
                target_schema: "scott".to_string(),
                target_name: "emp_all".to_string(),
            });
        let index = builder.build();

        assert_eq!(index.resolve_synonym("hr", "emp"), Some(("hr", "employees")));
        // A schema without its own synonym falls back to PUBLIC.
        assert_eq!(
            index.resolve_synonym("scott", "emp"),
            Some(("scott", "emp_all"))
        );
        // Unknown synonyms fail soft.
        assert_eq!(index.resolve_synonym("hr", "nope"), None);
    }

    #[test]
    fn tables_iterate_alphabetically_within_schema() {
        let mut builder = MetadataIndex::builder();
        builder
            .add_table(table("hr", "zebra", &[]))
            .add_table(table("hr", "alpha", &[]));
        let index = builder.build();

        let names = index.tables().map(|t| t.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["alpha", "zebra"]);
    }

    #[test]
    fn package_function_lookup() {
        let mut builder = MetadataIndex::builder();
        builder.add_package_function(PackageFunctionRecord {
            schema: "HR".to_string(),
            package: "EMP_MGMT".to_string(),
            name: "HIRE".to_string(),
            kind: RoutineKind::Function,
            arity: 2,
            has_out_params: false,
        });
        let index = builder.build();

        assert!(index.package_function("hr", "emp_mgmt", "hire").is_some());
        assert!(index.package_function("hr", "emp_mgmt", "fire").is_none());
    }
}
