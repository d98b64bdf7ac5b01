// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2023 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! End-to-end transformation scenarios, Oracle in, PostgreSQL out.

use pretty_assertions::assert_eq;

use plsql_transpiler::{
    transform_function_or_procedure, transform_package_body, transform_trigger,
    transform_type_body, transform_view, ColumnRecord, MetadataIndex, SynonymRecord, TableRecord,
    TriggerEvent, TriggerRecord, TriggerTiming,
};

fn hr_metadata() -> MetadataIndex {
    let mut builder = MetadataIndex::builder();
    builder.add_table(TableRecord {
        schema: "HR".to_string(),
        name: "EMP".to_string(),
        columns: vec![
            ColumnRecord {
                name: "EMPNO".to_string(),
                datatype: "NUMBER(4)".to_string(),
                nullable: false,
                default: None,
            },
            ColumnRecord {
                name: "ENAME".to_string(),
                datatype: "VARCHAR2(10)".to_string(),
                nullable: true,
                default: None,
            },
            ColumnRecord {
                name: "HIREDATE".to_string(),
                datatype: "DATE".to_string(),
                nullable: true,
                default: None,
            },
            ColumnRecord {
                name: "SAL".to_string(),
                datatype: "NUMBER(7,2)".to_string(),
                nullable: true,
                default: None,
            },
        ],
    });
    builder.build()
}

#[test]
fn simple_view_passes_through() {
    let result = transform_view("SELECT empno, ename FROM emp", "hr", &hr_metadata());
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.postgres_sql, "SELECT empno, ename FROM emp");
}

#[test]
fn nvl_and_dual() {
    let result = transform_view("SELECT NVL(commission, 0) FROM dual", "hr", &hr_metadata());
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.postgres_sql, "SELECT COALESCE(commission, 0)");
}

#[test]
fn oracle_outer_join_becomes_ansi_join() {
    let result = transform_view(
        "SELECT a.id, b.name FROM a, b WHERE a.id = b.id(+) AND a.active = 1",
        "hr",
        &hr_metadata(),
    );
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(
        result.postgres_sql,
        "SELECT a.id, b.name FROM a LEFT JOIN b ON (a.id = b.id) WHERE a.active = 1"
    );
}

#[test]
fn left_marker_becomes_right_join() {
    let result = transform_view(
        "SELECT a.id, b.name FROM a, b WHERE a.id(+) = b.id",
        "hr",
        &hr_metadata(),
    );
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    // `(+)` on the left side makes the left table optional; anchored at
    // the first FROM table this renders as a RIGHT JOIN edge onto `b`.
    assert_eq!(
        result.postgres_sql,
        "SELECT a.id, b.name FROM a RIGHT JOIN b ON (a.id = b.id)"
    );
}

#[test]
fn merged_join_conditions() {
    let result = transform_view(
        "SELECT a.id FROM a, b WHERE a.id = b.id(+) AND a.grp = b.grp(+)",
        "hr",
        &hr_metadata(),
    );
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(
        result.postgres_sql,
        "SELECT a.id FROM a LEFT JOIN b ON (a.id = b.id AND a.grp = b.grp)"
    );
}

#[test]
fn non_equality_outer_join_is_rejected() {
    let result = transform_view(
        "SELECT a.id FROM a, b WHERE a.id < b.id(+)",
        "hr",
        &hr_metadata(),
    );
    assert!(!result.errors.is_empty());
    assert!(result.postgres_sql.is_empty());
}

#[test]
fn rownum_becomes_limit() {
    let result = transform_view(
        "SELECT empno FROM emp WHERE ROWNUM <= 10 ORDER BY empno",
        "hr",
        &hr_metadata(),
    );
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(
        result.postgres_sql,
        "SELECT empno FROM emp ORDER BY empno LIMIT 10"
    );
}

#[test]
fn rownum_keeps_other_conditions() {
    let result = transform_view(
        "SELECT empno FROM emp WHERE sal > 1000 AND ROWNUM <= 5",
        "hr",
        &hr_metadata(),
    );
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(
        result.postgres_sql,
        "SELECT empno FROM emp WHERE sal > 1000 LIMIT 5"
    );
}

#[test]
fn unsupported_rownum_shape_passes_through() {
    let result = transform_view(
        "SELECT empno FROM emp WHERE ROWNUM > 5",
        "hr",
        &hr_metadata(),
    );
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.postgres_sql, "SELECT empno FROM emp WHERE rownum > 5");
}

#[test]
fn rownum_between_range() {
    let result = transform_view(
        "SELECT empno FROM emp WHERE ROWNUM BETWEEN 1 AND 5",
        "hr",
        &hr_metadata(),
    );
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.postgres_sql, "SELECT empno FROM emp LIMIT 5");
}

#[test]
fn connect_by_becomes_recursive_cte() {
    let result = transform_view(
        "SELECT id, SYS_CONNECT_BY_PATH(name, '/') p FROM t START WITH parent IS NULL CONNECT BY PRIOR id = parent",
        "hr",
        &hr_metadata(),
    );
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(
        result.postgres_sql,
        "WITH RECURSIVE rec AS (\
         SELECT id, name, 1 AS level, ARRAY[name] AS path FROM t WHERE parent IS NULL \
         UNION ALL \
         SELECT t.id, t.name, rec.level + 1, rec.path || t.name FROM t JOIN rec ON rec.id = t.parent\
         ) SELECT id, array_to_string(path, '/') AS p FROM rec"
    );
}

#[test]
fn decode_becomes_case() {
    let result = transform_view(
        "SELECT DECODE(deptno, 10, 'ACCOUNTING', 20, 'RESEARCH', 'OTHER') FROM emp",
        "hr",
        &hr_metadata(),
    );
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(
        result.postgres_sql,
        "SELECT CASE deptno WHEN 10 THEN 'ACCOUNTING' WHEN 20 THEN 'RESEARCH' ELSE 'OTHER' END FROM emp"
    );
}

#[test]
fn builtin_rewrites() {
    let meta = hr_metadata();

    let result = transform_view("SELECT SYSDATE FROM dual", "hr", &meta);
    assert_eq!(result.postgres_sql, "SELECT CURRENT_TIMESTAMP");

    let result = transform_view("SELECT INSTR(ename, 'a') FROM emp", "hr", &meta);
    assert_eq!(result.postgres_sql, "SELECT POSITION('a' IN ename) FROM emp");

    let result = transform_view("SELECT TO_NUMBER(ename) FROM emp", "hr", &meta);
    assert_eq!(result.postgres_sql, "SELECT ename::NUMERIC FROM emp");

    // Type-directed: HIREDATE is a DATE column in the metadata.
    let result = transform_view("SELECT TRUNC(hiredate) FROM emp", "hr", &meta);
    assert_eq!(
        result.postgres_sql,
        "SELECT DATE_TRUNC('day', hiredate)::DATE FROM emp"
    );

    // Without type evidence TRUNC stays a plain function call.
    let result = transform_view("SELECT TRUNC(sal) FROM emp", "hr", &meta);
    assert_eq!(result.postgres_sql, "SELECT trunc(sal) FROM emp");
}

#[test]
fn synonyms_substitute_at_table_references() {
    let mut builder = MetadataIndex::builder();
    builder.add_synonym(SynonymRecord {
        owner: "hr".to_string(),
        name: "emp".to_string(),
        target_schema: "scott".to_string(),
        target_name: "employees".to_string(),
    });
    let meta = builder.build();

    let result = transform_view("SELECT empno FROM emp", "hr", &meta);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.postgres_sql, "SELECT empno FROM scott.employees");
}

#[test]
fn before_row_trigger() {
    let record = TriggerRecord {
        schema: "HR".to_string(),
        name: "check_salary".to_string(),
        table_name: "t".to_string(),
        timing: TriggerTiming::Before,
        events: vec![TriggerEvent::Update { columns: vec![] }],
        for_each_row: true,
        when_clause: None,
        body: "BEGIN IF :NEW.salary < 0 THEN :NEW.salary := 0; END IF; END;".to_string(),
    };

    let result = transform_trigger(&record, &hr_metadata());
    assert!(result.errors.is_empty(), "{:?}", result.errors);

    assert!(result
        .function_ddl
        .starts_with("CREATE OR REPLACE FUNCTION hr.check_salary_func() RETURNS TRIGGER AS $$"));
    assert!(result.function_ddl.contains("IF NEW.salary < 0 THEN"));
    assert!(result.function_ddl.contains("NEW.salary := 0;"));
    assert!(result.function_ddl.contains("RETURN NEW;\nEND;"));
    assert!(result.function_ddl.ends_with("$$ LANGUAGE plpgsql;"));

    assert_eq!(
        result.trigger_ddl,
        "CREATE TRIGGER check_salary BEFORE UPDATE ON hr.t FOR EACH ROW \
         EXECUTE FUNCTION hr.check_salary_func();"
    );
}

#[test]
fn after_statement_trigger_returns_null() {
    let record = TriggerRecord {
        schema: "hr".to_string(),
        name: "audit_emp".to_string(),
        table_name: "emp".to_string(),
        timing: TriggerTiming::After,
        events: vec![TriggerEvent::Insert, TriggerEvent::Delete],
        for_each_row: false,
        when_clause: None,
        body: "BEGIN NULL; END;".to_string(),
    };

    let result = transform_trigger(&record, &hr_metadata());
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert!(result.function_ddl.contains("RETURN NULL;\nEND;"));
    assert_eq!(
        result.trigger_ddl,
        "CREATE TRIGGER audit_emp AFTER INSERT OR DELETE ON hr.emp \
         EXECUTE FUNCTION hr.audit_emp_func();"
    );
}

#[test]
fn standalone_function_transforms() {
    let result = transform_function_or_procedure(
        "CREATE OR REPLACE FUNCTION get_sal(p_empno IN NUMBER) RETURN NUMBER IS\n\
         BEGIN\n\
         \x20 RETURN 1;\n\
         END;",
        "hr",
        &hr_metadata(),
    );

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert!(result
        .postgres_sql
        .starts_with("CREATE OR REPLACE FUNCTION hr.get_sal(p_empno numeric) RETURNS numeric AS $$"));
    assert!(result.postgres_sql.contains("RETURN 1;"));
    assert!(result.postgres_sql.ends_with("$$ LANGUAGE plpgsql;"));
}

#[test]
fn package_body_transforms_every_member_and_emits_helpers() {
    const SPEC: &str = r#"
CREATE OR REPLACE PACKAGE counters AS
  g_hits NUMBER := 0;
  FUNCTION bump RETURN NUMBER;
END counters;
"#;
    const BODY: &str = r#"
CREATE OR REPLACE PACKAGE BODY counters AS
  FUNCTION bump RETURN NUMBER IS
  BEGIN
    g_hits := g_hits + 1;
    RETURN g_hits;
  END bump;
END counters;
"#;

    let result = transform_package_body("hr", "counters", SPEC, BODY, &hr_metadata());
    assert!(result.errors.is_empty(), "{:?}", result.errors);

    // Initializer, getter and setter for the one variable.
    assert_eq!(result.helpers.len(), 3);
    assert!(result.helpers[0].contains("hr.counters__initialize()"));
    assert!(result.helpers[0].contains("'hr.counters.__initialized', 'true'"));

    assert_eq!(result.functions.len(), 1);
    let (name, ddl) = &result.functions[0];
    assert_eq!(name, "hr.counters__bump");
    assert!(ddl.contains("CREATE OR REPLACE FUNCTION hr.counters__bump() RETURNS numeric"));
    // Variable accesses route through the session-scoped accessors.
    assert!(ddl.contains("PERFORM hr.counters__set_g_hits(hr.counters__get_g_hits() + 1);"));
    assert!(ddl.contains("RETURN hr.counters__get_g_hits();"));
}

#[test]
fn package_body_partial_success() {
    // The second function uses `(+)` with a non-equality operator inside a
    // query and must fail alone; the first one still transforms.
    const BODY: &str = r#"
CREATE PACKAGE BODY p AS
  FUNCTION ok RETURN NUMBER IS
  BEGIN
    RETURN 1;
  END ok;

  FUNCTION bad RETURN NUMBER IS
    l_x NUMBER;
  BEGIN
    SELECT a.x INTO l_x FROM a, b WHERE a.x < b.x(+);
    RETURN l_x;
  END bad;
END p;
"#;

    let result = transform_package_body("hr", "p", "", BODY, &hr_metadata());
    assert_eq!(result.functions.len(), 1);
    assert_eq!(result.functions[0].0, "hr.p__ok");
    assert_eq!(result.errors.len(), 1);
}

#[test]
fn type_body_methods_flatten() {
    const BODY: &str = r#"
TYPE BODY address_t IS
  MEMBER FUNCTION formatted RETURN VARCHAR2 IS
  BEGIN
    RETURN street || ', ' || city;
  END;
END;
"#;

    let result = transform_type_body("hr", "address_t", BODY, &hr_metadata());
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.methods.len(), 1);
    assert_eq!(result.methods[0].0, "hr.address_t__formatted");
    assert!(result.methods[0]
        .1
        .contains("FUNCTION hr.address_t__formatted(self hr.address_t) RETURNS text"));
}

#[test]
fn determinism() {
    let meta = hr_metadata();
    const INPUT: &str =
        "SELECT e.empno, NVL(e.ename, 'unknown') FROM emp e WHERE ROWNUM <= 3 ORDER BY e.empno";

    let first = transform_view(INPUT, "hr", &meta);
    let second = transform_view(INPUT, "hr", &meta);
    assert_eq!(first, second);
}

#[test]
fn comments_do_not_change_the_output() {
    let meta = hr_metadata();

    let bare = transform_view("SELECT empno FROM emp WHERE sal > 10", "hr", &meta);
    let commented = transform_view(
        "SELECT empno -- the employee number\nFROM emp /* main table */ WHERE sal > 10",
        "hr",
        &meta,
    );

    assert!(commented.errors.is_empty(), "{:?}", commented.errors);
    assert_eq!(bare.postgres_sql, commented.postgres_sql);
}

#[test]
fn postgres_shaped_query_is_whitespace_stable() {
    let meta = hr_metadata();
    const INPUT: &str = "SELECT empno, ename FROM emp WHERE sal > 100 ORDER BY empno";

    let result = transform_view(INPUT, "hr", &meta);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.postgres_sql, INPUT);
}

#[test]
fn parse_errors_are_returned_not_thrown() {
    let result = transform_view("SELEC empno FROM emp", "hr", &hr_metadata());
    assert!(!result.errors.is_empty());
    assert!(result.postgres_sql.is_empty());
}
