//! Integration tests for the qb module.

use crate::cte::With;
use crate::dialect::{PgDialect, SqliteDialect};
use crate::ident::{Column, Field, Literal, Source};
use crate::qb::{
    Join, Order, QueryBuilder, SqlStatement, UnionKind, delete, insert, select, update, with,
};
use crate::record::{RecordData, RecordDescriptor, RecordRef};
use crate::value::Value;
use std::sync::Arc;

fn placeholder_count(sql: &str) -> usize {
    sql.matches('?').count()
}

fn book() -> Arc<RecordDescriptor> {
    RecordDescriptor::builder("book")
        .schema("library")
        .primary_key("id_book")
        .field("id", "id_book")
        .field("title", "title")
        .field("author", "fk_author")
        .build()
}

fn author() -> Arc<RecordDescriptor> {
    RecordDescriptor::builder("author")
        .schema("library")
        .field("id", "id_author")
        .field("name", "full_name")
        .build()
}

#[test]
fn test_select_basic() {
    let (sql, values) = select().from_cols("users", ["id", "name"]).assemble().unwrap();
    assert_eq!(sql, r#"SELECT "id","name" FROM "users""#);
    assert!(values.is_empty());
}

#[test]
fn test_select_nested_where() {
    let (sql, values) = select()
        .from("t")
        .where_("id", ">", 5)
        .where_and()
        .where_("n", "IS NOT NULL", ())
        .or_where("cp", "IN", vec![1, 2])
        .where_end()
        .assemble()
        .unwrap();
    assert_eq!(
        sql,
        r#"SELECT "t".* FROM "t" WHERE ("id" > ?) AND ( ("n" IS NOT NULL) OR ("cp" IN ?) )"#
    );
    assert_eq!(values, vec![Value::from(5), Value::List(vec![Value::Int(1), Value::Int(2)])]);
}

#[test]
fn test_placeholder_count_matches_values() {
    let sub = select().from_cols("b", ["id"]).where_("x", "=", "y");
    let (sql, values) = select()
        .from("a")
        .where_("a", "=", 1)
        .or_where("b", "IN", sub)
        .having(Literal::new("COUNT(*)"), ">", 2)
        .group_by(["a"])
        .assemble()
        .unwrap();
    assert_eq!(placeholder_count(&sql), values.len());
    assert_eq!(values, vec![Value::from(1), Value::from("y"), Value::from(2)]);
}

#[test]
fn test_pg_numbering_across_nesting() {
    let qb = QueryBuilder::new(Arc::new(PgDialect));
    let (sql, values) = qb
        .select()
        .from(Source::from(select().from("orders").where_("total", ">", 100)).alias("o"))
        .join(
            Join::inner("users")
                .on("id", "o", "user_id")
                .columns(["name"]),
        )
        .where_(Field::qualified("users", "active"), "=", true)
        .order_by("name", Order::Asc)
        .assemble()
        .unwrap();
    assert_eq!(
        sql,
        r#"SELECT "o".*,"users"."name" FROM (SELECT "orders".* FROM "orders" WHERE ("total" > $1)) AS "o" INNER JOIN "users" ON "o"."user_id"="users"."id" WHERE ("users"."active" = $2) ORDER BY "name" ASC"#
    );
    assert_eq!(values, vec![Value::from(100), Value::from(true)]);
}

#[test]
fn test_record_select_translates_attributes() {
    let b = RecordRef::new(&book()).alias("b");
    let a = RecordRef::new(&author());
    let (sql, values) = select()
        .from_cols(b.clone(), ["id", "title"])
        .join(
            Join::left(a.clone())
                .on("id", b.clone(), "author")
                .columns([Column::new("name").alias("author_name")]),
        )
        .where_(b.field("title"), "LIKE", "%Dune%")
        .order_by_desc(a.field("name"))
        .assemble()
        .unwrap();
    assert_eq!(
        sql,
        r#"SELECT "b"."id_book","b"."title","library"."author"."full_name" AS "author_name" FROM "library"."book" AS "b" LEFT JOIN "library"."author" ON "b"."fk_author"="library"."author"."id_author" WHERE ("b"."title" LIKE ?) ORDER BY "library"."author"."full_name" DESC"#
    );
    assert_eq!(values, vec![Value::from("%Dune%")]);
}

#[test]
fn test_unknown_record_attribute() {
    let b = RecordRef::new(&book());
    let err = select()
        .from(b.clone())
        .where_(b.field("isbn"), "=", "x")
        .assemble()
        .unwrap_err();
    assert!(err.is_identifier());

    let err = select().from_cols(b, ["isbn"]).assemble().unwrap_err();
    assert!(err.is_identifier());
}

#[test]
fn test_insert_record_order() {
    let d = book();
    let rec = RecordData::new(&d)
        .set("author", 3)
        .set("id", 1)
        .set("title", "Dune");
    let (sql, values) = insert().record(&rec).assemble().unwrap();
    assert_eq!(
        sql,
        r#"INSERT INTO "library"."book" ("id_book", "title", "fk_author") VALUES (?, ?, ?)"#
    );
    assert_eq!(values, vec![Value::from(1), Value::from("Dune"), Value::from(3)]);
}

#[test]
fn test_insert_returning_id() {
    let (sql, values) = insert()
        .table("t")
        .fields(["f"])
        .values([1])
        .returning("id")
        .assemble()
        .unwrap();
    assert_eq!(sql, r#"INSERT INTO "t" ("f") VALUES (?) RETURNING "id""#);
    assert_eq!(values, vec![Value::from(1)]);
}

#[test]
fn test_update_basic() {
    let (sql, values) = update()
        .table("users")
        .set("status", "inactive")
        .where_("id", "=", 1i64)
        .assemble()
        .unwrap();
    assert_eq!(sql, r#"UPDATE "users" SET "status"=? WHERE "id" = ?"#);
    assert_eq!(values, vec![Value::from("inactive"), Value::from(1i64)]);
}

#[test]
fn test_delete_sqlite() {
    let qb = QueryBuilder::new(Arc::new(SqliteDialect));
    let (sql, values) = qb
        .delete()
        .from("t")
        .where_("id", "=", 16)
        .or_where("name", "LIKE", "%x%")
        .assemble()
        .unwrap();
    assert_eq!(sql, r#"DELETE FROM "t" WHERE "id" = ? OR "name" LIKE ?"#);
    assert_eq!(values, vec![Value::from(16), Value::from("%x%")]);
}

#[test]
fn test_ilike_depends_on_dialect() {
    let q = |qb: QueryBuilder| qb.select().from("t").where_("name", "ILIKE", "a%").assemble();
    assert!(q(QueryBuilder::new(Arc::new(SqliteDialect))).unwrap_err().is_dialect());
    assert!(q(QueryBuilder::new(Arc::new(PgDialect))).is_ok());
}

#[test]
fn test_pg_cast_column() {
    let sql = QueryBuilder::new(Arc::new(PgDialect))
        .select()
        .from_cols("t", [Column::new("price").cast("text").alias("p")])
        .to_sql()
        .unwrap();
    assert_eq!(sql, r#"SELECT "price"::text AS "p" FROM "t""#);
}

#[test]
fn test_field_operand() {
    let (sql, values) = select()
        .from("a")
        .inner_join("b", "a_id", "a", "id")
        .where_(Field::qualified("b", "updated"), ">", Field::qualified("a", "updated"))
        .assemble()
        .unwrap();
    assert_eq!(
        sql,
        r#"SELECT "a".* FROM "a" INNER JOIN "b" ON "a"."id"="b"."a_id" WHERE ("b"."updated" > "a"."updated")"#
    );
    assert!(values.is_empty());
}

#[test]
fn test_recursive_tree() {
    let base = select().from(("folder", "f1")).where_("id_folder", "=", 1);
    let step = select()
        .from(("folder", "f2"))
        .inner_join("tree", "fk_parent", "f2", "id_folder");
    let (sql, values) = with()
        .recursive(true)
        .clause(
            "tree",
            select().union(base, UnionKind::All).union(step, UnionKind::All),
        )
        .query(select().from("tree"))
        .assemble()
        .unwrap();
    assert_eq!(
        sql,
        r#"WITH RECURSIVE "tree" AS (SELECT "f1".* FROM "folder" AS "f1" WHERE ("id_folder" = ?) UNION ALL SELECT "f2".* FROM "folder" AS "f2" INNER JOIN "tree" ON "f2"."id_folder"="tree"."fk_parent") SELECT "tree".* FROM "tree""#
    );
    assert_eq!(values, vec![Value::from(1)]);
}

#[test]
fn test_recursive_clause_helper_matches_manual() {
    let base = select().from(("folder", "f1")).where_("id_folder", "=", 1);
    let step = select()
        .from(("folder", "f2"))
        .inner_join("tree", "fk_parent", "f2", "id_folder");
    let manual = With::new()
        .recursive(true)
        .clause(
            "tree",
            select()
                .union(base.clone(), UnionKind::All)
                .union(step.clone(), UnionKind::All),
        )
        .query(select().from("tree"));
    let helper = With::new()
        .recursive_clause("tree", base, step, UnionKind::All)
        .query(select().from("tree"));
    assert_eq!(manual.assemble().unwrap(), helper.assemble().unwrap());
}

#[test]
fn test_nested_statement_uses_outer_dialect() {
    let inner = select().from_cols("b", ["id"]).where_("x", "=", 1);
    let (sql, _) = QueryBuilder::new(Arc::new(PgDialect))
        .select()
        .from("a")
        .where_("id", "IN", inner)
        .where_("y", "=", 2)
        .assemble()
        .unwrap();
    assert!(sql.contains(r#"WHERE ("x" = $1)"#));
    assert!(sql.ends_with(r#"("y" = $2)"#));
}

#[test]
fn test_errors_do_not_modify_builder() {
    let q = select().from("t").where_or().where_("a", "=", 1);
    let first = q.assemble().unwrap_err();
    let second = q.assemble().unwrap_err();
    assert_eq!(first, second);
}

#[test]
fn test_group_depth_property() {
    for opened in 1..5 {
        for closed in 0..=opened {
            let mut q = select().from("t");
            for _ in 0..opened {
                q = q.where_and().where_("a", "=", 1);
            }
            for _ in 0..closed {
                q = q.where_end();
            }
            let result = q.assemble();
            if closed == opened {
                assert!(result.is_ok());
            } else {
                assert!(result.unwrap_err().is_assembly());
            }
        }
    }
}

#[test]
fn test_delete_free_fn() {
    let sql = delete().from("t").to_sql().unwrap();
    assert_eq!(sql, r#"DELETE FROM "t""#);
}
