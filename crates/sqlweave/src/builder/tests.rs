use super::*;
use crate::condition::Shorthand;
use crate::driver::{PostgresDriver, SqliteDriver};
use crate::params::ParamKey;
use crate::placeholder;
use crate::schema::fixtures::*;
use crate::sql;
use crate::value::Value;
use chrono::{TimeZone, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;

fn sqlite() -> DriverRef {
    Arc::new(SqliteDriver::new())
}

fn order_to_contact() -> JoinOn {
    JoinOn::expr(|o, c, _| sql!("{} = {}", o.col("contactId")?, c.col("id")?))
}

/// Every placeholder in the SQL has a parameter and every parameter is used.
fn assert_bound(built: &BuiltStatement) {
    let referenced: BTreeSet<ParamKey> = placeholder::scan(&built.sql)
        .into_iter()
        .map(|p| p.key)
        .collect();
    let bound: BTreeSet<ParamKey> = built.params.keys().cloned().collect();
    assert_eq!(referenced, bound, "{}", built.sql);
}

const ORDER_COLUMNS: &str = "\"id\", \"contactId\", \"freightId\", \"cost\", \"qty\", \"total\"";

#[test]
fn test_default_projection() {
    let q = SelectQuery::new(&order(), sqlite());
    assert_eq!(q.build().sql, format!("SELECT {ORDER_COLUMNS} FROM \"Order\""));
    assert!(q.build().params.is_empty());
}

#[test]
fn test_join_where_select_end_to_end() {
    let q = SelectQuery::new(&order(), sqlite())
        .join(
            &contact(),
            JoinOn::expr(|o, c, _| {
                sql!(
                    "{} = {} AND {} > {}",
                    o.col("contactId")?,
                    c.col("id")?,
                    c.col("age")?,
                    18
                )
            }),
        )
        .unwrap()
        .filter_with(|refs| {
            let c = refs.of(&contact())?;
            sql!("{} = {}", c.col("city")?, "Austin")
        })
        .unwrap()
        .select_with(|refs| sql!("COUNT({}) * {} as count", refs.root().col("qty")?, 3))
        .unwrap();

    let built = q.build();
    assert_eq!(
        built.sql,
        "SELECT COUNT(\"Order\".\"qty\") * $3 as count FROM \"Order\" JOIN \"Contact\" ON \"Order\".\"contactId\" = \"Contact\".\"id\" AND \"Contact\".\"age\" > $1 WHERE \"Contact\".\"city\" = $2"
    );
    assert_bound(&built);
    assert_eq!(built.param(1u32), Some(&Value::Int(18)));
    assert_eq!(built.param(2u32), Some(&Value::from("Austin")));
    assert_eq!(built.param(3u32), Some(&Value::Int(3)));
}

#[test]
fn test_chaining_order_does_not_collide() {
    let joined = SelectQuery::new(&order(), sqlite())
        .join(&contact(), order_to_contact())
        .unwrap();
    let city = |refs: &Refs| sql!("{} = {}", refs.of(&contact())?.col("city")?, "Austin");
    let count = |refs: &Refs| sql!("COUNT({}) * {}", refs.root().col("qty")?, 3);

    let a = joined.clone().filter_with(city).unwrap().select_with(count).unwrap();
    let b = joined.select_with(count).unwrap().filter_with(city).unwrap();

    for q in [a, b] {
        let built = q.build();
        assert_bound(&built);
        let keys: Vec<_> = built.params.keys().cloned().collect();
        assert_eq!(keys, vec![ParamKey::from(1u32), ParamKey::from(2u32)]);
        let mut values: Vec<_> = built.params.values().cloned().collect();
        values.sort_by_key(|v| v.to_string());
        assert_eq!(values, vec![Value::Int(3), Value::from("Austin")]);
    }
}

#[test]
fn test_join_position_does_not_matter() {
    let on = || {
        JoinOn::expr(|o, c, _| {
            sql!(
                "{} = {} AND {} > {}",
                o.col("contactId")?,
                c.col("id")?,
                c.col("age")?,
                18
            )
        })
    };
    let count = |refs: &Refs| sql!("COUNT({}) * {}", refs.root().col("qty")?, 3);
    let qty = |refs: &Refs| sql!("{} > {}", refs.root().col("qty")?, 1);
    let base = || SelectQuery::new(&order(), sqlite());

    let join_first = base()
        .join(&contact(), on())
        .unwrap()
        .filter_with(qty)
        .unwrap()
        .select_with(count)
        .unwrap();
    let join_last = base()
        .select_with(count)
        .unwrap()
        .filter_with(qty)
        .unwrap()
        .join(&contact(), on())
        .unwrap();
    let join_between = base()
        .filter_with(qty)
        .unwrap()
        .join(&contact(), on())
        .unwrap()
        .select_with(count)
        .unwrap();

    assert_eq!(
        join_last.build().sql,
        "SELECT COUNT(\"qty\") * $1 FROM \"Order\" JOIN \"Contact\" ON \"Order\".\"contactId\" = \"Contact\".\"id\" AND \"Contact\".\"age\" > $3 WHERE \"qty\" > $2"
    );
    for q in [join_first, join_last, join_between] {
        let built = q.build();
        assert_eq!(built.params.len(), 3, "{}", built.sql);
        assert_bound(&built);
        // projection, ON and WHERE values in text order
        assert_eq!(
            built.to_positional().values,
            vec![Value::Int(3), Value::Int(18), Value::Int(1)]
        );
    }
}

#[test]
fn test_literal_inputs_reject_placeholders() {
    let base = SelectQuery::new(&contact(), sqlite());

    let err = base.clone().filter("\"id\" = $1").unwrap_err();
    assert!(err.is_invalid_fragment());
    assert!(base.clone().or("\"city\" = $city").unwrap_err().is_invalid_fragment());
    assert!(base.clone().select_raw("$1 AS n").unwrap_err().is_invalid_fragment());
    assert!(base.clone().select_columns(["\"id\"", "$2"]).unwrap_err().is_invalid_fragment());
    assert!(base.clone().group_by("$g").unwrap_err().is_invalid_fragment());
    assert!(base.clone().order_by("$1").unwrap_err().is_invalid_fragment());
    assert!(
        UpdateQuery::new(&contact(), sqlite())
            .set_raw("\"age\" = $1")
            .unwrap_err()
            .is_invalid_fragment()
    );

    let err = base
        .join(&order(), JoinOn::raw("\"Order\".\"contactId\" = $1"))
        .unwrap_err();
    assert!(err.is_invalid_fragment());
    assert!(base.core().joins().is_empty());

    // quoted text is literal
    let q = base.filter("\"city\" <> '$1'").unwrap();
    assert!(q.build().sql.ends_with("WHERE \"city\" <> '$1'"));
    assert!(q.params().is_empty());
}

#[test]
fn test_raw_condition_cannot_alias_later_params() {
    let err = SelectQuery::new(&contact(), sqlite())
        .filter("\"id\" = $1")
        .and_then(|q| q.filter_with(|refs| sql!("{} = {}", refs.root().col("city")?, "Austin")))
        .unwrap_err();
    assert!(err.is_invalid_fragment());
}

#[test]
fn test_positional_conditions_are_renumbered() {
    let q = SelectQuery::new(&contact(), sqlite())
        .filter_with(|refs| sql!("{} > {}", refs.root().col("age")?, 18))
        .unwrap()
        .or_with(|refs| sql!("{} < {}", refs.root().col("age")?, 65))
        .unwrap()
        .select_raw("COUNT(*)")
        .unwrap();
    let built = q.build();
    assert_eq!(
        built.sql,
        "SELECT COUNT(*) FROM \"Contact\" WHERE \"age\" > $1 OR \"age\" < $2"
    );
    assert_bound(&built);
    assert_eq!(built.param(2u32), Some(&Value::Int(65)));
}

#[test]
fn test_named_params_last_write_wins() {
    let q = SelectQuery::new(&contact(), sqlite())
        .filter(Fragment::new("\"id\" > $id", [("id", 1)]).unwrap())
        .unwrap()
        .and(Fragment::new("\"id\" <> $id", [("id", 2)]).unwrap())
        .unwrap();
    let built = q.build();
    assert!(built.sql.ends_with("WHERE \"id\" > $id AND \"id\" <> $id"));
    assert_eq!(built.params.len(), 1);
    assert_eq!(built.param("id"), Some(&Value::Int(2)));
}

#[test]
fn test_or_accepts_every_input_form() {
    let q = SelectQuery::new(&contact(), sqlite())
        .select_raw("1")
        .unwrap()
        .filter("\"age\" IS NOT NULL")
        .unwrap()
        .or(Shorthand::new().equals("city", "Austin"))
        .unwrap()
        .or(vec![sql!("\"age\" = {}", 1).unwrap()])
        .unwrap();
    assert_eq!(
        q.build().sql,
        "SELECT 1 FROM \"Contact\" WHERE \"age\" IS NOT NULL OR \"city\" = $city OR \"age\" = $1"
    );
}

#[test]
fn test_clear_where() {
    let q = SelectQuery::new(&contact(), sqlite())
        .filter(Shorthand::new().equals("id", 1))
        .unwrap();
    assert!(q.has_where());
    let q = q.clear_where();
    assert!(!q.has_where());

    let built = q.build();
    assert!(!built.sql.contains("WHERE"));
    assert!(built.params.is_empty());
}

#[test]
fn test_clear_where_keeps_params_of_other_clauses() {
    let q = SelectQuery::new(&order(), sqlite())
        .select_with(|refs| sql!("COUNT({}) * {}", refs.root().col("qty")?, 3))
        .unwrap()
        .filter_with(|refs| sql!("{} > {}", refs.root().col("qty")?, 1))
        .unwrap()
        .clear_where();
    assert_eq!(q.params().len(), 1);
    assert_eq!(q.params().get(1u32), Some(&Value::Int(3)));

    let q = q
        .filter_with(|refs| sql!("{} < {}", refs.root().col("qty")?, 9))
        .unwrap();
    let built = q.build();
    assert_eq!(
        built.sql,
        "SELECT COUNT(\"qty\") * $1 FROM \"Order\" WHERE \"qty\" < $2"
    );
    assert_eq!(built.param(2u32), Some(&Value::Int(9)));
    assert_bound(&built);
}

#[test]
fn test_join_returns_independent_copy() {
    let base = SelectQuery::new(&order(), sqlite())
        .filter(Shorthand::new().equals("id", 1))
        .unwrap();
    let joined = base.join(&contact(), order_to_contact()).unwrap();
    let joined = joined
        .filter_with(|refs| sql!("{} = {}", refs[1].col("city")?, "Austin"))
        .unwrap();

    assert_eq!(
        base.build().sql,
        format!("SELECT {ORDER_COLUMNS} FROM \"Order\" WHERE \"id\" = $id")
    );
    assert_eq!(base.refs().len(), 1);
    assert_eq!(base.params().len(), 1);
    assert!(base.refs().root().alias().is_none());

    assert_bound(&base.build());

    assert_eq!(joined.refs().len(), 2);
    assert_eq!(joined.params().len(), 2);
    assert_bound(&joined.build());
    assert!(joined.build().sql.contains(
        "JOIN \"Contact\" ON \"Order\".\"contactId\" = \"Contact\".\"id\" WHERE \"id\" = $id AND \"Contact\".\"city\" = $1"
    ));
}

#[test]
fn test_explicit_aliases() {
    let q = SelectQuery::new(&order(), sqlite())
        .alias("o")
        .join_as(JoinKind::Left, &contact(), "c", order_to_contact())
        .unwrap()
        .select_props(["id", "qty"])
        .unwrap();
    assert_eq!(
        q.build().sql,
        "SELECT o.\"id\", o.\"qty\" FROM \"Order\" o LEFT JOIN \"Contact\" c ON o.\"contactId\" = c.\"id\""
    );
    assert_eq!(q.refs().of_alias("c").unwrap().table(), &contact());
}

#[test]
fn test_join_kinds_and_raw_on() {
    let base = SelectQuery::new(&order(), sqlite()).select_raw("*").unwrap();
    let on = || JoinOn::raw("\"Order\".\"freightId\" = \"Freight\".\"id\"");
    let cases = [
        (base.right_join(&freight(), on()).unwrap(), "RIGHT JOIN"),
        (base.full_join(&freight(), on()).unwrap(), "FULL JOIN"),
        (base.left_join(&freight(), on()).unwrap(), "LEFT JOIN"),
    ];
    for (q, keyword) in cases {
        assert_eq!(
            q.build().sql,
            format!("SELECT * FROM \"Order\" {keyword} \"Freight\" ON \"Order\".\"freightId\" = \"Freight\".\"id\"")
        );
    }
    assert_eq!(
        base.cross_join(&freight()).unwrap().build().sql,
        "SELECT * FROM \"Order\" CROSS JOIN \"Freight\""
    );
}

#[test]
fn test_join_on_params_are_merged() {
    let q = SelectQuery::new(&order(), sqlite())
        .filter_with(|refs| sql!("{} = {}", refs.root().col("qty")?, 5))
        .unwrap()
        .join(
            &contact(),
            JoinOn::params(
                Fragment::new("\"Contact\".\"id\" = $1 AND \"Contact\".\"city\" = $city", [
                    (ParamKey::from(1u32), Value::Int(9)),
                    (ParamKey::from("city"), Value::from("Austin")),
                ])
                .unwrap(),
            ),
        )
        .unwrap();
    let built = q.build();
    assert!(built.sql.contains("ON \"Contact\".\"id\" = $2 AND \"Contact\".\"city\" = $city"));
    assert_bound(&built);
    assert_eq!(built.param(1u32), Some(&Value::Int(5)));
    assert_eq!(built.param(2u32), Some(&Value::Int(9)));
}

#[test]
fn test_join_expr_sees_prev_new_and_root() {
    let q = SelectQuery::new(&contact(), sqlite())
        .join(
            &order(),
            JoinOn::expr(|c, o, _| sql!("{} = {}", o.col("contactId")?, c.col("id")?)),
        )
        .unwrap()
        .join(
            &order_item(),
            JoinOn::expr(|o, i, root| {
                assert!(root.is(&contact()));
                sql!("{} = {}", i.col("orderId")?, o.col("id")?)
            }),
        )
        .unwrap()
        .select_raw("*")
        .unwrap();
    assert_eq!(
        q.build().sql,
        "SELECT * FROM \"Contact\" JOIN \"Order\" ON \"Order\".\"contactId\" = \"Contact\".\"id\" JOIN \"OrderItem\" ON \"OrderItem\".\"orderId\" = \"Order\".\"id\""
    );
}

#[test]
fn test_join_spec_with_companion() {
    let item = JoinSpec::new(&order_item())
        .with(&order())
        .alias("i")
        .on(|refs| sql!("{} = {}", refs[0].col("orderId")?, refs[1].col("id")?));
    let q = SelectQuery::new(&contact(), sqlite())
        .join(
            &order(),
            JoinOn::expr(|c, o, _| sql!("{} = {}", o.col("contactId")?, c.col("id")?)),
        )
        .unwrap()
        .join_spec(JoinKind::Left, item)
        .unwrap()
        .select_raw("*")
        .unwrap();
    assert!(
        q.build()
            .sql
            .ends_with(" LEFT JOIN \"OrderItem\" i ON i.\"orderId\" = \"Order\".\"id\"")
    );
}

#[test]
fn test_join_spec_errors() {
    let base = SelectQuery::new(&contact(), sqlite());

    let err = base
        .join_spec(JoinKind::Inner, JoinSpec::new(&order()))
        .unwrap_err();
    assert_eq!(
        err,
        WeaveError::IncompleteJoin {
            table: "Order".into()
        }
    );

    let spec = JoinSpec::new(&order())
        .with(&freight())
        .on(|refs| sql!("{} = {}", refs[0].col("freightId")?, refs[1].col("id")?));
    let err = base.join_spec(JoinKind::Inner, spec).unwrap_err();
    assert_eq!(err, WeaveError::reference_not_found("Freight"));
    assert!(base.core().joins().is_empty());
}

#[test]
fn test_failed_join_leaves_parent_untouched() {
    let base = SelectQuery::new(&order(), sqlite());
    let err = base
        .join(
            &contact(),
            JoinOn::expr(|_, c, _| sql!("{} = 1", c.col("missing")?)),
        )
        .unwrap_err();
    assert!(err.is_unknown_property());
    assert!(base.refs().root().alias().is_none());
}

#[test]
fn test_select_props_unknown() {
    let err = SelectQuery::new(&freight(), sqlite())
        .select_props(["id", "carrier"])
        .unwrap_err();
    assert_eq!(err, WeaveError::unknown_property("Freight", "carrier"));
}

#[test]
fn test_group_having_order() {
    let q = SelectQuery::new(&order(), sqlite())
        .select_raw("\"contactId\", SUM(\"total\")")
        .unwrap()
        .group_by_props(["contactId"])
        .unwrap()
        .having(sql!("SUM(\"total\") > {}", 100).unwrap())
        .unwrap()
        .order_by("2 DESC")
        .unwrap()
        .filter(sql!("\"qty\" > {}", 1).unwrap())
        .unwrap();
    assert_eq!(
        q.build().sql,
        "SELECT \"contactId\", SUM(\"total\") FROM \"Order\" WHERE \"qty\" > $2 GROUP BY \"contactId\" HAVING SUM(\"total\") > $1 ORDER BY 2 DESC"
    );
}

#[test]
fn test_clear_select() {
    let q = SelectQuery::new(&order(), sqlite()).select_raw("1").unwrap();
    assert!(q.has_select());
    let q = q.clear_select();
    assert!(!q.has_select());
    assert_eq!(q.build().sql, format!("SELECT {ORDER_COLUMNS} FROM \"Order\""));
}

#[test]
fn test_clear_select_drops_projection_params() {
    let q = SelectQuery::new(&order(), sqlite())
        .select(sql!("{} AS n", 5).unwrap())
        .having(sql!("SUM(\"total\") > {}", 100).unwrap())
        .unwrap()
        .clear_select();
    let built = q.build();
    assert_eq!(
        built.sql,
        format!("SELECT {ORDER_COLUMNS} FROM \"Order\" HAVING SUM(\"total\") > $2")
    );
    assert_eq!(built.params.len(), 1);
    assert_eq!(built.param(2u32), Some(&Value::Int(100)));
    assert_bound(&built);
}

#[test]
fn test_pagination_is_separate() {
    let q = SelectQuery::new(&order(), sqlite()).select_raw("*").unwrap().limit(20, 10);
    assert_eq!(q.build().sql, "SELECT * FROM \"Order\"");
    assert_eq!(q.limit_clause(), "LIMIT 10 OFFSET 20");
    assert_eq!(
        q.build_paginated().sql,
        "SELECT * FROM \"Order\" LIMIT 10 OFFSET 20"
    );

    let pg = SelectQuery::new(&order(), Arc::new(PostgresDriver::new()))
        .select_raw("*")
        .unwrap()
        .skip(5);
    assert_eq!(pg.build_paginated().sql, "SELECT * FROM \"Order\" OFFSET 5");
}

#[test]
fn test_update_set_values_uses_columns() {
    let q = UpdateQuery::new(&person(), sqlite())
        .set_values([("name", "Jo"), ("surname", "Doe")])
        .unwrap()
        .filter(Shorthand::new().equals("key", 1))
        .unwrap();
    assert_eq!(
        q.build().sql,
        "UPDATE \"Contact\" SET \"firstName\" = $name, \"lastName\" = $surname WHERE \"id\" = $key"
    );
    assert_eq!(q.params().len(), 3);
}

#[test]
fn test_update_set_values_converts_for_driver() {
    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let q = UpdateQuery::new(&contact(), sqlite())
        .set_values([("updatedAt", at)])
        .unwrap();
    assert_eq!(
        q.params().get("updatedAt"),
        Some(&Value::from("2024-01-02T03:04:05.000Z"))
    );
}

#[test]
fn test_update_set_values_is_atomic() {
    let err = UpdateQuery::new(&contact(), sqlite())
        .set_values([("age", 1), ("nope", 2)])
        .unwrap_err();
    assert_eq!(err, WeaveError::unknown_property("Contact", "nope"));
}

#[test]
fn test_update_set_fragments() {
    let q = UpdateQuery::new(&contact(), sqlite())
        .set(sql!("\"age\" = {}", 30).unwrap())
        .set_with(|refs| sql!("{} = {}", refs.root().col("city")?, "Austin"))
        .unwrap()
        .set_raw("\"updatedAt\" = CURRENT_TIMESTAMP")
        .unwrap()
        .filter(sql!("\"id\" = {}", 4).unwrap())
        .unwrap();
    assert_eq!(
        q.build().sql,
        "UPDATE \"Contact\" SET \"age\" = $1, \"city\" = $2, \"updatedAt\" = CURRENT_TIMESTAMP WHERE \"id\" = $3"
    );
    assert_bound(&q.build());
    assert!(q.has_set());
    assert!(q.validate().is_ok());
}

#[test]
fn test_clear_set_drops_assignment_params() {
    let q = UpdateQuery::new(&contact(), sqlite())
        .set(sql!("\"age\" = {}", 30).unwrap())
        .set_values([("city", "Austin")])
        .unwrap()
        .filter(sql!("\"id\" = {}", 4).unwrap())
        .unwrap()
        .clear_set();
    assert!(!q.has_set());
    assert_eq!(q.params().len(), 1);
    assert_eq!(q.params().get(2u32), Some(&Value::Int(4)));

    let q = q.set_values([("age", 31)]).unwrap();
    let built = q.build();
    assert_eq!(
        built.sql,
        "UPDATE \"Contact\" SET \"age\" = $age WHERE \"id\" = $2"
    );
    assert_bound(&built);
}

#[test]
fn test_update_conditions_only_see_root() {
    let err = UpdateQuery::new(&order(), sqlite())
        .set_values([("qty", 1)])
        .unwrap()
        .filter_with(|refs| sql!("{} = {}", refs.of(&contact())?.col("city")?, "Austin"))
        .unwrap_err();
    assert_eq!(err, WeaveError::reference_not_found("Contact"));
}

#[test]
fn test_update_and_delete_force() {
    let update = UpdateQuery::new(&contact(), sqlite()).set_raw("\"age\" = 0").unwrap();
    assert!(!update.is_forced());
    assert!(update.force().is_forced());

    let delete = DeleteQuery::new(&contact(), sqlite());
    assert_eq!(delete.kind(), StatementKind::Delete);
    assert!(delete.clone().force().is_forced());
    assert_eq!(delete.build().sql, "DELETE FROM \"Contact\"");
}

#[test]
fn test_delete_with_shorthand() {
    let q = DeleteQuery::new(&contact(), sqlite())
        .filter(Shorthand::new().in_list("id", [1, 2]))
        .unwrap();
    let built = q.build();
    assert_eq!(built.sql, "DELETE FROM \"Contact\" WHERE \"id\" IN ($1,$2)");
    assert_bound(&built);
    assert_eq!(built.params.len(), 2);
}
