use crate::{
    raw, Direction, ErrorKind, Filter, Grammar, InsertValues, JoinKind, Options, QueryModel, Row,
    Value,
};

struct Case {
    heading: &'static str,
    name: &'static str,
    model: QueryModel,
    expected: &'static str,
}

fn case(heading: &'static str, name: &'static str, model: QueryModel, expected: &'static str) -> Case {
    Case {
        heading,
        name,
        model,
        expected,
    }
}

fn cases() -> Vec<Case> {
    let t = || QueryModel::table("t");
    vec![
        case("Select", "only from", QueryModel::table("events"), "select * from `events`"),
        case(
            "Select",
            "columns with aliases",
            QueryModel::table("users as u")
                .select(["u.id", "u.name as n"])
                .distinct(),
            "select distinct `u`.`id`, `u`.`name` as `n` from `users` as `u`",
        ),
        case(
            "Select",
            "raw column",
            t().select(["a"]).select_raw("count() as c"),
            "select `a`, count() as c from `t`",
        ),
        case(
            "Select",
            "aggregate suppresses columns",
            t().select(["a"]).aggregate("count", ["*"]),
            "select count(*) as aggregate from `t`",
        ),
        case(
            "Select",
            "distinct aggregate",
            t().distinct().aggregate("count", ["user_id"]),
            "select count(distinct `user_id`) as aggregate from `t`",
        ),
        case(
            "Where",
            "basic",
            QueryModel::table("events").where_("id", "=", 5),
            "select * from `events` where `id` = ?",
        ),
        case(
            "Where",
            "leading boolean stripped once",
            t().where_("a", "=", 1).or_where("b", "=", 2),
            "select * from `t` where `a` = ? or `b` = ?",
        ),
        case(
            "Where",
            "raw",
            t().where_raw("a = 1").or_where_raw("b = 2"),
            "select * from `t` where a = 1 or b = 2",
        ),
        case(
            "Where",
            "in list",
            t().where_in("id", [1, 2, 3]).or_where_not_in("k", ["x"]),
            "select * from `t` where `id` in (?, ?, ?) or `k` not in (?)",
        ),
        case(
            "Where",
            "empty in",
            t().where_in("id", Vec::<i64>::new()),
            "select * from `t` where 0 = 1",
        ),
        case(
            "Where",
            "empty not in",
            t().where_not_in("id", Vec::<i64>::new()),
            "select * from `t` where 1 = 1",
        ),
        case(
            "Where",
            "null checks",
            t().where_null("a").or_where_not_null("b"),
            "select * from `t` where `a` is null or `b` is not null",
        ),
        case(
            "Where",
            "between",
            t().where_between("n", 1, 10).where_not_between("m", raw("1"), raw("2")),
            "select * from `t` where `n` between ? and ? and `m` not between 1 and 2",
        ),
        case(
            "Where",
            "date parts",
            t().where_date("created_at", "=", "2024-01-01")
                .where_year("created_at", ">", 2020)
                .where_day("created_at", "<", 15),
            "select * from `t` where toDate(`created_at`) = ? and toYear(`created_at`) > ? \
             and toDayOfMonth(`created_at`) < ?",
        ),
        case(
            "Where",
            "nested",
            t().where_("a", "=", 1)
                .or_where_nested(|c| c.where_("b", "=", 2).where_("c", "=", 3)),
            "select * from `t` where `a` = ? or (`b` = ? and `c` = ?)",
        ),
        case(
            "Where",
            "nested twice",
            t().where_nested(|c| c.where_("a", "=", 1).or_where_nested(|c| c.where_null("b"))),
            "select * from `t` where (`a` = ? or (`b` is null))",
        ),
        case(
            "Where",
            "column comparison",
            t().where_column("a", ">", "b"),
            "select * from `t` where `a` > `b`",
        ),
        case(
            "Where",
            "json path",
            t().where_("payload->user->id", "=", 1),
            "select * from `t` where `payload`->'$.\"user\".\"id\"' = ?",
        ),
        case(
            "Subqueries",
            "in sub",
            QueryModel::table("a").where_in_sub(
                "id",
                QueryModel::table("b").select(["a_id"]).where_("x", "=", 1),
            ),
            "select * from `a` where `id` in (select `a_id` from `b` where `x` = ?)",
        ),
        case(
            "Subqueries",
            "not in sub",
            QueryModel::table("a").where_not_in_sub("id", QueryModel::table("b").select(["a_id"])),
            "select * from `a` where `id` not in (select `a_id` from `b`)",
        ),
        case(
            "Subqueries",
            "comparison with sub",
            QueryModel::table("p").where_sub(
                "price",
                ">",
                QueryModel::table("p").aggregate("avg", ["price"]),
            ),
            "select * from `p` where `price` > (select avg(`price`) as aggregate from `p`)",
        ),
        case(
            "Subqueries",
            "exists",
            QueryModel::table("a")
                .where_exists(QueryModel::table("b").where_column("b.a_id", "=", "a.id"))
                .where_not_exists(QueryModel::table("c")),
            "select * from `a` where exists (select * from `b` where `b`.`a_id` = `a`.`id`) \
             and not exists (select * from `c`)",
        ),
        case(
            "Joins",
            "inner",
            QueryModel::table("a").join("b", "a.id", "=", "b.a_id"),
            "select * from `a` inner join `b` on `a`.`id` = `b`.`a_id`",
        ),
        case(
            "Joins",
            "cross",
            QueryModel::table("a").cross_join("b"),
            "select * from `a` cross join `b`",
        ),
        case(
            "Joins",
            "nested on",
            QueryModel::table("a").join_with(JoinKind::Left, "b", |j| {
                j.on("a.id", "=", "b.a_id")
                    .on_nested(|c| c.where_column("b.x", "=", "a.x").or_where_null("b.y"))
            }),
            "select * from `a` left join `b` on `a`.`id` = `b`.`a_id` \
             and (`b`.`x` = `a`.`x` or `b`.`y` is null)",
        ),
        case(
            "Joins",
            "bound join value",
            QueryModel::table("a").join_with(JoinKind::Right, "b as bb", |j| {
                j.on("a.id", "=", "bb.a_id").or_where("bb.kind", "=", "x")
            }),
            "select * from `a` right join `b` as `bb` on `a`.`id` = `bb`.`a_id` or `bb`.`kind` = ?",
        ),
        case(
            "Joins",
            "other keywords",
            QueryModel::table("a").join_with(
                JoinKind::Other("global any left".to_string()),
                "b",
                |j| j.on("a.id", "=", "b.id"),
            ),
            "select * from `a` global any left join `b` on `a`.`id` = `b`.`id`",
        ),
        case(
            "Grouping",
            "group having order limit offset",
            QueryModel::table("orders")
                .select(["customer"])
                .select_raw("sum(total) as total")
                .group_by(["customer"])
                .having("total", ">", 100)
                .having_raw("count() > 1")
                .order_by_desc("total")
                .order_by("customer", Direction::Asc)
                .limit(10)
                .offset(20),
            "select `customer`, sum(total) as total from `orders` group by `customer` \
             having `total` > ? and count() > 1 order by `total` desc, `customer` asc \
             limit 10 offset 20",
        ),
        case(
            "Grouping",
            "raw order",
            t().order_by_raw("rand()").for_page(2, 10),
            "select * from `t` order by rand() limit 10 offset 10",
        ),
        case(
            "Unions",
            "union all with trailing clauses",
            QueryModel::table("a")
                .select(["id"])
                .limit(3)
                .union_all(QueryModel::table("b").select(["id"]))
                .order_by("id", Direction::Asc)
                .limit(5),
            "(select `id` from `a` limit 3) union all (select `id` from `b`) order by `id` asc limit 5",
        ),
        case(
            "Unions",
            "plain union",
            QueryModel::table("a").union(QueryModel::table("b")),
            "(select * from `a`) union (select * from `b`)",
        ),
    ]
}

fn get_output(case: &Case, actual: &str) -> String {
    [
        "",
        " ╭────────────╮",
        "─┤ Test path: ├──────────────────────────────",
        " ╰────────────╯",
        case.heading,
        case.name,
        " ╭────────╮",
        "─┤ Input: ├──────────────────────────────",
        " ╰────────╯",
        format!("{:#?}", case.model).as_str(),
        " ╭─────────────────╮",
        "─┤ Expected value: ├─────────────────────────",
        " ╰─────────────────╯",
        case.expected,
        " ╭───────────────╮",
        "─┤ Actual value: ├───────────────────────────",
        " ╰───────────────╯",
        actual,
        "────────────────────────────────────────────",
    ]
    .join("\n")
}

fn name_or_heading_contains(case: &Case, s: &str) -> bool {
    case.name.contains(s) || case.heading.contains(s)
}

fn is_soloed(case: &Case) -> bool {
    name_or_heading_contains(case, "🔦")
}

fn is_skipped(case: &Case) -> bool {
    name_or_heading_contains(case, "⛔")
}

#[test]
fn test_corpus() {
    let grammar = Grammar::default();
    let cases = cases();
    let has_soloed_tests = cases.iter().any(is_soloed);
    let mut failures = 0;
    for case in &cases {
        if is_skipped(case) || (has_soloed_tests && !is_soloed(case)) {
            continue;
        }
        let actual = grammar.compile_select(&case.model);
        if actual != case.expected {
            println!("{}", get_output(case, &actual));
            failures += 1;
        }
    }
    if failures > 0 {
        panic!("Test corpus failure ({failures} cases)");
    }
}

#[test]
fn test_compilation_is_repeatable_and_pure() {
    let query = QueryModel::table("t")
        .where_in("a", [1, 2])
        .or_where_nested(|c| c.where_("b", "=", 3))
        .union(QueryModel::table("u"))
        .limit(1);
    let before = query.clone();
    let grammar = Grammar::default();
    assert_eq!(grammar.compile_select(&query), grammar.compile_select(&query));
    assert_eq!(query, before);
    assert_eq!(query.columns, None);
}

#[test]
fn test_placeholders_match_bindings() {
    for case in cases() {
        let sql = case.model.to_sql();
        let placeholders = sql.matches('?').count();
        assert_eq!(placeholders, case.model.bindings().len(), "{}", case.name);
    }
}

#[test]
fn test_compile_exists() {
    let sql = Grammar::default().compile_exists(&QueryModel::table("t").where_("a", "=", 1));
    assert_eq!(sql, "select exists(select * from `t` where `a` = ?) as `exists`");
}

#[test]
fn test_compile_insert() {
    let grammar = Grammar::default();
    let values = InsertValues::from(vec![
        Row::new().set("id", 1).set("at", raw("now()")),
        Row::new().set("id", 2).set("at", raw("now()")),
    ]);
    assert_eq!(
        grammar.compile_insert(&QueryModel::table("events"), &values).unwrap(),
        "insert into `events` (`id`, `at`) values (?, now()), (?, now())"
    );
    let single = InsertValues::from(Row::new().set("id", 1));
    assert_eq!(
        grammar.compile_insert(&QueryModel::table("events"), &single).unwrap(),
        "insert into `events` (`id`) values (?)"
    );
}

#[test]
fn test_compile_insert_aligns_rows_to_first_row_columns() {
    let grammar = Grammar::default();
    let values = InsertValues::from(vec![
        Row::new().set("a", 1).set("b", raw("now()")),
        Row::new().set("b", raw("today()")).set("a", 4),
    ]);
    assert_eq!(
        grammar.compile_insert(&QueryModel::table("t"), &values).unwrap(),
        "insert into `t` (`a`, `b`) values (?, now()), (?, today())"
    );
    assert_eq!(values.bindings().unwrap(), vec![Value::Int(1), Value::Int(4)]);

    let mismatched = InsertValues::from(vec![
        Row::new().set("a", 1).set("b", 2),
        Row::new().set("a", 3).set("c", 4),
    ]);
    let err = grammar
        .compile_insert(&QueryModel::table("t"), &mismatched)
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::MismatchedInsertColumns { row: 1 });
}

#[test]
fn test_compile_insert_errors() {
    let grammar = Grammar::default();
    let empty = InsertValues::Many(vec![]);
    let err = grammar
        .compile_insert(&QueryModel::table("events"), &empty)
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::EmptyInsert);
    let row = InsertValues::from(Row::new().set("id", 1));
    let err = grammar.compile_insert(&QueryModel::new(), &row).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::MissingTable);
}

#[test]
fn test_table_prefix_applies_to_from_and_joins() {
    let grammar = Grammar::new(Options {
        table_prefix: "dev_".to_string(),
        ..Options::default()
    });
    let query = QueryModel::table("a").join("b", "a.id", "=", "b.a_id");
    assert_eq!(
        grammar.compile_select(&query),
        "select * from `dev_a` inner join `dev_b` on `dev_a`.`id` = `dev_b`.`a_id`"
    );
}
