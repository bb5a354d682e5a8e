//! Predicate tree to SQL translation

use sqlx::{QueryBuilder, Sqlite};
use tattmap_core::filter::{Condition, Field, Predicate};
use tattmap_core::geo::{micro_degrees_at_least, micro_degrees_at_most, BoundingBox};
use tattmap_core::search::{Page, SortOrder};

fn column(field: Field) -> &'static str {
    match field {
        Field::CountryCode => "a.country_code",
        Field::RegionCodeFull => "a.region_code_full",
        Field::City => "a.city",
        Field::Country => "a.country",
        Field::Nickname => "a.nickname",
        Field::Address => "a.address",
        Field::Styles => "a.styles",
        Field::Beginner => "a.beginner",
        Field::Color => "a.color",
        Field::BlackAndGray => "a.black_and_gray",
        Field::Coverups => "a.coverups",
        Field::Lat => "a.lat_e6",
        Field::Lon => "a.lon_e6",
    }
}

/// Append `predicate` as a parenthesised boolean expression
pub(crate) fn push_predicate(builder: &mut QueryBuilder<'_, Sqlite>, predicate: &Predicate) {
    match predicate {
        Predicate::And(parts) => push_group(builder, parts, " AND ", "1"),
        Predicate::Or(parts) => push_group(builder, parts, " OR ", "0"),
        Predicate::Field { field, condition } => push_condition(builder, *field, condition),
    }
}

fn push_group(
    builder: &mut QueryBuilder<'_, Sqlite>,
    parts: &[Predicate],
    joiner: &str,
    identity: &str,
) {
    if parts.is_empty() {
        builder.push(identity);
        return;
    }

    builder.push("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            builder.push(joiner);
        }
        push_predicate(builder, part);
    }
    builder.push(")");
}

fn push_condition(builder: &mut QueryBuilder<'_, Sqlite>, field: Field, condition: &Condition) {
    let col = column(field);

    match condition {
        Condition::In(values) => {
            if values.is_empty() {
                builder.push("0");
                return;
            }
            builder.push(col).push(" IN (");
            push_list(builder, values);
            builder.push(")");
        }
        Condition::Contains(needle) => {
            builder
                .push("instr(lower(COALESCE(")
                .push(col)
                .push(", '')), lower(")
                .push_bind(needle.clone())
                .push(")) > 0");
        }
        Condition::HasSome(values) => {
            if values.is_empty() {
                builder.push("0");
                return;
            }
            builder
                .push("EXISTS (SELECT 1 FROM json_each(")
                .push(col)
                .push(") WHERE json_each.value IN (");
            push_list(builder, values);
            builder.push("))");
        }
        Condition::IsTrue => {
            builder.push(col).push(" = 1");
        }
        Condition::NotNull => {
            builder.push(col).push(" IS NOT NULL");
        }
        Condition::Between { min, max } => {
            builder
                .push(col)
                .push(" BETWEEN ")
                .push_bind(micro_degrees_at_least(*min))
                .push(" AND ")
                .push_bind(micro_degrees_at_most(*max));
        }
        Condition::AtLeast(min) => {
            builder.push(col).push(" >= ").push_bind(micro_degrees_at_least(*min));
        }
        Condition::AtMost(max) => {
            builder.push(col).push(" <= ").push_bind(micro_degrees_at_most(*max));
        }
    }
}

fn push_list(builder: &mut QueryBuilder<'_, Sqlite>, values: &[String]) {
    let mut separated = builder.separated(", ");
    for value in values {
        separated.push_bind(value.clone());
    }
}

/// Overlap test against the `artist_locations` R*Tree aliased as `r`
pub(crate) fn push_rtree_overlap(builder: &mut QueryBuilder<'_, Sqlite>, bbox: &BoundingBox) {
    builder
        .push("r.max_lat >= ")
        .push_bind(bbox.south)
        .push(" AND r.min_lat <= ")
        .push_bind(bbox.north);

    if bbox.crosses_antimeridian() {
        builder
            .push(" AND (r.max_lon >= ")
            .push_bind(bbox.west)
            .push(" OR r.min_lon <= ")
            .push_bind(bbox.east)
            .push(")");
    } else {
        builder
            .push(" AND r.max_lon >= ")
            .push_bind(bbox.west)
            .push(" AND r.min_lon <= ")
            .push_bind(bbox.east);
    }
}

/// `ORDER BY` for recency; distance ordering happens after the fetch
pub(crate) fn push_recent_order(builder: &mut QueryBuilder<'_, Sqlite>) {
    builder.push(" ORDER BY a.created_at DESC, a.id DESC");
}

pub(crate) fn push_page(builder: &mut QueryBuilder<'_, Sqlite>, page: Option<Page>) {
    if let Some(page) = page {
        builder
            .push(" LIMIT ")
            .push_bind(page.take)
            .push(" OFFSET ")
            .push_bind(page.skip);
    }
}

/// Whether the window can be served by SQL ordering and paging alone
pub(crate) fn is_sql_ordered(order: &SortOrder) -> bool {
    matches!(order, SortOrder::Recent)
}
