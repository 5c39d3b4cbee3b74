//! Keyset pagination engine (§4.2). Builds the
//! `(sortBy op value) OR (sortBy = value AND created_at op createdAt)`
//! predicate and the matching `ORDER BY`/`LIMIT` clause against a
//! [`sqlx::QueryBuilder`] so every list query pages the same way.

use book_schemas::{Cursor, PageInfo, Paginatable, PaginationParams, SortBy, SortOrder};
use sqlx::{Postgres, QueryBuilder};

/// Postgres cast applied to the bound cursor value so a text-encoded bind
/// parameter compares correctly against the target column's real type.
fn cast_for(sort_by: SortBy) -> &'static str {
    match sort_by {
        SortBy::Id => "::bigint",
        SortBy::Year => "::smallint",
        SortBy::Title => "",
    }
}

/// Appends the keyset predicate for `params.cursor` to `qb`. Call after at
/// least one `WHERE` predicate has already been pushed (e.g. `removed =
/// false`); this always starts with `AND`. A `None` cursor (first page)
/// appends nothing.
pub fn push_keyset_predicate(qb: &mut QueryBuilder<'_, Postgres>, params: &PaginationParams) {
    let Some(Cursor { value, created_at }) = params.cursor.clone() else {
        return;
    };

    let column = params.sort_by.column();
    let op = params.sort_order.cursor_op();
    let cast = cast_for(params.sort_by);

    qb.push(" AND (");
    qb.push(column).push(" ").push(op).push(" ");
    qb.push_bind(value.clone()).push(cast);

    if let Some(created_at) = created_at {
        qb.push(" OR (");
        qb.push(column).push(" = ").push_bind(value).push(cast);
        qb.push(" AND created_at ").push(op).push(" ");
        qb.push_bind(created_at);
        qb.push(")");
    }
    qb.push(")");
}

/// Appends `ORDER BY <sortBy> <order>, created_at <order>, id ASC` — the
/// trailing `id ASC` guarantees a total order even when `sortBy` is `id`
/// itself (where it is a no-op) and when two rows tie on both `sortBy` and
/// `created_at`.
pub fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, params: &PaginationParams) {
    qb.push(" ORDER BY ")
        .push(params.sort_by.column())
        .push(" ")
        .push(params.sort_order.sql());
    if !params.sort_by.is_unique() {
        qb.push(", created_at ").push(params.sort_order.sql());
    }
    qb.push(", id ASC");
}

/// Fetch `limit + 1` rows so the caller can detect "there is another page"
/// without a second round trip.
pub fn lookahead_limit(params: &PaginationParams) -> i64 {
    params.limit as i64 + 1
}

/// Split a `limit + 1`-sized fetch into the page to return and the
/// [`PageInfo`] cursor for the next one. Truncates `rows` in place to at
/// most `params.limit` entries.
pub fn paginate<T: Paginatable + Clone>(
    rows: &mut Vec<T>,
    params: &PaginationParams,
) -> anyhow::Result<PageInfo> {
    let has_more = rows.len() as u64 > params.limit;
    if has_more {
        rows.truncate(params.limit as usize);
    }

    let next_cursor = match (has_more, rows.last()) {
        (true, Some(last)) => {
            let created_at = (!params.sort_by.is_unique()).then(|| last.created_at());
            crate::cursor::encode(&last.field_as_string(params.sort_by), created_at)?
        }
        _ => String::new(),
    };

    Ok(PageInfo { next_cursor })
}
