//! Filtered, sorted and paginated listing queries.
//!
//! Every admin index page goes through [`ListingQuery`]: the caller describes
//! the resource once as a static [`Listing`] (tables, searchable columns,
//! sortable columns, tie-break) and the builder turns request parameters into
//! a data query plus a matching count query. Column names never come from the
//! request; `sort_by` is resolved against the listing's allowlist and
//! everything else is bound.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use tokoku_core::{CategoryId, DeletedStatus, Gender, SortOrder, UserRole, UserStatus};

/// Default page size.
pub const DEFAULT_PER_PAGE: u32 = 10;
/// Largest page size a client may request.
pub const MAX_PER_PAGE: u32 = 100;

/// Raw listing query string.
///
/// Everything is a string so malformed values degrade to defaults instead of
/// rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub gender: Option<String>,
    pub deleted_status: Option<String>,
    pub category_id: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub highlight: Option<String>,
}

/// Normalized listing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub search: Option<String>,
    /// Requested sort key and direction. Only set when both were supplied.
    pub sort: Option<(String, SortOrder)>,
    pub deleted_status: DeletedStatus,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub gender: Option<Gender>,
    pub category_id: Option<CategoryId>,
    pub page: u32,
    pub per_page: u32,
    pub highlight: Option<i32>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            search: None,
            sort: None,
            deleted_status: DeletedStatus::default(),
            role: None,
            status: None,
            gender: None,
            category_id: None,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            highlight: None,
        }
    }
}

/// Trimmed value, or `None` when absent or blank.
fn filled(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl From<&ListQuery> for ListParams {
    fn from(query: &ListQuery) -> Self {
        let sort = match (filled(query.sort_by.as_ref()), filled(query.sort_order.as_ref())) {
            (Some(key), Some(order)) => {
                SortOrder::from_param(order).map(|order| (key.to_string(), order))
            }
            _ => None,
        };

        let page = filled(query.page.as_ref())
            .and_then(|p| p.parse::<u32>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1);
        let per_page = filled(query.per_page.as_ref())
            .and_then(|p| p.parse::<u32>().ok())
            .map_or(DEFAULT_PER_PAGE, |p| p.clamp(1, MAX_PER_PAGE));

        Self {
            search: filled(query.search.as_ref()).map(str::to_string),
            sort,
            deleted_status: filled(query.deleted_status.as_ref())
                .and_then(DeletedStatus::from_param)
                .unwrap_or_default(),
            role: filled(query.role.as_ref()).and_then(|v| v.parse().ok()),
            status: filled(query.status.as_ref()).and_then(|v| v.parse().ok()),
            gender: filled(query.gender.as_ref()).and_then(|v| v.parse().ok()),
            category_id: filled(query.category_id.as_ref())
                .and_then(|v| v.parse::<i32>().ok())
                .map(CategoryId::new),
            page,
            per_page,
            highlight: filled(query.highlight.as_ref()).and_then(|v| v.parse().ok()),
        }
    }
}

/// Static description of a listable resource.
#[derive(Debug)]
pub struct Listing {
    /// Select list.
    pub select: &'static str,
    /// `FROM` clause including joins.
    pub from: &'static str,
    /// Alias of the primary table.
    pub alias: &'static str,
    /// Columns matched by `search`, including joined columns.
    pub search: &'static [&'static str],
    /// Sortable columns as (`sort_by` key, SQL expression).
    pub sortable: &'static [(&'static str, &'static str)],
    /// Ordering appended after the primary sort for stable pages.
    pub tie_break: &'static str,
}

impl Listing {
    /// Resolve a `sort_by` key against the allowlist.
    #[must_use]
    pub fn sort_column(&self, key: &str) -> Option<&'static str> {
        self.sortable
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, expr)| *expr)
    }
}

#[derive(Debug, Clone)]
enum Filter {
    /// `column::text = value`, for enum and text columns.
    Text(&'static str, String),
    /// `column = value`, for foreign keys.
    Int(&'static str, i32),
}

/// Builder for one listing request.
#[derive(Debug, Clone)]
pub struct ListingQuery {
    listing: &'static Listing,
    search: Option<String>,
    filters: Vec<Filter>,
    deleted_status: DeletedStatus,
    sort: Option<(&'static str, SortOrder)>,
    page: u32,
    per_page: u32,
}

impl ListingQuery {
    /// Start a query for `listing` with the shared parameters applied.
    #[must_use]
    pub fn new(listing: &'static Listing, params: &ListParams) -> Self {
        let sort = params.sort.as_ref().and_then(|(key, order)| {
            let column = listing.sort_column(key);
            if column.is_none() {
                tracing::debug!(sort_by = %key, "ignoring unknown sort column");
            }
            column.map(|c| (c, *order))
        });

        Self {
            listing,
            search: params.search.clone(),
            filters: Vec::new(),
            deleted_status: params.deleted_status,
            sort,
            page: params.page.max(1),
            per_page: params.per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Exact match on an enumerated or text column, when a value is given.
    #[must_use]
    pub fn filter_eq(mut self, column: &'static str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.filters.push(Filter::Text(column, value.to_string()));
        }
        self
    }

    /// Exact match on an integer column, when a value is given.
    #[must_use]
    pub fn filter_id(mut self, column: &'static str, value: Option<i32>) -> Self {
        if let Some(value) = value {
            self.filters.push(Filter::Int(column, value));
        }
        self
    }

    fn push_where(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        let mut first = true;
        let mut next = |qb: &mut QueryBuilder<'static, Postgres>| {
            qb.push(if first { " WHERE " } else { " AND " });
            first = false;
        };

        let alias = self.listing.alias;
        match self.deleted_status {
            DeletedStatus::All => {}
            DeletedStatus::Active => {
                next(qb);
                qb.push(format_args!("{alias}.record_state = 'active'"));
            }
            DeletedStatus::Deleted => {
                next(qb);
                qb.push(format_args!("{alias}.record_state = 'deleted'"));
            }
        }

        for filter in &self.filters {
            next(qb);
            match filter {
                Filter::Text(column, value) => {
                    qb.push(format_args!("{column}::text = "));
                    qb.push_bind(value.clone());
                }
                Filter::Int(column, value) => {
                    qb.push(format_args!("{column} = "));
                    qb.push_bind(*value);
                }
            }
        }

        if let Some(term) = &self.search
            && !self.listing.search.is_empty()
        {
            next(qb);
            let pattern = format!("%{}%", escape_like(term));
            qb.push("(");
            for (i, column) in self.listing.search.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(format_args!("{column} ILIKE "));
                qb.push_bind(pattern.clone());
            }
            qb.push(")");
        }
    }

    /// Query returning one page of rows.
    #[must_use]
    pub fn data_query(&self) -> QueryBuilder<'static, Postgres> {
        let listing = self.listing;
        let mut qb = QueryBuilder::new(format!(
            "SELECT {} FROM {}",
            listing.select, listing.from
        ));
        self.push_where(&mut qb);

        match self.sort {
            Some((column, order)) => {
                qb.push(format_args!(" ORDER BY {column} {}", order.as_sql()));
            }
            None => {
                qb.push(format_args!(" ORDER BY {}.created_at DESC", listing.alias));
            }
        }
        qb.push(format_args!(", {}", listing.tie_break));

        qb.push(" LIMIT ");
        qb.push_bind(i64::from(self.per_page));
        qb.push(" OFFSET ");
        qb.push_bind(i64::from(self.page - 1) * i64::from(self.per_page));
        qb
    }

    /// Query counting every row that matches the filters.
    #[must_use]
    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", self.listing.from));
        self.push_where(&mut qb);
        qb
    }

    /// Run both queries and assemble the page.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if either query fails.
    pub async fn fetch<R>(&self, pool: &PgPool) -> Result<Page<R>, sqlx::Error>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut data = self.data_query();
        let rows = data.build_query_as::<R>().fetch_all(pool).await?;

        let mut count = self.count_query();
        let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

        Ok(Page::new(
            rows,
            self.page,
            self.per_page,
            u64::try_from(total).unwrap_or_default(),
        ))
    }
}

/// Escape `LIKE` metacharacters so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u32,
    /// 1-based position of the first row on this page.
    pub from: Option<u64>,
    /// 1-based position of the last row on this page.
    pub to: Option<u64>,
}

impl PageMeta {
    #[must_use]
    pub fn new(current_page: u32, per_page: u32, total: u64, len: usize) -> Self {
        let per_page = per_page.max(1);
        let last_page = u32::try_from(total.div_ceil(u64::from(per_page)))
            .unwrap_or(u32::MAX)
            .max(1);
        let (from, to) = if len == 0 {
            (None, None)
        } else {
            let first = u64::from(current_page.saturating_sub(1)) * u64::from(per_page) + 1;
            (Some(first), Some(first + len as u64 - 1))
        };
        Self {
            current_page,
            per_page,
            total,
            last_page,
            from,
            to,
        }
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.current_page < self.last_page
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(data: Vec<T>, current_page: u32, per_page: u32, total: u64) -> Self {
        let meta = PageMeta::new(current_page, per_page, total, data.len());
        Self { data, meta }
    }

    /// Convert every row, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }

    /// Convert every row fallibly, keeping the metadata.
    ///
    /// # Errors
    ///
    /// Returns the first conversion error.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            data: self.data.into_iter().map(f).collect::<Result<_, _>>()?,
            meta: self.meta,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    static WIDGETS: Listing = Listing {
        select: "w.id, w.name",
        from: "widgets w LEFT JOIN owners o ON o.id = w.owner_id",
        alias: "w",
        search: &["w.name", "o.email"],
        sortable: &[("name", "w.name"), ("created_at", "w.created_at")],
        tie_break: "w.id ASC",
    };

    fn query(pairs: &[(&str, &str)]) -> ListParams {
        let mut q = ListQuery::default();
        for (key, value) in pairs {
            let value = Some((*value).to_string());
            match *key {
                "search" => q.search = value,
                "sort_by" => q.sort_by = value,
                "sort_order" => q.sort_order = value,
                "role" => q.role = value,
                "status" => q.status = value,
                "gender" => q.gender = value,
                "deleted_status" => q.deleted_status = value,
                "category_id" => q.category_id = value,
                "page" => q.page = value,
                "per_page" => q.per_page = value,
                "highlight" => q.highlight = value,
                other => panic!("unknown key {other}"),
            }
        }
        ListParams::from(&q)
    }

    #[test]
    fn test_params_defaults() {
        let params = query(&[]);
        assert_eq!(params, ListParams::default());
        assert_eq!(params.deleted_status, DeletedStatus::Active);
        assert_eq!(params.per_page, 10);
    }

    #[test]
    fn test_params_blank_values_are_absent() {
        let params = query(&[("search", "   "), ("role", ""), ("page", "")]);
        assert_eq!(params.search, None);
        assert_eq!(params.role, None);
        assert_eq!(params.page, 1);
    }

    #[test]
    fn test_params_parse_filters() {
        let params = query(&[
            ("search", " budi "),
            ("role", "COURIER"),
            ("status", "inactive"),
            ("gender", "WOMAN"),
            ("deleted_status", "deleted"),
            ("category_id", "4"),
            ("highlight", "9"),
        ]);
        assert_eq!(params.search.as_deref(), Some("budi"));
        assert_eq!(params.role, Some(UserRole::Courier));
        assert_eq!(params.status, Some(UserStatus::Inactive));
        assert_eq!(params.gender, Some(Gender::Woman));
        assert_eq!(params.deleted_status, DeletedStatus::Deleted);
        assert_eq!(params.category_id, Some(CategoryId::new(4)));
        assert_eq!(params.highlight, Some(9));
    }

    #[test]
    fn test_params_ignore_unparseable_filters() {
        let params = query(&[("role", "OWNER"), ("deleted_status", "trashed"), ("page", "-2")]);
        assert_eq!(params.role, None);
        assert_eq!(params.deleted_status, DeletedStatus::Active);
        assert_eq!(params.page, 1);
    }

    #[test]
    fn test_params_sort_needs_both_halves() {
        assert_eq!(query(&[("sort_by", "name")]).sort, None);
        assert_eq!(query(&[("sort_order", "asc")]).sort, None);
        assert_eq!(
            query(&[("sort_by", "name"), ("sort_order", "DESC")]).sort,
            Some(("name".to_string(), SortOrder::Desc))
        );
    }

    #[test]
    fn test_params_per_page_is_clamped() {
        assert_eq!(query(&[("per_page", "0")]).per_page, 1);
        assert_eq!(query(&[("per_page", "5000")]).per_page, MAX_PER_PAGE);
        assert_eq!(query(&[("per_page", "abc")]).per_page, DEFAULT_PER_PAGE);
    }

    #[test]
    fn test_default_query_orders_newest_first_with_tie_break() {
        let q = ListingQuery::new(&WIDGETS, &ListParams::default());
        assert_eq!(
            q.data_query().sql(),
            "SELECT w.id, w.name FROM widgets w LEFT JOIN owners o ON o.id = w.owner_id \
             WHERE w.record_state = 'active' \
             ORDER BY w.created_at DESC, w.id ASC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn test_search_spans_joined_columns() {
        let q = ListingQuery::new(&WIDGETS, &query(&[("search", "ani")]));
        assert_eq!(
            q.count_query().sql(),
            "SELECT COUNT(*) FROM widgets w LEFT JOIN owners o ON o.id = w.owner_id \
             WHERE w.record_state = 'active' AND (w.name ILIKE $1 OR o.email ILIKE $2)"
        );
    }

    #[test]
    fn test_filters_and_explicit_sort() {
        let params = query(&[
            ("deleted_status", "all"),
            ("sort_by", "name"),
            ("sort_order", "asc"),
        ]);
        let q = ListingQuery::new(&WIDGETS, &params)
            .filter_eq("w.kind", Some("big"))
            .filter_eq("w.color", None)
            .filter_id("w.owner_id", Some(3));
        assert_eq!(
            q.data_query().sql(),
            "SELECT w.id, w.name FROM widgets w LEFT JOIN owners o ON o.id = w.owner_id \
             WHERE w.kind::text = $1 AND w.owner_id = $2 \
             ORDER BY w.name ASC, w.id ASC LIMIT $3 OFFSET $4"
        );
    }

    #[test]
    fn test_unknown_sort_column_falls_back_to_default() {
        let params = query(&[
            ("sort_by", "name; DROP TABLE widgets"),
            ("sort_order", "asc"),
            ("deleted_status", "deleted"),
        ]);
        let sql = ListingQuery::new(&WIDGETS, &params).data_query().into_sql();
        assert!(sql.contains("WHERE w.record_state = 'deleted'"));
        assert!(sql.contains("ORDER BY w.created_at DESC, w.id ASC"));
        assert!(!sql.contains("DROP"));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_page_meta() {
        let meta = PageMeta::new(2, 10, 25, 10);
        assert_eq!(meta.last_page, 3);
        assert_eq!(meta.from, Some(11));
        assert_eq!(meta.to, Some(20));
        assert!(meta.has_previous());
        assert!(meta.has_next());

        let empty = PageMeta::new(1, 10, 0, 0);
        assert_eq!(empty.last_page, 1);
        assert_eq!(empty.from, None);
        assert!(!empty.has_next());
    }

    #[test]
    fn test_page_map_keeps_meta() {
        let page = Page::new(vec![1, 2, 3], 1, 10, 3).map(|n| n * 2);
        assert_eq!(page.data, vec![2, 4, 6]);
        assert_eq!(page.meta.to, Some(3));
    }
}
