//! Data table component types.
//!
//! A table is described by a [`DataTableConfig`] (columns, filters, bulk
//! actions) and rendered against a [`TableState`], which holds the current
//! search/sort/filter/page parameters. State lives in the URL: every sort
//! header and pagination link is built here and keeps the other parameters.
//! Row selection happens in the browser and only feeds the bulk-action bar.

use serde::Serialize;

use tokoku_core::{DeletedStatus, Gender, SortOrder, UserRole, UserStatus};

use crate::db::ListParams;

/// Column definition for a data table.
#[derive(Debug, Clone, Serialize)]
pub struct TableColumn {
    /// Sort key, matching the listing's sortable allowlist.
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    pub sortable: bool,
}

impl TableColumn {
    /// Create a new sortable column.
    #[must_use]
    pub fn sortable(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            sortable: true,
        }
    }

    /// Create a new non-sortable column.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            sortable: false,
        }
    }
}

/// Select filter for a data table.
#[derive(Debug, Clone, Serialize)]
pub struct TableFilter {
    /// Query parameter name.
    pub key: String,
    pub label: String,
    /// Label of the "no filter" option.
    pub any_label: String,
    pub options: Vec<FilterOption>,
}

/// Option for a select filter.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

impl TableFilter {
    /// Create a select filter.
    #[must_use]
    pub fn select(key: &str, label: &str, options: Vec<FilterOption>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            any_label: format!("All {}", label.to_lowercase()),
            options,
        }
    }

    /// The record-state filter shared by every resource. `active` is the
    /// default, so it has no "any" option.
    #[must_use]
    pub fn deleted_status() -> Self {
        Self {
            key: "deleted_status".to_string(),
            label: "Records".to_string(),
            any_label: String::new(),
            options: DeletedStatus::ALL
                .into_iter()
                .map(|s| FilterOption::new(s.as_str(), s.label()))
                .collect(),
        }
    }

    /// Whether the filter offers a "no filter" option.
    #[must_use]
    pub fn has_any(&self) -> bool {
        !self.any_label.is_empty()
    }
}

/// Bulk action submitted with the selected row ids.
#[derive(Debug, Clone, Serialize)]
pub struct BulkAction {
    pub key: String,
    pub label: String,
    /// Endpoint receiving `ids`.
    pub action: String,
    /// Whether this is a destructive action.
    pub destructive: bool,
}

impl BulkAction {
    #[must_use]
    pub fn new(key: &str, label: &str, action: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            action: action.to_string(),
            destructive: false,
        }
    }

    /// Mark this action as destructive.
    #[must_use]
    pub const fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }
}

/// Configuration for a data table.
#[derive(Debug, Clone, Serialize)]
pub struct DataTableConfig {
    /// Unique table identifier, also the resource path segment.
    pub table_id: String,
    pub columns: Vec<TableColumn>,
    pub filters: Vec<TableFilter>,
    pub bulk_actions: Vec<BulkAction>,
    pub search_placeholder: String,
    /// Title for empty state.
    pub empty_title: String,
    /// Description for empty state.
    pub empty_description: Option<String>,
}

impl DataTableConfig {
    /// Create a new data table configuration.
    #[must_use]
    pub fn new(table_id: &str) -> Self {
        Self {
            table_id: table_id.to_string(),
            columns: vec![],
            filters: vec![],
            bulk_actions: vec![],
            search_placeholder: "Search...".to_string(),
            empty_title: "No records found".to_string(),
            empty_description: None,
        }
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add a bulk action.
    #[must_use]
    pub fn bulk_action(mut self, action: BulkAction) -> Self {
        self.bulk_actions.push(action);
        self
    }

    /// Add the bulk delete and restore actions for `/admin/<table_id>`.
    #[must_use]
    pub fn with_bulk_soft_delete(self) -> Self {
        let base = format!("/admin/{}", self.table_id);
        self.bulk_action(
            BulkAction::new("delete", "Delete selected", &format!("{base}/bulk-delete"))
                .destructive(),
        )
        .bulk_action(BulkAction::new(
            "restore",
            "Restore selected",
            &format!("{base}/bulk-restore"),
        ))
    }

    /// Set search placeholder.
    #[must_use]
    pub fn search_placeholder(mut self, placeholder: &str) -> Self {
        self.search_placeholder = placeholder.to_string();
        self
    }

    /// Set empty state configuration.
    #[must_use]
    pub fn empty_state(mut self, title: &str, description: Option<&str>) -> Self {
        self.empty_title = title.to_string();
        self.empty_description = description.map(ToString::to_string);
        self
    }

    #[must_use]
    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    #[must_use]
    pub fn has_bulk_actions(&self) -> bool {
        !self.bulk_actions.is_empty()
    }

    /// Number of columns including the selection and actions columns.
    #[must_use]
    pub fn span(&self) -> usize {
        self.columns.len() + 2
    }
}

/// Build the users table configuration.
#[must_use]
pub fn users_table_config() -> DataTableConfig {
    DataTableConfig::new("users")
        .column(TableColumn::new("avatar", "Avatar"))
        .column(TableColumn::sortable("username", "Username"))
        .column(TableColumn::sortable("email", "Email"))
        .column(TableColumn::sortable("role", "Role"))
        .column(TableColumn::sortable("status", "Status"))
        .column(TableColumn::sortable("created_at", "Joined"))
        .filter(TableFilter::select(
            "role",
            "Roles",
            UserRole::ALL
                .into_iter()
                .map(|r| FilterOption::new(r.as_str(), r.label()))
                .collect(),
        ))
        .filter(TableFilter::select(
            "status",
            "Statuses",
            UserStatus::ALL
                .into_iter()
                .map(|s| FilterOption::new(s.as_str(), s.label()))
                .collect(),
        ))
        .filter(TableFilter::deleted_status())
        .with_bulk_soft_delete()
        .search_placeholder("Search by username, email, role or status...")
        .empty_state("No users found", Some("Try adjusting your search or filters"))
}

/// Build the contacts table configuration.
#[must_use]
pub fn contacts_table_config() -> DataTableConfig {
    DataTableConfig::new("contacts")
        .column(TableColumn::sortable("user", "User"))
        .column(TableColumn::sortable("name", "Name"))
        .column(TableColumn::sortable("phone", "Phone"))
        .column(TableColumn::sortable("gender", "Gender"))
        .column(TableColumn::sortable("birthday", "Birthday"))
        .filter(TableFilter::select(
            "gender",
            "Genders",
            Gender::ALL
                .into_iter()
                .map(|g| FilterOption::new(g.as_str(), g.label()))
                .collect(),
        ))
        .filter(TableFilter::deleted_status())
        .with_bulk_soft_delete()
        .search_placeholder("Search by name, phone, gender or owner...")
        .empty_state("No contacts found", Some("Try adjusting your search or filters"))
}

/// Build the addresses table configuration.
#[must_use]
pub fn addresses_table_config() -> DataTableConfig {
    DataTableConfig::new("addresses")
        .column(TableColumn::sortable("contact", "Owner"))
        .column(TableColumn::sortable("post_code", "Post Code"))
        .column(TableColumn::sortable("country", "Country"))
        .column(TableColumn::sortable("province", "Province"))
        .column(TableColumn::sortable("city", "City"))
        .column(TableColumn::sortable("street", "Street"))
        .filter(TableFilter::deleted_status())
        .with_bulk_soft_delete()
        .search_placeholder("Search by place, post code or owner...")
        .empty_state("No addresses found", Some("Try adjusting your search or filters"))
}

/// Build the categories table configuration.
#[must_use]
pub fn categories_table_config() -> DataTableConfig {
    DataTableConfig::new("categories")
        .column(TableColumn::new("image", "Image"))
        .column(TableColumn::sortable("name", "Name"))
        .column(TableColumn::sortable("slug", "Slug"))
        .column(TableColumn::sortable("items_count", "Items"))
        .column(TableColumn::sortable("created_at", "Created"))
        .filter(TableFilter::deleted_status())
        .with_bulk_soft_delete()
        .search_placeholder("Search by name, slug or description...")
        .empty_state("No categories found", None)
}

/// Build the items table configuration. `categories` feeds the category
/// filter.
#[must_use]
pub fn items_table_config(categories: Vec<FilterOption>) -> DataTableConfig {
    DataTableConfig::new("items")
        .column(TableColumn::sortable("name", "Name"))
        .column(TableColumn::sortable("category", "Category"))
        .column(TableColumn::sortable("price", "Price"))
        .column(TableColumn::sortable("discount", "Discount"))
        .column(TableColumn::sortable("stock", "Stock"))
        .column(TableColumn::sortable("is_available", "Available"))
        .column(TableColumn::sortable("expired_at", "Expires"))
        .filter(TableFilter::select("category_id", "Categories", categories))
        .filter(TableFilter::deleted_status())
        .with_bulk_soft_delete()
        .search_placeholder("Search by name, unit, description or category...")
        .empty_state("No items found", Some("Try adjusting your search or filters"))
}

/// Current table parameters, as encoded in the page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    path: String,
    search: Option<String>,
    sort: Option<(String, SortOrder)>,
    filters: Vec<(&'static str, String)>,
    per_page: u32,
    page: u32,
    highlight: Option<i32>,
}

impl TableState {
    /// State for the listing at `path` with normalized `params`.
    #[must_use]
    pub fn new(path: &str, params: &ListParams) -> Self {
        let mut filters = Vec::new();
        if let Some(role) = params.role {
            filters.push(("role", role.as_str().to_string()));
        }
        if let Some(status) = params.status {
            filters.push(("status", status.as_str().to_string()));
        }
        if let Some(gender) = params.gender {
            filters.push(("gender", gender.as_str().to_string()));
        }
        if let Some(category) = params.category_id {
            filters.push(("category_id", category.to_string()));
        }
        if params.deleted_status != DeletedStatus::default() {
            filters.push(("deleted_status", params.deleted_status.as_str().to_string()));
        }

        Self {
            path: path.to_string(),
            search: params.search.clone(),
            sort: params.sort.clone(),
            filters,
            per_page: params.per_page,
            page: params.page,
            highlight: params.highlight,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn search(&self) -> &str {
        self.search.as_deref().unwrap_or_default()
    }

    /// Current value of filter `key`; the record-state filter reports its
    /// default when unset.
    #[must_use]
    pub fn filter_value(&self, key: &str) -> &str {
        self.filters
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| {
                if key == "deleted_status" {
                    DeletedStatus::default().as_str()
                } else {
                    ""
                }
            })
    }

    /// Whether `value` is the selected option of filter `key`.
    #[must_use]
    pub fn is_selected(&self, key: &str, value: &str) -> bool {
        self.filter_value(key) == value
    }

    /// Whether any search or filter narrows the listing.
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        self.search.is_some() || !self.filters.is_empty()
    }

    /// Current direction of column `key`, if the listing is sorted by it.
    #[must_use]
    pub fn sort_direction(&self, key: &str) -> Option<SortOrder> {
        self.sort
            .as_ref()
            .filter(|(k, _)| k == key)
            .map(|(_, order)| *order)
    }

    /// Header indicator for column `key`.
    #[must_use]
    pub fn sort_indicator(&self, key: &str) -> &'static str {
        match self.sort_direction(key) {
            Some(SortOrder::Asc) => "▲",
            Some(SortOrder::Desc) => "▼",
            None => "",
        }
    }

    /// Link for a column header: ascending first, then flips. Resets to the
    /// first page.
    #[must_use]
    pub fn sort_url(&self, key: &str) -> String {
        let order = self
            .sort_direction(key)
            .map_or(SortOrder::Asc, SortOrder::reversed);
        self.url_with(Some((key, order)), 1)
    }

    /// Link to `page`, keeping everything else.
    #[must_use]
    pub fn page_url(&self, page: u32) -> String {
        let sort = self.sort.as_ref().map(|(k, o)| (k.as_str(), *o));
        self.url_with(sort, page)
    }

    /// Hidden inputs that carry the sort and page size through the
    /// search/filter form.
    #[must_use]
    pub fn carried_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some((key, order)) = &self.sort {
            fields.push(("sort_by", key.clone()));
            fields.push(("sort_order", order.as_str().to_string()));
        }
        if self.per_page != crate::db::listing::DEFAULT_PER_PAGE {
            fields.push(("per_page", self.per_page.to_string()));
        }
        fields
    }

    /// Whether row `id` was requested with `highlight`.
    #[must_use]
    pub fn is_highlighted(&self, id: i32) -> bool {
        self.highlight == Some(id)
    }

    fn url_with(&self, sort: Option<(&str, SortOrder)>, page: u32) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        for (key, value) in &self.filters {
            pairs.push((*key, value.clone()));
        }
        if let Some((key, order)) = sort {
            pairs.push(("sort_by", key.to_string()));
            pairs.push(("sort_order", order.as_str().to_string()));
        }
        if self.per_page != crate::db::listing::DEFAULT_PER_PAGE {
            pairs.push(("per_page", self.per_page.to_string()));
        }
        if page > 1 {
            pairs.push(("page", page.to_string()));
        }

        if pairs.is_empty() {
            return self.path.clone();
        }
        let query = pairs
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{query}", self.path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::ListQuery;

    fn state(pairs: &[(&str, &str)]) -> TableState {
        let mut q = ListQuery::default();
        for (key, value) in pairs {
            let value = Some((*value).to_string());
            match *key {
                "search" => q.search = value,
                "sort_by" => q.sort_by = value,
                "sort_order" => q.sort_order = value,
                "role" => q.role = value,
                "deleted_status" => q.deleted_status = value,
                "page" => q.page = value,
                "per_page" => q.per_page = value,
                "highlight" => q.highlight = value,
                _ => unreachable!(),
            }
        }
        TableState::new("/admin/users", &ListParams::from(&q))
    }

    #[test]
    fn test_sort_url_keeps_filters_and_resets_page() {
        let s = state(&[("search", "budi santoso"), ("role", "ADMIN"), ("page", "3")]);
        assert_eq!(
            s.sort_url("username"),
            "/admin/users?search=budi%20santoso&role=ADMIN&sort_by=username&sort_order=asc"
        );
    }

    #[test]
    fn test_sort_url_flips_current_column() {
        let s = state(&[("sort_by", "email"), ("sort_order", "asc")]);
        assert_eq!(s.sort_indicator("email"), "▲");
        assert_eq!(s.sort_indicator("username"), "");
        assert_eq!(
            s.sort_url("email"),
            "/admin/users?sort_by=email&sort_order=desc"
        );
        assert_eq!(
            s.sort_url("username"),
            "/admin/users?sort_by=username&sort_order=asc"
        );
    }

    #[test]
    fn test_page_url_keeps_sort_and_page_size() {
        let s = state(&[
            ("deleted_status", "deleted"),
            ("sort_by", "email"),
            ("sort_order", "desc"),
            ("per_page", "25"),
        ]);
        assert_eq!(
            s.page_url(2),
            "/admin/users?deleted_status=deleted&sort_by=email&sort_order=desc&per_page=25&page=2"
        );
        assert_eq!(
            s.page_url(1),
            "/admin/users?deleted_status=deleted&sort_by=email&sort_order=desc&per_page=25"
        );
    }

    #[test]
    fn test_defaults_produce_bare_path() {
        let s = state(&[]);
        assert_eq!(s.page_url(1), "/admin/users");
        assert!(!s.is_filtered());
        assert_eq!(s.filter_value("deleted_status"), "active");
        assert_eq!(s.filter_value("role"), "");
        assert!(s.carried_fields().is_empty());
    }

    #[test]
    fn test_highlight() {
        let s = state(&[("highlight", "42")]);
        assert!(s.is_highlighted(42));
        assert!(!s.is_highlighted(41));
    }

    #[test]
    fn test_users_config_columns_are_sortable_keys() {
        let config = users_table_config();
        let sortable: Vec<&str> = config
            .columns
            .iter()
            .filter(|c| c.sortable)
            .map(|c| c.key.as_str())
            .collect();
        assert_eq!(
            sortable,
            ["username", "email", "role", "status", "created_at"]
        );
        assert_eq!(config.bulk_actions[0].action, "/admin/users/bulk-delete");
        assert!(config.bulk_actions[0].destructive);
        assert_eq!(config.span(), 8);
    }

    #[test]
    fn test_deleted_status_filter_has_no_any_option() {
        let filter = TableFilter::deleted_status();
        assert!(!filter.has_any());
        assert_eq!(filter.options.len(), 3);
        assert!(TableFilter::select("role", "Roles", vec![]).has_any());
    }
}
