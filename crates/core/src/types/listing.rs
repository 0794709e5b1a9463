//! Vocabulary shared by the filtered listing pages.

use serde::{Deserialize, Serialize};

/// Direction of an explicit sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse a query-string value, ignoring case.
    #[must_use]
    pub fn from_param(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if value.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    /// The SQL keyword for this direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Query-string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// The opposite direction, used when a sorted header is clicked again.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Which soft-delete states a listing includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeletedStatus {
    /// Active and deleted rows.
    All,
    /// Only rows that have not been soft-deleted.
    #[default]
    Active,
    /// Only soft-deleted rows.
    Deleted,
}

impl DeletedStatus {
    pub const ALL: [Self; 3] = [Self::Active, Self::Deleted, Self::All];

    #[must_use]
    pub fn from_param(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Deleted => "deleted",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All records",
            Self::Active => "Active",
            Self::Deleted => "Deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_from_param() {
        assert_eq!(SortOrder::from_param("ASC"), Some(SortOrder::Asc));
        assert_eq!(SortOrder::from_param("desc"), Some(SortOrder::Desc));
        assert_eq!(SortOrder::from_param("sideways"), None);
        assert_eq!(SortOrder::Asc.reversed().as_sql(), "DESC");
    }

    #[test]
    fn test_deleted_status_defaults_to_active() {
        assert_eq!(DeletedStatus::default(), DeletedStatus::Active);
        assert_eq!(DeletedStatus::from_param("all"), Some(DeletedStatus::All));
        assert_eq!(DeletedStatus::from_param("trashed"), None);
    }
}
