//! Explicitly requested relations.

use serde::{Serialize, Serializer};

/// A related entity that a query may or may not have loaded.
///
/// Queries take a list of requested relations and fill `Loaded` only for
/// those; serializers skip `NotLoaded` fields entirely, so a missing key
/// means "not requested" while `null` means "requested, but absent".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Relation<T> {
    #[default]
    NotLoaded,
    Loaded(T),
}

impl<T> Relation<T> {
    /// `Loaded(value())` when `requested`, otherwise `NotLoaded`.
    pub fn load_if(requested: bool, value: impl FnOnce() -> T) -> Self {
        if requested {
            Self::Loaded(value())
        } else {
            Self::NotLoaded
        }
    }

    #[must_use]
    pub const fn is_not_loaded(&self) -> bool {
        matches!(self, Self::NotLoaded)
    }

    #[must_use]
    pub const fn as_loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            Self::NotLoaded => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Relation<U> {
        match self {
            Self::Loaded(value) => Relation::Loaded(f(value)),
            Self::NotLoaded => Relation::NotLoaded,
        }
    }
}

impl<T: Serialize> Serialize for Relation<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Loaded(value) => value.serialize(serializer),
            Self::NotLoaded => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Holder {
        #[serde(skip_serializing_if = "Relation::is_not_loaded")]
        owner: Relation<Option<&'static str>>,
    }

    #[test]
    fn test_not_loaded_is_omitted() {
        let json = serde_json::to_string(&Holder {
            owner: Relation::NotLoaded,
        })
        .unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_loaded_absent_is_null() {
        let json = serde_json::to_string(&Holder {
            owner: Relation::Loaded(None),
        })
        .unwrap();
        assert_eq!(json, r#"{"owner":null}"#);
    }

    #[test]
    fn test_load_if() {
        assert_eq!(Relation::load_if(true, || 3), Relation::Loaded(3));
        assert!(Relation::load_if(false, || 3).is_not_loaded());
        assert_eq!(Relation::Loaded(2).map(|n| n * 5).as_loaded(), Some(&10));
    }
}
