//! Paging and sorting requests for list queries.
//!
//! A [`PageRequest`] describes a zero-based window (`offset`, `limit`) taken
//! after applying an ordered list of [`SortOrder`]s. Results are always
//! tie-broken by ascending `id`, so the default order is stable.

use core::cmp::Ordering;
use core::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Default page size when a caller does not specify one.
pub const DEFAULT_LIMIT: u64 = 50;

/// Upper bound for a single page.
pub const MAX_LIMIT: u64 = 1000;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One sort criterion: entity property path + direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub path: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn asc(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Parses `path` or `path:asc|desc` (direction is case-insensitive).
impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, direction) = match s.split_once(':') {
            Some((path, dir)) => {
                let direction = match dir.trim().to_ascii_lowercase().as_str() {
                    "asc" => SortDirection::Asc,
                    "desc" => SortDirection::Desc,
                    other => {
                        return Err(DomainError::validation(format!(
                            "unknown sort direction '{other}'"
                        )));
                    }
                };
                (path.trim(), direction)
            }
            None => (s.trim(), SortDirection::Asc),
        };

        if path.is_empty() {
            return Err(DomainError::validation("sort path must not be empty"));
        }

        Ok(Self {
            path: path.to_string(),
            direction,
        })
    }
}

/// A page window over a sorted result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u64,
    #[serde(default)]
    pub sort_orders: Vec<SortOrder>,
}

impl PageRequest {
    /// Build a validated page request. `limit` must be at least 1.
    pub fn new(offset: u64, limit: u64, sort_orders: Vec<SortOrder>) -> DomainResult<Self> {
        let page = Self {
            offset,
            limit,
            sort_orders,
        };
        page.validate()?;
        Ok(page)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.limit == 0 {
            return Err(DomainError::validation("limit must be at least 1"));
        }
        if self.limit > MAX_LIMIT {
            return Err(DomainError::validation(format!(
                "limit must not exceed {MAX_LIMIT}"
            )));
        }
        Ok(())
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            sort_orders: Vec::new(),
        }
    }
}

/// Comparable projection of a single property value.
///
/// `Null` sorts before every other value in ascending order. `Text` compares
/// bytewise (no locale collation); Postgres sorts with `COLLATE "C"` to match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Null,
    Int(i64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl From<Option<i64>> for SortValue {
    fn from(value: Option<i64>) -> Self {
        value.map(SortValue::Int).unwrap_or(SortValue::Null)
    }
}

impl From<Option<NaiveDateTime>> for SortValue {
    fn from(value: Option<NaiveDateTime>) -> Self {
        value.map(SortValue::Timestamp).unwrap_or(SortValue::Null)
    }
}

impl From<&str> for SortValue {
    fn from(value: &str) -> Self {
        SortValue::Text(value.to_string())
    }
}

/// Entities that can be ordered by named properties.
///
/// Every sortable entity must answer the `"id"` path; it is the final
/// tie-breaker.
pub trait Sortable {
    /// Value of `path` for this entity, or `None` if `path` is not sortable.
    fn sort_value(&self, path: &str) -> Option<SortValue>;

    /// Whether `path` names a sortable property.
    fn is_sortable(path: &str) -> bool;
}

/// Sort `items` by `orders`, then by ascending id.
///
/// Fails with a validation error if any order names an unknown property.
pub fn sort_items<T: Sortable>(items: &mut [T], orders: &[SortOrder]) -> DomainResult<()> {
    if let Some(unknown) = orders.iter().find(|o| !T::is_sortable(&o.path)) {
        return Err(DomainError::validation(format!(
            "cannot sort by unknown property '{}'",
            unknown.path
        )));
    }

    items.sort_by(|a, b| {
        for order in orders {
            let ord = a.sort_value(&order.path).cmp(&b.sort_value(&order.path));
            let ord = match order.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.sort_value("id").cmp(&b.sort_value("id"))
    });
    Ok(())
}

/// Take the `[offset, offset + limit)` window of an already sorted list.
pub fn window<T>(items: Vec<T>, page: &PageRequest) -> Vec<T> {
    let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        name: &'static str,
    }

    impl Sortable for Row {
        fn sort_value(&self, path: &str) -> Option<SortValue> {
            match path {
                "id" => Some(SortValue::Int(self.id)),
                "name" => Some(SortValue::from(self.name)),
                _ => None,
            }
        }

        fn is_sortable(path: &str) -> bool {
            matches!(path, "id" | "name")
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: 3, name: "b" },
            Row { id: 1, name: "b" },
            Row { id: 2, name: "a" },
        ]
    }

    #[test]
    fn default_order_is_ascending_id() {
        let mut items = rows();
        sort_items(&mut items, &[]).unwrap();
        let ids: Vec<i64> = items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn descending_sort_is_tie_broken_by_id() {
        let mut items = rows();
        sort_items(&mut items, &[SortOrder::desc("name")]).unwrap();
        let ids: Vec<i64> = items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn unknown_sort_property_is_rejected() {
        let mut items = rows();
        let err = sort_items(&mut items, &[SortOrder::asc("password")]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn window_skips_and_truncates() {
        let page = PageRequest::new(1, 1, vec![]).unwrap();
        assert_eq!(window(vec![10, 20, 30], &page), vec![20]);

        let past_end = PageRequest::new(5, 10, vec![]).unwrap();
        assert!(window(vec![10, 20, 30], &past_end).is_empty());
    }

    #[test]
    fn zero_limit_is_rejected() {
        assert!(matches!(
            PageRequest::new(0, 0, vec![]),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn text_sorts_bytewise() {
        let mut items = vec![
            Row { id: 1, name: "alpha" },
            Row { id: 2, name: "Zeta" },
            Row { id: 3, name: "Éclair" },
        ];
        sort_items(&mut items, &[SortOrder::asc("name")]).unwrap();
        let names: Vec<&str> = items.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Zeta", "alpha", "Éclair"]);
    }

    #[test]
    fn null_sorts_first() {
        assert!(SortValue::Null < SortValue::Int(i64::MIN));
        assert!(SortValue::from(None::<NaiveDateTime>) < SortValue::Text(String::new()));
    }

    #[test]
    fn parses_sort_specs() {
        assert_eq!("name".parse::<SortOrder>().unwrap(), SortOrder::asc("name"));
        assert_eq!(
            "eventDate:DESC".parse::<SortOrder>().unwrap(),
            SortOrder::desc("eventDate")
        );
        assert!("name:sideways".parse::<SortOrder>().is_err());
        assert!(":asc".parse::<SortOrder>().is_err());
    }

    #[test]
    fn sort_order_json_uses_uppercase_direction() {
        let json = serde_json::json!({ "path": "name", "direction": "DESC" });
        let order: SortOrder = serde_json::from_value(json).unwrap();
        assert_eq!(order, SortOrder::desc("name"));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: consecutive windows concatenate to the full list.
            #[test]
            fn consecutive_pages_cover_everything_once(
                len in 0usize..200,
                limit in 1u64..40,
            ) {
                let items: Vec<usize> = (0..len).collect();
                let mut collected = Vec::new();
                let mut offset = 0u64;
                loop {
                    let page = PageRequest::new(offset, limit, vec![]).unwrap();
                    let chunk = window(items.clone(), &page);
                    prop_assert!(chunk.len() as u64 <= limit);
                    if chunk.is_empty() {
                        break;
                    }
                    collected.extend(chunk);
                    offset += limit;
                }
                prop_assert_eq!(collected, items);
            }
        }
    }
}
