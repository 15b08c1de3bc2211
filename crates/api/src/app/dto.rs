use serde::{Deserialize, Serialize};

use eventhub_core::{DomainResult, PageRequest, SortOrder};
use eventhub_core::query::{DEFAULT_LIMIT, MAX_LIMIT};

// -------------------------
// Request DTOs
// -------------------------

/// `?offset=&limit=&sort=path:dir,path`
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub sort: Option<String>,
}

impl ListQuery {
    /// Defaults: offset 0, limit 50. Limits above the maximum are capped;
    /// a zero limit is left for validation to reject.
    pub fn to_page_request(&self) -> DomainResult<PageRequest> {
        let sort_orders = match &self.sort {
            Some(sort) => sort
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(str::parse::<SortOrder>)
                .collect::<DomainResult<Vec<_>>>()?,
            None => Vec::new(),
        };

        PageRequest::new(
            self.offset.unwrap_or(0),
            self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
            sort_orders,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use eventhub_core::{DomainError, SortDirection};

    use super::*;

    #[test]
    fn empty_query_uses_defaults() {
        let page = ListQuery::default().to_page_request().unwrap();
        assert_eq!(page.offset, 0);
        assert_eq!(page.limit, DEFAULT_LIMIT);
        assert!(page.sort_orders.is_empty());
    }

    #[test]
    fn sort_parameter_lists_orders_in_priority() {
        let query = ListQuery {
            offset: Some(20),
            limit: Some(5000),
            sort: Some("eventDate:DESC, name,".into()),
        };
        let page = query.to_page_request().unwrap();
        assert_eq!(page.limit, MAX_LIMIT);
        assert_eq!(page.sort_orders.len(), 2);
        assert_eq!(page.sort_orders[0].path, "eventDate");
        assert_eq!(page.sort_orders[0].direction, SortDirection::Desc);
        assert_eq!(page.sort_orders[1].path, "name");
        assert_eq!(page.sort_orders[1].direction, SortDirection::Asc);
    }

    #[test]
    fn zero_limit_and_bad_direction_fail_validation() {
        let zero = ListQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert!(matches!(zero.to_page_request(), Err(DomainError::Validation(_))));

        let sideways = ListQuery {
            sort: Some("name:sideways".into()),
            ..Default::default()
        };
        assert!(matches!(sideways.to_page_request(), Err(DomainError::Validation(_))));
    }
}
