use actix_web::{HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::error::Res;

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

pub struct Success;
impl Success {
    pub fn created<T: Serialize>(body: T) -> Res<impl Responder> {
        Result::Ok(HttpResponse::Created().json(body))
    }
    pub fn ok<T: Serialize>(body: T) -> Res<impl Responder> {
        Result::Ok(HttpResponse::Ok().json(body))
    }
}

/// Page selection as sent by clients. Out-of-range values fall back to defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        match self.page {
            Some(page) if page >= 1 => page,
            _ => 1,
        }
    }

    pub fn limit(&self) -> i64 {
        match self.limit {
            Some(limit) if (1..=MAX_PAGE_LIMIT).contains(&limit) => limit,
            _ => DEFAULT_PAGE_LIMIT,
        }
    }

    /// Saturates instead of overflowing on absurd page numbers; such pages are just empty.
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, query: &PageQuery) -> Self {
        Paginated {
            data,
            pagination: Pagination {
                total,
                page: query.page(),
                limit: query.limit(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_missing() {
        let query = PageQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn out_of_range_values_are_reset() {
        let query = PageQuery {
            page: Some(0),
            limit: Some(500),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), DEFAULT_PAGE_LIMIT);

        let query = PageQuery {
            page: Some(-3),
            limit: Some(0),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn offset_follows_page_and_limit() {
        let query = PageQuery {
            page: Some(3),
            limit: Some(25),
        };
        assert_eq!(query.offset(), 50);
    }

    #[test]
    fn huge_page_does_not_overflow_offset() {
        let query = PageQuery {
            page: Some(i64::MAX),
            limit: Some(10),
        };
        assert_eq!(query.offset(), i64::MAX);
        assert!(query.offset() >= 0);
    }

    #[test]
    fn paginated_body_shape() {
        let query = PageQuery {
            page: Some(2),
            limit: Some(5),
        };
        let body = serde_json::to_value(Paginated::new(vec!["a", "b"], 7, &query)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "data": ["a", "b"],
                "pagination": { "total": 7, "page": 2, "limit": 5 }
            })
        );
    }
}
