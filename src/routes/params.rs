use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::Category;

#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemSortBy {
    CreatedAt,
    Name,
    PriceSmall,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ItemQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub q: Option<String>,
    pub category: Option<Category>,
    pub available: Option<bool>,
    pub sort_by: Option<ItemSortBy>,
    pub sort_order: Option<SortOrder>,
}

/// Derived-status filter for ingredient listings.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IngredientStatusFilter {
    OutOfStock,
    LowStock,
    NearExpiration,
    Expired,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IngredientQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub q: Option<String>,
    pub category: Option<String>,
    pub status: Option<IngredientStatusFilter>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub status: Option<String>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        let default = Pagination {
            page: None,
            per_page: None,
        };
        assert_eq!(default.normalize(), (1, 20, 0));

        let oversized = Pagination {
            page: Some(3),
            per_page: Some(500),
        };
        assert_eq!(oversized.normalize(), (3, 100, 200));

        let negative = Pagination {
            page: Some(-1),
            per_page: Some(0),
        };
        assert_eq!(negative.normalize(), (1, 1, 0));
    }
}
