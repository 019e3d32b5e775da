use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct PeriodTotals {
    /// Cents.
    pub total_sales: i64,
    pub total_orders: i64,
    /// Cents; 0 when the period has no orders.
    pub average_ticket: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesStats {
    pub current: PeriodTotals,
    pub previous: PeriodTotals,
    /// Percentage growth vs. the preceding period of equal length;
    /// 0 when the previous figure is 0.
    pub sales_growth: f64,
    pub orders_growth: f64,
    pub average_ticket_growth: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MostSoldItem {
    pub item_id: Uuid,
    pub name: String,
    pub total_quantity: i64,
    pub total_value: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DaySales {
    pub day: NaiveDate,
    pub total_sales: i64,
    pub total_orders: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HourSales {
    /// Hour of day, 0-23.
    pub hour: i32,
    pub total_sales: i64,
    pub total_orders: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductSales {
    pub item_id: Uuid,
    pub name: String,
    pub total_quantity: i64,
    pub total_value: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategorySales {
    pub category: String,
    pub total_quantity: i64,
    pub total_value: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DaySalesList {
    pub items: Vec<DaySales>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HourSalesList {
    pub items: Vec<HourSales>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductSalesList {
    pub items: Vec<ProductSales>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategorySalesList {
    pub items: Vec<CategorySales>,
}
