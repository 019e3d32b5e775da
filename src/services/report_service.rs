use chrono::{DateTime, Days, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    dto::reports::{
        CategorySales, CategorySalesList, DaySales, DaySalesList, HourSales, HourSalesList,
        MostSoldItem, PeriodTotals, ProductSales, ProductSalesList, SalesStats,
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    routes::params::ReportQuery,
    state::AppState,
};

/// Inclusive calendar range resolved to half-open UTC instants.
#[derive(Debug, Clone, Copy)]
struct Period {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Period {
    fn from_dates(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if end < start {
            return Err(FieldErrors::single(
                "end_date",
                "end_date must not precede start_date",
            ));
        }
        let end_exclusive = end
            .checked_add_days(Days::new(1))
            .ok_or_else(|| AppError::BadRequest("end_date out of range".into()))?;
        Ok(Self {
            start: to_utc_midnight(start),
            end: to_utc_midnight(end_exclusive),
        })
    }

    /// The immediately preceding period of equal length.
    fn previous(&self) -> Self {
        let span = self.end - self.start;
        Self {
            start: self.start - span,
            end: self.start,
        }
    }
}

fn to_utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(date.and_hms_opt(0, 0, 0).unwrap_or_default(), Utc)
}

/// Average order value in cents; 0 for an empty period rather than a
/// division fault.
pub fn average_ticket(total_sales: i64, total_orders: i64) -> f64 {
    if total_orders == 0 {
        0.0
    } else {
        total_sales as f64 / total_orders as f64
    }
}

/// Percentage change vs. the previous figure; 0 when there is no previous
/// figure to compare against.
pub fn growth_pct(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

#[derive(FromRow)]
struct TotalsRow {
    total_sales: i64,
    total_orders: i64,
}

pub async fn sales_stats(
    state: &AppState,
    user: &AuthUser,
    query: ReportQuery,
) -> AppResult<ApiResponse<SalesStats>> {
    ensure_admin(user)?;
    let period = Period::from_dates(query.start_date, query.end_date)?;
    let previous = period.previous();

    let current = period_totals(state, period).await?;
    let prior = period_totals(state, previous).await?;

    let stats = SalesStats {
        current,
        previous: prior,
        sales_growth: growth_pct(current.total_sales as f64, prior.total_sales as f64),
        orders_growth: growth_pct(current.total_orders as f64, prior.total_orders as f64),
        average_ticket_growth: growth_pct(current.average_ticket, prior.average_ticket),
    };

    Ok(ApiResponse::success("Sales stats", stats, Some(Meta::empty())))
}

async fn period_totals(state: &AppState, period: Period) -> AppResult<PeriodTotals> {
    let row = sqlx::query_as::<_, TotalsRow>(
        r#"
        SELECT COALESCE(SUM(total_amount), 0)::BIGINT AS total_sales,
               COUNT(*)::BIGINT AS total_orders
        FROM orders
        WHERE status <> 'cancelled'
          AND created_at >= $1 AND created_at < $2
        "#,
    )
    .bind(period.start)
    .bind(period.end)
    .fetch_one(&state.pool)
    .await?;

    Ok(PeriodTotals {
        total_sales: row.total_sales,
        total_orders: row.total_orders,
        average_ticket: average_ticket(row.total_sales, row.total_orders),
    })
}

#[derive(FromRow)]
struct ItemAggregateRow {
    item_id: Uuid,
    name: String,
    total_quantity: i64,
    total_value: i64,
}

pub async fn most_sold_item(
    state: &AppState,
    user: &AuthUser,
    query: ReportQuery,
) -> AppResult<ApiResponse<MostSoldItem>> {
    ensure_admin(user)?;
    let period = Period::from_dates(query.start_date, query.end_date)?;

    // Ties resolve by higher value, then lower item id.
    let row = sqlx::query_as::<_, ItemAggregateRow>(
        r#"
        SELECT io.item_id, i.name,
               SUM(io.quantity)::BIGINT AS total_quantity,
               SUM(io.subtotal)::BIGINT AS total_value
        FROM item_orders io
        JOIN orders o ON o.id = io.order_id
        JOIN items i ON i.id = io.item_id
        WHERE o.status <> 'cancelled'
          AND o.created_at >= $1 AND o.created_at < $2
        GROUP BY io.item_id, i.name
        ORDER BY total_quantity DESC, total_value DESC, io.item_id ASC
        LIMIT 1
        "#,
    )
    .bind(period.start)
    .bind(period.end)
    .fetch_optional(&state.pool)
    .await?;

    let row = match row {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success(
        "Most sold item",
        MostSoldItem {
            item_id: row.item_id,
            name: row.name,
            total_quantity: row.total_quantity,
            total_value: row.total_value,
        },
        Some(Meta::empty()),
    ))
}

#[derive(FromRow)]
struct DayRow {
    day: NaiveDate,
    total_sales: i64,
    total_orders: i64,
}

pub async fn sales_by_day(
    state: &AppState,
    user: &AuthUser,
    query: ReportQuery,
) -> AppResult<ApiResponse<DaySalesList>> {
    ensure_admin(user)?;
    let period = Period::from_dates(query.start_date, query.end_date)?;

    // Days without orders produce no bucket; callers handle sparse series.
    let rows = sqlx::query_as::<_, DayRow>(
        r#"
        SELECT (created_at AT TIME ZONE 'UTC')::DATE AS day,
               SUM(total_amount)::BIGINT AS total_sales,
               COUNT(*)::BIGINT AS total_orders
        FROM orders
        WHERE status <> 'cancelled'
          AND created_at >= $1 AND created_at < $2
        GROUP BY day
        ORDER BY day
        "#,
    )
    .bind(period.start)
    .bind(period.end)
    .fetch_all(&state.pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|row| DaySales {
            day: row.day,
            total_sales: row.total_sales,
            total_orders: row.total_orders,
        })
        .collect();

    Ok(ApiResponse::success(
        "Sales by day",
        DaySalesList { items },
        Some(Meta::empty()),
    ))
}

#[derive(FromRow)]
struct HourRow {
    hour: i32,
    total_sales: i64,
    total_orders: i64,
}

pub async fn sales_by_hour(
    state: &AppState,
    user: &AuthUser,
    query: ReportQuery,
) -> AppResult<ApiResponse<HourSalesList>> {
    ensure_admin(user)?;
    let period = Period::from_dates(query.start_date, query.end_date)?;

    let rows = sqlx::query_as::<_, HourRow>(
        r#"
        SELECT EXTRACT(HOUR FROM created_at AT TIME ZONE 'UTC')::INT AS hour,
               SUM(total_amount)::BIGINT AS total_sales,
               COUNT(*)::BIGINT AS total_orders
        FROM orders
        WHERE status <> 'cancelled'
          AND created_at >= $1 AND created_at < $2
        GROUP BY hour
        ORDER BY hour
        "#,
    )
    .bind(period.start)
    .bind(period.end)
    .fetch_all(&state.pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|row| HourSales {
            hour: row.hour,
            total_sales: row.total_sales,
            total_orders: row.total_orders,
        })
        .collect();

    Ok(ApiResponse::success(
        "Sales by hour",
        HourSalesList { items },
        Some(Meta::empty()),
    ))
}

pub async fn sales_by_product(
    state: &AppState,
    user: &AuthUser,
    query: ReportQuery,
) -> AppResult<ApiResponse<ProductSalesList>> {
    ensure_admin(user)?;
    let period = Period::from_dates(query.start_date, query.end_date)?;
    let limit = normalize_limit(query.limit);

    let rows = sqlx::query_as::<_, ItemAggregateRow>(
        r#"
        SELECT io.item_id, i.name,
               SUM(io.quantity)::BIGINT AS total_quantity,
               SUM(io.subtotal)::BIGINT AS total_value
        FROM item_orders io
        JOIN orders o ON o.id = io.order_id
        JOIN items i ON i.id = io.item_id
        WHERE o.status <> 'cancelled'
          AND o.created_at >= $1 AND o.created_at < $2
        GROUP BY io.item_id, i.name
        ORDER BY total_value DESC
        LIMIT $3
        "#,
    )
    .bind(period.start)
    .bind(period.end)
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|row| ProductSales {
            item_id: row.item_id,
            name: row.name,
            total_quantity: row.total_quantity,
            total_value: row.total_value,
        })
        .collect();

    Ok(ApiResponse::success(
        "Sales by product",
        ProductSalesList { items },
        Some(Meta::empty()),
    ))
}

#[derive(FromRow)]
struct CategoryRow {
    category: String,
    total_quantity: i64,
    total_value: i64,
}

pub async fn sales_by_category(
    state: &AppState,
    user: &AuthUser,
    query: ReportQuery,
) -> AppResult<ApiResponse<CategorySalesList>> {
    ensure_admin(user)?;
    let period = Period::from_dates(query.start_date, query.end_date)?;
    let limit = normalize_limit(query.limit);

    let rows = sqlx::query_as::<_, CategoryRow>(
        r#"
        SELECT i.category,
               SUM(io.quantity)::BIGINT AS total_quantity,
               SUM(io.subtotal)::BIGINT AS total_value
        FROM item_orders io
        JOIN orders o ON o.id = io.order_id
        JOIN items i ON i.id = io.item_id
        WHERE o.status <> 'cancelled'
          AND o.created_at >= $1 AND o.created_at < $2
        GROUP BY i.category
        ORDER BY total_value DESC
        LIMIT $3
        "#,
    )
    .bind(period.start)
    .bind(period.end)
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|row| CategorySales {
            category: row.category,
            total_quantity: row.total_quantity,
            total_value: row.total_value,
        })
        .collect();

    Ok(ApiResponse::success(
        "Sales by category",
        CategorySalesList { items },
        Some(Meta::empty()),
    ))
}

fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_ticket_is_zero_for_empty_period() {
        assert_eq!(average_ticket(0, 0), 0.0);
        assert_eq!(average_ticket(7000, 2), 3500.0);
    }

    #[test]
    fn growth_is_zero_when_previous_is_zero() {
        assert_eq!(growth_pct(5000.0, 0.0), 0.0);
        assert_eq!(growth_pct(150.0, 100.0), 50.0);
        assert_eq!(growth_pct(50.0, 100.0), -50.0);
    }

    #[test]
    fn previous_period_has_equal_length() {
        let period = Period::from_dates(
            NaiveDate::from_ymd_opt(2025, 7, 8).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 14).unwrap(),
        )
        .unwrap();
        let previous = period.previous();
        assert_eq!(previous.end, period.start);
        assert_eq!(previous.end - previous.start, period.end - period.start);
        assert_eq!(
            previous.start,
            to_utc_midnight(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap())
        );
    }

    #[test]
    fn inverted_range_is_a_validation_error() {
        let result = Period::from_dates(
            NaiveDate::from_ymd_opt(2025, 7, 14).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 8).unwrap(),
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn single_day_range_covers_one_day() {
        let day = NaiveDate::from_ymd_opt(2025, 7, 8).unwrap();
        let period = Period::from_dates(day, day).unwrap();
        assert_eq!(period.end - period.start, chrono::Duration::days(1));
    }

    #[test]
    fn report_limit_defaults_and_clamps() {
        assert_eq!(normalize_limit(None), 50);
        assert_eq!(normalize_limit(Some(5)), 5);
        assert_eq!(normalize_limit(Some(1000)), 100);
        assert_eq!(normalize_limit(Some(0)), 1);
    }
}
