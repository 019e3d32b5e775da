use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::reports::{
        CategorySalesList, DaySalesList, HourSalesList, MostSoldItem, ProductSalesList,
        SalesStats,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::ReportQuery,
    services::report_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales-stats", get(sales_stats))
        .route("/most-sold-item", get(most_sold_item))
        .route("/sales-by-day", get(sales_by_day))
        .route("/sales-by-hour", get(sales_by_hour))
        .route("/sales-by-product", get(sales_by_product))
        .route("/sales-by-category", get(sales_by_category))
}

#[utoipa::path(
    get,
    path = "/api/reports/sales-stats",
    params(
        ("start_date" = String, Query, description = "ISO date, inclusive"),
        ("end_date" = String, Query, description = "ISO date, inclusive")
    ),
    responses(
        (status = 200, description = "Totals and growth vs. previous period", body = ApiResponse<SalesStats>),
        (status = 403, description = "Forbidden"),
        (status = 422, description = "Invalid range")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn sales_stats(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ApiResponse<SalesStats>>> {
    let resp = report_service::sales_stats(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reports/most-sold-item",
    params(
        ("start_date" = String, Query, description = "ISO date, inclusive"),
        ("end_date" = String, Query, description = "ISO date, inclusive")
    ),
    responses(
        (status = 200, description = "Item with the highest quantity sold", body = ApiResponse<MostSoldItem>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No sales in range")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn most_sold_item(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ApiResponse<MostSoldItem>>> {
    let resp = report_service::most_sold_item(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reports/sales-by-day",
    params(
        ("start_date" = String, Query, description = "ISO date, inclusive"),
        ("end_date" = String, Query, description = "ISO date, inclusive")
    ),
    responses(
        (status = 200, description = "Sales bucketed by calendar day", body = ApiResponse<DaySalesList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn sales_by_day(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ApiResponse<DaySalesList>>> {
    let resp = report_service::sales_by_day(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reports/sales-by-hour",
    params(
        ("start_date" = String, Query, description = "ISO date, inclusive"),
        ("end_date" = String, Query, description = "ISO date, inclusive")
    ),
    responses(
        (status = 200, description = "Sales bucketed by hour of day", body = ApiResponse<HourSalesList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn sales_by_hour(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ApiResponse<HourSalesList>>> {
    let resp = report_service::sales_by_hour(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reports/sales-by-product",
    params(
        ("start_date" = String, Query, description = "ISO date, inclusive"),
        ("end_date" = String, Query, description = "ISO date, inclusive"),
        ("limit" = Option<i64>, Query, description = "Max rows, default 50")
    ),
    responses(
        (status = 200, description = "Line totals grouped by item", body = ApiResponse<ProductSalesList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn sales_by_product(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ApiResponse<ProductSalesList>>> {
    let resp = report_service::sales_by_product(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reports/sales-by-category",
    params(
        ("start_date" = String, Query, description = "ISO date, inclusive"),
        ("end_date" = String, Query, description = "ISO date, inclusive"),
        ("limit" = Option<i64>, Query, description = "Max rows, default 50")
    ),
    responses(
        (status = 200, description = "Line totals grouped by category", body = ApiResponse<CategorySalesList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn sales_by_category(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ApiResponse<CategorySalesList>>> {
    let resp = report_service::sales_by_category(&state, &user, query).await?;
    Ok(Json(resp))
}
