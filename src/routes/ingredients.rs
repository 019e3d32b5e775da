use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::ingredients::{
        CreateIngredientRequest, IngredientList, IngredientWithStatus, UpdateIngredientRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::IngredientQuery,
    services::ingredient_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_ingredients).post(create_ingredient))
        .route(
            "/{id}",
            get(get_ingredient)
                .put(update_ingredient)
                .delete(delete_ingredient),
        )
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search name/code"),
        ("category" = Option<String>, Query, description = "Filter by category"),
        ("status" = Option<String>, Query, description = "out_of_stock, low_stock, near_expiration, expired")
    ),
    responses(
        (status = 200, description = "List ingredients with derived flags", body = ApiResponse<IngredientList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Ingredients"
)]
pub async fn list_ingredients(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<IngredientQuery>,
) -> AppResult<Json<ApiResponse<IngredientList>>> {
    let resp = ingredient_service::list_ingredients(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{id}",
    params(("id" = Uuid, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Get one ingredient", body = ApiResponse<IngredientWithStatus>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Ingredients"
)]
pub async fn get_ingredient(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<IngredientWithStatus>>> {
    let resp = ingredient_service::get_ingredient(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/ingredients",
    request_body = CreateIngredientRequest,
    responses(
        (status = 201, description = "Create ingredient", body = ApiResponse<IngredientWithStatus>),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Duplicate code"),
        (status = 422, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Ingredients"
)]
pub async fn create_ingredient(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateIngredientRequest>,
) -> AppResult<Json<ApiResponse<IngredientWithStatus>>> {
    let resp = ingredient_service::create_ingredient(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/ingredients/{id}",
    params(("id" = Uuid, Path, description = "Ingredient ID")),
    request_body = UpdateIngredientRequest,
    responses(
        (status = 200, description = "Update ingredient", body = ApiResponse<IngredientWithStatus>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Duplicate code"),
        (status = 422, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Ingredients"
)]
pub async fn update_ingredient(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateIngredientRequest>,
) -> AppResult<Json<ApiResponse<IngredientWithStatus>>> {
    let resp = ingredient_service::update_ingredient(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/ingredients/{id}",
    params(("id" = Uuid, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Delete ingredient"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Ingredients"
)]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = ingredient_service::delete_ingredient(&state, &user, id).await?;
    Ok(Json(resp))
}
