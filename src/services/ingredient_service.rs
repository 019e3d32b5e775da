use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::ingredients::{
        CreateIngredientRequest, IngredientList, IngredientWithStatus, UpdateIngredientRequest,
    },
    entity::ingredients::{
        ActiveModel as IngredientActive, Column as IngredientCol, Entity as Ingredients,
        Model as IngredientModel,
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Ingredient, IngredientStatus},
    response::{ApiResponse, Meta},
    routes::params::{IngredientQuery, IngredientStatusFilter},
    state::AppState,
};

pub async fn list_ingredients(
    state: &AppState,
    query: IngredientQuery,
) -> AppResult<ApiResponse<IngredientList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(IngredientCol::Name).ilike(pattern.clone()))
                .add(Expr::col(IngredientCol::Code).ilike(pattern)),
        );
    }

    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(IngredientCol::Category.eq(category.clone()));
    }

    let finder = Ingredients::find()
        .filter(condition)
        .order_by_asc(IngredientCol::Name);

    let today = Utc::now().date_naive();

    // Status flags are derived, so that filter runs after evaluation rather
    // than in SQL; the page is cut from the filtered set.
    let (rows, total) = match query.status {
        None => {
            let total = finder.clone().count(&state.orm).await? as i64;
            let rows = finder
                .limit(limit as u64)
                .offset(offset as u64)
                .all(&state.orm)
                .await?;
            (rows, total)
        }
        Some(filter) => {
            let evaluated: Vec<IngredientModel> = finder
                .all(&state.orm)
                .await?
                .into_iter()
                .filter(|model| {
                    let status = ingredient_from_entity(model.clone()).status(today);
                    matches_filter(status, filter)
                })
                .collect();
            let total = evaluated.len() as i64;
            let rows = evaluated
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect();
            (rows, total)
        }
    };

    let items = rows
        .into_iter()
        .map(|model| {
            let ingredient = ingredient_from_entity(model);
            let status = ingredient.status(today);
            IngredientWithStatus { ingredient, status }
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ingredients",
        IngredientList { items },
        Some(meta),
    ))
}

pub async fn get_ingredient(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<IngredientWithStatus>> {
    let model = Ingredients::find_by_id(id).one(&state.orm).await?;
    let model = match model {
        Some(m) => m,
        None => return Err(AppError::NotFound),
    };

    let ingredient = ingredient_from_entity(model);
    let status = ingredient.status(Utc::now().date_naive());
    Ok(ApiResponse::success(
        "Ingredient",
        IngredientWithStatus { ingredient, status },
        None,
    ))
}

pub async fn create_ingredient(
    state: &AppState,
    user: &AuthUser,
    payload: CreateIngredientRequest,
) -> AppResult<ApiResponse<IngredientWithStatus>> {
    ensure_admin(user)?;
    validate_ingredient_payload(
        Some(&payload.code),
        Some(&payload.name),
        Some(&payload.category),
        Some(&payload.unit_of_measure),
        Some(payload.purchase_price),
        Some(payload.sale_price),
        Some(payload.minimum_stock),
    )?;

    let exists = Ingredients::find()
        .filter(IngredientCol::Code.eq(payload.code.clone()))
        .count(&state.orm)
        .await?;
    if exists > 0 {
        return Err(AppError::Conflict("Ingredient code is already taken".into()));
    }

    let active = IngredientActive {
        id: Set(Uuid::new_v4()),
        code: Set(payload.code),
        name: Set(payload.name),
        description: Set(payload.description),
        category: Set(payload.category),
        purchase_price: Set(payload.purchase_price),
        sale_price: Set(payload.sale_price),
        stock_quantity: Set(payload.stock_quantity),
        minimum_stock: Set(payload.minimum_stock),
        supplier: Set(payload.supplier),
        location: Set(payload.location),
        last_purchase_date: Set(payload.last_purchase_date),
        unit_of_measure: Set(payload.unit_of_measure),
        expiry_date: Set(payload.expiry_date),
        image: Set(payload.image),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let model = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "ingredient_create",
        Some("ingredients"),
        Some(serde_json::json!({ "ingredient_id": model.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let ingredient = ingredient_from_entity(model);
    let status = ingredient.status(Utc::now().date_naive());
    Ok(ApiResponse::success(
        "Ingredient created",
        IngredientWithStatus { ingredient, status },
        Some(Meta::empty()),
    ))
}

pub async fn update_ingredient(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateIngredientRequest,
) -> AppResult<ApiResponse<IngredientWithStatus>> {
    ensure_admin(user)?;
    validate_ingredient_payload(
        payload.code.as_deref(),
        payload.name.as_deref(),
        payload.category.as_deref(),
        payload.unit_of_measure.as_deref(),
        payload.purchase_price,
        payload.sale_price,
        payload.minimum_stock,
    )?;

    let existing = Ingredients::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(m) => m,
        None => return Err(AppError::NotFound),
    };

    if let Some(code) = payload.code.as_ref().filter(|c| **c != existing.code) {
        let taken = Ingredients::find()
            .filter(IngredientCol::Code.eq(code.clone()))
            .count(&state.orm)
            .await?;
        if taken > 0 {
            return Err(AppError::Conflict("Ingredient code is already taken".into()));
        }
    }

    let mut active: IngredientActive = existing.into();
    if let Some(code) = payload.code {
        active.code = Set(code);
    }
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(purchase_price) = payload.purchase_price {
        active.purchase_price = Set(purchase_price);
    }
    if let Some(sale_price) = payload.sale_price {
        active.sale_price = Set(sale_price);
    }
    if let Some(stock_quantity) = payload.stock_quantity {
        active.stock_quantity = Set(stock_quantity);
    }
    if let Some(minimum_stock) = payload.minimum_stock {
        active.minimum_stock = Set(minimum_stock);
    }
    if let Some(supplier) = payload.supplier {
        active.supplier = Set(Some(supplier));
    }
    if let Some(location) = payload.location {
        active.location = Set(Some(location));
    }
    if let Some(last_purchase_date) = payload.last_purchase_date {
        active.last_purchase_date = Set(Some(last_purchase_date));
    }
    if let Some(unit_of_measure) = payload.unit_of_measure {
        active.unit_of_measure = Set(unit_of_measure);
    }
    if let Some(expiry_date) = payload.expiry_date {
        active.expiry_date = Set(expiry_date);
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    active.updated_at = Set(Utc::now().into());

    let model = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "ingredient_update",
        Some("ingredients"),
        Some(serde_json::json!({ "ingredient_id": model.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let ingredient = ingredient_from_entity(model);
    let status = ingredient.status(Utc::now().date_naive());
    Ok(ApiResponse::success(
        "Updated",
        IngredientWithStatus { ingredient, status },
        Some(Meta::empty()),
    ))
}

pub async fn delete_ingredient(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Ingredients::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "ingredient_delete",
        Some("ingredients"),
        Some(serde_json::json!({ "ingredient_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn matches_filter(status: IngredientStatus, filter: IngredientStatusFilter) -> bool {
    match filter {
        IngredientStatusFilter::OutOfStock => status.is_out_of_stock,
        IngredientStatusFilter::LowStock => status.is_low_stock,
        IngredientStatusFilter::NearExpiration => status.is_near_expiration,
        IngredientStatusFilter::Expired => status.is_expired,
    }
}

fn validate_ingredient_payload(
    code: Option<&str>,
    name: Option<&str>,
    category: Option<&str>,
    unit_of_measure: Option<&str>,
    purchase_price: Option<i64>,
    sale_price: Option<i64>,
    minimum_stock: Option<f64>,
) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if code.is_some_and(|c| c.trim().is_empty()) {
        errors.push("code", "code is required");
    }
    if name.is_some_and(|n| n.trim().is_empty()) {
        errors.push("name", "name is required");
    }
    if category.is_some_and(|c| c.trim().is_empty()) {
        errors.push("category", "category is required");
    }
    if unit_of_measure.is_some_and(|u| u.trim().is_empty()) {
        errors.push("unit_of_measure", "unit_of_measure is required");
    }
    if purchase_price.is_some_and(|p| p < 0) {
        errors.push("purchase_price", "purchase_price must not be negative");
    }
    if sale_price.is_some_and(|p| p < 0) {
        errors.push("sale_price", "sale_price must not be negative");
    }
    if minimum_stock.is_some_and(|m| m < 0.0) {
        errors.push("minimum_stock", "minimum_stock must not be negative");
    }
    errors.into_result()
}

fn ingredient_from_entity(model: IngredientModel) -> Ingredient {
    Ingredient {
        id: model.id,
        code: model.code,
        name: model.name,
        description: model.description,
        category: model.category,
        purchase_price: model.purchase_price,
        sale_price: model.sale_price,
        stock_quantity: model.stock_quantity,
        minimum_stock: model.minimum_stock,
        supplier: model.supplier,
        location: model.location,
        last_purchase_date: model.last_purchase_date,
        unit_of_measure: model.unit_of_measure,
        expiry_date: model.expiry_date,
        image: model.image,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
