use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::items::{CreateItemRequest, ItemList, UpdateItemRequest},
    entity::{
        desserts::{ActiveModel as DessertActive, Column as DessertCol, Entity as Desserts},
        drinks::{ActiveModel as DrinkActive, Column as DrinkCol, Entity as Drinks},
        item_orders::{Column as ItemOrderCol, Entity as ItemOrders},
        items::{ActiveModel as ItemActive, Column as ItemCol, Entity as Items, Model as ItemModel},
        pizzas::{ActiveModel as PizzaActive, Column as PizzaCol, Entity as Pizzas},
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Item, ItemDetails},
    response::{ApiResponse, Meta},
    routes::params::{ItemQuery, ItemSortBy, SortOrder},
    state::AppState,
};

pub async fn list_items(state: &AppState, query: ItemQuery) -> AppResult<ApiResponse<ItemList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(ItemCol::Name).ilike(pattern.clone()))
                .add(Expr::col(ItemCol::Description).ilike(pattern)),
        );
    }

    if let Some(category) = query.category {
        condition = condition.add(ItemCol::Category.eq(category.as_str()));
    }

    if let Some(available) = query.available {
        condition = condition.add(ItemCol::Available.eq(available));
    }

    let sort_by = query.sort_by.unwrap_or(ItemSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ItemSortBy::CreatedAt => ItemCol::CreatedAt,
        ItemSortBy::Name => ItemCol::Name,
        ItemSortBy::PriceSmall => ItemCol::PriceSmall,
    };

    let mut finder = Items::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut details = load_details(&state.orm, &models).await?;
    let mut items = Vec::with_capacity(models.len());
    for model in models {
        let detail = details
            .remove(&model.id)
            .ok_or_else(|| missing_specialization(model.id))?;
        items.push(item_from_entity(model, detail)?);
    }

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Items", ItemList { items }, Some(meta)))
}

pub async fn get_item(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Item>> {
    let model = Items::find_by_id(id).one(&state.orm).await?;
    let model = match model {
        Some(m) => m,
        None => return Err(AppError::NotFound),
    };

    let mut details = load_details(&state.orm, std::slice::from_ref(&model)).await?;
    let detail = details
        .remove(&model.id)
        .ok_or_else(|| missing_specialization(model.id))?;

    Ok(ApiResponse::success(
        "Item",
        item_from_entity(model, detail)?,
        None,
    ))
}

pub async fn create_item(
    state: &AppState,
    user: &AuthUser,
    payload: CreateItemRequest,
) -> AppResult<ApiResponse<Item>> {
    ensure_admin(user)?;
    validate_item_payload(
        Some(&payload.name),
        Some(payload.price_small),
        payload.price_medium,
        payload.price_large,
        Some(&payload.details),
    )?;

    let category = payload.details.category();
    let id = Uuid::new_v4();

    let txn = state.orm.begin().await?;

    let active = ItemActive {
        id: Set(id),
        name: Set(payload.name),
        description: Set(payload.description),
        category: Set(category.as_str().to_string()),
        price_small: Set(payload.price_small),
        price_medium: Set(payload.price_medium),
        price_large: Set(payload.price_large),
        image: Set(payload.image),
        available: Set(payload.available.unwrap_or(true)),
        featured: Set(payload.featured.unwrap_or(false)),
        estimated_time: Set(payload.estimated_time),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let model = active.insert(&txn).await?;

    insert_specialization(&txn, model.id, &payload.details).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "item_create",
        Some("items"),
        Some(serde_json::json!({ "item_id": model.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Item created",
        item_from_entity(model, payload.details)?,
        Some(Meta::empty()),
    ))
}

pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateItemRequest,
) -> AppResult<ApiResponse<Item>> {
    ensure_admin(user)?;
    validate_item_payload(
        payload.name.as_deref(),
        payload.price_small,
        payload.price_medium,
        payload.price_large,
        payload.details.as_ref(),
    )?;

    let existing = Items::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(m) => m,
        None => return Err(AppError::NotFound),
    };

    let category = Category::parse(&existing.category)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown category in items row")))?;

    // An item's specialization is fixed at creation.
    if let Some(details) = payload.details.as_ref() {
        if details.category() != category {
            return Err(FieldErrors::single(
                "details",
                "category cannot be changed after creation",
            ));
        }
    }

    let txn = state.orm.begin().await?;

    let mut active: ItemActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price_small) = payload.price_small {
        active.price_small = Set(price_small);
    }
    if let Some(price_medium) = payload.price_medium {
        active.price_medium = Set(Some(price_medium));
    }
    if let Some(price_large) = payload.price_large {
        active.price_large = Set(Some(price_large));
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    if let Some(available) = payload.available {
        active.available = Set(available);
    }
    if let Some(featured) = payload.featured {
        active.featured = Set(featured);
    }
    if let Some(estimated_time) = payload.estimated_time {
        active.estimated_time = Set(Some(estimated_time));
    }
    active.updated_at = Set(Utc::now().into());

    let model = active.update(&txn).await?;

    if let Some(details) = payload.details {
        update_specialization(&txn, model.id, &details).await?;
    }

    txn.commit().await?;

    let mut details = load_details(&state.orm, std::slice::from_ref(&model)).await?;
    let detail = details
        .remove(&model.id)
        .ok_or_else(|| missing_specialization(model.id))?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "item_update",
        Some("items"),
        Some(serde_json::json!({ "item_id": model.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        item_from_entity(model, detail)?,
        Some(Meta::empty()),
    ))
}

pub async fn delete_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    // Historical orders keep their price snapshots; an item that was ever
    // sold cannot be removed.
    let referenced = ItemOrders::find()
        .filter(ItemOrderCol::ItemId.eq(id))
        .count(&state.orm)
        .await?;
    if referenced > 0 {
        return Err(AppError::Conflict(
            "Item is referenced by existing orders".into(),
        ));
    }

    let result = Items::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "item_delete",
        Some("items"),
        Some(serde_json::json!({ "item_id": id })),
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

/// Fetch the specialization rows for a page of items, keyed by item id.
async fn load_details<C: ConnectionTrait>(
    conn: &C,
    models: &[ItemModel],
) -> AppResult<HashMap<Uuid, ItemDetails>> {
    let mut pizza_ids = Vec::new();
    let mut drink_ids = Vec::new();
    let mut dessert_ids = Vec::new();
    for model in models {
        match model.category.as_str() {
            "pizzas" => pizza_ids.push(model.id),
            "drinks" => drink_ids.push(model.id),
            "desserts" => dessert_ids.push(model.id),
            _ => return Err(AppError::Internal(anyhow::anyhow!("unknown category in items row"))),
        }
    }

    let mut details = HashMap::with_capacity(models.len());

    if !pizza_ids.is_empty() {
        for row in Pizzas::find()
            .filter(PizzaCol::ItemId.is_in(pizza_ids))
            .all(conn)
            .await?
        {
            details.insert(
                row.item_id,
                ItemDetails::Pizzas {
                    ingredients: row.ingredients,
                },
            );
        }
    }

    if !drink_ids.is_empty() {
        for row in Drinks::find()
            .filter(DrinkCol::ItemId.is_in(drink_ids))
            .all(conn)
            .await?
        {
            details.insert(
                row.item_id,
                ItemDetails::Drinks {
                    drink_type: row.drink_type,
                    volume_ml: row.volume_ml,
                },
            );
        }
    }

    if !dessert_ids.is_empty() {
        for row in Desserts::find()
            .filter(DessertCol::ItemId.is_in(dessert_ids))
            .all(conn)
            .await?
        {
            details.insert(
                row.item_id,
                ItemDetails::Desserts {
                    ingredients: row.ingredients,
                },
            );
        }
    }

    Ok(details)
}

async fn insert_specialization<C: ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
    details: &ItemDetails,
) -> AppResult<()> {
    match details {
        ItemDetails::Pizzas { ingredients } => {
            PizzaActive {
                id: Set(Uuid::new_v4()),
                item_id: Set(item_id),
                ingredients: Set(ingredients.clone()),
            }
            .insert(conn)
            .await?;
        }
        ItemDetails::Drinks {
            drink_type,
            volume_ml,
        } => {
            DrinkActive {
                id: Set(Uuid::new_v4()),
                item_id: Set(item_id),
                drink_type: Set(drink_type.clone()),
                volume_ml: Set(*volume_ml),
            }
            .insert(conn)
            .await?;
        }
        ItemDetails::Desserts { ingredients } => {
            DessertActive {
                id: Set(Uuid::new_v4()),
                item_id: Set(item_id),
                ingredients: Set(ingredients.clone()),
            }
            .insert(conn)
            .await?;
        }
    }
    Ok(())
}

async fn update_specialization<C: ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
    details: &ItemDetails,
) -> AppResult<()> {
    match details {
        ItemDetails::Pizzas { ingredients } => {
            Pizzas::update_many()
                .col_expr(PizzaCol::Ingredients, Expr::value(ingredients.clone()))
                .filter(PizzaCol::ItemId.eq(item_id))
                .exec(conn)
                .await?;
        }
        ItemDetails::Drinks {
            drink_type,
            volume_ml,
        } => {
            Drinks::update_many()
                .col_expr(DrinkCol::DrinkType, Expr::value(drink_type.clone()))
                .col_expr(DrinkCol::VolumeMl, Expr::value(*volume_ml))
                .filter(DrinkCol::ItemId.eq(item_id))
                .exec(conn)
                .await?;
        }
        ItemDetails::Desserts { ingredients } => {
            Desserts::update_many()
                .col_expr(DessertCol::Ingredients, Expr::value(ingredients.clone()))
                .filter(DessertCol::ItemId.eq(item_id))
                .exec(conn)
                .await?;
        }
    }
    Ok(())
}

fn validate_item_payload(
    name: Option<&str>,
    price_small: Option<i64>,
    price_medium: Option<i64>,
    price_large: Option<i64>,
    details: Option<&ItemDetails>,
) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if let Some(name) = name {
        if name.trim().is_empty() {
            errors.push("name", "name is required");
        }
    }
    if price_small.is_some_and(|p| p < 0) {
        errors.push("price_small", "price_small must not be negative");
    }
    if price_medium.is_some_and(|p| p < 0) {
        errors.push("price_medium", "price_medium must not be negative");
    }
    if price_large.is_some_and(|p| p < 0) {
        errors.push("price_large", "price_large must not be negative");
    }
    if let Some(ItemDetails::Drinks { volume_ml, .. }) = details {
        if *volume_ml <= 0 {
            errors.push("details.volume_ml", "volume_ml must be positive");
        }
    }
    errors.into_result()
}

fn missing_specialization(item_id: Uuid) -> AppError {
    AppError::Internal(anyhow::anyhow!(
        "item {item_id} has no specialization row for its category"
    ))
}

fn item_from_entity(model: ItemModel, details: ItemDetails) -> AppResult<Item> {
    let category = Category::parse(&model.category)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown category in items row")))?;
    Ok(Item {
        id: model.id,
        name: model.name,
        description: model.description,
        category,
        price_small: model.price_small,
        price_medium: model.price_medium,
        price_large: model.price_large,
        image: model.image,
        available: model.available,
        featured: model.featured,
        estimated_time: model.estimated_time,
        details,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_prices_are_rejected_per_field() {
        let details = ItemDetails::Pizzas {
            ingredients: String::new(),
        };
        let result =
            validate_item_payload(Some("Margherita"), Some(-1), Some(-2), None, Some(&details));
        match result {
            Err(AppError::Validation(fields)) => {
                assert!(fields.0.contains_key("price_small"));
                assert!(fields.0.contains_key("price_medium"));
                assert!(!fields.0.contains_key("price_large"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn drink_volume_must_be_positive() {
        let details = ItemDetails::Drinks {
            drink_type: "soda".into(),
            volume_ml: 0,
        };
        assert!(
            validate_item_payload(Some("Cola"), Some(500), None, None, Some(&details)).is_err()
        );
    }
}
