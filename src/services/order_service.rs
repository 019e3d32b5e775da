use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{
        OrderItemList, OrderList, OrderWithItems, PlaceOrderRequest, UpdateOrderStatusRequest,
    },
    entity::{
        item_orders::{
            ActiveModel as LineActive, Column as LineCol, Entity as ItemOrders,
            Model as LineModel,
        },
        items::Entity as Items,
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::{AuthUser, ensure_admin},
    models::{ItemOrder, Order, Size},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

pub const VALID_STATUSES: [&str; 5] =
    ["pending", "processing", "completed", "cancelled", "delivered"];

/// Statuses that accept no further transition.
pub const TERMINAL_STATUSES: [&str; 2] = ["cancelled", "delivered"];

pub const VALID_PAYMENT_METHODS: [&str; 4] = ["cash", "credit_card", "debit_card", "pix"];

pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    validate_order_payload(&payload)?;

    let txn = state.orm.begin().await?;

    // Resolve every line against the catalog inside the transaction; any
    // failure drops the transaction and nothing is written.
    let mut total_amount: i64 = 0;
    let mut resolved: Vec<(Uuid, Size, i32, i64, Option<String>)> =
        Vec::with_capacity(payload.items.len());

    for (index, line) in payload.items.iter().enumerate() {
        let item = Items::find_by_id(line.item_id).one(&txn).await?;
        let item = match item {
            Some(i) => i,
            None => {
                return Err(FieldErrors::single(
                    format!("items[{index}].item_id"),
                    "item does not exist",
                ));
            }
        };

        if !item.available {
            return Err(FieldErrors::single(
                format!("items[{index}].item_id"),
                "item is not available",
            ));
        }

        let unit_price = match price_for_size(&item, line.size) {
            Some(price) => price,
            None => {
                return Err(FieldErrors::single(
                    format!("items[{index}].size"),
                    format!("item has no {} price", line.size.as_str()),
                ));
            }
        };

        let subtotal = unit_price * line.quantity as i64;
        total_amount += subtotal;
        resolved.push((
            item.id,
            line.size,
            line.quantity,
            unit_price,
            line.special_instructions.clone(),
        ));
    }

    let order_id = Uuid::new_v4();
    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        status: Set("pending".into()),
        total_amount: Set(total_amount),
        delivery_address: Set(payload.delivery_address),
        contact_phone: Set(payload.contact_phone),
        notes: Set(payload.notes),
        delivery_time: Set(payload.delivery_time.map(Into::into)),
        payment_method: Set(payload.payment_method),
        payment_status: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut lines: Vec<ItemOrder> = Vec::with_capacity(resolved.len());
    for (item_id, size, quantity, unit_price, special_instructions) in resolved {
        let line = LineActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            item_id: Set(item_id),
            size: Set(size.as_str().to_string()),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            subtotal: Set(unit_price * quantity as i64),
            special_instructions: Set(special_instructions),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        lines.push(line_from_entity(line)?);
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_place",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order placed",
        OrderWithItems {
            order: order_from_entity(order),
            items: lines,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();

    // Customers see their own orders; admins see everyone's.
    let mut condition = Condition::all();
    if !user.is_admin() {
        condition = condition.add(OrderCol::UserId.eq(user.user_id));
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_visible_order(state, user, id).await?;

    let items = ItemOrders::find()
        .filter(LineCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(line_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_order_items(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<OrderItemList>> {
    let order = find_visible_order(state, user, order_id).await?;

    let items = ItemOrders::find()
        .filter(LineCol::OrderId.eq(order.id))
        .order_by_asc(LineCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(line_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "OK",
        OrderItemList { items },
        Some(Meta::empty()),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    validate_order_status(&payload.status)?;

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if TERMINAL_STATUSES.contains(&existing.status.as_str()) {
        return Err(FieldErrors::single(
            "status",
            format!("order is already {}", existing.status),
        ));
    }

    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub async fn mark_paid(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if existing.payment_status {
        return Err(AppError::BadRequest("Order already paid".into()));
    }

    let mut active: OrderActive = existing.into();
    active.payment_status = Set(true);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_paid",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment recorded",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

async fn find_visible_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<OrderModel> {
    let mut condition = Condition::all().add(OrderCol::Id.eq(id));
    if !user.is_admin() {
        condition = condition.add(OrderCol::UserId.eq(user.user_id));
    }

    let order = Orders::find().filter(condition).one(&state.orm).await?;
    match order {
        Some(o) => Ok(o),
        None => Err(AppError::NotFound),
    }
}

fn validate_order_payload(payload: &PlaceOrderRequest) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if payload.items.is_empty() {
        errors.push("items", "items must not be empty");
    }
    for (index, line) in payload.items.iter().enumerate() {
        if line.quantity < 1 {
            errors.push(
                format!("items[{index}].quantity"),
                "quantity must be at least 1",
            );
        }
    }
    if payload.contact_phone.trim().is_empty() {
        errors.push("contact_phone", "contact_phone is required");
    }
    if !VALID_PAYMENT_METHODS.contains(&payload.payment_method.as_str()) {
        errors.push(
            "payment_method",
            "payment_method must be one of cash, credit_card, debit_card, pix",
        );
    }
    errors.into_result()
}

fn validate_order_status(status: &str) -> Result<(), AppError> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(FieldErrors::single("status", "Invalid order status"))
    }
}

/// Size tier lookup against the raw items row; mirrors `Item::price_for`
/// without requiring the specialization payload.
fn price_for_size(item: &crate::entity::items::Model, size: Size) -> Option<i64> {
    match size {
        Size::Small => Some(item.price_small),
        Size::Medium => item.price_medium,
        Size::Large => item.price_large,
    }
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        status: model.status,
        total_amount: model.total_amount,
        delivery_address: model.delivery_address,
        contact_phone: model.contact_phone,
        notes: model.notes,
        delivery_time: model.delivery_time.map(|dt| dt.with_timezone(&Utc)),
        payment_method: model.payment_method,
        payment_status: model.payment_status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn line_from_entity(model: LineModel) -> AppResult<ItemOrder> {
    let size = Size::parse(&model.size)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown size in item_orders row")))?;
    Ok(ItemOrder {
        id: model.id,
        order_id: model.order_id,
        item_id: model.item_id,
        size,
        quantity: model.quantity,
        unit_price: model.unit_price,
        subtotal: model.subtotal,
        special_instructions: model.special_instructions,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::orders::OrderLineRequest;

    fn valid_request() -> PlaceOrderRequest {
        PlaceOrderRequest {
            items: vec![OrderLineRequest {
                item_id: Uuid::new_v4(),
                size: Size::Medium,
                quantity: 2,
                special_instructions: None,
            }],
            delivery_address: Some("Rua A, 123".into()),
            contact_phone: "11988887777".into(),
            notes: None,
            delivery_time: None,
            payment_method: "pix".into(),
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(validate_order_payload(&valid_request()).is_ok());
    }

    #[test]
    fn empty_lines_and_bad_method_are_flagged() {
        let mut request = valid_request();
        request.items.clear();
        request.payment_method = "check".into();
        match validate_order_payload(&request) {
            Err(AppError::Validation(fields)) => {
                assert!(fields.0.contains_key("items"));
                assert!(fields.0.contains_key("payment_method"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn zero_quantity_is_flagged_per_line() {
        let mut request = valid_request();
        request.items[0].quantity = 0;
        match validate_order_payload(&request) {
            Err(AppError::Validation(fields)) => {
                assert!(fields.0.contains_key("items[0].quantity"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn cancelled_and_delivered_are_terminal() {
        assert!(TERMINAL_STATUSES.contains(&"cancelled"));
        assert!(TERMINAL_STATUSES.contains(&"delivered"));
        assert!(!TERMINAL_STATUSES.contains(&"processing"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(validate_order_status("pending").is_ok());
        assert!(validate_order_status("shipped").is_err());
    }
}
