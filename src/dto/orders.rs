use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{ItemOrder, Order, Size};

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub item_id: Uuid,
    pub size: Size,
    pub quantity: i32,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub delivery_address: Option<String>,
    pub contact_phone: String,
    pub notes: Option<String>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub payment_method: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<ItemOrder>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemList {
    pub items: Vec<ItemOrder>,
}
