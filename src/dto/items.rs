use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Item, ItemDetails};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateItemRequest {
    pub name: String,
    pub description: Option<String>,
    pub price_small: i64,
    pub price_medium: Option<i64>,
    pub price_large: Option<i64>,
    pub image: Option<String>,
    pub available: Option<bool>,
    pub featured: Option<bool>,
    pub estimated_time: Option<i32>,
    /// Carries the category tag; the specialization row is created from it.
    pub details: ItemDetails,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_small: Option<i64>,
    pub price_medium: Option<i64>,
    pub price_large: Option<i64>,
    pub image: Option<String>,
    pub available: Option<bool>,
    pub featured: Option<bool>,
    pub estimated_time: Option<i32>,
    pub details: Option<ItemDetails>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemList {
    pub items: Vec<Item>,
}
