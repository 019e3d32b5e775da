use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Pizzas,
    Drinks,
    Desserts,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pizzas => "pizzas",
            Category::Drinks => "drinks",
            Category::Desserts => "desserts",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pizzas" => Some(Category::Pizzas),
            "drinks" => Some(Category::Drinks),
            "desserts" => Some(Category::Desserts),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Size {
    Small,
    Medium,
    Large,
}

impl Size {
    pub fn as_str(&self) -> &'static str {
        match self {
            Size::Small => "small",
            Size::Medium => "medium",
            Size::Large => "large",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "small" => Some(Size::Small),
            "medium" => Some(Size::Medium),
            "large" => Some(Size::Large),
            _ => None,
        }
    }
}

/// Category-specific payload of an item. The `category` tag is derived from
/// the variant, so an item can never claim one category while carrying
/// another's payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ItemDetails {
    Pizzas { ingredients: String },
    Drinks { drink_type: String, volume_ml: i32 },
    Desserts { ingredients: String },
}

impl ItemDetails {
    pub fn category(&self) -> Category {
        match self {
            ItemDetails::Pizzas { .. } => Category::Pizzas,
            ItemDetails::Drinks { .. } => Category::Drinks,
            ItemDetails::Desserts { .. } => Category::Desserts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
    /// Prices are integer cents. Medium/large stay `None` for categories
    /// without size tiers.
    pub price_small: i64,
    pub price_medium: Option<i64>,
    pub price_large: Option<i64>,
    pub image: Option<String>,
    pub available: bool,
    pub featured: bool,
    pub estimated_time: Option<i32>,
    pub details: ItemDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Price of the item for the given size tier, if that tier is configured.
    pub fn price_for(&self, size: Size) -> Option<i64> {
        match size {
            Size::Small => Some(self.price_small),
            Size::Medium => self.price_medium,
            Size::Large => self.price_large,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Ingredient {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub purchase_price: i64,
    pub sale_price: i64,
    pub stock_quantity: f64,
    pub minimum_stock: f64,
    pub supplier: Option<String>,
    pub location: Option<String>,
    pub last_purchase_date: Option<NaiveDate>,
    pub unit_of_measure: String,
    pub expiry_date: NaiveDate,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derived stock/expiry flags. Independent predicates, not an enum: an
/// ingredient can be low on stock and close to expiry at the same time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct IngredientStatus {
    pub is_out_of_stock: bool,
    pub is_low_stock: bool,
    pub is_near_expiration: bool,
    pub is_expired: bool,
}

/// Days ahead, inclusive, within which an ingredient counts as near expiry.
pub const NEAR_EXPIRATION_DAYS: u64 = 7;

impl Ingredient {
    /// Evaluate the derived flags against the given date. Never persisted;
    /// recomputed on every read.
    pub fn status(&self, today: NaiveDate) -> IngredientStatus {
        let horizon = today
            .checked_add_days(Days::new(NEAR_EXPIRATION_DAYS))
            .unwrap_or(NaiveDate::MAX);
        IngredientStatus {
            is_out_of_stock: self.stock_quantity <= 0.0,
            is_low_stock: self.stock_quantity > 0.0 && self.stock_quantity < self.minimum_stock,
            is_near_expiration: self.expiry_date >= today && self.expiry_date <= horizon,
            is_expired: self.expiry_date < today,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub total_amount: i64,
    pub delivery_address: Option<String>,
    pub contact_phone: String,
    pub notes: Option<String>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub payment_method: String,
    pub payment_status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemOrder {
    pub id: Uuid,
    pub order_id: Uuid,
    pub item_id: Uuid,
    pub size: Size,
    pub quantity: i32,
    /// Snapshot of the item's price for `size` at order time.
    pub unit_price: i64,
    pub subtotal: i64,
    pub special_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item(medium: Option<i64>, large: Option<i64>) -> Item {
        Item {
            id: Uuid::new_v4(),
            name: "Margherita".into(),
            description: None,
            category: Category::Pizzas,
            price_small: 2500,
            price_medium: medium,
            price_large: large,
            image: None,
            available: true,
            featured: false,
            estimated_time: Some(20),
            details: ItemDetails::Pizzas {
                ingredients: "tomato, mozzarella, basil".into(),
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_ingredient(quantity: f64, minimum: f64, expiry: NaiveDate) -> Ingredient {
        Ingredient {
            id: Uuid::new_v4(),
            code: "ING-001".into(),
            name: "Mozzarella".into(),
            description: None,
            category: "dairy".into(),
            purchase_price: 1500,
            sale_price: 0,
            stock_quantity: quantity,
            minimum_stock: minimum,
            supplier: None,
            location: None,
            last_purchase_date: None,
            unit_of_measure: "kg".into(),
            expiry_date: expiry,
            image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn price_for_selects_the_matching_tier() {
        let item = sample_item(Some(3000), Some(3500));
        assert_eq!(item.price_for(Size::Small), Some(2500));
        assert_eq!(item.price_for(Size::Medium), Some(3000));
        assert_eq!(item.price_for(Size::Large), Some(3500));
    }

    #[test]
    fn price_for_is_none_for_unconfigured_tiers() {
        let item = sample_item(None, None);
        assert_eq!(item.price_for(Size::Small), Some(2500));
        assert_eq!(item.price_for(Size::Medium), None);
        assert_eq!(item.price_for(Size::Large), None);
    }

    #[test]
    fn details_variant_fixes_the_category() {
        let drink = ItemDetails::Drinks {
            drink_type: "soda".into(),
            volume_ml: 350,
        };
        assert_eq!(drink.category(), Category::Drinks);
        assert_eq!(
            ItemDetails::Desserts {
                ingredients: "chocolate".into()
            }
            .category(),
            Category::Desserts
        );
    }

    #[test]
    fn low_stock_and_near_expiration_combine() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        let ingredient = sample_ingredient(5.0, 10.0, today + Days::new(3));
        let status = ingredient.status(today);
        assert!(status.is_low_stock);
        assert!(!status.is_out_of_stock);
        assert!(status.is_near_expiration);
        assert!(!status.is_expired);
    }

    #[test]
    fn out_of_stock_and_low_stock_are_exclusive() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        for quantity in [-2.0, 0.0, 3.0, 10.0, 50.0] {
            let status = sample_ingredient(quantity, 10.0, today).status(today);
            assert!(
                !(status.is_out_of_stock && status.is_low_stock),
                "quantity {quantity} flagged both out-of-stock and low-stock"
            );
        }
    }

    #[test]
    fn expiry_window_is_seven_days_inclusive() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        let at_horizon = sample_ingredient(1.0, 0.5, today + Days::new(7)).status(today);
        assert!(at_horizon.is_near_expiration);
        let beyond = sample_ingredient(1.0, 0.5, today + Days::new(8)).status(today);
        assert!(!beyond.is_near_expiration);
        let on_day = sample_ingredient(1.0, 0.5, today).status(today);
        assert!(on_day.is_near_expiration);
        assert!(!on_day.is_expired);
        let past = sample_ingredient(1.0, 0.5, today - Days::new(1)).status(today);
        assert!(past.is_expired);
        assert!(!past.is_near_expiration);
    }
}
