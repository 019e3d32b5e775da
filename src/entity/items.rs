use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price_small: i64,
    pub price_medium: Option<i64>,
    pub price_large: Option<i64>,
    pub image: Option<String>,
    pub available: bool,
    pub featured: bool,
    pub estimated_time: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::pizzas::Entity")]
    Pizzas,
    #[sea_orm(has_one = "super::drinks::Entity")]
    Drinks,
    #[sea_orm(has_one = "super::desserts::Entity")]
    Desserts,
    #[sea_orm(has_many = "super::item_orders::Entity")]
    ItemOrders,
}

impl Related<super::pizzas::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pizzas.def()
    }
}

impl Related<super::drinks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Drinks.def()
    }
}

impl Related<super::desserts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Desserts.def()
    }
}

impl Related<super::item_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
