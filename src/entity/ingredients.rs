use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    #[sea_orm(unique)]
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
    pub last_purchase_date: Option<Date>,
    pub unit_of_measure: String,
    pub expiry_date: Date,
    pub image: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
