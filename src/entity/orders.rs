use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub total_amount: i64,
    pub delivery_address: Option<String>,
    pub contact_phone: String,
    pub notes: Option<String>,
    pub delivery_time: Option<DateTimeWithTimeZone>,
    pub payment_method: String,
    pub payment_status: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::item_orders::Entity")]
    ItemOrders,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::item_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
