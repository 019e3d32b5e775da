pub mod audit_logs;
pub mod desserts;
pub mod drinks;
pub mod ingredients;
pub mod item_orders;
pub mod items;
pub mod orders;
pub mod pizzas;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use desserts::Entity as Desserts;
pub use drinks::Entity as Drinks;
pub use ingredients::Entity as Ingredients;
pub use item_orders::Entity as ItemOrders;
pub use items::Entity as Items;
pub use orders::Entity as Orders;
pub use pizzas::Entity as Pizzas;
pub use users::Entity as Users;
