use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{AuthResponse, LoginRequest, SignupRequest},
        ingredients::{CreateIngredientRequest, IngredientList, IngredientWithStatus, UpdateIngredientRequest},
        items::{CreateItemRequest, ItemList, UpdateItemRequest},
        orders::{OrderItemList, OrderLineRequest, OrderList, OrderWithItems, PlaceOrderRequest, UpdateOrderStatusRequest},
        reports,
    },
    models::{Category, Ingredient, IngredientStatus, Item, ItemDetails, ItemOrder, Order, Size, User},
    response::{ApiResponse, Meta},
    routes::{auth, health, ingredients as ingredient_routes, items as item_routes, orders, params, reports as report_routes},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::ping,
        auth::signup,
        auth::login,
        auth::logout,
        auth::current_user,
        item_routes::list_items,
        item_routes::get_item,
        item_routes::create_item,
        item_routes::update_item,
        item_routes::delete_item,
        ingredient_routes::list_ingredients,
        ingredient_routes::get_ingredient,
        ingredient_routes::create_ingredient,
        ingredient_routes::update_ingredient,
        ingredient_routes::delete_ingredient,
        orders::list_orders,
        orders::place_order,
        orders::get_order,
        orders::list_order_items,
        orders::update_order_status,
        orders::pay_order,
        report_routes::sales_stats,
        report_routes::most_sold_item,
        report_routes::sales_by_day,
        report_routes::sales_by_hour,
        report_routes::sales_by_product,
        report_routes::sales_by_category
    ),
    components(
        schemas(
            User,
            Category,
            Size,
            ItemDetails,
            Item,
            Ingredient,
            IngredientStatus,
            Order,
            ItemOrder,
            SignupRequest,
            LoginRequest,
            AuthResponse,
            CreateItemRequest,
            UpdateItemRequest,
            ItemList,
            CreateIngredientRequest,
            UpdateIngredientRequest,
            IngredientWithStatus,
            IngredientList,
            PlaceOrderRequest,
            OrderLineRequest,
            UpdateOrderStatusRequest,
            OrderWithItems,
            OrderList,
            OrderItemList,
            reports::SalesStats,
            reports::PeriodTotals,
            reports::MostSoldItem,
            reports::DaySales,
            reports::HourSales,
            reports::ProductSales,
            reports::CategorySales,
            reports::DaySalesList,
            reports::HourSalesList,
            reports::ProductSalesList,
            reports::CategorySalesList,
            params::Pagination,
            params::ItemQuery,
            params::IngredientQuery,
            params::OrderListQuery,
            params::ReportQuery,
            health::PingData,
            Meta,
            ApiResponse<Item>,
            ApiResponse<ItemList>,
            ApiResponse<IngredientList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<reports::SalesStats>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness endpoint"),
        (name = "Auth", description = "Signup, login and session endpoints"),
        (name = "Items", description = "Menu catalog endpoints"),
        (name = "Ingredients", description = "Inventory endpoints"),
        (name = "Orders", description = "Order placement and tracking endpoints"),
        (name = "Reports", description = "Sales reporting endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
