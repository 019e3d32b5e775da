use axum_pizzeria_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        items::CreateItemRequest,
        orders::{OrderLineRequest, PlaceOrderRequest, UpdateOrderStatusRequest},
    },
    entity::users::ActiveModel as UserActive,
    error::AppError,
    middleware::auth::AuthUser,
    models::{ItemDetails, Size},
    routes::params::ReportQuery,
    services::{item_service, order_service, report_service},
    state::AppState,
};
use chrono::{Days, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

// Reporting flow: orders placed today and in the previous week feed the
// aggregation endpoints; cancelled orders count nowhere.
#[tokio::test]
async fn sales_reports_flow() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let customer_id = create_user(&state, "customer", "customer@example.com").await?;
    let admin_id = create_user(&state, "admin", "admin@example.com").await?;
    let auth_customer = AuthUser {
        user_id: customer_id,
        role: "customer".into(),
    };
    let auth_admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    let pizza = create_pizza(&state, &auth_admin, "Margherita", 2000, Some(3000)).await?;
    let drink = item_service::create_item(
        &state,
        &auth_admin,
        CreateItemRequest {
            name: "Guarana".into(),
            description: None,
            price_small: 1000,
            price_medium: None,
            price_large: None,
            image: None,
            available: None,
            featured: None,
            estimated_time: None,
            details: ItemDetails::Drinks {
                drink_type: "soda".into(),
                volume_ml: 350,
            },
        },
    )
    .await?
    .data
    .unwrap()
    .id;

    // Today: a 6000 pizza order and a 2000 drink order.
    place(&state, &auth_customer, pizza, Size::Medium, 2).await?;
    place(&state, &auth_customer, drink, Size::Small, 2).await?;

    // Today, cancelled: must not count anywhere.
    let cancelled = place(&state, &auth_customer, drink, Size::Small, 1).await?;
    order_service::update_order_status(
        &state,
        &auth_admin,
        cancelled,
        UpdateOrderStatusRequest {
            status: "cancelled".into(),
        },
    )
    .await?;

    // Previous week: a 1000 drink order, shifted back seven days.
    let prior = place(&state, &auth_customer, drink, Size::Small, 1).await?;
    shift_created_at(&state, prior, 7).await?;

    let today = Utc::now().date_naive();
    let week_range = ReportQuery {
        start_date: today - Days::new(6),
        end_date: today,
        limit: None,
    };

    // Stats: current week 8000/2 orders, previous week 1000/1 order.
    let stats = report_service::sales_stats(&state, &auth_admin, week_range)
        .await?
        .data
        .unwrap();
    assert_eq!(stats.current.total_sales, 8000);
    assert_eq!(stats.current.total_orders, 2);
    assert_eq!(stats.current.average_ticket, 4000.0);
    assert_eq!(stats.previous.total_sales, 1000);
    assert_eq!(stats.previous.total_orders, 1);
    assert_eq!(stats.sales_growth, 700.0);
    assert_eq!(stats.orders_growth, 100.0);
    assert_eq!(stats.average_ticket_growth, 300.0);

    // A range with no orders at all: zeros, no division faults.
    let empty = report_service::sales_stats(
        &state,
        &auth_admin,
        ReportQuery {
            start_date: today - Days::new(60),
            end_date: today - Days::new(50),
            limit: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(empty.current.total_orders, 0);
    assert_eq!(empty.current.average_ticket, 0.0);
    assert_eq!(empty.sales_growth, 0.0);

    // Most sold today: pizza and drink tie on quantity (2 each); the pizza
    // wins on value.
    let most_sold = report_service::most_sold_item(
        &state,
        &auth_admin,
        ReportQuery {
            start_date: today,
            end_date: today,
            limit: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(most_sold.item_id, pizza);
    assert_eq!(most_sold.total_quantity, 2);
    assert_eq!(most_sold.total_value, 6000);

    // Full tie (quantity and value): the lower item id wins. Staged on its
    // own day so today's orders stay out of the way.
    let twin_a = create_pizza(&state, &auth_admin, "Twin A", 500, None).await?;
    let twin_b = create_pizza(&state, &auth_admin, "Twin B", 500, None).await?;
    let tie_one = place(&state, &auth_customer, twin_a, Size::Small, 1).await?;
    let tie_two = place(&state, &auth_customer, twin_b, Size::Small, 1).await?;
    shift_created_at(&state, tie_one, 20).await?;
    shift_created_at(&state, tie_two, 20).await?;

    let tie_day = today - Days::new(20);
    let tie_winner = report_service::most_sold_item(
        &state,
        &auth_admin,
        ReportQuery {
            start_date: tie_day,
            end_date: tie_day,
            limit: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(tie_winner.item_id, twin_a.min(twin_b));

    // By day: within the week only today has orders; no zero-filled buckets.
    let by_day = report_service::sales_by_day(
        &state,
        &auth_admin,
        ReportQuery {
            start_date: today - Days::new(6),
            end_date: today,
            limit: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(by_day.items.len(), 1);
    assert_eq!(by_day.items[0].day, today);
    assert_eq!(by_day.items[0].total_sales, 8000);
    assert_eq!(by_day.items[0].total_orders, 2);

    // By hour: buckets cover today's two orders.
    let by_hour = report_service::sales_by_hour(
        &state,
        &auth_admin,
        ReportQuery {
            start_date: today,
            end_date: today,
            limit: None,
        },
    )
    .await?
    .data
    .unwrap();
    let hour_sales: i64 = by_hour.items.iter().map(|b| b.total_sales).sum();
    let hour_orders: i64 = by_hour.items.iter().map(|b| b.total_orders).sum();
    assert_eq!(hour_sales, 8000);
    assert_eq!(hour_orders, 2);

    // By product, descending value: pizza before drink.
    let by_product = report_service::sales_by_product(
        &state,
        &auth_admin,
        ReportQuery {
            start_date: today,
            end_date: today,
            limit: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(by_product.items.len(), 2);
    assert_eq!(by_product.items[0].item_id, pizza);
    assert_eq!(by_product.items[0].total_value, 6000);
    assert_eq!(by_product.items[1].item_id, drink);
    assert_eq!(by_product.items[1].total_value, 2000);

    // By category, descending value.
    let by_category = report_service::sales_by_category(
        &state,
        &auth_admin,
        ReportQuery {
            start_date: today,
            end_date: today,
            limit: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(by_category.items[0].category, "pizzas");
    assert_eq!(by_category.items[0].total_value, 6000);
    assert_eq!(by_category.items[1].category, "drinks");
    assert_eq!(by_category.items[1].total_value, 2000);

    // Reports are admin only.
    let denied = report_service::sales_stats(
        &state,
        &auth_customer,
        ReportQuery {
            start_date: today,
            end_date: today,
            limit: None,
        },
    )
    .await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    // Inverted ranges are a validation error.
    let inverted = report_service::sales_by_day(
        &state,
        &auth_admin,
        ReportQuery {
            start_date: today,
            end_date: today - Days::new(1),
            limit: None,
        },
    )
    .await;
    assert!(matches!(inverted, Err(AppError::Validation(_))));

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE item_orders, orders, pizzas, drinks, desserts, items, ingredients, audit_logs, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState {
        pool,
        orm,
        jwt_secret: "test-secret".into(),
    })
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set("Test User".into()),
        email: Set(email.to_string()),
        phone: Set("11999990000".into()),
        address: Set(None),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

async fn create_pizza(
    state: &AppState,
    admin: &AuthUser,
    name: &str,
    small: i64,
    medium: Option<i64>,
) -> anyhow::Result<Uuid> {
    let item = item_service::create_item(
        state,
        admin,
        CreateItemRequest {
            name: name.into(),
            description: None,
            price_small: small,
            price_medium: medium,
            price_large: None,
            image: None,
            available: None,
            featured: None,
            estimated_time: None,
            details: ItemDetails::Pizzas {
                ingredients: "tomato sauce, mozzarella".into(),
            },
        },
    )
    .await?
    .data
    .unwrap();
    Ok(item.id)
}

async fn place(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    size: Size,
    quantity: i32,
) -> anyhow::Result<Uuid> {
    let placed = order_service::place_order(
        state,
        user,
        PlaceOrderRequest {
            items: vec![OrderLineRequest {
                item_id,
                size,
                quantity,
                special_instructions: None,
            }],
            delivery_address: None,
            contact_phone: "11988887777".into(),
            notes: None,
            delivery_time: None,
            payment_method: "cash".into(),
        },
    )
    .await?
    .data
    .unwrap();
    Ok(placed.order.id)
}

/// Backdate an order (and its lines) by whole days to stage history.
async fn shift_created_at(state: &AppState, order_id: Uuid, days: i64) -> anyhow::Result<()> {
    sqlx::query("UPDATE orders SET created_at = created_at - make_interval(days => $1) WHERE id = $2")
        .bind(days as i32)
        .bind(order_id)
        .execute(&state.pool)
        .await?;
    sqlx::query(
        "UPDATE item_orders SET created_at = created_at - make_interval(days => $1) WHERE order_id = $2",
    )
    .bind(days as i32)
    .bind(order_id)
    .execute(&state.pool)
    .await?;
    Ok(())
}
