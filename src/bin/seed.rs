use argon2::{
    Argon2, PasswordHasher,
    password_hash::{rand_core::OsRng, SaltString},
};
use axum_pizzeria_api::{
    config::AppConfig,
    db::create_pool,
};
use chrono::{Days, Utc};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "Admin", "admin@example.com", "admin123", "admin").await?;
    let customer_id =
        ensure_user(&pool, "Cliente", "cliente@example.com", "cliente123", "customer").await?;
    seed_menu(&pool).await?;
    seed_ingredients(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, phone, password_hash, role)
        VALUES ($1, $2, $3, '11999990000', $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

enum Specialization<'a> {
    Pizza { ingredients: &'a str },
    Drink { drink_type: &'a str, volume_ml: i32 },
    Dessert { ingredients: &'a str },
}

async fn seed_menu(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let menu: Vec<(&str, &str, i64, Option<i64>, Option<i64>, Specialization)> = vec![
        (
            "Margherita",
            "Classic tomato, mozzarella and basil",
            3500,
            Some(4500),
            Some(5500),
            Specialization::Pizza {
                ingredients: "tomato sauce, mozzarella, basil",
            },
        ),
        (
            "Calabresa",
            "Calabrese sausage and onion",
            3800,
            Some(4800),
            Some(5800),
            Specialization::Pizza {
                ingredients: "tomato sauce, calabrese, onion, olives",
            },
        ),
        (
            "Guarana",
            "Soft drink can",
            600,
            None,
            None,
            Specialization::Drink {
                drink_type: "soda",
                volume_ml: 350,
            },
        ),
        (
            "Pudim",
            "Milk caramel pudding slice",
            1200,
            None,
            None,
            Specialization::Dessert {
                ingredients: "condensed milk, eggs, caramel",
            },
        ),
    ];

    for (name, description, small, medium, large, specialization) in menu {
        let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM items WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;
        if existing.is_some() {
            continue;
        }

        let category = match specialization {
            Specialization::Pizza { .. } => "pizzas",
            Specialization::Drink { .. } => "drinks",
            Specialization::Dessert { .. } => "desserts",
        };

        let item_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO items (id, name, description, category, price_small, price_medium, price_large)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item_id)
        .bind(name)
        .bind(description)
        .bind(category)
        .bind(small)
        .bind(medium)
        .bind(large)
        .execute(pool)
        .await?;

        match specialization {
            Specialization::Pizza { ingredients } => {
                sqlx::query("INSERT INTO pizzas (id, item_id, ingredients) VALUES ($1, $2, $3)")
                    .bind(Uuid::new_v4())
                    .bind(item_id)
                    .bind(ingredients)
                    .execute(pool)
                    .await?;
            }
            Specialization::Drink {
                drink_type,
                volume_ml,
            } => {
                sqlx::query(
                    "INSERT INTO drinks (id, item_id, drink_type, volume_ml) VALUES ($1, $2, $3, $4)",
                )
                .bind(Uuid::new_v4())
                .bind(item_id)
                .bind(drink_type)
                .bind(volume_ml)
                .execute(pool)
                .await?;
            }
            Specialization::Dessert { ingredients } => {
                sqlx::query("INSERT INTO desserts (id, item_id, ingredients) VALUES ($1, $2, $3)")
                    .bind(Uuid::new_v4())
                    .bind(item_id)
                    .bind(ingredients)
                    .execute(pool)
                    .await?;
            }
        }
    }

    println!("Seeded menu");
    Ok(())
}

async fn seed_ingredients(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let ingredients: Vec<(&str, &str, &str, i64, f64, f64, &str, u64)> = vec![
        ("MUS-01", "Mozzarella", "dairy", 3200, 18.0, 5.0, "kg", 20),
        ("TOM-01", "Tomato sauce", "sauces", 900, 30.0, 10.0, "l", 60),
        ("CAL-01", "Calabrese", "meats", 2800, 4.0, 6.0, "kg", 10),
        ("MAN-01", "Basil", "produce", 400, 0.0, 1.0, "kg", 3),
    ];

    for (code, name, category, price, stock, minimum, unit, expiry_days) in ingredients {
        let expiry = today
            .checked_add_days(Days::new(expiry_days))
            .unwrap_or(today);
        sqlx::query(
            r#"
            INSERT INTO ingredients
                (id, code, name, category, purchase_price, sale_price,
                 stock_quantity, minimum_stock, unit_of_measure, expiry_date)
            VALUES ($1, $2, $3, $4, $5, 0, $6, $7, $8, $9)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(code)
        .bind(name)
        .bind(category)
        .bind(price)
        .bind(stock)
        .bind(minimum)
        .bind(unit)
        .bind(expiry)
        .execute(pool)
        .await?;
    }

    println!("Seeded ingredients");
    Ok(())
}
