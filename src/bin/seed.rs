use axum_storefront_api::{
    config::AppConfig, db::create_pool, models::Permission, services::auth_service,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(
        &pool,
        "admin@example.com",
        "admin123",
        &[Permission::User, Permission::Admin],
    )
    .await?;
    let user_id = ensure_user(&pool, "user@example.com", "user123", &[Permission::User]).await?;
    seed_items(&pool, admin_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    permissions: &[Permission],
) -> anyhow::Result<Uuid> {
    let password_hash =
        auth_service::hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, name, password_hash, permissions)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET permissions = EXCLUDED.permissions
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(email.split('@').next().unwrap_or(email))
    .bind(password_hash)
    .bind(permissions.to_vec())
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (permissions={permissions:?})");
    Ok(user_id)
}

async fn seed_items(pool: &sqlx::PgPool, owner_id: Uuid) -> anyhow::Result<()> {
    let items = vec![
        ("Axum Hoodie", "Warm hoodie for Rustaceans", 55000),
        ("Ferris Mug", "Coffee tastes better with Ferris", 12000),
        ("Rust Sticker Pack", "Decorate your laptop", 5000),
        ("E-book: Async Rust", "Learn async Rust patterns", 25000),
    ];

    for (title, description, price) in items {
        sqlx::query(
            r#"
            INSERT INTO items (id, title, description, price, user_id)
            SELECT $1, $2, $3, $4, $5
            WHERE NOT EXISTS (SELECT 1 FROM items WHERE title = $2)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(owner_id)
        .execute(pool)
        .await?;
    }

    println!("Seeded items");
    Ok(())
}
