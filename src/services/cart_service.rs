use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    authz,
    dto::cart::{AddToCartRequest, CartLine, CartList},
    error::{AppError, AppResult},
    middleware::session::AuthUser,
    models::{CartItem, Item, Permission},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(FromRow)]
struct CartWithItemRow {
    cart_id: Uuid,
    quantity: i32,
    item_id: Uuid,
    title: String,
    description: String,
    image: Option<String>,
    price: i64,
    item_user_id: Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let rows = sqlx::query_as::<_, CartWithItemRow>(
        r#"
        SELECT ci.id AS cart_id, ci.quantity,
               i.id AS item_id, i.title, i.description, i.image, i.price,
               i.user_id AS item_user_id, i.created_at
        FROM cart_items ci
        JOIN items i ON i.id = ci.item_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at
        "#,
    )
    .bind(user.user_id())
    .fetch_all(&state.pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|row| CartLine {
            id: row.cart_id,
            quantity: row.quantity,
            item: Item {
                id: row.item_id,
                title: row.title,
                description: row.description,
                image: row.image,
                price: row.price,
                user_id: row.item_user_id,
                created_at: row.created_at,
            },
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        CartList { items },
        Some(Meta::empty()),
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let item_exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM items WHERE id = $1")
        .bind(payload.item_id)
        .fetch_optional(&state.pool)
        .await?;
    if item_exist.is_none() {
        return Err(AppError::NotFound("item not found".to_string()));
    }

    // Upsert against the (user_id, item_id) unique constraint: concurrent
    // adds for the same pair increment one row instead of racing to insert
    // two.
    let cart_item: CartItem = sqlx::query_as(
        r#"
        INSERT INTO cart_items (id, user_id, item_id, quantity)
        VALUES ($1, $2, $3, 1)
        ON CONFLICT (user_id, item_id)
        DO UPDATE SET quantity = cart_items.quantity + 1
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id())
    .bind(payload.item_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("OK", cart_item, None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    cart_item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let cart_item: Option<CartItem> = sqlx::query_as("SELECT * FROM cart_items WHERE id = $1")
        .bind(cart_item_id)
        .fetch_optional(&state.pool)
        .await?;

    let cart_item = match cart_item {
        Some(item) => item,
        None => return Err(AppError::NotFound("cart item not found".to_string())),
    };

    authz::ensure_owner_or_permission(cart_item.user_id, &user.user, &[Permission::Admin])?;

    sqlx::query("DELETE FROM cart_items WHERE id = $1")
        .bind(cart_item.id)
        .execute(&state.pool)
        .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id()),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "cart_item_id": cart_item_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::acknowledge("Removed from cart"))
}
