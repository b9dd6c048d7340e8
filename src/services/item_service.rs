use uuid::Uuid;

use crate::{
    audit::log_audit,
    authz,
    dto::items::{CreateItemRequest, ItemList},
    error::{AppError, AppResult},
    middleware::session::AuthUser,
    models::{Item, Permission},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn create_item(
    state: &AppState,
    user: &AuthUser,
    payload: CreateItemRequest,
) -> AppResult<ApiResponse<Item>> {
    if payload.price < 0 {
        return Err(AppError::BadRequest("price must not be negative".to_string()));
    }

    let item: Item = sqlx::query_as(
        r#"
        INSERT INTO items (id, title, description, image, price, user_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.title)
    .bind(payload.description)
    .bind(payload.image)
    .bind(payload.price)
    .bind(user.user_id())
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Item created", item, None))
}

pub async fn list_items(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<ItemList>> {
    let (page, limit, offset) = pagination.normalize();

    let items = sqlx::query_as::<_, Item>(
        "SELECT * FROM items ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM items")
        .fetch_one(&state.pool)
        .await?;

    let meta = Meta::paginated(page, limit, total.0);
    Ok(ApiResponse::success("OK", ItemList { items }, Some(meta)))
}

pub async fn get_item(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Item>> {
    let item: Option<Item> = sqlx::query_as("SELECT * FROM items WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;

    match item {
        Some(item) => Ok(ApiResponse::success("OK", item, None)),
        None => Err(AppError::NotFound("item not found".to_string())),
    }
}

pub async fn delete_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Item>> {
    let item: Option<Item> = sqlx::query_as("SELECT * FROM items WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;

    let item = match item {
        Some(item) => item,
        None => return Err(AppError::NotFound("item not found".to_string())),
    };

    authz::ensure_owner_or_permission(
        item.user_id,
        &user.user,
        &[Permission::Admin, Permission::ItemDelete],
    )?;

    sqlx::query("DELETE FROM items WHERE id = $1")
        .bind(item.id)
        .execute(&state.pool)
        .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id()),
        "item_delete",
        Some("items"),
        Some(serde_json::json!({ "item_id": item.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Item deleted", item, None))
}
