use sha2::{Digest, Sha256};
use sqlx::{FromRow, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems},
    error::{AppError, AppResult},
    middleware::session::AuthUser,
    models::{Order, OrderItem},
    payment::{Charge, PaymentError},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

#[derive(Debug, FromRow)]
struct CartRow {
    cart_id: Uuid,
    item_id: Uuid,
    quantity: i32,
    title: String,
    description: String,
    image: Option<String>,
    price: i64,
}

/// Convert the caller's cart into a paid order.
///
/// Ordering contract: nothing is persisted and the cart is untouched until
/// the gateway confirms the charge; once it has, every store failure is
/// reported as `Inconsistent` carrying the charge id so the charge can be
/// reconciled.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let mut txn = state.pool.begin().await?;

    // Serialize checkouts per user: a concurrent second submit blocks here,
    // then finds the cart already empty.
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(checkout_lock_key(user.user_id()))
        .execute(&mut *txn)
        .await?;

    let rows = sqlx::query_as::<_, CartRow>(
        r#"
        SELECT ci.id AS cart_id, ci.item_id, ci.quantity,
               i.title, i.description, i.image, i.price
        FROM cart_items ci
        JOIN items i ON i.id = ci.item_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at
        "#,
    )
    .bind(user.user_id())
    .fetch_all(&mut *txn)
    .await?;

    if rows.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_string()));
    }

    // The amount is recomputed from server-held prices; whatever the client
    // believes the total is never reaches the gateway.
    let amount = cart_amount(&rows);
    let key = idempotency_key(user.user_id(), &payload.payment_token, &rows);

    let charge = state
        .gateway
        .charge(amount, &payload.payment_token, &key)
        .await
        .map_err(|err| match err {
            PaymentError::Declined(reason) => AppError::PaymentFailed(reason),
            PaymentError::Ambiguous(reason) => AppError::PaymentPending(reason),
        })?;

    let charge_id = charge.id.clone();
    let result = persist_order(txn, user.user_id(), &charge, &rows).await;
    let (order, items) = match result {
        Ok(persisted) => persisted,
        Err(err) => {
            tracing::error!(error = %err, charge_id = %charge_id, "failed to persist order after charge");
            return Err(AppError::Inconsistent { charge_id });
        }
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id()),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "charge": order.charge })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

/// Order row, snapshot lines and cart clearing commit as one transaction.
async fn persist_order(
    mut txn: Transaction<'_, Postgres>,
    user_id: Uuid,
    charge: &Charge,
    rows: &[CartRow],
) -> Result<(Order, Vec<OrderItem>), sqlx::Error> {
    let order: Order = sqlx::query_as(
        r#"
        INSERT INTO orders (id, user_id, total, charge)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    // The gateway-settled amount is the source of truth for the total.
    .bind(charge.amount)
    .bind(charge.id.as_str())
    .fetch_one(&mut *txn)
    .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let item: OrderItem = sqlx::query_as(
            r#"
            INSERT INTO order_items (id, order_id, title, description, image, price, quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order.id)
        .bind(row.title.as_str())
        .bind(row.description.as_str())
        .bind(row.image.as_deref())
        .bind(row.price)
        .bind(row.quantity)
        .fetch_one(&mut *txn)
        .await?;
        items.push(item);
    }

    // Delete exactly the rows that were charged, not whatever the cart
    // holds by now.
    let charged_ids: Vec<Uuid> = rows.iter().map(|row| row.cart_id).collect();
    sqlx::query("DELETE FROM cart_items WHERE id = ANY($1)")
        .bind(&charged_ids)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;
    Ok((order, items))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = pagination.normalize();

    let items = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(user.user_id())
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user.user_id())
        .fetch_one(&state.pool)
        .await?;

    let meta = Meta::paginated(page, limit, total.0);
    Ok(ApiResponse::success("OK", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order: Option<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user.user_id())
            .fetch_optional(&state.pool)
            .await?;

    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound("order not found".to_string())),
    };

    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at",
    )
    .bind(order.id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

fn cart_amount(rows: &[CartRow]) -> i64 {
    rows.iter()
        .map(|row| row.price * i64::from(row.quantity))
        .sum()
}

/// Stable per-(user, payment source, cart contents) key so a retried
/// submit of the same cart maps to one logical charge at the gateway,
/// while a retry with a different card is a distinct request.
fn idempotency_key(user_id: Uuid, source: &str, rows: &[CartRow]) -> String {
    let mut lines: Vec<(Uuid, i32, i64)> = rows
        .iter()
        .map(|row| (row.item_id, row.quantity, row.price))
        .collect();
    lines.sort();

    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(source.as_bytes());
    for (item_id, quantity, price) in lines {
        hasher.update(item_id.as_bytes());
        hasher.update(quantity.to_le_bytes());
        hasher.update(price.to_le_bytes());
    }
    hex::encode(hasher.finalize())
}

fn checkout_lock_key(user_id: Uuid) -> i64 {
    user_id.as_u128() as i64
}
