use uuid::Uuid;

use crate::{
    audit::log_audit,
    authz,
    dto::users::{UpdatePermissionsRequest, UserList},
    error::{AppError, AppResult},
    middleware::session::AuthUser,
    models::{Permission, User},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    caller: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    authz::ensure_permission(
        &caller.user.permissions,
        &[Permission::Admin, Permission::PermissionUpdate],
    )?;

    let (page, limit, offset) = pagination.normalize();

    let items = sqlx::query_as::<_, User>(
        "SELECT * FROM users ORDER BY created_at LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&state.pool)
        .await?;

    let meta = Meta::paginated(page, limit, total.0);
    Ok(ApiResponse::success("OK", UserList { items }, Some(meta)))
}

pub async fn update_permissions(
    state: &AppState,
    caller: &AuthUser,
    target_user_id: Uuid,
    payload: UpdatePermissionsRequest,
) -> AppResult<ApiResponse<User>> {
    authz::ensure_permission(
        &caller.user.permissions,
        &[Permission::Admin, Permission::PermissionUpdate],
    )?;

    // Wholesale overwrite, not a merge.
    let user: Option<User> = sqlx::query_as(
        "UPDATE users SET permissions = $1 WHERE id = $2 RETURNING *",
    )
    .bind(&payload.permissions)
    .bind(target_user_id)
    .fetch_optional(&state.pool)
    .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound("user not found".to_string())),
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(caller.user_id()),
        "permissions_update",
        Some("users"),
        Some(serde_json::json!({
            "target_user_id": target_user_id,
            "permissions": payload.permissions,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Permissions updated",
        user,
        Some(Meta::empty()),
    ))
}
