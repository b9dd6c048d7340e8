use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::users::{UpdatePermissionsRequest, UserList},
    error::AppResult,
    middleware::session::{AuthUser, MaybeUser},
    models::User,
    response::ApiResponse,
    routes::params::Pagination,
    services::user_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/{id}/permissions", put(update_permissions))
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user, or null when anonymous", body = ApiResponse<User>)
    ),
    tag = "Users"
)]
pub async fn me(user: MaybeUser) -> Json<ApiResponse<User>> {
    // An absent or invalid token is not an error here; the data is just null.
    match user.0 {
        Some(user) => Json(ApiResponse::success("OK", user, None)),
        None => Json(ApiResponse::acknowledge("OK")),
    }
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List users", body = ApiResponse<UserList>),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Requires ADMIN or PERMISSIONUPDATE")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = user_service::list_users(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/permissions",
    params(
        ("id" = Uuid, Path, description = "Target user ID")
    ),
    request_body = UpdatePermissionsRequest,
    responses(
        (status = 200, description = "Permission set replaced", body = ApiResponse<User>),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Requires ADMIN or PERMISSIONUPDATE"),
        (status = 404, description = "Target user not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_permissions(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePermissionsRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::update_permissions(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
