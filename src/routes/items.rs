use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::items::{CreateItemRequest, ItemList},
    error::AppResult,
    middleware::session::AuthUser,
    models::Item,
    response::ApiResponse,
    routes::params::Pagination,
    services::item_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/{id}", get(get_item).delete(delete_item))
}

#[utoipa::path(
    get,
    path = "/api/items",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List items", body = ApiResponse<ItemList>)
    ),
    tag = "Items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ItemList>>> {
    let resp = item_service::list_items(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/items",
    request_body = CreateItemRequest,
    responses(
        (status = 200, description = "Create an item owned by the caller", body = ApiResponse<Item>),
        (status = 401, description = "Not logged in")
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateItemRequest>,
) -> AppResult<Json<ApiResponse<Item>>> {
    let resp = item_service::create_item(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "OK", body = ApiResponse<Item>),
        (status = 404, description = "Item not found")
    ),
    tag = "Items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Item>>> {
    let resp = item_service::get_item(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item deleted", body = ApiResponse<Item>),
        (status = 403, description = "Caller neither owns the item nor holds ADMIN/ITEMDELETE"),
        (status = 404, description = "Item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Item>>> {
    let resp = item_service::delete_item(&state, &user, id).await?;
    Ok(Json(resp))
}
