use axum::{Json, Router, extract::State, routing::post};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    dto::auth::{RequestResetRequest, ResetPasswordRequest, SigninRequest, SignupRequest},
    error::AppResult,
    middleware::session::{clear_session_cookie, session_cookie},
    models::User,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/request-reset", post(request_reset))
        .route("/reset-password", post(reset_password))
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Create account and start a session", body = ApiResponse<User>),
        (status = 400, description = "Email already taken")
    ),
    tag = "Auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SignupRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<User>>)> {
    let (user, token) = auth_service::signup(&state, payload).await?;
    let jar = jar.add(session_cookie(token));
    Ok((jar, Json(ApiResponse::success("User created", user, None))))
}

#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Start a session", body = ApiResponse<User>),
        (status = 401, description = "Invalid password"),
        (status = 404, description = "No user for that email")
    ),
    tag = "Auth"
)]
pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SigninRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<User>>)> {
    let (user, token) = auth_service::signin(&state, payload).await?;
    let jar = jar.add(session_cookie(token));
    Ok((jar, Json(ApiResponse::success("Signed in", user, None))))
}

#[utoipa::path(
    post,
    path = "/api/auth/signout",
    responses(
        (status = 200, description = "Session cookie cleared", body = ApiResponse<serde_json::Value>)
    ),
    tag = "Auth"
)]
pub async fn signout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<serde_json::Value>>) {
    let jar = jar.remove(clear_session_cookie());
    (
        jar,
        Json(ApiResponse::acknowledge("Goodbye!")),
    )
}

#[utoipa::path(
    post,
    path = "/api/auth/request-reset",
    request_body = RequestResetRequest,
    responses(
        (status = 200, description = "Reset mail requested", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "No user for that email")
    ),
    tag = "Auth"
)]
pub async fn request_reset(
    State(state): State<AppState>,
    Json(payload): Json<RequestResetRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    auth_service::request_reset(&state, payload).await?;
    Ok(Json(ApiResponse::acknowledge("Thanks!")))
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset, new session started", body = ApiResponse<User>),
        (status = 400, description = "Password mismatch or invalid/expired token")
    ),
    tag = "Auth"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<User>>)> {
    let (user, token) = auth_service::reset_password(&state, payload).await?;
    let jar = jar.add(session_cookie(token));
    Ok((jar, Json(ApiResponse::success("Password reset", user, None))))
}
