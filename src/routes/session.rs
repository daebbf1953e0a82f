use axum::{Json, Router, routing::get};

use crate::{
    dto::session::SessionView, error::AppResult, middleware::auth::AuthUser,
    response::ApiResponse, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(current_session))
}

#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "The user the bearer token belongs to, if any", body = ApiResponse<SessionView>),
        (status = 401, description = "Invalid session token"),
    ),
    security((), ("bearer_auth" = [])),
    tag = "Session"
)]
pub async fn current_session(
    user: Option<AuthUser>,
) -> AppResult<Json<ApiResponse<SessionView>>> {
    let message = if user.is_some() { "Signed in" } else { "Anonymous" };
    Ok(Json(ApiResponse::success(message, SessionView::from(user), None)))
}
