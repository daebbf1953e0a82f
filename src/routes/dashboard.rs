use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::dashboard::DashboardView,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::dashboard_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Order stats and brand/category breakdowns", body = ApiResponse<DashboardView>),
        (status = 401, description = "Invalid session token"),
    ),
    security((), ("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: Option<AuthUser>,
) -> AppResult<Json<ApiResponse<DashboardView>>> {
    let resp = dashboard_service::dashboard(&state, user.as_ref()).await?;
    Ok(Json(resp))
}
