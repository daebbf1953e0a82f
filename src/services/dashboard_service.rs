use crate::{
    analytics::{Breakdown, OrderStats},
    dto::dashboard::{DashboardScope, DashboardView},
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Purchase figures for a signed-in user, catalog figures otherwise.
pub async fn dashboard(
    state: &AppState,
    user: Option<&AuthUser>,
) -> AppResult<ApiResponse<DashboardView>> {
    let view = match user {
        Some(user) => {
            let orders = state.gateway.list_orders(user.user_id).await?;
            DashboardView {
                scope: DashboardScope::Personal,
                stats: OrderStats::from_orders(orders.iter().map(|o| &o.order)),
                breakdown: Breakdown::from_purchases(&orders),
            }
        }
        None => {
            let products = state.gateway.list_products().await?;
            DashboardView {
                scope: DashboardScope::Catalog,
                stats: OrderStats::default(),
                breakdown: Breakdown::from_catalog(&products),
            }
        }
    };

    Ok(ApiResponse::success("Dashboard", view, Some(Meta::empty())))
}
