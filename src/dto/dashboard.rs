use serde::Serialize;
use utoipa::ToSchema;

use crate::analytics::{Breakdown, OrderStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DashboardScope {
    /// Figures for the signed-in user's purchases.
    Personal,
    /// Catalog-wide figures for anonymous visitors.
    Catalog,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardView {
    pub scope: DashboardScope,
    pub stats: OrderStats,
    pub breakdown: Breakdown,
}
