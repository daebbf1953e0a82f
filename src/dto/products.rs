use serde::Serialize;
use utoipa::ToSchema;

use crate::{catalog::Facets, models::Product};

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogPage {
    pub items: Vec<Product>,
    /// Options drawn from the whole catalog, not just `items`.
    pub facets: Facets,
    pub active_filters: usize,
}
