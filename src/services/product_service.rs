use uuid::Uuid;

use crate::{
    catalog::{CatalogFilter, Facets, filter_and_sort},
    dto::products::CatalogPage,
    error::{AppError, AppResult},
    models::Product,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    filter: CatalogFilter,
) -> AppResult<ApiResponse<CatalogPage>> {
    let products = state.gateway.list_products().await?;
    let facets = Facets::collect(&products);
    let items: Vec<Product> = filter_and_sort(&products, &filter)
        .into_iter()
        .cloned()
        .collect();

    tracing::debug!(
        catalog = products.len(),
        shown = items.len(),
        sort = ?filter.sort,
        "catalog filtered"
    );

    let meta = Meta::total(items.len() as i64);
    let data = CatalogPage {
        items,
        facets,
        active_filters: filter.active_filter_count(),
    };
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let result = state.gateway.get_product(id).await?;
    let result = match result {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", result, None))
}
