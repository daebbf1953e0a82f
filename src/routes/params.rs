use serde::Deserialize;
use utoipa::IntoParams;

use crate::catalog::{CatalogFilter, SortKey};

/// Catalog query string. Multi-valued facets are comma separated, e.g.
/// `?brand=Apple,Samsung&condition=Excellent&sort=price-low`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogParams {
    /// Comma separated brands
    pub brand: Option<String>,
    /// Comma separated conditions
    pub condition: Option<String>,
    /// Comma separated categories
    pub category: Option<String>,
    /// Only show products that are in stock
    pub in_stock: Option<bool>,
    /// featured, price-low, price-high, name-asc or name-desc
    #[param(value_type = Option<String>)]
    pub sort: Option<SortKey>,
}

impl CatalogParams {
    pub fn into_filter(self) -> CatalogFilter {
        CatalogFilter {
            brands: split_list(self.brand),
            conditions: split_list(self.condition),
            categories: split_list(self.category),
            in_stock_only: self.in_stock.unwrap_or(false),
            sort: self.sort.unwrap_or_default(),
        }
    }
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_lists_become_facet_selections() {
        let params = CatalogParams {
            brand: Some("Apple, Samsung,,".into()),
            condition: None,
            category: Some("Tablets".into()),
            in_stock: Some(true),
            sort: Some(SortKey::NameDesc),
        };
        let filter = params.into_filter();
        assert_eq!(filter.brands, ["Apple", "Samsung"]);
        assert!(filter.conditions.is_empty());
        assert_eq!(filter.categories, ["Tablets"]);
        assert!(filter.in_stock_only);
        assert_eq!(filter.sort, SortKey::NameDesc);
    }

    #[test]
    fn missing_params_mean_no_restriction() {
        let filter = CatalogParams::default().into_filter();
        assert_eq!(filter, CatalogFilter::default());
    }
}
