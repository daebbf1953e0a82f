//! Catalog filtering, sorting and facet extraction.
//!
//! Everything here is pure: callers pass the full product list on every
//! request and get a fresh result back.

use std::{cmp::Ordering, collections::HashSet};

use serde::{Deserialize, Serialize};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};
use utoipa::ToSchema;

use crate::models::Product;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Keep the catalog order.
    #[default]
    Featured,
    PriceLow,
    PriceHigh,
    NameAsc,
    NameDesc,
}

/// The shopper's current selections.
///
/// Values inside one dimension are alternatives; dimensions are combined
/// with AND. An empty dimension does not restrict anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub brands: Vec<String>,
    pub conditions: Vec<String>,
    pub categories: Vec<String>,
    pub in_stock_only: bool,
    pub sort: SortKey,
}

impl CatalogFilter {
    pub fn matches(&self, product: &Product) -> bool {
        (!self.in_stock_only || product.in_stock)
            && selected(&self.brands, &product.brand)
            && selected(&self.conditions, &product.condition)
            && selected(&self.categories, &product.category)
    }

    /// Number of selected facet values; the stock toggle is not counted.
    pub fn active_filter_count(&self) -> usize {
        self.brands.len() + self.conditions.len() + self.categories.len()
    }
}

fn selected(choices: &[String], value: &str) -> bool {
    choices.is_empty() || choices.iter().any(|c| c == value)
}

/// Apply `filter` to `products` and order the survivors by `filter.sort`.
pub fn filter_and_sort<'a>(products: &'a [Product], filter: &CatalogFilter) -> Vec<&'a Product> {
    let mut result: Vec<&Product> = products.iter().filter(|p| filter.matches(p)).collect();

    // `sort_by` is stable, so equal keys keep their catalog order.
    match filter.sort {
        SortKey::Featured => {}
        SortKey::PriceLow => result.sort_by(|a, b| a.price.cmp(&b.price)),
        SortKey::PriceHigh => result.sort_by(|a, b| b.price.cmp(&a.price)),
        SortKey::NameAsc => result.sort_by(|a, b| locale_cmp(&a.name, &b.name)),
        SortKey::NameDesc => result.sort_by(|a, b| locale_cmp(&b.name, &a.name)),
    }

    result
}

/// Distinct facet values of the unfiltered catalog, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct Facets {
    pub brands: Vec<String>,
    pub conditions: Vec<String>,
    pub categories: Vec<String>,
}

impl Facets {
    pub fn collect(products: &[Product]) -> Self {
        Self {
            brands: distinct(products.iter().map(|p| p.brand.as_str())),
            conditions: distinct(products.iter().map(|p| p.condition.as_str())),
            categories: distinct(products.iter().map(|p| p.category.as_str())),
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// Collation for product names. Letters compare by base letter first, so
/// accented names sit next to their unaccented neighbours. Remaining ties
/// are broken by accents (unaccented first), then by case (lower first).
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let base = |s: &str| -> Vec<char> {
        s.nfd()
            .filter(|c| !is_combining_mark(*c))
            .flat_map(char::to_lowercase)
            .collect()
    };
    let accented = |s: &str| -> Vec<char> { s.nfd().flat_map(char::to_lowercase).collect() };

    base(a)
        .cmp(&base(b))
        .then_with(|| accented(a).cmp(&accented(b)))
        .then_with(|| {
            a.chars()
                .zip(b.chars())
                .map(|(x, y)| x.is_uppercase().cmp(&y.is_uppercase()))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        })
}
