use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Order, OrderStatus, OrderWithLines, Product};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct OrderStats {
    pub total_orders: usize,
    pub total_spent: i64,
    pub pending_orders: usize,
}

impl OrderStats {
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        orders.into_iter().fold(Self::default(), |mut stats, order| {
            stats.total_orders += 1;
            stats.total_spent = stats.total_spent.saturating_add(order.total_amount);
            if order.status == OrderStatus::Pending {
                stats.pending_orders += 1;
            }
            stats
        })
    }
}

/// One bar (or pie slice) of a breakdown chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FacetCount {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct Breakdown {
    pub brands: Vec<FacetCount>,
    pub categories: Vec<FacetCount>,
}

impl Breakdown {
    /// Purchased order lines per brand and per category. Lines whose product
    /// no longer exists are skipped.
    pub fn from_purchases(orders: &[OrderWithLines]) -> Self {
        let summaries: Vec<_> = orders
            .iter()
            .flat_map(|o| o.items.iter())
            .filter_map(|line| line.product.as_ref())
            .collect();
        Self {
            brands: count_by(summaries.iter().map(|s| s.brand.as_str())),
            categories: count_by(summaries.iter().map(|s| s.category.as_str())),
        }
    }

    /// Catalog products per brand and per category.
    pub fn from_catalog(products: &[Product]) -> Self {
        Self {
            brands: count_by(products.iter().map(|p| p.brand.as_str())),
            categories: count_by(products.iter().map(|p| p.category.as_str())),
        }
    }
}

fn count_by<'a>(values: impl Iterator<Item = &'a str>) -> Vec<FacetCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<FacetCount> = Vec::new();
    for value in values {
        match index.get(value) {
            Some(&i) => counts[i].value += 1,
            None => {
                index.insert(value, counts.len());
                counts.push(FacetCount {
                    name: value.to_string(),
                    value: 1,
                });
            }
        }
    }
    counts
}
