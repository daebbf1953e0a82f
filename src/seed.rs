use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::models::Product;

struct Listing {
    name: &'static str,
    brand: &'static str,
    category: &'static str,
    condition: &'static str,
    storage: Option<&'static str>,
    price: i64,
    original_price: Option<i64>,
    stock_count: i32,
    description: &'static str,
}

const LISTINGS: &[Listing] = &[
    Listing {
        name: "iPhone 13 128GB Midnight",
        brand: "Apple",
        category: "Smartphones",
        condition: "Excellent",
        storage: Some("128GB"),
        price: 52900,
        original_price: Some(72900),
        stock_count: 8,
        description: "Battery health above 90%, no visible marks.",
    },
    Listing {
        name: "iPhone 12 64GB Blue",
        brand: "Apple",
        category: "Smartphones",
        condition: "Good",
        storage: Some("64GB"),
        price: 36900,
        original_price: Some(62900),
        stock_count: 5,
        description: "Light scratches on the frame.",
    },
    Listing {
        name: "Galaxy S22 256GB Phantom Black",
        brand: "Samsung",
        category: "Smartphones",
        condition: "Excellent",
        storage: Some("256GB"),
        price: 44900,
        original_price: Some(84900),
        stock_count: 4,
        description: "Screen and body in excellent shape.",
    },
    Listing {
        name: "Galaxy A53 128GB",
        brand: "Samsung",
        category: "Smartphones",
        condition: "Fair",
        storage: Some("128GB"),
        price: 17900,
        original_price: Some(39900),
        stock_count: 12,
        description: "Noticeable wear, fully functional.",
    },
    Listing {
        name: "Pixel 7 128GB Snow",
        brand: "Google",
        category: "Smartphones",
        condition: "Good",
        storage: Some("128GB"),
        price: 32900,
        original_price: Some(59900),
        stock_count: 0,
        description: "Minor wear on the back glass.",
    },
    Listing {
        name: "iPad Air 5th Gen 64GB",
        brand: "Apple",
        category: "Tablets",
        condition: "Excellent",
        storage: Some("64GB"),
        price: 47900,
        original_price: Some(64900),
        stock_count: 3,
        description: "Wi-Fi model, includes charger.",
    },
    Listing {
        name: "Galaxy Tab S8 128GB",
        brand: "Samsung",
        category: "Tablets",
        condition: "Good",
        storage: Some("128GB"),
        price: 41900,
        original_price: Some(69900),
        stock_count: 6,
        description: "S Pen included.",
    },
    Listing {
        name: "Apple Watch Series 7 45mm",
        brand: "Apple",
        category: "Wearables",
        condition: "Good",
        storage: None,
        price: 21900,
        original_price: Some(42900),
        stock_count: 7,
        description: "GPS model with sport band.",
    },
];

/// A small refurbished-device catalog for local runs.
pub fn demo_products() -> Vec<Product> {
    let base = Utc::now();
    LISTINGS
        .iter()
        .enumerate()
        .map(|(i, l)| Product {
            id: Uuid::new_v4(),
            name: l.name.to_string(),
            brand: l.brand.to_string(),
            category: l.category.to_string(),
            condition: l.condition.to_string(),
            storage: l.storage.map(str::to_string),
            price: l.price,
            original_price: l.original_price,
            image_url: None,
            description: Some(l.description.to_string()),
            in_stock: l.stock_count > 0,
            stock_count: l.stock_count,
            // Keeps the featured order stable once stored.
            created_at: base + Duration::seconds(i as i64),
        })
        .collect()
}
