#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use refurb_storefront::{
    gateway::MemoryGateway,
    middleware::auth::{AuthUser, Claims},
    models::Product,
    state::{AppState, SessionKeys},
};
use uuid::Uuid;

pub const SECRET: &str = "test-secret";

pub fn product(name: &str, price: i64, stock_count: i32) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: name.into(),
        brand: "Apple".into(),
        category: "Smartphones".into(),
        condition: "Excellent".into(),
        storage: Some("128GB".into()),
        price,
        original_price: None,
        image_url: None,
        description: None,
        in_stock: stock_count > 0,
        stock_count,
        created_at: Utc::now(),
    }
}

pub fn state_with(products: Vec<Product>) -> (AppState, MemoryGateway) {
    let gateway = MemoryGateway::with_products(products);
    let state = AppState::new(
        Arc::new(gateway.clone()),
        SessionKeys::hs256(SECRET, None),
    );
    (state, gateway)
}

pub fn user() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        email: Some("shopper@example.com".into()),
    }
}

pub fn token_for(user: &AuthUser) -> String {
    let claims = Claims {
        sub: user.user_id.to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        email: user.email.clone(),
        aud: Some("authenticated".into()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("sign token")
}
