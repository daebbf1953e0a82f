//! The storage contract the storefront runs against.
//!
//! The managed backend owns every table; the service only talks to it through
//! [`StoreGateway`]. Checkout writes go through a [`CheckoutUnit`] so the
//! order, its lines and the cart clear land together or not at all.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CartLine, CartLineDetail, Order, OrderLine, OrderStatus, OrderWithLines, Product};

pub mod memory;
pub mod postgres;

pub use memory::{FailPoint, MemoryGateway};
pub use postgres::PgGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("database error: {0}")]
    Orm(#[from] sea_orm::DbErr),

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("conflicting write: {0}")]
    Conflict(String),

    #[error("invalid stored value: {0}")]
    Decode(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub checkout_token: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub order_id: Uuid,
    pub product_id: Uuid,
    /// Index of the line within its order, following cart order.
    pub position: i32,
    pub quantity: i32,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    pub user_id: Option<Uuid>,
    pub action: String,
    pub resource: Option<String>,
    pub metadata: Option<Value>,
}

#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Full catalog in its featured order.
    async fn list_products(&self) -> GatewayResult<Vec<Product>>;

    async fn get_product(&self, id: Uuid) -> GatewayResult<Option<Product>>;

    async fn list_cart_lines(&self, user_id: Uuid) -> GatewayResult<Vec<CartLineDetail>>;

    async fn find_cart_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> GatewayResult<Option<CartLine>>;

    async fn get_cart_line(&self, user_id: Uuid, id: Uuid) -> GatewayResult<Option<CartLine>>;

    async fn insert_cart_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> GatewayResult<CartLine>;

    async fn update_cart_line(
        &self,
        user_id: Uuid,
        id: Uuid,
        quantity: i32,
    ) -> GatewayResult<Option<CartLine>>;

    /// Returns whether a line was actually removed.
    async fn delete_cart_line(&self, user_id: Uuid, id: Uuid) -> GatewayResult<bool>;

    async fn find_order_by_token(
        &self,
        user_id: Uuid,
        token: Uuid,
    ) -> GatewayResult<Option<Order>>;

    async fn begin_checkout(&self) -> GatewayResult<Box<dyn CheckoutUnit>>;

    /// Newest first.
    async fn list_orders(&self, user_id: Uuid) -> GatewayResult<Vec<OrderWithLines>>;

    async fn get_order(&self, user_id: Uuid, id: Uuid) -> GatewayResult<Option<OrderWithLines>>;

    async fn record_audit(&self, event: AuditEvent) -> GatewayResult<()>;
}

/// The checkout writes, staged until [`CheckoutUnit::commit`].
///
/// Dropping a unit without committing discards its writes.
#[async_trait]
pub trait CheckoutUnit: Send {
    async fn insert_order(&mut self, order: NewOrder) -> GatewayResult<Order>;

    async fn insert_order_lines(&mut self, lines: Vec<NewOrderLine>) -> GatewayResult<Vec<OrderLine>>;

    /// Returns the number of cart lines removed.
    async fn delete_cart_lines(&mut self, user_id: Uuid) -> GatewayResult<u64>;

    async fn commit(self: Box<Self>) -> GatewayResult<()>;

    async fn rollback(self: Box<Self>) -> GatewayResult<()>;
}
