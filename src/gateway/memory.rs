use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use super::{
    AuditEvent, CheckoutUnit, GatewayError, GatewayResult, NewOrder, NewOrderLine, StoreGateway,
};
use crate::models::{
    CartLine, CartLineDetail, Order, OrderLine, OrderLineDetail, OrderWithLines, Product,
    ProductSummary,
};

/// Operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    ReadCatalog,
    ReadCart,
    WriteCart,
    ReadOrders,
    CreateOrder,
    CreateOrderLines,
    ClearCart,
    Commit,
    Audit,
}

#[derive(Default)]
struct MemoryStore {
    products: Vec<Product>,
    cart: Vec<CartLine>,
    orders: Vec<Order>,
    order_lines: Vec<OrderLine>,
    audit: Vec<AuditEvent>,
    failing: HashSet<FailPoint>,
}

impl MemoryStore {
    fn check(&self, point: FailPoint) -> GatewayResult<()> {
        if self.failing.contains(&point) {
            return Err(GatewayError::Unavailable(format!("{point:?} disabled")));
        }
        Ok(())
    }

    fn ensure_token_free(&self, user_id: Uuid, token: Uuid) -> GatewayResult<()> {
        let taken = self
            .orders
            .iter()
            .any(|o| o.user_id == user_id && o.checkout_token == Some(token));
        if taken {
            return Err(GatewayError::Conflict("checkout token already used".into()));
        }
        Ok(())
    }

    fn with_lines(&self, order: &Order) -> OrderWithLines {
        let items = self
            .order_lines
            .iter()
            .filter(|l| l.order_id == order.id)
            .map(|line| OrderLineDetail {
                line: line.clone(),
                product: self
                    .products
                    .iter()
                    .find(|p| p.id == line.product_id)
                    .map(ProductSummary::from),
            })
            .collect();
        OrderWithLines {
            order: order.clone(),
            items,
        }
    }
}

/// In-process store used by tests and `STORE_BACKEND=memory`.
#[derive(Clone, Default)]
pub struct MemoryGateway {
    inner: Arc<Mutex<MemoryStore>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        let gateway = Self::new();
        gateway.inner.lock().products = products;
        gateway
    }

    pub fn fail_on(&self, point: FailPoint) {
        self.inner.lock().failing.insert(point);
    }

    pub fn recover(&self, point: FailPoint) {
        self.inner.lock().failing.remove(&point);
    }

    pub fn audit_events(&self) -> Vec<AuditEvent> {
        self.inner.lock().audit.clone()
    }

    pub fn order_count(&self) -> usize {
        self.inner.lock().orders.len()
    }
}

#[async_trait]
impl StoreGateway for MemoryGateway {
    async fn list_products(&self) -> GatewayResult<Vec<Product>> {
        let store = self.inner.lock();
        store.check(FailPoint::ReadCatalog)?;
        Ok(store.products.clone())
    }

    async fn get_product(&self, id: Uuid) -> GatewayResult<Option<Product>> {
        let store = self.inner.lock();
        store.check(FailPoint::ReadCatalog)?;
        Ok(store.products.iter().find(|p| p.id == id).cloned())
    }

    async fn list_cart_lines(&self, user_id: Uuid) -> GatewayResult<Vec<CartLineDetail>> {
        let store = self.inner.lock();
        store.check(FailPoint::ReadCart)?;
        let lines = store
            .cart
            .iter()
            .filter(|l| l.user_id == user_id)
            .filter_map(|line| {
                let product = store.products.iter().find(|p| p.id == line.product_id)?;
                Some(CartLineDetail {
                    id: line.id,
                    quantity: line.quantity,
                    product: product.clone(),
                })
            })
            .collect();
        Ok(lines)
    }

    async fn find_cart_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> GatewayResult<Option<CartLine>> {
        let store = self.inner.lock();
        store.check(FailPoint::ReadCart)?;
        Ok(store
            .cart
            .iter()
            .find(|l| l.user_id == user_id && l.product_id == product_id)
            .cloned())
    }

    async fn get_cart_line(&self, user_id: Uuid, id: Uuid) -> GatewayResult<Option<CartLine>> {
        let store = self.inner.lock();
        store.check(FailPoint::ReadCart)?;
        Ok(store
            .cart
            .iter()
            .find(|l| l.user_id == user_id && l.id == id)
            .cloned())
    }

    async fn insert_cart_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> GatewayResult<CartLine> {
        let mut store = self.inner.lock();
        store.check(FailPoint::WriteCart)?;
        if store
            .cart
            .iter()
            .any(|l| l.user_id == user_id && l.product_id == product_id)
        {
            return Err(GatewayError::Conflict(
                "cart line already exists for product".into(),
            ));
        }
        let line = CartLine {
            id: Uuid::new_v4(),
            user_id,
            product_id,
            quantity,
            created_at: Utc::now(),
        };
        store.cart.push(line.clone());
        Ok(line)
    }

    async fn update_cart_line(
        &self,
        user_id: Uuid,
        id: Uuid,
        quantity: i32,
    ) -> GatewayResult<Option<CartLine>> {
        let mut store = self.inner.lock();
        store.check(FailPoint::WriteCart)?;
        Ok(store
            .cart
            .iter_mut()
            .find(|l| l.user_id == user_id && l.id == id)
            .map(|line| {
                line.quantity = quantity;
                line.clone()
            }))
    }

    async fn delete_cart_line(&self, user_id: Uuid, id: Uuid) -> GatewayResult<bool> {
        let mut store = self.inner.lock();
        store.check(FailPoint::WriteCart)?;
        let before = store.cart.len();
        store.cart.retain(|l| !(l.user_id == user_id && l.id == id));
        Ok(store.cart.len() != before)
    }

    async fn find_order_by_token(
        &self,
        user_id: Uuid,
        token: Uuid,
    ) -> GatewayResult<Option<Order>> {
        let store = self.inner.lock();
        store.check(FailPoint::ReadOrders)?;
        Ok(store
            .orders
            .iter()
            .find(|o| o.user_id == user_id && o.checkout_token == Some(token))
            .cloned())
    }

    async fn begin_checkout(&self) -> GatewayResult<Box<dyn CheckoutUnit>> {
        Ok(Box::new(MemoryCheckout {
            store: Arc::clone(&self.inner),
            order: None,
            lines: Vec::new(),
            clear_user: None,
        }))
    }

    async fn list_orders(&self, user_id: Uuid) -> GatewayResult<Vec<OrderWithLines>> {
        let store = self.inner.lock();
        store.check(FailPoint::ReadOrders)?;
        // Reverse first so equal timestamps still list the latest insert first.
        let mut orders: Vec<&Order> = store
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders.into_iter().map(|o| store.with_lines(o)).collect())
    }

    async fn get_order(&self, user_id: Uuid, id: Uuid) -> GatewayResult<Option<OrderWithLines>> {
        let store = self.inner.lock();
        store.check(FailPoint::ReadOrders)?;
        Ok(store
            .orders
            .iter()
            .find(|o| o.user_id == user_id && o.id == id)
            .map(|o| store.with_lines(o)))
    }

    async fn record_audit(&self, event: AuditEvent) -> GatewayResult<()> {
        let mut store = self.inner.lock();
        store.check(FailPoint::Audit)?;
        store.audit.push(event);
        Ok(())
    }
}

struct MemoryCheckout {
    store: Arc<Mutex<MemoryStore>>,
    order: Option<Order>,
    lines: Vec<OrderLine>,
    clear_user: Option<Uuid>,
}

#[async_trait]
impl CheckoutUnit for MemoryCheckout {
    async fn insert_order(&mut self, order: NewOrder) -> GatewayResult<Order> {
        let store = self.store.lock();
        store.check(FailPoint::CreateOrder)?;
        if let Some(token) = order.checkout_token {
            store.ensure_token_free(order.user_id, token)?;
        }
        let created = Order {
            id: Uuid::new_v4(),
            user_id: order.user_id,
            total_amount: order.total_amount,
            status: order.status,
            checkout_token: order.checkout_token,
            created_at: Utc::now(),
        };
        self.order = Some(created.clone());
        Ok(created)
    }

    async fn insert_order_lines(&mut self, lines: Vec<NewOrderLine>) -> GatewayResult<Vec<OrderLine>> {
        self.store.lock().check(FailPoint::CreateOrderLines)?;
        let now = Utc::now();
        let created: Vec<OrderLine> = lines
            .into_iter()
            .map(|l| OrderLine {
                id: Uuid::new_v4(),
                order_id: l.order_id,
                product_id: l.product_id,
                quantity: l.quantity,
                price: l.price,
                created_at: now,
            })
            .collect();
        self.lines.extend(created.iter().cloned());
        Ok(created)
    }

    async fn delete_cart_lines(&mut self, user_id: Uuid) -> GatewayResult<u64> {
        let store = self.store.lock();
        store.check(FailPoint::ClearCart)?;
        self.clear_user = Some(user_id);
        Ok(store.cart.iter().filter(|l| l.user_id == user_id).count() as u64)
    }

    async fn commit(self: Box<Self>) -> GatewayResult<()> {
        let MemoryCheckout {
            store,
            order,
            lines,
            clear_user,
        } = *self;
        let mut store = store.lock();
        store.check(FailPoint::Commit)?;
        if let Some(order) = order {
            // Another unit may have committed the same token since insert_order.
            if let Some(token) = order.checkout_token {
                store.ensure_token_free(order.user_id, token)?;
            }
            store.orders.push(order);
        }
        store.order_lines.extend(lines);
        if let Some(user_id) = clear_user {
            store.cart.retain(|l| l.user_id != user_id);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> GatewayResult<()> {
        Ok(())
    }
}
