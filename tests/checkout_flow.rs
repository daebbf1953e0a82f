mod common;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use common::{SECRET, product, state_with, user};
use refurb_storefront::{
    checkout::CheckoutStep,
    dto::{cart::AddToCartRequest, orders::CheckoutRequest},
    error::AppError,
    gateway::{
        AuditEvent, CheckoutUnit, FailPoint, GatewayResult, MemoryGateway, NewOrder,
        StoreGateway,
    },
    middleware::auth::AuthUser,
    models::{CartLine, CartLineDetail, Order, OrderStatus, OrderWithLines, Product},
    services::{cart_service, dashboard_service, order_service},
    state::{AppState, SessionKeys},
};
use uuid::Uuid;

async fn fill_cart(
    state: &AppState,
    shopper: &AuthUser,
    picks: &[(&Product, i32)],
) -> anyhow::Result<()> {
    for (product, quantity) in picks {
        for _ in 0..*quantity {
            cart_service::add_to_cart(state, shopper, AddToCartRequest { product_id: product.id })
                .await?;
        }
    }
    Ok(())
}

fn two_products() -> (Product, Product) {
    (product("iPhone SE", 10, 5), product("Pixel 4a", 5, 5))
}

#[tokio::test]
async fn checkout_snapshots_the_cart_into_a_pending_order() -> anyhow::Result<()> {
    let (a, b) = two_products();
    let (state, gateway) = state_with(vec![a.clone(), b.clone()]);
    let shopper = user();
    fill_cart(&state, &shopper, &[(&a, 2), (&b, 1)]).await?;

    let placed = order_service::checkout(&state, &shopper, CheckoutRequest::default())
        .await?
        .data
        .unwrap();

    assert_eq!(placed.order.total_amount, 25);
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.user_id, shopper.user_id);
    assert_eq!(placed.items.len(), 2);
    let first = placed
        .items
        .iter()
        .find(|l| l.line.product_id == a.id)
        .unwrap();
    assert_eq!((first.line.quantity, first.line.price), (2, 10));
    assert_eq!(first.product.as_ref().unwrap().name, "iPhone SE");

    assert!(gateway.list_cart_lines(shopper.user_id).await?.is_empty());
    let stored = order_service::get_order(&state, &shopper, placed.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(stored.items.len(), 2);
    assert!(
        gateway
            .audit_events()
            .iter()
            .any(|e| e.action == "checkout")
    );
    Ok(())
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let (state, gateway) = state_with(vec![]);
    let err = order_service::checkout(&state, &user(), CheckoutRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(gateway.order_count(), 0);
}

#[tokio::test]
async fn order_insert_failure_is_a_persistence_error() -> anyhow::Result<()> {
    let (a, b) = two_products();
    let (state, gateway) = state_with(vec![a.clone(), b.clone()]);
    let shopper = user();
    fill_cart(&state, &shopper, &[(&a, 1)]).await?;
    gateway.fail_on(FailPoint::CreateOrder);

    let err = order_service::checkout(&state, &shopper, CheckoutRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Persistence(_)));
    assert_eq!(gateway.order_count(), 0);
    assert_eq!(gateway.list_cart_lines(shopper.user_id).await?.len(), 1);
    Ok(())
}

async fn assert_rolls_back(point: FailPoint, expected: CheckoutStep) -> anyhow::Result<()> {
    let (a, b) = two_products();
    let (state, gateway) = state_with(vec![a.clone(), b.clone()]);
    let shopper = user();
    fill_cart(&state, &shopper, &[(&a, 2), (&b, 1)]).await?;
    gateway.fail_on(point);

    let err = order_service::checkout(&state, &shopper, CheckoutRequest::default())
        .await
        .unwrap_err();
    match err {
        AppError::CheckoutFailed { step, .. } => assert_eq!(step, expected),
        other => panic!("expected checkout failure, got {other:?}"),
    }

    assert_eq!(gateway.order_count(), 0);
    assert!(gateway.list_orders(shopper.user_id).await?.is_empty());
    let cart = gateway.list_cart_lines(shopper.user_id).await?;
    assert_eq!(cart.len(), 2);
    assert_eq!(cart.iter().map(|l| l.quantity).sum::<i32>(), 3);
    Ok(())
}

#[tokio::test]
async fn failing_order_lines_leaves_no_order_behind() -> anyhow::Result<()> {
    assert_rolls_back(FailPoint::CreateOrderLines, CheckoutStep::CreateOrderLines).await
}

#[tokio::test]
async fn failing_cart_clear_leaves_no_order_behind() -> anyhow::Result<()> {
    assert_rolls_back(FailPoint::ClearCart, CheckoutStep::ClearCart).await
}

#[tokio::test]
async fn failing_commit_leaves_no_order_behind() -> anyhow::Result<()> {
    assert_rolls_back(FailPoint::Commit, CheckoutStep::Commit).await
}

#[tokio::test]
async fn checkout_can_be_retried_after_a_failure() -> anyhow::Result<()> {
    let (a, b) = two_products();
    let (state, gateway) = state_with(vec![a.clone(), b.clone()]);
    let shopper = user();
    fill_cart(&state, &shopper, &[(&a, 1), (&b, 1)]).await?;

    gateway.fail_on(FailPoint::ClearCart);
    assert!(
        order_service::checkout(&state, &shopper, CheckoutRequest::default())
            .await
            .is_err()
    );
    gateway.recover(FailPoint::ClearCart);

    let placed = order_service::checkout(&state, &shopper, CheckoutRequest::default())
        .await?
        .data
        .unwrap();
    assert_eq!(placed.order.total_amount, 15);
    assert_eq!(gateway.order_count(), 1);
    Ok(())
}

#[tokio::test]
async fn replaying_a_checkout_token_returns_the_first_order() -> anyhow::Result<()> {
    let (a, b) = two_products();
    let (state, gateway) = state_with(vec![a.clone(), b.clone()]);
    let shopper = user();
    fill_cart(&state, &shopper, &[(&a, 1)]).await?;
    let token = Uuid::new_v4();
    let request = || CheckoutRequest {
        checkout_token: Some(token),
    };

    let first = order_service::checkout(&state, &shopper, request())
        .await?
        .data
        .unwrap();
    // The cart is empty now; a replay must not fail on that.
    let second = order_service::checkout(&state, &shopper, request())
        .await?
        .data
        .unwrap();

    assert_eq!(first.order.id, second.order.id);
    assert_eq!(second.order.checkout_token, Some(token));
    assert_eq!(second.items.len(), 1);
    assert_eq!(gateway.order_count(), 1);
    Ok(())
}

#[tokio::test]
async fn history_is_newest_first_and_feeds_the_dashboard() -> anyhow::Result<()> {
    let phone = Product {
        brand: "Samsung".into(),
        category: "Smartphones".into(),
        ..product("Galaxy S21", 300, 10)
    };
    let tablet = Product {
        brand: "Apple".into(),
        category: "Tablets".into(),
        ..product("iPad 9", 200, 10)
    };
    let (state, _) = state_with(vec![phone.clone(), tablet.clone()]);
    let shopper = user();

    fill_cart(&state, &shopper, &[(&phone, 1)]).await?;
    let older = order_service::checkout(&state, &shopper, CheckoutRequest::default())
        .await?
        .data
        .unwrap();
    fill_cart(&state, &shopper, &[(&phone, 1), (&tablet, 2)]).await?;
    let newer = order_service::checkout(&state, &shopper, CheckoutRequest::default())
        .await?
        .data
        .unwrap();

    let history = order_service::list_orders(&state, &shopper)
        .await?
        .data
        .unwrap()
        .items;
    let ids: Vec<Uuid> = history.iter().map(|o| o.order.id).collect();
    assert_eq!(ids, vec![newer.order.id, older.order.id]);

    let view = dashboard_service::dashboard(&state, Some(&shopper))
        .await?
        .data
        .unwrap();
    assert_eq!(view.stats.total_orders, 2);
    assert_eq!(view.stats.total_spent, 300 + 300 + 400);
    assert_eq!(view.stats.pending_orders, 2);
    let samsung = view
        .breakdown
        .brands
        .iter()
        .find(|f| f.name == "Samsung")
        .unwrap();
    assert_eq!(samsung.value, 2);
    let tablets = view
        .breakdown
        .categories
        .iter()
        .find(|f| f.name == "Tablets")
        .unwrap();
    assert_eq!(tablets.value, 1);
    Ok(())
}

#[tokio::test]
async fn orders_are_private_to_their_owner() -> anyhow::Result<()> {
    let (a, b) = two_products();
    let (state, _) = state_with(vec![a.clone(), b.clone()]);
    let (alice, bob) = (user(), user());
    fill_cart(&state, &alice, &[(&a, 1)]).await?;
    let placed = order_service::checkout(&state, &alice, CheckoutRequest::default())
        .await?
        .data
        .unwrap();

    let err = order_service::get_order(&state, &bob, placed.order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    assert!(
        order_service::list_orders(&state, &bob)
            .await?
            .data
            .unwrap()
            .items
            .is_empty()
    );
    Ok(())
}

#[tokio::test]
async fn anonymous_dashboard_summarises_the_catalog() -> anyhow::Result<()> {
    let (state, _) = state_with(vec![
        product("iPhone 12", 1, 1),
        product("iPhone 13", 1, 1),
    ]);

    let view = dashboard_service::dashboard(&state, None).await?.data.unwrap();
    assert_eq!(view.stats.total_orders, 0);
    assert_eq!(view.breakdown.brands.len(), 1);
    assert_eq!(view.breakdown.brands[0].value, 2);
    Ok(())
}

/// Memory store whose first token lookup misses, as if a concurrent
/// checkout committed right after the lookup.
struct LateTokenLookup {
    inner: MemoryGateway,
    missed: AtomicBool,
}

#[async_trait]
impl StoreGateway for LateTokenLookup {
    async fn list_products(&self) -> GatewayResult<Vec<Product>> {
        self.inner.list_products().await
    }

    async fn get_product(&self, id: Uuid) -> GatewayResult<Option<Product>> {
        self.inner.get_product(id).await
    }

    async fn list_cart_lines(&self, user_id: Uuid) -> GatewayResult<Vec<CartLineDetail>> {
        self.inner.list_cart_lines(user_id).await
    }

    async fn find_cart_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> GatewayResult<Option<CartLine>> {
        self.inner.find_cart_line(user_id, product_id).await
    }

    async fn get_cart_line(&self, user_id: Uuid, id: Uuid) -> GatewayResult<Option<CartLine>> {
        self.inner.get_cart_line(user_id, id).await
    }

    async fn insert_cart_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> GatewayResult<CartLine> {
        self.inner.insert_cart_line(user_id, product_id, quantity).await
    }

    async fn update_cart_line(
        &self,
        user_id: Uuid,
        id: Uuid,
        quantity: i32,
    ) -> GatewayResult<Option<CartLine>> {
        self.inner.update_cart_line(user_id, id, quantity).await
    }

    async fn delete_cart_line(&self, user_id: Uuid, id: Uuid) -> GatewayResult<bool> {
        self.inner.delete_cart_line(user_id, id).await
    }

    async fn find_order_by_token(
        &self,
        user_id: Uuid,
        token: Uuid,
    ) -> GatewayResult<Option<Order>> {
        if !self.missed.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_order_by_token(user_id, token).await
    }

    async fn begin_checkout(&self) -> GatewayResult<Box<dyn CheckoutUnit>> {
        self.inner.begin_checkout().await
    }

    async fn list_orders(&self, user_id: Uuid) -> GatewayResult<Vec<OrderWithLines>> {
        self.inner.list_orders(user_id).await
    }

    async fn get_order(&self, user_id: Uuid, id: Uuid) -> GatewayResult<Option<OrderWithLines>> {
        self.inner.get_order(user_id, id).await
    }

    async fn record_audit(&self, event: AuditEvent) -> GatewayResult<()> {
        self.inner.record_audit(event).await
    }
}

#[tokio::test]
async fn losing_a_token_race_replays_the_winning_order() -> anyhow::Result<()> {
    let (a, _) = two_products();
    let inner = MemoryGateway::with_products(vec![a.clone()]);
    let state = AppState::new(
        Arc::new(LateTokenLookup {
            inner: inner.clone(),
            missed: AtomicBool::new(false),
        }),
        SessionKeys::hs256(SECRET, None),
    );
    let shopper = user();
    let token = Uuid::new_v4();
    fill_cart(&state, &shopper, &[(&a, 1)]).await?;

    // The competing request commits its order first.
    let mut winner = inner.begin_checkout().await?;
    let won = winner
        .insert_order(NewOrder {
            user_id: shopper.user_id,
            total_amount: 10,
            status: OrderStatus::Pending,
            checkout_token: Some(token),
        })
        .await?;
    winner.commit().await?;

    let replayed = order_service::checkout(
        &state,
        &shopper,
        CheckoutRequest {
            checkout_token: Some(token),
        },
    )
    .await?
    .data
    .unwrap();

    assert_eq!(replayed.order.id, won.id);
    assert_eq!(inner.order_count(), 1);
    // The losing attempt rolled back, so its cart clear never landed.
    assert_eq!(inner.list_cart_lines(shopper.user_id).await?.len(), 1);
    Ok(())
}
