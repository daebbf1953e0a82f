mod common;

use common::{product, state_with, user};
use refurb_storefront::{
    dto::cart::{AddToCartRequest, UpdateCartLineRequest},
    error::AppError,
    gateway::{FailPoint, StoreGateway},
    services::cart_service,
};
use uuid::Uuid;

#[tokio::test]
async fn adding_the_same_product_twice_increments_one_line() -> anyhow::Result<()> {
    let phone = product("iPhone 13", 52900, 5);
    let (state, gateway) = state_with(vec![phone.clone()]);
    let shopper = user();

    for _ in 0..2 {
        cart_service::add_to_cart(&state, &shopper, AddToCartRequest { product_id: phone.id })
            .await?;
    }

    let lines = gateway.list_cart_lines(shopper.user_id).await?;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 2);

    let cart = cart_service::list_cart(&state, &shopper).await?.data.unwrap();
    assert_eq!(cart.total_amount, 2 * 52900);
    assert_eq!(cart.item_count, 2);
    assert_eq!(cart.items[0].subtotal, 2 * 52900);
    Ok(())
}

#[tokio::test]
async fn carts_are_scoped_to_their_owner() -> anyhow::Result<()> {
    let phone = product("Pixel 7", 32900, 5);
    let (state, gateway) = state_with(vec![phone.clone()]);
    let (alice, bob) = (user(), user());

    cart_service::add_to_cart(&state, &alice, AddToCartRequest { product_id: phone.id }).await?;
    cart_service::add_to_cart(&state, &bob, AddToCartRequest { product_id: phone.id }).await?;

    assert_eq!(gateway.list_cart_lines(alice.user_id).await?[0].quantity, 1);
    assert_eq!(gateway.list_cart_lines(bob.user_id).await?[0].quantity, 1);

    let alice_line = gateway.list_cart_lines(alice.user_id).await?[0].id;
    let resp = cart_service::remove_line(&state, &bob, alice_line).await?;
    assert!(!resp.data.unwrap().removed);
    assert_eq!(gateway.list_cart_lines(alice.user_id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn adding_stops_at_the_stock_ceiling() -> anyhow::Result<()> {
    let tablet = product("iPad Air", 47900, 2);
    let (state, gateway) = state_with(vec![tablet.clone()]);
    let shopper = user();
    let add = || AddToCartRequest { product_id: tablet.id };

    cart_service::add_to_cart(&state, &shopper, add()).await?;
    cart_service::add_to_cart(&state, &shopper, add()).await?;
    let err = cart_service::add_to_cart(&state, &shopper, add())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert_eq!(gateway.list_cart_lines(shopper.user_id).await?[0].quantity, 2);
    Ok(())
}

#[tokio::test]
async fn out_of_stock_and_unknown_products_are_rejected() {
    let sold_out = product("Pixel 6", 19900, 0);
    let (state, _) = state_with(vec![sold_out.clone()]);
    let shopper = user();

    let err = cart_service::add_to_cart(&state, &shopper, AddToCartRequest { product_id: sold_out.id })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = cart_service::add_to_cart(
        &state,
        &shopper,
        AddToCartRequest { product_id: Uuid::new_v4() },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn quantities_below_one_leave_the_line_untouched() -> anyhow::Result<()> {
    let phone = product("Galaxy S22", 44900, 4);
    let (state, gateway) = state_with(vec![phone.clone()]);
    let shopper = user();
    let line = cart_service::add_to_cart(&state, &shopper, AddToCartRequest { product_id: phone.id })
        .await?
        .data
        .unwrap();

    for quantity in [0, -1] {
        let err = cart_service::update_quantity(
            &state,
            &shopper,
            line.id,
            UpdateCartLineRequest { quantity },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    let stored = gateway.get_cart_line(shopper.user_id, line.id).await?.unwrap();
    assert_eq!(stored.quantity, 1);
    Ok(())
}

#[tokio::test]
async fn update_respects_stock_and_existence() -> anyhow::Result<()> {
    let phone = product("Galaxy S22", 44900, 4);
    let (state, gateway) = state_with(vec![phone.clone()]);
    let shopper = user();
    let line = cart_service::add_to_cart(&state, &shopper, AddToCartRequest { product_id: phone.id })
        .await?
        .data
        .unwrap();

    let updated = cart_service::update_quantity(
        &state,
        &shopper,
        line.id,
        UpdateCartLineRequest { quantity: 4 },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.quantity, 4);

    let err = cart_service::update_quantity(
        &state,
        &shopper,
        line.id,
        UpdateCartLineRequest { quantity: 5 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(
        gateway.get_cart_line(shopper.user_id, line.id).await?.unwrap().quantity,
        4
    );

    let err = cart_service::update_quantity(
        &state,
        &shopper,
        Uuid::new_v4(),
        UpdateCartLineRequest { quantity: 1 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}

#[tokio::test]
async fn removing_a_missing_line_is_not_an_error() -> anyhow::Result<()> {
    let (state, gateway) = state_with(vec![]);
    let shopper = user();

    let resp = cart_service::remove_line(&state, &shopper, Uuid::new_v4()).await?;
    assert!(!resp.data.unwrap().removed);
    assert!(gateway.audit_events().is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_writes_surface_as_persistence_errors() -> anyhow::Result<()> {
    let phone = product("iPhone 12", 36900, 5);
    let (state, gateway) = state_with(vec![phone.clone()]);
    let shopper = user();
    gateway.fail_on(FailPoint::WriteCart);

    let err = cart_service::add_to_cart(&state, &shopper, AddToCartRequest { product_id: phone.id })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Persistence(_)));
    assert!(gateway.list_cart_lines(shopper.user_id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn audit_failures_do_not_fail_the_operation() -> anyhow::Result<()> {
    let phone = product("iPhone 12", 36900, 5);
    let (state, gateway) = state_with(vec![phone.clone()]);
    let shopper = user();
    gateway.fail_on(FailPoint::Audit);

    cart_service::add_to_cart(&state, &shopper, AddToCartRequest { product_id: phone.id }).await?;
    assert_eq!(gateway.list_cart_lines(shopper.user_id).await?.len(), 1);
    Ok(())
}
