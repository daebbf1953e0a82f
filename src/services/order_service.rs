use uuid::Uuid;

use crate::{
    audit::log_audit,
    checkout::{CheckoutPlan, CheckoutStep},
    dto::orders::{CheckoutRequest, OrderList},
    error::{AppError, AppResult},
    gateway::{CheckoutUnit, GatewayError, NewOrder, NewOrderLine, StoreGateway},
    middleware::auth::AuthUser,
    models::{CartLineDetail, OrderLineDetail, OrderStatus, OrderWithLines, ProductSummary},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let orders = state.gateway.list_orders(user.user_id).await?;
    let meta = Meta::total(orders.len() as i64);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithLines>> {
    let order = state.gateway.get_order(user.user_id, id).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("OK", order, Some(Meta::empty())))
}

/// Turn the user's cart into a pending order.
///
/// The order, its lines and the cart clear are written in one checkout unit;
/// any failure rolls all of them back.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithLines>> {
    let token = payload.checkout_token;
    if let Some(token) = token {
        if let Some(existing) = placed_with_token(state.gateway.as_ref(), user, token).await? {
            tracing::info!(order_id = %existing.order.id, %token, "checkout replayed");
            return Ok(ApiResponse::success(
                "Order already placed",
                existing,
                Some(Meta::empty()),
            ));
        }
    }

    let cart = state.gateway.list_cart_lines(user.user_id).await?;
    let plan = CheckoutPlan::from_cart(&cart)?;

    let placed = match (
        place_order(state.gateway.as_ref(), user.user_id, &plan, &cart, token).await,
        token,
    ) {
        (Ok(placed), _) => placed,
        (Err(err), Some(token)) if is_token_conflict(&err) => {
            // A concurrent attempt with the same token won the race.
            tracing::info!(%token, "checkout token already used");
            return placed_with_token(state.gateway.as_ref(), user, token)
                .await?
                .map(|existing| {
                    ApiResponse::success("Order already placed", existing, Some(Meta::empty()))
                })
                .ok_or(err);
        }
        (Err(err), _) => return Err(err),
    };

    tracing::info!(
        user_id = %user.user_id,
        order_id = %placed.order.id,
        total_amount = placed.order.total_amount,
        lines = placed.items.len(),
        "order placed"
    );
    log_audit(
        state.gateway.as_ref(),
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": placed.order.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed successfully",
        placed,
        Some(Meta::empty()),
    ))
}

/// Stores report a reused token either on the order insert or at commit.
fn is_token_conflict(err: &AppError) -> bool {
    matches!(
        err,
        AppError::Persistence(GatewayError::Conflict(_))
            | AppError::CheckoutFailed {
                source: GatewayError::Conflict(_),
                ..
            }
    )
}

async fn placed_with_token(
    gateway: &dyn StoreGateway,
    user: &AuthUser,
    token: Uuid,
) -> AppResult<Option<OrderWithLines>> {
    let order = match gateway.find_order_by_token(user.user_id, token).await? {
        Some(order) => order,
        None => return Ok(None),
    };
    Ok(gateway.get_order(user.user_id, order.id).await?)
}

async fn place_order(
    gateway: &dyn StoreGateway,
    user_id: Uuid,
    plan: &CheckoutPlan,
    cart: &[CartLineDetail],
    checkout_token: Option<Uuid>,
) -> AppResult<OrderWithLines> {
    let mut unit = gateway.begin_checkout().await?;

    let order = match unit
        .insert_order(NewOrder {
            user_id,
            total_amount: plan.total_amount,
            status: OrderStatus::Pending,
            checkout_token,
        })
        .await
    {
        Ok(order) => order,
        Err(err) => {
            abandon(unit, CheckoutStep::CreateOrder).await;
            return Err(AppError::Persistence(err));
        }
    };

    let new_lines = plan
        .lines
        .iter()
        .zip(0..)
        .map(|(line, position)| NewOrderLine {
            order_id: order.id,
            product_id: line.product_id,
            position,
            quantity: line.quantity,
            price: line.price,
        })
        .collect();
    let lines = match unit.insert_order_lines(new_lines).await {
        Ok(lines) => lines,
        Err(source) => {
            abandon(unit, CheckoutStep::CreateOrderLines).await;
            return Err(AppError::CheckoutFailed {
                step: CheckoutStep::CreateOrderLines,
                source,
            });
        }
    };

    if let Err(source) = unit.delete_cart_lines(user_id).await {
        abandon(unit, CheckoutStep::ClearCart).await;
        return Err(AppError::CheckoutFailed {
            step: CheckoutStep::ClearCart,
            source,
        });
    }

    unit.commit()
        .await
        .map_err(|source| AppError::CheckoutFailed {
            step: CheckoutStep::Commit,
            source,
        })?;

    let items = lines
        .into_iter()
        .map(|line| OrderLineDetail {
            product: cart
                .iter()
                .find(|c| c.product.id == line.product_id)
                .map(|c| ProductSummary::from(&c.product)),
            line,
        })
        .collect();

    Ok(OrderWithLines { order, items })
}

async fn abandon(unit: Box<dyn CheckoutUnit>, step: CheckoutStep) {
    if let Err(err) = unit.rollback().await {
        tracing::warn!(%step, error = %err, "checkout rollback failed");
    }
}
