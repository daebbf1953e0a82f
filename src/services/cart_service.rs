use uuid::Uuid;

use crate::{
    audit::log_audit,
    checkout::{cart_total, ensure_quantity, line_subtotal},
    dto::cart::{AddToCartRequest, CartItemDto, CartView, RemovedLine, UpdateCartLineRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartLine,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let lines = state.gateway.list_cart_lines(user.user_id).await?;
    let total_amount = cart_total(&lines)?;
    let item_count = lines.iter().map(|l| i64::from(l.quantity)).sum();

    let items = lines
        .into_iter()
        .map(|line| -> AppResult<CartItemDto> {
            Ok(CartItemDto {
                subtotal: line_subtotal(&line)?,
                id: line.id,
                quantity: line.quantity,
                product: line.product,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success(
        "OK",
        CartView {
            items,
            total_amount,
            item_count,
        },
        Some(meta),
    ))
}

/// Put one more unit of a product in the cart.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartLine>> {
    let product = state
        .gateway
        .get_product(payload.product_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let existing = state
        .gateway
        .find_cart_line(user.user_id, product.id)
        .await?;

    let cart_line = match existing {
        Some(line) => {
            let quantity = line.quantity + 1;
            ensure_quantity(&product, quantity)?;
            state
                .gateway
                .update_cart_line(user.user_id, line.id, quantity)
                .await?
                .ok_or(AppError::NotFound)?
        }
        None => {
            ensure_quantity(&product, 1)?;
            state
                .gateway
                .insert_cart_line(user.user_id, product.id, 1)
                .await?
        }
    };

    tracing::info!(
        user_id = %user.user_id,
        product_id = %product.id,
        quantity = cart_line.quantity,
        "added to cart"
    );
    log_audit(
        state.gateway.as_ref(),
        Some(user.user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product.id, "quantity": cart_line.quantity })),
    )
    .await;

    Ok(ApiResponse::success("Added to cart", cart_line, None))
}

pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    line_id: Uuid,
    payload: UpdateCartLineRequest,
) -> AppResult<ApiResponse<CartLine>> {
    if payload.quantity < 1 {
        return Err(AppError::Validation("quantity must be at least 1".into()));
    }

    let line = state
        .gateway
        .get_cart_line(user.user_id, line_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let product = state
        .gateway
        .get_product(line.product_id)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_quantity(&product, payload.quantity)?;

    let updated = state
        .gateway
        .update_cart_line(user.user_id, line_id, payload.quantity)
        .await?
        .ok_or(AppError::NotFound)?;

    log_audit(
        state.gateway.as_ref(),
        Some(user.user_id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "cart_item_id": line_id, "quantity": payload.quantity })),
    )
    .await;

    Ok(ApiResponse::success("Quantity updated", updated, None))
}

/// Removing a line that is already gone is not an error.
pub async fn remove_line(
    state: &AppState,
    user: &AuthUser,
    line_id: Uuid,
) -> AppResult<ApiResponse<RemovedLine>> {
    let removed = state.gateway.delete_cart_line(user.user_id, line_id).await?;

    if removed {
        log_audit(
            state.gateway.as_ref(),
            Some(user.user_id),
            "cart_remove",
            Some("cart_items"),
            Some(serde_json::json!({ "cart_item_id": line_id })),
        )
        .await;
    } else {
        tracing::debug!(user_id = %user.user_id, %line_id, "cart line already absent");
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        RemovedLine { removed },
        Some(Meta::empty()),
    ))
}
