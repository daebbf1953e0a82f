//! Cart aggregation rules shared by cart updates and checkout.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CartLineDetail, Product};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartRuleError {
    #[error("quantity must be at least 1")]
    QuantityTooLow,

    #[error("{name} is out of stock")]
    OutOfStock { name: String },

    #[error("only {available} of {name} available")]
    ExceedsStock { name: String, available: i32 },

    #[error("cart is empty")]
    EmptyCart,

    #[error("cart total is too large")]
    Overflow,
}

/// Check a requested line quantity against the product's stock ceiling.
pub fn ensure_quantity(product: &Product, quantity: i32) -> Result<(), CartRuleError> {
    if quantity < 1 {
        return Err(CartRuleError::QuantityTooLow);
    }
    if !product.in_stock || product.stock_count < 1 {
        return Err(CartRuleError::OutOfStock {
            name: product.name.clone(),
        });
    }
    if quantity > product.stock_count {
        return Err(CartRuleError::ExceedsStock {
            name: product.name.clone(),
            available: product.stock_count,
        });
    }
    Ok(())
}

pub fn line_subtotal(line: &CartLineDetail) -> Result<i64, CartRuleError> {
    line.product
        .price
        .checked_mul(i64::from(line.quantity))
        .ok_or(CartRuleError::Overflow)
}

pub fn cart_total(lines: &[CartLineDetail]) -> Result<i64, CartRuleError> {
    lines.iter().try_fold(0i64, |acc, line| {
        acc.checked_add(line_subtotal(line)?)
            .ok_or(CartRuleError::Overflow)
    })
}

/// One order line to be written, priced from the cart snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub total_amount: i64,
    pub lines: Vec<PlannedLine>,
}

impl CheckoutPlan {
    pub fn from_cart(cart: &[CartLineDetail]) -> Result<Self, CartRuleError> {
        if cart.is_empty() {
            return Err(CartRuleError::EmptyCart);
        }
        for line in cart {
            ensure_quantity(&line.product, line.quantity)?;
        }

        let total_amount = cart_total(cart)?;
        let lines = cart
            .iter()
            .map(|line| PlannedLine {
                product_id: line.product.id,
                quantity: line.quantity,
                price: line.product.price,
            })
            .collect();

        Ok(Self {
            total_amount,
            lines,
        })
    }
}

/// The write that was in flight when a checkout failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    CreateOrder,
    CreateOrderLines,
    ClearCart,
    Commit,
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutStep::CreateOrder => "create_order",
            CheckoutStep::CreateOrderLines => "create_order_lines",
            CheckoutStep::ClearCart => "clear_cart",
            CheckoutStep::Commit => "commit",
        };
        f.write_str(name)
    }
}
