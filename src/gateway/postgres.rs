use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use super::{
    AuditEvent, CheckoutUnit, GatewayError, GatewayResult, NewOrder, NewOrderLine, StoreGateway,
};
use crate::{
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems, Model as CartModel},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    models::{
        CartLine, CartLineDetail, Order, OrderLine, OrderLineDetail, OrderWithLines, Product,
        ProductSummary,
    },
};

/// Gateway over the managed backend's Postgres tables.
#[derive(Clone)]
pub struct PgGateway {
    orm: DatabaseConnection,
}

impl PgGateway {
    pub fn new(orm: DatabaseConnection) -> Self {
        Self { orm }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.orm
    }

    async fn attach_lines(&self, orders: Vec<OrderModel>) -> GatewayResult<Vec<OrderWithLines>> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let rows = OrderItems::find()
            .filter(OrderItemCol::OrderId.is_in(ids))
            .order_by_asc(OrderItemCol::Position)
            .order_by_asc(OrderItemCol::Id)
            .find_also_related(Products)
            .all(&self.orm)
            .await?;

        let mut by_order: HashMap<Uuid, Vec<OrderLineDetail>> = HashMap::new();
        for (item, product) in rows {
            let summary = product.map(|p| ProductSummary::from(&product_from_entity(p)));
            by_order
                .entry(item.order_id)
                .or_default()
                .push(OrderLineDetail {
                    line: order_line_from_entity(item),
                    product: summary,
                });
        }

        orders
            .into_iter()
            .map(|model| {
                let items = by_order.remove(&model.id).unwrap_or_default();
                Ok(OrderWithLines {
                    order: order_from_entity(model)?,
                    items,
                })
            })
            .collect()
    }
}

#[async_trait]
impl StoreGateway for PgGateway {
    async fn list_products(&self) -> GatewayResult<Vec<Product>> {
        let products = Products::find()
            .order_by_asc(ProdCol::CreatedAt)
            .order_by_asc(ProdCol::Id)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect();
        Ok(products)
    }

    async fn get_product(&self, id: Uuid) -> GatewayResult<Option<Product>> {
        Ok(Products::find_by_id(id)
            .one(&self.orm)
            .await?
            .map(product_from_entity))
    }

    async fn list_cart_lines(&self, user_id: Uuid) -> GatewayResult<Vec<CartLineDetail>> {
        let rows = CartItems::find()
            .filter(CartCol::UserId.eq(user_id))
            .order_by_asc(CartCol::CreatedAt)
            .find_also_related(Products)
            .all(&self.orm)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(line, product)| {
                Some(CartLineDetail {
                    id: line.id,
                    quantity: line.quantity,
                    product: product_from_entity(product?),
                })
            })
            .collect())
    }

    async fn find_cart_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> GatewayResult<Option<CartLine>> {
        Ok(CartItems::find()
            .filter(
                Condition::all()
                    .add(CartCol::UserId.eq(user_id))
                    .add(CartCol::ProductId.eq(product_id)),
            )
            .one(&self.orm)
            .await?
            .map(cart_line_from_entity))
    }

    async fn get_cart_line(&self, user_id: Uuid, id: Uuid) -> GatewayResult<Option<CartLine>> {
        Ok(find_owned_line(&self.orm, user_id, id)
            .await?
            .map(cart_line_from_entity))
    }

    async fn insert_cart_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> GatewayResult<CartLine> {
        let line = CartActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            created_at: NotSet,
        }
        .insert(&self.orm)
        .await
        .map_err(conflict_or_db)?;
        Ok(cart_line_from_entity(line))
    }

    async fn update_cart_line(
        &self,
        user_id: Uuid,
        id: Uuid,
        quantity: i32,
    ) -> GatewayResult<Option<CartLine>> {
        let existing = match find_owned_line(&self.orm, user_id, id).await? {
            Some(line) => line,
            None => return Ok(None),
        };
        let mut active: CartActive = existing.into();
        active.quantity = Set(quantity);
        let line = active.update(&self.orm).await?;
        Ok(Some(cart_line_from_entity(line)))
    }

    async fn delete_cart_line(&self, user_id: Uuid, id: Uuid) -> GatewayResult<bool> {
        let result = CartItems::delete_many()
            .filter(
                Condition::all()
                    .add(CartCol::Id.eq(id))
                    .add(CartCol::UserId.eq(user_id)),
            )
            .exec(&self.orm)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn find_order_by_token(
        &self,
        user_id: Uuid,
        token: Uuid,
    ) -> GatewayResult<Option<Order>> {
        Orders::find()
            .filter(
                Condition::all()
                    .add(OrderCol::UserId.eq(user_id))
                    .add(OrderCol::CheckoutToken.eq(token)),
            )
            .one(&self.orm)
            .await?
            .map(order_from_entity)
            .transpose()
    }

    async fn begin_checkout(&self) -> GatewayResult<Box<dyn CheckoutUnit>> {
        let txn = self.orm.begin().await?;
        Ok(Box::new(PgCheckout { txn }))
    }

    async fn list_orders(&self, user_id: Uuid) -> GatewayResult<Vec<OrderWithLines>> {
        let orders = Orders::find()
            .filter(OrderCol::UserId.eq(user_id))
            .order_by_desc(OrderCol::CreatedAt)
            .all(&self.orm)
            .await?;
        self.attach_lines(orders).await
    }

    async fn get_order(&self, user_id: Uuid, id: Uuid) -> GatewayResult<Option<OrderWithLines>> {
        let order = Orders::find()
            .filter(
                Condition::all()
                    .add(OrderCol::UserId.eq(user_id))
                    .add(OrderCol::Id.eq(id)),
            )
            .one(&self.orm)
            .await?;
        let order = match order {
            Some(o) => o,
            None => return Ok(None),
        };
        Ok(self.attach_lines(vec![order]).await?.into_iter().next())
    }

    async fn record_audit(&self, event: AuditEvent) -> GatewayResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, user_id, action, resource, metadata)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.user_id)
        .bind(event.action)
        .bind(event.resource)
        .bind(event.metadata)
        .execute(self.orm.get_postgres_connection_pool())
        .await?;
        Ok(())
    }
}

struct PgCheckout {
    txn: DatabaseTransaction,
}

#[async_trait]
impl CheckoutUnit for PgCheckout {
    async fn insert_order(&mut self, order: NewOrder) -> GatewayResult<Order> {
        let model = OrderActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(order.user_id),
            total_amount: Set(order.total_amount),
            status: Set(order.status.as_str().to_string()),
            checkout_token: Set(order.checkout_token),
            created_at: NotSet,
        }
        .insert(&self.txn)
        .await
        .map_err(conflict_or_db)?;
        order_from_entity(model)
    }

    async fn insert_order_lines(&mut self, lines: Vec<NewOrderLine>) -> GatewayResult<Vec<OrderLine>> {
        let mut created = Vec::with_capacity(lines.len());
        for line in lines {
            let model = OrderItemActive {
                id: Set(Uuid::new_v4()),
                order_id: Set(line.order_id),
                product_id: Set(line.product_id),
                position: Set(line.position),
                quantity: Set(line.quantity),
                price: Set(line.price),
                created_at: NotSet,
            }
            .insert(&self.txn)
            .await?;
            created.push(order_line_from_entity(model));
        }
        Ok(created)
    }

    async fn delete_cart_lines(&mut self, user_id: Uuid) -> GatewayResult<u64> {
        let result = CartItems::delete_many()
            .filter(CartCol::UserId.eq(user_id))
            .exec(&self.txn)
            .await?;
        Ok(result.rows_affected)
    }

    async fn commit(self: Box<Self>) -> GatewayResult<()> {
        self.txn.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> GatewayResult<()> {
        self.txn.rollback().await?;
        Ok(())
    }
}

async fn find_owned_line(
    orm: &DatabaseConnection,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<CartModel>, DbErr> {
    CartItems::find()
        .filter(
            Condition::all()
                .add(CartCol::Id.eq(id))
                .add(CartCol::UserId.eq(user_id)),
        )
        .one(orm)
        .await
}

fn conflict_or_db(err: DbErr) -> GatewayError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => GatewayError::Conflict(detail),
        _ => GatewayError::Orm(err),
    }
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        brand: model.brand,
        category: model.category,
        condition: model.condition,
        storage: model.storage,
        price: model.price,
        original_price: model.original_price,
        image_url: model.image_url,
        description: model.description,
        in_stock: model.in_stock,
        stock_count: model.stock_count,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn cart_line_from_entity(model: CartModel) -> CartLine {
    CartLine {
        id: model.id,
        user_id: model.user_id,
        product_id: model.product_id,
        quantity: model.quantity,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn order_from_entity(model: OrderModel) -> GatewayResult<Order> {
    let status = model
        .status
        .parse()
        .map_err(|e: crate::models::UnknownStatus| GatewayError::Decode(e.to_string()))?;
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        total_amount: model.total_amount,
        status,
        checkout_token: model.checkout_token,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn order_line_from_entity(model: OrderItemModel) -> OrderLine {
    OrderLine {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
