use refurb_storefront::{
    config::DbConfig,
    db::{create_orm_conn, run_migrations},
    seed::demo_products,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = DbConfig::from_env()?;

    let orm = create_orm_conn(&config).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;
    let pool = orm.get_postgres_connection_pool();

    let mut inserted = 0u64;
    for product in demo_products() {
        let result = sqlx::query(
            r#"
            INSERT INTO products (id, name, brand, category, condition, storage, price,
                                  original_price, image_url, description, in_stock,
                                  stock_count, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(&product.condition)
        .bind(&product.storage)
        .bind(product.price)
        .bind(product.original_price)
        .bind(&product.image_url)
        .bind(&product.description)
        .bind(product.in_stock)
        .bind(product.stock_count)
        .bind(product.created_at)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }

    println!("Seeded {inserted} products");
    Ok(())
}
