use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    analytics::{Breakdown, FacetCount, OrderStats},
    catalog::{Facets, SortKey},
    dto::{
        cart::{AddToCartRequest, CartItemDto, CartView, RemovedLine, UpdateCartLineRequest},
        dashboard::{DashboardScope, DashboardView},
        orders::{CheckoutRequest, OrderList},
        products::CatalogPage,
        session::SessionView,
    },
    models::{
        CartLine, Order, OrderLine, OrderLineDetail, OrderStatus, OrderWithLines, Product,
        ProductSummary,
    },
    response::{ApiResponse, Meta},
    routes::{cart, dashboard, health, orders, products, session},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        products::list_products,
        products::get_product,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_quantity,
        cart::remove_from_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        dashboard::dashboard,
        session::current_session
    ),
    components(
        schemas(
            Product,
            CartLine,
            Order,
            OrderStatus,
            OrderLine,
            OrderLineDetail,
            OrderWithLines,
            ProductSummary,
            SortKey,
            Facets,
            CatalogPage,
            AddToCartRequest,
            UpdateCartLineRequest,
            CartItemDto,
            CartView,
            RemovedLine,
            CheckoutRequest,
            OrderList,
            OrderStats,
            FacetCount,
            Breakdown,
            DashboardScope,
            DashboardView,
            SessionView,
            Meta,
            ApiResponse<CatalogPage>,
            ApiResponse<CartView>,
            ApiResponse<OrderWithLines>,
            ApiResponse<OrderList>,
            ApiResponse<DashboardView>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog browsing, filtering and sorting"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Dashboard", description = "Purchase analytics"),
        (name = "Session", description = "Current session lookup"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
