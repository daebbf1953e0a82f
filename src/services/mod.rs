pub mod cart_service;
pub mod dashboard_service;
pub mod order_service;
pub mod product_service;
