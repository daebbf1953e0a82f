pub mod cart;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod session;
