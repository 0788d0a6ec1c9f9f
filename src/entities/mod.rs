pub mod chefs;
pub mod orders;

pub use chefs as chef_entity;
pub use orders as order_entity;
pub use orders::{LineItem, LineItems, OrderStatus, PaymentMethod, PaymentStatus};
