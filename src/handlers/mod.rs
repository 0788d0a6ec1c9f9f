pub mod order;

pub use order::{json_config, order_config};
