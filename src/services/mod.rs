pub mod chef_service;
pub mod notification_service;
pub mod order_service;
pub mod upload_service;

pub use chef_service::ChefService;
pub use notification_service::*;
pub use order_service::*;
pub use upload_service::*;
