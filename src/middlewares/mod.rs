pub mod access;
pub mod auth;
pub mod cors;

pub use access::*;
pub use auth::AuthMiddleware;
pub use cors::create_cors;
