pub mod contact;
pub mod file_name;
pub mod jwt;

pub use contact::*;
pub use file_name::generate_upload_file_name;
pub use jwt::*;
