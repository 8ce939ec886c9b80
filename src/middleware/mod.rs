pub mod access;
pub mod auth;
pub mod response;

pub use access::{AccessProfile, SellerAccess};
pub use auth::AuthUser;
pub use response::ApiResponse;
