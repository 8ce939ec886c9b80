pub mod listing_query;
pub mod manager;
pub mod models;

pub use manager::{DatabaseError, DatabaseManager};
