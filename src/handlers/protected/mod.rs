pub mod billing;
pub mod conversations;
pub mod favorites;
pub mod listings;
pub mod notifications;
pub mod offers;
pub mod reviews;
pub mod searches;
pub mod sellers;
pub mod subscriptions;
