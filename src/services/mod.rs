pub mod notifier;
pub mod registration;
