pub mod auth;
pub mod hub;
pub mod notifications;
pub mod orders;
