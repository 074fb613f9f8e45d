pub mod broadcast_service;
pub mod order_service;
