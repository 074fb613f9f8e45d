pub mod errors;
pub mod notification;
pub mod order;
pub mod paging;
pub mod ports;
pub mod response;
