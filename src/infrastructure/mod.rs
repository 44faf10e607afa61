pub mod in_memory;
pub mod rest_api;
pub mod scripted_gateway;
pub mod session;
pub mod stripe;
