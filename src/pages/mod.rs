pub mod admin_network;
pub mod network;
pub mod not_found;
