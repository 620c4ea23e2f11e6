pub mod auth;
pub mod devices;
pub mod logs;
pub mod roles;
pub mod server;
pub mod users;
