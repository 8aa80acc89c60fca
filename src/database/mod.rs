pub mod manager;
pub mod messages;
pub mod models;
pub mod tickets;
pub mod users;
