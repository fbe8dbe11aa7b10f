pub mod assistant;
pub mod auth;
pub mod customers;
pub mod products;
pub mod quotes;
pub mod settings;
