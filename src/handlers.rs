// src/handlers.rs

pub mod assistant;
pub mod auth;
pub mod customers;
pub mod documents;
pub mod pricing;
pub mod products;
pub mod quotes;
pub mod settings;
