// src/services.rs

pub mod assistant_service;
pub mod auth;
pub mod document_service;
pub mod quote_service;
pub mod settings_service;
