pub mod user_repo;
pub use user_repo::UserRepository;
pub mod organization_repo;
pub use organization_repo::OrganizationRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod quote_repo;
pub use quote_repo::QuoteRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
