pub mod assemble;
pub mod client;
pub mod error;
pub mod pagination;
pub(crate) mod retry;
pub mod types;

pub use assemble::{group_contacts, CustomerStream, EnrichmentIndex};
pub use client::{ClientSettings, ServiceTitanClient, DEFAULT_API_BASE_URL, DEFAULT_AUTH_URL};
pub use error::ServiceTitanError;
pub use pagination::PageStop;
