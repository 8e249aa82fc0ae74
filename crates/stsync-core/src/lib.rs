pub mod app_config;
pub mod config;
pub mod contact_row;
pub mod customer;
pub mod normalize;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use contact_row::FlatContactRow;
pub use customer::{BillingReference, ContactKind, ContactMethod, Location, RawCustomer};
pub use normalize::{
    join_escaped, normalize, split_joined, NormalizeError, NormalizeOptions, VipPolicy,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
