//! Settings for the service. See [`loader`] for source precedence; the
//! database URL belongs in `config/local.toml` or `MEMBERS_DATABASE__URL`,
//! never in a committed file.

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{DatabaseConfig, LoggerSettings, MembersConfig, ServerConfig, Settings};
