//! Configuration management for the linter

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::ConfigLoader;
pub use schema::{ChecksConfig, CommonConfig, Config, ServerConfig, Settings};
pub use validator::ConfigValidator;
