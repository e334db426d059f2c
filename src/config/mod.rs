/// Database configuration and connection management
pub mod database;

/// Club configuration loading from config.toml
pub mod club;
