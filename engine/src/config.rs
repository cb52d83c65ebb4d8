pub mod config_manager;
pub mod streaming_config;
