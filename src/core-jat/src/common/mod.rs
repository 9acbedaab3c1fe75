pub mod cors_config;
pub mod db_env;
pub mod health;
pub mod hostname;
pub mod logging;
