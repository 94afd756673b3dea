pub mod config;
pub mod constants;
pub mod db_connect;
pub mod env;
pub mod logging;
pub mod progress_config;
