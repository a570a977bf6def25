//! Library side of the `badea` command: configuration loading and logging.

pub mod config;
pub mod logging;

pub use config::load_config;
