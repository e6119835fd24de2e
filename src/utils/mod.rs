//! Utility functions.
//!
//! - [`app_data`] - Configuration file and application data directory

pub mod app_data;

pub use app_data::{AppConfig, get_app_data_dir, get_config_path};
