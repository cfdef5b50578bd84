// Configuration loading

pub mod settings;

pub use settings::{sheet_id_from_url, ConfigError, Settings};
