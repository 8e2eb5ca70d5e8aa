pub mod app_config;
pub mod config;
pub mod records;

pub use app_config::{AppConfig, MalformedItemPolicy};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use records::{
    detail_url, Country, ProductRecord, SearchRequest, UnknownCountryError, MAX_PAGES,
};
