mod builder;
mod defaults;
mod file;
mod models;

pub use builder::{Environment, build_config};
pub use models::AppConfig;
