use amberprep::engine::config as core_config;

pub struct AppConfig {
    pub core_config: core_config::PrepConfig,
    /// Whether protein normalizer messages are reviewed at the terminal.
    pub interactive: bool,
}
