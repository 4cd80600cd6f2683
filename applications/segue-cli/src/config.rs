/// CLI configuration
use crate::error::{CliError, Result};
use config::builder::DefaultState;
use config::ConfigBuilder;
use segue_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "segue.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default = "default_playback")]
    pub playback: PlaybackConfig,

    #[serde(default = "default_simulation")]
    pub simulation: SimulationSettings,
}

/// Behaviour of the simulated engine and background provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationSettings {
    /// Time an item takes to become ready
    #[serde(default = "default_load_delay_ms")]
    pub load_delay_ms: u64,

    /// Length of every simulated item in seconds
    #[serde(default = "default_item_length_secs")]
    pub item_length_secs: f64,

    /// Locations that fail to load
    #[serde(default)]
    pub fail_locations: Vec<String>,

    /// Revoke background grants after this many seconds
    #[serde(default)]
    pub grant_expiry_secs: Option<u64>,
}

impl SimulationSettings {
    pub fn load_delay(&self) -> Duration {
        Duration::from_millis(self.load_delay_ms)
    }

    pub fn item_length(&self) -> Duration {
        Duration::from_secs_f64(self.item_length_secs)
    }

    pub fn grant_expiry(&self) -> Option<Duration> {
        self.grant_expiry_secs.map(Duration::from_secs)
    }
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist. Without one, `segue.toml` in the working
    /// directory is used if present. Environment variables prefixed with
    /// `SEGUE_` override both, e.g. `SEGUE_PLAYBACK__AUTOPLAY_RULE=manual`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        // Override with environment variables (prefixed with SEGUE_)
        settings = settings.add_source(
            config::Environment::with_prefix("SEGUE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("simulation.fail_locations")
                .try_parsing(true),
        );

        Self::build(settings)
    }

    /// Parse configuration from TOML text, without environment overrides
    pub fn from_toml(contents: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml));
        Self::build(settings)
    }

    fn build(settings: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let length = self.simulation.item_length_secs;
        if !length.is_finite() || length <= 0.0 {
            return Err(CliError::Config(format!(
                "simulation.item_length_secs must be positive, got {}",
                length
            )));
        }
        Duration::try_from_secs_f64(length).map_err(|e| {
            CliError::Config(format!(
                "simulation.item_length_secs out of range ({}): {}",
                length, e
            ))
        })?;

        if self.playback.event_capacity == 0 {
            return Err(CliError::Config(
                "playback.event_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_playback() -> PlaybackConfig {
    PlaybackConfig::default()
}

fn default_simulation() -> SimulationSettings {
    SimulationSettings {
        load_delay_ms: default_load_delay_ms(),
        item_length_secs: default_item_length_secs(),
        fail_locations: Vec::new(),
        grant_expiry_secs: None,
    }
}

fn default_load_delay_ms() -> u64 {
    250
}

fn default_item_length_secs() -> f64 {
    5.0
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            playback: default_playback(),
            simulation: default_simulation(),
        }
    }
}
