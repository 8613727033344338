//! Layered settings: defaults, then an optional config file, then `MARKER_PROBE_*`
//! environment variables. Command-line flags are applied on top by `main`, which
//! validates the final pipeline config only for the commands that cluster.

use anyhow::{Context, Result};
use config::{Config, Environment, File, Map};
use marker_vision::core_modules::palette::ChannelWeights;
use marker_vision::pipeline::PipelineConfig;
use serde::Deserialize;
use std::path::Path;

const ENV_PREFIX: &str = "MARKER_PROBE";
pub const DEFAULT_ROW_TOLERANCE: u16 = marker_vision::core_modules::row_regions::DEFAULT_ROW_TOLERANCE;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pipeline: PipelineConfig,
    /// Color tolerance for the `row` command.
    pub row_tolerance: u16,
    /// Worker count for batch analysis. Defaults to the number of CPUs.
    pub workers: Option<usize>,
    /// Channel weights for the `quantize` command.
    pub weights: ChannelWeights,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            row_tolerance: DEFAULT_ROW_TOLERANCE,
            workers: None,
            weights: ChannelWeights::default(),
        }
    }
}

impl Settings {
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        Self::load_from(config_file, None)
    }

    /// Like `load`, but reads the environment layer from `env_vars` when given
    /// instead of the process environment.
    pub fn load_from(config_file: Option<&Path>, env_vars: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env_vars),
        );

        builder
            .build()
            .context("failed to read settings")?
            .try_deserialize::<Settings>()
            .context("failed to parse settings")
    }
}
