use std::path::Path;

use log::{info, warn};

use crate::ai::{PgConfig, PolicyGradientAgent};
use crate::brain::{validate_topology, Activation, Hyperparameters, LayerSpec, Network};
use crate::checkpoint::{load_pretrained, CheckpointManagerConfig};
use crate::error::{ConfigError, NetworkError};
use crate::training::TrainerConfig;

/// Topology and gradient descent settings of the policy network.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub learning_rate: f32,
    pub momentum: f32,
    pub regularization: f32,
    /// Input entry first, then one entry per weighted layer.
    pub topology: Vec<LayerSpec>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        let hp = Hyperparameters::default();
        NetworkConfig {
            learning_rate: hp.learning_rate,
            momentum: hp.momentum,
            regularization: hp.regularization,
            topology: vec![
                LayerSpec::input(18),
                LayerSpec::new(96, Activation::Relu),
                LayerSpec::new(9, Activation::Sigmoid),
            ],
        }
    }
}

impl NetworkConfig {
    pub fn hyperparameters(&self) -> Hyperparameters {
        Hyperparameters {
            learning_rate: self.learning_rate,
            momentum: self.momentum,
            regularization: self.regularization,
        }
    }

    /// Build a freshly initialized network; seeded when `seed` is given.
    pub fn build(&self, seed: Option<u64>) -> Result<Network, NetworkError> {
        match seed {
            Some(seed) => Network::with_seed(&self.topology, self.hyperparameters(), seed),
            None => Network::new(&self.topology, self.hyperparameters()),
        }
    }
}

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Seed for every random source; drawn from the OS when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub network: NetworkConfig,
    pub agent: PgConfig,
    pub training: TrainerConfig,
    pub checkpoint: CheckpointManagerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_topology(&self.network.topology)
            .and_then(|_| self.network.hyperparameters().validate())
            .map_err(|e| ConfigError::Validation(format!("network: {e}")))?;

        self.agent
            .validate()
            .map_err(|e| ConfigError::Validation(format!("agent: {e}")))?;

        if self.training.update_every == 0 {
            return Err(ConfigError::Validation(
                "training.update_every must be > 0".into(),
            ));
        }
        if self.training.max_games == Some(0) {
            return Err(ConfigError::Validation(
                "training.max_games must be > 0".into(),
            ));
        }
        if self.checkpoint.keep_last_n == 0 {
            return Err(ConfigError::Validation(
                "checkpoint.keep_last_n must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Build the learner described by this configuration. A network stored at
    /// `pretrained` is used when the file exists; otherwise a fresh one is
    /// built from `network`. `seed` seeds both the weights and the agent.
    pub fn build_learner(
        &self,
        pretrained: Option<&Path>,
    ) -> Result<PolicyGradientAgent, ConfigError> {
        let loaded = match pretrained {
            Some(path) => load_pretrained(path)?.map(|network| (path, network)),
            None => None,
        };
        let network = match loaded {
            Some((path, network)) => {
                info!("Loaded pretrained network from {}", path.display());
                network
            }
            None => self.network.build(self.seed)?,
        };
        let agent = match self.seed {
            Some(seed) => PolicyGradientAgent::with_seed(network, self.agent.clone(), seed)?,
            None => PolicyGradientAgent::new(network, self.agent.clone())?,
        };
        Ok(agent)
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&AppConfig::default())
    }
}
