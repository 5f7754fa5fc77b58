//! Configuration loading
//!
//! Sources, lowest to highest priority: built-in defaults, a YAML file, and
//! `CONDUCTOR_` environment variables (`CONDUCTOR_COMPLEXITY__THRESHOLD=4`).
//! Loading never stops the program: a missing file logs a warning and an
//! unreadable one logs an error, both falling back to defaults.

use crate::agent::{AgentConfig, DEFAULT_MAX_ITERATIONS};
use crate::complexity::DEFAULT_THRESHOLD;
use crate::error::{Error, Result};
use crate::result::DispatchMode;
use crate::roles::Role;
use ::config::{Config, Environment, File, FileFormat};
use conductor_llm::ModelConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

/// Default configuration file name
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CONDUCTOR";

/// Primary agent settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Primary agent name
    pub name: String,
    /// Requested mode recorded with each task
    pub mode: String,
    /// Upper bound on model-guided steps
    pub max_iterations: usize,
    /// Tools for the primary agent and default role agents
    pub tools: Vec<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: "conductor".to_string(),
            mode: "single".to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tools: Vec::new(),
        }
    }
}

/// Complexity settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexitySettings {
    /// Scores at or above this go to the pipeline
    pub threshold: f64,
}

impl Default for ComplexitySettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Per-role agent settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleSettings {
    /// Agent name (`<role>-agent` when unset)
    pub name: Option<String>,
    /// Tools for this role
    pub tools: Vec<String>,
}

/// Model backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Provider id (openai, gemini, mock)
    pub provider: String,
    /// Model name
    pub model: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            temperature: Some(0.0),
        }
    }
}

/// Tool execution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// Builtin tools switched off for every agent
    pub disabled: Vec<String>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            disabled: Vec::new(),
        }
    }
}

/// Full configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConductorConfig {
    /// Primary agent
    pub agent: AgentSettings,
    /// Complexity scoring
    pub complexity: ComplexitySettings,
    /// Role overrides keyed by role name
    pub roles: BTreeMap<String, RoleSettings>,
    /// Model backend
    pub llm: LlmSettings,
    /// Tool execution
    pub tools: ToolSettings,
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl ConductorConfig {
    /// Load configuration, falling back to defaults on any problem
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Self::from_env_only().unwrap_or_else(|e| {
                error!(error = %e, "Invalid environment configuration, using defaults");
                Self::default()
            });
        }

        match Self::try_load(path) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded configuration");
                config
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Error loading configuration, using defaults");
                Self::default()
            }
        }
    }

    /// Load configuration from a file plus environment
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed, or the result
    /// fails validation
    pub fn try_load(path: &Path) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(environment())
            .build()
            .map_err(|e| Error::Configuration(e.to_string()))?;
        Self::finish(config)
    }

    /// Parse configuration from YAML text (no environment overlay)
    ///
    /// # Errors
    /// Returns error if the text is not valid configuration
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .map_err(|e| Error::Configuration(e.to_string()))?;
        Self::finish(config)
    }

    fn from_env_only() -> Result<Self> {
        let config = Config::builder()
            .add_source(environment())
            .build()
            .map_err(|e| Error::Configuration(e.to_string()))?;
        Self::finish(config)
    }

    fn finish(config: Config) -> Result<Self> {
        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| Error::Configuration(e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns the first invalid field
    pub fn validate(&self) -> Result<()> {
        if !self.complexity.threshold.is_finite() || self.complexity.threshold < 0.0 {
            return Err(Error::InvalidConfig {
                field: "complexity.threshold".to_string(),
                message: "must be a non-negative number".to_string(),
            });
        }
        if self.tools.timeout_secs == 0 {
            return Err(Error::InvalidConfig {
                field: "tools.timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Requested mode from `agent.mode`; unknown values are ignored
    #[must_use]
    pub fn requested_mode(&self) -> Option<DispatchMode> {
        match self.agent.mode.parse() {
            Ok(mode) => Some(mode),
            Err(_) => {
                warn!(mode = %self.agent.mode, "Unknown agent.mode, ignoring");
                None
            }
        }
    }

    /// Primary agent configuration
    #[must_use]
    pub fn primary_agent(&self) -> AgentConfig {
        AgentConfig::new(self.agent.name.clone())
            .with_tools(self.agent.tools.clone())
            .with_max_iterations(self.agent.max_iterations)
    }

    /// Role agent configurations; unknown role keys are skipped
    #[must_use]
    pub fn role_agents(&self) -> Vec<(Role, AgentConfig)> {
        self.roles
            .iter()
            .filter_map(|(key, settings)| match key.parse::<Role>() {
                Ok(role) => {
                    let name = settings
                        .name
                        .clone()
                        .unwrap_or_else(|| role.default_agent_name());
                    Some((
                        role,
                        AgentConfig::new(name)
                            .with_tools(settings.tools.clone())
                            .with_max_iterations(self.agent.max_iterations),
                    ))
                }
                Err(_) => {
                    warn!(role = %key, "Unknown role in configuration, ignoring");
                    None
                }
            })
            .collect()
    }

    /// Model selection for the router
    #[must_use]
    pub fn model_config(&self) -> ModelConfig {
        let mut model = ModelConfig::new(self.llm.provider.clone());
        model.model_name = self.llm.model.clone();
        model.temperature = self.llm.temperature;
        model
    }

    /// Per-call tool timeout
    #[must_use]
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tools.timeout_secs)
    }
}
