//! Router - provider strategy table and named model registry
//!
//! Providers are created from a [`ModelConfig`] through a constructor looked
//! up by provider id. Unknown ids fall back to OpenAI; a constructor failure
//! falls back to the default OpenAI model; only when that also fails is an
//! error returned.

use crate::error::{Error, Result};
use crate::gemini::{GeminiConfig, GeminiProvider};
use crate::mock::MockProvider;
use crate::openai::{self, OpenAiConfig, OpenAiProvider};
use crate::provider::LlmProvider;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// Provider used when a configuration names no provider or an unknown one
pub const FALLBACK_PROVIDER: &str = "openai";

/// Constructor stored in the strategy table
pub type ProviderConstructor =
    Arc<dyn Fn(&ModelConfig) -> Result<Arc<dyn LlmProvider>> + Send + Sync>;

/// Model selection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider id (e.g. "openai", "gemini")
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model name (provider default when unset)
    #[serde(default)]
    pub model_name: Option<String>,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Explicit API key (environment is used when unset)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Custom endpoint
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_provider() -> String {
    FALLBACK_PROVIDER.to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model_name: Some(openai::DEFAULT_MODEL.to_string()),
            temperature: Some(0.0),
            api_key: None,
            base_url: None,
        }
    }
}

impl ModelConfig {
    /// Create a config for a provider
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model_name: None,
            temperature: None,
            api_key: None,
            base_url: None,
        }
    }

    /// Set the model name
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_name = Some(model.into());
        self
    }

    /// Set the temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Summary of a registered model or provider class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    /// Registered name (or provider id for unregistered classes)
    pub name: String,
    /// Provider id
    pub provider: String,
    /// Default model, when an instance exists
    pub model_name: Option<String>,
}

fn build_openai(config: &ModelConfig) -> Result<Arc<dyn LlmProvider>> {
    let mut openai_config = match &config.api_key {
        Some(key) => OpenAiConfig::new(key.clone()),
        None => OpenAiConfig::from_env()?,
    };
    if let Some(model) = &config.model_name {
        openai_config = openai_config.with_model(model.clone());
    }
    if let Some(temperature) = config.temperature {
        openai_config = openai_config.with_temperature(temperature);
    }
    if let Some(base_url) = &config.base_url {
        openai_config = openai_config.with_base_url(base_url.clone());
    }
    Ok(Arc::new(OpenAiProvider::new(openai_config)))
}

fn build_gemini(config: &ModelConfig) -> Result<Arc<dyn LlmProvider>> {
    let mut gemini_config = match &config.api_key {
        Some(key) => GeminiConfig::new(key.clone()),
        None => GeminiConfig::from_env()?,
    };
    if let Some(model) = &config.model_name {
        gemini_config = gemini_config.with_model(model.clone());
    }
    if let Some(temperature) = config.temperature {
        gemini_config = gemini_config.with_temperature(temperature);
    }
    if let Some(base_url) = &config.base_url {
        gemini_config = gemini_config.with_base_url(base_url.clone());
    }
    Ok(Arc::new(GeminiProvider::new(gemini_config)?))
}

fn build_mock(_config: &ModelConfig) -> Result<Arc<dyn LlmProvider>> {
    Ok(Arc::new(MockProvider::new()))
}

/// Registry of provider constructors and named model instances
pub struct ModelRouter {
    models: HashMap<String, Arc<dyn LlmProvider>>,
    constructors: HashMap<String, ProviderConstructor>,
    default_config: ModelConfig,
    default_model: Mutex<Option<Arc<dyn LlmProvider>>>,
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}

impl ModelRouter {
    /// Create a router with the builtin providers (openai, gemini, mock)
    #[must_use]
    pub fn new(default_config: ModelConfig) -> Self {
        let mut constructors: HashMap<String, ProviderConstructor> = HashMap::new();
        constructors.insert("openai".to_string(), Arc::new(build_openai));
        constructors.insert("gemini".to_string(), Arc::new(build_gemini));
        constructors.insert("mock".to_string(), Arc::new(build_mock));

        Self {
            models: HashMap::new(),
            constructors,
            default_config,
            default_model: Mutex::new(None),
        }
    }

    /// Register a model instance under a name
    pub fn register_model(&mut self, name: impl Into<String>, model: Arc<dyn LlmProvider>) {
        let name = name.into();
        info!(model = %name, "Registered model");
        self.models.insert(name, model);
    }

    /// Register a constructor for a provider id
    ///
    /// # Errors
    /// Returns error if the provider id is blank
    pub fn register_provider(
        &mut self,
        provider: impl Into<String>,
        constructor: ProviderConstructor,
    ) -> Result<()> {
        let provider = provider.into().trim().to_lowercase();
        if provider.is_empty() {
            return Err(Error::UnknownProvider("(empty)".to_string()));
        }
        info!(provider = %provider, "Registered model class for provider");
        self.constructors.insert(provider, constructor);
        Ok(())
    }

    /// Check whether a provider id has a constructor
    #[must_use]
    pub fn has_provider(&self, provider: &str) -> bool {
        self.constructors.contains_key(&provider.to_lowercase())
    }

    /// Get a registered model by name, falling back to the default model
    ///
    /// # Errors
    /// Returns error if the name is unknown and the default model cannot be built
    pub fn get_model(&self, name: &str) -> Result<Arc<dyn LlmProvider>> {
        if let Some(model) = self.models.get(name) {
            return Ok(model.clone());
        }
        warn!(model = %name, "Model not found. Using default model.");
        self.default_model()
    }

    /// Get (building on first use) the default model
    ///
    /// # Errors
    /// Returns error if the default model cannot be built
    pub fn default_model(&self) -> Result<Arc<dyn LlmProvider>> {
        let mut slot = self.default_model.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(model) = slot.as_ref() {
            return Ok(model.clone());
        }
        let model = self.model_from_config(&self.default_config)?;
        *slot = Some(model.clone());
        Ok(model)
    }

    /// Build a model from a configuration
    ///
    /// # Errors
    /// Returns error only when both the requested provider and the OpenAI
    /// fallback fail to construct
    pub fn model_from_config(&self, config: &ModelConfig) -> Result<Arc<dyn LlmProvider>> {
        let mut provider = config.provider.trim().to_lowercase();
        if !self.constructors.contains_key(&provider) {
            error!(provider = %provider, "Unknown model provider. Using OpenAI as fallback.");
            provider = FALLBACK_PROVIDER.to_string();
        }

        let constructor = self
            .constructors
            .get(&provider)
            .ok_or_else(|| Error::UnknownProvider(provider.clone()))?;

        match constructor(config) {
            Ok(model) => Ok(model),
            Err(e) => {
                error!(provider = %provider, error = %e, "Error creating model");
                let fallback = ModelConfig {
                    api_key: config.api_key.clone(),
                    ..ModelConfig::default()
                };
                let fallback_ctor = self
                    .constructors
                    .get(FALLBACK_PROVIDER)
                    .ok_or_else(|| Error::Construction(e.to_string()))?;
                fallback_ctor(&fallback).map_err(|_| Error::Construction(e.to_string()))
            }
        }
    }

    /// Pick a model for a task; explicit requirements take precedence
    ///
    /// # Errors
    /// Returns error if the selected model cannot be built
    pub fn select_model_for_task(
        &self,
        _task: &str,
        requirements: Option<&ModelConfig>,
    ) -> Result<Arc<dyn LlmProvider>> {
        match requirements {
            Some(config) => self.model_from_config(config),
            None => self.default_model(),
        }
    }

    /// List registered models plus provider classes with no registered instance
    #[must_use]
    pub fn list_available_models(&self) -> Vec<ModelInfo> {
        let mut infos: Vec<ModelInfo> = self
            .models
            .iter()
            .map(|(name, model)| ModelInfo {
                name: name.clone(),
                provider: model.name().to_string(),
                model_name: Some(model.default_model().to_string()),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));

        let mut providers: Vec<&String> = self.constructors.keys().collect();
        providers.sort();
        for provider in providers {
            if !infos.iter().any(|info| &info.provider == provider) {
                infos.push(ModelInfo {
                    name: provider.clone(),
                    provider: provider.clone(),
                    model_name: None,
                });
            }
        }
        infos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_providers_registered() {
        let router = ModelRouter::default();
        assert!(router.has_provider("openai"));
        assert!(router.has_provider("gemini"));
        assert!(router.has_provider("MOCK"));
        assert!(!router.has_provider("anthropic"));
    }

    #[test]
    fn test_model_from_config_mock() {
        let router = ModelRouter::default();
        let model = router.model_from_config(&ModelConfig::new("mock")).unwrap();
        assert_eq!(model.name(), "mock");
    }

    #[test]
    fn test_unknown_provider_falls_back_to_openai() {
        let router = ModelRouter::default();
        let config = ModelConfig::new("nonexistent").with_api_key("sk-test-key-1234567890");
        let model = router.model_from_config(&config).unwrap();
        assert_eq!(model.name(), "openai");
    }

    #[test]
    fn test_failing_constructor_falls_back_to_default_openai() {
        let mut router = ModelRouter::default();
        router
            .register_provider(
                "broken",
                Arc::new(|_: &ModelConfig| Err(Error::Construction("boom".to_string()))),
            )
            .unwrap();

        let config = ModelConfig::new("broken").with_api_key("sk-test-key-1234567890");
        let model = router.model_from_config(&config).unwrap();
        assert_eq!(model.name(), "openai");
        assert_eq!(model.default_model(), openai::DEFAULT_MODEL);
    }

    #[test]
    fn test_register_provider_rejects_blank_id() {
        let mut router = ModelRouter::default();
        let result = router.register_provider("  ", Arc::new(build_mock));
        assert!(matches!(result, Err(Error::UnknownProvider(_))));
    }

    #[test]
    fn test_get_model_prefers_registered() {
        let mut router = ModelRouter::new(ModelConfig::new("mock"));
        let model: Arc<dyn LlmProvider> = Arc::new(MockProvider::new());
        router.register_model("fast", model.clone());

        let found = router.get_model("fast").unwrap();
        assert!(Arc::ptr_eq(&found, &model));
    }

    #[test]
    fn test_default_model_is_cached() {
        let router = ModelRouter::new(ModelConfig::new("mock"));
        let first = router.get_model("missing").unwrap();
        let second = router.default_model().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_select_model_for_task() {
        let router = ModelRouter::new(ModelConfig::new("mock"));
        let requirements = ModelConfig::new("mock");
        let model = router
            .select_model_for_task("summarize", Some(&requirements))
            .unwrap();
        assert_eq!(model.name(), "mock");
        assert_eq!(router.select_model_for_task("x", None).unwrap().name(), "mock");
    }

    #[test]
    fn test_list_available_models() {
        let mut router = ModelRouter::new(ModelConfig::new("mock"));
        router.register_model("local", Arc::new(MockProvider::new()));

        let infos = router.list_available_models();
        assert_eq!(infos[0].name, "local");
        assert_eq!(infos[0].provider, "mock");
        // mock is represented by "local", so only openai and gemini are added
        assert_eq!(infos.len(), 3);
        assert!(infos.iter().any(|i| i.name == "openai" && i.model_name.is_none()));
        assert!(infos.iter().any(|i| i.name == "gemini"));
    }
}
