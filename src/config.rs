use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::error::PipelineError;

/// Settings shared by both publishing binaries
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// API key for the OpenAI text and image endpoints
    pub openai_api_key: String,
    /// Base URL for the OpenAI API (for proxies and tests)
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    /// Model used for structured generation
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Model used for cover images
    #[serde(default = "default_openai_image_model")]
    pub openai_image_model: String,

    /// Notion integration token
    pub notion_key: String,
    #[serde(default = "default_notion_base_url")]
    pub notion_base_url: String,
    /// Value sent in the `Notion-Version` header
    #[serde(default = "default_notion_version")]
    pub notion_version: String,
    /// Database receiving recipe pages
    pub recipe_db: Option<String>,
    /// Database receiving Spanish tip pages
    pub notion_db: Option<String>,

    /// Request timeout in seconds; unset means no timeout
    pub http_timeout_secs: Option<u64>,
}

/// Notion databases a page can be published to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Recipes,
    Tips,
}

impl Collection {
    /// Environment variable holding this collection's database id
    pub fn env_key(self) -> &'static str {
        match self {
            Collection::Recipes => "RECIPE_DB",
            Collection::Tips => "NOTION_DB",
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_openai_model() -> String {
    "gpt-5".to_string()
}

fn default_openai_image_model() -> String {
    "gpt-image-1".to_string()
}

fn default_notion_base_url() -> String {
    "https://api.notion.com".to_string()
}

fn default_notion_version() -> String {
    "2022-06-28".to_string()
}

impl Settings {
    /// Load settings from `config.toml` and the process environment
    ///
    /// Environment variables take priority over the file. Keys are the
    /// lowercased variable names, so `OPENAI_API_KEY` maps to `openai_api_key`.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Optional config file (can be missing)
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::default())
            .build()?;

        Self::from_config(config)
    }

    /// Deserialize settings from an already assembled configuration
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        config.try_deserialize()
    }

    /// Database id for the given collection, failing if it is unset or blank
    pub fn collection_id(&self, collection: Collection) -> Result<&str, PipelineError> {
        let id = match collection {
            Collection::Recipes => self.recipe_db.as_deref(),
            Collection::Tips => self.notion_db.as_deref(),
        };

        id.map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(PipelineError::MissingCollection(collection.env_key()))
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_builder() -> config::ConfigBuilder<config::builder::DefaultState> {
        Config::builder()
            .set_override("openai_api_key", "sk-test")
            .unwrap()
            .set_override("notion_key", "secret_test")
            .unwrap()
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_openai_base_url(), "https://api.openai.com");
        assert_eq!(default_openai_model(), "gpt-5");
        assert_eq!(default_openai_image_model(), "gpt-image-1");
        assert_eq!(default_notion_base_url(), "https://api.notion.com");
        assert_eq!(default_notion_version(), "2022-06-28");
    }

    #[test]
    fn test_from_config_applies_defaults() {
        let settings = Settings::from_config(base_builder().build().unwrap()).unwrap();

        assert_eq!(settings.openai_api_key, "sk-test");
        assert_eq!(settings.notion_key, "secret_test");
        assert_eq!(settings.openai_model, "gpt-5");
        assert!(settings.recipe_db.is_none());
        assert!(settings.http_timeout().is_none());
    }

    #[test]
    fn test_overrides_win() {
        let config = base_builder()
            .set_override("openai_model", "gpt-4.1")
            .unwrap()
            .set_override("recipe_db", "db-recipes")
            .unwrap()
            .set_override("http_timeout_secs", 90)
            .unwrap()
            .build()
            .unwrap();
        let settings = Settings::from_config(config).unwrap();

        assert_eq!(settings.openai_model, "gpt-4.1");
        assert_eq!(
            settings.collection_id(Collection::Recipes).unwrap(),
            "db-recipes"
        );
        assert_eq!(settings.http_timeout(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_missing_credentials_fail() {
        let config = Config::builder()
            .set_override("openai_api_key", "sk-test")
            .unwrap()
            .build()
            .unwrap();
        let err = Settings::from_config(config).unwrap_err();
        assert!(err.to_string().contains("notion_key"));
    }

    #[test]
    fn test_missing_collection() {
        let config = base_builder()
            .set_override("notion_db", "   ")
            .unwrap()
            .build()
            .unwrap();
        let settings = Settings::from_config(config).unwrap();

        let err = settings.collection_id(Collection::Tips).unwrap_err();
        assert!(matches!(err, PipelineError::MissingCollection("NOTION_DB")));
        assert!(settings.collection_id(Collection::Recipes).is_err());
    }
}
