//! Application configuration module
//!
//! Connection settings for the hosted backend: project URL, API key and the
//! names of the tables, realtime topic and storage bucket the access layer
//! talks to.
//!
//! Configuration can be assembled with [`AppConfig::builder`], read from the
//! environment (`SUPABASE_URL`, `SUPABASE_ANON_KEY`, optional
//! `SUPABASE_SCHEMA`, with a `.env` file honoured when present) or parsed
//! from TOML.

use std::path::Path;

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::shared::attachment::DEFAULT_ATTACHMENTS_BUCKET;

const DEFAULT_SCHEMA: &str = "public";
const DEFAULT_MESSAGES_TABLE: &str = "messages";
const DEFAULT_USERS_TABLE: &str = "users";
const DEFAULT_REALTIME_TOPIC: &str = "public:messages";
const DEFAULT_HEARTBEAT_SECS: u64 = 30;
const REALTIME_PROTOCOL_VERSION: &str = "1.0.0";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`
    pub supabase_url: String,
    /// Anonymous (public) API key
    pub api_key: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_messages_table")]
    pub messages_table: String,
    #[serde(default = "default_users_table")]
    pub users_table: String,
    /// Realtime topic the message feed joins
    #[serde(default = "default_realtime_topic")]
    pub realtime_topic: String,
    #[serde(default = "default_attachments_bucket")]
    pub attachments_bucket: String,
    /// Seconds between realtime heartbeats
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_interval_secs: u64,
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_messages_table() -> String {
    DEFAULT_MESSAGES_TABLE.to_string()
}

fn default_users_table() -> String {
    DEFAULT_USERS_TABLE.to_string()
}

fn default_realtime_topic() -> String {
    DEFAULT_REALTIME_TOPIC.to_string()
}

fn default_attachments_bucket() -> String {
    DEFAULT_ATTACHMENTS_BUCKET.to_string()
}

fn default_heartbeat_secs() -> u64 {
    DEFAULT_HEARTBEAT_SECS
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| ConfigError::MissingValue("SUPABASE_URL"))?;
        let key = std::env::var("SUPABASE_ANON_KEY")
            .map_err(|_| ConfigError::MissingValue("SUPABASE_ANON_KEY"))?;

        let mut builder = Self::builder().supabase_url(url).api_key(key);
        if let Ok(schema) = std::env::var("SUPABASE_SCHEMA") {
            builder = builder.schema(schema);
        }
        builder.build()
    }

    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.supabase_url)
            .map_err(|_| ConfigError::InvalidUrl(self.supabase_url.clone()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(self.supabase_url.clone()));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingValue("api_key"));
        }
        for (name, value) in [
            ("schema", &self.schema),
            ("messages_table", &self.messages_table),
            ("users_table", &self.users_table),
            ("realtime_topic", &self.realtime_topic),
            ("attachments_bucket", &self.attachments_bucket),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingValue(name));
            }
        }
        if self.heartbeat_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "heartbeat_interval_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    fn base_url(&self) -> &str {
        self.supabase_url.trim_end_matches('/')
    }

    /// Base URL extended with percent-encoded path segments
    fn endpoint(&self, segments: &[&str]) -> String {
        match Url::parse(self.base_url()) {
            Ok(mut url) => {
                if let Ok(mut path) = url.path_segments_mut() {
                    path.pop_if_empty().extend(segments);
                }
                url.to_string()
            }
            Err(_) => format!("{}/{}", self.base_url(), segments.join("/")),
        }
    }

    /// REST endpoint of a table
    pub fn rest_url(&self, table: &str) -> String {
        self.endpoint(&["rest", "v1", table])
    }

    /// Storage endpoint used for uploads
    pub fn storage_object_url(&self, bucket: &str, name: &str) -> String {
        self.endpoint(&["storage", "v1", "object", bucket, name])
    }

    /// Public URL of a stored object
    pub fn public_object_url(&self, bucket: &str, name: &str) -> String {
        self.endpoint(&["storage", "v1", "object", "public", bucket, name])
    }

    /// Websocket endpoint of the realtime service
    pub fn realtime_url(&self) -> Result<Url, ConfigError> {
        let mut url = Url::parse(&self.endpoint(&["realtime", "v1", "websocket"]))
            .map_err(|_| ConfigError::InvalidUrl(self.supabase_url.clone()))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| ConfigError::InvalidUrl(self.supabase_url.clone()))?;
        url.query_pairs_mut()
            .append_pair("apikey", &self.api_key)
            .append_pair("vsn", REALTIME_PROTOCOL_VERSION);
        Ok(url)
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    supabase_url: Option<String>,
    api_key: Option<String>,
    schema: Option<String>,
    messages_table: Option<String>,
    users_table: Option<String>,
    realtime_topic: Option<String>,
    attachments_bucket: Option<String>,
    heartbeat_interval_secs: Option<u64>,
}

impl AppConfigBuilder {
    pub fn supabase_url(mut self, url: impl Into<String>) -> Self {
        self.supabase_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn messages_table(mut self, table: impl Into<String>) -> Self {
        self.messages_table = Some(table.into());
        self
    }

    pub fn users_table(mut self, table: impl Into<String>) -> Self {
        self.users_table = Some(table.into());
        self
    }

    pub fn realtime_topic(mut self, topic: impl Into<String>) -> Self {
        self.realtime_topic = Some(topic.into());
        self
    }

    pub fn attachments_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.attachments_bucket = Some(bucket.into());
        self
    }

    pub fn heartbeat_interval_secs(mut self, secs: u64) -> Self {
        self.heartbeat_interval_secs = Some(secs);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig {
            supabase_url: self.supabase_url.ok_or(ConfigError::MissingValue("supabase_url"))?,
            api_key: self.api_key.ok_or(ConfigError::MissingValue("api_key"))?,
            schema: self.schema.unwrap_or_else(default_schema),
            messages_table: self.messages_table.unwrap_or_else(default_messages_table),
            users_table: self.users_table.unwrap_or_else(default_users_table),
            realtime_topic: self.realtime_topic.unwrap_or_else(default_realtime_topic),
            attachments_bucket: self.attachments_bucket.unwrap_or_else(default_attachments_bucket),
            heartbeat_interval_secs: self.heartbeat_interval_secs.unwrap_or(DEFAULT_HEARTBEAT_SECS),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("failed to read configuration: {0}")]
    Io(String),
}
