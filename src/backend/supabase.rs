//! Hosted backend client
//!
//! [`SupabaseClient`] talks to the platform's REST (PostgREST), storage and
//! realtime endpoints. One `reqwest::Client` is built per instance and
//! carries the API key on every request.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::backend::client::BackendClient;
use crate::backend::error::{error_from_response, BackendError};
use crate::backend::query::Query;
use crate::backend::realtime::{socket, ChangeFeed, RealtimeChannel};
use crate::shared::{AppConfig, ConfigError};

static SHARED: OnceCell<Arc<SupabaseClient>> = OnceCell::const_new();

/// Client for the hosted backend
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    config: AppConfig,
    http: Client,
}

impl SupabaseClient {
    /// Build a client for a validated configuration
    pub fn new(config: AppConfig) -> Result<Self, BackendError> {
        config.validate()?;

        let key = HeaderValue::from_str(&config.api_key).map_err(|_| ConfigError::InvalidValue {
            field: "api_key",
            message: "not a valid header value".to_string(),
        })?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key)).map_err(|_| {
            ConfigError::InvalidValue {
                field: "api_key",
                message: "not a valid header value".to_string(),
            }
        })?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let http = Client::builder().default_headers(headers).build()?;
        Ok(Self { config, http })
    }

    /// Process-wide client built lazily from the environment
    ///
    /// See [`AppConfig::from_env`] for the variables read.
    pub async fn shared() -> Result<Arc<SupabaseClient>, BackendError> {
        SHARED
            .get_or_try_init(|| async {
                let config = AppConfig::from_env()?;
                tracing::info!("[Supabase] Initialising shared client for {}", config.supabase_url);
                Ok::<_, BackendError>(Arc::new(SupabaseClient::new(config)?))
            })
            .await
            .cloned()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Non-public schemas are selected with profile headers
    fn profile_header(&self, name: &'static str) -> Option<(&'static str, String)> {
        if self.config.schema == "public" {
            None
        } else {
            Some((name, self.config.schema.clone()))
        }
    }
}

#[async_trait]
impl BackendClient for SupabaseClient {
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<(), BackendError> {
        let mut request = self
            .http
            .post(self.config.rest_url(table))
            .header("Prefer", "return=minimal")
            .json(&rows);
        if let Some((name, schema)) = self.profile_header("Content-Profile") {
            request = request.header(name, schema);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        tracing::debug!("[Supabase] Inserted {} row(s) into {}", rows.len(), table);
        Ok(())
    }

    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, BackendError> {
        let mut request = self
            .http
            .get(self.config.rest_url(table))
            .query(&query.to_postgrest_params());
        if let Some((name, schema)) = self.profile_header("Accept-Profile") {
            request = request.header(name, schema);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let rows = response.json::<Vec<Value>>().await?;
        tracing::debug!("[Supabase] Selected {} row(s) from {}", rows.len(), table);
        Ok(rows)
    }

    async fn subscribe_inserts(
        &self,
        topic: &str,
        schema: &str,
        table: &str,
    ) -> Result<ChangeFeed, BackendError> {
        socket::subscribe(&self.config, topic, schema, table).await
    }

    async fn unsubscribe(&self, channel: &RealtimeChannel) -> Result<(), BackendError> {
        if channel.close() {
            Ok(())
        } else {
            Err(BackendError::channel_closed(channel.topic()))
        }
    }

    async fn upload(&self, bucket: &str, name: &str, bytes: Vec<u8>) -> Result<(), BackendError> {
        let size = bytes.len();
        let response = self
            .http
            .post(self.config.storage_object_url(bucket, name))
            .header(CONTENT_TYPE, "application/octet-stream")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        tracing::debug!("[Supabase] Uploaded {} bytes to {}/{}", size, bucket, name);
        Ok(())
    }

    fn public_url(&self, bucket: &str, name: &str) -> String {
        self.config.public_object_url(bucket, name)
    }
}
