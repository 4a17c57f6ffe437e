//! Client for the hosted database's REST table API and stored procedures.

mod query;
mod store;

pub use query::Query;
pub use store::HostedStore;

use gastro_core::{Error, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

const REST_PATH: &str = "/rest/v1";

/// Per-request timeout of [`HostedClient::new`].
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection settings for the hosted backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Key sent as `apikey` and bearer token. Server-side this is the
    /// service key; tenant isolation is done with explicit filters.
    pub api_key: String,
}

/// Error body returned by the REST layer.
#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

impl ApiErrorBody {
    fn into_message(self, status: StatusCode) -> String {
        let mut message = self
            .message
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        if let Some(details) = self.details.filter(|d| !d.is_empty()) {
            message.push_str(": ");
            message.push_str(&details);
        }
        if let Some(hint) = self.hint.filter(|h| !h.is_empty()) {
            message.push_str(&format!(" ({hint})"));
        }
        message
    }
}

/// Thin typed wrapper over the REST endpoints.
#[derive(Debug, Clone)]
pub struct HostedClient {
    http: reqwest::Client,
    base: String,
    api_key: String,
}

impl HostedClient {
    /// Creates a client with the default [`REQUEST_TIMEOUT`].
    pub fn new(config: HostedConfig) -> Result<Self> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    /// Creates a client whose requests give up after `timeout`.
    pub fn with_timeout(config: HostedConfig, timeout: Duration) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(Error::config("hosted backend URL is empty"));
        }
        if config.api_key.trim().is_empty() {
            return Err(Error::config("hosted backend API key is empty"));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::backend_with_source("http client", e))?;
        Ok(Self::with_client(http, config))
    }

    /// Creates a client around an existing HTTP client.
    pub fn with_client(http: reqwest::Client, config: HostedConfig) -> Self {
        Self {
            http,
            base: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{REST_PATH}/{path}", self.base))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, context: &str, builder: RequestBuilder) -> Result<Response> {
        builder
            .send()
            .await
            .map_err(|e| Error::backend_with_source(format!("{context}: request failed"), e))
    }

    async fn error_message(response: Response) -> String {
        let status = response.status();
        match response.json::<ApiErrorBody>().await {
            Ok(body) => body.into_message(status),
            Err(_) => format!("HTTP {}", status.as_u16()),
        }
    }

    async fn check(context: &str, response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let message = Self::error_message(response).await;
        tracing::warn!(%status, context, %message, "hosted request rejected");
        Err(Error::backend(format!("{context}: {message}")))
    }

    async fn decode<T: DeserializeOwned>(context: &str, response: Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| Error::backend_with_source(format!("{context}: invalid response"), e))
    }

    /// Rows matching the query.
    pub async fn select<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>> {
        let context = format!("select {}", query.table_name());
        tracing::debug!(table = query.table_name(), "select");
        let builder = self
            .request(Method::GET, query.table_name())
            .query(query.params());
        let response = Self::check(&context, self.send(&context, builder).await?).await?;
        Self::decode(&context, response).await
    }

    /// First row matching the query.
    pub async fn select_one<T: DeserializeOwned>(&self, query: &Query) -> Result<Option<T>> {
        let rows: Vec<T> = self.select(&query.clone().limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Number of rows matching the query, read from `Content-Range`.
    pub async fn count(&self, query: &Query) -> Result<usize> {
        let context = format!("count {}", query.table_name());
        let builder = self
            .request(Method::HEAD, query.table_name())
            .query(query.params())
            .header("Prefer", "count=exact");
        let response = Self::check(&context, self.send(&context, builder).await?).await?;
        let header = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::backend(format!("{context}: missing Content-Range")))?;
        parse_content_range_total(header)
            .ok_or_else(|| Error::backend(format!("{context}: bad Content-Range {header:?}")))
    }

    /// Inserts one row and returns it.
    pub async fn insert<B, T>(&self, table: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let context = format!("insert {table}");
        let builder = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(body);
        let response = Self::check(&context, self.send(&context, builder).await?).await?;
        let rows: Vec<T> = Self::decode(&context, response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::backend(format!("{context}: no row returned")))
    }

    /// Inserts one row, merging with an existing row on `on_conflict`.
    pub async fn upsert<B>(&self, table: &str, body: &B, on_conflict: &str) -> Result<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        let context = format!("upsert {table}");
        let builder = self
            .request(Method::POST, table)
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(body);
        Self::check(&context, self.send(&context, builder).await?).await?;
        Ok(())
    }

    /// Updates matching rows and returns them.
    pub async fn update<B, T>(&self, query: &Query, body: &B) -> Result<Vec<T>>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let context = format!("update {}", query.table_name());
        let builder = self
            .request(Method::PATCH, query.table_name())
            .query(query.params())
            .header("Prefer", "return=representation")
            .json(body);
        let response = Self::check(&context, self.send(&context, builder).await?).await?;
        Self::decode(&context, response).await
    }

    /// Deletes matching rows and returns how many went.
    pub async fn delete(&self, query: &Query) -> Result<usize> {
        let context = format!("delete {}", query.table_name());
        let builder = self
            .request(Method::DELETE, query.table_name())
            .query(query.params())
            .header("Prefer", "return=representation");
        let response = Self::check(&context, self.send(&context, builder).await?).await?;
        let rows: Vec<serde_json::Value> = Self::decode(&context, response).await?;
        Ok(rows.len())
    }

    /// Calls a stored procedure.
    ///
    /// A rejection by the procedure becomes [`Error::Procedure`] carrying the
    /// database's message, so callers can classify it.
    pub async fn rpc<B>(&self, name: &str, args: &B) -> Result<serde_json::Value>
    where
        B: Serialize + ?Sized + Sync,
    {
        let context = format!("rpc {name}");
        tracing::debug!(procedure = name, "rpc");
        let builder = self.request(Method::POST, &format!("rpc/{name}")).json(args);
        let response = self.send(&context, builder).await?;
        let status = response.status();
        if status.is_client_error() {
            let message = Self::error_message(response).await;
            tracing::info!(procedure = name, %message, "procedure rejected call");
            return Err(Error::procedure(name, message));
        }
        let response = Self::check(&context, response).await?;
        if status == StatusCode::NO_CONTENT {
            return Ok(serde_json::Value::Null);
        }
        let text = response
            .text()
            .await
            .map_err(|e| Error::backend_with_source(format!("{context}: invalid response"), e))?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Total from a `Content-Range` header such as `0-9/42` or `*/0`.
pub fn parse_content_range_total(header: &str) -> Option<usize> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}
