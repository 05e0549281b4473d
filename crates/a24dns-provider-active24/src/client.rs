//! Active24 REST API v2 client
//!
//! Record endpoints live under `{base}/service/{target}/dns/record`:
//!
//! ```http
//! POST   /service/:target/dns/record          create
//! GET    /service/:target/dns/record/:id      get
//! PUT    /service/:target/dns/record/:id      update (full replacement)
//! DELETE /service/:target/dns/record/:id      delete
//! GET    /service/:target/dns/record?filters[name]=..&filters[type]=..
//! ```
//!
//! Every request is signed (see [`crate::signer`]). Any status of 300 or
//! above is an [`Error::Api`] carrying the status line and raw body. An
//! empty body on success is reported as `None`. Nothing is retried.

use std::time::Duration;

use a24dns_core::config::{DEFAULT_TIMEOUT, ResolvedConfig};
use a24dns_core::{ApiRecord, Error, ListFilter, RecordApi, RecordId, RecordPayload, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::signer;

/// `User-Agent` sent with every request
const USER_AGENT_VALUE: &str = concat!("a24dns/", env!("CARGO_PKG_VERSION"));

/// Header carrying the signing instant
const X_DATE: &str = "X-Date";

/// Page returned by the list endpoint
#[derive(Debug, Deserialize)]
struct RecordPage {
    #[serde(default)]
    data: Option<Vec<ApiRecord>>,
}

/// Signed client for the Active24 DNS record endpoints
///
/// Holds only immutable configuration and the HTTP connection pool, so one
/// client can be shared between the reconciler and the import resolver.
pub struct Active24Client {
    base_url: Url,
    http: reqwest::Client,
    api_key: String,
    /// Never logged
    api_secret: SecretString,
    debug: bool,
    cancel: Option<CancellationToken>,
}

// Custom Debug implementation that hides the API secret
impl std::fmt::Debug for Active24Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Active24Client")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key)
            .field("api_secret", &"<REDACTED>")
            .field("debug", &self.debug)
            .finish()
    }
}

impl Active24Client {
    /// Build a client from resolved configuration
    ///
    /// Fails with [`Error::Config`] when the base URL cannot be parsed or
    /// cannot carry path segments.
    pub fn from_config(config: &ResolvedConfig) -> Result<Self> {
        let http = build_http(config.timeout)?;
        let client = Self::with_http(
            &config.base_url,
            http,
            config.api_key.clone(),
            SecretString::from(config.api_secret.clone()),
        )?;
        Ok(client.with_debug(config.debug))
    }

    /// Build a client with explicit credentials and the default timeout
    pub fn new(base_url: &str, api_key: impl Into<String>, api_secret: SecretString) -> Result<Self> {
        Self::with_http(base_url, build_http(DEFAULT_TIMEOUT)?, api_key, api_secret)
    }

    /// Wrap an existing `reqwest::Client`
    pub fn with_http(
        base_url: &str,
        http: reqwest::Client,
        api_key: impl Into<String>,
        api_secret: SecretString,
    ) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("API key cannot be empty"));
        }

        Ok(Self {
            base_url,
            http,
            api_key,
            api_secret,
            debug: false,
            cancel: None,
        })
    }

    /// Log every request and response body at info level
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Abort in-flight requests with [`Error::Cancelled`] once `token` fires
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Base URL requests are built from
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/service/{target}/dns/record[/{id}]`
    fn record_url(&self, target: &str, id: Option<RecordId>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::config(format!("base URL cannot carry a path: {}", self.base_url)))?;
            segments.pop_if_empty().extend(["service", target, "dns", "record"]);
            if let Some(id) = id {
                segments.push(&id.to_string());
            }
        }
        Ok(url)
    }

    /// Send one signed request; returns the body when there is one
    async fn execute(&self, method: Method, url: Url, body: Option<&RecordPayload>) -> Result<Option<String>> {
        let payload = body.map(serde_json::to_string).transpose()?;

        // X-Date and the signature come from the same instant
        let signed = signer::sign(
            &self.api_key,
            self.api_secret.expose_secret(),
            method.as_str(),
            url.path(),
            Utc::now(),
        )?;

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(AUTHORIZATION, &signed.authorization)
            .header(X_DATE, &signed.x_date)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(ACCEPT, "application/json");
        if let Some(payload) = &payload {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(payload.clone());
        }

        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| Error::transport(e.to_string()))?;
            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| Error::transport(e.to_string()))?;
            Ok::<_, Error>((status, text))
        };

        let outcome = match &self.cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => Err(Error::Cancelled),
                res = exchange => res,
            },
            None => exchange.await,
        };

        let (status, text) = match outcome {
            Ok(pair) => pair,
            Err(e) => {
                if self.debug {
                    info!(method = %method, url = %url, error = %e, "active24 request failed");
                }
                return Err(e);
            }
        };

        if self.debug {
            info!(
                method = %method,
                url = %url,
                status = %status,
                request_body = payload.as_deref().unwrap_or(""),
                response_body = %text,
                "active24 http"
            );
        }

        if status.as_u16() >= 300 {
            return Err(Error::api(status.to_string(), status.as_u16(), text));
        }

        if text.trim().is_empty() {
            debug!("{} {} returned an empty body", method, url);
            return Ok(None);
        }
        Ok(Some(text))
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&RecordPayload>,
    ) -> Result<Option<T>> {
        match self.execute(method, url, body).await? {
            Some(text) => decode(&text).map(Some),
            None => Ok(None),
        }
    }
}

fn build_http(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::config(format!("invalid base URL {:?}: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(Error::config(format!("invalid base URL {:?}: cannot carry a path", raw)));
    }
    Ok(url)
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| Error::decode(e.to_string(), text))
}

#[async_trait]
impl RecordApi for Active24Client {
    async fn create_record(&self, target: &str, payload: &RecordPayload) -> Result<Option<ApiRecord>> {
        let url = self.record_url(target, None)?;
        self.execute_json(Method::POST, url, Some(payload)).await
    }

    async fn get_record(&self, target: &str, id: RecordId) -> Result<ApiRecord> {
        let url = self.record_url(target, Some(id))?;
        self.execute_json(Method::GET, url, None)
            .await?
            .ok_or_else(|| Error::decode(format!("empty response for record {}", id), ""))
    }

    async fn update_record(
        &self,
        target: &str,
        id: RecordId,
        payload: &RecordPayload,
    ) -> Result<Option<ApiRecord>> {
        let url = self.record_url(target, Some(id))?;
        self.execute_json(Method::PUT, url, Some(payload)).await
    }

    async fn delete_record(&self, target: &str, id: RecordId) -> Result<()> {
        let url = self.record_url(target, Some(id))?;
        self.execute(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn list_records(&self, target: &str, filter: &ListFilter) -> Result<Vec<ApiRecord>> {
        let mut url = self.record_url(target, None)?;
        let pairs = filter.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let page: Option<RecordPage> = self.execute_json(Method::GET, url, None).await?;
        Ok(page.and_then(|p| p.data).unwrap_or_default())
    }

    fn provider_name(&self) -> &'static str {
        "active24"
    }
}
