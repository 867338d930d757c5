use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use async_trait::async_trait;
use http::Method;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::desec::types::ErrorResponse;
use crate::desec::{DnsApi, Domain, RRSet, UpstreamError};

pub const DEFAULT_BASE_URL: &str = "https://desec.io/api/v1";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct DesecClient {
    http: Client,
    token: String,
    base_url: String,
}

impl Debug for DesecClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesecClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl DesecClient {
    pub fn new(token: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::builder(token).build()
    }

    pub fn builder(token: impl Into<String>) -> DesecClientBuilder {
        DesecClientBuilder {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<T, UpstreamError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        debug!(%method, %url, ?query, "send desec request");

        let mut req = self
            .http
            .request(method.clone(), &url)
            .header(http::header::AUTHORIZATION, format!("Token {}", self.token))
            .header(http::header::ACCEPT, "application/json");

        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let transport_err = |source| {
            error!(%method, path, %source, "desec request failed");

            UpstreamError::Transport {
                method: method.clone(),
                path: path.to_string(),
                source,
            }
        };

        let resp = req.send().await.map_err(transport_err)?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(transport_err)?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorResponse>(&bytes)
                .ok()
                .and_then(|err_resp| err_resp.detail)
                .unwrap_or_else(|| "unknown error occurred".to_string());

            error!(%method, path, %status, %detail, "desec returned error");

            return Err(UpstreamError::Status {
                method,
                path: path.to_string(),
                status,
                detail,
            });
        }

        serde_json::from_slice(&bytes).map_err(|source| {
            error!(%method, path, %status, %source, "decode desec response failed");

            UpstreamError::Decode {
                method,
                path: path.to_string(),
                source,
            }
        })
    }
}

#[async_trait]
impl DnsApi for DesecClient {
    #[instrument(err)]
    async fn list_domains(&self) -> Result<Vec<Domain>, UpstreamError> {
        let domains: Vec<Domain> = self
            .request::<(), _>(Method::GET, "/domains/", &[], None)
            .await?;

        info!(count = domains.len(), "list domains done");

        Ok(domains)
    }

    #[instrument(err)]
    async fn list_rrsets(
        &self,
        domain: &str,
        subname: &str,
        kind: &str,
    ) -> Result<Vec<RRSet>, UpstreamError> {
        let path = format!("/domains/{}/rrsets/", domain);

        let rrsets: Vec<RRSet> = self
            .request::<(), _>(
                Method::GET,
                &path,
                &[("subname", subname), ("type", kind)],
                None,
            )
            .await?;

        info!(domain, subname, kind, count = rrsets.len(), "list rrsets done");

        Ok(rrsets)
    }

    #[instrument(err)]
    async fn put_rrsets(&self, domain: &str, rrsets: &[RRSet]) -> Result<Vec<RRSet>, UpstreamError> {
        let path = format!("/domains/{}/rrsets/", domain);

        let written: Vec<RRSet> = self
            .request(Method::PUT, &path, &[], Some(rrsets))
            .await?;

        info!(domain, ?written, "put rrsets done");

        Ok(written)
    }
}

pub struct DesecClientBuilder {
    token: String,
    base_url: String,
    timeout: Duration,
}

impl DesecClientBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<DesecClient, reqwest::Error> {
        let http = Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("desec-webhook/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(DesecClient {
            http,
            token: self.token,
            base_url: self.base_url.trim_end_matches('/').to_string(),
        })
    }
}
